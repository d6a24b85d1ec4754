use log::debug;
use serde_json::{Map, Value};

use crate::types::{Indicator, MatchMode};

/// On/off target for each indicator, derived from one response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DesiredState {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl DesiredState {
    pub fn all_off() -> Self {
        Self::default()
    }

    pub fn evaluate(body: &str, mode: MatchMode) -> Self {
        match mode {
            MatchMode::Literal => Self::from_markers(body),
            MatchMode::Structured => Self::from_json(body),
        }
    }

    /// An indicator is on iff the body contains its exact `"<key>":true` text.
    pub fn from_markers(body: &str) -> Self {
        let mut state = Self::all_off();
        for indicator in Indicator::ALL {
            state.set(indicator, body.contains(indicator.marker()));
        }
        state
    }

    /// Only a JSON boolean `true` under the key counts. Anything unparsable
    /// leaves every indicator off.
    pub fn from_json(body: &str) -> Self {
        let document: Map<String, Value> = match serde_json::from_str(body) {
            Ok(document) => document,
            Err(err) => {
                debug!("indicator document is not a json object: {err}");
                return Self::all_off();
            }
        };

        let mut state = Self::all_off();
        for indicator in Indicator::ALL {
            let on = matches!(document.get(indicator.key()), Some(Value::Bool(true)));
            state.set(indicator, on);
        }
        state
    }

    pub fn get(&self, indicator: Indicator) -> bool {
        match indicator {
            Indicator::Red => self.red,
            Indicator::Green => self.green,
            Indicator::Blue => self.blue,
        }
    }

    pub fn set(&mut self, indicator: Indicator, on: bool) {
        match indicator {
            Indicator::Red => self.red = on,
            Indicator::Green => self.green = on,
            Indicator::Blue => self.blue = on,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Indicator, bool)> + '_ {
        Indicator::ALL
            .into_iter()
            .map(move |indicator| (indicator, self.get(indicator)))
    }
}

impl core::fmt::Display for DesiredState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let level = |on: bool| if on { "ON" } else { "OFF" };
        write!(
            f,
            "RED={} GREEN={} BLUE={}",
            level(self.red),
            level(self.green),
            level(self.blue)
        )
    }
}
