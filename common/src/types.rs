use serde::{Deserialize, Serialize};

use crate::ports::{LinkError, TransportError};

pub const HTTP_OK: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Red,
    Green,
    Blue,
}

impl Indicator {
    pub const ALL: [Indicator; 3] = [Self::Red, Self::Green, Self::Blue];

    /// Key of the indicator in the remote document.
    pub fn key(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Green => "GREEN",
            Self::Blue => "BLUE",
        }
    }

    /// Exact text whose presence in a body switches the indicator on.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Red => "\"red\":true",
            Self::Green => "\"green\":true",
            Self::Blue => "\"blue\":true",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Literal,
    Structured,
}

impl MatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Literal => "literal",
            Self::Structured => "structured",
        }
    }
}

impl core::str::FromStr for MatchMode {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "literal" => Ok(Self::Literal),
            "structured" | "json" => Ok(Self::Structured),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    pub status_code: u16,
    pub body: String,
}

impl PollResult {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == HTTP_OK
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Success(PollResult),
    NonSuccess(PollResult),
    TransportFailure(TransportError),
    LinkDown(LinkError),
}

impl PollOutcome {
    pub fn classify(result: Result<PollResult, TransportError>) -> Self {
        match result {
            Ok(response) if response.is_success() => Self::Success(response),
            Ok(response) => Self::NonSuccess(response),
            Err(err) => Self::TransportFailure(err),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success(response) | Self::NonSuccess(response) => Some(response.status_code),
            Self::TransportFailure(_) | Self::LinkDown(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Poll,
    Apply,
    Wait,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Poll => "POLL",
            Self::Apply => "APPLY",
            Self::Wait => "WAIT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl LinkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
        }
    }
}
