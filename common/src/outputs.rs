use embedded_hal::digital::{Error as _, OutputPin};

use crate::{desired::DesiredState, ports::OutputError, types::Indicator};

/// The three indicator pins, already configured as outputs by the backend.
pub struct IndicatorOutputs<P> {
    red: P,
    green: P,
    blue: P,
}

impl<P: OutputPin> IndicatorOutputs<P> {
    pub fn new(red: P, green: P, blue: P) -> Self {
        Self { red, green, blue }
    }

    pub fn pin_mut(&mut self, indicator: Indicator) -> &mut P {
        match indicator {
            Indicator::Red => &mut self.red,
            Indicator::Green => &mut self.green,
            Indicator::Blue => &mut self.blue,
        }
    }

    pub fn drive(&mut self, indicator: Indicator, on: bool) -> Result<(), OutputError> {
        let pin = self.pin_mut(indicator);
        let result = if on { pin.set_high() } else { pin.set_low() };
        result.map_err(|err| OutputError {
            indicator,
            kind: err.kind(),
        })
    }

    /// Writes every pin, even when an earlier write fails.
    pub fn apply(&mut self, state: &DesiredState) -> Vec<OutputError> {
        state
            .iter()
            .filter_map(|(indicator, on)| self.drive(indicator, on).err())
            .collect()
    }

    pub fn all_off(&mut self) -> Vec<OutputError> {
        self.apply(&DesiredState::all_off())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPin;
    use embedded_hal::digital::ErrorKind;
    use pretty_assertions::assert_eq;

    fn bank() -> (IndicatorOutputs<MockPin>, [MockPin; 3]) {
        let pins = [MockPin::default(), MockPin::default(), MockPin::default()];
        let outputs = IndicatorOutputs::new(pins[0].clone(), pins[1].clone(), pins[2].clone());
        (outputs, pins)
    }

    #[test]
    fn apply_maps_true_to_high() {
        let (mut outputs, pins) = bank();
        let state = DesiredState {
            red: true,
            green: false,
            blue: true,
        };

        assert!(outputs.apply(&state).is_empty());

        assert_eq!(pins[0].level(), Some(true));
        assert_eq!(pins[1].level(), Some(false));
        assert_eq!(pins[2].level(), Some(true));
    }

    #[test]
    fn drive_reports_failing_indicator() {
        let (mut outputs, pins) = bank();
        pins[1].set_failing(true);

        let err = outputs.drive(Indicator::Green, true).unwrap_err();

        assert_eq!(
            err,
            OutputError {
                indicator: Indicator::Green,
                kind: ErrorKind::Other,
            }
        );
        assert_eq!(pins[1].level(), None);
    }

    #[test]
    fn all_off_writes_every_pin_low() {
        let (mut outputs, pins) = bank();
        outputs.apply(&DesiredState {
            red: true,
            green: true,
            blue: true,
        });

        assert!(outputs.all_off().is_empty());

        for pin in &pins {
            assert_eq!(pin.level(), Some(false));
            assert_eq!(pin.writes(), 2);
        }
    }
}
