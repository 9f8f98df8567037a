use crate::{display::DisplayMessage, engine::EngineAction, error::SensorError, types::Actuator};

pub trait TemperatureSource {
    /// Celsius reading. `Ok(None)` means the sensor answered without a value.
    fn read(&mut self) -> Result<Option<f32>, SensorError>;

    fn release(&mut self);
}

pub trait HumiditySource {
    fn fetch_latest(&mut self, now_ms: u64) -> Option<u8>;
}

pub trait DisplaySink {
    fn render(&mut self, message: &DisplayMessage, dwell_ms: Option<u64>);
}

pub trait ActuatorBank {
    fn set(&mut self, output: Actuator, on: bool);
}

pub fn apply_actions<A, D>(actions: &[EngineAction], actuators: &mut A, display: &mut D)
where
    A: ActuatorBank + ?Sized,
    D: DisplaySink + ?Sized,
{
    for action in actions {
        match action {
            EngineAction::Set(output, on) => actuators.set(*output, *on),
            EngineAction::Render { message, dwell_ms } => display.render(message, *dwell_ms),
        }
    }
}
