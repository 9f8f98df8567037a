pub mod comfort;
pub mod config;
pub mod display;
pub mod door;
pub mod emergency;
pub mod engine;
pub mod error;
pub mod hvac;
pub mod motion;
pub mod ports;
pub mod setpoint;
pub mod smoother;
pub mod topics;
pub mod types;

pub use comfort::WeatherIndexCalculator;
pub use config::{NetworkConfig, RuntimeConfig, SetpointSettings, ZoneConfig};
pub use display::DisplayMessage;
pub use door::{DoorMonitor, DoorTransition};
pub use emergency::{AlarmBlinker, EmergencyMonitor};
pub use engine::{EngineAction, ZoneEngine};
pub use error::{SensorError, ZoneError};
pub use hvac::{HvacController, HvacPhase};
pub use motion::MotionLighting;
pub use ports::{apply_actions, ActuatorBank, DisplaySink, HumiditySource, TemperatureSource};
pub use setpoint::SetpointStore;
pub use smoother::TemperatureSmoother;
pub use topics::*;
pub use types::{Actuator, HvacMode, InputEvent, ZoneStatus};
