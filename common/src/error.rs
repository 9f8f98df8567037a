use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("transient sensor fault: {0}")]
    Transient(String),
    #[error("fatal sensor fault: {0}")]
    Fatal(String),
}

impl SensorError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    #[error("no temperature readings processed yet")]
    NoReadings,
}
