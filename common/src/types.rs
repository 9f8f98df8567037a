use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HvacMode {
    #[default]
    Off,
    Heat,
    Cool,
}

impl HvacMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Heat => "HEAT",
            Self::Cool => "COOL",
        }
    }

    /// Short label used on the status line.
    pub fn display_label(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Heat => "HEAT",
            Self::Cool => "AC",
        }
    }

    pub fn is_active(self) -> bool {
        self != Self::Off
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputEvent {
    TemperatureIncrement,
    TemperatureDecrement,
    DoorToggle,
    MotionDetected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actuator {
    HeatIndicator,
    CoolIndicator,
    AmbientLight,
    Alarm,
}

impl Actuator {
    pub const ALL: [Actuator; 4] = [
        Self::HeatIndicator,
        Self::CoolIndicator,
        Self::AmbientLight,
        Self::Alarm,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::HeatIndicator => 0,
            Self::CoolIndicator => 1,
            Self::AmbientLight => 2,
            Self::Alarm => 3,
        }
    }
}

pub fn on_off(value: bool) -> &'static str {
    if value {
        "ON"
    } else {
        "OFF"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneStatus {
    #[serde(rename = "desiredTemp")]
    pub desired_temp: i32,
    #[serde(rename = "minTemp")]
    pub min_temp: i32,
    #[serde(rename = "maxTemp")]
    pub max_temp: i32,
    #[serde(rename = "smoothedTemp")]
    pub smoothed_temp: Option<i32>,
    #[serde(rename = "comfortIndex")]
    pub comfort_index: Option<i32>,
    pub humidity: Option<u8>,
    #[serde(rename = "doorClosed")]
    pub door_closed: bool,
    #[serde(rename = "doorAnnouncing")]
    pub door_announcing: bool,
    #[serde(rename = "hvacMode")]
    pub hvac_mode: &'static str,
    #[serde(rename = "hvacAnnouncing")]
    pub hvac_announcing: bool,
    #[serde(rename = "hvacLights")]
    pub hvac_lights: bool,
    #[serde(rename = "motionLights")]
    pub motion_lights: bool,
    #[serde(rename = "ambientLight")]
    pub ambient_light: bool,
    pub emergency: bool,
    pub alarm: bool,
    #[serde(rename = "msSinceSample")]
    pub ms_since_sample: Option<u64>,
    #[serde(rename = "msSinceMotion")]
    pub ms_since_motion: u64,
    pub display: [String; 2],
}
