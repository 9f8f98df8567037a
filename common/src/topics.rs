pub const TOPIC_SENSOR_HUMIDITY: &str = "zone/sensor/humidity";

pub const TOPIC_CONTROLLER_STATE: &str = "zone/controller/state";

pub const TOPIC_CMD_SETPOINT: &str = "zone/cmnd/setpoint";
pub const TOPIC_CMD_DOOR: &str = "zone/cmnd/door";
pub const TOPIC_CMD_MOTION: &str = "zone/cmnd/motion";
