use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub main_tick_ms: u64,
    pub motion_poll_ms: u64,
    pub blink_idle_ms: u64,
    pub blink_toggle_ms: u64,
    pub sensor_retry_backoff_ms: u64,
    pub humidity_refresh_ms: u64,
    pub humidity_stale_timeout_ms: u64,
    pub state_publish_interval_ms: u64,
    pub door_announce_ms: u64,
    pub hvac_announce_ms: u64,
    pub motion_linger_ms: u64,
    pub emergency_ceiling_f: i32,
    pub band_offset_f: i32,
    pub smoothing_window: usize,
    pub humidity_weight: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            main_tick_ms: 500,
            motion_poll_ms: 200,
            blink_idle_ms: 100,
            blink_toggle_ms: 500,
            sensor_retry_backoff_ms: 2_000,
            humidity_refresh_ms: 60_000,
            humidity_stale_timeout_ms: 300_000,
            state_publish_interval_ms: 10_000,
            door_announce_ms: 3_000,
            hvac_announce_ms: 3_000,
            motion_linger_ms: 10_000,
            emergency_ceiling_f: 95,
            band_offset_f: 3,
            smoothing_window: 3,
            humidity_weight: 0.05,
        }
    }
}

impl ZoneConfig {
    pub fn sanitize(&mut self) {
        let defaults = Self::default();

        self.smoothing_window = self.smoothing_window.max(1);
        for (value, fallback) in [
            (&mut self.main_tick_ms, defaults.main_tick_ms),
            (&mut self.motion_poll_ms, defaults.motion_poll_ms),
            (&mut self.blink_idle_ms, defaults.blink_idle_ms),
            (&mut self.blink_toggle_ms, defaults.blink_toggle_ms),
            (&mut self.humidity_refresh_ms, defaults.humidity_refresh_ms),
            (
                &mut self.state_publish_interval_ms,
                defaults.state_publish_interval_ms,
            ),
        ] {
            if *value == 0 {
                *value = fallback;
            }
        }

        if !self.humidity_weight.is_finite() || self.humidity_weight < 0.0 {
            self.humidity_weight = defaults.humidity_weight;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SetpointSettings {
    pub desired_f: i32,
    pub min_f: i32,
    pub max_f: i32,
}

impl Default for SetpointSettings {
    fn default() -> Self {
        Self {
            desired_f: 70,
            min_f: 65,
            max_f: 95,
        }
    }
}

impl SetpointSettings {
    pub fn sanitize(&mut self) {
        if self.min_f > self.max_f {
            std::mem::swap(&mut self.min_f, &mut self.max_f);
        }
        self.desired_f = self.desired_f.clamp(self.min_f, self.max_f);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: String,
    pub http_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mqtt_host: "127.0.0.1".to_string(),
            mqtt_port: 1883,
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
            http_port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub zone: ZoneConfig,
    pub setpoint: SetpointSettings,
    pub network: NetworkConfig,
}

impl RuntimeConfig {
    /// Parses a runtime config file and repairs out-of-range values.
    pub fn from_json_slice(raw: &[u8]) -> Result<Self, serde_json::Error> {
        let mut runtime: Self = serde_json::from_slice(raw)?;
        runtime.sanitize();
        Ok(runtime)
    }

    pub fn sanitize(&mut self) {
        self.zone.sanitize();
        self.setpoint.sanitize();
    }
}
