use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use zone_common::{
    types::on_off, Actuator, ActuatorBank, DisplayMessage, DisplaySink, HumiditySource,
    SensorError, TemperatureSource,
};

/// Stand-in for the DHT11 on host builds. Produces a slow Celsius ramp with
/// the occasional empty read and checksum failure a real DHT11 shows.
pub struct SimulatedDht {
    base_c: f32,
    reads: u64,
    released: bool,
}

impl SimulatedDht {
    pub fn new(base_c: f32) -> Self {
        Self {
            base_c,
            reads: 0,
            released: false,
        }
    }

    pub fn from_env() -> Self {
        let base_c = std::env::var("ZONE_SIM_BASE_C")
            .ok()
            .and_then(|value| value.parse::<f32>().ok())
            .filter(|value| value.is_finite())
            .unwrap_or(21.0);
        Self::new(base_c)
    }
}

impl TemperatureSource for SimulatedDht {
    fn read(&mut self) -> Result<Option<f32>, SensorError> {
        if self.released {
            return Err(SensorError::Fatal("sensor already released".to_string()));
        }

        self.reads = self.reads.saturating_add(1);
        if self.reads % 20 == 0 {
            return Err(SensorError::Transient(
                "checksum did not validate".to_string(),
            ));
        }
        if self.reads % 9 == 0 {
            return Ok(None);
        }
        Ok(Some(self.base_c + (self.reads % 8) as f32 * 0.25))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            info!("temperature sensor released");
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HumiditySample {
    percent: u8,
    received_ms: u64,
}

/// Latest humidity pushed over MQTT; readers see `None` once it goes stale.
#[derive(Clone)]
pub struct HumidityCache {
    latest: Arc<Mutex<Option<HumiditySample>>>,
    stale_timeout_ms: u64,
}

impl HumidityCache {
    pub fn new(stale_timeout_ms: u64) -> Self {
        Self {
            latest: Arc::new(Mutex::new(None)),
            stale_timeout_ms,
        }
    }

    pub fn update(&self, percent: u8, now_ms: u64) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        *latest = Some(HumiditySample {
            percent,
            received_ms: now_ms,
        });
    }
}

impl HumiditySource for HumidityCache {
    fn fetch_latest(&mut self, now_ms: u64) -> Option<u8> {
        let latest = *self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest
            .filter(|sample| now_ms.saturating_sub(sample.received_ms) < self.stale_timeout_ms)
            .map(|sample| sample.percent)
    }
}

/// Actuator bank that records levels and logs every change.
#[derive(Debug, Default)]
pub struct LoggingActuators {
    levels: [bool; 4],
}

impl LoggingActuators {
    pub fn level(&self, output: Actuator) -> bool {
        self.levels[output.index()]
    }
}

impl ActuatorBank for LoggingActuators {
    fn set(&mut self, output: Actuator, on: bool) {
        self.levels[output.index()] = on;
        if output == Actuator::Alarm {
            debug!("actuator {output:?} -> {}", on_off(on));
        } else {
            info!("actuator {output:?} -> {}", on_off(on));
        }
    }
}

/// Two-line console display. Logs only when the visible text changes.
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    lines: [String; 2],
}

impl ConsoleDisplay {
    pub fn lines(&self) -> &[String; 2] {
        &self.lines
    }
}

impl DisplaySink for ConsoleDisplay {
    fn render(&mut self, message: &DisplayMessage, dwell_ms: Option<u64>) {
        let lines = message.lines();
        if lines == self.lines {
            return;
        }
        self.lines = lines;
        match dwell_ms {
            Some(ms) => info!(
                "display [{:<16}] [{:<16}] (hold {ms}ms)",
                self.lines[0], self.lines[1]
            ),
            None => info!("display [{:<16}] [{:<16}]", self.lines[0], self.lines[1]),
        }
    }
}

#[cfg(test)]
mod tests {
    use zone_common::{DoorTransition, HvacMode};

    use super::*;

    #[test]
    fn humidity_goes_stale() {
        let mut cache = HumidityCache::new(1_000);
        assert_eq!(cache.fetch_latest(0), None);

        cache.update(55, 100);
        assert_eq!(cache.fetch_latest(1_099), Some(55));
        assert_eq!(cache.fetch_latest(1_100), None);
    }

    #[test]
    fn humidity_cache_clones_share_state() {
        let writer = HumidityCache::new(60_000);
        let mut reader = writer.clone();

        writer.update(40, 0);
        assert_eq!(reader.fetch_latest(10), Some(40));
    }

    #[test]
    fn simulated_dht_reports_transient_faults_and_gaps() {
        let mut dht = SimulatedDht::new(21.0);
        let results: Vec<_> = (0..20).map(|_| dht.read()).collect();

        assert_eq!(results[0], Ok(Some(21.25)));
        assert_eq!(results[8], Ok(None));
        assert!(matches!(results[19], Err(SensorError::Transient(_))));
    }

    #[test]
    fn released_dht_is_fatal() {
        let mut dht = SimulatedDht::new(21.0);
        dht.release();
        assert!(matches!(dht.read(), Err(SensorError::Fatal(_))));
    }

    #[test]
    fn console_display_keeps_latest_text() {
        let mut display = ConsoleDisplay::default();
        display.render(&DisplayMessage::DoorAnnouncement(DoorTransition::Opened), None);
        assert_eq!(display.lines()[0], "Door/window open!");

        display.render(&DisplayMessage::HvacAnnouncement(HvacMode::Heat), Some(3_000));
        assert_eq!(display.lines()[0], "HEAT TURNING");
    }

    #[test]
    fn logging_actuators_track_levels() {
        let mut bank = LoggingActuators::default();
        bank.set(Actuator::CoolIndicator, true);
        assert!(bank.level(Actuator::CoolIndicator));
        assert!(!bank.level(Actuator::HeatIndicator));
    }
}
