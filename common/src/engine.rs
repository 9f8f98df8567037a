use tracing::debug;

use crate::{
    comfort::WeatherIndexCalculator,
    config::{SetpointSettings, ZoneConfig},
    display::{arbitrate, DisplayInputs, DisplayMessage},
    door::{DoorMonitor, DoorTransition},
    emergency::{AlarmBlinker, EmergencyMonitor},
    hvac::HvacController,
    motion::MotionLighting,
    setpoint::SetpointStore,
    smoother::{fahrenheit_from_celsius, TemperatureSmoother},
    types::{Actuator, HvacMode, InputEvent, ZoneStatus},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineAction {
    Set(Actuator, bool),
    Render {
        message: DisplayMessage,
        dwell_ms: Option<u64>,
    },
}

#[derive(Debug, Clone)]
pub struct ZoneEngine {
    pub config: ZoneConfig,
    setpoint: SetpointStore,
    smoother: TemperatureSmoother,
    comfort: WeatherIndexCalculator,
    door: DoorMonitor,
    motion: MotionLighting,
    emergency: EmergencyMonitor,
    blinker: AlarmBlinker,
    hvac: HvacController,

    humidity: Option<u8>,
    comfort_index: Option<i32>,
    last_sample_ms: Option<u64>,

    // HVAC-active ambience flag; kept apart from the motion lighting flag.
    hvac_lights: bool,

    outputs: [bool; 4],
    last_message: Option<DisplayMessage>,
}

impl ZoneEngine {
    pub fn new(mut config: ZoneConfig, setpoint: SetpointSettings, now_ms: u64) -> Self {
        config.sanitize();
        Self {
            setpoint: SetpointStore::new(setpoint),
            smoother: TemperatureSmoother::new(config.smoothing_window),
            comfort: WeatherIndexCalculator::new(config.humidity_weight),
            door: DoorMonitor::new(config.door_announce_ms),
            motion: MotionLighting::new(config.motion_linger_ms, now_ms),
            emergency: EmergencyMonitor::new(config.emergency_ceiling_f),
            blinker: AlarmBlinker::new(config.blink_toggle_ms),
            hvac: HvacController::new(config.band_offset_f, config.hvac_announce_ms),
            humidity: None,
            comfort_index: None,
            last_sample_ms: None,
            hvac_lights: false,
            outputs: [false; 4],
            last_message: None,
            config,
        }
    }

    pub fn desired_temp_f(&self) -> i32 {
        self.setpoint.desired()
    }

    pub fn comfort_index(&self) -> Option<i32> {
        self.comfort_index
    }

    pub fn smoothed_temp_f(&self) -> Option<i32> {
        self.smoother.current().ok()
    }

    pub fn humidity(&self) -> Option<u8> {
        self.humidity
    }

    pub fn hvac_mode(&self) -> HvacMode {
        self.hvac.mode()
    }

    pub fn is_door_closed(&self) -> bool {
        self.door.is_closed()
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency.is_active()
    }

    pub fn hvac_lights(&self) -> bool {
        self.hvac_lights
    }

    pub fn motion_lights(&self) -> bool {
        self.motion.lights_on()
    }

    pub fn output(&self, output: Actuator) -> bool {
        self.outputs[output.index()]
    }

    pub fn last_message(&self) -> Option<&DisplayMessage> {
        self.last_message.as_ref()
    }

    pub fn record_temperature_c(&mut self, celsius: f32, now_ms: u64) {
        self.record_temperature_f(fahrenheit_from_celsius(celsius), now_ms);
    }

    pub fn record_temperature_f(&mut self, fahrenheit: i32, now_ms: u64) {
        self.smoother.observe(fahrenheit);
        self.last_sample_ms = Some(now_ms);
    }

    pub fn set_humidity(&mut self, humidity: Option<u8>) {
        self.humidity = humidity.filter(|percent| *percent <= 100);
    }

    pub fn handle_input(&mut self, event: InputEvent, now_ms: u64) -> Vec<EngineAction> {
        let mut actions = Vec::new();

        match event {
            InputEvent::TemperatureIncrement | InputEvent::TemperatureDecrement
                if self.emergency.is_active() =>
            {
                debug!("setpoint change ignored during emergency: {event:?}");
            }
            InputEvent::TemperatureIncrement => {
                self.setpoint.increment();
            }
            InputEvent::TemperatureDecrement => {
                self.setpoint.decrement();
            }
            InputEvent::DoorToggle => {
                // Closing only re-arms evaluation; the next tick recomputes the mode.
                if self.door.toggle(now_ms) == DoorTransition::Opened {
                    self.hvac.force_off();
                    self.hvac_lights = false;
                }
            }
            InputEvent::MotionDetected => {
                self.motion.on_motion(now_ms);
            }
        }

        self.sync_outputs(&mut actions);
        actions
    }

    pub fn tick(&mut self, now_ms: u64) -> Vec<EngineAction> {
        self.door.expire(now_ms);

        let smoothed = match self.smoother.current() {
            Ok(value) => value,
            Err(err) => {
                debug!("skipping tick: {err}");
                return Vec::new();
            }
        };

        let index = self.comfort.compute(smoothed, self.humidity);
        self.comfort_index = Some(index);

        let decision = self.hvac.evaluate(
            index,
            self.setpoint.desired(),
            self.door.is_closed(),
            now_ms,
        );
        self.hvac_lights = decision.mode.is_active();

        if !self.emergency.evaluate(index) {
            self.blinker.step(false, now_ms);
        }

        let mut actions = Vec::new();
        self.sync_outputs(&mut actions);

        let message = arbitrate(&self.display_inputs(index, now_ms));
        let dwell_ms = match (&message, decision.announcement) {
            (DisplayMessage::HvacAnnouncement(_), Some(_)) => Some(self.config.hvac_announce_ms),
            _ => None,
        };
        self.last_message = Some(message.clone());
        actions.push(EngineAction::Render { message, dwell_ms });

        actions
    }

    pub fn poll_motion(&mut self, now_ms: u64) -> Vec<EngineAction> {
        let mut actions = Vec::new();
        if self.motion.on_no_motion(now_ms) {
            self.sync_outputs(&mut actions);
        }
        actions
    }

    pub fn alarm_tick(&mut self, now_ms: u64) -> Vec<EngineAction> {
        let mut actions = Vec::new();
        if self
            .blinker
            .step(self.emergency.is_active(), now_ms)
            .is_some()
        {
            self.sync_outputs(&mut actions);
        }
        actions
    }

    /// Sleep between `alarm_tick` calls.
    pub fn alarm_interval_ms(&self) -> u64 {
        if self.emergency.is_active() {
            self.config.blink_toggle_ms
        } else {
            self.config.blink_idle_ms
        }
    }

    pub fn status(&self, now_ms: u64) -> ZoneStatus {
        let (min_temp, max_temp) = self.setpoint.bounds();
        let display = self
            .last_message
            .as_ref()
            .map(DisplayMessage::lines)
            .unwrap_or_default();

        ZoneStatus {
            desired_temp: self.setpoint.desired(),
            min_temp,
            max_temp,
            smoothed_temp: self.smoothed_temp_f(),
            comfort_index: self.comfort_index,
            humidity: self.humidity,
            door_closed: self.door.is_closed(),
            door_announcing: self.door.is_announcing(now_ms),
            hvac_mode: self.hvac.mode().as_str(),
            hvac_announcing: self.hvac.announcing(now_ms).is_some(),
            hvac_lights: self.hvac_lights,
            motion_lights: self.motion.lights_on(),
            ambient_light: self.output(Actuator::AmbientLight),
            emergency: self.emergency.is_active(),
            alarm: self.output(Actuator::Alarm),
            ms_since_sample: self
                .last_sample_ms
                .map(|last| now_ms.saturating_sub(last)),
            ms_since_motion: self.motion.ms_since_motion(now_ms),
            display,
        }
    }

    fn display_inputs(&self, index: i32, now_ms: u64) -> DisplayInputs {
        DisplayInputs {
            emergency: self.emergency.is_active(),
            door_announcement: self.door.announcement(now_ms),
            hvac_announcement: self.hvac.announcing(now_ms),
            desired_f: self.setpoint.desired(),
            current_f: index,
            door_closed: self.door.is_closed(),
            hvac: self.hvac.mode(),
            lights_on: self.desired_level(Actuator::AmbientLight),
        }
    }

    fn desired_level(&self, output: Actuator) -> bool {
        match output {
            Actuator::HeatIndicator => self.hvac.mode() == HvacMode::Heat,
            Actuator::CoolIndicator => self.hvac.mode() == HvacMode::Cool,
            // Either flag asserted keeps the shared light on.
            Actuator::AmbientLight => self.motion.lights_on() || self.hvac_lights,
            Actuator::Alarm => self.blinker.output_on(),
        }
    }

    fn sync_outputs(&mut self, actions: &mut Vec<EngineAction>) {
        for output in Actuator::ALL {
            let level = self.desired_level(output);
            if self.outputs[output.index()] != level {
                self.outputs[output.index()] = level;
                actions.push(EngineAction::Set(output, level));
            }
        }
    }
}
