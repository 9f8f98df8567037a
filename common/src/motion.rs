/// Independent of the HVAC-active lighting flag kept by the engine.
#[derive(Debug, Clone)]
pub struct MotionLighting {
    linger_ms: u64,
    last_motion_ms: u64,
    lights_on: bool,
}

impl MotionLighting {
    pub fn new(linger_ms: u64, now_ms: u64) -> Self {
        Self {
            linger_ms,
            last_motion_ms: now_ms,
            lights_on: false,
        }
    }

    pub fn lights_on(&self) -> bool {
        self.lights_on
    }

    pub fn ms_since_motion(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_motion_ms)
    }

    pub fn on_motion(&mut self, now_ms: u64) -> bool {
        self.last_motion_ms = now_ms;
        let changed = !self.lights_on;
        self.lights_on = true;
        changed
    }

    /// Level-triggered: must be called on every poll without motion.
    pub fn on_no_motion(&mut self, now_ms: u64) -> bool {
        if self.lights_on && self.ms_since_motion(now_ms) >= self.linger_ms {
            self.lights_on = false;
            return true;
        }
        false
    }
}
