/// Over-temperature alarm. Not sticky: recomputed from each new index.
#[derive(Debug, Clone)]
pub struct EmergencyMonitor {
    ceiling_f: i32,
    active: bool,
}

impl EmergencyMonitor {
    pub fn new(ceiling_f: i32) -> Self {
        Self {
            ceiling_f,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn evaluate(&mut self, comfort_index: i32) -> bool {
        self.active = comfort_index > self.ceiling_f;
        self.active
    }
}

impl Default for EmergencyMonitor {
    fn default() -> Self {
        Self::new(95)
    }
}

#[derive(Debug, Clone)]
pub struct AlarmBlinker {
    toggle_ms: u64,
    output_on: bool,
    last_toggle_ms: Option<u64>,
}

impl AlarmBlinker {
    pub fn new(toggle_ms: u64) -> Self {
        Self {
            toggle_ms,
            output_on: false,
            last_toggle_ms: None,
        }
    }

    pub fn output_on(&self) -> bool {
        self.output_on
    }

    /// Returns the new output level when it changes.
    pub fn step(&mut self, active: bool, now_ms: u64) -> Option<bool> {
        if !active {
            self.last_toggle_ms = None;
            if self.output_on {
                self.output_on = false;
                return Some(false);
            }
            return None;
        }

        let due = self
            .last_toggle_ms
            .map(|last| now_ms.saturating_sub(last) >= self.toggle_ms)
            .unwrap_or(true);
        if !due {
            return None;
        }

        self.output_on = !self.output_on;
        self.last_toggle_ms = Some(now_ms);
        Some(self.output_on)
    }
}
