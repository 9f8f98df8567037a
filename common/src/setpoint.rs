use crate::config::SetpointSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetpointStore {
    desired_f: i32,
    min_f: i32,
    max_f: i32,
}

impl SetpointStore {
    pub fn new(mut settings: SetpointSettings) -> Self {
        settings.sanitize();
        Self {
            desired_f: settings.desired_f,
            min_f: settings.min_f,
            max_f: settings.max_f,
        }
    }

    pub fn desired(&self) -> i32 {
        self.desired_f
    }

    pub fn bounds(&self) -> (i32, i32) {
        (self.min_f, self.max_f)
    }

    pub fn increment(&mut self) -> bool {
        self.set(self.desired_f.saturating_add(1))
    }

    pub fn decrement(&mut self) -> bool {
        self.set(self.desired_f.saturating_sub(1))
    }

    fn set(&mut self, value: i32) -> bool {
        let clamped = value.clamp(self.min_f, self.max_f);
        if clamped == self.desired_f {
            return false;
        }
        self.desired_f = clamped;
        true
    }
}

impl Default for SetpointStore {
    fn default() -> Self {
        Self::new(SetpointSettings::default())
    }
}
