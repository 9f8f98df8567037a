use std::collections::VecDeque;

use crate::error::ZoneError;

// Truncates toward zero.
pub fn fahrenheit_from_celsius(celsius: f32) -> i32 {
    (celsius * 9.0 / 5.0 + 32.0) as i32
}

#[derive(Debug, Clone)]
pub struct TemperatureSmoother {
    capacity: usize,
    window: VecDeque<i32>,
}

impl TemperatureSmoother {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            window: VecDeque::with_capacity(capacity),
        }
    }

    pub fn observe(&mut self, sample_f: i32) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(sample_f);
    }

    pub fn current(&self) -> Result<i32, ZoneError> {
        if self.window.is_empty() {
            return Err(ZoneError::NoReadings);
        }
        let sum: i64 = self.window.iter().map(|&sample| i64::from(sample)).sum();
        let average = sum.div_euclid(self.window.len() as i64);
        Ok(average as i32)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

impl Default for TemperatureSmoother {
    fn default() -> Self {
        Self::new(3)
    }
}
