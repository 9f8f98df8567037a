#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherIndexCalculator {
    humidity_weight: f64,
}

impl WeatherIndexCalculator {
    pub fn new(humidity_weight: f64) -> Self {
        Self { humidity_weight }
    }

    // Ties round to even.
    pub fn compute(&self, smoothed_f: i32, humidity: Option<u8>) -> i32 {
        match humidity {
            Some(percent) => {
                let raw = f64::from(smoothed_f) + self.humidity_weight * f64::from(percent);
                raw.round_ties_even() as i32
            }
            None => smoothed_f,
        }
    }
}

impl Default for WeatherIndexCalculator {
    fn default() -> Self {
        Self::new(0.05)
    }
}
