use crate::types::HvacMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacPhase {
    Steady(HvacMode),
    Announcing { mode: HvacMode, until_ms: u64 },
}

impl HvacPhase {
    pub fn mode(self) -> HvacMode {
        match self {
            Self::Steady(mode) | Self::Announcing { mode, .. } => mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HvacDecision {
    pub mode: HvacMode,
    /// Set on the evaluation that opened a new announcement.
    pub announcement: Option<HvacMode>,
}

// Exact offset match, no hysteresis.
pub fn requested_mode(comfort_f: i32, desired_f: i32, door_closed: bool, band_f: i32) -> HvacMode {
    if !door_closed {
        return HvacMode::Off;
    }
    let offset = comfort_f.saturating_sub(desired_f);
    if offset == -band_f {
        HvacMode::Heat
    } else if offset == band_f {
        HvacMode::Cool
    } else {
        HvacMode::Off
    }
}

#[derive(Debug, Clone)]
pub struct HvacController {
    band_offset_f: i32,
    announce_ms: u64,
    phase: HvacPhase,
}

impl HvacController {
    pub fn new(band_offset_f: i32, announce_ms: u64) -> Self {
        Self {
            band_offset_f,
            announce_ms,
            phase: HvacPhase::Steady(HvacMode::Off),
        }
    }

    pub fn mode(&self) -> HvacMode {
        self.phase.mode()
    }

    pub fn phase(&self) -> HvacPhase {
        self.phase
    }

    pub fn announcing(&self, now_ms: u64) -> Option<HvacMode> {
        match self.phase {
            HvacPhase::Announcing { mode, until_ms } if now_ms < until_ms => Some(mode),
            _ => None,
        }
    }

    pub fn evaluate(
        &mut self,
        comfort_f: i32,
        desired_f: i32,
        door_closed: bool,
        now_ms: u64,
    ) -> HvacDecision {
        let requested = requested_mode(comfort_f, desired_f, door_closed, self.band_offset_f);

        if requested == HvacMode::Off {
            self.phase = HvacPhase::Steady(HvacMode::Off);
            return HvacDecision {
                mode: HvacMode::Off,
                announcement: None,
            };
        }

        match self.phase {
            HvacPhase::Announcing { mode, until_ms } if mode == requested => {
                if now_ms >= until_ms {
                    self.phase = HvacPhase::Steady(mode);
                }
                HvacDecision {
                    mode,
                    announcement: None,
                }
            }
            _ => {
                self.phase = HvacPhase::Announcing {
                    mode: requested,
                    until_ms: now_ms.saturating_add(self.announce_ms),
                };
                HvacDecision {
                    mode: requested,
                    announcement: Some(requested),
                }
            }
        }
    }

    pub fn force_off(&mut self) -> bool {
        let changed = self.mode() != HvacMode::Off;
        self.phase = HvacPhase::Steady(HvacMode::Off);
        changed
    }
}

impl Default for HvacController {
    fn default() -> Self {
        Self::new(3, 3_000)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn exact_offsets_only() {
        assert_eq!(requested_mode(67, 70, true, 3), HvacMode::Heat);
        assert_eq!(requested_mode(73, 70, true, 3), HvacMode::Cool);
        assert_eq!(requested_mode(66, 70, true, 3), HvacMode::Off);
        assert_eq!(requested_mode(68, 70, true, 3), HvacMode::Off);
        assert_eq!(requested_mode(74, 70, true, 3), HvacMode::Off);
        assert_eq!(requested_mode(70, 70, true, 3), HvacMode::Off);
    }

    #[test]
    fn open_door_overrides_offset() {
        assert_eq!(requested_mode(67, 70, false, 3), HvacMode::Off);
        assert_eq!(requested_mode(73, 70, false, 3), HvacMode::Off);
    }

    #[test]
    fn entering_heat_announces_once_per_dwell() {
        let mut hvac = HvacController::default();

        let first = hvac.evaluate(67, 70, true, 0);
        assert_eq!(
            first,
            HvacDecision {
                mode: HvacMode::Heat,
                announcement: Some(HvacMode::Heat),
            }
        );
        assert_eq!(hvac.announcing(500), Some(HvacMode::Heat));

        let second = hvac.evaluate(67, 70, true, 500);
        assert_eq!(second.announcement, None);
        assert_eq!(second.mode, HvacMode::Heat);
    }

    #[test]
    fn lapsed_dwell_shows_steady_then_reannounces() {
        let mut hvac = HvacController::default();
        hvac.evaluate(73, 70, true, 0);

        let lapsed = hvac.evaluate(73, 70, true, 3_000);
        assert_eq!(lapsed.announcement, None);
        assert_eq!(hvac.phase(), HvacPhase::Steady(HvacMode::Cool));
        assert_eq!(hvac.announcing(3_000), None);

        let again = hvac.evaluate(73, 70, true, 3_500);
        assert_eq!(again.announcement, Some(HvacMode::Cool));
    }

    #[test]
    fn offset_drift_snaps_back_to_off() {
        let mut hvac = HvacController::default();
        hvac.evaluate(67, 70, true, 0);

        let drifted = hvac.evaluate(68, 70, true, 500);
        assert_eq!(drifted.mode, HvacMode::Off);
        assert_eq!(hvac.announcing(600), None);
    }

    #[test]
    fn switching_heat_to_cool_announces_new_mode() {
        let mut hvac = HvacController::default();
        hvac.evaluate(67, 70, true, 0);

        let cool = hvac.evaluate(67, 64, true, 1_000);
        assert_eq!(cool.announcement, Some(HvacMode::Cool));
        assert_eq!(hvac.mode(), HvacMode::Cool);
    }

    #[test]
    fn force_off_clears_announcement() {
        let mut hvac = HvacController::default();
        hvac.evaluate(73, 70, true, 0);

        assert!(hvac.force_off());
        assert_eq!(hvac.mode(), HvacMode::Off);
        assert_eq!(hvac.announcing(100), None);
        assert!(!hvac.force_off());
    }
}
