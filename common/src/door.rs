#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorTransition {
    Opened,
    Closed,
}

impl DoorTransition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opened => "open",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DoorMonitor {
    announce_ms: u64,
    is_closed: bool,
    last_change_ms: Option<u64>,
    announce_until_ms: Option<u64>,
}

impl DoorMonitor {
    pub fn new(announce_ms: u64) -> Self {
        Self {
            announce_ms,
            is_closed: true,
            last_change_ms: None,
            announce_until_ms: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    pub fn last_change_ms(&self) -> Option<u64> {
        self.last_change_ms
    }

    pub fn announce_until_ms(&self) -> Option<u64> {
        self.announce_until_ms
    }

    pub fn toggle(&mut self, now_ms: u64) -> DoorTransition {
        self.is_closed = !self.is_closed;
        self.last_change_ms = Some(now_ms);
        self.announce_until_ms = Some(now_ms.saturating_add(self.announce_ms));

        if self.is_closed {
            DoorTransition::Closed
        } else {
            DoorTransition::Opened
        }
    }

    pub fn is_announcing(&self, now_ms: u64) -> bool {
        self.announce_until_ms
            .map(|until| now_ms < until)
            .unwrap_or(false)
    }

    /// The transition to announce, if the window is still open.
    pub fn announcement(&self, now_ms: u64) -> Option<DoorTransition> {
        if !self.is_announcing(now_ms) {
            return None;
        }
        Some(if self.is_closed {
            DoorTransition::Closed
        } else {
            DoorTransition::Opened
        })
    }

    pub fn expire(&mut self, now_ms: u64) {
        if self.announce_until_ms.is_some() && !self.is_announcing(now_ms) {
            self.announce_until_ms = None;
        }
    }
}

pub fn door_abbreviation(closed: bool) -> &'static str {
    if closed {
        "C"
    } else {
        "O"
    }
}

impl Default for DoorMonitor {
    fn default() -> Self {
        Self::new(3_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed_and_quiet() {
        let door = DoorMonitor::default();
        assert!(door.is_closed());
        assert!(!door.is_announcing(0));
        assert_eq!(door_abbreviation(door.is_closed()), "C");
    }

    #[test]
    fn abbreviation_follows_toggles() {
        let mut door = DoorMonitor::default();
        door.toggle(0);
        assert_eq!(door_abbreviation(door.is_closed()), "O");
        door.toggle(10);
        assert_eq!(door_abbreviation(door.is_closed()), "C");
    }

    #[test]
    fn toggle_opens_window_for_three_seconds() {
        let mut door = DoorMonitor::default();

        assert_eq!(door.toggle(1_000), DoorTransition::Opened);
        assert_eq!(door.last_change_ms(), Some(1_000));
        assert!(door.is_announcing(1_000));
        assert!(door.is_announcing(3_999));
        assert!(!door.is_announcing(4_000));
    }

    #[test]
    fn expire_clears_deadline_only_after_it_passes() {
        let mut door = DoorMonitor::default();
        door.toggle(0);

        door.expire(2_999);
        assert_eq!(door.announce_until_ms(), Some(3_000));

        door.expire(3_000);
        assert_eq!(door.announce_until_ms(), None);
    }

    #[test]
    fn retoggle_restarts_window_with_new_text() {
        let mut door = DoorMonitor::default();
        door.toggle(0);
        assert_eq!(door.announcement(2_000), Some(DoorTransition::Opened));

        assert_eq!(door.toggle(2_500), DoorTransition::Closed);
        assert_eq!(door.announcement(5_000), Some(DoorTransition::Closed));
        assert_eq!(door.announcement(5_500), None);
    }
}
