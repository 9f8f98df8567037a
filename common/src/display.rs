use crate::{
    door::{door_abbreviation, DoorTransition},
    types::{on_off, HvacMode},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMessage {
    Emergency {
        door_closed: bool,
    },
    DoorAnnouncement(DoorTransition),
    HvacAnnouncement(HvacMode),
    Status {
        desired_f: i32,
        current_f: i32,
        door_closed: bool,
        hvac: HvacMode,
        lights_on: bool,
    },
}

impl DisplayMessage {
    pub fn lines(&self) -> [String; 2] {
        match self {
            Self::Emergency { door_closed } => [
                format!("FIRE!  Dr:{}", door_abbreviation(*door_closed)),
                "EVACUATE".to_string(),
            ],
            Self::DoorAnnouncement(transition) => {
                [format!("Door/window {}!", transition.as_str()), String::new()]
            }
            Self::HvacAnnouncement(mode) => [
                format!("{} TURNING", mode.display_label()),
                "      ON".to_string(),
            ],
            Self::Status {
                desired_f,
                current_f,
                door_closed,
                hvac,
                lights_on,
            } => [
                format!(
                    "{desired_f}/{current_f} Dr:{}",
                    door_abbreviation(*door_closed)
                ),
                format!("H:{} L:{}", hvac.display_label(), on_off(*lights_on)),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayInputs {
    pub emergency: bool,
    pub door_announcement: Option<DoorTransition>,
    pub hvac_announcement: Option<HvacMode>,
    pub desired_f: i32,
    pub current_f: i32,
    pub door_closed: bool,
    pub hvac: HvacMode,
    pub lights_on: bool,
}

pub fn arbitrate(inputs: &DisplayInputs) -> DisplayMessage {
    if inputs.emergency {
        return DisplayMessage::Emergency {
            door_closed: inputs.door_closed,
        };
    }
    if let Some(transition) = inputs.door_announcement {
        return DisplayMessage::DoorAnnouncement(transition);
    }
    if let Some(mode) = inputs.hvac_announcement {
        return DisplayMessage::HvacAnnouncement(mode);
    }
    DisplayMessage::Status {
        desired_f: inputs.desired_f,
        current_f: inputs.current_f,
        door_closed: inputs.door_closed,
        hvac: inputs.hvac,
        lights_on: inputs.lights_on,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn quiet() -> DisplayInputs {
        DisplayInputs {
            emergency: false,
            door_announcement: None,
            hvac_announcement: None,
            desired_f: 70,
            current_f: 72,
            door_closed: true,
            hvac: HvacMode::Off,
            lights_on: false,
        }
    }

    #[test]
    fn normal_status_lines() {
        let message = arbitrate(&quiet());
        assert_eq!(
            message.lines(),
            ["70/72 Dr:C".to_string(), "H:OFF L:OFF".to_string()]
        );
    }

    #[test]
    fn cool_mode_is_labelled_ac() {
        let message = arbitrate(&DisplayInputs {
            current_f: 73,
            hvac: HvacMode::Cool,
            lights_on: true,
            ..quiet()
        });
        assert_eq!(message.lines()[1], "H:AC L:ON");
    }

    #[test]
    fn emergency_beats_door_announcement() {
        let message = arbitrate(&DisplayInputs {
            emergency: true,
            door_announcement: Some(DoorTransition::Opened),
            door_closed: false,
            ..quiet()
        });
        assert_eq!(
            message.lines(),
            ["FIRE!  Dr:O".to_string(), "EVACUATE".to_string()]
        );
    }

    #[test]
    fn door_announcement_beats_hvac_announcement() {
        let message = arbitrate(&DisplayInputs {
            door_announcement: Some(DoorTransition::Closed),
            hvac_announcement: Some(HvacMode::Heat),
            ..quiet()
        });
        assert_eq!(message, DisplayMessage::DoorAnnouncement(DoorTransition::Closed));
        assert_eq!(message.lines()[0], "Door/window closed!");
    }

    #[test]
    fn hvac_announcement_text() {
        let message = arbitrate(&DisplayInputs {
            hvac_announcement: Some(HvacMode::Cool),
            ..quiet()
        });
        assert_eq!(
            message.lines(),
            ["AC TURNING".to_string(), "      ON".to_string()]
        );
    }
}
