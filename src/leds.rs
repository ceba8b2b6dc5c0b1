//! X52 Pro LED layout.
//!
//! The unit exposes 20 LEDs. Most buttons carry a red/green pair that reads as
//! a bicolor indicator ([`LedColour`]); the fire button and throttle axis have a
//! single LED each.

use std::str::FromStr;

/// Number of LEDs on the X52 Pro.
pub const LED_COUNT: usize = 20;

/// State of a red/green LED pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedColour {
    Red,
    Green,
    /// Both LEDs lit.
    Orange,
    Off,
}

impl LedColour {
    /// `(red_on, green_on)`.
    pub fn levels(self) -> (bool, bool) {
        match self {
            LedColour::Red => (true, false),
            LedColour::Green => (false, true),
            LedColour::Orange => (true, true),
            LedColour::Off => (false, false),
        }
    }
}

impl FromStr for LedColour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(LedColour::Red),
            "green" => Ok(LedColour::Green),
            "orange" | "amber" => Ok(LedColour::Orange),
            "off" => Ok(LedColour::Off),
            other => Err(format!("unknown LED colour `{other}`")),
        }
    }
}

/// Named indicator on the X52 Pro.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Indicator {
    Fire,
    FireA,
    FireB,
    FireD,
    FireE,
    Toggle1_2,
    Toggle3_4,
    Toggle5_6,
    Pov2,
    Clutch,
    ThrottleAxis,
}

/// LEDs backing an [`Indicator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedSlot {
    Single(usize),
    Pair { red: usize, green: usize },
}

impl Indicator {
    pub const ALL: [Indicator; 11] = [
        Indicator::Fire,
        Indicator::FireA,
        Indicator::FireB,
        Indicator::FireD,
        Indicator::FireE,
        Indicator::Toggle1_2,
        Indicator::Toggle3_4,
        Indicator::Toggle5_6,
        Indicator::Pov2,
        Indicator::Clutch,
        Indicator::ThrottleAxis,
    ];

    pub fn slot(self) -> LedSlot {
        let pair = |red, green| LedSlot::Pair { red, green };
        match self {
            Indicator::Fire => LedSlot::Single(0),
            Indicator::FireA => pair(1, 2),
            Indicator::FireB => pair(3, 4),
            Indicator::FireD => pair(5, 6),
            Indicator::FireE => pair(7, 8),
            Indicator::Toggle1_2 => pair(9, 10),
            Indicator::Toggle3_4 => pair(11, 12),
            Indicator::Toggle5_6 => pair(13, 14),
            Indicator::Pov2 => pair(15, 16),
            Indicator::Clutch => pair(17, 18),
            Indicator::ThrottleAxis => LedSlot::Single(19),
        }
    }
}
