use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConsoleError;

/// Longest fade a cue may carry, in seconds.
pub const MAX_FADE_SECS: f64 = 99.9;

/// A cue number with one decimal of precision, stored as integer tenths so
/// that lookups compare exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct CueNumber(u16);

impl CueNumber {
    pub const ZERO: CueNumber = CueNumber(0);
    pub const MAX: CueNumber = CueNumber(9999);

    /// Build a cue number from tenths, saturating at 999.9.
    pub fn from_tenths(tenths: u16) -> Self {
        CueNumber(tenths.min(Self::MAX.0))
    }

    /// Clamp to [0, 999.9] and round to one decimal. Returns `None` for NaN
    /// and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let tenths = (value * 10.0).round().clamp(0.0, Self::MAX.0 as f64);
        Some(CueNumber(tenths as u16))
    }

    pub fn tenths(self) -> u16 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 10.0
    }

    /// The next whole number above this one, capped at 999.9.
    pub fn next_whole(self) -> Self {
        Self::from_tenths((self.0 / 10 + 1) * 10)
    }
}

impl TryFrom<f64> for CueNumber {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        CueNumber::from_f64(value).ok_or_else(|| format!("invalid cue number: {}", value))
    }
}

impl From<CueNumber> for f64 {
    fn from(number: CueNumber) -> Self {
        number.as_f64()
    }
}

impl FromStr for CueNumber {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| ConsoleError::InvalidInput(format!("'{}' is not a cue number", s)))?;
        CueNumber::from_f64(value)
            .ok_or_else(|| ConsoleError::InvalidInput(format!("'{}' is not a cue number", s)))
    }
}

impl fmt::Display for CueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

/// A recorded target state for every channel plus its fade timing.
///
/// Cues are never edited in place; re-recording a number replaces the whole
/// cue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub number: CueNumber,
    pub values: Vec<u8>,
    /// Seconds used by channels that rise into this cue.
    pub up_time: f64,
    /// Seconds used by channels that fall into this cue.
    pub down_time: f64,
    pub description: String,
}

impl Cue {
    /// Create a cue, clamping both fade times to `[min_fade, 99.9]`.
    /// A fade can never be shorter than one frame.
    pub fn new(
        number: CueNumber,
        values: Vec<u8>,
        up_time: f64,
        down_time: f64,
        description: impl Into<String>,
        min_fade: f64,
    ) -> Self {
        Self {
            number,
            values,
            up_time: clamp_fade(up_time, min_fade),
            down_time: clamp_fade(down_time, min_fade),
            description: description.into(),
        }
    }

    /// Longest of the two fade times; the transition is complete after this.
    pub fn fade_time(&self) -> f64 {
        self.up_time.max(self.down_time)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cue {} up {:.1}s down {:.1}s {}",
            self.number, self.up_time, self.down_time, self.description
        )
    }
}

fn clamp_fade(secs: f64, min_fade: f64) -> f64 {
    let min_fade = min_fade.min(MAX_FADE_SECS);
    if secs.is_nan() {
        return min_fade;
    }
    secs.clamp(min_fade, MAX_FADE_SECS)
}
