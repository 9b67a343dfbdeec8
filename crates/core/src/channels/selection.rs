//! Operator channel selection syntax.
//!
//! `<channels>*<level>` where `<channels>` is `/` for every channel or a list
//! of terms joined by `,` or `+`. A term is a channel number or an inclusive
//! range `a-b` written in either order. Channel numbers are 1-based and are
//! clamped into the rig. Whitespace is ignored.
//!
//! ```text
//! 1-3+7*200    channels 1, 2, 3 and 7 at 200
//! /*0          everything at 0
//! 12-9,40*50   channels 9 through 12 and 40 at 50
//! ```

use std::collections::BTreeSet;

use thiserror::Error;

const SELECT_ALL: &str = "/";
const LEVEL_SEPARATOR: char = '*';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelSetError {
    #[error("expected exactly one '*' between channels and level")]
    MissingLevel,

    #[error("'{0}' is not a channel level")]
    InvalidLevel(String),

    #[error("'{0}' is not a channel or channel range")]
    InvalidTerm(String),

    #[error("no channels selected")]
    Empty,
}

/// A set of 0-based channel indices inside the rig.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSelection {
    channels: BTreeSet<usize>,
}

impl ChannelSelection {
    pub fn all(channel_count: usize) -> Self {
        Self {
            channels: (0..channel_count).collect(),
        }
    }

    /// Parse the channel half of the syntax (everything before `*`).
    pub fn parse(spec: &str, channel_count: usize) -> Result<Self, ChannelSetError> {
        let spec: String = spec.chars().filter(|c| !c.is_whitespace()).collect();
        if spec.is_empty() || channel_count == 0 {
            return Err(ChannelSetError::Empty);
        }
        if spec == SELECT_ALL {
            return Ok(Self::all(channel_count));
        }

        let mut channels = BTreeSet::new();
        for term in spec.split([',', '+']) {
            let (low, high) = match term.split_once('-') {
                Some((a, b)) => (parse_channel(a, term)?, parse_channel(b, term)?),
                None => {
                    let channel = parse_channel(term, term)?;
                    (channel, channel)
                }
            };
            let (low, high) = (low.min(high), low.max(high));
            let low = clamp_channel(low, channel_count);
            let high = clamp_channel(high, channel_count);
            channels.extend(low..=high);
        }

        Ok(Self { channels })
    }

    /// 0-based indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.channels.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn contains(&self, channel: usize) -> bool {
        self.channels.contains(&channel)
    }
}

/// Parse a full `<channels>*<level>` entry.
pub fn parse_channel_command(
    input: &str,
    channel_count: usize,
) -> Result<(ChannelSelection, u8), ChannelSetError> {
    let mut parts = input.split(LEVEL_SEPARATOR);
    let (Some(channels), Some(level), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ChannelSetError::MissingLevel);
    };
    let level = parse_level(level)?;
    let selection = ChannelSelection::parse(channels, channel_count)?;
    Ok((selection, level))
}

/// Levels may be written with decimals; they are rounded and clamped to a
/// byte.
pub fn parse_level(text: &str) -> Result<u8, ChannelSetError> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ChannelSetError::InvalidLevel(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(ChannelSetError::InvalidLevel(trimmed.to_string()));
    }
    Ok(value.round().clamp(0.0, 255.0) as u8)
}

fn parse_channel(text: &str, term: &str) -> Result<u64, ChannelSetError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ChannelSetError::InvalidTerm(term.to_string()));
    }
    // All digits, so the only failure left is overflow.
    Ok(text.parse().unwrap_or(u64::MAX))
}

/// 1-based channel number to a 0-based index inside the rig.
fn clamp_channel(channel: u64, channel_count: usize) -> usize {
    (channel.clamp(1, channel_count as u64) - 1) as usize
}
