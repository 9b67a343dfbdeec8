use serde::{Deserialize, Serialize};

use crate::channels::selection::ChannelSelection;

/// How a channel is moving in the current transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelState {
    #[default]
    NoChange,
    Rising,
    Falling,
    /// Pinned by the operator; cue playback leaves it alone until released.
    Captured,
}

impl ChannelState {
    pub fn is_captured(self) -> bool {
        self == ChannelState::Captured
    }
}

/// Per-channel classification for the whole universe.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelStateTracker {
    states: Vec<ChannelState>,
}

impl ChannelStateTracker {
    pub fn new(channel_count: usize) -> Self {
        Self {
            states: vec![ChannelState::NoChange; channel_count],
        }
    }

    pub fn states(&self) -> &[ChannelState] {
        &self.states
    }

    pub fn get(&self, channel: usize) -> Option<ChannelState> {
        self.states.get(channel).copied()
    }

    pub fn captured_count(&self) -> usize {
        self.states.iter().filter(|state| state.is_captured()).count()
    }

    /// Compare the cue being left with the cue being entered and mark every
    /// uncaptured channel as rising, falling or unchanged.
    pub fn reclassify(&mut self, old_values: &[u8], new_values: &[u8]) {
        for ((state, old), new) in self.states.iter_mut().zip(old_values).zip(new_values) {
            if state.is_captured() {
                continue;
            }
            *state = match new.cmp(old) {
                std::cmp::Ordering::Greater => ChannelState::Rising,
                std::cmp::Ordering::Less => ChannelState::Falling,
                std::cmp::Ordering::Equal => ChannelState::NoChange,
            };
        }
    }

    /// Put every captured channel back to the cue's level and forget the
    /// capture. Returns the channels (0-based) that were released.
    pub fn release_all(&mut self, cue_values: &[u8], output: &mut [u8]) -> Vec<usize> {
        let mut released = Vec::new();
        for (channel, state) in self.states.iter_mut().enumerate() {
            if !state.is_captured() {
                continue;
            }
            if let (Some(level), Some(value)) = (output.get_mut(channel), cue_values.get(channel)) {
                *level = *value;
            }
            *state = ChannelState::NoChange;
            released.push(channel);
        }
        released
    }

    /// Pin the selected channels at `value`.
    pub fn capture(&mut self, selection: &ChannelSelection, value: u8, output: &mut [u8]) {
        for channel in selection.indices() {
            if let (Some(state), Some(level)) = (self.states.get_mut(channel), output.get_mut(channel))
            {
                *state = ChannelState::Captured;
                *level = value;
            }
        }
    }

    /// Reset every channel, captured or not, to `NoChange`.
    pub fn clear(&mut self) {
        self.states.fill(ChannelState::NoChange);
    }
}
