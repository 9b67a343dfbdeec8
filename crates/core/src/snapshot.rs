use serde::Serialize;

use crate::channels::state::ChannelState;
use crate::cue::cue::CueNumber;
use crate::engine::EngineState;

/// One line of the cue list as a display would draw it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CueRow {
    pub number: CueNumber,
    pub up_time: f64,
    pub down_time: f64,
    pub description: String,
    pub is_current: bool,
}

/// Read-only copy of the engine for displays. Taken under the engine lock
/// and detached from it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub state: EngineState,
    pub output: Vec<u8>,
    pub channel_states: Vec<ChannelState>,
    pub current_cue_index: usize,
    pub current_cue: Option<CueNumber>,
    /// 0.0..=1.0 through the running fade, 0.0 in standby.
    pub transition_progress: f32,
    pub cue_window: Vec<CueRow>,
    pub suggested_next_number: Option<CueNumber>,
}

impl EngineSnapshot {
    pub fn captured_channels(&self) -> impl Iterator<Item = usize> + '_ {
        self.channel_states
            .iter()
            .enumerate()
            .filter(|(_, state)| state.is_captured())
            .map(|(channel, _)| channel)
    }
}
