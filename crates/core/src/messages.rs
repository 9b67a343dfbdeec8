use std::path::PathBuf;

use crate::cue::cue::CueNumber;
use crate::output::LoopStats;
use crate::snapshot::EngineSnapshot;

/// Commands sent from a front end to the console
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    // Playback
    Go,
    Back,
    GoTo {
        number: CueNumber,
    },

    // Programming
    RecordCue {
        number: Option<CueNumber>,
        /// Falls back to the configured default when absent.
        up_time: Option<f64>,
        down_time: Option<f64>,
        description: String,
    },
    /// A full `<channels>*<level>` entry.
    SetChannels {
        input: String,
    },
    ReleaseAll,
    DeleteCue {
        number: CueNumber,
    },

    // Show management
    NewShow {
        name: String,
    },
    LoadShow {
        path: PathBuf,
    },
    SaveShow {
        path: Option<PathBuf>,
    },

    // Queries
    Snapshot,

    // System
    Shutdown,
}

/// Events sent from the console back to the front end
#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    // Playback events
    TransitionStarted {
        cue_index: usize,
        number: CueNumber,
    },
    /// Go past the last cue or back past the first.
    NoChange,

    // Programming events
    CueRecorded {
        index: usize,
        number: CueNumber,
    },
    ChannelsCaptured {
        channels: Vec<usize>,
        level: u8,
    },
    ChannelsReleased {
        channels: Vec<usize>,
    },
    CueDeleted {
        index: usize,
        number: CueNumber,
    },

    // Show events
    ShowCreated {
        name: String,
    },
    ShowLoaded {
        name: String,
        cue_count: usize,
    },
    ShowSaved {
        path: PathBuf,
    },

    // Query responses
    Snapshot {
        snapshot: EngineSnapshot,
    },

    // System events
    ShutdownComplete {
        stats: LoopStats,
    },
}
