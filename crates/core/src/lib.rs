pub use channels::selection::{parse_channel_command, ChannelSelection, ChannelSetError};
pub use channels::state::{ChannelState, ChannelStateTracker};
pub use config::{ConfigError, ConfigManager, ConfigSchema, Settings};
pub use console::LightingConsole;
pub use cue::cue::{Cue, CueNumber, MAX_FADE_SECS};
pub use cue::cue_store::CueStore;
pub use engine::{Direction, Engine, EngineConfig, EngineState, MAX_CHANNELS};
pub use error::{ConsoleError, Result};
pub use messages::{ConsoleCommand, ConsoleEvent};
pub use output::{
    encode_frame, FrameEncoder, FrameSink, LoopControl, LoopExit, LoopStats, OutputHandle,
    OutputLoop, SharedEngine, WriterSink, FRAME_MARKER, MARKER_SUBSTITUTE,
};
pub use show::show::{CueRecord, Show, SHOW_EXTENSION, SHOW_FORMAT_VERSION};
pub use show::show_manager::ShowManager;
pub use snapshot::{CueRow, EngineSnapshot};

mod channels;
mod config;
mod console;
mod cue;
mod engine;
mod error;
pub mod messages;
mod output;
mod show;
mod snapshot;
