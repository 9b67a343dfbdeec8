pub mod frame;
pub mod output_loop;
pub mod sink;

pub use frame::{encode_frame, FrameEncoder, FRAME_MARKER, MARKER_SUBSTITUTE};
pub use output_loop::{LoopControl, LoopExit, LoopStats, OutputHandle, OutputLoop, SharedEngine};
pub use sink::{FrameSink, WriterSink};
