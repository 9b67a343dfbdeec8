//! Serial frame format.
//!
//! Each frame is a start marker followed by one byte per channel:
//!
//! ```text
//! 0x10 | ch1 | ch2 | ... | chN
//! ```
//!
//! The receiver resynchronises on the marker, so a channel level equal to the
//! marker is sent as `marker + 1`. The substitution is lossy: a requested
//! level of 16 goes out as 17. Only the encoded bytes change; the engine keeps
//! the requested level.

pub const FRAME_MARKER: u8 = 0x10;

/// Level sent in place of a level that collides with the marker.
pub const MARKER_SUBSTITUTE: u8 = FRAME_MARKER + 1;

/// Encodes channel levels into frames, reusing one buffer.
#[derive(Debug, Default)]
pub struct FrameEncoder {
    buffer: Vec<u8>,
}

impl FrameEncoder {
    pub fn new(channel_count: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(channel_count + 1),
        }
    }

    /// Encode `levels` and return the frame bytes.
    pub fn encode(&mut self, levels: &[u8]) -> &[u8] {
        self.buffer.clear();
        self.buffer.push(FRAME_MARKER);
        self.buffer.extend(levels.iter().map(|&level| escape(level)));
        &self.buffer
    }

    /// The most recently encoded frame.
    pub fn frame(&self) -> &[u8] {
        &self.buffer
    }
}

/// One-shot encode into a fresh vector.
pub fn encode_frame(levels: &[u8]) -> Vec<u8> {
    FrameEncoder::new(levels.len()).encode(levels).to_vec()
}

fn escape(level: u8) -> u8 {
    if level == FRAME_MARKER {
        MARKER_SUBSTITUTE
    } else {
        level
    }
}
