use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Destination for encoded frames.
#[async_trait]
pub trait FrameSink: Send {
    /// Write one complete frame.
    async fn send_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Flush and release the transport.
    async fn close(&mut self) -> io::Result<()>;

    /// Name used in log lines.
    fn describe(&self) -> String;
}

/// Frame sink over any async byte stream, typically the serial device.
pub struct WriterSink<W> {
    writer: W,
    name: String,
}

impl<W> WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W, name: impl Into<String>) -> Self {
        Self {
            writer,
            name: name.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<tokio::fs::File> {
    /// Open a character device (or plain file) for writing. Line settings
    /// such as baud rate are left to the device's current configuration.
    pub async fn open_device(path: &Path) -> io::Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create(false)
            .open(path)
            .await?;
        log::info!("Opened DMX transport {}", path.display());
        Ok(Self::new(file, path.display().to_string()))
    }
}

#[async_trait]
impl<W> FrameSink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.writer.write_all(frame).await?;
        self.writer.flush().await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
