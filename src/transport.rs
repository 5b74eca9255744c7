use embedded_io_async::{Read, Write};

/// The byte link to a sensor.
///
/// Reads follow [`embedded_io_async::Read`], with one convention on top: a
/// read that times out without receiving anything returns `Ok(0)`.
///
/// Besides reading and writing, the link must be able to drop and re-acquire
/// its connection. Closing discards whatever the sensor had queued, which is
/// how stale frames are flushed between exchanges.
#[allow(async_fn_in_trait)]
pub trait Transport: Read + Write {
    /// Acquires the connection.
    async fn open(&mut self) -> Result<(), Self::Error>;

    /// Releases the connection and any buffered input.
    async fn close(&mut self) -> Result<(), Self::Error>;

    /// Closes then reopens the connection.
    ///
    /// If closing fails the connection is not reopened, so a second handle is
    /// never held alongside the first.
    async fn reconnect(&mut self) -> Result<(), Self::Error> {
        self.close().await?;
        self.open().await
    }
}
