use parking_lot::Mutex as SyncMutex;
use std::io::Write;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Helper struct for capturing the log output of the code under test.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<SyncMutex<Vec<u8>>>,
}

impl LogCapture {
    /// Initializes a new, empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the given closure with a subscriber writing into this capture,
    /// for the current thread only.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(Level::TRACE)
            .without_time()
            .finish();

        tracing::subscriber::with_default(subscriber, f)
    }

    /// Returns all lines captured so far.
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.buffer.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Returns the captured lines logged at the given level.
    pub fn lines_at(&self, level: Level) -> Vec<String> {
        let level = level.to_string();

        self.lines()
            .into_iter()
            .filter(|line| line.split_whitespace().next() == Some(level.as_str()))
            .collect()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);

        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
