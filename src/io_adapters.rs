use crate::command::{OutputFactory, Stdout};
use std::io::{Result as IoResult, Write};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Session output backed by the process stdout.
pub struct InheritedOutput;

impl OutputFactory for InheritedOutput {
    fn create(&self) -> Box<dyn Stdout> {
        Box::new(std::io::stdout())
    }
}

/// Memory-backed writer for capturing command output.
///
/// Clones share one buffer, so a `MemWriter` can serve as an
/// [`OutputFactory`] while writers it handed out earlier are still in use on
/// other threads. Each `write` call appends its bytes under the lock in one
/// piece; commands that emit whole lines per call therefore never interleave
/// mid-line.
#[derive(Clone, Default)]
pub struct MemWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl Stdout for MemWriter {
    /// In-memory capture has no OS handle to hand to a child process.
    fn stdio(self: Box<Self>) -> Stdio {
        Stdio::null()
    }
}

impl OutputFactory for MemWriter {
    fn create(&self) -> Box<dyn Stdout> {
        Box::new(self.clone())
    }
}
