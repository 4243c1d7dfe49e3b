//! Output sinks for captured worker lines

use crate::types::OutputEntry;
use parking_lot::Mutex;
use solr_common::{ProcessError, ProcessResult};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Destination for worker output.
///
/// Sinks are shared between the supervisor actor and whoever inspects them,
/// so writes take `&self`.
pub trait OutputSink: Send + Sync {
    /// Write one entry
    fn write(&self, entry: &OutputEntry) -> ProcessResult<()>;

    /// Flush any buffered output
    fn flush(&self) -> ProcessResult<()>;
}

/// Re-emits every line as an `info` event with target `worker`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOutputSink;

impl OutputSink for TracingOutputSink {
    fn write(&self, entry: &OutputEntry) -> ProcessResult<()> {
        tracing::info!(target: "worker", "[{}] {}", entry.worker_id, entry.text());
        Ok(())
    }

    fn flush(&self) -> ProcessResult<()> {
        Ok(())
    }
}

/// Appends lines to a file.
pub struct FileOutputSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl FileOutputSink {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn new(path: PathBuf) -> ProcessResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ProcessError::output_failed(
                    path.display().to_string(),
                    format!("Failed to create log directory: {}", e),
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                ProcessError::output_failed(
                    path.display().to_string(),
                    format!("Failed to open log file: {}", e),
                )
            })?;

        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for FileOutputSink {
    fn write(&self, entry: &OutputEntry) -> ProcessResult<()> {
        // Format: [timestamp] [worker/line] message
        let line = format!(
            "[{}] [{}/{}] {}\n",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            entry.worker_id,
            entry.line_number,
            entry.text()
        );

        self.writer.lock().write_all(line.as_bytes()).map_err(|e| {
            ProcessError::output_failed(
                self.path.display().to_string(),
                format!("Failed to write to log file: {}", e),
            )
        })
    }

    fn flush(&self) -> ProcessResult<()> {
        self.writer.lock().flush().map_err(|e| {
            ProcessError::output_failed(
                self.path.display().to_string(),
                format!("Failed to flush log file: {}", e),
            )
        })
    }
}

impl Drop for FileOutputSink {
    fn drop(&mut self) {
        let _ = self.writer.get_mut().flush();
    }
}

/// Keeps the last `max_size` entries in memory.
pub struct CircularBufferOutputSink {
    buffer: Mutex<VecDeque<OutputEntry>>,
    max_size: usize,
}

impl CircularBufferOutputSink {
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(max_size)),
            max_size,
        }
    }

    /// Snapshot of buffered entries, oldest first.
    pub fn entries(&self) -> Vec<OutputEntry> {
        self.buffer.lock().iter().cloned().collect()
    }

    /// Buffered lines as text, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.buffer.lock().iter().map(OutputEntry::text).collect()
    }
}

impl OutputSink for CircularBufferOutputSink {
    fn write(&self, entry: &OutputEntry) -> ProcessResult<()> {
        if self.max_size == 0 {
            return Ok(());
        }

        let mut buffer = self.buffer.lock();
        if buffer.len() == self.max_size {
            buffer.pop_front();
        }
        buffer.push_back(entry.clone());
        Ok(())
    }

    fn flush(&self) -> ProcessResult<()> {
        Ok(())
    }
}
