//! In-memory ring of captured call stacks for postmortem diagnostics.
//!
//! Independent of the transfer engine: nothing here touches pstore or the log.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::trace;

/// Upper bound on frames kept per record.
pub const MAX_FRAMES: usize = 32;

/// One captured call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackRecord {
    /// Module path or function label supplied by the caller.
    pub scope: &'static str,
    /// Source file of the capture point.
    pub file: &'static str,
    /// Source line of the capture point.
    pub line: u32,
    /// Symbolised frames, innermost first; empty when capture is unsupported.
    pub frames: Vec<String>,
    /// Capture time.
    pub captured_at: DateTime<Utc>,
}

/// Bounded ring buffer of [`StackRecord`]s; the oldest record is evicted first.
#[derive(Debug)]
pub struct StackTracer {
    capacity: usize,
    ring: Mutex<VecDeque<StackRecord>>,
}

impl StackTracer {
    /// Create a tracer holding at most `capacity` records (minimum one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            ring: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<StackRecord>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Capture the current call stack and push it into the ring.
    pub fn record(&self, scope: &'static str, file: &'static str, line: u32) {
        let frames = capture_frames(MAX_FRAMES);
        trace!(scope, file, line, frames = frames.len(), "stack tracer");
        self.push(StackRecord {
            scope,
            file,
            line,
            frames,
            captured_at: Utc::now(),
        });
    }

    fn push(&self, record: StackRecord) {
        let mut ring = self.lock();
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(record);
    }

    /// Records currently held, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<StackRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the ring is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of records retained.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for StackTracer {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

fn capture_frames(limit: usize) -> Vec<String> {
    let backtrace = Backtrace::force_capture();
    if backtrace.status() != BacktraceStatus::Captured {
        return Vec::new();
    }
    // Frame lines render as "<index>: <symbol>"; location lines start with "at".
    backtrace
        .to_string()
        .lines()
        .filter_map(|line| {
            let (index, symbol) = line.trim_start().split_once(": ")?;
            index.parse::<usize>().ok()?;
            Some(symbol.trim().to_string())
        })
        .take(limit)
        .collect()
}

/// Record the current call stack into a [`StackTracer`] at the call site.
#[macro_export]
macro_rules! stack_trace {
    ($tracer:expr) => {
        $tracer.record(module_path!(), file!(), line!())
    };
}
