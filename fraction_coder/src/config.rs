// fraction_coder/src/config.rs

//! Limits and progress reporting for the coding loops.

use std::ops::ControlFlow;

/// Default upper bound on message length, in bytes.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 1 << 30;
/// Default number of symbols between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 4096;

/// Settings shared by compression and decompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodingConfig {
    /// Longest message accepted by `compress` or declared by a container.
    pub max_message_len: usize,
    /// Symbols processed between two calls of the progress observer.
    pub progress_interval: usize,
}

impl Default for CodingConfig {
    fn default() -> Self {
        CodingConfig {
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Which loop is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Encoding,
    Decoding,
}

/// A progress report handed to the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    pub processed: usize,
    pub total: usize,
}

/// Observer called between symbol iterations. Returning
/// `ControlFlow::Break(())` aborts the running transform.
pub type ProgressObserver<'a> = &'a mut dyn FnMut(Progress) -> ControlFlow<()>;

/// Observer that never aborts.
pub fn no_progress(_: Progress) -> ControlFlow<()> {
    ControlFlow::Continue(())
}
