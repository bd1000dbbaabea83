// logmux - core/source.rs
//
// The seam between the multiplexer and whatever knows where logs live.
// A provider answers two questions: which sources exist, and how to get a
// byte stream for one of them.

use crate::core::model::{SourceDescriptor, SourceSet};
use crate::util::constants;
use crate::util::error::DiscoveryError;
use std::io::{self, Read};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Options passed to [`SourceProvider::open_stream`].
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Keep the stream open and wait for new content at end-of-file.
    pub follow: bool,

    /// Start from the beginning of existing content instead of "now".
    /// Ignored when `follow` is false (a non-following stream always
    /// reads what exists).
    pub from_start: bool,

    /// How long a following stream waits before re-checking for content.
    pub poll_interval: Duration,

    /// Shared cancel flag. Following streams report end-of-file once set.
    pub cancel: Arc<AtomicBool>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            follow: true,
            from_start: false,
            poll_interval: Duration::from_millis(constants::TAIL_POLL_INTERVAL_MS),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// A boxed, thread-transferable byte stream.
pub type ByteStream = Box<dyn Read + Send>;

/// Discovery and stream acquisition for one kind of log backend.
pub trait SourceProvider: Send + Sync {
    /// Enumerate every source and its ordered sub-sources.
    ///
    /// Called once per run, before any tailer starts.
    fn list_sources(&self) -> Result<SourceSet, DiscoveryError>;

    /// Open a live byte stream for one pair.
    ///
    /// Failure here only affects the tailer for `descriptor`.
    fn open_stream(
        &self,
        descriptor: &SourceDescriptor,
        options: &StreamOptions,
    ) -> io::Result<ByteStream>;
}
