// logmux - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
//
// These types are the shared vocabulary across all layers.

use crate::util::error::StreamError;
use std::fmt;

// =============================================================================
// Sources
// =============================================================================

/// One log-producing unit: a source and a named stream within it.
///
/// Equality is by the `(source, sub_source)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceDescriptor {
    /// Source name (e.g. one running instance).
    pub source: String,

    /// Sub-source name (e.g. one process or stream within the instance).
    pub sub_source: String,
}

impl SourceDescriptor {
    pub fn new(source: impl Into<String>, sub_source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            sub_source: sub_source.into(),
        }
    }

    /// Composite identifier: the printed prefix and the colour-table key.
    pub fn label(&self) -> String {
        format!("[{} {}]", self.source, self.sub_source)
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.sub_source)
    }
}

/// A source together with its ordered sub-source names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub name: String,
    pub sub_sources: Vec<String>,
}

impl SourceEntry {
    pub fn new<I, S>(name: impl Into<String>, sub_sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            sub_sources: sub_sources.into_iter().map(Into::into).collect(),
        }
    }
}

/// Every source known at selection time, in discovery order.
///
/// Populated once per run and never refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    pub entries: Vec<SourceEntry>,
}

impl SourceSet {
    pub fn new(entries: Vec<SourceEntry>) -> Self {
        Self { entries }
    }

    /// True when discovery found no sources at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of `(source, sub-source)` pairs.
    pub fn pair_count(&self) -> usize {
        self.entries.iter().map(|e| e.sub_sources.len()).sum()
    }

    /// Every pair, flattened in natural order.
    pub fn descriptors(&self) -> Vec<SourceDescriptor> {
        self.entries
            .iter()
            .flat_map(|entry| {
                entry
                    .sub_sources
                    .iter()
                    .map(|sub| SourceDescriptor::new(entry.name.as_str(), sub.as_str()))
            })
            .collect()
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Raw user selection criteria. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub source: Option<String>,
    pub sub_source: Option<String>,
}

impl Selector {
    /// Build a selector, treating empty strings as absent.
    pub fn new(source: Option<String>, sub_source: Option<String>) -> Self {
        Self {
            source: source.filter(|s| !s.is_empty()),
            sub_source: sub_source.filter(|s| !s.is_empty()),
        }
    }

    /// True when neither criterion is set.
    pub fn is_unfiltered(&self) -> bool {
        self.source.is_none() && self.sub_source.is_none()
    }
}

/// Resolved selection outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Tail every sub-source of every source.
    Unfiltered,

    /// Tail exactly one pair.
    Exact(SourceDescriptor),
}

impl Selection {
    /// The pairs to spawn tailers for.
    pub fn targets(&self, set: &SourceSet) -> Vec<SourceDescriptor> {
        match self {
            Self::Unfiltered => set.descriptors(),
            Self::Exact(descriptor) => vec![descriptor.clone()],
        }
    }
}

// =============================================================================
// Output
// =============================================================================

/// A line ready for output: `<coloured identifier> <raw line>\n`.
///
/// Ownership moves from the tailer to the aggregator at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine(String);

impl FormattedLine {
    /// Join a painted identifier and a raw line, guaranteeing exactly one
    /// trailing newline. Everything before the newline, `\r` included, is
    /// kept as read.
    pub fn new(painted_label: &str, raw: &str) -> Self {
        let body = raw.strip_suffix('\n').unwrap_or(raw);
        Self(format!("{painted_label} {body}\n"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

// =============================================================================
// Run outcome
// =============================================================================

/// Why a single tailer stopped.
#[derive(Debug)]
pub enum TailExit {
    /// The stream reported end-of-file.
    EndOfStream,

    /// The cancel flag was raised.
    Cancelled,

    /// The aggregator stopped receiving.
    OutputClosed,

    /// The stream could not be opened; the source was skipped.
    OpenFailed(StreamError),

    /// The stream failed mid-read; the tailer stopped quietly.
    ReadFailed(StreamError),

    /// The tailer thread panicked. Only reachable in builds that unwind;
    /// the release profile sets `panic = "abort"`, where a panicking tailer
    /// ends the process instead.
    Panicked,
}

impl TailExit {
    /// True for outcomes where the source failed rather than finished.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::OpenFailed(_) | Self::ReadFailed(_) | Self::Panicked
        )
    }
}

/// Summary of a completed multiplexing run.
#[derive(Debug, Default)]
pub struct MuxSummary {
    /// Number of tailer threads started.
    pub tailers_spawned: usize,

    /// Lines written to the sink.
    pub lines_written: u64,

    /// Exit reason of every tailer that was joined.
    pub exits: Vec<(SourceDescriptor, TailExit)>,

    /// Tailers still running when the run was cancelled.
    pub detached: usize,
}

impl MuxSummary {
    /// Number of joined tailers that ended in a per-source failure.
    pub fn failed_sources(&self) -> usize {
        self.exits.iter().filter(|(_, exit)| exit.is_failure()).count()
    }
}
