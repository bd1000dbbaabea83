// logmux - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Errors are grouped by the subsystem that produced them; the top-level
// `LogMuxError` only carries the ones that are fatal to a run.

use crate::core::model::SourceDescriptor;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for a multiplexing run.
#[derive(Debug)]
pub enum LogMuxError {
    /// Sources could not be enumerated.
    Discovery(DiscoveryError),

    /// The selector could not be resolved against the discovered sources.
    Selection(SelectionError),

    /// Writing to the output sink failed.
    Sink(SinkError),
}

impl fmt::Display for LogMuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Selection(e) => write!(f, "Selection error: {e}"),
            Self::Sink(e) => write!(f, "Output error: {e}"),
        }
    }
}

impl std::error::Error for LogMuxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Discovery(e) => Some(e),
            Self::Selection(e) => Some(e),
            Self::Sink(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors raised while enumerating sources.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The source root does not exist.
    RootNotFound { path: PathBuf },

    /// The source root is not a directory.
    NotADirectory { path: PathBuf },

    /// Permission denied accessing the source root.
    PermissionDenied { path: PathBuf, source: io::Error },

    /// Walkdir traversal of the root failed.
    Traversal {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Source root '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Source root '{}' is not a directory", path.display())
            }
            Self::PermissionDenied { path, source } => {
                write!(
                    f,
                    "Permission denied accessing '{}': {source}",
                    path.display()
                )
            }
            Self::Traversal { path, source } => {
                write!(f, "Error traversing '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PermissionDenied { source, .. } => Some(source),
            Self::Traversal { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for LogMuxError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Selection errors
// ---------------------------------------------------------------------------

/// Errors raised while resolving a selector against the source set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Discovery succeeded but found no (source, sub-source) pair to tail.
    NoSourcesAvailable,

    /// The source set is non-empty but nothing matched the selector.
    /// Absent criteria are carried as empty strings.
    NotFound { source: String, sub_source: String },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSourcesAvailable => write!(f, "no sources to tail logs from"),
            Self::NotFound { source, sub_source } => write!(
                f,
                "[{sub_source}] is not a valid sub-source in source [{source}]"
            ),
        }
    }
}

impl std::error::Error for SelectionError {}

impl From<SelectionError> for LogMuxError {
    fn from(e: SelectionError) -> Self {
        Self::Selection(e)
    }
}

// ---------------------------------------------------------------------------
// Stream errors (per source, never fatal)
// ---------------------------------------------------------------------------

/// A failure confined to one source's stream.
#[derive(Debug)]
pub enum StreamError {
    /// The stream could not be opened.
    Open {
        descriptor: SourceDescriptor,
        source: io::Error,
    },

    /// Reading from an open stream failed.
    Read {
        descriptor: SourceDescriptor,
        source: io::Error,
    },
}

impl StreamError {
    /// The source whose stream failed.
    pub fn descriptor(&self) -> &SourceDescriptor {
        match self {
            Self::Open { descriptor, .. } | Self::Read { descriptor, .. } => descriptor,
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { descriptor, source } => {
                write!(f, "Cannot open stream {}: {source}", descriptor.label())
            }
            Self::Read { descriptor, source } => {
                write!(f, "Read error on stream {}: {source}", descriptor.label())
            }
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Read { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Sink errors
// ---------------------------------------------------------------------------

/// Errors writing multiplexed output.
#[derive(Debug)]
pub enum SinkError {
    /// Writing or flushing a line failed.
    Write {
        lines_written: u64,
        source: io::Error,
    },
}

impl SinkError {
    /// The underlying I/O error kind.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Write { source, .. } => source.kind(),
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write {
                lines_written,
                source,
            } => write!(f, "write failed after {lines_written} lines: {source}"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Write { source, .. } => Some(source),
        }
    }
}

impl From<SinkError> for LogMuxError {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
///
/// Never fatal: `platform::config::load_config` reports them alongside
/// default values and the binary logs them as warnings.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for logmux results.
pub type Result<T> = std::result::Result<T, LogMuxError>;
