// logmux - platform/dir_source.rs
//
// Filesystem-backed source provider.
//
// Layout:
//   <root>/<source>/<sub-source>.log
//
// Every immediate sub-directory of the root is a source; every file directly
// inside it that matches the include globs (and no exclude glob) is a
// sub-source named after the file stem. Hidden entries are skipped. Walk
// order is by file name, which gives the source set its natural order.
//
// Error policy:
//   - Root missing / not a directory / permission denied are fatal
//     `DiscoveryError`s.
//   - Unreadable entries below the root are skipped and logged at debug.

use crate::core::model::{SourceDescriptor, SourceEntry, SourceSet};
use crate::core::source::{ByteStream, SourceProvider, StreamOptions};
use crate::platform::follow::FollowReader;
use crate::util::constants;
use crate::util::error::DiscoveryError;
use std::io;
use std::path::{Path, PathBuf};

// =============================================================================
// Configuration
// =============================================================================

/// Where to look for sources and which files count as sub-sources.
#[derive(Debug, Clone)]
pub struct DirectorySourceConfig {
    /// Directory whose sub-directories are the sources.
    pub root: PathBuf,

    /// Filename globs a sub-source file MUST match. Empty = any file.
    pub include_patterns: Vec<String>,

    /// Filename globs that exclude a file. Literal patterns (no wildcards)
    /// also exclude source directories of that name.
    pub exclude_patterns: Vec<String>,
}

impl Default for DirectorySourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(constants::DEFAULT_SOURCE_ROOT),
            include_patterns: constants::DEFAULT_INCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            exclude_patterns: constants::DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

// =============================================================================
// Provider
// =============================================================================

#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
}

impl DirectorySource {
    pub fn new(config: DirectorySourceConfig) -> Self {
        Self {
            include: compile_patterns(&config.include_patterns, "include"),
            exclude: compile_patterns(&config.exclude_patterns, "exclude"),
            root: config.root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn preflight(&self) -> Result<(), DiscoveryError> {
        let path = self.root.clone();
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(DiscoveryError::NotADirectory { path }),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(DiscoveryError::PermissionDenied { path, source: e })
            }
            Err(_) => Err(DiscoveryError::RootNotFound { path }),
        }
    }

    /// Sub-source name for a file, or `None` when the file is filtered out.
    fn sub_source_name<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        if file_name.starts_with('.') || is_excluded_filename(file_name, &self.exclude) {
            return None;
        }
        if !is_included(file_name, &self.include) {
            return None;
        }
        Path::new(file_name).file_stem().and_then(|s| s.to_str())
    }

    fn is_source_dir_name(&self, name: &str) -> bool {
        !name.starts_with('.') && !is_excluded_component(name, &self.exclude)
    }

    /// Locate the file backing `descriptor`: the first file (by name) in the
    /// source directory whose sub-source name matches.
    fn find_file(&self, descriptor: &SourceDescriptor) -> io::Result<PathBuf> {
        if !is_plain_name(&descriptor.source) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid source name '{}'", descriptor.source),
            ));
        }
        let source_dir = self.root.join(&descriptor.source);

        let walker = walkdir::WalkDir::new(&source_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };
            if self.sub_source_name(file_name) == Some(descriptor.sub_source.as_str()) {
                return Ok(entry.into_path());
            }
        }

        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no log file for {} under '{}'", descriptor.label(), source_dir.display()),
        ))
    }
}

impl SourceProvider for DirectorySource {
    fn list_sources(&self) -> Result<SourceSet, DiscoveryError> {
        self.preflight()?;

        tracing::debug!(
            root = %self.root.display(),
            include = ?self.include.iter().map(glob::Pattern::as_str).collect::<Vec<_>>(),
            exclude = ?self.exclude.iter().map(glob::Pattern::as_str).collect::<Vec<_>>(),
            "Source discovery starting"
        );

        let walker = walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(2)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Only depth-1 directories are sources; decide descent there.
                if e.depth() == 1 && e.file_type().is_dir() {
                    return e
                        .file_name()
                        .to_str()
                        .is_some_and(|name| self.is_source_dir_name(name));
                }
                true
            });

        let mut entries: Vec<SourceEntry> = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(e) if e.depth() == 0 => {
                    return Err(DiscoveryError::Traversal {
                        path: self.root.clone(),
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping inaccessible entry");
                    continue;
                }
            };

            let Some(name) = entry.file_name().to_str() else {
                tracing::debug!(path = %entry.path().display(), "Skipping non-UTF-8 name");
                continue;
            };

            match (entry.depth(), entry.file_type().is_dir()) {
                (1, true) => entries.push(SourceEntry::new(name, Vec::<String>::new())),
                (2, false) if entry.file_type().is_file() => {
                    let Some(current) = entries.last_mut() else {
                        continue;
                    };
                    let Some(sub) = self.sub_source_name(name) else {
                        tracing::trace!(file = name, "Not a sub-source");
                        continue;
                    };
                    if current.sub_sources.iter().any(|s| s == sub) {
                        tracing::warn!(
                            source = %current.name,
                            sub_source = sub,
                            file = %entry.path().display(),
                            "Duplicate sub-source name; keeping the first file"
                        );
                        continue;
                    }
                    current.sub_sources.push(sub.to_string());
                }
                _ => {}
            }
        }

        let set = SourceSet::new(entries);
        tracing::debug!(
            sources = set.entries.len(),
            pairs = set.pair_count(),
            "Source discovery complete"
        );
        Ok(set)
    }

    fn open_stream(
        &self,
        descriptor: &SourceDescriptor,
        options: &StreamOptions,
    ) -> io::Result<ByteStream> {
        let path = self.find_file(descriptor)?;
        let reader = FollowReader::open(&path, options)?;
        tracing::debug!(source = %descriptor, file = %reader.path().display(), "Tailing file");
        Ok(Box::new(reader))
    }
}

// =============================================================================
// Glob helpers
// =============================================================================

/// Compile a list of glob pattern strings into `glob::Pattern` objects.
/// Patterns that fail to compile are logged as warnings and skipped.
fn compile_patterns(patterns: &[String], kind: &str) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(pattern = p, kind, error = %e, "Invalid glob pattern, skipping");
                None
            }
        })
        .collect()
}

/// Literal exclude patterns (no wildcards) name directories to skip.
fn is_excluded_component(dir_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    exclude_pats.iter().any(|p| {
        let s = p.as_str();
        !s.contains('*') && !s.contains('?') && !s.contains('[') && p.matches(dir_name)
    })
}

fn is_excluded_filename(file_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    exclude_pats.iter().any(|p| p.matches(file_name))
}

/// An empty include list means "include all".
fn is_included(file_name: &str, include_pats: &[glob::Pattern]) -> bool {
    include_pats.is_empty() || include_pats.iter().any(|p| p.matches(file_name))
}

/// A single path component that cannot climb out of the root.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains(std::path::MAIN_SEPARATOR)
}

// =============================================================================
// Tests
// =============================================================================
