// logmux - core/selection.rs
//
// Resolves user selection criteria against the discovered source set.
// Core layer: pure logic, no I/O.
//
// Matching is first-match-wins in discovery order: the first source whose
// name matches (any source when no name was given) and that contains a
// matching sub-source (any when none was given) is the result.

use crate::core::model::{SourceDescriptor, SourceSet, Selection, Selector};
use crate::util::error::SelectionError;

/// Resolve `selector` against `set`.
///
/// A set without any (source, sub-source) pair is always
/// `NoSourcesAvailable`, even for an unfiltered selector, so "nothing to
/// tail" is reported the same way in both modes. Sources whose directories
/// hold no log files count as empty.
pub fn resolve(selector: &Selector, set: &SourceSet) -> Result<Selection, SelectionError> {
    if set.pair_count() == 0 {
        return Err(SelectionError::NoSourcesAvailable);
    }

    if selector.is_unfiltered() {
        return Ok(Selection::Unfiltered);
    }

    let wanted_source = selector.source.as_deref();
    let wanted_sub = selector.sub_source.as_deref();

    for entry in &set.entries {
        if wanted_source.is_some_and(|name| name != entry.name) {
            continue;
        }
        let hit = entry
            .sub_sources
            .iter()
            .find(|sub| wanted_sub.map_or(true, |name| name == sub.as_str()));
        if let Some(sub) = hit {
            let descriptor = SourceDescriptor::new(entry.name.as_str(), sub.as_str());
            tracing::debug!(selection = %descriptor, "Selector resolved");
            return Ok(Selection::Exact(descriptor));
        }
    }

    Err(SelectionError::NotFound {
        source: wanted_source.unwrap_or_default().to_string(),
        sub_source: wanted_sub.unwrap_or_default().to_string(),
    })
}
