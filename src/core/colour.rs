// logmux - core/colour.rs
//
// Stable colour assignment for composite source identifiers.
//
// The table is shared by every tailer thread. Lookup and assignment happen
// under a single mutex guard so two tailers can never both see an identifier
// as new and advance the cursor twice for it.

use colored::{Color, Colorize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Default palette, in assignment order.
pub const DEFAULT_PALETTE: &[Color] = &[
    Color::Yellow,
    Color::Red,
    Color::Cyan,
    Color::Green,
    Color::Magenta,
];

#[derive(Debug, Default)]
struct ColorTable {
    assigned: HashMap<String, Color>,
    /// Index of the next palette slot to hand out.
    cursor: usize,
}

/// Assigns each identifier a colour from a fixed palette, round-robin.
///
/// Append-only for its lifetime: identifiers are never evicted.
#[derive(Debug)]
pub struct ColorAssigner {
    palette: Vec<Color>,
    table: Mutex<ColorTable>,
}

impl ColorAssigner {
    pub fn new() -> Self {
        Self::with_palette(DEFAULT_PALETTE.to_vec())
    }

    /// Use a custom palette. An empty palette falls back to the default.
    pub fn with_palette(palette: Vec<Color>) -> Self {
        let palette = if palette.is_empty() {
            DEFAULT_PALETTE.to_vec()
        } else {
            palette
        };
        Self {
            palette,
            table: Mutex::new(ColorTable::default()),
        }
    }

    /// Colour for `identifier`, assigning the next palette slot on first sight.
    pub fn pick(&self, identifier: &str) -> Color {
        // Insert is the last write under the guard; a poisoned table is
        // still consistent.
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(colour) = table.assigned.get(identifier) {
            return *colour;
        }

        if table.cursor >= self.palette.len() {
            table.cursor = 0;
        }
        let colour = self.palette[table.cursor];
        table.cursor += 1;
        table.assigned.insert(identifier.to_string(), colour);

        tracing::trace!(identifier, colour = ?colour, "Colour assigned");
        colour
    }

    /// `identifier` rendered in its colour. Honours the global `colored`
    /// override, so this is plain text when colour output is disabled.
    pub fn paint(&self, identifier: &str) -> String {
        identifier.color(self.pick(identifier)).to_string()
    }

    /// Number of identifiers assigned so far.
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .assigned
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::new()
    }
}
