// Document serialization - canvas records, native JSON and legacy XML

pub mod json;
pub mod xml;

use std::path::Path;

use serde::{Deserialize, Serialize};

use gridcalc_engine::grid::Grid;
use gridcalc_engine::name::CellName;
use gridcalc_engine::recalc::RecalcReport;

/// One persisted cell: name, raw content, and canvas position.
///
/// Position is a front-end concern carried opaquely; the engine only ever
/// reads `name` and `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// An ordered collection of cell records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub cells: Vec<CellRecord>,
}

impl Document {
    /// Rebuild a grid from this document.
    ///
    /// Replays `define` for every record - record order does not matter,
    /// since edges depend only on final content - then runs one full
    /// recalculation pass to resolve all values.
    pub fn apply(&self, grid: &mut Grid) -> Result<RecalcReport, String> {
        for record in &self.cells {
            let name: CellName = record
                .name
                .parse()
                .map_err(|e| format!("bad cell name {:?}: {}", record.name, e))?;
            grid.define(name, &record.content);
        }
        Ok(grid.recompute_all())
    }

    /// Capture a grid's cells as records, sorted by name.
    ///
    /// The engine does not track canvas positions; front ends that do
    /// should build the document themselves and keep their coordinates.
    pub fn from_grid(grid: &Grid) -> Document {
        let cells = grid
            .names()
            .into_iter()
            .map(|name| {
                let content = grid.cell(&name).map(|c| c.content.raw_display()).unwrap_or_default();
                CellRecord {
                    name: name.as_str().to_string(),
                    content,
                    x: 0.0,
                    y: 0.0,
                }
            })
            .collect();
        Document { cells }
    }
}

/// Load a document, dispatching on file extension (`.xml` is the legacy
/// canvas format, everything else the native JSON format).
pub fn load_file(path: &Path) -> Result<Document, String> {
    if has_xml_extension(path) {
        xml::read_file(path)
    } else {
        json::read_file(path)
    }
}

/// Save a document, dispatching on file extension like [`load_file`].
pub fn save_file(doc: &Document, path: &Path) -> Result<(), String> {
    if has_xml_extension(path) {
        xml::write_file(doc, path)
    } else {
        json::write_file(doc, path)
    }
}

fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}
