// Native JSON document format

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::Document;

/// Parse a document from a JSON string.
pub fn read_str(s: &str) -> Result<Document, String> {
    serde_json::from_str(s).map_err(|e| e.to_string())
}

/// Serialize a document as pretty-printed JSON.
pub fn write_string(doc: &Document) -> Result<String, String> {
    serde_json::to_string_pretty(doc).map_err(|e| e.to_string())
}

/// Read a document from a JSON file.
pub fn read_file(path: &Path) -> Result<Document, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| e.to_string())
}

/// Write a document to a JSON file.
pub fn write_file(doc: &Document, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, doc).map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellRecord;
    use tempfile::tempdir;

    fn sample() -> Document {
        Document {
            cells: vec![
                CellRecord {
                    name: "A1".to_string(),
                    content: "5".to_string(),
                    x: 10.0,
                    y: 20.5,
                },
                CellRecord {
                    name: "B1".to_string(),
                    content: "=A1*2".to_string(),
                    x: 0.0,
                    y: 0.0,
                },
            ],
        }
    }

    #[test]
    fn test_string_roundtrip() {
        let doc = sample();
        let json = write_string(&doc).unwrap();
        let parsed = read_str(&json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("canvas.json");

        let doc = sample();
        write_file(&doc, &path).unwrap();
        let loaded = read_file(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_position_defaults_to_zero() {
        let doc = read_str(r#"{"cells":[{"name":"A1","content":"5"}]}"#).unwrap();
        assert_eq!(doc.cells[0].x, 0.0);
        assert_eq!(doc.cells[0].y, 0.0);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(read_str("{").is_err());
        assert!(read_str(r#"{"cells": 5}"#).is_err());
    }
}
