// Legacy canvas XML format, as written by the original desktop product:
//
//   <Canvas>
//     <Element name="E1" content="=E2*2" x="125.0" y="40.0" />
//     ...
//   </Canvas>

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::{CellRecord, Document};

/// Parse a document from canvas XML.
pub fn read_str(xml: &str) -> Result<Document, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut cells = Vec::new();
    let mut saw_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match e.name().as_ref() {
                    b"Canvas" => {
                        saw_root = true;
                    }
                    b"Element" => {
                        if !saw_root {
                            return Err("expected <Canvas> root element".to_string());
                        }
                        cells.push(parse_element(e)?);
                    }
                    other => {
                        return Err(format!(
                            "unexpected element <{}>",
                            String::from_utf8_lossy(other)
                        ));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
        buf.clear();
    }

    if !saw_root {
        return Err("expected <Canvas> root element".to_string());
    }

    Ok(Document { cells })
}

fn parse_element(e: &BytesStart) -> Result<CellRecord, String> {
    let mut name: Option<String> = None;
    let mut content: Option<String> = None;
    let mut x = 0.0f64;
    let mut y = 0.0f64;

    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let value = attr
            .unescape_value()
            .map_err(|e| e.to_string())?
            .into_owned();
        match attr.key.as_ref() {
            b"name" => name = Some(value),
            b"content" => content = Some(value),
            b"x" => x = value.parse().map_err(|_| format!("bad x coordinate: {}", value))?,
            b"y" => y = value.parse().map_err(|_| format!("bad y coordinate: {}", value))?,
            _ => {} // unknown attributes are ignored for forward compatibility
        }
    }

    Ok(CellRecord {
        name: name.ok_or("element missing name attribute")?,
        content: content.ok_or("element missing content attribute")?,
        x,
        y,
    })
}

/// Serialize a document as canvas XML.
pub fn write_string(doc: &Document) -> Result<String, String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Start(BytesStart::new("Canvas")))
        .map_err(|e| e.to_string())?;

    for record in &doc.cells {
        let mut elem = BytesStart::new("Element");
        elem.push_attribute(("name", record.name.as_str()));
        elem.push_attribute(("content", record.content.as_str()));
        elem.push_attribute(("x", format!("{}", record.x).as_str()));
        elem.push_attribute(("y", format!("{}", record.y).as_str()));
        writer
            .write_event(Event::Empty(elem))
            .map_err(|e| e.to_string())?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("Canvas")))
        .map_err(|e| e.to_string())?;

    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

/// Read a document from a canvas XML file.
pub fn read_file(path: &Path) -> Result<Document, String> {
    let xml = fs::read_to_string(path).map_err(|e| e.to_string())?;
    read_str(&xml)
}

/// Write a document to a canvas XML file.
pub fn write_file(doc: &Document, path: &Path) -> Result<(), String> {
    let xml = write_string(doc)?;
    fs::write(path, xml).map_err(|e| e.to_string())
}
