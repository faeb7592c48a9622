//! XLSX extraction.
//!
//! Reads the shared-string table and each worksheet part. Cells typed `s`
//! index into the shared strings; everything else is taken verbatim from
//! the `<v>` element. The first row of each sheet is treated as the header.

use std::collections::BTreeMap;
use std::io::Read as _;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::AdapterError;

use super::{ParsedDocument, SheetData};

pub(super) fn parse(path: &Path) -> Result<ParsedDocument, AdapterError> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| AdapterError::Parse(format!("not an XLSX package: {e}")))?;

    let shared = match read_part(&mut archive, "xl/sharedStrings.xml") {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let names = match read_part(&mut archive, "xl/workbook.xml") {
        Some(xml) => parse_sheet_names(&xml)?,
        None => Vec::new(),
    };

    let mut sheets = BTreeMap::new();
    let mut text_blocks = Vec::new();
    for (index, name) in names.iter().enumerate() {
        let part = format!("xl/worksheets/sheet{}.xml", index + 1);
        let Some(xml) = read_part(&mut archive, &part) else {
            continue;
        };
        let grid = parse_sheet(&xml, &shared)?;
        if grid.is_empty() {
            continue;
        }

        text_blocks.push(
            grid.iter()
                .map(|row| row.join(", "))
                .collect::<Vec<_>>()
                .join("\n"),
        );

        let mut rows = grid.into_iter();
        let columns = rows.next().unwrap_or_default();
        sheets.insert(
            name.clone(),
            SheetData { columns, rows: rows.collect() },
        );
    }

    let mut document = ParsedDocument::new("excel", text_blocks.join("\n\n"), path);
    document.sheets = Some(sheets);
    Ok(document)
}

fn read_part<R: std::io::Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Option<String> {
    let mut xml = String::new();
    archive.by_name(name).ok()?.read_to_string(&mut xml).ok()?;
    Some(xml)
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>, AdapterError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_item = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"si" => {
                    in_item = true;
                    current.clear();
                }
                b"t" if in_item => in_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"si" => {
                    in_item = false;
                    strings.push(current.clone());
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                current.push_str(&t.unescape().map_err(xml_err)?);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(e)),
            _ => {}
        }
    }

    Ok(strings)
}

fn parse_sheet_names(xml: &str) -> Result<Vec<String>, AdapterError> {
    let mut reader = Reader::from_str(xml);
    let mut names = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"sheet" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"name" {
                        names.push(String::from_utf8_lossy(&attr.value).into_owned());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(e)),
            _ => {}
        }
    }

    Ok(names)
}

fn parse_sheet(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>, AdapterError> {
    let mut reader = Reader::from_str(xml);
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell_is_shared = false;
    let mut in_value = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"row" => row.clear(),
                b"c" => {
                    cell_is_shared = e
                        .attributes()
                        .flatten()
                        .any(|a| a.key.as_ref() == b"t" && a.value.as_ref() == b"s");
                }
                b"v" => in_value = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"row" => rows.push(std::mem::take(&mut row)),
                b"v" => in_value = false,
                _ => {}
            },
            Ok(Event::Text(t)) if in_value => {
                let raw = t.unescape().map_err(xml_err)?.into_owned();
                let value = if cell_is_shared {
                    raw.parse::<usize>()
                        .ok()
                        .and_then(|i| shared.get(i).cloned())
                        .unwrap_or(raw)
                } else {
                    raw
                };
                row.push(value);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(e)),
            _ => {}
        }
    }

    Ok(rows)
}

fn xml_err(e: impl std::fmt::Display) -> AdapterError {
    AdapterError::Parse(format!("malformed workbook XML: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_strings_are_resolved() {
        let shared = vec!["name".to_owned(), "ada".to_owned()];
        let xml = r#"<worksheet><sheetData>
            <row><c t="s"><v>0</v></c><c><v>1</v></c></row>
            <row><c t="s"><v>1</v></c><c><v>36</v></c></row>
        </sheetData></worksheet>"#;
        let rows = parse_sheet(xml, &shared).unwrap();
        assert_eq!(rows, vec![vec!["name", "1"], vec!["ada", "36"]]);
    }

    #[test]
    fn sheet_names_come_from_the_workbook_part() {
        let xml = r#"<workbook><sheets>
            <sheet name="Q1" sheetId="1"/><sheet name="Q2" sheetId="2"/>
        </sheets></workbook>"#;
        assert_eq!(parse_sheet_names(xml).unwrap(), vec!["Q1", "Q2"]);
    }
}
