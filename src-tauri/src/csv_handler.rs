use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Result, ViewerError};
use crate::table::{FieldCatalog, ParsedTable, Record};

pub const MAX_WARNING_COUNT: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseSettings {
    pub delimiter: char,
    pub quote: char,
    pub trim: bool,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            trim: false,
        }
    }
}

/// A data row whose field count disagreed with the header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseWarning {
    pub line: u64,
    pub expected: usize,
    pub found: usize,
}

fn ascii_byte(c: char, what: &str) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(ViewerError::parse(format!("{what} must be an ASCII character, got {c:?}")))
    }
}

fn build_reader<'a>(text: &'a str, settings: &ParseSettings) -> Result<csv::Reader<&'a [u8]>> {
    let delimiter = ascii_byte(settings.delimiter, "delimiter")?;
    let quote = ascii_byte(settings.quote, "quote")?;
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .quote(quote)
        .trim(if settings.trim { Trim::All } else { Trim::None })
        .from_reader(text.as_bytes()))
}

fn is_blank(record: &StringRecord) -> bool {
    record.is_empty() || (record.len() == 1 && record[0].is_empty())
}

pub fn get_headers(text: &str, settings: &ParseSettings) -> Result<FieldCatalog> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rdr = build_reader(text, settings)?;
    Ok(catalog_from(rdr.headers()?))
}

/// Repeated header names get a `_1`, `_2`, ... suffix so every column
/// stays addressable by name.
fn catalog_from(headers: &StringRecord) -> FieldCatalog {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut names = Vec::with_capacity(headers.len());
    for header in headers.iter() {
        let mut name = header.to_string();
        let mut suffix = 0usize;
        while seen.contains(&name) {
            suffix += 1;
            name = format!("{header}_{suffix}");
        }
        if suffix > 0 {
            tracing::debug!(header, renamed = %name, "renamed repeated column");
        }
        seen.insert(name.clone());
        names.push(name);
    }
    FieldCatalog::new(names)
}

/// Parses the whole text. The first row is always the header.
///
/// Ragged rows are kept: missing fields become `""` and extra fields are
/// dropped, each one noted as a [`ParseWarning`]. Any failure discards
/// everything read so far.
pub fn parse_csv(text: &str, settings: &ParseSettings) -> Result<ParsedTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rdr = build_reader(text, settings)?;
    let catalog = catalog_from(rdr.headers()?);
    let width = catalog.len();

    let mut records = Vec::new();
    let mut warnings = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if is_blank(&record) {
            continue;
        }
        if record.len() != width && warnings.len() < MAX_WARNING_COUNT {
            let line = record.position().map(|pos| pos.line()).unwrap_or(0);
            tracing::warn!(line, expected = width, found = record.len(), "ragged csv row");
            warnings.push(ParseWarning {
                line,
                expected: width,
                found: record.len(),
            });
        }
        records.push(Record::aligned(record.iter(), width));
    }

    tracing::info!(columns = width, rows = records.len(), "parsed csv");
    Ok(ParsedTable {
        catalog,
        records,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::{get_headers, parse_csv, ParseSettings};
    use crate::error::ViewerError;

    #[test]
    fn parses_header_and_records() {
        let table = parse_csv("name,age\nAlice,30\nBob,25\n", &ParseSettings::default())
            .expect("parse");
        assert_eq!(table.catalog.names(), ["name", "age"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[1].value_of(&table.catalog, "age"), Some("25"));
        assert!(table.warnings.is_empty());
    }

    #[test]
    fn extra_field_is_dropped_with_a_warning() {
        let table = parse_csv("name,age\nAlice,30,extra\n", &ParseSettings::default())
            .expect("parse");
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].values(), ["Alice", "30"]);
        assert_eq!(table.warnings.len(), 1);
        assert_eq!(table.warnings[0].line, 2);
        assert_eq!(table.warnings[0].found, 3);
    }

    #[test]
    fn missing_fields_become_empty_strings() {
        let table = parse_csv("a,b,c\n1\n", &ParseSettings::default()).expect("parse");
        assert_eq!(table.records[0].values(), ["1", "", ""]);
    }

    #[test]
    fn empty_lines_do_not_produce_records() {
        let table = parse_csv("name,age\n\nAlice,30\n\n\nBob,25\n\n", &ParseSettings::default())
            .expect("parse");
        assert_eq!(table.records.len(), 2);
    }

    #[test]
    fn quoted_fields_keep_delimiters_and_quotes() {
        let table = parse_csv(
            "name,quote\n\"Smith, J\",\"said \"\"hi\"\"\"\n",
            &ParseSettings::default(),
        )
        .expect("parse");
        assert_eq!(table.records[0].values(), ["Smith, J", "said \"hi\""]);
    }

    #[test]
    fn empty_content_is_an_empty_table() {
        let table = parse_csv("", &ParseSettings::default()).expect("parse");
        assert!(table.catalog.is_empty());
        assert!(table.records.is_empty());
    }

    #[test]
    fn repeated_headers_are_renamed() {
        let table = parse_csv("id,name,name\n1,a,b\n", &ParseSettings::default())
            .expect("parse");
        assert_eq!(table.catalog.names(), ["id", "name", "name_1"]);
        assert_eq!(table.records[0].value_of(&table.catalog, "name_1"), Some("b"));

        let table = parse_csv("a,,\n1,2,3\n", &ParseSettings::default()).expect("parse");
        assert_eq!(table.catalog.names(), ["a", "", "_1"]);
        assert_eq!(table.records[0].values(), ["1", "2", "3"]);
    }

    #[test]
    fn renamed_header_skips_names_already_taken() {
        let table = parse_csv("x,x_1,x\n1,2,3\n", &ParseSettings::default()).expect("parse");
        assert_eq!(table.catalog.names(), ["x", "x_1", "x_2"]);
    }

    #[test]
    fn non_ascii_delimiter_is_a_parse_error() {
        let settings = ParseSettings {
            delimiter: '→',
            ..ParseSettings::default()
        };
        let err = parse_csv("a→b\n", &settings).unwrap_err();
        assert!(matches!(err, ViewerError::Parse { .. }));
    }

    #[test]
    fn bom_is_not_part_of_first_header() {
        let catalog = get_headers("\u{feff}id,label\n1,x\n", &ParseSettings::default())
            .expect("headers");
        assert_eq!(catalog.names(), ["id", "label"]);
    }

    #[test]
    fn custom_delimiter_and_trim() {
        let settings = ParseSettings {
            delimiter: ';',
            trim: true,
            ..ParseSettings::default()
        };
        let table = parse_csv("x ; y\n 1 ; 2 \n", &settings).expect("parse");
        assert_eq!(table.catalog.names(), ["x", "y"]);
        assert_eq!(table.records[0].values(), ["1", "2"]);
    }
}
