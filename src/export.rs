use crate::errors::ExportError;
use crate::models::RecordCollection;
use crate::render::{Renderer, SNAPSHOT_HEIGHT, SNAPSHOT_WIDTH};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub file_name: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageExport {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Lowercase, alphanumerics and spaces only, spaces collapsed to `_`.
pub fn clean_file_name(name: &str) -> String {
    let kept: String = name
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch.is_whitespace())
        .collect();
    let cleaned = kept.split_whitespace().collect::<Vec<_>>().join("_");
    if cleaned.is_empty() { "export".to_string() } else { cleaned }
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Header is the first record's field order; rows keep collection order.
pub fn to_csv(collection: &RecordCollection) -> Result<String, ExportError> {
    if collection.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    let encode = |err: csv::Error| ExportError::Encode(err.to_string());

    writer.write_record(collection.fields()).map_err(encode)?;
    for record in collection.records() {
        let row = collection.fields().iter().map(|field| cell(record.get(field)));
        writer.write_record(row).map_err(encode)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Encode(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ExportError::Encode(err.to_string()))
}

pub fn csv_export(collection: &RecordCollection, name: &str) -> Result<CsvExport, ExportError> {
    Ok(CsvExport {
        file_name: format!("{}.csv", clean_file_name(name)),
        body: to_csv(collection)?,
    })
}

/// Snapshot of exactly what the container shows now.
pub fn chart_image(renderer: &dyn Renderer, container: &str, name: &str) -> Result<ImageExport, ExportError> {
    let bytes = renderer.snapshot(container, SNAPSHOT_WIDTH, SNAPSHOT_HEIGHT)?;
    Ok(ImageExport {
        file_name: format!("{}.png", clean_file_name(name)),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Endpoint;
    use serde_json::json;

    fn tricky() -> RecordCollection {
        RecordCollection::from_rows(
            Endpoint::SearchByCity.name(),
            &Endpoint::SearchByCity.required_fields(),
            vec![
                json!({ "city": "Abilene-Sweetwater", "state": "Texas", "searches": 1200, "note": null }),
                json!({ "city": "Washington, DC", "state": "District of \"Columbia\"", "searches": 3.5, "note": "two\nlines" }),
            ],
        )
        .unwrap()
    }

    #[test]
    fn csv_round_trips_through_a_standard_parser() {
        let collection = tricky();
        let body = to_csv(&collection).unwrap();

        let mut reader = csv::Reader::from_reader(body.as_bytes());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(headers, collection.fields());

        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), collection.len());
        for (row, record) in rows.iter().zip(collection.records()) {
            for (value, field) in row.iter().zip(collection.fields()) {
                assert_eq!(value, record.text(field).unwrap_or_default());
            }
        }
    }

    #[test]
    fn csv_quotes_only_when_needed() {
        let body = to_csv(&tricky()).unwrap();
        let mut lines = body.lines();
        assert_eq!(lines.next(), Some("city,state,searches,note"));
        assert_eq!(lines.next(), Some("Abilene-Sweetwater,Texas,1200,"));
        assert!(body.contains("\"Washington, DC\",\"District of \"\"Columbia\"\"\",3.5,\"two\nlines\""));
    }

    #[test]
    fn empty_collection_produces_no_file() {
        assert!(matches!(to_csv(&RecordCollection::empty("x")), Err(ExportError::Empty)));
    }

    #[test]
    fn file_names_are_cleaned() {
        assert_eq!(clean_file_name("Health Searches by State & Condition"), "health_searches_by_state_condition");
        assert_eq!(clean_file_name("!!!"), "export");
        let export = csv_export(&tricky(), "Search Volume by City").unwrap();
        assert_eq!(export.file_name, "search_volume_by_city.csv");
    }
}
