#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use serde_json::Value;
use sm_columnar::{Column, ColumnError};
use sm_frame::{FrameError, Table};
use sm_types::{NullKind, Scalar, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("csv input has no headers")]
    MissingHeaders,
    #[error("json input must be an array of objects; found {0}")]
    NotARecordArray(&'static str),
    #[error("json record {position} is not an object")]
    RecordNotObject { position: usize },
    #[error("unsupported dataset format for path {0:?} (expected .json or .csv)")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Csv,
}

impl DataFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Read a table from disk, picking the parser from the file extension.
pub fn read_path(path: &Path) -> Result<Table, IoError> {
    let format = DataFormat::from_path(path)
        .ok_or_else(|| IoError::UnsupportedFormat(path.display().to_string()))?;
    let input = fs::read_to_string(path)?;
    match format {
        DataFormat::Json => read_json_records_str(&input),
        DataFormat::Csv => read_csv_str(&input),
    }
}

pub fn read_csv_str(input: &str) -> Result<Table, IoError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let headers = reader.headers().cloned().map_err(IoError::from)?;

    if headers.is_empty() {
        return Err(IoError::MissingHeaders);
    }

    let mut columns = headers
        .iter()
        .map(|name| (name.to_owned(), Vec::<Scalar>::new()))
        .collect::<BTreeMap<_, _>>();

    for row in reader.records() {
        let record = row?;
        for (idx, header) in headers.iter().enumerate() {
            let field = record.get(idx).unwrap_or_default();
            if let Some(values) = columns.get_mut(header) {
                values.push(parse_scalar(field));
            }
        }
    }

    build_table(columns)
}

/// Read a JSON array of flat objects, one object per row. Keys missing
/// from a record become nulls; the column set is the union of all keys.
pub fn read_json_records_str(input: &str) -> Result<Table, IoError> {
    let document: Value = serde_json::from_str(input)?;
    let records = match document {
        Value::Array(records) => records,
        other => return Err(IoError::NotARecordArray(json_kind(&other))),
    };

    let mut columns = BTreeMap::<String, Vec<Scalar>>::new();
    for (position, record) in records.iter().enumerate() {
        let object = record
            .as_object()
            .ok_or(IoError::RecordNotObject { position })?;

        for key in object.keys() {
            columns
                .entry(key.clone())
                .or_insert_with(|| vec![Scalar::Null(NullKind::Null); position]);
        }
        for (name, values) in &mut columns {
            values.push(object.get(name).map_or(Scalar::Null(NullKind::Null), json_scalar));
        }
    }

    build_table(columns)
}

fn build_table(columns: BTreeMap<String, Vec<Scalar>>) -> Result<Table, IoError> {
    let out_columns = columns
        .into_iter()
        .map(|(name, values)| Ok((name, build_column(values)?)))
        .collect::<Result<Vec<_>, IoError>>()?;
    Ok(Table::from_columns(out_columns)?)
}

/// Columns whose cells disagree on type (a numeric-looking title among
/// text titles) fall back to text.
fn build_column(values: Vec<Scalar>) -> Result<Column, ColumnError> {
    match Column::from_values(values.clone()) {
        Err(ColumnError::Type(TypeError::IncompatibleDtypes { .. })) => {
            Column::from_values(values.into_iter().map(stringify_scalar).collect())
        }
        other => other,
    }
}

fn stringify_scalar(value: Scalar) -> Scalar {
    match value {
        Scalar::Null(kind) => Scalar::Null(kind),
        Scalar::Utf8(v) => Scalar::Utf8(v),
        Scalar::Bool(v) => Scalar::Utf8(v.to_string()),
        Scalar::Int64(v) => Scalar::Utf8(v.to_string()),
        Scalar::Float64(v) => Scalar::Utf8(v.to_string()),
        Scalar::Date(v) => Scalar::Utf8(v.to_string()),
    }
}

fn json_scalar(value: &Value) -> Scalar {
    match value {
        Value::Null => Scalar::Null(NullKind::Null),
        Value::Bool(v) => Scalar::Bool(*v),
        Value::Number(number) => number
            .as_i64()
            .map(Scalar::Int64)
            .or_else(|| number.as_f64().map(Scalar::Float64))
            .unwrap_or(Scalar::Null(NullKind::NaN)),
        Value::String(v) => Scalar::Utf8(v.clone()),
        Value::Array(_) | Value::Object(_) => Scalar::Utf8(value.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_scalar(field: &str) -> Scalar {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Scalar::Null(NullKind::Null);
    }

    if let Ok(value) = trimmed.parse::<i64>() {
        return Scalar::Int64(value);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        return Scalar::Float64(value);
    }

    Scalar::Utf8(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use sm_types::{DType, NullKind, Scalar};

    use super::{IoError, read_csv_str, read_json_records_str, read_path};

    #[test]
    fn csv_reader_keeps_nulls_and_numeric_shape() {
        let input = "Title,US_Gross\nHeat,67436818\nNobody,\nTron,33000000.5\n";
        let table = read_csv_str(input).expect("read");
        let gross = table.column("US_Gross").expect("gross");

        assert_eq!(gross.dtype(), DType::Float64);
        assert_eq!(gross.values()[1], Scalar::Null(NullKind::NaN));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn numeric_looking_titles_fall_back_to_text() {
        let input = "Title,US_Gross\n1776,100\nHeat,200\n";
        let table = read_csv_str(input).expect("read");
        let titles = table.column("Title").expect("titles");
        assert_eq!(titles.dtype(), DType::Utf8);
        assert_eq!(titles.values()[0], Scalar::from("1776"));
    }

    #[test]
    fn json_records_union_keys_and_fill_nulls() {
        let input = r#"[
            {"Title": "Heat", "US_Gross": 67436818},
            {"Title": "Nell", "Major_Genre": "Drama", "US_Gross": null}
        ]"#;
        let table = read_json_records_str(input).expect("read");

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.value("Major_Genre", 0),
            Some(&Scalar::Null(NullKind::Null))
        );
        assert_eq!(table.value("Major_Genre", 1), Some(&Scalar::from("Drama")));
        assert!(table.value("US_Gross", 1).expect("cell").is_missing());
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(matches!(
            read_json_records_str(r#"{"Title": "Heat"}"#),
            Err(IoError::NotARecordArray("object"))
        ));
        assert!(matches!(
            read_json_records_str(r#"[{"Title": "Heat"}, 3]"#),
            Err(IoError::RecordNotObject { position: 1 })
        ));
    }

    #[test]
    fn read_path_dispatches_on_extension() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("tempfile");
        file.write_all(br#"[{"Title": "Heat"}]"#).expect("write");

        let table = read_path(file.path()).expect("read json file");
        assert_eq!(table.len(), 1);

        let other = tempfile::Builder::new()
            .suffix(".parquet")
            .tempfile()
            .expect("tempfile");
        assert!(matches!(
            read_path(other.path()),
            Err(IoError::UnsupportedFormat(_))
        ));
    }
}
