use crate::errors::DataError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Cancer,
    Cardiovascular,
    Stroke,
    Depression,
    Rehab,
    Vaccine,
    Diarrhea,
    Obesity,
    Diabetes,
}

impl Condition {
    pub const ALL: [Condition; 9] = [
        Condition::Cancer,
        Condition::Cardiovascular,
        Condition::Stroke,
        Condition::Depression,
        Condition::Rehab,
        Condition::Vaccine,
        Condition::Diarrhea,
        Condition::Obesity,
        Condition::Diabetes,
    ];

    /// Column name in every condition-bearing dataset.
    pub fn id(self) -> &'static str {
        match self {
            Condition::Cancer => "cancer",
            Condition::Cardiovascular => "cardiovascular",
            Condition::Stroke => "stroke",
            Condition::Depression => "depression",
            Condition::Rehab => "rehab",
            Condition::Vaccine => "vaccine",
            Condition::Diarrhea => "diarrhea",
            Condition::Obesity => "obesity",
            Condition::Diabetes => "diabetes",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Condition::Cancer => "#E74C3C",
            Condition::Cardiovascular => "#3498DB",
            Condition::Stroke => "#E67E22",
            Condition::Depression => "#9B59B6",
            Condition::Rehab => "#95A5A6",
            Condition::Vaccine => "#27AE60",
            Condition::Diarrhea => "#F39C12",
            Condition::Obesity => "#16A085",
            Condition::Diabetes => "#2ECC71",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Condition::ALL
            .into_iter()
            .find(|condition| condition.id() == wanted)
            .ok_or_else(|| format!("unknown condition '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Text,
}

/// Backend datasets, one per read-only endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    SearchByYear,
    SearchYearAndCondition,
    SearchByState,
    SearchByCity,
    ByStateAndYear,
    CasesLeadingDeath,
    AllSearchRecord,
    Location,
    Conditions,
    #[serde(rename = "mostsserached")]
    MostSearched,
    TotalCondition,
}

impl Endpoint {
    pub const ALL: [Endpoint; 11] = [
        Endpoint::SearchByYear,
        Endpoint::SearchYearAndCondition,
        Endpoint::SearchByState,
        Endpoint::SearchByCity,
        Endpoint::ByStateAndYear,
        Endpoint::CasesLeadingDeath,
        Endpoint::AllSearchRecord,
        Endpoint::Location,
        Endpoint::Conditions,
        Endpoint::MostSearched,
        Endpoint::TotalCondition,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::SearchByYear => "searchbyyear",
            Endpoint::SearchYearAndCondition => "searchyearandcondition",
            Endpoint::SearchByState => "searchbystate",
            Endpoint::SearchByCity => "searchbycity",
            Endpoint::ByStateAndYear => "bystateandyear",
            Endpoint::CasesLeadingDeath => "casesleadingdeath",
            Endpoint::AllSearchRecord => "allsearchrecord",
            Endpoint::Location => "location",
            Endpoint::Conditions => "conditions",
            // The backend route carries this spelling.
            Endpoint::MostSearched => "mostsserached",
            Endpoint::TotalCondition => "totalcondition",
        }
    }

    pub fn path(self) -> String {
        format!("/{}", self.name())
    }

    pub fn required_fields(self) -> Vec<(&'static str, FieldKind)> {
        use FieldKind::{Number, Text};

        let conditions = Condition::ALL.iter().map(|condition| (condition.id(), Number));
        match self {
            Endpoint::SearchByYear => vec![("year", Number), ("searches", Number)],
            Endpoint::SearchYearAndCondition => {
                std::iter::once(("year", Number)).chain(conditions).collect()
            }
            Endpoint::SearchByState => {
                vec![("state", Text), ("postal", Text), ("searches", Number)]
            }
            Endpoint::SearchByCity => vec![("city", Text), ("state", Text), ("searches", Number)],
            Endpoint::ByStateAndYear => {
                vec![("state", Text), ("year", Number), ("searches", Number)]
            }
            Endpoint::CasesLeadingDeath => {
                vec![("year", Number), ("cause", Text), ("deaths", Number)]
            }
            Endpoint::AllSearchRecord => vec![("year", Number)],
            Endpoint::Location | Endpoint::Conditions => Vec::new(),
            Endpoint::MostSearched => std::iter::once(("state", Text)).chain(conditions).collect(),
            Endpoint::TotalCondition => conditions.collect(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().trim_start_matches('/').to_ascii_lowercase();
        Endpoint::ALL
            .into_iter()
            .find(|endpoint| endpoint.name() == wanted)
            .ok_or_else(|| format!("unknown endpoint '{value}'"))
    }
}

/// One flat row. Field order is the order the backend sent.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, Value>);

impl Record {
    pub fn new(fields: IndexMap<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        match self.0.get(field)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.number("year").map(|year| year.round() as i32)
    }

    pub fn text(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}

/// Immutable snapshot of one fetched dataset. A refetch builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordCollection {
    source: String,
    fields: Arc<[String]>,
    records: Arc<[Record]>,
}

impl RecordCollection {
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            fields: Arc::from(Vec::new()),
            records: Arc::from(Vec::new()),
        }
    }

    /// Wraps rows that are already known to share one field set.
    pub fn from_records(source: impl Into<String>, records: Vec<Record>) -> Self {
        let fields: Vec<String> = records
            .first()
            .map(|record| record.field_names().map(str::to_string).collect())
            .unwrap_or_default();
        Self {
            source: source.into(),
            fields: Arc::from(fields),
            records: Arc::from(records),
        }
    }

    /// Builds a collection from raw JSON rows, rejecting rows that are not flat
    /// objects, miss a required field, or drift from the first row's field set.
    pub fn from_rows(
        source: impl Into<String>,
        required: &[(&str, FieldKind)],
        rows: Vec<Value>,
    ) -> Result<Self, DataError> {
        let source = source.into();
        let mut records = Vec::with_capacity(rows.len());
        let mut fields: Option<Vec<String>> = None;

        for (index, row) in rows.into_iter().enumerate() {
            let Value::Object(object) = row else {
                return Err(DataError::schema(&source, format!("row {index} is not an object")));
            };

            let mut record = IndexMap::with_capacity(object.len());
            for (key, value) in object {
                if matches!(value, Value::Object(_) | Value::Array(_)) {
                    return Err(DataError::schema(
                        &source,
                        format!("row {index} field '{key}' is not a scalar"),
                    ));
                }
                let name = key.to_ascii_lowercase();
                if record.contains_key(&name) {
                    return Err(DataError::schema(
                        &source,
                        format!("row {index} repeats field '{name}' in another case"),
                    ));
                }
                record.insert(name, value);
            }

            for (name, kind) in required {
                let valid = match (record.get(*name), kind) {
                    (Some(Value::Number(_)), FieldKind::Number) => true,
                    (Some(Value::String(text)), FieldKind::Number) => text.trim().parse::<f64>().is_ok(),
                    (Some(Value::String(_)), FieldKind::Text) => true,
                    _ => false,
                };
                if !valid {
                    return Err(DataError::schema(
                        &source,
                        format!("row {index} is missing {kind:?} field '{name}'"),
                    ));
                }
            }

            match &fields {
                None => fields = Some(record.keys().cloned().collect()),
                Some(expected) => {
                    let same = expected.len() == record.len()
                        && expected.iter().all(|field| record.contains_key(field));
                    if !same {
                        return Err(DataError::schema(
                            &source,
                            format!("row {index} does not share the collection's field set"),
                        ));
                    }
                }
            }

            records.push(Record(record));
        }

        Ok(Self {
            source,
            fields: Arc::from(fields.unwrap_or_default()),
            records: Arc::from(records),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Field names in first-record order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|name| name == field)
    }

    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        if !self.has_field("year") {
            return None;
        }
        self.records
            .iter()
            .filter_map(Record::year)
            .fold(None, |bounds, year| match bounds {
                None => Some((year, year)),
                Some((min, max)) => Some((min.min(year), max.max(year))),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    TimeSeries,
    Categorical,
    Correlation,
    Geographic,
    Radar,
    Gauge,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Coord {
    Year(i32),
    Label(String),
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coord::Year(year) => write!(f, "{year}"),
            Coord::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub x: Coord,
    pub y: f64,
}

/// Chart-ready projection of a collection under a selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub color: String,
    pub points: Vec<Point>,
}
