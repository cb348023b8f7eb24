use crate::models::{ChartKind, Condition, Endpoint, Record, RecordCollection};
use crate::selection::{Focus, Selection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

pub const GAUGE_CONDITIONS: [Condition; 5] = [
    Condition::Cancer,
    Condition::Cardiovascular,
    Condition::Depression,
    Condition::Diabetes,
    Condition::Obesity,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Main,
    Comparison,
}

impl ViewKind {
    pub fn name(self) -> &'static str {
        match self {
            ViewKind::Main => "main",
            ViewKind::Comparison => "comparison",
        }
    }

    pub fn targets(self) -> Vec<ChartTarget> {
        match self {
            ViewKind::Main => main_targets(),
            ViewKind::Comparison => comparison_targets(),
        }
    }

    pub fn default_selection(self, default_city: &str) -> Selection {
        match self {
            ViewKind::Main => Selection::new(None),
            ViewKind::Comparison => Selection::new(Some(Focus::City(default_city.to_string()))),
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ViewKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "main" => Ok(ViewKind::Main),
            "comparison" => Ok(ViewKind::Comparison),
            _ => Err(format!("unknown view '{value}'")),
        }
    }
}

/// Which values a chart plots from each row.
#[derive(Debug, Clone, PartialEq)]
pub enum Measure {
    /// One column per condition in the current selection.
    SelectedConditions,
    /// A fixed set of condition columns, independent of the selection.
    Conditions(&'static [Condition]),
    Field { field: &'static str, label: &'static str },
    /// Rows split into one series per distinct `key` value.
    GroupedBy { key: &'static str, value: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub kind: ChartKind,
    /// Category, region or row-label column. Time series always use `year`.
    pub key: &'static str,
    pub measure: Measure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRef {
    Fetched(Endpoint),
    /// Requested with the selected city attached.
    CityScoped(Endpoint),
    Correlations,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartTarget {
    pub container: &'static str,
    pub title: &'static str,
    pub data: DataRef,
    pub projection: Projection,
}

impl ChartTarget {
    /// Endpoint offered for CSV download alongside the chart image.
    pub fn csv_endpoint(&self) -> Option<Endpoint> {
        match self.data {
            DataRef::Fetched(endpoint) | DataRef::CityScoped(endpoint) => Some(endpoint),
            DataRef::Correlations => None,
        }
    }
}

fn target(
    container: &'static str,
    title: &'static str,
    data: DataRef,
    kind: ChartKind,
    key: &'static str,
    measure: Measure,
) -> ChartTarget {
    ChartTarget {
        container,
        title,
        data,
        projection: Projection { kind, key, measure },
    }
}

fn main_targets() -> Vec<ChartTarget> {
    let searches = Measure::Field { field: "searches", label: "Total search volume" };
    let deaths = Measure::GroupedBy { key: "cause", value: "deaths" };

    vec![
        target(
            "line-chart",
            "Total Volume of Searches by Year",
            DataRef::Fetched(Endpoint::SearchByYear),
            ChartKind::TimeSeries,
            "year",
            searches.clone(),
        ),
        target(
            "line-chart2",
            "Search Trends by Health Condition",
            DataRef::Fetched(Endpoint::SearchYearAndCondition),
            ChartKind::TimeSeries,
            "year",
            Measure::SelectedConditions,
        ),
        target(
            "myDiv",
            "Correlations Among Health Conditions",
            DataRef::Correlations,
            ChartKind::Correlation,
            "condition",
            Measure::Conditions(&Condition::ALL),
        ),
        target(
            "mymapDiv",
            "Health Searches by State",
            DataRef::Fetched(Endpoint::SearchByState),
            ChartKind::Geographic,
            "postal",
            searches,
        ),
        target(
            "bar-chart",
            "Health Searches by State and Condition",
            DataRef::Fetched(Endpoint::MostSearched),
            ChartKind::Categorical,
            "state",
            Measure::SelectedConditions,
        ),
        target(
            "radarmyDiv",
            "Total Health Search Volume",
            DataRef::Fetched(Endpoint::TotalCondition),
            ChartKind::Radar,
            "",
            Measure::Conditions(&Condition::ALL),
        ),
        target(
            "radarmyDiv2",
            "Leading Causes of Death Statistics",
            DataRef::Fetched(Endpoint::CasesLeadingDeath),
            ChartKind::Radar,
            "",
            deaths.clone(),
        ),
        target(
            "line-chart3",
            "Leading Causes of Death Trends",
            DataRef::Fetched(Endpoint::CasesLeadingDeath),
            ChartKind::TimeSeries,
            "year",
            deaths,
        ),
    ]
}

fn comparison_targets() -> Vec<ChartTarget> {
    let searches = Measure::Field { field: "searches", label: "Searches" };

    vec![
        target(
            "comparison-1",
            "City Search Trends by Condition",
            DataRef::CityScoped(Endpoint::SearchYearAndCondition),
            ChartKind::TimeSeries,
            "year",
            Measure::SelectedConditions,
        ),
        target(
            "scatter1",
            "Search Volume by City",
            DataRef::Fetched(Endpoint::SearchByCity),
            ChartKind::Categorical,
            "city",
            searches.clone(),
        ),
        target(
            "IntermapDiv",
            "City Search Map",
            DataRef::Fetched(Endpoint::SearchByCity),
            ChartKind::Geographic,
            "city",
            searches,
        ),
        target(
            "container",
            "Health Condition Percentage Gauge",
            DataRef::CityScoped(Endpoint::SearchYearAndCondition),
            ChartKind::Gauge,
            "",
            Measure::Conditions(&GAUGE_CONDITIONS),
        ),
    ]
}

const CORRELATIONS: [[f64; 9]; 9] = [
    [1.0, 0.47, 0.58, 0.28, 0.43, 0.36, 0.38, 0.30, 0.40],
    [0.47, 1.0, 0.43, 0.40, 0.51, 0.47, 0.40, 0.49, 0.50],
    [0.58, 0.43, 1.0, 0.49, 0.53, 0.49, 0.64, 0.39, 0.64],
    [0.28, 0.40, 0.49, 1.0, 0.44, 0.70, 0.61, 0.59, 0.74],
    [0.43, 0.51, 0.53, 0.44, 1.0, 0.38, 0.57, 0.31, 0.51],
    [0.36, 0.47, 0.49, 0.70, 0.38, 1.0, 0.60, 0.53, 0.69],
    [0.38, 0.40, 0.64, 0.61, 0.57, 0.60, 1.0, 0.46, 0.72],
    [0.30, 0.49, 0.39, 0.59, 0.31, 0.53, 0.46, 1.0, 0.61],
    [0.40, 0.50, 0.64, 0.74, 0.51, 0.69, 0.72, 0.61, 1.0],
];

/// Pairwise search-volume correlations, shipped with the dashboard.
pub fn correlation_matrix() -> RecordCollection {
    let records = Condition::ALL
        .iter()
        .zip(CORRELATIONS.iter())
        .map(|(row, values)| {
            std::iter::once(("condition".to_string(), Value::from(row.id())))
                .chain(
                    Condition::ALL
                        .iter()
                        .zip(values.iter())
                        .map(|(column, r)| (column.id().to_string(), Value::from(*r))),
                )
                .collect::<Record>()
        })
        .collect();
    RecordCollection::from_records("correlations", records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn containers_are_unique_per_view() {
        for view in [ViewKind::Main, ViewKind::Comparison] {
            let targets = view.targets();
            let unique: HashSet<_> = targets.iter().map(|target| target.container).collect();
            assert_eq!(unique.len(), targets.len(), "duplicate container in {view}");
        }
    }

    #[test]
    fn correlation_matrix_is_square_and_symmetric() {
        let matrix = correlation_matrix();
        assert_eq!(matrix.len(), 9);
        assert_eq!(matrix.fields().len(), 10);
        for (row, record) in Condition::ALL.iter().zip(matrix.records()) {
            assert_eq!(record.number(row.id()), Some(1.0));
            for (column, other) in Condition::ALL.iter().zip(matrix.records()) {
                assert_eq!(record.number(column.id()), other.number(row.id()));
            }
        }
    }

    #[test]
    fn comparison_starts_focused_on_default_city() {
        let selection = ViewKind::Comparison.default_selection("Austin");
        assert_eq!(selection.city(), Some("Austin"));
        assert_eq!(ViewKind::Main.default_selection("Austin").city(), None);
    }
}
