use crate::layout::{Measure, Projection};
use crate::models::{ChartKind, Coord, Point, Record, RecordCollection, Series};
use crate::selection::Selection;
use indexmap::IndexMap;

const PALETTE: [&str; 8] = [
    "#2E86AB", "#A23B72", "#F18F01", "#2E8B57", "#FF6B6B", "#3498DB", "#9B59B6", "#16A085",
];

struct Column {
    label: String,
    color: String,
    field: String,
    /// Only rows whose `key` column equals this label contribute.
    group: Option<(String, String)>,
}

impl Column {
    fn value(&self, record: &Record) -> Option<f64> {
        if let Some((key, label)) = &self.group {
            if record.text(key).as_deref() != Some(label.as_str()) {
                return None;
            }
        }
        record.number(&self.field)
    }
}

/// Projects a collection into chart series under the given selection.
///
/// Pure: the same inputs always give the same output. An empty collection, or
/// a selection that matches no rows, gives an empty list.
pub fn derive_series(
    collection: &RecordCollection,
    selection: &Selection,
    projection: &Projection,
) -> Vec<Series> {
    let rows = filtered_rows(collection, selection);
    if rows.is_empty() {
        return Vec::new();
    }

    let columns = columns(&projection.measure, selection, &rows);
    match projection.kind {
        ChartKind::TimeSeries => time_series(&rows, &columns),
        ChartKind::Categorical => categorical(&rows, &columns, projection.key),
        ChartKind::Geographic => geographic(&rows, &columns, projection.key),
        ChartKind::Correlation => correlation(&rows, &columns, projection.key),
        ChartKind::Radar => totals(&rows, &columns, "Total", false),
        ChartKind::Gauge => totals(&rows, &columns, "Share (%)", true),
    }
}

/// Share of `part` in `total` as a percentage; zero when there is no total.
pub fn percentage(part: f64, total: f64) -> f64 {
    if total == 0.0 { 0.0 } else { part / total * 100.0 }
}

fn filtered_rows<'a>(collection: &'a RecordCollection, selection: &Selection) -> Vec<&'a Record> {
    let by_year = collection.has_field("year");
    collection
        .records()
        .iter()
        .filter(|record| !by_year || record.year().is_some_and(|year| selection.contains_year(year)))
        .collect()
}

fn columns(measure: &Measure, selection: &Selection, rows: &[&Record]) -> Vec<Column> {
    let condition_column = |condition: crate::models::Condition| Column {
        label: condition.id().to_string(),
        color: condition.color().to_string(),
        field: condition.id().to_string(),
        group: None,
    };

    match measure {
        Measure::SelectedConditions => selection
            .conditions()
            .iter()
            .copied()
            .map(condition_column)
            .collect(),
        Measure::Conditions(conditions) => conditions.iter().copied().map(condition_column).collect(),
        Measure::Field { field, label } => vec![Column {
            label: label.to_string(),
            color: PALETTE[0].to_string(),
            field: field.to_string(),
            group: None,
        }],
        Measure::GroupedBy { key, value } => {
            let mut labels: Vec<String> = Vec::new();
            for label in rows.iter().filter_map(|record| record.text(key)) {
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
            labels
                .into_iter()
                .enumerate()
                .map(|(index, label)| Column {
                    color: PALETTE[index % PALETTE.len()].to_string(),
                    field: value.to_string(),
                    group: Some((key.to_string(), label.clone())),
                    label,
                })
                .collect()
        }
    }
}

/// Sums each column per x value, keeping first-appearance order.
fn accumulate(
    rows: &[&Record],
    column: &Column,
    x_of: impl Fn(&Record) -> Option<Coord>,
) -> IndexMap<Coord, f64> {
    let mut sums = IndexMap::new();
    for record in rows {
        let (Some(x), Some(y)) = (x_of(record), column.value(record)) else {
            continue;
        };
        *sums.entry(x).or_insert(0.0) += y;
    }
    sums
}

fn to_series(column: &Column, sums: IndexMap<Coord, f64>) -> Option<Series> {
    if sums.is_empty() {
        return None;
    }
    Some(Series {
        label: column.label.clone(),
        color: column.color.clone(),
        points: sums.into_iter().map(|(x, y)| Point { x, y }).collect(),
    })
}

fn time_series(rows: &[&Record], columns: &[Column]) -> Vec<Series> {
    columns
        .iter()
        .filter_map(|column| {
            let mut sums = accumulate(rows, column, |record| record.year().map(Coord::Year));
            sums.sort_by(|a, _, b, _| match (a, b) {
                (Coord::Year(a), Coord::Year(b)) => a.cmp(b),
                _ => std::cmp::Ordering::Equal,
            });
            to_series(column, sums)
        })
        .collect()
}

fn categorical(rows: &[&Record], columns: &[Column], key: &str) -> Vec<Series> {
    columns
        .iter()
        .filter_map(|column| {
            to_series(column, accumulate(rows, column, |record| record.text(key).map(Coord::Label)))
        })
        .collect()
}

// Regions without a usable value are left out rather than filled.
fn geographic(rows: &[&Record], columns: &[Column], key: &str) -> Vec<Series> {
    let region = |record: &Record| {
        record
            .text(key)
            .map(|region| region.trim().to_string())
            .filter(|region| !region.is_empty())
            .map(Coord::Label)
    };
    columns
        .iter()
        .take(1)
        .filter_map(|column| to_series(column, accumulate(rows, column, region)))
        .collect()
}

fn correlation(rows: &[&Record], columns: &[Column], key: &str) -> Vec<Series> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let label = record.text(key)?;
            let color = label
                .parse::<crate::models::Condition>()
                .map(|condition| condition.color())
                .unwrap_or(PALETTE[index % PALETTE.len()]);
            let points = columns
                .iter()
                .filter_map(|column| {
                    record.number(&column.field).map(|y| Point {
                        x: Coord::Label(column.label.clone()),
                        y,
                    })
                })
                .collect();
            Some(Series {
                label,
                color: color.to_string(),
                points,
            })
        })
        .collect()
}

fn totals(rows: &[&Record], columns: &[Column], label: &str, as_share: bool) -> Vec<Series> {
    if columns.is_empty() {
        return Vec::new();
    }

    let subtotals: Vec<f64> = columns
        .iter()
        .map(|column| rows.iter().filter_map(|record| column.value(record)).sum())
        .collect();
    let total: f64 = subtotals.iter().sum();

    let points = columns
        .iter()
        .zip(subtotals)
        .map(|(column, subtotal)| Point {
            x: Coord::Label(column.label.clone()),
            y: if as_share { percentage(subtotal, total) } else { subtotal },
        })
        .collect();

    vec![Series {
        label: label.to_string(),
        color: PALETTE[0].to_string(),
        points,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{correlation_matrix, ViewKind, GAUGE_CONDITIONS};
    use crate::models::{Condition, Endpoint};
    use serde_json::{json, Value};

    fn collection(endpoint: Endpoint, rows: Vec<Value>) -> RecordCollection {
        RecordCollection::from_rows(endpoint.name(), &endpoint.required_fields(), rows).unwrap()
    }

    fn projection(view: ViewKind, container: &str) -> Projection {
        view.targets()
            .into_iter()
            .find(|target| target.container == container)
            .map(|target| target.projection)
            .expect("known container")
    }

    fn yearly_conditions() -> RecordCollection {
        let rows = (2004..=2017)
            .map(|year| {
                let mut row = serde_json::Map::new();
                row.insert("year".into(), json!(year));
                for (offset, condition) in Condition::ALL.iter().enumerate() {
                    row.insert(condition.id().into(), json!((year - 2000) * 10 + offset as i32));
                }
                Value::Object(row)
            })
            .collect();
        collection(Endpoint::SearchYearAndCondition, rows)
    }

    #[test]
    fn selection_matching_no_rows_gives_no_series() {
        let rows = vec![json!({ "year": 2004, "searches": 5 }), json!({ "year": 2016, "searches": 8 })];
        let data = collection(Endpoint::SearchByYear, rows);
        let mut selection = Selection::default();
        selection.set_year_range(2008, 2012);

        assert!(!data.is_empty());
        assert!(derive_series(&data, &selection, &projection(ViewKind::Main, "line-chart")).is_empty());

        let mut nothing_selected = Selection::default();
        for condition in nothing_selected.conditions().clone() {
            nothing_selected.toggle_condition(condition);
        }
        let series = derive_series(&yearly_conditions(), &nothing_selected, &projection(ViewKind::Main, "line-chart2"));
        assert!(series.is_empty());
    }

    #[test]
    fn year_filter_keeps_exactly_the_selected_years() {
        let rows = (2004..=2017)
            .map(|year| json!({ "year": year, "searches": year * 2 }))
            .collect();
        let data = collection(Endpoint::SearchByYear, rows);
        let mut selection = Selection::default();
        selection.set_year_range(2010, 2015);

        let series = derive_series(&data, &selection, &projection(ViewKind::Main, "line-chart"));
        assert_eq!(series.len(), 1);
        let years: Vec<Coord> = series[0].points.iter().map(|point| point.x.clone()).collect();
        assert_eq!(years, (2010..=2015).map(Coord::Year).collect::<Vec<_>>());
    }

    #[test]
    fn toggled_condition_adds_a_fifth_series() {
        let mut selection = Selection::default();
        selection.toggle_condition(Condition::Obesity);

        let series = derive_series(&yearly_conditions(), &selection, &projection(ViewKind::Main, "line-chart2"));
        assert_eq!(series.len(), 5);
        assert!(series.iter().any(|series| series.label == "obesity"));
    }

    #[test]
    fn unselected_conditions_never_label_a_series() {
        let selection = Selection::default();
        let series = derive_series(&yearly_conditions(), &selection, &projection(ViewKind::Main, "line-chart2"));
        for series in &series {
            let condition: Condition = series.label.parse().unwrap();
            assert!(selection.is_selected(condition));
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let selection = Selection::default();
        let projection = projection(ViewKind::Main, "line-chart2");
        let data = yearly_conditions();
        assert_eq!(
            derive_series(&data, &selection, &projection),
            derive_series(&data, &selection, &projection)
        );
    }

    #[test]
    fn empty_inputs_give_no_series() {
        let selection = Selection::default();
        for view in [ViewKind::Main, ViewKind::Comparison] {
            for target in view.targets() {
                let empty = RecordCollection::empty("empty");
                assert!(derive_series(&empty, &selection, &target.projection).is_empty());
            }
        }
    }

    #[test]
    fn time_series_sums_rows_sharing_a_year() {
        let data = collection(
            Endpoint::ByStateAndYear,
            vec![
                json!({ "state": "Texas", "year": 2006, "searches": 5 }),
                json!({ "state": "Ohio", "year": 2005, "searches": 1 }),
                json!({ "state": "Ohio", "year": 2006, "searches": 2 }),
            ],
        );
        let projection = Projection {
            kind: ChartKind::TimeSeries,
            key: "year",
            measure: Measure::Field { field: "searches", label: "Searches" },
        };
        let series = derive_series(&data, &Selection::default(), &projection);
        assert_eq!(
            series[0].points,
            vec![
                Point { x: Coord::Year(2005), y: 1.0 },
                Point { x: Coord::Year(2006), y: 7.0 },
            ]
        );
    }

    #[test]
    fn categorical_reads_fields_directly() {
        let data = collection(
            Endpoint::MostSearched,
            vec![
                json!({ "state": "California", "cancer": 9, "cardiovascular": 8, "stroke": 1, "depression": 4,
                        "rehab": 1, "vaccine": 1, "diarrhea": 1, "obesity": 1, "diabetes": 3 }),
                json!({ "state": "Texas", "cancer": 7, "cardiovascular": 6, "stroke": 1, "depression": 2,
                        "rehab": 1, "vaccine": 1, "diarrhea": 1, "obesity": 1, "diabetes": 5 }),
            ],
        );
        let series = derive_series(&data, &Selection::default(), &projection(ViewKind::Main, "bar-chart"));
        assert_eq!(series.len(), 4);
        let cancer = series.iter().find(|series| series.label == "cancer").unwrap();
        assert_eq!(
            cancer.points,
            vec![
                Point { x: Coord::Label("California".into()), y: 9.0 },
                Point { x: Coord::Label("Texas".into()), y: 7.0 },
            ]
        );
    }

    #[test]
    fn geographic_skips_regions_without_values() {
        let data = RecordCollection::from_rows(
            "searchbystate",
            &[("state", crate::models::FieldKind::Text)],
            vec![
                json!({ "state": "Texas", "postal": "TX", "searches": 40 }),
                json!({ "state": "Guam", "postal": null, "searches": 3 }),
                json!({ "state": "Ohio", "postal": "OH", "searches": null }),
            ],
        )
        .unwrap();
        let series = derive_series(&data, &Selection::default(), &projection(ViewKind::Main, "mymapDiv"));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points, vec![Point { x: Coord::Label("TX".into()), y: 40.0 }]);
    }

    #[test]
    fn correlation_matrix_passes_through_verbatim() {
        let series = derive_series(&correlation_matrix(), &Selection::default(), &projection(ViewKind::Main, "myDiv"));
        assert_eq!(series.len(), 9);
        let depression = series.iter().find(|series| series.label == "depression").unwrap();
        let diabetes = depression
            .points
            .iter()
            .find(|point| point.x == Coord::Label("diabetes".into()))
            .unwrap();
        assert_eq!(diabetes.y, 0.74);
    }

    #[test]
    fn gauge_with_zero_totals_reports_zero_percent() {
        let data = collection(
            Endpoint::SearchYearAndCondition,
            vec![json!({ "year": 2010, "cancer": 0, "cardiovascular": 0, "stroke": 0, "depression": 0,
                         "rehab": 0, "vaccine": 0, "diarrhea": 0, "obesity": 0, "diabetes": 0 })],
        );
        let series = derive_series(&data, &Selection::default(), &projection(ViewKind::Comparison, "container"));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points.len(), GAUGE_CONDITIONS.len());
        assert!(series[0].points.iter().all(|point| point.y == 0.0));
    }

    #[test]
    fn gauge_shares_sum_to_one_hundred() {
        let data = yearly_conditions();
        let series = derive_series(&data, &Selection::default(), &projection(ViewKind::Comparison, "container"));
        let total: f64 = series[0].points.iter().map(|point| point.y).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn grouped_radar_sums_per_cause_within_years() {
        let data = collection(
            Endpoint::CasesLeadingDeath,
            vec![
                json!({ "year": 2005, "cause": "Heart disease", "deaths": 10 }),
                json!({ "year": 2012, "cause": "Heart disease", "deaths": 20 }),
                json!({ "year": 2012, "cause": "Stroke", "deaths": 5 }),
            ],
        );
        let mut selection = Selection::default();
        selection.set_year_range(2010, 2017);
        let series = derive_series(&data, &selection, &projection(ViewKind::Main, "radarmyDiv2"));
        assert_eq!(
            series[0].points,
            vec![
                Point { x: Coord::Label("Heart disease".into()), y: 20.0 },
                Point { x: Coord::Label("Stroke".into()), y: 5.0 },
            ]
        );
    }

    #[test]
    fn percentage_handles_zero_total() {
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(1.0, 4.0), 25.0);
    }
}
