use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::{FLOW_COLUMNS, LOCATION_COLUMNS};
use crate::domain::{Flow, Location};
use crate::pipeline::ingestion::Table;

/// Why a single row was dropped
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum RowError {
    #[error("missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("empty identifier in '{field}'")]
    EmptyId { field: &'static str },

    #[error("'{value}' is not a valid number for '{field}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{value} is out of range for '{field}'")]
    OutOfRange { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowRejection {
    /// 1-based data row number (the header is not counted)
    pub row: usize,
    pub error: RowError,
}

/// Per-dataset accounting of accepted and dropped rows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseReport {
    pub total_rows: usize,
    pub accepted: usize,
    pub rejected: Vec<RowRejection>,
    /// Rows whose id replaced an earlier location with the same id
    pub duplicates: usize,
}

impl ParseReport {
    fn reject(&mut self, row: usize, error: RowError) {
        debug!("Dropping row {}: {}", row, error);
        self.rejected.push(RowRejection { row, error });
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedLocations {
    pub locations: Vec<Location>,
    pub report: ParseReport,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedFlows {
    pub flows: Vec<Flow>,
    pub report: ParseReport,
}

/// Tagged outcome of numeric coercion. Invalid input never becomes NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericField {
    Valid(f64),
    Invalid,
}

impl NumericField {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => NumericField::Valid(v),
            _ => NumericField::Invalid,
        }
    }
}

/// Resolves column positions by header name, falling back to the canonical layout.
struct Columns<const N: usize> {
    positions: [usize; N],
}

impl<const N: usize> Columns<N> {
    fn resolve(table: &Table, canonical: [&str; N]) -> Self {
        let mut positions = [0; N];
        for (i, name) in canonical.iter().enumerate() {
            positions[i] = table.column(name).unwrap_or(i);
        }
        Self { positions }
    }

    fn get<'a>(&self, row: &'a [String], index: usize) -> Option<&'a str> {
        row.get(self.positions[index]).map(|s| s.trim())
    }
}

fn required<'a>(field: Option<&'a str>, name: &'static str) -> Result<&'a str, RowError> {
    field.ok_or(RowError::MissingField { field: name })
}

fn identifier(field: Option<&str>, name: &'static str) -> Result<String, RowError> {
    let value = required(field, name)?;
    if value.is_empty() {
        return Err(RowError::EmptyId { field: name });
    }
    Ok(value.to_string())
}

fn coordinate(field: Option<&str>, name: &'static str, limit: f64) -> Result<f64, RowError> {
    let raw = required(field, name)?;
    match NumericField::parse(raw) {
        NumericField::Valid(v) if (-limit..=limit).contains(&v) => Ok(v),
        NumericField::Valid(v) => Err(RowError::OutOfRange {
            field: name,
            value: v.to_string(),
        }),
        NumericField::Invalid => Err(RowError::InvalidNumber {
            field: name,
            value: raw.to_string(),
        }),
    }
}

fn count(field: Option<&str>) -> Result<u64, RowError> {
    let raw = required(field, "count")?;
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(v);
    }
    match raw.parse::<i64>() {
        Ok(v) if v < 0 => Err(RowError::OutOfRange {
            field: "count",
            value: raw.to_string(),
        }),
        _ => Err(RowError::InvalidNumber {
            field: "count",
            value: raw.to_string(),
        }),
    }
}

fn parse_location(columns: &Columns<4>, row: &[String]) -> Result<Location, RowError> {
    let id = identifier(columns.get(row, 0), "id")?;
    let lat = coordinate(columns.get(row, 1), "lat", 90.0)?;
    let lon = coordinate(columns.get(row, 2), "lon", 180.0)?;
    let name = columns
        .get(row, 3)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    Ok(Location { id, lat, lon, name })
}

fn parse_flow(columns: &Columns<3>, row: &[String]) -> Result<Flow, RowError> {
    let origin = identifier(columns.get(row, 0), "origin")?;
    let dest = identifier(columns.get(row, 1), "dest")?;
    let count = count(columns.get(row, 2))?;
    Ok(Flow { origin, dest, count })
}

/// Convert a raw table into locations.
///
/// Rows with an empty id or invalid coordinates are dropped and reported.
/// A repeated id replaces the earlier location in place (last write wins).
pub fn parse_locations(table: &Table) -> ParsedLocations {
    let columns = Columns::resolve(table, LOCATION_COLUMNS);
    let mut report = ParseReport {
        total_rows: table.rows.len(),
        ..Default::default()
    };
    let mut locations: Vec<Location> = Vec::with_capacity(table.rows.len());
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for (i, row) in table.rows.iter().enumerate() {
        match parse_location(&columns, row) {
            Ok(location) => {
                report.accepted += 1;
                if let Some(&existing) = index_by_id.get(&location.id) {
                    warn!("Duplicate location id '{}' on row {}, replacing earlier entry", location.id, i + 1);
                    report.duplicates += 1;
                    locations[existing] = location;
                } else {
                    index_by_id.insert(location.id.clone(), locations.len());
                    locations.push(location);
                }
            }
            Err(e) => report.reject(i + 1, e),
        }
    }

    ParsedLocations { locations, report }
}

/// Convert a raw table into flows. Rows with a malformed count are rejected outright.
pub fn parse_flows(table: &Table) -> ParsedFlows {
    let columns = Columns::resolve(table, FLOW_COLUMNS);
    let mut report = ParseReport {
        total_rows: table.rows.len(),
        ..Default::default()
    };
    let mut flows = Vec::with_capacity(table.rows.len());

    for (i, row) in table.rows.iter().enumerate() {
        match parse_flow(&columns, row) {
            Ok(flow) => {
                report.accepted += 1;
                flows.push(flow);
            }
            Err(e) => report.reject(i + 1, e),
        }
    }

    ParsedFlows { flows, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingestion::split_table;

    #[test]
    fn test_parse_locations_trims_and_keeps_optional_name() {
        let table = split_table("id,lat,lon,name\n A ,10.5, -20 , Alpha \nB,1,2,\nC,3,4\n");
        let parsed = parse_locations(&table);

        assert_eq!(parsed.locations.len(), 3);
        assert_eq!(parsed.locations[0], Location::new("A", 10.5, -20.0).with_name("Alpha"));
        assert_eq!(parsed.locations[1].name, None);
        assert_eq!(parsed.locations[2].name, None);
        assert!(parsed.report.rejected.is_empty());
    }

    #[test]
    fn test_parse_locations_rejects_bad_coordinates() {
        let table = split_table("id,lat,lon,name\nA,abc,0,x\nB,95,0,y\nC,0,NaN,z\n,0,0,empty\nD,1,1,ok\n");
        let parsed = parse_locations(&table);

        assert_eq!(parsed.locations.len(), 1);
        assert_eq!(parsed.locations[0].id, "D");
        assert_eq!(parsed.report.total_rows, 5);
        assert_eq!(parsed.report.accepted, 1);
        assert_eq!(parsed.report.rejected.len(), 4);
        assert!(matches!(parsed.report.rejected[0].error, RowError::InvalidNumber { field: "lat", .. }));
        assert!(matches!(parsed.report.rejected[1].error, RowError::OutOfRange { field: "lat", .. }));
        assert!(matches!(parsed.report.rejected[2].error, RowError::InvalidNumber { field: "lon", .. }));
        assert_eq!(parsed.report.rejected[3].error, RowError::EmptyId { field: "id" });
        assert_eq!(parsed.report.rejected[3].row, 4);
    }

    #[test]
    fn test_duplicate_location_ids_last_write_wins_in_place() {
        let table = split_table("id,lat,lon,name\nA,0,0,first\nB,1,1,b\nA,5,5,second\n");
        let parsed = parse_locations(&table);

        assert_eq!(parsed.locations.len(), 2);
        assert_eq!(parsed.locations[0].id, "A");
        assert_eq!(parsed.locations[0].name.as_deref(), Some("second"));
        assert_eq!(parsed.locations[0].lat, 5.0);
        assert_eq!(parsed.locations[1].id, "B");
        assert_eq!(parsed.report.duplicates, 1);
    }

    #[test]
    fn test_columns_resolved_by_header_name() {
        let table = split_table("name,lon,lat,id\nAlpha,2,1,A\n");
        let parsed = parse_locations(&table);
        assert_eq!(parsed.locations[0], Location::new("A", 1.0, 2.0).with_name("Alpha"));
    }

    #[test]
    fn test_parse_flows_rejects_malformed_counts() {
        let table = split_table("origin,dest,count\nA,B,10\nA,B,-3\nA,B,ten\nA,B,1.5\nA,,4\nA,B\nB,A,0\n");
        let parsed = parse_flows(&table);

        assert_eq!(parsed.flows, vec![Flow::new("A", "B", 10), Flow::new("B", "A", 0)]);
        assert_eq!(parsed.report.rejected.len(), 5);
        assert!(matches!(parsed.report.rejected[0].error, RowError::OutOfRange { field: "count", .. }));
        assert!(matches!(parsed.report.rejected[1].error, RowError::InvalidNumber { field: "count", .. }));
        assert!(matches!(parsed.report.rejected[2].error, RowError::InvalidNumber { field: "count", .. }));
        assert_eq!(parsed.report.rejected[3].error, RowError::EmptyId { field: "dest" });
        assert_eq!(parsed.report.rejected[4].error, RowError::MissingField { field: "count" });
    }

    #[test]
    fn test_parse_flows_keeps_self_loops() {
        let table = split_table("origin,dest,count\nA,A,3\n");
        let parsed = parse_flows(&table);
        assert!(parsed.flows[0].is_self_loop());
    }

    #[test]
    fn test_numeric_field_is_tagged() {
        assert_eq!(NumericField::parse(" 4.25 "), NumericField::Valid(4.25));
        assert_eq!(NumericField::parse("inf"), NumericField::Invalid);
        assert_eq!(NumericField::parse(""), NumericField::Invalid);
    }
}
