use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;
use tabled::Tabled;

/// One sales transaction-day for a (location, brand) pair, after cleaning.
///
/// `location` and `brand` keep their original display casing (trimmed
/// only); `city` is upper-cased so the same city never splits into two
/// rollup groups over casing.
#[derive(Debug, Clone)]
pub struct SalesRecord {
    pub location: String,
    pub city: String,
    pub date: NaiveDate,
    pub brand: String,
    pub sales: f64,
    pub units: f64,
    pub tickets: f64,
}

impl SalesRecord {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Lease terms for one (location, brand) store: occupied floor area and
/// the contractual *monthly* fixed rent.
#[derive(Debug, Clone)]
pub struct LeaseRecord {
    pub location: String,
    pub brand: String,
    pub area_sqm: f64,
    pub fixed_rent: f64,
}

/// A sales record carrying the lease attributes of its store, or `None`
/// when no lease matched. Produced once per load and never mutated.
#[derive(Debug, Clone)]
pub struct JoinedRecord {
    pub location: String,
    pub city: String,
    pub date: NaiveDate,
    pub brand: String,
    pub sales: f64,
    pub units: f64,
    pub tickets: f64,
    pub area_sqm: Option<f64>,
    pub fixed_rent: Option<f64>,
}

impl JoinedRecord {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// User-selected filter state. Empty location/brand sets mean "no
/// restriction"; the date range is mandatory and inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    pub locations: HashSet<String>,
    pub brands: HashSet<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl FilterParams {
    pub fn for_range(start: NaiveDate, end: NaiveDate) -> Self {
        FilterParams {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }
}

/// Per-group sums for one grouping key (brand or location), optionally
/// split by year.
///
/// `total_area_sqm` is summed over the *distinct* (location, brand) pairs
/// seen in the group, never per transaction row, so a store trading on
/// three hundred days still contributes its floor area once.
/// `fixed_rent` is the first non-null rent observed — rent is a monthly
/// per-store figure and summing it across days would be meaningless.
#[derive(Debug, Clone)]
pub struct AggregateRow {
    pub key: String,
    pub year: Option<i32>,
    pub total_sales: f64,
    pub total_units: f64,
    pub total_tickets: f64,
    pub total_area_sqm: Option<f64>,
    pub fixed_rent: Option<f64>,
}

/// Presentation-ready chart row: one bar/point per (group key, year).
/// `total_sales` rides along for bubble sizing regardless of the metric.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct MetricRow {
    #[serde(rename = "Key")]
    #[tabled(rename = "Key")]
    pub key: String,
    #[serde(rename = "Year")]
    #[tabled(rename = "Year", display_with = "display_year")]
    pub year: Option<i32>,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: f64,
    #[serde(rename = "TotalSales")]
    #[tabled(rename = "TotalSales")]
    pub total_sales: f64,
}

pub fn display_year(year: &Option<i32>) -> String {
    match year {
        Some(y) => y.to_string(),
        None => "-".to_string(),
    }
}

/// Whole-selection KPI totals and ratios (the dashboard header cards).
/// Ratio fields are `None` when their denominator is non-positive.
#[derive(Debug, Clone, Serialize)]
pub struct KpiSummary {
    pub total_sales: f64,
    pub total_units: f64,
    pub total_tickets: f64,
    pub total_area_sqm: f64,
    pub sales_per_area: Option<f64>,
    pub atv: Option<f64>,
    pub upt: Option<f64>,
    pub asp: Option<f64>,
}

/// Per-city rollup of the filtered selection: totals, distinct store
/// count and the city's share of selection sales.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct CityRollupRow {
    #[serde(rename = "City")]
    #[tabled(rename = "City")]
    pub city: String,
    #[serde(rename = "TotalSales")]
    #[tabled(rename = "TotalSales")]
    pub total_sales: f64,
    #[serde(rename = "TotalUnits")]
    #[tabled(rename = "TotalUnits")]
    pub total_units: f64,
    #[serde(rename = "Stores")]
    #[tabled(rename = "Stores")]
    pub stores: usize,
    #[serde(rename = "SalesSharePct")]
    #[tabled(rename = "SalesSharePct")]
    pub sales_share_pct: f64,
}

/// One bar of a comparative chart: a brand's metric value under one of
/// the two selections.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ComparativeRow {
    #[serde(rename = "Key")]
    #[tabled(rename = "Key")]
    pub key: String,
    #[serde(rename = "Selection")]
    #[tabled(rename = "Selection")]
    pub selection: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: f64,
    #[serde(rename = "TotalSales")]
    #[tabled(rename = "TotalSales")]
    pub total_sales: f64,
}

/// One comparative KPI card, values pre-formatted for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct KpiCompareRow {
    #[serde(rename = "Kpi")]
    #[tabled(rename = "Kpi")]
    pub kpi: String,
    #[serde(rename = "SelectionA")]
    #[tabled(rename = "SelectionA")]
    pub selection_a: String,
    #[serde(rename = "SelectionB")]
    #[tabled(rename = "SelectionB")]
    pub selection_b: String,
    #[serde(rename = "Change")]
    #[tabled(rename = "Change")]
    pub change: String,
}

/// One classified group of a segmentation scatter.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct SegmentRow {
    #[serde(rename = "Key")]
    #[tabled(rename = "Key")]
    pub key: String,
    #[serde(rename = "ValueDim")]
    #[tabled(rename = "ValueDim")]
    pub value_dim: f64,
    #[serde(rename = "VolumeDim")]
    #[tabled(rename = "VolumeDim")]
    pub volume_dim: f64,
    #[serde(rename = "TotalSales")]
    #[tabled(rename = "TotalSales")]
    pub total_sales: f64,
    #[serde(rename = "Quadrant")]
    #[tabled(rename = "Quadrant")]
    pub quadrant: String,
}

/// Per-location sales total inside one city (map drill-down).
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct LocationSalesRow {
    #[serde(rename = "Location")]
    #[tabled(rename = "Location")]
    pub location: String,
    #[serde(rename = "TotalSales")]
    #[tabled(rename = "TotalSales")]
    pub total_sales: f64,
}
