// Geographic rollups feeding the map view: per-city totals with store
// counts and sales share, and the per-location drill-down inside one
// city. Chart rendering itself lives outside the core.
use crate::types::{CityRollupRow, JoinedRecord, LocationSalesRow};
use crate::util::round2;
use std::collections::{HashMap, HashSet};

/// Per-city totals over the filtered slice. Store counts are distinct
/// (location, brand) pairs, and `sales_share_pct` is the city's share of
/// the whole selection's sales. Empty input (or all-zero sales, which
/// would make shares meaningless) yields an empty result.
pub fn city_rollup(records: &[JoinedRecord]) -> Vec<CityRollupRow> {
    let selection_sales: f64 = records.iter().map(|r| r.sales).sum();
    if records.is_empty() || selection_sales <= 0.0 {
        return Vec::new();
    }

    #[derive(Default)]
    struct Acc {
        sales: f64,
        units: f64,
        stores: HashSet<(String, String)>,
    }
    let mut order: Vec<String> = Vec::new();
    let mut cities: HashMap<String, Acc> = HashMap::new();
    for r in records {
        let acc = cities.entry(r.city.clone()).or_insert_with(|| {
            order.push(r.city.clone());
            Acc::default()
        });
        acc.sales += r.sales;
        acc.units += r.units;
        acc.stores.insert((r.location.clone(), r.brand.clone()));
    }

    let mut rows: Vec<CityRollupRow> = order
        .into_iter()
        .map(|city| {
            let acc = cities.remove(&city).unwrap_or_default();
            CityRollupRow {
                city,
                total_sales: acc.sales,
                total_units: acc.units,
                stores: acc.stores.len(),
                sales_share_pct: round2(acc.sales / selection_sales * 100.0),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_sales
            .partial_cmp(&a.total_sales)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.city.cmp(&b.city))
    });
    rows
}

/// Sales per location inside one city, descending. The drill-down a map
/// click opens.
pub fn location_sales(records: &[JoinedRecord], city: &str) -> Vec<LocationSalesRow> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, f64> = HashMap::new();
    for r in records.iter().filter(|r| r.city == city) {
        let entry = totals.entry(r.location.clone()).or_insert_with(|| {
            order.push(r.location.clone());
            0.0
        });
        *entry += r.sales;
    }
    let mut rows: Vec<LocationSalesRow> = order
        .into_iter()
        .map(|location| {
            let total_sales = totals.remove(&location).unwrap_or_default();
            LocationSalesRow {
                location,
                total_sales,
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_sales
            .partial_cmp(&a.total_sales)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.location.cmp(&b.location))
    });
    rows
}
