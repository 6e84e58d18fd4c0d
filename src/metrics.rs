// Metric Derivation Engine: grouped aggregation over a filtered slice,
// period normalization of the monthly rent, and the closed set of
// derived ratio formulas.
use crate::types::{AggregateRow, FilterParams, JoinedRecord, KpiSummary, MetricRow};
use crate::util::round2;
use chrono::{Datelike, NaiveDate};
use std::collections::{HashMap, HashSet};

/// Dimension aggregate rows are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Brand,
    Location,
}

/// Grouping-key selection rule shared by every chart producer: with
/// exactly one brand selected the charts break that brand down by store;
/// any other selection shows the cross-brand view.
pub fn grouping_for(params: &FilterParams) -> Grouping {
    if params.brands.len() == 1 {
        Grouping::Location
    } else {
        Grouping::Brand
    }
}

/// The full set of chartable metrics. One formula per variant; adding a
/// metric means adding a variant, so dispatch stays compile-time checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TotalSales,
    TotalUnits,
    TotalTickets,
    SalesPerArea,
    UnitsPerArea,
    TicketsPerArea,
    SalesPerRent,
    UnitsPerRent,
    TicketsPerRent,
    Atv,
    Upt,
    Asp,
}

impl Metric {
    pub const ALL: [Metric; 12] = [
        Metric::TotalSales,
        Metric::TotalUnits,
        Metric::TotalTickets,
        Metric::SalesPerArea,
        Metric::UnitsPerArea,
        Metric::TicketsPerArea,
        Metric::SalesPerRent,
        Metric::UnitsPerRent,
        Metric::TicketsPerRent,
        Metric::Atv,
        Metric::Upt,
        Metric::Asp,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::TotalSales => "Total Sales",
            Metric::TotalUnits => "Total Units",
            Metric::TotalTickets => "Total Tickets",
            Metric::SalesPerArea => "Sales / Sqm",
            Metric::UnitsPerArea => "Units / Sqm",
            Metric::TicketsPerArea => "Tickets / Sqm",
            Metric::SalesPerRent => "Sales / Rent Period",
            Metric::UnitsPerRent => "Units / Rent Period",
            Metric::TicketsPerRent => "Tickets / Rent Period",
            Metric::Atv => "Sales / Ticket (ATV)",
            Metric::Upt => "Units / Ticket (UPT)",
            Metric::Asp => "Sales / Unit (ASP)",
        }
    }

    /// Short name used in report file names.
    pub fn slug(&self) -> &'static str {
        match self {
            Metric::TotalSales => "total_sales",
            Metric::TotalUnits => "total_units",
            Metric::TotalTickets => "total_tickets",
            Metric::SalesPerArea => "sales_per_sqm",
            Metric::UnitsPerArea => "units_per_sqm",
            Metric::TicketsPerArea => "tickets_per_sqm",
            Metric::SalesPerRent => "sales_per_rent",
            Metric::UnitsPerRent => "units_per_rent",
            Metric::TicketsPerRent => "tickets_per_rent",
            Metric::Atv => "atv",
            Metric::Upt => "upt",
            Metric::Asp => "asp",
        }
    }

    /// Evaluate the metric for one aggregate row. `periods` is the number
    /// of calendar months the active date range touches; rent-based
    /// denominators are scaled to `fixed_rent * periods` so a monthly
    /// cost lines up with period-summed sales.
    ///
    /// Returns `None` when the denominator is non-positive or absent —
    /// undefined ratios are excluded, never reported as zero or infinity.
    /// Defined results are rounded to 2 decimals.
    pub fn evaluate(&self, row: &AggregateRow, periods: u32) -> Option<f64> {
        fn ratio(num: f64, den: Option<f64>) -> Option<f64> {
            match den {
                Some(d) if d > 0.0 => Some(num / d),
                _ => None,
            }
        }
        let rent_for_period = row.fixed_rent.map(|r| r * periods as f64);
        let value = match self {
            Metric::TotalSales => Some(row.total_sales),
            Metric::TotalUnits => Some(row.total_units),
            Metric::TotalTickets => Some(row.total_tickets),
            Metric::SalesPerArea => ratio(row.total_sales, row.total_area_sqm),
            Metric::UnitsPerArea => ratio(row.total_units, row.total_area_sqm),
            Metric::TicketsPerArea => ratio(row.total_tickets, row.total_area_sqm),
            Metric::SalesPerRent => ratio(row.total_sales, rent_for_period),
            Metric::UnitsPerRent => ratio(row.total_units, rent_for_period),
            Metric::TicketsPerRent => ratio(row.total_tickets, rent_for_period),
            Metric::Atv => ratio(row.total_sales, Some(row.total_tickets)),
            Metric::Upt => ratio(row.total_units, Some(row.total_tickets)),
            Metric::Asp => ratio(row.total_sales, Some(row.total_units)),
        }?;
        Some(round2(value))
    }
}

/// Count of distinct calendar months touched by the inclusive range.
/// A range covering any day of a month counts that month fully, so
/// 2024-01-15..2024-02-15 spans 2 periods.
pub fn periods_in_range(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    let months =
        (end.year() * 12 + end.month0() as i32) - (start.year() * 12 + start.month0() as i32) + 1;
    months as u32
}

#[derive(Default)]
struct Acc {
    total_sales: f64,
    total_units: f64,
    total_tickets: f64,
    total_area_sqm: Option<f64>,
    fixed_rent: Option<f64>,
    stores_with_area: HashSet<(String, String)>,
}

/// Group the slice by the chosen key (optionally split by year) and sum
/// the flow fields. Floor area is summed once per distinct (location,
/// brand) store in the group; rent keeps the first non-null value in row
/// order. Group order follows first appearance in the input, so output
/// is deterministic for a given slice.
pub fn aggregate(records: &[JoinedRecord], grouping: Grouping, by_year: bool) -> Vec<AggregateRow> {
    let mut order: Vec<(String, Option<i32>)> = Vec::new();
    let mut groups: HashMap<(String, Option<i32>), Acc> = HashMap::new();

    for r in records {
        let key = match grouping {
            Grouping::Brand => r.brand.clone(),
            Grouping::Location => r.location.clone(),
        };
        let year = by_year.then(|| r.year());
        let map_key = (key, year);
        let acc = groups.entry(map_key.clone()).or_insert_with(|| {
            order.push(map_key);
            Acc::default()
        });

        acc.total_sales += r.sales;
        acc.total_units += r.units;
        acc.total_tickets += r.tickets;
        if let Some(area) = r.area_sqm {
            let store = (r.location.clone(), r.brand.clone());
            if acc.stores_with_area.insert(store) {
                *acc.total_area_sqm.get_or_insert(0.0) += area;
            }
        }
        if acc.fixed_rent.is_none() {
            acc.fixed_rent = r.fixed_rent;
        }
    }

    order
        .into_iter()
        .map(|map_key| {
            let acc = groups.remove(&map_key).unwrap_or_default();
            AggregateRow {
                key: map_key.0,
                year: map_key.1,
                total_sales: acc.total_sales,
                total_units: acc.total_units,
                total_tickets: acc.total_tickets,
                total_area_sqm: acc.total_area_sqm,
                fixed_rent: acc.fixed_rent,
            }
        })
        .collect()
}

/// Produce chart-ready rows for one metric over a filtered slice.
///
/// The grouping key follows `grouping_for(params)`; `by_year` splits
/// each group by calendar year for the year-over-year bar charts. Groups
/// where the metric is undefined are excluded. Keys are ordered by the
/// metric total across years, descending, ties broken by key ascending;
/// rows within a key are ordered by year.
pub fn metric_rows(
    records: &[JoinedRecord],
    params: &FilterParams,
    metric: Metric,
    by_year: bool,
) -> Vec<MetricRow> {
    let (Some(start), Some(end)) = (params.start, params.end) else {
        return Vec::new();
    };
    let periods = periods_in_range(start, end);
    let grouping = grouping_for(params);

    let mut rows: Vec<MetricRow> = aggregate(records, grouping, by_year)
        .iter()
        .filter_map(|agg| {
            metric.evaluate(agg, periods).map(|value| MetricRow {
                key: agg.key.clone(),
                year: agg.year,
                value,
                total_sales: agg.total_sales,
            })
        })
        .collect();

    let mut totals: HashMap<String, f64> = HashMap::new();
    for row in &rows {
        *totals.entry(row.key.clone()).or_insert(0.0) += row.value;
    }
    let key_rank = |key: &str| totals.get(key).copied().unwrap_or(0.0);
    rows.sort_by(|a, b| {
        key_rank(&b.key)
            .partial_cmp(&key_rank(&a.key))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
            .then_with(|| a.year.cmp(&b.year))
    });
    rows
}

/// Whole-selection KPI card values. Returns `None` for an empty slice so
/// callers render "no data" instead of a wall of zeros.
pub fn kpi_summary(records: &[JoinedRecord]) -> Option<KpiSummary> {
    if records.is_empty() {
        return None;
    }
    let mut total_sales = 0.0;
    let mut total_units = 0.0;
    let mut total_tickets = 0.0;
    let mut total_area_sqm = 0.0;
    let mut stores_with_area: HashSet<(&str, &str)> = HashSet::new();
    for r in records {
        total_sales += r.sales;
        total_units += r.units;
        total_tickets += r.tickets;
        if let Some(area) = r.area_sqm {
            if stores_with_area.insert((r.location.as_str(), r.brand.as_str())) {
                total_area_sqm += area;
            }
        }
    }
    let ratio = |num: f64, den: f64| (den > 0.0).then(|| round2(num / den));
    Some(KpiSummary {
        total_sales,
        total_units,
        total_tickets,
        total_area_sqm,
        sales_per_area: ratio(total_sales, total_area_sqm),
        atv: ratio(total_sales, total_tickets),
        upt: ratio(total_units, total_tickets),
        asp: ratio(total_sales, total_units),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(
        location: &str,
        brand: &str,
        date: (i32, u32, u32),
        sales: f64,
        units: f64,
        tickets: f64,
        lease: Option<(f64, f64)>,
    ) -> JoinedRecord {
        JoinedRecord {
            location: location.to_string(),
            city: "CARACAS".to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            brand: brand.to_string(),
            sales,
            units,
            tickets,
            area_sqm: lease.map(|(a, _)| a),
            fixed_rent: lease.map(|(_, r)| r),
        }
    }

    fn range(s: (i32, u32, u32), e: (i32, u32, u32)) -> FilterParams {
        FilterParams::for_range(
            NaiveDate::from_ymd_opt(s.0, s.1, s.2).unwrap(),
            NaiveDate::from_ymd_opt(e.0, e.1, e.2).unwrap(),
        )
    }

    #[test]
    fn month_counting() {
        let d = |y, m, dd| NaiveDate::from_ymd_opt(y, m, dd).unwrap();
        assert_eq!(periods_in_range(d(2024, 1, 1), d(2024, 1, 31)), 1);
        assert_eq!(periods_in_range(d(2024, 1, 15), d(2024, 2, 15)), 2);
        assert_eq!(periods_in_range(d(2023, 11, 20), d(2024, 2, 3)), 4);
        assert_eq!(periods_in_range(d(2024, 3, 1), d(2024, 2, 1)), 0);
    }

    #[test]
    fn rent_scales_with_period_count() {
        // One fully-covered month: rent for the period equals the monthly
        // rent. N months: exactly N times the monthly rent.
        let agg = AggregateRow {
            key: "X".to_string(),
            year: None,
            total_sales: 3000.0,
            total_units: 0.0,
            total_tickets: 0.0,
            total_area_sqm: None,
            fixed_rent: Some(1000.0),
        };
        assert_eq!(Metric::SalesPerRent.evaluate(&agg, 1), Some(3.0));
        assert_eq!(Metric::SalesPerRent.evaluate(&agg, 3), Some(1.0));
    }

    #[test]
    fn area_is_deduped_per_store_not_per_row() {
        let rows = vec![
            rec("A", "X", (2024, 1, 10), 100.0, 10.0, 5.0, Some((50.0, 1000.0))),
            rec("A", "X", (2024, 1, 11), 100.0, 10.0, 5.0, Some((50.0, 1000.0))),
            rec("B", "X", (2024, 1, 12), 100.0, 10.0, 5.0, Some((30.0, 500.0))),
        ];
        let aggs = aggregate(&rows, Grouping::Brand, false);
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].total_area_sqm, Some(80.0));
        assert_eq!(aggs[0].fixed_rent, Some(1000.0));
        assert_eq!(aggs[0].total_sales, 300.0);
    }

    #[test]
    fn undefined_metrics_are_excluded_not_zeroed() {
        let rows = vec![
            rec("A", "X", (2024, 1, 10), 100.0, 10.0, 5.0, Some((50.0, 1000.0))),
            rec("B", "Y", (2024, 1, 10), 100.0, 10.0, 5.0, None),
        ];
        let out = metric_rows(&rows, &range((2024, 1, 1), (2024, 1, 31)), Metric::SalesPerArea, false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "X");
        assert!(out.iter().all(|r| r.value.is_finite()));
    }

    #[test]
    fn single_brand_selection_groups_by_location() {
        let mut params = range((2024, 1, 1), (2024, 12, 31));
        assert_eq!(grouping_for(&params), Grouping::Brand);
        params.brands.insert("X".to_string());
        assert_eq!(grouping_for(&params), Grouping::Location);
        params.brands.insert("Y".to_string());
        assert_eq!(grouping_for(&params), Grouping::Brand);
    }

    #[test]
    fn rows_sort_by_metric_total_descending_ties_by_key() {
        let rows = vec![
            rec("L1", "Alpha", (2024, 1, 10), 100.0, 1.0, 1.0, None),
            rec("L1", "Beta", (2024, 1, 10), 300.0, 1.0, 1.0, None),
            rec("L1", "Gamma", (2024, 1, 10), 100.0, 1.0, 1.0, None),
        ];
        let out = metric_rows(&rows, &range((2024, 1, 1), (2024, 1, 31)), Metric::TotalSales, false);
        let keys: Vec<&str> = out.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Beta", "Alpha", "Gamma"]);
    }

    #[test]
    fn two_month_scenario_end_to_end() {
        let rows = vec![
            rec("A", "X", (2024, 1, 15), 100.0, 10.0, 5.0, Some((50.0, 1000.0))),
            rec("A", "X", (2024, 2, 15), 200.0, 20.0, 10.0, Some((50.0, 1000.0))),
        ];
        let params = range((2024, 1, 1), (2024, 2, 29));

        let aggs = aggregate(&rows, grouping_for(&params), false);
        assert_eq!(aggs.len(), 1);
        let agg = &aggs[0];
        assert_eq!(agg.total_sales, 300.0);
        assert_eq!(agg.total_units, 30.0);
        assert_eq!(agg.total_tickets, 15.0);
        assert_eq!(agg.total_area_sqm, Some(50.0));

        let periods = periods_in_range(params.start.unwrap(), params.end.unwrap());
        assert_eq!(periods, 2);
        assert_eq!(Metric::SalesPerArea.evaluate(agg, periods), Some(6.0));
        assert_eq!(Metric::SalesPerRent.evaluate(agg, periods), Some(0.15));
        assert_eq!(Metric::Atv.evaluate(agg, periods), Some(20.0));
        assert_eq!(Metric::Upt.evaluate(agg, periods), Some(2.0));
        assert_eq!(Metric::Asp.evaluate(agg, periods), Some(10.0));
    }

    #[test]
    fn kpi_summary_empty_slice_is_none() {
        assert!(kpi_summary(&[]).is_none());
        let rows = vec![rec("A", "X", (2024, 1, 15), 100.0, 10.0, 5.0, Some((50.0, 1000.0)))];
        let kpis = kpi_summary(&rows).unwrap();
        assert_eq!(kpis.total_sales, 100.0);
        assert_eq!(kpis.sales_per_area, Some(2.0));
        assert_eq!(kpis.atv, Some(20.0));
    }
}
