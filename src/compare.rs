// Comparative Assembler: runs the derivation engine over two
// independently filtered selections and lines the results up by brand.
// Comparative mode always groups by brand so the two sides share a key
// space even when their filters differ.
use crate::metrics::{aggregate, kpi_summary, periods_in_range, Grouping, Metric};
use crate::types::{ComparativeRow, FilterParams, JoinedRecord, KpiCompareRow, KpiSummary};
use crate::util::format_number;
use std::collections::HashMap;
use std::fmt;

/// Direction of a whole-selection KPI between selection A and B.
///
/// `New` is the distinguished "came from nothing" case (A zero, B
/// positive); it is never folded into a numeric percentage. Changes
/// within ±0.1% read as `Flat`, as does the both-zero case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Change {
    New,
    Flat,
    Pct(f64),
}

pub fn change_between(a: f64, b: f64) -> Change {
    if a > 0.0 {
        let pct = (b - a) / a * 100.0;
        if pct.abs() <= 0.1 {
            Change::Flat
        } else {
            Change::Pct(pct)
        }
    } else if b > 0.0 {
        Change::New
    } else {
        Change::Flat
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::New => write!(f, "new"),
            Change::Flat => write!(f, "-"),
            Change::Pct(pct) => write!(f, "{:+.1}%", pct),
        }
    }
}

/// Per-brand metric values for both selections, tagged `A` / `B`.
///
/// Each selection is aggregated and evaluated on its own (including its
/// own period count, since the two date ranges may differ in length).
/// Brands where the metric is undefined on one side simply have no row
/// for that side. Keys are ordered by the combined A+B metric total,
/// descending, ties by key ascending.
pub fn comparative_rows(
    slice_a: &[JoinedRecord],
    params_a: &FilterParams,
    slice_b: &[JoinedRecord],
    params_b: &FilterParams,
    metric: Metric,
) -> Vec<ComparativeRow> {
    let mut rows: Vec<ComparativeRow> = Vec::new();
    for (slice, params, tag) in [(slice_a, params_a, "A"), (slice_b, params_b, "B")] {
        let (Some(start), Some(end)) = (params.start, params.end) else {
            continue;
        };
        let periods = periods_in_range(start, end);
        for agg in aggregate(slice, Grouping::Brand, false) {
            if let Some(value) = metric.evaluate(&agg, periods) {
                rows.push(ComparativeRow {
                    key: agg.key,
                    selection: tag.to_string(),
                    value,
                    total_sales: agg.total_sales,
                });
            }
        }
    }

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
            .then_with(|| a.selection.cmp(&b.selection))
    });
    rows
}

struct KpiDef {
    name: &'static str,
    money: bool,
    decimals: usize,
    get: fn(&KpiSummary) -> Option<f64>,
}

const KPI_DEFS: [KpiDef; 8] = [
    KpiDef { name: "Total Sales", money: true, decimals: 0, get: |k| Some(k.total_sales) },
    KpiDef { name: "Total Sqm", money: false, decimals: 0, get: |k| Some(k.total_area_sqm) },
    KpiDef { name: "Total Tickets", money: false, decimals: 0, get: |k| Some(k.total_tickets) },
    KpiDef { name: "Total Units", money: false, decimals: 0, get: |k| Some(k.total_units) },
    KpiDef { name: "Sales / Sqm", money: true, decimals: 2, get: |k| k.sales_per_area },
    KpiDef { name: "Sales / Ticket (ATV)", money: true, decimals: 2, get: |k| k.atv },
    KpiDef { name: "Units / Ticket (UPT)", money: false, decimals: 2, get: |k| k.upt },
    KpiDef { name: "Sales / Unit (ASP)", money: true, decimals: 2, get: |k| k.asp },
];

fn display_kpi(value: Option<f64>, money: bool, decimals: usize) -> String {
    match value {
        Some(v) if money => format!("${}", format_number(v, decimals)),
        Some(v) => format_number(v, decimals),
        None => "-".to_string(),
    }
}

/// Whole-selection KPI cards for the comparative header: each KPI shown
/// for both selections with a change indicator. Deltas are computed on
/// totals only, never per group; an undefined ratio counts as zero for
/// the delta so "no ATV at all → some ATV" reads as `new`.
pub fn kpi_comparison(slice_a: &[JoinedRecord], slice_b: &[JoinedRecord]) -> Vec<KpiCompareRow> {
    let empty = KpiSummary {
        total_sales: 0.0,
        total_units: 0.0,
        total_tickets: 0.0,
        total_area_sqm: 0.0,
        sales_per_area: None,
        atv: None,
        upt: None,
        asp: None,
    };
    let a = kpi_summary(slice_a).unwrap_or_else(|| empty.clone());
    let b = kpi_summary(slice_b).unwrap_or(empty);

    KPI_DEFS
        .iter()
        .map(|def| {
            let va = (def.get)(&a);
            let vb = (def.get)(&b);
            let change = change_between(va.unwrap_or(0.0), vb.unwrap_or(0.0));
            KpiCompareRow {
                kpi: def.name.to_string(),
                selection_a: display_kpi(va, def.money, def.decimals),
                selection_b: display_kpi(vb, def.money, def.decimals),
                change: change.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(brand: &str, date: (i32, u32, u32), sales: f64) -> JoinedRecord {
        JoinedRecord {
            location: "A".to_string(),
            city: "CARACAS".to_string(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            brand: brand.to_string(),
            sales,
            units: sales / 10.0,
            tickets: sales / 20.0,
            area_sqm: Some(50.0),
            fixed_rent: Some(1000.0),
        }
    }

    fn range(y: i32) -> FilterParams {
        FilterParams::for_range(
            NaiveDate::from_ymd_opt(y, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(y, 12, 31).unwrap(),
        )
    }

    #[test]
    fn zero_to_positive_reads_as_new() {
        assert_eq!(change_between(0.0, 100.0), Change::New);
        assert!(!matches!(change_between(0.0, 100.0), Change::Pct(_)));
    }

    #[test]
    fn both_zero_reads_as_flat_not_zero_percent() {
        assert_eq!(change_between(0.0, 0.0), Change::Flat);
        assert_eq!(change_between(100.0, 100.05), Change::Flat);
    }

    #[test]
    fn percentage_change_is_signed() {
        assert_eq!(change_between(100.0, 150.0), Change::Pct(50.0));
        assert_eq!(change_between(200.0, 100.0), Change::Pct(-50.0));
        assert_eq!(change_between(100.0, 150.0).to_string(), "+50.0%");
    }

    #[test]
    fn selections_align_by_brand_and_sort_by_combined_total() {
        let a = vec![rec("Alpha", (2024, 3, 1), 100.0), rec("Beta", (2024, 3, 1), 500.0)];
        let b = vec![rec("Alpha", (2025, 3, 1), 200.0)];
        let rows = comparative_rows(&a, &range(2024), &b, &range(2025), Metric::TotalSales);
        // Beta: 500 total; Alpha: 100 + 200 = 300.
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].key, "Beta");
        assert_eq!(rows[0].selection, "A");
        assert_eq!(rows[1].key, "Alpha");
        assert_eq!(rows[1].selection, "A");
        assert_eq!(rows[2].key, "Alpha");
        assert_eq!(rows[2].selection, "B");
    }

    #[test]
    fn kpi_comparison_marks_new_sales() {
        let b = vec![rec("Alpha", (2025, 3, 1), 100.0)];
        let rows = kpi_comparison(&[], &b);
        let total_sales = rows.iter().find(|r| r.kpi == "Total Sales").unwrap();
        assert_eq!(total_sales.change, "new");
        assert_eq!(total_sales.selection_a, "$0");
        let atv = rows.iter().find(|r| r.kpi == "Sales / Ticket (ATV)").unwrap();
        assert_eq!(atv.selection_a, "-");
    }
}
