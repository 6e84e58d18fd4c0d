// Entry point and high-level CLI flow.
//
// - Option [1] loads and cleans the sales and lease files (or builds the
//   seeded demo dataset when they are absent) and joins them.
// - Option [2] recomputes every report for the full loaded date range
//   and writes CSV/JSON outputs with console previews.
//
// The joined dataset is loaded once and held read-only; every report
// pass derives fresh tables from it.
mod compare;
mod demo;
mod error;
mod filter;
mod join;
mod loader;
mod metrics;
mod output;
mod rollup;
mod segment;
mod types;
mod util;

use chrono::{Datelike, NaiveDate};
use metrics::Metric;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use types::{FilterParams, JoinedRecord};

const SALES_FILE: &str = "sales.csv";
const LEASES_FILE: &str = "leases.csv";

static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Vec<JoinedRecord>>,
}

/// Read a single line of input after printing the common "Enter choice:"
/// prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the report menu after generating
/// reports. Returns `true` for `Y`, `false` for `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load, clean and join the two data files.
///
/// Missing files fall back to the seeded demo generator. Files that are
/// present but unusable are a hard load failure: the state stays empty
/// and no reports can be generated.
fn handle_load() {
    let sales_path = Path::new(SALES_FILE);
    let leases_path = Path::new(LEASES_FILE);

    let (sales, leases) = if sales_path.exists() && leases_path.exists() {
        let (sales, sales_report) = match loader::load_sales(sales_path) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Failed to load sales data: {}\n", e);
                return;
            }
        };
        let (leases, lease_report) = match loader::load_leases(leases_path) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Failed to load lease data: {}\n", e);
                return;
            }
        };
        println!(
            "Sales: {} rows loaded, {} dropped by validation.",
            util::format_int(sales_report.kept_rows as i64),
            util::format_int(sales_report.dropped_rows as i64)
        );
        println!(
            "Leases: {} stores loaded, {} dropped, {} duplicates discarded.",
            util::format_int(lease_report.kept_rows as i64),
            util::format_int(lease_report.dropped_rows as i64),
            util::format_int(lease_report.duplicate_leases as i64)
        );
        (sales, leases)
    } else {
        println!(
            "Warning: {} / {} not found. Generating seeded demo data.",
            SALES_FILE, LEASES_FILE
        );
        let (sales, leases) = demo::generate();
        println!(
            "Demo data: {} sales rows across {} stores.",
            util::format_int(sales.len() as i64),
            util::format_int(leases.len() as i64)
        );
        (sales, leases)
    };

    let joined = join::left_join(&sales, &leases);
    let matched = joined.iter().filter(|r| r.area_sqm.is_some()).count();
    println!(
        "Joined {} sales rows ({} with lease terms).\n",
        util::format_int(joined.len() as i64),
        util::format_int(matched as i64)
    );
    let mut state = APP_STATE.lock().unwrap();
    state.data = Some(joined);
}

/// Full inclusive date range covered by the loaded dataset.
fn loaded_range(records: &[JoinedRecord]) -> Option<(NaiveDate, NaiveDate)> {
    let min = records.iter().map(|r| r.date).min()?;
    let max = records.iter().map(|r| r.date).max()?;
    Some((min, max))
}

fn print_kpi_summary(kpis: &types::KpiSummary) {
    let opt = |v: Option<f64>| match v {
        Some(v) => util::format_number(v, 2),
        None => "-".to_string(),
    };
    println!("  Total Sales:          ${}", util::format_number(kpis.total_sales, 0));
    println!("  Total Sqm:            {}", util::format_number(kpis.total_area_sqm, 0));
    println!("  Total Tickets:        {}", util::format_number(kpis.total_tickets, 0));
    println!("  Total Units:          {}", util::format_number(kpis.total_units, 0));
    println!("  Sales / Sqm:          ${}", opt(kpis.sales_per_area));
    println!("  Sales / Ticket (ATV): ${}", opt(kpis.atv));
    println!("  Units / Ticket (UPT): {}", opt(kpis.upt));
    println!("  Sales / Unit (ASP):   ${}", opt(kpis.asp));
    println!();
}

/// Handle option [2]: derive and export every report over the full
/// loaded date range.
fn handle_generate_reports() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the data files first (option 1).\n");
        return;
    };
    let Some((start, end)) = loaded_range(&data) else {
        println!("Error: Loaded dataset is empty.\n");
        return;
    };
    let params = FilterParams::for_range(start, end);
    let slice = filter::filter_records(&data, &params);

    println!("Generating reports for {} .. {}...\n", start, end);

    // KPI header cards.
    println!("KPI Summary");
    match metrics::kpi_summary(&slice) {
        Some(kpis) => {
            print_kpi_summary(&kpis);
            if let Err(e) = output::write_json("kpi_summary.json", &kpis) {
                eprintln!("Write error: {}", e);
            }
        }
        None => println!("  (no data)\n"),
    }

    // Year-over-year breakdown per metric.
    for metric in Metric::ALL {
        let rows = metrics::metric_rows(&slice, &params, metric, true);
        let file = format!("report_yoy_{}.csv", metric.slug());
        if let Err(e) = output::write_csv(&file, &rows) {
            eprintln!("Write error: {}", e);
        }
        println!("Year-over-Year: {} (exported to {})", metric.label(), file);
        output::preview_table_rows(&rows, 3);
    }

    // Geographic rollup and drill-down for the top city.
    let cities = rollup::city_rollup(&slice);
    if let Err(e) = output::write_csv("report_city_rollup.csv", &cities) {
        eprintln!("Write error: {}", e);
    }
    println!("City Rollup (exported to report_city_rollup.csv)");
    output::preview_table_rows(&cities, 5);
    if let Some(top) = cities.first() {
        let detail = rollup::location_sales(&slice, &top.city);
        let file = "report_city_detail.csv";
        if let Err(e) = output::write_csv(file, &detail) {
            eprintln!("Write error: {}", e);
        }
        println!("Locations in {} (exported to {})", top.city, file);
        output::preview_table_rows(&detail, 5);
    }

    // Median-quadrant segmentation, both preset views.
    let segmentations = [
        ("Sqm Efficiency", segment::AREA_SEGMENTATION, "report_segmentation_sqm.csv"),
        ("Rent Efficiency", segment::RENT_SEGMENTATION, "report_segmentation_rent.csv"),
    ];
    for (title, dims, file) in segmentations {
        println!("Segmentation: {} (exported to {})", title, file);
        match segment::segment(&slice, &params, dims) {
            Some(rows) => {
                if let Err(e) = output::write_csv(file, &rows) {
                    eprintln!("Write error: {}", e);
                }
                output::preview_table_rows(&rows, 5);
            }
            None => println!("(insufficient data to segment)\n"),
        }
    }

    // Comparative report between the two most recent calendar years.
    let last_year = end.year();
    let prev_year = last_year - 1;
    if start.year() < last_year {
        let year_params = |y: i32| {
            FilterParams::for_range(
                NaiveDate::from_ymd_opt(y, 1, 1).expect("valid year start"),
                NaiveDate::from_ymd_opt(y, 12, 31).expect("valid year end"),
            )
        };
        let params_a = year_params(prev_year);
        let params_b = year_params(last_year);
        let slice_a = filter::filter_records(&data, &params_a);
        let slice_b = filter::filter_records(&data, &params_b);

        println!("Comparative KPIs: {} (A) vs {} (B)", prev_year, last_year);
        let kpi_rows = compare::kpi_comparison(&slice_a, &slice_b);
        if let Err(e) = output::write_csv("report_comparative_kpis.csv", &kpi_rows) {
            eprintln!("Write error: {}", e);
        }
        output::preview_table_rows(&kpi_rows, kpi_rows.len());

        let comp_rows =
            compare::comparative_rows(&slice_a, &params_a, &slice_b, &params_b, Metric::TotalSales);
        if let Err(e) = output::write_csv("report_comparative_sales.csv", &comp_rows) {
            eprintln!("Write error: {}", e);
        }
        println!("Comparative Total Sales by brand (exported to report_comparative_sales.csv)");
        output::preview_table_rows(&comp_rows, 6);
    } else {
        println!("Comparative report skipped: dataset covers a single calendar year.\n");
    }
}

fn main() {
    loop {
        println!("Retail KPI Monitor");
        println!("[1] Load the data files");
        println!("[2] Generate Reports\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!();
                handle_generate_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
