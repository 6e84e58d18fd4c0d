// Record Normalizer: turns raw CSV rows into the canonical sales and
// lease tables. Column headers are matched case- and whitespace-
// insensitively; rows that fail type or sign validation are dropped and
// counted, never raised.
use crate::error::LoadError;
use crate::types::{LeaseRecord, SalesRecord};
use crate::util::{parse_date_dayfirst, parse_f64_safe};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::path::Path;

pub const SALES_COLUMNS: [&str; 7] =
    ["LOCATION", "CITY", "DATE", "BRAND", "SALES", "UNITS", "TICKETS"];
pub const LEASE_COLUMNS: [&str; 4] = ["LOCATION", "BRAND", "AREA_SQM", "FIXED_RENT"];

/// Counts reported after cleaning one input file.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_rows: usize,
    pub duplicate_leases: usize,
}

/// Canonical form used to match header cells: trimmed, upper-cased, and
/// with internal whitespace collapsed to `_`, so `" fixed rent "`,
/// `"Fixed Rent"` and `"FIXED_RENT"` all name the same column.
fn canonical_header(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Resolve each required column name to its index in the header record.
fn column_indices(
    headers: &StringRecord,
    required: &'static [&'static str],
    path: &str,
) -> Result<Vec<usize>, LoadError> {
    let canon: Vec<String> = headers.iter().map(canonical_header).collect();
    required
        .iter()
        .map(|&name| {
            canon
                .iter()
                .position(|h| h.as_str() == name)
                .ok_or(LoadError::MissingColumn {
                    path: path.to_string(),
                    column: name,
                })
        })
        .collect()
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(ReaderBuilder::new().flexible(true).from_reader(file))
}

/// Load and clean the daily sales file.
///
/// Kept rows satisfy: all seven fields present, date parses day-first,
/// `sales >= 0`, `units >= 0`, `tickets > 0`. `location` and `brand` are
/// trimmed but keep their display casing; `city` is upper-cased.
pub fn load_sales(path: &Path) -> Result<(Vec<SalesRecord>, LoadReport), LoadError> {
    let mut rdr = open_reader(path)?;
    let path_str = path.display().to_string();
    let headers = rdr
        .headers()
        .map_err(|e| LoadError::Csv {
            path: path_str.clone(),
            source: e,
        })?
        .clone();
    let idx = column_indices(&headers, &SALES_COLUMNS, &path_str)?;

    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for result in rdr.records() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                report.dropped_rows += 1;
                continue;
            }
        };
        let field = |i: usize| row.get(idx[i]);

        let location = field(0).map(str::trim).unwrap_or_default();
        let city = field(1).map(str::trim).unwrap_or_default();
        let brand = field(3).map(str::trim).unwrap_or_default();
        let date = parse_date_dayfirst(field(2));
        let sales = parse_f64_safe(field(4));
        let units = parse_f64_safe(field(5));
        let tickets = parse_f64_safe(field(6));

        match (date, sales, units, tickets) {
            (Some(date), Some(sales), Some(units), Some(tickets))
                if !location.is_empty()
                    && !city.is_empty()
                    && !brand.is_empty()
                    && sales >= 0.0
                    && units >= 0.0
                    && tickets > 0.0 =>
            {
                records.push(SalesRecord {
                    location: location.to_string(),
                    city: city.to_uppercase(),
                    date,
                    brand: brand.to_string(),
                    sales,
                    units,
                    tickets,
                });
                report.kept_rows += 1;
            }
            _ => report.dropped_rows += 1,
        }
    }

    if records.is_empty() {
        return Err(LoadError::EmptyAfterCleaning { path: path_str });
    }
    Ok((records, report))
}

/// Load, clean and de-duplicate the lease file.
///
/// `location` and `brand` are trimmed and upper-cased; `area_sqm` must be
/// positive and `fixed_rent` non-negative. At most one record per
/// (location, brand) survives: the first occurrence wins.
pub fn load_leases(path: &Path) -> Result<(Vec<LeaseRecord>, LoadReport), LoadError> {
    let mut rdr = open_reader(path)?;
    let path_str = path.display().to_string();
    let headers = rdr
        .headers()
        .map_err(|e| LoadError::Csv {
            path: path_str.clone(),
            source: e,
        })?
        .clone();
    let idx = column_indices(&headers, &LEASE_COLUMNS, &path_str)?;

    let mut report = LoadReport::default();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut records = Vec::new();
    for result in rdr.records() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => {
                report.dropped_rows += 1;
                continue;
            }
        };
        let location = row
            .get(idx[0])
            .map(|s| s.trim().to_uppercase())
            .unwrap_or_default();
        let brand = row
            .get(idx[1])
            .map(|s| s.trim().to_uppercase())
            .unwrap_or_default();
        let area_sqm = parse_f64_safe(row.get(idx[2]));
        let fixed_rent = parse_f64_safe(row.get(idx[3]));

        match (area_sqm, fixed_rent) {
            (Some(area_sqm), Some(fixed_rent))
                if !location.is_empty()
                    && !brand.is_empty()
                    && area_sqm > 0.0
                    && fixed_rent >= 0.0 =>
            {
                if seen.insert((location.clone(), brand.clone())) {
                    records.push(LeaseRecord {
                        location,
                        brand,
                        area_sqm,
                        fixed_rent,
                    });
                    report.kept_rows += 1;
                } else {
                    report.duplicate_leases += 1;
                }
            }
            _ => report.dropped_rows += 1,
        }
    }

    if records.is_empty() {
        return Err(LoadError::EmptyAfterCleaning { path: path_str });
    }
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("retail_kpi_{}_{}", std::process::id(), name));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn sales_headers_match_any_casing() {
        let path = write_temp(
            "sales_headers.csv",
            " location ,City,DATE,Brand,Sales,units, Tickets \n\
             Store A,caracas,15/01/2024,Brand X,100,10,5\n",
        );
        let (records, report) = load_sales(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(report.kept_rows, 1);
        assert_eq!(records[0].location, "Store A");
        assert_eq!(records[0].city, "CARACAS");
        assert_eq!(records[0].brand, "Brand X");
    }

    #[test]
    fn sales_missing_column_is_fatal() {
        let path = write_temp(
            "sales_missing.csv",
            "LOCATION,CITY,DATE,BRAND,SALES,UNITS\nA,B,15/01/2024,X,1,1\n",
        );
        let err = load_sales(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            err,
            LoadError::MissingColumn {
                column: "TICKETS",
                ..
            }
        ));
    }

    #[test]
    fn sales_bad_rows_are_dropped_not_fatal() {
        let path = write_temp(
            "sales_bad_rows.csv",
            "LOCATION,CITY,DATE,BRAND,SALES,UNITS,TICKETS\n\
             A,C,15/01/2024,X,100,10,5\n\
             A,C,not-a-date,X,100,10,5\n\
             A,C,16/01/2024,X,oops,10,5\n\
             A,C,17/01/2024,X,100,10,0\n\
             A,C,18/01/2024,X,-5,10,5\n",
        );
        let (records, report) = load_sales(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(records.len(), 1);
        assert_eq!(report.total_rows, 5);
        assert_eq!(report.dropped_rows, 4);
    }

    #[test]
    fn lease_first_occurrence_wins() {
        let path = write_temp(
            "leases_dup.csv",
            "LOCATION,BRAND,AREA_SQM,FIXED RENT\n\
             store a,x,50,1000\n\
             STORE A,X,75,2000\n\
             Store B,X,40,500\n",
        );
        let (records, report) = load_leases(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(records.len(), 2);
        assert_eq!(report.duplicate_leases, 1);
        let a = records.iter().find(|l| l.location == "STORE A").unwrap();
        assert_eq!(a.area_sqm, 50.0);
        assert_eq!(a.fixed_rent, 1000.0);
    }

    #[test]
    fn lease_rejects_non_positive_area() {
        let path = write_temp(
            "leases_area.csv",
            "LOCATION,BRAND,AREA_SQM,FIXED_RENT\nA,X,0,1000\nB,X,30,0\n",
        );
        let (records, report) = load_leases(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(records.len(), 1);
        assert_eq!(report.dropped_rows, 1);
        assert_eq!(records[0].location, "B");
    }
}
