// Join Engine: left join of sales onto the de-duplicated lease table on
// the exact (location, brand) key. Every sales row survives; rows with
// no lease match carry `None` area and rent.
use crate::types::{JoinedRecord, LeaseRecord, SalesRecord};
use std::collections::HashMap;

/// Output cardinality equals `sales.len()`; the inputs are not consumed
/// or mutated. Lease de-duplication upstream guarantees at most one
/// match per sales row.
pub fn left_join(sales: &[SalesRecord], leases: &[LeaseRecord]) -> Vec<JoinedRecord> {
    let by_store: HashMap<(&str, &str), &LeaseRecord> = leases
        .iter()
        .map(|l| ((l.location.as_str(), l.brand.as_str()), l))
        .collect();

    sales
        .iter()
        .map(|s| {
            let lease = by_store.get(&(s.location.as_str(), s.brand.as_str()));
            JoinedRecord {
                location: s.location.clone(),
                city: s.city.clone(),
                date: s.date,
                brand: s.brand.clone(),
                sales: s.sales,
                units: s.units,
                tickets: s.tickets,
                area_sqm: lease.map(|l| l.area_sqm),
                fixed_rent: lease.map(|l| l.fixed_rent),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sale(location: &str, brand: &str) -> SalesRecord {
        SalesRecord {
            location: location.to_string(),
            city: "CARACAS".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            brand: brand.to_string(),
            sales: 100.0,
            units: 10.0,
            tickets: 5.0,
        }
    }

    #[test]
    fn cardinality_is_preserved_and_unmatched_rows_keep_nulls() {
        let sales = vec![sale("A", "X"), sale("A", "Y"), sale("B", "X")];
        let leases = vec![LeaseRecord {
            location: "A".to_string(),
            brand: "X".to_string(),
            area_sqm: 50.0,
            fixed_rent: 1000.0,
        }];
        let joined = left_join(&sales, &leases);
        assert_eq!(joined.len(), sales.len());
        assert_eq!(joined[0].area_sqm, Some(50.0));
        assert_eq!(joined[0].fixed_rent, Some(1000.0));
        assert_eq!(joined[1].area_sqm, None);
        assert_eq!(joined[2].fixed_rent, None);
    }

    #[test]
    fn join_is_case_sensitive_after_normalization() {
        let sales = vec![sale("a", "X")];
        let leases = vec![LeaseRecord {
            location: "A".to_string(),
            brand: "X".to_string(),
            area_sqm: 50.0,
            fixed_rent: 1000.0,
        }];
        let joined = left_join(&sales, &leases);
        assert_eq!(joined[0].area_sqm, None);
    }
}
