// Filter Engine: narrows the joined table by optional location/brand
// sets and a mandatory inclusive date range. Pure; the input is never
// mutated.
use crate::types::{FilterParams, JoinedRecord};

/// A row passes when each present filter admits it. An absent start or
/// end date yields an empty result rather than an error: the UI layer
/// treats "no range picked yet" as "nothing to show".
pub fn filter_records(records: &[JoinedRecord], params: &FilterParams) -> Vec<JoinedRecord> {
    let (Some(start), Some(end)) = (params.start, params.end) else {
        return Vec::new();
    };
    records
        .iter()
        .filter(|r| params.locations.is_empty() || params.locations.contains(&r.location))
        .filter(|r| params.brands.is_empty() || params.brands.contains(&r.brand))
        .filter(|r| start <= r.date && r.date <= end)
        .cloned()
        .collect()
}
