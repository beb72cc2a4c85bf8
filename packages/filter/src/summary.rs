//! Aggregate statistics over filtered crashes.

use std::collections::BTreeMap;

use crash_map_crash_models::{CrashRecord, CrashSummary};

use crate::time::extract_year;

/// Totals the crash count, injuries, and fatalities of `records`.
pub fn summarize<'a>(records: impl IntoIterator<Item = &'a CrashRecord>) -> CrashSummary {
    records
        .into_iter()
        .map(CrashSummary::from_record)
        .fold(CrashSummary::default(), |acc, s| acc + s)
}

/// Totals `records` per calendar year. Records whose year cannot be
/// extracted are skipped.
pub fn summarize_by_year<'a>(
    records: impl IntoIterator<Item = &'a CrashRecord>,
) -> BTreeMap<i32, CrashSummary> {
    let mut by_year: BTreeMap<i32, CrashSummary> = BTreeMap::new();
    for record in records {
        match extract_year(record.timestamp.as_deref()) {
            Ok(year) => *by_year.entry(year).or_default() += CrashSummary::from_record(record),
            Err(e) => log::trace!("Skipping crash in yearly summary: {e}"),
        }
    }
    by_year
}
