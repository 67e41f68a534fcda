//! Derived read-only projections over the record collection.
//!
//! Recomputed on every read; there is no caching layer.

use chrono::{DateTime, Utc};

use crate::models::record::Record;

/// One per-individual group in the aggregation view.
#[derive(Debug, Clone, PartialEq)]
pub struct IndividualGroup {
    /// Original-cased name of the group's most recent record.
    pub display_name: String,
    /// Lowercased grouping key.
    pub key: String,
    pub count: usize,
    /// The group's records, newest first by `date_time`.
    pub records: Vec<Record>,
}

impl IndividualGroup {
    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.records.first().map(|r| r.date_time)
    }
}

/// Group records by `individual_name` normalized to lowercase.
///
/// Within each group records are sorted by `date_time` descending and the
/// representative display name is taken from the most recent record.
/// Groups are ordered by count descending; ties break on the more
/// recently active group.
pub fn aggregate_by_individual(records: &[Record]) -> Vec<IndividualGroup> {
    let mut groups: Vec<IndividualGroup> = Vec::new();

    for record in records {
        let key = record.individual_name.to_lowercase();
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.records.push(record.clone()),
            None => groups.push(IndividualGroup {
                display_name: String::new(),
                key,
                count: 0,
                records: vec![record.clone()],
            }),
        }
    }

    for group in &mut groups {
        group.records.sort_by(|a, b| b.date_time.cmp(&a.date_time));
        group.count = group.records.len();
        if let Some(latest) = group.records.first() {
            group.display_name = latest.individual_name.clone();
        }
    }

    groups.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.latest().cmp(&a.latest()))
    });

    groups
}
