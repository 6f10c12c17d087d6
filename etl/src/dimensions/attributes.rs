use crate::columns::SourceField;
use crate::extract::RawTable;
use crate::utils::text::upper_trim;
use std::collections::HashSet;

/// Per-column cleanup applied before deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cleanup {
    Keep,
    UpperTrim,
    FillNull(&'static str),
}

impl Cleanup {
    pub(crate) fn apply(self, value: Option<&str>) -> Option<String> {
        match self {
            Cleanup::Keep => value.map(str::to_string),
            Cleanup::UpperTrim => value.map(upper_trim),
            Cleanup::FillNull(sentinel) => Some(value.unwrap_or(sentinel).to_string()),
        }
    }
}

pub(crate) struct DistinctAttributes {
    pub columns: Vec<SourceField>,
    pub tuples: Vec<Vec<Option<String>>>,
}

/// Cleaned attribute tuples of the present `fields`, distinct, in first-seen order.
pub(crate) fn distinct_attributes(
    raw: &RawTable,
    fields: &[SourceField],
    cleanup: impl Fn(SourceField) -> Cleanup,
) -> DistinctAttributes {
    let columns = raw.mapping.present(fields);
    let mut seen = HashSet::new();
    let mut tuples = Vec::new();

    for record in &raw.records {
        let tuple: Vec<Option<String>> = columns
            .iter()
            .map(|field| cleanup(*field).apply(raw.value(record, *field)))
            .collect();

        if seen.insert(tuple.clone()) {
            tuples.push(tuple);
        }
    }

    DistinctAttributes { columns, tuples }
}
