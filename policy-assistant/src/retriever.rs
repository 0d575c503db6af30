use crate::store::{PolicyRecord, PolicyStore};

/// Policies mentioned by `query`, in store order.
///
/// A policy matches when its id appears verbatim in the query, or when its
/// customer name appears in the query ignoring case. Never fails; an empty or
/// unrelated query simply yields no matches.
pub fn retrieve<'a>(query: &str, store: &'a PolicyStore) -> Vec<&'a PolicyRecord> {
    let lowered = query.to_lowercase();
    store
        .iter()
        .filter(|record| {
            query.contains(record.id.as_str())
                || lowered.contains(record.customer_name.to_lowercase().as_str())
        })
        .collect()
}
