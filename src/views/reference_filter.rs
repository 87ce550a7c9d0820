//! Live reference filter over an in-memory order list.

use crate::models::Order;

/// Orders whose reference contains `query`, case-insensitively, in input order.
///
/// An empty query returns every order. Matching is a substring test; the
/// backend's exact-match lookup lives in `GetOrderByReferenceQuery`.
pub fn filter_by_reference<'a>(orders: &'a [Order], query: &str) -> Vec<&'a Order> {
    if query.is_empty() {
        return orders.iter().collect();
    }
    let needle = query.to_lowercase();
    orders
        .iter()
        .filter(|order| order.reference.to_lowercase().contains(&needle))
        .collect()
}

/// Informational line shown when a non-empty query matches nothing.
pub fn empty_result_notice(query: &str) -> String {
    format!("Aucune commande ne contient \"{query}\" dans sa référence.")
}

/// Result of applying the filter, with the notice to display when it is empty.
#[derive(Debug)]
pub struct FilterOutcome<'a> {
    pub matches: Vec<&'a Order>,
    pub notice: Option<String>,
}

pub fn apply<'a>(orders: &'a [Order], query: &str) -> FilterOutcome<'a> {
    let matches = filter_by_reference(orders, query);
    let notice = (matches.is_empty() && !query.is_empty()).then(|| empty_result_notice(query));
    FilterOutcome { matches, notice }
}
