//! Client-side table: search, column filters, tri-state sort, pagination and selection.
//!
//! Every table in the application goes through [`TableView`], so they all
//! share one selection policy: the selection is cleared whenever the set of
//! visible row ids changes (new data, new filter, new sort, new page).

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::ClientError;
use crate::models::{Order, OrderId, Participant, Timestamp};

/// Raw cell value used for search and sort.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(Timestamp),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    /// Text the search box matches against. Null renders as empty.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Integer(v) => v.to_string(),
            FieldValue::Float(v) => v.to_string(),
            FieldValue::Text(v) => v.clone(),
            FieldValue::Timestamp(v) => v.as_str().to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Integer(_) | FieldValue::Float(_) => 1,
            FieldValue::Text(_) => 2,
            FieldValue::Timestamp(_) => 3,
        }
    }

    /// Total order used by the sort. Nulls come first in ascending order.
    ///
    /// Timestamps compare chronologically when both sides parse and fall back
    /// to their raw text otherwise.
    pub fn compare(&self, other: &Self) -> Ordering {
        use FieldValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => match (a.parse(), b.parse()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => a.as_str().cmp(b.as_str()),
            },
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map(FieldValue::Text).unwrap_or(FieldValue::Null)
    }
}

impl From<Option<&Timestamp>> for FieldValue {
    fn from(value: Option<&Timestamp>) -> Self {
        value
            .cloned()
            .map(FieldValue::Timestamp)
            .unwrap_or(FieldValue::Null)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    pub searchable: bool,
}

impl Column {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: true,
            searchable: true,
        }
    }

    pub const fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub const fn unsearchable(mut self) -> Self {
        self.searchable = false;
        self
    }
}

/// A row a [`TableView`] can display.
pub trait TableRow {
    type Id: Copy + Eq + Hash + Ord + Debug;

    fn row_id(&self) -> Self::Id;

    /// Value of the column named `key`; unknown keys yield `Null`.
    fn field(&self, key: &str) -> FieldValue;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// Stateful table over an owned row set.
#[derive(Debug)]
pub struct TableView<R: TableRow> {
    columns: Vec<Column>,
    rows: Vec<R>,
    search: String,
    column_filters: BTreeMap<&'static str, String>,
    sort: Option<SortState>,
    page: usize,
    page_size: usize,
    page_size_options: Vec<usize>,
    selection: BTreeSet<R::Id>,
    visible_ids: Vec<R::Id>,
}

impl<R: TableRow> TableView<R> {
    pub fn new(
        columns: Vec<Column>,
        page_size_options: Vec<usize>,
        page_size: usize,
    ) -> Result<Self, ClientError> {
        if page_size_options.is_empty() || page_size_options.contains(&0) {
            return Err(ClientError::Config(
                "page size options must be non-empty and positive".into(),
            ));
        }
        if !page_size_options.contains(&page_size) {
            return Err(ClientError::Config(format!(
                "page size {page_size} is not one of {page_size_options:?}"
            )));
        }

        Ok(Self {
            columns,
            rows: Vec::new(),
            search: String::new(),
            column_filters: BTreeMap::new(),
            sort: None,
            page: 0,
            page_size,
            page_size_options,
            selection: BTreeSet::new(),
            visible_ids: Vec::new(),
        })
    }

    pub fn from_config(columns: Vec<Column>, config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(columns, config.page_size_options.clone(), config.page_size)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Replaces the data, e.g. after a reload. Keeps search, sort and page when still valid.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
        self.clamp_page();
        self.refresh_visible();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.search {
            self.search = query;
            self.page = 0;
            self.refresh_visible();
        }
    }

    /// Restricts one column to values containing `value`. An empty value removes the filter.
    pub fn set_column_filter(&mut self, column: &str, value: impl Into<String>) -> Result<(), ClientError> {
        let key = self.column(column)?.key;
        let value = value.into();
        if value.is_empty() {
            self.column_filters.remove(key);
        } else {
            self.column_filters.insert(key, value);
        }
        self.page = 0;
        self.refresh_visible();
        Ok(())
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Header click: none → ascending → descending → ascending → …
    ///
    /// Clicking a different column starts it at ascending.
    pub fn toggle_sort(&mut self, column: &str) -> Result<SortDirection, ClientError> {
        let col = self.column(column)?;
        if !col.sortable {
            return Err(ClientError::Validation(format!(
                "La colonne « {} » ne peut pas être triée",
                col.label
            )));
        }
        let key = col.key;

        let direction = match &self.sort {
            Some(state) if state.column == key => match state.direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            },
            _ => SortDirection::Ascending,
        };
        self.sort = Some(SortState {
            column: key,
            direction,
        });
        self.refresh_visible();
        Ok(direction)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_size_options(&self) -> &[usize] {
        &self.page_size_options
    }

    pub fn set_page_size(&mut self, size: usize) -> Result<(), ClientError> {
        if !self.page_size_options.contains(&size) {
            return Err(ClientError::Validation(format!(
                "Taille de page {size} non disponible"
            )));
        }
        self.page_size = size;
        self.page = 0;
        self.refresh_visible();
        Ok(())
    }

    /// Jumps to a zero-based page, clamped to the last one.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.min(self.page_count() - 1);
        self.refresh_visible();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page + 1);
    }

    /// At least one, even when nothing matches.
    pub fn page_count(&self) -> usize {
        self.filtered_count().div_ceil(self.page_size).max(1)
    }

    pub fn filtered_count(&self) -> usize {
        self.rows.iter().filter(|row| self.matches(row)).count()
    }

    /// Filtered and sorted rows, all pages.
    pub fn filtered(&self) -> Vec<&R> {
        let mut rows: Vec<&R> = self.rows.iter().filter(|row| self.matches(row)).collect();
        if let Some(state) = &self.sort {
            let key = state.column;
            // sort_by is stable, so equal keys keep their load order
            match state.direction {
                SortDirection::Ascending => {
                    rows.sort_by(|a, b| a.field(key).compare(&b.field(key)))
                }
                SortDirection::Descending => {
                    rows.sort_by(|a, b| b.field(key).compare(&a.field(key)))
                }
            }
        }
        rows
    }

    /// Rows on the current page.
    pub fn visible(&self) -> Vec<&R> {
        self.filtered()
            .into_iter()
            .skip(self.page * self.page_size)
            .take(self.page_size)
            .collect()
    }

    pub fn selected(&self) -> Vec<R::Id> {
        self.selection.iter().copied().collect()
    }

    pub fn is_selected(&self, id: R::Id) -> bool {
        self.selection.contains(&id)
    }

    /// Flips selection for a visible row. Returns whether it is now selected.
    pub fn toggle_selected(&mut self, id: R::Id) -> bool {
        if !self.visible_ids.contains(&id) {
            return false;
        }
        if !self.selection.remove(&id) {
            self.selection.insert(id);
            return true;
        }
        false
    }

    pub fn select_all_visible(&mut self) {
        self.selection.extend(self.visible_ids.iter().copied());
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn column(&self, key: &str) -> Result<&Column, ClientError> {
        self.columns
            .iter()
            .find(|c| c.key == key)
            .ok_or_else(|| ClientError::Validation(format!("Colonne inconnue : {key}")))
    }

    fn matches(&self, row: &R) -> bool {
        let search_ok = self.search.is_empty() || {
            let needle = self.search.to_lowercase();
            self.columns
                .iter()
                .filter(|c| c.searchable)
                .any(|c| row.field(c.key).as_text().to_lowercase().contains(&needle))
        };

        search_ok
            && self.column_filters.iter().all(|(key, value)| {
                row.field(key)
                    .as_text()
                    .to_lowercase()
                    .contains(&value.to_lowercase())
            })
    }

    fn clamp_page(&mut self) {
        let last = self.page_count() - 1;
        if self.page > last {
            self.page = last;
        }
    }

    fn refresh_visible(&mut self) {
        let ids: Vec<R::Id> = self.visible().iter().map(|row| row.row_id()).collect();
        if ids != self.visible_ids {
            if !self.selection.is_empty() {
                debug!(cleared = self.selection.len(), "Visible rows changed, clearing selection");
            }
            self.selection.clear();
            self.visible_ids = ids;
        }
    }
}

impl TableRow for Order {
    type Id = OrderId;

    fn row_id(&self) -> OrderId {
        self.id
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "id" => FieldValue::Integer(self.id),
            "reference" => FieldValue::text(self.reference.clone()),
            "cart_number" => FieldValue::from(self.cart().map(str::to_string)),
            "line_count" => self
                .line_count
                .map(|n| FieldValue::Integer(i64::from(n)))
                .unwrap_or(FieldValue::Null),
            "status" => FieldValue::text(self.status.label()),
            "creator" => FieldValue::from(self.participant_name(Participant::Creator)),
            "preparer" => FieldValue::from(self.participant_name(Participant::Preparer)),
            "controller" => FieldValue::from(self.participant_name(Participant::Controller)),
            "packer" => FieldValue::from(self.participant_name(Participant::Packer)),
            "created_at" => FieldValue::from(self.created_at.as_ref()),
            "prepared_at" => FieldValue::from(self.prepared_at.as_ref()),
            "controlled_at" => FieldValue::from(self.controlled_at.as_ref()),
            "packed_at" => FieldValue::from(self.packed_at.as_ref()),
            "completed_at" => FieldValue::from(self.completed_at.as_ref()),
            _ => FieldValue::Null,
        }
    }
}

/// Columns of the supervisor orders table.
pub fn order_columns() -> Vec<Column> {
    vec![
        Column::new("reference", "Référence"),
        Column::new("cart_number", "Chariot"),
        Column::new("line_count", "Lignes"),
        Column::new("status", "Statut"),
        Column::new("creator", "Créée par"),
        Column::new("preparer", "Préparée par"),
        Column::new("controller", "Contrôlée par"),
        Column::new("packer", "Emballée par"),
        Column::new("created_at", "Date de création").unsearchable(),
    ]
}

/// Columns of a stage board list.
pub fn stage_columns() -> Vec<Column> {
    vec![
        Column::new("reference", "Référence"),
        Column::new("cart_number", "Chariot"),
        Column::new("line_count", "Lignes"),
        Column::new("creator", "Créée par"),
        Column::new("created_at", "Date de création").unsearchable(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(id: i64, reference: &str, cart: &str, created_at: &str) -> Order {
        serde_json::from_value(json!({
            "id": id, "reference": reference, "cart_number": cart,
            "status": "CREATED", "created_at": created_at
        }))
        .unwrap()
    }

    fn table(rows: usize) -> TableView<Order> {
        let mut view = TableView::new(order_columns(), vec![5, 10, 25], 5).unwrap();
        view.set_rows(
            (1..=rows as i64)
                .map(|i| order(i, &format!("REF-{i:03}"), &format!("C{}", i % 3), "2024-01-01T10:00:00Z"))
                .collect(),
        );
        view
    }

    #[test]
    fn sort_cycles_between_two_directions() {
        let mut view = table(3);
        assert!(view.sort().is_none());
        assert_eq!(view.toggle_sort("reference").unwrap(), SortDirection::Ascending);
        assert_eq!(view.toggle_sort("reference").unwrap(), SortDirection::Descending);
        assert_eq!(view.toggle_sort("reference").unwrap(), SortDirection::Ascending);
        assert_eq!(view.toggle_sort("cart_number").unwrap(), SortDirection::Ascending);
    }

    #[test]
    fn descending_sort_reverses_references() {
        let mut view = table(3);
        view.toggle_sort("reference").unwrap();
        view.toggle_sort("reference").unwrap();
        let refs: Vec<_> = view.visible().iter().map(|o| o.reference.clone()).collect();
        assert_eq!(refs, vec!["REF-003", "REF-002", "REF-001"]);
    }

    #[test]
    fn timestamps_sort_chronologically_across_offsets() {
        let mut view = TableView::new(order_columns(), vec![10], 10).unwrap();
        view.set_rows(vec![
            order(1, "late", "C", "2024-01-01T10:30:00+00:00"),
            order(2, "early", "C", "2024-01-01T11:00:00+02:00"),
        ]);
        view.toggle_sort("created_at").unwrap();
        assert_eq!(view.visible()[0].reference, "early");
    }

    #[test]
    fn pagination_slices_filtered_rows() {
        let mut view = table(12);
        assert_eq!(view.page_count(), 3);
        view.set_page(2);
        assert_eq!(view.visible().len(), 2);
        view.set_page(99);
        assert_eq!(view.page(), 2);

        view.set_page_size(10).unwrap();
        assert_eq!(view.page(), 0);
        assert_eq!(view.page_count(), 2);
        assert!(view.set_page_size(7).is_err());
    }

    #[test]
    fn search_spans_searchable_columns() {
        let mut view = table(12);
        view.set_search("c2");
        assert!(view.filtered().iter().all(|o| o.cart_number == "C2"));
        view.set_search("ref-01");
        assert_eq!(view.filtered_count(), 3);
    }

    #[test]
    fn column_filter_narrows_one_column() {
        let mut view = table(12);
        view.set_column_filter("cart_number", "c0").unwrap();
        assert_eq!(view.filtered_count(), 4);
        assert!(view.set_column_filter("nope", "x").is_err());
        view.set_column_filter("cart_number", "").unwrap();
        assert_eq!(view.filtered_count(), 12);
    }

    #[test]
    fn selection_is_cleared_when_visible_rows_change() {
        let mut view = table(12);
        assert!(view.toggle_selected(1));
        assert!(view.toggle_selected(2));
        assert_eq!(view.selected(), vec![1, 2]);

        // rows off the current page cannot be selected
        assert!(!view.toggle_selected(11));

        // same first page, so the selection survives
        view.set_search("REF-00");
        assert_eq!(view.selected(), vec![1, 2]);

        view.set_search("REF-01");
        assert!(view.selected().is_empty());

        view.set_search("");
        view.select_all_visible();
        assert_eq!(view.selected().len(), 5);
        view.next_page();
        assert!(view.selected().is_empty());
    }

    #[test]
    fn unchanged_visible_set_keeps_selection() {
        let mut view = table(3);
        view.toggle_selected(2);
        let rows = view.rows().to_vec();
        view.set_rows(rows);
        assert_eq!(view.selected(), vec![2]);
    }

    #[test]
    fn rejects_page_size_outside_options() {
        let err = TableView::<Order>::new(order_columns(), vec![5, 10], 25).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
