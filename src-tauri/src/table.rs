use serde::Serialize;

use crate::csv_handler::ParseWarning;

/// Ordered, unique column names taken from the header row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FieldCatalog {
    names: Vec<String>,
}

impl FieldCatalog {
    pub(crate) fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|field| field == name)
    }

    pub fn name(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// One data row. Values are aligned with the catalog, so the key set of a
/// record is always the catalog itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    /// Pads missing trailing fields with `""` and drops fields past `width`.
    pub(crate) fn aligned<'a>(fields: impl Iterator<Item = &'a str>, width: usize) -> Self {
        let mut values: Vec<String> = fields.take(width).map(str::to_string).collect();
        values.resize(width, String::new());
        Self { values }
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn value_of(&self, catalog: &FieldCatalog, name: &str) -> Option<&str> {
        catalog.position(name).and_then(|idx| self.get(idx))
    }
}

/// Columns currently chosen for display, stored as a mask over the catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSet {
    mask: Vec<bool>,
}

impl SelectionSet {
    pub fn full(catalog: &FieldCatalog) -> Self {
        Self {
            mask: vec![true; catalog.len()],
        }
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.mask.get(idx).copied().unwrap_or(false)
    }

    /// Flips membership of column `idx` and returns the new membership.
    pub fn toggle(&mut self, idx: usize) -> Option<bool> {
        let slot = self.mask.get_mut(idx)?;
        *slot = !*slot;
        Some(*slot)
    }

    /// Selected column indices in catalog order.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(idx, &on)| on.then_some(idx))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.mask.iter().filter(|&&on| on).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output of a successful parse. Catalog and records always travel together.
#[derive(Clone, Debug, Default)]
pub struct ParsedTable {
    pub catalog: FieldCatalog,
    pub records: Vec<Record>,
    pub warnings: Vec<ParseWarning>,
}

#[cfg(test)]
mod tests {
    use super::{FieldCatalog, Record, SelectionSet};

    fn catalog() -> FieldCatalog {
        FieldCatalog::new(vec!["name".into(), "age".into(), "city".into()])
    }

    #[test]
    fn record_pads_and_truncates_to_catalog_width() {
        let short = Record::aligned(["Bob"].into_iter(), 3);
        assert_eq!(short.values(), ["Bob", "", ""]);

        let long = Record::aligned(["Alice", "30", "Lyon", "extra"].into_iter(), 3);
        assert_eq!(long.values(), ["Alice", "30", "Lyon"]);
        assert_eq!(long.value_of(&catalog(), "city"), Some("Lyon"));
        assert_eq!(long.value_of(&catalog(), "zip"), None);
    }

    #[test]
    fn selection_keeps_catalog_order_regardless_of_toggle_order() {
        let mut selection = SelectionSet::full(&catalog());
        assert_eq!(selection.toggle(0), Some(false));
        assert_eq!(selection.toggle(2), Some(false));
        assert_eq!(selection.toggle(2), Some(true));
        assert_eq!(selection.toggle(0), Some(true));
        assert_eq!(selection.selected_indices(), vec![0, 1, 2]);
        assert_eq!(selection.toggle(7), None);
    }
}
