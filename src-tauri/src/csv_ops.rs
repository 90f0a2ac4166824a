use rayon::prelude::*;
use serde::Serialize;

use crate::table::{FieldCatalog, Record, SelectionSet};

/// What the renderer gets: one header label per projected column and the
/// projected cells of every row in the filtered view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    pub matched_rows: usize,
}

fn record_matches(record: &Record, query_lower: &str) -> bool {
    record
        .values()
        .iter()
        .any(|value| value.to_lowercase().contains(query_lower))
}

/// Indices of the records where any field contains `query`, ignoring case.
///
/// Every field is searched, including columns that are not selected for
/// display. The result keeps the original record order.
pub fn filter_records(records: &[Record], query: &str) -> Vec<usize> {
    if query.is_empty() {
        return (0..records.len()).collect();
    }
    let query_lower = query.to_lowercase();
    records
        .par_iter()
        .enumerate()
        .filter_map(|(idx, record)| record_matches(record, &query_lower).then_some(idx))
        .collect()
}

pub fn project_headers(catalog: &FieldCatalog, selection: &SelectionSet) -> Vec<String> {
    selection
        .selected_indices()
        .into_iter()
        .filter_map(|idx| catalog.name(idx).map(str::to_string))
        .collect()
}

pub fn project_row(record: &Record, selection: &SelectionSet) -> Vec<String> {
    selection
        .selected_indices()
        .into_iter()
        .map(|idx| record.get(idx).unwrap_or_default().to_string())
        .collect()
}

pub fn project_rows(
    records: &[Record],
    matches: &[usize],
    selection: &SelectionSet,
) -> Vec<Vec<String>> {
    let columns = selection.selected_indices();
    matches
        .iter()
        .filter_map(|&idx| records.get(idx))
        .map(|record| {
            columns
                .iter()
                .map(|&col| record.get(col).unwrap_or_default().to_string())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_records, project_headers, project_row, project_rows};
    use crate::csv_handler::{parse_csv, ParseSettings};
    use crate::table::{ParsedTable, SelectionSet};

    fn people() -> ParsedTable {
        parse_csv(
            "name,age,city\nAlice,30,Lyon\nBob,25,Paris\nCarol,41,alicante\n",
            &ParseSettings::default(),
        )
        .expect("parse")
    }

    #[test]
    fn filter_finds_matching_rows_in_order() {
        let table = people();
        assert_eq!(filter_records(&table.records, "ALI"), vec![0, 2]);
        assert_eq!(filter_records(&table.records, "3"), vec![0]);
        assert!(filter_records(&table.records, "zzz").is_empty());
    }

    #[test]
    fn empty_query_keeps_everything() {
        let table = people();
        assert_eq!(filter_records(&table.records, ""), vec![0, 1, 2]);
    }

    #[test]
    fn filter_searches_hidden_columns() {
        let table = people();
        let mut selection = SelectionSet::full(&table.catalog);
        selection.toggle(2);
        let matches = filter_records(&table.records, "paris");
        assert_eq!(matches, vec![1]);
        assert_eq!(
            project_rows(&table.records, &matches, &selection),
            vec![vec!["Bob".to_string(), "25".to_string()]]
        );
    }

    #[test]
    fn projection_follows_catalog_order() {
        let table = people();
        let mut selection = SelectionSet::full(&table.catalog);
        selection.toggle(0);
        selection.toggle(0);
        selection.toggle(1);
        assert_eq!(project_headers(&table.catalog, &selection), ["name", "city"]);
        assert_eq!(project_row(&table.records[0], &selection), ["Alice", "Lyon"]);
    }
}
