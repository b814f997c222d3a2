//! Paged tabular view over the visible records.

use std::{collections::BTreeSet, fmt};

use serde::Serialize;

use crate::{client::ID_FIELD, Record};

/// A page of the records table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table<'a> {
    columns: Vec<String>,
    rows: &'a [Record],
    page_size: usize,
}

impl<'a> Table<'a> {
    /// Build a table over `rows`. A page size of zero is treated as one.
    pub fn new(rows: &'a [Record], page_size: usize) -> Self {
        let columns = rows
            .iter()
            .flat_map(|r| r.keys())
            .filter(|k| k.as_str() != ID_FIELD)
            .collect::<BTreeSet<&String>>()
            .into_iter()
            .cloned()
            .collect();
        Self {
            columns,
            rows,
            page_size: page_size.max(1),
        }
    }

    /// Every field present in at least one row.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of pages. An empty table still has a single (empty) page.
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size).max(1)
    }

    /// The rows on the given zero-based page. Pages beyond the end are empty.
    pub fn page(&self, page: usize) -> &'a [Record] {
        let start = page.saturating_mul(self.page_size).min(self.rows.len());
        let end = start.saturating_add(self.page_size).min(self.rows.len());
        &self.rows[start..end]
    }

    /// Render the given page as aligned plain text.
    pub fn render_page(&self, page: usize) -> String {
        let cells = self
            .page(page)
            .iter()
            .map(|r| {
                self.columns
                    .iter()
                    .map(|c| r.get(c).map(ToString::to_string).unwrap_or_default())
                    .collect::<Vec<String>>()
            })
            .collect::<Vec<Vec<String>>>();
        let widths = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(c.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect::<Vec<usize>>();
        let mut out = String::new();
        push_row(&mut out, self.columns.iter(), &widths);
        for row in &cells {
            push_row(&mut out, row.iter(), &widths);
        }
        out
    }
}

fn push_row<'s, I>(out: &mut String, cells: I, widths: &[usize])
where
    I: Iterator<Item = &'s String>,
{
    let line = cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect::<Vec<String>>()
        .join(" | ");
    out.push_str(line.trim_end());
    out.push('\n');
}

impl fmt::Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_page(0))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{into_records, Value};
    use serde_json::json;

    fn rows(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                into_records(Value::from(json!({"name": format!("dog{}", i), "age": i})))
                    .unwrap()
                    .remove(0)
            })
            .collect()
    }

    #[test]
    fn paging() {
        let rows = rows(23);
        let table = Table::new(&rows, 10);
        assert_eq!(table.page_count(), 3);
        assert_eq!(table.page(0).len(), 10);
        assert_eq!(table.page(2).len(), 3);
        assert!(table.page(3).is_empty());
        assert!(table.page(usize::MAX).is_empty());
    }

    #[test]
    fn huge_page_size_holds_everything() {
        let rows = rows(2);
        let table = Table::new(&rows, usize::MAX);
        assert_eq!(table.page_count(), 1);
        assert_eq!(table.page(0).len(), 2);
        assert!(table.page(1).is_empty());
    }

    #[test]
    fn empty_table_has_one_page() {
        let table = Table::new(&[], 10);
        assert_eq!(table.page_count(), 1);
        assert!(table.columns().is_empty());
        assert_eq!(table.render_page(0), "\n");
    }

    #[test]
    fn columns_exclude_internal_id() {
        let rows = into_records(Value::from(json!([
            {"_id": 1, "breed": "Husky"},
            {"name": "Rex"},
        ])))
        .unwrap();
        let table = Table::new(&rows, 10);
        assert_eq!(table.columns(), &["breed".to_string(), "name".to_string()]);
    }

    #[test]
    fn renders_aligned_text() {
        let rows = rows(2);
        let rendered = Table::new(&rows, 10).render_page(0);
        assert_eq!(rendered, "age | name\n0   | dog0\n1   | dog1\n");
    }
}
