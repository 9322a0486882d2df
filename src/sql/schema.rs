use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::sql::{
    parser::ast::Condition,
    types::{IndexKey, Row, Value},
};

/// Hash index over one column: derived key -> positions of the rows holding it
///
/// Positions within a bucket are ascending, i.e. in table order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HashIndex {
    buckets: HashMap<IndexKey, Vec<usize>>,
}

impl HashIndex {
    /// Builds the index with one pass over `rows`. Rows without the column are skipped.
    pub fn build(rows: &[Row], column: &str) -> Self {
        let mut index = Self::default();
        for (pos, row) in rows.iter().enumerate() {
            if let Some(value) = row.get(column) {
                index.insert(value.key(), pos);
            }
        }
        index
    }

    pub fn insert(&mut self, key: IndexKey, pos: usize) {
        self.buckets.entry(key).or_default().push(pos);
    }

    /// Row positions holding `key`, empty if there is no bucket
    pub fn lookup(&self, key: &IndexKey) -> &[usize] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// In-memory table: declared columns, rows in insertion order, and indexes
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub indexes: BTreeMap<String, HashIndex>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Appends `column`, setting it to Null on every row. Returns false if it existed.
    pub fn add_column(&mut self, column: &str) -> bool {
        if self.has_column(column) {
            return false;
        }
        self.columns.push(column.to_string());
        for row in &mut self.rows {
            row.insert(column.to_string(), Value::Null);
        }
        let indexed: Vec<String> = self.indexes.keys().cloned().collect();
        self.rebuild_indexes(&indexed);
        true
    }

    /// Builds an index on `column`. Returns false if one already exists.
    pub fn create_index(&mut self, column: &str) -> bool {
        if self.indexes.contains_key(column) {
            return false;
        }
        self.indexes
            .insert(column.to_string(), HashIndex::build(&self.rows, column));
        true
    }

    pub fn drop_index(&mut self, column: &str) -> bool {
        self.indexes.remove(column).is_some()
    }

    /// Appends a row from positional values and returns it.
    ///
    /// Values beyond the declared columns are dropped; columns without a value
    /// are left absent rather than set to Null.
    pub fn insert(&mut self, values: Vec<Value>) -> Row {
        let row: Row = self.columns.iter().cloned().zip(values).collect();
        let pos = self.rows.len();
        for (column, index) in &mut self.indexes {
            if let Some(value) = row.get(column) {
                index.insert(value.key(), pos);
            }
        }
        self.rows.push(row.clone());
        row
    }

    /// Positions of the rows matching `condition`, in table order.
    ///
    /// Uses the index on the condition column when there is one, and a linear
    /// scan comparing derived keys otherwise.
    pub fn matching(&self, condition: Option<&Condition>) -> Vec<usize> {
        let Some(cond) = condition else {
            return (0..self.rows.len()).collect();
        };
        let column = unqualified(&cond.column);
        let key = cond.value.key();
        match self.indexes.get(column) {
            Some(index) => index.lookup(&key).to_vec(),
            None => self
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.get(column).is_some_and(|v| v.key() == key))
                .map(|(pos, _)| pos)
                .collect(),
        }
    }

    /// Applies `assignments` to matching rows and returns how many were touched.
    /// Only indexes on assigned columns are rebuilt.
    pub fn update(&mut self, assignments: &[(String, Value)], condition: Option<&Condition>) -> usize {
        let positions = self.matching(condition);
        for &pos in &positions {
            let row = &mut self.rows[pos];
            for (column, value) in assignments {
                row.insert(column.clone(), value.clone());
            }
        }
        if !positions.is_empty() {
            let touched: Vec<String> = assignments
                .iter()
                .map(|(column, _)| column.clone())
                .filter(|column| self.indexes.contains_key(column))
                .collect();
            self.rebuild_indexes(&touched);
        }
        positions.len()
    }

    /// Removes matching rows (all rows without a condition) and returns how many went.
    /// Every index is rebuilt since row positions shift.
    pub fn delete(&mut self, condition: Option<&Condition>) -> usize {
        let before = self.rows.len();
        match condition {
            None => self.rows.clear(),
            Some(cond) => {
                let column = unqualified(&cond.column);
                let key = cond.value.key();
                self.rows
                    .retain(|row| row.get(column).is_none_or(|v| v.key() != key));
            }
        }
        let deleted = before - self.rows.len();
        let indexed: Vec<String> = self.indexes.keys().cloned().collect();
        self.rebuild_indexes(&indexed);
        deleted
    }

    fn rebuild_indexes(&mut self, columns: &[String]) {
        for column in columns {
            self.indexes
                .insert(column.clone(), HashIndex::build(&self.rows, column));
        }
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            columns: self.columns.clone(),
            row_count: self.rows.len(),
            indexes: self.indexes.keys().cloned().collect(),
        }
    }

    /// Persisted form; index buckets are not stored
    pub fn image(&self) -> TableImage {
        TableImage {
            columns: self.columns.clone(),
            rows: self.rows.clone(),
            indexes: self.indexes.keys().cloned().collect(),
        }
    }

    /// Restores a table from its persisted form, rebuilding its indexes
    pub fn from_image(image: TableImage) -> Self {
        let mut table = Self {
            columns: image.columns,
            rows: image.rows,
            indexes: BTreeMap::new(),
        };
        for column in &image.indexes {
            table.create_index(column);
        }
        table
    }
}

/// Strips a `table.` qualifier from a column reference
pub fn unqualified(column: &str) -> &str {
    column.rsplit('.').next().unwrap_or(column)
}

/// Table layout inside a persisted database image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableImage {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Columns that carried an index
    pub indexes: Vec<String>,
}

/// Introspection view of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub indexes: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::Table;
    use crate::sql::{
        parser::ast::Condition,
        types::{Row, Value},
    };

    fn users() -> Table {
        let mut table = Table::new(vec!["id".into(), "name".into()]);
        table.insert(vec![Value::Integer(1), Value::Text("Alice".into())]);
        table.insert(vec![Value::Integer(2), Value::Text("Bob".into())]);
        table.insert(vec![Value::Integer(1), Value::Text("Carol".into())]);
        table
    }

    fn cond(column: &str, value: Value) -> Condition {
        Condition {
            column: column.into(),
            value,
        }
    }

    #[test]
    fn test_insert_positional() {
        let mut table = Table::new(vec!["a".into(), "b".into(), "c".into()]);
        let short = table.insert(vec![Value::Integer(1)]);
        assert_eq!(short.len(), 1);
        assert!(!short.contains_key("b"));

        let long = table.insert(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
            Value::Integer(4),
        ]);
        assert_eq!(long.len(), 3);
        assert_eq!(long.get("c"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_index_matches_scan() {
        let mut table = users();
        let filters = [
            cond("id", Value::Integer(1)),
            cond("id", Value::Integer(3)),
            cond("id", Value::Float(1.0)),
            cond("name", Value::Text("Bob".into())),
        ];
        let scanned: Vec<_> = filters.iter().map(|c| table.matching(Some(c))).collect();
        table.create_index("id");
        table.create_index("name");
        let indexed: Vec<_> = filters.iter().map(|c| table.matching(Some(c))).collect();
        assert_eq!(scanned, indexed);
        assert_eq!(indexed[0], vec![0, 2]);
        assert!(indexed[2].is_empty());
        assert_eq!(table.matching(None), vec![0, 1, 2]);
    }

    #[test]
    fn test_insert_extends_index() {
        let mut table = users();
        table.create_index("id");
        table.insert(vec![Value::Integer(2), Value::Text("Dan".into())]);
        assert_eq!(table.matching(Some(&cond("id", Value::Integer(2)))), vec![1, 3]);
    }

    #[test]
    fn test_update_rebuilds_assigned_index() {
        let mut table = users();
        table.create_index("id");
        let count = table.update(
            &[("id".into(), Value::Integer(99))],
            Some(&cond("name", Value::Text("Alice".into()))),
        );
        assert_eq!(count, 1);
        assert_eq!(table.matching(Some(&cond("id", Value::Integer(1)))), vec![2]);
        assert_eq!(table.matching(Some(&cond("id", Value::Integer(99)))), vec![0]);
    }

    #[test]
    fn test_delete_rebuilds_indexes() {
        let mut table = users();
        table.create_index("name");
        assert_eq!(table.delete(Some(&cond("id", Value::Integer(1)))), 2);
        assert_eq!(table.matching(Some(&cond("name", Value::Text("Bob".into())))), vec![0]);
        assert!(table.matching(Some(&cond("name", Value::Text("Alice".into())))).is_empty());

        assert_eq!(table.delete(None), 1);
        assert!(table.rows.is_empty());
        assert!(table.matching(Some(&cond("name", Value::Text("Bob".into())))).is_empty());
    }

    #[test]
    fn test_add_column_sets_null() {
        let mut table = users();
        table.create_index("id");
        assert!(table.add_column("age"));
        assert!(!table.add_column("age"));
        assert_eq!(table.columns, vec!["id", "name", "age"]);
        assert!(table.rows.iter().all(|r: &Row| r.get("age") == Some(&Value::Null)));
        assert_eq!(table.matching(Some(&cond("age", Value::Null))), vec![0, 1, 2]);
        assert_eq!(table.matching(Some(&cond("id", Value::Integer(2)))), vec![1]);
    }

    #[test]
    fn test_image_roundtrip() {
        let mut table = users();
        table.create_index("name");
        let restored = Table::from_image(table.image());
        assert_eq!(restored, table);
        assert_eq!(restored.summary().indexes.into_iter().collect::<Vec<_>>(), vec!["name"]);
    }
}
