use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    sql::{
        executor::join::HashJoin,
        parser::ast::{Condition, JoinClause, Projection},
        schema::{unqualified, Table, TableImage, TableSummary},
        types::{Row, Value},
    },
    storage::engine::Engine,
};

/// Rows produced by a SELECT, keyed by the header column names
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Tables of one database, persisted through a storage engine
///
/// Every mutation rewrites the full image of the database; indexes are stored
/// by column name only and rebuilt from rows on load.
pub struct TableStore {
    engine: Box<dyn Engine>,
    tables: BTreeMap<String, Table>,
}

impl TableStore {
    /// Opens a store, loading the image previously written to `engine`.
    /// An image that cannot be decoded is treated as an empty database.
    pub fn open(engine: Box<dyn Engine>) -> Self {
        let mut tables = BTreeMap::new();
        if let Some(bytes) = engine.read_blob() {
            match bincode::deserialize::<BTreeMap<String, TableImage>>(&bytes) {
                Ok(images) => {
                    tables = images
                        .into_iter()
                        .map(|(name, image)| (name, Table::from_image(image)))
                        .collect();
                }
                Err(err) => warn!(%err, "cannot decode database image, starting empty"),
            }
        }
        debug!(tables = tables.len(), "opened table store");
        Self { engine, tables }
    }

    pub fn create_table(&mut self, name: &str, columns: Vec<String>) -> Result<()> {
        if self.table_exists(name) {
            return Err(Error::Internal(format!("table {} already exists", name)));
        }
        self.install(name, Some(Table::new(columns)))
    }

    /// Returns false if the table did not exist
    pub fn drop_table(&mut self, name: &str) -> Result<bool> {
        if !self.table_exists(name) {
            return Ok(false);
        }
        self.install(name, None)?;
        Ok(true)
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Returns table info, returns error if table doesn't exist
    pub fn must_get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::Internal(format!("table {} does not exist", name)))
    }

    /// Copy of a table to apply a mutation to before it is installed
    fn stage(&self, name: &str) -> Result<Table> {
        self.must_get_table(name).cloned()
    }

    /// Makes `next` the state of table `name` (None removes it) and persists.
    /// If the write fails the previous state is put back.
    fn install(&mut self, name: &str, next: Option<Table>) -> Result<()> {
        let previous = match next {
            Some(table) => self.tables.insert(name.to_string(), table),
            None => self.tables.remove(name),
        };
        if let Err(err) = self.persist() {
            match previous {
                Some(table) => self.tables.insert(name.to_string(), table),
                None => self.tables.remove(name),
            };
            warn!(table = name, %err, "persist failed, change rolled back");
            return Err(err);
        }
        Ok(())
    }

    /// Returns false (and writes nothing) if the column already exists
    pub fn add_column(&mut self, table: &str, column: &str) -> Result<bool> {
        let mut next = self.stage(table)?;
        if !next.add_column(column) {
            return Ok(false);
        }
        self.install(table, Some(next))?;
        Ok(true)
    }

    /// Returns false if the column was already indexed
    pub fn create_index(&mut self, table: &str, column: &str) -> Result<bool> {
        let mut next = self.stage(table)?;
        if !next.create_index(column) {
            return Ok(false);
        }
        self.install(table, Some(next))?;
        Ok(true)
    }

    /// Returns false if the column had no index
    pub fn drop_index(&mut self, table: &str, column: &str) -> Result<bool> {
        let mut next = self.stage(table)?;
        if !next.drop_index(column) {
            return Ok(false);
        }
        self.install(table, Some(next))?;
        Ok(true)
    }

    pub fn insert_row(&mut self, table: &str, values: Vec<Value>) -> Result<Row> {
        let mut next = self.stage(table)?;
        let row = next.insert(values);
        self.install(table, Some(next))?;
        debug!(table, ?row, "inserted row");
        Ok(row)
    }

    pub fn update_rows(
        &mut self,
        table: &str,
        assignments: &[(String, Value)],
        condition: Option<&Condition>,
    ) -> Result<usize> {
        let mut next = self.stage(table)?;
        let count = next.update(assignments, condition);
        if count > 0 {
            self.install(table, Some(next))?;
        }
        Ok(count)
    }

    pub fn delete_rows(&mut self, table: &str, condition: Option<&Condition>) -> Result<usize> {
        let mut next = self.stage(table)?;
        let count = next.delete(condition);
        if count > 0 {
            self.install(table, Some(next))?;
        }
        Ok(count)
    }

    /// Selects rows from `table`, optionally joined with one other table.
    /// The condition always filters the FROM table.
    pub fn select_rows(
        &self,
        table: &str,
        columns: &Projection,
        condition: Option<&Condition>,
        join: Option<&JoinClause>,
    ) -> Result<Selection> {
        let left = self.must_get_table(table)?;
        if let Some(join) = join {
            let right = self.must_get_table(&join.table)?;
            return Ok(HashJoin::new(table, left, right, join).execute(columns, condition));
        }

        let rows = left.matching(condition).into_iter().map(|pos| &left.rows[pos]);
        Ok(match columns {
            Projection::All => Selection {
                columns: left.columns.clone(),
                rows: rows.cloned().collect(),
            },
            Projection::Columns(names) => Selection {
                columns: names.clone(),
                rows: rows
                    .map(|row| {
                        names
                            .iter()
                            .filter_map(|name| {
                                let value = row.get(unqualified(name))?;
                                Some((name.clone(), value.clone()))
                            })
                            .collect()
                    })
                    .collect(),
            },
        })
    }

    pub fn describe(&self) -> BTreeMap<String, TableSummary> {
        self.tables
            .iter()
            .map(|(name, table)| (name.clone(), table.summary()))
            .collect()
    }

    /// Serializes every table and rewrites the stored image
    pub fn persist(&mut self) -> Result<()> {
        let images: BTreeMap<&String, TableImage> = self
            .tables
            .iter()
            .map(|(name, table)| (name, table.image()))
            .collect();
        let bytes = bincode::serialize(&images)?;
        self.engine.write_blob(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use super::TableStore;
    use crate::{
        error::{Error, Result},
        sql::{
            parser::ast::{Condition, JoinClause, Projection},
            types::Value,
        },
        storage::{engine::Engine, memory::MemoryEngine, pager::Pager},
    };

    /// Memory engine whose writes fail while `broken` is set
    struct FlakyEngine {
        inner: MemoryEngine,
        broken: Arc<AtomicBool>,
    }

    impl Engine for FlakyEngine {
        fn write_blob(&mut self, data: &[u8]) -> Result<()> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(Error::Io("disk unplugged".into()));
            }
            self.inner.write_blob(data)
        }

        fn read_blob(&self) -> Option<Vec<u8>> {
            self.inner.read_blob()
        }
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn seed(store: &mut TableStore) -> Result<()> {
        store.create_table("users", vec!["id".into(), "name".into()])?;
        store.create_table("orders", vec!["order_id".into(), "user_id".into(), "product".into()])?;
        store.insert_row("users", vec![Value::Integer(1), text("Alice")])?;
        store.insert_row("users", vec![Value::Integer(2), text("Bob")])?;
        store.insert_row("orders", vec![Value::Integer(101), Value::Integer(1), text("Laptop")])?;
        store.insert_row("orders", vec![Value::Integer(103), Value::Integer(2), text("Keyboard")])?;
        Ok(())
    }

    #[test]
    fn test_create_table_twice() -> Result<()> {
        let mut store = TableStore::open(Box::new(MemoryEngine::new()));
        store.create_table("t", vec!["a".into()])?;
        assert!(store.create_table("t", vec!["b".into()]).is_err());
        assert!(store.table_exists("t"));
        assert!(store.drop_table("t")?);
        assert!(!store.drop_table("t")?);
        assert!(store.insert_row("t", vec![]).is_err());
        Ok(())
    }

    #[test]
    fn test_reopen_restores_tables() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("shop.dat");
        let (before, blob) = {
            let mut store = TableStore::open(Box::new(Pager::open(&path, 64)?));
            seed(&mut store)?;
            store.create_index("orders", "user_id")?;
            store.add_column("users", "email")?;
            store.update_rows("users", &[("email".into(), text("a@x"))], Some(&Condition {
                column: "id".into(),
                value: Value::Integer(1),
            }))?;
            (store.tables.clone(), Pager::open(&path, 64)?.read_blob())
        };

        let mut store = TableStore::open(Box::new(Pager::open(&path, 64)?));
        assert_eq!(store.tables, before);
        // Saving the reloaded state writes the same bytes back.
        store.persist()?;
        assert_eq!(Pager::open(&path, 64)?.read_blob(), blob);
        Ok(())
    }

    #[test]
    fn test_select_projection() -> Result<()> {
        let mut store = TableStore::open(Box::new(MemoryEngine::new()));
        seed(&mut store)?;
        store.add_column("users", "age")?;
        store.insert_row("users", vec![Value::Integer(3)])?;

        let all = store.select_rows("users", &Projection::All, None, None)?;
        assert_eq!(all.columns, vec!["id", "name", "age"]);
        assert_eq!(all.rows.len(), 3);
        assert_eq!(all.rows[0].get("age"), Some(&Value::Null));
        assert_eq!(all.rows[2].get("name"), None);

        let some = store.select_rows(
            "users",
            &Projection::Columns(vec!["users.name".into(), "missing".into()]),
            Some(&Condition { column: "id".into(), value: Value::Integer(2) }),
            None,
        )?;
        assert_eq!(some.rows.len(), 1);
        assert_eq!(some.rows[0].get("users.name"), Some(&text("Bob")));
        assert_eq!(some.rows[0].get("missing"), None);

        // Absent values stay absent whatever the projection.
        let named = store.select_rows("users", &Projection::Columns(vec!["name".into()]), None, None)?;
        assert_eq!(named.rows[2].get("name"), None);
        assert_eq!(all.rows[2].get("name"), named.rows[2].get("name"));
        Ok(())
    }

    #[test]
    fn test_join_without_index_leaves_describe_unchanged() -> Result<()> {
        let mut store = TableStore::open(Box::new(MemoryEngine::new()));
        seed(&mut store)?;
        let join = JoinClause {
            table: "orders".into(),
            left_table: "users".into(),
            left_column: "id".into(),
            right_table: "orders".into(),
            right_column: "user_id".into(),
        };
        let before = store.describe();
        let joined = store.select_rows(
            "users",
            &Projection::Columns(vec!["name".into(), "product".into()]),
            None,
            Some(&join),
        )?;
        assert_eq!(joined.rows.len(), 2);
        assert_eq!(store.describe(), before);
        Ok(())
    }

    #[test]
    fn test_failed_write_leaves_tables_untouched() -> Result<()> {
        let broken = Arc::new(AtomicBool::new(false));
        let mut store = TableStore::open(Box::new(FlakyEngine {
            inner: MemoryEngine::new(),
            broken: Arc::clone(&broken),
        }));
        seed(&mut store)?;
        store.create_index("users", "id")?;
        let before = store.tables.clone();

        broken.store(true, Ordering::SeqCst);
        let by_id = Condition {
            column: "id".into(),
            value: Value::Integer(1),
        };
        assert!(store.insert_row("users", vec![Value::Integer(3), text("Cara")]).is_err());
        assert!(store.update_rows("users", &[("id".into(), Value::Integer(9))], Some(&by_id)).is_err());
        assert!(store.delete_rows("users", None).is_err());
        assert!(store.add_column("users", "email").is_err());
        assert!(store.create_index("users", "name").is_err());
        assert!(store.drop_index("users", "id").is_err());
        assert!(store.create_table("items", vec!["sku".into()]).is_err());
        assert!(store.drop_table("orders").is_err());
        assert_eq!(store.tables, before);

        broken.store(false, Ordering::SeqCst);
        store.insert_row("users", vec![Value::Integer(3), text("Cara")])?;
        assert_eq!(store.get_table("users").map(|t| t.rows.len()), Some(3));
        Ok(())
    }
}
