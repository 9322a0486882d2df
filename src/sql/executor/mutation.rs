use tracing::info;

use crate::{
    error::Result,
    sql::{
        engine::Catalog,
        executor::{Executor, ResultSet},
        parser::ast::Condition,
        types::Value,
    },
    storage::log::{CommandKind, LogPayload},
};

/// INSERT executor
pub struct Insert {
    table: String,
    values: Vec<Value>,
}

impl Insert {
    pub fn new(table: String, values: Vec<Value>) -> Box<Self> {
        Box::new(Self { table, values })
    }
}

impl Executor for Insert {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        let store = catalog.active_store_mut()?;
        if !store.table_exists(&self.table) {
            return Ok(ResultSet::TableNotFound { table: self.table });
        }
        let row = store.insert_row(&self.table, self.values)?;
        catalog.log(self.table, CommandKind::Insert, LogPayload::Inserted(row));
        Ok(ResultSet::Insert)
    }
}

/// UPDATE executor
pub struct Update {
    table: String,
    assignments: Vec<(String, Value)>,
    condition: Option<Condition>,
}

impl Update {
    pub fn new(
        table: String,
        assignments: Vec<(String, Value)>,
        condition: Option<Condition>,
    ) -> Box<Self> {
        Box::new(Self {
            table,
            assignments,
            condition,
        })
    }
}

impl Executor for Update {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        let store = catalog.active_store_mut()?;
        let Some(table) = store.get_table(&self.table) else {
            return Ok(ResultSet::TableNotFound { table: self.table });
        };
        // Reject before touching any row.
        if let Some((column, _)) = self.assignments.iter().find(|(c, _)| !table.has_column(c)) {
            return Ok(ResultSet::ColumnNotFound {
                column: column.clone(),
                table: self.table,
            });
        }

        let count = store.update_rows(&self.table, &self.assignments, self.condition.as_ref())?;
        catalog.log(self.table, CommandKind::Update, LogPayload::Affected(count));
        Ok(ResultSet::Update { count })
    }
}

/// DELETE executor
pub struct Delete {
    table: String,
    condition: Option<Condition>,
}

impl Delete {
    pub fn new(table: String, condition: Option<Condition>) -> Box<Self> {
        Box::new(Self { table, condition })
    }
}

impl Executor for Delete {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        let store = catalog.active_store_mut()?;
        if !store.table_exists(&self.table) {
            return Ok(ResultSet::TableNotFound { table: self.table });
        }
        let count = store.delete_rows(&self.table, self.condition.as_ref())?;
        catalog.log(self.table, CommandKind::Delete, LogPayload::Affected(count));
        Ok(ResultSet::Delete { count })
    }
}

/// COMMIT executor: drains the commit log
pub struct Commit;

impl Commit {
    pub fn new() -> Box<Self> {
        Box::new(Self)
    }
}

impl Executor for Commit {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        let entries = catalog.commit();
        info!(entries = entries.len(), "committed log entries");
        Ok(ResultSet::Commit {
            count: entries.len(),
        })
    }
}
