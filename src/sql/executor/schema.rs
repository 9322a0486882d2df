use std::collections::HashSet;

use tracing::info;

use crate::{
    error::Result,
    sql::{
        engine::Catalog,
        executor::{Executor, ResultSet},
        parser::ast::ColumnDef,
    },
};

/// CREATE DATABASE executor: creates the database if needed and activates it
pub struct CreateDatabase {
    name: String,
}

impl CreateDatabase {
    pub fn new(name: String) -> Box<Self> {
        Box::new(Self { name })
    }
}

impl Executor for CreateDatabase {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        catalog.ensure_database(&self.name)?;
        catalog.set_active(&self.name);
        Ok(ResultSet::DatabaseReady { name: self.name })
    }
}

/// ALTER DATABASE executor: same effect as CREATE DATABASE, reported as a switch
pub struct AlterDatabase {
    name: String,
}

impl AlterDatabase {
    pub fn new(name: String) -> Box<Self> {
        Box::new(Self { name })
    }
}

impl Executor for AlterDatabase {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        catalog.ensure_database(&self.name)?;
        catalog.set_active(&self.name);
        Ok(ResultSet::UsingDatabase { name: self.name })
    }
}

/// USE executor: only switches to an existing database
pub struct UseDatabase {
    name: String,
}

impl UseDatabase {
    pub fn new(name: String) -> Box<Self> {
        Box::new(Self { name })
    }
}

impl Executor for UseDatabase {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        if !catalog.set_active(&self.name) {
            return Ok(ResultSet::DatabaseNotFound { name: self.name });
        }
        Ok(ResultSet::UsingDatabase { name: self.name })
    }
}

/// CREATE TABLE executor
pub struct CreateTable {
    table: String,
    columns: Vec<ColumnDef>,
}

impl CreateTable {
    pub fn new(table: String, columns: Vec<ColumnDef>) -> Box<Self> {
        Box::new(Self { table, columns })
    }
}

impl Executor for CreateTable {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        let store = catalog.active_store_mut()?;
        if store.table_exists(&self.table) {
            return Ok(ResultSet::TableExists { table: self.table });
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.columns.iter().find(|c| !seen.insert(c.name.as_str())) {
            return Ok(ResultSet::DuplicateColumn {
                column: dup.name.clone(),
                table: self.table,
            });
        }

        // Column types are kept as metadata in the statement only.
        let columns: Vec<String> = self.columns.into_iter().map(|c| c.name).collect();
        store.create_table(&self.table, columns)?;
        info!(table = %self.table, "created table");
        Ok(ResultSet::CreateTable { table: self.table })
    }
}

/// ALTER TABLE ... ADD COLUMN executor
pub struct AlterTable {
    table: String,
    column: Option<ColumnDef>,
}

impl AlterTable {
    pub fn new(table: String, column: Option<ColumnDef>) -> Box<Self> {
        Box::new(Self { table, column })
    }
}

impl Executor for AlterTable {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        let store = catalog.active_store_mut()?;
        if !store.table_exists(&self.table) {
            return Ok(ResultSet::TableNotFound { table: self.table });
        }
        let Some(column) = self.column else {
            return Ok(ResultSet::AlterNothing { table: self.table });
        };

        if store.add_column(&self.table, &column.name)? {
            Ok(ResultSet::AddColumn {
                table: self.table,
                column: column.name,
            })
        } else {
            Ok(ResultSet::ColumnExists {
                table: self.table,
                column: column.name,
            })
        }
    }
}

/// DROP TABLE executor
pub struct DropTable {
    table: String,
}

impl DropTable {
    pub fn new(table: String) -> Box<Self> {
        Box::new(Self { table })
    }
}

impl Executor for DropTable {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        if !catalog.active_store_mut()?.drop_table(&self.table)? {
            return Ok(ResultSet::TableNotFound { table: self.table });
        }
        Ok(ResultSet::DropTable { table: self.table })
    }
}

/// CREATE INDEX executor
pub struct CreateIndex {
    table: String,
    column: String,
}

impl CreateIndex {
    pub fn new(table: String, column: String) -> Box<Self> {
        Box::new(Self { table, column })
    }
}

impl Executor for CreateIndex {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        let store = catalog.active_store_mut()?;
        match store.get_table(&self.table) {
            None => return Ok(ResultSet::TableNotFound { table: self.table }),
            Some(table) if !table.has_column(&self.column) => {
                return Ok(ResultSet::ColumnNotFound {
                    table: self.table,
                    column: self.column,
                });
            }
            Some(_) => {}
        }

        if store.create_index(&self.table, &self.column)? {
            Ok(ResultSet::CreateIndex {
                table: self.table,
                column: self.column,
            })
        } else {
            Ok(ResultSet::IndexExists {
                table: self.table,
                column: self.column,
            })
        }
    }
}

/// DROP INDEX executor
pub struct DropIndex {
    table: String,
    column: String,
}

impl DropIndex {
    pub fn new(table: String, column: String) -> Box<Self> {
        Box::new(Self { table, column })
    }
}

impl Executor for DropIndex {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        let store = catalog.active_store_mut()?;
        if !store.table_exists(&self.table) {
            return Ok(ResultSet::TableNotFound { table: self.table });
        }
        if store.drop_index(&self.table, &self.column)? {
            Ok(ResultSet::DropIndex {
                table: self.table,
                column: self.column,
            })
        } else {
            Ok(ResultSet::IndexNotFound {
                table: self.table,
                column: self.column,
            })
        }
    }
}
