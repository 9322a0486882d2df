use crate::{
    error::Result,
    sql::{
        engine::Catalog,
        executor::{Executor, ResultSet},
        parser::ast::{Condition, JoinClause, Projection},
    },
};

/// SELECT executor, with an optional inner join
pub struct Select {
    table: String,
    columns: Projection,
    condition: Option<Condition>,
    join: Option<JoinClause>,
}

impl Select {
    pub fn new(
        table: String,
        columns: Projection,
        condition: Option<Condition>,
        join: Option<JoinClause>,
    ) -> Box<Self> {
        Box::new(Self {
            table,
            columns,
            condition,
            join,
        })
    }
}

impl Executor for Select {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet> {
        let store = catalog.active_store()?;
        for table in std::iter::once(&self.table).chain(self.join.as_ref().map(|j| &j.table)) {
            if !store.table_exists(table) {
                return Ok(ResultSet::TableNotFound {
                    table: table.clone(),
                });
            }
        }

        let selection = store.select_rows(
            &self.table,
            &self.columns,
            self.condition.as_ref(),
            self.join.as_ref(),
        )?;
        Ok(ResultSet::Scan {
            columns: selection.columns,
            rows: selection.rows,
        })
    }
}
