use crate::{
    error::Result,
    sql::{
        engine::Catalog,
        executor::{
            mutation::{Commit, Delete, Insert, Update},
            query::Select,
            schema::{
                AlterDatabase, AlterTable, CreateDatabase, CreateIndex, CreateTable, DropIndex,
                DropTable, UseDatabase,
            },
        },
        parser::ast::Command,
        types::Row,
    },
};

pub mod join;
mod mutation;
mod query;
mod schema;

/// Statement executor trait
pub trait Executor {
    fn execute(self: Box<Self>, catalog: &mut Catalog) -> Result<ResultSet>;
}

/// Builds an executor from a parsed command
impl dyn Executor {
    pub fn build(command: Command) -> Box<dyn Executor> {
        match command {
            Command::Empty => Fixed::new(ResultSet::Empty),
            Command::Unknown { raw } => Fixed::new(ResultSet::Unknown { raw }),
            Command::CreateDatabase { name } => CreateDatabase::new(name),
            Command::AlterDatabase { name } => AlterDatabase::new(name),
            Command::UseDatabase { name } => UseDatabase::new(name),
            Command::CreateTable { table, columns } => CreateTable::new(table, columns),
            Command::AlterTable { table, column } => AlterTable::new(table, column),
            Command::DropTable { table } => DropTable::new(table),
            Command::CreateIndex { table, column } => CreateIndex::new(table, column),
            Command::DropIndex { table, column } => DropIndex::new(table, column),
            Command::Insert { table, values } => Insert::new(table, values),
            Command::Update {
                table,
                assignments,
                condition,
            } => Update::new(table, assignments, condition),
            Command::Delete { table, condition } => Delete::new(table, condition),
            Command::Select {
                table,
                columns,
                condition,
                join,
            } => Select::new(table, columns, condition, join),
            Command::Commit => Commit::new(),
        }
    }
}

/// Executor for statements whose result needs no catalog access
struct Fixed {
    result: ResultSet,
}

impl Fixed {
    fn new(result: ResultSet) -> Box<Self> {
        Box::new(Self { result })
    }
}

impl Executor for Fixed {
    fn execute(self: Box<Self>, _catalog: &mut Catalog) -> Result<ResultSet> {
        Ok(self.result)
    }
}

/// Execution result set
#[derive(Debug, PartialEq)]
pub enum ResultSet {
    Empty,
    DatabaseReady { name: String },
    UsingDatabase { name: String },
    DatabaseNotFound { name: String },
    CreateTable { table: String },
    TableExists { table: String },
    TableNotFound { table: String },
    DuplicateColumn { table: String, column: String },
    ColumnNotFound { table: String, column: String },
    AddColumn { table: String, column: String },
    ColumnExists { table: String, column: String },
    /// ALTER TABLE without a recognized change
    AlterNothing { table: String },
    DropTable { table: String },
    CreateIndex { table: String, column: String },
    IndexExists { table: String, column: String },
    DropIndex { table: String, column: String },
    IndexNotFound { table: String, column: String },
    Insert,
    Update { count: usize },
    Delete { count: usize },
    Scan { columns: Vec<String>, rows: Vec<Row> },
    Commit { count: usize },
    Unknown { raw: String },
}

impl ResultSet {
    /// Renders the result as human-readable lines
    pub fn lines(&self) -> Vec<String> {
        let line = match self {
            ResultSet::Empty => String::new(),
            ResultSet::DatabaseReady { name } => format!("Database '{}' ready.", name),
            ResultSet::UsingDatabase { name } => format!("Using database '{}'.", name),
            ResultSet::DatabaseNotFound { name } => format!("Database '{}' not found.", name),
            ResultSet::CreateTable { table } => format!("Table '{}' created.", table),
            ResultSet::TableExists { table } => format!("Table '{}' already exists.", table),
            ResultSet::TableNotFound { table } => format!("Table '{}' not found.", table),
            ResultSet::DuplicateColumn { table, column } => {
                format!("Duplicate column '{}' in '{}'.", column, table)
            }
            ResultSet::ColumnNotFound { table, column } => {
                format!("Column '{}' not found in '{}'.", column, table)
            }
            ResultSet::AddColumn { table, column } => {
                format!("Column '{}' added to '{}'.", column, table)
            }
            ResultSet::ColumnExists { table, column } => {
                format!("Column '{}' already exists in '{}'.", column, table)
            }
            ResultSet::AlterNothing { table } => format!("No changes applied to '{}'.", table),
            ResultSet::DropTable { table } => format!("Table '{}' dropped.", table),
            ResultSet::CreateIndex { table, column } => format!("Index on {}.{} built.", table, column),
            ResultSet::IndexExists { table, column } => {
                format!("Index on {}.{} already exists.", table, column)
            }
            ResultSet::DropIndex { table, column } => format!("Index on {}.{} removed.", table, column),
            ResultSet::IndexNotFound { table, column } => format!("No index on {}.{}.", table, column),
            ResultSet::Insert => "1 row inserted.".to_string(),
            ResultSet::Update { count } => format!("{} row(s) updated.", count),
            ResultSet::Delete { count } => format!("{} row(s) deleted.", count),
            ResultSet::Scan { columns, rows } => return render_rows(columns, rows),
            ResultSet::Commit { count } => {
                let noun = if *count == 1 { "entry" } else { "entries" };
                format!("Committed {} {}.", count, noun)
            }
            ResultSet::Unknown { raw } => format!("Command '{}' not understood.", raw),
        };
        vec![line]
    }
}

/// Header line plus one `|`-joined line per row. Absent values render empty,
/// explicit Null renders as `NULL`.
fn render_rows(columns: &[String], rows: &[Row]) -> Vec<String> {
    if rows.is_empty() {
        return vec!["(no rows)".to_string()];
    }
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(columns.join(" | "));
    for row in rows {
        let values: Vec<String> = columns
            .iter()
            .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        lines.push(values.join(" | "));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::ResultSet;
    use crate::sql::types::{Row, Value};

    #[test]
    fn test_render_rows() {
        let mut full = Row::new();
        full.insert("id".into(), Value::Integer(1));
        full.insert("name".into(), Value::Null);
        let mut partial = Row::new();
        partial.insert("id".into(), Value::Float(2.5));

        let result = ResultSet::Scan {
            columns: vec!["id".into(), "name".into()],
            rows: vec![full, partial],
        };
        assert_eq!(result.lines(), vec!["id | name", "1 | NULL", "2.5 | "]);

        let empty = ResultSet::Scan {
            columns: vec!["id".into()],
            rows: vec![],
        };
        assert_eq!(empty.lines(), vec!["(no rows)"]);
    }

    #[test]
    fn test_render_status() {
        assert_eq!(ResultSet::Commit { count: 1 }.lines(), vec!["Committed 1 entry."]);
        assert_eq!(ResultSet::Commit { count: 0 }.lines(), vec!["Committed 0 entries."]);
        assert_eq!(ResultSet::Update { count: 2 }.lines(), vec!["2 row(s) updated."]);
        assert_eq!(ResultSet::Empty.lines(), vec![""]);
    }
}
