use crate::sql::types::Value;

/// Typed command produced for one statement
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Blank input
    Empty,
    CreateDatabase {
        name: String,
    },
    AlterDatabase {
        name: String,
    },
    UseDatabase {
        name: String,
    },
    CreateTable {
        table: String,
        columns: Vec<ColumnDef>,
    },
    /// ALTER TABLE; `column` is None when the clause is not `ADD COLUMN`
    AlterTable {
        table: String,
        column: Option<ColumnDef>,
    },
    DropTable {
        table: String,
    },
    CreateIndex {
        table: String,
        column: String,
    },
    DropIndex {
        table: String,
        column: String,
    },
    Insert {
        table: String,
        values: Vec<Value>,
    },
    Update {
        table: String,
        assignments: Vec<(String, Value)>,
        condition: Option<Condition>,
    },
    Delete {
        table: String,
        condition: Option<Condition>,
    },
    Select {
        table: String,
        columns: Projection,
        condition: Option<Condition>,
        join: Option<JoinClause>,
    },
    Commit,
    /// Statement that could not be parsed, carrying the original text
    Unknown {
        raw: String,
    },
}

/// Column definition for CREATE TABLE / ALTER TABLE. The type is metadata only.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub datatype: String,
}

/// `WHERE <column> = <value>`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub value: Value,
}

/// `INNER JOIN <table> ON <left_table>.<left_column> = <right_table>.<right_column>`
///
/// `left_*` always refers to the FROM table and `right_*` to the joined table,
/// whichever order the ON clause was written in.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table: String,
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
}

/// SELECT column list
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `SELECT *`
    All,
    /// Bare or `table.column` names in request order
    Columns(Vec<String>),
}
