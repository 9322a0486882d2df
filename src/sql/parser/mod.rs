use crate::sql::parser::ast::{ColumnDef, Command, Condition, JoinClause, Projection};
use crate::sql::parser::lexer::{Lexer, Word};
use crate::sql::types::Value;

pub mod ast;
mod lexer;

/// Handler for a two-word statement prefix such as `CREATE TABLE`
type Handler = fn(&Parser<'_>) -> Option<Command>;

/// Compound verb table; a statement whose first two words match none of
/// these keys is `Unknown`
const COMPOUND_HANDLERS: [(&str, Handler); 7] = [
    ("CREATE DATABASE", create_database),
    ("ALTER DATABASE", alter_database),
    ("CREATE TABLE", create_table),
    ("ALTER TABLE", alter_table),
    ("DROP TABLE", drop_table),
    ("CREATE INDEX", create_index),
    ("DROP INDEX", drop_index),
];

/// Statement parser - converts one statement into a typed Command
///
/// Parsing never fails: input that does not fit the grammar becomes
/// `Command::Unknown` carrying the original (trimmed) text.
pub struct Parser<'a> {
    /// Trimmed input, reported back for unknown statements
    raw: &'a str,
    /// Input without the trailing `;`
    text: &'a str,
    words: Vec<Word<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        let raw = input.trim();
        let text = raw.trim_end_matches(';').trim_end();
        Parser {
            raw,
            text,
            words: Lexer::new(text).words(),
        }
    }

    /// Parses the statement, dispatching on its first word
    pub fn parse(&self) -> Command {
        let Some(first) = self.words.first() else {
            return if self.raw.is_empty() {
                Command::Empty
            } else {
                self.unknown()
            };
        };

        let command = match first.text.to_uppercase().as_str() {
            "INSERT" => self.parse_insert(),
            "UPDATE" => self.parse_update(),
            "DELETE" => self.parse_delete(),
            "SELECT" => self.parse_select(),
            "COMMIT" => Some(Command::Commit),
            "USE" if self.words.len() > 1 => self
                .ident_at(1)
                .map(|name| Command::UseDatabase { name }),
            verb => self.parse_compound(verb),
        };
        command.unwrap_or_else(|| self.unknown())
    }

    fn unknown(&self) -> Command {
        Command::Unknown {
            raw: self.raw.to_string(),
        }
    }

    /// Looks the first two words up in the compound verb table
    fn parse_compound(&self, verb: &str) -> Option<Command> {
        let second = self.words.get(1)?;
        let key = format!("{} {}", verb, second.text.to_uppercase());
        COMPOUND_HANDLERS
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, handler)| handler(self))
    }

    /// CREATE TABLE <name> (<col> [TYPE], ...)
    fn parse_create_table(&self) -> Option<Command> {
        let open = self.text.find('(')?;
        let close = self.text.rfind(')')?;
        if close < open {
            return None;
        }
        let header = Lexer::new(&self.text[..open]).words();
        if header.len() != 3 || !is_ident(header[2].text) {
            return None;
        }

        let columns = Lexer::new(&self.text[open + 1..close])
            .fields(',')
            .into_iter()
            .filter_map(|field| {
                let parts = Lexer::new(field).words();
                Some(column_def(parts.first()?, parts.get(1)))
            })
            .collect();
        Some(Command::CreateTable {
            table: ident(header[2].text),
            columns,
        })
    }

    /// ALTER TABLE <name> ADD COLUMN <col> [TYPE]; anything else after the
    /// table name yields an empty change
    fn parse_alter_table(&self) -> Option<Command> {
        let table = self.ident_at(2)?;
        let column = match self.words.get(3..) {
            Some([add, kw, name, rest @ ..]) if add.is("ADD") && kw.is("COLUMN") => {
                Some(column_def(name, rest.first()))
            }
            _ => None,
        };
        Some(Command::AlterTable { table, column })
    }

    /// INSERT INTO <table> VALUES (<literal>, ...)
    fn parse_insert(&self) -> Option<Command> {
        if !self.words.get(1)?.is("INTO") {
            return None;
        }
        let table = self.ident_at(2)?;
        let rest = self.text[self.words[2].end..].trim_start();
        let rest = strip_keyword(rest, "VALUES")?.trim_start();
        let inner = rest.strip_prefix('(')?.strip_suffix(')')?;

        let values = Lexer::new(inner)
            .fields(',')
            .into_iter()
            .map(parse_literal)
            .collect();
        Some(Command::Insert { table, values })
    }

    /// UPDATE <table> SET <col>=<literal>[, ...] [WHERE <col>=<literal>]
    fn parse_update(&self) -> Option<Command> {
        let table = self.ident_at(1)?;
        let set = self.words.get(2)?;
        if !set.is("SET") {
            return None;
        }
        let where_pos = self.find_word("WHERE", 3);
        let set_end = where_pos.map_or(self.text.len(), |i| self.words[i].start);

        // Every assignment must be `<col>=<literal>`.
        let assignments = Lexer::new(&self.text[set.end..set_end])
            .fields(',')
            .into_iter()
            .map(|field| {
                let (column, value) = field.split_once('=')?;
                let column = column.trim();
                is_ident(column).then(|| (ident(column), parse_literal(value)))
            })
            .collect::<Option<Vec<(String, Value)>>>()?;
        if assignments.is_empty() {
            return None;
        }

        Some(Command::Update {
            table,
            assignments,
            condition: self.parse_where(where_pos)?,
        })
    }

    /// DELETE FROM <table> [WHERE <col>=<literal>]
    fn parse_delete(&self) -> Option<Command> {
        if !self.words.get(1)?.is("FROM") {
            return None;
        }
        let table = self.ident_at(2)?;
        let where_pos = match self.words.get(3) {
            None => None,
            Some(w) if w.is("WHERE") => Some(3),
            Some(_) => return None,
        };
        Some(Command::Delete {
            table,
            condition: self.parse_where(where_pos)?,
        })
    }

    /// SELECT <cols|*> FROM <table>
    ///   [INNER JOIN <table2> ON <t>.<c> = <t2>.<c>] [WHERE <col>=<literal>]
    fn parse_select(&self) -> Option<Command> {
        let from = self.find_word("FROM", 1)?;
        if from < 2 {
            return None;
        }
        let fields = Lexer::new(&self.text[self.words[1].start..self.words[from - 1].end]).fields(',');
        let columns = if fields == ["*"] {
            Projection::All
        } else {
            Projection::Columns(fields.into_iter().map(ident).collect())
        };
        let table = self.ident_at(from + 1)?;

        let mut next = from + 2;
        let join = match self.words.get(next) {
            Some(w) if w.is("INNER") => {
                if !self.words.get(next + 1)?.is("JOIN") || !self.words.get(next + 3)?.is("ON") {
                    return None;
                }
                let join_table = self.ident_at(next + 2)?;
                let where_pos = self.find_word("WHERE", next + 4);
                let on_end = where_pos.map_or(self.text.len(), |i| self.words[i].start);
                let on = &self.text[self.words[next + 3].end..on_end];
                next = where_pos.unwrap_or(self.words.len());
                Some(parse_join(&table, join_table, on)?)
            }
            _ => None,
        };

        let where_pos = match self.words.get(next) {
            None => None,
            Some(w) if w.is("WHERE") => Some(next),
            Some(_) => return None,
        };
        Some(Command::Select {
            table,
            columns,
            condition: self.parse_where(where_pos)?,
            join,
        })
    }

    /// Parses the clause following the WHERE word at `position`.
    /// Returns None for a malformed clause, Some(None) when there is no WHERE.
    fn parse_where(&self, position: Option<usize>) -> Option<Option<Condition>> {
        let Some(i) = position else {
            return Some(None);
        };
        let (column, value) = self.text[self.words[i].end..].split_once('=')?;
        let (column, value) = (column.trim(), value.trim());
        if !is_column_ref(column) || value.is_empty() {
            return None;
        }
        Some(Some(Condition {
            column: ident(column),
            value: parse_literal(value),
        }))
    }

    /// Index of the first word at or after `from` matching `keyword` outside quotes
    fn find_word(&self, keyword: &str, from: usize) -> Option<usize> {
        (from..self.words.len()).find(|&i| !self.words[i].quoted && self.words[i].is(keyword))
    }

    /// Lowercased identifier at word `index`
    fn ident_at(&self, index: usize) -> Option<String> {
        self.words
            .get(index)
            .filter(|w| is_ident(w.text))
            .map(|w| ident(w.text))
    }
}

fn create_database(p: &Parser<'_>) -> Option<Command> {
    p.ident_at(2).map(|name| Command::CreateDatabase { name })
}

fn alter_database(p: &Parser<'_>) -> Option<Command> {
    p.ident_at(2).map(|name| Command::AlterDatabase { name })
}

fn create_table(p: &Parser<'_>) -> Option<Command> {
    p.parse_create_table()
}

fn alter_table(p: &Parser<'_>) -> Option<Command> {
    p.parse_alter_table()
}

fn drop_table(p: &Parser<'_>) -> Option<Command> {
    p.ident_at(2).map(|table| Command::DropTable { table })
}

fn create_index(p: &Parser<'_>) -> Option<Command> {
    Some(Command::CreateIndex {
        table: p.ident_at(2)?,
        column: p.ident_at(3)?,
    })
}

fn drop_index(p: &Parser<'_>) -> Option<Command> {
    Some(Command::DropIndex {
        table: p.ident_at(2)?,
        column: p.ident_at(3)?,
    })
}

/// Parses a literal: quoted text, then i64, then f64, else the raw token as text
pub fn parse_literal(token: &str) -> Value {
    let token = token.trim();
    for quote in ['\'', '"'] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return Value::Text(token[1..token.len() - 1].to_string());
        }
    }
    if let Ok(i) = token.parse::<i64>() {
        return Value::Integer(i);
    }
    // Rust also accepts "inf" and "NaN" as floats; those stay text.
    if token.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(f) = token.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::Text(token.to_string())
}

fn parse_join(left: &str, right: String, on: &str) -> Option<JoinClause> {
    let (lhs, rhs) = on.split_once('=')?;
    let (mut left_table, mut left_column) = qualified(lhs)?;
    let (mut right_table, mut right_column) = qualified(rhs)?;
    // ON orders.user_id = users.id
    if left != right && left_table == right && right_table == left {
        std::mem::swap(&mut left_table, &mut right_table);
        std::mem::swap(&mut left_column, &mut right_column);
    }
    Some(JoinClause {
        table: right,
        left_table,
        left_column,
        right_table,
        right_column,
    })
}

/// Splits `table.column`
fn qualified(name: &str) -> Option<(String, String)> {
    let (table, column) = name.trim().split_once('.')?;
    (is_ident(table) && is_ident(column)).then(|| (ident(table), ident(column)))
}

fn column_def(name: &Word<'_>, datatype: Option<&Word<'_>>) -> ColumnDef {
    ColumnDef {
        name: ident(name.text),
        datatype: datatype.map_or_else(|| "TEXT".to_string(), |w| w.text.to_uppercase()),
    }
}

/// Case-insensitive prefix strip
fn strip_keyword<'s>(text: &'s str, keyword: &str) -> Option<&'s str> {
    text.get(..keyword.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(keyword))
        .map(|_| &text[keyword.len()..])
}

/// A bare column name, or one with a single `table.` qualifier
fn is_column_ref(text: &str) -> bool {
    match text.split_once('.') {
        Some((table, column)) => is_ident(table) && is_ident(column),
        None => is_ident(text),
    }
}

fn is_ident(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn ident(text: &str) -> String {
    text.to_lowercase()
}
