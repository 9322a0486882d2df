use crate::sql::{
    engine::store::Selection,
    parser::ast::{Condition, JoinClause, Projection},
    schema::{HashIndex, Table},
    types::{Row, Value},
};

/// Equality inner join driven by a hash index on the right join column
///
/// Left rows come from the FROM table filtered by the WHERE clause; each is
/// looked up in the right index, so only rows with equal derived keys pair up.
pub struct HashJoin<'a> {
    left_name: &'a str,
    left: &'a Table,
    right: &'a Table,
    join: &'a JoinClause,
}

impl<'a> HashJoin<'a> {
    pub fn new(left_name: &'a str, left: &'a Table, right: &'a Table, join: &'a JoinClause) -> Self {
        Self {
            left_name,
            left,
            right,
            join,
        }
    }

    pub fn execute(&self, columns: &Projection, condition: Option<&Condition>) -> Selection {
        // Without a live index on the right column, build one for this query only.
        let transient;
        let index = match self.right.indexes.get(&self.join.right_column) {
            Some(index) => index,
            None => {
                transient = HashIndex::build(&self.right.rows, &self.join.right_column);
                &transient
            }
        };

        let header = match columns {
            Projection::All => self
                .left
                .columns
                .iter()
                .map(|c| format!("{}.{}", self.left_name, c))
                .chain(
                    self.right
                        .columns
                        .iter()
                        .map(|c| format!("{}.{}", self.join.table, c)),
                )
                .collect(),
            Projection::Columns(names) => names.clone(),
        };

        let mut rows = Vec::new();
        for pos in self.left.matching(condition) {
            let left_row = &self.left.rows[pos];
            let Some(key) = left_row.get(&self.join.left_column).map(Value::key) else {
                continue;
            };
            for &right_pos in index.lookup(&key) {
                let right_row = &self.right.rows[right_pos];
                let combined = self.combine(left_row, right_row);
                rows.push(match columns {
                    Projection::All => combined,
                    Projection::Columns(names) => names
                        .iter()
                        .filter_map(|name| {
                            let value = self.resolve(name, &combined, left_row, right_row)?;
                            Some((name.clone(), value.clone()))
                        })
                        .collect(),
                });
            }
        }

        Selection {
            columns: header,
            rows,
        }
    }

    /// Pairs two rows under `table.column` names
    fn combine(&self, left_row: &Row, right_row: &Row) -> Row {
        let qualify = |table: &str, row: &Row| {
            row.iter()
                .map(|(column, value)| (format!("{}.{}", table, column), value.clone()))
                .collect::<Vec<_>>()
        };
        qualify(self.left_name, left_row)
            .into_iter()
            .chain(qualify(self.join.table.as_str(), right_row))
            .collect()
    }

    /// Qualified names hit the combined row; bare names try the left table
    /// first, then the right one. None when the value is absent.
    fn resolve<'r>(
        &self,
        name: &str,
        combined: &'r Row,
        left_row: &'r Row,
        right_row: &'r Row,
    ) -> Option<&'r Value> {
        if name.contains('.') {
            combined.get(name)
        } else if self.left.has_column(name) {
            left_row.get(name)
        } else if self.right.has_column(name) {
            right_row.get(name)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::HashJoin;
    use crate::sql::{
        parser::ast::{Condition, JoinClause, Projection},
        schema::Table,
        types::Value,
    };

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn tables() -> (Table, Table, JoinClause) {
        let mut users = Table::new(vec!["id".into(), "name".into()]);
        users.insert(vec![Value::Integer(1), text("Alice")]);
        users.insert(vec![Value::Integer(2), text("Bob")]);
        users.insert(vec![Value::Integer(3), text("Cara")]);

        let mut orders = Table::new(vec!["order_id".into(), "user_id".into(), "product".into()]);
        orders.insert(vec![Value::Integer(101), Value::Integer(1), text("Laptop")]);
        orders.insert(vec![Value::Integer(102), Value::Integer(2), text("Mouse")]);
        orders.insert(vec![Value::Integer(103), Value::Integer(1), text("Keyboard")]);
        orders.insert(vec![Value::Integer(104), Value::Float(2.0), text("Cable")]);

        let join = JoinClause {
            table: "orders".into(),
            left_table: "users".into(),
            left_column: "id".into(),
            right_table: "orders".into(),
            right_column: "user_id".into(),
        };
        (users, orders, join)
    }

    fn pairs(rows: &[crate::sql::types::Row], a: &str, b: &str) -> Vec<(String, String)> {
        rows.iter()
            .map(|r| (r[a].to_string(), r[b].to_string()))
            .collect()
    }

    #[test]
    fn test_join_pairs_equal_keys_only() {
        let (users, mut orders, join) = tables();
        let columns = Projection::Columns(vec!["name".into(), "orders.product".into()]);

        let scanned = HashJoin::new("users", &users, &orders, &join).execute(&columns, None);
        orders.create_index("user_id");
        let indexed = HashJoin::new("users", &users, &orders, &join).execute(&columns, None);
        assert_eq!(scanned, indexed);

        // Float 2.0 never matches Integer 2; Cara has no orders.
        assert_eq!(
            pairs(&indexed.rows, "name", "orders.product"),
            vec![
                ("Alice".to_string(), "Laptop".to_string()),
                ("Alice".to_string(), "Keyboard".to_string()),
                ("Bob".to_string(), "Mouse".to_string()),
            ]
        );
    }

    #[test]
    fn test_join_star_qualifies_columns() {
        let (users, orders, join) = tables();
        let condition = Condition {
            column: "id".into(),
            value: Value::Integer(2),
        };
        let selection = HashJoin::new("users", &users, &orders, &join)
            .execute(&Projection::All, Some(&condition));
        assert_eq!(
            selection.columns,
            vec![
                "users.id",
                "users.name",
                "orders.order_id",
                "orders.user_id",
                "orders.product"
            ]
        );
        assert_eq!(selection.rows.len(), 1);
        assert_eq!(selection.rows[0]["orders.order_id"], Value::Integer(102));
        assert_eq!(selection.rows[0]["users.name"], text("Bob"));
    }

    #[test]
    fn test_join_unknown_column_is_absent() {
        let (users, orders, join) = tables();
        let selection = HashJoin::new("users", &users, &orders, &join)
            .execute(&Projection::Columns(vec!["nope".into()]), None);
        assert_eq!(selection.rows.len(), 3);
        assert!(selection.rows.iter().all(|r| !r.contains_key("nope")));
    }

    #[test]
    fn test_join_keeps_missing_values_absent() {
        let (mut users, orders, join) = tables();
        users.add_column("email");
        users.insert(vec![Value::Integer(2)]);
        let columns = Projection::Columns(vec!["name".into(), "email".into()]);
        let selection = HashJoin::new("users", &users, &orders, &join).execute(&columns, None);
        let last = &selection.rows[selection.rows.len() - 1];
        assert_eq!(last.get("name"), None);
        assert_eq!(last.get("email"), None);
        assert_eq!(selection.rows[0].get("email"), Some(&Value::Null));
    }
}
