//! Typed builder for the partial `UPDATE` issued by the repository.
//!
//! Column names are fixed at compile time (`&'static str`); values only ever
//! travel as bound parameters.

/// `UPDATE <table> SET <col> = $n, ..., <touch> = CURRENT_TIMESTAMP WHERE <key> = $k`
#[derive(Debug, Clone)]
pub struct UpdateStatement {
    table: &'static str,
    key_column: &'static str,
    touch_column: Option<&'static str>,
    assignments: Vec<(&'static str, String)>,
}

impl UpdateStatement {
    pub fn new(table: &'static str, key_column: &'static str) -> Self {
        Self {
            table,
            key_column,
            touch_column: None,
            assignments: Vec::new(),
        }
    }

    /// Column refreshed to `CURRENT_TIMESTAMP` on every execution.
    pub fn touch(mut self, column: &'static str) -> Self {
        self.touch_column = Some(column);
        self
    }

    pub fn set(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.assignments.push((column, value.into()));
        self
    }

    /// Adds the assignment only when a value is present.
    pub fn set_opt(self, column: &'static str, value: Option<String>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Number of caller-supplied assignments (the touch column is not counted).
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Renders the SQL text. The key is always the last placeholder.
    pub fn sql(&self) -> String {
        let mut sets: Vec<String> = self
            .assignments
            .iter()
            .enumerate()
            .map(|(i, (col, _))| format!("{col} = ${}", i + 1))
            .collect();
        if let Some(col) = self.touch_column {
            sets.push(format!("{col} = CURRENT_TIMESTAMP"));
        }
        format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            self.table,
            sets.join(", "),
            self.key_column,
            self.assignments.len() + 1
        )
    }

    /// SQL text plus the values for placeholders `$1..$n`, in order.
    pub fn into_parts(self) -> (String, Vec<String>) {
        let sql = self.sql();
        let values = self.assignments.into_iter().map(|(_, v)| v).collect();
        (sql, values)
    }
}
