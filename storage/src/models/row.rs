//! Result rows: ordered values plus the column names they came from.

use std::sync::Arc;

use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

/// All rows of one statement, in store order.
pub type ResultSet = Vec<Row>;

impl Row {
    /// `columns` is shared by every row of a result set.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// First column named `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_name() {
        let columns: Arc<[String]> = vec!["id".to_string(), "name".to_string()].into();
        let row = Row::new(columns, vec![Value::Int(1), Value::Text("a".into())]);
        assert_eq!(row.get_by_name("name"), Some(&Value::Text("a".into())));
        assert_eq!(row.get_by_name("missing"), None);
        assert_eq!(row.get(0).and_then(Value::as_i64), Some(1));
        assert_eq!(row.len(), 2);
    }
}
