//! Column-oriented numeric table used as the profile sink.

/// Name of the cumulative-distance column.
pub const DISTANCE_COLUMN: &str = "Distance";
/// Name of the sampled-intensity column.
pub const INTENSITY_COLUMN: &str = "Intensity";

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<f64>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Every column always holds exactly `rows` values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number_of_rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Exact, case-sensitive lookup.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_values(&self, name: &str) -> Option<&[f64]> {
        self.column(name).map(Column::values)
    }

    /// Returns the index of the column called `name`, appending a zero-filled
    /// one first if there is none.
    pub fn column_index_or_insert(&mut self, name: &str) -> usize {
        if let Some(index) = self.columns.iter().position(|c| c.name == name) {
            return index;
        }
        self.columns.push(Column {
            name: name.to_owned(),
            values: vec![0.0; self.rows],
        });
        self.columns.len() - 1
    }

    /// Truncates or zero-extends every column to `rows` values.
    pub fn set_number_of_rows(&mut self, rows: usize) {
        for column in &mut self.columns {
            column.values.resize(rows, 0.0);
        }
        self.rows = rows;
    }

    /// Writes one cell. `None` when the column or row does not exist.
    pub fn set_value(&mut self, column: usize, row: usize, value: f64) -> Option<()> {
        let cell = self.columns.get_mut(column)?.values.get_mut(row)?;
        *cell = value;
        Some(())
    }

    /// Overwrites the leading values of a column in place.
    pub(crate) fn write_column(&mut self, column: usize, values: &[f64]) {
        self.columns[column].values[..values.len()].copy_from_slice(values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_sensitive() {
        let mut table = Table::new("profile");
        table.column_index_or_insert(DISTANCE_COLUMN);
        assert!(table.column("distance").is_none());
        assert!(table.column(DISTANCE_COLUMN).is_some());
    }

    #[test]
    fn existing_columns_are_reused() {
        let mut table = Table::new("profile");
        let first = table.column_index_or_insert(INTENSITY_COLUMN);
        let again = table.column_index_or_insert(INTENSITY_COLUMN);
        assert_eq!(first, again);
        assert_eq!(table.columns().len(), 1);
    }

    #[test]
    fn out_of_range_cells_are_not_written() {
        let mut table = Table::new("profile");
        let column = table.column_index_or_insert(DISTANCE_COLUMN);
        table.set_number_of_rows(2);
        assert_eq!(table.set_value(column, 1, 4.0), Some(()));
        assert_eq!(table.set_value(column, 2, 4.0), None);
        assert_eq!(table.set_value(column + 1, 0, 4.0), None);
        assert_eq!(table.column_values(DISTANCE_COLUMN), Some(&[0.0, 4.0][..]));
    }

    #[test]
    fn row_count_resizes_all_columns() {
        let mut table = Table::new("profile");
        table.set_number_of_rows(5);
        let extra = table.column_index_or_insert("Extra");
        assert_eq!(table.columns()[extra].values().len(), 5);
        table.set_value(extra, 4, 2.0).expect("row exists");
        table.set_number_of_rows(3);
        assert_eq!(table.column_values("Extra"), Some(&[0.0, 0.0, 0.0][..]));
        table.set_number_of_rows(4);
        assert_eq!(table.column_values("Extra"), Some(&[0.0, 0.0, 0.0, 0.0][..]));
    }
}
