//! Static table descriptors. Row types declare one; statements and DDL are built from it.

/// Column storage type. Drives placeholder casts and DDL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Boolean,
    BigInt,
    Timestamp,
}

impl SqlType {
    pub fn pg_name(self) -> &'static str {
        match self {
            SqlType::Text => "text",
            SqlType::Boolean => "boolean",
            SqlType::BigInt => "bigint",
            SqlType::Timestamp => "timestamptz",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
    /// Whether a paging request may order by this column.
    pub sortable: bool,
    /// Unique constraint; unique text columns are indexed case-insensitively.
    pub unique: bool,
    /// Referenced table (by its id column); rows here are deleted with the referenced row.
    pub references: Option<&'static str>,
}

impl Column {
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Column {
            name,
            sql_type,
            nullable: false,
            sortable: true,
            unique: false,
            references: None,
        }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn references(mut self, table: &'static str) -> Self {
        self.references = Some(table);
        self
    }
}

/// A table: name, id column and columns in declaration order.
/// Declaration order is the order of row values and the order sort resolution walks.
#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub id_column: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn sortable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.sortable)
    }
}
