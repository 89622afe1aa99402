//! CREATE TABLE and DROP TABLE.

use super::ColumnDef;
use crate::error::{Error, Result};
use crate::render::{Render, RenderContext};

/// A CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    /// Table name.
    pub name: String,
    /// Column definitions.
    pub columns: Vec<ColumnDef>,
    /// Whether IF NOT EXISTS was specified.
    pub if_not_exists: bool,
}

impl CreateTable {
    /// Creates a CREATE TABLE for `name` with no columns yet.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            columns: Vec::new(),
            if_not_exists: false,
        }
    }

    /// Adds a column definition.
    #[must_use]
    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds IF NOT EXISTS.
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }
}

impl Render for ColumnDef {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.identifier(&self.name);
        ctx.write_char(' ');
        let type_name = ctx.dialect().format_type(&self.data_type);
        ctx.write(&type_name);
        if self.primary_key {
            ctx.write(" PRIMARY KEY");
        } else if !self.nullable {
            ctx.write(" NOT NULL");
        }
        if self.unique && !self.primary_key {
            ctx.write(" UNIQUE");
        }
        if let Some(default) = &self.default {
            ctx.write(" DEFAULT ");
            ctx.literal(default);
        }
        Ok(())
    }
}

impl Render for CreateTable {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::MissingElement {
                clause: "CREATE TABLE",
                element: "column definitions",
            });
        }
        ctx.write("CREATE TABLE ");
        if self.if_not_exists {
            ctx.write("IF NOT EXISTS ");
        }
        ctx.identifier(&self.name);
        ctx.write(" (");
        ctx.render_list(&self.columns, ", ")?;
        ctx.write_char(')');
        ctx.terminate();
        Ok(())
    }
}

/// A DROP TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTable {
    /// Table name.
    pub name: String,
    /// Whether IF EXISTS was specified.
    pub if_exists: bool,
}

impl DropTable {
    /// Creates a DROP TABLE for `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            if_exists: false,
        }
    }

    /// Adds IF EXISTS.
    #[must_use]
    pub const fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }
}

impl Render for DropTable {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.write("DROP TABLE ");
        if self.if_exists {
            ctx.write("IF EXISTS ");
        }
        ctx.identifier(&self.name);
        ctx.terminate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DataType;
    use crate::dialect::GenericDialect;
    use crate::render::render;

    #[test]
    fn test_create_table() {
        let create = CreateTable::new("users")
            .if_not_exists()
            .column(ColumnDef::new("id", DataType::Bigint).primary_key())
            .column(ColumnDef::new("email", DataType::Varchar(Some(255))).not_null().unique())
            .column(ColumnDef::new("active", DataType::Boolean).default(true));
        let rendered = render(&create, &GenericDialect::new()).unwrap();
        assert_eq!(
            rendered.sql(),
            "CREATE TABLE IF NOT EXISTS users (id BIGINT PRIMARY KEY, \
             email VARCHAR(255) NOT NULL UNIQUE, active BOOLEAN DEFAULT TRUE);"
        );
    }

    #[test]
    fn test_create_table_needs_columns() {
        let err = render(&CreateTable::new("empty"), &GenericDialect::new()).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_drop_table() {
        let rendered = render(&DropTable::new("users").if_exists(), &GenericDialect::new()).unwrap();
        assert_eq!(rendered.sql(), "DROP TABLE IF EXISTS users;");
    }
}
