//! SQLite dialect implementation.

use chrono::{NaiveDate, NaiveDateTime};
use oxide_query_core::ast::DataType;
use oxide_query_core::dialect::{Dialect, IsolationLevel, OutputStyle, Pagination, TransactionOptions};
use oxide_query_core::render::RenderContext;
use oxide_query_core::{Error, Result};

/// SQLite dialect.
///
/// Parameters are numbered `?NNN` so one value can be referenced from
/// several statements of a batch. Types collapse onto SQLite's storage
/// classes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn identifier_quote(&self) -> Option<(char, char)> {
        Some(('"', '"')) // SQLite also accepts backticks and brackets
    }

    fn parameter_name(&self, index: u32) -> String {
        format!("?{index}")
    }

    fn format_bool(&self, value: bool) -> String {
        String::from(if value { "1" } else { "0" })
    }

    fn format_date(&self, value: NaiveDate) -> String {
        format!("'{}'", value.format("%Y-%m-%d"))
    }

    fn format_timestamp(&self, value: NaiveDateTime) -> String {
        format!("'{}'", value.format("%Y-%m-%d %H:%M:%S%.f"))
    }

    fn format_type(&self, data_type: &DataType) -> String {
        let name = match data_type {
            DataType::Smallint | DataType::Integer | DataType::Bigint | DataType::Boolean => {
                "INTEGER"
            }
            DataType::Real | DataType::Double => "REAL",
            DataType::Decimal { .. } => "NUMERIC",
            DataType::Char(_)
            | DataType::Varchar(_)
            | DataType::Text
            | DataType::Date
            | DataType::Time
            | DataType::Timestamp => "TEXT",
            DataType::Blob | DataType::Varbinary(_) => "BLOB",
            DataType::Custom(name) => return name.clone(),
        };
        String::from(name)
    }

    fn pagination(&self) -> Pagination {
        Pagination::Limit
    }

    fn unbounded_limit(&self) -> Option<&str> {
        Some("-1")
    }

    fn output_style(&self) -> OutputStyle {
        OutputStyle::Returning // SQLite 3.35.0+
    }

    /// SQLite transactions are always serializable and cannot be declared
    /// read-only.
    fn render_begin(&self, ctx: &mut RenderContext<'_>, options: &TransactionOptions) -> Result<()> {
        if options.read_only {
            return Err(unsupported("read-only transactions"));
        }
        match options.isolation {
            None | Some(IsolationLevel::Serializable) => {}
            Some(_) => return Err(unsupported("isolation levels other than SERIALIZABLE")),
        }
        ctx.write("BEGIN");
        ctx.terminate();
        Ok(())
    }
}

fn unsupported(feature: &'static str) -> Error {
    Error::UnsupportedFeature {
        dialect: String::from("sqlite"),
        feature,
    }
}
