//! Parameter values and inline constants.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use super::Expr;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::render::{Render, RenderContext};
use crate::value::{SqlValue, ToSqlValue};

/// A runtime value bound as a parameter.
///
/// Parameters are keyed by instance, not by content: two `Value`s holding the
/// same data render as two placeholders, while clones of one `Value` share a
/// single placeholder within a render or batch scope.
///
/// ```rust
/// use oxide_query_core::ast::Value;
///
/// let a = Value::new(10);
/// let b = a.clone();
/// assert!(a.same_instance(&b));
/// assert!(!a.same_instance(&Value::new(10)));
/// ```
#[derive(Clone)]
pub struct Value(Arc<SqlValue>);

impl Value {
    /// Wraps a runtime value.
    pub fn new(value: impl ToSqlValue) -> Self {
        Self(Arc::new(value.to_sql_value()))
    }

    /// Returns the wrapped value.
    #[must_use]
    pub fn get(&self) -> &SqlValue {
        &self.0
    }

    /// Returns whether both handles refer to the same instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(self.get()).finish()
    }
}

/// Values compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other)
    }
}

impl Render for Value {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.parameter(self);
        Ok(())
    }
}

impl TryFrom<Expr> for Value {
    type Error = Error;

    fn try_from(expr: Expr) -> Result<Self> {
        match expr {
            Expr::Value(value) => Ok(value),
            other => Err(Error::ParameterMisuse {
                found: other.kind(),
            }),
        }
    }
}

/// A literal inlined into the SQL text.
///
/// Only types whose textual form cannot smuggle SQL are accepted through the
/// `From` conversions. Strings must go through [`Constant::unsafe_string`],
/// which escapes quotes but is still inlined verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// NULL.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// Date literal.
    Date(NaiveDate),
    /// Timestamp literal.
    Timestamp(NaiveDateTime),
    /// A string literal, inlined.
    UnsafeString(String),
}

impl Constant {
    /// Creates an inlined string literal.
    #[must_use]
    pub fn unsafe_string(value: impl Into<String>) -> Self {
        Self::UnsafeString(value.into())
    }

    /// Formats the literal for `dialect`.
    #[must_use]
    pub fn format(&self, dialect: &dyn Dialect) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => dialect.format_bool(*b),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format!("{f:?}"),
            Self::Date(d) => dialect.format_date(*d),
            Self::Timestamp(ts) => dialect.format_timestamp(*ts),
            Self::UnsafeString(s) => dialect.format_string(s),
        }
    }

    pub(crate) fn data_type(&self) -> Option<super::DataType> {
        use super::DataType;
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(DataType::Boolean),
            Self::Int(_) => Some(DataType::Bigint),
            Self::Float(_) => Some(DataType::Double),
            Self::Date(_) => Some(DataType::Date),
            Self::Timestamp(_) => Some(DataType::Timestamp),
            Self::UnsafeString(_) => Some(DataType::Text),
        }
    }
}

impl Render for Constant {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.literal(self);
        Ok(())
    }
}

impl From<bool> for Constant {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Constant {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Constant {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Constant {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<NaiveDate> for Constant {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for Constant {
    fn from(value: NaiveDateTime) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Constant {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::col;
    use crate::dialect::GenericDialect;

    #[test]
    fn test_value_identity() {
        let a = Value::new("x");
        let b = a.clone();
        let c = Value::new("x");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.get(), c.get());
    }

    #[test]
    fn test_value_from_expr() {
        let value = Value::new(3);
        let expr = Expr::from(value.clone());
        let back = Value::try_from(expr).unwrap();
        assert!(back.same_instance(&value));

        let err = Value::try_from(col("a")).unwrap_err();
        assert!(matches!(err, Error::ParameterMisuse { found: "column" }));
    }

    #[test]
    fn test_constant_format() {
        let dialect = GenericDialect::new();
        assert_eq!(Constant::Null.format(&dialect), "NULL");
        assert_eq!(Constant::from(42).format(&dialect), "42");
        assert_eq!(Constant::from(1.5).format(&dialect), "1.5");
        assert_eq!(Constant::from(true).format(&dialect), "TRUE");
        assert_eq!(Constant::unsafe_string("O'Brien").format(&dialect), "'O''Brien'");
        assert_eq!(Constant::from(None::<i64>), Constant::Null);
    }
}
