//! Generic SQL dialect.

use super::Dialect;

/// A generic dialect: identifiers are emitted verbatim, parameters are named
/// `@P<n>`, and paging uses `LIMIT`/`OFFSET`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &str {
        "generic"
    }

    fn identifier_quote(&self) -> Option<(char, char)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{OutputStyle, Pagination};

    #[test]
    fn test_generic_dialect() {
        let dialect = GenericDialect::new();
        assert_eq!(dialect.name(), "generic");
        assert_eq!(dialect.identifier_quote(), None);
        assert_eq!(dialect.quote_identifier("users.name"), "users.name");
        assert_eq!(dialect.parameter_name(1), "@P1");
        assert_eq!(dialect.pagination(), Pagination::Limit);
        assert!(dialect.supports_offset());
        assert_eq!(dialect.output_style(), OutputStyle::None);
    }
}
