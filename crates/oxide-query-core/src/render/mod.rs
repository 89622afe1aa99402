//! Rendering element trees into SQL text and parameters.
//!
//! Every element implements [`Render`] and writes itself into a
//! [`RenderContext`]. The context owns the text buffer, the render-mode
//! stack, and the [`ParameterScope`] that names value placeholders. It
//! delegates quoting and literal formatting to the active
//! [`Dialect`](crate::dialect::Dialect).
//!
//! ```rust
//! use oxide_query_core::ast::{col, Value};
//! use oxide_query_core::dialect::GenericDialect;
//! use oxide_query_core::render::render;
//!
//! let condition = col("Age").gt(Value::new(10));
//! let rendered = render(&condition, &GenericDialect::new()).unwrap();
//! assert_eq!(rendered.sql(), "Age > @P1");
//! ```

mod combine;
mod params;

use std::collections::HashSet;
use std::ops::{Deref, DerefMut};

pub use combine::CombineContext;
pub use params::{Parameter, ParameterScope, Parameters};

use crate::ast::{Constant, Value};
use crate::dialect::Dialect;
use crate::error::Result;

/// Something that can write itself into a [`RenderContext`].
///
/// Implementations must not mutate the node, must write only into the
/// supplied context, and must render children through the context so the
/// parameter scope and mode stack thread through correctly.
pub trait Render {
    /// Renders the element.
    ///
    /// # Errors
    ///
    /// Returns a structural error when the element is missing a required
    /// part or the dialect cannot express it.
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()>;
}

impl<R: Render + ?Sized> Render for &R {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        (**self).render(ctx)
    }
}

impl<R: Render + ?Sized> Render for Box<R> {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        (**self).render(ctx)
    }
}

/// Controls punctuation while the tree is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Top level; statements emit their terminator.
    Statement,
    /// Sub-expression, e.g. a sub-select wrapped in parentheses.
    Nested,
    /// Member of a compound (UNION-style) statement; terminators are
    /// suppressed.
    MultiStatement,
}

/// The output of one render pass.
///
/// Cheap to clone and safe to replay against an executor any number of
/// times.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSql {
    sql: String,
    params: Parameters,
    statements: usize,
}

impl RenderedSql {
    /// Returns the SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the parameters referenced by the text.
    #[must_use]
    pub const fn params(&self) -> &Parameters {
        &self.params
    }

    /// Returns the number of terminated statements in the text.
    #[must_use]
    pub const fn statement_count(&self) -> usize {
        self.statements
    }

    /// Consumes the output and returns the SQL and parameters.
    #[must_use]
    pub fn into_parts(self) -> (String, Parameters) {
        (self.sql, self.params)
    }
}

/// Per-pass render state.
pub struct RenderContext<'d> {
    dialect: &'d dyn Dialect,
    sql: String,
    modes: Vec<RenderMode>,
    scope: ParameterScope,
    used: Parameters,
    used_indexes: HashSet<u32>,
    statements: usize,
}

impl<'d> RenderContext<'d> {
    /// Creates a context with a fresh (local) parameter scope.
    #[must_use]
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self::with_scope(dialect, ParameterScope::new())
    }

    /// Creates a context that continues numbering from an existing scope.
    #[must_use]
    pub fn with_scope(dialect: &'d dyn Dialect, scope: ParameterScope) -> Self {
        Self {
            dialect,
            sql: String::new(),
            modes: vec![RenderMode::Statement],
            scope,
            used: Parameters::new(),
            used_indexes: HashSet::new(),
            statements: 0,
        }
    }

    /// Replaces the initial render mode. The stack never pops below it.
    #[must_use]
    pub fn initial_mode(mut self, mode: RenderMode) -> Self {
        self.modes = vec![mode];
        self
    }

    /// Returns the active dialect.
    #[must_use]
    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    /// Returns the current render mode.
    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.modes
            .last()
            .copied()
            .unwrap_or(RenderMode::Statement)
    }

    /// Returns the depth of the mode stack (1 at top level).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.modes.len()
    }

    /// Returns the text rendered so far.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Enters `mode` until the returned guard is dropped.
    ///
    /// The parent mode is restored on every exit path, including `?`
    /// propagation and unwinding.
    pub fn enter(&mut self, mode: RenderMode) -> ModeGuard<'_, 'd> {
        self.modes.push(mode);
        ModeGuard { ctx: self }
    }

    /// Runs `f` with `mode` pushed, restoring the parent mode afterwards.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns.
    pub fn scoped<F>(&mut self, mode: RenderMode, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let mut guard = self.enter(mode);
        f(&mut *guard)
    }

    /// Renders a child element through this context.
    ///
    /// # Errors
    ///
    /// Propagates the child's render error.
    pub fn render<R: Render + ?Sized>(&mut self, node: &R) -> Result<()> {
        node.render(self)
    }

    /// Renders a list of elements separated by `separator`.
    ///
    /// # Errors
    ///
    /// Propagates the first child render error.
    pub fn render_list<R: Render>(&mut self, items: &[R], separator: &str) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(separator);
            }
            item.render(self)?;
        }
        Ok(())
    }

    /// Appends raw text.
    pub fn write(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    /// Appends a single character.
    pub fn write_char(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Appends an identifier quoted by the dialect.
    pub fn identifier(&mut self, name: &str) {
        let quoted = self.dialect.quote_identifier(name);
        self.sql.push_str(&quoted);
    }

    /// Appends a comma separated list of quoted identifiers.
    pub fn identifier_list<S: AsRef<str>>(&mut self, names: &[S]) {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.identifier(name.as_ref());
        }
    }

    /// Appends an inline literal formatted by the dialect.
    pub fn literal(&mut self, constant: &Constant) {
        let text = constant.format(self.dialect);
        self.sql.push_str(&text);
    }

    /// Returns the stable placeholder name for `value`, creating it on first
    /// sight within the current scope.
    pub fn parameter_name(&mut self, value: &Value) -> String {
        let (parameter, _) = self.scope.intern(value, self.dialect);
        if self.used_indexes.insert(parameter.index) {
            let name = parameter.name.clone();
            self.used.push(parameter);
            name
        } else {
            parameter.name
        }
    }

    /// Appends the placeholder for `value`.
    pub fn parameter(&mut self, value: &Value) {
        let name = self.parameter_name(value);
        self.sql.push_str(&name);
    }

    /// Ends a statement: emits the dialect terminator in
    /// [`RenderMode::Statement`] and nothing otherwise.
    pub fn terminate(&mut self) {
        if self.mode() == RenderMode::Statement {
            self.sql.push_str(self.dialect.statement_terminator());
            self.statements += 1;
        }
    }

    /// Returns the number of statements terminated so far.
    #[must_use]
    pub const fn statement_count(&self) -> usize {
        self.statements
    }

    /// Finishes the pass.
    #[must_use]
    pub fn finish(self) -> RenderedSql {
        self.into_parts().0
    }

    /// Finishes the pass and hands back the parameter scope so numbering can
    /// continue in a later pass.
    #[must_use]
    pub fn into_parts(self) -> (RenderedSql, ParameterScope) {
        (
            RenderedSql {
                sql: self.sql,
                params: self.used,
                statements: self.statements,
            },
            self.scope,
        )
    }

    fn pop_mode(&mut self) {
        if self.modes.len() > 1 {
            self.modes.pop();
        }
    }
}

/// Restores the parent render mode when dropped.
pub struct ModeGuard<'c, 'd> {
    ctx: &'c mut RenderContext<'d>,
}

impl<'d> Deref for ModeGuard<'_, 'd> {
    type Target = RenderContext<'d>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for ModeGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for ModeGuard<'_, '_> {
    fn drop(&mut self) {
        self.ctx.pop_mode();
    }
}

/// Renders a single element with a fresh parameter scope.
///
/// # Errors
///
/// Returns the element's structural error, if any.
pub fn render<R: Render + ?Sized>(node: &R, dialect: &dyn Dialect) -> Result<RenderedSql> {
    let mut ctx = RenderContext::new(dialect);
    ctx.render(node)?;
    Ok(ctx.finish())
}

/// Renders `node` into an existing scope, rolling the scope back when the
/// render fails so no placeholder numbers leak from the failed pass.
pub(crate) fn render_in_scope<R: Render + ?Sized>(
    node: &R,
    dialect: &dyn Dialect,
    scope: &mut ParameterScope,
) -> Result<RenderedSql> {
    let checkpoint = scope.checkpoint();
    let mut ctx = RenderContext::with_scope(dialect, std::mem::take(scope));
    let outcome = ctx.render(node);
    let (rendered, mut returned) = ctx.into_parts();
    if outcome.is_err() {
        returned.rollback(checkpoint);
    }
    *scope = returned;
    outcome.map(|()| rendered)
}
