//! Deferred batch execution.
//!
//! A [`DeferContext`] collects statements and result processors, then runs
//! them all in one executor round trip. Each queued statement hands back a
//! [`Deferred`] handle that resolves once the batch has executed.
//!
//! The batch runs at most once. It is triggered by whichever comes first:
//! an explicit [`DeferContext::flush`], the first read of any handle, or the
//! context going out of scope. Later triggers observe the finished batch and
//! return its outcome without running anything again.
//!
//! Every statement queued into one context draws parameter names from the
//! same counter, so the combined text never binds one name twice.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::Deserialize;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::ast::Statement;
use crate::dialect::{Dialect, TransactionOptions};
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::processor::{self, ResultProcessor};
use crate::render::{render_in_scope, CombineContext, ParameterScope, Render, RenderedSql};
use crate::rows::RowSet;

/// Options for a [`DeferContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct DeferOptions {
    /// Wraps the batch in BEGIN ... COMMIT when set.
    pub transaction: Option<TransactionOptions>,
}

impl DeferOptions {
    /// Wraps the batch in a transaction.
    #[must_use]
    pub const fn transactional(options: TransactionOptions) -> Self {
        Self {
            transaction: Some(options),
        }
    }
}

/// Lifecycle of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    /// Accepting work.
    Idle,
    /// The combined statement is running.
    Executing,
    /// Results have been delivered; the batch is spent.
    Completed,
}

type Dispatch = Box<dyn FnOnce(Result<RowSet>) + Send>;

/// One queued unit: how many statements it rendered and where its result
/// goes. Dropping an entry that was never resolved resolves it as
/// cancelled.
struct Entry {
    statements: usize,
    dispatch: Option<Dispatch>,
}

impl Entry {
    fn new(statements: usize, dispatch: Dispatch) -> Self {
        Self {
            statements,
            dispatch: Some(dispatch),
        }
    }

    fn resolve(mut self, result: Result<RowSet>) {
        if let Some(dispatch) = self.dispatch.take() {
            dispatch(result);
        }
    }
}

impl Drop for Entry {
    fn drop(&mut self) {
        if let Some(dispatch) = self.dispatch.take() {
            dispatch(Err(Error::Cancelled));
        }
    }
}

struct BatchState {
    phase: BatchPhase,
    scope: ParameterScope,
    combined: CombineContext,
    entries: Vec<Entry>,
    user_entries: usize,
    failure: Option<Error>,
}

impl BatchState {
    fn idle() -> Self {
        Self {
            phase: BatchPhase::Idle,
            scope: ParameterScope::new(),
            combined: CombineContext::new(),
            entries: Vec::new(),
            user_entries: 0,
            failure: None,
        }
    }

    fn finish(&mut self, outcome: &Result<()>) {
        self.phase = BatchPhase::Completed;
        if let Err(err) = outcome {
            self.failure = Some(err.clone());
        }
    }

    fn outcome(&self) -> Result<()> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// What a trigger found under the latch.
enum Step {
    /// Nothing to run; return this outcome.
    Done(Result<()>),
    /// Run this work.
    Run(Work),
}

struct Work {
    rendered: RenderedSql,
    entries: Vec<Entry>,
}

/// Holds the latch while the executor runs. A run that is dropped before
/// it completes (a cancelled future, a panicking executor) leaves the batch
/// completed with [`Error::Cancelled`].
struct InFlight<'a> {
    state: MutexGuard<'a, BatchState>,
    completed: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: MutexGuard<'a, BatchState>) -> Self {
        Self {
            state,
            completed: false,
        }
    }

    fn complete(mut self, outcome: &Result<()>) {
        self.state.finish(outcome);
        self.completed = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.state.finish(&Err(Error::Cancelled));
        }
    }
}

struct Batch {
    dialect: Arc<dyn Dialect>,
    executor: Arc<dyn Executor>,
    options: DeferOptions,
    state: Mutex<BatchState>,
}

impl Batch {
    /// Moves an idle batch to executing and hands out its work.
    fn take_work(&self, state: &mut BatchState) -> Step {
        match state.phase {
            BatchPhase::Completed => return Step::Done(state.outcome()),
            // The latch is held for the whole run.
            BatchPhase::Executing => return Step::Done(Err(Error::BatchExecuting)),
            BatchPhase::Idle => {}
        }
        if state.user_entries == 0 {
            state.entries.clear();
            state.phase = BatchPhase::Completed;
            return Step::Done(Ok(()));
        }
        if self.options.transaction.is_some() {
            let commit = append(
                self.dialect.as_ref(),
                state,
                &Statement::Commit,
                Box::new(|_| {}),
            );
            if let Err(err) = commit {
                let outcome = Err(err);
                fail_all(std::mem::take(&mut state.entries), &outcome);
                state.finish(&outcome);
                return Step::Done(outcome);
            }
        }
        state.phase = BatchPhase::Executing;
        let combined = std::mem::take(&mut state.combined);
        Step::Run(Work {
            rendered: combined.finish(),
            entries: std::mem::take(&mut state.entries),
        })
    }

    async fn flush(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let work = match self.take_work(&mut state) {
            Step::Done(outcome) => return outcome,
            Step::Run(work) => work,
        };
        info!(
            dialect = self.dialect.name(),
            statements = work.rendered.statement_count(),
            entries = work.entries.len(),
            "executing deferred batch"
        );
        let running = InFlight::new(state);
        let result = self
            .executor
            .query(work.rendered.sql(), work.rendered.params())
            .await;
        let outcome = dispatch(work, result);
        running.complete(&outcome);
        outcome
    }

    fn flush_blocking(&self) -> Result<()> {
        let mut state = self.state.blocking_lock();
        let work = match self.take_work(&mut state) {
            Step::Done(outcome) => return outcome,
            Step::Run(work) => work,
        };
        info!(
            dialect = self.dialect.name(),
            statements = work.rendered.statement_count(),
            entries = work.entries.len(),
            "executing deferred batch"
        );
        let running = InFlight::new(state);
        let result = self
            .executor
            .query_blocking(work.rendered.sql(), work.rendered.params());
        let outcome = dispatch(work, result);
        running.complete(&outcome);
        outcome
    }
}

/// Renders `statement` into the batch scope and records its dispatch.
fn append<S: Render + ?Sized>(
    dialect: &dyn Dialect,
    state: &mut BatchState,
    statement: &S,
    dispatch: Dispatch,
) -> Result<usize> {
    let checkpoint = state.scope.checkpoint();
    let rendered = render_in_scope(statement, dialect, &mut state.scope)?;
    let statements = rendered.statement_count();
    if statements == 0 {
        state.scope.rollback(checkpoint);
        return Err(Error::InvalidElement {
            clause: "deferred batch",
            reason: String::from("element rendered no terminated statement"),
        });
    }
    if let Err(err) = state.combined.append(&rendered) {
        state.scope.rollback(checkpoint);
        return Err(err);
    }
    state.entries.push(Entry::new(statements, dispatch));
    Ok(statements)
}

fn fail_all(entries: Vec<Entry>, outcome: &Result<()>) {
    if let Err(err) = outcome {
        for entry in entries {
            entry.resolve(Err(err.clone()));
        }
    }
}

/// Zips row-sets against entries in registration order. An entry that
/// rendered `k` statements consumes `k` row-sets and keeps the last one.
fn dispatch(work: Work, result: Result<Vec<RowSet>>) -> Result<()> {
    let expected = work.rendered.statement_count();
    let outcome = match result {
        Ok(sets) if sets.len() == expected => {
            let mut sets = sets.into_iter();
            for entry in work.entries {
                let mut last = None;
                for _ in 0..entry.statements {
                    last = sets.next();
                }
                let rows = last.ok_or(Error::ResultCountMismatch {
                    expected,
                    actual: expected,
                });
                entry.resolve(rows);
            }
            return Ok(());
        }
        Ok(sets) => Err(Error::ResultCountMismatch {
            expected,
            actual: sets.len(),
        }),
        Err(err) => Err(err),
    };
    fail_all(work.entries, &outcome);
    outcome
}

/// Collects statements for one round trip.
///
/// ```rust
/// use std::sync::Arc;
///
/// use oxide_query_core::ast::{col, Select, Value};
/// use oxide_query_core::dialect::GenericDialect;
/// use oxide_query_core::{processor, DeferContext};
/// # use oxide_query_core::{Executor, Parameters, Result, RowSet};
/// # struct Empty;
/// # #[async_trait::async_trait]
/// # impl Executor for Empty {
/// #     async fn execute(&self, _: &str, _: &Parameters) -> Result<u64> { Ok(0) }
/// #     async fn query(&self, sql: &str, _: &Parameters) -> Result<Vec<RowSet>> {
/// #         Ok(sql.matches(';').map(|_| RowSet::empty()).collect())
/// #     }
/// # }
///
/// let batch = DeferContext::new(Arc::new(GenericDialect::new()), Arc::new(Empty));
/// let users = batch
///     .queue(&Select::new().from("users"), processor::rows())
///     .unwrap();
/// let admins = batch
///     .queue(
///         &Select::new().from("admins").where_clause(col("level").gt(Value::new(3))),
///         processor::rows(),
///     )
///     .unwrap();
/// // The first read runs both statements.
/// assert!(users.get().unwrap().is_empty());
/// assert!(admins.is_resolved());
/// ```
pub struct DeferContext {
    batch: Arc<Batch>,
}

impl DeferContext {
    /// Creates an idle context.
    #[must_use]
    pub fn new(dialect: Arc<dyn Dialect>, executor: Arc<dyn Executor>) -> Self {
        Self::build(dialect, executor, DeferOptions::default(), BatchState::idle())
    }

    /// Creates a context with options. A transactional context queues its
    /// BEGIN now and its COMMIT when the batch runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFeature`] when the dialect cannot begin a
    /// transaction with the requested options.
    pub fn with_options(
        dialect: Arc<dyn Dialect>,
        executor: Arc<dyn Executor>,
        options: DeferOptions,
    ) -> Result<Self> {
        let mut state = BatchState::idle();
        if let Some(transaction) = options.transaction {
            let begin = Statement::Begin(transaction);
            append(dialect.as_ref(), &mut state, &begin, Box::new(|_| {}))?;
        }
        Ok(Self::build(dialect, executor, options, state))
    }

    fn build(
        dialect: Arc<dyn Dialect>,
        executor: Arc<dyn Executor>,
        options: DeferOptions,
        state: BatchState,
    ) -> Self {
        Self {
            batch: Arc::new(Batch {
                dialect,
                executor,
                options,
                state: Mutex::new(state),
            }),
        }
    }

    /// Returns the batch's dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.batch.dialect.as_ref()
    }

    /// Renders `statement` into the batch and registers `processor` for its
    /// result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BatchExecuting`] or [`Error::BatchCompleted`] when
    /// the batch is no longer idle, and the statement's structural error if
    /// it fails to render. A failed render leaves the batch unchanged.
    pub fn queue<S, T, P>(&self, statement: &S, processor: P) -> Result<Deferred<T>>
    where
        S: Render + ?Sized,
        T: Send + Sync + 'static,
        P: ResultProcessor<T> + 'static,
    {
        let mut state = self
            .batch
            .state
            .try_lock()
            .map_err(|_| Error::BatchExecuting)?;
        match state.phase {
            BatchPhase::Idle => {}
            BatchPhase::Executing => return Err(Error::BatchExecuting),
            BatchPhase::Completed => return Err(Error::BatchCompleted),
        }
        let slot = Arc::new(OnceLock::new());
        let target = Arc::clone(&slot);
        let processor = Box::new(processor);
        let dispatch: Dispatch = Box::new(move |result: Result<RowSet>| {
            // The slot is only ever set here, once.
            let _ = target.set(result.and_then(|rows| processor.process(rows)));
        });
        let statements = append(self.batch.dialect.as_ref(), &mut state, statement, dispatch)?;
        state.user_entries += 1;
        debug!(
            statements,
            queued = state.user_entries,
            params = state.combined.params().len(),
            "queued deferred statement"
        );
        Ok(Deferred {
            slot,
            batch: Arc::clone(&self.batch),
        })
    }

    /// Queues `statement` and resolves to the number of rows it changed.
    ///
    /// # Errors
    ///
    /// As for [`DeferContext::queue`].
    pub fn queue_execute<S: Render + ?Sized>(&self, statement: &S) -> Result<Deferred<u64>> {
        self.queue(statement, processor::rows_affected())
    }

    /// Returns the batch phase. A batch whose latch is held reports
    /// [`BatchPhase::Executing`].
    #[must_use]
    pub fn phase(&self) -> BatchPhase {
        self.batch
            .state
            .try_lock()
            .map_or(BatchPhase::Executing, |state| state.phase)
    }

    /// Returns the number of statements queued by callers and not yet run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.batch.state.try_lock().map_or(0, |state| {
            if state.phase == BatchPhase::Idle {
                state.user_entries
            } else {
                0
            }
        })
    }

    /// Runs the batch if it has not run yet.
    ///
    /// # Errors
    ///
    /// Returns the batch-level failure (executor error, result count
    /// mismatch, cancellation), also for a batch that already ran.
    pub async fn flush(&self) -> Result<()> {
        self.batch.flush().await
    }

    /// Blocking form of [`DeferContext::flush`].
    ///
    /// Must not be called from inside an async runtime.
    ///
    /// # Errors
    ///
    /// As for [`DeferContext::flush`].
    pub fn flush_blocking(&self) -> Result<()> {
        self.batch.flush_blocking()
    }

    /// Runs any pending work and ends the context.
    ///
    /// # Errors
    ///
    /// As for [`DeferContext::flush`].
    pub async fn close(self) -> Result<()> {
        self.flush().await
    }

    /// Blocking form of [`DeferContext::close`].
    ///
    /// # Errors
    ///
    /// As for [`DeferContext::flush`].
    pub fn close_blocking(self) -> Result<()> {
        self.flush_blocking()
    }
}

impl Drop for DeferContext {
    fn drop(&mut self) {
        let pending = self
            .batch
            .state
            .try_lock()
            .is_ok_and(|state| state.phase == BatchPhase::Idle && state.user_entries > 0);
        if !pending {
            return;
        }
        let batch = Arc::clone(&self.batch);
        if let Ok(handle) = Handle::try_current() {
            warn!("deferred batch dropped with pending work, spawning execution");
            handle.spawn(async move {
                if let Err(err) = batch.flush().await {
                    warn!(error = %err, "forced deferred batch failed");
                }
            });
        } else {
            warn!("deferred batch dropped with pending work, executing now");
            if let Err(err) = batch.flush_blocking() {
                warn!(error = %err, "forced deferred batch failed");
            }
        }
    }
}

impl fmt::Debug for DeferContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferContext")
            .field("dialect", &self.batch.dialect.name())
            .field("phase", &self.phase())
            .field("pending", &self.pending())
            .finish()
    }
}

/// A forward reference to the result of a queued statement.
///
/// Reading the handle runs the batch if it has not run yet. All clones and
/// all readers observe the same value.
pub struct Deferred<T> {
    slot: Arc<OnceLock<Result<T>>>,
    batch: Arc<Batch>,
}

impl<T> Deferred<T> {
    /// Returns whether the result has been delivered.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.slot.get().is_some()
    }

    fn read(&self, trigger: Result<()>) -> Result<&T> {
        match self.slot.get() {
            Some(Ok(value)) => Ok(value),
            Some(Err(err)) => Err(err.clone()),
            None => Err(trigger.err().unwrap_or(Error::Cancelled)),
        }
    }

    /// Waits for the result, running the batch if needed.
    ///
    /// # Errors
    ///
    /// Returns the error delivered to this handle: a processor failure, or
    /// the batch-level failure.
    pub async fn resolve(&self) -> Result<&T> {
        if self.is_resolved() {
            return self.read(Ok(()));
        }
        let trigger = self.batch.flush().await;
        self.read(trigger)
    }

    /// Blocking form of [`Deferred::resolve`].
    ///
    /// Must not be called from inside an async runtime unless the handle is
    /// already resolved.
    ///
    /// # Errors
    ///
    /// As for [`Deferred::resolve`].
    pub fn get(&self) -> Result<&T> {
        if self.is_resolved() {
            return self.read(Ok(()));
        }
        let trigger = self.batch.flush_blocking();
        self.read(trigger)
    }
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            batch: Arc::clone(&self.batch),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("result", &self.slot.get())
            .finish()
    }
}
