#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use oxide_query_core::dialect::{Dialect, GenericDialect};
use oxide_query_core::render::render;
use oxide_query_core::{Error, Executor, Parameters, Render, Result, RowSet, SqlValue};

pub fn sql<R: Render + ?Sized>(node: &R) -> String {
    sql_with(node, &GenericDialect::new())
}

pub fn sql_with<R: Render + ?Sized>(node: &R, dialect: &dyn Dialect) -> String {
    render(node, dialect)
        .unwrap_or_else(|e| panic!("Failed to render: {e}"))
        .sql()
        .to_string()
}

pub fn render_err<R: Render + ?Sized>(node: &R, dialect: &dyn Dialect) -> Error {
    match render(node, dialect) {
        Ok(rendered) => panic!("Expected render error, got: {}", rendered.sql()),
        Err(e) => e,
    }
}

#[derive(Debug, thiserror::Error)]
#[error("scripted failure: {0}")]
pub struct ScriptedFailure(pub String);

/// What the executor answers with.
#[derive(Debug, Clone)]
pub enum Script {
    /// One row-set per terminated statement, holding the statement's
    /// ordinal and text.
    Echo,
    /// Exactly these row-sets.
    Fixed(Vec<RowSet>),
    /// A failure.
    Fail(String),
}

/// An in-memory executor that records every call.
pub struct ScriptedExecutor {
    script: Script,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, Parameters)>>,
}

impl ScriptedExecutor {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn echo() -> Self {
        Self::new(Script::Echo)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_sql(&self) -> String {
        self.seen
            .lock()
            .unwrap()
            .last()
            .map(|(sql, _)| sql.clone())
            .unwrap_or_default()
    }

    pub fn last_params(&self) -> Parameters {
        self.seen
            .lock()
            .unwrap()
            .last()
            .map(|(_, params)| params.clone())
            .unwrap_or_default()
    }

    fn answer(&self, sql: &str, params: &Parameters) -> Result<Vec<RowSet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((sql.to_string(), params.clone()));
        match &self.script {
            Script::Echo => echo(sql),
            Script::Fixed(sets) => Ok(sets.clone()),
            Script::Fail(message) => Err(Error::executor(ScriptedFailure(message.clone()))),
        }
    }
}

fn echo(sql: &str) -> Result<Vec<RowSet>> {
    let statements: Vec<&str> = sql.split_terminator(';').map(str::trim).collect();
    let mut sets = Vec::new();
    for (i, statement) in statements.into_iter().enumerate() {
        let ordinal = i as i64 + 1;
        let mut set = RowSet::new(["ordinal", "sql"]).with_rows_affected(ordinal as u64);
        set.push_row(vec![SqlValue::Int(ordinal), SqlValue::Text(statement.to_string())])?;
        sets.push(set);
    }
    Ok(sets)
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, sql: &str, params: &Parameters) -> Result<u64> {
        let sets = self.query(sql, params).await?;
        Ok(sets.iter().map(RowSet::rows_affected).sum())
    }

    async fn query(&self, sql: &str, params: &Parameters) -> Result<Vec<RowSet>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer(sql, params)
    }
}
