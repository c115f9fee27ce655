//! Per-call database context.
//!
//! A [`DbContext`] bundles an optional cancellation token, an optional
//! deadline and an optional borrowed transaction. Repositories never store
//! it; it is passed into every call. When the transaction slot is filled the
//! statements run inside it, otherwise a connection is borrowed from the pool
//! for the duration of the call.
//!
//! Transactions are composed by the caller:
//!
//! ```ignore
//! let mut conn = pool.get()?;
//! let tx = conn.transaction()?;
//! let ctx = DbContext::background().with_tx(&tx);
//! store.courses.create(&ctx, &mut courses)?;
//! store.modules.create(&ctx, &mut modules)?;
//! tx.commit()?;
//! ```
//!
//! or through [`transact`], which commits on `Ok` and rolls back on `Err`.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use tokio_util::sync::CancellationToken;

use super::connection::ConnectionPool;
use crate::errors::{Result, StoreError};

/// Virtual-machine instructions between cancellation polls.
const PROGRESS_POLL_OPS: i32 = 1_000;

/// Cancellation, deadline and transaction scope for one repository call.
#[derive(Clone, Default)]
pub struct DbContext<'a> {
    cancel: Option<CancellationToken>,
    deadline: Option<Instant>,
    tx: Option<&'a Transaction<'a>>,
}

impl<'a> DbContext<'a> {
    /// A context with no token, no deadline and no transaction.
    pub fn background() -> Self {
        Self::default()
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Attach an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that runs inside `tx`, keeping the token and deadline.
    pub fn with_tx<'t>(&self, tx: &'t Transaction<'t>) -> DbContext<'t> {
        DbContext {
            cancel: self.cancel.clone(),
            deadline: self.deadline,
            tx: Some(tx),
        }
    }

    /// The caller's transaction, if any.
    pub fn tx(&self) -> Option<&'a Transaction<'a>> {
        self.tx
    }

    /// Whether statements run inside a caller-owned transaction.
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// The attached cancellation token, if any.
    pub fn cancel_token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// The attached deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast if the token was cancelled or the deadline passed.
    pub fn check(&self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(StoreError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(StoreError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Run `f` on the caller's transaction, or on a pooled connection when the
    /// slot is empty. The token and deadline are polled while `f` executes.
    pub(crate) fn run<T>(
        &self,
        pool: &ConnectionPool,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        self.check()?;
        match self.tx {
            Some(tx) => self.interruptible(tx, f),
            None => {
                let conn = pool.get()?;
                self.interruptible(&conn, f)
            }
        }
    }

    fn interruptible<T>(
        &self,
        conn: &Connection,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        if self.cancel.is_none() && self.deadline.is_none() {
            return f(conn);
        }
        let _guard = InterruptGuard::install(conn, self.cancel.clone(), self.deadline);
        f(conn).map_err(|e| self.classify(e))
    }

    /// Report an interrupted statement as the reason it was interrupted.
    fn classify(&self, err: StoreError) -> StoreError {
        let interrupted = matches!(
            &err,
            StoreError::Sqlite(e) if e.sqlite_error_code() == Some(ErrorCode::OperationInterrupted)
        );
        if interrupted {
            self.check().err().unwrap_or(err)
        } else {
            err
        }
    }
}

impl fmt::Debug for DbContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbContext")
            .field("cancelled", &self.cancel.as_ref().map(CancellationToken::is_cancelled))
            .field("deadline", &self.deadline)
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}

fn is_tripped(token: &AssertUnwindSafe<Option<CancellationToken>>, deadline: Option<Instant>) -> bool {
    token.as_ref().is_some_and(CancellationToken::is_cancelled)
        || deadline.is_some_and(|d| Instant::now() >= d)
}

/// Progress handler installed for the lifetime of one call.
struct InterruptGuard<'c> {
    conn: &'c Connection,
}

impl<'c> InterruptGuard<'c> {
    fn install(
        conn: &'c Connection,
        token: Option<CancellationToken>,
        deadline: Option<Instant>,
    ) -> Self {
        let token = AssertUnwindSafe(token);
        conn.progress_handler(
            PROGRESS_POLL_OPS,
            Some(move || is_tripped(&token, deadline)),
        );
        Self { conn }
    }
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        self.conn.progress_handler(0, None::<fn() -> bool>);
    }
}

/// Run `f` inside a transaction.
///
/// If `ctx` already carries a transaction, `f` joins it and the outer owner
/// decides the outcome. Otherwise a connection is taken from `pool`, an
/// immediate transaction is opened, `f` runs with a context scoped to it, and
/// the transaction commits on `Ok` or rolls back on `Err`.
pub fn transact<T, F>(pool: &ConnectionPool, ctx: &DbContext<'_>, f: F) -> Result<T>
where
    F: FnOnce(&DbContext<'_>) -> Result<T>,
{
    if ctx.in_transaction() {
        return f(ctx);
    }
    ctx.check()?;

    let conn = pool.get()?;
    let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)?;
    let scoped = ctx.with_tx(&tx);
    let out = f(&scoped)?;
    drop(scoped);
    tx.commit()?;
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
