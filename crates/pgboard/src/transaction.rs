//! Logical transaction coordination.
//!
//! A [`TransactionRegistry`] tracks which logical transactions are open and
//! enforces their lifecycle: begin hands out a [`TransactionHandle`],
//! commit and rollback finish it exactly once, and anything touching an
//! unknown or finished transaction fails with a transaction error. The
//! registry does not own database connections; callers pair it with an
//! [`Executor`](crate::Executor) (usually a driver transaction) that does
//! the actual work.
//!
//! Savepoints follow the registry's [`SavepointMode`]: in `Bookkeeping`
//! mode they are tracked without touching the database, in `Execute` mode
//! they also run real `SAVEPOINT` statements through the executor.
//!
//! # Example
//!
//! ```ignore
//! use pgboard::{DbError, TransactionRegistry};
//!
//! # async fn demo() -> pgboard::DbResult<()> {
//! let registry = TransactionRegistry::new();
//!
//! let total = registry
//!     .with_transaction(|handle| async move {
//!         // run statements, passing handle.id() along for audit trails
//!         Ok::<_, DbError>(42)
//!     })
//!     .await?;
//! # Ok(()) }
//! ```

use crate::client::Executor;
use crate::error::{DbError, DbResult};
use crate::retry::safe_execute;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Identity of one logical transaction.
///
/// Clones share the active flag, so when the registry finishes the
/// transaction every clone observes `is_active() == false`.
#[derive(Debug, Clone)]
pub struct TransactionHandle {
    id: String,
    active: Arc<AtomicBool>,
}

impl TransactionHandle {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Unique id of this transaction, a v4 UUID in string form.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

/// How savepoint operations behave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SavepointMode {
    /// Track savepoints in the registry without touching the database.
    #[default]
    Bookkeeping,
    /// Additionally run real `SAVEPOINT` / `RELEASE SAVEPOINT` /
    /// `ROLLBACK TO SAVEPOINT` statements through the executor.
    Execute,
}

/// A named savepoint inside one logical transaction.
///
/// Created via [`TransactionRegistry::savepoint`] and finished by passing
/// it back to [`TransactionRegistry::release_savepoint`] or
/// [`TransactionRegistry::rollback_savepoint`]. A savepoint is only valid
/// while its owning transaction is still active.
#[derive(Debug)]
pub struct Savepoint {
    name: String,
    owner: String,
    finished: bool,
}

impl Savepoint {
    /// Returns the savepoint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the owning transaction.
    pub fn owner_id(&self) -> &str {
        &self.owner
    }

    /// Whether release or rollback has been attempted.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for Savepoint {
    fn drop(&mut self) {
        if !self.finished {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                "Savepoint '{}' dropped without explicit release or rollback",
                self.name,
            );
        }
    }
}

/// One operation in a [`TransactionRegistry::transaction_batch`] call.
pub type BatchOperation<T> = Box<
    dyn FnOnce(TransactionHandle) -> Pin<Box<dyn Future<Output = DbResult<T>> + Send>> + Send,
>;

/// Box a closure into a [`BatchOperation`].
pub fn batch_op<T, F, Fut>(f: F) -> BatchOperation<T>
where
    F: FnOnce(TransactionHandle) -> Fut + Send + 'static,
    Fut: Future<Output = DbResult<T>> + Send + 'static,
{
    Box::new(move |handle| Box::pin(f(handle)))
}

/// Registry of open logical transactions.
///
/// The map of active handles is the ground truth: handles themselves are
/// cheap clones and may outlive their transaction, but a transaction can
/// only be finished while it is registered here, and only once.
#[derive(Debug, Default)]
pub struct TransactionRegistry {
    active: Mutex<HashMap<String, TransactionHandle>>,
    savepoint_mode: SavepointMode,
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the given savepoint behavior.
    pub fn with_savepoint_mode(mode: SavepointMode) -> Self {
        Self {
            active: Mutex::new(HashMap::new()),
            savepoint_mode: mode,
        }
    }

    pub fn savepoint_mode(&self) -> SavepointMode {
        self.savepoint_mode
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TransactionHandle>> {
        self.active.lock().expect("transaction registry poisoned")
    }

    /// Start a logical transaction and register its handle.
    pub fn begin(&self) -> TransactionHandle {
        let handle = TransactionHandle::new();
        self.lock().insert(handle.id.clone(), handle.clone());
        #[cfg(feature = "tracing")]
        tracing::debug!(id = %handle.id, "transaction started");
        handle
    }

    /// Commit the transaction with the given id.
    ///
    /// Fails with a transaction error when the id is unknown or the
    /// transaction was already finished.
    pub fn commit(&self, id: &str) -> DbResult<()> {
        self.finish(id, "commit")
    }

    /// Roll back the transaction with the given id.
    ///
    /// Same lifecycle rules as [`TransactionRegistry::commit`].
    pub fn rollback(&self, id: &str) -> DbResult<()> {
        self.finish(id, "rollback")
    }

    fn finish(&self, id: &str, action: &str) -> DbResult<()> {
        let mut active = self.lock();
        let Some(handle) = active.get(id) else {
            return Err(DbError::transaction(format!(
                "cannot {action} unknown transaction {id}"
            )));
        };
        if !handle.is_active() {
            return Err(DbError::transaction(format!(
                "cannot {action} finished transaction {id}"
            )));
        }
        handle.deactivate();
        active.remove(id);
        #[cfg(feature = "tracing")]
        tracing::debug!(id, action, "transaction finished");
        Ok(())
    }

    /// Whether a transaction with this id is currently open.
    pub fn is_active(&self, id: &str) -> bool {
        self.lock().get(id).is_some_and(TransactionHandle::is_active)
    }

    /// Number of currently open transactions.
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    fn require_active(&self, id: &str) -> DbResult<()> {
        if self.is_active(id) {
            Ok(())
        } else {
            Err(DbError::transaction(format!(
                "transaction {id} is not active"
            )))
        }
    }

    /// Run `callback` inside a fresh logical transaction.
    ///
    /// Commits when the callback returns `Ok`, rolls back and rethrows the
    /// classified error when it returns `Err`. A rollback failure is folded
    /// into the returned error rather than replacing it.
    pub async fn with_transaction<T, E, F, Fut>(&self, callback: F) -> DbResult<T>
    where
        F: FnOnce(TransactionHandle) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<DbError>,
    {
        let handle = self.begin();
        let id = handle.id.clone();
        match safe_execute(callback(handle)).await {
            Ok(value) => {
                self.commit(&id)?;
                Ok(value)
            }
            Err(error) => match self.rollback(&id) {
                Ok(()) => Err(error),
                Err(rollback_err) => Err(DbError::transaction(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }

    /// Create a named savepoint inside an active transaction.
    ///
    /// In [`SavepointMode::Execute`] this also runs `SAVEPOINT name`
    /// through the executor; in `Bookkeeping` mode the executor is left
    /// untouched.
    pub async fn savepoint<X>(
        &self,
        exec: &X,
        handle: &TransactionHandle,
        name: &str,
    ) -> DbResult<Savepoint>
    where
        X: Executor,
    {
        let quoted = quote_ident(name)?;
        self.require_active(handle.id())?;
        if self.savepoint_mode == SavepointMode::Execute {
            exec.query(&format!("SAVEPOINT {quoted}"), &[]).await?;
        }
        Ok(Savepoint {
            name: name.to_string(),
            owner: handle.id().to_string(),
            finished: false,
        })
    }

    /// Release a savepoint, keeping its effects.
    ///
    /// Equivalent to `RELEASE SAVEPOINT name` in execute mode. Fails when
    /// the owning transaction is no longer active.
    pub async fn release_savepoint<X>(&self, exec: &X, mut savepoint: Savepoint) -> DbResult<()>
    where
        X: Executor,
    {
        savepoint.finished = true;
        self.require_active(&savepoint.owner)?;
        if self.savepoint_mode == SavepointMode::Execute {
            let quoted = quote_ident(&savepoint.name)?;
            exec.query(&format!("RELEASE SAVEPOINT {quoted}"), &[])
                .await?;
        }
        Ok(())
    }

    /// Roll back to a savepoint, undoing everything since it.
    ///
    /// Equivalent to `ROLLBACK TO SAVEPOINT name` in execute mode. The
    /// owning transaction stays active either way.
    pub async fn rollback_savepoint<X>(&self, exec: &X, mut savepoint: Savepoint) -> DbResult<()>
    where
        X: Executor,
    {
        savepoint.finished = true;
        self.require_active(&savepoint.owner)?;
        if self.savepoint_mode == SavepointMode::Execute {
            let quoted = quote_ident(&savepoint.name)?;
            exec.query(&format!("ROLLBACK TO SAVEPOINT {quoted}"), &[])
                .await?;
        }
        Ok(())
    }

    /// Run `callback` guarded by a savepoint.
    ///
    /// Releases the savepoint when the callback returns `Ok`, rolls back
    /// to it and rethrows when it returns `Err`. Either way the owning
    /// transaction continues.
    pub async fn with_savepoint<T, X, E, F, Fut>(
        &self,
        exec: &X,
        handle: &TransactionHandle,
        name: &str,
        callback: F,
    ) -> DbResult<T>
    where
        X: Executor,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<DbError>,
    {
        let savepoint = self.savepoint(exec, handle, name).await?;
        match safe_execute(callback()).await {
            Ok(value) => {
                self.release_savepoint(exec, savepoint).await?;
                Ok(value)
            }
            Err(error) => match self.rollback_savepoint(exec, savepoint).await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err(DbError::transaction(format!(
                    "{error} (savepoint rollback failed: {rollback_err})"
                ))),
            },
        }
    }

    /// Run a list of operations sequentially inside one transaction.
    ///
    /// Results are collected in operation order. The first failure aborts
    /// the batch through the enclosing transaction's rollback and is
    /// rethrown.
    pub async fn transaction_batch<T>(
        &self,
        operations: Vec<BatchOperation<T>>,
    ) -> DbResult<Vec<T>> {
        self.with_transaction(|handle| async move {
            let mut results = Vec::with_capacity(operations.len());
            for operation in operations {
                results.push(operation(handle.clone()).await?);
            }
            Ok::<_, DbError>(results)
        })
        .await
    }
}

fn quote_ident(input: &str) -> DbResult<String> {
    if input.trim().is_empty() {
        return Err(DbError::validation("savepoint name cannot be empty"));
    }
    if input.as_bytes().contains(&0) {
        return Err(DbError::validation("savepoint name cannot contain NUL byte"));
    }
    Ok(format!("\"{}\"", input.replace('"', "\"\"")))
}
