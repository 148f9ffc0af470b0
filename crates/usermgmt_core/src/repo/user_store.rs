//! User store with insertion-ordered listing.
//!
//! # Responsibility
//! - Provide add/remove/get/list/count over validated users.
//! - Apply pre-validated bulk batches atomically for the loader.
//!
//! # Invariants
//! - Ids are unique.
//! - Listing order is first-admission order; overwriting keeps the position.
//! - Every mutation runs under one write guard, so observers never see a
//!   partially applied change.
//! - Lock acquisition is bounded by `lock_timeout`.

use crate::model::user::{User, UserId};
use crate::model::validation::{validate_record, ValidationErrors};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Default bound for acquiring the store lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    ValidationFailed(#[from] ValidationErrors),
    #[error("user with id {0} already exists")]
    DuplicateId(UserId),
    #[error("user with id {0} not found")]
    NotFound(UserId),
    /// The lock could not be acquired in time; likely a deadlock.
    #[error("store lock not acquired within {0:?}")]
    LockTimeout(Duration),
}

/// Result of applying one record from a bulk batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted,
    Overwritten,
}

#[derive(Default)]
struct StoreState {
    next_seq: u64,
    by_seq: BTreeMap<u64, User>,
    seq_of: HashMap<UserId, u64>,
}

impl StoreState {
    fn insert_new(&mut self, user: User) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let previous_seq = self.seq_of.insert(user.id(), seq);
        assert!(
            previous_seq.is_none(),
            "store invariant broken: id {} inserted twice",
            user.id()
        );
        self.by_seq.insert(seq, user);
    }

    fn upsert(&mut self, user: User) -> Applied {
        match self.seq_of.get(&user.id()) {
            Some(seq) => {
                self.by_seq.insert(*seq, user);
                Applied::Overwritten
            }
            None => {
                self.insert_new(user);
                Applied::Inserted
            }
        }
    }

    fn remove(&mut self, id: UserId) -> Option<User> {
        let seq = self.seq_of.remove(&id)?;
        self.by_seq.remove(&seq)
    }

    fn get(&self, id: UserId) -> Option<&User> {
        self.seq_of.get(&id).and_then(|seq| self.by_seq.get(seq))
    }

    fn clear(&mut self) -> usize {
        let dropped = self.by_seq.len();
        self.by_seq.clear();
        self.seq_of.clear();
        dropped
    }

    fn check_invariants(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        assert_eq!(
            self.by_seq.len(),
            self.seq_of.len(),
            "store invariant broken: index and ordered map disagree"
        );
        for (id, seq) in &self.seq_of {
            let stored = self.by_seq.get(seq).map(User::id);
            assert_eq!(
                stored,
                Some(*id),
                "store invariant broken: id {id} indexes a foreign slot"
            );
        }
    }
}

/// Thread-safe in-memory user store.
pub struct UserStore {
    state: RwLock<StoreState>,
    lock_timeout: Duration,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    /// Creates an empty store using `DEFAULT_LOCK_TIMEOUT`.
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            lock_timeout,
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Validates and inserts one candidate record.
    ///
    /// Never overwrites: an existing id fails with `DuplicateId`. On any error
    /// the store is unchanged.
    pub fn add(&self, candidate: &Value) -> StoreResult<User> {
        let user = validate_record(candidate)?;
        self.add_user(user)
    }

    /// Inserts an already validated user.
    pub fn add_user(&self, user: User) -> StoreResult<User> {
        let mut state = self.write()?;
        if state.seq_of.contains_key(&user.id()) {
            return Err(StoreError::DuplicateId(user.id()));
        }
        state.insert_new(user.clone());
        state.check_invariants();
        Ok(user)
    }

    /// Removes one user and returns it.
    pub fn remove(&self, id: UserId) -> StoreResult<User> {
        let mut state = self.write()?;
        let removed = state.remove(id).ok_or(StoreError::NotFound(id))?;
        state.check_invariants();
        Ok(removed)
    }

    pub fn get(&self, id: UserId) -> StoreResult<User> {
        self.read()?.get(id).cloned().ok_or(StoreError::NotFound(id))
    }

    /// Returns a fresh snapshot of all users in insertion order.
    pub fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.read()?.by_seq.values().cloned().collect())
    }

    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.read()?.by_seq.len())
    }

    /// Drops every user and returns how many were removed.
    pub fn clear(&self) -> StoreResult<usize> {
        let mut state = self.write()?;
        let dropped = state.clear();
        state.check_invariants();
        Ok(dropped)
    }

    /// Applies validated users in order under one write guard.
    ///
    /// Existing ids are overwritten in place; new ids are appended. With
    /// `clear_first` the store is emptied inside the same critical section.
    pub(crate) fn apply_batch(
        &self,
        users: Vec<User>,
        clear_first: bool,
    ) -> StoreResult<Vec<Applied>> {
        let mut state = self.write()?;
        if clear_first {
            state.clear();
        }
        let outcomes = users.into_iter().map(|user| state.upsert(user)).collect();
        state.check_invariants();
        Ok(outcomes)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .try_read_for(self.lock_timeout)
            .ok_or(StoreError::LockTimeout(self.lock_timeout))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .try_write_for(self.lock_timeout)
            .ok_or(StoreError::LockTimeout(self.lock_timeout))
    }
}
