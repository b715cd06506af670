//! Shared remote leaderboard table.
//!
//! The remote side is a key-value table `identity key -> score` with two
//! capabilities: a conditional write that only ever raises a value, and a
//! subscription that yields the whole table every time any writer changes it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedSender};
use futures::future::{self, LocalBoxFuture};
use futures::stream::{self, LocalBoxStream, StreamExt};

use crate::error::RemoteError;

/// Whole-table snapshot, keyed by sanitized identity key.
pub type ScoreTable = BTreeMap<String, u64>;

pub trait RemoteTable {
    /// Replace the value at `key` with `score` only if the current value is
    /// absent or strictly smaller. Resolves to whether the write was applied.
    fn update_if_greater(&self, key: &str, score: u64) -> LocalBoxFuture<'static, Result<bool, RemoteError>>;

    /// Lazy sequence of table snapshots. The first item is the current table.
    fn subscribe(&self) -> LocalBoxStream<'static, ScoreTable>;
}

#[derive(Default)]
struct SharedInner {
    table: ScoreTable,
    subscribers: Vec<UnboundedSender<ScoreTable>>,
    offline: bool,
}

impl SharedInner {
    fn broadcast(&mut self) {
        let snapshot = self.table.clone();
        self.subscribers
            .retain(|tx| tx.unbounded_send(snapshot.clone()).is_ok());
    }
}

/// In-process shared table. Clones are handles to the same table, so each
/// clone can stand in for a different device.
#[derive(Clone, Default)]
pub struct SharedTable {
    inner: Rc<RefCell<SharedInner>>,
}

impl SharedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the store becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.inner.borrow_mut().offline = offline;
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.inner.borrow().table.get(key).copied()
    }

    fn apply_if_greater(&self, key: &str, score: u64) -> Result<bool, RemoteError> {
        let mut inner = self.inner.borrow_mut();
        if inner.offline {
            return Err(RemoteError::Unavailable);
        }
        let current = inner.table.get(key).copied();
        let applied = match current {
            Some(current) if current >= score => false,
            _ => {
                inner.table.insert(key.to_string(), score);
                true
            }
        };
        if applied {
            inner.broadcast();
        }
        Ok(applied)
    }
}

impl RemoteTable for SharedTable {
    fn update_if_greater(&self, key: &str, score: u64) -> LocalBoxFuture<'static, Result<bool, RemoteError>> {
        Box::pin(future::ready(self.apply_if_greater(key, score)))
    }

    fn subscribe(&self) -> LocalBoxStream<'static, ScoreTable> {
        let mut inner = self.inner.borrow_mut();
        if inner.offline {
            return stream::empty().boxed_local();
        }
        let (tx, rx) = mpsc::unbounded();
        if tx.unbounded_send(inner.table.clone()).is_ok() {
            inner.subscribers.push(tx);
        }
        rx.boxed_local()
    }
}
