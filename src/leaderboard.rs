//! Per-identity high scores, kept in local storage and optionally mirrored to
//! a shared remote table.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::stream::LocalBoxStream;

use crate::error::StorageError;
use crate::identity::{Identity, IdentityPrompt, IdentityResolver};
use crate::remote::{RemoteTable, ScoreTable};
use crate::storage::{KEY_LEADERBOARD, SharedStore};

/// Runs a detached future on the page's executor.
pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub identity: Identity,
    pub score: u64,
    /// Row belongs to this session's identity.
    pub is_current: bool,
}

impl LeaderboardRow {
    /// Medal for the given zero-based rank, empty past the podium.
    pub fn medal(rank: usize) -> &'static str {
        MEDALS.get(rank).copied().unwrap_or("")
    }
}

struct RemoteSync {
    table: Rc<dyn RemoteTable>,
    available: Rc<Cell<bool>>,
    spawn: Spawner,
}

pub struct LeaderboardStore {
    local: SharedStore,
    identity: IdentityResolver,
    prompt: Box<dyn IdentityPrompt>,
    scores: HashMap<Identity, u64>,
    remote: Option<RemoteSync>,
}

fn decode_local(raw: &str) -> Option<HashMap<Identity, u64>> {
    let map: BTreeMap<String, u64> = serde_json::from_str(raw).ok()?;
    Some(
        map.into_iter()
            .filter_map(|(label, score)| Identity::from_label(&label).map(|id| (id, score)))
            .collect(),
    )
}

impl LeaderboardStore {
    /// Load scores saved by a previous session. Missing or corrupt data starts
    /// everyone at zero.
    pub fn load(local: SharedStore, identity: IdentityResolver, prompt: Box<dyn IdentityPrompt>) -> Self {
        let scores = match local.get(KEY_LEADERBOARD) {
            Some(raw) => decode_local(&raw).unwrap_or_else(|| {
                log::warn!("stored leaderboard unreadable, starting fresh");
                HashMap::new()
            }),
            None => HashMap::new(),
        };
        Self { local, identity, prompt, scores, remote: None }
    }

    /// Mirror future high scores to `table`. Writes are handed to `spawn` and
    /// never awaited by the caller.
    pub fn attach_remote(&mut self, table: Rc<dyn RemoteTable>, spawn: Spawner) {
        self.remote = Some(RemoteSync { table, available: Rc::new(Cell::new(true)), spawn });
    }

    /// Remote is attached and has not failed yet this session.
    pub fn remote_available(&self) -> bool {
        self.remote.as_ref().is_some_and(|r| r.available.get())
    }

    /// Snapshot stream from the remote, if one is attached and healthy.
    pub fn remote_updates(&self) -> Option<LocalBoxStream<'static, ScoreTable>> {
        let remote = self.remote.as_ref().filter(|r| r.available.get())?;
        Some(remote.table.subscribe())
    }

    pub fn current_identity(&mut self) -> Identity {
        self.identity.resolve(self.prompt.as_ref())
    }

    pub fn identity_resolver(&mut self) -> &mut IdentityResolver {
        &mut self.identity
    }

    pub fn score_of(&self, identity: Identity) -> u64 {
        self.scores.get(&identity).copied().unwrap_or(0)
    }

    /// Record `new_score` for the current identity if it beats the stored one.
    /// Returns whether the local score went up. A failed local write leaves the
    /// score unchanged and is returned as an error.
    pub fn update_score(&mut self, new_score: u64) -> Result<bool, StorageError> {
        let identity = self.current_identity();
        let previous = self.score_of(identity);
        if new_score <= previous {
            return Ok(false);
        }
        self.scores.insert(identity, new_score);
        if let Err(err) = self.save() {
            self.scores.insert(identity, previous);
            return Err(err);
        }
        log::info!("new high score for {}: {new_score}", identity.label());
        self.propagate(identity, new_score);
        Ok(true)
    }

    fn propagate(&self, identity: Identity, score: u64) {
        let Some(remote) = self.remote.as_ref() else {
            return;
        };
        if !remote.available.get() {
            return;
        }
        let key = identity.remote_key();
        let pending = remote.table.update_if_greater(&key, score);
        let available = remote.available.clone();
        let task: LocalBoxFuture<'static, ()> = Box::pin(async move {
            match pending.await {
                Ok(true) => log::debug!("remote score for {key} raised to {score}"),
                Ok(false) => log::debug!("remote score for {key} already >= {score}"),
                Err(err) => {
                    log::warn!("remote leaderboard unavailable, staying local: {err}");
                    available.set(false);
                }
            }
        });
        (remote.spawn)(task);
    }

    /// Replace every score with the remote snapshot and persist it. Identities
    /// missing from the snapshot drop to zero; unknown keys are ignored.
    /// Once the remote has failed this session snapshots are dropped and
    /// `false` is returned.
    pub fn apply_remote(&mut self, table: &ScoreTable) -> bool {
        if !self.remote_available() {
            log::debug!("ignoring remote snapshot, leaderboard is local-only");
            return false;
        }
        self.scores = Identity::ALL
            .into_iter()
            .map(|id| (id, table.get(&id.remote_key()).copied().unwrap_or(0)))
            .collect();
        if let Err(err) = self.save() {
            log::error!("could not persist remote leaderboard: {err}");
        }
        true
    }

    /// All identities, highest score first; ties keep the fixed identity order.
    pub fn snapshot(&mut self) -> Vec<LeaderboardRow> {
        let current = self.identity.known();
        let mut rows: Vec<LeaderboardRow> = Identity::ALL
            .into_iter()
            .map(|id| LeaderboardRow { identity: id, score: self.score_of(id), is_current: current == Some(id) })
            .collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score));
        rows
    }

    fn save(&self) -> Result<(), StorageError> {
        let map: BTreeMap<&str, u64> =
            Identity::ALL.into_iter().map(|id| (id.label(), self.score_of(id))).collect();
        let encoded = serde_json::to_string(&map).map_err(|err| StorageError::Encode {
            key: KEY_LEADERBOARD.to_string(),
            reason: err.to_string(),
        })?;
        self.local.set(KEY_LEADERBOARD, &encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::SharedTable;
    use crate::storage::{KeyValueStore, MemoryStore};
    use futures::executor::{LocalPool, block_on};
    use futures::task::LocalSpawnExt;
    use futures::{FutureExt, StreamExt};

    struct Answer(&'static str);

    impl IdentityPrompt for Answer {
        fn ask(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    /// Rejects every write, like a full or disabled localStorage.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::WriteRejected { key: key.to_string(), reason: "quota".into() })
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn store_for(local: &MemoryStore, choice: &'static str) -> LeaderboardStore {
        let resolver = IdentityResolver::new(Rc::new(local.clone()), Rc::new(MemoryStore::new()));
        LeaderboardStore::load(Rc::new(local.clone()), resolver, Box::new(Answer(choice)))
    }

    fn pool_spawner(pool: &LocalPool) -> Spawner {
        let spawner = pool.spawner();
        Rc::new(move |fut: LocalBoxFuture<'static, ()>| spawner.spawn_local(fut).expect("spawn"))
    }

    #[test]
    fn score_only_increases() {
        let local = MemoryStore::new();
        let mut board = store_for(&local, "1");
        assert!(board.update_score(5).unwrap());
        assert!(!board.update_score(5).unwrap());
        assert!(!board.update_score(2).unwrap());
        assert!(board.update_score(8).unwrap());
        assert_eq!(board.score_of(Identity::Girlfriend), 8);
    }

    #[test]
    fn scores_survive_reload() {
        let local = MemoryStore::new();
        store_for(&local, "2").update_score(4).unwrap();
        let reloaded = store_for(&local, "2");
        assert_eq!(reloaded.score_of(Identity::Boyfriend), 4);
        assert_eq!(reloaded.score_of(Identity::Girlfriend), 0);
    }

    #[test]
    fn corrupt_local_table_starts_fresh() {
        let local = MemoryStore::new();
        local.set(KEY_LEADERBOARD, "{oops").unwrap();
        let board = store_for(&local, "3");
        assert_eq!(board.score_of(Identity::Other), 0);
    }

    #[test]
    fn failed_local_write_keeps_previous_score() {
        let resolver = IdentityResolver::new(Rc::new(MemoryStore::new()), Rc::new(MemoryStore::new()));
        let mut board = LeaderboardStore::load(Rc::new(ReadOnlyStore), resolver, Box::new(Answer("3")));
        assert!(board.update_score(3).is_err());
        assert_eq!(board.score_of(Identity::Other), 0);
    }

    #[test]
    fn snapshot_sorts_descending_with_stable_ties() {
        let local = MemoryStore::new();
        let mut board = store_for(&local, "3");
        board.update_score(7).unwrap();
        let rows = board.snapshot();
        assert_eq!(rows[0].identity, Identity::Other);
        assert!(rows[0].is_current);
        assert_eq!(rows[1].identity, Identity::Girlfriend);
        assert_eq!(rows[2].identity, Identity::Boyfriend);
        assert!(!rows[1].is_current);
        assert_eq!(LeaderboardRow::medal(0), "🥇");
        assert_eq!(LeaderboardRow::medal(3), "");
    }

    #[test]
    fn high_scores_reach_the_remote() {
        let mut pool = LocalPool::new();
        let table = SharedTable::new();
        let local = MemoryStore::new();
        let mut board = store_for(&local, "1");
        board.attach_remote(Rc::new(table.clone()), pool_spawner(&pool));
        board.update_score(3).unwrap();
        pool.run_until_stalled();
        assert_eq!(table.get(&Identity::Girlfriend.remote_key()), Some(3));
    }

    #[test]
    fn remote_never_lowered_by_another_device() {
        let mut pool = LocalPool::new();
        let table = SharedTable::new();
        let mut phone = store_for(&MemoryStore::new(), "2");
        let mut laptop = store_for(&MemoryStore::new(), "2");
        phone.attach_remote(Rc::new(table.clone()), pool_spawner(&pool));
        laptop.attach_remote(Rc::new(table.clone()), pool_spawner(&pool));
        phone.update_score(20).unwrap();
        laptop.update_score(6).unwrap();
        pool.run_until_stalled();
        assert_eq!(table.get(&Identity::Boyfriend.remote_key()), Some(20));
    }

    #[test]
    fn remote_failure_falls_back_to_local_for_the_session() {
        let mut pool = LocalPool::new();
        let table = SharedTable::new();
        table.set_offline(true);
        let local = MemoryStore::new();
        let mut board = store_for(&local, "3");
        board.attach_remote(Rc::new(table.clone()), pool_spawner(&pool));
        assert!(board.update_score(1).unwrap());
        pool.run_until_stalled();
        assert!(!board.remote_available());
        table.set_offline(false);
        assert!(board.update_score(2).unwrap());
        pool.run_until_stalled();
        assert_eq!(table.get(&Identity::Other.remote_key()), None);
        assert_eq!(board.score_of(Identity::Other), 2);
        assert!(board.remote_updates().is_none());
    }

    #[test]
    fn remote_snapshot_overwrites_local() {
        let pool = LocalPool::new();
        let local = MemoryStore::new();
        let mut board = store_for(&local, "1");
        board.attach_remote(Rc::new(SharedTable::new()), pool_spawner(&pool));
        board.update_score(9).unwrap();
        let mut remote = ScoreTable::new();
        remote.insert(Identity::Boyfriend.remote_key(), 15);
        remote.insert("stranger".into(), 99);
        assert!(board.apply_remote(&remote));
        assert_eq!(board.score_of(Identity::Boyfriend), 15);
        assert_eq!(board.score_of(Identity::Girlfriend), 0);
        let reloaded = store_for(&local, "1");
        assert_eq!(reloaded.score_of(Identity::Boyfriend), 15);
    }

    #[test]
    fn snapshots_after_remote_failure_keep_local_scores() {
        let mut pool = LocalPool::new();
        let table = SharedTable::new();
        let local = MemoryStore::new();
        let mut board = store_for(&local, "1");
        board.attach_remote(Rc::new(table.clone()), pool_spawner(&pool));
        let mut updates = board.remote_updates().expect("remote attached");
        table.set_offline(true);
        assert!(board.update_score(30).unwrap());
        pool.run_until_stalled();
        assert!(!board.remote_available());

        table.set_offline(false);
        let other_device = table.clone();
        block_on(other_device.update_if_greater(&Identity::Boyfriend.remote_key(), 4)).unwrap();
        while let Some(Some(snapshot)) = updates.next().now_or_never() {
            assert!(!board.apply_remote(&snapshot));
        }
        assert_eq!(board.score_of(Identity::Girlfriend), 30);
        assert_eq!(board.score_of(Identity::Boyfriend), 0);
        assert_eq!(store_for(&local, "1").score_of(Identity::Girlfriend), 30);
    }

    #[test]
    fn snapshot_without_remote_is_ignored() {
        let local = MemoryStore::new();
        let mut board = store_for(&local, "2");
        board.update_score(6).unwrap();
        let mut remote = ScoreTable::new();
        remote.insert(Identity::Boyfriend.remote_key(), 1);
        assert!(!board.apply_remote(&remote));
        assert_eq!(board.score_of(Identity::Boyfriend), 6);
    }
}
