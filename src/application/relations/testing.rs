//! In-memory store and cache doubles for relation service tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{RelationWrite, RelationsRepo, RelationsWriteRepo, RepoError};
use crate::cache::{CacheError, MemoryRelationCache, RelationCache};
use crate::domain::entities::{RelationKey, UserRecord, VideoRecord};
use crate::domain::types::RelationKind;

#[derive(Debug, Clone, Default)]
struct GraphState {
    users: BTreeMap<i64, UserRecord>,
    videos: BTreeMap<i64, VideoRecord>,
    /// `(actor, target, kind)` -> creation sequence.
    relations: BTreeMap<(i64, i64, RelationKind), u64>,
    seq: u64,
}

impl GraphState {
    fn rows(&self, kind: RelationKind) -> impl Iterator<Item = (i64, i64, u64)> + '_ {
        self.relations
            .iter()
            .filter(move |((_, _, k), _)| *k == kind)
            .map(|((actor, target, _), seq)| (*actor, *target, *seq))
    }

    fn target_exists(&self, key: &RelationKey) -> bool {
        match key.kind {
            RelationKind::Favorite => self.videos.contains_key(&key.target_id),
            RelationKind::Follow => self.users.contains_key(&key.target_id),
        }
    }

    /// Move the counters a relation drives; mirrors the store's CHECK constraints.
    fn shift_counters(&mut self, key: &RelationKey, delta: i64) -> Result<(), RepoError> {
        match key.kind {
            RelationKind::Favorite => {
                let video = self.videos.get_mut(&key.target_id).ok_or(RepoError::NotFound)?;
                video.favorite_count = non_negative(video.favorite_count + delta, "favorite_count")?;
            }
            RelationKind::Follow => {
                let followee = self.users.get_mut(&key.target_id).ok_or(RepoError::NotFound)?;
                followee.follower_count =
                    non_negative(followee.follower_count + delta, "follower_count")?;
                let follower = self.users.get_mut(&key.actor_id).ok_or(RepoError::NotFound)?;
                follower.follow_count = non_negative(follower.follow_count + delta, "follow_count")?;
            }
        }
        Ok(())
    }
}

fn non_negative(value: i64, column: &str) -> Result<i64, RepoError> {
    if value < 0 {
        return Err(RepoError::Integrity {
            message: format!("{column} would become negative"),
        });
    }
    Ok(value)
}

/// Store double with transactional semantics.
///
/// Each mutation works on a clone of the state and swaps it in only when
/// every step succeeded, so an injected failure leaves nothing behind.
#[derive(Default)]
pub(crate) struct InMemoryGraph {
    state: Mutex<GraphState>,
    reads: AtomicUsize,
    fail_counter_updates: AtomicBool,
    unavailable: AtomicBool,
}

impl InMemoryGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_user(self, id: i64, name: &str) -> Self {
        self.state.lock().unwrap().users.insert(
            id,
            UserRecord {
                id,
                name: name.to_string(),
                follow_count: 0,
                follower_count: 0,
                created_at: OffsetDateTime::UNIX_EPOCH,
            },
        );
        self
    }

    pub(crate) fn with_video(self, id: i64, author_id: i64, favorite_count: i64) -> Self {
        self.state.lock().unwrap().videos.insert(
            id,
            VideoRecord {
                id,
                author_id,
                title: format!("video {id}"),
                favorite_count,
                created_at: OffsetDateTime::UNIX_EPOCH,
            },
        );
        self
    }

    /// Number of read-side calls served so far.
    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn set_unavailable(&self, on: bool) {
        self.unavailable.store(on, Ordering::SeqCst);
    }

    pub(crate) fn fail_counter_updates(&self, on: bool) {
        self.fail_counter_updates.store(on, Ordering::SeqCst);
    }

    pub(crate) fn favorite_count(&self, video_id: i64) -> i64 {
        self.state.lock().unwrap().videos[&video_id].favorite_count
    }

    pub(crate) fn follower_count(&self, user_id: i64) -> i64 {
        self.state.lock().unwrap().users[&user_id].follower_count
    }

    pub(crate) fn follow_count(&self, user_id: i64) -> i64 {
        self.state.lock().unwrap().users[&user_id].follow_count
    }

    pub(crate) fn force_favorite_count(&self, video_id: i64, value: i64) {
        if let Some(video) = self.state.lock().unwrap().videos.get_mut(&video_id) {
            video.favorite_count = value;
        }
    }

    pub(crate) fn has_relation(&self, key: &RelationKey) -> bool {
        self.state
            .lock()
            .unwrap()
            .relations
            .contains_key(&(key.actor_id, key.target_id, key.kind))
    }

    pub(crate) fn relation_rows(&self, kind: RelationKind) -> usize {
        self.state.lock().unwrap().rows(kind).count()
    }

    pub(crate) fn favorites_pointing_at(&self, video_id: i64) -> i64 {
        self.state
            .lock()
            .unwrap()
            .rows(RelationKind::Favorite)
            .filter(|(_, target, _)| *target == video_id)
            .count() as i64
    }

    /// Insert a relation row without touching counters or the cache.
    pub(crate) fn insert_row_directly(&self, key: RelationKey) {
        let mut state = self.state.lock().unwrap();
        state.seq += 1;
        let seq = state.seq;
        state
            .relations
            .insert((key.actor_id, key.target_id, key.kind), seq);
    }

    fn check_available(&self) -> Result<(), RepoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("connection refused".to_string()));
        }
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&GraphState) -> T) -> Result<T, RepoError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(f(&self.state.lock().unwrap()))
    }

    fn transact<T>(
        &self,
        f: impl FnOnce(&mut GraphState, bool) -> Result<T, RepoError>,
    ) -> Result<T, RepoError> {
        self.check_available()?;
        let fail_counters = self.fail_counter_updates.load(Ordering::SeqCst);
        let mut guard = self.state.lock().unwrap();
        let mut tx = guard.clone();
        let out = f(&mut tx, fail_counters)?;
        *guard = tx;
        Ok(out)
    }
}

fn ordered_desc(mut rows: Vec<(i64, u64)>) -> Vec<i64> {
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
    rows.into_iter().map(|(id, _)| id).collect()
}

#[async_trait]
impl RelationsRepo for InMemoryGraph {
    async fn relation_exists(&self, key: &RelationKey) -> Result<bool, RepoError> {
        self.read(|state| {
            state
                .relations
                .contains_key(&(key.actor_id, key.target_id, key.kind))
        })
    }

    async fn counter_for(
        &self,
        target_id: i64,
        kind: RelationKind,
    ) -> Result<Option<i64>, RepoError> {
        self.read(|state| match kind {
            RelationKind::Favorite => state.videos.get(&target_id).map(|v| v.favorite_count),
            RelationKind::Follow => state.users.get(&target_id).map(|u| u.follower_count),
        })
    }

    async fn received_favorite_counters(&self, owner_id: i64) -> Result<Vec<i64>, RepoError> {
        self.read(|state| {
            state
                .videos
                .values()
                .filter(|video| video.author_id == owner_id)
                .map(|video| video.favorite_count)
                .collect()
        })
    }

    async fn count_given_by(&self, actor_id: i64, kind: RelationKind) -> Result<i64, RepoError> {
        self.read(|state| {
            state
                .rows(kind)
                .filter(|(actor, _, _)| *actor == actor_id)
                .count() as i64
        })
    }

    async fn list_target_ids(
        &self,
        actor_id: i64,
        kind: RelationKind,
    ) -> Result<Vec<i64>, RepoError> {
        self.read(|state| {
            ordered_desc(
                state
                    .rows(kind)
                    .filter(|(actor, _, _)| *actor == actor_id)
                    .map(|(_, target, seq)| (target, seq))
                    .collect(),
            )
        })
    }

    async fn list_actor_ids(
        &self,
        target_id: i64,
        kind: RelationKind,
    ) -> Result<Vec<i64>, RepoError> {
        self.read(|state| {
            ordered_desc(
                state
                    .rows(kind)
                    .filter(|(_, target, _)| *target == target_id)
                    .map(|(actor, _, seq)| (actor, seq))
                    .collect(),
            )
        })
    }

    async fn find_videos(&self, ids: &[i64]) -> Result<Vec<VideoRecord>, RepoError> {
        self.read(|state| {
            ids.iter()
                .filter_map(|id| state.videos.get(id).cloned())
                .collect()
        })
    }

    async fn find_users(&self, ids: &[i64]) -> Result<Vec<UserRecord>, RepoError> {
        self.read(|state| {
            ids.iter()
                .filter_map(|id| state.users.get(id).cloned())
                .collect()
        })
    }
}

#[async_trait]
impl RelationsWriteRepo for InMemoryGraph {
    async fn insert_relation(&self, key: &RelationKey) -> Result<RelationWrite, RepoError> {
        self.transact(|tx, fail_counters| {
            if !tx.users.contains_key(&key.actor_id) {
                return Err(RepoError::ForeignKey {
                    constraint: format!("{}_actor_fkey", key.kind.as_str()),
                });
            }
            if !tx.target_exists(key) {
                return Err(RepoError::ForeignKey {
                    constraint: format!("{}_target_fkey", key.kind.as_str()),
                });
            }
            let row = (key.actor_id, key.target_id, key.kind);
            if tx.relations.contains_key(&row) {
                return Ok(RelationWrite::Unchanged);
            }
            tx.seq += 1;
            let seq = tx.seq;
            tx.relations.insert(row, seq);
            if fail_counters {
                return Err(RepoError::Persistence("counter update failed".to_string()));
            }
            tx.shift_counters(key, 1)?;
            Ok(RelationWrite::Applied)
        })
    }

    async fn delete_relation(&self, key: &RelationKey) -> Result<RelationWrite, RepoError> {
        self.transact(|tx, fail_counters| {
            if tx
                .relations
                .remove(&(key.actor_id, key.target_id, key.kind))
                .is_none()
            {
                return Ok(RelationWrite::Unchanged);
            }
            if fail_counters {
                return Err(RepoError::Persistence("counter update failed".to_string()));
            }
            tx.shift_counters(key, -1)?;
            Ok(RelationWrite::Applied)
        })
    }

    async fn reconcile_counter(
        &self,
        target_id: i64,
        kind: RelationKind,
    ) -> Result<i64, RepoError> {
        self.transact(|tx, _| {
            let count = tx
                .rows(kind)
                .filter(|(_, target, _)| *target == target_id)
                .count() as i64;
            match kind {
                RelationKind::Favorite => {
                    tx.videos
                        .get_mut(&target_id)
                        .ok_or(RepoError::NotFound)?
                        .favorite_count = count;
                }
                RelationKind::Follow => {
                    let given = tx
                        .rows(RelationKind::Follow)
                        .filter(|(actor, _, _)| *actor == target_id)
                        .count() as i64;
                    let user = tx.users.get_mut(&target_id).ok_or(RepoError::NotFound)?;
                    user.follower_count = count;
                    user.follow_count = given;
                }
            }
            Ok(count)
        })
    }
}

/// Cache double whose every operation fails.
#[derive(Default)]
pub(crate) struct FailingCache {
    calls: AtomicUsize,
}

impl FailingCache {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail(&self) -> CacheError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CacheError::Unavailable("connection refused".to_string())
    }
}

#[async_trait]
impl RelationCache for FailingCache {
    async fn set_exists(&self, _key: &RelationKey) -> Result<(), CacheError> {
        Err(self.fail())
    }

    async fn remove_exists(&self, _key: &RelationKey) -> Result<(), CacheError> {
        Err(self.fail())
    }

    async fn check_exists(&self, _key: &RelationKey) -> Result<bool, CacheError> {
        Err(self.fail())
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

/// Memory cache whose `set_exists` lands only after `delay`.
pub(crate) struct DelayedSetCache {
    inner: Arc<MemoryRelationCache>,
    delay: Duration,
}

impl DelayedSetCache {
    pub(crate) fn new(inner: Arc<MemoryRelationCache>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl RelationCache for DelayedSetCache {
    async fn set_exists(&self, key: &RelationKey) -> Result<(), CacheError> {
        tokio::time::sleep(self.delay).await;
        self.inner.set_exists(key).await
    }

    async fn remove_exists(&self, key: &RelationKey) -> Result<(), CacheError> {
        self.inner.remove_exists(key).await
    }

    async fn check_exists(&self, key: &RelationKey) -> Result<bool, CacheError> {
        self.inner.check_exists(key).await
    }

    fn backend(&self) -> &'static str {
        "delayed"
    }
}
