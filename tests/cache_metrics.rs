use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use metrics_util::debugging::DebuggingRecorder;
use socialgraph::application::relations::{RelationQueryService, RelationWriteService};
use socialgraph::application::repos::{
    RelationWrite, RelationsRepo, RelationsWriteRepo, RepoError,
};
use socialgraph::cache::{
    CacheConfig, CacheError, MemoryRelationCache, RelationCache, counters,
};
use socialgraph::domain::entities::{RelationKey, UserRecord, VideoRecord};
use socialgraph::domain::types::RelationKind;

/// Store stub that reports every relation as existing.
#[derive(Default)]
struct AlwaysPresentRepo {
    existence_reads: AtomicUsize,
}

#[async_trait]
impl RelationsRepo for AlwaysPresentRepo {
    async fn relation_exists(&self, _key: &RelationKey) -> Result<bool, RepoError> {
        self.existence_reads.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn counter_for(
        &self,
        _target_id: i64,
        _kind: RelationKind,
    ) -> Result<Option<i64>, RepoError> {
        Ok(Some(1))
    }

    async fn received_favorite_counters(&self, _owner_id: i64) -> Result<Vec<i64>, RepoError> {
        Ok(Vec::new())
    }

    async fn count_given_by(&self, _actor_id: i64, _kind: RelationKind) -> Result<i64, RepoError> {
        Ok(0)
    }

    async fn list_target_ids(
        &self,
        _actor_id: i64,
        _kind: RelationKind,
    ) -> Result<Vec<i64>, RepoError> {
        Ok(Vec::new())
    }

    async fn list_actor_ids(
        &self,
        _target_id: i64,
        _kind: RelationKind,
    ) -> Result<Vec<i64>, RepoError> {
        Ok(Vec::new())
    }

    async fn find_videos(&self, _ids: &[i64]) -> Result<Vec<VideoRecord>, RepoError> {
        Ok(Vec::new())
    }

    async fn find_users(&self, _ids: &[i64]) -> Result<Vec<UserRecord>, RepoError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl RelationsWriteRepo for AlwaysPresentRepo {
    async fn insert_relation(&self, _key: &RelationKey) -> Result<RelationWrite, RepoError> {
        Ok(RelationWrite::Applied)
    }

    async fn delete_relation(&self, _key: &RelationKey) -> Result<RelationWrite, RepoError> {
        Ok(RelationWrite::Applied)
    }

    async fn reconcile_counter(
        &self,
        _target_id: i64,
        _kind: RelationKind,
    ) -> Result<i64, RepoError> {
        Ok(0)
    }
}

struct BrokenCache;

#[async_trait]
impl RelationCache for BrokenCache {
    async fn set_exists(&self, _key: &RelationKey) -> Result<(), CacheError> {
        Err(CacheError::Backend("READONLY".to_string()))
    }

    async fn remove_exists(&self, _key: &RelationKey) -> Result<(), CacheError> {
        Err(CacheError::Backend("READONLY".to_string()))
    }

    async fn check_exists(&self, _key: &RelationKey) -> Result<bool, CacheError> {
        Err(CacheError::Timeout {
            op: "check_exists",
            timeout_ms: 50,
        })
    }

    fn backend(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let repo = Arc::new(AlwaysPresentRepo::default());

    // Miss then hit, plus an eviction from a one-entry cache.
    let tiny = Arc::new(MemoryRelationCache::new(&CacheConfig {
        memory_capacity: 1,
        ..Default::default()
    }));
    let reads = RelationQueryService::new(repo.clone(), tiny.clone());
    let key = RelationKey::favorite(1, 10);
    assert!(reads.exists(key).await.unwrap());
    assert!(reads.exists(key).await.unwrap());
    assert_eq!(repo.existence_reads.load(Ordering::SeqCst), 1);
    assert!(reads.exists(RelationKey::favorite(1, 11)).await.unwrap());
    assert_eq!(tiny.len(), 1);

    // Absorbed failures on both sides.
    let broken: Arc<dyn RelationCache> = Arc::new(BrokenCache);
    let reads = RelationQueryService::new(repo.clone(), broken.clone());
    let writes = RelationWriteService::new(repo.clone(), broken);
    assert!(reads.exists(RelationKey::follow(2, 3)).await.unwrap());
    writes
        .create_relation(RelationKey::follow(2, 3))
        .await
        .expect("cache failure must not fail the write");

    let snapshot = snapshotter.snapshot().into_vec();
    let names: HashSet<String> = snapshot
        .iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        counters::RELATION_CACHE_HIT_TOTAL,
        counters::RELATION_CACHE_MISS_TOTAL,
        counters::RELATION_CACHE_ERROR_TOTAL,
        counters::RELATION_CACHE_EVICT_TOTAL,
    ];
    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }

    let error_ops: HashSet<String> = snapshot
        .iter()
        .filter(|(composite_key, _, _, _)| {
            composite_key.key().name() == counters::RELATION_CACHE_ERROR_TOTAL
        })
        .flat_map(|(composite_key, _, _, _)| {
            composite_key
                .key()
                .labels()
                .filter(|label| label.key() == "op")
                .map(|label| label.value().to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    assert!(error_ops.contains("check_exists"));
    assert!(error_ops.contains("set_exists"));
}
