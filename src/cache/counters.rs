//! Metric names and recording helpers for the relation cache.

use metrics::counter;

use crate::domain::types::RelationKind;

pub const RELATION_CACHE_HIT_TOTAL: &str = "socialgraph_relation_cache_hit_total";
pub const RELATION_CACHE_MISS_TOTAL: &str = "socialgraph_relation_cache_miss_total";
pub const RELATION_CACHE_ERROR_TOTAL: &str = "socialgraph_relation_cache_error_total";
pub const RELATION_CACHE_EVICT_TOTAL: &str = "socialgraph_relation_cache_evict_total";

pub fn record_hit(kind: RelationKind) {
    counter!(RELATION_CACHE_HIT_TOTAL, "kind" => kind.as_str()).increment(1);
}

pub fn record_miss(kind: RelationKind) {
    counter!(RELATION_CACHE_MISS_TOTAL, "kind" => kind.as_str()).increment(1);
}

pub fn record_error(kind: RelationKind, op: &'static str) {
    counter!(RELATION_CACHE_ERROR_TOTAL, "kind" => kind.as_str(), "op" => op).increment(1);
}

pub fn record_evict() {
    counter!(RELATION_CACHE_EVICT_TOTAL).increment(1);
}
