mod read;
mod types;
mod write;

use crate::domain::types::RelationKind;

/// Statements for one relation table.
///
/// Actor and target are always bound as `$1` and `$2`.
struct RelationSql {
    insert: &'static str,
    delete: &'static str,
    exists: &'static str,
    count_given: &'static str,
    list_targets: &'static str,
    list_actors: &'static str,
    counter: &'static str,
    lock_target: &'static str,
    count_received: &'static str,
}

const FAVORITES: RelationSql = RelationSql {
    insert: "INSERT INTO favorites (user_id, video_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, video_id) DO NOTHING",
    delete: "DELETE FROM favorites WHERE user_id = $1 AND video_id = $2",
    exists: "SELECT EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND video_id = $2)",
    count_given: "SELECT COUNT(*) FROM favorites WHERE user_id = $1",
    list_targets: "SELECT video_id FROM favorites WHERE user_id = $1 \
                   ORDER BY created_at DESC, video_id DESC",
    list_actors: "SELECT user_id FROM favorites WHERE video_id = $1 \
                  ORDER BY created_at DESC, user_id DESC",
    counter: "SELECT favorite_count FROM videos WHERE id = $1",
    lock_target: "SELECT id FROM videos WHERE id = $1 FOR UPDATE",
    count_received: "SELECT COUNT(*) FROM favorites WHERE video_id = $1",
};

const FOLLOWS: RelationSql = RelationSql {
    insert: "INSERT INTO follows (follower_id, followee_id) VALUES ($1, $2) \
             ON CONFLICT (follower_id, followee_id) DO NOTHING",
    delete: "DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2",
    exists: "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
    count_given: "SELECT COUNT(*) FROM follows WHERE follower_id = $1",
    list_targets: "SELECT followee_id FROM follows WHERE follower_id = $1 \
                   ORDER BY created_at DESC, followee_id DESC",
    list_actors: "SELECT follower_id FROM follows WHERE followee_id = $1 \
                  ORDER BY created_at DESC, follower_id DESC",
    counter: "SELECT follower_count FROM users WHERE id = $1",
    lock_target: "SELECT id FROM users WHERE id = $1 FOR UPDATE",
    count_received: "SELECT COUNT(*) FROM follows WHERE followee_id = $1",
};

fn sql_for(kind: RelationKind) -> &'static RelationSql {
    match kind {
        RelationKind::Favorite => &FAVORITES,
        RelationKind::Follow => &FOLLOWS,
    }
}
