use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

use crate::domain::{error::DomainError, types::RelationKind};

/// Command-line arguments for the socialgraph binary.
#[derive(Debug, Parser)]
#[command(
    name = "socialgraph",
    version,
    about = "Favorite and follow relations with consistent counters"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "SOCIALGRAPH_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT", global = true)]
    pub database_max_connections: Option<u32>,

    /// Override the cache backend (memory|redis|disabled).
    #[arg(long = "cache-backend", value_name = "BACKEND", global = true)]
    pub cache_backend: Option<String>,

    /// Override the redis connection URL.
    #[arg(long = "cache-redis-url", value_name = "URL", global = true)]
    pub cache_redis_url: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Favorite a video.
    Favorite(FavoriteArgs),
    /// Remove a favorite.
    Unfavorite(FavoriteArgs),
    /// Follow a user.
    Follow(FollowArgs),
    /// Stop following a user.
    Unfollow(FollowArgs),
    /// Check whether a relation exists.
    Exists(RelationArgs),
    /// Print the denormalized counter of a video or user.
    Count(TargetArgs),
    /// Print the favorites received across a user's videos.
    Received(UserArgs),
    /// Print how many relations a user has given.
    Given(ActorArgs),
    /// List relations of a user, newest first.
    List(ListArgs),
    /// Recompute a counter from relation rows.
    Reconcile(TargetArgs),
}

#[derive(Debug, Args, Clone, Copy)]
pub struct FavoriteArgs {
    #[arg(value_name = "USER_ID")]
    pub user_id: i64,
    #[arg(value_name = "VIDEO_ID")]
    pub video_id: i64,
}

#[derive(Debug, Args, Clone, Copy)]
pub struct FollowArgs {
    #[arg(value_name = "FOLLOWER_ID")]
    pub follower_id: i64,
    #[arg(value_name = "FOLLOWEE_ID")]
    pub followee_id: i64,
}

#[derive(Debug, Args, Clone, Copy)]
pub struct RelationArgs {
    #[arg(value_name = "KIND", value_parser = parse_kind)]
    pub kind: RelationKind,
    #[arg(value_name = "ACTOR_ID")]
    pub actor_id: i64,
    #[arg(value_name = "TARGET_ID")]
    pub target_id: i64,
}

#[derive(Debug, Args, Clone, Copy)]
pub struct TargetArgs {
    #[arg(value_name = "KIND", value_parser = parse_kind)]
    pub kind: RelationKind,
    #[arg(value_name = "TARGET_ID")]
    pub target_id: i64,
}

#[derive(Debug, Args, Clone, Copy)]
pub struct UserArgs {
    #[arg(value_name = "USER_ID")]
    pub user_id: i64,
}

#[derive(Debug, Args, Clone, Copy)]
pub struct ActorArgs {
    #[arg(value_name = "KIND", value_parser = parse_kind)]
    pub kind: RelationKind,
    #[arg(value_name = "ACTOR_ID")]
    pub actor_id: i64,
}

#[derive(Debug, Args, Clone, Copy)]
pub struct ListArgs {
    #[arg(value_name = "KIND", value_parser = parse_kind)]
    pub kind: RelationKind,
    /// Actor id, or the target id with `--incoming`.
    #[arg(value_name = "ID")]
    pub id: i64,
    /// List who points at the id instead of what the id points at.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub incoming: bool,
    /// Resolve ids into full video or user records.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub resolve: bool,
}

fn parse_kind(value: &str) -> Result<RelationKind, DomainError> {
    value.parse::<RelationKind>()
}
