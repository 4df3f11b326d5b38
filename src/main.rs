use std::{
    io::{self, Write},
    process,
    sync::Arc,
};

use serde::Serialize;
use serde_json::json;
use socialgraph::{
    application::{
        error::AppError,
        relations::{RelationQueryService, RelationWriteService},
        repos::RelationWrite,
    },
    cache::{CacheConfig, build_relation_cache},
    config::{self, Command, ListArgs},
    domain::{entities::RelationKey, types::RelationKind},
    infra::{db::PostgresRepositories, error::InfraError, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

struct Services {
    writes: RelationWriteService,
    reads: RelationQueryService,
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let repositories = init_repositories(&settings).await?;

    if let Command::Migrate = cli_args.command {
        PostgresRepositories::run_migrations(repositories.pool())
            .await
            .map_err(InfraError::migration)?;
        info!(target = "socialgraph::migrate", "migrations applied");
        return emit(&json!({ "migrated": true }));
    }

    let cache = build_relation_cache(&CacheConfig::from(&settings.cache)).await;
    let services = Services {
        writes: RelationWriteService::new(repositories.clone(), cache.clone()),
        reads: RelationQueryService::new(repositories, cache),
    };

    run_command(&services, cli_args.command).await
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or(InfraError::MissingDatabaseUrl)?;

    let pool = PostgresRepositories::connect(database_url, &settings.database)
        .await
        .map_err(InfraError::connect)?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn run_command(services: &Services, command: Command) -> Result<(), AppError> {
    match command {
        Command::Migrate => Ok(()),
        Command::Favorite(args) => {
            let key = RelationKey::favorite(args.user_id, args.video_id);
            let outcome = services.writes.create_relation(key).await?;
            emit_write(key, outcome)
        }
        Command::Unfavorite(args) => {
            let key = RelationKey::favorite(args.user_id, args.video_id);
            let outcome = services.writes.delete_relation(key).await?;
            emit_write(key, outcome)
        }
        Command::Follow(args) => {
            let key = RelationKey::follow(args.follower_id, args.followee_id);
            let outcome = services.writes.create_relation(key).await?;
            emit_write(key, outcome)
        }
        Command::Unfollow(args) => {
            let key = RelationKey::follow(args.follower_id, args.followee_id);
            let outcome = services.writes.delete_relation(key).await?;
            emit_write(key, outcome)
        }
        Command::Exists(args) => {
            let key = RelationKey::new(args.actor_id, args.target_id, args.kind);
            let exists = services.reads.exists(key).await?;
            emit(&json!({
                "actor_id": key.actor_id,
                "target_id": key.target_id,
                "kind": key.kind,
                "exists": exists,
            }))
        }
        Command::Count(args) => {
            let count = services.reads.count_for(args.target_id, args.kind).await?;
            emit(&json!({
                "kind": args.kind,
                "target_id": args.target_id,
                "count": count,
            }))
        }
        Command::Received(args) => {
            let received = services.reads.aggregate_received_count(args.user_id).await?;
            emit(&json!({ "user_id": args.user_id, "received": received }))
        }
        Command::Given(args) => {
            let given = services.reads.count_given_by(args.actor_id, args.kind).await?;
            emit(&json!({
                "kind": args.kind,
                "actor_id": args.actor_id,
                "given": given,
            }))
        }
        Command::List(args) => run_list(services, args).await,
        Command::Reconcile(args) => {
            let count = services
                .writes
                .reconcile_counter(args.target_id, args.kind)
                .await?;
            emit(&json!({
                "kind": args.kind,
                "target_id": args.target_id,
                "count": count,
            }))
        }
    }
}

async fn run_list(services: &Services, args: ListArgs) -> Result<(), AppError> {
    let reads = &services.reads;
    match (args.resolve, args.incoming, args.kind) {
        (false, false, kind) => {
            let ids = reads.list_relations_for(args.id, kind).await?;
            emit(&json!({ "kind": kind, "actor_id": args.id, "target_ids": ids }))
        }
        (false, true, kind) => {
            let ids = reads.list_actors_for(args.id, kind).await?;
            emit(&json!({ "kind": kind, "target_id": args.id, "actor_ids": ids }))
        }
        (true, false, RelationKind::Favorite) => {
            emit_each(&reads.list_favorite_videos(args.id).await?)
        }
        (true, false, RelationKind::Follow) => {
            emit_each(&reads.list_followed_users(args.id).await?)
        }
        (true, true, kind) => emit_each(&reads.list_actor_users(args.id, kind).await?),
    }
}

fn emit_write(key: RelationKey, outcome: RelationWrite) -> Result<(), AppError> {
    emit(&json!({
        "actor_id": key.actor_id,
        "target_id": key.target_id,
        "kind": key.kind,
        "outcome": outcome.as_str(),
    }))
}

fn emit_each<T: Serialize>(records: &[T]) -> Result<(), AppError> {
    records.iter().try_for_each(emit)
}

/// Write one JSON line to stdout.
fn emit<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value).map_err(|err| InfraError::Output(err.into()))?;
    writeln!(stdout).map_err(InfraError::from)?;
    Ok(())
}
