use std::str::FromStr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use database::sqlx::postgres::PgPoolOptions;
use database::Database;
use model::Snowflake;
use schematic::frontend::SchematicCommand;
use schematic::import::ImportScope;
use schematic::store::{FsSnapshotStore, PostgresSnapshotStore, SnapshotStore};
use schematic::target::{HttpTarget, MemoryTarget};
use schematic::{Config, Result, StoreError};
use sentry::types::Dsn;
use sentry_tracing::EventFilter;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(name = "schematic", about = "Export and import the role and channel layout of a guild")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Snapshot the roles and channels of a guild
    Export {
        /// The guild to export
        #[clap(long)]
        guild: Snowflake,

        /// The user the export is run on behalf of. Must own or administrate the guild
        #[clap(long, env = "SCHEMATIC_USER")]
        user: Snowflake,
    },

    /// List stored snapshots, newest first
    List,

    /// Create the roles and channels of a stored snapshot that a guild is missing
    Import {
        /// The guild to import into
        #[clap(long)]
        guild: Snowflake,

        /// The user the import is run on behalf of. Must own or administrate the guild
        #[clap(long, env = "SCHEMATIC_USER")]
        user: Snowflake,

        /// Identifier of the snapshot, as shown by `list`
        #[clap(long)]
        snapshot: String,

        /// What to import: all, roles, channels or permissions
        #[clap(long, default_value = "all")]
        scope: ImportScope,

        /// Run against an in-memory copy of the guild instead of the guild itself
        #[clap(long)]
        dry_run: bool,
    },
}

#[tokio::main]
pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Arc::new(Config::from_envvar()?);

    let _guard = configure_observability(&config);

    let store = open_store(&config).await?;

    match cli.command {
        Command::List => {
            for listing in store.list().await? {
                println!(
                    "{}\t{}\t{}",
                    listing.identifier,
                    listing.source_id,
                    listing.exported_at.to_rfc3339()
                );
            }
        }

        Command::Export { guild, user } => {
            let target = HttpTarget::new(&config, guild)?;
            let invoker = target.invoker(user).await?;

            let command = SchematicCommand::new(Arc::clone(&config), store);
            let identifier = command.export(&invoker, &target).await?;
            println!("Saved snapshot {}", identifier);
        }

        Command::Import {
            guild,
            user,
            snapshot,
            scope,
            dry_run,
        } => {
            let target = HttpTarget::new(&config, guild)?;
            let invoker = target.invoker(user).await?;

            let config = if dry_run {
                // Nothing is sent to Discord, so there is nothing to pace
                let mut config = (*config).clone();
                config.role_interval_ms = 0;
                config.channel_interval_ms = 0;
                Arc::new(config)
            } else {
                config
            };

            let command = SchematicCommand::new(config, store);
            command.sessions().begin(user)?;
            command.sessions().select_snapshot(user, &snapshot)?;
            command.sessions().select_scope(user, scope)?;

            let on_progress = |progress: schematic::import::ImportProgress| {
                info!(done = progress.done, total = progress.total, "Import progress");
            };

            let summary = if dry_run {
                let mirror = MemoryTarget::mirror(&target).await?;
                command.import(&invoker, &mirror, on_progress).await?
            } else {
                command.import(&invoker, &target, on_progress).await?
            };

            print!("{}", summary);
        }
    }

    Ok(())
}

async fn open_store(config: &Config) -> Result<Arc<dyn SnapshotStore>> {
    match &config.database_uri {
        Some(uri) => {
            let opts = PgPoolOptions::new().max_connections(config.database_threads);
            let db = Database::connect(uri, opts)
                .await
                .map_err(StoreError::from)?;
            db.create_schema().await.map_err(StoreError::from)?;

            info!("Using Postgres snapshot store");
            Ok(Arc::new(PostgresSnapshotStore::new(Arc::new(db))))
        }
        None => {
            info!(dir = %config.snapshot_dir.display(), "Using file snapshot store");
            Ok(Arc::new(FsSnapshotStore::new(config.snapshot_dir.clone())))
        }
    }
}

fn configure_observability(config: &Config) -> sentry::ClientInitGuard {
    let _guard = sentry::init(sentry::ClientOptions {
        dsn: config
            .sentry_dsn
            .clone()
            .map(|dsn| Dsn::from_str(dsn.as_str()).expect("Invalid DSN")),
        debug: config.debug_mode,
        release: sentry::release_name!(),
        ..Default::default()
    });

    let sentry_layer = sentry_tracing::layer().event_filter(|meta| match meta.level() {
        &tracing::Level::ERROR | &tracing::Level::WARN => EventFilter::Exception,
        _ => EventFilter::Ignore,
    });

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(sentry_layer);

    // stdout carries command output
    if config.json_log {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    _guard
}
