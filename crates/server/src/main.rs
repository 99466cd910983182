use std::sync::Arc;

use anyhow::Context;
use api::{build_schema, seed_hr_demo, AppSchema};
use clap::{Parser, Subcommand, ValueEnum};
use migration::{Migrator, MigratorTrait};
use platform_db::DatabaseSettings;
use platform_obs::{init_tracing, ObsConfig};
use sea_orm::DatabaseConnection;
use tracing::info;

mod config;
mod http;

use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "hr-server", version, about = "HR back office: GraphQL API and org chart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (applies pending migrations first)
    Serve {
        /// Overrides BIND
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run database migrations
    Migrate {
        #[arg(long, value_enum, default_value_t = MigrationAction::Up)]
        action: MigrationAction,
    },
    /// Load demo employees, organizations and catalogs
    Seed,
    /// Print the GraphQL SDL
    PrintSchema,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MigrationAction {
    Up,
    Down,
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(ObsConfig::for_service("hr-server"))?;
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;

    match cli.command {
        Commands::PrintSchema => {
            // SDL generation never touches the database.
            let db = Arc::new(DatabaseConnection::Disconnected);
            let AppSchema(schema) = build_schema(db, Arc::new(config.auth), config.policy);
            println!("{}", schema.sdl());
        }
        Commands::Migrate { action } => {
            let db = connect().await?;
            match action {
                MigrationAction::Up => Migrator::up(&db, None).await,
                MigrationAction::Down => Migrator::down(&db, None).await,
                MigrationAction::Reset => Migrator::reset(&db).await,
            }
            .with_context(|| format!("migration {:?} failed", action))?;
            info!(?action, "migrations finished");
        }
        Commands::Seed => {
            let db = connect().await?;
            let seeded = seed_hr_demo(&db).await.context("seeding demo data failed")?;
            info!(users = seeded.users.len(), "demo data seeded");
        }
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind
                    .parse()
                    .with_context(|| format!("invalid --bind address `{}`", bind))?;
            }
            let db = Arc::new(connect().await?);
            Migrator::up(db.as_ref(), None)
                .await
                .context("applying migrations failed")?;
            let auth = Arc::new(config.auth.clone());
            let AppSchema(schema) = build_schema(db.clone(), auth.clone(), config.policy);
            let state = http::AppState {
                schema,
                db,
                auth,
                config: Arc::new(config),
            };
            http::serve(state).await?;
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<DatabaseConnection> {
    let settings = DatabaseSettings::from_env()?;
    settings.connect().await.context("database connection failed")
}
