mod import;
mod search;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mailoc-cli")]
#[command(about = "Location directory command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run pending database migrations.
    Migrate,
    /// Seed taxonomy terms from the registry file.
    Seed,
    /// Import location records from a JSON file.
    Import {
        /// Path to a JSON array of location records.
        #[arg(long)]
        file: PathBuf,
        /// Print what would be imported without touching the database.
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete a location by its public identifier.
    Delete {
        #[arg(long)]
        id: uuid::Uuid,
    },
    /// Proximity search against the directory.
    Search {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lng: f64,
        /// Radius threshold; 0 shows everything sorted by distance.
        #[arg(long)]
        distance: Option<u32>,
        /// Distance unit (mi or km).
        #[arg(long, default_value = "mi")]
        unit: String,
        /// Term filter as `taxonomy=slug,slug`. Repeatable.
        #[arg(long = "terms")]
        terms: Vec<String>,
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = mailoc_core::load_app_config()?;
    let pool = mailoc_db::connect_pool(
        &config.database_url,
        mailoc_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match cli.command {
        Commands::Migrate => {
            let applied = mailoc_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Seed => {
            let registry = mailoc_core::load_taxonomies(&config.taxonomies_path)?;
            let seeded = mailoc_db::seed_terms(&pool, &registry.taxonomies).await?;
            println!("seeded {seeded} term(s)");
        }
        Commands::Import { file, dry_run } => {
            import::run_import(&pool, &file, dry_run).await?;
        }
        Commands::Delete { id } => {
            if mailoc_db::delete_location(&pool, id).await? {
                println!("deleted location {id}");
            } else {
                anyhow::bail!("no location with public id {id}");
            }
        }
        Commands::Search {
            lat,
            lng,
            distance,
            unit,
            terms,
            limit,
        } => {
            search::run_search(
                &pool,
                &config,
                search::SearchArgs {
                    lat,
                    lng,
                    distance,
                    unit,
                    terms,
                    limit,
                },
            )
            .await?;
        }
    }

    Ok(())
}
