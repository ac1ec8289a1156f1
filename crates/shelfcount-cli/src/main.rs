//! Shelfcount CLI: stock-count client with an offline cache and submission queue.
//!
//! Server, state directory and cache generation come from SHELFCOUNT_SERVER_URL,
//! SHELFCOUNT_STATE_DIR and SHELFCOUNT_CACHE_GENERATION (or the matching flags).

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use shelfcount_cli::{
    init_tracing, open_client, open_worker, photo_chain, truncate_string, write_active_marker,
    Settings, DEFAULT_SERVER_URL, DEFAULT_STATE_DIR,
};
use shelfcount_core::models::StockSubmission;
use shelfcount_offline::{StockClient, SubmitOutcome, DEFAULT_GENERATION};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shelfcount", about = "Shelf stock-count client")]
struct Cli {
    /// Server origin
    #[arg(long, global = true, env = "SHELFCOUNT_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    /// Directory holding the asset cache and the submission queue
    #[arg(long, global = true, env = "SHELFCOUNT_STATE_DIR", default_value = DEFAULT_STATE_DIR)]
    state_dir: PathBuf,

    /// Cache generation to install or activate
    #[arg(long, global = true, env = "SHELFCOUNT_CACHE_GENERATION", default_value = DEFAULT_GENERATION)]
    generation: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PhotoArgs {
    /// Photo file to attach
    #[arg(long)]
    photo: Option<PathBuf>,
    /// Use the newest image in this directory when --photo is absent or unreadable
    #[arg(long)]
    capture_dir: Option<PathBuf>,
}

impl PhotoArgs {
    fn given(&self) -> bool {
        self.photo.is_some() || self.capture_dir.is_some()
    }

    async fn data_uri(self) -> anyhow::Result<String> {
        let acquired = photo_chain(self.photo, self.capture_dir)
            .acquire()
            .await
            .context("No photo could be read")?;
        for (strategy, error) in &acquired.failures {
            tracing::info!(strategy = %strategy, error = %error, "Photo source skipped");
        }
        tracing::debug!(strategy = %acquired.strategy, file = %acquired.value.file_name, "Photo acquired");
        Ok(acquired.value.to_data_uri())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a product by barcode
    Lookup {
        barcode: String,
    },
    /// Submit a stock count; queued when the server cannot be reached
    Submit {
        #[arg(long)]
        barcode: String,
        #[arg(long)]
        quantity: i64,
        /// Branch code (CITY, SCHOOL, PONGPAI, ...)
        #[arg(long)]
        branch: String,
        /// Product name typed by hand, for barcodes the catalog does not know
        #[arg(long)]
        product_name: Option<String>,
        #[command(flatten)]
        photo: PhotoArgs,
    },
    /// Replay queued submissions now that the server is reachable
    Sync,
    /// List queued submissions
    Queue,
    /// Upload a test photo through every server-side channel
    TestUpload {
        #[arg(long, default_value = "CITY")]
        branch: String,
        #[command(flatten)]
        photo: PhotoArgs,
    },
    /// Delegated storage credential
    Drive {
        #[command(subcommand)]
        sub: DriveCommands,
    },
    /// Offline asset cache
    Cache {
        #[command(subcommand)]
        sub: CacheCommands,
    },
}

#[derive(Subcommand)]
enum DriveCommands {
    /// Show whether direct uploads are authorized
    Status,
    /// Install an access token for direct uploads
    Authorize {
        access_token: String,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Fetch every manifest asset into a new generation
    Install,
    /// Activate the installed generation and delete all others
    Activate,
    /// Show the current generation and its entries
    Status,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn product_name_for(client: &StockClient, barcode: &str, manual: Option<&str>) -> String {
    if let Some(name) = manual {
        return name.to_string();
    }
    match client.lookup_product(barcode).await {
        Ok(Some(product)) => product.display_name(barcode).to_string(),
        Ok(None) => barcode.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, barcode = %barcode, "Product lookup failed; using barcode as name");
            barcode.to_string()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings {
        server_url: cli.server_url,
        state_dir: cli.state_dir,
        generation: cli.generation,
    };

    match cli.command {
        Commands::Lookup { barcode } => {
            let client = open_client(&settings).await?;
            match client.lookup_product(&barcode).await? {
                Some(product) => print_json(&product)?,
                None => print_json(&serde_json::json!({ "barcode": barcode, "found": false }))?,
            }
        }
        Commands::Submit {
            barcode,
            quantity,
            branch,
            product_name,
            photo,
        } => {
            let client = open_client(&settings).await?;
            let image_data = if photo.given() {
                Some(photo.data_uri().await?)
            } else {
                None
            };
            let submission = StockSubmission {
                product_name: product_name_for(&client, &barcode, product_name.as_deref()).await,
                barcode,
                quantity,
                branch,
                manual_product_name: product_name,
                image_data,
            };

            match client.submit_stock(&submission).await? {
                SubmitOutcome::Sent(response) => {
                    let body: serde_json::Value =
                        response.json().unwrap_or(serde_json::Value::Null);
                    print_json(&serde_json::json!({ "status": "sent", "response": body }))?;
                }
                SubmitOutcome::Queued(entry) => {
                    print_json(&serde_json::json!({
                        "status": "queued",
                        "id": entry.id,
                        "queued_at": entry.queued_at,
                    }))?;
                }
            }
        }
        Commands::Sync => {
            let worker = open_worker(&settings).await?;
            let report = worker.on_reconnect().await?;
            print_json(&serde_json::json!({
                "replayed": report.replayed,
                "remaining": report.remaining,
                "blocked": report.blocked.map(|(id, reason)| serde_json::json!({ "id": id, "reason": reason })),
            }))?;
        }
        Commands::Queue => {
            let worker = open_worker(&settings).await?;
            let pending: Vec<_> = worker
                .pending_submissions()
                .await?
                .into_iter()
                .map(|entry| {
                    serde_json::json!({
                        "id": entry.id,
                        "url": entry.request.url,
                        "queued_at": entry.queued_at,
                        "attempts": entry.attempts,
                        "last_error": entry.last_error.map(|e| truncate_string(&e, 80)),
                    })
                })
                .collect();
            print_json(&pending)?;
        }
        Commands::TestUpload { branch, photo } => {
            if !photo.given() {
                anyhow::bail!("test-upload needs --photo or --capture-dir");
            }
            let client = open_client(&settings).await?;
            let report = client.test_upload(&branch, photo.data_uri().await?).await?;
            print_json(&report)?;
        }
        Commands::Drive { sub } => {
            let client = open_client(&settings).await?;
            let status = match sub {
                DriveCommands::Status => client.drive_status().await?,
                DriveCommands::Authorize { access_token } => {
                    client.authorize_drive(&access_token).await?
                }
            };
            print_json(&status)?;
        }
        Commands::Cache { sub } => {
            let worker = open_worker(&settings).await?;
            match sub {
                CacheCommands::Install => {
                    worker.on_install(&settings.generation).await?;
                    print_json(&worker.cache_status().await?)?;
                }
                CacheCommands::Activate => {
                    if !worker.adopt_installed(&settings.generation).await? {
                        anyhow::bail!(
                            "Generation {} is not installed; run `cache install` first",
                            settings.generation
                        );
                    }
                    let evicted = worker.on_activate().await?;
                    write_active_marker(&settings.marker_file(), &settings.generation).await?;
                    print_json(&serde_json::json!({
                        "active": settings.generation,
                        "evicted": evicted,
                    }))?;
                }
                CacheCommands::Status => {
                    print_json(&worker.cache_status().await?)?;
                }
            }
        }
    }

    Ok(())
}
