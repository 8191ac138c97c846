///
/// This module implements the CLI interface for flag-preview: command parsing, argument
/// validation, and the async entrypoint shared by `main()` and the integration tests.
///
/// All content lookup, fetch and normalization logic lives in [`flag-preview-core`].
/// This module is strictly CLI glue: it loads the YAML config, builds a delivery client
/// from explicit credentials, calls into the core crate and prints JSON.
///
/// ## Subcommands
/// - `preview`: run a flag-preview request body (as posted by the flag UI) and print the response
/// - `fetch`: print the preview record of one entry or asset
/// - `discover`: find the content type of one or more entries
/// - `metadata`: print title and thumbnail of one entry or asset
/// - `serve`: expose `POST /api/flagPreview` over HTTP
///
/// [`flag-preview-core`]: ../../flag-preview-core/
use crate::load_config::{load_config, CliConfig};
use crate::server;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flag_preview_core::client::ContentstackClient;
use flag_preview_core::handler::{handle_flag_preview, FlagPreviewRequest};
use flag_preview_core::lookup::{find_content_type_with_metadata, find_content_types_for_entries};
use flag_preview_core::model::{ContentReference, Credentials};
use flag_preview_core::preview::{item_metadata, preview_content};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for flag-preview: preview Contentstack content referenced by feature-flag variations.
#[derive(Parser)]
#[clap(
    name = "flag-preview",
    version,
    about = "Resolve, fetch and normalize Contentstack entries and assets for flag previews"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Handle a flag-preview request body read from a JSON file and print the response
    Preview {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Path to the JSON request body (`{"variation": {"value": ...}}`)
        #[clap(long)]
        request: PathBuf,
    },
    /// Fetch one entry or asset and print its preview record
    Fetch {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        #[clap(long)]
        entry_id: String,
        /// Content type uid, or `asset`; discovered when omitted
        #[clap(long)]
        content_type: Option<String>,
        /// Environment to read from; defaults to the configured one
        #[clap(long)]
        environment: Option<String>,
        /// Request unpublished preview content
        #[clap(long)]
        preview: bool,
    },
    /// Discover the content type of one or more entries
    Discover {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        #[clap(long = "entry-id", required = true)]
        entry_ids: Vec<String>,
        #[clap(long)]
        environment: Option<String>,
        /// Also fetch the matched content type's title and description (single entry only)
        #[clap(long)]
        with_metadata: bool,
    },
    /// Print the title and thumbnail of one entry or asset
    Metadata {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        #[clap(long)]
        entry_id: String,
        #[clap(long)]
        content_type: Option<String>,
        #[clap(long)]
        environment: Option<String>,
    },
    /// Serve the flag-preview endpoint over HTTP
    Serve {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Address to bind; overrides `server.bind`
        #[clap(long)]
        bind: Option<SocketAddr>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn connect(config: &CliConfig, credentials: &Credentials) -> Result<ContentstackClient> {
    Ok(ContentstackClient::with_base_url(
        credentials,
        &config.delivery.base_url,
        config.delivery.timeout,
    )?)
}

fn reference_for(
    entry_id: String,
    content_type: Option<String>,
    credentials: &Credentials,
    preview: bool,
) -> ContentReference {
    let mut reference = ContentReference::entry(entry_id, credentials.environment.clone());
    reference.content_type = content_type;
    if preview {
        reference.preview = Some(true);
    }
    reference
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Preview { config, request } => {
            let config = load_config(config)?;
            let raw = std::fs::read_to_string(&request)
                .with_context(|| format!("Failed to read request file {}", request.display()))?;
            let request: FlagPreviewRequest =
                serde_json::from_str(&raw).context("Request file is not a valid JSON request body")?;
            tracing::info!(command = "preview", "Handling flag preview request");

            let response = handle_flag_preview(
                request,
                config.contentstack.as_ref(),
                &config.preview,
                |creds| {
                    ContentstackClient::with_base_url(
                        creds,
                        &config.delivery.base_url,
                        config.delivery.timeout,
                    )
                },
            )
            .await;
            print_json(&response)?;
            if response.is_success() {
                Ok(())
            } else {
                anyhow::bail!("Flag preview failed with status {}", response.status)
            }
        }
        Commands::Fetch {
            config,
            entry_id,
            content_type,
            environment,
            preview,
        } => {
            let config = load_config(config)?;
            let credentials = config.credentials(environment.as_deref())?;
            let api = connect(&config, &credentials)?;
            let reference = reference_for(entry_id, content_type, &credentials, preview);
            tracing::info!(command = "fetch", entry_id = %reference.entry_id, "Fetching preview");
            let record = preview_content(&api, &reference, &credentials, &config.preview)
                .await
                .map_err(|e| anyhow::anyhow!("Fetch failed ({:?}): {e}", e.kind()))?;
            print_json(&record)
        }
        Commands::Discover {
            config,
            entry_ids,
            environment,
            with_metadata,
        } => {
            let config = load_config(config)?;
            let credentials = config.credentials(environment.as_deref())?;
            let api = connect(&config, &credentials)?;
            tracing::info!(command = "discover", entries = entry_ids.len(), "Discovering content types");
            if with_metadata {
                let [entry_id] = entry_ids.as_slice() else {
                    anyhow::bail!("--with-metadata takes exactly one --entry-id");
                };
                let discovery =
                    find_content_type_with_metadata(&api, entry_id, &credentials.environment).await;
                print_json(&discovery)
            } else {
                let results =
                    find_content_types_for_entries(&api, entry_ids.as_slice(), &credentials.environment)
                        .await;
                let results: serde_json::Map<String, serde_json::Value> = results
                    .into_iter()
                    .map(|(entry_id, content_type)| (entry_id, content_type.into()))
                    .collect();
                print_json(&results)
            }
        }
        Commands::Metadata {
            config,
            entry_id,
            content_type,
            environment,
        } => {
            let config = load_config(config)?;
            let credentials = config.credentials(environment.as_deref())?;
            let api = connect(&config, &credentials)?;
            let reference = reference_for(entry_id, content_type, &credentials, false);
            tracing::info!(command = "metadata", entry_id = %reference.entry_id, "Fetching metadata");
            let metadata = item_metadata(&api, &reference, &credentials, &config.preview)
                .await
                .map_err(|e| anyhow::anyhow!("Metadata fetch failed ({:?}): {e}", e.kind()))?;
            print_json(&metadata)
        }
        Commands::Serve { config, bind } => {
            let config = load_config(config)?;
            let addr = bind.unwrap_or(config.server.bind);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {addr}"))?;
            tracing::info!(command = "serve", %addr, "Starting flag preview server");
            server::serve(listener, Arc::new(config)).await
        }
    }
}
