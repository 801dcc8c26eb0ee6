//! updrift CLI - watch a directory and upload new files to Google Drive.
//!
//! On first run the tool walks the operator through the OAuth2
//! authorization-code flow and persists the credential; subsequent runs
//! reuse it. Monitoring then runs until the process is terminated.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use updrift_common::FolderId;
use updrift_storage::gdrive::{
    AuthConfig, AuthManager, AuthState, Authorizer, Credential, DriveRemote, TokenManager,
    TokenStore,
};
use updrift_sync::{SyncConfig, SyncService};

#[derive(Parser)]
#[command(name = "updrift")]
#[command(about = "updrift - upload new files from a directory to Google Drive")]
#[command(version)]
struct Cli {
    /// Google API client ID.
    #[arg(long)]
    client_id: String,

    /// Google API client secret.
    #[arg(long)]
    client_secret: String,

    /// Redirect URI registered for the OAuth flow.
    #[arg(long, default_value = "http://localhost:8080/callback")]
    redirect_uri: String,

    /// ID of the Drive folder to upload files into.
    #[arg(long)]
    folder_id: String,

    /// Directory to monitor for new files.
    #[arg(long)]
    watch_path: PathBuf,

    /// Path of the persisted credential file.
    #[arg(long, default_value = "token.json")]
    token_path: PathBuf,

    /// Also upload files already present when monitoring starts.
    #[arg(long)]
    upload_existing: bool,

    /// Maximum number of uploads in flight at once.
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    run(cli).await
}

/// Wire authorization, the Drive remote and the sync service together,
/// then monitor until externally terminated.
///
/// Per-event failures are logged inside the pipeline; every error that
/// reaches this function is fatal and terminates the process with a
/// non-zero exit code.
async fn run(cli: Cli) -> Result<()> {
    let folder = FolderId::new(cli.folder_id).context("Invalid folder id")?;

    let auth_config = AuthConfig {
        client_id: cli.client_id,
        client_secret: cli.client_secret,
        redirect_url: cli.redirect_uri,
    };
    let manager = AuthManager::new(auth_config).context("Failed to build OAuth client")?;
    let store = TokenStore::new(&cli.token_path);
    let authorizer = Authorizer::new(manager, store);

    let credential = authorize(&authorizer, &cli.token_path).await?;

    let (manager, store) = authorizer.into_parts();
    let token_manager = Arc::new(TokenManager::new(manager, store, credential));
    let remote =
        Arc::new(DriveRemote::new(token_manager).context("Failed to create Drive client")?);

    let config = SyncConfig {
        upload_existing: cli.upload_existing,
        max_concurrent_uploads: cli.concurrency,
    };

    let service = SyncService::new(remote, folder, cli.watch_path, config);
    service.run().await.context("Sync service failed")?;

    Ok(())
}

/// Obtain a credential, interactively if none is stored.
async fn authorize(authorizer: &Authorizer, token_path: &std::path::Path) -> Result<Credential> {
    match authorizer
        .begin()
        .context("Failed to load stored credential")?
    {
        AuthState::Authorized(credential) => {
            info!("Using stored credential from {}", token_path.display());
            Ok(credential)
        }
        AuthState::AwaitingCode { auth_url, .. } => {
            println!("Authorize this app by visiting this URL:");
            println!("{}", auth_url);

            if let Err(err) = open::that(&auth_url) {
                debug!("could not open browser: {}", err);
            }

            let code = prompt_code()?;
            let credential = authorizer
                .complete(&code)
                .await
                .context("Authorization exchange failed")?;

            info!("Credential saved to {}", token_path.display());
            Ok(credential)
        }
        state => anyhow::bail!("Unexpected authorization state: {:?}", state),
    }
}

/// Read the single authorization code line from the operator.
fn prompt_code() -> Result<String> {
    use std::io::{self, Write};

    print!("Enter the code from that page here: ");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut code = String::new();
    io::stdin()
        .read_line(&mut code)
        .context("Failed to read authorization code")?;

    let code = code.trim().to_string();
    if code.is_empty() {
        anyhow::bail!("No authorization code provided");
    }

    Ok(code)
}
