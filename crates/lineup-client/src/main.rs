// Lineup client entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, the console belongs to the renderer)
// 2. Load config
// 3. Build the HTTP gateway
// 4. Create mpsc channels and the session
// 5. Spawn the session task
// 6. Run the console front end until the user quits
// 7. Wait for the session task to wind down

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use lineup_client::config;
use lineup_client::gateway::{HttpGateway, QueryGateway};
use lineup_client::render::{self, ConsoleSink};
use lineup_client::session::{self, Session};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Tracing
    init_tracing()?;
    info!("Lineup client starting up");

    // 2. Config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: days={}, pool_size={}, limit={}",
        config.session.days, config.session.pool_size, config.session.limit
    );

    // 3. Gateway
    let gateway = HttpGateway::from_config(&config.api).context("failed to build HTTP client")?;
    info!("Using LineupLogic API at {}", gateway.base_url());
    let gateway: Arc<dyn QueryGateway> = Arc::new(gateway);

    // 4. Channels and session
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (outcome_tx, outcome_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);
    let session = Session::new(&config.session, gateway, outcome_tx);

    // 5. Session task
    let session_handle = tokio::spawn(async move {
        if let Err(e) = session::run(cmd_rx, outcome_rx, ui_tx, session).await {
            error!("Session loop error: {}", e);
        }
    });

    // 6. Console front end (returns on quit or end of input)
    let stdin = BufReader::new(tokio::io::stdin());
    let mut sink = ConsoleSink::new(std::io::stdout());
    if let Err(e) = render::run(ui_rx, cmd_tx, stdin, &mut sink).await {
        error!("Console error: {}", e);
    }

    // 7. Cleanup: wait for the session task (with timeout)
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = session_handle.await;
    })
    .await;

    info!("Lineup client shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which shows the
/// rendered session).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("lineup-client.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lineup_client=info,lineup=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
