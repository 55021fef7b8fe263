//! `gambit-server`: hosts one chess table over WebSockets.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use gambit::GambitServerBuilder;
use gambit_chess::ChessRules;
use gambit_table::{SoloMovePolicy, TableConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `--verbose`: debug for every gambit crate (trace for per-move oracle
/// detail), info for dependencies.
const VERBOSE_FILTER: &str = "info,gambit=debug,gambit_transport=debug,gambit_protocol=debug,\
gambit_session=debug,gambit_table=debug,gambit_chess=trace";

/// Real-time chess table: two seats, any number of spectators.
#[derive(Parser, Debug)]
#[command(name = "gambit-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "GAMBIT_BIND", default_value = "127.0.0.1:8080")]
    bind: String,

    /// Milliseconds a finished game stays on the board before it resets
    #[arg(long, env = "GAMBIT_RESET_DELAY_MS", default_value_t = 1000)]
    reset_delay_ms: u64,

    /// Ignore moves until both seats are taken
    #[arg(long, env = "GAMBIT_NO_SOLO_MOVES")]
    no_solo_moves: bool,

    /// Close connections silent for this many seconds
    #[arg(long, env = "GAMBIT_IDLE_TIMEOUT_SECS", default_value_t = 60)]
    idle_timeout_secs: u64,

    /// Enable debug logging for gambit crates
    #[arg(short, long, env = "GAMBIT_VERBOSE")]
    verbose: bool,
}

impl Args {
    fn table_config(&self) -> TableConfig {
        TableConfig {
            reset_delay: Duration::from_millis(self.reset_delay_ms),
            solo_moves: if self.no_solo_moves {
                SoloMovePolicy::RequireOpponent
            } else {
                SoloMovePolicy::Allow
            },
            ..TableConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // --verbose > RUST_LOG > "info"
    let filter = if args.verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    let server = GambitServerBuilder::new()
        .bind(&args.bind)
        .idle_timeout(Duration::from_secs(args.idle_timeout_secs))
        .table_config(args.table_config())
        .build::<ChessRules>()
        .await
        .with_context(|| format!("failed to start server on {}", args.bind))?;

    let addr = server.local_addr()?;
    tracing::info!(
        %addr,
        reset_delay_ms = args.reset_delay_ms,
        solo_moves = !args.no_solo_moves,
        "chess table ready"
    );

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
