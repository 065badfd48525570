use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use shelterbot::cli::{Cli, Commands};
use shelterbot::conversation::{ConversationEngine, NotificationSink};
use shelterbot::core::metrics::init_metrics;
use shelterbot::core::metrics_server::start_metrics_server;
use shelterbot::core::{config, init_logger, log_startup_configuration};
use shelterbot::lifecycle::{start_scheduler, LifecycleRunner, SweepKind, SweepSchedule};
use shelterbot::storage::{create_pool, DbPool, SqliteStore};
use shelterbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramSink};

/// Main entry point
///
/// Parses CLI arguments and dispatches to the matching subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics from spawned tasks instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // .env goes first so LOG_FILE_PATH and friends can come from it
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Sweep { kind }) => run_single_sweep(kind.into()).await,
        Some(Commands::Migrate) => run_migrate(),
    }
}

fn open_database() -> Result<Arc<DbPool>> {
    let pool = create_pool(&config::DATABASE_PATH)
        .with_context(|| format!("Failed to open database at {}", config::DATABASE_PATH.as_str()))?;
    Ok(Arc::new(pool))
}

/// Applies migrations and exits
fn run_migrate() -> Result<()> {
    open_database()?;
    log::info!("Database {} is up to date", config::DATABASE_PATH.as_str());
    Ok(())
}

/// Runs one sweep immediately, ignoring the daytime window
async fn run_single_sweep(kind: SweepKind) -> Result<()> {
    let pool = open_database()?;
    let store = Arc::new(SqliteStore::new(pool));
    let sink: Arc<dyn NotificationSink> = Arc::new(TelegramSink::new(create_bot()?));

    let runner = LifecycleRunner::new(store, sink, *config::SUPPORT_CHAT_ID);
    let summary = runner
        .run(kind)
        .await
        .with_context(|| format!("{} sweep failed", kind))?;

    log::info!("{} sweep finished: {:?}", kind, summary);
    Ok(())
}

async fn run_bot() -> Result<()> {
    let bot_init_start = std::time::Instant::now();
    log::info!("Starting bot...");
    log_startup_configuration();

    init_metrics();

    let bot = create_bot()?;

    let bot_info = bot.get_me().await.context("Failed to reach the Bot API")?;
    let bot_username = bot_info.username.clone();
    let bot_id = bot_info.id;
    log::info!("Bot username: {:?}, Bot ID: {}", bot_username, bot_id);

    setup_bot_commands(&bot).await?;

    let pool = open_database()?;
    let store = Arc::new(SqliteStore::new(pool));
    let telegram = Arc::new(TelegramSink::new(bot.clone()));
    let sink: Arc<dyn NotificationSink> = telegram.clone();

    let engine = ConversationEngine::new(store.clone(), store.clone(), telegram);

    let cancel = CancellationToken::new();
    let runner = Arc::new(LifecycleRunner::new(store, sink.clone(), *config::SUPPORT_CHAT_ID));
    let scheduler_handles = start_scheduler(runner, SweepSchedule::from_config(), cancel.clone());

    if *config::metrics::ENABLED {
        let port = *config::metrics::PORT;
        tokio::spawn(async move {
            if let Err(e) = start_metrics_server(port).await {
                log::error!("Metrics server error: {}", e);
            }
        });
    }

    let handler = schema(HandlerDeps::new(engine, sink, bot_username, bot_id));

    log::info!("================================================");
    log::info!("🎉 Bot initialization complete in {:.2}s", bot_init_start.elapsed().as_secs_f64());
    log::info!("📡 Ready to receive updates!");
    log::info!("================================================");

    let max_retries = config::retry::MAX_DISPATCHER_RETRIES;
    let mut retry_count = 0;

    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // A separate task isolates dispatcher panics; they surface through the JoinHandle
        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            let listener = Polling::builder(bot_clone.clone()).build();

            Dispatcher::builder(bot_clone, handler_clone)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) if join_err.is_panic() => {
                log::error!("Dispatcher panicked: {}", join_err);
                if retry_count >= max_retries {
                    log::error!("Max retries reached after panic. Exiting...");
                    break;
                }
                retry_count += 1;
                log::info!(
                    "Retrying dispatcher connection after panic (attempt {}/{})...",
                    retry_count,
                    max_retries
                );
                exponential_backoff(retry_count).await;
            }
            Err(join_err) => {
                log::warn!("Dispatcher task was cancelled: {}", join_err);
                break;
            }
        }

        sleep(config::retry::dispatcher_delay()).await;
    }

    cancel.cancel();
    for handle in scheduler_handles {
        if let Err(e) = handle.await {
            log::warn!("Sweep loop ended abnormally: {}", e);
        }
    }

    Ok(())
}

/// Exponential backoff delay for retries
async fn exponential_backoff(retry_count: u32) {
    let delay = Duration::from_secs(config::retry::EXPONENTIAL_BACKOFF_BASE.pow(retry_count));
    sleep(delay).await;
}
