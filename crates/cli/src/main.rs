mod console;

use std::{path::PathBuf, sync::Arc};

use {
    clap::Parser,
    tokio::io::{AsyncBufReadExt, BufReader},
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    weft_commands::{
        AiCommand, CommandRegistry, ManageCommand, TrackCommand, TrackingClient, TranslateCommand,
    },
    weft_common::keys,
    weft_dispatch::Dispatcher,
    weft_openai::OpenAiClient,
    weft_platform::{InboundEvent, InboundMessage, MessageRef},
    weft_store::ConversationStore,
};

use console::ConsoleClient;

#[derive(Parser)]
#[command(name = "weft", about = "weft — chat command router")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides discovery).
    #[arg(long, env = "WEFT_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the config value).
    #[arg(long, env = "WEFT_DB")]
    db: Option<PathBuf>,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "weft starting");

    let config = match &cli.config {
        Some(path) => weft_config::load_config(path)?,
        None => weft_config::discover_and_load(),
    };
    if config.platform.token.is_none() {
        warn!("platform token is not configured, a gateway connection cannot be established");
    }
    if let Some(guild_id) = config.platform.management_guild_id {
        info!(guild_id, "management guild configured");
    }

    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.database.path));
    let store = ConversationStore::open(&db_path).await?;
    info!(db = %db_path.display(), "conversation store opened");

    let openai = OpenAiClient::new(
        config.openai.base_url.clone(),
        config.openai.api_key.clone(),
    );

    let mut registry = CommandRegistry::new();
    registry.register(
        keys::CMD_AI,
        Box::new(AiCommand::new(
            openai.clone(),
            config.openai.default_model.clone(),
            config.openai.classifier_model.clone(),
        )),
    );
    registry.register(
        keys::CMD_TRANSLATE,
        Box::new(TranslateCommand::new(
            openai,
            config.openai.default_model.clone(),
        )),
    );
    match config.tracking.base_url.clone() {
        Some(base_url) => {
            registry.register(
                keys::CMD_TRACK,
                Box::new(TrackCommand::new(TrackingClient::new(
                    base_url,
                    config.tracking.api_key.clone(),
                ))),
            );
        },
        None => warn!("tracking config is empty, track command disabled"),
    }
    registry.register(keys::CMD_MANAGE, Box::new(ManageCommand));

    let client = Arc::new(ConsoleClient::new());
    let dispatcher = Arc::new(Dispatcher::new(registry, store, client.clone()));

    run_console(&dispatcher, &client).await
}

/// Local console harness standing in for a gateway connection: each line
/// becomes a free-text event, and `@<id> <text>` replies to a previously
/// printed message id.
async fn run_console(dispatcher: &Arc<Dispatcher>, client: &ConsoleClient) -> anyhow::Result<()> {
    println!("weft console. `<command> <message>` to invoke, `@<id> <text>` to reply, Ctrl-D to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (content, reply_to) = parse_line(line);
        let event = InboundEvent::Message(InboundMessage {
            id: client.allocate_id(),
            channel_id: 0,
            author_id: 0,
            author_is_bot: false,
            content,
            reply_to,
            attachments: vec![],
        });
        let _ = dispatcher.dispatch(event);
    }
    Ok(())
}

/// `@<id> <text>` carries a reply pointer; anything else is plain text.
fn parse_line(line: &str) -> (String, Option<MessageRef>) {
    if let Some(rest) = line.strip_prefix('@') {
        if let Some((raw_id, text)) = rest.split_once(' ') {
            if let Ok(id) = raw_id.parse::<i64>() {
                return (
                    text.trim().to_string(),
                    Some(MessageRef {
                        id,
                        content: None,
                        attachment_url: None,
                    }),
                );
            }
        }
    }
    (line.to_string(), None)
}
