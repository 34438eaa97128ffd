use crate::claude::ClaudeCliRunner;
use crate::config::{ConfigArgs, ReachoutConfig};
use crate::queue::Orchestrator;
use crate::telegram::{Notifier, ReplyWaiter, TelegramClient, TelegramNotifier, TelegramPoller};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const INBOUND_BUFFER: usize = 64;

#[derive(Debug, Parser)]
#[command(
    name = "agent-reachout",
    about = "Drive Claude Code from a Telegram chat",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the task runner (default)
    Serve,
    /// Send one message to the configured chat
    Notify {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Send a message and print the next reply from the chat
    Ask {
        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
        #[arg(required = true)]
        text: Vec<String>,
    },
}

/// Logs go to stderr; stdout carries `ask` replies.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config.resolve().context("Invalid configuration")?;

    match cli.command.unwrap_or(CliCommand::Serve) {
        CliCommand::Serve => serve(config).await,
        CliCommand::Notify { text } => notify(&config, &text.join(" ")).await,
        CliCommand::Ask { timeout_secs, text } => {
            let reply = ask(&config, &text.join(" "), Duration::from_secs(timeout_secs)).await?;
            println!("{}", reply);
            Ok(())
        }
    }
}

fn telegram_client(config: &ReachoutConfig) -> Arc<TelegramClient> {
    Arc::new(TelegramClient::new(
        &config.telegram_api_base,
        &config.bot_token,
    ))
}

/// Polls Telegram and runs queued jobs until interrupted.
pub async fn serve(config: ReachoutConfig) -> anyhow::Result<()> {
    let client = telegram_client(&config);
    let me = client
        .get_me()
        .await
        .context("Failed to look up the bot account")?;
    let dispatcher = config.dispatcher().with_bot_username(me.username.clone());

    let notifier = Arc::new(TelegramNotifier::new(client.clone(), config.chat_id.clone()));
    let runner = Arc::new(ClaudeCliRunner::new());
    let orchestrator = Orchestrator::new(config.orchestrator_config(), runner, notifier);

    let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
    let poller = TelegramPoller::new(client, config.poll_timeout_secs);
    let poller_task = tokio::spawn(poller.run(tx));

    info!(
        chat_id = %config.chat_id,
        bot = ?me.username,
        task_prefix = %config.task_prefix,
        claude_command = %config.claude_command,
        "Agent reachout running"
    );

    tokio::select! {
        _ = orchestrator.run(dispatcher, rx) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Shutting down");
        }
    }

    poller_task.abort();
    Ok(())
}

pub async fn notify(config: &ReachoutConfig, text: &str) -> anyhow::Result<()> {
    let notifier = TelegramNotifier::new(telegram_client(config), config.chat_id.clone());
    notifier
        .send(text)
        .await
        .context("Failed to send notification")?;
    info!(chat_id = %config.chat_id, "Notification sent");
    Ok(())
}

/// Sends `text` and waits for the next text message from the configured chat.
/// Messages already pending when the question goes out are skipped.
pub async fn ask(config: &ReachoutConfig, text: &str, timeout: Duration) -> anyhow::Result<String> {
    let client = telegram_client(config);

    let mut backlog = TelegramPoller::new(client.clone(), 0);
    backlog
        .poll_once()
        .await
        .context("Failed to read pending Telegram updates")?;
    debug!(offset = backlog.offset(), "Skipped pending updates");

    let waiter = Arc::new(ReplyWaiter::new());
    let pending = waiter.register(config.chat_id.clone());

    let notifier = TelegramNotifier::new(client.clone(), config.chat_id.clone());
    notifier.send(text).await.context("Failed to send question")?;

    let (tx, mut rx) = mpsc::channel(INBOUND_BUFFER);
    let poller = TelegramPoller::new(client, config.poll_timeout_secs).with_offset(backlog.offset());
    let poller_task = tokio::spawn(poller.run(tx));

    let chat_id = config.chat_id.clone();
    let feeder = {
        let waiter = Arc::clone(&waiter);
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if message.chat_id != chat_id || message.from_bot {
                    continue;
                }
                if let Some(text) = message.text {
                    if waiter.offer(&chat_id, text) {
                        break;
                    }
                }
            }
        })
    };

    let reply = pending.wait(timeout).await;
    waiter.close();
    feeder.abort();
    poller_task.abort();

    reply.context("No reply received")
}
