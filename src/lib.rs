pub mod app;
pub mod claude;
pub mod commands;
pub mod config;
pub mod queue;
pub mod session;
pub mod telegram;

#[cfg(test)]
mod test_helpers;

use clap::Parser;

pub async fn run() -> anyhow::Result<()> {
    app::init_tracing();
    let cli = app::Cli::parse();
    app::execute(cli).await
}
