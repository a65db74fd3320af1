//! Applies governor event logs to the configured SQLite database.

use clap::Parser;
use governance_indexer::config::{Ctx, Env};
use governance_indexer::{cli, setup_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = Env::parse();
    let ctx = Ctx::load_file(&env.config)?;
    setup_tracing(&ctx.log_level);

    cli::run(&ctx, env).await?;
    Ok(())
}
