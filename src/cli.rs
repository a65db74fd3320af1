//! Batch ingestion of newline-delimited JSON RPC logs, as produced by
//! `eth_getLogs` tooling, into the entity store.

use alloy::rpc::types::Log;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

use crate::config::{Ctx, Env};
use crate::error::IndexError;
use crate::indexer::{Indexer, Outcome};
use crate::store::{EntityStore, SqliteStore};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read log stream")]
    Io(#[from] std::io::Error),
    #[error("line {line}: malformed RPC log")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: {source}")]
    Index {
        line: usize,
        #[source]
        source: IndexError,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub applied: usize,
    pub skipped: usize,
}

/// Applies every log in `reader` in order. Blank lines are ignored; the
/// first malformed line or store failure stops ingestion.
pub async fn ingest<S, R>(indexer: &Indexer<S>, reader: R) -> Result<IngestSummary, IngestError>
where
    S: EntityStore,
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut summary = IngestSummary::default();
    let mut line = 0;

    while let Some(text) = lines.next_line().await? {
        line += 1;

        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let log: Log = serde_json::from_str(text)
            .map_err(|source| IngestError::Malformed { line, source })?;

        match indexer
            .apply_log(&log)
            .await
            .map_err(|source| IngestError::Index { line, source })?
        {
            Outcome::Applied(_) => summary.applied += 1,
            Outcome::Skipped(_) => summary.skipped += 1,
        }
    }

    Ok(summary)
}

/// Opens the configured database, applies pending migrations and ingests
/// the log file named on the command line, or stdin.
#[tracing::instrument(skip_all, fields(config = %env.config.display()))]
pub async fn run(ctx: &Ctx, env: Env) -> anyhow::Result<IngestSummary> {
    let pool = ctx.get_sqlite_pool().await?;
    sqlx::migrate!().run(&pool).await?;

    let indexer = Indexer::new(SqliteStore::new(pool), ctx.policy);

    let summary = match env.logs {
        Some(path) => {
            let file = tokio::fs::File::open(&path).await?;
            ingest(&indexer, BufReader::new(file)).await?
        }
        None => ingest(&indexer, BufReader::new(tokio::io::stdin())).await?,
    };

    info!(
        applied = summary.applied,
        skipped = summary.skipped,
        "Ingestion complete"
    );

    Ok(summary)
}
