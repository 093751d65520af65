//! Entry point for the `mcpd` daemon.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use mcp_graph::{GraphStore, InMemoryGraphStore};
use mcpd::{StructuredHealthReporter, SystemConfigLoader, bootstrap};

fn main() -> ExitCode {
    let store: Arc<dyn GraphStore> = Arc::new(InMemoryGraphStore::new());
    let Ok(daemon) = bootstrap(&SystemConfigLoader, &StructuredHealthReporter::new(), &store)
    else {
        return ExitCode::FAILURE;
    };

    match daemon.serve(io::stdin().lock(), io::stdout()) {
        Ok(summary) => {
            tracing::info!(
                answered = summary.answered,
                skipped = summary.skipped,
                oversized = summary.oversized,
                "input closed; shutting down"
            );
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(%error, "stream terminated");
            ExitCode::FAILURE
        }
    }
}
