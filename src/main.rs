//! Schemaform - project create form driven from the terminal
//!
//! Reads line commands from stdin, drives a schema-backed form through its
//! field events and submission lifecycle, and prints the resulting state.

mod projects;
mod session;

use anyhow::Result;
use projects::ProjectStore;
use schemaform::FormConfig;
use std::io;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = FormConfig::load()?;

    // Initialize logging
    let fallback_filter = config
        .log_filter
        .clone()
        .unwrap_or_else(|| "schemaform=info".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let store = ProjectStore::default();
    let mut form = projects::project_form(&config, store.clone());
    tracing::debug!(fields = form.fields().len(), "Project form ready");

    let result = session::run(
        &mut form,
        &store,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}
