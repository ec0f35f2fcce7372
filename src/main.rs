mod categorize;
mod collect;
mod config;
mod extract;
#[cfg(test)]
mod fakes;
mod google;
mod ledger;
mod models;
mod run;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    match args.len() {
        0 | 1 => run::once(),
        _ => run::as_cli(&args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
