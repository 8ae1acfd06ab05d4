#![deny(warnings)]

use anyhow::{Context, Result};
use env_logger::Env;
use marketplace_proxy::args::Args;
use marketplace_proxy::serve;
use std::env;

fn init_logger() {
    let has_debug_flag = env::args().any(|s| s.eq("--debug") || s.eq("-d"));
    let default_filter = if has_debug_flag { "debug" } else { "info" };

    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();
}

fn main() -> Result<()> {
    init_logger();

    // Profile values are exported to the environment before any thread exists.
    let args = Args::parse()?;

    tokio::runtime::Runtime::new()
        .context("Failed to start the async runtime")?
        .block_on(serve(args))
}
