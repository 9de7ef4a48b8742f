//! Operator CLI for inspecting and revoking sessions.
//!
//! Connects to the same Redis the web tier uses and runs one command
//! against the session vault.

mod commands;
mod config;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Error};
use commands::Command;
use config::AdminConfig;
use pico_args::Arguments;
use session_vault::{SessionVault, store::RedisStore};

const HELP: &str = "\
Inspect and revoke user sessions

USAGE:
  sv_admin [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
  sessions   <user_id>             List live sessions (most recent first)
  revoke     <session_id>          Destroy one session
  revoke-all <user_id>             Destroy every session of a user
  ban        <user_id> [reason]    Mark every session of a user as banned
  unban      <user_id>             Clear the ban flag on every session
  lockout    <identifier>          Show failed-login lockout status
  unlock     <identifier>          Reset the failed-login counter

OPTIONS:
  --redis-url  URL                 Redis connection string  [default: env REDIS_URL or redis://127.0.0.1:6379]

FLAGS:
  --json                           Machine-readable output for `sessions`
  -h, --help                       Print help information

ENVIRONMENT:
  JWT_SECRET                       Access token signing secret (required)
  REDIS_URL                        Redis connection string
  RUST_LOG                         Log filter (default: info)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let redis_url: Option<String> = pargs.opt_value_from_str("--redis-url")?;
    let command = Command::parse(pargs)?;

    logging::init();

    let config = AdminConfig::from_env(redis_url)?;
    tracing::info!("Connecting to Redis at {}", config.store.redis_url);

    let store = RedisStore::connect(&config.store)
        .await
        .context("Failed to connect to Redis")?;
    store.health_check().await.context("Redis health check failed")?;

    let vault = SessionVault::new(Arc::new(store), config.session)?;
    let output = commands::run(&vault, command).await?;
    println!("{output}");

    Ok(())
}
