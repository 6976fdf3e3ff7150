//!
//! reg_console binary
//! ------------------
//! Interactive operator console for the REG case-management backend. Restores the
//! persisted session, then drops into the shell. Configuration comes from the
//! environment and command-line flags.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use reg_console::cli::{run_repl, Shell};
use reg_console::config::{ConsoleConfig, ENV_API_BASE_URL, ENV_FALLBACK_PATH, ENV_LOGIN_PATH, ENV_STATE_FILE};
use reg_console::identity::{FileStorage, SessionStore, SystemClock};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--api <url>] [--state <path>] [--login-path <path>] [--fallback-path <path>]\n\nEnvironment:\n  {ENV_API_BASE_URL}   backend base URL (default http://127.0.0.1:8000)\n  {ENV_STATE_FILE}     session state file (default .reg_console/state.json)\n  {ENV_LOGIN_PATH}     page for operators without a session (default /login)\n  {ENV_FALLBACK_PATH}  page for operators a page refuses (default /dashboard)\n  RUST_LOG                   log filter (default info)"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "reg_console".to_string());
    let Some(cfg) = ConsoleConfig::from_env().apply_args(&args[1.min(args.len())..])? else {
        print_usage(&program);
        return Ok(());
    };
    info!(
        target: "reg_console",
        "console starting: api='{}', state='{}', login='{}', fallback='{}'",
        cfg.api_base_url, cfg.state_file.display(), cfg.login_path, cfg.fallback_path
    );

    let store = SessionStore::new(Arc::new(FileStorage::new(&cfg.state_file)), Arc::new(SystemClock));
    store.bootstrap();

    let shell = Shell::new(cfg, store)?;
    run_repl(shell).await
}
