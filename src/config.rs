use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::identity::{DEFAULT_LOGIN_PATH, DEFAULT_UNAUTHORIZED_PATH};

pub const ENV_API_BASE_URL: &str = "REG_CONSOLE_API_BASE_URL";
pub const ENV_STATE_FILE: &str = "REG_CONSOLE_STATE_FILE";
pub const ENV_LOGIN_PATH: &str = "REG_CONSOLE_LOGIN_PATH";
pub const ENV_FALLBACK_PATH: &str = "REG_CONSOLE_FALLBACK_PATH";

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub state_file: PathBuf,
    pub login_path: String,
    /// Where authenticated operators land when a page refuses them.
    pub fallback_path: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            state_file: PathBuf::from(".reg_console").join("state.json"),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            fallback_path: DEFAULT_UNAUTHORIZED_PATH.to_string(),
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(v) = get(ENV_API_BASE_URL) { cfg.api_base_url = v; }
        if let Some(v) = get(ENV_STATE_FILE) { cfg.state_file = PathBuf::from(v); }
        if let Some(v) = get(ENV_LOGIN_PATH) { cfg.login_path = v; }
        if let Some(v) = get(ENV_FALLBACK_PATH) { cfg.fallback_path = v; }
        cfg
    }

    /// Apply command-line flags on top of the environment. Returns `Ok(None)` when help was requested.
    pub fn apply_args(mut self, args: &[String]) -> Result<Option<Self>> {
        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "-h" | "--help" => return Ok(None),
                "--api" | "--state" | "--login-path" | "--fallback-path" => {
                    let value = args.get(i + 1).ok_or_else(|| anyhow!("{flag} requires a value"))?.clone();
                    match flag {
                        "--api" => self.api_base_url = value,
                        "--state" => self.state_file = PathBuf::from(value),
                        "--login-path" => self.login_path = value,
                        _ => self.fallback_path = value,
                    }
                    i += 2;
                }
                other => return Err(anyhow!("unknown argument '{other}'")),
            }
        }
        Ok(Some(self))
    }
}
