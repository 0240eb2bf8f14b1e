use std::path::PathBuf;

use serde::Deserialize;

pub const ENV_PREFIX: &str = "PULSEKEEP_AGENT";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base URL of the keepalive server.
    pub server_url: String,
    /// Directory holding the agent's local state (client identity).
    pub state_dir: String,
    /// Cadence of the redundant keepalive pings.
    pub ping_interval_secs: u64,
    /// Cadence at which the tracked target set is refreshed from the server.
    pub refresh_interval_secs: u64,
    /// Upper bound on how long a single ping may wait.
    pub ping_timeout_secs: u64,
}

impl AppConfig {
    pub fn client_id_path(&self) -> PathBuf {
        PathBuf::from(&self.state_dir).join("client-id")
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    let env = config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(false);

    let builder = config::Config::builder()
        .add_source(config::File::with_name("agent").required(false))
        .add_source(env)
        .set_default("server_url", "http://127.0.0.1:8080")?
        .set_default("state_dir", "data/agent")?
        .set_default("ping_interval_secs", 30)?
        .set_default("refresh_interval_secs", 60)?
        .set_default("ping_timeout_secs", 30)?;

    let cfg: AppConfig = builder.build()?.try_deserialize()?;
    Ok(cfg)
}
