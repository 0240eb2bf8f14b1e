use serde::Deserialize;

pub const ENV_PREFIX: &str = "PULSEKEEP_SERVER";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub probe: ProbeConfig,
    pub sweep: SweepConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Upper bound on how long a single liveness probe may wait.
    pub timeout_secs: u64,
    /// Admit plain-http targets. Intended for local/dev deployments only;
    /// registration is HTTPS-only when this is off.
    pub allow_insecure_targets: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Cadence of the built-in sweep loop. `0` disables the loop so sweeps
    /// only run when `POST /api/v1/sweep` is invoked by an external trigger.
    pub interval_secs: u64,
}

fn default_probe_timeout_secs() -> u64 {
    30
}

fn default_sweep_interval_secs() -> u64 {
    30
}

pub fn load() -> anyhow::Result<AppConfig> {
    let env = config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        // Values stay strings here; coercion happens during deserialization.
        .try_parsing(false);

    let builder = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(env)
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("database.url", "sqlite://data/pulsekeep.db")?
        .set_default("probe.timeout_secs", default_probe_timeout_secs())?
        .set_default("probe.allow_insecure_targets", false)?
        .set_default("sweep.interval_secs", default_sweep_interval_secs())?;

    let cfg: AppConfig = builder.build()?.try_deserialize()?;
    Ok(cfg)
}
