#[tokio::main]
async fn main() -> pinger_agent::Result<()> {
    pinger_agent::init_tracing();
    let mode = pinger_agent::parse_command()?;
    tracing::info!(version = pinger_agent::VERSION, mode = ?mode, "pinger agent starting");
    pinger_agent::run(mode).await
}
