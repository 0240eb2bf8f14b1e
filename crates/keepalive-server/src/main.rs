#[tokio::main]
async fn main() -> keepalive_server::Result<()> {
    keepalive_server::init_tracing();
    tracing::info!(
        version = keepalive_server::version::VERSION,
        "keepalive server starting"
    );
    keepalive_server::run().await
}
