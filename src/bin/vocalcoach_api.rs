use vocalcoach::{http, startup, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    startup::init_logging();

    let config = AppConfig::load();
    log::info!(
        "Starting VocalCoach API on {}:{}",
        config.server.host,
        config.server.port
    );

    http::run_server(config).await
}
