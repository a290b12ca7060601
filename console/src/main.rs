mod app;
mod command;
mod config;
mod telemetry;
mod transport;

use config::Settings;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load();
    telemetry::init();
    app::run(settings).await
}
