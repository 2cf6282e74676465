use album_driver::cdp::CdpPage;
use album_driver::driver;
use album_driver::machine::StateMachine;
use album_driver::oracle::HttpOracle;
use album_driver::remote_log::RemoteLog;
use album_proto::config::Config;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = album_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("driver.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,album=debug,album_driver=debug")
            }),
        )
        .init();

    info!("Log file: {:?}", log_path);

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.driver.request_timeout_ms))
        .build()?;

    let log = RemoteLog::spawn(&config.driver.oracle_url, client.clone());
    let oracle = HttpOracle::new(client.clone(), config.driver.oracle_url.clone());
    let page = CdpPage::connect(&config.browser, config.selectors.clone(), &client).await?;

    let mut machine = StateMachine::new(page, oracle, log, config.driver.retry_budget);
    driver::run(&mut machine).await;
    Ok(())
}
