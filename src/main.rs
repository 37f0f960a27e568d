use hrmon::config::Config;
use hrmon::http::LandingPage;
use hrmon::{console, http, ConnectionManager, CsvLog, SampleSink, Status, Transport};
use tokio::sync::watch;
use tracing::metadata::LevelFilter;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::load();
    let code = match run(config).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("hrmon: {err}");
            1
        }
    };
    // The blocking stdin reader would otherwise hold the runtime open until the next line of input.
    std::process::exit(code);
}

#[cfg(target_os = "linux")]
async fn run(config: Config) -> hrmon::Result<()> {
    let transport = hrmon::bluer::BluezTransport::new().await?;
    monitor(config, transport).await
}

#[cfg(not(target_os = "linux"))]
async fn run(_config: Config) -> hrmon::Result<()> {
    Err(hrmon::Error::new(
        hrmon::error::ErrorKind::AdapterUnavailable,
        None,
        "no Bluetooth transport for this platform",
    ))
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
async fn monitor<T>(config: Config, transport: T) -> hrmon::Result<()>
where
    T: Transport + 'static,
{
    let (stop, shutdown) = watch::channel(false);

    let sink: Box<dyn SampleSink> = if config.no_log {
        Box::new(())
    } else {
        Box::new(CsvLog::create_in(&config.log_dir)?)
    };

    let status = Status::with_capacity(config.buffer_capacity);
    let (manager, controls) =
        ConnectionManager::new(transport, config.manager_config(), status.clone(), sink, shutdown.clone());

    let page = LandingPage::load(&config.index);
    tokio::spawn(page.clone().refresh(config.index.clone(), config.page_refresh, shutdown.clone()));
    let server = tokio::spawn(async move {
        if let Err(err) = http::serve(config.http_addr, status, page, shutdown).await {
            error!("status API unavailable: {}", err);
        }
    });
    tokio::spawn(console::run_selector(
        tokio::io::BufReader::new(tokio::io::stdin()),
        controls.events,
        controls.commands,
    ));

    let manager = tokio::spawn(manager.run());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("stopped by user");
            let _ = stop.send(true);
        }
    });

    let res = match manager.await {
        Ok(res) => res,
        Err(err) => Err(hrmon::Error::new(
            hrmon::error::ErrorKind::Other,
            Some(Box::new(err)),
            "connection task panicked",
        )),
    };
    match &res {
        Ok(()) => {
            let _ = server.await;
        }
        Err(err) => {
            error!("monitor failed: {}", err);
            // Nobody sends the shutdown signal after a fatal error.
            server.abort();
        }
    }
    res
}
