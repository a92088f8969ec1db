use tracing_subscriber::EnvFilter;

use zenmeds::config;
use zenmeds::db::SqliteStore;
use zenmeds::engine::{LogSink, MedEngine};
use zenmeds::monitor::MonitorConfig;
use zenmeds::runtime::start_alarm_engine;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("ZenMeds starting v{}", config::APP_VERSION);

    std::fs::create_dir_all(config::app_data_dir())
        .expect("cannot create application data directory");

    let store = SqliteStore::open(&config::database_path())
        .expect("cannot open the ZenMeds database");
    let engine = MedEngine::new(
        Box::new(store),
        Box::new(LogSink),
        MonitorConfig::default(),
    )
    .expect("cannot load treatments");

    let handle = start_alarm_engine(engine);
    handle.join();
}
