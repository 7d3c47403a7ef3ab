use std::path::PathBuf;

use tracing::info;

use roombook::shell::Shell;
use roombook::store::Store;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout belongs to the shell
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let metrics_port: Option<u16> = std::env::var("ROOMBOOK_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    roombook::observability::init(metrics_port)?;

    let data_dir = std::env::var("ROOMBOOK_DATA_DIR").unwrap_or_else(|_| "./data".into());
    let compact_threshold: u64 = std::env::var("ROOMBOOK_COMPACT_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    std::fs::create_dir_all(&data_dir)?;

    let store = Store::open(&PathBuf::from(&data_dir), compact_threshold)?;
    info!("  data_dir: {data_dir}");
    info!("  compact_threshold: {compact_threshold}");
    info!(
        "  metrics: {}",
        metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics"))
    );

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut shell = Shell::new(store, stdin.lock(), stdout.lock());
    shell.run()?;
    shell.into_store().close()?;
    Ok(())
}
