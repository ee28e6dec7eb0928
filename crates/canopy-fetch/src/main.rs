//! Download the canopy height sample tile into the current directory.
//!
//! Usage: download_canopy
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use canopy_fetch::{DownloadCallback, FetchConfig, Fetcher};
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let callback: DownloadCallback = Box::new(|msg: &str| println!("{}", msg));

    let result = Fetcher::new(FetchConfig::default())
        .and_then(|fetcher| fetcher.fetch_with_callback(Some(&callback)));

    if let Err(e) = result {
        tracing::error!(error = %e, "Download failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
