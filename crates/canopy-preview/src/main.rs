//! Render a preview of `canopy.tif` to `canopy_preview.png`.
//!
//! Usage: canopy_preview
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use canopy_preview::{run_preview, PreviewConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match run_preview(&PreviewConfig::default()) {
        Ok(report) => println!("Preview saved as '{}'", report.output.display()),
        Err(e) => {
            tracing::error!(error = %e, "Preview failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
