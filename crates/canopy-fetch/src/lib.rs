//! # canopy-fetch
//!
//! Streaming downloader for a single remote canopy-height GeoTIFF.
//!
//! The fetcher issues one blocking HTTP GET, checks the status, and copies the
//! response body to disk in fixed-size chunks so the whole file never has to
//! be held in memory. There are no retries and no resume: any failure ends the
//! download and is returned to the caller.
//!
//! The default configuration points at one tile of the Meta/WRI global canopy
//! height dataset (California, ALS/GEDI v5 float CHM):
//!
//! `https://dataforgood-fb-data.s3.us-west-2.amazonaws.com/forests/v1/California/alsgedi_ca_v5_float/chm/02122333103.tif`
//!
//! ## Example
//!
//! ```no_run
//! use canopy_fetch::{DownloadCallback, FetchConfig, Fetcher};
//!
//! let fetcher = Fetcher::new(FetchConfig::default())?;
//!
//! let callback: DownloadCallback = Box::new(|msg: &str| println!("{}", msg));
//! let report = fetcher.fetch_with_callback(Some(&callback))?;
//! println!("{} bytes written to {}", report.bytes_written, report.path.display());
//! # Ok::<(), canopy_fetch::FetchError>(())
//! ```

mod error;
mod fetcher;

pub use error::FetchError;
pub use fetcher::{
    copy_in_chunks, DownloadCallback, FetchConfig, FetchReport, Fetcher, CANOPY_SAMPLE_URL,
    DEFAULT_CHUNK_SIZE, DEFAULT_FILE_NAME,
};

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
