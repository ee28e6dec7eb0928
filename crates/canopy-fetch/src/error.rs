//! Error types for the fetch crate.

use thiserror::Error;

/// Errors that can occur while downloading the raster.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or body-read failure inside the HTTP client.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Failed to download {url}: HTTP {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },

    /// I/O error creating the directory or writing the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Status code of a rejected response, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            FetchError::Http(e) => e.status().map(|s| s.as_u16()),
            FetchError::Io(_) => None,
        }
    }
}
