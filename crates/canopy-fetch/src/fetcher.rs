//! Blocking HTTP download with a fixed-size chunked copy to disk.

use crate::{FetchError, Result};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Canopy height tile fetched by default.
pub const CANOPY_SAMPLE_URL: &str = "https://dataforgood-fb-data.s3.us-west-2.amazonaws.com/forests/v1/California/alsgedi_ca_v5_float/chm/02122333103.tif";

/// File name the download is saved under.
pub const DEFAULT_FILE_NAME: &str = "canopy_sample.tif";

/// Bytes requested from the response body per read.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Callback type for download progress messages.
pub type DownloadCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Where to download from and where to put the result.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Remote resource to GET.
    pub url: String,
    /// Directory the file is written into. Created if missing.
    pub output_dir: PathBuf,
    /// File name inside `output_dir`.
    pub file_name: String,
    /// Size of each read from the response body.
    pub chunk_size: usize,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            url: CANOPY_SAMPLE_URL.to_string(),
            output_dir: PathBuf::from("."),
            file_name: DEFAULT_FILE_NAME.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: None,
        }
    }
}

impl FetchConfig {
    /// Path of the file the download is written to.
    pub fn destination(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }
}

/// Outcome of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    /// Absolute path of the written file.
    pub path: PathBuf,
    /// Number of body bytes written.
    pub bytes_written: u64,
}

/// Downloads one URL to one local file.
pub struct Fetcher {
    config: FetchConfig,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Create a fetcher, building the blocking HTTP client.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, client })
    }

    /// The configuration this fetcher was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Download the configured URL.
    pub fn fetch(&self) -> Result<FetchReport> {
        self.fetch_with_callback(None)
    }

    /// Download the configured URL with an optional progress callback.
    ///
    /// The destination file is only created once the server has answered with
    /// a success status. If the body fails midway the partially written file
    /// is left on disk.
    pub fn fetch_with_callback(&self, callback: Option<&DownloadCallback>) -> Result<FetchReport> {
        let config = &self.config;

        fs::create_dir_all(&config.output_dir)?;

        let url = config.url.as_str();
        if let Some(cb) = callback {
            cb(&format!("Downloading {}...", url));
        }
        info!(url, "Starting download");

        let mut response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        debug!(status = status.as_u16(), content_length = ?response.content_length(), "Response accepted");

        let destination = config.destination();
        let mut file = fs::File::create(&destination)?;
        let bytes_written = copy_in_chunks(&mut response, &mut file, config.chunk_size)?;
        file.flush()?;

        let path = std::path::absolute(&destination)?;
        info!(path = %path.display(), bytes_written, "Download complete");
        if let Some(cb) = callback {
            cb(&format!("Download complete! File saved as {}", path.display()));
        }

        Ok(FetchReport {
            path,
            bytes_written,
        })
    }
}

/// Copy `reader` into `writer` in reads of at most `chunk_size` bytes.
///
/// A zero-length read ends the copy and is not written. Returns the number
/// of bytes copied.
pub fn copy_in_chunks<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
) -> io::Result<u64> {
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Component;

    /// Reader that hands out at most `step` bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Writer that records the size of every write.
    #[derive(Default)]
    struct Recorder {
        bytes: Vec<u8>,
        writes: Vec<usize>,
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.bytes.extend_from_slice(buf);
            self.writes.push(buf.len());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_copy_preserves_bytes() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let mut out = Recorder::default();

        let copied = copy_in_chunks(&mut data.as_slice(), &mut out, DEFAULT_CHUNK_SIZE).unwrap();

        assert_eq!(copied, data.len() as u64);
        assert_eq!(out.bytes, data);
        // 8192 + 8192 + 3616
        assert_eq!(out.writes, vec![8192, 8192, 3616]);
    }

    #[test]
    fn test_copy_never_writes_empty_chunk() {
        let data = b"abcdefghij";
        let mut reader = Trickle { data, step: 3 };
        let mut out = Recorder::default();

        copy_in_chunks(&mut reader, &mut out, 8).unwrap();

        assert_eq!(out.bytes, data);
        assert!(out.writes.iter().all(|&n| n > 0));
        assert_eq!(out.writes, vec![3, 3, 3, 1]);
    }

    #[test]
    fn test_copy_empty_body() {
        let mut out = Recorder::default();
        let copied = copy_in_chunks(&mut io::empty(), &mut out, DEFAULT_CHUNK_SIZE).unwrap();
        assert_eq!(copied, 0);
        assert!(out.writes.is_empty());
    }

    #[test]
    fn test_zero_chunk_size_still_copies() {
        let data = b"xyz";
        let mut out = Recorder::default();
        copy_in_chunks(&mut data.as_slice(), &mut out, 0).unwrap();
        assert_eq!(out.bytes, data);
    }

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.url, CANOPY_SAMPLE_URL);
        assert_eq!(config.chunk_size, 8192);
        assert!(config.timeout.is_none());
        assert_eq!(config.destination(), PathBuf::from("./canopy_sample.tif"));
    }

    #[test]
    fn test_default_destination_reports_without_dot_component() {
        let destination = FetchConfig::default().destination();
        let reported = std::path::absolute(&destination).unwrap();

        assert_eq!(reported, std::env::current_dir().unwrap().join(DEFAULT_FILE_NAME));
        assert!(!reported.components().any(|c| c == Component::CurDir));
    }
}
