//! Ranged, parallel file download
//!
//! A [`Downloader`] sizes the remote object with one HEAD request, splits it
//! with a [`RangeStrategy`], and fetches every range concurrently with
//! `Range:` GETs, writing each body chunk straight to its offset in the
//! destination as it arrives.
//!
//! Transient failures (temporary network errors, truncated bodies) are retried
//! per range under a bounded [`RetryPolicy`]. Anything else fails the range,
//! and the first failed range fails the download once every task has finished.
//! A failed download may leave the destination partially written.

use crate::config::Config;
use crate::error::{Error, FetchError, Result, TransportError};
use crate::progress::{FinishGuard, NoProgress, ProgressBarObserver, ProgressObserver, ProgressState};
use crate::ranger::{Range, RangeStrategy};
use crate::retry::RetryPolicy;
use crate::transport::HttpTransport;
use bytes::Bytes;
use futures::TryStreamExt;
use std::fs::File;
use std::io;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

const PARTIAL_CONTENT: u16 = 206;

/// Positional, concurrency-safe writes
pub trait WriteAt: Send + Sync + 'static {
    /// Write `buf` at `offset`, returning how many bytes were written
    fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize>;

    /// Write all of `buf` starting at `offset`
    fn write_all_at(&self, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write_at(buf, offset) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write whole buffer",
                    ))
                }
                Ok(n) => {
                    buf = &buf[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl WriteAt for File {
    #[cfg(unix)]
    fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::write_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_write(self, buf, offset)
    }
}

/// Parallel range downloader
pub struct Downloader<T: HttpTransport> {
    transport: Arc<T>,
    ranger: Arc<dyn RangeStrategy>,
    retry: RetryPolicy,
    observer: Arc<dyn ProgressObserver>,
}

impl<T: HttpTransport> std::fmt::Debug for Downloader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl<T: HttpTransport> Downloader<T> {
    /// Create a downloader with the default retry policy and no progress output
    pub fn new(transport: T, ranger: impl RangeStrategy + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            ranger: Arc::new(ranger),
            retry: RetryPolicy::default(),
            observer: Arc::new(NoProgress::default()),
        }
    }

    /// Create a downloader from configuration; `label` names the progress bar
    pub fn from_config(transport: T, config: &Config, label: &str) -> Self {
        let observer: Arc<dyn ProgressObserver> = if config.show_progress {
            Arc::new(ProgressBarObserver::new(label))
        } else {
            Arc::new(NoProgress::default())
        };

        Self::new(transport, config.ranger())
            .with_retry(config.retry_policy())
            .with_observer(observer)
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the progress observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Download `content_url` into `destination`.
    ///
    /// Redirects are resolved once by the HEAD request; every ranged GET goes
    /// to the resolved URL.
    ///
    /// # Errors
    ///
    /// - [`Error::Head`] / [`Error::MissingContentLength`] if sizing fails
    /// - [`Error::BuildRange`] if the strategy rejects the length
    /// - [`Error::Fetch`] for the first range that failed
    /// - [`Error::Task`] if a fetch task panicked
    pub async fn download<W: WriteAt>(&self, destination: Arc<W>, content_url: &str) -> Result<()> {
        let head = self
            .transport
            .head(content_url)
            .await
            .map_err(|source| Error::Head {
                url: content_url.to_string(),
                source,
            })?;

        let effective_url: Arc<str> = Arc::from(head.final_url);
        let content_length = head
            .content_length
            .ok_or_else(|| Error::MissingContentLength {
                url: effective_url.to_string(),
            })?;

        let ranges = self.ranger.build_range(content_length)?;

        let progress = Arc::new(ProgressState::new(content_length));
        self.observer.set_total(content_length);
        self.observer.kickoff();
        let _finish = FinishGuard::new(self.observer.as_ref());

        info!(
            url = %effective_url,
            bytes = content_length,
            ranges = ranges.len(),
            "starting ranged download"
        );

        let mut tasks = JoinSet::new();
        for range in ranges {
            let fetch = RangeFetch {
                transport: Arc::clone(&self.transport),
                url: Arc::clone(&effective_url),
                destination: Arc::clone(&destination),
                progress: Arc::clone(&progress),
                observer: Arc::clone(&self.observer),
                retry: self.retry,
            };
            let _ = tasks.spawn(async move {
                fetch.run(&range).await.map_err(|source| Error::Fetch {
                    range: range.http_header.clone(),
                    source,
                })
            });
        }

        // Siblings keep running after a failure; only the first error is kept.
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|e| Err(Error::Task(e.to_string())));
            if let Err(err) = outcome {
                debug!(error = %err, "range failed");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        info!(
            url = %effective_url,
            bytes = progress.written(),
            "download complete"
        );
        Ok(())
    }
}

/// Why a single attempt at a range failed
enum AttemptError {
    Transient(TransportError),
    Fatal(FetchError),
}

/// Everything one fetch task needs, owned so it can move into the task
struct RangeFetch<T, W> {
    transport: Arc<T>,
    url: Arc<str>,
    destination: Arc<W>,
    progress: Arc<ProgressState>,
    observer: Arc<dyn ProgressObserver>,
    retry: RetryPolicy,
}

impl<T: HttpTransport, W: WriteAt> RangeFetch<T, W> {
    async fn run(&self, range: &Range) -> std::result::Result<(), FetchError> {
        let mut attempts = 0;
        let written = loop {
            attempts += 1;
            debug!(range = %range, attempt = attempts, "requesting range");

            match self.attempt(range).await {
                Ok(written) => break written,
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Transient(last)) => {
                    if !self.retry.allows_another(attempts) {
                        return Err(FetchError::RetriesExhausted { attempts, last });
                    }
                    let delay = self.retry.delay_for(attempts - 1);
                    warn!(
                        range = %range,
                        attempt = attempts,
                        error = %last,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "transient failure, retrying range"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        };

        // Counted once the whole range is on disk.
        let _ = self.progress.add(written);
        let _ = self.observer.add(written);
        Ok(())
    }

    /// Stream one response into the destination; a retry rewrites from `range.lower`.
    async fn attempt(&self, range: &Range) -> std::result::Result<u64, AttemptError> {
        let response = match self.transport.get_range(&self.url, &range.http_header).await {
            Ok(response) => response,
            Err(e) if e.is_transient() => return Err(AttemptError::Transient(e)),
            Err(e) => return Err(AttemptError::Fatal(FetchError::Transport(e))),
        };

        if response.status != PARTIAL_CONTENT {
            return Err(AttemptError::Fatal(FetchError::Status {
                status: response.status,
            }));
        }

        let expected = range.len();
        let mut received: u64 = 0;
        let mut stream = response.body;
        loop {
            let chunk = match stream.try_next().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) if e.is_unexpected_eof() => return Err(AttemptError::Transient(e)),
                Err(e) => return Err(AttemptError::Fatal(FetchError::Transport(e))),
            };

            let actual = received + chunk.len() as u64;
            if actual > expected {
                return Err(AttemptError::Fatal(FetchError::LengthMismatch { expected, actual }));
            }

            self.write_chunk(chunk, range.lower + received)
                .await
                .map_err(AttemptError::Fatal)?;
            received = actual;
        }

        if received < expected {
            return Err(AttemptError::Transient(TransportError::unexpected_eof(
                format!("unexpected EOF: expected {expected} bytes, got {received}"),
            )));
        }

        Ok(received)
    }

    async fn write_chunk(&self, chunk: Bytes, offset: u64) -> std::result::Result<(), FetchError> {
        if chunk.is_empty() {
            return Ok(());
        }
        let destination = Arc::clone(&self.destination);
        tokio::task::spawn_blocking(move || destination.write_all_at(&chunk, offset))
            .await
            .map_err(|e| FetchError::Write(io::Error::other(e)))?
            .map_err(FetchError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Buffer(Mutex<Vec<u8>>);

    impl WriteAt for Buffer {
        fn write_at(&self, buf: &[u8], offset: u64) -> io::Result<usize> {
            let mut data = self.0.lock().unwrap();
            let offset = offset as usize;
            if data.len() < offset + buf.len() {
                data.resize(offset + buf.len(), 0);
            }
            data[offset..offset + buf.len()].copy_from_slice(buf);
            Ok(buf.len().min(3))
        }
    }

    #[test]
    fn test_write_all_at_handles_short_writes() {
        let buffer = Buffer::default();
        buffer.write_all_at(b"hello world", 2).unwrap();
        assert_eq!(&buffer.0.lock().unwrap()[2..], b"hello world");
    }

    #[test]
    fn test_file_write_at_out_of_order() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all_at(b"world", 6).unwrap();
        file.write_all_at(b"hello ", 0).unwrap();

        let mut contents = String::new();
        let _ = file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "hello world");
    }
}
