//! Dataset Fetcher
//!
//! Downloads the subject/session recordings of the 013-2015 data set into a
//! local directory. Files already present are skipped; nothing is retried.
//! A download is written to `<name>.part` and renamed once complete, so an
//! interrupted transfer never leaves a file that a later run would skip.

use crate::config::{validate_session, validate_subjects, FetchConfig};
use crate::error::{ErrpError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Remote file name of a subject/session recording.
pub fn remote_url(base_url: &str, subject: u32, session: u32) -> String {
    format!(
        "{}/Subject{:02}_s{}.mat",
        base_url.trim_end_matches('/'),
        subject,
        session
    )
}

/// Local file name of a subject/session recording.
pub fn local_file_name(subject: u32, session: u32) -> String {
    format!("sub{:02}_ses{}.mat", subject, session)
}

/// Path of a recording under `data_dir`.
pub fn local_path(data_dir: &Path, subject: u32, session: u32) -> PathBuf {
    data_dir.join(local_file_name(subject, session))
}

/// An open HTTP response body.
pub struct Download {
    /// Length announced by the server, if any
    pub content_length: Option<u64>,
    pub body: Box<dyn Read>,
}

/// Source of remote files.
pub trait Transport {
    /// Start a GET request; non-success statuses must be reported as errors.
    fn get(&self, url: &str) -> Result<Download>;
}

/// Blocking HTTP client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("errp-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ErrpError::Network {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Download> {
        let response = self.client.get(url).send().map_err(|e| ErrpError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ErrpError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(Download {
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FetchOutcome {
    Downloaded { bytes: u64 },
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchEntry {
    pub subject: u32,
    pub session: u32,
    pub url: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FetchOutcome,
}

/// What a fetch run did, file by file, in request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchReport {
    pub target_dir: PathBuf,
    pub entries: Vec<FetchEntry>,
}

impl FetchReport {
    pub fn downloaded(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, FetchOutcome::Downloaded { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == FetchOutcome::Skipped)
            .count()
    }

    pub fn total_bytes(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| match e.outcome {
                FetchOutcome::Downloaded { bytes } => bytes,
                FetchOutcome::Skipped => 0,
            })
            .sum()
    }
}

pub struct Fetcher<T: Transport> {
    transport: T,
    config: FetchConfig,
}

impl Fetcher<HttpTransport> {
    /// Fetcher backed by a real HTTP client.
    pub fn http(config: FetchConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout_secs.map(Duration::from_secs))?;
        Self::new(transport, config)
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, config: FetchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    /// Make sure every configured subject/session file exists locally.
    pub fn ensure_dataset(&self) -> Result<FetchReport> {
        let target_dir = &self.config.target_dir;
        if !target_dir.exists() {
            info!("Creating {}", target_dir.display());
            std::fs::create_dir_all(target_dir)?;
        }

        let mut report = FetchReport {
            target_dir: target_dir.clone(),
            entries: Vec::new(),
        };
        for &subject in &self.config.subjects {
            for &session in &self.config.sessions {
                report.entries.push(self.ensure_file(subject, session)?);
            }
        }

        info!(
            "Fetch complete: {} downloaded ({} bytes), {} already present",
            report.downloaded(),
            report.total_bytes(),
            report.skipped()
        );
        Ok(report)
    }

    /// Download one subject/session file unless it is already present.
    pub fn ensure_file(&self, subject: u32, session: u32) -> Result<FetchEntry> {
        validate_subjects(&[subject])?;
        validate_session(session)?;

        let url = remote_url(&self.config.base_url, subject, session);
        let path = local_path(&self.config.target_dir, subject, session);

        let outcome = if path.exists() {
            info!(
                "File {} associated with {} already exists, skipping",
                path.display(),
                url
            );
            FetchOutcome::Skipped
        } else {
            info!("Downloading {}", url);
            let bytes = self.download(&url, &path)?;
            info!("Saved {} bytes to {}", bytes, path.display());
            FetchOutcome::Downloaded { bytes }
        };

        Ok(FetchEntry {
            subject,
            session,
            url,
            path,
            outcome,
        })
    }

    fn download(&self, url: &str, path: &Path) -> Result<u64> {
        let partial = partial_path(path);
        let result = self
            .stream_to(url, &partial)
            .and_then(|bytes| std::fs::rename(&partial, path).map(|_| bytes).map_err(Into::into));
        if result.is_err() && partial.exists() {
            debug!("Removing partial download {}", partial.display());
            let _ = std::fs::remove_file(&partial);
        }
        result
    }

    fn stream_to(&self, url: &str, partial: &Path) -> Result<u64> {
        let mut download = self.transport.get(url)?;
        let mut file = BufWriter::new(File::create(partial)?);
        let mut buffer = vec![0u8; self.config.chunk_size];
        let mut written: u64 = 0;

        loop {
            let n = download.body.read(&mut buffer).map_err(|e| ErrpError::Network {
                url: url.to_string(),
                reason: format!("connection lost after {} bytes: {}", written, e),
            })?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n])?;
            written += n as u64;
        }
        file.flush()?;

        if let Some(expected) = download.content_length {
            if expected != written {
                return Err(ErrpError::Network {
                    url: url.to_string(),
                    reason: format!("received {} of {} bytes", written, expected),
                });
            }
        }
        Ok(written)
    }
}

/// `ensure_dataset` over HTTP for every subject and session into `target_dir`.
pub fn ensure_dataset(target_dir: &Path) -> Result<FetchReport> {
    Fetcher::http(FetchConfig::with_target_dir(target_dir))?.ensure_dataset()
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::Cursor;

    /// Serves canned bodies and records every requested URL.
    #[derive(Default)]
    struct MockTransport {
        bodies: HashMap<String, Vec<u8>>,
        failing: Option<String>,
        announced_extra: u64,
        requests: RefCell<Vec<String>>,
    }

    impl Transport for MockTransport {
        fn get(&self, url: &str) -> Result<Download> {
            self.requests.borrow_mut().push(url.to_string());
            if self.failing.as_deref() == Some(url) {
                return Err(ErrpError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                });
            }
            let body = self.bodies.get(url).cloned().unwrap_or_else(|| url.as_bytes().to_vec());
            Ok(Download {
                content_length: Some(body.len() as u64 + self.announced_extra),
                body: Box::new(Cursor::new(body)),
            })
        }
    }

    fn config(dir: &Path, subjects: Vec<u32>, sessions: Vec<u32>) -> FetchConfig {
        FetchConfig {
            target_dir: dir.to_path_buf(),
            base_url: "http://archive.test/013-2015/".to_string(),
            subjects,
            sessions,
            chunk_size: 4,
            timeout_secs: None,
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(
            remote_url(crate::config::BNCI_BASE_URL, 3, 2),
            "https://bnci-horizon-2020.eu/database/data-sets/013-2015/Subject03_s2.mat"
        );
        assert_eq!(local_file_name(1, 1), "sub01_ses1.mat");
        assert_eq!(local_file_name(6, 2), "sub06_ses2.mat");
        for subject in 1..=6 {
            for session in 1..=2 {
                let name = local_file_name(subject, session);
                assert_eq!(name, format!("sub0{}_ses{}.mat", subject, session));
            }
        }
    }

    #[test]
    fn test_downloads_in_order_and_creates_directory() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("nested").join("data");
        let mut transport = MockTransport::default();
        transport.bodies.insert(
            "http://archive.test/013-2015/Subject01_s1.mat".to_string(),
            b"MATLAB 5.0 payload".to_vec(),
        );

        let fetcher = Fetcher::new(transport, config(&target, vec![1, 2], vec![1, 2])).unwrap();
        let report = fetcher.ensure_dataset().unwrap();

        assert_eq!(report.downloaded(), 4);
        let requested = fetcher.transport.requests.borrow().clone();
        assert_eq!(
            requested,
            vec![
                "http://archive.test/013-2015/Subject01_s1.mat",
                "http://archive.test/013-2015/Subject01_s2.mat",
                "http://archive.test/013-2015/Subject02_s1.mat",
                "http://archive.test/013-2015/Subject02_s2.mat",
            ]
        );
        assert_eq!(
            std::fs::read(target.join("sub01_ses1.mat")).unwrap(),
            b"MATLAB 5.0 payload"
        );
        assert!(!target.join("sub01_ses1.mat.part").exists());
        assert_eq!(
            report.entries[0].outcome,
            FetchOutcome::Downloaded { bytes: 18 }
        );
    }

    #[test]
    fn test_existing_files_are_not_requested() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sub01_ses1.mat"), b"old").unwrap();

        let fetcher =
            Fetcher::new(MockTransport::default(), config(dir.path(), vec![1], vec![1, 2])).unwrap();
        let report = fetcher.ensure_dataset().unwrap();

        assert_eq!(report.skipped(), 1);
        assert_eq!(report.downloaded(), 1);
        assert_eq!(
            *fetcher.transport.requests.borrow(),
            vec!["http://archive.test/013-2015/Subject01_s2.mat"]
        );
        assert_eq!(std::fs::read(dir.path().join("sub01_ses1.mat")).unwrap(), b"old");

        // A second run touches the network no more.
        fetcher.transport.requests.borrow_mut().clear();
        let again = fetcher.ensure_dataset().unwrap();
        assert_eq!(again.skipped(), 2);
        assert!(fetcher.transport.requests.borrow().is_empty());
    }

    #[test]
    fn test_http_error_is_fatal_and_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let transport = MockTransport {
            failing: Some("http://archive.test/013-2015/Subject01_s2.mat".to_string()),
            ..Default::default()
        };
        let fetcher = Fetcher::new(transport, config(dir.path(), vec![1, 2], vec![1, 2])).unwrap();
        let err = fetcher.ensure_dataset().unwrap_err();

        assert!(err.is_network());
        assert!(err.to_string().contains("Subject01_s2.mat"));
        assert!(dir.path().join("sub01_ses1.mat").exists());
        assert!(!dir.path().join("sub01_ses2.mat").exists());
        // Nothing after the failure is attempted.
        assert_eq!(fetcher.transport.requests.borrow().len(), 2);
    }

    #[test]
    fn test_truncated_body_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let transport = MockTransport {
            announced_extra: 10,
            ..Default::default()
        };
        let fetcher = Fetcher::new(transport, config(dir.path(), vec![4], vec![1])).unwrap();
        let err = fetcher.ensure_dataset().unwrap_err();

        assert!(err.is_network());
        assert!(!dir.path().join("sub04_ses1.mat").exists());
        assert!(!dir.path().join("sub04_ses1.mat.part").exists());
    }

    #[test]
    fn test_out_of_range_subject_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Fetcher::new(MockTransport::default(), config(dir.path(), vec![7], vec![1]))
            .map(|_| ())
            .unwrap_err()
            .is_config());
        assert!(Fetcher::new(MockTransport::default(), config(dir.path(), vec![1], vec![3]))
            .map(|_| ())
            .unwrap_err()
            .is_config());
    }

    #[test]
    fn test_report_serializes_outcomes() {
        let entry = FetchEntry {
            subject: 1,
            session: 1,
            url: "u".to_string(),
            path: PathBuf::from("data/sub01_ses1.mat"),
            outcome: FetchOutcome::Downloaded { bytes: 5 },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "downloaded");
        assert_eq!(json["bytes"], 5);
    }
}
