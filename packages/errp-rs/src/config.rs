//! Pipeline Configuration
//!
//! Every tunable of the fetch/preprocess/extract chain lives in an explicit,
//! serializable struct. Defaults follow the documented preprocessing of the
//! 013-2015 error-potential study: 1–10 Hz band-pass, 64 Hz output rate,
//! epochs from -0.2 s to 1.0 s, features from FCz/Cz between 0.2 s and 0.7 s.

use crate::error::{ErrpError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Base URL of the 013-2015 data set in the BNCI Horizon 2020 database.
pub const BNCI_BASE_URL: &str = "https://bnci-horizon-2020.eu/database/data-sets/013-2015";

/// Subjects published in the data set.
pub const DATASET_SUBJECTS: std::ops::RangeInclusive<u32> = 1..=6;

/// Recording sessions per subject.
pub const DATASET_SESSIONS: std::ops::RangeInclusive<u32> = 1..=2;

/// Size of the buffer used when streaming a download to disk.
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// Baseline interval in seconds; `None` bounds mean the start/end of the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl Baseline {
    /// From the start of the epoch up to the event onset.
    pub fn pre_stimulus() -> Self {
        Self {
            start: None,
            end: Some(0.0),
        }
    }
}

/// Filtering, epoching and decimation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// High-pass edge of the band-pass (Hz); `None` disables the high-pass part
    #[serde(default = "default_l_freq")]
    pub l_freq: Option<f64>,

    /// Low-pass edge of the band-pass (Hz); `None` disables the low-pass part
    #[serde(default = "default_h_freq")]
    pub h_freq: Option<f64>,

    /// Target rate for decimation (Hz); `None` keeps the native rate
    #[serde(default = "default_resample_to")]
    pub resample_to: Option<f64>,

    /// Epoch start relative to the event (s)
    #[serde(default = "default_epoch_tmin")]
    pub tmin: f64,

    /// Epoch end relative to the event (s), inclusive
    #[serde(default = "default_epoch_tmax")]
    pub tmax: f64,

    /// Baseline correction interval; `None` disables it
    #[serde(default = "default_baseline")]
    pub baseline: Option<Baseline>,

    /// Butterworth order of each filter edge
    #[serde(default = "default_filter_order")]
    pub filter_order: usize,
}

fn default_l_freq() -> Option<f64> {
    Some(1.0)
}
fn default_h_freq() -> Option<f64> {
    Some(10.0)
}
fn default_resample_to() -> Option<f64> {
    Some(64.0)
}
fn default_epoch_tmin() -> f64 {
    -0.2
}
fn default_epoch_tmax() -> f64 {
    1.0
}
fn default_baseline() -> Option<Baseline> {
    Some(Baseline::pre_stimulus())
}
fn default_filter_order() -> usize {
    4
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            l_freq: default_l_freq(),
            h_freq: default_h_freq(),
            resample_to: default_resample_to(),
            tmin: default_epoch_tmin(),
            tmax: default_epoch_tmax(),
            baseline: default_baseline(),
            filter_order: default_filter_order(),
        }
    }
}

impl PreprocessConfig {
    /// Raw epochs: no filtering, no baseline, native rate.
    pub fn unfiltered(tmin: f64, tmax: f64) -> Self {
        Self {
            l_freq: None,
            h_freq: None,
            resample_to: None,
            tmin,
            tmax,
            baseline: None,
            ..Default::default()
        }
    }

    /// Checks that do not depend on the recording's sample rate.
    pub fn validate(&self) -> Result<()> {
        if !self.tmin.is_finite() || !self.tmax.is_finite() {
            return Err(ErrpError::Config(format!(
                "Epoch window must be finite, got [{}, {}]",
                self.tmin, self.tmax
            )));
        }
        if self.tmin > self.tmax {
            return Err(ErrpError::Config(format!(
                "Epoch tmin ({} s) must not exceed tmax ({} s)",
                self.tmin, self.tmax
            )));
        }
        if let (Some(low), Some(high)) = (self.l_freq, self.h_freq) {
            if low >= high {
                return Err(ErrpError::Config(format!(
                    "Low cutoff ({} Hz) must be less than high cutoff ({} Hz)",
                    low, high
                )));
            }
        }
        for freq in [self.l_freq, self.h_freq].into_iter().flatten() {
            if !(freq > 0.0 && freq.is_finite()) {
                return Err(ErrpError::Config(format!(
                    "Filter cutoffs must be positive, got {} Hz",
                    freq
                )));
            }
        }
        if let Some(rate) = self.resample_to {
            if !(rate > 0.0 && rate.is_finite()) {
                return Err(ErrpError::Config(format!(
                    "Resample target must be positive, got {} Hz",
                    rate
                )));
            }
        }
        if self.filter_order == 0 {
            return Err(ErrpError::Config("Filter order must be at least 1".to_string()));
        }
        if let Some(baseline) = self.baseline {
            let start = baseline.start.unwrap_or(self.tmin);
            let end = baseline.end.unwrap_or(self.tmax);
            if start > end || start < self.tmin || end > self.tmax {
                return Err(ErrpError::Config(format!(
                    "Baseline [{}, {}] s lies outside the epoch [{}, {}] s",
                    start, end, self.tmin, self.tmax
                )));
            }
        }
        Ok(())
    }
}

/// Channel and time selection for the feature matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Channel names to keep, in output order; empty keeps every channel
    #[serde(default = "default_picks")]
    pub picks: Vec<String>,

    /// Start of the feature window (s); `None` is the start of the epoch
    #[serde(default = "default_crop_tmin")]
    pub tmin: Option<f64>,

    /// End of the feature window (s), inclusive; `None` is the end of the epoch
    #[serde(default = "default_crop_tmax")]
    pub tmax: Option<f64>,
}

fn default_picks() -> Vec<String> {
    vec!["FCz".to_string(), "Cz".to_string()]
}
fn default_crop_tmin() -> Option<f64> {
    Some(0.2)
}
fn default_crop_tmax() -> Option<f64> {
    Some(0.7)
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            picks: default_picks(),
            tmin: default_crop_tmin(),
            tmax: default_crop_tmax(),
        }
    }
}

/// Where and what to download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_target_dir")]
    pub target_dir: PathBuf,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_subjects")]
    pub subjects: Vec<u32>,

    #[serde(default = "default_sessions")]
    pub sessions: Vec<u32>,

    /// Bytes read from the response per write to disk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Whole-request timeout; `None` waits indefinitely
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_target_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_base_url() -> String {
    BNCI_BASE_URL.to_string()
}
fn default_subjects() -> Vec<u32> {
    DATASET_SUBJECTS.collect()
}
fn default_sessions() -> Vec<u32> {
    DATASET_SESSIONS.collect()
}
fn default_chunk_size() -> usize {
    DOWNLOAD_CHUNK_SIZE
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            target_dir: default_target_dir(),
            base_url: default_base_url(),
            subjects: default_subjects(),
            sessions: default_sessions(),
            chunk_size: default_chunk_size(),
            timeout_secs: None,
        }
    }
}

impl FetchConfig {
    pub fn with_target_dir(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_subjects(&self.subjects)?;
        for &session in &self.sessions {
            validate_session(session)?;
        }
        if self.chunk_size == 0 {
            return Err(ErrpError::Config("Download chunk size must be positive".to_string()));
        }
        Ok(())
    }
}

/// The whole configuration surface, loadable from one JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub preprocess: PreprocessConfig,

    #[serde(default)]
    pub extract: ExtractConfig,

    /// Session aggregated by `load_session`
    #[serde(default = "default_session")]
    pub session: u32,

    /// Subjects aggregated by `load_session`, in output order
    #[serde(default = "default_subjects")]
    pub subjects: Vec<u32>,
}

fn default_session() -> u32 {
    1
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            preprocess: PreprocessConfig::default(),
            extract: ExtractConfig::default(),
            session: default_session(),
            subjects: default_subjects(),
        }
    }
}

impl DatasetConfig {
    /// Load from a JSON file; missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ErrpError::FileNotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        let config: DatasetConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.fetch.validate()?;
        self.preprocess.validate()?;
        validate_session(self.session)?;
        validate_subjects(&self.subjects)
    }
}

pub(crate) fn validate_session(session: u32) -> Result<()> {
    if !DATASET_SESSIONS.contains(&session) {
        return Err(ErrpError::Config(format!(
            "Session {} does not exist; valid sessions are {}-{}",
            session,
            DATASET_SESSIONS.start(),
            DATASET_SESSIONS.end()
        )));
    }
    Ok(())
}

pub(crate) fn validate_subjects(subjects: &[u32]) -> Result<()> {
    if subjects.is_empty() {
        return Err(ErrpError::Config("At least one subject must be given".to_string()));
    }
    for subject in subjects {
        if !DATASET_SUBJECTS.contains(subject) {
            return Err(ErrpError::Config(format!(
                "Subject {} does not exist; valid subjects are {}-{}",
                subject,
                DATASET_SUBJECTS.start(),
                DATASET_SUBJECTS.end()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PreprocessConfig::default();
        assert_eq!(config.l_freq, Some(1.0));
        assert_eq!(config.h_freq, Some(10.0));
        assert_eq!(config.resample_to, Some(64.0));
        assert_eq!((config.tmin, config.tmax), (-0.2, 1.0));
        assert_eq!(config.baseline, Some(Baseline::pre_stimulus()));
        assert!(config.validate().is_ok());

        let extract = ExtractConfig::default();
        assert_eq!(extract.picks, vec!["FCz", "Cz"]);

        let fetch = FetchConfig::default();
        assert_eq!(fetch.subjects, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(fetch.sessions, vec![1, 2]);
        assert_eq!(fetch.chunk_size, 1024 * 1024);
        assert_eq!(fetch.target_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let json = r#"{ "preprocess": { "resample_to": null, "tmax": 0.8 }, "session": 2 }"#;
        let config: DatasetConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.preprocess.resample_to, None);
        assert_eq!(config.preprocess.tmax, 0.8);
        assert_eq!(config.preprocess.l_freq, Some(1.0));
        assert_eq!(config.session, 2);
        assert_eq!(config.subjects, vec![1, 2, 3, 4, 5, 6]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_preprocessing_is_rejected() {
        let inverted = PreprocessConfig {
            l_freq: Some(12.0),
            h_freq: Some(10.0),
            ..Default::default()
        };
        assert!(inverted.validate().unwrap_err().is_config());

        let window = PreprocessConfig {
            tmin: 0.5,
            tmax: 0.1,
            ..Default::default()
        };
        assert!(window.validate().is_err());

        // Default baseline ends at 0 s, which is outside a post-stimulus window.
        let baseline = PreprocessConfig {
            tmin: 0.1,
            ..Default::default()
        };
        assert!(baseline.validate().is_err());

        let rate = PreprocessConfig {
            resample_to: Some(0.0),
            ..Default::default()
        };
        assert!(rate.validate().is_err());
    }

    #[test]
    fn test_subject_and_session_ranges() {
        assert!(validate_subjects(&[1, 6]).is_ok());
        assert!(validate_subjects(&[]).is_err());
        assert!(validate_subjects(&[7]).is_err());
        assert!(validate_session(2).is_ok());
        assert!(validate_session(3).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "extract": { "picks": ["Cz"] } }"#).unwrap();
        let config = DatasetConfig::from_file(&path).unwrap();
        assert_eq!(config.extract.picks, vec!["Cz"]);
        assert_eq!(config.extract.tmin, Some(0.2));

        assert!(matches!(
            DatasetConfig::from_file(&dir.path().join("missing.json")),
            Err(ErrpError::FileNotFound(_))
        ));
    }
}
