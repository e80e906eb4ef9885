use crate::error::{ErrpError, Result};
use ndarray::{concatenate, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Event codes marking a correct response of the simulated cursor.
pub const CORRECT_CODES: [i32; 2] = [5, 10];

/// Event codes marking an erroneous response.
pub const ERROR_CODES: [i32; 2] = [6, 9];

/// Outcome class of a labeled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventClass {
    Correct,
    Error,
}

impl EventClass {
    /// `None` for codes that carry no outcome (trial start, target onset, ...).
    pub fn from_code(code: i32) -> Option<Self> {
        if CORRECT_CODES.contains(&code) {
            Some(EventClass::Correct)
        } else if ERROR_CODES.contains(&code) {
            Some(EventClass::Error)
        } else {
            None
        }
    }

    pub fn label(self) -> u8 {
        match self {
            EventClass::Correct => 0,
            EventClass::Error => 1,
        }
    }
}

/// A marker in a trial: zero-based sample position and type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub sample: usize,
    pub code: i32,
}

impl Event {
    pub fn new(sample: usize, code: i32) -> Self {
        Self { sample, code }
    }
}

/// One continuous run of the experiment.
#[derive(Debug, Clone)]
pub struct Trial {
    /// `n_channels × n_samples`
    pub data: Array2<f64>,
    pub events: Vec<Event>,
}

impl Trial {
    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }
}

/// Contents of one subject/session recording file.
#[derive(Debug, Clone)]
pub struct Recording {
    pub path: PathBuf,
    pub subject: Option<u32>,
    pub session: Option<u32>,
    pub sfreq: f64,
    pub ch_names: Vec<String>,
    pub trials: Vec<Trial>,
}

impl Recording {
    pub fn n_channels(&self) -> usize {
        self.ch_names.len()
    }

    pub fn info(&self) -> RecordingInfo {
        let mut event_counts = BTreeMap::new();
        for event in self.trials.iter().flat_map(|t| &t.events) {
            *event_counts.entry(event.code).or_insert(0) += 1;
        }
        RecordingInfo {
            path: self.path.display().to_string(),
            subject: self.subject,
            session: self.session,
            sfreq: self.sfreq,
            n_channels: self.n_channels(),
            ch_names: self.ch_names.clone(),
            n_trials: self.trials.len(),
            samples_per_trial: self.trials.iter().map(Trial::n_samples).collect(),
            event_counts,
        }
    }
}

/// Summary of a recording without its sample data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingInfo {
    pub path: String,
    pub subject: Option<u32>,
    pub session: Option<u32>,
    pub sfreq: f64,
    pub n_channels: usize,
    pub ch_names: Vec<String>,
    pub n_trials: usize,
    pub samples_per_trial: Vec<usize>,
    /// Occurrences of each event code over all trials
    pub event_counts: BTreeMap<i32, usize>,
}

/// Provenance of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochEvent {
    /// Event position in the trial, native sample rate
    pub sample: usize,
    pub code: i32,
    pub trial: usize,
    pub subject: Option<u32>,
    pub session: Option<u32>,
}

/// An event whose window did not fit in its trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedEvent {
    pub sample: usize,
    pub code: i32,
    pub trial: usize,
    pub subject: Option<u32>,
    pub session: Option<u32>,
    pub reason: String,
}

/// Event-locked, filtered and decimated windows.
#[derive(Debug, Clone)]
pub struct EpochSet {
    pub ch_names: Vec<String>,
    /// Sample rate after decimation
    pub sfreq: f64,
    /// Time of each sample relative to the event (s)
    pub times: Vec<f64>,
    /// `n_epochs × n_channels × n_times`
    pub data: Array3<f64>,
    pub events: Vec<EpochEvent>,
    pub drop_log: Vec<DroppedEvent>,
}

const TIME_TOLERANCE: f64 = 1e-9;

impl EpochSet {
    pub fn n_epochs(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn n_channels(&self) -> usize {
        self.ch_names.len()
    }

    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    /// Event codes in epoch order.
    pub fn codes(&self) -> Vec<i32> {
        self.events.iter().map(|e| e.code).collect()
    }

    /// Stack several sets along the epoch axis, keeping their order.
    ///
    /// All sets must share channel names, sample rate and time axis.
    pub fn concatenate(sets: Vec<EpochSet>) -> Result<EpochSet> {
        let mut iter = sets.into_iter();
        let Some(first) = iter.next() else {
            return Err(ErrpError::Config(
                "Cannot concatenate an empty list of epoch sets".to_string(),
            ));
        };
        let rest: Vec<EpochSet> = iter.collect();
        if rest.is_empty() {
            return Ok(first);
        }

        for (i, other) in rest.iter().enumerate() {
            first.check_compatible(other, i + 1)?;
        }

        let mut views = vec![first.data.view()];
        views.extend(rest.iter().map(|s| s.data.view()));
        let data = concatenate(Axis(0), &views)
            .map_err(|e| ErrpError::Incompatible(format!("array shapes differ: {}", e)))?;

        let mut events = first.events;
        let mut drop_log = first.drop_log;
        for set in rest {
            events.extend(set.events);
            drop_log.extend(set.drop_log);
        }

        Ok(EpochSet {
            ch_names: first.ch_names,
            sfreq: first.sfreq,
            times: first.times,
            data,
            events,
            drop_log,
        })
    }

    fn check_compatible(&self, other: &EpochSet, index: usize) -> Result<()> {
        if self.ch_names != other.ch_names {
            return Err(ErrpError::Incompatible(format!(
                "set {} has channels {:?}, expected {:?}",
                index, other.ch_names, self.ch_names
            )));
        }
        if (self.sfreq - other.sfreq).abs() > TIME_TOLERANCE {
            return Err(ErrpError::Incompatible(format!(
                "set {} is sampled at {} Hz, expected {} Hz",
                index, other.sfreq, self.sfreq
            )));
        }
        let same_times = self.times.len() == other.times.len()
            && self
                .times
                .iter()
                .zip(&other.times)
                .all(|(a, b)| (a - b).abs() <= TIME_TOLERANCE);
        if !same_times {
            return Err(ErrpError::Incompatible(format!(
                "set {} has a different time axis ({} samples, expected {})",
                index,
                other.times.len(),
                self.times.len()
            )));
        }
        Ok(())
    }
}

/// Feature array handed to a classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Features {
    /// `n_epochs × n_times`, when exactly one channel was picked
    Single(Array2<f64>),
    /// `n_epochs × n_channels × n_times`
    Multi(Array3<f64>),
}

impl Features {
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Features::Single(a) => a.shape().to_vec(),
            Features::Multi(a) => a.shape().to_vec(),
        }
    }

    pub fn n_epochs(&self) -> usize {
        self.shape()[0]
    }

    /// Values with the first axis varying fastest, as MATLAB stores them.
    pub fn to_column_major(&self) -> Vec<f64> {
        match self {
            Features::Single(a) => a.t().iter().copied().collect(),
            Features::Multi(a) => a.view().reversed_axes().iter().copied().collect(),
        }
    }
}
