//! Recording Loader
//!
//! Reads a BNCI 013-2015 `.mat` file. The top-level `run` variable holds one
//! record per trial (a cell of structs or a struct array); every record has
//!
//! - `eeg`: samples × channels matrix
//! - `header.SampleRate`, `header.Label` (last entry is the status channel)
//! - `header.EVENT.POS` / `header.EVENT.TYP`: parallel event arrays

use crate::error::{ErrpError, Result};
use crate::mat::{MatArray, MatFile, MatValue};
use crate::types::{Event, Recording, RecordingInfo, Trial};
use log::{debug, info};
use ndarray::{s, Array2};
use std::path::Path;

const RUN_VARIABLE: &str = "run";

/// Load every trial of a recording file.
pub fn load_recording(path: &Path) -> Result<Recording> {
    let mut mat = MatFile::open(path)?;
    let display = path.display().to_string();

    let run = mat.take(RUN_VARIABLE).ok_or_else(|| {
        ErrpError::format(&display, format!("missing top-level variable '{}'", RUN_VARIABLE))
    })?;
    let records = trial_records(&run).map_err(|reason| ErrpError::format(&display, reason))?;
    if records.is_empty() {
        return Err(ErrpError::format(&display, "'run' holds no trials"));
    }

    let mut sfreq = None;
    let mut ch_names: Option<Vec<String>> = None;
    let mut subject = None;
    let mut session = None;
    let mut trials = Vec::with_capacity(records.len());

    for (index, (record, element)) in records.into_iter().enumerate() {
        let parsed = parse_trial(record, element)
            .map_err(|reason| ErrpError::format(&display, format!("trial {}: {}", index, reason)))?;

        match sfreq {
            None => sfreq = Some(parsed.sfreq),
            Some(rate) if rate != parsed.sfreq => {
                return Err(ErrpError::format(
                    &display,
                    format!(
                        "trial {} is sampled at {} Hz, trial 0 at {} Hz",
                        index, parsed.sfreq, rate
                    ),
                ));
            }
            Some(_) => {}
        }
        match &ch_names {
            None => ch_names = Some(parsed.ch_names),
            Some(names) if *names != parsed.ch_names => {
                return Err(ErrpError::format(
                    &display,
                    format!("trial {} has a different channel list than trial 0", index),
                ));
            }
            Some(_) => {}
        }
        subject = subject.or(parsed.subject);
        session = session.or(parsed.session);

        debug!(
            "{}: trial {} with {} samples and {} events",
            display,
            index,
            parsed.trial.n_samples(),
            parsed.trial.events.len()
        );
        trials.push(parsed.trial);
    }

    let (Some(sfreq), Some(ch_names)) = (sfreq, ch_names) else {
        return Err(ErrpError::format(&display, "'run' holds no trials"));
    };

    info!(
        "Loaded {} ({} trials, {} channels, {} Hz)",
        display,
        trials.len(),
        ch_names.len(),
        sfreq
    );

    Ok(Recording {
        path: path.to_path_buf(),
        subject,
        session,
        sfreq,
        ch_names,
        trials,
    })
}

/// Header-level summary of a recording file.
pub fn read_info(path: &Path) -> Result<RecordingInfo> {
    load_recording(path).map(|recording| recording.info())
}

struct ParsedTrial {
    sfreq: f64,
    ch_names: Vec<String>,
    subject: Option<u32>,
    session: Option<u32>,
    trial: Trial,
}

/// Flatten `run` into (struct array, element index) pairs in trial order.
fn trial_records(run: &MatArray) -> std::result::Result<Vec<(&MatArray, usize)>, String> {
    match &run.value {
        MatValue::Cell(items) => {
            let mut records = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let len = item
                    .struct_len()
                    .ok_or_else(|| format!("'run' cell {} is not a struct", i))?;
                records.extend((0..len).map(|e| (item, e)));
            }
            Ok(records)
        }
        MatValue::Struct { elements, .. } => Ok((0..elements.len()).map(|e| (run, e)).collect()),
        _ => Err(format!(
            "'run' must be a cell or struct array, found {:?}",
            run.class()
        )),
    }
}

fn parse_trial(record: &MatArray, element: usize) -> std::result::Result<ParsedTrial, String> {
    let eeg = record
        .field_at(element, "eeg")
        .ok_or("missing field 'eeg'")?;
    let header = record
        .field_at(element, "header")
        .ok_or("missing field 'header'")?;

    let sfreq = header
        .field("SampleRate")
        .ok_or("missing field 'header.SampleRate'")?
        .scalar_value()
        .ok_or("'header.SampleRate' is not a numeric scalar")?;
    if !(sfreq > 0.0 && sfreq.is_finite()) {
        return Err(format!("invalid sample rate {}", sfreq));
    }

    let mut labels = header
        .field("Label")
        .ok_or("missing field 'header.Label'")?
        .string_list()
        .ok_or("'header.Label' is not a list of strings")?;
    if labels.len() < 2 {
        return Err(format!(
            "'header.Label' lists {} entries, need EEG channels plus status",
            labels.len()
        ));
    }
    let n_labels = labels.len();
    labels.pop();

    let data = eeg_matrix(eeg, n_labels)?;
    let events = parse_events(header)?;

    Ok(ParsedTrial {
        sfreq,
        ch_names: labels,
        subject: optional_id(header, "Subject"),
        session: optional_id(header, "Session"),
        trial: Trial { data, events },
    })
}

/// Channel-major data with the status column removed.
fn eeg_matrix(eeg: &MatArray, n_labels: usize) -> std::result::Result<Array2<f64>, String> {
    let (n_samples, n_columns) = eeg
        .shape2()
        .ok_or_else(|| format!("'eeg' must be 2-D, has dims {:?}", eeg.dims))?;
    let real = eeg.real().ok_or("'eeg' is not numeric")?;

    let n_channels = n_labels - 1;
    if n_columns != n_channels && n_columns != n_labels {
        return Err(format!(
            "'eeg' has {} columns but 'header.Label' lists {} entries",
            n_columns, n_labels
        ));
    }

    // Column-major samples × channels is row-major channels × samples.
    let data = Array2::from_shape_vec((n_columns, n_samples), real.to_vec())
        .map_err(|e| format!("'eeg' data does not match its dims: {}", e))?;
    if n_columns == n_channels {
        Ok(data)
    } else {
        Ok(data.slice(s![..n_channels, ..]).to_owned())
    }
}

fn parse_events(header: &MatArray) -> std::result::Result<Vec<Event>, String> {
    let table = header
        .field("EVENT")
        .ok_or("missing field 'header.EVENT'")?;
    let positions = table
        .field("POS")
        .and_then(MatArray::real)
        .ok_or("missing or non-numeric 'header.EVENT.POS'")?;
    let codes = table
        .field("TYP")
        .and_then(MatArray::real)
        .ok_or("missing or non-numeric 'header.EVENT.TYP'")?;
    if positions.len() != codes.len() {
        return Err(format!(
            "'header.EVENT' has {} positions but {} types",
            positions.len(),
            codes.len()
        ));
    }

    positions
        .iter()
        .zip(codes)
        .map(|(&pos, &code)| {
            if !(pos >= 0.0 && pos.fract() == 0.0 && pos.is_finite()) {
                return Err(format!("event position {} is not a sample index", pos));
            }
            if code.fract() != 0.0 || !code.is_finite() {
                return Err(format!("event type {} is not an integer code", code));
            }
            Ok(Event::new(pos as usize, code as i32))
        })
        .collect()
}

fn optional_id(header: &MatArray, name: &str) -> Option<u32> {
    header
        .field(name)
        .and_then(MatArray::scalar_value)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0)
        .map(|v| v as u32)
}
