//! Filter & Epoch Stage
//!
//! Each trial is filtered over its full continuous length, then cut into
//! event-locked windows. Windows are boundary-inclusive: offsets
//! `round(tmin·sfreq) ..= round(tmax·sfreq)` around the event sample.
//! Decimation keeps the offsets that are multiples of the factor, so the
//! event onset (t = 0) is always one of the output samples.

use crate::config::{Baseline, PreprocessConfig};
use crate::error::{ErrpError, Result};
use crate::filter::BandPass;
use crate::loader::load_recording;
use crate::types::{DroppedEvent, EpochEvent, EpochSet, Recording, Trial};
use log::{debug, info, warn};
use ndarray::{s, stack, Array2, Array3, ArrayView2, Axis};
use std::path::Path;

const RATIO_TOLERANCE: f64 = 1e-9;

/// Nyquist margin expected between the low-pass edge and the output rate.
const ALIASING_MARGIN: f64 = 2.5;

/// Integer decimation factor for reaching `resample_to` from `sfreq`.
///
/// Ratios that are not whole numbers are truncated; the output rate is then
/// `sfreq / factor`, somewhat above the requested one.
pub fn decimation_factor(sfreq: f64, resample_to: Option<f64>) -> Result<usize> {
    let Some(target) = resample_to else {
        return Ok(1);
    };
    if !(target > 0.0 && target.is_finite()) {
        return Err(ErrpError::Config(format!(
            "Resample target must be positive, got {} Hz",
            target
        )));
    }
    if target > sfreq * (1.0 + RATIO_TOLERANCE) {
        return Err(ErrpError::Config(format!(
            "Cannot resample {} Hz data up to {} Hz; decimation only lowers the rate",
            sfreq, target
        )));
    }

    let ratio = sfreq / target;
    let factor = ((ratio + RATIO_TOLERANCE).floor() as usize).max(1);
    if (ratio - factor as f64).abs() > RATIO_TOLERANCE {
        warn!(
            "{} Hz is not an integer multiple of {} Hz; decimating by {} gives {} Hz",
            sfreq,
            target,
            factor,
            sfreq / factor as f64
        );
    }
    Ok(factor)
}

/// Native-rate window geometry shared by every trial of a recording.
#[derive(Debug, Clone)]
struct Window {
    /// First offset relative to the event, in native samples
    start: i64,
    /// Last offset, inclusive
    stop: i64,
    /// Indices into the native window kept after decimation
    kept: Vec<usize>,
    /// Inclusive native-window index range averaged for the baseline
    baseline: Option<(usize, usize)>,
    times: Vec<f64>,
}

impl Window {
    /// `max_len` is the longest trial, in samples; no event fits a longer window.
    fn new(
        config: &PreprocessConfig,
        sfreq: f64,
        decim: usize,
        max_len: Option<usize>,
    ) -> Result<Self> {
        let start = (config.tmin * sfreq).round() as i64;
        let stop = (config.tmax * sfreq).round() as i64;
        if start > stop {
            return Err(ErrpError::Config(format!(
                "Epoch window [{}, {}] s is empty at {} Hz",
                config.tmin, config.tmax, sfreq
            )));
        }
        let native_len = i128::from(stop) - i128::from(start) + 1;
        if let Some(max_len) = max_len {
            if native_len > max_len as i128 {
                return Err(ErrpError::Config(format!(
                    "Epoch window [{}, {}] s spans {} samples, longer than any trial ({} samples)",
                    config.tmin, config.tmax, native_len, max_len
                )));
            }
        }

        let step = decim as i64;
        // First multiple of the factor at or after `start`.
        let first = start.checked_add((step - start.rem_euclid(step)) % step);
        let offsets: Vec<i64> = match first {
            Some(first) if first <= stop => (first..=stop).step_by(decim).collect(),
            _ => Vec::new(),
        };
        if offsets.is_empty() {
            return Err(ErrpError::Config(format!(
                "Epoch window [{}, {}] s holds no sample after decimating by {}",
                config.tmin, config.tmax, decim
            )));
        }
        let kept = offsets.iter().map(|k| (k - start) as usize).collect();
        let times = offsets.iter().map(|&k| k as f64 / sfreq).collect();

        let baseline = match config.baseline {
            Some(baseline) => Some(baseline_range(baseline, config, sfreq, start, stop)?),
            None => None,
        };

        Ok(Self {
            start,
            stop,
            kept,
            baseline,
            times,
        })
    }

    fn len(&self) -> usize {
        (self.stop - self.start + 1) as usize
    }
}

fn baseline_range(
    baseline: Baseline,
    config: &PreprocessConfig,
    sfreq: f64,
    start: i64,
    stop: i64,
) -> Result<(usize, usize)> {
    let b_start = baseline.start.unwrap_or(config.tmin);
    let b_end = baseline.end.unwrap_or(config.tmax);
    let first = (b_start * sfreq).round() as i64;
    let last = (b_end * sfreq).round() as i64;
    if first > last || first < start || last > stop {
        return Err(ErrpError::Config(format!(
            "Baseline [{}, {}] s lies outside the epoch [{}, {}] s",
            b_start, b_end, config.tmin, config.tmax
        )));
    }
    Ok(((first - start) as usize, (last - start) as usize))
}

/// Filter, epoch, baseline-correct and decimate every trial of `recording`.
pub fn to_epochs(recording: &Recording, config: &PreprocessConfig) -> Result<EpochSet> {
    config.validate()?;
    let sfreq = recording.sfreq;
    let filter = BandPass::design(config.l_freq, config.h_freq, sfreq, config.filter_order)?;
    let decim = decimation_factor(sfreq, config.resample_to)?;
    let out_rate = sfreq / decim as f64;

    if decim > 1 {
        match config.h_freq {
            None => warn!(
                "Decimating to {} Hz without a low-pass filter; the output may alias",
                out_rate
            ),
            Some(h_freq) if out_rate < ALIASING_MARGIN * h_freq => warn!(
                "Output rate {} Hz is below {}x the low-pass edge ({} Hz); the output may alias",
                out_rate, ALIASING_MARGIN, h_freq
            ),
            Some(_) => {}
        }
    }

    let longest = recording.trials.iter().map(Trial::n_samples).max();
    let window = Window::new(config, sfreq, decim, longest)?;
    let mut trial_sets = Vec::with_capacity(recording.trials.len());
    for (index, trial) in recording.trials.iter().enumerate() {
        let set = epoch_trial(recording, index, trial, filter.as_ref(), &window, out_rate)?;
        debug!(
            "Trial {}: {} epochs, {} dropped",
            index,
            set.n_epochs(),
            set.drop_log.len()
        );
        trial_sets.push(set);
    }

    let epochs = if trial_sets.is_empty() {
        empty_set(recording, &window, out_rate)
    } else {
        EpochSet::concatenate(trial_sets)?
    };

    info!(
        "{}: {} epochs of {} samples at {} Hz ({} dropped)",
        recording.path.display(),
        epochs.n_epochs(),
        epochs.n_times(),
        out_rate,
        epochs.drop_log.len()
    );
    Ok(epochs)
}

/// Load a recording and convert it to epochs in one step.
pub fn preprocess_file(path: &Path, config: &PreprocessConfig) -> Result<EpochSet> {
    let recording = load_recording(path)?;
    to_epochs(&recording, config)
}

fn epoch_trial(
    recording: &Recording,
    index: usize,
    trial: &Trial,
    filter: Option<&BandPass>,
    window: &Window,
    out_rate: f64,
) -> Result<EpochSet> {
    let filtered;
    let data = match filter {
        Some(filter) => {
            filtered = filter.apply(&trial.data).map_err(|e| match e {
                ErrpError::Config(reason) => ErrpError::Config(format!(
                    "{} trial {}: {}",
                    recording.path.display(),
                    index,
                    reason
                )),
                other => other,
            })?;
            filtered.view()
        }
        None => trial.data.view(),
    };

    let n_samples = trial.n_samples() as i64;
    let mut epochs: Vec<Array2<f64>> = Vec::with_capacity(trial.events.len());
    let mut events = Vec::with_capacity(trial.events.len());
    let mut drop_log = Vec::new();

    for event in &trial.events {
        let first = event.sample as i64 + window.start;
        let last = event.sample as i64 + window.stop;
        if first < 0 || last >= n_samples {
            warn!(
                "{}: dropping event {} at sample {} in trial {}; window [{}, {}] exceeds {} samples",
                recording.path.display(),
                event.code,
                event.sample,
                index,
                first,
                last,
                n_samples
            );
            drop_log.push(DroppedEvent {
                sample: event.sample,
                code: event.code,
                trial: index,
                subject: recording.subject,
                session: recording.session,
                reason: "window outside trial".to_string(),
            });
            continue;
        }

        let native = data.slice(s![.., first as usize..=last as usize]);
        epochs.push(cut_epoch(native, window));
        events.push(EpochEvent {
            sample: event.sample,
            code: event.code,
            trial: index,
            subject: recording.subject,
            session: recording.session,
        });
    }

    let n_channels = recording.n_channels();
    let array = if epochs.is_empty() {
        Array3::zeros((0, n_channels, window.kept.len()))
    } else {
        let views: Vec<_> = epochs.iter().map(|e| e.view()).collect();
        stack(Axis(0), &views)
            .map_err(|e| ErrpError::Incompatible(format!("epoch shapes differ: {}", e)))?
    };

    Ok(EpochSet {
        ch_names: recording.ch_names.clone(),
        sfreq: out_rate,
        times: window.times.clone(),
        data: array,
        events,
        drop_log,
    })
}

/// Baseline-correct one native-rate window and keep the decimated samples.
fn cut_epoch(native: ArrayView2<'_, f64>, window: &Window) -> Array2<f64> {
    debug_assert_eq!(native.ncols(), window.len());
    let n_channels = native.nrows();
    let mut out = Array2::zeros((n_channels, window.kept.len()));
    for ch in 0..n_channels {
        let row = native.row(ch);
        let offset = match window.baseline {
            Some((first, last)) => {
                let span = row.slice(s![first..=last]);
                span.sum() / span.len() as f64
            }
            None => 0.0,
        };
        for (j, &k) in window.kept.iter().enumerate() {
            out[[ch, j]] = row[k] - offset;
        }
    }
    out
}

fn empty_set(recording: &Recording, window: &Window, out_rate: f64) -> EpochSet {
    EpochSet {
        ch_names: recording.ch_names.clone(),
        sfreq: out_rate,
        times: window.times.clone(),
        data: Array3::zeros((0, recording.n_channels(), window.kept.len())),
        events: Vec::new(),
        drop_log: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Event;
    use std::path::PathBuf;

    /// Channel 0 is a ramp (value = sample index), channel 1 is constant 7.
    fn recording(sfreq: f64, lengths: &[usize], events: Vec<Vec<Event>>) -> Recording {
        let trials = lengths
            .iter()
            .zip(events)
            .map(|(&n, events)| Trial {
                data: Array2::from_shape_fn((2, n), |(c, s)| if c == 0 { s as f64 } else { 7.0 }),
                events,
            })
            .collect();
        Recording {
            path: PathBuf::from("synthetic.mat"),
            subject: Some(1),
            session: Some(1),
            sfreq,
            ch_names: vec!["FCz".to_string(), "Cz".to_string()],
            trials,
        }
    }

    #[test]
    fn test_decimation_factor() {
        assert_eq!(decimation_factor(256.0, None).unwrap(), 1);
        assert_eq!(decimation_factor(256.0, Some(64.0)).unwrap(), 4);
        assert_eq!(decimation_factor(512.0, Some(64.0)).unwrap(), 8);
        // 512 / 100 = 5.12 is truncated.
        assert_eq!(decimation_factor(512.0, Some(100.0)).unwrap(), 5);
        assert_eq!(decimation_factor(256.0, Some(256.0)).unwrap(), 1);
        assert!(decimation_factor(256.0, Some(0.0)).unwrap_err().is_config());
        assert!(decimation_factor(256.0, Some(512.0)).unwrap_err().is_config());
    }

    #[test]
    fn test_window_sample_counts() {
        let rec = recording(256.0, &[2000], vec![vec![Event::new(1000, 5)]]);
        let mut config = PreprocessConfig::unfiltered(0.0, 1.0);
        config.resample_to = Some(64.0);

        let epochs = to_epochs(&rec, &config).unwrap();
        assert_eq!(epochs.n_times(), 65);
        assert_eq!(epochs.sfreq, 64.0);
        assert_eq!(epochs.times[0], 0.0);
        assert!((epochs.times[64] - 1.0).abs() < 1e-12);

        config.tmin = -0.25;
        assert_eq!(to_epochs(&rec, &config).unwrap().n_times(), 81);

        // -0.2 s is -51.2 samples, rounded to -51; the first kept multiple of 4 is -48.
        config.tmin = -0.2;
        let epochs = to_epochs(&rec, &config).unwrap();
        assert_eq!(epochs.n_times(), 77);
        assert!((epochs.times[0] + 48.0 / 256.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_integer_ratio_sets_effective_rate() {
        let rec = recording(256.0, &[1000], vec![vec![Event::new(500, 5)]]);
        let mut config = PreprocessConfig::unfiltered(-0.1, 0.5);
        config.resample_to = Some(100.0);

        // 256 / 100 truncates to 2, so the output runs at 128 Hz.
        let epochs = to_epochs(&rec, &config).unwrap();
        assert_eq!(epochs.sfreq, 128.0);
        for pair in epochs.times.windows(2) {
            assert!((pair[1] - pair[0] - 1.0 / 128.0).abs() < 1e-12);
        }
        // -0.1 s rounds to -26 native samples, 0.5 s to 128: offsets -26..=128 step 2.
        assert_eq!(epochs.n_times(), 78);
        assert!((epochs.times[0] + 26.0 / 256.0).abs() < 1e-12);
        assert!(epochs.times.contains(&0.0));
        assert_eq!(epochs.data[[0, 0, 13]], 500.0);
    }

    #[test]
    fn test_window_longer_than_every_trial_is_config_error() {
        let rec = recording(256.0, &[1000, 1200], vec![vec![Event::new(500, 5)], Vec::new()]);
        let config = PreprocessConfig::unfiltered(0.0, 1e9);
        assert!(to_epochs(&rec, &config).unwrap_err().is_config());

        // A window that fits the longest trial only drops events from shorter ones.
        let config = PreprocessConfig::unfiltered(0.0, 4.0);
        let epochs = to_epochs(&rec, &config).unwrap();
        assert_eq!(epochs.n_epochs(), 0);
        assert_eq!(epochs.drop_log.len(), 1);
    }

    #[test]
    fn test_epochs_follow_event_positions() {
        let rec = recording(
            256.0,
            &[1000],
            vec![vec![Event::new(100, 5), Event::new(500, 6)]],
        );
        let config = PreprocessConfig::unfiltered(0.0, 0.1);
        let epochs = to_epochs(&rec, &config).unwrap();

        assert_eq!(epochs.data.dim(), (2, 2, 27));
        assert_eq!(epochs.data[[0, 0, 0]], 100.0);
        assert_eq!(epochs.data[[1, 0, 3]], 503.0);
        assert_eq!(epochs.data[[1, 1, 3]], 7.0);
        assert_eq!(epochs.codes(), vec![5, 6]);
    }

    #[test]
    fn test_baseline_removes_pre_stimulus_mean() {
        let rec = recording(100.0, &[500], vec![vec![Event::new(200, 5)]]);
        let mut config = PreprocessConfig::unfiltered(-0.1, 0.1);
        config.baseline = Some(Baseline::pre_stimulus());
        let epochs = to_epochs(&rec, &config).unwrap();

        // Ramp mean over samples 190..=200 is 195.
        assert_eq!(epochs.data[[0, 0, 0]], 190.0 - 195.0);
        assert_eq!(epochs.data[[0, 0, 20]], 210.0 - 195.0);
        assert_eq!(epochs.data[[0, 1, 5]], 0.0);
    }

    #[test]
    fn test_out_of_bounds_events_are_dropped() {
        let rec = recording(
            100.0,
            &[300],
            vec![vec![Event::new(5, 5), Event::new(150, 6), Event::new(295, 9)]],
        );
        let config = PreprocessConfig::unfiltered(-0.1, 0.1);
        let epochs = to_epochs(&rec, &config).unwrap();
        assert_eq!(epochs.codes(), vec![6]);
        assert_eq!(epochs.drop_log.len(), 2);
        assert_eq!(epochs.drop_log[0].sample, 5);
        assert_eq!(epochs.drop_log[1].code, 9);
    }

    #[test]
    fn test_trials_concatenate_in_order() {
        let rec = recording(
            256.0,
            &[1200, 1200],
            vec![
                vec![Event::new(100, 5), Event::new(500, 6)],
                vec![Event::new(200, 10), Event::new(800, 9)],
            ],
        );
        let epochs = to_epochs(&rec, &PreprocessConfig::default()).unwrap();
        assert_eq!(epochs.codes(), vec![5, 6, 10, 9]);
        let trials: Vec<usize> = epochs.events.iter().map(|e| e.trial).collect();
        assert_eq!(trials, vec![0, 0, 1, 1]);
        assert_eq!(epochs.n_times(), 77);
        assert_eq!(epochs.events[0].subject, Some(1));
    }

    #[test]
    fn test_trial_without_events_gives_empty_set() {
        let rec = recording(256.0, &[1000], vec![Vec::new()]);
        let epochs = to_epochs(&rec, &PreprocessConfig::default()).unwrap();
        assert_eq!(epochs.n_epochs(), 0);
        assert_eq!(epochs.data.dim(), (0, 2, 77));
    }

    #[test]
    fn test_cutoff_above_nyquist_is_config_error() {
        let rec = recording(16.0, &[1000], vec![Vec::new()]);
        let config = PreprocessConfig {
            resample_to: None,
            ..Default::default()
        };
        assert!(to_epochs(&rec, &config).unwrap_err().is_config());
    }
}
