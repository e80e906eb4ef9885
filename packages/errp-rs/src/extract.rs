use crate::config::ExtractConfig;
use crate::error::{ErrpError, Result};
use crate::types::{EpochSet, EventClass, Features};
use log::{debug, info};
use ndarray::{s, Array1, Axis};

/// One class label per epoch: 0 for correct, 1 for error responses.
pub type Labels = Array1<u8>;

/// Features and labels together with the axes they were cut along.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Features,
    pub labels: Labels,
    pub ch_names: Vec<String>,
    pub times: Vec<f64>,
    pub sfreq: f64,
}

/// Feature tensor and label vector of the labeled epochs in `epochs`.
pub fn extract(epochs: &EpochSet, config: &ExtractConfig) -> Result<(Features, Labels)> {
    extract_dataset(epochs, config).map(|d| (d.features, d.labels))
}

/// Like [`extract`], also returning the picked channel names and crop times.
pub fn extract_dataset(epochs: &EpochSet, config: &ExtractConfig) -> Result<Dataset> {
    let picks = resolve_picks(&epochs.ch_names, &config.picks)?;
    let (first, last) = crop_range(&epochs.times, epochs.sfreq, config.tmin, config.tmax)?;

    let mut selected = Vec::with_capacity(epochs.events.len());
    let mut labels = Vec::with_capacity(epochs.events.len());
    for (i, event) in epochs.events.iter().enumerate() {
        if let Some(class) = EventClass::from_code(event.code) {
            selected.push(i);
            labels.push(class.label());
        }
    }
    debug!(
        "Keeping {} of {} epochs with labeled event codes",
        selected.len(),
        epochs.n_epochs()
    );

    let data = epochs
        .data
        .select(Axis(0), &selected)
        .select(Axis(1), &picks)
        .slice(s![.., .., first..=last])
        .to_owned();
    let features = if picks.len() == 1 {
        Features::Single(data.index_axis_move(Axis(1), 0))
    } else {
        Features::Multi(data)
    };

    let labels = Array1::from(labels);
    let n_error = labels.iter().filter(|&&l| l == 1).count();
    info!(
        "Extracted features {:?} with {} error and {} correct labels",
        features.shape(),
        n_error,
        labels.len() - n_error
    );

    Ok(Dataset {
        features,
        labels,
        ch_names: picks.iter().map(|&i| epochs.ch_names[i].clone()).collect(),
        times: epochs.times[first..=last].to_vec(),
        sfreq: epochs.sfreq,
    })
}

/// Channel indices for `picks`, all channels when empty.
fn resolve_picks(ch_names: &[String], picks: &[String]) -> Result<Vec<usize>> {
    if picks.is_empty() {
        return Ok((0..ch_names.len()).collect());
    }
    picks
        .iter()
        .map(|pick| {
            ch_names.iter().position(|c| c == pick).ok_or_else(|| {
                ErrpError::Config(format!(
                    "Channel '{}' is not in the recording (available: {})",
                    pick,
                    ch_names.join(", ")
                ))
            })
        })
        .collect()
}

/// Inclusive index range of the samples nearest to `tmin` and `tmax`.
fn crop_range(
    times: &[f64],
    sfreq: f64,
    tmin: Option<f64>,
    tmax: Option<f64>,
) -> Result<(usize, usize)> {
    let (Some(&t0), Some(&t_end)) = (times.first(), times.last()) else {
        return Err(ErrpError::Config("Epochs have an empty time axis".to_string()));
    };
    let tmin = tmin.unwrap_or(t0);
    let tmax = tmax.unwrap_or(t_end);
    if !tmin.is_finite() || !tmax.is_finite() {
        return Err(ErrpError::Config(format!(
            "Crop bounds must be finite, got [{}, {}]",
            tmin, tmax
        )));
    }
    if tmin > tmax {
        return Err(ErrpError::Config(format!(
            "Crop tmin ({} s) must not exceed tmax ({} s)",
            tmin, tmax
        )));
    }

    let last_index = (times.len() - 1) as i64;
    let first = ((tmin - t0) * sfreq).round() as i64;
    let last = ((tmax - t0) * sfreq).round() as i64;
    if last < 0 || first > last_index {
        return Err(ErrpError::Config(format!(
            "Crop [{}, {}] s does not overlap the epoch [{}, {}] s",
            tmin, tmax, t0, t_end
        )));
    }
    let first = first.max(0);
    let last = last.min(last_index);
    if first > last {
        return Err(ErrpError::Config(format!(
            "Crop [{}, {}] s contains no sample at {} Hz",
            tmin, tmax, sfreq
        )));
    }
    Ok((first as usize, last as usize))
}
