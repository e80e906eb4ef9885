use crate::error::{ErrpError, Result};
use log::debug;
use ndarray::{Array2, Axis};
use sci_rs::signal::filter::{design::*, sosfiltfilt_dyn};

/// Zero-phase Butterworth filter in second-order sections.
///
/// Depending on which cutoffs are set this is a band-pass, a low-pass or a
/// high-pass; it is applied forward and backward so the phase is preserved.
#[derive(Debug, Clone)]
pub struct BandPass {
    sos: Vec<Sos<f64>>,
    l_freq: Option<f64>,
    h_freq: Option<f64>,
}

impl BandPass {
    /// Design the filter, or `None` when both cutoffs are unset.
    pub fn design(
        l_freq: Option<f64>,
        h_freq: Option<f64>,
        sfreq: f64,
        order: usize,
    ) -> Result<Option<Self>> {
        let nyquist = sfreq / 2.0;
        for freq in [l_freq, h_freq].into_iter().flatten() {
            if !(freq > 0.0 && freq < nyquist) {
                return Err(ErrpError::Config(format!(
                    "Cutoff {} Hz must lie strictly between 0 and the Nyquist frequency ({} Hz)",
                    freq, nyquist
                )));
            }
        }
        if order == 0 {
            return Err(ErrpError::Config("Filter order must be at least 1".to_string()));
        }

        let (cutoffs, band) = match (l_freq, h_freq) {
            (None, None) => return Ok(None),
            (Some(low), Some(high)) => {
                if low >= high {
                    return Err(ErrpError::Config(format!(
                        "Low cutoff ({} Hz) must be less than high cutoff ({} Hz)",
                        low, high
                    )));
                }
                (vec![low, high], FilterBandType::Bandpass)
            }
            (None, Some(high)) => (vec![high], FilterBandType::Lowpass),
            (Some(low), None) => (vec![low], FilterBandType::Highpass),
        };

        let filter = butter_dyn(
            order,
            cutoffs,
            Some(band),
            Some(false),
            Some(FilterOutputType::Sos),
            Some(sfreq),
        );
        let DigitalFilter::Sos(SosFormatFilter { sos }) = filter else {
            return Err(ErrpError::Config(
                "Filter design did not produce second-order sections".to_string(),
            ));
        };
        debug!(
            "Designed order-{} Butterworth {:?}-{:?} Hz at {} Hz ({} sections)",
            order,
            l_freq,
            h_freq,
            sfreq,
            sos.len()
        );

        Ok(Some(Self { sos, l_freq, h_freq }))
    }

    pub fn l_freq(&self) -> Option<f64> {
        self.l_freq
    }

    pub fn h_freq(&self) -> Option<f64> {
        self.h_freq
    }

    pub fn n_sections(&self) -> usize {
        self.sos.len()
    }

    /// Edge padding used by forward-backward filtering.
    pub fn padlen(&self) -> usize {
        3 * (2 * self.sos.len() + 1)
    }

    /// Filter each row (channel) of `data` over its full length.
    pub fn apply(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        let n_samples = data.ncols();
        if n_samples <= self.padlen() {
            return Err(ErrpError::Config(format!(
                "Signal of {} samples is too short for the filter (needs more than {})",
                n_samples,
                self.padlen()
            )));
        }

        let mut out = Array2::zeros(data.raw_dim());
        for (row, mut target) in data.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
            let filtered: Vec<f64> = sosfiltfilt_dyn(row.iter().copied(), &self.sos);
            for (dst, src) in target.iter_mut().zip(filtered) {
                *dst = src;
            }
        }
        Ok(out)
    }
}
