#![allow(dead_code)]

use errp_rs::mat::{save, MatArray};
use std::path::{Path, PathBuf};

pub const SFREQ: f64 = 256.0;
pub const LABELS: [&str; 4] = ["Fz", "FCz", "Cz", "STATUS"];

/// A trial of `n_samples` samples whose channel `c` carries a slow sine
/// scaled by `c + 1`, with the given (position, code) events.
pub struct TrialFixture {
    pub n_samples: usize,
    pub events: Vec<(usize, i32)>,
    /// Write the status channel as an extra data column
    pub with_status: bool,
}

impl TrialFixture {
    pub fn new(n_samples: usize, events: &[(usize, i32)]) -> Self {
        Self {
            n_samples,
            events: events.to_vec(),
            with_status: false,
        }
    }
}

fn trial_array(fixture: &TrialFixture, subject: u32, session: u32) -> MatArray {
    let n_eeg = LABELS.len() - 1;
    let n_columns = if fixture.with_status { n_eeg + 1 } else { n_eeg };
    let mut data = Vec::with_capacity(fixture.n_samples * n_columns);
    for c in 0..n_columns {
        for s in 0..fixture.n_samples {
            let t = s as f64 / SFREQ;
            let value = if c == n_eeg {
                0.0
            } else {
                (c as f64 + 1.0) * (2.0 * std::f64::consts::PI * 4.0 * t).sin()
            };
            data.push(value);
        }
    }

    let pos = fixture.events.iter().map(|e| e.0 as f64).collect();
    let typ = fixture.events.iter().map(|e| e.1 as f64).collect();
    let header = MatArray::structure(
        "",
        vec![
            ("Subject", MatArray::scalar("", subject as f64)),
            ("Session", MatArray::scalar("", session as f64)),
            ("SampleRate", MatArray::scalar("", SFREQ)),
            ("Label", MatArray::string_cell("", &LABELS)),
            (
                "EVENT",
                MatArray::structure(
                    "",
                    vec![
                        ("POS", MatArray::column("", pos)),
                        ("TYP", MatArray::column("", typ)),
                    ],
                ),
            ),
        ],
    );
    MatArray::structure(
        "",
        vec![
            (
                "eeg",
                MatArray::numeric("", vec![fixture.n_samples, n_columns], data),
            ),
            ("header", header),
        ],
    )
}

/// Write a recording file with one `run` cell per trial.
pub fn write_recording(path: &Path, subject: u32, session: u32, trials: &[TrialFixture]) -> PathBuf {
    let cells = trials
        .iter()
        .map(|t| trial_array(t, subject, session))
        .collect();
    let run = MatArray::cell("run", vec![1, trials.len()], cells);
    save(path, &[run], true).expect("fixture should be writable");
    path.to_path_buf()
}

/// The two-trial recording used by the end-to-end scenario.
pub fn scenario_trials() -> Vec<TrialFixture> {
    vec![
        TrialFixture::new(1200, &[(100, 5), (500, 6)]),
        TrialFixture::new(1200, &[(200, 10), (800, 9)]),
    ]
}
