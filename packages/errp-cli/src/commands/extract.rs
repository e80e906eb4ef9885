use crate::cli::ExtractArgs;
use crate::exit_codes;
use crate::output;
use errp_rs::mat::{save, MatArray, MatClass};
use errp_rs::{
    extract_dataset, load_session, preprocess_file, Dataset, DatasetConfig, EpochSet,
};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Source {
    Session { session: u32, subjects: Vec<u32> },
    Files { files: Vec<String> },
}

#[derive(Serialize)]
struct ExtractSummary {
    source: Source,
    n_epochs: usize,
    n_dropped: usize,
    shape: Vec<usize>,
    n_correct: usize,
    n_error: usize,
    channels: Vec<String>,
    sfreq: f64,
    tmin: Option<f64>,
    tmax: Option<f64>,
    output: Option<String>,
}

pub fn execute(args: ExtractArgs) -> i32 {
    let config = match build_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    let (source, epochs) = match &args.files {
        Some(pattern) => {
            let files = match resolve_glob(pattern) {
                Ok(f) => f,
                Err(msg) => {
                    eprintln!("Error: {}", msg);
                    return exit_codes::INPUT_ERROR;
                }
            };
            if files.is_empty() {
                eprintln!("Error: No files match '{}'", pattern);
                return exit_codes::INPUT_ERROR;
            }
            match epochs_from_files(&files, &config, args.quiet) {
                Ok(epochs) => (Source::Files { files }, epochs),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return exit_codes::for_error(&e);
                }
            }
        }
        None => {
            let session = args.session.unwrap_or(config.session);
            let subjects = args.subjects.clone().unwrap_or_else(|| config.subjects.clone());
            if !args.quiet {
                eprintln!(
                    "Preprocessing session {} for subjects {:?}...",
                    session, subjects
                );
            }
            match load_session(
                Path::new(&args.data_dir),
                session,
                &subjects,
                &config.preprocess,
            ) {
                Ok(epochs) => (Source::Session { session, subjects }, epochs),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return exit_codes::for_error(&e);
                }
            }
        }
    };

    let dataset = match extract_dataset(&epochs, &config.extract) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if let Some(ref path) = args.output {
        if let Err(e) = save(Path::new(path), &to_mat_arrays(&dataset), true) {
            eprintln!("Error: Failed to write '{}': {}", path, e);
            return exit_codes::EXECUTION_ERROR;
        }
        if !args.quiet {
            eprintln!("Wrote {}", path);
        }
    }

    let n_error = dataset.labels.iter().filter(|&&l| l == 1).count();
    let summary = ExtractSummary {
        source,
        n_epochs: epochs.n_epochs(),
        n_dropped: epochs.drop_log.len(),
        shape: dataset.features.shape(),
        n_correct: dataset.labels.len() - n_error,
        n_error,
        channels: dataset.ch_names.clone(),
        sfreq: dataset.sfreq,
        tmin: dataset.times.first().copied(),
        tmax: dataset.times.last().copied(),
        output: args.output.clone(),
    };

    match output::print_json(&summary, args.compact) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::EXECUTION_ERROR
        }
    }
}

/// Configuration file (or defaults) with command-line overrides applied.
fn build_config(args: &ExtractArgs) -> errp_rs::Result<DatasetConfig> {
    let mut config = match &args.config {
        Some(path) => DatasetConfig::from_file(Path::new(path))?,
        None => DatasetConfig::default(),
    };

    let pre = &mut config.preprocess;
    if args.no_filter {
        pre.l_freq = None;
        pre.h_freq = None;
    }
    if let Some(l_freq) = args.l_freq {
        pre.l_freq = Some(l_freq);
    }
    if let Some(h_freq) = args.h_freq {
        pre.h_freq = Some(h_freq);
    }
    if args.no_resample {
        pre.resample_to = None;
    }
    if let Some(rate) = args.resample_to {
        pre.resample_to = Some(rate);
    }
    if let Some(tmin) = args.tmin {
        pre.tmin = tmin;
    }
    if let Some(tmax) = args.tmax {
        pre.tmax = tmax;
    }
    if args.no_baseline {
        pre.baseline = None;
    }

    let ext = &mut config.extract;
    if let Some(ref picks) = args.picks {
        ext.picks = picks.clone();
    }
    if let Some(tmin) = args.crop_tmin {
        ext.tmin = Some(tmin);
    }
    if let Some(tmax) = args.crop_tmax {
        ext.tmax = Some(tmax);
    }

    config.preprocess.validate()?;
    Ok(config)
}

fn epochs_from_files(
    files: &[String],
    config: &DatasetConfig,
    quiet: bool,
) -> errp_rs::Result<EpochSet> {
    let total = files.len();
    let mut sets = Vec::with_capacity(total);
    for (i, file) in files.iter().enumerate() {
        if !quiet {
            eprintln!("[{}/{}] {}...", i + 1, total, file);
        }
        sets.push(preprocess_file(Path::new(file), &config.preprocess)?);
    }
    EpochSet::concatenate(sets)
}

fn resolve_glob(pattern: &str) -> Result<Vec<String>, String> {
    let paths =
        glob::glob(pattern).map_err(|e| format!("Invalid glob pattern '{}': {}", pattern, e))?;

    let mut files: Vec<String> = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    if let Some(s) = path.to_str() {
                        files.push(s.to_string());
                    }
                }
            }
            Err(e) => {
                eprintln!("Warning: glob error: {}", e);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Variables written to the feature file, column-major as MATLAB expects.
fn to_mat_arrays(dataset: &Dataset) -> Vec<MatArray> {
    let labels = dataset.labels.iter().map(|&l| f64::from(l)).collect::<Vec<_>>();
    let channels: Vec<&str> = dataset.ch_names.iter().map(String::as_str).collect();
    vec![
        MatArray::numeric(
            "X",
            dataset.features.shape(),
            dataset.features.to_column_major(),
        ),
        MatArray::numeric_class("y", MatClass::UInt8, vec![labels.len(), 1], labels),
        MatArray::string_cell("channels", &channels),
        MatArray::column("times", dataset.times.clone()),
        MatArray::scalar("sfreq", dataset.sfreq),
    ]
}
