pub mod config;
pub mod epochs;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod loader;
pub mod mat;
pub mod mmap_utils;
pub mod session;
pub mod types;

pub use config::{Baseline, DatasetConfig, ExtractConfig, FetchConfig, PreprocessConfig};
pub use epochs::{decimation_factor, preprocess_file, to_epochs};
pub use error::{ErrpError, Result};
pub use extract::{extract, extract_dataset, Dataset, Labels};
pub use fetch::{ensure_dataset, FetchReport, Fetcher, HttpTransport, Transport};
pub use loader::{load_recording, read_info};
pub use session::load_session;
pub use types::*;

pub use ndarray;
