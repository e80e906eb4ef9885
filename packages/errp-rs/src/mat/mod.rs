//! MATLAB Level-5 MAT-file support
//!
//! BNCI recordings are distributed as MATLAB v7 files holding nested cell
//! and struct arrays, which general numeric-only readers cannot walk. This
//! module reads and writes the level-5 container directly:
//! - v5/v6/v7 files, little- or big-endian, with zlib-compressed elements
//! - numeric, logical, char, cell, struct and object arrays
//!
//! MATLAB v7.3 files are HDF5 containers and are rejected.

mod reader;
mod value;
mod writer;

pub use reader::{Endian, MatFile};
pub use value::{MatArray, MatClass, MatValue};
pub use writer::{save, write_mat};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatError {
    #[error("MATLAB v7.3 (HDF5) files are not supported; re-save with save(..., '-v7')")]
    Hdf5,

    #[error("not a MAT level-5 file: {0}")]
    BadHeader(String),

    #[error("unsupported MAT-file version 0x{0:04x}")]
    UnsupportedVersion(u16),

    #[error("unexpected end of data while reading {0}")]
    Truncated(String),

    #[error("corrupt element: {0}")]
    Corrupt(String),

    #[error("unsupported array: {0}")]
    Unsupported(String),

    #[error("failed to inflate compressed element: {0}")]
    Decompress(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
