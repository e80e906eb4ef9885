use errp_rs::ErrpError;

pub const SUCCESS: i32 = 0;
pub const EXECUTION_ERROR: i32 = 1;
pub const INPUT_ERROR: i32 = 2;
pub const NETWORK_ERROR: i32 = 3;

/// Exit code for a library error.
pub fn for_error(error: &ErrpError) -> i32 {
    match error {
        ErrpError::Network { .. } | ErrpError::HttpStatus { .. } => NETWORK_ERROR,
        ErrpError::Config(_)
        | ErrpError::FileNotFound(_)
        | ErrpError::Format { .. }
        | ErrpError::JsonError(_) => INPUT_ERROR,
        ErrpError::Incompatible(_) | ErrpError::IoError(_) => EXECUTION_ERROR,
    }
}
