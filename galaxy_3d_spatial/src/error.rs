//! Error types for the Galaxy3D spatial core
//!
//! Spatial operations degrade to empty results instead of failing. Errors only
//! surface from the graphics device collaborator, command recording and
//! configuration validation.

use std::fmt;

/// Result type for Galaxy3D spatial operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D spatial errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error reported by the graphics device
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer, query, mesh data)
    InvalidResource(String),

    /// Rejected configuration value
    InvalidConfig(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Build an `Error::BackendError` and log it at ERROR severity
///
/// # Example
///
/// ```no_run
/// # use galaxy_3d_spatial::engine_err;
/// # let id = 0;
/// let err = engine_err!("galaxy3d::Octree", "node {} has no bounds", id);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::BackendError(message)
    }};
}

/// Log an error and return it from the current function
///
/// # Example
///
/// ```no_run
/// # use galaxy_3d_spatial::engine_bail;
/// # fn f() -> galaxy_3d_spatial::galaxy3d::Result<()> {
/// engine_bail!("galaxy3d::mock", "buffer creation disabled");
/// # }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
