//! Error type for the session engine.

use std::fmt;

use futures::sync::oneshot::Canceled;

pub type Result<T> = std::result::Result<T, Error>;

/// An enum containing the failure modes of the session engine.
///
/// Implements the usual error traits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("device error during {operation}: {source}")]
    Device {
        #[source]
        source: ocl::Error,
        operation: &'static str,
    },

    // The log is printed on its own line by `Display` (not folded into the
    // one-line `Debug` derive) so a large diagnostics dump doesn't drown the
    // source key when this variant shows up in a `{:?}`-formatted chain.
    #[error("compile error for source key {source_key:?}:\n{log}")]
    Compile { source_key: String, log: String },

    #[error("reduce future canceled before resolution")]
    Canceled(#[from] Canceled),

    #[error("precondition violated: {0}")]
    Precondition(String),
}

impl Error {
    pub(crate) fn device(source: ocl::Error, operation: &'static str) -> Error {
        Error::Device { source, operation }
    }

    pub(crate) fn compile(source_key: impl fmt::Debug, log: String) -> Error {
        Error::Compile {
            source_key: format!("{:?}", source_key),
            log,
        }
    }
}

impl From<ocl::Error> for Error {
    fn from(err: ocl::Error) -> Error {
        Error::Device {
            source: err,
            operation: "unspecified",
        }
    }
}

unsafe impl Send for Error {}
unsafe impl Sync for Error {}
