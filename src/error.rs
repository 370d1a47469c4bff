//! Error type shared by the loader, bridge and device layers.

use std::path::PathBuf;

use crate::status::Status;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Explicitly configured SDK library path does not exist.
    #[error("SDK library not found at {}", .0.display())]
    LibraryNotFound(PathBuf),

    /// SDK library exists but could not be loaded into the process.
    #[error("unable to load SDK library {library}: {source}")]
    Load {
        library: String,
        #[source]
        source: libloading::Error,
    },

    /// Function required by an operation was never resolved.
    #[error("not initialized: {0} is not available")]
    NotInitialized(&'static str),

    /// SDK call returned a status other than `MLAPI_OK`.
    #[error("{}", api_message(.code, .message))]
    Api { code: i32, message: Option<String> },

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// SDK output could not be converted.
    #[error("invalid SDK data: {0}")]
    InvalidData(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("elevated privileges are required to control Mystic Light devices")]
    NotElevated,
}

fn api_message(code: &i32, message: &Option<String>) -> String {
    let description = message.as_deref().unwrap_or("no description available");
    format!("{}: {} (code {})", Status::from(*code), description, code)
}

impl Error {
    /// Decoded SDK status for [`Error::Api`].
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Api { code, .. } => Some(Status::from(*code)),
            _ => None,
        }
    }
}
