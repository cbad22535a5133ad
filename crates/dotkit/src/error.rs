use std::path::PathBuf;

use crate::format::Format;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No rendering engine configured; install one with `Graphviz::use_engine` first")]
    NoEngineConfigured,

    #[error("No `{command}` executable found in search path {searched:?}")]
    EngineNotFound {
        command: String,
        searched: Vec<PathBuf>,
    },

    #[error("`{command}` exited with code {exit_code} (working directory: {working_dir:?})")]
    ExecutionFailed {
        command: String,
        exit_code: i32,
        working_dir: PathBuf,
    },

    #[error("Expected output file {expected:?} missing from {working_dir:?}")]
    OutputMissing {
        expected: PathBuf,
        working_dir: PathBuf,
    },

    #[error("Requested {requested} output but the command produced a `.{produced}` file")]
    FormatMismatch { requested: Format, produced: String },

    #[error("Render server error: {message}")]
    Server { message: String },

    #[error("Engine error: {message}")]
    Render { message: String },

    #[error("Unknown output format `{0}`")]
    UnknownFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
