//! Command-line engine: renders by invoking a `dot`-compatible executable as
//! a subprocess inside a private temporary working directory.
//!
//! Subprocess execution goes through the [`CommandExecutor`] trait so tests
//! (and embedders with unusual process requirements) can substitute the real
//! spawn with their own implementation.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::engine::{Engine, RenderRequest, Rendered};
use crate::error::{Error, Result};

/// Name of the input file written into the working directory.
pub const INPUT_FILE_NAME: &str = "graph.dot";

/// Stem of the output file the tool is asked to produce (`outfile.<ext>`).
pub const OUTPUT_FILE_STEM: &str = "outfile";

const DEFAULT_COMMAND: &str = "dot";

/// A fully resolved command invocation: program path plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs a command line in a working directory and reports the exit code.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &CommandLine, working_dir: &Path) -> Result<i32>;
}

/// Default executor backed by [`std::process::Command`].
///
/// Standard streams are detached; the engines communicate with the tool
/// exclusively through files in the working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn execute(&self, command: &CommandLine, working_dir: &Path) -> Result<i32> {
        let status = Command::new(&command.program)
            .args(&command.args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        // A missing code means the process died from a signal; report it as a
        // generic nonzero exit so callers still see a failure.
        Ok(status.code().unwrap_or(-1))
    }
}

/// Engine that shells out to an external Graphviz executable.
pub struct CommandLineEngine {
    command: String,
    search_path: Option<Vec<PathBuf>>,
    executor: Box<dyn CommandExecutor>,
}

impl Default for CommandLineEngine {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            search_path: None,
            executor: Box::new(SystemCommandExecutor),
        }
    }
}

impl CommandLineEngine {
    /// Engine that looks for `dot` on the `PATH` environment variable and
    /// spawns it directly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the executable name (e.g. `neato`, `fdp`).
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Restricts the executable search to the given directories instead of
    /// the `PATH` environment variable.
    pub fn with_search_path(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_path = Some(dirs);
        self
    }

    /// Substitutes the subprocess executor.
    pub fn with_executor(mut self, executor: Box<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Directories searched for the executable, in order.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        match &self.search_path {
            Some(dirs) => dirs.clone(),
            None => std::env::var_os("PATH")
                .map(|path| std::env::split_paths(&path).collect())
                .unwrap_or_default(),
        }
    }

    /// Resolves the executable on the search path; the first directory
    /// containing an executable file with the command's name wins.
    pub fn resolve_executable(&self) -> Result<PathBuf> {
        let dirs = self.search_dirs();
        let file_name = platform_executable_name(&self.command);
        for dir in &dirs {
            let candidate = dir.join(&file_name);
            if is_executable(&candidate) {
                debug!(executable = %candidate.display(), "resolved render command");
                return Ok(candidate);
            }
        }
        Err(Error::EngineNotFound {
            command: self.command.clone(),
            searched: dirs,
        })
    }
}

impl Engine for CommandLineEngine {
    fn render(&self, request: &RenderRequest) -> Result<Rendered> {
        let executable = self.resolve_executable()?;

        // RAII temp dir: removed on every exit path, including errors below.
        let workdir = tempfile::tempdir()?;
        let output_name = format!("{OUTPUT_FILE_STEM}.{}", request.format.extension());

        std::fs::write(workdir.path().join(INPUT_FILE_NAME), &request.source)?;

        let command = CommandLine::new(executable)
            .arg(format!("-T{}", request.format.flag()))
            .arg(format!("-o{output_name}"))
            .arg(INPUT_FILE_NAME);

        debug!(command = %command, working_dir = %workdir.path().display(), "running render command");
        let exit_code = self.executor.execute(&command, workdir.path())?;
        if exit_code != 0 {
            return Err(Error::ExecutionFailed {
                command: command.to_string(),
                exit_code,
                working_dir: workdir.path().to_path_buf(),
            });
        }

        let output_path = workdir.path().join(&output_name);
        if !output_path.is_file() {
            return Err(match stray_output_extension(workdir.path()) {
                Some(produced) => Error::FormatMismatch {
                    requested: request.format,
                    produced,
                },
                None => Error::OutputMissing {
                    expected: PathBuf::from(output_name),
                    working_dir: workdir.path().to_path_buf(),
                },
            });
        }

        let bytes = std::fs::read(&output_path)?;
        Ok(Rendered::new(request.format, bytes))
    }
}

/// Looks for an `outfile.*` the tool produced under a different extension
/// than the one requested.
fn stray_output_extension(dir: &Path) -> Option<String> {
    for entry in std::fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if path.file_stem().and_then(|s| s.to_str()) == Some(OUTPUT_FILE_STEM) {
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                return Some(ext.to_string());
            }
        }
    }
    None
}

fn platform_executable_name(command: &str) -> String {
    if cfg!(windows) && !command.to_ascii_lowercase().ends_with(".exe") {
        format!("{command}.exe")
    } else {
        command.to_string()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
