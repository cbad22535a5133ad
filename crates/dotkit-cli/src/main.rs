use dotkit::{CommandLineEngine, Engine, Format, Graphviz, ServerEngine};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Render(dotkit::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<dotkit::Error> for CliError {
    fn from(value: dotkit::Error) -> Self {
        Self::Render(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Render,
    Info,
}

#[derive(Debug, Clone, Copy, Default)]
enum EngineKind {
    #[default]
    Dot,
    Server,
}

#[derive(Debug)]
struct Args {
    command: Command,
    input: Option<String>,
    format: Format,
    engine: EngineKind,
    dot_command: Option<String>,
    dot_dirs: Vec<PathBuf>,
    server: Option<String>,
    out: Option<String>,
    pretty: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            command: Command::Render,
            input: None,
            format: Format::Svg,
            engine: EngineKind::Dot,
            dot_command: None,
            dot_dirs: Vec::new(),
            server: None,
            out: None,
            pretty: false,
        }
    }
}

#[derive(Serialize)]
struct InfoOut {
    command: String,
    resolved: Option<String>,
    searched: Vec<String>,
}

fn usage() -> &'static str {
    "dotkit-cli\n\
\n\
USAGE:\n\
  dotkit-cli [render] [--format svg|svg-standalone|png|ps|xdot|plain|plain-ext|json|dot]\n\
             [--engine dot|server] [--dot-cmd <name>] [--dot-dir <dir>]... [--server <url>]\n\
             [--out <path>] [<path>|-]\n\
  dotkit-cli info [--dot-cmd <name>] [--dot-dir <dir>]... [--pretty]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - render prints text formats to stdout by default; use --out to write a file.\n\
  - PNG output defaults to writing next to the input file (or ./out.png for stdin);\n\
    --out - streams the raw bytes to stdout.\n\
  - --engine server requires --server with the endpoint URL.\n\
  - --dot-dir restricts the executable search to the given directories\n\
    (repeatable); the default is the PATH environment variable.\n\
  - info resolves the dot executable and prints a JSON report.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1).peekable();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "render" => args.command = Command::Render,
            "info" => args.command = Command::Info,
            "--pretty" => args.pretty = true,
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.format = fmt
                    .parse::<Format>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--engine" => {
                let Some(kind) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.engine = match kind.as_str() {
                    "dot" => EngineKind::Dot,
                    "server" => EngineKind::Server,
                    _ => return Err(CliError::Usage(usage())),
                };
            }
            "--dot-cmd" => {
                let Some(name) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.dot_command = Some(name.clone());
            }
            "--dot-dir" => {
                let Some(dir) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.dot_dirs.push(PathBuf::from(dir));
            }
            "--server" => {
                let Some(url) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.server = Some(url.clone());
            }
            "--out" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(path.clone());
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn build_command_line_engine(args: &Args) -> CommandLineEngine {
    let mut engine = CommandLineEngine::new();
    if let Some(command) = &args.dot_command {
        engine = engine.with_command(command.clone());
    }
    if !args.dot_dirs.is_empty() {
        engine = engine.with_search_path(args.dot_dirs.clone());
    }
    engine
}

fn build_engine(args: &Args) -> Result<Arc<dyn Engine>, CliError> {
    match args.engine {
        EngineKind::Dot => Ok(Arc::new(build_command_line_engine(args))),
        EngineKind::Server => {
            let Some(endpoint) = &args.server else {
                return Err(CliError::Usage(usage()));
            };
            Ok(Arc::new(ServerEngine::connect(endpoint)?))
        }
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn write_bytes(bytes: &[u8], out: &str) -> Result<(), CliError> {
    if out == "-" {
        use std::io::Write;
        std::io::stdout().lock().write_all(bytes)?;
    } else {
        std::fs::write(out, bytes)?;
    }
    Ok(())
}

fn default_binary_out_path(input: Option<&str>, ext: &str) -> PathBuf {
    match input {
        Some(path) if path != "-" => PathBuf::from(path).with_extension(ext),
        _ => PathBuf::from(format!("out.{ext}")),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Command::Info => {
            let engine = build_command_line_engine(&args);
            let resolved = match engine.resolve_executable() {
                Ok(path) => Some(path.to_string_lossy().into_owned()),
                Err(dotkit::Error::EngineNotFound { .. }) => None,
                Err(err) => return Err(err.into()),
            };
            let info = InfoOut {
                command: engine.command().to_string(),
                resolved,
                searched: engine
                    .search_dirs()
                    .iter()
                    .map(|d| d.to_string_lossy().into_owned())
                    .collect(),
            };
            write_json(&info, args.pretty)
        }
        Command::Render => {
            let source = read_input(args.input.as_deref())?;
            let mut graphviz = Graphviz::new();
            graphviz.use_engine(Some(build_engine(&args)?));

            let rendered = graphviz.from_string(source).render(args.format)?;
            if args.format.is_text() {
                match &args.out {
                    None => {
                        print!("{}", rendered.as_str()?);
                        Ok(())
                    }
                    Some(out) => write_bytes(rendered.bytes(), out),
                }
            } else {
                let out = args.out.clone().unwrap_or_else(|| {
                    default_binary_out_path(args.input.as_deref(), args.format.extension())
                        .to_string_lossy()
                        .into_owned()
                });
                write_bytes(rendered.bytes(), &out)
            }
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
