use clap::{Parser, Subcommand};
use rasterscript::codec::{self, ImageCodec};
use rasterscript::command;
use rasterscript::config::{self, EngineConfig};
use rasterscript::interpreter::{self, ErrorPolicy, Interpreter, InterpreterSettings, Outcome};
use rasterscript::output;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rasterscript")]
#[command(about = "Deterministic raster transforms driven by a line-oriented script language")]
#[command(long_about = "\
Deterministic raster transforms driven by a line-oriented script language

Each line names a command, its operands, and the name to store the result
under. Images live in a per-session registry.

  load photo.png photo
  brighten 30 photo bright
  blur bright mask soft             # only where mask is pure black
  sepia photo preview split 50      # left half sepia, right half original
  levels-adjust 20 128 230 photo leveled
  compress 60 leveled small
  save out.png small

Blank lines and lines starting with # are ignored.

Run 'rasterscript gen-config' to generate a documented rasterscript.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./rasterscript.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log each executed command
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run script files, several at once when more than one is given
    Run {
        #[arg(required = true)]
        scripts: Vec<PathBuf>,
        /// Stop each script at its first failing line
        #[arg(long)]
        abort_on_error: bool,
    },
    /// Read commands from stdin one line at a time
    Shell,
    /// Parse script files without executing them
    Check {
        #[arg(required = true)]
        scripts: Vec<PathBuf>,
    },
    /// Print a stock rasterscript.toml with all options documented
    GenConfig,
    /// List the image file extensions load and save understand
    Formats,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }
    if let Command::Formats = cli.command {
        let extensions: Vec<String> = codec::supported_extensions().map(String::from).collect();
        output::print_lines(&extensions);
        return Ok(ExitCode::SUCCESS);
    }

    let engine = config::load_config(cli.config.as_deref())?;
    init_logging(&engine, cli.verbose);

    let ok = match cli.command {
        Command::Run {
            scripts,
            abort_on_error,
        } => {
            let mut settings = engine.to_settings();
            if abort_on_error {
                settings.on_error = ErrorPolicy::Abort;
            }
            init_thread_pool(&engine.processing);
            run_scripts(&scripts, settings)
        }
        Command::Shell => shell(engine.to_settings())?,
        Command::Check { scripts } => check_scripts(&scripts)?,
        Command::GenConfig | Command::Formats => true,
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Run every script in its own interpreter. Output is printed in argument
/// order once all scripts are done.
fn run_scripts(scripts: &[PathBuf], settings: InterpreterSettings) -> bool {
    let results: Vec<(Vec<String>, bool)> = scripts
        .par_iter()
        .map(|path| run_one(path, settings))
        .collect();

    let mut ok = true;
    for (lines, succeeded) in results {
        output::print_lines(&lines);
        ok &= succeeded;
    }
    ok
}

fn run_one(path: &Path, settings: InterpreterSettings) -> (Vec<String>, bool) {
    let mut interp = Interpreter::new(ImageCodec::new(), settings);
    let mut lines = Vec::new();
    let result = interp.run_script(path, &mut |event| lines.extend(output::format_event(&event)));
    match result {
        Ok(report) => {
            lines.extend(output::format_report(&report));
            (lines, report.succeeded())
        }
        Err(e) => {
            lines.push(format!("{}: {e}", path.display()));
            (lines, false)
        }
    }
}

/// Interactive loop. Failures are printed and the loop carries on.
fn shell(settings: InterpreterSettings) -> io::Result<bool> {
    let mut interp = Interpreter::new(ImageCodec::new(), settings);
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut input = stdin.lock();
    let mut bytes = Vec::new();

    loop {
        if interactive {
            print!("> ");
            io::stdout().flush()?;
        }
        bytes.clear();
        if input.read_until(b'\n', &mut bytes)? == 0 {
            break;
        }
        let result = command::decode_line(&bytes)
            .and_then(|line| interp.execute_line(line, &mut |event| output::print_event(&event)));
        match result {
            Ok(Some(Outcome::Quit)) => break,
            Ok(Some(outcome)) => {
                println!("{}", output::format_outcome(&outcome));
                if outcome.ends_session() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => println!("error: {e}"),
        }
    }
    Ok(true)
}

fn check_scripts(scripts: &[PathBuf]) -> io::Result<bool> {
    let mut ok = true;
    for path in scripts {
        let origin = path.display().to_string();
        let report = File::open(path)
            .map_err(|e| io::Error::new(e.kind(), format!("{origin}: {e}")))
            .and_then(|file| {
                interpreter::check_script(&origin, BufReader::new(file))
                    .map_err(|e| io::Error::other(e.to_string()))
            })?;
        output::print_check(&report);
        ok &= report.succeeded();
    }
    Ok(ok)
}

/// `RUST_LOG` wins; otherwise `-v` means debug, else the configured level.
fn init_logging(engine: &EngineConfig, verbose: bool) {
    let default = if verbose {
        "debug"
    } else {
        engine.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. The config can lower the count, never raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
