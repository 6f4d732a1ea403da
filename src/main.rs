//! hedyc — compile a teaching-language program to Python.
//!
//! Reads FILE (or stdin), compiles it at the requested level and prints
//! the generated code.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use hedyc::config::{Config, PRELUDE};
use hedyc::{CompileError, CompileResult};

#[derive(Debug, Parser)]
#[command(name = "hedyc", version, about = "Compile a teaching-language program to Python")]
struct Cli {
    /// Level to compile at (defaults to the configured level).
    #[arg(short, long)]
    level: Option<u32>,

    /// Print the compile result as JSON.
    #[arg(long)]
    json: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Source file; reads stdin when omitted.
    file: Option<PathBuf>,
}

fn read_source(file: Option<&PathBuf>) -> std::io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut source = String::new();
            std::io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

fn render(result: &CompileResult, json: bool, prelude: bool) -> Result<String, String> {
    if json {
        #[cfg(feature = "json")]
        return serde_json::to_string_pretty(result).map_err(|e| e.to_string());
        #[cfg(not(feature = "json"))]
        return Err("built without the `json` feature".to_string());
    }

    let mut out = String::new();
    if prelude {
        for line in PRELUDE {
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(&result.code);
    Ok(out)
}

fn describe(err: &CompileError) -> String {
    match err {
        CompileError::Parse(parse) => {
            let mut msg = format!("line {}: {}: '{}'", parse.line, parse.kind, parse.text);
            if let Some(expected) = parse.expected {
                msg.push_str(&format!(" (expected {expected})"));
            }
            msg
        }
        other => other.to_string(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp(None)
        .init();

    let config = Config::load().unwrap_or_default();
    let level = cli.level.unwrap_or(config.default_level);

    let source = match read_source(cli.file.as_ref()) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("failed to read source: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match hedyc::transpile(&source, level) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{}", describe(&e));
            return ExitCode::FAILURE;
        }
    };

    match render(&result, cli.json, config.prelude) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
