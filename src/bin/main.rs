use std::{
    env,
    ffi::OsString,
    fs, io,
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};

use anyhow::Context;
use basic::driver::{self, LinkConfig, Options};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Runs or compiles a BASIC program.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// The program to run.
    file: PathBuf,

    /// Also write the token listing next to the program.
    #[arg(long)]
    dump_tokens: bool,

    /// Build a native executable instead of interpreting the program.
    #[arg(long)]
    compile: bool,

    /// Keep the textual IR of a native build. Ignored when interpreting.
    #[arg(long, visible_alias = "emit-ir")]
    emit_llvm: bool,

    /// The program used to link native builds.
    #[arg(long, env = "BASIC_LINKER", default_value = LinkConfig::DEFAULT_LINKER)]
    linker: OsString,

    /// The runtime archive linked into native builds.
    #[arg(long, env = "BASIC_RUNTIME_LIB")]
    runtime_lib: Option<PathBuf>,

    /// Seconds to wait for the linker before killing it.
    #[arg(
        long,
        env = "BASIC_LINK_TIMEOUT",
        default_value_t = LinkConfig::DEFAULT_TIMEOUT.as_secs()
    )]
    link_timeout: u64,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            dump_tokens: self.dump_tokens,
            compile: self.compile,
            keep_ir: self.emit_llvm,
        }
    }

    fn link_config(&self) -> LinkConfig {
        LinkConfig {
            linker: self.linker.clone(),
            runtime_lib: self
                .runtime_lib
                .clone()
                .or_else(LinkConfig::bundled_runtime),
            timeout: Duration::from_secs(self.link_timeout),
        }
    }
}

/// Flag names are case-insensitive (`--COMPILE` is `--compile`); values are
/// left alone.
fn normalize_flags(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(flag) if flag.starts_with("--") => match flag.split_once('=') {
                Some((name, value)) => format!("{}={value}", name.to_ascii_lowercase()).into(),
                None => flag.to_ascii_lowercase().into(),
            },
            _ => arg,
        })
        .collect()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BASIC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let path = fs::canonicalize(&cli.file)
        .with_context(|| format!("Failed to find {}", cli.file.display()))?;
    let src = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    driver::run(&path, &src, &cli.options(), &cli.link_config())?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(normalize_flags(env::args_os())) {
        Ok(cli) => cli,
        Err(error) => {
            _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_tracing();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(normalize_flags(args.iter().map(OsString::from)))
    }

    #[test]
    fn test_flags_are_case_insensitive() {
        let args = ["basic", "--DUMP-TOKENS", "prog.bas", "--Compile", "--EMIT-LLVM"];
        let cli = parse(&args).unwrap();
        assert_eq!(
            cli.options(),
            Options {
                dump_tokens: true,
                compile: true,
                keep_ir: true,
            }
        );
        assert_eq!(cli.file, PathBuf::from("prog.bas"));
    }

    #[test]
    fn test_flag_values_keep_their_case() {
        let cli = parse(&["basic", "--COMPILE", "--LINKER=/Opt/CC", "P.BAS"]).unwrap();
        assert_eq!(cli.linker, OsString::from("/Opt/CC"));
        assert_eq!(cli.file, PathBuf::from("P.BAS"));
    }

    #[test]
    fn test_usage_errors() {
        assert!(parse(&["basic"]).is_err_and(|e| e.use_stderr()));
        assert!(parse(&["basic", "--bogus", "prog.bas"]).is_err_and(|e| e.use_stderr()));
        assert!(parse(&["basic", "--help"]).is_err_and(|e| !e.use_stderr()));
    }
}
