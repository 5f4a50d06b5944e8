use std::{
    ffi::OsString,
    fmt::Write as _,
    fs, io,
    io::Read,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use cranelift_codegen::{
    isa::{OwnedTargetIsa, TargetIsa},
    settings::{self, Configurable},
    verify_function, Context,
};
use cranelift_module::{DataDescription, Linkage, Module, ModuleError};
use cranelift_object::{ObjectBuilder, ObjectModule};
use tracing::{debug, info, warn};

use crate::{
    codegen::{
        self,
        runtime::{RuntimeFn, ENTRY_SYMBOL, MAIN_SYMBOL},
        Lowered, LoweringTarget,
    },
    interpreter::{Interpreter, TerminalConsole},
    lexer, parser,
    util::intern::Interner,
};

/// Extension of source files.
pub const SOURCE_EXTENSION: &str = "bas";

const TOKENS_SUFFIX: &str = "tokens.txt";

const LINK_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub dump_tokens: bool,
    pub compile: bool,
    /// Keep the textual IR after a successful build.
    pub keep_ir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub linker: OsString,
    /// The runtime archive, `libbasic_rt.a`.
    pub runtime_lib: Option<PathBuf>,
    pub timeout: Duration,
}

impl LinkConfig {
    pub const DEFAULT_LINKER: &'static str = "cc";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// The runtime archive built alongside this crate, if the build script
    /// managed to build it.
    pub fn bundled_runtime() -> Option<PathBuf> {
        option_env!("BASIC_RT_LIB").map(PathBuf::from)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            linker: Self::DEFAULT_LINKER.into(),
            runtime_lib: Self::bundled_runtime(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("program invalid:\n{0}")]
    Invalid(String),
    #[error("target unavailable: {0}")]
    Target(String),
    #[error("target {triple} does not match the lowered program ({detail})")]
    DataLayout { triple: String, detail: String },
    #[error("failed to write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("object emission failed: {0}")]
    Module(#[from] ModuleError),
    #[error("object emission failed: {0}")]
    Object(String),
    #[error("runtime library unavailable (use --runtime-lib or BASIC_RUNTIME_LIB)")]
    RuntimeUnavailable,
    #[error("failed to run linker {}: {source}", .linker.to_string_lossy())]
    Spawn { linker: OsString, source: io::Error },
    #[error("linker failed ({status}){}", fmt_stderr(.stderr))]
    Link { status: ExitStatus, stderr: String },
    #[error("linker timed out after {}s", .0.as_secs())]
    LinkTimeout(Duration),
}

fn fmt_stderr(stderr: &str) -> String {
    let stderr = stderr.trim_end();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(":\n{stderr}")
    }
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), Error> {
    fs::write(path, contents).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })
}

/// Runs the whole pipeline over `src`, read from `path`: tokens, tree, then
/// either interpretation or a native build.
pub fn run(
    path: &Path,
    src: &str,
    options: &Options,
    link: &LinkConfig,
) -> Result<(), crate::Error> {
    let mut tokens = Vec::with_capacity(src.len() / 2);
    lexer::lex(src, &mut tokens).map_err(|error| crate::Error::lex(src, error))?;
    info!(tokens = tokens.len(), "lexed");

    if options.dump_tokens {
        let dump_path = tokens_path(path);
        write_file(&dump_path, lexer::dump_tokens(src, &tokens))?;
        info!(path = %dump_path.display(), "wrote token dump");
    }

    let mut idents = Interner::with_capacity(64);
    let program = parser::parse_tokens(src, &tokens, &mut idents)
        .map_err(|error| crate::Error::syntax(src, error))?;
    info!(statements = program.body.len(), "parsed");

    if !options.compile {
        let mut interpreter = Interpreter::new(&idents, TerminalConsole::new());
        return interpreter
            .run(&program)
            .map_err(|error| crate::Error::runtime(src, error));
    }

    let lowered = codegen::lower(&program, &idents, LoweringTarget::host())
        .map_err(|error| crate::Error::codegen(src, error))?;
    let executable = build(path, lowered, options, link)?;
    info!(path = %executable.path.display(), "built");
    Ok(())
}

/// Takes a lowered program to an executable next to `path`.
///
/// Intermediate files are removed after a successful link (the textual IR
/// only if not asked to be kept) and left in place on failure.
pub fn build(
    path: &Path,
    lowered: Lowered,
    options: &Options,
    link: &LinkConfig,
) -> Result<Executable, Error> {
    let ir_path = sibling_path(path, "clif");
    let object_path = sibling_path(path, "o");
    let executable_path = executable_path(path);

    let artifact = Artifact::new(lowered).verify()?.target()?;
    artifact.write_ir(&ir_path)?;
    let object = artifact.emit_object(&object_path)?;
    let executable = object.link(&executable_path, link)?;

    remove_intermediate(&object_path);
    if !options.keep_ir {
        remove_intermediate(&ir_path);
    }
    Ok(executable)
}

fn remove_intermediate(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed"),
        Err(error) => warn!(path = %path.display(), %error, "failed to remove"),
    }
}

/// The token dump's path: `prog.bas` gives `progtokens.txt`; a path without
/// the lowercase source extension gets `.tokens.txt` appended.
pub fn tokens_path(path: &Path) -> PathBuf {
    let mut name = match path.extension() {
        Some(ext) if ext == SOURCE_EXTENSION => {
            path.with_extension("").into_os_string()
        }
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".");
            name
        }
    };
    name.push(TOKENS_SUFFIX);
    PathBuf::from(name)
}

/// The input with its extension replaced by the platform's executable one,
/// or `.out` when that would name the input itself.
pub fn executable_path(path: &Path) -> PathBuf {
    let executable = path.with_extension(std::env::consts::EXE_EXTENSION);
    if executable == path {
        path.with_extension("out")
    } else {
        executable
    }
}

/// The input with its extension replaced by `ext`, never the input itself.
fn sibling_path(path: &Path, ext: &str) -> PathBuf {
    let sibling = path.with_extension(ext);
    if sibling == path {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    } else {
        sibling
    }
}

pub struct Unverified;

pub struct Verified;

pub struct Targeted {
    isa: OwnedTargetIsa,
}

/// A lowered program on its way to an object file. Each stage consumes the
/// previous one.
pub struct Artifact<S> {
    lowered: Lowered,
    state: S,
}

impl Artifact<Unverified> {
    pub fn new(lowered: Lowered) -> Artifact<Unverified> {
        Artifact {
            lowered,
            state: Unverified,
        }
    }

    pub fn verify(self) -> Result<Artifact<Verified>, Error> {
        let flags = settings::Flags::new(settings::builder());
        verify_function(&self.lowered.func, &flags)
            .map_err(|errors| Error::Invalid(errors.to_string()))?;
        debug!("verified");
        Ok(Artifact {
            lowered: self.lowered,
            state: Verified,
        })
    }
}

impl Artifact<Verified> {
    /// Binds the host target, checking that its pointer width and calling
    /// convention are the ones the program was lowered for.
    pub fn target(self) -> Result<Artifact<Targeted>, Error> {
        let mut flags = settings::builder();
        for (name, value) in [("is_pic", "true"), ("opt_level", "none")] {
            flags
                .set(name, value)
                .map_err(|e| Error::Target(e.to_string()))?;
        }
        let isa = cranelift_native::builder()
            .map_err(|msg| Error::Target(msg.to_owned()))?
            .finish(settings::Flags::new(flags))
            .map_err(|e| Error::Target(e.to_string()))?;

        let expected = self.lowered.target;
        let triple = isa.triple().to_string();
        if isa.pointer_type() != expected.pointer {
            let detail = format!(
                "pointer is {}, expected {}",
                isa.pointer_type(),
                expected.pointer
            );
            return Err(Error::DataLayout { triple, detail });
        }
        if isa.default_call_conv() != expected.call_conv {
            let detail = format!(
                "calling convention is {}, expected {}",
                isa.default_call_conv(),
                expected.call_conv
            );
            return Err(Error::DataLayout { triple, detail });
        }
        info!(%triple, "targeted");

        Ok(Artifact {
            lowered: self.lowered,
            state: Targeted { isa },
        })
    }
}

impl Artifact<Targeted> {
    pub fn isa(&self) -> &dyn TargetIsa {
        &*self.state.isa
    }

    /// The textual IR, preceded by the string literals as comments.
    pub fn ir(&self) -> String {
        let mut ir = String::new();
        for (i, data) in self.lowered.data.iter().enumerate() {
            _ = writeln!(ir, "; data {i}: {:?}", String::from_utf8_lossy(data));
        }
        _ = writeln!(ir, "; target {}", self.state.isa.triple());
        _ = write!(ir, "{}", self.lowered.func.display());
        ir
    }

    pub fn write_ir(&self, path: &Path) -> Result<(), Error> {
        write_file(path, self.ir())?;
        debug!(path = %path.display(), "wrote IR");
        Ok(())
    }

    pub fn emit_object(self, path: &Path) -> Result<ObjectFile, Error> {
        let Lowered { func, data, target } = self.lowered;
        let name = path
            .file_stem()
            .map_or_else(|| "basic".into(), |stem| stem.to_string_lossy());
        let builder = ObjectBuilder::new(
            self.state.isa,
            name.as_bytes(),
            cranelift_module::default_libcall_names(),
        )?;
        let mut module = ObjectModule::new(builder);

        // Declared in import order, so that ids match the user names used
        // while lowering.
        for &f in RuntimeFn::ALL {
            let sig = f.signature(target.pointer, target.call_conv);
            let id = module.declare_function(f.symbol(), Linkage::Import, &sig)?;
            debug_assert_eq!(id.as_u32(), f.index());
        }
        for (i, bytes) in data.into_iter().enumerate() {
            let id = module.declare_data(&format!("basic_str_{i}"), Linkage::Local, false, false)?;
            debug_assert_eq!(id.as_u32() as usize, i);
            let mut desc = DataDescription::new();
            desc.define(bytes);
            module.define_data(id, &desc)?;
        }

        let main = module.declare_function(MAIN_SYMBOL, Linkage::Export, &func.signature)?;
        let mut ctx = Context::for_function(func);
        module.define_function(main, &mut ctx)?;

        let bytes = module
            .finish()
            .emit()
            .map_err(|e| Error::Object(e.to_string()))?;
        write_file(path, bytes)?;
        info!(path = %path.display(), "wrote object");

        Ok(ObjectFile {
            path: path.to_owned(),
        })
    }
}

#[derive(Debug)]
pub struct ObjectFile {
    pub path: PathBuf,
}

impl ObjectFile {
    /// Links against the runtime archive only, with `basic_entry` as the
    /// entry point. The linker is killed if it outlives the timeout.
    pub fn link(self, output: &Path, config: &LinkConfig) -> Result<Executable, Error> {
        let runtime_lib = config
            .runtime_lib
            .as_deref()
            .filter(|lib| lib.is_file())
            .ok_or(Error::RuntimeUnavailable)?;

        let mut cmd = Command::new(&config.linker);
        cmd.args(["-nostdlib", "-static"])
            .arg(format!("-Wl,--entry={ENTRY_SYMBOL}"))
            .arg("-Wl,--gc-sections")
            .arg("-o")
            .arg(output)
            .arg(&self.path)
            .arg(runtime_lib)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        info!(command = ?cmd, "linking");

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            linker: config.linker.clone(),
            source,
        })?;
        // Drained on the side, so that a chatty linker can't block on a full
        // pipe while we wait for it.
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = String::new();
                _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        let deadline = Instant::now() + config.timeout;
        let status = loop {
            let waited = child.try_wait().map_err(|source| Error::Spawn {
                linker: config.linker.clone(),
                source,
            })?;
            if let Some(status) = waited {
                break status;
            }
            if Instant::now() >= deadline {
                _ = child.kill();
                _ = child.wait();
                discard_partial(output);
                return Err(Error::LinkTimeout(config.timeout));
            }
            thread::sleep(LINK_POLL_INTERVAL);
        };
        let stderr = stderr
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        info!(%status, "linker exited");

        if !status.success() {
            discard_partial(output);
            return Err(Error::Link { status, stderr });
        }
        Ok(Executable {
            path: output.to_owned(),
        })
    }
}

/// Removes whatever a failed linker left at `output`.
fn discard_partial(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => debug!(path = %output.display(), "removed partial executable"),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => warn!(path = %output.display(), %error, "failed to remove"),
    }
}

#[derive(Debug)]
pub struct Executable {
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_utils::parse_program;
    use pretty_assertions::assert_eq;

    fn lowered(src: &str) -> Lowered {
        let (idents, program) = parse_program(src);
        codegen::lower(&program, &idents, LoweringTarget::host()).expect("failed to lower")
    }

    #[test]
    fn test_tokens_path() {
        assert_eq!(tokens_path(Path::new("prog.bas")), Path::new("progtokens.txt"));
        assert_eq!(
            tokens_path(Path::new("dir/PROG.BAS")),
            Path::new("dir/PROG.BAS.tokens.txt")
        );
        assert_eq!(tokens_path(Path::new("prog")), Path::new("prog.tokens.txt"));
        assert_eq!(tokens_path(Path::new("prog.txt")), Path::new("prog.txt.tokens.txt"));
    }

    #[test]
    fn test_executable_path() {
        if std::env::consts::EXE_EXTENSION.is_empty() {
            assert_eq!(executable_path(Path::new("a/prog.bas")), Path::new("a/prog"));
            assert_eq!(executable_path(Path::new("prog")), Path::new("prog.out"));
        } else {
            assert_eq!(
                executable_path(Path::new("prog.bas")),
                Path::new("prog.bas").with_extension(std::env::consts::EXE_EXTENSION)
            );
        }
    }

    #[test]
    fn test_sibling_path() {
        assert_eq!(sibling_path(Path::new("prog.bas"), "o"), Path::new("prog.o"));
        assert_eq!(sibling_path(Path::new("prog.o"), "o"), Path::new("prog.o.o"));
    }

    #[test]
    fn test_artifact_stages() {
        let artifact = Artifact::new(lowered("PRINT \"hi\"; 1 / 2"))
            .verify()
            .expect("verification failed")
            .target()
            .expect("host target unavailable");
        assert_eq!(artifact.isa().pointer_type(), LoweringTarget::host().pointer);

        let ir = artifact.ir();
        assert!(ir.starts_with("; data 0: \"hi\"\n"), "{ir}");
        assert!(ir.contains("function %basic_main() -> i32"), "{ir}");

        let dir = tempfile::tempdir().unwrap();
        let object = artifact.emit_object(&dir.path().join("prog.o")).unwrap();
        let bytes = fs::read(&object.path).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_link_without_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let object = ObjectFile {
            path: dir.path().join("prog.o"),
        };
        let config = LinkConfig {
            runtime_lib: Some(dir.path().join("missing.a")),
            ..LinkConfig::default()
        };
        let error = object.link(&dir.path().join("prog"), &config).unwrap_err();
        assert!(matches!(error, Error::RuntimeUnavailable), "{error}");
    }

    #[test]
    fn test_link_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let runtime_lib = dir.path().join("libbasic_rt.a");
        fs::write(&runtime_lib, b"").unwrap();
        let object = ObjectFile {
            path: dir.path().join("prog.o"),
        };
        let config = LinkConfig {
            linker: "basic-test-missing-linker".into(),
            runtime_lib: Some(runtime_lib),
            ..LinkConfig::default()
        };
        let error = object.link(&dir.path().join("prog"), &config).unwrap_err();
        assert!(matches!(error, Error::Spawn { .. }), "{error}");
    }

    /// An executable shell script standing in for the linker, next to an
    /// empty runtime archive.
    #[cfg(unix)]
    fn script_linker(dir: &Path, body: &str) -> LinkConfig {
        use std::os::unix::fs::PermissionsExt;

        let runtime_lib = dir.join("libbasic_rt.a");
        fs::write(&runtime_lib, b"").unwrap();
        let linker = dir.join("linker.sh");
        fs::write(&linker, format!("#!/bin/sh\n{body}")).unwrap();
        fs::set_permissions(&linker, fs::Permissions::from_mode(0o755)).unwrap();
        LinkConfig {
            linker: linker.into_os_string(),
            runtime_lib: Some(runtime_lib),
            timeout: Duration::from_secs(10),
        }
    }

    /// Writes `PARTIAL` to the `-o` operand.
    #[cfg(unix)]
    const WRITE_OUTPUT: &str = indoc::indoc! {r#"
        while [ "$#" -gt 0 ]; do
            if [ "$1" = "-o" ]; then printf PARTIAL > "$2"; fi
            shift
        done
    "#};

    #[cfg(unix)]
    #[test]
    fn test_link_timeout_kills_the_linker() {
        let dir = tempfile::tempdir().unwrap();
        let config = LinkConfig {
            timeout: Duration::from_millis(500),
            ..script_linker(dir.path(), &format!("{WRITE_OUTPUT}sleep 30\n"))
        };
        let object = ObjectFile {
            path: dir.path().join("prog.o"),
        };
        let output = dir.path().join("prog");

        let started = Instant::now();
        let error = object.link(&output, &config).unwrap_err();
        assert!(matches!(error, Error::LinkTimeout(_)), "{error}");
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_linker_exit_status_decides() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{WRITE_OUTPUT}echo 'undefined symbol: basic_main' >&2\nexit 3\n");
        let config = script_linker(dir.path(), &body);
        let object = ObjectFile {
            path: dir.path().join("prog.o"),
        };
        let output = dir.path().join("prog");

        let error = object.link(&output, &config).unwrap_err();
        let Error::Link { status, .. } = &error else {
            panic!("expected a link error, got {error}");
        };
        assert_eq!(status.code(), Some(3));
        assert!(error.to_string().contains("undefined symbol: basic_main"), "{error}");
        assert!(!output.exists());
        assert!(dir.path().join("libbasic_rt.a").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_link_keeps_the_executable() {
        let dir = tempfile::tempdir().unwrap();
        let config = script_linker(dir.path(), WRITE_OUTPUT);
        let object = ObjectFile {
            path: dir.path().join("prog.o"),
        };
        let output = dir.path().join("prog");

        let executable = object.link(&output, &config).unwrap();
        assert_eq!(executable.path, output);
        assert_eq!(fs::read_to_string(&output).unwrap(), "PARTIAL");
    }
}
