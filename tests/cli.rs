use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use indoc::indoc;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const BASIC: &str = env!("CARGO_BIN_EXE_basic");

fn demo(name: &str) -> &'static str {
    match name {
        "countdown" => include_str!("../demos/countdown.bas"),
        "guess" => include_str!("../demos/guess.bas"),
        "box" => include_str!("../demos/box.bas"),
        _ => unreachable!("no demo {name}"),
    }
}

/// A program written into its own temporary directory.
struct Fixture {
    dir: TempDir,
    path: PathBuf,
}

impl Fixture {
    fn new(name: &str, src: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, src).unwrap();
        Fixture { dir, path }
    }

    fn sibling(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn files(&self) -> Vec<String> {
        let mut files: Vec<_> = fs::read_dir(self.dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        files
    }
}

fn run(program: impl AsRef<Path>, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(program.as_ref())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env_remove("BASIC_LOG")
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn basic(fixture: &Fixture, flags: &[&str], stdin: &str) -> Output {
    let mut args = flags.to_vec();
    args.push(fixture.path.to_str().unwrap());
    run(BASIC, &args, stdin)
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[test]
fn test_interprets_countdown() {
    let fixture = Fixture::new("countdown.bas", demo("countdown"));
    let output = basic(&fixture, &[], "");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        indoc! {"
            10...9...8...7...6...5...4...3...2...1...liftoff
            sum: 5050
            mean: 50.5\troot: 71.0634
            thirds: 0.3333 -0.6667
        "}
    );
}

#[test]
fn test_interprets_input() {
    let fixture = Fixture::new("guess.bas", demo("guess"));
    let output = basic(&fixture, &[], "10\n50\r\n42\n");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        indoc! {"
            Your guess: Too low
            Your guess: Too high
            Your guess: Got it in 3 tries
        "}
    );

    let output = basic(&fixture, &[], "7\n");
    assert_eq!(
        stdout(&output),
        "Your guess: Too low\nYour guess: Giving up after 1 tries\n"
    );
}

#[test]
fn test_dumps_tokens_next_to_program() {
    let fixture = Fixture::new("hello.bas", "PRINT \"hi\"\n");
    let output = basic(&fixture, &["--DUMP-TOKENS"], "");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "hi\n");

    let dump = fs::read_to_string(fixture.sibling("hellotokens.txt")).unwrap();
    assert!(dump.contains("Print"), "{dump}");
    assert_eq!(fixture.files(), ["hello.bas", "hellotokens.txt"]);
}

#[test]
fn test_lex_error_aborts_the_run() {
    let fixture = Fixture::new("bad.bas", "PRINT 1\nX = @\n");
    let output = basic(&fixture, &["--dump-tokens"], "");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "");
    assert!(
        stderr(&output).contains("line 2, column 5: unexpected character '@'"),
        "{}",
        stderr(&output)
    );
    assert_eq!(fixture.files(), ["bad.bas"]);
}

#[test]
fn test_syntax_error_aborts_the_run() {
    let fixture = Fixture::new("bad.bas", "PRINT 1\nFOR I = 1\n");
    let output = basic(&fixture, &["--compile"], "");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("syntax error"), "{}", stderr(&output));
    assert_eq!(fixture.files(), ["bad.bas"]);
}

#[test]
fn test_runtime_error_stops_interpretation() {
    let fixture = Fixture::new("div.bas", "PRINT 1\nX = 1 / 0\nPRINT 2\n");
    let output = basic(&fixture, &[], "");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "1\n");
    assert!(
        stderr(&output).contains("line 2, column 5: runtime error: division by zero"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn test_missing_file() {
    let output = run(BASIC, &["/nonexistent/prog.bas"], "");
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to find"), "{}", stderr(&output));
}

#[test]
fn test_failed_link_keeps_intermediates() {
    let fixture = Fixture::new("prog.bas", "PRINT 1\n");
    let output = basic(&fixture, &["--compile", "--runtime-lib=/nonexistent/libbasic_rt.a"], "");
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("runtime library unavailable"),
        "{}",
        stderr(&output)
    );
    assert_eq!(fixture.files(), ["prog.bas", "prog.clif", "prog.o"]);
}

fn cc_available() -> bool {
    Command::new("cc")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

/// Whether native builds can be tested. A missing `cc` skips them; a `cc`
/// without the runtime archive means the build script failed, which is an
/// error.
fn native_toolchain() -> bool {
    if !cc_available() {
        return false;
    }
    let runtime = option_env!("BASIC_RT_LIB")
        .expect("cc is available but BASIC_RT_LIB is unset; see the build script warnings");
    assert!(
        Path::new(runtime).is_file(),
        "cc is available but the runtime archive {runtime} is missing"
    );
    true
}

#[test]
fn test_runtime_archive_is_built() {
    if native_toolchain() {
        let runtime = option_env!("BASIC_RT_LIB").unwrap();
        assert!(runtime.ends_with("libbasic_rt.a"), "{runtime}");
    }
}

/// Builds `src` and checks that the executable behaves like the interpreter.
fn assert_backends_agree(name: &str, src: &str, stdin: &str) {
    let fixture = Fixture::new(&format!("{name}.bas"), src);
    let interpreted = basic(&fixture, &[], stdin);

    let build = basic(&fixture, &["--compile"], "");
    assert!(build.status.success(), "{name}: {}", stderr(&build));
    assert_eq!(fixture.files(), [name.to_owned(), format!("{name}.bas")]);

    let compiled = run(fixture.sibling(name), &[], stdin);
    assert_eq!(stdout(&compiled), stdout(&interpreted), "{name}");
    assert_eq!(compiled.status.code(), interpreted.status.code(), "{name}");
}

#[test]
fn test_backends_agree() {
    if !native_toolchain() {
        eprintln!("skipping: no cc");
        return;
    }
    assert_backends_agree("countdown", demo("countdown"), "");
    assert_backends_agree("guess", demo("guess"), "99\n1\n42\n");
    assert_backends_agree("box", demo("box"), "");
    assert_backends_agree(
        "strings",
        indoc! {r#"
            INPUT "name? "; N$
            INPUT "age? "; A
            PRINT "hello, "; N$; " ("; LEN(N$); ")", A * 2
            IF A >= 18 AND NOT (A = 40) THEN PRINT "adult" ELSE PRINT "minor"
            S = 0
            FOR I = 1 TO 2 STEP 0.25
                S = S + I
            NEXT I
            PRINT S; INT(-S / 3); ABS(-1.5); VAL("  -3.5kg")
        "#},
        "Ada Lovelace\n36\n",
    );
}

#[test]
fn test_compiled_division_by_zero() {
    if !native_toolchain() {
        eprintln!("skipping: no cc");
        return;
    }
    let fixture = Fixture::new("div.bas", "PRINT 1\nZ = 0\nPRINT 2 / Z\nPRINT 3\n");
    let build = basic(&fixture, &["--compile", "--emit-llvm"], "");
    assert!(build.status.success(), "{}", stderr(&build));
    assert_eq!(fixture.files(), ["div", "div.bas", "div.clif"]);

    let output = run(fixture.sibling("div"), &[], "");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "1\nError: division by zero\n");
}
