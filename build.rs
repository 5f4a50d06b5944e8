use std::{path::Path, process::Command};

/// Builds the runtime archive for the host and exposes its path to the
/// compiler as `BASIC_RT_LIB`.
///
/// A failed runtime build only disables native compilation, so it is reported
/// as a warning instead of failing the whole build.
fn compile_runtime() -> Result<String, String> {
    let cargo = env!("CARGO");
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let manifest = root.join("runtime/Cargo.toml");
    let target_dir = root.join("target/_basic/runtime");

    let out = Command::new(cargo)
        .arg("build")
        .arg("--release")
        .arg("--manifest-path")
        .arg(&manifest)
        .arg("--target-dir")
        .arg(&target_dir)
        // Instrumentation flags meant for this crate break a `no_std` build.
        .env_remove("RUSTFLAGS")
        .env_remove("CARGO_ENCODED_RUSTFLAGS")
        .output()
        .map_err(|e| format!("failed to run cargo: {e}"))?;
    if !out.status.success() {
        let error = String::from_utf8_lossy(&out.stderr);
        return Err(format!("failed to build the runtime:\n{error}"));
    }

    let archive = target_dir.join("release/libbasic_rt.a");
    Ok(archive.display().to_string())
}

fn main() {
    println!("cargo::rerun-if-changed=runtime/src");
    println!("cargo::rerun-if-changed=runtime/Cargo.toml");
    println!("cargo::rerun-if-changed=rt-core/src");

    match compile_runtime() {
        Ok(archive) => println!("cargo::rustc-env=BASIC_RT_LIB={archive}"),
        Err(error) => {
            for line in error.lines() {
                println!("cargo::warning={line}");
            }
        }
    }
}
