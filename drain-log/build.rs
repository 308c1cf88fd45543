use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

fn git_revision() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .stderr(Stdio::inherit())
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    Some(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

fn emit_release_var() {
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_default();
    match git_revision() {
        Some(revision) => println!("cargo:rustc-env=DRAIN_RELEASE=drain@{version}+{revision}"),
        None => println!("cargo:rustc-env=DRAIN_RELEASE=drain@{version}"),
    }
}

fn list_crates() -> io::Result<Vec<String>> {
    let mut crates = Vec::new();

    for entry in fs::read_dir("../")? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        if let Some(name) = entry.file_name().to_str()
            && name.starts_with("drain")
        {
            // Tracing targets use the module path, which has underscores.
            crates.push(name.replace('-', "_"));
        }
    }

    crates.sort();
    Ok(crates)
}

fn emit_crate_list() -> io::Result<()> {
    let crates = list_crates()?;

    let out_dir = env::var("OUT_DIR").map_err(io::Error::other)?;
    let dest_path = Path::new(&out_dir).join("constants.gen.rs");
    let mut f = File::create(dest_path)?;

    write!(f, "const CRATE_NAMES: &[&str] = &[")?;
    for name in &crates {
        write!(f, "\"{name}\",")?;
    }
    writeln!(f, "];")?;

    Ok(())
}

fn main() {
    emit_release_var();
    emit_crate_list().expect("failed to generate crate list");
    println!("cargo:rerun-if-changed=build.rs");
}
