//! Renders one man page per devcap command into `$OUT_DIR/man`.
//!
//! Nested commands are flattened into hyphenated page names:
//! `devcap.1`, `devcap-classify.1`, `devcap-index-build.1`, ...

use std::path::Path;
use std::{env, fs, io};

use clap::{Command, CommandFactory};

// cli.rs only needs clap and clap_complete, both build-dependencies.
#[path = "src/cli.rs"]
#[allow(dead_code)]
mod cli;

fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = env::var_os("OUT_DIR").ok_or_else(|| io::Error::other("OUT_DIR is not set"))?;
    let man_dir = Path::new(&out_dir).join("man");
    fs::create_dir_all(&man_dir)?;

    let mut pending = vec![cli::Cli::command()];
    while let Some(cmd) = pending.pop() {
        write_page(&cmd, &man_dir)?;
        let prefix = cmd.get_name().to_owned();
        pending.extend(
            cmd.get_subcommands()
                .filter(|sub| !sub.is_hide_set())
                .map(|sub| sub.clone().name(format!("{prefix}-{}", sub.get_name()))),
        );
    }
    Ok(())
}

fn write_page(cmd: &Command, dir: &Path) -> io::Result<()> {
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut page)?;
    fs::write(dir.join(format!("{}.1", cmd.get_name())), page)
}
