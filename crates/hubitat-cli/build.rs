// Renders a man page for `hubitat` and each visible subcommand into
// $OUT_DIR/man.

use std::fs;
use std::path::{Path, PathBuf};

use clap::CommandFactory;

// cli.rs needs only clap and clap_complete, both build-dependencies. Here it
// supplies the command tree; the parsed fields are read by the binary alone.
#[path = "src/cli.rs"]
#[expect(dead_code, reason = "parsed CLI fields are only read by the binary")]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir: PathBuf = std::env::var_os("OUT_DIR").expect("cargo sets OUT_DIR").into();
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("failed to create man output directory");

    render_man(&cli::Cli::command(), &man_dir);
}

/// Write `<name>.1`, then recurse as `<name>-<subcommand>`.
fn render_man(cmd: &clap::Command, dir: &Path) {
    let name = cmd.get_name().to_owned();
    let page = dir.join(format!("{name}.1"));

    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .render(&mut buf)
        .unwrap_or_else(|e| panic!("failed to render man page for `{name}`: {e}"));
    fs::write(&page, buf).unwrap_or_else(|e| panic!("failed to write {}: {e}", page.display()));

    for sub in cmd.get_subcommands().filter(|sub| !sub.is_hide_set()) {
        render_man(&sub.clone().name(format!("{name}-{}", sub.get_name())), dir);
    }
}
