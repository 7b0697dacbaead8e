use std::path::Path;
use std::{env, fs};

use clap::CommandFactory;

// The derive tree in src/cli.rs only needs clap and clap_complete, both
// declared as build-dependencies, so the build script can include it
// without compiling the rest of the crate.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = env::var_os("OUT_DIR").expect("OUT_DIR is set by Cargo");
    let man_dir = Path::new(&out_dir).join("man");
    fs::create_dir_all(&man_dir).expect("man output directory");

    // Walk the command tree iteratively; subcommand pages are named
    // `aerolite-<sub>.1` per man convention.
    let mut pending = vec![cli::Cli::command()];
    while let Some(cmd) = pending.pop() {
        let name = cmd.get_name().to_owned();
        for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
            pending.push(sub.clone().name(format!("{name}-{}", sub.get_name())));
        }

        let mut page = Vec::new();
        clap_mangen::Man::new(cmd)
            .render(&mut page)
            .unwrap_or_else(|e| panic!("render man page for `{name}`: {e}"));
        fs::write(man_dir.join(format!("{name}.1")), page)
            .unwrap_or_else(|e| panic!("write man page for `{name}`: {e}"));
    }
}
