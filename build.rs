//! Build script rendering the `albharness` manual page into `OUT_DIR`.

use std::env;
use std::io::Write;

use camino::Utf8PathBuf;
use cap_std::{ambient_authority, fs_utf8::Dir};
use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::Cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    for watched in ["build.rs", "src/cli/mod.rs"] {
        writeln!(stdout, "cargo:rerun-if-changed={watched}")?;
    }

    let out_dir = env::var("OUT_DIR").map(Utf8PathBuf::from)?;
    let command = Cli::command();
    let page = format!("{}.1", command.get_name());

    let mut buffer = Vec::new();
    Man::new(command).render(&mut buffer)?;

    let dir = Dir::open_ambient_dir(&out_dir, ambient_authority())?;
    dir.write(page.as_str(), &buffer)?;
    Ok(())
}
