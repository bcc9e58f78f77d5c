// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Common arguments: descriptor location and macro handling
fn descriptor_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("descriptor")
            .short('f')
            .long("descriptor")
            .value_name("PATH")
            .default_value(".")
            .help("Path to rpmweave.toml or the directory containing it"),
    )
    .arg(
        Arg::new("define")
            .short('D')
            .long("define")
            .value_name("NAME VALUE")
            .action(ArgAction::Append)
            .help("Extra macro definition (repeatable)"),
    )
    .arg(
        Arg::new("no_rpm_eval")
            .long("no-rpm-eval")
            .action(ArgAction::SetTrue)
            .help("Do not ask `rpm --eval` for macro values"),
    )
}

fn build_cli() -> Command {
    Command::new("rpmweave")
        .version(env!("CARGO_PKG_VERSION"))
        .author("rpmweave Contributors")
        .about("Compile declarative file mappings into an RPM build root and spec file")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging (RUST_LOG takes precedence)"),
        )
        .subcommand(descriptor_args(
            Command::new("spec").about("Stage files and write SPECS/<name>.spec"),
        ))
        .subcommand(
            descriptor_args(
                Command::new("build").about("Stage files, write the spec and run rpmbuild"),
            )
            .arg(
                Arg::new("sign")
                    .long("sign")
                    .value_name("KEY")
                    .help("Sign the built packages with this GPG key name"),
            ),
        )
        .subcommand(
            descriptor_args(
                Command::new("plan")
                    .about("Stage files and show the per-mapping report and link commands"),
            )
            .arg(
                Arg::new("format")
                    .long("format")
                    .value_parser(["text", "json"])
                    .default_value("text")
                    .help("Output format"),
            ),
        )
        .subcommand(
            Command::new("version")
                .about("Resolve the RPM version and release for a project version")
                .arg(Arg::new("version").required(true).help("Project version, e.g. 1.2.3-SNAPSHOT"))
                .arg(Arg::new("release").short('r').long("release").help("Explicit release")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell", "elvish"])
                        .help("Shell type"),
                ),
        )
}

/// Render the man page into `<manifest dir>/man/rpmweave.1`
fn write_man_page() -> io::Result<PathBuf> {
    let root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "CARGO_MANIFEST_DIR not set"))?;
    let page = root.join("man").join("rpmweave.1");
    if let Some(dir) = page.parent() {
        fs::create_dir_all(dir)?;
    }

    let mut rendered = Vec::new();
    Man::new(build_cli()).render(&mut rendered)?;
    fs::write(&page, rendered)?;
    Ok(page)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // A missing man page must not fail the build
    if let Err(e) = write_man_page() {
        println!("cargo:warning=Man page not generated: {}", e);
    }
}
