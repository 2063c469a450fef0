// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("taproom")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Taproom Contributors")
        .about("Install prebuilt binaries from tap formulae")
        .subcommand_required(false)
        .subcommand(
            Command::new("install")
                .about("Install a formula: resolve, fetch, verify, install, self-test")
                .arg(Arg::new("formula").required(true).help("Path to the formula file"))
                .arg(
                    Arg::new("bin_dir")
                        .short('b')
                        .long("bin-dir")
                        .value_name("DIR")
                        .help("Directory to install the binary into (default: ~/.local/bin)"),
                )
                .arg(
                    Arg::new("os")
                        .long("os")
                        .help("Override the detected operating system (macos, linux)"),
                )
                .arg(
                    Arg::new("arch")
                        .long("arch")
                        .help("Override the detected architecture (arm64, x86_64)"),
                )
                .arg(
                    Arg::new("skip_test")
                        .long("skip-test")
                        .action(clap::ArgAction::SetTrue)
                        .help("Skip the post-install version smoke test"),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Resolve the artifact for a platform without touching the network")
                .arg(Arg::new("formula").required(true).help("Path to the formula file"))
                .arg(Arg::new("os").long("os").help("Override the detected operating system"))
                .arg(Arg::new("arch").long("arch").help("Override the detected architecture")),
        )
        .subcommand(
            Command::new("verify")
                .about("Verify a local archive against the formula's declared digest")
                .arg(Arg::new("formula").required(true).help("Path to the formula file"))
                .arg(Arg::new("archive").required(true).help("Path to the downloaded archive"))
                .arg(Arg::new("os").long("os").help("Override the detected operating system"))
                .arg(Arg::new("arch").long("arch").help("Override the detected architecture")),
        )
        .subcommand(
            Command::new("info")
                .about("Show a formula's metadata and target table")
                .arg(Arg::new("formula").required(true).help("Path to the formula file")),
        )
        .subcommand(
            Command::new("test")
                .about("Re-run the version smoke test against an installed binary")
                .arg(Arg::new("binary").required(true).help("Path to the installed binary")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer)
        .expect("Failed to render man page");

    let man_path = man_dir.join("taproom.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
