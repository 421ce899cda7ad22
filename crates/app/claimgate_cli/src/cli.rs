use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "claimgate", version, about = "Inspect and normalize identity claims")]
pub struct Cli {
    /// Log level when `RUST_LOG` is unset.
    #[arg(long, global = true, env = "CLAIMGATE_LOG", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize a claims payload and print the resulting user.
    Inspect(InspectArgs),
    /// Print a single claim by its wire name.
    Claim {
        /// Payload file, or `-` for stdin.
        input: PathBuf,
        /// Wire name of the claim, e.g. `sub` or `roles`.
        field: String,
    },
    /// Exit 0 if the user holds any (or with `--all`, every) listed role.
    HasRole {
        /// Payload file, or `-` for stdin.
        input: PathBuf,
        #[arg(required = true)]
        roles: Vec<String>,
        #[arg(long)]
        all: bool,
    },
    /// Parse checkpoint directives and print the checkpoints.
    Checkpoints {
        #[arg(required = true)]
        directives: Vec<String>,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    Version,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Payload file, or `-` for stdin.
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Fail when the claims have expired.
    #[arg(long)]
    pub check_expiry: bool,

    /// Checkpoint directive, e.g. `require mfa`. Repeatable.
    #[arg(long = "checkpoint", env = "CLAIMGATE_CHECKPOINTS", value_delimiter = ';')]
    pub checkpoints: Vec<String>,

    /// Frontend link to attach. Repeatable.
    #[arg(long = "link")]
    pub links: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}
