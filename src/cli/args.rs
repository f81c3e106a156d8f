//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Rebuild texinfo @node pointers and menus from the document's heading structure
#[derive(Parser, Debug)]
#[command(name = "prepinfo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity, repeat for more (-d -d -d)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite node lines and menus (default output: stdout)
    Fix {
        /// Input document, `-` or absent for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,

        /// Write the result here instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,

        /// Copy existing menus unchanged
        #[arg(short, long)]
        keep_menus: bool,
    },

    /// Report problems without writing output
    Check {
        /// Input document, `-` or absent for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Show the inferred node tree
    Tree {
        /// Input document, `-` or absent for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Show effective settings as TOML
    Config {
        /// Directory whose local config to include (default: cwd)
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
