use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// root directory path
    #[arg(short, long, default_value = "./")]
    pub root: PathBuf,

    /// Output directory path related to `root`
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Posts directory path related to `root`
    #[arg(short, long)]
    pub posts: Option<PathBuf>,

    /// Config file path related to `root`
    #[arg(short = 'C', long, default_value = "blog.toml")]
    pub config: PathBuf,

    /// Minify the generated html/js
    #[arg(short, long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub minify: Option<bool>,

    /// subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile all posts, copy static assets and minify the output (default)
    Build {},

    /// Empty the output directory and repopulate it from already-compiled
    /// documents, without recompiling anything
    Clean {},

    /// Legacy mode: copy pre-compiled documents and assets verbatim, no
    /// compilation or minification
    Copy {},
}

impl Cli {
    pub fn command_is_clean(&self) -> bool {
        matches!(self.command, Some(Commands::Clean { .. }))
    }

    pub fn command_is_copy(&self) -> bool {
        matches!(self.command, Some(Commands::Copy { .. }))
    }
}
