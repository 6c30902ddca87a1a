use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gi", about = "gi: a minimal content-addressed version control system", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Working-directory root of the repository
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Name of the metadata directory under the root
    #[arg(long, global = true, default_value = ".gi")]
    pub metadata_dir: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty repository
    Init,
    /// Stage files or directories
    Add(PathArgs),
    /// Untrack files or directories, keeping them on disk
    Rm(PathArgs),
    /// Record the staged tree as a new commit
    Commit(CommitArgs),
    /// Switch to a revision, or restore paths from one
    Checkout(CheckoutArgs),
    /// Move the current branch to a revision
    Reset(ResetArgs),
    /// Show staged, unstaged, and untracked changes
    Status,
    /// Show commit history
    Log(LogArgs),
    /// List, create, or delete branches
    Branch(BranchArgs),
    /// Merge a revision into HEAD
    Merge(MergeArgs),
    /// Delete unreachable objects
    Gc,
}

#[derive(Args)]
pub struct PathArgs {
    #[arg(required = true)]
    pub paths: Vec<String>,
}

#[derive(Args)]
pub struct CommitArgs {
    pub message: String,
}

#[derive(Args)]
pub struct CheckoutArgs {
    /// Branch name, commit id or prefix, or HEAD
    pub revision: Option<String>,
    /// Restore only these paths from the revision
    pub paths: Vec<String>,
    /// Restore these paths from HEAD: `gi checkout -- <paths>`
    #[arg(last = true)]
    pub head_paths: Vec<String>,
}

#[derive(Args)]
pub struct ResetArgs {
    pub revision: String,
}

#[derive(Args)]
pub struct LogArgs {
    /// Start from this revision instead of HEAD
    pub revision: Option<String>,
}

#[derive(Args)]
pub struct BranchArgs {
    pub name: Option<String>,
    /// Where the new branch points (defaults to HEAD)
    pub revision: Option<String>,
    #[arg(short = 'd', long, requires = "name", conflicts_with = "revision")]
    pub delete: bool,
}

#[derive(Args)]
pub struct MergeArgs {
    pub branch: String,
    /// Record the merge even if paths conflict, keeping our version of them
    #[arg(long)]
    pub force: bool,
}
