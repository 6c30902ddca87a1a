use std::path::Path;

use anyhow::bail;
use colored::Colorize;
use gi_sdk::{
    CommitOutcome, FsWorkingDirectory, LogEntry, MergeOutcome, Repository,
    RepositoryConfig, Revision, SdkResult, StatusEntry,
};

use crate::cli::*;

/// Where the repository lives on disk.
struct Location<'a> {
    root: &'a Path,
    metadata_dir: &'a str,
}

impl Location<'_> {
    fn open(&self) -> SdkResult<Repository> {
        Repository::open_at(self.root, self.metadata_dir)
    }

    /// Convert command-line paths (relative to the root) into repository
    /// paths.
    fn repo_paths(&self, paths: &[String]) -> anyhow::Result<Vec<String>> {
        let workdir = FsWorkingDirectory::new(self.root, self.metadata_dir)?;
        paths
            .iter()
            .map(|p| Ok(workdir.relativize(Path::new(p))?))
            .collect()
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let at = Location {
        root: &cli.root,
        metadata_dir: &cli.metadata_dir,
    };
    match cli.command {
        Command::Init => cmd_init(&at),
        Command::Add(args) => cmd_add(&at, args),
        Command::Rm(args) => cmd_rm(&at, args),
        Command::Commit(args) => cmd_commit(&at, args),
        Command::Checkout(args) => cmd_checkout(&at, args),
        Command::Reset(args) => cmd_reset(&at, args),
        Command::Status => cmd_status(&at),
        Command::Log(args) => cmd_log(&at, args),
        Command::Branch(args) => cmd_branch(&at, args),
        Command::Merge(args) => cmd_merge(&at, args),
        Command::Gc => cmd_gc(&at),
    }
}

fn describe(revision: &Revision) -> String {
    match revision.branch() {
        Some(branch) => format!("branch {}", branch.yellow().bold()),
        None => format!("{} (detached)", revision.id().short_hex().yellow()),
    }
}

fn cmd_init(at: &Location) -> anyhow::Result<()> {
    let config = RepositoryConfig {
        metadata_dir: at.metadata_dir.to_string(),
        ..Default::default()
    };
    let repo = Repository::init_at(at.root, config)?;
    println!(
        "{} Initialized empty gi repository in {}",
        "✓".green().bold(),
        at.root.join(at.metadata_dir).display().to_string().bold()
    );
    println!("  Branch: {}", repo.config().default_branch.yellow());
    Ok(())
}

fn cmd_add(at: &Location, args: PathArgs) -> anyhow::Result<()> {
    let mut repo = at.open()?;
    let paths = at.repo_paths(&args.paths)?;
    repo.stage_add(&paths)?;
    Ok(())
}

fn cmd_rm(at: &Location, args: PathArgs) -> anyhow::Result<()> {
    let mut repo = at.open()?;
    let paths = at.repo_paths(&args.paths)?;
    repo.stage_remove(&paths)?;
    Ok(())
}

fn cmd_commit(at: &Location, args: CommitArgs) -> anyhow::Result<()> {
    let mut repo = at.open()?;
    match repo.commit(&args.message)? {
        CommitOutcome::Created(commit) => {
            let on = repo.head().branch().unwrap_or("detached HEAD");
            println!("[{} {}] {}", on.green(), commit.id.short_hex().yellow(), commit.message);
        }
        CommitOutcome::NothingToCommit => println!("Nothing to commit, index matches HEAD."),
    }
    Ok(())
}

fn cmd_checkout(at: &Location, args: CheckoutArgs) -> anyhow::Result<()> {
    let mut repo = at.open()?;
    let mut requested = args.paths;
    requested.extend(args.head_paths);
    let revision = match args.revision {
        Some(revision) => revision,
        None if !requested.is_empty() => "HEAD".to_string(),
        None => bail!("missing revision to check out"),
    };

    if requested.is_empty() {
        let head = repo.checkout(&revision)?;
        println!("Switched to {}", describe(head));
    } else {
        let paths = at.repo_paths(&requested)?;
        repo.checkout_paths(&revision, &paths)?;
        println!("Restored {} path(s) from {}", paths.len(), revision.yellow());
    }
    Ok(())
}

fn cmd_reset(at: &Location, args: ResetArgs) -> anyhow::Result<()> {
    let mut repo = at.open()?;
    let head = repo.reset(&args.revision)?;
    println!("HEAD is now at {}", head.commit().summary());
    Ok(())
}

fn print_entries(title: &str, entries: &[StatusEntry], paint: fn(&str) -> colored::ColoredString) {
    if entries.is_empty() {
        return;
    }
    println!("{title}");
    for entry in entries {
        let label = format!("{}:", entry.status);
        println!("    {}", paint(&format!("{label:<12}{}", entry.path)));
    }
    println!();
}

fn cmd_status(at: &Location) -> anyhow::Result<()> {
    let repo = at.open()?;
    let report = repo.status()?;
    match &report.branch {
        Some(branch) => println!("On branch {}", branch.yellow().bold()),
        None => println!("HEAD detached at {}", report.commit.short_hex().yellow()),
    }

    let changes = &report.changes;
    if changes.is_clean() {
        println!("Nothing to commit, working directory clean.");
        return Ok(());
    }
    println!();
    print_entries("Changes to be committed:", &changes.staged, |s| s.green());
    print_entries("Changes not staged for commit:", &changes.unstaged, |s| s.red());
    if !changes.untracked.is_empty() {
        println!("Untracked files:");
        for path in &changes.untracked {
            println!("    {}", path.red());
        }
        println!();
    }
    Ok(())
}

fn print_log_entry(entry: &LogEntry) {
    let mut header = format!("commit {}", entry.id).yellow().to_string();
    if entry.is_head {
        header.push_str(&" [HEAD]".cyan().to_string());
    }
    if !entry.branches.is_empty() {
        header.push_str(&format!(" ({})", entry.branches.join(", ")).green().to_string());
    }
    println!("{header}");
    println!("Date: {}", entry.date);
    println!();
    println!("    {}", entry.message);
    println!();
}

fn cmd_log(at: &Location, args: LogArgs) -> anyhow::Result<()> {
    let repo = at.open()?;
    for entry in repo.log(args.revision.as_deref().unwrap_or(""))? {
        print_log_entry(&entry);
    }
    Ok(())
}

fn cmd_branch(at: &Location, args: BranchArgs) -> anyhow::Result<()> {
    let mut repo = at.open()?;
    match (args.name, args.delete) {
        (Some(name), true) => {
            let commit = repo.delete_branch(&name)?;
            println!("Deleted branch {} (was {})", name.yellow(), commit.short_hex());
        }
        (Some(name), false) => {
            let info = repo.create_branch(&name, args.revision.as_deref())?;
            println!("Created branch {} at {}", name.yellow(), info.commit.short_hex());
        }
        (None, _) => {
            for branch in repo.branches() {
                if branch.is_current {
                    println!("* {}", branch.name.green().bold());
                } else {
                    println!("  {}", branch.name);
                }
            }
        }
    }
    Ok(())
}

fn cmd_merge(at: &Location, args: MergeArgs) -> anyhow::Result<()> {
    let mut repo = at.open()?;
    match repo.merge(&args.branch, args.force)? {
        MergeOutcome::UpToDate => println!("Already up to date."),
        MergeOutcome::FastForward(commit) => {
            println!("Fast-forward to {}", commit.id.short_hex().yellow());
        }
        MergeOutcome::Merged { commit, conflicts } => {
            println!(
                "{} Merged {} as {}",
                "✓".green(),
                args.branch.yellow(),
                commit.id.short_hex().yellow()
            );
            for path in conflicts {
                println!("  {} {} (kept ours)", "conflict:".red(), path);
            }
        }
    }
    Ok(())
}

fn cmd_gc(at: &Location) -> anyhow::Result<()> {
    let mut repo = at.open()?;
    let report = repo.garbage_collect()?;
    println!(
        "{} GC: {} objects removed ({} commits, {} trees, {} blobs).",
        "✓".green(),
        report.total(),
        report.commits,
        report.trees,
        report.blobs
    );
    Ok(())
}
