use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use gi_dag::{Commit, CommitGraph};
use gi_index::{compute_status, scan_working_directory, Index, WorkdirStatus};
use gi_refs::{BranchInfo, BranchTable, Head};
use gi_store::{
    BlobStore, FsKvStore, FsWorkingDirectory, KeyValueStore, KvObjectStore, ObjectStore,
    StoreError, Tree, TreeStore, WorkingDirectory,
};
use gi_types::ObjectId;
use tracing::{debug, info};

use crate::config::RepositoryConfig;
use crate::error::{SdkError, SdkResult};
use crate::revision::{Revision, RevisionResolver, HEAD_TOKEN};

/// Storage key holding the id of the dumped index tree.
pub const INDEX_KEY: &str = "INDEX";

/// Result of [`Repository::commit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new commit was recorded.
    Created(Commit),
    /// The index matches the HEAD tree; nothing was written.
    NothingToCommit,
}

/// Result of [`Repository::merge`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Their commit is already part of our history.
    UpToDate,
    /// Our commit was an ancestor of theirs; HEAD moved forward to it.
    FastForward(Commit),
    /// A merge commit was recorded. `conflicts` lists paths that kept our
    /// version because the merge was forced.
    Merged {
        commit: Commit,
        conflicts: Vec<String>,
    },
}

/// Counts of objects removed by [`Repository::garbage_collect`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GcReport {
    pub commits: usize,
    pub trees: usize,
    pub blobs: usize,
}

impl GcReport {
    /// Total number of objects removed.
    pub fn total(&self) -> usize {
        self.commits + self.trees + self.blobs
    }
}

/// Working-directory status together with where HEAD points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReport {
    /// The branch HEAD is attached to, if any.
    pub branch: Option<String>,
    /// The commit HEAD points at.
    pub commit: ObjectId,
    /// Staged, unstaged, and untracked changes.
    pub changes: WorkdirStatus,
}

/// One commit in the output of [`Repository::log`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub id: ObjectId,
    /// Whether HEAD points at this commit.
    pub is_head: bool,
    /// Branches whose tip is this commit, sorted.
    pub branches: Vec<String>,
    /// Commit time rendered with the configured date format.
    pub date: String,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "commit {}", self.id)?;
        if self.is_head {
            write!(f, " [HEAD]")?;
        }
        if !self.branches.is_empty() {
            write!(f, " ({})", self.branches.join(", "))?;
        }
        writeln!(f)?;
        writeln!(f, "Date: {}", self.date)?;
        writeln!(f)?;
        writeln!(f, "    {}", self.message)
    }
}

/// A gi repository: object storage, the commit graph, branches, HEAD, and
/// the staging index, bound to one working directory.
///
/// HEAD and the live index are owned here; everything else is shared,
/// immutable, and addressed by id.
pub struct Repository {
    kv: Arc<dyn KeyValueStore>,
    workdir: Arc<dyn WorkingDirectory>,
    config: RepositoryConfig,
    blobs: BlobStore,
    trees: TreeStore,
    graph: CommitGraph,
    branches: BranchTable,
    head: Revision,
    index: Index,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("head", &self.head.to_head())
            .field("branches", &self.branches)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl Repository {
    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    /// Initialize a repository in `kv`.
    ///
    /// Stores the empty tree, a parentless root commit, the default branch
    /// pointing at it, an attached HEAD, and the INDEX pointer.
    pub fn init(
        kv: Arc<dyn KeyValueStore>,
        workdir: Arc<dyn WorkingDirectory>,
        config: RepositoryConfig,
    ) -> SdkResult<Self> {
        if kv.exists(gi_refs::types::HEAD_KEY)? {
            return Err(SdkError::AlreadyInitialized);
        }
        config.validate()?;
        config.save(&*kv)?;

        let objects: Arc<dyn ObjectStore> = Arc::new(KvObjectStore::new(kv.clone()));
        let trees = TreeStore::new(objects.clone());
        let empty = trees.dump(&Tree::empty())?;
        let graph = CommitGraph::new(objects.clone());
        let root = graph.record(config.initial_message.as_str(), empty, vec![], Utc::now())?;

        let mut branches = BranchTable::load(kv.clone())?;
        branches.pin(&config.default_branch, root.id)?;
        let head = Revision::Attached {
            commit: root,
            branch: config.default_branch.clone(),
        };
        head.to_head().save(&*kv)?;
        kv.save_string(INDEX_KEY, &empty.to_hex())?;

        info!(
            branch = %config.default_branch,
            root = %head.id().short_hex(),
            "initialized repository"
        );
        Ok(Self {
            blobs: BlobStore::new(objects.clone()),
            index: Index::new(objects),
            kv,
            workdir,
            config,
            trees,
            graph,
            branches,
            head,
        })
    }

    /// Open an initialized repository stored in `kv`.
    ///
    /// Settings come from `config.toml` when present. A missing INDEX
    /// pointer is rebuilt from the HEAD tree.
    pub fn open(kv: Arc<dyn KeyValueStore>, workdir: Arc<dyn WorkingDirectory>) -> SdkResult<Self> {
        let head_line = Head::load(&*kv)?.ok_or(SdkError::NotInitialized)?;
        let config = RepositoryConfig::load(&*kv)?.unwrap_or_default();

        let objects: Arc<dyn ObjectStore> = Arc::new(KvObjectStore::new(kv.clone()));
        let trees = TreeStore::new(objects.clone());
        let graph = CommitGraph::new(objects.clone());
        let branches = BranchTable::load(kv.clone())?;

        let head = match head_line {
            Head::Attached(branch) => Revision::Attached {
                commit: graph.get(&branches.resolve(&branch)?)?,
                branch,
            },
            Head::Detached(id) => Revision::Detached(graph.get(&id)?),
        };

        let index = match kv.load_string(INDEX_KEY)? {
            Some(line) => {
                let id = ObjectId::from_hex(line.trim()).map_err(|e| {
                    SdkError::Storage(StoreError::Serialization(format!("{INDEX_KEY}: {e}")))
                })?;
                Index::load(objects.clone(), &id)?
            }
            None => Index::from_tree(objects.clone(), &trees.load(&head.tree())?),
        };

        debug!(head = %head.to_head(), tracked = index.len(), "opened repository");
        Ok(Self {
            blobs: BlobStore::new(objects),
            kv,
            workdir,
            config,
            trees,
            graph,
            branches,
            head,
            index,
        })
    }

    /// Initialize a repository on disk, with metadata under
    /// `root/<config.metadata_dir>`.
    pub fn init_at(root: impl AsRef<Path>, config: RepositoryConfig) -> SdkResult<Self> {
        config.validate()?;
        let workdir = FsWorkingDirectory::new(root, config.metadata_dir.clone())?;
        let kv = FsKvStore::create(workdir.metadata_path())?;
        Self::init(Arc::new(kv), Arc::new(workdir), config)
    }

    /// Open the on-disk repository whose metadata lives in
    /// `root/<metadata_dir>`.
    pub fn open_at(root: impl AsRef<Path>, metadata_dir: &str) -> SdkResult<Self> {
        let workdir = FsWorkingDirectory::new(root, metadata_dir)?;
        let kv = FsKvStore::open(workdir.metadata_path());
        if !kv.is_present() {
            return Err(SdkError::NotInitialized);
        }
        let mut repo = Self::open(Arc::new(kv), Arc::new(workdir))?;
        repo.config.metadata_dir = metadata_dir.to_string();
        Ok(repo)
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    /// The current revision.
    pub fn head(&self) -> &Revision {
        &self.head
    }

    /// The live staging index.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Effective settings.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// The commit graph.
    pub fn graph(&self) -> &CommitGraph {
        &self.graph
    }

    /// The working directory this repository is bound to.
    pub fn workdir(&self) -> &dyn WorkingDirectory {
        &*self.workdir
    }

    /// Load a stored tree.
    pub fn tree(&self, id: &ObjectId) -> SdkResult<Tree> {
        Ok(self.trees.load(id)?)
    }

    /// Load a stored blob's content.
    pub fn blob(&self, id: &ObjectId) -> SdkResult<Vec<u8>> {
        Ok(self.blobs.get(id)?)
    }

    // ---------------------------------------------------------------
    // Revisions
    // ---------------------------------------------------------------

    /// Resolve `HEAD`, a branch name, or a (possibly abbreviated) commit id.
    pub fn resolve(&self, token: &str) -> SdkResult<Revision> {
        RevisionResolver::new(&self.head, &self.branches, &self.graph).resolve(token)
    }

    /// Returns `true` if `token` would resolve.
    pub fn revision_exists(&self, token: &str) -> SdkResult<bool> {
        RevisionResolver::new(&self.head, &self.branches, &self.graph).exists(token)
    }

    // ---------------------------------------------------------------
    // Staging
    // ---------------------------------------------------------------

    /// Stage each of `paths` (files or directories), then persist the index.
    pub fn stage_add(&mut self, paths: &[String]) -> SdkResult<()> {
        for path in paths {
            self.index.stage(&*self.workdir, path)?;
        }
        self.persist_index()?;
        Ok(())
    }

    /// Untrack each of `paths` without touching the working directory,
    /// then persist the index.
    pub fn stage_remove(&mut self, paths: &[String]) -> SdkResult<()> {
        for path in paths {
            let removed = self.index.unstage(path);
            debug!(path = %path, removed, "unstaged");
        }
        self.persist_index()?;
        Ok(())
    }

    fn persist_index(&mut self) -> SdkResult<ObjectId> {
        let id = self.index.write_tree()?;
        self.kv.save_string(INDEX_KEY, &id.to_hex())?;
        Ok(id)
    }

    // ---------------------------------------------------------------
    // Commits
    // ---------------------------------------------------------------

    /// Record the index as a new commit on top of HEAD.
    pub fn commit(&mut self, message: &str) -> SdkResult<CommitOutcome> {
        self.commit_at(message, Utc::now())
    }

    /// Like [`commit`](Self::commit), with an explicit timestamp.
    pub fn commit_at(
        &mut self,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> SdkResult<CommitOutcome> {
        if self.index.identifier()? == self.head.tree() {
            return Ok(CommitOutcome::NothingToCommit);
        }
        let tree = self.persist_index()?;
        let commit = self
            .graph
            .record(message, tree, vec![self.head.id()], timestamp)?;
        self.advance_head(commit.clone())?;
        info!(commit = %commit.id.short_hex(), head = %self.head.to_head(), "committed");
        Ok(CommitOutcome::Created(commit))
    }

    /// Move HEAD to `commit`: repin the branch if attached, otherwise
    /// rewrite the detached HEAD line.
    fn advance_head(&mut self, commit: Commit) -> SdkResult<()> {
        self.head = match self.head.branch() {
            Some(branch) => {
                let branch = branch.to_string();
                self.branches.pin(&branch, commit.id)?;
                Revision::Attached { commit, branch }
            }
            None => {
                let head = Revision::Detached(commit);
                head.to_head().save(&*self.kv)?;
                head
            }
        };
        Ok(())
    }

    /// Make the index and working directory match `tree`, then persist.
    fn sync_to(&mut self, tree: &ObjectId) -> SdkResult<()> {
        let tree = self.trees.load(tree)?;
        self.index.sync_working_directory_to(&*self.workdir, &tree)?;
        self.persist_index()?;
        Ok(())
    }

    // ---------------------------------------------------------------
    // Checkout & reset
    // ---------------------------------------------------------------

    /// Switch to `token`: sync the index and working directory to its tree
    /// and point HEAD at it (attached iff `token` names a branch).
    pub fn checkout(&mut self, token: &str) -> SdkResult<&Revision> {
        let target = self.resolve(token)?;
        self.sync_to(&target.tree())?;
        target.to_head().save(&*self.kv)?;
        info!(head = %target.to_head(), "checked out");
        self.head = target;
        Ok(&self.head)
    }

    /// Restore `paths` from `token`'s tree. HEAD does not move.
    pub fn checkout_paths(&mut self, token: &str, paths: &[String]) -> SdkResult<()> {
        let target = self.resolve(token)?;
        let tree = self.trees.load(&target.tree())?;
        self.index.sync_paths_to(&*self.workdir, &tree, paths)?;
        self.persist_index()?;
        info!(from = %target.id().short_hex(), paths = paths.len(), "restored paths");
        Ok(())
    }

    /// Move the current branch to `token`, syncing the index and working
    /// directory, then collect garbage if configured.
    pub fn reset(&mut self, token: &str) -> SdkResult<&Revision> {
        let branch = self
            .head
            .branch()
            .map(str::to_string)
            .ok_or(SdkError::DetachedHead)?;
        let target = self.resolve(token)?;
        self.sync_to(&target.tree())?;
        self.branches.pin(&branch, target.id())?;
        self.head = Revision::Attached {
            commit: target.commit().clone(),
            branch,
        };
        info!(head = %self.head.to_head(), commit = %self.head.id().short_hex(), "reset");

        if self.config.gc_after_reset {
            self.garbage_collect()?;
        }
        Ok(&self.head)
    }

    // ---------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------

    /// Staged changes (index vs HEAD tree) plus unstaged and untracked
    /// changes (working directory vs index). Writes nothing.
    pub fn status(&self) -> SdkResult<StatusReport> {
        let head_tree = self.trees.load(&self.head.tree())?;
        let scanned = scan_working_directory(&*self.workdir)?;
        Ok(StatusReport {
            branch: self.head.branch().map(str::to_string),
            commit: self.head.id(),
            changes: compute_status(&head_tree, &self.index, &scanned),
        })
    }

    /// History reachable from `token` (HEAD if empty), newest first.
    ///
    /// Commits with equal timestamps are ordered by id.
    pub fn log(&self, token: &str) -> SdkResult<Vec<LogEntry>> {
        let from = if token.is_empty() {
            self.head.clone()
        } else {
            self.resolve(token)?
        };
        let mut commits = self.graph.ancestors_of(&[from.id()])?;
        commits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));

        commits
            .into_iter()
            .map(|commit| self.log_entry(commit))
            .collect()
    }

    fn log_entry(&self, commit: Commit) -> SdkResult<LogEntry> {
        let mut date = String::new();
        let local = commit.timestamp.with_timezone(&Local);
        write!(date, "{}", local.format(&self.config.date_format)).map_err(|_| {
            SdkError::Config(format!("invalid date_format {:?}", self.config.date_format))
        })?;
        Ok(LogEntry {
            id: commit.id,
            is_head: commit.id == self.head.id(),
            branches: self
                .branches
                .names_at(&commit.id)
                .into_iter()
                .map(str::to_string)
                .collect(),
            date,
            message: commit.message,
        })
    }

    // ---------------------------------------------------------------
    // Garbage collection
    // ---------------------------------------------------------------

    /// Delete every object unreachable from a branch tip, HEAD, or the live
    /// index.
    pub fn garbage_collect(&mut self) -> SdkResult<GcReport> {
        let mut roots: Vec<ObjectId> = self.branches.tip_commits().into_iter().collect();
        roots.push(self.head.id());
        let reachable = self.graph.ancestors_of(&roots)?;

        let keep_commits: HashSet<ObjectId> = reachable.iter().map(|c| c.id).collect();
        let mut keep_trees: HashSet<ObjectId> = reachable.iter().map(|c| c.tree).collect();
        keep_trees.insert(self.persist_index()?);

        let mut keep_blobs = HashSet::new();
        for tree in &keep_trees {
            keep_blobs.extend(self.trees.load(tree)?.blob_ids().copied());
        }

        let report = GcReport {
            commits: self.graph.sweep(&keep_commits)?,
            trees: self.trees.sweep(&keep_trees)?,
            blobs: self.blobs.sweep(&keep_blobs)?,
        };
        info!(
            commits = report.commits,
            trees = report.trees,
            blobs = report.blobs,
            "garbage collected"
        );
        Ok(report)
    }

    // ---------------------------------------------------------------
    // Branches
    // ---------------------------------------------------------------

    /// Create branch `name` at `revision` (HEAD if `None`).
    pub fn create_branch(&mut self, name: &str, revision: Option<&str>) -> SdkResult<BranchInfo> {
        let target = self.resolve(revision.unwrap_or(HEAD_TOKEN))?;
        self.branches.create(name, target.id())?;
        info!(branch = name, commit = %target.id().short_hex(), "created branch");
        Ok(BranchInfo {
            name: name.to_string(),
            commit: target.id(),
            is_current: false,
        })
    }

    /// Delete branch `name`. The branch HEAD is attached to cannot be
    /// deleted. Commits it pointed to stay until the next collection.
    pub fn delete_branch(&mut self, name: &str) -> SdkResult<ObjectId> {
        if self.head.branch() == Some(name) {
            return Err(SdkError::DeleteCurrentBranch(name.to_string()));
        }
        let commit = self.branches.delete(name)?;
        info!(branch = name, "deleted branch");
        Ok(commit)
    }

    /// Every branch, sorted by name, with the current one flagged.
    pub fn branches(&self) -> Vec<BranchInfo> {
        let current = self.head.branch();
        self.branches
            .iter()
            .map(|(name, commit)| BranchInfo {
                name: name.to_string(),
                commit: *commit,
                is_current: current == Some(name),
            })
            .collect()
    }

    // ---------------------------------------------------------------
    // Merge
    // ---------------------------------------------------------------

    /// Merge `token` into HEAD.
    ///
    /// Fast-forwards when possible; otherwise merges the trees against the
    /// merge base and records a two-parent commit. Conflicts abort before
    /// anything is written unless `force` is set, in which case conflicting
    /// paths keep our version.
    pub fn merge(&mut self, token: &str, force: bool) -> SdkResult<MergeOutcome> {
        if self.index.identifier()? != self.head.tree() {
            return Err(SdkError::UncommittedChanges);
        }
        let theirs = self.resolve(token)?;
        let ours = self.head.id();

        if self.graph.is_ancestor(&theirs.id(), &ours)? {
            return Ok(MergeOutcome::UpToDate);
        }
        if self.graph.is_ancestor(&ours, &theirs.id())? {
            self.sync_to(&theirs.tree())?;
            let commit = theirs.commit().clone();
            self.advance_head(commit.clone())?;
            info!(commit = %commit.id.short_hex(), "fast-forwarded");
            return Ok(MergeOutcome::FastForward(commit));
        }

        let base = match self.graph.merge_base(&ours, &theirs.id())? {
            Some(commit) => self.trees.load(&commit.tree)?,
            None => Tree::empty(),
        };
        let their_tree = self.trees.load(&theirs.tree())?;
        let plan = gi_merge::plan(&self.index, &their_tree, &base);
        let conflicts: Vec<String> = plan.conflicts().iter().cloned().collect();
        if !conflicts.is_empty() && !force {
            return Err(SdkError::MergeConflict(conflicts));
        }

        gi_merge::apply(&plan, &mut self.index, &*self.workdir)?;
        let tree = self.persist_index()?;
        let commit = self.graph.record(
            format!("Merge {token}"),
            tree,
            vec![ours, theirs.id()],
            Utc::now(),
        )?;
        self.advance_head(commit.clone())?;
        info!(
            commit = %commit.id.short_hex(),
            conflicts = conflicts.len(),
            "merged"
        );
        Ok(MergeOutcome::Merged { commit, conflicts })
    }
}
