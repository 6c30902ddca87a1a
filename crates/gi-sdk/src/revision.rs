//! Revisions: what HEAD (or a user-supplied token) refers to.

use gi_dag::{Commit, CommitGraph, DagError};
use gi_refs::{BranchTable, Head};
use gi_types::ObjectId;

use crate::error::{SdkError, SdkResult};

/// Token that always names the current revision.
pub const HEAD_TOKEN: &str = "HEAD";

/// A resolved revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Revision {
    /// A commit reached directly by id.
    Detached(Commit),
    /// A commit reached through a branch.
    Attached {
        /// The branch tip.
        commit: Commit,
        /// The branch name.
        branch: String,
    },
}

impl Revision {
    /// The commit this revision points at.
    pub fn commit(&self) -> &Commit {
        match self {
            Self::Detached(commit) | Self::Attached { commit, .. } => commit,
        }
    }

    /// The branch name, if attached.
    pub fn branch(&self) -> Option<&str> {
        match self {
            Self::Attached { branch, .. } => Some(branch),
            Self::Detached(_) => None,
        }
    }

    /// The id of the commit this revision points at.
    pub fn id(&self) -> ObjectId {
        self.commit().id
    }

    /// The tree of the commit this revision points at.
    pub fn tree(&self) -> ObjectId {
        self.commit().tree
    }

    /// The HEAD line that selects this revision.
    pub fn to_head(&self) -> Head {
        match self {
            Self::Attached { branch, .. } => Head::Attached(branch.clone()),
            Self::Detached(commit) => Head::Detached(commit.id),
        }
    }
}

/// Resolves user tokens against the current HEAD, the branch table, and
/// the commit graph.
pub struct RevisionResolver<'a> {
    head: &'a Revision,
    branches: &'a BranchTable,
    graph: &'a CommitGraph,
}

impl<'a> RevisionResolver<'a> {
    pub fn new(head: &'a Revision, branches: &'a BranchTable, graph: &'a CommitGraph) -> Self {
        Self {
            head,
            branches,
            graph,
        }
    }

    /// Resolve `token`.
    ///
    /// `HEAD` is the current revision. A branch name yields an attached
    /// revision and shadows any commit prefix with the same spelling;
    /// otherwise the token must name a stored commit, full or abbreviated.
    pub fn resolve(&self, token: &str) -> SdkResult<Revision> {
        if token == HEAD_TOKEN {
            return Ok(self.head.clone());
        }
        if self.branches.exists(token) {
            let commit = self.graph.get(&self.branches.resolve(token)?)?;
            return Ok(Revision::Attached {
                commit,
                branch: token.to_string(),
            });
        }
        Ok(Revision::Detached(self.graph.load(token)?))
    }

    /// Returns `true` if `token` would resolve. An ambiguous prefix counts.
    pub fn exists(&self, token: &str) -> SdkResult<bool> {
        if token == HEAD_TOKEN || self.branches.exists(token) {
            return Ok(true);
        }
        match self.graph.exists(token) {
            Ok(found) => Ok(found),
            Err(DagError::NotFound(_)) => Ok(false),
            Err(e) => Err(SdkError::from(e)),
        }
    }
}
