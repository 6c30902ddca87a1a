//! Core reference types: HEAD and branch summaries.

use gi_store::KeyValueStore;
use gi_types::ObjectId;
use tracing::debug;

use crate::error::{RefError, RefResult};

/// Storage key holding the HEAD line.
pub const HEAD_KEY: &str = "HEAD";

const SYMBOLIC_PREFIX: &str = "ref: ";

/// The state of HEAD: attached to a branch by name, or detached at a commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Head {
    /// HEAD follows a branch.
    Attached(String),
    /// HEAD points directly at a commit.
    Detached(ObjectId),
}

impl Head {
    /// Parse a persisted HEAD line (`ref: <branch>` or a hex commit id).
    pub fn parse(line: &str) -> RefResult<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        if let Some(branch) = line.strip_prefix(SYMBOLIC_PREFIX) {
            if branch.is_empty() {
                return Err(RefError::MalformedHead(line.to_string()));
            }
            return Ok(Self::Attached(branch.to_string()));
        }
        ObjectId::from_hex(line)
            .map(Self::Detached)
            .map_err(|_| RefError::MalformedHead(line.to_string()))
    }

    /// The persisted one-line form.
    pub fn to_line(&self) -> String {
        match self {
            Self::Attached(branch) => format!("{SYMBOLIC_PREFIX}{branch}"),
            Self::Detached(id) => id.to_hex(),
        }
    }

    /// The branch HEAD follows, if attached.
    pub fn branch(&self) -> Option<&str> {
        match self {
            Self::Attached(branch) => Some(branch),
            Self::Detached(_) => None,
        }
    }

    /// Returns `true` if HEAD is detached.
    pub fn is_detached(&self) -> bool {
        matches!(self, Self::Detached(_))
    }

    /// Read HEAD from storage. `Ok(None)` if it has never been written.
    pub fn load(kv: &dyn KeyValueStore) -> RefResult<Option<Self>> {
        match kv.load_string(HEAD_KEY)? {
            Some(line) => Self::parse(&line).map(Some),
            None => Ok(None),
        }
    }

    /// Persist HEAD.
    pub fn save(&self, kv: &dyn KeyValueStore) -> RefResult<()> {
        kv.save_string(HEAD_KEY, &self.to_line())?;
        debug!(head = %self, "updated HEAD");
        Ok(())
    }
}

impl std::fmt::Display for Head {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attached(branch) => write!(f, "{branch}"),
            Self::Detached(id) => write!(f, "{} (detached)", id.short_hex()),
        }
    }
}

/// Summary information about a branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchInfo {
    /// Branch name.
    pub name: String,
    /// The commit at the branch tip.
    pub commit: ObjectId,
    /// Whether HEAD is attached to this branch.
    pub is_current: bool,
}
