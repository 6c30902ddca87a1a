use std::collections::BTreeSet;
use std::ops::Bound;

/// Outcome of resolving a prefix against a [`PrefixIndex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefixMatch<'a> {
    /// Exactly one name wins.
    Unique(&'a str),
    /// Several equally long names share the prefix.
    Ambiguous(usize),
    /// Nothing shares the prefix.
    None,
}

/// Sorted set of stored names supporting abbreviated lookup.
///
/// Candidates for a prefix are found with a single range query. Resolution
/// rules: an exact name wins; otherwise the longest candidate wins if it is
/// the only one of that length; otherwise the prefix is ambiguous.
#[derive(Clone, Debug, Default)]
pub struct PrefixIndex {
    names: BTreeSet<String>,
}

impl PrefixIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name. Returns `true` if it was not present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Remove a name. Returns `true` if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    /// Returns `true` if `name` is indexed exactly.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of indexed names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate indexed names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Resolve `prefix` to a single indexed name.
    pub fn resolve(&self, prefix: &str) -> PrefixMatch<'_> {
        if prefix.is_empty() {
            return PrefixMatch::None;
        }
        if let Some(exact) = self.names.get(prefix) {
            return PrefixMatch::Unique(exact.as_str());
        }

        let mut best: Option<&str> = None;
        let mut ties = 0;
        let candidates = self
            .names
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|name| name.starts_with(prefix));
        for name in candidates {
            let name = name.as_str();
            match best {
                Some(current) if name.len() < current.len() => {}
                Some(current) if name.len() == current.len() => ties += 1,
                _ => {
                    best = Some(name);
                    ties = 1;
                }
            }
        }

        match best {
            None => PrefixMatch::None,
            Some(name) if ties == 1 => PrefixMatch::Unique(name),
            Some(_) => PrefixMatch::Ambiguous(ties),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for PrefixIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
