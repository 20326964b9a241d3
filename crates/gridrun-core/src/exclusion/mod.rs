//! Node exclusion list for batch submissions.
//!
//! The denylist file may be edited while a run is in progress, so the list is
//! rebuilt from disk for every submission.
use std::{fmt, path::Path};

use tracing::warn;

/// Ordered, de-duplicated set of node names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList(Vec<String>);

impl ExclusionList {
    /// Union of the caller's comma separated names and the denylist file.
    ///
    /// A missing file contributes nothing; an unreadable one is logged and skipped.
    pub fn build(caller: &str, denylist: Option<&Path>) -> Self {
        let contents = match denylist {
            Some(path) if path.exists() => match std::fs::read_to_string(path) {
                Ok(contents) => contents,
                Err(e) => {
                    warn!(target: "gridrun.core.exclusion", path = %path.display(), error = %e, "cannot read node denylist");
                    String::new()
                }
            },
            _ => String::new(),
        };
        Self::from_sources(caller, &contents)
    }

    /// Union of a comma separated list and newline separated file contents.
    pub fn from_sources(caller: &str, denylist: &str) -> Self {
        let mut list = Self::default();
        caller
            .split(',')
            .chain(denylist.lines())
            .for_each(|name| list.push(name));
        list
    }

    fn push(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() && !self.0.iter().any(|n| n == name) {
            self.0.push(name.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ExclusionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}
