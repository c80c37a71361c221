//! Pattern set resolution.
//!
//! Compiled file patterns are sorted into four buckets and combined against
//! the candidate list supplied by version control:
//!
//! 1. Extension includes are OR'd, path includes are OR'd.
//! 2. When both kinds are present the two unions are intersected; when only
//!    one is present it is used alone; with no includes every candidate is in.
//! 3. Anything matched by an exclude pattern (of either kind) is removed.
//!
//! Excludes always apply after includes, whatever their position on the
//! command line, and the result keeps the candidate order.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::glob::{compile, CompiledPattern, PatternError, PatternKind, RawPattern};

/// The four pattern buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    ExtensionIncludes,
    PathIncludes,
    ExtensionExcludes,
    PathExcludes,
}

impl Bucket {
    /// The bucket a pattern of the given kind lands in.
    pub fn of(kind: PatternKind, exclude: bool) -> Self {
        match (kind, exclude) {
            (PatternKind::ExtensionGlob, false) => Bucket::ExtensionIncludes,
            (PatternKind::PathGlob, false) => Bucket::PathIncludes,
            (PatternKind::ExtensionGlob, true) => Bucket::ExtensionExcludes,
            (PatternKind::PathGlob, true) => Bucket::PathExcludes,
        }
    }

    pub fn is_exclude(&self) -> bool {
        matches!(self, Bucket::ExtensionExcludes | Bucket::PathExcludes)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Bucket::ExtensionIncludes => "extension include",
            Bucket::PathIncludes => "path include",
            Bucket::ExtensionExcludes => "extension exclude",
            Bucket::PathExcludes => "path exclude",
        };
        f.write_str(name)
    }
}

/// Compiled file patterns, bucketed by kind and polarity.
#[derive(Debug, Clone, Default)]
pub struct PatternGroup {
    extension_includes: Vec<CompiledPattern>,
    path_includes: Vec<CompiledPattern>,
    extension_excludes: Vec<CompiledPattern>,
    path_excludes: Vec<CompiledPattern>,
    /// (bucket, index within bucket) in command line order.
    order: Vec<(Bucket, usize)>,
}

impl PatternGroup {
    /// Compile every raw pattern into its bucket.
    ///
    /// The first pattern that fails to compile fails the whole group.
    pub fn compile(raw: &[RawPattern]) -> Result<Self, PatternError> {
        let mut group = PatternGroup::default();
        for pattern in raw {
            let compiled = compile(pattern)?;
            let bucket = Bucket::of(compiled.kind, pattern.exclude);
            let slot = group.bucket_mut(bucket);
            slot.push(compiled);
            let index = slot.len() - 1;
            group.order.push((bucket, index));
        }
        debug!(
            extension_includes = group.extension_includes.len(),
            path_includes = group.path_includes.len(),
            extension_excludes = group.extension_excludes.len(),
            path_excludes = group.path_excludes.len(),
            "compiled file patterns"
        );
        Ok(group)
    }

    /// Patterns in one bucket, in command line order.
    pub fn bucket(&self, bucket: Bucket) -> &[CompiledPattern] {
        match bucket {
            Bucket::ExtensionIncludes => &self.extension_includes,
            Bucket::PathIncludes => &self.path_includes,
            Bucket::ExtensionExcludes => &self.extension_excludes,
            Bucket::PathExcludes => &self.path_excludes,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<CompiledPattern> {
        match bucket {
            Bucket::ExtensionIncludes => &mut self.extension_includes,
            Bucket::PathIncludes => &mut self.path_includes,
            Bucket::ExtensionExcludes => &mut self.extension_excludes,
            Bucket::PathExcludes => &mut self.path_excludes,
        }
    }

    /// Every pattern with its bucket, in command line order.
    pub fn entries(&self) -> impl Iterator<Item = (Bucket, &CompiledPattern)> + '_ {
        self.order
            .iter()
            .map(|&(bucket, index)| (bucket, &self.bucket(bucket)[index]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns true if `path` survives the include and exclude rules.
    pub fn matches(&self, path: &str) -> bool {
        self.included(path) && !self.excluded(path)
    }

    fn included(&self, path: &str) -> bool {
        let by_extension = any_match(&self.extension_includes, path);
        let by_path = any_match(&self.path_includes, path);
        match (
            self.extension_includes.is_empty(),
            self.path_includes.is_empty(),
        ) {
            (false, false) => by_extension && by_path,
            (false, true) => by_extension,
            (true, false) => by_path,
            (true, true) => true,
        }
    }

    fn excluded(&self, path: &str) -> bool {
        any_match(&self.extension_excludes, path) || any_match(&self.path_excludes, path)
    }

    /// Filter the candidate list down to the files to search.
    pub fn resolve<S: AsRef<str>>(&self, candidates: &[S]) -> FileSet {
        let paths: Vec<String> = candidates
            .iter()
            .map(|candidate| candidate.as_ref())
            .filter(|path| self.matches(path))
            .map(str::to_string)
            .collect();
        debug!(
            candidates = candidates.len(),
            selected = paths.len(),
            "resolved file set"
        );
        FileSet { paths }
    }
}

fn any_match(patterns: &[CompiledPattern], path: &str) -> bool {
    patterns.iter().any(|p| p.matches(path))
}

/// The files selected for one invocation, in candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileSet {
    paths: Vec<String>,
}

impl FileSet {
    pub fn as_slice(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.paths
    }
}

impl From<Vec<String>> for FileSet {
    fn from(paths: Vec<String>) -> Self {
        FileSet { paths }
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}
