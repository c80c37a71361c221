//! Extension glob compilation.
//!
//! An extension glob is expanded into variants; wildcard-free variants are
//! collected into one literal suffix set, the rest become suffix globs whose
//! `*` matches any run of characters, `/` included.

use std::fmt;

use super::expand::expand;
use super::{has_wildcard, CompiledPredicate, PatternError, Wildcard};

/// A wildcard pattern anchored at the end of the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixGlob {
    glob: String,
    wildcard: Wildcard,
}

impl SuffixGlob {
    pub fn new(glob: &str) -> Result<Self, PatternError> {
        // A leading `*` lets the glob start anywhere in the path.
        let wildcard = Wildcard::new(&format!("*{glob}"), false)
            .map_err(|e| PatternError::wildcard(glob, e))?;
        Ok(SuffixGlob {
            glob: glob.to_string(),
            wildcard,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.wildcard.is_match(path)
    }
}

impl fmt::Display for SuffixGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "suffix matches {}", self.glob)
    }
}

/// Compile an extension glob into its predicates.
pub fn compile_extension(pattern: &str) -> Result<Vec<CompiledPredicate>, PatternError> {
    let mut literals = Vec::new();
    let mut globs = Vec::new();

    for variant in expand(pattern)? {
        if has_wildcard(&variant) {
            globs.push(CompiledPredicate::SuffixGlob(SuffixGlob::new(&variant)?));
        } else {
            literals.push(variant);
        }
    }

    let mut predicates = Vec::with_capacity(globs.len() + 1);
    if !literals.is_empty() {
        predicates.push(CompiledPredicate::SuffixSet(literals));
    }
    predicates.extend(globs);
    Ok(predicates)
}
