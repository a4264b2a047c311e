// src/query/enumerator.rs
// =============================================================================
// Generates the top-level search terms.
//
// With the default length of 2 that is every two-letter combination,
// 26 * 26 = 676 terms, either "aa".."zz" or "zz".."aa".
//
// Resume:
// The checkpoint holds the last top-level term that finished. We cut it down
// to the enumerator's term length and restart at the first term that is not
// before it in enumeration order. The checkpointed term itself runs again;
// the seen-set absorbs whatever it rediscovers.
// =============================================================================

use crate::config::RunMode;

// The ordered space of top-level terms for one run mode
#[derive(Debug, Clone)]
pub struct QueryEnumerator {
    term_length: usize,
    mode: RunMode,
}

impl QueryEnumerator {
    pub fn new(term_length: usize, mode: RunMode) -> Self {
        Self {
            term_length: term_length.max(1),
            mode,
        }
    }

    /// Every top-level term in run order. Deterministic for a given
    /// length and mode.
    pub fn terms(&self) -> Vec<String> {
        let mut terms = vec![String::new()];
        for _ in 0..self.term_length {
            terms = terms
                .iter()
                .flat_map(|prefix| ('a'..='z').map(move |letter| format!("{prefix}{letter}")))
                .collect();
        }

        if self.mode == RunMode::Reversed {
            terms.reverse();
        }
        terms
    }

    /// Index into `terms()` where a run should start.
    ///
    /// No checkpoint, an empty one, or one that matches nothing all mean
    /// "start from the beginning".
    pub fn resume_index(&self, checkpoint: Option<&str>) -> usize {
        let Some(checkpoint) = checkpoint.map(str::trim).filter(|c| !c.is_empty()) else {
            return 0;
        };

        // A refined sub-query ("smi b") resumes at its bucket ("sm")
        let bucket: String = checkpoint.chars().take(self.term_length).collect();

        self.terms()
            .iter()
            .position(|term| match self.mode {
                RunMode::Forward => term.as_str() >= bucket.as_str(),
                // Reversed terms run in descending order, so the comparison flips
                RunMode::Reversed => term.as_str() <= bucket.as_str(),
            })
            .unwrap_or(0)
    }

    /// The terms still to run, starting at the resume position.
    pub fn remaining(&self, checkpoint: Option<&str>) -> Vec<String> {
        let start = self.resume_index(checkpoint);
        self.terms().split_off(start)
    }
}
