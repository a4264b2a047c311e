// src/query/refiner.rs
// =============================================================================
// Expands saturated queries.
//
// The service stops at a fixed number of results per search. When a query
// hits that cap we cannot know what we missed, so we search again with one
// more letter: "jo" -> "joa", "job", ... "joz".
//
// Names are searched as "last first", so a very common last name ("smith")
// keeps saturating no matter how many letters we add. Once a query is longer
// than two characters and has no space yet, we also try "smi a", "smi b", ...
// which walks into the first-name component instead.
//
// Depth:
// Each child sits one level below its parent. Top-level terms are depth 0.
// A saturated query at `max_depth` is NOT refined further; that bounds the
// fan-out on pathological data.
// =============================================================================

// A query waiting on the work-stack, with its refinement depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub term: String,
    pub depth: usize,
}

impl PendingQuery {
    pub fn top_level(term: &str) -> Self {
        Self {
            term: term.to_string(),
            depth: 0,
        }
    }
}

/// Child queries for a saturated `query`: letter suffixes first, then the
/// space-separated variants when they apply.
pub fn child_queries(query: &str) -> Vec<String> {
    let mut children: Vec<String> = ('a'..='z').map(|letter| format!("{query}{letter}")).collect();

    if query.chars().count() > 2 && !query.contains(' ') {
        children.extend(('a'..='z').map(|letter| format!("{query} {letter}")));
    }

    children
}

// Saturation check plus depth-bounded expansion
#[derive(Debug, Clone)]
pub struct SaturationRefiner {
    saturation_cap: usize,
    max_depth: usize,
}

impl SaturationRefiner {
    pub fn new(saturation_cap: usize, max_depth: usize) -> Self {
        Self {
            saturation_cap,
            max_depth,
        }
    }

    /// A query is saturated once its raw entry count reaches the cap.
    pub fn is_saturated(&self, raw_count: usize) -> bool {
        raw_count >= self.saturation_cap
    }

    /// Children of a saturated query, or None if the depth guard stops it.
    pub fn expand(&self, parent: &PendingQuery) -> Option<Vec<PendingQuery>> {
        if parent.depth >= self.max_depth {
            return None;
        }

        Some(
            child_queries(&parent.term)
                .into_iter()
                .map(|term| PendingQuery {
                    term,
                    depth: parent.depth + 1,
                })
                .collect(),
        )
    }
}
