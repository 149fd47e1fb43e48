//! Grammar normalization: an ordered pipeline of rewriting precepts.
//!
//! This is a thin orchestrator that runs each precept in order. After any
//! precept changes the grammar, the analyzer cache is invalidated and the
//! loop restarts from the first precept; precepts are not assumed
//! commutative or idempotent in combination. Earlier precepts simplify the
//! grammar before the costlier ones run.
//!
//! The restart loop is capped. Exceeding the cap means two precepts are
//! oscillating against each other, which is a defect in the pipeline and is
//! surfaced as [`GrammarError::NormalizeLoopLimit`], never silently.

mod p1_unproductive_rules;
mod p2_unproductive_terms;
mod p3_single_use_terms;
mod p4_sort_rules;
mod p5_duplicate_rules;
mod p6_duplicate_terms;
mod p7_left_recursion;
mod p8_left_factor;

use crate::analyze::Analyzer;
use crate::diag::Log;
use crate::error::GrammarError;
use crate::grammar::Grammar;

/// Restart cap for [`normalize`].
pub const DEFAULT_LOOP_LIMIT: usize = 10_000;

type Precept = fn(&mut Grammar, &mut Analyzer, Option<&mut Log>) -> Result<bool, GrammarError>;

const PRECEPTS: &[Precept] = &[
    p1_unproductive_rules::apply,
    p2_unproductive_terms::apply,
    p3_single_use_terms::apply,
    p4_sort_rules::apply,
    p5_duplicate_rules::apply,
    p6_duplicate_terms::apply,
    p7_left_recursion::apply,
    p8_left_factor::apply,
];

/// Normalize the grammar in place. Returns whether anything changed, so a
/// second run on the result reports `false`.
pub fn normalize(grammar: &mut Grammar, log: Option<&mut Log>) -> Result<bool, GrammarError> {
    normalize_with_limit(grammar, log, DEFAULT_LOOP_LIMIT)
}

/// [`normalize`] with an explicit restart cap.
pub fn normalize_with_limit(
    grammar: &mut Grammar,
    mut log: Option<&mut Log>,
    limit: usize,
) -> Result<bool, GrammarError> {
    let mut analyzer = Analyzer::new();
    let mut changed_any = false;
    let mut iterations = 0usize;
    'restart: loop {
        iterations += 1;
        if iterations > limit {
            return Err(GrammarError::NormalizeLoopLimit { limit });
        }
        for precept in PRECEPTS {
            if precept(grammar, &mut analyzer, log.as_deref_mut())? {
                analyzer.invalidate();
                changed_any = true;
                continue 'restart;
            }
        }
        break;
    }
    Ok(changed_any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_is_idempotent() {
        let mut g = Grammar::new();
        g.rule("E").term("E"); // unproductive
        g.rule("E").token("n");
        g.rule("E").token("n"); // duplicate
        assert!(normalize(&mut g, None).unwrap());
        let first_pass = g.to_string();
        assert!(!normalize(&mut g, None).unwrap());
        assert_eq!(g.to_string(), first_pass);
    }

    #[test]
    fn loop_limit_is_fatal() {
        let mut g = Grammar::new();
        // Needs several restarts to settle; a cap of one cannot finish.
        g.rule("E").term("E");
        g.rule("E").token("b");
        g.rule("E").token("a");
        let err = normalize_with_limit(&mut g, None, 1).unwrap_err();
        assert!(matches!(err, GrammarError::NormalizeLoopLimit { limit: 1 }));
    }
}
