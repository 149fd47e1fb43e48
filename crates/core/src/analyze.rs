//! Grammar analysis: first sets, lambda derivability, follow sets, and
//! left-recursion discovery.
//!
//! The analyzer keeps a derived cache over the grammar -- one [`TermData`]
//! per term, stored in an arena indexed by the term's position, with the
//! child/dependent/ancestor relations held as index sets rather than object
//! references. The cache is invalidated explicitly: the normalizer calls
//! [`Analyzer::invalidate`] after every grammar change, and any caller
//! mutating the grammar directly must do the same or queries go stale.

use crate::error::GrammarError;
use crate::grammar::{Grammar, Item, Rule};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Per-term analysis summary.
#[derive(Debug, Default, Clone)]
struct TermData {
    /// Tokens that can begin a derivation from this term.
    firsts: BTreeSet<String>,
    /// True when some rule choice derives the empty string.
    lambda: bool,
    /// Direct child terms: terms reachable in a leading position of a rule.
    children: BTreeSet<usize>,
    /// Terms whose firsts include this term's firsts, transitively.
    dependents: BTreeSet<usize>,
    /// Transitive closure of `children`.
    ancestors: BTreeSet<usize>,
}

#[derive(Debug)]
struct Analysis {
    index: BTreeMap<String, usize>,
    names: Vec<String>,
    data: Vec<TermData>,
}

/// Serializable per-term summary for introspection.
#[derive(Debug, Clone, Serialize)]
pub struct TermSummary {
    pub term: String,
    pub firsts: Vec<String>,
    pub lambda: bool,
}

/// Lazily refreshed analysis cache over a [`Grammar`].
#[derive(Debug, Default)]
pub struct Analyzer {
    cache: Option<Analysis>,
}

impl Analyzer {
    pub fn new() -> Self {
        Analyzer::default()
    }

    /// Drop the cached analysis. Queries recompute it on next use.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Recompute all per-term data by iterating propagation to a fixed
    /// point. Each step only adds to finite sets, so termination is
    /// guaranteed.
    pub fn refresh(&mut self, grammar: &Grammar) {
        self.cache = Some(Analysis::compute(grammar));
    }

    fn ensure(&mut self, grammar: &Grammar) -> &Analysis {
        if self.cache.is_none() {
            self.refresh(grammar);
        }
        self.cache.as_ref().expect("analysis cache present")
    }

    /// True when `token` can begin a derivation from `term`. Unknown terms
    /// have no firsts.
    pub fn has_first(&mut self, grammar: &Grammar, term: &str, token: &str) -> bool {
        let analysis = self.ensure(grammar);
        match analysis.index.get(term) {
            Some(&i) => analysis.data[i].firsts.contains(token),
            None => false,
        }
    }

    /// True when `term` can derive the empty string.
    pub fn has_lambda(&mut self, grammar: &Grammar, term: &str) -> bool {
        let analysis = self.ensure(grammar);
        match analysis.index.get(term) {
            Some(&i) => analysis.data[i].lambda,
            None => false,
        }
    }

    /// The first set of `term`, sorted.
    pub fn firsts(&mut self, grammar: &Grammar, term: &str) -> Vec<String> {
        let analysis = self.ensure(grammar);
        match analysis.index.get(term) {
            Some(&i) => analysis.data[i].firsts.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Tokens that can follow position `index` of `rule`: the firsts of each
    /// subsequent basic item, accumulated while those items derive lambda,
    /// with the parent's follow tokens unioned in when the rule end is
    /// reachable. The result is sorted.
    pub fn follows(
        &mut self,
        grammar: &Grammar,
        rule: &Rule,
        index: usize,
        parent_follows: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        let rest: Vec<&Item> = rule.basic_items().skip(index + 1).collect();
        self.follow_of(grammar, &rest, parent_follows)
    }

    /// Follow computation over an explicit remainder sequence. `rest` holds
    /// the basic items strictly after the position of interest.
    pub fn follow_of(
        &mut self,
        grammar: &Grammar,
        rest: &[&Item],
        parent_follows: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        let analysis = self.ensure(grammar);
        let mut out = BTreeSet::new();
        for item in rest {
            match item {
                Item::Token(name) => {
                    out.insert(name.clone());
                    return out;
                }
                Item::Term(name) => {
                    let Some(&i) = analysis.index.get(name.as_str()) else {
                        return out;
                    };
                    out.extend(analysis.data[i].firsts.iter().cloned());
                    if !analysis.data[i].lambda {
                        return out;
                    }
                }
                Item::Prompt(_) => {}
            }
        }
        out.extend(parent_follows.iter().cloned());
        out
    }

    /// Find the first left-recursive term, in declaration order, and return
    /// the cycle as a list of term names starting with the recursive term.
    /// Returns `Ok(None)` when the grammar has no left recursion.
    ///
    /// A term is left-recursive exactly when it is its own transitive
    /// dependent. The cycle is recovered by walking the child relation back
    /// to the flagged term, taking at each step the first child that still
    /// reaches it; failure to find such a child is an engine defect, not a
    /// grammar problem.
    pub fn find_first_left_recursion(
        &mut self,
        grammar: &Grammar,
    ) -> Result<Option<Vec<String>>, GrammarError> {
        let analysis = self.ensure(grammar);
        let Some(target) = (0..analysis.data.len()).find(|&i| analysis.data[i].dependents.contains(&i))
        else {
            return Ok(None);
        };

        let mut path = vec![target];
        let mut current = target;
        while !analysis.data[current].children.contains(&target) {
            let next = analysis.data[current]
                .children
                .iter()
                .copied()
                .find(|c| !path.contains(c) && analysis.data[target].dependents.contains(c));
            match next {
                Some(n) => {
                    path.push(n);
                    current = n;
                }
                None => {
                    return Err(GrammarError::LeftRecursionBroken {
                        term: analysis.names[target].clone(),
                    })
                }
            }
        }
        Ok(Some(path.into_iter().map(|i| analysis.names[i].clone()).collect()))
    }

    /// Serializable summaries for every term, in declaration order.
    pub fn summaries(&mut self, grammar: &Grammar) -> Vec<TermSummary> {
        let analysis = self.ensure(grammar);
        analysis
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| TermSummary {
                term: name.clone(),
                firsts: analysis.data[i].firsts.iter().cloned().collect(),
                lambda: analysis.data[i].lambda,
            })
            .collect()
    }

    /// Human-readable dump of the per-term data, one line per term. Not a
    /// stable format.
    pub fn dump(&mut self, grammar: &Grammar) -> String {
        let analysis = self.ensure(grammar);
        let mut out = String::new();
        for (i, name) in analysis.names.iter().enumerate() {
            let d = &analysis.data[i];
            let firsts: Vec<&str> = d.firsts.iter().map(String::as_str).collect();
            out.push_str(&format!(
                "<{}> firsts: [{}]{}\n",
                name,
                firsts.join(", "),
                if d.lambda { " lambda" } else { "" },
            ));
        }
        out
    }
}

impl Analysis {
    fn compute(grammar: &Grammar) -> Analysis {
        let names: Vec<String> = grammar.terms().iter().map(|t| t.name().to_string()).collect();
        let index: BTreeMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        let mut analysis = Analysis {
            index,
            names,
            data: vec![TermData::default(); grammar.terms().len()],
        };

        // Strict fixed point: propagate every term until a full sweep makes
        // no change. Sets only grow and flags only flip one way, so the loop
        // terminates.
        loop {
            let mut changed = false;
            for ti in 0..analysis.data.len() {
                changed |= analysis.propagate(grammar, ti);
            }
            if !changed {
                break;
            }
        }
        analysis
    }

    /// One propagation sweep over every rule of term `ti`. Returns whether
    /// anything was added.
    fn propagate(&mut self, grammar: &Grammar, ti: usize) -> bool {
        let mut changed = false;
        let rules = grammar.terms()[ti].rules();
        for rule in rules {
            let mut reached_end = true;
            for item in rule.basic_items() {
                match item {
                    Item::Token(name) => {
                        // The rest of the rule is unreachable without first
                        // consuming this token.
                        changed |= self.data[ti].firsts.insert(name.clone());
                        reached_end = false;
                        break;
                    }
                    Item::Term(name) => {
                        let Some(&ci) = self.index.get(name.as_str()) else {
                            // Dangling reference; validation reports it.
                            reached_end = false;
                            break;
                        };
                        changed |= self.join(ci, ti);
                        if !self.data[ci].lambda {
                            reached_end = false;
                            break;
                        }
                    }
                    Item::Prompt(_) => {}
                }
            }
            if reached_end && !self.data[ti].lambda {
                self.data[ti].lambda = true;
                changed = true;
            }
        }
        changed
    }

    /// Record that `parent` derives leading input through `child`:
    /// the parent inherits the child's firsts, becomes a dependent of the
    /// child (transitively), and gains the child among its ancestors.
    fn join(&mut self, child: usize, parent: usize) -> bool {
        let mut changed = self.data[parent].children.insert(child);

        let child_firsts: Vec<String> = self.data[child].firsts.iter().cloned().collect();
        for t in child_firsts {
            changed |= self.data[parent].firsts.insert(t);
        }

        // parent and everything depending on parent depend on child and on
        // everything child depends on.
        let mut dependents: BTreeSet<usize> = self.data[parent].dependents.clone();
        dependents.insert(parent);
        let mut targets: BTreeSet<usize> = self.data[child].ancestors.clone();
        targets.insert(child);
        for &t in &targets {
            for &d in &dependents {
                changed |= self.data[t].dependents.insert(d);
            }
        }
        for &d in &dependents {
            for &t in &targets {
                changed |= self.data[d].ancestors.insert(t);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expr_grammar() -> Grammar {
        // E := T | "(" E ")"
        // T := "+" T T2 | "n" T2
        // T2 := lambda | "+" "n" T2
        let mut g = Grammar::new();
        g.rule("E").term("T");
        g.rule("E").token("(").term("E").token(")");
        g.rule("T").token("+").term("T").term("T2");
        g.rule("T").token("n").term("T2");
        g.rule("T2");
        g.rule("T2").token("+").token("n").term("T2");
        g
    }

    #[test]
    fn first_sets_and_lambda() {
        let g = expr_grammar();
        let mut a = Analyzer::new();
        assert_eq!(a.firsts(&g, "E"), ["(", "+", "n"]);
        assert_eq!(a.firsts(&g, "T"), ["+", "n"]);
        assert_eq!(a.firsts(&g, "T2"), ["+"]);
        assert!(!a.has_lambda(&g, "E"));
        assert!(!a.has_lambda(&g, "T"));
        assert!(a.has_lambda(&g, "T2"));
        assert!(a.has_first(&g, "E", "("));
        assert!(!a.has_first(&g, "T", "("));
    }

    #[test]
    fn lambda_propagates_through_nullable_chain() {
        let mut g = Grammar::new();
        g.rule("A").term("B").term("C");
        g.rule("B");
        g.rule("C");
        let mut a = Analyzer::new();
        assert!(a.has_lambda(&g, "A"));
        assert_eq!(a.firsts(&g, "A"), Vec::<String>::new());
    }

    #[test]
    fn follows_accumulates_until_non_lambda() {
        let g = expr_grammar();
        let mut a = Analyzer::new();
        let rule = g.find_term("T").unwrap().rules()[0].clone();
        // T := "+" T T2; after index 0 comes T (firsts +, n; not lambda).
        let parent = BTreeSet::from(["$".to_string()]);
        let after_plus = a.follows(&g, &rule, 0, &parent);
        assert_eq!(
            after_plus,
            BTreeSet::from(["+".to_string(), "n".to_string()])
        );
        // After index 1 comes T2, which has lambda, so the parent follows
        // show through.
        let after_t = a.follows(&g, &rule, 1, &parent);
        assert_eq!(after_t, BTreeSet::from(["$".to_string(), "+".to_string()]));
        // After the final item only the parent follows remain.
        let after_t2 = a.follows(&g, &rule, 2, &parent);
        assert_eq!(after_t2, parent);
    }

    #[test]
    fn detects_direct_left_recursion() {
        let mut g = Grammar::new();
        g.rule("A").term("A").token("a");
        g.rule("A").token("b");
        let mut a = Analyzer::new();
        let cycle = a.find_first_left_recursion(&g).unwrap();
        assert_eq!(cycle, Some(vec!["A".to_string()]));
    }

    #[test]
    fn detects_indirect_left_recursion() {
        let mut g = Grammar::new();
        g.rule("A").term("B").token("a");
        g.rule("B").term("A").token("b");
        g.rule("B").token("c");
        let mut a = Analyzer::new();
        let cycle = a.find_first_left_recursion(&g).unwrap();
        assert_eq!(cycle, Some(vec!["A".to_string(), "B".to_string()]));
    }

    #[test]
    fn no_left_recursion_on_right_recursive_grammar() {
        let mut g = Grammar::new();
        g.rule("A").token("a").term("A");
        g.rule("A").token("b");
        let mut a = Analyzer::new();
        assert_eq!(a.find_first_left_recursion(&g).unwrap(), None);
    }

    #[test]
    fn invalidate_drops_stale_results() {
        let mut g = Grammar::new();
        g.rule("A").token("x");
        let mut a = Analyzer::new();
        assert_eq!(a.firsts(&g, "A"), ["x"]);
        g.rule("A").token("y");
        // Stale until invalidated.
        assert_eq!(a.firsts(&g, "A"), ["x"]);
        a.invalidate();
        assert_eq!(a.firsts(&g, "A"), ["x", "y"]);
    }
}
