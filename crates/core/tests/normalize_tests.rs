//! Integration tests for the normalization pipeline and validation
//! inspections.

use lariat_core::{normalize, normalize_with_limit, Analyzer, Grammar, GrammarError, Log};
use pretty_assertions::assert_eq;

#[test]
fn normalization_reaches_a_fixed_point_and_stays_there() {
    let mut g = Grammar::new();
    g.rule("E").term("E"); // unproductive rule
    g.rule("E").term("W").token("x");
    g.rule("E").token("w").token("x"); // duplicate once W is inlined
    g.rule("W").token("w");
    assert!(normalize(&mut g, None).unwrap());
    let settled = g.to_string();
    assert!(!normalize(&mut g, None).unwrap());
    assert_eq!(g.to_string(), settled);
    assert!(g.find_term("W").is_none());
    assert_eq!(g.find_term("E").unwrap().rules().len(), 1);
}

#[test]
fn normalization_logs_what_it_did() {
    let mut g = Grammar::new();
    g.rule("E").term("E");
    g.rule("E").token("n");
    let mut log = Log::new();
    assert!(normalize(&mut g, Some(&mut log)).unwrap());
    assert!(!log.has_errors());
    assert!(log.to_string().contains("unproductive rule"));
}

#[test]
fn direct_left_recursion_is_rewritten() {
    let mut g = Grammar::new();
    g.rule("A").term("A").token("a");
    g.rule("A").token("b");
    assert!(normalize(&mut g, None).unwrap());
    assert_eq!(
        g.to_string(),
        "\
start: <A>
<A> := [b] <A'>
<A'> := lambda
<A'> := [a] <A'>
"
    );
    let mut a = Analyzer::new();
    assert_eq!(a.find_first_left_recursion(&g).unwrap(), None);
}

#[test]
fn indirect_left_recursion_is_rewritten() {
    let mut g = Grammar::new();
    g.rule("A").term("B").token("a");
    g.rule("B").term("A").token("b");
    g.rule("B").token("c");
    assert!(normalize(&mut g, None).unwrap());
    let mut a = Analyzer::new();
    assert_eq!(a.find_first_left_recursion(&g).unwrap(), None);
}

#[test]
fn oscillation_hits_the_loop_cap_instead_of_hanging() {
    // A grammar needing more restarts than the cap allows surfaces the
    // loop-limit failure rather than looping forever.
    let mut g = Grammar::new();
    g.rule("E").term("E");
    g.rule("E").token("b");
    g.rule("E").token("a");
    let err = normalize_with_limit(&mut g, None, 1).unwrap_err();
    assert!(matches!(err, GrammarError::NormalizeLoopLimit { limit: 1 }));
    assert_eq!(
        err.to_string(),
        "normalization exceeded 1 iterations without reaching a fixed point"
    );
}

#[test]
fn generated_tail_names_avoid_collisions() {
    let mut g = Grammar::new();
    g.rule("A").term("A").token("a");
    g.rule("A").token("b");
    // A' is already taken, has two rules, and is referenced twice, so no
    // earlier precept inlines it away before left recursion is removed.
    g.rule("A'").token("z");
    g.rule("A'").token("w");
    g.rule("A").term("A'").term("A'");
    assert!(normalize(&mut g, None).unwrap());
    let tail = g.find_term("A'1").expect("fresh tail term");
    assert!(tail.rules().iter().any(|r| r.is_lambda()));
}

#[test]
fn unreachable_symbols_fail_validation_by_name() {
    let mut g = Grammar::new();
    g.rule("E").token("n");
    g.rule("Z").token("n");
    let mut log = Log::new();
    let err = g.validate(&mut log).unwrap_err();
    match err {
        GrammarError::Validation { report } => {
            assert!(report.contains("unreachable term <Z>"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn validation_reports_every_problem_at_once() {
    let mut g = Grammar::new();
    g.set_start("E");
    g.rule("Z").token("n");
    g.prompt("silent");
    let mut log = Log::new();
    let err = g.validate(&mut log).unwrap_err();
    let report = err.to_string();
    assert!(report.contains("start term <E> has no rules"));
    assert!(report.contains("unreachable term <Z>"));
    assert!(report.contains("unreachable prompt {silent}"));
}
