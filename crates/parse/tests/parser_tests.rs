//! End-to-end tests: grammar pipeline, tokenizer, and parser working
//! together.

use lariat_core::{normalize, Analyzer, Grammar, Log, StringScanner};
use lariat_parse::{compile, Builder, Matcher, Parser, Token, Tokenizer};
use pretty_assertions::assert_eq;

fn parser_without_normalizing(grammar: &Grammar) -> Parser {
    let mut analyzer = Analyzer::new();
    let builder = Builder::determine_states(grammar, &mut analyzer, None, true).unwrap();
    Parser::new(builder.build_table().unwrap())
}

fn plain_tokens(names: &[&str]) -> Vec<Token> {
    names
        .iter()
        .map(|n| Token::new(*n, *n, Default::default()))
        .collect()
}

fn token_texts(result: &lariat_parse::ParseResult) -> Vec<String> {
    result
        .tree
        .as_ref()
        .expect("parse tree")
        .tokens()
        .iter()
        .map(|t| t.text.clone())
        .collect()
}

/// Letters form identifiers; spaces are consumed.
fn letters_and_spaces() -> Tokenizer {
    let mut t = Tokenizer::new();
    t.state("start");
    t.on("start", Matcher::Range('a', 'z'), "id");
    t.on("id", Matcher::Range('a', 'z'), "id");
    t.bind("id", "id");
    t.on("start", Matcher::One(' '), "space");
    t.on("space", Matcher::One(' '), "space");
    t.bind("space", "space");
    t.consume("space");
    t
}

#[test]
fn left_recursion_elimination_preserves_the_parsed_input() {
    let mut g = Grammar::new();
    g.rule("A").term("A").token("a");
    g.rule("A").token("b");

    // LR construction handles the left-recursive original directly; parse
    // the same input before and after normalization and compare the
    // flattened terminal sequence.
    let direct = parser_without_normalizing(&g);
    let direct_result = direct.parse(plain_tokens(&["b", "a", "a"]));
    assert!(direct_result.success());

    assert!(normalize(&mut g, None).unwrap());
    let rewritten = parser_without_normalizing(&g);
    let rewritten_result = rewritten.parse(plain_tokens(&["b", "a", "a"]));
    assert!(rewritten_result.success());

    assert_eq!(token_texts(&direct_result), ["b", "a", "a"]);
    assert_eq!(token_texts(&rewritten_result), token_texts(&direct_result));

    // Inputs outside the language still fail after the rewrite.
    assert!(!rewritten.parse(plain_tokens(&["a", "b"])).success());
}

#[test]
fn tokenizer_consumed_tokens_never_reach_the_parser() {
    let t = letters_and_spaces();
    let tokens = t
        .tokenize_all(StringScanner::new("input", "a b"))
        .unwrap();
    let names: Vec<&str> = tokens.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["id", "id"]);

    let mut g = Grammar::new();
    g.rule("S").token("id").term("S");
    g.rule("S").token("id");
    let parser = compile(&mut g, None).unwrap();
    assert!(parser.parse(tokens).success());
}

#[test]
fn table_build_is_deterministic() {
    let build = || {
        let mut g = Grammar::new();
        g.rule("E").term("T");
        g.rule("E").token("(").term("E").token(")");
        g.rule("T").token("+").term("T").term("T'");
        g.rule("T").token("n").term("T'");
        g.rule("T'");
        g.rule("T'").token("+").token("n").term("T'");
        let mut analyzer = Analyzer::new();
        let builder = Builder::determine_states(&g, &mut analyzer, None, true).unwrap();
        (builder.to_string(), builder.build_table().unwrap().to_string())
    };
    let (states_a, table_a) = build();
    let (states_b, table_b) = build();
    assert_eq!(states_a, states_b);
    assert_eq!(table_a, table_b);
}

#[test]
fn expression_grammar_parses_through_the_whole_pipeline() {
    let mut g = Grammar::new();
    g.rule("E").term("T");
    g.rule("E").token("(").term("E").token(")");
    g.rule("T").token("+").term("T").term("T'");
    g.rule("T").token("n").term("T'");
    g.rule("T'");
    g.rule("T'").token("+").token("n").term("T'");
    let mut log = Log::new();
    let parser = compile(&mut g, Some(&mut log)).unwrap();
    assert!(!log.has_errors());

    for input in [
        vec!["n"],
        vec!["(", "n", ")"],
        vec!["+", "n"],
        vec!["n", "+", "n"],
        vec!["(", "n", "+", "n", ")"],
        vec!["(", "+", "n", "+", "n", ")"],
    ] {
        let result = parser.parse(plain_tokens(&input));
        assert!(result.success(), "failed to parse {:?}", input);
    }
    assert!(!parser.parse(plain_tokens(&["n", "+"])).success());
    assert!(!parser.parse(plain_tokens(&["(", "n"])).success());
}

#[test]
fn prompts_fire_during_traversal_with_recent_tokens() {
    let mut g = Grammar::new();
    g.rule("Pair")
        .token("id")
        .prompt("first")
        .token("id")
        .prompt("second");
    let parser = compile(&mut g, None).unwrap();

    let t = letters_and_spaces();
    let tokens = t
        .tokenize_all(StringScanner::new("input", "ab cd"))
        .unwrap();
    // The grammar wants token name "id"; the tokenizer produces it.
    let result = parser.parse(tokens);
    assert!(result.success());

    let mut fired = Vec::new();
    result.tree.as_ref().unwrap().process(|name, context| {
        let texts: Vec<String> = context.recent().iter().map(|t| t.text.clone()).collect();
        fired.push((name.to_string(), texts));
        context.reset();
    });
    assert_eq!(
        fired,
        vec![
            ("first".to_string(), vec!["ab".to_string()]),
            ("second".to_string(), vec!["cd".to_string()]),
        ]
    );
}

#[test]
fn table_serializes_for_introspection() {
    let mut g = Grammar::new();
    g.rule("E").token("n");
    let mut analyzer = Analyzer::new();
    let builder = Builder::determine_states(&g, &mut analyzer, None, true).unwrap();
    let table = builder.build_table().unwrap();
    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["productions"][0]["term"], "$start");
    assert_eq!(json["productions"][1]["term"], "E");
}

#[test]
fn conflicted_cells_resolve_to_first_declared_rule() {
    // Reduce/reduce ambiguity: both A and B match "x"; the first-declared
    // rule wins when conflicts are tolerated.
    let mut g = Grammar::new();
    g.rule("S").term("A");
    g.rule("S").term("B");
    g.rule("A").token("x");
    g.rule("B").token("x");
    let mut analyzer = Analyzer::new();
    let builder = Builder::determine_states(&g, &mut analyzer, None, true).unwrap();
    assert!(builder.find_conflict_point().is_some());
    let parser = Parser::new(builder.build_table().unwrap());
    let result = parser.parse(plain_tokens(&["x"]));
    assert!(result.success());
    let tree = result.tree.unwrap().to_string();
    assert!(tree.contains("<A>"), "expected first-declared rule, got:\n{tree}");
}

#[test]
fn error_tokens_flow_from_tokenizer_into_parse_errors() {
    let mut t = letters_and_spaces();
    t.set_error_token("error");
    let tokens = t
        .tokenize_all(StringScanner::new("input", "ab ? cd"))
        .unwrap();
    let names: Vec<&str> = tokens.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["id", "error", "id"]);

    // The grammar has no production for the error token, so the parse
    // records a positioned failure instead of panicking.
    let mut g = Grammar::new();
    g.rule("S").token("id").term("S");
    g.rule("S").token("id");
    let parser = compile(&mut g, None).unwrap();
    let result = parser.parse(tokens);
    assert!(!result.success());
    let error = &result.errors[0];
    assert!(error.message.contains("[error]"));
    assert_eq!(error.location.as_ref().unwrap().column, 4);
}
