//! Unit tests for the rule parser.
//!
//! Sources are scanned with an in-memory loader, so these tests also
//! exercise the positions the scanner attaches to tokens.

use crate::{
    ast::{Dependency, FlagBits, Rule, TargetKind},
    config::ParserConfig,
    error::{Diagnostic, ErrorCode, ParseError, Result},
    lexer::{Context, Scanner},
    name::ParamName,
    parser::{build_dependencies, build_file},
    position::Position,
    source::MemoryLoader,
    tokens::Token,
};

fn tokenize(source: &str) -> (Vec<Token>, Position) {
    let config = ParserConfig::default();
    let loader = MemoryLoader::new().with_file("main.stu", source);
    let mut tokens = Vec::new();
    let end = Scanner::new(&config, &loader)
        .tokenize_file(&mut tokens, Context::Source, "main.stu", None, None)
        .expect("Lexer should succeed");
    (tokens, end)
}

fn parse(source: &str) -> Result<Vec<Rule>> {
    let (tokens, end) = tokenize(source);
    build_file(&tokens, &end)
}

fn parse_one(source: &str) -> Rule {
    let mut rules = parse(source).unwrap_or_else(|e| panic!("Parser error for {source:?}: {e}"));
    assert_eq!(rules.len(), 1, "expected one rule for {source:?}");
    rules.remove(0)
}

fn parse_err(source: &str) -> Diagnostic {
    match parse(source) {
        Err(ParseError::Logical(diag)) => diag,
        other => panic!("Expected parsing of {source:?} to fail, got {other:?}"),
    }
}

/// Every trace as `line:column: message`.
fn trace_lines(diag: &Diagnostic) -> Vec<String> {
    diag.traces()
        .iter()
        .map(|t| format!("{}:{}: {}", t.position().line(), t.position().column(), t.message()))
        .collect()
}

fn dep_name(dep: &Dependency) -> &str {
    dep.innermost()
        .target
        .name
        .unparametrized()
        .expect("unparametrized dependency")
}

#[test]
fn test_simple_rule() {
    let rule = parse_one("target: dep1 dep2;");
    assert_eq!(rule.target.kind, TargetKind::File);
    assert_eq!(rule.target.name.unparametrized(), Some("target"));
    let names: Vec<&str> = rule.dependencies.iter().map(dep_name).collect();
    assert_eq!(names, vec!["dep1", "dep2"]);
    for dep in &rule.dependencies {
        assert_eq!(dep.flags().bits(), FlagBits::empty());
        assert_eq!(dep.depth(), 0);
    }
    assert!(rule.command.is_none());
    assert!(!rule.redirect_output);
    assert!(rule.input.is_none());
}

#[test]
fn test_phony_with_empty_body() {
    let rule = parse_one("@phony: ;");
    assert_eq!(rule.target.kind, TargetKind::Phony);
    assert_eq!(rule.target.name.unparametrized(), Some("phony"));
    assert_eq!(rule.target.position.column(), 0);
    assert!(rule.dependencies.is_empty());
    assert!(rule.command.is_none());
}

#[test]
fn test_rule_without_colon() {
    let rule = parse_one("a { touch a }");
    assert!(rule.dependencies.is_empty());
    assert_eq!(rule.command.map(|c| c.text), Some(" touch a ".to_string()));

    let rule = parse_one("b;");
    assert!(rule.command.is_none());
}

#[test]
fn test_redirections() {
    let rule = parse_one(">out: <in { cmd }");
    assert_eq!(rule.target.kind, TargetKind::File);
    assert_eq!(rule.target.name.unparametrized(), Some("out"));
    assert!(rule.redirect_output);
    assert_eq!(rule.input.as_ref().and_then(ParamName::unparametrized), Some("in"));
    assert_eq!(rule.command.as_ref().map(|c| c.text.trim()), Some("cmd"));
    assert_eq!(rule.dependencies.len(), 1);
    assert_eq!(dep_name(&rule.dependencies[0]), "in");
}

#[test]
fn test_multiple_rules_in_order() {
    let rules = parse("a: b;\nb { touch b }\n@c: a b;").unwrap();
    let targets: Vec<String> = rules.iter().map(|r| r.target.to_string()).collect();
    assert_eq!(targets, vec!["a", "b", "@c"]);
}

#[test]
fn test_duplicate_targets_are_kept() {
    let rules = parse("a: b;\na: c;").unwrap();
    assert_eq!(rules.len(), 2);
}

#[test]
fn test_empty_file() {
    assert!(parse("").unwrap().is_empty());
    assert!(parse("# only a comment\n").unwrap().is_empty());
}

#[test]
fn test_phony_dependency() {
    let rule = parse_one("all: @build prog;");
    let Dependency::Direct(direct) = &rule.dependencies[0] else {
        panic!("expected a direct dependency");
    };
    assert_eq!(direct.target.kind, TargetKind::Phony);
    assert_eq!(direct.target.position.column(), 5);
    assert_eq!(rule.dependencies[1].innermost().target.kind, TargetKind::File);
}

#[test]
fn test_group_is_spliced() {
    let rule = parse_one("a: (b (c d)) e;");
    let names: Vec<&str> = rule.dependencies.iter().map(dep_name).collect();
    assert_eq!(names, vec!["b", "c", "d", "e"]);
    assert!(rule.dependencies.iter().all(|d| d.depth() == 0));
}

#[test]
fn test_dynamic_dependencies() {
    let rule = parse_one("a: [b] [[c]] [d e];");
    let depths: Vec<usize> = rule.dependencies.iter().map(Dependency::depth).collect();
    assert_eq!(depths, vec![1, 2, 1, 1]);
    let names: Vec<&str> = rule.dependencies.iter().map(dep_name).collect();
    assert_eq!(names, vec!["b", "c", "d", "e"]);
}

#[test]
fn test_existence_flag_applies_to_group() {
    let rule = parse_one("a: !(b c) d;");
    assert!(rule.dependencies[0].flags().contains(FlagBits::EXISTENCE));
    assert!(rule.dependencies[1].flags().contains(FlagBits::EXISTENCE));
    assert!(!rule.dependencies[2].flags().contains(FlagBits::EXISTENCE));
    let position = rule.dependencies[1].flags().position(FlagBits::EXISTENCE);
    assert_eq!(position.map(Position::column), Some(3));
}

#[test]
fn test_flags_on_dynamic_wrapper() {
    let rule = parse_one("a: ?[b];");
    let Dependency::Dynamic(dynamic) = &rule.dependencies[0] else {
        panic!("expected a dynamic dependency");
    };
    assert!(dynamic.flags.contains(FlagBits::OPTIONAL));
    assert!(!dynamic.dependency.flags().contains(FlagBits::OPTIONAL));
}

#[test]
fn test_optional_and_existence_combine() {
    let rule = parse_one("a: ?!b;");
    let flags = rule.dependencies[0].flags();
    assert!(flags.contains(FlagBits::OPTIONAL | FlagBits::EXISTENCE));
}

#[test]
fn test_conflict_through_dynamic_is_not_checked() {
    assert!(parse("a: ![?b] ?[!c];").is_ok());
}

#[test]
fn test_variable_dependency() {
    let rule = parse_one("a: $[CFLAGS] $[!LIBS] { cc }");
    let flags = rule.dependencies[0].flags();
    assert!(flags.contains(FlagBits::VARIABLE));
    assert!(!flags.contains(FlagBits::EXISTENCE));
    assert_eq!(rule.dependencies[0].position().column(), 3);
    assert!(rule.dependencies[1].flags().contains(FlagBits::VARIABLE | FlagBits::EXISTENCE));
    assert_eq!(rule.dependencies[1].innermost().target.kind, TargetKind::File);
}

#[test]
fn test_variable_input_redirection() {
    let rule = parse_one("a: $[<x] { cat }");
    assert_eq!(rule.input.as_ref().and_then(ParamName::unparametrized), Some("x"));
}

#[test]
fn test_parametrized_rule() {
    let rule = parse_one("$name.o: $name.c { cc -c $name.c }");
    assert!(rule.is_parametrized());
    assert_eq!(rule.target.name.parameters()[0].name, "name");
}

#[test]
fn test_quoted_text_before_parameter() {
    let rule = parse_one("'list of '$x: [dir/$x.deps] { echo }");
    assert_eq!(rule.target.name.parameters()[0].name, "x");
    assert_eq!(rule.target.name.texts()[0], "list of ");

    // Inside double quotes `$x` is literal, so `$x` in the dependency is unused
    let diag = parse_err("\"list of $x\": [dir/$x.deps] { echo }");
    assert_eq!(diag.code(), Some(ErrorCode::E107));
}

#[test]
fn test_display_round_trip() {
    let sources = [
        "a: b c;",
        "@all: ?@x !y [list];",
        ">out: <in { cat }",
        "a: $[!V] $[<W] { x }",
        "\"a b\".$x: ${x}c;",
        "a: ?(b [c]) !(d);",
    ];
    for source in sources {
        let rules = parse(source).unwrap();
        let printed: Vec<String> = rules.iter().map(ToString::to_string).collect();
        let reparsed = parse(&printed.join("\n")).unwrap();
        assert_eq!(rules, reparsed, "round trip of {source:?}");
    }
}

#[test]
fn test_expected_a_rule() {
    let diag = parse_err("a: b;\n: c;");
    assert_eq!(diag.code(), Some(ErrorCode::E100));
    assert_eq!(trace_lines(&diag), vec!["2:0: expected a rule"]);
}

#[test]
fn test_target_followed_by_end() {
    let diag = parse_err("a");
    assert_eq!(diag.code(), Some(ErrorCode::E101));
    assert_eq!(
        trace_lines(&diag),
        vec!["1:1: expected a dependency or a command", "1:0: after target 'a'"]
    );
}

#[test]
fn test_missing_command_or_semicolon() {
    let diag = parse_err("a: b");
    assert_eq!(
        trace_lines(&diag),
        vec!["1:4: expected a command or ';'", "1:0: for target 'a'"]
    );

    let diag = parse_err("a: b :");
    assert_eq!(diag.code(), Some(ErrorCode::E100));
    assert_eq!(diag.message(), "expected a dependency, a command or ';'");

    let diag = parse_err("a b;");
    assert_eq!(diag.message(), "expected ':', a command or ';'");
}

#[test]
fn test_output_redirection_errors() {
    let diag = parse_err(">");
    assert_eq!(trace_lines(&diag), vec!["1:1: expected a filename", "1:0: after '>'"]);

    let diag = parse_err("> :");
    assert_eq!(trace_lines(&diag), vec!["1:2: expected a filename", "1:0: after '>'"]);

    let diag = parse_err(">@x { y }");
    assert_eq!(diag.code(), Some(ErrorCode::E103));
    assert_eq!(trace_lines(&diag), vec!["1:1: phony target is invalid", "1:0: after '>'"]);

    let diag = parse_err(">a: b;");
    assert_eq!(diag.code(), Some(ErrorCode::E103));
    assert_eq!(
        trace_lines(&diag),
        vec![
            "1:0: output redirection using '>' must not be used",
            "1:5: in rule without a command",
        ]
    );
}

#[test]
fn test_phony_target_errors() {
    let diag = parse_err("@");
    assert_eq!(
        trace_lines(&diag),
        vec!["1:1: expected the name of phony target", "1:0: after '@'"]
    );
    let diag = parse_err("@ ;");
    assert_eq!(diag.code(), Some(ErrorCode::E100));
}

#[test]
fn test_target_parameter_errors() {
    let diag = parse_err("a$x$y: ;");
    assert_eq!(diag.code(), Some(ErrorCode::E102));
    assert_eq!(
        diag.message(),
        "two parameters must be separated by at least one character"
    );

    let diag = parse_err("$x.$x: ;");
    assert_eq!(diag.code(), Some(ErrorCode::E102));
    assert_eq!(diag.message(), "target contains duplicate parameter '$x'");
}

#[test]
fn test_unused_parameter() {
    let diag = parse_err("lib.$a: src.$b;");
    assert_eq!(diag.code(), Some(ErrorCode::E107));
    assert_eq!(
        trace_lines(&diag),
        vec!["1:12: parameter '$b' is not used", "1:0: in target 'lib.${a}'"]
    );

    let diag = parse_err("x: [list.$p];");
    assert_eq!(diag.code(), Some(ErrorCode::E107));
}

#[test]
fn test_duplicate_input_redirection() {
    let diag = parse_err("a: <x <y { c }");
    assert_eq!(diag.code(), Some(ErrorCode::E104));
    assert_eq!(
        trace_lines(&diag),
        vec![
            "1:7: duplicate input redirection '<y'",
            "1:4: shadows previous input redirection '<x'",
        ]
    );

    let diag = parse_err("a: $[<x] <y { c }");
    assert_eq!(diag.code(), Some(ErrorCode::E104));
}

#[test]
fn test_input_redirection_without_command() {
    let diag = parse_err("a: <b;");
    assert_eq!(diag.code(), Some(ErrorCode::E105));
    assert_eq!(
        trace_lines(&diag),
        vec![
            "1:3: input redirection using '<' must not be used",
            "1:5: in rule without a command",
        ]
    );
}

#[test]
fn test_optional_after_input_redirection() {
    let diag = parse_err("a: <b ?c { x }");
    assert_eq!(diag.code(), Some(ErrorCode::E105));
    assert_eq!(
        trace_lines(&diag),
        vec![
            "1:3: input redirection using '<' must not be used",
            "1:6: in conjunction with optional dependencies using '?'",
        ]
    );

    let diag = parse_err("a: ?<b { x }");
    assert_eq!(diag.code(), Some(ErrorCode::E105));
}

#[test]
fn test_redirect_dependency_errors() {
    let diag = parse_err("a: <@b { x }");
    assert_eq!(trace_lines(&diag), vec!["1:4: expected a filename", "1:3: after '<'"]);

    let diag = parse_err("a: < ;");
    assert_eq!(diag.message(), "expected a filename");

    let diag = parse_err("a: @;");
    assert_eq!(
        trace_lines(&diag),
        vec!["1:4: expected the name of a phony target", "1:3: after '@'"]
    );
}

#[test]
fn test_unclosed_groups() {
    let diag = parse_err("a: (b;");
    assert_eq!(
        trace_lines(&diag),
        vec!["1:5: expected ')'", "1:3: for group started by '('"]
    );

    let diag = parse_err("a: [b");
    assert_eq!(diag.code(), Some(ErrorCode::E101));
    assert_eq!(
        trace_lines(&diag),
        vec!["1:5: expected ']'", "1:3: for group started by '['"]
    );
}

#[test]
fn test_variable_dependency_inside_group_is_rejected() {
    let diag = parse_err("a: ($[x]);");
    assert_eq!(
        trace_lines(&diag),
        vec!["1:4: expected ')'", "1:3: for group started by '('"]
    );

    let diag = parse_err("a: [$[x]];");
    assert_eq!(diag.code(), Some(ErrorCode::E100));
    assert_eq!(
        trace_lines(&diag),
        vec!["1:4: expected ']'", "1:3: for group started by '['"]
    );

    let diag = parse_err("a: ?($[x]);");
    assert_eq!(
        trace_lines(&diag),
        vec!["1:5: expected ')'", "1:4: for group started by '('"]
    );
}

#[test]
fn test_prefix_without_dependency() {
    let diag = parse_err("a: ! ;");
    assert_eq!(trace_lines(&diag), vec!["1:5: expected a dependency", "1:3: after '!'"]);

    let diag = parse_err("a: ?");
    assert_eq!(diag.code(), Some(ErrorCode::E101));
    assert_eq!(trace_lines(&diag), vec!["1:4: expected a dependency", "1:3: after '?'"]);
}

#[test]
fn test_variable_dependency_errors() {
    let diag = parse_err("a: $[] { x }");
    assert_eq!(trace_lines(&diag), vec!["1:5: expected a filename", "1:3: after '$['"]);

    let diag = parse_err("a: $[!] { x }");
    assert_eq!(trace_lines(&diag), vec!["1:6: expected a filename", "1:5: after '!'"]);

    let diag = parse_err("a: $[!<] { x }");
    assert_eq!(trace_lines(&diag), vec!["1:7: expected a filename", "1:6: after '<'"]);

    let diag = parse_err("a: $[x y] { x }");
    assert_eq!(
        trace_lines(&diag),
        vec!["1:7: expected ']'", "1:3: after opening '$['"]
    );

    let diag = parse_err("a: $[\"x=y\"] { x }");
    assert_eq!(diag.code(), Some(ErrorCode::E106));
    assert_eq!(diag.message(), "name of variable dependency must not contain '='");
}

#[test]
fn test_build_dependencies() {
    let (tokens, end) = tokenize("a [b] !c");
    let deps = build_dependencies(&tokens, &end).unwrap();
    assert_eq!(deps.len(), 3);
    assert_eq!(deps[1].depth(), 1);

    let (tokens, end) = tokenize("a ; b");
    let err = build_dependencies(&tokens, &end).unwrap_err();
    assert_eq!(err.diagnostic().map(Diagnostic::message), Some("expected a dependency"));

    let (tokens, end) = tokenize("<a");
    let err = build_dependencies(&tokens, &end).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::E105));
}

mod proptests {
    use proptest::{prelude::*, test_runner::TestCaseResult};

    use super::*;

    fn rule_strategy() -> impl Strategy<Value = String> {
        let name = "[a-z][a-z0-9_.]{0,5}";
        let dependency = prop_oneof![
            name.prop_map(|n| n),
            name.prop_map(|n| format!("!{n}")),
            name.prop_map(|n| format!("?{n}")),
            name.prop_map(|n| format!("[{n}]")),
            name.prop_map(|n| format!("@{n}")),
            name.prop_map(|n| format!("$[{n}]")),
        ];
        (
            name,
            proptest::bool::ANY,
            proptest::collection::vec(dependency, 0..5),
            proptest::bool::ANY,
        )
            .prop_map(|(target, phony, deps, command)| {
                let at = if phony { "@" } else { "" };
                let command = if command && !phony { " { true }" } else { ";" };
                format!("{at}{target}: {}{command}", deps.join(" "))
            })
    }

    fn check_generated_rule_parses(source: &str) -> TestCaseResult {
        let rules = parse(source).map_err(|e| TestCaseError::fail(format!("{source}: {e}")))?;
        prop_assert_eq!(rules.len(), 1);
        let reparsed = parse(&rules[0].to_string())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(rules, reparsed);
        Ok(())
    }

    proptest! {
        #[test]
        fn generated_rule_parses(source in rule_strategy()) {
            check_generated_rule_parses(&source)?;
        }
    }
}
