//! Parser for Stu source tokens.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer)
//! into the rule AST defined in [`ast`](super::ast). The public entry
//! points are [`build_file`] and [`build_dependencies`].
//!
//! Each production either matches, leaving the cursor after what it
//! consumed, or reports that nothing matched without consuming anything.
//! Once part of a construct is recognized, failing to complete it is an
//! error.

use log::debug;
use winnow::{
    Parser as _,
    error::ModalResult,
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    ast::{Dependency, DirectDependency, FlagBits, Flags, Rule, Target, TargetKind},
    error::{Diagnostic, ErrorCode, Result},
    format::{name_word, prefix_word},
    name::ParamName,
    position::Position,
    tokens::{Command, Operator, Token},
};

type Input<'t> = TokenSlice<'t, Token>;

/// The `<` dependency of the rule being parsed.
struct InputRedirect<'t> {
    /// The `<`
    position: &'t Position,
    name: &'t ParamName,
}

struct Parser<'t> {
    input: Input<'t>,
    end: &'t Position,
    redirect: Option<InputRedirect<'t>>,
}

/// Parse a whole build script.
///
/// `end` is the position of the end of input, reported when tokens run
/// out in the middle of a rule. Rules are returned in source order and
/// are not checked for unique targets.
///
/// # Example
///
/// ```
/// # use stu_parser::{Context, MemoryLoader, ParserConfig, Scanner, build_file};
///
/// let config = ParserConfig::default();
/// let loader = MemoryLoader::new().with_file("main.stu", "@all: prog;\nprog: main.o { cc main.o }");
/// let mut tokens = Vec::new();
/// let end = Scanner::new(&config, &loader)
///     .tokenize_file(&mut tokens, Context::Source, "main.stu", None, None)
///     .unwrap();
///
/// let rules = build_file(&tokens, &end).unwrap();
/// assert_eq!(rules.len(), 2);
/// assert_eq!(rules[1].to_string(), "prog: main.o { cc main.o }");
/// ```
pub fn build_file(tokens: &[Token], end: &Position) -> Result<Vec<Rule>> {
    let mut parser = Parser::new(tokens, end);
    let mut rules = Vec::new();

    while let Some(token) = parser.input.peek_token() {
        match parser.rule()? {
            Some(rule) => rules.push(rule),
            None => {
                return Err(Diagnostic::error(token.position().clone(), "expected a rule")
                    .with_code(ErrorCode::E100)
                    .into());
            }
        }
    }

    debug!(rules = rules.len(); "Parsed rules");
    Ok(rules)
}

/// Parse a bare dependency list, as found in dynamic dependency files and
/// in the argument to the `-C` option.
///
/// Input redirection is not allowed outside of rules.
pub fn build_dependencies(tokens: &[Token], end: &Position) -> Result<Vec<Dependency>> {
    let mut parser = Parser::new(tokens, end);
    let mut dependencies = Vec::new();
    parser.dependency_list(&mut dependencies)?;

    if parser.input.peek_token().is_some() {
        return Err(parser.expected("expected a dependency").into());
    }
    if let Some(redirect) = &parser.redirect {
        return Err(Diagnostic::error(
            redirect.position.clone(),
            "input redirection using '<' must not be used",
        )
        .with_code(ErrorCode::E105)
        .into());
    }
    Ok(dependencies)
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token], end: &'t Position) -> Self {
        Self {
            input: TokenSlice::new(tokens),
            end,
            redirect: None,
        }
    }

    /// Consume the operator `op` if it is next.
    fn operator(&mut self, op: char) -> Option<&'t Operator> {
        let matched: ModalResult<&'t Operator> = any
            .verify_map(|token: &'t Token| match token {
                Token::Operator(operator) if operator.op == op => Some(operator),
                _ => None,
            })
            .parse_next(&mut self.input);
        matched.ok()
    }

    fn peek_operator(&self, op: char) -> bool {
        self.input.peek_token().is_some_and(|token| token.is_operator(op))
    }

    fn name(&mut self) -> Option<&'t ParamName> {
        let matched: ModalResult<&'t ParamName> =
            any.verify_map(Token::as_name).parse_next(&mut self.input);
        matched.ok()
    }

    fn command(&mut self) -> Option<&'t Command> {
        let matched: ModalResult<&'t Command> =
            any.verify_map(Token::as_command).parse_next(&mut self.input);
        matched.ok()
    }

    /// Error for something missing at the cursor, which may be the end of
    /// input.
    fn expected(&self, message: &str) -> Diagnostic {
        match self.input.peek_token() {
            Some(token) => Diagnostic::error(token.position().clone(), message)
                .with_code(ErrorCode::E100),
            None => Diagnostic::error(self.end.clone(), message).with_code(ErrorCode::E101),
        }
    }

    fn rule(&mut self) -> Result<Option<Rule>> {
        let starts_rule = self.input.peek_token().is_some_and(|token| {
            token.as_name().is_some() || token.is_operator('@') || token.is_operator('>')
        });
        if !starts_rule {
            return Ok(None);
        }
        self.redirect = None;

        let redirect_output = self.operator('>');
        let target = self.target(redirect_output)?;
        let target_word = name_word(&target.to_string());

        if self.input.peek_token().is_none() {
            return Err(self
                .expected("expected a dependency or a command")
                .with_trace(target.name.position().clone(), format!("after target {target_word}"))
                .into());
        }

        let colon = self.operator(':').is_some();
        let mut dependencies = Vec::new();
        if colon {
            self.dependency_list(&mut dependencies)?;
        }

        let mut semicolon = None;
        let command = match self.command() {
            Some(command) => Some(command.clone()),
            None => match self.operator(';') {
                Some(op) => {
                    semicolon = Some(&op.position);
                    None
                }
                None => {
                    let message = match (self.input.peek_token(), colon) {
                        (None, _) => "expected a command or ';'",
                        (Some(_), true) => "expected a dependency, a command or ';'",
                        (Some(_), false) => "expected ':', a command or ';'",
                    };
                    return Err(self
                        .expected(message)
                        .with_trace(
                            target.name.position().clone(),
                            format!("for target {target_word}"),
                        )
                        .into());
                }
            },
        };

        if let Some(semicolon) = semicolon {
            if let Some(op) = redirect_output {
                return Err(Diagnostic::error(
                    op.position.clone(),
                    "output redirection using '>' must not be used",
                )
                .with_code(ErrorCode::E103)
                .with_trace(semicolon.clone(), "in rule without a command")
                .into());
            }
            if let Some(redirect) = &self.redirect {
                return Err(Diagnostic::error(
                    redirect.position.clone(),
                    "input redirection using '<' must not be used",
                )
                .with_code(ErrorCode::E105)
                .with_trace(semicolon.clone(), "in rule without a command")
                .into());
            }
        }

        let input = self.redirect.take().map(|redirect| redirect.name.clone());
        Rule::new(
            target,
            dependencies,
            command,
            redirect_output.is_some(),
            input,
        )
        .map(Some)
    }

    /// The target of a rule, after an optional `>`.
    fn target(&mut self, redirect_output: Option<&'t Operator>) -> Result<Target> {
        let after_output = |diag: Diagnostic| match redirect_output {
            Some(op) => diag.with_trace(op.position.clone(), "after '>'"),
            None => diag,
        };

        if self.input.peek_token().is_none() {
            return Err(after_output(self.expected("expected a filename")).into());
        }

        let target = if let Some(at) = self.operator('@') {
            if let Some(op) = redirect_output {
                return Err(Diagnostic::error(at.position.clone(), "phony target is invalid")
                    .with_code(ErrorCode::E103)
                    .with_trace(op.position.clone(), "after '>'")
                    .into());
            }
            let Some(name) = self.name() else {
                return Err(self
                    .expected("expected the name of phony target")
                    .with_trace(at.position.clone(), "after '@'")
                    .into());
            };
            Target::new(TargetKind::Phony, name.clone(), at.position.clone())
        } else {
            let Some(name) = self.name() else {
                return Err(after_output(self.expected("expected a filename")).into());
            };
            Target::file(name.clone())
        };

        if target.name.unseparated_parameters().is_some() {
            return Err(Diagnostic::error(
                target.position.clone(),
                "two parameters must be separated by at least one character",
            )
            .with_code(ErrorCode::E102)
            .with_trace(
                target.name.position().clone(),
                format!("in target {}", name_word(&target.to_string())),
            )
            .into());
        }
        if let Some(parameter) = target.name.duplicate_parameter() {
            return Err(Diagnostic::error(
                target.position.clone(),
                format!(
                    "target contains duplicate parameter {}",
                    prefix_word(&parameter.name, "$")
                ),
            )
            .with_code(ErrorCode::E102)
            .into());
        }

        Ok(target)
    }

    fn dependency_list(&mut self, out: &mut Vec<Dependency>) -> Result<()> {
        while self.dependency(out)? {}
        Ok(())
    }

    /// Parse one dependency into `out`. Returns whether anything matched.
    fn dependency(&mut self, out: &mut Vec<Dependency>) -> Result<bool> {
        if self.peek_operator('$') {
            let dependency = self.variable_dependency()?;
            out.push(dependency);
            return Ok(true);
        }
        self.single_expression(out)
    }

    /// `$[` [`!`] [`<`] NAME `]`
    fn variable_dependency(&mut self) -> Result<Dependency> {
        let Some(dollar) = self.operator('$') else {
            return Err(self.expected("expected '$['").into());
        };
        if self.operator('[').is_none() {
            return Err(self
                .expected("expected '['")
                .with_trace(dollar.position.clone(), "after '$'")
                .into());
        }

        let mut flags = Flags::new().with(FlagBits::VARIABLE, dollar.position.clone());
        let existence = self.operator('!');
        if let Some(op) = existence {
            flags.set(FlagBits::EXISTENCE, op.position.clone());
        }
        let input = self.operator('<');

        let Some(name) = self.name() else {
            let (position, context) = match (input, existence) {
                (Some(op), _) => (&op.position, "after '<'"),
                (None, Some(op)) => (&op.position, "after '!'"),
                (None, None) => (&dollar.position, "after '$['"),
            };
            return Err(self
                .expected("expected a filename")
                .with_trace(position.clone(), context)
                .into());
        };

        if let Some(op) = input {
            self.record_input(op, name)?;
        }

        if name.texts().iter().any(|text| text.contains('=')) {
            return Err(Diagnostic::error(
                name.position().clone(),
                "name of variable dependency must not contain '='",
            )
            .with_code(ErrorCode::E106)
            .into());
        }

        if self.operator(']').is_none() {
            return Err(self
                .expected("expected ']'")
                .with_trace(dollar.position.clone(), "after opening '$['")
                .into());
        }

        Ok(Dependency::Direct(DirectDependency {
            flags,
            target: Target::new(TargetKind::File, name.clone(), dollar.position.clone()),
        }))
    }

    fn single_expression(&mut self, out: &mut Vec<Dependency>) -> Result<bool> {
        for (open, close) in [('(', ')'), ('[', ']')] {
            let Some(op) = self.operator(open) else {
                continue;
            };
            // Groups hold plain expressions; `$[...]` is only allowed at the top level
            let mut inner = Vec::new();
            while self.single_expression(&mut inner)? {}
            if self.operator(close).is_none() {
                return Err(self
                    .expected(&format!("expected '{close}'"))
                    .with_trace(op.position.clone(), format!("for group started by '{open}'"))
                    .into());
            }
            if open == '[' {
                out.extend(inner.into_iter().map(Dependency::dynamic));
            } else {
                out.extend(inner);
            }
            return Ok(true);
        }

        for (prefix, flag) in [('!', FlagBits::EXISTENCE), ('?', FlagBits::OPTIONAL)] {
            let Some(op) = self.operator(prefix) else {
                continue;
            };
            let mut inner = Vec::new();
            if !self.single_expression(&mut inner)? {
                return Err(self
                    .expected("expected a dependency")
                    .with_trace(op.position.clone(), format!("after '{prefix}'"))
                    .into());
            }
            if flag == FlagBits::OPTIONAL {
                if let Some(redirect) = &self.redirect {
                    return Err(Diagnostic::error(
                        redirect.position.clone(),
                        "input redirection using '<' must not be used",
                    )
                    .with_code(ErrorCode::E105)
                    .with_trace(
                        op.position.clone(),
                        "in conjunction with optional dependencies using '?'",
                    )
                    .into());
                }
            }
            for dependency in &mut inner {
                dependency.flags_mut().set(flag, op.position.clone());
            }
            out.extend(inner);
            return Ok(true);
        }

        self.redirect_dependency(out)
    }

    /// [`<`] [`@`] NAME
    fn redirect_dependency(&mut self, out: &mut Vec<Dependency>) -> Result<bool> {
        let input = self.operator('<');
        if let Some(op) = input {
            if self.peek_operator('@') {
                return Err(self
                    .expected("expected a filename")
                    .with_trace(op.position.clone(), "after '<'")
                    .into());
            }
        }
        let phony = if input.is_none() {
            self.operator('@')
        } else {
            None
        };

        let Some(name) = self.name() else {
            if let Some(op) = input {
                return Err(self
                    .expected("expected a filename")
                    .with_trace(op.position.clone(), "after '<'")
                    .into());
            }
            if let Some(op) = phony {
                return Err(self
                    .expected("expected the name of a phony target")
                    .with_trace(op.position.clone(), "after '@'")
                    .into());
            }
            return Ok(false);
        };

        if let Some(op) = input {
            self.record_input(op, name)?;
        }

        let target = match phony {
            Some(op) => Target::new(TargetKind::Phony, name.clone(), op.position.clone()),
            None => Target::file(name.clone()),
        };
        out.push(Dependency::direct(target));
        Ok(true)
    }

    fn record_input(&mut self, op: &'t Operator, name: &'t ParamName) -> Result<()> {
        if let Some(previous) = &self.redirect {
            return Err(Diagnostic::error(
                name.position().clone(),
                format!(
                    "duplicate input redirection {}",
                    prefix_word(&name.raw(), "<")
                ),
            )
            .with_code(ErrorCode::E104)
            .with_trace(
                previous.name.position().clone(),
                format!(
                    "shadows previous input redirection {}",
                    prefix_word(&previous.name.raw(), "<")
                ),
            )
            .into());
        }
        self.redirect = Some(InputRedirect {
            position: &op.position,
            name,
        });
        Ok(())
    }
}
