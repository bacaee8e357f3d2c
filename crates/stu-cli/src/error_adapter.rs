//! Error adapter for converting CliError to miette diagnostics.
//!
//! This module provides the bridge between the library's error types and
//! miette's rich diagnostic formatting used in the CLI.
//!
//! # Trace Chains
//!
//! A [`stu_parser::Diagnostic`] is a chain of traces that may span several
//! files when `%include` is involved. Consecutive traces in the same file
//! are rendered as one report, with the first trace as the primary label
//! and the rest as secondary labels. Each change of file starts a new
//! report.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, SourceSpan};

use stu_parser::{ErrorCode, ParseError, Position, Trace};

use crate::{error::CliError, sources::Sources};

/// Adapter for one run of same-file traces.
pub struct DiagnosticAdapter<'a> {
    /// `position: message` of the first trace
    header: String,
    code: Option<ErrorCode>,
    help: Option<&'a str>,
    /// Source code for displaying snippets
    source: Option<NamedSource<String>>,
    labels: Vec<LabeledSpan>,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create the adapter for `traces`, which must all point into the same
    /// source. `message` replaces the first trace's message in the header.
    fn new(message: &str, traces: &[Trace], sources: &Sources) -> Self {
        let Some((first, rest)) = traces.split_first() else {
            return Self {
                header: message.to_string(),
                code: None,
                help: None,
                source: None,
                labels: Vec::new(),
            };
        };

        let header = format!("{}: {message}", first.position());
        let Some(text) = sources.text(first.position()) else {
            return Self {
                header,
                code: None,
                help: None,
                source: None,
                labels: Vec::new(),
            };
        };

        let primary = (first.message() != message).then(|| first.message().to_string());
        let mut labels = vec![LabeledSpan::new_primary_with_span(
            primary,
            span_at(first.position(), text),
        )];
        labels.extend(rest.iter().map(|trace| {
            LabeledSpan::new_with_span(
                Some(trace.message().to_string()),
                span_at(trace.position(), text),
            )
        }));

        Self {
            header,
            code: None,
            help: None,
            source: Some(NamedSource::new(
                first.position().display_name(),
                text.to_string(),
            )),
            labels,
        }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("header", &self.header)
            .field("code", &self.code)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header)
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.code.map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help.map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source.as_ref().map(|s| s as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        if self.labels.is_empty() {
            return None;
        }
        Some(Box::new(self.labels.iter().cloned()))
    }
}

/// Adapter for [`CliError`] variants without source locations.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CliError::Io(_) => "stu::io",
            CliError::Config(_) => "stu::config",
            CliError::Parse { .. } => return None,
        };
        Some(Box::new(code))
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A rich diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

fn same_source(a: &Position, b: &Position) -> bool {
    a.kind() == b.kind() && a.name() == b.name()
}

/// A span of the character at `position`, or an empty span at the end.
fn span_at(position: &Position, text: &str) -> SourceSpan {
    let offset = position.offset().min(text.len());
    let len = text
        .get(offset..)
        .and_then(|rest| rest.chars().next())
        .map_or(0, char::len_utf8);
    SourceSpan::new(offset.into(), len)
}

/// Split a trace chain into one adapter per run of same-file traces.
///
/// The first adapter carries `message`, the code and the help text.
fn trace_adapters<'a>(
    message: &str,
    code: Option<ErrorCode>,
    help: Option<&'a str>,
    traces: &[Trace],
    sources: &Sources,
) -> Vec<DiagnosticAdapter<'a>> {
    let mut adapters: Vec<DiagnosticAdapter<'a>> = Vec::new();
    for run in traces.chunk_by(|a, b| same_source(a.position(), b.position())) {
        if adapters.is_empty() {
            adapters.push(DiagnosticAdapter::new(message, run, sources));
        } else if let Some(first) = run.first() {
            adapters.push(DiagnosticAdapter::new(first.message(), run, sources));
        }
    }

    if adapters.is_empty() {
        adapters.push(DiagnosticAdapter::new(message, &[], sources));
    }
    if let Some(main) = adapters.first_mut() {
        main.code = code;
        main.help = help;
    }
    adapters
}

/// Convert a [`CliError`] into a list of reportable errors.
///
/// For [`CliError::Parse`], this returns one [`Reportable`] for each run of
/// same-file traces, innermost first. For other error variants, this
/// returns a single [`Reportable`].
pub fn to_reportables(err: &CliError) -> Vec<Reportable<'_>> {
    let adapters = match err {
        CliError::Parse {
            err: ParseError::Logical(diag),
            sources,
        } => trace_adapters(
            diag.message(),
            diag.code(),
            diag.help(),
            diag.traces(),
            sources,
        ),
        CliError::Parse {
            err: fatal @ ParseError::Fatal { traces, .. },
            sources,
        } => trace_adapters(&fatal.to_string(), None, None, traces, sources),
        _ => return vec![Reportable::Error(ErrorAdapter(err))],
    };
    adapters.into_iter().map(Reportable::Diagnostic).collect()
}
