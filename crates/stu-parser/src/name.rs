//! Parametrized names.
//!
//! A [`ParamName`] is literal text interleaved with named parameters, as in
//! `list.$name.${suffix}`. With N parameters the name is
//!
//! ```text
//! texts[0] parameters[0] texts[1] ... parameters[N-1] texts[N]
//! ```
//!
//! Names are matched against concrete names to find the rule that builds a
//! target, and instantiated with a parameter mapping to produce concrete
//! names again.

use std::fmt;

use indexmap::IndexMap;

use crate::{format::source_text, position::Position};

/// A parameter inside a [`ParamName`].
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    /// Position of the `$`
    pub position: Position,
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Parameter {}

/// A name made of literal texts and parameters.
///
/// Equality compares texts and parameter names only; positions are ignored.
#[derive(Debug, Clone)]
pub struct ParamName {
    /// Always one more than `parameters`
    texts: Vec<String>,
    parameters: Vec<Parameter>,
    position: Position,
}

/// The result of matching a concrete name against a [`ParamName`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMatch {
    /// Parameter values in the order the parameters appear in the name
    pub mapping: IndexMap<String, String>,
    pub anchoring: Anchoring,
}

/// Byte ranges of a matched name covered by parameters.
///
/// Stored as `[begin_0, end_0, begin_1, end_1, ...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchoring(Vec<usize>);

impl ParamName {
    /// An empty, unparametrized name.
    pub fn new(position: Position) -> Self {
        Self {
            texts: vec![String::new()],
            parameters: Vec::new(),
            position,
        }
    }

    /// An unparametrized name.
    pub fn from_text(text: impl Into<String>, position: Position) -> Self {
        Self {
            texts: vec![text.into()],
            parameters: Vec::new(),
            position,
        }
    }

    /// Append literal text to the last text segment.
    pub fn push_text(&mut self, text: &str) {
        if let Some(last) = self.texts.last_mut() {
            last.push_str(text);
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(last) = self.texts.last_mut() {
            last.push(c);
        }
    }

    /// Append a parameter followed by an empty text segment. The result is
    /// not validated.
    pub fn push_parameter(&mut self, name: impl Into<String>, position: Position) {
        self.parameters.push(Parameter {
            name: name.into(),
            position,
        });
        self.texts.push(String::new());
    }

    /// Whether the name has no parameters and no text.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.texts[0].is_empty()
    }

    pub fn is_parametrized(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The name as plain text, when it has no parameters.
    pub fn unparametrized(&self) -> Option<&str> {
        if self.is_parametrized() {
            None
        } else {
            Some(&self.texts[0])
        }
    }

    /// The first two parameters with no text between them.
    pub fn unseparated_parameters(&self) -> Option<(&Parameter, &Parameter)> {
        (1..self.parameters.len())
            .find(|&i| self.texts[i].is_empty())
            .map(|i| (&self.parameters[i - 1], &self.parameters[i]))
    }

    /// The first repeated occurrence of a parameter.
    pub fn duplicate_parameter(&self) -> Option<&Parameter> {
        self.parameters.iter().enumerate().find_map(|(i, param)| {
            self.parameters[..i]
                .iter()
                .any(|seen| seen.name == param.name)
                .then_some(param)
        })
    }

    /// Substitute every parameter with its value from `mapping`. Returns
    /// `None` when a parameter has no value.
    pub fn instantiate(&self, mapping: &IndexMap<String, String>) -> Option<String> {
        let mut out = self.texts[0].clone();
        for (param, text) in self.parameters.iter().zip(&self.texts[1..]) {
            out.push_str(mapping.get(&param.name)?);
            out.push_str(text);
        }
        Some(out)
    }

    /// Match a concrete name against this name.
    ///
    /// Every parameter must match at least one character. Matching is a
    /// single left-to-right pass without backtracking: each inner text
    /// matches at its first occurrence, and the last text must match the
    /// end of `name`.
    pub fn matches(&self, name: &str) -> Option<NameMatch> {
        let n = self.parameters.len();
        if n == 0 {
            return (name == self.texts[0]).then(NameMatch::default);
        }

        let first = &self.texts[0];
        if name.len() <= first.len() || !name.starts_with(first.as_str()) {
            return None;
        }

        let mut mapping = IndexMap::new();
        let mut anchors = Vec::with_capacity(2 * n);
        let mut p = first.len();
        anchors.push(p);

        for i in 0..n {
            let param = &self.parameters[i].name;
            if i == n - 1 {
                let last = &self.texts[n];
                if name.len() - p < last.len() + 1 || !name.ends_with(last.as_str()) {
                    return None;
                }
                let end = name.len() - last.len();
                mapping.insert(param.clone(), name[p..end].to_string());
                anchors.push(end);
            } else {
                let text = &self.texts[i + 1];
                // Search from one past p so the parameter is never empty
                let from = p + name[p..].chars().next()?.len_utf8();
                let q = from + name[from..].find(text.as_str())?;
                mapping.insert(param.clone(), name[p..q].to_string());
                anchors.push(q);
                p = q + text.len();
                anchors.push(p);
            }
        }

        Some(NameMatch {
            mapping,
            anchoring: Anchoring(anchors),
        })
    }

    /// Raw rendering with `${param}` placeholders and no escaping.
    pub fn raw(&self) -> String {
        let mut out = self.texts[0].clone();
        for (param, text) in self.parameters.iter().zip(&self.texts[1..]) {
            out.push_str("${");
            out.push_str(&param.name);
            out.push('}');
            out.push_str(text);
        }
        out
    }
}

impl PartialEq for ParamName {
    fn eq(&self, other: &Self) -> bool {
        self.texts == other.texts && self.parameters == other.parameters
    }
}

impl Eq for ParamName {}

/// Source syntax that scans back to the same name.
impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_text = |f: &mut fmt::Formatter<'_>, text: &str| {
            if text.is_empty() {
                Ok(())
            } else {
                f.write_str(&source_text(text))
            }
        };
        if self.is_empty() {
            return f.write_str(&source_text(""));
        }
        write_text(f, &self.texts[0])?;
        for (param, text) in self.parameters.iter().zip(&self.texts[1..]) {
            write!(f, "${{{}}}", param.name)?;
            write_text(f, text)?;
        }
        Ok(())
    }
}

impl Anchoring {
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Whether `self` dominates `other`: every character inside a
    /// parameter of `self` is also inside a parameter of `other`, and at
    /// least one character is parametrized in `other` but not in `self`.
    /// The anchorings may have different numbers of parameters.
    pub fn dominates(&self, other: &Anchoring) -> bool {
        let (a, b) = (&self.0, &other.0);
        let (mut i, mut j, mut p) = (0, 0, 0);
        let mut dominate = false;

        loop {
            if i < a.len() && p == a[i] {
                i += 1;
            }
            if j < b.len() && p == b[j] {
                j += 1;
            }

            let in_a = i % 2 != 0;
            let in_b = j % 2 != 0;
            if !in_a && in_b {
                dominate = true;
            } else if in_a && !in_b {
                return false;
            }

            p = match (a.get(i), b.get(j)) {
                (None, None) => return dominate,
                (Some(&x), None) => x,
                (None, Some(&y)) => y,
                (Some(&x), Some(&y)) => x.min(y),
            };
        }
    }
}
