//! The rule AST produced by the parser.
//!
//! A build script is an ordered list of [`Rule`]s. Dependencies form a
//! tree only through [`Dependency::Dynamic`]; the dependencies of one
//! rule are otherwise a flat list.

use std::fmt;

use bitflags::bitflags;

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    format::{name_word, prefix_word},
    name::ParamName,
    position::Position,
    tokens::Command,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    File,
    Phony,
}

/// What a rule builds or a dependency refers to.
#[derive(Debug, Clone)]
pub struct Target {
    pub kind: TargetKind,
    pub name: ParamName,
    /// The `@` of a phony target, otherwise the name
    pub position: Position,
}

impl Target {
    pub fn new(kind: TargetKind, name: ParamName, position: Position) -> Self {
        Self {
            kind,
            name,
            position,
        }
    }

    pub fn file(name: ParamName) -> Self {
        let position = name.position().clone();
        Self::new(TargetKind::File, name, position)
    }

    pub fn is_phony(&self) -> bool {
        self.kind == TargetKind::Phony
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

impl Eq for Target {}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_phony() {
            f.write_str("@")?;
        }
        write!(f, "{}", self.name)
    }
}

bitflags! {
    /// Dependency flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FlagBits: u8 {
        /// Written as `$[...]`; the content of the file is used as a value
        const VARIABLE = 1 << 0;
        /// Prefixed with `!`; only the existence of the target matters
        const EXISTENCE = 1 << 1;
        /// Prefixed with `?`; the target may be absent
        const OPTIONAL = 1 << 2;
    }
}

const FLAG_COUNT: usize = 3;

fn flag_index(flag: FlagBits) -> usize {
    flag.bits().trailing_zeros() as usize
}

/// Flags, each with the position that introduced it.
///
/// Equality compares the flags only.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    bits: FlagBits,
    positions: [Option<Position>; FLAG_COUNT],
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits(&self) -> FlagBits {
        self.bits
    }

    pub fn contains(&self, flag: FlagBits) -> bool {
        self.bits.contains(flag)
    }

    /// Set a single flag, replacing its previous position.
    pub fn set(&mut self, flag: FlagBits, position: Position) {
        self.bits.insert(flag);
        self.positions[flag_index(flag)] = Some(position);
    }

    /// Builder-style [`Flags::set`].
    pub fn with(mut self, flag: FlagBits, position: Position) -> Self {
        self.set(flag, position);
        self
    }

    /// Where a single flag was introduced, if it is set.
    pub fn position(&self, flag: FlagBits) -> Option<&Position> {
        self.positions[flag_index(flag)].as_ref()
    }
}

impl PartialEq for Flags {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for Flags {}

/// A dependency on a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectDependency {
    pub flags: Flags,
    pub target: Target,
}

/// A dependency whose targets are listed in a file, written `[...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicDependency {
    pub flags: Flags,
    pub dependency: Box<Dependency>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    Direct(DirectDependency),
    Dynamic(DynamicDependency),
}

impl Dependency {
    pub fn direct(target: Target) -> Self {
        Dependency::Direct(DirectDependency {
            flags: Flags::new(),
            target,
        })
    }

    /// Wrap `dependency` one dynamic level deeper.
    pub fn dynamic(dependency: Dependency) -> Self {
        Dependency::Dynamic(DynamicDependency {
            flags: Flags::new(),
            dependency: Box::new(dependency),
        })
    }

    pub fn flags(&self) -> &Flags {
        match self {
            Dependency::Direct(direct) => &direct.flags,
            Dependency::Dynamic(dynamic) => &dynamic.flags,
        }
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        match self {
            Dependency::Direct(direct) => &mut direct.flags,
            Dependency::Dynamic(dynamic) => &mut dynamic.flags,
        }
    }

    /// Number of enclosing dynamic levels; zero for a direct dependency.
    pub fn depth(&self) -> usize {
        match self {
            Dependency::Direct(_) => 0,
            Dependency::Dynamic(dynamic) => dynamic.dependency.depth() + 1,
        }
    }

    /// The direct dependency inside all dynamic levels.
    pub fn innermost(&self) -> &DirectDependency {
        match self {
            Dependency::Direct(direct) => direct,
            Dependency::Dynamic(dynamic) => dynamic.dependency.innermost(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.innermost().target.position
    }
}

/// One target definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub target: Target,
    pub dependencies: Vec<Dependency>,
    pub command: Option<Command>,
    /// Written `>target`; the command's output goes to the target
    pub redirect_output: bool,
    /// The dependency written with `<`, fed to the command's input
    pub input: Option<ParamName>,
}

impl Rule {
    /// Build a rule, checking that every parameter used by a dependency
    /// also appears in the target.
    pub fn new(
        target: Target,
        dependencies: Vec<Dependency>,
        command: Option<Command>,
        redirect_output: bool,
        input: Option<ParamName>,
    ) -> Result<Self> {
        let used = dependencies
            .iter()
            .map(|dep| &dep.innermost().target.name)
            .chain(input.iter());

        for name in used {
            for parameter in name.parameters() {
                if !target.name.parameters().contains(parameter) {
                    return Err(Diagnostic::error(
                        parameter.position.clone(),
                        format!(
                            "parameter {} is not used",
                            prefix_word(&parameter.name, "$")
                        ),
                    )
                    .with_code(ErrorCode::E107)
                    .with_trace(
                        target.position.clone(),
                        format!("in target {}", name_word(&target.to_string())),
                    )
                    .into());
                }
            }
        }

        Ok(Self {
            target,
            dependencies,
            command,
            redirect_output,
            input,
        })
    }

    pub fn is_parametrized(&self) -> bool {
        self.target.name.is_parametrized()
    }
}

/// Writes one dependency, marking the rule's input with `<` once.
struct DependencyWriter<'r> {
    input: Option<&'r ParamName>,
}

impl DependencyWriter<'_> {
    fn write(&mut self, f: &mut fmt::Formatter<'_>, dep: &Dependency) -> fmt::Result {
        let flags = dep.flags();
        if flags.contains(FlagBits::EXISTENCE) && !flags.contains(FlagBits::VARIABLE) {
            f.write_str("!")?;
        }
        if flags.contains(FlagBits::OPTIONAL) {
            f.write_str("?")?;
        }

        match dep {
            Dependency::Dynamic(dynamic) => {
                f.write_str("[")?;
                self.write(f, &dynamic.dependency)?;
                f.write_str("]")
            }
            Dependency::Direct(direct) => {
                let is_input = direct.target.kind == TargetKind::File
                    && self.input == Some(&direct.target.name);
                if is_input {
                    self.input = None;
                }

                if flags.contains(FlagBits::VARIABLE) {
                    f.write_str("$[")?;
                    if flags.contains(FlagBits::EXISTENCE) {
                        f.write_str("!")?;
                    }
                    if is_input {
                        f.write_str("<")?;
                    }
                    write!(f, "{}]", direct.target.name)
                } else {
                    if is_input {
                        f.write_str("<")?;
                    }
                    write!(f, "{}", direct.target)
                }
            }
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DependencyWriter { input: None }.write(f, self)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.redirect_output {
            f.write_str(">")?;
        }
        write!(f, "{}", self.target)?;

        if !self.dependencies.is_empty() {
            f.write_str(":")?;
            let mut writer = DependencyWriter {
                input: self.input.as_ref(),
            };
            for dep in &self.dependencies {
                f.write_str(" ")?;
                writer.write(f, dep)?;
            }
        }

        match &self.command {
            Some(command) => write!(f, " {{{}}}", command.text),
            None => f.write_str(";"),
        }
    }
}
