//! Syntax tree produced by the parser.

/// A parsed script, ready to run any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Name used for `$0` and in diagnostics.
    pub name: String,
    /// Top-level statements.
    pub body: List,
}

/// A sequence of and-or lists separated by `;` or newlines.
pub type List = Vec<AndOr>;

/// How two pipelines in an and-or list are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// `pipeline [&& pipeline | || pipeline]...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndOr {
    /// The first pipeline.
    pub first: Pipeline,
    /// Remaining pipelines with the connector that precedes each.
    pub rest: Vec<(Connector, Pipeline)>,
}

/// A single command, optionally negated with `!`.
///
/// Multi-stage `|` pipelines are rejected by the parser, so a pipeline
/// always wraps exactly one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    /// Whether the status is inverted.
    pub negated: bool,
    /// The command.
    pub command: Command,
}

/// A simple or compound command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `NAME=value... word... [redirections]`
    Simple(SimpleCommand),
    /// `if ...; then ...; [elif ...; then ...;] [else ...;] fi`
    If {
        /// Condition/body pairs for `if` and every `elif`.
        branches: Vec<(List, List)>,
        /// The `else` body.
        otherwise: Option<List>,
    },
    /// `while`/`until ...; do ...; done`
    Loop {
        /// `true` for `until`.
        until: bool,
        /// Loop condition.
        cond: List,
        /// Loop body.
        body: List,
    },
    /// `for NAME [in WORDS]; do ...; done`
    For {
        /// Loop variable.
        var: String,
        /// Items; `None` iterates the positional parameters.
        items: Option<Vec<Word>>,
        /// Loop body.
        body: List,
    },
    /// `{ ...; }`
    Group(List),
    /// `( ... )`
    Subshell(List),
}

/// A command name with arguments, assignments and redirections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleCommand {
    /// Leading `NAME=value` words.
    pub assigns: Vec<Assign>,
    /// Command name and arguments.
    pub words: Vec<Word>,
    /// Redirections in source order.
    pub redirects: Vec<Redirect>,
}

/// `NAME=value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assign {
    /// Variable name.
    pub name: String,
    /// Unexpanded value.
    pub value: Word,
}

/// The kind of redirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOp {
    /// `<`
    Read,
    /// `>`
    Write,
    /// `>>`
    Append,
    /// `>&`
    Duplicate,
}

/// `[fd]op target`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// File descriptor being redirected (0, 1 or 2).
    pub fd: u8,
    /// Operator.
    pub op: RedirectOp,
    /// Target path, or descriptor number for `>&`.
    pub target: Word,
}

/// A word made of literal and expandable parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Word {
    /// Parts in source order.
    pub parts: Vec<WordPart>,
}

impl Word {
    /// Returns the word's text if it consists of a single unquoted literal.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [WordPart::Literal(text)] => Some(text),
            _ => None,
        }
    }
}

/// One segment of a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordPart {
    /// Unquoted literal text.
    Literal(String),
    /// `'...'`
    SingleQuoted(String),
    /// `"..."`; contains only literals and parameters.
    DoubleQuoted(Vec<WordPart>),
    /// `$...`
    Param(Param),
}

/// A parameter reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// `$name` / `${name}`
    Named(String),
    /// `$0`..`$9` / `${N}`
    Positional(usize),
    /// `$@`
    All,
    /// `$*`
    Joined,
    /// `$#`
    Count,
    /// `$?`
    Status,
    /// `$$`
    ProcessId,
}
