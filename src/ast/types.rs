//! Abstract Syntax Tree (AST) Types for the shell
//!
//! This module defines the AST produced by the parser and walked by the
//! interpreter. Every compound node owns its children exclusively; there is
//! no sharing and no cycles.
//!
//! Words are kept as raw source text (quotes included). Expansion and quote
//! removal happen at evaluation time against the current environment.

use std::fmt;

// =============================================================================
// LISTS
// =============================================================================

/// One entry of a command list: an and-or list plus its terminator.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub command: Node,
    /// Terminated by `&`: run without waiting
    pub background: bool,
    /// Source text of the unit, used for job reports and `set -v`
    pub text: String,
}

/// A sequence of list items: a script body, a brace group, a loop body, ...
pub type CommandList = Vec<ListItem>;

// =============================================================================
// NODES
// =============================================================================

/// Union of every executable node kind
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    SimpleCommand(SimpleCommandNode),
    Pipeline(PipelineNode),
    Op(OpNode),
    If(IfNode),
    For(ForNode),
    While(LoopNode),
    Until(LoopNode),
    Case(CaseNode),
    /// `{ list; }`
    Group(CommandList),
    /// `( list )`
    Subshell(CommandList),
    /// A compound command carrying redirections: `{ ...; } > file`
    Compound(CompoundNode),
    Func(FuncNode),
}

/// A literal word, exactly as it appeared in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordNode {
    pub raw: String,
}

/// `NAME=value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentNode {
    pub name: String,
    pub value: WordNode,
}

/// `prefix-assignments* command-word? (argument | redirection)*`
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleCommandNode {
    pub assignments: Vec<AssignmentNode>,
    pub name: Option<WordNode>,
    pub args: Vec<WordNode>,
    pub redirects: Vec<RedirectNode>,
}

/// `cmd1 | cmd2 | cmd3`, optionally negated with `!`
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineNode {
    pub commands: Vec<Node>,
    pub negated: bool,
}

/// Conditional chaining operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And, // &&
    Or,  // ||
}

/// `left && right` / `left || right` (left-associative)
#[derive(Debug, Clone, PartialEq)]
pub struct OpNode {
    pub op: LogicalOp,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

/// if/elif/else/fi
#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    pub condition: CommandList,
    pub then_branch: CommandList,
    pub else_branch: Option<ElseBranch>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    Elif(Box<IfNode>),
    Else(CommandList),
}

/// `for NAME [in WORDS]; do BODY; done`
#[derive(Debug, Clone, PartialEq)]
pub struct ForNode {
    pub variable: String,
    /// None iterates the positional parameters
    pub words: Option<Vec<WordNode>>,
    pub body: CommandList,
}

/// while/until loops share one shape
#[derive(Debug, Clone, PartialEq)]
pub struct LoopNode {
    pub condition: CommandList,
    pub body: CommandList,
}

/// `case WORD in ITEMS esac`
#[derive(Debug, Clone, PartialEq)]
pub struct CaseNode {
    pub subject: WordNode,
    pub items: Vec<CaseItemNode>,
}

/// `pat1 | pat2 ) BODY ;;`
#[derive(Debug, Clone, PartialEq)]
pub struct CaseItemNode {
    pub patterns: Vec<PatternNode>,
    pub body: CommandList,
}

/// One alternative of a case item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternNode {
    pub raw: String,
}

/// Wrapper attaching redirections to a compound command
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundNode {
    pub command: Box<Node>,
    pub redirects: Vec<RedirectNode>,
}

/// `NAME () compound-command`
#[derive(Debug, Clone, PartialEq)]
pub struct FuncNode {
    pub name: String,
    pub body: Box<Node>,
}

// =============================================================================
// REDIRECTIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOp {
    Less,      // <
    Great,     // >
    DGreat,    // >>
    LessAnd,   // <&
    GreatAnd,  // >&
    LessGreat, // <>
    Clobber,   // >|
    DLess,     // <<
    DLessDash, // <<-
}

impl RedirectOp {
    pub fn from_operator(op: &str) -> Option<Self> {
        Some(match op {
            "<" => Self::Less,
            ">" => Self::Great,
            ">>" => Self::DGreat,
            "<&" => Self::LessAnd,
            ">&" => Self::GreatAnd,
            "<>" => Self::LessGreat,
            ">|" => Self::Clobber,
            "<<" => Self::DLess,
            "<<-" => Self::DLessDash,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::Great => ">",
            Self::DGreat => ">>",
            Self::LessAnd => "<&",
            Self::GreatAnd => ">&",
            Self::LessGreat => "<>",
            Self::Clobber => ">|",
            Self::DLess => "<<",
            Self::DLessDash => "<<-",
        }
    }

    /// The file descriptor used when no IO number is given
    pub fn default_fd(&self) -> i32 {
        match self {
            Self::Less | Self::LessAnd | Self::LessGreat | Self::DLess | Self::DLessDash => 0,
            Self::Great | Self::DGreat | Self::GreatAnd | Self::Clobber => 1,
        }
    }
}

/// `[n]op target`
#[derive(Debug, Clone, PartialEq)]
pub struct RedirectNode {
    pub fd: Option<i32>,
    pub op: RedirectOp,
    pub target: RedirectTarget,
}

impl RedirectNode {
    pub fn target_fd(&self) -> i32 {
        self.fd.unwrap_or_else(|| self.op.default_fd())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RedirectTarget {
    Word(WordNode),
    HereDoc(HereDocNode),
}

/// Body captured for `<<WORD` / `<<-WORD`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HereDocNode {
    pub delimiter: String,
    pub body: String,
    /// Delimiter was quoted: the body is taken literally
    pub quoted: bool,
}

// =============================================================================
// DISPLAY
// =============================================================================

impl fmt::Display for WordNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Display for RedirectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(fd) = self.fd {
            write!(f, "{}", fd)?;
        }
        match &self.target {
            RedirectTarget::Word(w) => write!(f, "{}{}", self.op.as_str(), w),
            RedirectTarget::HereDoc(h) => write!(f, "{}{}", self.op.as_str(), h.delimiter),
        }
    }
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

/// Factory helpers used by the parser and tests
pub struct AST;

impl AST {
    pub fn word(raw: impl Into<String>) -> WordNode {
        WordNode { raw: raw.into() }
    }

    pub fn assignment(name: impl Into<String>, value: impl Into<String>) -> AssignmentNode {
        AssignmentNode {
            name: name.into(),
            value: Self::word(value),
        }
    }

    pub fn simple_command(
        assignments: Vec<AssignmentNode>,
        name: Option<WordNode>,
        args: Vec<WordNode>,
        redirects: Vec<RedirectNode>,
    ) -> Node {
        Node::SimpleCommand(SimpleCommandNode {
            assignments,
            name,
            args,
            redirects,
        })
    }

    pub fn pipeline(commands: Vec<Node>, negated: bool) -> Node {
        Node::Pipeline(PipelineNode { commands, negated })
    }

    pub fn op(op: LogicalOp, left: Node, right: Node) -> Node {
        Node::Op(OpNode {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn item(command: Node, background: bool, text: impl Into<String>) -> ListItem {
        ListItem {
            command,
            background,
            text: text.into(),
        }
    }
}
