//! Recursive descent parser for shell input
//!
//! The parser is driven one top-level unit at a time: each call to
//! [`Parser::parse_command`] yields the next `;`/`&`/newline-terminated
//! and-or list, reading continuation lines through the lexer as needed.
//!
//! Grammar (informal):
//!   unit          := and_or (';' | '&' | NEWLINE | EOF)
//!   and_or        := pipeline (('&&' | '||') linebreak pipeline)*
//!   pipeline      := '!'? command ('|' linebreak command)*
//!   command       := compound redirect* | function_def | simple_command
//!   compound      := if | for | while | until | case | '{' list '}' | '(' list ')'
//!   function_def  := NAME '(' ')' linebreak compound

use crate::ast::types::*;
use crate::parser::lexer::Lexer;
use crate::parser::source::{LineSource, StrSource};
use crate::parser::types::{ParseError, ParserState, Token, TokenKind, MAX_PARSER_DEPTH};

/// Result of one top-level parse
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    Command(ListItem),
    /// Empty line or comment
    Blank,
    EndOfInput,
}

pub struct Parser {
    lexer: Lexer,
    state: ParserState,
    peeked: Option<Token>,
    last_end: usize,
    depth: usize,
}

impl Parser {
    pub fn new(source: Box<dyn LineSource>) -> Self {
        Self {
            lexer: Lexer::new(source),
            state: ParserState::new(),
            peeked: None,
            last_end: 0,
            depth: 0,
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.lexer.set_verbose(verbose);
    }

    /// Parse the next top-level unit.
    pub fn parse_command(&mut self) -> Result<Unit, ParseError> {
        self.peeked = None;
        self.state.reset();
        self.depth = 0;
        self.lexer.begin_unit();

        let first = self.peek()?.clone();
        match first.kind {
            TokenKind::Eof => return Ok(Unit::EndOfInput),
            TokenKind::Newline => {
                self.advance()?;
                return Ok(Unit::Blank);
            }
            _ => {}
        }

        let command = self.parse_and_or()?;
        let end = self.last_end;
        let sep = self.peek()?.clone();
        let background = if sep.is_op("&") {
            true
        } else if sep.is_op(";") || sep.kind == TokenKind::Newline {
            false
        } else if sep.kind == TokenKind::Eof {
            return Ok(Unit::Command(AST::item(command, false, self.lexer.text(first.start, end))));
        } else {
            return Err(ParseError::unexpected(&sep));
        };
        self.advance()?;
        Ok(Unit::Command(AST::item(
            command,
            background,
            self.lexer.text(first.start, end),
        )))
    }

    /// Throw away the rest of the failed unit.
    pub fn recover(&mut self) {
        self.lexer.recover();
        self.state.reset();
        self.peeked = None;
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        if self.peeked.is_none() {
            let token = self.lexer.next_token(&mut self.state)?;
            self.peeked = Some(token);
        }
        match self.peeked.as_ref() {
            Some(token) => Ok(token),
            None => Err(ParseError::new("internal parser error", 0)),
        }
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        self.peek()?;
        let token = match self.peeked.take() {
            Some(token) => token,
            None => return Err(ParseError::new("internal parser error", 0)),
        };
        if !matches!(token.kind, TokenKind::Newline | TokenKind::Eof) {
            self.last_end = token.end;
        }
        Ok(token)
    }

    fn skip_newlines(&mut self) -> Result<(), ParseError> {
        while self.peek()?.kind == TokenKind::Newline {
            self.advance()?;
        }
        Ok(())
    }

    fn expect_reserved(&mut self, word: &str) -> Result<Token, ParseError> {
        let token = self.advance()?;
        if token.is_reserved(word) {
            Ok(token)
        } else {
            Err(ParseError::unexpected(&token))
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<Token, ParseError> {
        let token = self.advance()?;
        if token.is_op(op) {
            Ok(token)
        } else {
            Err(ParseError::unexpected(&token))
        }
    }

    fn parse_and_or(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_pipeline()?;
        loop {
            let token = self.peek()?;
            let op = if token.is_op("&&") {
                LogicalOp::And
            } else if token.is_op("||") {
                LogicalOp::Or
            } else {
                return Ok(left);
            };
            self.advance()?;
            self.skip_newlines()?;
            let right = self.parse_pipeline()?;
            left = AST::op(op, left, right);
        }
    }

    fn parse_pipeline(&mut self) -> Result<Node, ParseError> {
        let negated = if self.peek()?.is_reserved("!") {
            self.advance()?;
            true
        } else {
            false
        };

        let mut commands = vec![self.parse_command_node()?];
        while self.peek()?.is_op("|") {
            self.advance()?;
            self.skip_newlines()?;
            commands.push(self.parse_command_node()?);
        }

        if commands.len() == 1 && !negated {
            if let Some(command) = commands.pop() {
                return Ok(command);
            }
        }
        Ok(AST::pipeline(commands, negated))
    }

    fn parse_command_node(&mut self) -> Result<Node, ParseError> {
        self.depth += 1;
        if self.depth > MAX_PARSER_DEPTH {
            let line = self.peek()?.line;
            return Err(ParseError::new("nesting too deep", line));
        }
        let node = self.parse_command_inner();
        self.depth -= 1;
        node
    }

    fn parse_command_inner(&mut self) -> Result<Node, ParseError> {
        let token = self.peek()?.clone();
        let compound = match token.kind {
            TokenKind::ReservedWord => match token.text.as_str() {
                "if" => self.parse_if()?,
                "for" => self.parse_for()?,
                "while" | "until" => self.parse_loop()?,
                "case" => self.parse_case()?,
                "{" => self.parse_group()?,
                _ => return Err(ParseError::unexpected(&token)),
            },
            TokenKind::Operator if token.is_op("(") => self.parse_subshell()?,
            TokenKind::Name => return self.parse_function(),
            _ => return self.parse_simple_command(),
        };

        let redirects = self.parse_redirect_suffix()?;
        if redirects.is_empty() {
            Ok(compound)
        } else {
            Ok(Node::Compound(CompoundNode {
                command: Box::new(compound),
                redirects,
            }))
        }
    }

    fn is_redirect_start(token: &Token) -> bool {
        token.kind == TokenKind::IoNumber
            || (token.kind == TokenKind::Operator && RedirectOp::from_operator(&token.text).is_some())
    }

    fn parse_redirect_suffix(&mut self) -> Result<Vec<RedirectNode>, ParseError> {
        let mut redirects = Vec::new();
        while Self::is_redirect_start(self.peek()?) {
            redirects.push(self.parse_redirect()?);
        }
        Ok(redirects)
    }

    fn parse_redirect(&mut self) -> Result<RedirectNode, ParseError> {
        let mut token = self.advance()?;
        let fd = if token.kind == TokenKind::IoNumber {
            let fd = token
                .text
                .parse::<i32>()
                .map_err(|_| ParseError::new(format!("{}: bad file descriptor", token.text), token.line))?;
            token = self.advance()?;
            Some(fd)
        } else {
            None
        };
        let op = match RedirectOp::from_operator(&token.text) {
            Some(op) if token.kind == TokenKind::Operator => op,
            _ => return Err(ParseError::unexpected(&token)),
        };

        let target = self.advance()?;
        if !target.is_word() {
            return Err(ParseError::unexpected(&target));
        }
        let target = match target.heredoc {
            Some(doc) => RedirectTarget::HereDoc(HereDocNode {
                delimiter: target.text,
                body: doc.body,
                quoted: doc.quoted,
            }),
            None => RedirectTarget::Word(AST::word(target.text)),
        };
        Ok(RedirectNode { fd, op, target })
    }

    fn parse_simple_command(&mut self) -> Result<Node, ParseError> {
        let mut assignments = Vec::new();
        let mut name: Option<WordNode> = None;
        let mut args = Vec::new();
        let mut redirects = Vec::new();

        loop {
            let token = self.peek()?.clone();
            if Self::is_redirect_start(&token) {
                redirects.push(self.parse_redirect()?);
                continue;
            }
            match token.kind {
                TokenKind::AssignmentWord if name.is_none() => {
                    self.advance()?;
                    if let Some((var, value)) = token.text.split_once('=') {
                        assignments.push(AST::assignment(var, value));
                    }
                }
                TokenKind::Word | TokenKind::Name | TokenKind::AssignmentWord => {
                    self.advance()?;
                    match name {
                        None => name = Some(AST::word(token.text)),
                        Some(_) => args.push(AST::word(token.text)),
                    }
                }
                _ => break,
            }
        }

        if assignments.is_empty() && name.is_none() && redirects.is_empty() {
            return Err(ParseError::unexpected(self.peek()?));
        }
        Ok(AST::simple_command(assignments, name, args, redirects))
    }

    /// Does this token close the enclosing list?
    fn ends_list(token: &Token) -> bool {
        match token.kind {
            TokenKind::Eof => true,
            TokenKind::ReservedWord => matches!(
                token.text.as_str(),
                "then" | "else" | "elif" | "fi" | "do" | "done" | "esac" | "}"
            ),
            TokenKind::Operator => token.text == ")" || token.text == ";;",
            _ => false,
        }
    }

    fn parse_list(&mut self, allow_empty: bool) -> Result<CommandList, ParseError> {
        self.skip_newlines()?;
        let mut items = Vec::new();
        loop {
            let first = self.peek()?.clone();
            if Self::ends_list(&first) {
                break;
            }
            let command = self.parse_and_or()?;
            let end = self.last_end;
            let sep = self.peek()?.clone();
            let background = sep.is_op("&");
            items.push(AST::item(command, background, self.lexer.text(first.start, end)));
            if background || sep.is_op(";") || sep.kind == TokenKind::Newline {
                self.advance()?;
                self.skip_newlines()?;
            } else {
                break;
            }
        }
        if items.is_empty() && !allow_empty {
            return Err(ParseError::unexpected(self.peek()?));
        }
        Ok(items)
    }

    fn parse_if(&mut self) -> Result<Node, ParseError> {
        self.expect_reserved("if")?;
        let node = self.parse_if_tail()?;
        self.expect_reserved("fi")?;
        Ok(Node::If(node))
    }

    /// Condition, `then` branch and any `elif`/`else`, without the closing `fi`
    fn parse_if_tail(&mut self) -> Result<IfNode, ParseError> {
        let condition = self.parse_list(false)?;
        self.expect_reserved("then")?;
        let then_branch = self.parse_list(false)?;
        let else_branch = if self.peek()?.is_reserved("elif") {
            self.advance()?;
            Some(ElseBranch::Elif(Box::new(self.parse_if_tail()?)))
        } else if self.peek()?.is_reserved("else") {
            self.advance()?;
            Some(ElseBranch::Else(self.parse_list(false)?))
        } else {
            None
        };
        Ok(IfNode {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_do_group(&mut self) -> Result<CommandList, ParseError> {
        self.expect_reserved("do")?;
        let body = self.parse_list(false)?;
        self.expect_reserved("done")?;
        Ok(body)
    }

    fn parse_for(&mut self) -> Result<Node, ParseError> {
        self.expect_reserved("for")?;
        let var = self.advance()?;
        if var.kind != TokenKind::Name {
            return Err(ParseError::new(
                format!("`{}': not a valid identifier", var.text),
                var.line,
            ));
        }
        self.skip_newlines()?;

        let words = if self.peek()?.is_reserved("in") {
            self.advance()?;
            let mut words = Vec::new();
            while self.peek()?.is_word() {
                words.push(AST::word(self.advance()?.text));
            }
            let sep = self.advance()?;
            if !(sep.is_op(";") || sep.kind == TokenKind::Newline) {
                return Err(ParseError::unexpected(&sep));
            }
            Some(words)
        } else {
            if self.peek()?.is_op(";") {
                self.advance()?;
            }
            None
        };
        self.skip_newlines()?;
        let body = self.parse_do_group()?;
        Ok(Node::For(ForNode {
            variable: var.text,
            words,
            body,
        }))
    }

    fn parse_loop(&mut self) -> Result<Node, ParseError> {
        let keyword = self.advance()?;
        let condition = self.parse_list(false)?;
        let body = self.parse_do_group()?;
        let node = LoopNode { condition, body };
        if keyword.text == "until" {
            Ok(Node::Until(node))
        } else {
            Ok(Node::While(node))
        }
    }

    fn parse_case(&mut self) -> Result<Node, ParseError> {
        self.expect_reserved("case")?;
        let subject = self.advance()?;
        if !subject.is_word() {
            return Err(ParseError::unexpected(&subject));
        }
        self.skip_newlines()?;
        self.expect_reserved("in")?;
        self.skip_newlines()?;

        let mut items = Vec::new();
        loop {
            if self.peek()?.is_reserved("esac") {
                self.advance()?;
                break;
            }
            if self.peek()?.is_op("(") {
                self.advance()?;
            }
            let mut patterns = Vec::new();
            loop {
                let pattern = self.advance()?;
                if !pattern.is_word() {
                    return Err(ParseError::unexpected(&pattern));
                }
                patterns.push(PatternNode { raw: pattern.text });
                if self.peek()?.is_op("|") {
                    self.advance()?;
                } else {
                    break;
                }
            }
            self.expect_op(")")?;
            let body = self.parse_list(true)?;
            items.push(CaseItemNode { patterns, body });

            let token = self.peek()?.clone();
            if token.is_op(";;") {
                self.advance()?;
                self.skip_newlines()?;
            } else if !token.is_reserved("esac") {
                return Err(ParseError::unexpected(&token));
            }
        }

        Ok(Node::Case(CaseNode {
            subject: AST::word(subject.text),
            items,
        }))
    }

    fn parse_group(&mut self) -> Result<Node, ParseError> {
        self.expect_reserved("{")?;
        let body = self.parse_list(false)?;
        self.expect_reserved("}")?;
        Ok(Node::Group(body))
    }

    fn parse_subshell(&mut self) -> Result<Node, ParseError> {
        self.expect_op("(")?;
        let body = self.parse_list(false)?;
        self.expect_op(")")?;
        Ok(Node::Subshell(body))
    }

    fn parse_function(&mut self) -> Result<Node, ParseError> {
        let name = self.advance()?;
        if self.state.function_depth > 0 {
            return Err(ParseError::new(
                format!("{}: nested function definitions are not supported", name.text),
                name.line,
            ));
        }
        self.expect_op("(")?;
        self.expect_op(")")?;
        self.skip_newlines()?;

        let token = self.peek()?.clone();
        let is_compound = token.is_op("(")
            || (token.kind == TokenKind::ReservedWord
                && matches!(token.text.as_str(), "if" | "for" | "while" | "until" | "case" | "{"));
        if !is_compound {
            return Err(ParseError::unexpected(&token));
        }

        self.state.function_depth += 1;
        let body = self.parse_command_node();
        self.state.function_depth -= 1;
        Ok(Node::Func(FuncNode {
            name: name.text,
            body: Box::new(body?),
        }))
    }
}

/// Parse a complete text (command substitution bodies, tests).
pub fn parse_all(text: &str) -> Result<CommandList, ParseError> {
    let mut parser = Parser::new(Box::new(StrSource::new(text)));
    let mut items = Vec::new();
    loop {
        match parser.parse_command()? {
            Unit::Command(item) => items.push(item),
            Unit::Blank => {}
            Unit::EndOfInput => return Ok(items),
        }
    }
}
