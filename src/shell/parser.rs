//! Tokenizer and recursive-descent parser for the supported shell subset.

use thiserror::Error;

use super::ast::{
    AndOr, Assign, Command, Connector, List, Param, Pipeline, Program, Redirect, RedirectOp,
    SimpleCommand, Word, WordPart,
};

/// A syntax error, positioned at the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}:{line}:{col}: {message}")]
pub struct ParseError {
    /// Name of the source being parsed.
    pub name: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub col: usize,
    /// What went wrong.
    pub message: String,
}

/// Parses `source` into a runnable [`Program`].
///
/// # Errors
///
/// Returns a [`ParseError`] for invalid syntax or for constructs the engine
/// does not support (pipelines, background jobs, command substitution).
pub fn parse(source: &str, name: &str) -> Result<Program, ParseError> {
    let tokens = Lexer::new(source, name).tokenize()?;
    let mut parser = Parser { tokens, pos: 0, name };
    let body = parser.parse_list(&[])?;
    let tok = parser.peek();
    if tok.kind != TokenKind::Eof {
        let message = format!("unexpected {}", tok.kind.describe());
        return Err(parser.error_at(tok, message));
    }
    Ok(Program { name: name.to_string(), body })
}

const RESERVED: &[&str] = &["then", "elif", "else", "fi", "do", "done", "}"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Word(Word),
    Redirect { fd: Option<u8>, op: RedirectOp },
    Semi,
    DoubleSemi,
    And,
    Or,
    Pipe,
    Amp,
    LParen,
    RParen,
    Newline,
    Eof,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            Self::Word(word) => match word.as_literal() {
                Some(text) => format!("{text:?}"),
                None => "word".to_string(),
            },
            Self::Redirect { op, .. } => format!("`{}`", redirect_symbol(*op)),
            Self::Semi => "`;`".to_string(),
            Self::DoubleSemi => "`;;`".to_string(),
            Self::And => "`&&`".to_string(),
            Self::Or => "`||`".to_string(),
            Self::Pipe => "`|`".to_string(),
            Self::Amp => "`&`".to_string(),
            Self::LParen => "`(`".to_string(),
            Self::RParen => "`)`".to_string(),
            Self::Newline => "newline".to_string(),
            Self::Eof => "EOF".to_string(),
        }
    }
}

fn redirect_symbol(op: RedirectOp) -> &'static str {
    match op {
        RedirectOp::Read => "<",
        RedirectOp::Write => ">",
        RedirectOp::Append => ">>",
        RedirectOp::Duplicate => ">&",
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
    col: usize,
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    name: &'a str,
}

impl<'a> Lexer<'a> {
    fn new(source: &str, name: &'a str) -> Self {
        Self { chars: source.chars().collect(), pos: 0, line: 1, col: 1, name }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, col: usize, message: impl Into<String>) -> ParseError {
        ParseError { name: self.name.to_string(), line, col, message: message.into() }
    }

    fn skip_blanks(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('\\') if self.peek_at(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                }
                Some('#') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_blanks();
        let (line, col) = (self.line, self.col);
        let token = |kind| Token { kind, line, col };

        let Some(c) = self.peek() else {
            return Ok(token(TokenKind::Eof));
        };
        let kind = match c {
            '\n' => {
                self.bump();
                TokenKind::Newline
            }
            ';' => {
                self.bump();
                if self.peek() == Some(';') {
                    self.bump();
                    TokenKind::DoubleSemi
                } else {
                    TokenKind::Semi
                }
            }
            '&' => {
                self.bump();
                if self.peek() == Some('&') {
                    self.bump();
                    TokenKind::And
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                self.bump();
                if self.peek() == Some('|') {
                    self.bump();
                    TokenKind::Or
                } else {
                    TokenKind::Pipe
                }
            }
            '(' => {
                self.bump();
                TokenKind::LParen
            }
            ')' => {
                self.bump();
                TokenKind::RParen
            }
            '<' | '>' => self.redirect(None, line, col)?,
            _ => self.word(line, col)?,
        };
        Ok(token(kind))
    }

    fn redirect(&mut self, fd: Option<u8>, line: usize, col: usize) -> Result<TokenKind, ParseError> {
        let op = match self.bump() {
            Some('<') => {
                if self.peek() == Some('&') || self.peek() == Some('<') {
                    return Err(self.error(line, col, "here-documents and input duplication are not supported"));
                }
                RedirectOp::Read
            }
            _ => match self.peek() {
                Some('>') => {
                    self.bump();
                    RedirectOp::Append
                }
                Some('&') => {
                    self.bump();
                    RedirectOp::Duplicate
                }
                _ => RedirectOp::Write,
            },
        };
        Ok(TokenKind::Redirect { fd, op })
    }

    fn word(&mut self, line: usize, col: usize) -> Result<TokenKind, ParseError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut plain = true;

        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' | ';' | '&' | '|' | '(' | ')' | '<' | '>' => break,
                '\'' => {
                    plain = false;
                    flush(&mut literal, &mut parts);
                    let (qline, qcol) = (self.line, self.col);
                    self.bump();
                    let mut quoted = String::new();
                    loop {
                        match self.bump() {
                            Some('\'') => break,
                            Some(ch) => quoted.push(ch),
                            None => {
                                return Err(self.error(qline, qcol, "reached EOF without closing quote '"));
                            }
                        }
                    }
                    parts.push(WordPart::SingleQuoted(quoted));
                }
                '"' => {
                    plain = false;
                    flush(&mut literal, &mut parts);
                    let inner = self.double_quoted()?;
                    parts.push(WordPart::DoubleQuoted(inner));
                }
                '\\' => {
                    plain = false;
                    self.bump();
                    match self.bump() {
                        Some('\n') => {}
                        Some(ch) => literal.push(ch),
                        None => literal.push('\\'),
                    }
                }
                '`' => {
                    return Err(self.error(self.line, self.col, "command substitution is not supported"));
                }
                '$' => {
                    plain = false;
                    self.bump();
                    match self.param()? {
                        Some(param) => {
                            flush(&mut literal, &mut parts);
                            parts.push(WordPart::Param(param));
                        }
                        None => literal.push('$'),
                    }
                }
                _ => {
                    self.bump();
                    literal.push(c);
                }
            }
        }
        flush(&mut literal, &mut parts);

        let word = Word { parts };
        if plain && matches!(self.peek(), Some('<' | '>')) {
            if let Some(digits) = word.as_literal().filter(|t| t.chars().all(|c| c.is_ascii_digit())) {
                let fd = match digits.parse::<u8>() {
                    Ok(fd @ 0..=2) => fd,
                    _ => {
                        return Err(self.error(line, col, format!("unsupported file descriptor {digits}")));
                    }
                };
                return self.redirect(Some(fd), line, col);
            }
        }
        Ok(TokenKind::Word(word))
    }

    fn double_quoted(&mut self) -> Result<Vec<WordPart>, ParseError> {
        let (line, col) = (self.line, self.col);
        self.bump();
        let mut parts = Vec::new();
        let mut literal = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error(line, col, "reached EOF without closing quote \"")),
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some(ch @ ('$' | '`' | '"' | '\\')) => literal.push(ch),
                        Some('\n') => {}
                        Some(ch) => {
                            literal.push('\\');
                            literal.push(ch);
                        }
                        None => return Err(self.error(line, col, "reached EOF without closing quote \"")),
                    }
                }
                Some('`') => {
                    return Err(self.error(self.line, self.col, "command substitution is not supported"));
                }
                Some('$') => {
                    self.bump();
                    match self.param()? {
                        Some(param) => {
                            flush(&mut literal, &mut parts);
                            parts.push(WordPart::Param(param));
                        }
                        None => literal.push('$'),
                    }
                }
                Some(ch) => {
                    self.bump();
                    literal.push(ch);
                }
            }
        }
        flush(&mut literal, &mut parts);
        Ok(parts)
    }

    /// Reads the parameter after a consumed `$`. `None` means a literal `$`.
    fn param(&mut self) -> Result<Option<Param>, ParseError> {
        let (line, col) = (self.line, self.col.saturating_sub(1));
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let param = match c {
            '{' => {
                self.bump();
                let mut inner = String::new();
                loop {
                    match self.bump() {
                        Some('}') => break,
                        Some(ch) => inner.push(ch),
                        None => return Err(self.error(line, col, "reached EOF without matching ${ with }")),
                    }
                }
                braced_param(&inner)
                    .ok_or_else(|| self.error(line, col, format!("unsupported parameter expansion ${{{inner}}}")))?
            }
            '(' => return Err(self.error(line, col, "command substitution is not supported")),
            '@' => self.single(Param::All),
            '*' => self.single(Param::Joined),
            '#' => self.single(Param::Count),
            '?' => self.single(Param::Status),
            '$' => self.single(Param::ProcessId),
            d if d.is_ascii_digit() => {
                self.bump();
                Param::Positional(d as usize - '0' as usize)
            }
            ch if ch.is_ascii_alphabetic() || ch == '_' => {
                let mut name = String::new();
                while let Some(ch) = self.peek().filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_') {
                    self.bump();
                    name.push(ch);
                }
                Param::Named(name)
            }
            _ => return Ok(None),
        };
        Ok(Some(param))
    }

    fn single(&mut self, param: Param) -> Param {
        self.bump();
        param
    }
}

fn braced_param(inner: &str) -> Option<Param> {
    match inner {
        "@" => Some(Param::All),
        "*" => Some(Param::Joined),
        "#" => Some(Param::Count),
        "?" => Some(Param::Status),
        "$" => Some(Param::ProcessId),
        _ if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) => {
            inner.parse().ok().map(Param::Positional)
        }
        _ if is_name(inner) => Some(Param::Named(inner.to_string())),
        _ => None,
    }
}

/// Returns `true` if `text` is a valid variable name.
pub(crate) fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn flush(literal: &mut String, parts: &mut Vec<WordPart>) {
    if !literal.is_empty() {
        parts.push(WordPart::Literal(std::mem::take(literal)));
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    name: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        // The token list always ends with Eof and the parser never advances past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> ParseError {
        ParseError {
            name: self.name.to_string(),
            line: token.line,
            col: token.col,
            message: message.into(),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        self.error_at(self.peek(), message)
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Word(word) if word.as_literal() == Some(keyword))
    }

    fn at_stop(&self, stops: &[&str]) -> bool {
        stops.iter().any(|stop| self.is_keyword(stop))
    }

    fn expect_keyword(&mut self, keyword: &str, message: &str) -> Result<(), ParseError> {
        if self.is_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn parse_list(&mut self, stops: &[&str]) -> Result<List, ParseError> {
        let mut list = Vec::new();
        loop {
            self.skip_newlines();
            if self.at_stop(stops) || matches!(self.peek().kind, TokenKind::Eof | TokenKind::RParen) {
                break;
            }
            list.push(self.parse_and_or()?);
            match self.peek().kind.clone() {
                TokenKind::Semi | TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::Eof | TokenKind::RParen => break,
                TokenKind::Amp => return Err(self.error_here("background jobs are not supported")),
                TokenKind::Word(_) if self.at_stop(stops) => break,
                other => {
                    let message = format!("unexpected {}", other.describe());
                    return Err(self.error_here(message));
                }
            }
        }
        Ok(list)
    }

    fn parse_body(&mut self, stops: &[&str], keyword: &str) -> Result<List, ParseError> {
        let list = self.parse_list(stops)?;
        if list.is_empty() {
            return Err(self.error_here(format!("{keyword:?} must be followed by a statement list")));
        }
        Ok(list)
    }

    fn parse_and_or(&mut self) -> Result<AndOr, ParseError> {
        let first = self.parse_pipeline()?;
        let mut rest = Vec::new();
        loop {
            let connector = match self.peek().kind {
                TokenKind::And => Connector::And,
                TokenKind::Or => Connector::Or,
                _ => break,
            };
            self.advance();
            self.skip_newlines();
            rest.push((connector, self.parse_pipeline()?));
        }
        Ok(AndOr { first, rest })
    }

    fn parse_pipeline(&mut self) -> Result<Pipeline, ParseError> {
        let negated = self.is_keyword("!");
        if negated {
            self.advance();
        }
        let command = self.parse_command()?;
        if self.peek().kind == TokenKind::Pipe {
            return Err(self.error_here("pipelines are not supported"));
        }
        Ok(Pipeline { negated, command })
    }

    fn parse_command(&mut self) -> Result<Command, ParseError> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Word(word) => match word.as_literal() {
                Some("if") => self.parse_if(),
                Some("while") => self.parse_loop(false),
                Some("until") => self.parse_loop(true),
                Some("for") => self.parse_for(),
                Some("{") => {
                    self.advance();
                    let body = self.parse_body(&["}"], "{")?;
                    self.expect_keyword("}", "reached EOF without matching { with }")?;
                    Ok(Command::Group(body))
                }
                Some(keyword @ ("case" | "esac")) => {
                    Err(self.error_at(&token, format!("{keyword:?}: case statements are not supported")))
                }
                Some("function") => Err(self.error_at(&token, "functions are not supported")),
                Some(reserved) if RESERVED.contains(&reserved) => {
                    Err(self.error_at(&token, format!("unexpected reserved word {reserved:?}")))
                }
                _ => self.parse_simple(),
            },
            TokenKind::Redirect { .. } => self.parse_simple(),
            TokenKind::LParen => {
                self.advance();
                let body = self.parse_body(&[], "(")?;
                if self.peek().kind != TokenKind::RParen {
                    return Err(self.error_here("reached EOF without matching ( with )"));
                }
                self.advance();
                Ok(Command::Subshell(body))
            }
            TokenKind::Amp => Err(self.error_at(&token, "background jobs are not supported")),
            other => Err(self.error_at(&token, format!("unexpected {}", other.describe()))),
        }
    }

    fn parse_if(&mut self) -> Result<Command, ParseError> {
        self.advance();
        let mut branches = Vec::new();
        let cond = self.parse_body(&["then"], "if")?;
        self.expect_keyword("then", "\"if <cond>\" must be followed by \"then\"")?;
        let body = self.parse_body(&["elif", "else", "fi"], "then")?;
        branches.push((cond, body));

        let mut otherwise = None;
        loop {
            if self.is_keyword("elif") {
                self.advance();
                let cond = self.parse_body(&["then"], "elif")?;
                self.expect_keyword("then", "\"elif <cond>\" must be followed by \"then\"")?;
                let body = self.parse_body(&["elif", "else", "fi"], "then")?;
                branches.push((cond, body));
            } else if self.is_keyword("else") {
                self.advance();
                otherwise = Some(self.parse_body(&["fi"], "else")?);
                break;
            } else {
                break;
            }
        }
        self.expect_keyword("fi", "reached EOF without matching \"if\" with \"fi\"")?;
        Ok(Command::If { branches, otherwise })
    }

    fn parse_loop(&mut self, until: bool) -> Result<Command, ParseError> {
        let keyword = if until { "until" } else { "while" };
        self.advance();
        let cond = self.parse_body(&["do"], keyword)?;
        self.expect_keyword("do", &format!("\"{keyword} <cond>\" must be followed by \"do\""))?;
        let body = self.parse_body(&["done"], "do")?;
        self.expect_keyword("done", &format!("reached EOF without matching \"{keyword}\" with \"done\""))?;
        Ok(Command::Loop { until, cond, body })
    }

    fn parse_for(&mut self) -> Result<Command, ParseError> {
        self.advance();
        let var = match &self.peek().kind {
            TokenKind::Word(word) => word.as_literal().filter(|name| is_name(name)).map(str::to_string),
            _ => None,
        }
        .ok_or_else(|| self.error_here("\"for\" must be followed by a variable name"))?;
        self.advance();

        if self.peek().kind == TokenKind::Semi {
            self.advance();
        }
        self.skip_newlines();

        let mut items = None;
        if self.is_keyword("in") {
            self.advance();
            let mut words = Vec::new();
            while let TokenKind::Word(word) = &self.peek().kind {
                words.push(word.clone());
                self.advance();
            }
            match self.peek().kind {
                TokenKind::Semi | TokenKind::Newline => {
                    self.advance();
                }
                _ => return Err(self.error_here("\"for ... in\" word list must end with `;` or a newline")),
            }
            self.skip_newlines();
            items = Some(words);
        }

        self.expect_keyword("do", "\"for foo\" must be followed by \"do\"")?;
        let body = self.parse_body(&["done"], "do")?;
        self.expect_keyword("done", "reached EOF without matching \"for\" with \"done\"")?;
        Ok(Command::For { var, items, body })
    }

    fn parse_simple(&mut self) -> Result<Command, ParseError> {
        let mut command = SimpleCommand::default();
        loop {
            match self.peek().kind.clone() {
                TokenKind::Word(word) => {
                    self.advance();
                    match assignment(&word) {
                        Some(assign) if command.words.is_empty() => command.assigns.push(assign),
                        _ => command.words.push(word),
                    }
                }
                TokenKind::Redirect { fd, op } => {
                    self.advance();
                    let TokenKind::Word(target) = self.peek().kind.clone() else {
                        let message = format!("`{}` must be followed by a word", redirect_symbol(op));
                        return Err(self.error_here(message));
                    };
                    self.advance();
                    let fd = fd.unwrap_or(u8::from(op != RedirectOp::Read));
                    command.redirects.push(Redirect { fd, op, target });
                }
                _ => break,
            }
        }
        Ok(Command::Simple(command))
    }
}

fn assignment(word: &Word) -> Option<Assign> {
    let Some(WordPart::Literal(first)) = word.parts.first() else {
        return None;
    };
    let (name, value) = first.split_once('=')?;
    if !is_name(name) {
        return None;
    }
    let mut parts = Vec::with_capacity(word.parts.len());
    if !value.is_empty() {
        parts.push(WordPart::Literal(value.to_string()));
    }
    parts.extend(word.parts[1..].iter().cloned());
    Some(Assign { name: name.to_string(), value: Word { parts } })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(program: &Program, index: usize) -> &SimpleCommand {
        match &program.body[index].first.command {
            Command::Simple(cmd) => cmd,
            other => panic!("expected simple command, got {other:?}"),
        }
    }

    #[test]
    fn parses_simple_commands_with_separators() {
        let program = parse("echo hello; ls -la\nexit 3", "t.sh").unwrap();
        assert_eq!(program.body.len(), 3);
        assert_eq!(simple(&program, 1).words.len(), 2);
    }

    #[test]
    fn parses_quotes_and_params() {
        let program = parse(r#"echo 'a b' "x $HOME ${1}" $@"#, "t.sh").unwrap();
        let words = &simple(&program, 0).words;
        assert_eq!(words[1].parts, vec![WordPart::SingleQuoted("a b".into())]);
        assert_eq!(
            words[2].parts,
            vec![WordPart::DoubleQuoted(vec![
                WordPart::Literal("x ".into()),
                WordPart::Param(Param::Named("HOME".into())),
                WordPart::Literal(" ".into()),
                WordPart::Param(Param::Positional(1)),
            ])]
        );
        assert_eq!(words[3].parts, vec![WordPart::Param(Param::All)]);
    }

    #[test]
    fn splits_prefix_assignments_from_arguments() {
        let program = parse("FOO=bar BAZ= cmd X=1", "t.sh").unwrap();
        let cmd = simple(&program, 0);
        assert_eq!(cmd.assigns.len(), 2);
        assert_eq!(cmd.assigns[0].name, "FOO");
        assert!(cmd.assigns[1].value.parts.is_empty());
        assert_eq!(cmd.words.len(), 2);
    }

    #[test]
    fn parses_redirections() {
        let program = parse("cmd >out 2>>err <in 2>&1", "t.sh").unwrap();
        let redirects = &simple(&program, 0).redirects;
        let ops: Vec<_> = redirects.iter().map(|r| (r.fd, r.op)).collect();
        assert_eq!(
            ops,
            vec![
                (1, RedirectOp::Write),
                (2, RedirectOp::Append),
                (0, RedirectOp::Read),
                (2, RedirectOp::Duplicate),
            ]
        );
    }

    #[test]
    fn parses_compound_commands() {
        let source = "if true; then\n  echo a\nelif false; then echo b\nelse echo c\nfi\n\
                      for x in 1 2; do echo $x; done\nwhile false; do :; done\n{ echo g; }\n(echo s)";
        let program = parse(source, "t.sh").unwrap();
        assert_eq!(program.body.len(), 5);
        assert!(matches!(&program.body[0].first.command, Command::If { branches, otherwise: Some(_) } if branches.len() == 2));
        assert!(matches!(&program.body[1].first.command, Command::For { var, items: Some(items), .. } if var == "x" && items.len() == 2));
        assert!(matches!(&program.body[2].first.command, Command::Loop { until: false, .. }));
        assert!(matches!(&program.body[3].first.command, Command::Group(_)));
        assert!(matches!(&program.body[4].first.command, Command::Subshell(_)));
    }

    #[test]
    fn comments_and_continuations_are_skipped() {
        let program = parse("# header\necho a \\\n  b # trailing\n", "t.sh").unwrap();
        assert_eq!(program.body.len(), 1);
        assert_eq!(simple(&program, 0).words.len(), 3);
    }

    #[test]
    fn and_or_lists_and_negation() {
        let program = parse("! a && b || c", "t.sh").unwrap();
        let item = &program.body[0];
        assert!(item.first.negated);
        assert_eq!(item.rest.len(), 2);
        assert_eq!(item.rest[1].0, Connector::Or);
    }

    #[test]
    fn reports_unclosed_quote_with_position() {
        let err = parse("echo ok\necho \"oops", "mock.sh").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.col, 6);
        assert!(err.to_string().starts_with("mock.sh:2:6: reached EOF without closing quote"));
    }

    #[test]
    fn reports_missing_fi() {
        let err = parse("if true; then echo a", "t.sh").unwrap_err();
        assert!(err.message.contains("\"fi\""), "{err}");
    }

    #[test]
    fn rejects_unsupported_constructs() {
        for source in ["a | b", "sleep 1 &", "echo $(date)", "echo `date`", "cat <<EOF"] {
            assert!(parse(source, "t.sh").is_err(), "{source} should fail");
        }
    }

    #[test]
    fn rejects_case_and_function_keywords() {
        let err = parse("case x in esac", "t.sh").unwrap_err();
        assert!(err.message.contains("case statements are not supported"), "{err}");
        assert_eq!((err.line, err.col), (1, 1));
        let err = parse("echo ok\nfunction greet { echo hi; }", "t.sh").unwrap_err();
        assert!(err.message.contains("functions are not supported"), "{err}");
        assert_eq!(err.line, 2);
        assert!(parse("esac", "t.sh").is_err());
        assert!(parse("echo case esac function", "t.sh").is_ok());
    }

    #[test]
    fn rejects_stray_reserved_words() {
        let err = parse("fi", "t.sh").unwrap_err();
        assert!(err.message.contains("reserved word"));
        assert!(parse(")", "t.sh").is_err());
        assert!(parse("if; then :; fi", "t.sh").is_err());
    }

    #[test]
    fn empty_source_is_an_empty_program() {
        let program = parse("\n# only a comment\n", "t.sh").unwrap();
        assert!(program.body.is_empty());
    }
}
