//! Front end: character filtering and bracket matching.
//!
//! Every character other than the eight instructions is a comment. The
//! parser builds the statement tree directly; the only errors it can report
//! are unbalanced brackets.


use crate::diagnostic::Diagnostic;
use crate::ir::{Program, Stmt};
use crate::span::{Span, Spanned};

/// The eight source instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    Left,
    Right,
    Plus,
    Minus,
    Period,
    Comma,
    Open,
    Close,
}

impl Token {
    fn from_char(c: char) -> Option<Token> {
        Some(match c {
            '<' => Token::Left,
            '>' => Token::Right,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '.' => Token::Period,
            ',' => Token::Comma,
            '[' => Token::Open,
            ']' => Token::Close,
            _ => return None,
        })
    }
}

/// Filter the source down to instruction tokens with their byte spans.
pub fn tokenize(source: &str) -> Vec<Spanned<Token>> {
    source
        .char_indices()
        .filter_map(|(i, c)| Token::from_char(c).map(|t| Spanned::new(t, Span::at(i))))
        .collect()
}

/// Parse source text into a program tree.
///
/// Errors are reported for every stray `]` and every unclosed `[`; warnings
/// (empty loops) are returned alongside a successful parse by
/// [`parse_with_warnings`].
pub fn parse(source: &str) -> Result<Program, Vec<Diagnostic>> {
    parse_with_warnings(source).map(|(program, _)| program)
}

/// Like [`parse`], but also returns non-fatal diagnostics.
pub fn parse_with_warnings(source: &str) -> Result<(Program, Vec<Diagnostic>), Vec<Diagnostic>> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    // Open loops: span of the `[` and the statements collected so far.
    let mut open: Vec<(Span, Vec<Stmt>)> = Vec::new();
    let mut current: Vec<Stmt> = Vec::new();

    for token in tokenize(source) {
        let stmt = match token.node {
            Token::Left => Stmt::Move(-1),
            Token::Right => Stmt::Move(1),
            Token::Plus => Stmt::Add(1),
            Token::Minus => Stmt::Add(255),
            Token::Period => Stmt::Output(1),
            Token::Comma => Stmt::Input(1),
            Token::Open => {
                open.push((token.span, std::mem::take(&mut current)));
                continue;
            }
            Token::Close => match open.pop() {
                Some((start, outer)) => {
                    let body = std::mem::replace(&mut current, outer);
                    if body.is_empty() {
                        warnings.push(
                            Diagnostic::warning("empty loop".to_string(), start.merge(token.span))
                                .with_note(
                                    "this loop never terminates if entered with a non-zero cell"
                                        .to_string(),
                                ),
                        );
                    }
                    Stmt::Loop(body)
                }
                None => {
                    errors.push(
                        Diagnostic::error("missing open bracket".to_string(), token.span)
                            .with_note("every `]` needs a matching `[` before it".to_string()),
                    );
                    continue;
                }
            },
        };
        current.push(stmt);
    }

    for (span, _) in open {
        errors.push(
            Diagnostic::error("unclosed bracket".to_string(), span)
                .with_help("add a matching `]`".to_string()),
        );
    }

    if errors.is_empty() {
        Ok((Program::new(current), warnings))
    } else {
        errors.sort_by_key(|d| d.span.start);
        Err(errors)
    }
}
