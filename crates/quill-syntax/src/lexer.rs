use quill_core::TextRange;

use crate::syntax_kind::SyntaxKind;

/// A lexed token: a kind plus the byte range it covers in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

impl Token {
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        self.range.slice(input)
    }
}

/// Lex `input` into a flat token stream, terminated by a zero-length `Eof`
/// token. Unknown bytes become `ErrorToken`s; the lexer never fails.
pub fn lex(input: &str) -> Vec<Token> {
    let mut lexer = Lexer {
        input,
        pos: 0,
        tokens: Vec::new(),
    };
    lexer.run();
    lexer.tokens
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) {
        while self.pos < self.input.len() {
            let start = self.pos;
            let kind = self.next_kind();
            self.push(kind, start);
        }
        let end = self.input.len() as u32;
        self.tokens.push(Token {
            kind: SyntaxKind::Eof,
            range: TextRange::new(end, end),
        });
    }

    fn push(&mut self, kind: SyntaxKind, start: usize) {
        self.tokens.push(Token {
            kind,
            range: TextRange::new(start as u32, self.pos as u32),
        });
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn next_kind(&mut self) -> SyntaxKind {
        let c = self.bump().expect("next_kind called at end of input");
        match c {
            c if c.is_whitespace() => {
                while self.peek().is_some_and(|c| c.is_whitespace()) {
                    self.bump();
                }
                SyntaxKind::Whitespace
            }
            '/' if self.peek() == Some('/') => {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.bump();
                }
                SyntaxKind::LineComment
            }
            '/' if self.peek() == Some('*') => {
                self.bump();
                loop {
                    match self.bump() {
                        None => break,
                        Some('*') if self.peek() == Some('/') => {
                            self.bump();
                            break;
                        }
                        Some(_) => {}
                    }
                }
                SyntaxKind::BlockComment
            }
            '@' if self.peek() == Some('"') => {
                // Verbatim string literal: `""` is the only escape.
                self.bump();
                loop {
                    match self.bump() {
                        None => break,
                        Some('"') => {
                            if self.peek() == Some('"') {
                                self.bump();
                            } else {
                                break;
                            }
                        }
                        Some(_) => {}
                    }
                }
                SyntaxKind::StringLiteral
            }
            '@' if self.peek().is_some_and(is_ident_start) || self.at_unicode_escape() => {
                self.lex_identifier_tail();
                // Verbatim identifiers never fold into keywords.
                SyntaxKind::Identifier
            }
            '"' => {
                loop {
                    match self.bump() {
                        None | Some('"') => break,
                        Some('\\') => {
                            self.bump();
                        }
                        Some(_) => {}
                    }
                }
                SyntaxKind::StringLiteral
            }
            '\'' => {
                loop {
                    match self.bump() {
                        None | Some('\'') => break,
                        Some('\\') => {
                            self.bump();
                        }
                        Some(_) => {}
                    }
                }
                SyntaxKind::CharLiteral
            }
            c if c.is_ascii_digit() => {
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
                {
                    self.bump();
                }
                SyntaxKind::NumberLiteral
            }
            c if is_ident_start(c) => {
                let start = self.pos - c.len_utf8();
                self.lex_identifier_tail();
                let text = &self.input[start..self.pos];
                SyntaxKind::from_keyword(text).unwrap_or(SyntaxKind::Identifier)
            }
            '\\' if self.at_unicode_escape_here() => {
                // Identifier starting with a unicode escape (`\u0061bc`).
                self.lex_identifier_tail();
                SyntaxKind::Identifier
            }
            '(' => SyntaxKind::LParen,
            ')' => SyntaxKind::RParen,
            '{' => SyntaxKind::LBrace,
            '}' => SyntaxKind::RBrace,
            '[' => SyntaxKind::LBracket,
            ']' => SyntaxKind::RBracket,
            ';' => SyntaxKind::Semicolon,
            ',' => SyntaxKind::Comma,
            '.' => SyntaxKind::Dot,
            ':' => SyntaxKind::Colon,
            '~' => SyntaxKind::Tilde,
            '+' => SyntaxKind::Plus,
            '-' => SyntaxKind::Minus,
            '*' => SyntaxKind::Star,
            '/' => SyntaxKind::Slash,
            '=' => match self.peek() {
                Some('=') => {
                    self.bump();
                    SyntaxKind::EqEq
                }
                Some('>') => {
                    self.bump();
                    SyntaxKind::FatArrow
                }
                _ => SyntaxKind::Eq,
            },
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    SyntaxKind::NotEq
                } else {
                    SyntaxKind::Bang
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    SyntaxKind::LessEq
                } else {
                    SyntaxKind::Less
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    SyntaxKind::GreaterEq
                } else {
                    SyntaxKind::Greater
                }
            }
            '&' if self.peek() == Some('&') => {
                self.bump();
                SyntaxKind::AmpAmp
            }
            '|' if self.peek() == Some('|') => {
                self.bump();
                SyntaxKind::PipePipe
            }
            _ => SyntaxKind::ErrorToken,
        }
    }

    /// True when the upcoming characters are `\uXXXX` (after an already
    /// consumed `@`).
    fn at_unicode_escape(&self) -> bool {
        self.peek() == Some('\\') && self.peek2() == Some('u')
    }

    /// True when `\u` was just consumed up to the backslash.
    fn at_unicode_escape_here(&self) -> bool {
        self.peek() == Some('u')
    }

    fn lex_identifier_tail(&mut self) {
        loop {
            match self.peek() {
                Some(c) if is_ident_continue(c) => {
                    self.bump();
                }
                Some('\\') if self.peek2() == Some('u') => {
                    self.bump(); // backslash
                    self.bump(); // u
                    for _ in 0..4 {
                        if self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                            self.bump();
                        }
                    }
                }
                _ => break,
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_continue(c)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        lex(input)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia() && *k != SyntaxKind::Eof)
            .collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        assert_eq!(
            kinds("class Foo { int bar; }"),
            vec![
                SyntaxKind::ClassKw,
                SyntaxKind::Identifier,
                SyntaxKind::LBrace,
                SyntaxKind::IntKw,
                SyntaxKind::Identifier,
                SyntaxKind::Semicolon,
                SyntaxKind::RBrace,
            ]
        );
    }

    #[test]
    fn verbatim_identifier_keeps_at_sign() {
        let tokens = lex("@class");
        assert_eq!(tokens[0].kind, SyntaxKind::Identifier);
        assert_eq!(tokens[0].text("@class"), "@class");
    }

    #[test]
    fn unicode_escape_identifier_is_one_token() {
        let input = r"\u0076ar";
        let tokens = lex(input);
        assert_eq!(tokens[0].kind, SyntaxKind::Identifier);
        assert_eq!(tokens[0].text(input), input);
    }

    #[test]
    fn string_and_comment_tokens() {
        let input = "\"a \\\" b\" // trailing\n/* block */";
        let tokens: Vec<_> = lex(input).into_iter().map(|t| t.kind).collect();
        assert!(tokens.contains(&SyntaxKind::StringLiteral));
        assert!(tokens.contains(&SyntaxKind::LineComment));
        assert!(tokens.contains(&SyntaxKind::BlockComment));
    }

    #[test]
    fn multi_char_operators() {
        assert_eq!(
            kinds("a => b == c != d && e || f"),
            vec![
                SyntaxKind::Identifier,
                SyntaxKind::FatArrow,
                SyntaxKind::Identifier,
                SyntaxKind::EqEq,
                SyntaxKind::Identifier,
                SyntaxKind::NotEq,
                SyntaxKind::Identifier,
                SyntaxKind::AmpAmp,
                SyntaxKind::Identifier,
                SyntaxKind::PipePipe,
                SyntaxKind::Identifier,
            ]
        );
    }

    #[test]
    fn contextual_keywords_have_dedicated_kinds() {
        assert_eq!(
            kinds("var get set init await nameof partial async"),
            vec![
                SyntaxKind::VarKw,
                SyntaxKind::GetKw,
                SyntaxKind::SetKw,
                SyntaxKind::InitKw,
                SyntaxKind::AwaitKw,
                SyntaxKind::NameofKw,
                SyntaxKind::PartialKw,
                SyntaxKind::AsyncKw,
            ]
        );
    }
}
