//! Character-to-token scanner.
//!
//! Walks the preprocessed source one character at a time, tracking line and
//! column, and produces a token stream terminated by `Eof`. Hex literals
//! keep their original spelling (`0x2A`) rather than being converted to
//! decimal text, so later stages can present them back to the user
//! unchanged.

use crate::token::{keyword_kind, Token, TokenKind};

pub struct Lexer<'a> {
    src: &'a [u8],
    offset: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer { src: src.as_bytes(), offset: 0, line: 1, column: 1 }
    }

    pub fn tokenize_all(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let done = matches!(tok.kind, TokenKind::Eof | TokenKind::Error);
            tokens.push(tok);
            if done {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> u8 {
        *self.src.get(self.offset).unwrap_or(&0)
    }

    fn peek_next(&self) -> u8 {
        *self.src.get(self.offset + 1).unwrap_or(&0)
    }

    fn advance(&mut self) -> u8 {
        let c = self.peek();
        self.offset += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                b'/' if self.peek_next() == b'/' => {
                    while self.peek() != b'\n' && self.peek() != 0 {
                        self.advance();
                    }
                }
                b'/' if self.peek_next() == b'*' => {
                    self.advance();
                    self.advance();
                    while !(self.peek() == b'*' && self.peek_next() == b'/') && self.peek() != 0 {
                        self.advance();
                    }
                    if self.peek() != 0 {
                        self.advance();
                        self.advance();
                    }
                }
                b'#' => {
                    while self.peek() != b'\n' && self.peek() != 0 {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let (line, column) = (self.line, self.column);
        let c = self.peek();
        if c == 0 {
            return Token::eof(line, column);
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            return self.scan_identifier(line, column);
        }
        if c.is_ascii_digit() {
            return self.scan_number(line, column);
        }
        if c == b'"' {
            return self.scan_string(line, column);
        }
        if c == b'\'' {
            return self.scan_char(line, column);
        }

        self.scan_operator(line, column)
    }

    fn scan_identifier(&mut self, line: u32, column: u32) -> Token {
        let start = self.offset;
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }
        let word = std::str::from_utf8(&self.src[start..self.offset]).unwrap().to_string();
        let kind = keyword_kind(&word).unwrap_or(TokenKind::Identifier);
        Token::new(kind, word, line, column)
    }

    fn scan_number(&mut self, line: u32, column: u32) -> Token {
        let start = self.offset;
        if self.peek() == b'0' && (self.peek_next() == b'x' || self.peek_next() == b'X') {
            self.advance();
            self.advance();
            while self.peek().is_ascii_hexdigit() {
                self.advance();
            }
        } else {
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let word = std::str::from_utf8(&self.src[start..self.offset]).unwrap().to_string();
        Token::new(TokenKind::Number, word, line, column)
    }

    fn scan_string(&mut self, line: u32, column: u32) -> Token {
        self.advance(); // opening quote
        let start = self.offset;
        loop {
            match self.peek() {
                0 | b'\n' => return Token::new(TokenKind::Error, "unterminated string", line, column),
                b'"' => break,
                b'\\' => {
                    self.advance();
                    if self.peek() != 0 {
                        self.advance();
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        let word = std::str::from_utf8(&self.src[start..self.offset]).unwrap().to_string();
        self.advance(); // closing quote
        Token::new(TokenKind::StringLit, word, line, column)
    }

    fn scan_char(&mut self, line: u32, column: u32) -> Token {
        self.advance(); // opening quote
        let start = self.offset;
        if self.peek() == b'\\' {
            self.advance();
        }
        if self.peek() != 0 {
            self.advance();
        }
        if self.peek() != b'\'' {
            return Token::new(TokenKind::Error, "unterminated char literal", line, column);
        }
        let word = std::str::from_utf8(&self.src[start..self.offset]).unwrap().to_string();
        self.advance(); // closing quote
        Token::new(TokenKind::CharLit, word, line, column)
    }

    fn scan_operator(&mut self, line: u32, column: u32) -> Token {
        use TokenKind::*;
        let c = self.advance();
        let (kind, lexeme): (TokenKind, &str) = match c {
            b'+' => {
                if self.peek() == b'+' {
                    self.advance();
                    (PlusPlus, "++")
                } else if self.peek() == b'=' {
                    self.advance();
                    (PlusAssign, "+=")
                } else {
                    (Plus, "+")
                }
            }
            b'-' => {
                if self.peek() == b'-' {
                    self.advance();
                    (MinusMinus, "--")
                } else if self.peek() == b'=' {
                    self.advance();
                    (MinusAssign, "-=")
                } else if self.peek() == b'>' {
                    self.advance();
                    (Arrow, "->")
                } else {
                    (Minus, "-")
                }
            }
            b'*' => {
                if self.peek() == b'=' {
                    self.advance();
                    (StarAssign, "*=")
                } else {
                    (Star, "*")
                }
            }
            b'/' => {
                if self.peek() == b'=' {
                    self.advance();
                    (SlashAssign, "/=")
                } else {
                    (Slash, "/")
                }
            }
            b'%' => (Percent, "%"),
            b'&' => {
                if self.peek() == b'&' {
                    self.advance();
                    (AndAnd, "&&")
                } else {
                    (Ampersand, "&")
                }
            }
            b'|' => {
                if self.peek() == b'|' {
                    self.advance();
                    (OrOr, "||")
                } else {
                    (Pipe, "|")
                }
            }
            b'^' => (Caret, "^"),
            b'~' => (Tilde, "~"),
            b'!' => {
                if self.peek() == b'=' {
                    self.advance();
                    (NotEqual, "!=")
                } else {
                    (Exclaim, "!")
                }
            }
            b'=' => {
                if self.peek() == b'=' {
                    self.advance();
                    (Equal, "==")
                } else {
                    (Assign, "=")
                }
            }
            b'<' => {
                if self.peek() == b'=' {
                    self.advance();
                    (LessEqual, "<=")
                } else if self.peek() == b'<' {
                    self.advance();
                    (LShift, "<<")
                } else {
                    (Less, "<")
                }
            }
            b'>' => {
                if self.peek() == b'=' {
                    self.advance();
                    (GreaterEqual, ">=")
                } else if self.peek() == b'>' {
                    self.advance();
                    (RShift, ">>")
                } else {
                    (Greater, ">")
                }
            }
            b'(' => (LParen, "("),
            b')' => (RParen, ")"),
            b'{' => (LBrace, "{"),
            b'}' => (RBrace, "}"),
            b'[' => (LBracket, "["),
            b']' => (RBracket, "]"),
            b';' => (Semicolon, ";"),
            b',' => (Comma, ","),
            b'.' => (Dot, "."),
            b':' => (Colon, ":"),
            b'?' => (Question, "?"),
            _ => return Token::new(Error, (c as char).to_string(), line, column),
        };
        Token::new(kind, lexeme, line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize_all().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn skips_comments_and_whitespace() {
        let toks = kinds("  // hi\n  /* block */ int  ");
        assert_eq!(toks, vec![TokenKind::Int, TokenKind::Eof]);
    }

    #[test]
    fn distinguishes_multi_char_operators() {
        let toks = kinds("+ ++ += - -- -= -> < <= << > >= >> & && | || = ==");
        use TokenKind::*;
        assert_eq!(
            toks,
            vec![
                Plus, PlusPlus, PlusAssign, Minus, MinusMinus, MinusAssign, Arrow, Less,
                LessEqual, LShift, Greater, GreaterEqual, RShift, Ampersand, AndAnd, Pipe, OrOr,
                Assign, Equal, Eof
            ]
        );
    }

    #[test]
    fn preserves_hex_literal_spelling() {
        let toks = Lexer::new("0x2A 42").tokenize_all();
        assert_eq!(toks[0].lexeme, "0x2A");
        assert_eq!(toks[1].lexeme, "42");
    }

    #[test]
    fn keywords_resolve_over_identifiers() {
        let toks = kinds("int x_int return");
        assert_eq!(toks, vec![TokenKind::Int, TokenKind::Identifier, TokenKind::Return, TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_is_error() {
        let toks = kinds("\"abc");
        assert_eq!(toks, vec![TokenKind::Error]);
    }

    #[test]
    fn string_preserves_escapes_literally() {
        let toks = Lexer::new(r#""a\nb""#).tokenize_all();
        assert_eq!(toks[0].lexeme, r"a\nb");
    }
}
