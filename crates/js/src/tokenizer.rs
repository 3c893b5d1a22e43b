//! Single-pass DFA tokenizer.

use crate::token::{RESERVED_WORDS, Token};

/// Consumes a `&str` one byte at a time and produces [`Token`]s.
///
/// Operates on bytes rather than `char`s: JS source is ASCII-only in
/// practice here, and the tokenizer does not define behavior on non-ASCII
/// bytes, so indexing by byte offset keeps the state machine simple.
pub struct Tokenizer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input: input.as_bytes(), pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn consume(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Produces the next token, or `None` on any lexical error.
    pub fn tokenize(&mut self) -> Option<Token> {
        let mut current = self.consume();

        while is_whitespace(current) {
            current = self.consume();
        }

        if current == Some(b'/') && self.peek() == Some(b'*') {
            self.pos += 1;
            let mut comment = String::new();
            loop {
                current = self.consume();
                let Some(c) = current else {
                    return Some(Token::Comment(comment));
                };

                if c == b'*' && self.peek() == Some(b'/') {
                    self.pos += 1;
                    return Some(Token::Comment(comment));
                }

                comment.push(c as char);
            }
        }

        let Some(current) = current else {
            return Some(Token::Eof);
        };

        match current {
            b'(' => return Some(Token::LParen),
            b')' => return Some(Token::RParen),
            b'{' => return Some(Token::LBrace),
            b'}' => return Some(Token::RBrace),
            b'[' => return Some(Token::LBracket),
            b']' => return Some(Token::RBracket),
            b';' => return Some(Token::Semicolon),
            b',' => return Some(Token::Comma),
            b'.' => return Some(Token::Period),
            b'=' => return Some(Token::Equals),
            b'+' => return Some(Token::Plus),
            b'*' => return Some(Token::Asterisk),
            b'\'' | b'"' => return self.tokenize_string_literal(current),
            _ => {}
        }

        if is_numeric(current) {
            return self.tokenize_int_literal(current);
        }

        if !is_ident_start(current) {
            return None;
        }

        let word = self.consume_word(current);

        if let Some((_, tok)) = RESERVED_WORDS.iter().find(|(name, _)| *name == word) {
            return Some(tok.clone());
        }

        Some(Token::Identifier(word))
    }

    fn tokenize_int_literal(&mut self, first: u8) -> Option<Token> {
        const UPPER_BOUND: u64 = i32::MAX as u64;

        let mut current = first;
        let mut value: u64 = 0;
        loop {
            value += (current - b'0') as u64;
            if value > UPPER_BOUND {
                return None;
            }

            let Some(next) = self.peek() else { break };
            if !is_numeric(next) {
                break;
            }

            value *= 10;
            current = next;
            self.pos += 1;
        }

        Some(Token::IntLiteral(value as i32))
    }

    /// https://tc39.es/ecma262/#prod-StringLiteral
    fn tokenize_string_literal(&mut self, quote: u8) -> Option<Token> {
        let mut value = String::new();

        loop {
            let current = self.consume()?;

            if current == quote {
                return Some(Token::StringLiteral(value));
            }

            if current == b'\\' {
                value.push(self.consume_escape_sequence()?);
                continue;
            }

            value.push(current as char);
        }
    }

    /// https://tc39.es/ecma262/#prod-SingleEscapeCharacter
    fn consume_escape_sequence(&mut self) -> Option<char> {
        let current = self.consume()?;
        Some(match current {
            b'\'' => '\'',
            b'"' => '"',
            b'\\' => '\\',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'v' => '\u{b}',
            _ => return None,
        })
    }

    fn consume_word(&mut self, first: u8) -> String {
        let mut word = String::new();
        let mut current = first;
        loop {
            word.push(current as char);
            let Some(next) = self.peek() else { break };
            if !is_ident_continuation(next) {
                break;
            }

            current = next;
            self.pos += 1;
        }

        word
    }
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

fn is_numeric(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_ident_start(c: u8) -> bool {
    is_alpha(c) || c == b'_'
}

fn is_ident_continuation(c: u8) -> bool {
    is_alpha(c) || is_numeric(c) || c == b'_'
}

fn is_whitespace(c: Option<u8>) -> bool {
    matches!(c, Some(b' ' | b'\n' | b'\r' | 0x0c | 0x0b | b'\t'))
}

/// Tokenizes `input` in full, returning `None` as soon as any token fails.
pub fn tokenize(input: &str) -> Option<Vec<Token>> {
    let mut t = Tokenizer::new(input);
    let mut tokens = Vec::new();

    loop {
        let token = t.tokenize()?;
        let is_eof = token == Token::Eof;
        tokens.push(token);
        if is_eof {
            return Some(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuators_and_eof() {
        let tokens = tokenize("(){};,.=+*").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
                Token::Semicolon,
                Token::Comma,
                Token::Period,
                Token::Equals,
                Token::Plus,
                Token::Asterisk,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn int_literal_overflow_fails() {
        let mut t = Tokenizer::new("99999999999");
        assert_eq!(t.tokenize(), None);
    }

    #[test]
    fn int_literal_at_boundary() {
        let mut t = Tokenizer::new("2147483647");
        assert_eq!(t.tokenize(), Some(Token::IntLiteral(i32::MAX)));
    }

    #[test]
    fn string_literal_with_escapes() {
        let mut t = Tokenizer::new(r#""a\nb\"c""#);
        assert_eq!(t.tokenize(), Some(Token::StringLiteral("a\nb\"c".to_string())));
    }

    #[test]
    fn unterminated_string_fails() {
        let mut t = Tokenizer::new("\"abc");
        assert_eq!(t.tokenize(), None);
    }

    #[test]
    fn unknown_escape_fails() {
        let mut t = Tokenizer::new(r#""a\qb""#);
        assert_eq!(t.tokenize(), None);
    }

    #[test]
    fn block_comment_without_closer_returns_partial_comment_then_eof() {
        let tokens = tokenize("/* unterminated").unwrap();
        assert_eq!(tokens, vec![Token::Comment(" unterminated".to_string()), Token::Eof]);
    }

    #[test]
    fn reserved_word_vs_identifier() {
        let tokens = tokenize("while foo").unwrap();
        assert_eq!(tokens, vec![Token::While, Token::Identifier("foo".to_string()), Token::Eof]);
    }

    #[test]
    fn unknown_glyph_fails() {
        let mut t = Tokenizer::new("~");
        assert_eq!(t.tokenize(), None);
    }
}
