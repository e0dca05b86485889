//! Single-pass scanner over the action DSL source text.
//!
//! The whole source is tokenised up front into a `Vec<Token>`; the parser
//! then walks it with simple index-based lookahead, which gives it the
//! "peek of up to 2 tokens" the grammar needs without the lexer itself
//! needing to support pushback.

use crate::error::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Name(String),
    Number(f64),
    String(String),
    Unit(String),
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Not,
    BitMaskAny,
    BitMaskNone,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

pub fn lex(src: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer { src, bytes: src.as_bytes(), pos: 0, tokens: Vec::new() };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> Result<(), SyntaxError> {
        loop {
            self.skip_whitespace();
            if self.pos >= self.bytes.len() {
                self.push(TokenKind::End, self.pos);
                break;
            }
            let start = self.pos;
            let b = self.bytes[self.pos];
            match b {
                b',' => {
                    self.pos += 1;
                    self.push(TokenKind::Comma, start);
                }
                b';' => {
                    self.pos += 1;
                    self.push(TokenKind::Semicolon, start);
                }
                b'(' => {
                    self.pos += 1;
                    self.push(TokenKind::LParen, start);
                }
                b')' => {
                    self.pos += 1;
                    self.push(TokenKind::RParen, start);
                }
                b'{' => {
                    self.pos += 1;
                    self.push(TokenKind::LBrace, start);
                }
                b'}' => {
                    self.pos += 1;
                    self.push(TokenKind::RBrace, start);
                }
                b'=' => {
                    self.pos += 1;
                    self.push(TokenKind::Eq, start);
                }
                b'!' => {
                    self.expect_byte(b'=', start, "expected '=' after '!'")?;
                    self.push(TokenKind::Ne, start);
                }
                b'\xe2' if self.src[self.pos..].starts_with('\u{2260}') => {
                    // '≠' (U+2260), a single 3-byte UTF-8 sequence.
                    self.pos += '\u{2260}'.len_utf8();
                    self.push(TokenKind::Ne, start);
                }
                b'<' => {
                    self.pos += 1;
                    if self.peek_byte() == Some(b'=') {
                        self.pos += 1;
                        self.push(TokenKind::Le, start);
                    } else {
                        self.push(TokenKind::Lt, start);
                    }
                }
                b'>' => {
                    self.pos += 1;
                    if self.peek_byte() == Some(b'=') {
                        self.pos += 1;
                        self.push(TokenKind::Ge, start);
                    } else {
                        self.push(TokenKind::Gt, start);
                    }
                }
                b'"' => self.scan_string(start)?,
                b'[' => self.scan_unit(start)?,
                b'0'..=b'9' => self.scan_number(start)?,
                b'+' | b'-' if self.peek_byte_at(1).map(|c| c.is_ascii_digit() || c == b'.').unwrap_or(false) => {
                    self.scan_number(start)?
                }
                b if b.is_ascii_alphabetic() || b == b'_' => self.scan_name(start),
                _ if self.is_multibyte_ge(start) => {
                    self.pos += '\u{2265}'.len_utf8();
                    self.push(TokenKind::Ge, start);
                }
                _ if self.is_multibyte_le(start) => {
                    self.pos += '\u{2264}'.len_utf8();
                    self.push(TokenKind::Le, start);
                }
                _ => {
                    return Err(SyntaxError::new(start, format!("unexpected byte 0x{b:02x}")));
                }
            }
        }
        Ok(())
    }

    fn is_multibyte_ge(&self, start: usize) -> bool {
        self.src[start..].starts_with('\u{2265}') // '≥'
    }

    fn is_multibyte_le(&self, start: usize) -> bool {
        self.src[start..].starts_with('\u{2264}') // '≤'
    }

    fn push(&mut self, kind: TokenKind, offset: usize) {
        self.tokens.push(Token { kind, offset });
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_byte_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn expect_byte(&mut self, expected: u8, start: usize, message: &str) -> Result<(), SyntaxError> {
        self.pos += 1;
        if self.peek_byte() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(SyntaxError::new(start, message.to_string()))
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn scan_name(&mut self, start: usize) {
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.src[start..self.pos];
        let kind = match text {
            "in" => TokenKind::In,
            "not" => TokenKind::Not,
            "all-bits-in-mask-set" => TokenKind::BitMaskAny,
            "no-bit-in-mask-set" => TokenKind::BitMaskNone,
            other => TokenKind::Name(other.to_string()),
        };
        self.push(kind, start);
    }

    fn scan_number(&mut self, start: usize) -> Result<(), SyntaxError> {
        if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
            self.pos += 1;
        }
        let mut saw_digit = false;
        while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
            self.pos += 1;
            saw_digit = true;
        }
        if self.peek_byte() == Some(b'.') {
            self.pos += 1;
            while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                self.pos += 1;
                saw_digit = true;
            }
        }
        if !saw_digit {
            return Err(SyntaxError::new(start, "malformed number literal".to_string()));
        }
        if matches!(self.peek_byte(), Some(b'e') | Some(b'E')) {
            let exponent_start = self.pos;
            self.pos += 1;
            if matches!(self.peek_byte(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            let mut exponent_digit = false;
            while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
                self.pos += 1;
                exponent_digit = true;
            }
            if !exponent_digit {
                // Not a real exponent (e.g. a unit suffix like "1e"); back off.
                self.pos = exponent_start;
            }
        }
        let text = &self.src[start..self.pos];
        let value: f64 = text
            .parse()
            .map_err(|_| SyntaxError::new(start, format!("malformed number literal '{text}'")))?;
        self.push(TokenKind::Number(value), start);
        Ok(())
    }

    fn scan_string(&mut self, start: usize) -> Result<(), SyntaxError> {
        self.pos += 1; // opening quote
        let mut out = String::new();
        loop {
            match self.peek_byte() {
                None => return Err(SyntaxError::new(start, "unterminated string literal".to_string())),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    let escape_offset = self.pos;
                    self.pos += 1;
                    let escaped = self.peek_byte().ok_or_else(|| {
                        SyntaxError::new(escape_offset, "unterminated escape sequence".to_string())
                    })?;
                    let ch = match escaped {
                        b'a' => '\u{07}',
                        b'b' => '\u{08}',
                        b'e' => '\u{1b}',
                        b'f' => '\u{0c}',
                        b'n' => '\n',
                        b'r' => '\r',
                        b't' => '\t',
                        b'v' => '\u{0b}',
                        b'\\' => '\\',
                        b'"' => '"',
                        b'\'' => '\'',
                        other => {
                            return Err(SyntaxError::new(
                                escape_offset,
                                format!("unknown escape sequence '\\{}'", other as char),
                            ))
                        }
                    };
                    out.push(ch);
                    self.pos += 1;
                }
                Some(_) => {
                    let ch_start = self.pos;
                    let ch = self.src[ch_start..].chars().next().expect("valid utf-8 at char boundary");
                    out.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
        self.push(TokenKind::String(out), start);
        Ok(())
    }

    fn scan_unit(&mut self, start: usize) -> Result<(), SyntaxError> {
        self.pos += 1; // '['
        let content_start = self.pos;
        while let Some(b) = self.peek_byte() {
            if b == b']' {
                break;
            }
            self.pos += 1;
        }
        if self.peek_byte() != Some(b']') {
            return Err(SyntaxError::new(start, "unterminated unit literal".to_string()));
        }
        let content = self.src[content_start..self.pos].trim().to_string();
        self.pos += 1; // ']'
        self.push(TokenKind::Unit(content), start);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_comparison() {
        assert_eq!(
            kinds("temperature >= 265 [K]"),
            vec![
                TokenKind::Name("temperature".into()),
                TokenKind::Ge,
                TokenKind::Number(265.0),
                TokenKind::Unit("K".into()),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn lexes_function_call_with_hyphenated_name() {
        assert_eq!(
            kinds("longitude-range(170 [deg], -170 [deg])"),
            vec![
                TokenKind::Name("longitude-range".into()),
                TokenKind::LParen,
                TokenKind::Number(170.0),
                TokenKind::Unit("deg".into()),
                TokenKind::Comma,
                TokenKind::Number(-170.0),
                TokenKind::Unit("deg".into()),
                TokenKind::RParen,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn lexes_not_in_as_two_keywords() {
        assert_eq!(
            kinds("x not in (1, 2)"),
            vec![
                TokenKind::Name("x".into()),
                TokenKind::Not,
                TokenKind::In,
                TokenKind::LParen,
                TokenKind::Number(1.0),
                TokenKind::Comma,
                TokenKind::Number(2.0),
                TokenKind::RParen,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn lexes_bit_mask_keywords() {
        assert_eq!(
            kinds("flags all-bits-in-mask-set 3"),
            vec![
                TokenKind::Name("flags".into()),
                TokenKind::BitMaskAny,
                TokenKind::Number(3.0),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn lexes_string_escapes() {
        assert_eq!(kinds(r#""a\tb\n\"c\"""#), vec![TokenKind::String("a\tb\n\"c\"".into()), TokenKind::End]);
    }

    #[test]
    fn lexes_unicode_comparison_operators() {
        assert_eq!(
            kinds("x \u{2260} 1; y \u{2264} 2; z \u{2265} 3"),
            vec![
                TokenKind::Name("x".into()),
                TokenKind::Ne,
                TokenKind::Number(1.0),
                TokenKind::Semicolon,
                TokenKind::Name("y".into()),
                TokenKind::Le,
                TokenKind::Number(2.0),
                TokenKind::Semicolon,
                TokenKind::Name("z".into()),
                TokenKind::Ge,
                TokenKind::Number(3.0),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn reports_offset_of_invalid_byte() {
        let err = lex("x = @").unwrap_err();
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn reports_offset_of_unterminated_string() {
        let err = lex("x = \"abc").unwrap_err();
        assert_eq!(err.offset, 4);
    }
}
