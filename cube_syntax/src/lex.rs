use crate::token::{Token, TokenKind};

const NUL: u8 = 0;

/// Pull-driven lexer over the raw source bytes. `position` points at the
/// byte held in `byte`, `read_position` one past it.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a [u8],
    position: usize,
    read_position: usize,
    byte: u8,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Self {
            input: source.as_bytes(),
            position: 0,
            read_position: 0,
            byte: NUL,
        };
        lexer.read_byte();
        lexer
    }

    /// Returns the next token, consuming as many bytes as it spans.
    /// Once the input is exhausted it returns `EOF` forever.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let token = match self.byte {
            b'=' => {
                if self.peek_byte() == b'=' {
                    self.read_byte();
                    Token::new(TokenKind::EQ, "==")
                } else {
                    Token::new(TokenKind::ASSIGN, "=")
                }
            }
            b'!' => {
                if self.peek_byte() == b'=' {
                    self.read_byte();
                    Token::new(TokenKind::NE, "!=")
                } else {
                    Token::new(TokenKind::BANG, "!")
                }
            }
            b'+' => Token::new(TokenKind::PLUS, "+"),
            b'-' => Token::new(TokenKind::MINUS, "-"),
            b'*' => Token::new(TokenKind::ASTERISK, "*"),
            b'/' => Token::new(TokenKind::SLASH, "/"),
            b'<' => Token::new(TokenKind::LT, "<"),
            b'>' => Token::new(TokenKind::GT, ">"),
            b',' => Token::new(TokenKind::COMMA, ","),
            b';' => Token::new(TokenKind::SEMICOLON, ";"),
            b':' => Token::new(TokenKind::COLON, ":"),
            b'(' => Token::new(TokenKind::LPAREN, "("),
            b')' => Token::new(TokenKind::RPAREN, ")"),
            b'{' => Token::new(TokenKind::LBRACE, "{"),
            b'}' => Token::new(TokenKind::RBRACE, "}"),
            b'[' => Token::new(TokenKind::LBRACKET, "["),
            b']' => Token::new(TokenKind::RBRACKET, "]"),
            b'"' => Token::new(TokenKind::STRING, self.read_string()),
            NUL => Token::eof(),
            byte => {
                if is_letter(byte) {
                    let ident = self.read_identifier();
                    let kind = TokenKind::from_keyword(&ident).unwrap_or(TokenKind::IDENT);
                    // `read_identifier` already advanced past the last byte
                    return Token::new(kind, ident);
                }
                if byte.is_ascii_digit() {
                    return Token::new(TokenKind::INT, self.read_number());
                }
                Token::new(TokenKind::ILLEGAL, lossy(&[byte]))
            }
        };

        self.read_byte();
        token
    }

    fn read_byte(&mut self) {
        self.byte = if self.read_position >= self.input.len() {
            NUL
        } else {
            self.input[self.read_position]
        };
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn peek_byte(&self) -> u8 {
        if self.read_position >= self.input.len() {
            NUL
        } else {
            self.input[self.read_position]
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.byte, b' ' | b'\t' | b'\n' | b'\r') {
            self.read_byte();
        }
    }

    /// Reads the content between the quotes. No escape sequences: a
    /// backslash is a literal byte. An unterminated string ends at EOF
    /// with whatever content was read.
    fn read_string(&mut self) -> String {
        let start = self.position + 1;
        loop {
            self.read_byte();
            if self.byte == b'"' || self.byte == NUL {
                break;
            }
        }
        lossy(&self.input[start..self.position])
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while is_letter(self.byte) {
            self.read_byte();
        }
        lossy(&self.input[start..self.position])
    }

    fn read_number(&mut self) -> String {
        let start = self.position;
        while self.byte.is_ascii_digit() {
            self.read_byte();
        }
        lossy(&self.input[start..self.position])
    }
}

fn is_letter(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
