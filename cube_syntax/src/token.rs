use std::fmt::Display;

/// The enum variants are in SCREAMING_SNAKE_CASE as they technically
/// represent constants, but Rust does not allow const enum variants.
#[allow(nonstandard_style)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenKind {
    // Special
    ILLEGAL,
    EOF,
    // Identifiers and literals
    IDENT,
    INT,
    STRING,
    // Operators
    ASSIGN,
    PLUS,
    MINUS,
    BANG,
    ASTERISK,
    SLASH,
    EQ,
    NE,
    LT,
    GT,
    // Delimiters
    COMMA,
    SEMICOLON,
    COLON,
    LPAREN,
    RPAREN,
    LBRACE,
    RBRACE,
    LBRACKET,
    RBRACKET,
    // Keywords
    FUNCTION,
    LET,
    IF,
    ELSE,
    TRUE,
    FALSE,
    RETURN,
}

impl TokenKind {
    pub fn from_keyword(kw: &str) -> Option<Self> {
        let token = match kw {
            "fn" => Self::FUNCTION,
            "let" => Self::LET,
            "if" => Self::IF,
            "else" => Self::ELSE,
            "true" => Self::TRUE,
            "false" => Self::FALSE,
            "return" => Self::RETURN,
            _ => return None,
        };
        Some(token)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ILLEGAL => "ILLEGAL",
            Self::EOF => "EOF",
            Self::IDENT => "IDENT",
            Self::INT => "INT",
            Self::STRING => "STRING",
            Self::ASSIGN => "=",
            Self::PLUS => "+",
            Self::MINUS => "-",
            Self::BANG => "!",
            Self::ASTERISK => "*",
            Self::SLASH => "/",
            Self::EQ => "==",
            Self::NE => "!=",
            Self::LT => "<",
            Self::GT => ">",
            Self::COMMA => ",",
            Self::SEMICOLON => ";",
            Self::COLON => ":",
            Self::LPAREN => "(",
            Self::RPAREN => ")",
            Self::LBRACE => "{",
            Self::RBRACE => "}",
            Self::LBRACKET => "[",
            Self::RBRACKET => "]",
            Self::FUNCTION => "fn",
            Self::LET => "let",
            Self::IF => "if",
            Self::ELSE => "else",
            Self::TRUE => "true",
            Self::FALSE => "false",
            Self::RETURN => "return",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>) -> Self {
        Self {
            kind,
            literal: literal.into(),
        }
    }

    pub fn eof() -> Self {
        Self::new(TokenKind::EOF, "")
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.literal)
    }
}
