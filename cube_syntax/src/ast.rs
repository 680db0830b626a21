use std::fmt::Display;

use crate::token::TokenKind;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrefixOp {
    Bang,
    Minus,
}

impl PrefixOp {
    pub fn from_token(t: TokenKind) -> Option<Self> {
        let op = match t {
            TokenKind::BANG => Self::Bang,
            TokenKind::MINUS => Self::Minus,
            _ => return None,
        };
        Some(op)
    }
}

impl Display for PrefixOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Bang => "!",
            Self::Minus => "-",
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InfixOp {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Lt,
    Gt,
    Eq,
    Ne,
}

impl InfixOp {
    pub fn from_token(t: TokenKind) -> Option<Self> {
        let op = match t {
            TokenKind::PLUS => Self::Plus,
            TokenKind::MINUS => Self::Minus,
            TokenKind::ASTERISK => Self::Asterisk,
            TokenKind::SLASH => Self::Slash,
            TokenKind::LT => Self::Lt,
            TokenKind::GT => Self::Gt,
            TokenKind::EQ => Self::Eq,
            TokenKind::NE => Self::Ne,
            _ => return None,
        };
        Some(op)
    }
}

impl Display for InfixOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Asterisk => "*",
            Self::Slash => "/",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Eq => "==",
            Self::Ne => "!=",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn token_literal(&self) -> String {
        self.statements
            .first()
            .map(Stmt::token_literal)
            .unwrap_or_default()
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&join(&self.statements))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Let { name: String, value: Expr },
    Return(Option<Expr>),
    Expression(Expr),
}

impl Stmt {
    pub fn token_literal(&self) -> String {
        match self {
            Self::Let { .. } => "let".to_string(),
            Self::Return(_) => "return".to_string(),
            Self::Expression(expr) => expr.token_literal(),
        }
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Let { name, value } => write!(f, "let {name} = {value};"),
            Self::Return(Some(value)) => write!(f, "return {value};"),
            Self::Return(None) => f.write_str("return;"),
            Self::Expression(expr) => expr.fmt(f),
        }
    }
}

/// A braced statement sequence. Only `if` consequences/alternatives and
/// function bodies contain blocks; there is no block statement form.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn token_literal(&self) -> String {
        "{".to_string()
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.statements.is_empty() {
            f.write_str("{}")
        } else {
            write!(f, "{{ {} }}", join(&self.statements))
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Ident(String),
    Integer(i64),
    Boolean(bool),
    Str(String),
    Array(Vec<Expr>),
    /// Entries in source order; duplicate keys are resolved last-wins at
    /// evaluation time.
    Hash(Vec<(Expr, Expr)>),
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Prefix {
        op: PrefixOp,
        right: Box<Expr>,
    },
    Infix {
        left: Box<Expr>,
        op: InfixOp,
        right: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },
    Function {
        params: Vec<String>,
        body: Block,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn token_literal(&self) -> String {
        match self {
            Self::Ident(name) => name.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Boolean(value) => value.to_string(),
            Self::Str(value) => value.clone(),
            Self::Array(_) => "[".to_string(),
            Self::Hash(_) => "{".to_string(),
            Self::Index { left, .. } => left.token_literal(),
            Self::Prefix { op, .. } => op.to_string(),
            Self::Infix { left, .. } => left.token_literal(),
            Self::If { .. } => "if".to_string(),
            Self::Function { .. } => "fn".to_string(),
            Self::Call { func, .. } => func.token_literal(),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ident(name) => f.write_str(name),
            Self::Integer(value) => value.fmt(f),
            Self::Boolean(value) => value.fmt(f),
            Self::Str(value) => write!(f, "\"{value}\""),
            Self::Array(elements) => write!(f, "[{}]", join_sep(elements, ", ")),
            Self::Hash(entries) => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{key}: {value}"))
                    .collect();
                write!(f, "{{{}}}", entries.join(", "))
            }
            Self::Index { left, index } => write!(f, "({left}[{index}])"),
            Self::Prefix { op, right } => write!(f, "({op}{right})"),
            Self::Infix { left, op, right } => write!(f, "({left} {op} {right})"),
            Self::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({condition}) {consequence}")?;
                if let Some(alternative) = alternative {
                    write!(f, " else {alternative}")?;
                }
                Ok(())
            }
            Self::Function { params, body } => {
                write!(f, "fn({}) {body}", params.join(", "))
            }
            Self::Call { func, args } => write!(f, "{func}({})", join_sep(args, ", ")),
        }
    }
}

fn join(statements: &[Stmt]) -> String {
    join_sep(statements, " ")
}

fn join_sep<T: Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}
