use std::{
    cell::RefCell,
    collections::HashMap,
    fmt::{Debug, Display},
    rc::Rc,
};

use cube_syntax::ast::Block;

use crate::environment::Env;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Type names as they appear in runtime error messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Integer,
    Boolean,
    Str,
    Null,
    ReturnValue,
    Error,
    Function,
    Builtin,
    Array,
    Hash,
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::Str => "STRING",
            Self::Null => "NULL",
            Self::ReturnValue => "RETURN_VALUE",
            Self::Error => "ERROR",
            Self::Function => "FUNCTION",
            Self::Builtin => "BUILTIN",
            Self::Array => "ARRAY",
            Self::Hash => "HASH",
        })
    }
}

/// Key under which a hashable value is stored in a hash. Integers key on
/// their raw 64-bit value, booleans on 0/1, strings on the FNV-1a hash of
/// their bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub kind: ObjectKind,
    pub value: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

#[derive(Clone, Debug)]
pub struct Func {
    pub params: Vec<String>,
    pub body: Block,
    pub env: Rc<RefCell<Env>>,
}

/// The captured environment is excluded: it may transitively contain the
/// function itself, and comparing it would never terminate.
impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params && self.body == other.body
    }
}

impl Display for Func {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body: Vec<String> = self.body.statements.iter().map(ToString::to_string).collect();
        write!(
            f,
            "fn({}) {{\n{}\n}}",
            self.params.join(", "),
            body.join(" ")
        )
    }
}

pub type BuiltinFn = fn(Vec<Object>) -> Object;

#[derive(Copy, Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Str(String),
    Null,
    Return(Box<Object>),
    Error(String),
    Function(Func),
    Builtin(Builtin),
    Array(Vec<Object>),
    Hash(HashMap<HashKey, HashPair>),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Integer(_) => ObjectKind::Integer,
            Self::Boolean(_) => ObjectKind::Boolean,
            Self::Str(_) => ObjectKind::Str,
            Self::Null => ObjectKind::Null,
            Self::Return(_) => ObjectKind::ReturnValue,
            Self::Error(_) => ObjectKind::Error,
            Self::Function(_) => ObjectKind::Function,
            Self::Builtin(_) => ObjectKind::Builtin,
            Self::Array(_) => ObjectKind::Array,
            Self::Hash(_) => ObjectKind::Hash,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Everything is truthy except `null` and `false`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Null | Self::Boolean(false))
    }

    /// `None` for value kinds that cannot be used as hash keys.
    pub fn hash_key(&self) -> Option<HashKey> {
        let value = match self {
            Self::Integer(n) => *n as u64,
            Self::Boolean(b) => *b as u64,
            Self::Str(s) => fnv1a(s.as_bytes()),
            _ => return None,
        };
        Some(HashKey {
            kind: self.kind(),
            value,
        })
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Str(s) => f.write_str(s),
            Self::Null => f.write_str("null"),
            Self::Return(inner) => write!(f, "{inner}"),
            Self::Error(msg) => write!(f, "Error: {msg}"),
            Self::Function(func) => write!(f, "{func}"),
            Self::Builtin(_) => f.write_str("builtin function"),
            Self::Array(elements) => {
                let elements: Vec<String> = elements.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            Self::Hash(pairs) => {
                let pairs: Vec<String> = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key, pair.value))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_keys_agree_for_equal_values() {
        let one = Object::Str("Hello World".to_string());
        let two = Object::Str("Hello World".to_string());
        assert_eq!(one.hash_key(), two.hash_key());

        let other = Object::Str("hello world".to_string());
        assert_ne!(one.hash_key(), other.hash_key());
    }

    #[test]
    fn hash_keys_carry_the_kind() {
        assert_ne!(
            Object::Integer(1).hash_key(),
            Object::Boolean(true).hash_key()
        );
        assert_eq!(
            Object::Boolean(false).hash_key(),
            Some(HashKey {
                kind: ObjectKind::Boolean,
                value: 0,
            })
        );
    }

    #[test]
    fn unhashable_kinds() {
        assert_eq!(Object::Null.hash_key(), None);
        assert_eq!(Object::Array(vec![]).hash_key(), None);
    }

    #[test]
    fn inspect_forms() {
        assert_eq!(Object::Integer(-3).to_string(), "-3");
        assert_eq!(Object::Str("raw".to_string()).to_string(), "raw");
        assert_eq!(Object::Null.to_string(), "null");
        assert_eq!(
            Object::Return(Box::new(Object::Boolean(true))).to_string(),
            "true"
        );
        assert_eq!(
            Object::Error("type mismatch".to_string()).to_string(),
            "Error: type mismatch"
        );
        assert_eq!(
            Object::Array(vec![Object::Integer(1), Object::Str("two".to_string())]).to_string(),
            "[1, two]"
        );
    }
}
