use std::io::{self, BufRead};

use crate::object::{Builtin, BuiltinFn, Object};

/// Resolves a builtin by name. Consulted by the evaluator only after the
/// environment chain misses, so any builtin can be shadowed with `let`.
pub fn lookup(name: &str) -> Option<Object> {
    let (name, func): (&'static str, BuiltinFn) = match name {
        "len" => ("len", len),
        "first" => ("first", first),
        "last" => ("last", last),
        "rest" => ("rest", rest),
        "push" => ("push", push),
        "print" => ("print", print),
        "read" => ("read", read),
        "int" => ("int", int),
        _ => return None,
    };
    Some(Object::Builtin(Builtin { name, func }))
}

fn check_arity(args: &[Object], want: usize) -> Option<Object> {
    (args.len() != want).then(|| {
        Object::Error(format!(
            "wrong number of arguments. got={}, want={want}",
            args.len()
        ))
    })
}

/// String length in bytes, array length in elements.
fn len(args: Vec<Object>) -> Object {
    if let Some(err) = check_arity(&args, 1) {
        return err;
    }
    match &args[0] {
        Object::Str(s) => Object::Integer(s.len() as i64),
        Object::Array(elements) => Object::Integer(elements.len() as i64),
        arg => Object::Error(format!(
            "argument to `len` not supported, got {}",
            arg.kind()
        )),
    }
}

fn first(args: Vec<Object>) -> Object {
    if let Some(err) = check_arity(&args, 1) {
        return err;
    }
    match &args[0] {
        Object::Array(elements) => elements.first().cloned().unwrap_or(Object::Null),
        Object::Str(s) => Object::Str(byte_slice(s.as_bytes().first())),
        arg => Object::Error(format!(
            "argument to `first` not supported, got {}",
            arg.kind()
        )),
    }
}

fn last(args: Vec<Object>) -> Object {
    if let Some(err) = check_arity(&args, 1) {
        return err;
    }
    match &args[0] {
        Object::Array(elements) => elements.last().cloned().unwrap_or(Object::Null),
        Object::Str(s) => Object::Str(byte_slice(s.as_bytes().last())),
        arg => Object::Error(format!(
            "argument to `last` not supported, got {}",
            arg.kind()
        )),
    }
}

fn rest(args: Vec<Object>) -> Object {
    if let Some(err) = check_arity(&args, 1) {
        return err;
    }
    match &args[0] {
        Object::Array(elements) if elements.is_empty() => Object::Array(Vec::new()),
        Object::Array(elements) => Object::Array(elements[1..].to_vec()),
        arg => Object::Error(format!(
            "argument to `rest` not supported, got {}",
            arg.kind()
        )),
    }
}

/// Returns a new array; the argument is never mutated.
fn push(args: Vec<Object>) -> Object {
    if let Some(err) = check_arity(&args, 2) {
        return err;
    }
    match &args[0] {
        Object::Array(elements) => {
            let mut elements = elements.clone();
            elements.push(args[1].clone());
            Object::Array(elements)
        }
        arg => Object::Error(format!(
            "argument to `push` not supported, got {}",
            arg.kind()
        )),
    }
}

fn print(args: Vec<Object>) -> Object {
    let line: Vec<String> = args.iter().map(ToString::to_string).collect();
    println!("{}", line.join(" "));
    Object::Null
}

/// Blocks until a full line arrives on standard input. EOF yields an
/// empty string.
fn read(args: Vec<Object>) -> Object {
    if let Some(err) = check_arity(&args, 0) {
        return err;
    }
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            if line.ends_with('\n') {
                line.pop();
            }
            if line.ends_with('\r') {
                line.pop();
            }
            Object::Str(line)
        }
        Err(err) => Object::Error(format!("impossible to read from stdin: {err}")),
    }
}

fn int(args: Vec<Object>) -> Object {
    if let Some(err) = check_arity(&args, 1) {
        return err;
    }
    match &args[0] {
        Object::Integer(n) => Object::Integer(*n),
        Object::Boolean(b) => Object::Integer(i64::from(*b)),
        Object::Str(s) => match s.parse() {
            Ok(n) => Object::Integer(n),
            Err(_) => Object::Error(format!("could not parse {s:?} as integer")),
        },
        arg => Object::Error(format!(
            "argument to `int` not supported, got {}",
            arg.kind()
        )),
    }
}

fn byte_slice(byte: Option<&u8>) -> String {
    byte.map(|&b| String::from_utf8_lossy(&[b]).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(elements: Vec<Object>) -> Object {
        Object::Array(elements)
    }

    #[test]
    fn len_of_strings_and_arrays() {
        assert_eq!(
            len(vec![Object::Str("hello".to_string())]),
            Object::Integer(5)
        );
        assert_eq!(
            len(vec![array(vec![Object::Integer(1), Object::Integer(2)])]),
            Object::Integer(2)
        );
        assert_eq!(
            len(vec![Object::Integer(1)]),
            Object::Error("argument to `len` not supported, got INTEGER".to_string())
        );
    }

    #[test]
    fn arity_errors_report_the_wanted_count() {
        assert_eq!(
            len(vec![]),
            Object::Error("wrong number of arguments. got=0, want=1".to_string())
        );
        assert_eq!(
            push(vec![array(vec![])]),
            Object::Error("wrong number of arguments. got=1, want=2".to_string())
        );
    }

    #[test]
    fn first_and_last() {
        let arr = array(vec![Object::Integer(1), Object::Integer(2)]);
        assert_eq!(first(vec![arr.clone()]), Object::Integer(1));
        assert_eq!(last(vec![arr]), Object::Integer(2));
        assert_eq!(first(vec![array(vec![])]), Object::Null);
        assert_eq!(last(vec![array(vec![])]), Object::Null);
        assert_eq!(
            first(vec![Object::Str("abc".to_string())]),
            Object::Str("a".to_string())
        );
        assert_eq!(
            last(vec![Object::Str("abc".to_string())]),
            Object::Str("c".to_string())
        );
        assert_eq!(
            first(vec![Object::Str(String::new())]),
            Object::Str(String::new())
        );
    }

    #[test]
    fn rest_returns_a_new_tail() {
        assert_eq!(
            rest(vec![array(vec![Object::Integer(1), Object::Integer(2)])]),
            array(vec![Object::Integer(2)])
        );
        assert_eq!(rest(vec![array(vec![])]), array(vec![]));
        assert_eq!(
            rest(vec![Object::Null]),
            Object::Error("argument to `rest` not supported, got NULL".to_string())
        );
    }

    #[test]
    fn push_leaves_the_original_untouched() {
        let original = array(vec![Object::Integer(1)]);
        let pushed = push(vec![original.clone(), Object::Integer(2)]);
        assert_eq!(
            pushed,
            array(vec![Object::Integer(1), Object::Integer(2)])
        );
        assert_eq!(original, array(vec![Object::Integer(1)]));
    }

    #[test]
    fn int_conversions() {
        assert_eq!(
            int(vec![Object::Str("42".to_string())]),
            Object::Integer(42)
        );
        assert_eq!(int(vec![Object::Integer(-7)]), Object::Integer(-7));
        assert_eq!(int(vec![Object::Boolean(true)]), Object::Integer(1));
        assert_eq!(int(vec![Object::Boolean(false)]), Object::Integer(0));
        assert_eq!(
            int(vec![Object::Str("forty".to_string())]),
            Object::Error("could not parse \"forty\" as integer".to_string())
        );
        assert_eq!(
            int(vec![Object::Null]),
            Object::Error("argument to `int` not supported, got NULL".to_string())
        );
    }

    #[test]
    fn lookup_resolves_known_names_only() {
        assert!(lookup("len").is_some());
        assert!(lookup("push").is_some());
        assert!(lookup("missing").is_none());
    }
}
