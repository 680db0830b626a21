use std::{cell::RefCell, collections::HashMap, rc::Rc};

use cube_syntax::ast::{Block, Expr, InfixOp, PrefixOp, Program, Stmt};

use crate::{
    builtins,
    environment::Env,
    object::{Func, HashPair, Object},
};

/// Recursive tree walker. The environment handle is swapped around block
/// and call boundaries; the root environment survives across programs,
/// which is what keeps REPL state alive.
#[derive(Debug, Default)]
pub struct Evaluator {
    pub env: Rc<RefCell<Env>>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self { env: Env::new() }
    }

    /// Evaluates a program to its final value, unwrapping a `return` and
    /// stopping at the first error.
    pub fn eval_program(&mut self, program: &Program) -> Object {
        let mut result = Object::Null;
        for stmt in &program.statements {
            let Some(value) = self.eval_statement(stmt) else {
                continue;
            };
            match value {
                Object::Return(inner) => return *inner,
                err @ Object::Error(_) => return err,
                value => result = value,
            }
        }
        result
    }

    /// `None` marks a non-emitting step (a successful `let`): it leaves
    /// the surrounding program/block result untouched.
    fn eval_statement(&mut self, stmt: &Stmt) -> Option<Object> {
        match stmt {
            Stmt::Expression(expr) => Some(self.eval_expression(expr)),
            Stmt::Let { name, value } => {
                let value = self.eval_expression(value);
                if value.is_error() {
                    return Some(value);
                }
                self.env.borrow_mut().set(name.clone(), value);
                None
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expression(expr),
                    None => Object::Null,
                };
                if value.is_error() {
                    return Some(value);
                }
                Some(Object::Return(Box::new(value)))
            }
        }
    }

    /// Blocks pass `Return` and `Error` through untouched; unwrapping
    /// happens only at the program and call boundaries. An empty (or
    /// all-`let`) block is `null`.
    fn eval_block(&mut self, block: &Block) -> Object {
        let mut result = Object::Null;
        for stmt in &block.statements {
            let Some(value) = self.eval_statement(stmt) else {
                continue;
            };
            if matches!(value, Object::Return(_) | Object::Error(_)) {
                return value;
            }
            result = value;
        }
        result
    }

    fn eval_expression(&mut self, expr: &Expr) -> Object {
        match expr {
            Expr::Integer(n) => Object::Integer(*n),
            Expr::Boolean(b) => Object::Boolean(*b),
            Expr::Str(s) => Object::Str(s.clone()),
            Expr::Ident(name) => self.eval_identifier(name),
            Expr::Prefix { op, right } => {
                let right = self.eval_expression(right);
                if right.is_error() {
                    return right;
                }
                eval_prefix_expression(*op, right)
            }
            Expr::Infix { left, op, right } => {
                let left = self.eval_expression(left);
                if left.is_error() {
                    return left;
                }
                let right = self.eval_expression(right);
                if right.is_error() {
                    return right;
                }
                eval_infix_expression(*op, left, right)
            }
            Expr::If {
                condition,
                consequence,
                alternative,
            } => self.eval_if_expression(condition, consequence, alternative.as_ref()),
            Expr::Function { params, body } => Object::Function(Func {
                params: params.clone(),
                body: body.clone(),
                env: Rc::clone(&self.env),
            }),
            Expr::Call { func, args } => self.eval_call_expression(func, args),
            Expr::Array(elements) => match self.eval_expressions(elements) {
                Ok(elements) => Object::Array(elements),
                Err(err) => err,
            },
            Expr::Hash(entries) => self.eval_hash_literal(entries),
            Expr::Index { left, index } => self.eval_index_expression(left, index),
        }
    }

    fn eval_identifier(&self, name: &str) -> Object {
        self.env
            .borrow()
            .get(name)
            .or_else(|| builtins::lookup(name))
            .unwrap_or_else(|| Object::Error(format!("identifier not found: {name}")))
    }

    fn eval_if_expression(
        &mut self,
        condition: &Expr,
        consequence: &Block,
        alternative: Option<&Block>,
    ) -> Object {
        let condition = self.eval_expression(condition);
        if condition.is_error() {
            return condition;
        }
        if condition.is_truthy() {
            self.eval_block(consequence)
        } else if let Some(alternative) = alternative {
            self.eval_block(alternative)
        } else {
            Object::Null
        }
    }

    fn eval_call_expression(&mut self, func: &Expr, args: &[Expr]) -> Object {
        let func = self.eval_expression(func);
        if func.is_error() {
            return func;
        }
        let args = match self.eval_expressions(args) {
            Ok(args) => args,
            Err(err) => return err,
        };
        self.apply_function(func, args)
    }

    fn apply_function(&mut self, func: Object, args: Vec<Object>) -> Object {
        match func {
            Object::Function(func) => {
                if args.len() != func.params.len() {
                    return Object::Error(format!(
                        "wrong number of arguments. got={}, want={}",
                        args.len(),
                        func.params.len()
                    ));
                }
                // Parameters bind in a child of the *captured* environment,
                // not the caller's; this is what makes closures lexical.
                let env = Env::with_parent(Rc::clone(&func.env));
                for (param, arg) in func.params.iter().zip(args) {
                    env.borrow_mut().set(param.clone(), arg);
                }
                let caller_env = std::mem::replace(&mut self.env, env);
                let result = self.eval_block(&func.body);
                self.env = caller_env;
                match result {
                    Object::Return(inner) => *inner,
                    result => result,
                }
            }
            Object::Builtin(builtin) => (builtin.func)(args),
            other => Object::Error(format!("not a function: {}", other.kind())),
        }
    }

    /// Left-to-right; the first error aborts the whole list.
    fn eval_expressions(&mut self, exprs: &[Expr]) -> Result<Vec<Object>, Object> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let value = self.eval_expression(expr);
            if value.is_error() {
                return Err(value);
            }
            values.push(value);
        }
        Ok(values)
    }

    fn eval_hash_literal(&mut self, entries: &[(Expr, Expr)]) -> Object {
        let mut pairs = HashMap::new();
        for (key_expr, value_expr) in entries {
            let key = self.eval_expression(key_expr);
            if key.is_error() {
                return key;
            }
            let Some(hash_key) = key.hash_key() else {
                return Object::Error(format!("not hashable key: {}", key.kind()));
            };
            let value = self.eval_expression(value_expr);
            if value.is_error() {
                return value;
            }
            // Duplicate keys: last entry in source order wins
            pairs.insert(hash_key, HashPair { key, value });
        }
        Object::Hash(pairs)
    }

    fn eval_index_expression(&mut self, left: &Expr, index: &Expr) -> Object {
        let left = self.eval_expression(left);
        if left.is_error() {
            return left;
        }
        let index = self.eval_expression(index);
        if index.is_error() {
            return index;
        }
        match (&left, &index) {
            (Object::Array(elements), Object::Integer(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| elements.get(i).cloned())
                .unwrap_or(Object::Null),
            (Object::Hash(pairs), key) => match key.hash_key() {
                Some(hash_key) => pairs
                    .get(&hash_key)
                    .map(|pair| pair.value.clone())
                    .unwrap_or(Object::Null),
                None => Object::Error(format!("not hashable key: {}", key.kind())),
            },
            _ => Object::Error(format!("index operator not supported: {}", left.kind())),
        }
    }
}

fn eval_prefix_expression(op: PrefixOp, right: Object) -> Object {
    match op {
        PrefixOp::Bang => eval_bang_expression(right),
        PrefixOp::Minus => match right {
            Object::Integer(n) => Object::Integer(-n),
            right => Object::Error(format!("unknown operator: -{}", right.kind())),
        },
    }
}

fn eval_bang_expression(right: Object) -> Object {
    match right {
        Object::Boolean(b) => Object::Boolean(!b),
        Object::Null => Object::Boolean(true),
        Object::Integer(n) => Object::Boolean(n == 0),
        _ => Object::Boolean(false),
    }
}

fn eval_infix_expression(op: InfixOp, left: Object, right: Object) -> Object {
    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix(op, *l, *r),
        (Object::Boolean(l), Object::Boolean(r)) => eval_boolean_infix(op, *l, *r),
        (Object::Str(l), Object::Str(r)) => eval_string_infix(op, l, r),
        _ if left.kind() != right.kind() => Object::Error(format!(
            "type mismatch: {} {op} {}",
            left.kind(),
            right.kind()
        )),
        _ => Object::Error(format!(
            "unknown operator: {} {op} {}",
            left.kind(),
            right.kind()
        )),
    }
}

fn eval_integer_infix(op: InfixOp, left: i64, right: i64) -> Object {
    match op {
        InfixOp::Plus => Object::Integer(left + right),
        InfixOp::Minus => Object::Integer(left - right),
        InfixOp::Asterisk => Object::Integer(left * right),
        InfixOp::Slash => {
            if right == 0 {
                Object::Error("division by zero".to_string())
            } else {
                Object::Integer(left / right)
            }
        }
        InfixOp::Lt => Object::Boolean(left < right),
        InfixOp::Gt => Object::Boolean(left > right),
        InfixOp::Eq => Object::Boolean(left == right),
        InfixOp::Ne => Object::Boolean(left != right),
    }
}

fn eval_boolean_infix(op: InfixOp, left: bool, right: bool) -> Object {
    match op {
        InfixOp::Eq => Object::Boolean(left == right),
        InfixOp::Ne => Object::Boolean(left != right),
        _ => Object::Error(format!("unknown operator: BOOLEAN {op} BOOLEAN")),
    }
}

fn eval_string_infix(op: InfixOp, left: &str, right: &str) -> Object {
    match op {
        InfixOp::Plus => Object::Str(format!("{left}{right}")),
        InfixOp::Eq => Object::Boolean(left == right),
        _ => Object::Error(format!("unknown operator: STRING {op} STRING")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{HashKey, ObjectKind};
    use cube_syntax::{lex::Lexer, parse::Parser};

    fn eval_source(input: &str) -> Object {
        let mut parser = Parser::new(Lexer::new(input));
        let program = parser.parse_program();
        assert!(
            parser.errors().is_empty(),
            "parse errors for {input:?}: {:?}",
            parser.errors()
        );
        Evaluator::new().eval_program(&program)
    }

    fn eval_test(input: &str, expected: Object) {
        assert_eq!(eval_source(input), expected, "input {input:?}");
    }

    fn error_test(input: &str, message: &str) {
        eval_test(input, Object::Error(message.to_string()));
    }

    #[test]
    fn integer_expressions() {
        for (input, expected) in [
            ("5", 5),
            ("-5", -5),
            ("--5", 5),
            ("5 + 5 + 5 + 5 - 10", 10),
            ("2 * 2 * 2 * 2 * 2", 32),
            ("50 / 2 * 2 + 10", 60),
            ("3 * (3 * 3) + 10", 37),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
            ("-7 / 2", -3),
        ] {
            eval_test(input, Object::Integer(expected));
        }
    }

    #[test]
    fn boolean_expressions() {
        for (input, expected) in [
            ("true", true),
            ("false", false),
            ("1 < 2", true),
            ("1 > 2", false),
            ("1 == 1", true),
            ("1 != 1", false),
            ("true == true", true),
            ("true != false", true),
            ("(1 < 2) == true", true),
            ("(1 > 2) == true", false),
            ("\"a\" == \"a\"", true),
            ("\"a\" == \"b\"", false),
        ] {
            eval_test(input, Object::Boolean(expected));
        }
    }

    #[test]
    fn bang_operator() {
        for (input, expected) in [
            ("!true", false),
            ("!false", true),
            ("!!true", true),
            ("!0", true),
            ("!5", false),
            ("!!5", true),
            ("!\"\"", false),
            ("![]", false),
            ("!if (false) { 1 }", true),
        ] {
            eval_test(input, Object::Boolean(expected));
        }
    }

    #[test]
    fn if_else_expressions() {
        for (input, expected) in [
            ("if (true) { 10 }", Object::Integer(10)),
            ("if (false) { 10 }", Object::Null),
            ("if (1) { 10 }", Object::Integer(10)),
            ("if (1 < 2) { 10 } else { 20 }", Object::Integer(10)),
            ("if (1 > 2) { 10 } else { 20 }", Object::Integer(20)),
            ("if (1 > 2) { 10 }", Object::Null),
            ("if (true) {}", Object::Null),
            ("if (\"\") { 10 }", Object::Integer(10)),
            ("if ([]) { 10 }", Object::Integer(10)),
        ] {
            eval_test(input, expected);
        }
    }

    #[test]
    fn truthiness_matches_branching() {
        for value in ["0", "1", "true", "false", "\"\"", "\"x\"", "[]", "{}"] {
            let negated = eval_source(&format!("!!{value}"));
            let branched = eval_source(&format!("if ({value}) {{ true }} else {{ false }}"));
            assert_eq!(negated, branched, "value {value:?}");
        }
    }

    #[test]
    fn return_statements() {
        for (input, expected) in [
            ("return 10;", 10),
            ("return 10; 9;", 10),
            ("return 2 * 5; 9;", 10),
            ("9; return 2 * 5; 9;", 10),
            ("if (10 > 1) { if (10 > 1) { return 10; } return 1; }", 10),
        ] {
            eval_test(input, Object::Integer(expected));
        }
        eval_test("return;", Object::Null);
    }

    #[test]
    fn let_statements() {
        for (input, expected) in [
            ("let a = 5; a;", 5),
            ("let a = 5 * 5; a;", 25),
            ("let a = 5; let b = a; b;", 5),
            ("let a = 5; let b = a; let c = a + b + 5; c;", 15),
        ] {
            eval_test(input, Object::Integer(expected));
        }
    }

    #[test]
    fn trailing_let_is_non_emitting() {
        eval_test("let a = 5;", Object::Null);
        eval_test("7; let a = 5;", Object::Integer(7));
        eval_test("if (true) { 7; let a = 5; }", Object::Integer(7));
    }

    #[test]
    fn error_taxonomy() {
        for (input, message) in [
            ("foo", "identifier not found: foo"),
            ("5 + true", "type mismatch: INTEGER + BOOLEAN"),
            ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN"),
            ("-true", "unknown operator: -BOOLEAN"),
            ("true + false", "unknown operator: BOOLEAN + BOOLEAN"),
            ("5; true + false; 5", "unknown operator: BOOLEAN + BOOLEAN"),
            (
                "if (10 > 1) { true + false; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("\"a\" - \"b\"", "unknown operator: STRING - STRING"),
            ("\"a\" != \"b\"", "unknown operator: STRING != STRING"),
            ("5(1)", "not a function: INTEGER"),
            ("5 / 0", "division by zero"),
            ("{\"name\": \"cube\"}[fn(x) { x }]", "not hashable key: FUNCTION"),
            ("{[1]: 2}", "not hashable key: ARRAY"),
            ("5[0]", "index operator not supported: INTEGER"),
            ("\"s\"[0]", "index operator not supported: STRING"),
            ("let f = fn(x) { x }; f(1, 2)", "wrong number of arguments. got=2, want=1"),
            ("let f = fn(x) { x }; f()", "wrong number of arguments. got=0, want=1"),
        ] {
            error_test(input, message);
        }
    }

    #[test]
    fn errors_propagate_through_nesting() {
        error_test(
            "let a = [1, foo, 3];",
            "identifier not found: foo",
        );
        error_test(
            "{\"k\": foo}",
            "identifier not found: foo",
        );
        error_test(
            "len(foo)",
            "identifier not found: foo",
        );
        error_test(
            "if (foo) { 1 }",
            "identifier not found: foo",
        );
        error_test(
            "return foo;",
            "identifier not found: foo",
        );
        error_test(
            "let x = foo; 5",
            "identifier not found: foo",
        );
    }

    #[test]
    fn function_values() {
        let Object::Function(func) = eval_source("fn(x) { x + 2 }") else {
            panic!("expected a function value");
        };
        assert_eq!(func.params, vec!["x".to_string()]);
        assert_eq!(func.body.to_string(), "{ (x + 2) }");
    }

    #[test]
    fn function_application() {
        for (input, expected) in [
            ("let identity = fn(x) { x; }; identity(5);", 5),
            ("let identity = fn(x) { return x; }; identity(5);", 5),
            ("let double = fn(x) { x * 2; }; double(5);", 10),
            ("let add = fn(x, y) { x + y; }; add(5, 5);", 10),
            ("let add = fn(a,b) { a + b }; add(2, add(3,4));", 9),
            ("fn(x) { x; }(5)", 5),
            ("fn(x) { if (x < 2) { return 1 } return x * 2 }(5)", 10),
        ] {
            eval_test(input, Object::Integer(expected));
        }
    }

    #[test]
    fn empty_function_body_returns_null() {
        eval_test("fn() {}()", Object::Null);
    }

    #[test]
    fn closures_capture_their_definition_scope() {
        eval_test(
            "let makeAdder = fn(x) { fn(y) { x + y } };
             let add3 = makeAdder(3);
             add3(4);",
            Object::Integer(7),
        );
        // The captured binding wins over the caller's scope
        eval_test(
            "let x = 100;
             let f = fn() { x };
             let call = fn(x) { f() };
             call(1);",
            Object::Integer(100),
        );
    }

    #[test]
    fn recursion_through_the_environment() {
        eval_test(
            "let fact = fn(n) { if (n < 2) { return 1 } n * fact(n - 1) };
             fact(5);",
            Object::Integer(120),
        );
    }

    #[test]
    fn string_concatenation() {
        eval_test(
            "\"hello\" + \" \" + \"world\"",
            Object::Str("hello world".to_string()),
        );
    }

    #[test]
    fn array_literals_and_indexing() {
        eval_test(
            "[1, 2 * 2, 3 + 3]",
            Object::Array(vec![
                Object::Integer(1),
                Object::Integer(4),
                Object::Integer(6),
            ]),
        );
        for (input, expected) in [
            ("[1, 2, 3][0]", Object::Integer(1)),
            ("[1, 2, 3][2]", Object::Integer(3)),
            ("let i = 0; [1][i]", Object::Integer(1)),
            ("let a = [1, 2, 3]; a[1] + a[2]", Object::Integer(5)),
            ("[1, 2, 3][3]", Object::Null),
            ("[1, 2, 3][-1]", Object::Null),
        ] {
            eval_test(input, expected);
        }
    }

    #[test]
    fn hash_literals() {
        let result = eval_source(
            "let two = \"two\";
             {\"one\": 10 - 9, two: 1 + 1, \"thr\" + \"ee\": 6 / 2, 4: 4, true: 5, false: 6}",
        );
        let Object::Hash(pairs) = result else {
            panic!("expected a hash, got {result:?}");
        };
        let expected: Vec<(Object, i64)> = vec![
            (Object::Str("one".to_string()), 1),
            (Object::Str("two".to_string()), 2),
            (Object::Str("three".to_string()), 3),
            (Object::Integer(4), 4),
            (Object::Boolean(true), 5),
            (Object::Boolean(false), 6),
        ];
        assert_eq!(pairs.len(), expected.len());
        for (key, value) in expected {
            let pair = pairs
                .get(&key.hash_key().unwrap())
                .unwrap_or_else(|| panic!("missing key {key}"));
            assert_eq!(pair.value, Object::Integer(value));
        }
    }

    #[test]
    fn hash_duplicate_keys_last_wins() {
        let result = eval_source("{\"k\": 1, \"k\": 2}");
        let Object::Hash(pairs) = result else {
            panic!("expected a hash, got {result:?}");
        };
        let key = Object::Str("k".to_string()).hash_key().unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[&key].value, Object::Integer(2));
    }

    #[test]
    fn hash_indexing() {
        for (input, expected) in [
            ("{\"name\": \"cube\"}[\"name\"]", Object::Str("cube".to_string())),
            ("{1: true}[1]", Object::Boolean(true)),
            ("{true: \"yes\"}[true]", Object::Str("yes".to_string())),
            ("{}[\"missing\"]", Object::Null),
            ("{\"name\": \"cube\"}[false]", Object::Null),
            ("let key = \"k\"; {\"k\": 5}[key]", Object::Integer(5)),
        ] {
            eval_test(input, expected);
        }
    }

    #[test]
    fn integer_and_boolean_keys_do_not_collide() {
        assert_ne!(
            Object::Integer(1).hash_key().unwrap(),
            Object::Boolean(true).hash_key().unwrap()
        );
        assert_eq!(
            Object::Integer(1).hash_key().unwrap(),
            HashKey {
                kind: ObjectKind::Integer,
                value: 1,
            }
        );
    }

    #[test]
    fn builtins_through_the_evaluator() {
        for (input, expected) in [
            ("len(\"\")", Object::Integer(0)),
            ("len(\"four\")", Object::Integer(4)),
            ("len([1, 2, 3])", Object::Integer(3)),
            ("first([7, 8])", Object::Integer(7)),
            ("last([7, 8])", Object::Integer(8)),
            ("rest([7, 8, 9])", Object::Array(vec![Object::Integer(8), Object::Integer(9)])),
            ("int(\"42\") + 1", Object::Integer(43)),
            ("int(true)", Object::Integer(1)),
        ] {
            eval_test(input, expected);
        }
        error_test("len(1)", "argument to `len` not supported, got INTEGER");
        error_test(
            "len(\"one\", \"two\")",
            "wrong number of arguments. got=2, want=1",
        );
    }

    #[test]
    fn push_does_not_mutate() {
        eval_test(
            "let a = [1, 2, 3]; push(a, 4); len(a);",
            Object::Integer(3),
        );
        eval_test(
            "let a = [1]; let b = push(a, 2); len(b);",
            Object::Integer(2),
        );
    }

    #[test]
    fn builtins_are_shadowable() {
        eval_test("let len = 5; len", Object::Integer(5));
        eval_test(
            "let f = fn(len) { len + 1 }; f(1)",
            Object::Integer(2),
        );
        // A shadow in an inner scope does not leak back out
        eval_test(
            "let f = fn() { let len = 0; len }; f(); len(\"ab\")",
            Object::Integer(2),
        );
    }

    #[test]
    fn scenario_pipeline() {
        eval_test("let x = 5; let y = 10; x + y;", Object::Integer(15));
        let result = eval_source(
            "let map = fn(arr, f) {
                 let iter = fn(arr, acc) {
                     if (len(arr) == 0) { acc } else { iter(rest(arr), push(acc, f(first(arr)))) }
                 };
                 iter(arr, []);
             };
             map([1, 2, 3], fn(x) { x * 2 })",
        );
        assert_eq!(
            result,
            Object::Array(vec![
                Object::Integer(2),
                Object::Integer(4),
                Object::Integer(6),
            ])
        );
    }

    #[test]
    fn evaluator_keeps_state_across_programs() {
        let mut evaluator = Evaluator::new();
        for (input, expected) in [
            ("let x = 41;", Object::Null),
            ("let bump = fn(n) { n + 1 };", Object::Null),
            ("bump(x)", Object::Integer(42)),
        ] {
            let mut parser = Parser::new(Lexer::new(input));
            let program = parser.parse_program();
            assert!(parser.errors().is_empty());
            assert_eq!(evaluator.eval_program(&program), expected);
        }
    }
}
