//! # sx evaluation
//!
//! Tree-walking evaluation of parsed sx programs. Forms whose head is a
//! special-form name get their arguments unevaluated; every other form is a
//! call whose head and arguments are evaluated left to right before applying.
//!
//! Errors raised while evaluating are `Thrown` values, not `DoctestError`s:
//! they belong to the program under test and are what doctests compare.

use im::{OrdMap, Vector};
use std::rc::Rc;

use crate::ast::{AstNode, Expr};
use crate::runtime::env::{Env, WeakEnv};
use crate::runtime::value::{Lambda, MapKey, Thrown, Value};

/// Call depth at which evaluation gives up with a `RecursionError`.
pub const DEFAULT_MAX_DEPTH: usize = 256;

// ============================================================================
// CORE DATA STRUCTURES: Evaluation Context
// ============================================================================

/// Captured-scope count below which dead entries are not pruned.
const CAPTURE_PRUNE_MIN: usize = 64;

/// State threaded through one program run.
#[derive(Debug)]
pub struct EvaluationContext {
    pub depth: usize,
    pub max_depth: usize,
    /// Values published with `export!`.
    pub exports: OrdMap<String, Value>,
    /// Scopes closed over by lambdas created during the run.
    captured: Vec<WeakEnv>,
    prune_at: usize,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self {
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            exports: OrdMap::new(),
            captured: Vec::new(),
            prune_at: CAPTURE_PRUNE_MIN,
        }
    }
}

type SpecialForm = fn(&mut EvaluationContext, &[AstNode], &Env) -> Result<Value, Thrown>;

fn special_form(name: &str) -> Option<SpecialForm> {
    let form: SpecialForm = match name {
        "quote" => EvaluationContext::eval_quote,
        "if" => EvaluationContext::eval_if,
        "do" => EvaluationContext::eval_do,
        "define" => EvaluationContext::eval_define,
        "set!" => EvaluationContext::eval_set,
        "fn" => EvaluationContext::eval_fn,
        "let" => EvaluationContext::eval_let,
        "and" => EvaluationContext::eval_and,
        "or" => EvaluationContext::eval_or,
        "export!" => EvaluationContext::eval_export,
        _ => return None,
    };
    Some(form)
}

// ============================================================================
// EVALUATION
// ============================================================================

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scopes closed over by lambdas, as weak handles.
    pub fn captured_scopes(&self) -> &[WeakEnv] {
        &self.captured
    }

    /// Clears every scope a lambda of this run closed over.
    ///
    /// A lambda stored in the scope it captured keeps that scope alive
    /// forever; clearing the scopes once the run is over frees them.
    pub fn release_scopes(&mut self) {
        for scope in self.captured.drain(..).filter_map(|weak| weak.upgrade()) {
            scope.clear();
        }
    }

    fn capture(&mut self, env: &Env) {
        if self.captured.last().is_some_and(|last| last.points_to(env)) {
            return;
        }
        if self.captured.len() >= self.prune_at {
            self.captured.retain(WeakEnv::is_live);
            self.prune_at = (self.captured.len() * 2).max(CAPTURE_PRUNE_MIN);
        }
        self.captured.push(env.downgrade());
    }

    /// Builds a lambda over `env` and records the capture.
    fn closure(&mut self, name: Option<&str>, params: &[AstNode], body: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        let lambda = make_lambda(name, params, body, env)?;
        self.capture(env);
        Ok(lambda)
    }

    /// Evaluates top-level forms in order, returning the last value.
    pub fn eval_program(&mut self, nodes: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        self.eval_body(nodes, env)
    }

    pub fn eval(&mut self, node: &AstNode, env: &Env) -> Result<Value, Thrown> {
        match &*node.value {
            Expr::Nil => Ok(Value::Nil),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Keyword(k) => Ok(Value::Keyword(k.clone())),
            Expr::Symbol(name) => env
                .get(name)
                .ok_or_else(|| Thrown::error("ReferenceError", format!("{name} is not defined"))),
            Expr::Vector(items) => items
                .iter()
                .map(|item| self.eval(item, env))
                .collect::<Result<Vector<_>, _>>()
                .map(Value::List),
            Expr::Map(items) => self.eval_map(items, env),
            Expr::Quote(inner) => Ok(quote_value(inner)),
            Expr::List(items) => self.eval_form(items, env),
        }
    }

    /// Evaluates a sequence of forms, returning the last value (`nil` if empty).
    pub fn eval_body(&mut self, body: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        let mut result = Value::Nil;
        for node in body {
            result = self.eval(node, env)?;
        }
        Ok(result)
    }

    /// Calls a function value with already evaluated arguments.
    pub fn apply(&mut self, callee: &Value, args: &[Value]) -> Result<Value, Thrown> {
        match callee {
            Value::Native(native) => (native.func)(self, args),
            Value::Lambda(lambda) => self.apply_lambda(lambda, args),
            other => Err(Thrown::type_error(format!("{other} is not callable"))),
        }
    }

    fn apply_lambda(&mut self, lambda: &Lambda, args: &[Value]) -> Result<Value, Thrown> {
        if self.depth >= self.max_depth {
            return Err(Thrown::error(
                "RecursionError",
                format!("maximum call depth of {} exceeded", self.max_depth),
            ));
        }

        let arity_ok = match lambda.rest {
            Some(_) => args.len() >= lambda.params.len(),
            None => args.len() == lambda.params.len(),
        };
        if !arity_ok {
            let expected = match lambda.rest {
                Some(_) => format!("at least {}", lambda.params.len()),
                None => lambda.params.len().to_string(),
            };
            let name = lambda.name.as_deref().unwrap_or("fn");
            return Err(Thrown::arity(name, &expected, args.len()));
        }

        let env = lambda.env.child();
        for (param, arg) in lambda.params.iter().zip(args) {
            env.define(param, arg.clone());
        }
        if let Some(rest) = &lambda.rest {
            env.define(rest, Value::list(args[lambda.params.len()..].iter().cloned()));
        }

        self.depth += 1;
        let result = self.eval_body(&lambda.body, &env);
        self.depth -= 1;
        result
    }

    fn eval_form(&mut self, items: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        let Some((head, args)) = items.split_first() else {
            return Ok(Value::List(Vector::new()));
        };
        if let Some(form) = head.value.as_symbol().and_then(special_form) {
            return form(self, args, env);
        }

        let callee = self.eval(head, env)?;
        let args = args
            .iter()
            .map(|arg| self.eval(arg, env))
            .collect::<Result<Vec<_>, _>>()?;
        self.apply(&callee, &args)
    }

    fn eval_map(&mut self, items: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        if items.len() % 2 != 0 {
            return Err(syntax_error("map literal needs an even number of forms"));
        }
        let mut map = OrdMap::new();
        for pair in items.chunks(2) {
            let key = self.eval(&pair[0], env)?;
            let key = MapKey::from_value(&key).ok_or_else(|| {
                Thrown::type_error(format!(
                    "map keys must be keywords or strings, got {}",
                    key.type_name()
                ))
            })?;
            let value = self.eval(&pair[1], env)?;
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }
}

// ============================================================================
// SPECIAL FORMS
// ============================================================================

impl EvaluationContext {
    fn eval_quote(&mut self, args: &[AstNode], _env: &Env) -> Result<Value, Thrown> {
        match args {
            [quoted] => Ok(quote_value(quoted)),
            _ => Err(Thrown::arity("quote", "1", args.len())),
        }
    }

    fn eval_if(&mut self, args: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        let (condition, then, otherwise) = match args {
            [condition, then] => (condition, then, None),
            [condition, then, otherwise] => (condition, then, Some(otherwise)),
            _ => return Err(Thrown::arity("if", "2 or 3", args.len())),
        };
        if self.eval(condition, env)?.is_truthy() {
            self.eval(then, env)
        } else {
            otherwise.map_or(Ok(Value::Nil), |branch| self.eval(branch, env))
        }
    }

    fn eval_do(&mut self, args: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        self.eval_body(args, env)
    }

    /// `(define name value)` or `(define (name params...) body...)`.
    fn eval_define(&mut self, args: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        let Some((target, rest)) = args.split_first() else {
            return Err(Thrown::arity("define", "at least 1", 0));
        };
        match &*target.value {
            Expr::Symbol(name) => {
                let value = match rest {
                    [] => Value::Nil,
                    [value] => self.eval_named(name, value, env)?,
                    _ => return Err(Thrown::arity("define", "1 or 2", args.len())),
                };
                env.define(name, value);
            }
            Expr::List(signature) => {
                let Some((name, params)) = signature.split_first() else {
                    return Err(syntax_error("define needs a function name"));
                };
                let name = name
                    .value
                    .as_symbol()
                    .ok_or_else(|| syntax_error("define needs a function name"))?;
                let lambda = self.closure(Some(name), params, rest, env)?;
                env.define(name, lambda);
            }
            other => {
                return Err(syntax_error(format!(
                    "cannot define a {}",
                    other.type_name()
                )))
            }
        }
        Ok(Value::Nil)
    }

    /// Evaluates a binding's value, naming it when it is a literal `fn`.
    fn eval_named(&mut self, name: &str, node: &AstNode, env: &Env) -> Result<Value, Thrown> {
        if let (Some("fn"), Expr::List(items)) = (node.value.head_symbol(), &*node.value) {
            let (params, body) = fn_parts(&items[1..])?;
            return self.closure(Some(name), params, body, env);
        }
        self.eval(node, env)
    }

    fn eval_set(&mut self, args: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        let [target, value] = args else {
            return Err(Thrown::arity("set!", "2", args.len()));
        };
        let name = target
            .value
            .as_symbol()
            .ok_or_else(|| syntax_error("set! needs a symbol"))?;
        let value = self.eval(value, env)?;
        env.set(name, value.clone());
        Ok(value)
    }

    fn eval_fn(&mut self, args: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        let (params, body) = fn_parts(args)?;
        self.closure(None, params, body, env)
    }

    /// `(let ((name value) ...) body...)`, binding sequentially.
    fn eval_let(&mut self, args: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        let Some((bindings, body)) = args.split_first() else {
            return Err(Thrown::arity("let", "at least 1", 0));
        };
        let Expr::List(bindings) = &*bindings.value else {
            return Err(syntax_error("let bindings must be a list of pairs"));
        };

        let scope = env.child();
        for binding in bindings {
            let pair = match &*binding.value {
                Expr::List(pair) => pair,
                _ => return Err(syntax_error("let bindings must be a list of pairs")),
            };
            let [name, value] = pair.as_slice() else {
                return Err(syntax_error("let binding needs a name and a value"));
            };
            let name = name
                .value
                .as_symbol()
                .ok_or_else(|| syntax_error("let binding needs a name and a value"))?;
            let value = self.eval_named(name, value, &scope)?;
            scope.define(name, value);
        }
        self.eval_body(body, &scope)
    }

    fn eval_and(&mut self, args: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        let mut result = Value::Bool(true);
        for arg in args {
            result = self.eval(arg, env)?;
            if !result.is_truthy() {
                break;
            }
        }
        Ok(result)
    }

    fn eval_or(&mut self, args: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        let mut result = Value::Nil;
        for arg in args {
            result = self.eval(arg, env)?;
            if result.is_truthy() {
                break;
            }
        }
        Ok(result)
    }

    /// `(export! "name" value)`
    fn eval_export(&mut self, args: &[AstNode], env: &Env) -> Result<Value, Thrown> {
        let [name, value] = args else {
            return Err(Thrown::arity("export!", "2", args.len()));
        };
        let name = match self.eval(name, env)? {
            Value::String(name) => name,
            other => {
                return Err(Thrown::type_error(format!(
                    "export! expects a string name, got {}",
                    other.type_name()
                )))
            }
        };
        let value = self.eval(value, env)?;
        self.exports.insert(name, value.clone());
        Ok(value)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn syntax_error(message: impl Into<String>) -> Thrown {
    Thrown::error("SyntaxError", message)
}

fn fn_parts(args: &[AstNode]) -> Result<(&[AstNode], &[AstNode]), Thrown> {
    let Some((params, body)) = args.split_first() else {
        return Err(syntax_error("fn needs a parameter list"));
    };
    match &*params.value {
        Expr::List(params) | Expr::Vector(params) => Ok((params, body)),
        _ => Err(syntax_error("fn needs a parameter list")),
    }
}

fn make_lambda(name: Option<&str>, params: &[AstNode], body: &[AstNode], env: &Env) -> Result<Value, Thrown> {
    let mut names = Vec::with_capacity(params.len());
    let mut rest = None;
    let mut symbols = params.iter().map(|param| {
        param
            .value
            .as_symbol()
            .ok_or_else(|| syntax_error(format!("parameter must be a symbol, got {}", param.value)))
    });
    while let Some(symbol) = symbols.next() {
        let symbol = symbol?;
        if symbol == "&" {
            let Some(rest_name) = symbols.next() else {
                return Err(syntax_error("& must be followed by a parameter name"));
            };
            rest = Some(rest_name?.to_string());
            if symbols.next().is_some() {
                return Err(syntax_error("only one parameter may follow &"));
            }
            break;
        }
        names.push(symbol.to_string());
    }

    Ok(Value::Lambda(Rc::new(Lambda {
        name: name.map(str::to_string),
        params: names,
        rest,
        body: body.to_vec(),
        env: env.clone(),
    })))
}

/// Converts unevaluated syntax to data.
pub fn quote_value(node: &AstNode) -> Value {
    match &*node.value {
        Expr::Nil => Value::Nil,
        Expr::Bool(b) => Value::Bool(*b),
        Expr::Number(n) => Value::Number(*n),
        Expr::String(s) => Value::String(s.clone()),
        Expr::Keyword(k) => Value::Keyword(k.clone()),
        Expr::Symbol(s) => Value::Symbol(s.clone()),
        Expr::List(items) | Expr::Vector(items) => Value::list(items.iter().map(quote_value)),
        Expr::Map(items) => Value::Map(
            items
                .chunks(2)
                .filter_map(|pair| match pair {
                    [key, value] => {
                        let key = quote_value(key);
                        let key = MapKey::from_value(&key).unwrap_or_else(|| MapKey::String(key.to_string()));
                        Some((key, quote_value(value)))
                    }
                    _ => None,
                })
                .collect(),
        ),
        Expr::Quote(inner) => Value::list([Value::Symbol("quote".into()), quote_value(inner)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{register_all_atoms, AtomRegistry};
    use crate::syntax::parser::parse;

    fn run(source: &str) -> Result<Value, Thrown> {
        let mut registry = AtomRegistry::new();
        register_all_atoms(&mut registry);
        let env = Env::global(&registry);
        let nodes = parse(source, "test.sx").unwrap();
        EvaluationContext::new().eval_program(&nodes, &env)
    }

    fn error_name(result: Result<Value, Thrown>) -> String {
        result.unwrap_err().as_error().unwrap().name.clone()
    }

    #[test]
    fn literals_and_collections() {
        assert_eq!(run("[1 (+ 1 1) :k]").unwrap().to_string(), "[1 2 :k]");
        assert_eq!(run("{:a (* 2 3) \"b\" nil}").unwrap().to_string(), "{:a 6 \"b\" nil}");
        assert_eq!(run("'(f x [1])").unwrap().to_string(), "[f x [1]]");
    }

    #[test]
    fn define_and_call() {
        let source = "(define (square x) (* x x))\n(define inc (fn (n) (+ n 1)))\n(inc (square 3))";
        assert_eq!(run(source).unwrap(), Value::Number(10.0));
        assert_eq!(run("(define (f) 1) f").unwrap().to_string(), "<fn f>");
    }

    #[test]
    fn set_updates_closure_binding() {
        let source = "(define counter 0)\n(define (bump) (set! counter (+ counter 1)))\n(bump) (bump) counter";
        assert_eq!(run(source).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn let_binds_sequentially() {
        assert_eq!(run("(let ((a 2) (b (* a 5))) (+ a b))").unwrap(), Value::Number(12.0));
        assert_eq!(run("(let () 1 2)").unwrap(), Value::Number(2.0));
    }

    #[test]
    fn rest_parameters() {
        assert_eq!(run("((fn (a & more) more) 1 2 3)").unwrap().to_string(), "[2 3]");
    }

    #[test]
    fn short_circuit_logic() {
        assert_eq!(run("(and 1 nil (undefined))").unwrap(), Value::Nil);
        assert_eq!(run("(or false 7 (undefined))").unwrap(), Value::Number(7.0));
    }

    #[test]
    fn runtime_errors_are_thrown_values() {
        assert_eq!(error_name(run("nope")), "ReferenceError");
        assert_eq!(error_name(run("(1 2)")), "TypeError");
        assert_eq!(error_name(run("((fn (a) a))")), "ArityError");
        assert_eq!(error_name(run("(define (loop) (loop)) (loop)")), "RecursionError");
    }

    #[test]
    fn export_publishes_values() {
        let mut registry = AtomRegistry::new();
        register_all_atoms(&mut registry);
        let env = Env::global(&registry);
        let nodes = parse("(export! \"answer\" 42)", "test.sx").unwrap();
        let mut context = EvaluationContext::new();
        context.eval_program(&nodes, &env).unwrap();
        assert_eq!(context.exports.get("answer"), Some(&Value::Number(42.0)));
    }
}
