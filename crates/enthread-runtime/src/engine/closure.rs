//! Reference engine whose goals are Rust closures
//!
//! Terms are `Value`s and records are plain copies of them. A goal is a
//! boxed closure receiving the thread's context; it returns `Ok(true)` for
//! success, `Ok(false)` for failure and `Err(value)` to raise `value`.
//! Used by the demo binaries and the runtime's own tests.

use super::{Engine, GoalOutcome, InheritedContext};
use crate::context::ThreadContext;
use enthread_core::error::ThreadResult;
use enthread_core::options::StackSizes;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Small term language: atoms, integers, strings and compounds
///
/// `Var` is an anonymous variable; in a pattern it matches anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Var,
    Atom(String),
    Int(i64),
    Str(String),
    Compound(String, Vec<Value>),
}

impl Value {
    pub fn atom(name: &str) -> Self {
        Value::Atom(name.to_string())
    }

    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    pub fn string(s: &str) -> Self {
        Value::Str(s.to_string())
    }

    pub fn compound(name: &str, args: Vec<Value>) -> Self {
        Value::Compound(name.to_string(), args)
    }

    /// One-way structural match of `self` against `pattern`
    pub fn matches(&self, pattern: &Value) -> bool {
        match (self, pattern) {
            (_, Value::Var) => true,
            (Value::Compound(f, args), Value::Compound(g, pats)) => {
                f == g
                    && args.len() == pats.len()
                    && args.iter().zip(pats).all(|(a, p)| a.matches(p))
            }
            (a, p) => a == p,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Var => write!(f, "_"),
            Value::Atom(a) => write!(f, "{}", a),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Compound(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Goal body of the closure engine
pub type Goal = Box<dyn FnOnce(&ThreadContext<ClosureEngine>) -> GoalResult + Send>;

/// `Ok(true)` succeeded, `Ok(false)` failed, `Err(ball)` raised `ball`
pub type GoalResult = Result<bool, Value>;

/// Engine running closures; counts engine set-ups and tear-downs
#[derive(Debug, Default)]
pub struct ClosureEngine {
    inits: AtomicUsize,
    teardowns: AtomicUsize,
}

impl ClosureEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Box a closure as a goal
    pub fn goal<F>(f: F) -> Goal
    where
        F: FnOnce(&ThreadContext<ClosureEngine>) -> GoalResult + Send + 'static,
    {
        Box::new(f)
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::Acquire)
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::Acquire)
    }
}

impl Engine for ClosureEngine {
    type Goal = Goal;
    type Term = Value;
    type Record = Value;
    type Streams = ();

    fn record(&self, term: &Value) -> Value {
        term.clone()
    }

    fn recorded(&self, record: &Value) -> Value {
        record.clone()
    }

    fn init_engine(
        &self,
        stacks: &StackSizes,
        _inherited: &InheritedContext<()>,
    ) -> ThreadResult<()> {
        stacks.validate()?;
        self.inits.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn invoke_goal(
        &self,
        ctx: &ThreadContext<Self>,
        _module: &str,
        goal: Goal,
    ) -> GoalOutcome<Value> {
        match goal(ctx) {
            Ok(true) => GoalOutcome::True,
            Ok(false) => GoalOutcome::False,
            Err(ball) => GoalOutcome::Exception(ball),
        }
    }

    fn teardown_engine(&self) {
        self.teardowns.fetch_add(1, Ordering::AcqRel);
    }

    fn error_exception(&self, message: &str) -> Value {
        Value::compound("error", vec![Value::string(message)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matching() {
        let msg = Value::compound("job", vec![Value::int(3), Value::atom("fast")]);

        assert!(msg.matches(&Value::Var));
        assert!(msg.matches(&Value::compound("job", vec![Value::Var, Value::atom("fast")])));
        assert!(!msg.matches(&Value::compound("job", vec![Value::Var])));
        assert!(!msg.matches(&Value::compound("job", vec![Value::Var, Value::atom("slow")])));
        assert!(!Value::atom("a").matches(&Value::string("a")));
    }

    #[test]
    fn test_display() {
        let v = Value::compound("f", vec![Value::int(1), Value::string("x"), Value::Var]);
        assert_eq!(v.to_string(), "f(1,\"x\",_)");
    }

    #[test]
    fn test_record_is_independent_copy() {
        let engine = ClosureEngine::new();
        let term = Value::atom("hello");
        let rec = engine.record(&term);
        drop(term);
        assert_eq!(engine.recorded(&rec), Value::atom("hello"));
    }
}
