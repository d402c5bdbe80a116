use crate::ast::{BinOp, BoolOp, CmpOp, Expr, Literal, Program, Statement, UnaryOp};
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{self, Write};
use thiserror::Error;


// Evaluation is a plain recursive walk; deeply nested trees must
// surface a resource error instead of exhausting the native stack.
const MAX_EVAL_DEPTH: usize = 200;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("unsupported operand type(s) for {op}: '{left}' and '{right}'")]
    UnsupportedBinary {
        op: BinOp,
        left: &'static str,
        right: &'static str,
    },
    #[error("unsupported operand type for unary {op}: '{operand}'")]
    UnsupportedUnary {
        op: UnaryOp,
        operand: &'static str,
    },
    #[error("'{op}' not supported between instances of '{left}' and '{right}'")]
    UnsupportedComparison {
        op: CmpOp,
        left: &'static str,
        right: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("cannot assign to this expression; targets must be plain names")]
    InvalidAssignTarget,
    #[error("'{name}' is not callable; only 'print' is supported")]
    UnsupportedCall { name: String },
    #[error("print expects exactly one argument, got {count}")]
    PrintArity { count: usize },
    #[error("maximum evaluation depth exceeded")]
    RecursionLimit,
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// The single global name-to-value store. There are no nested scopes:
/// every suite reads and writes the same frame.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Unbound names read as `None` rather than erroring.
    pub fn read(&self, name: &str) -> Value {
        self.bindings.get(name).cloned().unwrap_or(Value::None)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn write(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }
}

pub struct Interpreter<W: Write = io::Stdout> {
    env: Environment,
    out: W,
    depth: usize,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// Route `print` output to an arbitrary sink; the pipeline tests
    /// capture a `Vec<u8>` this way.
    pub fn with_output(out: W) -> Self {
        Interpreter {
            env: Environment::new(),
            out,
            depth: 0,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Walk the whole tree in order. Side effects only: variable
    /// mutation in the environment and `print` output on the sink.
    pub fn execute_program(&mut self, program: &Program) -> Result<(), RuntimeError> {
        // A prior aborted run may have left the counter mid-descent.
        self.depth = 0;
        for statement in &program.statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    fn execute_suite(&mut self, suite: &[Statement]) -> Result<(), RuntimeError> {
        for statement in suite {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    fn execute_statement(&mut self, stmt: &Statement) -> Result<(), RuntimeError> {
        self.enter()?;
        let result = self.dispatch_statement(stmt);
        self.depth -= 1;
        result
    }

    fn dispatch_statement(&mut self, stmt: &Statement) -> Result<(), RuntimeError> {
        match stmt {
            Statement::Expression(expr) => {
                self.evaluate_expression(expr)?;
                Ok(())
            }
            Statement::Assign { targets, value } => {
                let value = self.evaluate_expression(value)?;
                for target in targets {
                    let Expr::Name(name) = target else {
                        return Err(RuntimeError::InvalidAssignTarget);
                    };
                    self.env.write(name, value.clone());
                }
                Ok(())
            }
            Statement::AugAssign { target, op, value } => {
                let Expr::Name(name) = target else {
                    return Err(RuntimeError::InvalidAssignTarget);
                };
                // An unbound target starts from integer zero.
                let current = match self.env.get(name) {
                    Some(bound) => bound.clone(),
                    None => Value::Int(0),
                };
                let value = self.evaluate_expression(value)?;
                let result = self.binary_op(*op, current, value)?;
                self.env.write(name, result);
                Ok(())
            }
            Statement::If {
                branches,
                else_suite,
            } => {
                for branch in branches {
                    if self.evaluate_expression(&branch.condition)?.is_truthy() {
                        return self.execute_suite(&branch.suite);
                    }
                }
                if let Some(suite) = else_suite {
                    return self.execute_suite(suite);
                }
                Ok(())
            }
            Statement::While { condition, body } => {
                while self.evaluate_expression(condition)?.is_truthy() {
                    self.execute_suite(body)?;
                }
                Ok(())
            }
        }
    }

    fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        self.enter()?;
        let result = self.dispatch_expression(expr);
        self.depth -= 1;
        result
    }

    fn dispatch_expression(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Int(i) => Value::Int(*i),
                Literal::Float(f) => Value::Float(*f),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Str(s) => Value::Str(s.clone()),
                Literal::None => Value::None,
            }),
            Expr::Name(name) => Ok(self.env.read(name)),
            Expr::Unary { op, operand } => {
                let value = self.evaluate_expression(operand)?;
                self.unary_op(*op, value)
            }
            Expr::Binary { left, op, right } => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                self.binary_op(*op, left, right)
            }
            Expr::Compare { first, rest } => self.evaluate_comparison(first, rest),
            Expr::BoolOp { op, left, right } => {
                let left = self.evaluate_expression(left)?;
                let take_right = match op {
                    BoolOp::And => left.is_truthy(),
                    BoolOp::Or => !left.is_truthy(),
                };
                // The deciding operand is the result, untouched; no
                // coercion to bool.
                if take_right {
                    self.evaluate_expression(right)
                } else {
                    Ok(left)
                }
            }
            Expr::Call { callee, args } => self.evaluate_call(callee, args),
        }
    }

    /// Each operand of a chain is evaluated at most once, left to
    /// right, and evaluation stops at the first failing pair.
    fn evaluate_comparison(
        &mut self,
        first: &Expr,
        rest: &[(CmpOp, Expr)],
    ) -> Result<Value, RuntimeError> {
        let mut left = self.evaluate_expression(first)?;

        for (op, expr) in rest {
            let right = self.evaluate_expression(expr)?;
            if !self.compare_op(*op, &left, &right)? {
                return Ok(Value::Bool(false));
            }
            left = right;
        }

        Ok(Value::Bool(true))
    }

    fn evaluate_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Value, RuntimeError> {
        let Expr::Name(name) = callee else {
            return Err(RuntimeError::UnsupportedCall {
                name: "<expression>".to_string(),
            });
        };
        if name.as_str() != "print" {
            return Err(RuntimeError::UnsupportedCall { name: name.clone() });
        }
        if args.len() != 1 {
            return Err(RuntimeError::PrintArity { count: args.len() });
        }

        let value = self.evaluate_expression(&args[0])?;
        writeln!(self.out, "{value}")?;
        Ok(Value::None)
    }

    fn unary_op(&self, op: UnaryOp, value: Value) -> Result<Value, RuntimeError> {
        match op {
            UnaryOp::Minus => match value {
                Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
                Value::Float(f) => Ok(Value::Float(-f)),
                value => Err(RuntimeError::UnsupportedUnary {
                    op,
                    operand: value.type_name(),
                }),
            },
            UnaryOp::Plus => match value {
                value @ (Value::Int(_) | Value::Float(_)) => Ok(value),
                value => Err(RuntimeError::UnsupportedUnary {
                    op,
                    operand: value.type_name(),
                }),
            },
            UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        }
    }

    fn binary_op(&self, op: BinOp, left: Value, right: Value) -> Result<Value, RuntimeError> {
        match op {
            BinOp::Add => match (left, right) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
                (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 + b)),
                (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + b as f64)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                (left, right) => Err(self.binary_type_error(op, &left, &right)),
            },
            BinOp::Sub => match (left, right) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a - b)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
                (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 - b)),
                (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a - b as f64)),
                (left, right) => Err(self.binary_type_error(op, &left, &right)),
            },
            BinOp::Mul => match (left, right) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
                (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
                (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 * b)),
                (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a * b as f64)),
                // Repetition is text-on-the-left only; a count below
                // one yields the empty string.
                (Value::Str(s), Value::Int(n)) => {
                    if n < 1 {
                        Ok(Value::Str(String::new()))
                    } else {
                        Ok(Value::Str(s.repeat(n as usize)))
                    }
                }
                (left, right) => Err(self.binary_type_error(op, &left, &right)),
            },
            // True division always produces a float.
            BinOp::Div => match (left, right) {
                (Value::Int(a), Value::Int(b)) => {
                    if b == 0 {
                        Err(RuntimeError::DivisionByZero)
                    } else {
                        Ok(Value::Float(a as f64 / b as f64))
                    }
                }
                (left, right) => match (left.as_float(), right.as_float()) {
                    (Some(a), Some(b)) => {
                        if b == 0.0 {
                            Err(RuntimeError::DivisionByZero)
                        } else {
                            Ok(Value::Float(a / b))
                        }
                    }
                    _ => Err(self.binary_type_error(op, &left, &right)),
                },
            },
            // Float operands truncate toward zero to integers first;
            // the result is always an int.
            BinOp::FloorDiv => match (left.trunc_int(), right.trunc_int()) {
                (Some(a), Some(b)) => {
                    if b == 0 {
                        Err(RuntimeError::DivisionByZero)
                    } else {
                        Ok(Value::Int(a.wrapping_div(b)))
                    }
                }
                _ => Err(self.binary_type_error(op, &left, &right)),
            },
            BinOp::Mod => match (left.trunc_int(), right.trunc_int()) {
                (Some(a), Some(b)) => {
                    if b == 0 {
                        Err(RuntimeError::ModuloByZero)
                    } else {
                        Ok(Value::Int(a.wrapping_rem(b)))
                    }
                }
                _ => Err(self.binary_type_error(op, &left, &right)),
            },
        }
    }

    fn compare_op(&self, op: CmpOp, left: &Value, right: &Value) -> Result<bool, RuntimeError> {
        // Equality is total across variants; ordering is not.
        if let CmpOp::Eq | CmpOp::NotEq = op {
            let equal = left.equals(right);
            return Ok(if op == CmpOp::Eq { equal } else { !equal });
        }

        let holds = match (left, right) {
            (Value::Int(a), Value::Int(b)) => Some(ordering_satisfies(op, a.cmp(b))),
            (Value::Str(a), Value::Str(b)) => Some(ordering_satisfies(op, a.cmp(b))),
            (Value::Bool(a), Value::Bool(b)) => Some(ordering_satisfies(op, a.cmp(b))),
            _ => match (left.as_float(), right.as_float()) {
                (Some(a), Some(b)) => Some(
                    a.partial_cmp(&b)
                        .is_some_and(|ordering| ordering_satisfies(op, ordering)),
                ),
                _ => None,
            },
        };

        holds.ok_or(RuntimeError::UnsupportedComparison {
            op,
            left: left.type_name(),
            right: right.type_name(),
        })
    }

    fn binary_type_error(&self, op: BinOp, left: &Value, right: &Value) -> RuntimeError {
        RuntimeError::UnsupportedBinary {
            op,
            left: left.type_name(),
            right: right.type_name(),
        }
    }

    fn enter(&mut self) -> Result<(), RuntimeError> {
        if self.depth >= MAX_EVAL_DEPTH {
            return Err(RuntimeError::RecursionLimit);
        }
        self.depth += 1;
        Ok(())
    }
}

fn ordering_satisfies(op: CmpOp, ordering: Ordering) -> bool {
    match op {
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::NotEq => ordering != Ordering::Equal,
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::LtEq => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::GtEq => ordering != Ordering::Less,
    }
}
