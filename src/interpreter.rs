//! Tree-walking evaluator.
//!
//! Walks the resolved AST, maintaining the global environment, the current
//! environment pointer and the binding-distance table filled in by the
//! resolver. `print` output goes into the run's [`Reporter`] log.
//!
//! `return`, `break` and `continue` are not errors: every statement
//! evaluates to a [`Flow`] that unwinds through enclosing blocks (restoring
//! the previous environment on each frame) until a loop or function call
//! absorbs it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::callable::{Callable, Class, Function, Instance};
use crate::environment::Environment;
use crate::error::{QuillError, Result};
use crate::expr::Expr;
use crate::reporter::Reporter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<usize, usize>,
    reporter: Reporter,
}

impl Interpreter {
    pub fn new(reporter: Reporter) -> Self {
        let globals: Rc<RefCell<Environment>> = Rc::new(RefCell::new(Environment::new()));

        Interpreter {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            reporter,
        }
    }

    /// Record a binding distance for a resolvable expression node. Called by
    /// the resolver; absence from the table means "global".
    pub fn resolve_local(&mut self, id: usize, depth: usize) {
        debug!("Recording node {} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        for statement in statements {
            self.execute(statement)?;
        }

        Ok(())
    }

    /// Give the reporter (diagnostics + output log) back to the embedder.
    pub fn into_reporter(self) -> Reporter {
        self.reporter
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                self.reporter.print(value.to_string());

                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment =
                    Environment::with_enclosing(self.environment.clone());

                self.execute_block(statements, Rc::new(RefCell::new(environment)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}

                        Flow::Break => break,

                        Flow::Continue => continue,

                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                let function =
                    Function::new(declaration.clone(), self.environment.clone(), false);

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::Continue(_) => Ok(Flow::Continue),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<Flow> {
        let superclass_value: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),

                _ => {
                    let token: &Token = match expr {
                        Expr::Variable { name, .. } => name,
                        _ => name,
                    };

                    return Err(QuillError::runtime(token, "Superclass must be a class."));
                }
            },

            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods of a subclass close over a scope that binds `super`.
        let previous: Rc<RefCell<Environment>> = self.environment.clone();

        if let Some(superclass) = &superclass_value {
            let mut environment = Environment::with_enclosing(self.environment.clone());
            environment.define("super", Value::Class(superclass.clone()));

            self.environment = Rc::new(RefCell::new(environment));
        }

        let mut method_map: HashMap<String, Rc<Function>> = HashMap::new();

        for method in methods {
            let is_initializer: bool = method.name.lexeme == "init";

            let function = Function::new(method.clone(), self.environment.clone(), is_initializer);

            method_map.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        if superclass_value.is_some() {
            self.environment = previous;
        }

        let class = Class::new(name.lexeme.clone(), superclass_value, method_map);

        if !self
            .environment
            .borrow_mut()
            .assign(&name.lexeme, Value::Class(Rc::new(class)))
        {
            return Err(QuillError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ));
        }

        Ok(Flow::Normal)
    }

    /// Run `statements` in `environment`, restoring the previous environment
    /// on every exit path.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Flow> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, environment);

        for statement in statements {
            match self.execute(statement) {
                Ok(Flow::Normal) => {}

                Ok(flow) => {
                    self.environment = previous;
                    return Ok(flow);
                }

                Err(error) => {
                    self.environment = previous;
                    return Err(error);
                }
            }
        }

        self.environment = previous;

        Ok(Flow::Normal)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Array { elements, .. } => {
                let mut values: Vec<Value> = Vec::with_capacity(elements.len());

                for element in elements {
                    values.push(self.evaluate(element)?);
                }

                Ok(Value::Array(Rc::new(RefCell::new(values))))
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                let assigned: bool = match self.locals.get(id) {
                    Some(&depth) => Environment::assign_at(
                        &self.environment,
                        depth,
                        &name.lexeme,
                        value.clone(),
                    ),

                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone()),
                };

                if !assigned {
                    return Err(QuillError::runtime(
                        name,
                        format!("Undefined variable '{}'.", name.lexeme),
                    ));
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_value: Value = self.evaluate(callee)?;

                let mut argument_values: Vec<Value> = Vec::with_capacity(arguments.len());

                for argument in arguments {
                    argument_values.push(self.evaluate(argument)?);
                }

                match &callee_value {
                    Value::Function(function) => {
                        self.invoke(function.as_ref(), argument_values, paren)
                    }

                    Value::Class(class) => self.invoke(class, argument_values, paren),

                    _ => Err(QuillError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    )),
                }
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),

                _ => Err(QuillError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value: Value = self.evaluate(value)?;

                    instance.borrow_mut().set(name, value.clone());

                    Ok(value)
                }

                _ => Err(QuillError::runtime(name, "Only instances have fields.")),
            },

            Expr::Index {
                object,
                bracket,
                index,
            } => {
                let object: Value = self.evaluate(object)?;
                let index: Value = self.evaluate(index)?;
                let index: usize = Interpreter::index_value(&index, bracket)?;

                match object {
                    Value::Array(elements) => {
                        let elements = elements.borrow();

                        match elements.get(index) {
                            Some(value) => Ok(value.clone()),

                            None => Err(QuillError::runtime(bracket, "Index out of bounds.")),
                        }
                    }

                    Value::String(text) => match text.chars().nth(index) {
                        Some(ch) => Ok(Value::String(ch.to_string())),

                        None => Err(QuillError::runtime(bracket, "Index out of bounds.")),
                    },

                    _ => Err(QuillError::runtime(
                        bracket,
                        "Only arrays and strings can be indexed.",
                    )),
                }
            }

            Expr::IndexSet {
                object,
                bracket,
                index,
                value,
            } => {
                let object: Value = self.evaluate(object)?;
                let index_value: Value = self.evaluate(index)?;
                let index: usize = Interpreter::index_value(&index_value, bracket)?;
                let value: Value = self.evaluate(value)?;

                match object {
                    Value::Array(elements) => {
                        let mut elements = elements.borrow_mut();

                        if index >= elements.len() {
                            return Err(QuillError::runtime(bracket, "Index out of bounds."));
                        }

                        elements[index] = value.clone();

                        Ok(value)
                    }

                    _ => Err(QuillError::runtime(bracket, "Only arrays can be indexed.")),
                }
            }

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Result<Value> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(QuillError::runtime(token, "Invalid literal.")),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(QuillError::runtime(operator, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!value.is_truthy())),

            _ => Err(QuillError::runtime(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                (Value::Array(a), Value::Array(b)) => {
                    let mut combined: Vec<Value> = a.borrow().clone();
                    combined.extend(b.borrow().iter().cloned());

                    Ok(Value::Array(Rc::new(RefCell::new(combined))))
                }

                _ => Err(QuillError::runtime(
                    operator,
                    "Operands must both be numbers, strings or arrays.",
                )),
            },

            TokenType::MINUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(QuillError::runtime(operator, "Operands must be numbers.")),
            },

            TokenType::STAR => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(QuillError::runtime(operator, "Operands must be numbers.")),
            },

            TokenType::SLASH => match (left, right) {
                (Value::Number(a), Value::Number(b)) => {
                    if b == 0.0 {
                        Err(QuillError::runtime(operator, "Division by zero."))
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }

                _ => Err(QuillError::runtime(operator, "Operands must be numbers.")),
            },

            TokenType::PERCENT => match (left, right) {
                // Mathematical modulo: the result takes the divisor's range,
                // so -7 % 3 is 2.
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.rem_euclid(b))),

                _ => Err(QuillError::runtime(operator, "Operands must be numbers.")),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            TokenType::GREATER => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(QuillError::runtime(operator, "Operands must be numbers.")),
            },

            TokenType::GREATER_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(QuillError::runtime(operator, "Operands must be numbers.")),
            },

            TokenType::LESS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(QuillError::runtime(operator, "Operands must be numbers.")),
            },

            TokenType::LESS_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(QuillError::runtime(operator, "Operands must be numbers.")),
            },

            _ => Err(QuillError::runtime(operator, "Invalid binary operator.")),
        }
    }

    /// Short-circuit logic. The short-circuit exit yields a plain boolean,
    /// not the left operand; only the fall-through path yields the right
    /// operand's value.
    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;

        match operator.token_type {
            TokenType::OR => {
                if left.is_truthy() {
                    Ok(Value::Bool(true))
                } else {
                    self.evaluate(right)
                }
            }

            TokenType::AND => {
                if !left.is_truthy() {
                    Ok(Value::Bool(false))
                } else {
                    self.evaluate(right)
                }
            }

            _ => Err(QuillError::runtime(operator, "Invalid logical operator.")),
        }
    }

    fn evaluate_super(&mut self, id: usize, keyword: &Token, method: &Token) -> Result<Value> {
        let depth: usize = match self.locals.get(&id) {
            Some(&depth) => depth,

            None => {
                return Err(QuillError::runtime(keyword, "Undefined variable 'super'."));
            }
        };

        let superclass: Rc<Class> =
            match Environment::get_at(&self.environment, depth, "super") {
                Some(Value::Class(class)) => class,

                _ => {
                    return Err(QuillError::runtime(keyword, "Undefined variable 'super'."));
                }
            };

        // `this` lives in the scope just inside the one binding `super`.
        let instance = match Environment::get_at(&self.environment, depth - 1, "this") {
            Some(Value::Instance(instance)) => instance,

            _ => {
                return Err(QuillError::runtime(keyword, "Undefined variable 'this'."));
            }
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),

            None => Err(QuillError::runtime(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn invoke(
        &mut self,
        callable: &dyn Callable,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        if arguments.len() != callable.arity() {
            return Err(QuillError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        callable.call(self, arguments, paren)
    }

    fn look_up_variable(&self, name: &Token, id: usize) -> Result<Value> {
        let value: Option<Value> = match self.locals.get(&id) {
            Some(&depth) => Environment::get_at(&self.environment, depth, &name.lexeme),

            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| {
            QuillError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
        })
    }

    /// Indices must be non-negative integers.
    fn index_value(index: &Value, bracket: &Token) -> Result<usize> {
        match index {
            Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Ok(*n as usize),

            _ => Err(QuillError::runtime(
                bracket,
                "Index must be a non-negative integer.",
            )),
        }
    }
}
