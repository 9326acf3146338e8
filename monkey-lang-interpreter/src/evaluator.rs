use gc::Gc;
use monkey_lang_core::ast;
use monkey_lang_core::ast::{Expression, InfixOperationKind, PrefixOperationKind};

use crate::environment::Environment;
use crate::object::{EvaluationError, Function, Object, QuickReturn};

type EvalResult = Result<Gc<Object>, QuickReturn>;

/// Any AST node the evaluator accepts.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Program(&'a ast::Program),
    Statement(&'a ast::Statement),
    Block(&'a ast::BlockStatement),
    Expression(&'a Expression),
}

impl<'a> From<&'a ast::Program> for Node<'a> {
    fn from(program: &'a ast::Program) -> Self {
        Node::Program(program)
    }
}

impl<'a> From<&'a ast::Statement> for Node<'a> {
    fn from(statement: &'a ast::Statement) -> Self {
        Node::Statement(statement)
    }
}

impl<'a> From<&'a ast::BlockStatement> for Node<'a> {
    fn from(block: &'a ast::BlockStatement) -> Self {
        Node::Block(block)
    }
}

impl<'a> From<&'a Expression> for Node<'a> {
    fn from(expression: &'a Expression) -> Self {
        Node::Expression(expression)
    }
}

/// Evaluates `node` and returns its value.
///
/// A `return` that escapes a statement or block comes back as
/// `Object::ReturnValue`, and a runtime failure as `Object::Error`. A program
/// unwraps its return value.
pub fn eval<'a>(node: impl Into<Node<'a>>, environment: &mut Environment) -> Gc<Object> {
    let result = match node.into() {
        Node::Program(program) => return eval_program(program, environment),
        Node::Statement(statement) => eval_statement(statement, environment),
        Node::Block(block) => eval_block_statement(block, environment),
        Node::Expression(expression) => eval_expression(expression, environment),
    };
    result.unwrap_or_else(QuickReturn::into_object)
}

/// Evaluates every statement in order and yields the value of the last one.
/// The first error stops evaluation and is returned as an `Object::Error`.
pub fn eval_program(program: &ast::Program, environment: &mut Environment) -> Gc<Object> {
    let mut output = Object::null();
    for statement in &program.statements {
        match eval_statement(statement, environment) {
            Ok(object) => output = object,
            Err(QuickReturn::Return(value)) => return value,
            Err(QuickReturn::Error(error)) => {
                tracing::debug!(%error, "evaluation failed");
                return Object::error(error);
            }
        };
    }
    output
}

fn eval_statement(statement: &ast::Statement, environment: &mut Environment) -> EvalResult {
    match statement {
        ast::Statement::Expression(expression) => eval_expression(expression, environment),
        ast::Statement::Return(statement) => eval_return_statement(statement, environment),
        ast::Statement::Let(statement) => eval_let_statement(statement, environment),
    }
}

fn eval_let_statement(statement: &ast::LetStatement, environment: &mut Environment) -> EvalResult {
    let value = eval_expression(&statement.value, environment)?;
    environment.set(&statement.identifier.name, value);
    Ok(Object::null())
}

fn eval_return_statement(
    statement: &ast::ReturnStatement,
    environment: &mut Environment,
) -> EvalResult {
    let value = eval_expression(&statement.value, environment)?;
    Err(QuickReturn::Return(value))
}

// Blocks share the surrounding environment; only calls open a new scope.
fn eval_block_statement(block: &ast::BlockStatement, environment: &mut Environment) -> EvalResult {
    let mut result = Object::null();
    for statement in &block.statements {
        result = eval_statement(statement, environment)?;
    }
    Ok(result)
}

fn eval_expression(expression: &Expression, environment: &mut Environment) -> EvalResult {
    match expression {
        Expression::IntegerLiteral(value) => Ok(Object::integer(*value)),
        Expression::BooleanLiteral(value) => Ok(Object::boolean(*value)),
        Expression::StringLiteral(value) => Ok(Object::string(value.clone())),
        Expression::Identifier(identifier) => environment.get(&identifier.name).ok_or_else(|| {
            QuickReturn::Error(EvaluationError::UnknownIdentifier(identifier.name.clone()))
        }),
        Expression::PrefixOperation(kind, right) => {
            let right = eval_expression(right, environment)?;
            Ok(eval_prefix_operation(*kind, right)?)
        }
        Expression::InfixOperation(kind, left, right) => {
            let left = eval_expression(left, environment)?;
            let right = eval_expression(right, environment)?;
            Ok(eval_infix_operation(*kind, left, right)?)
        }
        Expression::IfExpression {
            condition,
            consequence,
            alternative,
        } => {
            let condition = eval_expression(condition, environment)?;
            if condition.is_truthy() {
                eval_block_statement(consequence, environment)
            } else if let Some(alternative) = alternative {
                eval_block_statement(alternative, environment)
            } else {
                Ok(Object::null())
            }
        }
        Expression::FunctionLiteral { parameters, body } => Ok(Object::function(
            parameters.clone(),
            body.clone(),
            environment.clone(),
        )),
        Expression::CallExpression {
            function,
            arguments,
        } => {
            let function = eval_expression(function, environment)?;
            let Object::Function(function) = &*function else {
                return Err(EvaluationError::CallNonFunction(function.object_type()).into());
            };
            let arguments = eval_expressions(arguments, environment)?;
            Ok(apply_function(function, arguments)?)
        }
    }
}

/// Evaluates `arguments` left to right, stopping at the first failure.
fn eval_expressions(
    arguments: &[Expression],
    environment: &mut Environment,
) -> Result<Vec<Gc<Object>>, QuickReturn> {
    let mut result = Vec::with_capacity(arguments.len());
    for argument in arguments {
        result.push(eval_expression(argument, environment)?);
    }
    Ok(result)
}

#[tracing::instrument(level = "trace", skip_all, fields(arity = function.parameters.len()))]
fn apply_function(
    function: &Function,
    arguments: Vec<Gc<Object>>,
) -> Result<Gc<Object>, EvaluationError> {
    if function.parameters.len() != arguments.len() {
        return Err(EvaluationError::WrongArgumentCount {
            expected: function.parameters.len(),
            actual: arguments.len(),
        });
    }

    let mut new_environment = Environment::new_enclosed(function.env.clone());
    for (parameter, argument) in function.parameters.iter().zip(arguments) {
        new_environment.set(&parameter.name, argument);
    }

    match eval_block_statement(&function.body, &mut new_environment) {
        Ok(object) => Ok(object),
        Err(QuickReturn::Return(value)) => Ok(value),
        Err(QuickReturn::Error(error)) => Err(error),
    }
}

fn eval_prefix_operation(
    kind: PrefixOperationKind,
    right: Gc<Object>,
) -> Result<Gc<Object>, EvaluationError> {
    match (kind, &*right) {
        (PrefixOperationKind::Bang, object) => Ok(Object::boolean(!object.is_truthy())),
        (PrefixOperationKind::Minus, Object::Integer(value)) => {
            Ok(Object::integer(value.wrapping_neg()))
        }
        (PrefixOperationKind::Minus, object) => Err(EvaluationError::UnknownPrefixOperator {
            right: object.object_type(),
            operation: kind,
        }),
    }
}

fn eval_infix_operation(
    kind: InfixOperationKind,
    left: Gc<Object>,
    right: Gc<Object>,
) -> Result<Gc<Object>, EvaluationError> {
    match (&*left, &*right) {
        (Object::Integer(left), Object::Integer(right)) => {
            eval_integer_infix_operation(kind, *left, *right)
        }
        (Object::String(left), Object::String(right)) => {
            eval_string_infix_operation(kind, left, right)
        }
        // `true`, `false` and `null` are singletons, so identity is equality
        // for them. Any other mix of types is simply unequal.
        _ if kind == InfixOperationKind::Equal => Ok(Object::boolean(Gc::ptr_eq(&left, &right))),
        _ if kind == InfixOperationKind::NotEqual => {
            Ok(Object::boolean(!Gc::ptr_eq(&left, &right)))
        }
        (left, right) if left.object_type() != right.object_type() => {
            Err(EvaluationError::TypeMismatch {
                left: left.object_type(),
                right: right.object_type(),
                operation: kind,
            })
        }
        (left, right) => Err(EvaluationError::UnknownInfixOperator {
            left: left.object_type(),
            right: right.object_type(),
            operation: kind,
        }),
    }
}

fn eval_integer_infix_operation(
    kind: InfixOperationKind,
    left: i64,
    right: i64,
) -> Result<Gc<Object>, EvaluationError> {
    use InfixOperationKind::*;
    let object = match kind {
        Plus => Object::integer(left.wrapping_add(right)),
        Minus => Object::integer(left.wrapping_sub(right)),
        Multiply => Object::integer(left.wrapping_mul(right)),
        Divide => {
            if right == 0 {
                return Err(EvaluationError::DivisionByZero);
            }
            Object::integer(left.wrapping_div(right))
        }
        LessThan => Object::boolean(left < right),
        GreaterThan => Object::boolean(left > right),
        Equal => Object::boolean(left == right),
        NotEqual => Object::boolean(left != right),
    };
    Ok(object)
}

fn eval_string_infix_operation(
    kind: InfixOperationKind,
    left: &str,
    right: &str,
) -> Result<Gc<Object>, EvaluationError> {
    match kind {
        InfixOperationKind::Plus => Ok(Object::string(format!("{}{}", left, right))),
        InfixOperationKind::Equal => Ok(Object::boolean(left == right)),
        InfixOperationKind::NotEqual => Ok(Object::boolean(left != right)),
        _ => Err(EvaluationError::UnknownInfixOperator {
            left: crate::object::ObjectType::String,
            right: crate::object::ObjectType::String,
            operation: kind,
        }),
    }
}
