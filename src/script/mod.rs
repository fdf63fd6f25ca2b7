//! A minimal line-oriented script host for accessor objects.
//!
//! ```text
//! let buf = new Pointer(16)
//! buf.putUInt32(7, true)
//! buf.seek(-4).getUInt32()     # prints 7
//! ```
//!
//! Variables live in the root of a garbage-collected arena. The heap is fully
//! collected after every statement, so an owning accessor that is no longer
//! reachable from a variable frees its allocation before the next line runs.
pub mod lexer;
pub mod parser;

use crate::{
    error::ScriptError,
    host::{self, GCHandle, HostValue},
};
use gc_arena::{Arena, Collect, Rootable};
use parser::{Expr, Literal, Statement};
use std::{collections::HashMap, io::Write};

#[derive(Collect, Default)]
#[collect(no_drop)]
pub struct Globals<'gc> {
    vars: HashMap<String, HostValue<'gc>>,
}

pub type HostArena = Arena<Rootable!['gc => Globals<'gc>]>;

pub struct Interpreter {
    arena: HostArena,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            arena: HostArena::new(|_| Globals::default()),
        }
    }

    /// Runs one line. Returns the printed form of an expression statement's
    /// result, unless it was `undefined`.
    pub fn run_line(&mut self, line: &str) -> Result<Option<String>, ScriptError> {
        let Some(statement) = parser::parse_statement(lexer::tokenize(line)?)? else {
            return Ok(None);
        };

        let result = self.arena.mutate_root(|gc, globals| match statement {
            Statement::Let { name, value } => {
                let value = eval(gc, globals, &value)?;
                globals.vars.insert(name, value);
                Ok(None)
            }
            Statement::Expr(expr) => match eval(gc, globals, &expr)? {
                HostValue::Undefined => Ok(None),
                value => Ok(Some(value.to_string())),
            },
        });

        self.arena.collect_all();
        result
    }

    /// Runs a whole script, writing printed results to `out`. Stops at the
    /// first failing line.
    pub fn run(&mut self, source: &str, out: &mut impl Write) -> Result<(), ScriptError> {
        for (index, line) in source.lines().enumerate() {
            let printed = self.run_line(line).map_err(|e| ScriptError::Statement {
                line: index + 1,
                source: Box::new(e),
            })?;
            if let Some(printed) = printed {
                writeln!(out, "{printed}").map_err(|e| ScriptError::Io(e.to_string()))?;
            }
        }
        Ok(())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.arena.mutate(|_, globals| globals.vars.contains_key(name))
    }
}

fn eval<'gc>(
    gc: GCHandle<'gc>,
    globals: &Globals<'gc>,
    expr: &Expr,
) -> Result<HostValue<'gc>, ScriptError> {
    match expr {
        Expr::Literal(Literal::Undefined) => Ok(HostValue::Undefined),
        Expr::Literal(Literal::Boolean(b)) => Ok(HostValue::Boolean(*b)),
        Expr::Literal(Literal::Number(n)) => Ok(HostValue::Number(*n)),
        Expr::Literal(Literal::String(s)) => Ok(HostValue::String(s.clone())),
        Expr::Var(name) => globals
            .vars
            .get(name)
            .cloned()
            .ok_or_else(|| ScriptError::UndefinedVariable(name.clone())),
        Expr::New(args) => {
            let args = eval_args(gc, globals, args)?;
            Ok(host::construct(gc, &args)?)
        }
        Expr::Property { object, name } => {
            let this = eval_object(gc, globals, object)?;
            Ok(host::get_property(this, name)?)
        }
        Expr::Call {
            object,
            method,
            args,
        } => {
            let this = eval_object(gc, globals, object)?;
            let args = eval_args(gc, globals, args)?;
            Ok(host::call_method(gc, this, method, &args)?)
        }
    }
}

fn eval_object<'gc>(
    gc: GCHandle<'gc>,
    globals: &Globals<'gc>,
    expr: &Expr,
) -> Result<host::PointerRef<'gc>, ScriptError> {
    let value = eval(gc, globals, expr)?;
    value
        .as_pointer()
        .ok_or_else(|| ScriptError::NotAnObject(value.type_name().to_string()))
}

fn eval_args<'gc>(
    gc: GCHandle<'gc>,
    globals: &Globals<'gc>,
    args: &[Expr],
) -> Result<Vec<HostValue<'gc>>, ScriptError> {
    args.iter().map(|a| eval(gc, globals, a)).collect()
}
