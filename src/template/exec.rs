//! Tree-walking executor.

use super::error::TemplateError;
use super::parse::{Branches, Command, Node, Operand, Parsed, Pipeline, RangeNode, TemplateCall, TemplateName};
use super::value::Value;
use crate::config::EvalLimits;
use crate::funcs::{CallContext, FuncError, FuncRegistry};

/// Bodies entered at once, counting blocks and `template` calls together.
const MAX_WALK_DEPTH: usize = 2 * super::parse::MAX_NESTING;

/// Everything execution reads besides the template and its data.
pub(crate) struct Env<'a> {
    pub funcs: &'a FuncRegistry,
    pub call: CallContext<'a>,
    pub limits: &'a EvalLimits,
}

/// Run `entry` (the root or one of the defines of `parsed`) against `data`.
pub(crate) fn execute(
    name: &str,
    parsed: &Parsed,
    entry: &[Node],
    data: &Value,
    env: &Env<'_>,
) -> Result<String, TemplateError> {
    let mut exec = Exec {
        name,
        parsed,
        env,
        vars: vec![("$".to_string(), data.clone())],
        out: String::new(),
        depth: 0,
        walk_depth: 0,
        line: 1,
    };
    exec.walk(entry, data)?;
    Ok(exec.out)
}

enum Flow {
    Next,
    Break,
    Continue,
}

struct Exec<'e, 'p> {
    name: &'e str,
    parsed: &'p Parsed,
    env: &'e Env<'e>,
    vars: Vec<(String, Value)>,
    out: String,
    depth: usize,
    walk_depth: usize,
    /// Line of the most recent action, for errors raised while writing text.
    line: usize,
}

impl<'p> Exec<'_, 'p> {
    fn error(&self, line: usize, at: impl std::fmt::Display, message: impl Into<String>) -> TemplateError {
        TemplateError::exec(self.name, line, at, message)
    }

    fn write(&mut self, text: &str, at: &dyn std::fmt::Display) -> Result<(), TemplateError> {
        if let Some(max) = self.env.limits.max_output_bytes {
            if self.out.len() + text.len() > max {
                return Err(self.error(self.line, at, format!("output exceeds {max} bytes")));
            }
        }
        self.out.push_str(text);
        Ok(())
    }

    fn walk(&mut self, nodes: &'p [Node], dot: &Value) -> Result<Flow, TemplateError> {
        if self.walk_depth >= MAX_WALK_DEPTH {
            return Err(self.error(
                self.line,
                &"body",
                format!("exceeded maximum nesting depth ({MAX_WALK_DEPTH})"),
            ));
        }
        self.walk_depth += 1;
        let flow = self.walk_nodes(nodes, dot);
        self.walk_depth -= 1;
        flow
    }

    fn walk_nodes(&mut self, nodes: &'p [Node], dot: &Value) -> Result<Flow, TemplateError> {
        for node in nodes {
            let flow = match node {
                Node::Text(text) => {
                    self.write(text, &"text")?;
                    Flow::Next
                }
                Node::Action(pipe) => {
                    self.line = pipe.line;
                    let value = self.eval_pipeline(pipe, dot)?;
                    if pipe.decl.is_empty() {
                        self.write(&value.to_output(), pipe)?;
                    }
                    Flow::Next
                }
                Node::If(branches) => self.walk_branches(branches, dot, false)?,
                Node::With(branches) => self.walk_branches(branches, dot, true)?,
                Node::Range(range) => self.walk_range(range, dot)?,
                Node::Template(call) => {
                    self.call_template(call, dot)?;
                    Flow::Next
                }
                Node::Break(_) => Flow::Break,
                Node::Continue(_) => Flow::Continue,
            };
            if !matches!(flow, Flow::Next) {
                return Ok(flow);
            }
        }
        Ok(Flow::Next)
    }

    fn walk_branches(&mut self, b: &'p Branches, dot: &Value, is_with: bool) -> Result<Flow, TemplateError> {
        self.line = b.line;
        let mark = self.vars.len();
        let mut flow = None;
        for (pipe, body) in &b.branches {
            let value = self.eval_pipeline(pipe, dot)?;
            if value.is_truthy() {
                let inner = if is_with { value } else { dot.clone() };
                flow = Some(self.walk(body, &inner)?);
                break;
            }
        }
        let flow = match (flow, &b.otherwise) {
            (Some(flow), _) => flow,
            (None, Some(otherwise)) => self.walk(otherwise, dot)?,
            (None, None) => Flow::Next,
        };
        self.vars.truncate(mark);
        Ok(flow)
    }

    fn walk_range(&mut self, r: &'p RangeNode, dot: &Value) -> Result<Flow, TemplateError> {
        self.line = r.line;
        let value = self.eval_value(&r.pipe, dot)?;
        let items: Box<dyn Iterator<Item = (Value, Value)>> = match value {
            Value::List(items) => Box::new(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (Value::from(i), item)),
            ),
            Value::Map(map) => Box::new(map.into_iter().map(|(k, v)| (Value::Str(k), v))),
            Value::Int(n) => Box::new((0..n.max(0)).map(|i| (Value::Int(i), Value::Int(i)))),
            Value::Nil => Box::new(std::iter::empty()),
            other => {
                return Err(self.error(r.line, &r.pipe, format!("range can't iterate over {other}")));
            }
        };
        let mut items = items.peekable();
        if items.peek().is_none() {
            if let Some(otherwise) = &r.otherwise {
                return self.walk(otherwise, dot);
            }
            return Ok(Flow::Next);
        }
        let max = self.env.limits.max_range_iterations;
        for (count, (key, elem)) in items.enumerate() {
            if max.is_some_and(|max| count >= max) {
                return Err(self.error(
                    r.line,
                    &r.pipe,
                    format!("range exceeds {} iterations", max.unwrap_or_default()),
                ));
            }
            let mark = self.vars.len();
            match r.pipe.decl.as_slice() {
                [value_var] => self.vars.push((value_var.clone(), elem.clone())),
                [key_var, value_var] => {
                    self.vars.push((key_var.clone(), key));
                    self.vars.push((value_var.clone(), elem.clone()));
                }
                _ => {}
            }
            let flow = self.walk(&r.body, &elem)?;
            self.vars.truncate(mark);
            if matches!(flow, Flow::Break) {
                break;
            }
        }
        Ok(Flow::Next)
    }

    fn call_template(&mut self, call: &TemplateCall, dot: &Value) -> Result<(), TemplateError> {
        self.line = call.line;
        let name = match &call.name {
            TemplateName::Literal(name) => name.clone(),
            TemplateName::Dynamic(op) => match self.eval_arg(op, dot, call.line)? {
                Value::Str(name) => name,
                other => {
                    return Err(self.error(
                        call.line,
                        op,
                        format!("template name must be a string; got {}", other.kind()),
                    ))
                }
            },
        };
        let at = format!("template {name:?}");
        let parsed = self.parsed;
        let Some(body) = parsed.defines.get(&name) else {
            return Err(self.error(call.line, &at, format!("no such template {name:?}")));
        };
        let max_depth = self.env.limits.max_exec_depth;
        if self.depth >= max_depth {
            return Err(self.error(
                call.line,
                &at,
                format!("exceeded maximum template depth ({max_depth})"),
            ));
        }
        let data = match &call.pipe {
            Some(pipe) => self.eval_value(pipe, dot)?,
            None => Value::Nil,
        };
        let saved = std::mem::replace(&mut self.vars, vec![("$".to_string(), data.clone())]);
        self.depth += 1;
        let result = self.walk(body, &data);
        self.depth -= 1;
        self.vars = saved;
        result.map(|_| ())
    }

    /// Evaluate a pipeline and bind its declared variables.
    fn eval_pipeline(&mut self, pipe: &Pipeline, dot: &Value) -> Result<Value, TemplateError> {
        let value = self.eval_value(pipe, dot)?;
        for var in &pipe.decl {
            if pipe.assign {
                match self.vars.iter_mut().rev().find(|(name, _)| name == var) {
                    Some(slot) => slot.1 = value.clone(),
                    None => {
                        return Err(self.error(pipe.line, pipe, format!("undefined variable: {var}")))
                    }
                }
            } else {
                self.vars.push((var.clone(), value.clone()));
            }
        }
        Ok(value)
    }

    /// Evaluate a pipeline without binding variables.
    fn eval_value(&mut self, pipe: &Pipeline, dot: &Value) -> Result<Value, TemplateError> {
        let mut value = None;
        for cmd in &pipe.cmds {
            value = Some(self.eval_command(cmd, dot, value, pipe.line)?);
        }
        Ok(value.unwrap_or_default())
    }

    fn eval_command(
        &mut self,
        cmd: &Command,
        dot: &Value,
        piped: Option<Value>,
        line: usize,
    ) -> Result<Value, TemplateError> {
        let Some(first) = cmd.args.first() else {
            return Err(self.error(line, cmd, "empty command"));
        };
        if let Operand::Func(name) = first {
            return self.call_func(name, &cmd.args[1..], dot, piped, line);
        }
        if cmd.args.len() > 1 || piped.is_some() {
            return Err(self.error(line, first, format!("can't give argument to non-function {first}")));
        }
        self.eval_arg(first, dot, line)
    }

    fn call_func(
        &mut self,
        name: &str,
        args: &[Operand],
        dot: &Value,
        piped: Option<Value>,
        line: usize,
    ) -> Result<Value, TemplateError> {
        let env = self.env;
        let Some(func) = env.funcs.get(name) else {
            return Err(self.error(line, name, format!("function {name:?} not defined")));
        };
        let mut values = Vec::with_capacity(args.len() + 1);
        for arg in args {
            values.push(self.eval_arg(arg, dot, line)?);
        }
        values.extend(piped);
        func.call(&env.call, &values).map_err(|e| {
            let message = match e {
                FuncError::Arity { .. } => e.to_string(),
                other => format!("error calling {name}: {other}"),
            };
            self.error(line, name, message)
        })
    }

    fn eval_arg(&mut self, op: &Operand, dot: &Value, line: usize) -> Result<Value, TemplateError> {
        match op {
            Operand::Dot => Ok(dot.clone()),
            Operand::Nil => Ok(Value::Nil),
            Operand::Bool(b) => Ok(Value::Bool(*b)),
            Operand::Int(i) => Ok(Value::Int(*i)),
            Operand::Float(x) => Ok(Value::Float(*x)),
            Operand::Str(s) => Ok(Value::Str(s.clone())),
            Operand::Field(chain) => self.walk_fields(dot.clone(), chain, op, line),
            Operand::Var(name, chain) => {
                let Some(base) = self.vars.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v.clone())
                else {
                    return Err(self.error(line, op, format!("undefined variable: {name}")));
                };
                self.walk_fields(base, chain, op, line)
            }
            Operand::Func(name) => self.call_func(name, &[], dot, None, line),
            Operand::Pipe(pipe, chain) => {
                let base = self.eval_value(pipe, dot)?;
                self.walk_fields(base, chain, op, line)
            }
        }
    }

    fn walk_fields(&self, mut value: Value, chain: &[String], op: &Operand, line: usize) -> Result<Value, TemplateError> {
        for field in chain {
            value = value.field(field).map_err(|message| self.error(line, op, message))?;
        }
        Ok(value)
    }
}
