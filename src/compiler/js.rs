use std::collections::HashSet;

use crate::ast::{Node, NodeError, Result};

// JavaScript reserved words.
// (Note: ES3 keywords that were removed in ES5 aren't included.)
// Sanitized identifiers are not yet checked against this list.
pub const RESERVED: &[&str] = &[
    "break", "case", "catch", "continue", "debugger", "default", "delete", "do", "else",
    "finally", "for", "function", "if", "in", "instanceof", "new", "return", "switch", "this",
    "throw", "try", "typeof", "var", "void", "while", "with", "class", "const", "enum",
    "export", "extends", "import", "super", "implements", "interface", "let", "package",
    "private", "protected", "public", "static", "yield", "null", "true", "false", "NaN",
    "Infinity", "undefined", "eval", "arguments",
];

const LOOP_COUNTER: &str = "$_i";
const LOOP_SNAPSHOT: &str = "$_e";
const INDEX_VAR: &str = "$it";

pub fn compile(ast: &Node) -> Result<String> {
    let mut ctx = Context::new();
    to_js(ast, &mut ctx)
}

/// Per-compilation state: which names have already been declared, and the
/// counter that names anonymous function literals. One instance per
/// `compile` call, never shared.
struct Context {
    declared: HashSet<String>,
    function_number: u32,
}

impl Context {
    fn new() -> Self {
        Self {
            declared: HashSet::new(),
            function_number: 0,
        }
    }
    fn declare(&mut self, name: &str) -> bool {
        self.declared.insert(name.to_string())
    }
    fn next_function(&mut self) -> u32 {
        let n = self.function_number;
        self.function_number += 1;
        n
    }
}

fn to_js(node: &Node, ctx: &mut Context) -> Result<String> {
    Ok(match node {
        Node::Access(obj, prop) => {
            if matches!(&**prop, Node::Identifier(_)) {
                format!("{}.{}", to_js(obj, ctx)?, to_js(prop, ctx)?)
            } else {
                format!("{}[{}]", to_js(obj, ctx)?, to_js(prop, ctx)?)
            }
        }
        Node::Assignment(target, value) => {
            // Declaration on first assignment, anywhere in the unit. The
            // set is keyed by the raw identifier, before sanitization.
            let name = match &**target {
                Node::Identifier(id) => id,
                _ => {
                    return Err(NodeError::MalformedConstruct {
                        kind: "assignment",
                        field: "id",
                    })
                }
            };
            let fresh = ctx.declare(name);
            format!(
                "{}{} = {}",
                if fresh { "var " } else { "" },
                to_js(target, ctx)?,
                to_js(value, ctx)?
            )
        }
        Node::BinaryOp(op, left, right) => {
            if op != "^" {
                format!("{} {} {}", to_js(left, ctx)?, op, to_js(right, ctx)?)
            } else {
                // Elan has a power operator, but JS doesn't
                format!("Math.pow({},{})", to_js(left, ctx)?, to_js(right, ctx)?)
            }
        }
        Node::Block(statements) => statements_js(statements, ctx)?,
        Node::Boolean(value) => value.to_string(),
        Node::Break => "break".to_string(),
        Node::Call(receiver, parameters) => {
            let params = match parameters {
                Some(list) => to_js(list, ctx)?,
                None => String::new(),
            };
            let mut callee = to_js(receiver, ctx)?;
            if matches!(&**receiver, Node::Function(_, _)) {
                // a function literal used as a call target has to be
                // parenthesized, or JS reads it as a declaration
                callee = format!("({callee})");
            }
            format!("{callee}({params})")
        }
        Node::Case(when, statements) => {
            format!(
                "case {}: {}break;",
                to_js(when, ctx)?,
                to_js(statements, ctx)?
            )
        }
        Node::Catch(error, block) => {
            format!(
                "catch ({}) {{ {} }}",
                to_js(error, ctx)?,
                statements_js(block, ctx)?
            )
        }
        Node::Choice(switchexpr, cases, defaultexpr) => {
            format!(
                "switch ({}) {{ {} default: {}}}",
                to_js(switchexpr, ctx)?,
                join_js(cases, ctx, "", false)?,
                to_js(defaultexpr, ctx)?
            )
        }
        Node::Compare(op, left, right) => {
            format!("{} {} {}", to_js(left, ctx)?, op, to_js(right, ctx)?)
        }
        Node::Conditional(condition, yes, no) => {
            let mut out = format!(
                "if ({}) {{ {} }}",
                to_js(condition, ctx)?,
                statements_js(yes, ctx)?
            );
            if let Some(no) = no {
                out.push_str(&format!(" else {{ {} }}", statements_js(no, ctx)?));
            }
            out
        }
        Node::Continue => "continue".to_string(),
        Node::Expression(expr) => to_js(expr, ctx)?,
        Node::Function(parameters, block) => {
            let params = match parameters {
                Some(list) => to_js(list, ctx)?,
                None => String::new(),
            };
            let number = ctx.next_function();
            // a body that is a single bare expression returns it implicitly;
            // desugar on a rebuilt node, the input tree stays untouched
            let body = match &**block {
                Node::Block(statements) if statements.len() == 1 => match &statements[0] {
                    Node::Expression(expr) => to_js(
                        &Node::Block(vec![Node::Return(Some(expr.clone()))]),
                        ctx,
                    )?,
                    _ => to_js(block, ctx)?,
                },
                _ => to_js(block, ctx)?,
            };
            format!("function ${number} ({params}) {{ {body} }}")
        }
        Node::Handler(trying, catching) => {
            format!("try {{ {} }} {}", to_js(trying, ctx)?, to_js(catching, ctx)?)
        }
        Node::Identifier(id) => sanitize_identifier(id),
        Node::IndexVar => INDEX_VAR.to_string(),
        Node::Iterator(source, block) => {
            // No single JS construct covers every collection shape, so this
            // becomes a counting loop over a snapshot taken once up front.
            let source = to_js(source, ctx)?;
            let body = to_js(block, ctx)?;
            format!(
                "for (var {ctr} = 0,{snap} = {source},{it} = {snap}[0];\
                 {ctr} < {snap}.length; \
                 {ctr}++,{it} = {snap}[{ctr}]) {{ {body} }}",
                ctr = LOOP_COUNTER,
                snap = LOOP_SNAPSHOT,
                it = INDEX_VAR,
            )
        }
        Node::List(values) => join_js(values, ctx, ",", false)?,
        Node::ListValue(values) => format!("[{}]", join_js(values, ctx, ",", false)?),
        Node::Logical(op, left, right) => {
            format!("{}{}{}", to_js(left, ctx)?, op, to_js(right, ctx)?)
        }
        Node::Loop(condition, block) => {
            let condition = match condition {
                Some(condition) => to_js(condition, ctx)?,
                None => "true".to_string(),
            };
            format!("while ({}) {{ {} }}", condition, statements_js(block, ctx)?)
        }
        Node::New(func, id, definition) => {
            let constructor = match (func, id, definition) {
                (Some(func), _, _) => func,
                (_, Some(id), _) => id,
                (_, _, Some(definition)) => definition,
                _ => {
                    return Err(NodeError::MalformedConstruct {
                        kind: "new",
                        field: "func",
                    })
                }
            };
            format!("new {}", to_js(constructor, ctx)?)
        }
        Node::Null => "null".to_string(),
        Node::Number(value) => value.to_string(),
        Node::Object(properties) => format!("{{{}}}", join_js(properties, ctx, ", ", false)?),
        Node::Program(statements) => statements_js(statements, ctx)?,
        Node::Property(id, value) => {
            format!("{}: {}", to_js(id, ctx)?, to_js(value, ctx)?)
        }
        Node::Return(value) => match value {
            Some(value) => format!("return {}", to_js(value, ctx)?),
            None => "return".to_string(),
        },
        Node::String(value) => format!("\"{}\"", value.replace('"', "\\\"")),
        Node::Ternary(condition, yes, no) => {
            format!(
                "({}) ? {} : {}",
                to_js(condition, ctx)?,
                to_js(yes, ctx)?,
                to_js(no, ctx)?
            )
        }
        Node::Throw(value) => format!("throw new Error({})", to_js(value, ctx)?),
        Node::UnaryOp(op, oper) => format!("{}{}", op, to_js(oper, ctx)?),
    })
}

fn join_js(nodes: &[Node], ctx: &mut Context, separator: &str, trailing: bool) -> Result<String> {
    let mut parts = Vec::with_capacity(nodes.len());
    for node in nodes {
        parts.push(to_js(node, ctx)?);
    }
    let mut out = parts.join(separator);
    if trailing {
        out.push_str(separator);
    }
    Ok(out)
}

// Statement lists self-terminate every statement, the last one included,
// so the output is valid JS before any pretty-printer touches it.
fn statements_js(nodes: &[Node], ctx: &mut Context) -> Result<String> {
    join_js(nodes, ctx, ";\n", true)
}

/// Rewrites characters that were surrogate pairs in the source encoding
/// (code points U+10000..=U+2FFFF) into `$<hi>$<lo>`, the two UTF-16
/// halves in hex. Every other character passes through, so two uses of
/// the same identifier always sanitize to the same JS name.
fn sanitize_identifier(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        let cp = c as u32;
        if (0x10000..=0x2FFFF).contains(&cp) {
            let hi = 0xD800 + ((cp - 0x10000) >> 10);
            let lo = 0xDC00 + ((cp - 0x10000) & 0x3FF);
            out.push_str(&format!("${hi:x}${lo:x}"));
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers_pass_through() {
        assert_eq!(sanitize_identifier("counter"), "counter");
        assert_eq!(sanitize_identifier("_x$2"), "_x$2");
    }

    #[test]
    fn surrogate_pairs_become_hex_halves() {
        // U+1D11E encodes as the pair d834/dd1e
        assert_eq!(sanitize_identifier("\u{1D11E}"), "$d834$dd1e");
        assert_eq!(sanitize_identifier("a\u{1D11E}b"), "a$d834$dd1eb");
    }

    #[test]
    fn sanitization_is_referentially_consistent() {
        let a = sanitize_identifier("x\u{2070E}");
        let b = sanitize_identifier("x\u{2070E}");
        assert_eq!(a, b);
        assert_ne!(a, sanitize_identifier("x\u{2070F}"));
    }

    #[test]
    fn code_points_past_the_pair_range_pass_through() {
        // U+30000 has a high surrogate above D87F, outside the range the
        // source encoding produces
        assert_eq!(sanitize_identifier("\u{30000}"), "\u{30000}");
    }

    #[test]
    fn reserved_list_covers_the_literals() {
        for word in ["null", "true", "false", "undefined"] {
            assert!(RESERVED.contains(&word));
        }
    }
}
