use std::fmt;

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum NodeError {
    InvalidNode(String),
    UnknownNodeKind(String),
    MalformedConstruct {
        kind: &'static str,
        field: &'static str,
    },
}
pub type Result<T> = std::result::Result<T, NodeError>;

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::InvalidNode(value) => write!(f, "not a valid node: {value}"),
            NodeError::UnknownNodeKind(kind) => write!(f, "unknown node of type {kind}"),
            NodeError::MalformedConstruct { kind, field } => {
                write!(f, "{kind} node is missing or has a malformed `{field}` field")
            }
        }
    }
}
impl std::error::Error for NodeError {}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Access(Box<Node>, Box<Node>),
    Assignment(Box<Node>, Box<Node>),
    BinaryOp(String, Box<Node>, Box<Node>),
    Block(Vec<Node>),
    Boolean(bool),
    Break,
    Call(Box<Node>, Option<Box<Node>>),
    Case(Box<Node>, Box<Node>),
    Catch(Box<Node>, Vec<Node>),
    Choice(Box<Node>, Vec<Node>, Box<Node>),
    Compare(String, Box<Node>, Box<Node>),
    Conditional(Box<Node>, Vec<Node>, Option<Vec<Node>>),
    Continue,
    Expression(Box<Node>),
    Function(Option<Box<Node>>, Box<Node>),
    Handler(Box<Node>, Box<Node>),
    Identifier(String),
    IndexVar,
    Iterator(Box<Node>, Box<Node>),
    List(Vec<Node>),
    ListValue(Vec<Node>),
    Logical(String, Box<Node>, Box<Node>),
    Loop(Option<Box<Node>>, Vec<Node>),
    New(Option<Box<Node>>, Option<Box<Node>>, Option<Box<Node>>),
    Null,
    Number(f64),
    Object(Vec<Node>),
    Program(Vec<Node>),
    Property(Box<Node>, Box<Node>),
    Return(Option<Box<Node>>),
    String(String),
    Ternary(Box<Node>, Box<Node>, Box<Node>),
    Throw(Box<Node>),
    UnaryOp(String, Box<Node>),
}

/// Builds a [`Node`] tree out of the JSON the parser front-end emits,
/// where every node is an object tagged with a `"type"` field.
pub fn decode(value: &Value) -> Result<Node> {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => return Err(NodeError::InvalidNode(value.to_string())),
    };
    let kind = match obj.get("type").and_then(Value::as_str) {
        Some(kind) => kind,
        None => return Err(NodeError::InvalidNode(value.to_string())),
    };
    Ok(match kind {
        "access" => Node::Access(child(obj, "access", "obj")?, child(obj, "access", "prop")?),
        "assignment" => Node::Assignment(
            child(obj, "assignment", "id")?,
            child(obj, "assignment", "value")?,
        ),
        "binop" => {
            let (left, right) = operands(obj, "binop")?;
            Node::BinaryOp(string_field(obj, "binop", "op")?, left, right)
        }
        "block" => Node::Block(children(obj, "block", "statements")?),
        "boolean" => match node_field(obj, "boolean", "value")? {
            Value::Bool(b) => Node::Boolean(*b),
            _ => {
                return Err(NodeError::MalformedConstruct {
                    kind: "boolean",
                    field: "value",
                })
            }
        },
        "break" => Node::Break,
        "call" => Node::Call(
            child(obj, "call", "receiver")?,
            child_opt(obj, "parameters")?,
        ),
        "case" => Node::Case(child(obj, "case", "when")?, child(obj, "case", "statements")?),
        "catch" => Node::Catch(
            child(obj, "catch", "error")?,
            children(obj, "catch", "block")?,
        ),
        "choice" => Node::Choice(
            child(obj, "choice", "switchexpr")?,
            children(obj, "choice", "cases")?,
            child(obj, "choice", "defaultexpr")?,
        ),
        "compare" => {
            let (left, right) = operands(obj, "compare")?;
            Node::Compare(string_field(obj, "compare", "op")?, left, right)
        }
        "conditional" => Node::Conditional(
            child(obj, "conditional", "condition")?,
            children(obj, "conditional", "yes")?,
            children_opt(obj, "conditional", "no")?,
        ),
        "continue" => Node::Continue,
        "expression" => Node::Expression(child(obj, "expression", "expr")?),
        "function" => Node::Function(
            child_opt(obj, "parameters")?,
            child(obj, "function", "block")?,
        ),
        "handler" => Node::Handler(
            child(obj, "handler", "trying")?,
            child(obj, "handler", "catching")?,
        ),
        "identifier" => Node::Identifier(string_field(obj, "identifier", "id")?),
        "iterator" => Node::Iterator(
            child(obj, "iterator", "source")?,
            child(obj, "iterator", "block")?,
        ),
        "list" => Node::List(children(obj, "list", "values")?),
        "listvalue" => Node::ListValue(children(obj, "listvalue", "values")?),
        "logical" => {
            let (left, right) = operands(obj, "logical")?;
            Node::Logical(string_field(obj, "logical", "op")?, left, right)
        }
        "loop" => Node::Loop(
            child_opt(obj, "condition")?,
            children(obj, "loop", "block")?,
        ),
        "new" => Node::New(
            child_opt(obj, "func")?,
            child_opt(obj, "id")?,
            child_opt(obj, "definition")?,
        ),
        "null" => Node::Null,
        "number" => match node_field(obj, "number", "value")? {
            Value::Number(n) => match n.as_f64() {
                Some(n) => Node::Number(n),
                None => {
                    return Err(NodeError::MalformedConstruct {
                        kind: "number",
                        field: "value",
                    })
                }
            },
            // the front-end sometimes leaves numeric literals as strings
            Value::String(s) => match s.parse() {
                Ok(n) => Node::Number(n),
                Err(_) => {
                    return Err(NodeError::MalformedConstruct {
                        kind: "number",
                        field: "value",
                    })
                }
            },
            _ => {
                return Err(NodeError::MalformedConstruct {
                    kind: "number",
                    field: "value",
                })
            }
        },
        "object" => Node::Object(children(obj, "object", "properties")?),
        "program" => Node::Program(children(obj, "program", "statements")?),
        "property" => Node::Property(
            child(obj, "property", "id")?,
            child(obj, "property", "value")?,
        ),
        "return" => match obj.get("value") {
            None | Some(Value::Null) => Node::Return(None),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(n) => Node::Return(Some(Box::new(Node::Number(n)))),
                None => {
                    return Err(NodeError::MalformedConstruct {
                        kind: "return",
                        field: "value",
                    })
                }
            },
            Some(Value::String(s)) => Node::Return(Some(Box::new(Node::String(s.clone())))),
            Some(Value::Bool(b)) => Node::Return(Some(Box::new(Node::Boolean(*b)))),
            Some(value) => Node::Return(Some(Box::new(decode(value)?))),
        },
        "string" => Node::String(string_field(obj, "string", "value")?),
        "ternary" => Node::Ternary(
            child(obj, "ternary", "condition")?,
            child(obj, "ternary", "yes")?,
            child(obj, "ternary", "no")?,
        ),
        "throw" => Node::Throw(child(obj, "throw", "value")?),
        "unaryop" => Node::UnaryOp(
            string_field(obj, "unaryop", "op")?,
            child(obj, "unaryop", "oper")?,
        ),
        "_indexvar" => Node::IndexVar,
        other => return Err(NodeError::UnknownNodeKind(other.to_string())),
    })
}

fn node_field<'a>(
    obj: &'a Map<String, Value>,
    kind: &'static str,
    name: &'static str,
) -> Result<&'a Value> {
    obj.get(name)
        .ok_or(NodeError::MalformedConstruct { kind, field: name })
}

fn string_field(obj: &Map<String, Value>, kind: &'static str, name: &'static str) -> Result<String> {
    match node_field(obj, kind, name)? {
        Value::String(s) => Ok(s.clone()),
        _ => Err(NodeError::MalformedConstruct { kind, field: name }),
    }
}

fn child(obj: &Map<String, Value>, kind: &'static str, name: &'static str) -> Result<Box<Node>> {
    Ok(Box::new(decode(node_field(obj, kind, name)?)?))
}

fn child_opt(obj: &Map<String, Value>, name: &'static str) -> Result<Option<Box<Node>>> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(Box::new(decode(value)?))),
    }
}

fn children(obj: &Map<String, Value>, kind: &'static str, name: &'static str) -> Result<Vec<Node>> {
    match node_field(obj, kind, name)? {
        Value::Array(items) => items.iter().map(decode).collect(),
        _ => Err(NodeError::MalformedConstruct { kind, field: name }),
    }
}

fn children_opt(
    obj: &Map<String, Value>,
    kind: &'static str,
    name: &'static str,
) -> Result<Option<Vec<Node>>> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.iter().map(decode).collect::<Result<_>>()?)),
        Some(_) => Err(NodeError::MalformedConstruct { kind, field: name }),
    }
}

fn operands(obj: &Map<String, Value>, kind: &'static str) -> Result<(Box<Node>, Box<Node>)> {
    match node_field(obj, kind, "opers")? {
        Value::Array(items) if items.len() == 2 => Ok((
            Box::new(decode(&items[0])?),
            Box::new(decode(&items[1])?),
        )),
        _ => Err(NodeError::MalformedConstruct {
            kind,
            field: "opers",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_a_tagged_tree() {
        let value = json!({
            "type": "assignment",
            "id": { "type": "identifier", "id": "x" },
            "value": { "type": "number", "value": 5 },
        });
        assert_eq!(
            decode(&value).unwrap(),
            Node::Assignment(
                Box::new(Node::Identifier("x".to_string())),
                Box::new(Node::Number(5.0)),
            )
        );
    }

    #[test]
    fn rejects_values_without_a_type_tag() {
        assert_eq!(
            decode(&json!({ "id": "x" })),
            Err(NodeError::InvalidNode("{\"id\":\"x\"}".to_string()))
        );
        assert!(matches!(decode(&json!(42)), Err(NodeError::InvalidNode(_))));
    }

    #[test]
    fn rejects_unknown_kinds() {
        assert_eq!(
            decode(&json!({ "type": "bogus" })),
            Err(NodeError::UnknownNodeKind("bogus".to_string()))
        );
    }

    #[test]
    fn reports_the_missing_field() {
        assert_eq!(
            decode(&json!({ "type": "assignment", "id": { "type": "identifier", "id": "x" } })),
            Err(NodeError::MalformedConstruct {
                kind: "assignment",
                field: "value",
            })
        );
    }

    #[test]
    fn numeric_strings_still_decode_as_numbers() {
        assert_eq!(
            decode(&json!({ "type": "number", "value": "12.5" })),
            Ok(Node::Number(12.5))
        );
    }

    #[test]
    fn scalar_return_values_become_literal_nodes() {
        assert_eq!(
            decode(&json!({ "type": "return", "value": 3 })),
            Ok(Node::Return(Some(Box::new(Node::Number(3.0)))))
        );
        assert_eq!(decode(&json!({ "type": "return" })), Ok(Node::Return(None)));
    }
}
