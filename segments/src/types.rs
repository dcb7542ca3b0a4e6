/// AST types for segment query trees
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Comparison operator of a condition, serialized by its lowercase tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../bindings/segments/")]
pub enum Operator {
    Equals,   // column = value
    Gt,       // column > value
    Lt,       // column < value
    Gte,      // column >= value
    Lte,      // column <= value
    Contains, // case-insensitive substring
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::Contains => "contains",
        }
    }

    /// Whether the operator is meaningful for a field of the given type
    pub fn supports(&self, value_type: ValueType) -> bool {
        match self {
            Operator::Equals => true,
            Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte => {
                value_type != ValueType::Boolean
            }
            Operator::Contains => value_type == ValueType::String,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Boolean combinator of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export, export_to = "../../bindings/segments/")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn keyword(&self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// Declared type of a registry field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "../../bindings/segments/")]
pub enum ValueType {
    Number,
    String,
    Boolean,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Number => write!(f, "number"),
            ValueType::String => write!(f, "string"),
            ValueType::Boolean => write!(f, "boolean"),
        }
    }
}

/// Untyped scalar as authored in the builder, before registry coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

/// Leaf predicate: field, operator, value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/segments/")]
pub struct ConditionNode {
    pub field: String,
    pub operator: Operator,
    #[ts(type = "number | string | boolean")]
    pub value: Value,
}

impl ConditionNode {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Boolean group of child nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/segments/")]
pub struct ContainerNode {
    pub operator: Combinator,
    pub children: Vec<Node>,
}

impl ContainerNode {
    pub fn new(operator: Combinator, children: Vec<Node>) -> Self {
        Self { operator, children }
    }

    pub fn and(children: Vec<Node>) -> Self {
        Self::new(Combinator::And, children)
    }

    pub fn or(children: Vec<Node>) -> Self {
        Self::new(Combinator::Or, children)
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "lowercase")]
#[ts(export, export_to = "../../bindings/segments/")]
pub enum Node {
    Condition(ConditionNode),
    Container(ContainerNode),
}

impl Node {
    pub fn condition(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        Node::Condition(ConditionNode::new(field, operator, value))
    }

    pub fn and(children: Vec<Node>) -> Self {
        Node::Container(ContainerNode::and(children))
    }

    pub fn or(children: Vec<Node>) -> Self {
        Node::Container(ContainerNode::or(children))
    }

    /// Number of levels, counting a lone condition or an empty container as one
    pub fn depth(&self) -> usize {
        match self {
            Node::Condition(_) => 1,
            Node::Container(container) => container.depth(),
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            Node::Condition(_) => 1,
            Node::Container(container) => container.node_count(),
        }
    }

    /// Conditions in document order (depth-first, left-to-right)
    pub fn conditions(&self) -> Vec<&ConditionNode> {
        let mut out = Vec::new();
        collect_conditions(self, &mut out);
        out
    }
}

fn collect_conditions<'a>(node: &'a Node, out: &mut Vec<&'a ConditionNode>) {
    match node {
        Node::Condition(condition) => out.push(condition),
        Node::Container(container) => {
            for child in &container.children {
                collect_conditions(child, out);
            }
        }
    }
}

impl From<ConditionNode> for Node {
    fn from(value: ConditionNode) -> Self {
        Node::Condition(value)
    }
}

impl From<ContainerNode> for Node {
    fn from(value: ContainerNode) -> Self {
        Node::Container(value)
    }
}

/// Persisted segment record, loaded by the caller
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/segments/")]
pub struct Segment {
    #[ts(type = "number")]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Serialized root container
    pub query: String,
    #[ts(type = "number")]
    pub created_at: i64,
    #[ts(type = "number")]
    pub updated_at: i64,
}
