use crate::errors::SegmentError;
use crate::registry::FieldRegistry;
use crate::types::{ConditionNode, ContainerNode, Node, Operator};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Fragment emitted for an empty container; excludes no rows
pub const ALWAYS_TRUE: &str = "1 = 1";

/// Bound parameter value, already coerced to the field's declared type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Float(n) => write!(f, "{}", n),
            SqlValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Placeholder and matching style of the target database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `?` placeholders, `LIKE` (ASCII case-insensitive)
    #[default]
    Sqlite,
    /// `$1, $2, ...` placeholders, `ILIKE`
    Postgres,
}

impl Dialect {
    fn placeholder(&self, idx: usize) -> String {
        match self {
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${}", idx),
        }
    }

    fn like_operator(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "LIKE",
            Dialect::Postgres => "ILIKE",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(format!("Unknown SQL dialect: {}", other)),
        }
    }
}

/// Boolean SQL expression with positional placeholders and their values in order
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    pub fragment: String,
    pub parameters: Vec<SqlValue>,
}

/// Compiles node trees into parameterized predicates against a field registry
#[derive(Debug, Clone, Copy)]
pub struct PredicateCompiler<'a> {
    registry: &'a FieldRegistry,
    dialect: Dialect,
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(registry: &'a FieldRegistry, dialect: Dialect) -> Self {
        Self { registry, dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn compile(&self, node: &Node) -> Result<CompiledPredicate, SegmentError> {
        self.compile_with_offset(node, 0)
    }

    /// Compiles with numbered placeholders starting after `start_offset`
    /// Useful when the fragment joins a query that already binds parameters
    pub fn compile_with_offset(
        &self,
        node: &Node,
        start_offset: usize,
    ) -> Result<CompiledPredicate, SegmentError> {
        let mut placeholder_idx = start_offset;
        let mut parameters = Vec::new();
        let fragment = self.compile_node(node, &mut placeholder_idx, &mut parameters)?;

        tracing::debug!(
            "Compiled segment predicate: {} ({} parameters)",
            fragment,
            parameters.len()
        );
        Ok(CompiledPredicate {
            fragment,
            parameters,
        })
    }

    fn compile_node(
        &self,
        node: &Node,
        placeholder_idx: &mut usize,
        parameters: &mut Vec<SqlValue>,
    ) -> Result<String, SegmentError> {
        match node {
            Node::Condition(condition) => {
                self.compile_condition(condition, placeholder_idx, parameters)
            }
            Node::Container(container) => {
                self.compile_container(container, placeholder_idx, parameters)
            }
        }
    }

    fn compile_container(
        &self,
        container: &ContainerNode,
        placeholder_idx: &mut usize,
        parameters: &mut Vec<SqlValue>,
    ) -> Result<String, SegmentError> {
        if container.children.is_empty() {
            return Ok(ALWAYS_TRUE.to_string());
        }

        let parts = container
            .children
            .iter()
            .map(|child| self.compile_node(child, placeholder_idx, parameters))
            .collect::<Result<Vec<_>, _>>()?;

        let separator = format!(" {} ", container.operator.keyword());
        Ok(format!("({})", parts.join(&separator)))
    }

    fn compile_condition(
        &self,
        condition: &ConditionNode,
        placeholder_idx: &mut usize,
        parameters: &mut Vec<SqlValue>,
    ) -> Result<String, SegmentError> {
        let descriptor = self.registry.describe(&condition.field)?;
        if !descriptor.allows(condition.operator) {
            return Err(SegmentError::IllegalOperator {
                field: condition.field.clone(),
                operator: condition.operator,
            });
        }
        let value = self.registry.coerce(&condition.field, &condition.value)?;

        *placeholder_idx += 1;
        let placeholder = self.dialect.placeholder(*placeholder_idx);
        let column = &descriptor.column;

        let sql = match condition.operator {
            Operator::Equals => format!("{} = {}", column, placeholder),
            Operator::Gt => format!("{} > {}", column, placeholder),
            Operator::Lt => format!("{} < {}", column, placeholder),
            Operator::Gte => format!("{} >= {}", column, placeholder),
            Operator::Lte => format!("{} <= {}", column, placeholder),
            Operator::Contains => format!(
                "{} {} {} ESCAPE '\\'",
                column,
                self.dialect.like_operator(),
                placeholder
            ),
        };

        let value = match (condition.operator, value) {
            (Operator::Contains, SqlValue::String(s)) => {
                SqlValue::String(format!("%{}%", escape_like(&s)))
            }
            (_, value) => value,
        };
        parameters.push(value);
        Ok(sql)
    }
}

/// Compiles `node` with a one-off compiler
pub fn compile_predicate(
    node: &Node,
    registry: &FieldRegistry,
    dialect: Dialect,
) -> Result<CompiledPredicate, SegmentError> {
    PredicateCompiler::new(registry, dialect).compile(node)
}

/// Escapes LIKE wildcards so the value matches literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
