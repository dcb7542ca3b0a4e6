use crate::compiler::SqlValue;
use crate::errors::SegmentError;
use crate::types::{Operator, Value, ValueType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Registry entry describing one logical field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub label: String,
    pub value_type: ValueType,
    pub allowed_operators: Vec<Operator>,
    /// SQL expression the field maps to; may be a derived/aggregated expression
    pub column: String,
}

impl FieldDescriptor {
    pub fn new(label: &str, value_type: ValueType, column: &str) -> Self {
        let allowed_operators = match value_type {
            ValueType::Number => vec![
                Operator::Equals,
                Operator::Gt,
                Operator::Lt,
                Operator::Gte,
                Operator::Lte,
            ],
            ValueType::String => vec![Operator::Equals, Operator::Contains],
            ValueType::Boolean => vec![Operator::Equals],
        };
        Self {
            label: label.to_string(),
            value_type,
            allowed_operators,
            column: column.to_string(),
        }
    }

    pub fn number(label: &str, column: &str) -> Self {
        Self::new(label, ValueType::Number, column)
    }

    pub fn string(label: &str, column: &str) -> Self {
        Self::new(label, ValueType::String, column)
    }

    pub fn boolean(label: &str, column: &str) -> Self {
        Self::new(label, ValueType::Boolean, column)
    }

    /// Replaces the default operator set, keeping only operators valid for the type
    pub fn with_operators(mut self, operators: &[Operator]) -> Self {
        let value_type = self.value_type;
        self.allowed_operators = operators
            .iter()
            .copied()
            .filter(|op| op.supports(value_type))
            .collect();
        self
    }

    pub fn allows(&self, operator: Operator) -> bool {
        operator.supports(self.value_type) && self.allowed_operators.contains(&operator)
    }
}

/// Field list entry handed to the segment builder UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../bindings/segments/")]
pub struct FieldSummary {
    pub name: String,
    pub label: String,
    pub value_type: ValueType,
    pub operators: Vec<Operator>,
}

/// Allowlist mapping logical field names to columns, types and legal operators
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: IndexMap<String, FieldDescriptor>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: &str, descriptor: FieldDescriptor) -> Self {
        self.fields.insert(name.to_string(), descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn describe(&self, field: &str) -> Result<&FieldDescriptor, SegmentError> {
        self.fields
            .get(field)
            .ok_or_else(|| SegmentError::UnknownField(field.to_string()))
    }

    pub fn is_operator_allowed(&self, field: &str, operator: Operator) -> bool {
        self.fields
            .get(field)
            .map(|descriptor| descriptor.allows(operator))
            .unwrap_or(false)
    }

    /// Converts an authored value into the field's declared type
    pub fn coerce(&self, field: &str, raw: &Value) -> Result<SqlValue, SegmentError> {
        let descriptor = self.describe(field)?;
        coerce_value(descriptor.value_type, raw).ok_or_else(|| SegmentError::TypeCoercion {
            field: field.to_string(),
            expected: descriptor.value_type,
            value: raw.clone(),
        })
    }

    pub fn catalog(&self) -> Vec<FieldSummary> {
        self.fields
            .iter()
            .map(|(name, descriptor)| FieldSummary {
                name: name.clone(),
                label: descriptor.label.clone(),
                value_type: descriptor.value_type,
                operators: descriptor.allowed_operators.clone(),
            })
            .collect()
    }
}

fn coerce_value(value_type: ValueType, raw: &Value) -> Option<SqlValue> {
    match (value_type, raw) {
        (ValueType::Number, Value::Integer(i)) => Some(SqlValue::Integer(*i)),
        (ValueType::Number, Value::Float(f)) if f.is_finite() => Some(SqlValue::Float(*f)),
        (ValueType::Number, Value::String(s)) => parse_number(s.trim()),
        (ValueType::String, Value::String(s)) => Some(SqlValue::String(s.clone())),
        (ValueType::String, Value::Integer(i)) => Some(SqlValue::String(i.to_string())),
        (ValueType::String, Value::Float(f)) => Some(SqlValue::String(f.to_string())),
        (ValueType::Boolean, Value::Boolean(b)) => Some(SqlValue::Bool(*b)),
        (ValueType::Boolean, Value::Integer(0)) => Some(SqlValue::Bool(false)),
        (ValueType::Boolean, Value::Integer(1)) => Some(SqlValue::Bool(true)),
        (ValueType::Boolean, Value::String(s)) => {
            let s = s.trim();
            if s.eq_ignore_ascii_case("true") {
                Some(SqlValue::Bool(true))
            } else if s.eq_ignore_ascii_case("false") {
                Some(SqlValue::Bool(false))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<SqlValue> {
    if let Ok(i) = s.parse::<i64>() {
        Some(SqlValue::Integer(i))
    } else {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(SqlValue::Float)
    }
}

#[cfg(test)]
mod tests;
