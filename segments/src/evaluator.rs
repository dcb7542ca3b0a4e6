use crate::compiler::{PredicateCompiler, SqlValue};
use crate::config::SegmentConfig;
use crate::errors::{EvaluateError, SegmentError};
use crate::executor::QueryExecutor;
use crate::parser::parse_query_with_limits;
use crate::registry::FieldRegistry;
use crate::types::{Node, Segment};
use std::sync::Arc;

/// Entity-listing query the compiled predicate is spliced into.
/// `select` must not carry its own WHERE clause; `trailer` holds
/// ORDER BY / LIMIT and is appended after the predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseQuery {
    pub select: String,
    pub trailer: Option<String>,
}

impl BaseQuery {
    pub fn new(select: impl Into<String>) -> Self {
        Self {
            select: select.into(),
            trailer: None,
        }
    }

    pub fn with_trailer(mut self, trailer: impl Into<String>) -> Self {
        self.trailer = Some(trailer.into());
        self
    }

    pub fn with_predicate(&self, fragment: &str) -> String {
        match &self.trailer {
            Some(trailer) => format!("{} WHERE {} {}", self.select, fragment, trailer),
            None => format!("{} WHERE {}", self.select, fragment),
        }
    }
}

/// Final statement handed to the executor
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentQuery {
    pub sql: String,
    pub fragment: String,
    pub parameters: Vec<SqlValue>,
}

/// Compiles stored segments and runs them through a query executor
#[derive(Debug, Clone)]
pub struct SegmentEvaluator {
    registry: Arc<FieldRegistry>,
    base: BaseQuery,
    config: SegmentConfig,
}

impl SegmentEvaluator {
    pub fn new(registry: Arc<FieldRegistry>, base: BaseQuery, config: SegmentConfig) -> Self {
        Self {
            registry,
            base,
            config,
        }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// Parses, checks and compiles the segment's query without executing it
    pub fn prepare(&self, segment: &Segment) -> Result<SegmentQuery, SegmentError> {
        let root = parse_query_with_limits(&segment.query, &self.config.limits)?;
        let predicate = PredicateCompiler::new(&self.registry, self.config.dialect)
            .compile(&Node::Container(root))?;

        Ok(SegmentQuery {
            sql: self.base.with_predicate(&predicate.fragment),
            fragment: predicate.fragment,
            parameters: predicate.parameters,
        })
    }

    pub async fn evaluate<E: QueryExecutor>(
        &self,
        segment: &Segment,
        executor: &E,
    ) -> Result<Vec<E::Row>, EvaluateError<E::Error>> {
        let query = self.prepare(segment).inspect_err(|e| {
            tracing::warn!("Segment {} ({}) is invalid: {}", segment.id, segment.name, e);
        })?;

        tracing::debug!("Evaluating segment {}: {}", segment.id, query.sql);
        let rows = executor
            .execute_query(&query)
            .await
            .map_err(EvaluateError::Execution)?;

        tracing::info!(
            "Segment {} ({}) matched {} rows",
            segment.id,
            segment.name,
            rows.len()
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests;
