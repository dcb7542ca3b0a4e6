//! Customer segments: admin-authored AND/OR condition trees compiled into
//! parameterized SQL predicates and evaluated against the entity store.

mod compiler;
mod config;
pub mod customers;
mod edit;
mod errors;
mod evaluator;
mod executor;
mod parser;
mod registry;
mod types;
mod validation;

pub use compiler::{
    compile_predicate, CompiledPredicate, Dialect, PredicateCompiler, SqlValue, ALWAYS_TRUE,
};
pub use config::SegmentConfig;
pub use edit::{EditError, NodePath};
pub use errors::{EvaluateError, SegmentError};
pub use evaluator::{BaseQuery, SegmentEvaluator, SegmentQuery};
pub use executor::{QueryExecutor, SqliteExecutor};
pub use parser::{
    parse_query, parse_query_with_limits, serialize_query, SegmentLimits, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_NODES, MAX_DEPTH_CEILING,
};
pub use registry::{FieldDescriptor, FieldRegistry, FieldSummary};
pub use types::{
    Combinator, ConditionNode, ContainerNode, Node, Operator, Segment, Value, ValueType,
};
pub use validation::{validate_condition, validate_tree, NodeIssue};
