use super::{BaseQuery, SegmentEvaluator, SegmentQuery};
use crate::compiler::{Dialect, SqlValue};
use crate::config::SegmentConfig;
use crate::customers::{self, CustomerRecord};
use crate::errors::{EvaluateError, SegmentError};
use crate::executor::{QueryExecutor, SqliteExecutor};
use crate::parser::{serialize_query, SegmentLimits};
use crate::registry::{FieldDescriptor, FieldRegistry};
use crate::types::{ContainerNode, Node, Operator, Segment};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};

/// In-memory store with the storefront schema; a single connection keeps
/// every query on the same in-memory database
async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::raw_sql(customers::SCHEMA_SQL)
        .execute(&pool)
        .await
        .unwrap();
    pool
}

async fn insert_customer(
    pool: &SqlitePool,
    id: i64,
    city: &str,
    accepts_marketing: bool,
    order_totals: &[f64],
) {
    sqlx::query(
        "INSERT INTO customers (id, email, first_name, city, country, accepts_marketing) VALUES (?, ?, ?, ?, 'FR', ?)",
    )
    .bind(id)
    .bind(format!("customer{}@example.com", id))
    .bind(format!("Customer {}", id))
    .bind(city)
    .bind(accepts_marketing)
    .execute(pool)
    .await
    .unwrap();

    for total in order_totals {
        sqlx::query("INSERT INTO orders (customer_id, total) VALUES (?, ?)")
            .bind(id)
            .bind(*total)
            .execute(pool)
            .await
            .unwrap();
    }
}

fn segment(root: &ContainerNode) -> Segment {
    Segment {
        id: 7,
        name: "Test segment".to_string(),
        description: None,
        query: serialize_query(root).unwrap(),
        created_at: 0,
        updated_at: 0,
    }
}

fn evaluator() -> SegmentEvaluator {
    SegmentEvaluator::new(
        Arc::new(customers::registry()),
        customers::base_query(),
        SegmentConfig::default(),
    )
}

fn ids(rows: &[CustomerRecord]) -> Vec<i64> {
    rows.iter().map(|r| r.id).collect()
}

#[tokio::test]
async fn test_spend_and_marketing_scenario() {
    let pool = setup_test_db().await;
    let spends = [50.0, 150.0, 200.0, 99.0, 300.0];
    let marketing = [true, true, false, true, true];
    for (i, (spend, flag)) in spends.iter().zip(marketing).enumerate() {
        insert_customer(&pool, i as i64 + 1, "Paris", flag, &[*spend]).await;
    }

    let root = ContainerNode::and(vec![
        Node::condition("total_spent", Operator::Gt, 100),
        Node::condition("accepts_marketing", Operator::Equals, true),
    ]);
    let executor = SqliteExecutor::<CustomerRecord>::new(pool);
    let rows = evaluator().evaluate(&segment(&root), &executor).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(ids(&rows), vec![2, 5]);
    assert_eq!(rows[0].total_spent, 150.0);
    assert_eq!(rows[1].total_spent, 300.0);
    assert!(rows.iter().all(|r| r.accepts_marketing));
}

#[tokio::test]
async fn test_nested_or_keeps_precedence() {
    let pool = setup_test_db().await;
    // marketing + Lyon, one order
    insert_customer(&pool, 1, "Lyon", true, &[10.0]).await;
    // marketing + three orders, elsewhere
    insert_customer(&pool, 2, "Oslo", true, &[5.0, 5.0, 5.0]).await;
    // Lyon with three orders but no marketing
    insert_customer(&pool, 3, "Lyon", false, &[1.0, 1.0, 1.0]).await;
    // marketing only
    insert_customer(&pool, 4, "Oslo", true, &[]).await;

    let root = ContainerNode::and(vec![
        Node::condition("accepts_marketing", Operator::Equals, true),
        Node::or(vec![
            Node::condition("city", Operator::Equals, "Lyon"),
            Node::condition("order_count", Operator::Gte, 3),
        ]),
    ]);
    let executor = SqliteExecutor::<CustomerRecord>::new(pool);
    let rows = evaluator().evaluate(&segment(&root), &executor).await.unwrap();

    assert_eq!(ids(&rows), vec![1, 2]);
    assert_eq!(rows[1].order_count, 3);
}

#[tokio::test]
async fn test_empty_segment_matches_everyone() {
    let pool = setup_test_db().await;
    for id in 1..=3 {
        insert_customer(&pool, id, "Lille", id % 2 == 0, &[]).await;
    }

    let executor = SqliteExecutor::<CustomerRecord>::new(pool);
    let rows = evaluator()
        .evaluate(&segment(&ContainerNode::or(vec![])), &executor)
        .await
        .unwrap();
    assert_eq!(ids(&rows), vec![1, 2, 3]);
    assert!(rows.iter().all(|r| r.order_count == 0 && r.total_spent == 0.0));
}

#[tokio::test]
async fn test_contains_is_case_insensitive_substring() {
    let pool = setup_test_db().await;
    insert_customer(&pool, 1, "Lyon", true, &[]).await;
    insert_customer(&pool, 2, "Marseille", true, &[]).await;
    insert_customer(&pool, 3, "Saint-Lys", true, &[]).await;
    insert_customer(&pool, 4, "L_yon", true, &[]).await;

    let executor = SqliteExecutor::<CustomerRecord>::new(pool);
    let root = ContainerNode::and(vec![Node::condition("city", Operator::Contains, "LY")]);
    let rows = evaluator().evaluate(&segment(&root), &executor).await.unwrap();
    assert_eq!(ids(&rows), vec![1, 3]);

    // Wildcards in the value match literally
    let root = ContainerNode::and(vec![Node::condition("city", Operator::Contains, "_y")]);
    let rows = evaluator().evaluate(&segment(&root), &executor).await.unwrap();
    assert_eq!(ids(&rows), vec![4]);
}

#[tokio::test]
async fn test_invalid_segment_errors_are_distinct() {
    let pool = setup_test_db().await;
    let executor = SqliteExecutor::<CustomerRecord>::new(pool);
    let evaluator = evaluator();

    let mut broken = segment(&ContainerNode::and(vec![]));
    broken.query = r#"{"type":"container","operator":"AND"}"#.to_string();
    let err = evaluator.evaluate(&broken, &executor).await.unwrap_err();
    assert!(matches!(
        err,
        EvaluateError::Segment(SegmentError::MalformedSegment(_))
    ));

    let unknown = segment(&ContainerNode::and(vec![Node::condition(
        "loyalty_points",
        Operator::Gt,
        10,
    )]));
    let err = evaluator.evaluate(&unknown, &executor).await.unwrap_err();
    assert!(matches!(
        err,
        EvaluateError::Segment(SegmentError::UnknownField(ref f)) if f == "loyalty_points"
    ));

    let illegal = segment(&ContainerNode::and(vec![Node::condition(
        "customer_type",
        Operator::Contains,
        "b2b",
    )]));
    let err = evaluator.evaluate(&illegal, &executor).await.unwrap_err();
    assert!(matches!(
        err,
        EvaluateError::Segment(SegmentError::IllegalOperator { .. })
    ));

    let mistyped = segment(&ContainerNode::and(vec![Node::condition(
        "order_count",
        Operator::Gt,
        "abc",
    )]));
    let err = evaluator.evaluate(&mistyped, &executor).await.unwrap_err();
    assert!(matches!(
        err,
        EvaluateError::Segment(SegmentError::TypeCoercion { .. })
    ));
}

#[tokio::test]
async fn test_execution_error_is_passed_through() {
    let pool = setup_test_db().await;
    let executor = SqliteExecutor::<CustomerRecord>::new(pool);
    let evaluator = SegmentEvaluator::new(
        Arc::new(customers::registry()),
        BaseQuery::new("SELECT * FROM missing_table c"),
        SegmentConfig::default(),
    );

    let err = evaluator
        .evaluate(&segment(&ContainerNode::and(vec![])), &executor)
        .await
        .unwrap_err();
    assert!(matches!(err, EvaluateError::Execution(sqlx::Error::Database(_))));
}

#[tokio::test]
async fn test_limits_are_enforced_before_execution() {
    let pool = setup_test_db().await;
    let executor = SqliteExecutor::<CustomerRecord>::new(pool);
    let evaluator = SegmentEvaluator::new(
        Arc::new(customers::registry()),
        customers::base_query(),
        SegmentConfig {
            dialect: Dialect::Sqlite,
            limits: SegmentLimits {
                max_depth: 2,
                max_nodes: 50,
            },
        },
    );

    let root = ContainerNode::and(vec![Node::or(vec![Node::and(vec![])])]);
    let err = evaluator.evaluate(&segment(&root), &executor).await.unwrap_err();
    assert!(matches!(err, EvaluateError::Segment(SegmentError::TooComplex(_))));
}

/// Records what it was asked to run instead of touching a database
#[derive(Default)]
struct RecordingExecutor {
    seen: Mutex<Vec<SegmentQuery>>,
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    type Row = String;
    type Error = std::io::Error;

    async fn execute_query(&self, query: &SegmentQuery) -> Result<Vec<String>, std::io::Error> {
        self.seen.lock().unwrap().push(query.clone());
        Ok(query.parameters.iter().map(|p| p.to_string()).collect())
    }
}

#[tokio::test]
async fn test_fragment_and_parameters_reach_executor_unmodified() {
    let registry = FieldRegistry::new()
        .with_field("total_spent", FieldDescriptor::number("Spent", "total_spent_expr"))
        .with_field(
            "accepts_marketing",
            FieldDescriptor::boolean("Marketing", "accepts_marketing_expr"),
        );
    let evaluator = SegmentEvaluator::new(
        Arc::new(registry),
        BaseQuery::new("SELECT id FROM customers").with_trailer("LIMIT 10"),
        SegmentConfig::default(),
    );
    let root = ContainerNode::and(vec![
        Node::condition("total_spent", Operator::Gt, 100),
        Node::condition("accepts_marketing", Operator::Equals, true),
    ]);
    let segment = segment(&root);

    let prepared = evaluator.prepare(&segment).unwrap();
    assert_eq!(
        prepared.fragment,
        "(total_spent_expr > ? AND accepts_marketing_expr = ?)"
    );
    assert_eq!(
        prepared.sql,
        "SELECT id FROM customers WHERE (total_spent_expr > ? AND accepts_marketing_expr = ?) LIMIT 10"
    );

    let executor = RecordingExecutor::default();
    let rows = evaluator.evaluate(&segment, &executor).await.unwrap();
    assert_eq!(rows, vec!["100".to_string(), "true".to_string()]);

    let seen = executor.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], prepared);
    assert_eq!(
        seen[0].parameters,
        vec![SqlValue::Integer(100), SqlValue::Bool(true)]
    );
}

#[test]
fn test_base_query_without_trailer() {
    let base = BaseQuery::new("SELECT id FROM customers");
    assert_eq!(
        base.with_predicate("1 = 1"),
        "SELECT id FROM customers WHERE 1 = 1"
    );
}
