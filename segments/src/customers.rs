//! Storefront customer segments: field registry, base listing query and row type.

use crate::evaluator::BaseQuery;
use crate::registry::{FieldDescriptor, FieldRegistry};
use crate::types::Operator;
use serde::Serialize;

/// Schema the base query expects; used to seed test and demo databases
pub const SCHEMA_SQL: &str = include_str!("../migrations/001_customers.sql");

pub fn registry() -> FieldRegistry {
    FieldRegistry::new()
        // Order statistics (aggregated in the base query)
        .with_field(
            "total_spent",
            FieldDescriptor::number("Total spent", "COALESCE(order_stats.total_spent, 0.0)"),
        )
        .with_field(
            "order_count",
            FieldDescriptor::number("Order count", "COALESCE(order_stats.order_count, 0)"),
        )
        // Profile
        .with_field(
            "accepts_marketing",
            FieldDescriptor::boolean("Accepts marketing", "c.accepts_marketing"),
        )
        .with_field("email", FieldDescriptor::string("Email", "c.email"))
        .with_field("first_name", FieldDescriptor::string("First name", "c.first_name"))
        .with_field("last_name", FieldDescriptor::string("Last name", "c.last_name"))
        // Location
        .with_field("city", FieldDescriptor::string("City", "c.city"))
        .with_field("country", FieldDescriptor::string("Country", "c.country"))
        // B2B
        .with_field(
            "customer_type",
            FieldDescriptor::string("Customer type", "c.customer_type")
                .with_operators(&[Operator::Equals]),
        )
}

pub fn base_query() -> BaseQuery {
    BaseQuery::new(
        "SELECT c.id, c.email, c.first_name, c.last_name, c.city, c.country, \
         c.customer_type, c.accepts_marketing, \
         COALESCE(order_stats.order_count, 0) AS order_count, \
         COALESCE(order_stats.total_spent, 0.0) AS total_spent \
         FROM customers c \
         LEFT JOIN (SELECT customer_id, COUNT(*) AS order_count, SUM(total) AS total_spent \
         FROM orders GROUP BY customer_id) order_stats ON order_stats.customer_id = c.id",
    )
    .with_trailer("ORDER BY c.id")
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CustomerRecord {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub customer_type: String,
    pub accepts_marketing: bool,
    pub order_count: i64,
    pub total_spent: f64,
}
