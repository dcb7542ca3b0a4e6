use crate::compiler::Dialect;
use crate::parser::{SegmentLimits, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, MAX_DEPTH_CEILING};
use std::env;

/// Runtime settings for compiling and evaluating segments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentConfig {
    pub dialect: Dialect,
    pub limits: SegmentLimits,
}

impl SegmentConfig {
    /// Reads SEGMENT_SQL_DIALECT, SEGMENT_MAX_DEPTH and SEGMENT_MAX_NODES.
    /// Missing or invalid values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let dialect = match lookup("SEGMENT_SQL_DIALECT") {
            Some(raw) => raw.parse::<Dialect>().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to {}", e, Dialect::default());
                Dialect::default()
            }),
            None => Dialect::default(),
        };

        let mut max_depth = read_limit(&lookup, "SEGMENT_MAX_DEPTH", DEFAULT_MAX_DEPTH);
        if max_depth > MAX_DEPTH_CEILING {
            tracing::warn!(
                "SEGMENT_MAX_DEPTH={} exceeds the parser ceiling, using {}",
                max_depth,
                MAX_DEPTH_CEILING
            );
            max_depth = MAX_DEPTH_CEILING;
        }

        Self {
            dialect,
            limits: SegmentLimits {
                max_depth,
                max_nodes: read_limit(&lookup, "SEGMENT_MAX_NODES", DEFAULT_MAX_NODES),
            },
        }
    }
}

fn read_limit<F>(lookup: &F, name: &str, default: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => parse_limit(&raw).unwrap_or_else(|| {
            tracing::warn!("Invalid {}={:?}, using default {}", name, raw, default);
            default
        }),
        None => default,
    }
}

fn parse_limit(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|v| *v > 0)
}
