//! SQL text for the three queries the tool issues. The predicate is inserted as-is.
//!
//! Cross-partition queries run through the gateway, which refuses `TOP` and
//! aggregates there. Those shapes are plain selects; the client bounds rows with
//! `x-ms-max-item-count` and counts ids itself.

use super::models::Predicate;
use super::store::{Projection, QueryRequest};


pub const PARTITION_KEY_ALIAS: &str = "partitionKey";


fn select_ids(predicate: &Predicate) -> String {
    format!("SELECT c.id FROM c WHERE {}", predicate)
}

/// Aggregate for one partition; in cross-partition mode the ids to be counted.
pub fn count_query(predicate: &Predicate, cross_partition: bool) -> String {
    if cross_partition {
        select_ids(predicate)
    } else {
        format!("SELECT VALUE COUNT(1) FROM c WHERE {}", predicate)
    }
}


pub fn exists_query(predicate: &Predicate, cross_partition: bool) -> String {
    if cross_partition {
        select_ids(predicate)
    } else {
        format!("SELECT TOP 1 c.id FROM c WHERE {}", predicate)
    }
}

/// With a partition key field the query is cross-partition and also selects the key.
pub fn page_query(
    predicate: &Predicate,
    limit: usize,
    partition_key_field: Option<&str>,
) -> String {
    match partition_key_field {
        Some(field) => format!(
            "SELECT c.id, {} AS {} FROM c WHERE {}",
            field_path_expression(field),
            PARTITION_KEY_ALIAS,
            predicate
        ),
        None => format!("SELECT TOP {} c.id FROM c WHERE {}", limit, predicate),
    }
}


pub fn build_query(request: &QueryRequest<'_>, partition_key_field: &str) -> String {
    match request.projection {
        Projection::Count => count_query(request.predicate, request.cross_partition),
        Projection::Exists => exists_query(request.predicate, request.cross_partition),
        Projection::Page { limit } => {
            let field = request.cross_partition.then_some(partition_key_field);
            page_query(request.predicate, limit, field)
        }
    }
}

/// `tenantId` -> `c["tenantId"]`, `/tenant/id` and `tenant.id` -> `c["tenant"]["id"]`.
pub fn field_path_expression(field: &str) -> String {
    let segments: Vec<&str> = field
        .split(['/', '.'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return "c.id".to_string();
    }

    let mut expr = String::from("c");
    for segment in segments {
        expr.push_str("[\"");
        for ch in segment.chars() {
            if ch == '"' || ch == '\\' {
                expr.push('\\');
            }
            expr.push(ch);
        }
        expr.push_str("\"]");
    }
    expr
}
