//! Database schema for rotation.db.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

/// Append-only history of everything ever placed in a rotation list.
const ROTATION_HISTORY_TABLE_V1: Table = Table {
    name: "rotation_history",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("list_id", &SqlType::Text, non_null = true),
        sqlite_column!("category", &SqlType::Text, non_null = true),
        sqlite_column!("performer", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("item_id", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_history_list", "list_id"),
        ("idx_history_item", "list_id, item_id"),
    ],
};

/// The staged next block, replaced wholesale on each generation.
const ROTATION_QUEUE_TABLE_V1: Table = Table {
    name: "rotation_queue",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("list_id", &SqlType::Text, non_null = true),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!("category", &SqlType::Text, non_null = true),
        sqlite_column!("performer", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("item_id", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_queue_list", "list_id, position")],
};

/// Audit trail of rotation runs.
const ROTATION_RUNS_TABLE_V1: Table = Table {
    name: "rotation_runs",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("list_id", &SqlType::Text, non_null = true),
        sqlite_column!("status", &SqlType::Text, non_null = true),
        sqlite_column!("started_at", &SqlType::Integer, non_null = true),
        sqlite_column!("completed_at", &SqlType::Integer, non_null = true),
        sqlite_column!("error_message", &SqlType::Text),
    ],
    indices: &[("idx_runs_list", "list_id, started_at")],
};

pub const ROTATION_SCHEMA: VersionedSchema = VersionedSchema {
    version: 1,
    tables: &[
        ROTATION_HISTORY_TABLE_V1,
        ROTATION_QUEUE_TABLE_V1,
        ROTATION_RUNS_TABLE_V1,
    ],
};
