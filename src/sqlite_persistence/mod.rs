mod versioned_schema;

pub use versioned_schema::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};
