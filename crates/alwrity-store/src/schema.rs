//! Database schema SQL.

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS content_versions (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    metrics_json TEXT
);

CREATE INDEX IF NOT EXISTS idx_content_versions_timestamp ON content_versions(timestamp);
"#;
