//! Full data export as one JSON document

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use shared::Session;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::services::require_superuser;

/// Tables in dependency order with the columns exported for each.
/// Password hashes and refresh tokens never leave the database.
const EXPORTED_TABLES: &[(&str, &str)] = &[
    (
        "users",
        "id, username, email, first_name, last_name, is_superuser, is_active, created_at, last_login_at",
    ),
    ("user_groups", "user_id, group_name"),
    ("communes", "*"),
    ("arrondissements", "*"),
    ("producers", "*"),
    ("parcels", "*"),
    ("crop_types", "*"),
    ("harvests", "*"),
    ("warehouses", "*"),
    ("stocks", "*"),
    ("stock_movements", "*"),
    ("contacts", "*"),
];

#[derive(Debug, Serialize)]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub tables: BTreeMap<String, Value>,
}

impl ExportDocument {
    pub fn object_count(&self) -> usize {
        self.tables
            .values()
            .map(|rows| rows.as_array().map_or(0, Vec::len))
            .sum()
    }

    /// Pretty-printed UTF-8 bytes, without byte order mark
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

#[derive(Clone)]
pub struct ExportService {
    db: PgPool,
}

impl ExportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn export_all(&self, session: &Session) -> AppResult<ExportDocument> {
        require_superuser(session)?;

        let mut tables = BTreeMap::new();
        for (table, columns) in EXPORTED_TABLES {
            let rows = sqlx::query_scalar::<_, Value>(&format!(
                "SELECT COALESCE(json_agg(t), '[]'::json) FROM (SELECT {} FROM {}) t",
                columns, table
            ))
            .fetch_one(&self.db)
            .await?;
            tables.insert(table.to_string(), rows);
        }

        let document = ExportDocument {
            exported_at: Utc::now(),
            tables,
        };

        tracing::info!(
            "Data export by {}: {} objects",
            session.identity().username,
            document.object_count()
        );

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_not_exported() {
        let (_, user_columns) = EXPORTED_TABLES
            .iter()
            .find(|(table, _)| *table == "users")
            .unwrap();
        assert!(!user_columns.contains("password_hash"));
        assert!(!user_columns.contains('*'));
        assert!(EXPORTED_TABLES.iter().all(|(t, _)| *t != "refresh_tokens"));
    }

    #[test]
    fn test_document_bytes_have_no_bom() {
        let mut tables = BTreeMap::new();
        tables.insert(
            "communes".to_string(),
            serde_json::json!([{"name": "Abomey-Calavi", "department": "Atlantique"}]),
        );
        tables.insert("contacts".to_string(), serde_json::json!([]));
        let document = ExportDocument {
            exported_at: Utc::now(),
            tables,
        };

        let bytes = document.to_bytes().unwrap();
        assert_eq!(bytes[0], b'{');
        assert_eq!(document.object_count(), 1);
        assert!(String::from_utf8(bytes).unwrap().contains("Abomey-Calavi"));
    }
}
