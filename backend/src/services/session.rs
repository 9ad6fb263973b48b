//! Per-request role resolution

use shared::{Identity, RoleProbe, Session};
use sqlx::PgPool;

use crate::error::AppResult;

/// Resolves the roles of an authenticated user
#[derive(Clone)]
pub struct SessionService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProbeRow {
    producer_id: Option<uuid::Uuid>,
    is_superuser: bool,
    in_managers_group: bool,
    managed_warehouse_count: i64,
}

impl SessionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Gather the role facts in one round trip and build the session
    pub async fn resolve(&self, identity: Identity) -> AppResult<Session> {
        let row = sqlx::query_as::<_, ProbeRow>(
            r#"
            SELECT
                (SELECT p.id FROM producers p WHERE p.user_id = u.id) AS producer_id,
                u.is_superuser,
                EXISTS (
                    SELECT 1 FROM user_groups g
                    WHERE g.user_id = u.id AND g.group_name = 'managers'
                ) AS in_managers_group,
                (SELECT COUNT(*) FROM warehouses w WHERE w.manager_id = u.id) AS managed_warehouse_count
            FROM users u
            WHERE u.id = $1 AND u.is_active = true
            "#,
        )
        .bind(identity.user_id)
        .fetch_optional(&self.db)
        .await?;

        // A deleted or disabled account keeps its token until expiry but loses every role
        let probe = match row {
            Some(row) => RoleProbe {
                producer_id: row.producer_id,
                is_superuser: row.is_superuser,
                in_managers_group: row.in_managers_group,
                managed_warehouse_count: row.managed_warehouse_count,
            },
            None => {
                tracing::warn!("Session for unknown or inactive user {}", identity.user_id);
                RoleProbe::default()
            }
        };

        Ok(Session::new(identity, probe))
    }
}
