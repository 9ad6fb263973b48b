//! Communes and arrondissements

use serde::Deserialize;
use shared::{Arrondissement, Commune, CommuneWithArrondissements};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct GeographyService {
    db: PgPool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommuneInput {
    #[validate(custom = "shared::required_rule")]
    pub name: String,
    #[validate(custom = "shared::required_rule")]
    pub department: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateArrondissementInput {
    pub commune_id: Uuid,
    #[validate(custom = "shared::required_rule")]
    pub name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CommuneRow {
    id: Uuid,
    name: String,
    department: String,
}

impl From<CommuneRow> for Commune {
    fn from(row: CommuneRow) -> Self {
        Commune {
            id: row.id,
            name: row.name,
            department: row.department,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ArrondissementRow {
    id: Uuid,
    commune_id: Uuid,
    name: String,
    commune_name: String,
}

impl From<ArrondissementRow> for Arrondissement {
    fn from(row: ArrondissementRow) -> Self {
        Arrondissement {
            id: row.id,
            commune_id: row.commune_id,
            name: row.name,
            commune_name: row.commune_name,
        }
    }
}

impl GeographyService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_communes(&self) -> AppResult<Vec<CommuneWithArrondissements>> {
        let communes = sqlx::query_as::<_, CommuneRow>(
            "SELECT id, name, department FROM communes ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        let mut arrondissements = self.list_arrondissements().await?;

        Ok(communes
            .into_iter()
            .map(Commune::from)
            .map(|commune| {
                let (own, rest): (Vec<_>, Vec<_>) = arrondissements
                    .drain(..)
                    .partition(|a| a.commune_id == commune.id);
                arrondissements = rest;
                CommuneWithArrondissements {
                    commune,
                    arrondissements: own,
                }
            })
            .collect())
    }

    pub async fn list_arrondissements(&self) -> AppResult<Vec<Arrondissement>> {
        let rows = sqlx::query_as::<_, ArrondissementRow>(
            r#"
            SELECT a.id, a.commune_id, a.name, c.name AS commune_name
            FROM arrondissements a
            JOIN communes c ON c.id = a.commune_id
            ORDER BY c.name, a.name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Arrondissement::from).collect())
    }

    pub async fn create_commune(&self, input: CreateCommuneInput) -> AppResult<Commune> {
        input.validate()?;

        if !shared::is_benin_department(&input.department) {
            return Err(AppError::validation(
                "department",
                "Unknown department",
                "Département inconnu",
            ));
        }

        let row = sqlx::query_as::<_, CommuneRow>(
            r#"
            INSERT INTO communes (name, department)
            VALUES ($1, $2)
            RETURNING id, name, department
            "#,
        )
        .bind(input.name.trim())
        .bind(input.department.trim())
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Commune {} created", row.name);
        Ok(row.into())
    }

    pub async fn create_arrondissement(
        &self,
        input: CreateArrondissementInput,
    ) -> AppResult<Arrondissement> {
        input.validate()?;

        let commune_name = sqlx::query_scalar::<_, String>("SELECT name FROM communes WHERE id = $1")
            .bind(input.commune_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Commune".to_string()))?;

        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO arrondissements (commune_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(input.commune_id)
        .bind(input.name.trim())
        .fetch_one(&self.db)
        .await?;

        Ok(Arrondissement {
            id,
            commune_id: input.commune_id,
            name: input.name.trim().to_string(),
            commune_name,
        })
    }
}
