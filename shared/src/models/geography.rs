//! Administrative geography: communes and their arrondissements

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A commune, the upper level of the administrative hierarchy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commune {
    pub id: Uuid,
    pub name: String,
    pub department: String,
}

impl std::fmt::Display for Commune {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.department)
    }
}

/// An arrondissement, always attached to exactly one commune
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Arrondissement {
    pub id: Uuid,
    pub commune_id: Uuid,
    pub name: String,
    pub commune_name: String,
}

impl std::fmt::Display for Arrondissement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.name, self.commune_name)
    }
}

/// Commune with its arrondissements, used to fill signup forms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommuneWithArrondissements {
    #[serde(flatten)]
    pub commune: Commune,
    pub arrondissements: Vec<Arrondissement>,
}
