use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Company {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Acme Industries")]
    pub name: String,
    /// Frontend host this tenant is served from.
    #[schema(example = "hr.acme.example")]
    pub domain: String,
    #[schema(example = "12 Industrial Road", nullable = true)]
    pub address: Option<String>,
}
