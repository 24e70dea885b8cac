use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub name: String,
    /// Shift used on any date without a schedule override
    pub default_shift_id: Option<u64>,
}
