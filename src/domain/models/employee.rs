use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Staff member of a business. `user_id` links the employee to a login
/// account; the link is required before the employee can approve their own
/// appointments.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Employee {
    pub id: String,
    pub business_id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
