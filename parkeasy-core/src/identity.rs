use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UserRole;

/// Authenticated caller, supplied by the identity layer and trusted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Owners see their own records; admins see everything.
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}
