//! Response DTOs for Web API.

use serde::Serialize;

/// Delete confirmation.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Always true on success.
    pub deleted: bool,
    /// Deleted resource ID.
    pub id: i64,
}

impl DeleteResponse {
    /// Confirmation for a deleted resource.
    pub fn new(id: i64) -> Self {
        Self { deleted: true, id }
    }
}
