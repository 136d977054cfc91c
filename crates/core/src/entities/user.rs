//! Account documents.

use serde::{Deserialize, Serialize};

use super::Identified;
use crate::types::{UserId, UserRole};

/// A customer, vendor or admin account.
///
/// The email stays a plain string here: the backend is the authority on
/// account data and the client never rejects a stored address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Identified for User {
    fn raw_id(&self) -> &str {
        self.id.as_str()
    }
}
