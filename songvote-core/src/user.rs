use serde::{Deserialize, Serialize};

use crate::Id;

pub type UserId = Id<User>;

/// A group member, as resolved by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    /// Normalized phone number, if the user gave one
    pub phone: Option<String>,
}
