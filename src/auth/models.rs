use serde::{Deserialize, Serialize};

/// Identity Toolkit `accounts:update` request.
///
/// Only the fields the password reset touches are modeled; the endpoint
/// ignores absent fields.
#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub local_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountResponse {
    pub local_id: String,
    pub email: Option<String>,
}
