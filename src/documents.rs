//! Firestore document shapes used by the app.
//!
//! The store is schema-less, so every field is optional and absence is kept
//! distinct from an empty value; consuming code branches on presence
//! explicitly.

use serde::{Deserialize, Serialize};

/// `users/{uid}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDoc {
    pub is_admin: Option<bool>,
    pub fcm_token: Option<String>,
    pub display_name: Option<String>,
    pub is_password_change_needed: Option<bool>,
    pub password_changed_by: Option<String>,
}

/// `chats/{chatId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatDoc {
    pub members: Vec<String>,
}

/// `chats/{chatId}/messages/{messageId}`. Read-only here; delivered as part of
/// the creation event rather than fetched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageDoc {
    pub sender_id: Option<String>,
    pub text: Option<String>,
    pub image_url: Option<String>,
}
