//! Admin password reset: the authorization gate and the reset operation.
//!
//! Both invocation surfaces (HTTP and callable) resolve the caller to a uid
//! first, then run through the same two functions here. The gate has no side
//! effects; the reset writes to Auth and then to Firestore.


use crate::auth::FirebaseAuth;
use crate::documents::UserDoc;
use crate::firestore::{FirebaseFirestore, FirestoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Error, Debug)]
pub enum ResetError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Internal(String),
}

impl From<FirestoreError> for ResetError {
    fn from(e: FirestoreError) -> Self {
        ResetError::Internal(e.to_string())
    }
}

/// Which surface the reset call came from.
///
/// The HTTP surface historically answers a caller without a user record with
/// 404, while the callable surface collapses the same state into a permission
/// failure. The discrepancy is preserved, not unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerSurface {
    Http,
    Callable,
}

/// Confirms the caller's user record carries the admin flag.
///
/// Returns the caller uid as the acting administrator. No side effects.
pub async fn require_admin(
    firestore: &FirebaseFirestore,
    caller_uid: &str,
    surface: CallerSurface,
) -> Result<String, ResetError> {
    let caller: Option<UserDoc> = firestore.collection("users").doc(caller_uid).get().await?;

    let caller = match caller {
        Some(doc) => doc,
        None => {
            warn!(uid = %caller_uid, "caller has no user record");
            return Err(match surface {
                CallerSurface::Http => ResetError::NotFound("User not found".to_string()),
                CallerSurface::Callable => {
                    ResetError::PermissionDenied("Only an admin can reset passwords".to_string())
                }
            });
        }
    };

    if caller.is_admin != Some(true) {
        warn!(uid = %caller_uid, "caller is not an admin");
        return Err(ResetError::PermissionDenied(
            "Only an admin can reset passwords".to_string(),
        ));
    }

    Ok(caller_uid.to_string())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetRequest {
    pub user_id: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordChangeFlags<'a> {
    is_password_change_needed: bool,
    password_changed_by: &'a str,
}

/// Overwrites the target's password and flags the account for a forced change.
///
/// The Auth write runs first; if it fails nothing else happens. A Firestore
/// failure after a successful Auth write leaves the password changed with the
/// flag unset — surfaced as Internal, not rolled back.
pub async fn reset_password(
    auth: &FirebaseAuth,
    firestore: &FirebaseFirestore,
    admin_uid: &str,
    request: &ResetRequest,
) -> Result<(), ResetError> {
    let user_id = request
        .user_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ResetError::InvalidArgument("userId and newPassword are required".to_string())
        })?;
    let new_password = request
        .new_password
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ResetError::InvalidArgument("userId and newPassword are required".to_string())
        })?;

    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ResetError::InvalidArgument(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    auth.set_password(user_id, new_password)
        .await
        .map_err(|e| ResetError::Internal(format!("Password update failed: {}", e)))?;
    info!(target_uid = %user_id, admin_uid = %admin_uid, "password updated in Auth");

    let flags = PasswordChangeFlags {
        is_password_change_needed: true,
        password_changed_by: admin_uid,
    };
    firestore
        .collection("users")
        .doc(user_id)
        .update_with_server_timestamps(&flags, &["passwordChangedAt"])
        .await
        .map_err(|e| ResetError::Internal(format!("User document update failed: {}", e)))?;
    info!(target_uid = %user_id, "user document flagged for password change");

    Ok(())
}
