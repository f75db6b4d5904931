//! Notification fan-out for newly created chat messages.
//!
//! One invocation per message document. The pipeline resolves the chat's
//! membership, excludes the sender, looks up every recipient's push token
//! concurrently, dispatches one FCM send per token, and afterwards prunes the
//! tokens FCM reported as unregistered. Expected absences (missing chat, no
//! recipients, no tokens) end the pipeline silently; unexpected errors are
//! caught at the boundary and logged — the trigger never sees a failure.


use crate::documents::{ChatDoc, MessageDoc, UserDoc};
use crate::firestore::{FirebaseFirestore, FirestoreError};
use crate::messaging::models::{
    AndroidConfig, AndroidMessagePriority, AndroidNotification, ApnsConfig, ApnsPayload, Aps,
    Message, Notification,
};
use crate::messaging::FirebaseMessaging;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{error, info, warn};

const FALLBACK_SENDER_NAME: &str = "Someone";
const IMAGE_PLACEHOLDER_BODY: &str = "\u{1F4F7} Photo";
const ANDROID_CHANNEL_ID: &str = "messages";
const SOUND_DEFAULT: &str = "default";

/// The message-created event, keyed by its path parameters.
#[derive(Debug, Clone)]
pub struct MessageCreated {
    pub chat_id: String,
    pub message_id: String,
    pub message: MessageDoc,
}

/// Pipeline boundary: runs the fan-out and swallows every error.
pub async fn handle_message_created(
    firestore: &FirebaseFirestore,
    messaging: &FirebaseMessaging,
    event: MessageCreated,
) {
    if let Err(e) = run_pipeline(firestore, messaging, &event).await {
        error!(
            chat_id = %event.chat_id,
            message_id = %event.message_id,
            error = %e,
            "notification pipeline failed"
        );
    }
}

async fn run_pipeline(
    firestore: &FirebaseFirestore,
    messaging: &FirebaseMessaging,
    event: &MessageCreated,
) -> Result<(), FirestoreError> {
    let message = &event.message;

    let Some(sender_id) = message.sender_id.as_deref().filter(|s| !s.is_empty()) else {
        warn!(chat_id = %event.chat_id, message_id = %event.message_id, "message event without senderId");
        return Ok(());
    };

    let chat: Option<ChatDoc> = firestore
        .collection("chats")
        .doc(&event.chat_id)
        .get()
        .await?;
    let Some(chat) = chat else {
        info!(chat_id = %event.chat_id, "chat no longer exists, nothing to notify");
        return Ok(());
    };

    let sender_name = resolve_sender_name(firestore, sender_id).await;

    let recipients: Vec<&str> = chat
        .members
        .iter()
        .map(String::as_str)
        .filter(|m| *m != sender_id && !m.is_empty())
        .collect();
    if recipients.is_empty() {
        info!(chat_id = %event.chat_id, "no recipients besides the sender");
        return Ok(());
    }

    // Token resolution fans out per recipient; an individual lookup failure
    // only excludes that recipient.
    let lookups = recipients.iter().map(|uid| async move {
        match firestore.collection("users").doc(uid).get::<UserDoc>().await {
            Ok(Some(user)) => user
                .fcm_token
                .filter(|t| !t.is_empty())
                .map(|t| ((*uid).to_string(), t)),
            Ok(None) => None,
            Err(e) => {
                warn!(uid = %uid, error = %e, "recipient lookup failed");
                None
            }
        }
    });
    let targets: Vec<(String, String)> = join_all(lookups).await.into_iter().flatten().collect();
    if targets.is_empty() {
        info!(chat_id = %event.chat_id, "no recipient has a push token");
        return Ok(());
    }

    let body = notification_body(message);
    let sends = targets.iter().map(|(uid, token)| {
        let message = build_message(&sender_name, &body, &event.chat_id, token);
        async move { (uid.as_str(), messaging.send(&message).await) }
    });
    // All attempts settle before reconciliation; no failure cancels a sibling.
    let outcomes = join_all(sends).await;

    let mut stale: Vec<&str> = Vec::new();
    let mut sent = 0usize;
    for (uid, outcome) in &outcomes {
        match outcome {
            Ok(_) => sent += 1,
            Err(e) if e.is_token_invalid() => {
                info!(uid = %uid, "token no longer registered, scheduling removal");
                stale.push(*uid);
            }
            Err(e) => warn!(uid = %uid, error = %e, "notification send failed"),
        }
    }
    info!(
        chat_id = %event.chat_id,
        message_id = %event.message_id,
        sent,
        failed = outcomes.len() - sent,
        "dispatch settled"
    );

    let removals = stale.iter().map(|uid| async move {
        if let Err(e) = firestore
            .collection("users")
            .doc(uid)
            .delete_field("fcmToken")
            .await
        {
            warn!(uid = %uid, error = %e, "failed to remove stale token");
        }
    });
    join_all(removals).await;

    Ok(())
}

async fn resolve_sender_name(firestore: &FirebaseFirestore, sender_id: &str) -> String {
    match firestore
        .collection("users")
        .doc(sender_id)
        .get::<UserDoc>()
        .await
    {
        Ok(Some(user)) => user
            .display_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| FALLBACK_SENDER_NAME.to_string()),
        Ok(None) => FALLBACK_SENDER_NAME.to_string(),
        Err(e) => {
            warn!(uid = %sender_id, error = %e, "sender lookup failed");
            FALLBACK_SENDER_NAME.to_string()
        }
    }
}

fn notification_body(message: &MessageDoc) -> String {
    match (&message.text, &message.image_url) {
        (Some(text), _) if !text.is_empty() => text.clone(),
        (_, Some(image)) if !image.is_empty() => IMAGE_PLACEHOLDER_BODY.to_string(),
        _ => String::new(),
    }
}

fn build_message(sender_name: &str, body: &str, chat_id: &str, token: &str) -> Message {
    let mut data = HashMap::new();
    data.insert("chatId".to_string(), chat_id.to_string());

    Message {
        token: Some(token.to_string()),
        notification: Some(Notification {
            title: Some(sender_name.to_string()),
            body: Some(body.to_string()),
        }),
        data: Some(data),
        android: Some(AndroidConfig {
            priority: Some(AndroidMessagePriority::High),
            notification: Some(AndroidNotification {
                sound: Some(SOUND_DEFAULT.to_string()),
                channel_id: Some(ANDROID_CHANNEL_ID.to_string()),
            }),
        }),
        apns: Some(ApnsConfig {
            payload: Some(ApnsPayload {
                aps: Some(Aps {
                    sound: Some(SOUND_DEFAULT.to_string()),
                    badge: Some(1),
                }),
            }),
        }),
    }
}
