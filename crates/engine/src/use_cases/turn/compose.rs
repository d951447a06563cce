//! Compose step: pending note, portraits, attachment, typed text.

use questkeeper_domain::EntityId;

use crate::infrastructure::ports::{Blob, Part};
use crate::stores::PendingPortrait;

/// A file the player attached to an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub data_base64: String,
}

/// One player-visible action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerInput {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl PlayerInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Payload of the first send of an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub parts: Vec<Part>,
    /// What the player sees in the log for this action.
    pub log_text: String,
    /// The pending note that went into `parts`, if any.
    pub consumed_note: Option<String>,
    /// Entities whose portraits went into `parts`.
    pub consumed_portraits: Vec<EntityId>,
}

/// Build the payload, or `None` when there is nothing to send.
///
/// Portraits ride along with an action but never trigger one on their own.
pub fn compose(
    pending_note: Option<&str>,
    portraits: &[PendingPortrait],
    input: &PlayerInput,
) -> Option<Composition> {
    let note = pending_note.map(str::trim).filter(|n| !n.is_empty());
    let typed = input.text.trim();

    if typed.is_empty() && input.attachment.is_none() && note.is_none() {
        return None;
    }

    let mut parts = Vec::new();

    if let Some(note) = note {
        parts.push(Part::text(note));
    }

    for portrait in portraits {
        parts.push(Part::inline(portrait.image.clone()));
        parts.push(Part::text(format!(
            "[SYSTEM] The image above is the portrait of {} (entity id {}) on the map.",
            portrait.label, portrait.entity_id
        )));
    }

    if let Some(attachment) = &input.attachment {
        parts.push(Part::inline(Blob::new(
            attachment.mime_type.clone(),
            attachment.data_base64.clone(),
        )));
    }

    if !typed.is_empty() {
        parts.push(Part::text(typed));
    }

    let log_text = if !typed.is_empty() {
        typed.to_string()
    } else if let Some(attachment) = &input.attachment {
        format!("[Attached file: {}]", attachment.name)
    } else {
        note.unwrap_or_default().to_string()
    };

    Some(Composition {
        parts,
        log_text,
        consumed_note: note.map(|_| pending_note.unwrap_or_default().to_string()),
        consumed_portraits: portraits.iter().map(|p| p.entity_id).collect(),
    })
}
