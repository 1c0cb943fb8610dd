use anyhow::Context;
use log::info;

use crate::provider::Mailbox;

/// Labels purged after every successful send, in order.
pub const CLEANUP_LABELS: [&str; 2] = ["INBOX", "SPAM"];

/// Moves every message currently listed under `label` to the trash, one at
/// a time. Stops at the first failure; messages trashed before it stay
/// trashed. Returns how many messages were trashed.
pub async fn trash_label(mailbox: &dyn Mailbox, label: &str) -> anyhow::Result<usize> {
    let messages = mailbox
        .list(label)
        .await
        .with_context(|| format!("failed to list messages in {label}"))?;

    for message in &messages {
        mailbox
            .trash(&message.id)
            .await
            .with_context(|| format!("failed to trash message {}", message.id))?;
    }

    info!("Trashed {} message(s) from {}", messages.len(), label);
    Ok(messages.len())
}
