//! Transcript generation at ticket closure.
//!
//! A transcript is the only thing that survives a ticket: the channel is
//! deleted after the grace delay and the record leaves the active store.

use chrono::{DateTime, Utc};
use futures_util::StreamExt;

use vigil_common::time::format_duration;
use vigil_common::{HistoryMessage, PlatformAdapter};

use crate::ticket::Ticket;

/// A rendered transcript plus the summary record delivered alongside it.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub file_name: String,
    pub summary: String,
    pub content: String,
}

/// Render the ticket's conversation as plain text. Automated messages are
/// excluded unless pinned. A history fetch failure degrades to an empty
/// conversation; closure must never fail on a missing transcript.
pub async fn generate(
    adapter: &dyn PlatformAdapter,
    ticket: &Ticket,
    closed_by: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> Transcript {
    let messages = collect_messages(adapter, &ticket.channel_id).await;
    let lines: Vec<String> = messages
        .iter()
        .filter(|message| !message.is_bot || message.is_pinned)
        .map(render_line)
        .collect();

    let content = format!(
        "SUPPORT TICKET TRANSCRIPT\n\
         =========================\n\
         Ticket: {}\n\
         Closed by: {closed_by}\n\
         Close reason: {reason}\n\
         Generated: {}\n\
         Total messages: {}\n\
         \n\
         CONVERSATION:\n\
         =============\n\
         {}",
        ticket.channel_name,
        now.format("%Y-%m-%d %H:%M:%S UTC"),
        lines.len(),
        lines.join("\n"),
    );

    let summary = format!(
        "Ticket closed: {}\n\
         Owner: {}\n\
         Category: {}\n\
         Created: {}\n\
         Duration: {}\n\
         Closed by: {closed_by}\n\
         Reason: {reason}",
        ticket.channel_name,
        ticket.owner_id,
        ticket.category,
        ticket.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        format_duration(now - ticket.created_at),
    );

    Transcript {
        file_name: format!(
            "transcript-{}-{}.txt",
            ticket.channel_name,
            now.format("%Y%m%d-%H%M%S")
        ),
        summary,
        content,
    }
}

fn render_line(message: &HistoryMessage) -> String {
    let timestamp = message.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
    let content = if message.content.is_empty() {
        "[Embed/Attachment content]"
    } else {
        message.content.as_str()
    };
    let mut line = format!("[{timestamp}] {}: {content}", message.author_name);
    if !message.attachment_names.is_empty() {
        line.push_str(&format!(
            " [Attachments: {}]",
            message.attachment_names.join(", ")
        ));
    }
    line
}

async fn collect_messages(adapter: &dyn PlatformAdapter, channel_id: &str) -> Vec<HistoryMessage> {
    match adapter.fetch_channel_history(channel_id).await {
        Ok(stream) => stream.collect::<Vec<_>>().await,
        Err(err) => {
            tracing::warn!(channel_id, %err, "history unavailable, transcript will be empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(content: &str, attachments: &[&str]) -> HistoryMessage {
        HistoryMessage {
            author_id: "member_a".into(),
            author_name: "Ada".into(),
            is_bot: false,
            is_pinned: false,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 5).unwrap(),
            content: content.into(),
            attachment_names: attachments.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn line_format_includes_timestamp_author_and_content() {
        let line = render_line(&message("hello there", &[]));
        assert_eq!(line, "[2025-03-01 12:30:05 UTC] Ada: hello there");
    }

    #[test]
    fn attachments_are_appended_by_name() {
        let line = render_line(&message("see attached", &["crash.log", "shot.png"]));
        assert_eq!(
            line,
            "[2025-03-01 12:30:05 UTC] Ada: see attached [Attachments: crash.log, shot.png]"
        );
    }

    #[test]
    fn empty_content_renders_placeholder() {
        let line = render_line(&message("", &["only.png"]));
        assert!(line.contains("[Embed/Attachment content]"));
    }
}
