//! Builds the text relayed for a submission.
//!
//! The notification uses Telegram's legacy Markdown (`*bold*`). Configured group
//! titles and welcome messages may reference submission fields as `{{field}}`.

use crate::config::GroupSettings;
use crate::provisioning::{GroupPlan, InviteTarget};

use super::submission::Submission;

/// Text relayed for one submission; immutable once composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    text: String,
}

impl NotificationMessage {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Format a submission into labeled Name / Email / Question sections.
pub fn compose(submission: &Submission) -> NotificationMessage {
    let text = format!(
        "*New Submission*\n\
         *Name:* {}\n\
         *Email:* {}\n\
         \n\
         *Question:*\n\
         {}",
        submission.name, submission.email, submission.question
    );

    NotificationMessage { text }
}

/// Substitute `{{name}}`, `{{email}}` and `{{question}}` placeholders.
///
/// Unknown placeholders are left untouched. The template is scanned once, so
/// placeholders appearing inside substituted values are not expanded.
pub fn render(template: &str, submission: &Submission) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let Some(end) = after_open.find("}}") else {
            rest = &rest[start..];
            break;
        };

        match submission.field(after_open[..end].trim()) {
            Some(value) => result.push_str(value),
            None => result.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }

    result.push_str(rest);
    result
}

/// Build the provisioning plan for one submission.
///
/// Welcome messages are the rendered templates followed by the notification itself.
pub fn group_plan(
    settings: &GroupSettings,
    submission: &Submission,
    message: &NotificationMessage,
) -> GroupPlan {
    let title = render(&settings.title_template, submission);

    let welcome_messages = settings
        .welcome_messages
        .iter()
        .map(|template| render(template, submission))
        .filter(|text| !text.trim().is_empty())
        .chain(std::iter::once(message.text().to_string()))
        .collect();

    let invite_targets = settings
        .invite
        .iter()
        .filter_map(|raw| InviteTarget::parse(raw))
        .collect();

    GroupPlan {
        title,
        welcome_messages,
        invite_targets,
    }
}
