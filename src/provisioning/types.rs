use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Error type returned by client API implementations
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A member to invite, as configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteTarget {
    /// Public username without the leading `@`
    Username(String),
    /// Phone number of a contact, e.g. `+15550100`
    Phone(String),
}

impl InviteTarget {
    /// Parse a configured target. Returns `None` for blank input.
    ///
    /// Values starting with `+` or made of digits are phone numbers; anything
    /// else is a username, with an optional leading `@` removed.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if raw.starts_with('+') || raw.chars().all(|c| c.is_ascii_digit()) {
            return Some(InviteTarget::Phone(raw.to_string()));
        }

        let username = raw.strip_prefix('@').unwrap_or(raw);
        if username.is_empty() {
            return None;
        }
        Some(InviteTarget::Username(username.to_string()))
    }
}

impl fmt::Display for InviteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InviteTarget::Username(name) => write!(f, "@{}", name),
            InviteTarget::Phone(phone) => write!(f, "{}", phone),
        }
    }
}

/// What to create for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    pub title: String,
    /// Posted in this order after the members are invited
    pub welcome_messages: Vec<String>,
    pub invite_targets: Vec<InviteTarget>,
}

/// Outcome of a completed provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedGroup {
    pub title: String,
    pub invite_link: String,
    pub invited: usize,
    pub welcome_sent: usize,
}

/// Progress of a provisioning run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProvisionStep {
    Unopened,
    SessionOpen,
    GroupCreated,
    MembersInvited,
    WelcomeSent,
    LinkExported,
    SessionClosed,
}

impl ProvisionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionStep::Unopened => "unopened",
            ProvisionStep::SessionOpen => "session_open",
            ProvisionStep::GroupCreated => "group_created",
            ProvisionStep::MembersInvited => "members_invited",
            ProvisionStep::WelcomeSent => "welcome_sent",
            ProvisionStep::LinkExported => "link_exported",
            ProvisionStep::SessionClosed => "session_closed",
        }
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single provisioning step
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Failed to open client session: {0}")]
    SessionOpen(#[source] BoxError),

    #[error("Failed to create group '{title}': {source}")]
    CreateGroup {
        title: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to resolve invite target {target}: {source}")]
    ResolveMember {
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to invite members: {0}")]
    InviteMembers(#[source] BoxError),

    #[error("Failed to send welcome message {index}: {source}")]
    SendWelcome {
        index: usize,
        #[source]
        source: BoxError,
    },

    #[error("Failed to export invite link: {0}")]
    ExportLink(#[source] BoxError),
}

impl ProvisionError {
    /// The last step reached before the failure
    pub fn reached(&self) -> ProvisionStep {
        match self {
            ProvisionError::SessionOpen(_) => ProvisionStep::Unopened,
            ProvisionError::CreateGroup { .. } => ProvisionStep::SessionOpen,
            ProvisionError::ResolveMember { .. } | ProvisionError::InviteMembers(_) => {
                ProvisionStep::GroupCreated
            }
            ProvisionError::SendWelcome { .. } => ProvisionStep::MembersInvited,
            ProvisionError::ExportLink(_) => ProvisionStep::WelcomeSent,
        }
    }
}

/// Opens one authenticated client session per provisioning run
#[async_trait]
pub trait SessionConnector: Send + Sync {
    type Session: GroupSession;

    async fn open(&self) -> Result<Self::Session, BoxError>;
}

/// Calls available on an open client session
#[async_trait]
pub trait GroupSession: Send {
    /// Handle to a created group
    type Group: Send + Sync;
    /// Handle to a resolved member
    type Member: Send;

    async fn create_group(&mut self, title: &str) -> Result<Self::Group, BoxError>;

    async fn resolve_member(&mut self, target: &InviteTarget) -> Result<Self::Member, BoxError>;

    async fn invite_members(
        &mut self,
        group: &Self::Group,
        members: Vec<Self::Member>,
    ) -> Result<(), BoxError>;

    async fn send_message(&mut self, group: &Self::Group, text: &str) -> Result<(), BoxError>;

    /// Export a permanent join link for the group
    async fn export_invite_link(&mut self, group: &Self::Group) -> Result<String, BoxError>;

    async fn close(self) -> Result<(), BoxError>
    where
        Self: Sized;
}
