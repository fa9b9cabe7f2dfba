//! Telegram client API (MTProto) sessions backed by grammers.
//!
//! The session must already be authorized: log in once with the same
//! `api_id`/`api_hash` and keep the resulting `<name>.session` file next to
//! the service.

use std::path::PathBuf;

use async_trait::async_trait;
use grammers_client::{Client, Config, InitParams};
use grammers_session::{PackedChat, PackedType, Session};
use grammers_tl_types as tl;

use crate::config::TelegramConfig;

use super::types::{BoxError, GroupSession, InviteTarget, SessionConnector};

/// Connects with the configured API credentials and session file
pub struct MtprotoConnector {
    api_id: i32,
    api_hash: String,
    session_path: PathBuf,
}

impl MtprotoConnector {
    /// Returns `None` when the client API credentials are not configured.
    pub fn from_config(config: &TelegramConfig) -> Option<Self> {
        let api_id = config.api_id?;
        let api_hash = config.api_hash.clone()?;
        let session = config.session.as_deref()?;

        Some(Self {
            api_id,
            api_hash,
            session_path: PathBuf::from(format!("{}.session", session)),
        })
    }
}

#[async_trait]
impl SessionConnector for MtprotoConnector {
    type Session = MtprotoSession;

    async fn open(&self) -> Result<MtprotoSession, BoxError> {
        let session = Session::load_file_or_create(&self.session_path)?;
        let client = Client::connect(Config {
            session,
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            params: InitParams::default(),
        })
        .await?;

        if !client.is_authorized().await? {
            return Err(format!(
                "session {} is not authorized",
                self.session_path.display()
            )
            .into());
        }

        Ok(MtprotoSession {
            client,
            session_path: self.session_path.clone(),
        })
    }
}

pub struct MtprotoSession {
    client: Client,
    session_path: PathBuf,
}

/// A created megagroup
pub struct ChannelRef {
    id: i64,
    access_hash: i64,
}

impl ChannelRef {
    fn input_channel(&self) -> tl::enums::InputChannel {
        tl::types::InputChannel {
            channel_id: self.id,
            access_hash: self.access_hash,
        }
        .into()
    }

    fn input_peer(&self) -> tl::enums::InputPeer {
        tl::types::InputPeerChannel {
            channel_id: self.id,
            access_hash: self.access_hash,
        }
        .into()
    }

    fn packed(&self) -> PackedChat {
        PackedChat {
            ty: PackedType::Megagroup,
            id: self.id,
            access_hash: Some(self.access_hash),
        }
    }
}

#[async_trait]
impl GroupSession for MtprotoSession {
    type Group = ChannelRef;
    type Member = tl::enums::InputUser;

    async fn create_group(&mut self, title: &str) -> Result<ChannelRef, BoxError> {
        let updates = self
            .client
            .invoke(&tl::functions::channels::CreateChannel {
                broadcast: false,
                megagroup: true,
                for_import: false,
                forum: false,
                title: title.to_string(),
                about: String::new(),
                geo_point: None,
                address: None,
                ttl_period: None,
            })
            .await?;

        created_channel(updates).ok_or_else(|| "no channel in CreateChannel response".into())
    }

    async fn resolve_member(
        &mut self,
        target: &InviteTarget,
    ) -> Result<tl::enums::InputUser, BoxError> {
        let resolved = match target {
            InviteTarget::Username(username) => {
                self.client
                    .invoke(&tl::functions::contacts::ResolveUsername {
                        username: username.clone(),
                    })
                    .await?
            }
            InviteTarget::Phone(phone) => {
                self.client
                    .invoke(&tl::functions::contacts::ResolvePhone {
                        phone: phone.clone(),
                    })
                    .await?
            }
        };

        let tl::enums::contacts::ResolvedPeer::Peer(resolved) = resolved;
        resolved
            .users
            .into_iter()
            .find_map(|user| match user {
                tl::enums::User::User(user) => Some(
                    tl::types::InputUser {
                        user_id: user.id,
                        access_hash: user.access_hash.unwrap_or(0),
                    }
                    .into(),
                ),
                tl::enums::User::Empty(_) => None,
            })
            .ok_or_else(|| format!("{} is not a user", target).into())
    }

    async fn invite_members(
        &mut self,
        group: &ChannelRef,
        members: Vec<tl::enums::InputUser>,
    ) -> Result<(), BoxError> {
        self.client
            .invoke(&tl::functions::channels::InviteToChannel {
                channel: group.input_channel(),
                users: members,
            })
            .await?;
        Ok(())
    }

    async fn send_message(&mut self, group: &ChannelRef, text: &str) -> Result<(), BoxError> {
        self.client.send_message(group.packed(), text).await?;
        Ok(())
    }

    async fn export_invite_link(&mut self, group: &ChannelRef) -> Result<String, BoxError> {
        let invite = self
            .client
            .invoke(&tl::functions::messages::ExportChatInvite {
                legacy_revoke_permanent: false,
                request_needed: false,
                peer: group.input_peer(),
                expire_date: None,
                usage_limit: None,
                title: None,
            })
            .await?;

        match invite {
            tl::enums::ExportedChatInvite::ChatInviteExported(invite) => Ok(invite.link),
            tl::enums::ExportedChatInvite::ChatInvitePublicJoinRequests => {
                Err("exported invite has no link".into())
            }
        }
    }

    async fn close(self) -> Result<(), BoxError> {
        // Persist the refreshed auth state; the connection drops with the client
        self.client.session().save_to_file(&self.session_path)?;
        Ok(())
    }
}

/// Find the channel created by a `channels.createChannel` call.
fn created_channel(updates: tl::enums::Updates) -> Option<ChannelRef> {
    let chats = match updates {
        tl::enums::Updates::Updates(updates) => updates.chats,
        tl::enums::Updates::Combined(updates) => updates.chats,
        _ => return None,
    };

    chats.into_iter().find_map(|chat| match chat {
        tl::enums::Chat::Channel(channel) => Some(ChannelRef {
            id: channel.id,
            access_hash: channel.access_hash.unwrap_or(0),
        }),
        _ => None,
    })
}
