//! Delivery strategies for validated submissions.
//!
//! Exactly one strategy is active per process, selected by `delivery.mode`:
//!
//! - `direct`: [`DirectDelivery`] posts the message to a fixed chat via the Bot API
//! - `group`: [`GroupDelivery`] provisions a new group through the client API
//!   and answers with its join link
//!
//! Use [`create_delivery`] to build the configured strategy.

mod bot_api;
mod direct;
mod group;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::{DeliveryMode, Settings};
use crate::provisioning::ProvisionError;
use crate::relay::{NotificationMessage, Submission};

pub use bot_api::BotApiClient;
pub use direct::DirectDelivery;
pub use group::GroupDelivery;

/// Delivery-specific part of a success response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeliveryReceipt {
    /// Bot API response for the sent message
    Message { telegram: serde_json::Value },
    /// Join link of the provisioned group
    Group { invite_link: String, title: String },
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The platform answered with a non-success HTTP status
    #[error("{api} API error: {status}: {body}")]
    Rejected {
        api: &'static str,
        status: u16,
        body: String,
    },

    #[error("{api} request failed: {source}")]
    Transport {
        api: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Provisioning(#[from] ProvisionError),
}

#[async_trait]
pub trait DeliveryStrategy: Send + Sync {
    fn mode(&self) -> DeliveryMode;

    /// Relay one submission. Called once per valid request, never retried.
    async fn deliver(
        &self,
        submission: &Submission,
        message: &NotificationMessage,
    ) -> Result<DeliveryReceipt, DeliveryError>;
}

/// Create the delivery strategy selected by configuration.
///
/// Fails when the selected mode lacks credentials or, for `group`, when the
/// binary was built without the `mtproto` feature.
pub fn create_delivery(settings: &Settings) -> Result<Arc<dyn DeliveryStrategy>, config::ConfigError> {
    settings.validate()?;

    match settings.delivery.mode {
        DeliveryMode::Direct => {
            let client = BotApiClient::from_config(&settings.telegram)?;
            tracing::info!(mode = "direct", "Creating Bot API delivery");
            Ok(Arc::new(DirectDelivery::new(client)))
        }
        DeliveryMode::Group => create_group_delivery(settings),
    }
}

#[cfg(feature = "mtproto")]
fn create_group_delivery(
    settings: &Settings,
) -> Result<Arc<dyn DeliveryStrategy>, config::ConfigError> {
    use crate::provisioning::mtproto::MtprotoConnector;
    use crate::provisioning::GroupProvisioner;

    let connector = MtprotoConnector::from_config(&settings.telegram).ok_or_else(|| {
        config::ConfigError::Message("Client API credentials are not configured".to_string())
    })?;

    tracing::info!(
        mode = "group",
        invites = settings.group.invite.len(),
        "Creating group provisioning delivery"
    );
    Ok(Arc::new(GroupDelivery::new(
        GroupProvisioner::new(connector),
        settings.group.clone(),
    )))
}

#[cfg(not(feature = "mtproto"))]
fn create_group_delivery(
    _settings: &Settings,
) -> Result<Arc<dyn DeliveryStrategy>, config::ConfigError> {
    Err(config::ConfigError::Message(
        "Group delivery requires a build with the `mtproto` feature".to_string(),
    ))
}
