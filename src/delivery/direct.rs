use async_trait::async_trait;

use crate::config::DeliveryMode;
use crate::relay::{NotificationMessage, Submission};

use super::{BotApiClient, DeliveryError, DeliveryReceipt, DeliveryStrategy};

/// Posts the composed message to the configured chat through the Bot API
pub struct DirectDelivery {
    client: BotApiClient,
}

impl DirectDelivery {
    pub fn new(client: BotApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeliveryStrategy for DirectDelivery {
    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Direct
    }

    #[tracing::instrument(name = "delivery.direct", skip_all, fields(chat_id = %self.client.chat_id()))]
    async fn deliver(
        &self,
        _submission: &Submission,
        message: &NotificationMessage,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let telegram = self.client.send_message(message.text()).await?;
        Ok(DeliveryReceipt::Message { telegram })
    }
}
