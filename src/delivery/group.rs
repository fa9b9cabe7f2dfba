use async_trait::async_trait;

use crate::config::{DeliveryMode, GroupSettings};
use crate::provisioning::{GroupProvisioner, SessionConnector};
use crate::relay::{group_plan, NotificationMessage, Submission};

use super::{DeliveryError, DeliveryReceipt, DeliveryStrategy};

/// Creates a dedicated group per submission and answers with its join link
pub struct GroupDelivery<C> {
    provisioner: GroupProvisioner<C>,
    settings: GroupSettings,
}

impl<C: SessionConnector> GroupDelivery<C> {
    pub fn new(provisioner: GroupProvisioner<C>, settings: GroupSettings) -> Self {
        Self {
            provisioner,
            settings,
        }
    }
}

#[async_trait]
impl<C: SessionConnector + 'static> DeliveryStrategy for GroupDelivery<C> {
    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Group
    }

    async fn deliver(
        &self,
        submission: &Submission,
        message: &NotificationMessage,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let plan = group_plan(&self.settings, submission, message);
        let group = self.provisioner.provision(&plan).await?;

        Ok(DeliveryReceipt::Group {
            invite_link: group.invite_link,
            title: group.title,
        })
    }
}
