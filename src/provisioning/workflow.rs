use tracing::{debug, info, warn};

use super::types::{
    GroupPlan, GroupSession, ProvisionError, ProvisionStep, ProvisionedGroup, SessionConnector,
};

/// Runs the provisioning sequence for a [`GroupPlan`]:
/// open session → create group → invite members → send welcome → export link → close.
///
/// Each step depends on the previous one. The first failure aborts the run;
/// groups that were already created are left in place.
pub struct GroupProvisioner<C> {
    connector: C,
}

impl<C: SessionConnector> GroupProvisioner<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    #[tracing::instrument(
        name = "provision.group",
        skip(self, plan),
        fields(
            title = %plan.title,
            invites = plan.invite_targets.len(),
            welcome_messages = plan.welcome_messages.len()
        )
    )]
    pub async fn provision(&self, plan: &GroupPlan) -> Result<ProvisionedGroup, ProvisionError> {
        let mut session = self
            .connector
            .open()
            .await
            .map_err(ProvisionError::SessionOpen)?;
        debug!(step = %ProvisionStep::SessionOpen, "Client session opened");

        let result = run_steps(&mut session, plan).await;

        // The session is closed on every path once it has been opened
        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close client session");
        }
        debug!(step = %ProvisionStep::SessionClosed, "Client session closed");

        match &result {
            Ok(group) => info!(
                invited = group.invited,
                welcome_sent = group.welcome_sent,
                "Group provisioned"
            ),
            Err(e) => warn!(reached = %e.reached(), error = %e, "Group provisioning failed"),
        }

        result
    }
}

async fn run_steps<S: GroupSession>(
    session: &mut S,
    plan: &GroupPlan,
) -> Result<ProvisionedGroup, ProvisionError> {
    let group = session
        .create_group(&plan.title)
        .await
        .map_err(|source| ProvisionError::CreateGroup {
            title: plan.title.clone(),
            source,
        })?;
    debug!(step = %ProvisionStep::GroupCreated, "Group created");

    let invited = invite_members(session, &group, plan).await?;

    for (index, text) in plan.welcome_messages.iter().enumerate() {
        session
            .send_message(&group, text)
            .await
            .map_err(|source| ProvisionError::SendWelcome { index, source })?;
    }
    debug!(
        step = %ProvisionStep::WelcomeSent,
        count = plan.welcome_messages.len(),
        "Welcome messages sent"
    );

    let invite_link = session
        .export_invite_link(&group)
        .await
        .map_err(ProvisionError::ExportLink)?;
    debug!(step = %ProvisionStep::LinkExported, "Invite link exported");

    Ok(ProvisionedGroup {
        title: plan.title.clone(),
        invite_link,
        invited,
        welcome_sent: plan.welcome_messages.len(),
    })
}

/// Resolve every target, then invite them in one call. No-op for an empty list.
async fn invite_members<S: GroupSession>(
    session: &mut S,
    group: &S::Group,
    plan: &GroupPlan,
) -> Result<usize, ProvisionError> {
    if plan.invite_targets.is_empty() {
        return Ok(0);
    }

    let mut members = Vec::with_capacity(plan.invite_targets.len());
    for target in &plan.invite_targets {
        let member = session
            .resolve_member(target)
            .await
            .map_err(|source| ProvisionError::ResolveMember {
                target: target.to_string(),
                source,
            })?;
        members.push(member);
    }

    let count = members.len();
    session
        .invite_members(group, members)
        .await
        .map_err(ProvisionError::InviteMembers)?;
    debug!(step = %ProvisionStep::MembersInvited, count, "Members invited");

    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::provisioning::{BoxError, InviteTarget};

    /// Records every call and fails the first call whose label matches `fail_on`.
    #[derive(Clone, Default)]
    struct Script {
        calls: Arc<Mutex<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl Script {
        fn failing(label: &'static str) -> Self {
            Self {
                fail_on: Some(label),
                ..Self::default()
            }
        }

        fn record(&self, call: String) -> Result<(), BoxError> {
            let fail = self.fail_on.is_some_and(|label| call.starts_with(label));
            self.calls.lock().unwrap().push(call);
            if fail {
                return Err("scripted failure".into());
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct FakeConnector(Script);

    struct FakeSession(Script);

    #[async_trait]
    impl SessionConnector for FakeConnector {
        type Session = FakeSession;

        async fn open(&self) -> Result<FakeSession, BoxError> {
            self.0.record("open".to_string())?;
            Ok(FakeSession(self.0.clone()))
        }
    }

    #[async_trait]
    impl GroupSession for FakeSession {
        type Group = u64;
        type Member = String;

        async fn create_group(&mut self, title: &str) -> Result<u64, BoxError> {
            self.0.record(format!("create:{}", title))?;
            Ok(42)
        }

        async fn resolve_member(&mut self, target: &InviteTarget) -> Result<String, BoxError> {
            self.0.record(format!("resolve:{}", target))?;
            Ok(target.to_string())
        }

        async fn invite_members(
            &mut self,
            group: &u64,
            members: Vec<String>,
        ) -> Result<(), BoxError> {
            self.0
                .record(format!("invite:{}:{}", group, members.join(",")))
        }

        async fn send_message(&mut self, group: &u64, text: &str) -> Result<(), BoxError> {
            self.0.record(format!("send:{}:{}", group, text))
        }

        async fn export_invite_link(&mut self, group: &u64) -> Result<String, BoxError> {
            self.0.record(format!("export:{}", group))?;
            Ok("https://t.me/+AbCdEf".to_string())
        }

        async fn close(self) -> Result<(), BoxError> {
            self.0.record("close".to_string())
        }
    }

    fn plan(invites: &[&str]) -> GroupPlan {
        GroupPlan {
            title: "Support: Jo".to_string(),
            welcome_messages: vec!["Hello Jo".to_string(), "Question: Help?".to_string()],
            invite_targets: invites
                .iter()
                .filter_map(|raw| InviteTarget::parse(raw))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_full_sequence() {
        let script = Script::default();
        let provisioner = GroupProvisioner::new(FakeConnector(script.clone()));

        let group = tokio_test::assert_ok!(
            provisioner
                .provision(&plan(&["@alice", "+15550100"]))
                .await
        );

        assert_eq!(group.invite_link, "https://t.me/+AbCdEf");
        assert_eq!(group.title, "Support: Jo");
        assert_eq!(group.invited, 2);
        assert_eq!(group.welcome_sent, 2);
        assert_eq!(
            script.calls(),
            vec![
                "open",
                "create:Support: Jo",
                "resolve:@alice",
                "resolve:+15550100",
                "invite:42:@alice,+15550100",
                "send:42:Hello Jo",
                "send:42:Question: Help?",
                "export:42",
                "close",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_invite_list_skips_invitation() {
        let script = Script::default();
        let provisioner = GroupProvisioner::new(FakeConnector(script.clone()));

        let group = provisioner.provision(&plan(&[])).await.unwrap();

        assert_eq!(group.invited, 0);
        let calls = script.calls();
        assert!(!calls.iter().any(|c| c.starts_with("resolve") || c.starts_with("invite")));
        assert_eq!(calls.last().map(String::as_str), Some("close"));
    }

    #[tokio::test]
    async fn test_resolution_failure_stops_before_welcome() {
        let script = Script::failing("resolve:@ghost");
        let provisioner = GroupProvisioner::new(FakeConnector(script.clone()));

        let err = tokio_test::assert_err!(
            provisioner
                .provision(&plan(&["@alice", "@ghost", "@carol"]))
                .await
        );

        assert!(matches!(err, ProvisionError::ResolveMember { ref target, .. } if target == "@ghost"));
        assert_eq!(
            script.calls(),
            vec![
                "open",
                "create:Support: Jo",
                "resolve:@alice",
                "resolve:@ghost",
                "close",
            ]
        );
    }

    #[tokio::test]
    async fn test_send_failure_reports_message_index() {
        let script = Script::failing("send:42:Question");
        let provisioner = GroupProvisioner::new(FakeConnector(script.clone()));

        let err = provisioner.provision(&plan(&[])).await.unwrap_err();

        assert!(matches!(err, ProvisionError::SendWelcome { index: 1, .. }));
        let calls = script.calls();
        assert!(!calls.iter().any(|c| c.starts_with("export")));
        assert_eq!(calls.last().map(String::as_str), Some("close"));
    }

    #[tokio::test]
    async fn test_open_failure_does_not_close() {
        let script = Script::failing("open");
        let provisioner = GroupProvisioner::new(FakeConnector(script.clone()));

        let err = provisioner.provision(&plan(&["@alice"])).await.unwrap_err();

        assert!(matches!(err, ProvisionError::SessionOpen(_)));
        assert_eq!(script.calls(), vec!["open"]);
    }

    #[tokio::test]
    async fn test_close_failure_keeps_result() {
        let script = Script::failing("close");
        let provisioner = GroupProvisioner::new(FakeConnector(script.clone()));

        let group = provisioner.provision(&plan(&[])).await.unwrap();
        assert_eq!(group.invite_link, "https://t.me/+AbCdEf");
    }

    #[tokio::test]
    async fn test_export_failure() {
        let script = Script::failing("export");
        let provisioner = GroupProvisioner::new(FakeConnector(script.clone()));

        let err = provisioner.provision(&plan(&[])).await.unwrap_err();

        assert!(matches!(err, ProvisionError::ExportLink(_)));
        assert_eq!(err.reached(), ProvisionStep::WelcomeSent);
        assert_eq!(script.calls().last().map(String::as_str), Some("close"));
    }
}
