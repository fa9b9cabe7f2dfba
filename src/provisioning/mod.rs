//! Group provisioning through a session-based client API.
//!
//! # Architecture
//!
//! The provisioning sequence is independent of the client library:
//!
//! - [`SessionConnector`]: opens an authenticated session per request
//! - [`GroupSession`]: the individual calls (create group, resolve, invite, send, export)
//! - [`GroupProvisioner`]: runs the calls in order and always closes the session
//!
//! The MTProto implementation backed by grammers lives in `mtproto`
//! (cargo feature `mtproto`).

#[cfg(feature = "mtproto")]
pub mod mtproto;
mod types;
mod workflow;

pub use types::{
    BoxError, GroupPlan, GroupSession, InviteTarget, ProvisionError, ProvisionStep,
    ProvisionedGroup, SessionConnector,
};
pub use workflow::GroupProvisioner;
