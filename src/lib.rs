//! Relays web form submissions to Telegram.
//!
//! A submission posted to `/send` is validated, composed into a message and
//! handed to the delivery strategy selected at startup: a Bot API message to a
//! fixed chat, or a freshly provisioned group with a join link.

// Shared components
pub mod config;
pub mod error;

// Domain layer
pub mod delivery;
pub mod provisioning;
pub mod relay;

// Application layer
pub mod api;
pub mod server;
