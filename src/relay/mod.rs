//! Submission validation and message composition.

mod composer;
mod submission;

pub use composer::{compose, group_plan, render, NotificationMessage};
pub use submission::{InvalidSubmission, Submission, REQUIRED_FIELDS};
