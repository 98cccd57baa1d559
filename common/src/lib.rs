//! Shared models and ports for `busforge`.
//!
//! * **[`network`]**: adapters a topology capture runs on.
//! * **[`capture`]**: scan settings and their validation.
//! * **[`project`]**: the host project session, tree items and the HiL connector.
//! * **[`events`]**: one-shot session lifecycle notifications.
//! * **[`config`]**: runtime configuration.

pub mod capture;
pub mod config;
pub mod events;
pub mod network;
pub mod project;
