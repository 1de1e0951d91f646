//! Command-execution core for the Warden moderation bot.
//!
//! - [`correlator::EventCorrelator`] suspends a command until a follow-up
//!   interaction matching a predicate arrives, with a timeout fallback and
//!   exactly-once firing between the two.
//! - [`commands::CommandGate`] runs the fixed pre-execution checks (guild
//!   scope, bot permissions, access level, cooldown) and produces at most
//!   one structured rejection per invocation.
//! - [`access::AccessStore`] serves role and operator grants from PostgreSQL
//!   behind bounded invalidate-on-write caches.
//!
//! The platform shell (gateway decoding, response rendering, localization)
//! lives outside this crate and talks to it through [`commands::Invocation`],
//! [`commands::Responder`], and [`events::InteractionEvent`]. [`app::App`]
//! wires one instance of everything; no state is process-global.

pub mod access;
pub mod app;
pub mod cache;
pub mod commands;
pub mod config;
pub mod correlator;
pub mod db;
pub mod events;
pub mod observability;
pub mod permissions;
