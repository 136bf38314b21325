//! Utilities shared by the notify service and its tooling.

#![warn(clippy::pedantic)]

/// Secret types that prevent accidental logging
pub mod secret;

/// JWT pre-parsing helpers (size limit, header inspection)
pub mod jwt;
