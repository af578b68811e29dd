//! Spaces bridge — exposes the Live Share Spaces editor extension as a
//! generic chat provider.
//!
//! The host supplies an [`host::ExtensionRegistry`] and a
//! [`commands::CommandBus`]; [`spaces::SpacesProvider`] implements
//! [`chat::ChatProvider`] on top of them.
//!
//! See `DESIGN.md` for the architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chat;
pub mod commands;
pub mod config;
pub mod host;
pub mod logging;
pub mod spaces;
