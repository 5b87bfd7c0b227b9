//! # invite_core
//!
//! Rendering and interaction logic for the event invitation microsite.
//!
//! ## Flow
//!
//! 1. [`resolver::resolve`] turns the location query (plus a persisted
//!    referral code) into an [`ApplicationState`].
//! 2. The caller fetches the [`ConfigDocument`] for the state's event slug.
//! 3. [`Controller`] owns both, renders with [`render::render_page`] and
//!    turns each [`Action`] into an [`Update`].
//!
//! If the config cannot be fetched, [`render::render_error_panel`] is the
//! only output and the controller is never built.
//!
//! Nothing in this crate performs I/O. Storage, clipboard, audio and the
//! tracking sink are traits implemented by the host.

pub mod config_doc;
pub mod controller;
pub mod format;
pub mod i18n;
pub mod paths;
pub mod playback;
pub mod render;
pub mod resolver;
pub mod share;
pub mod state;
pub mod storage;
pub mod tracking;

pub use config_doc::ConfigDocument;
pub use controller::{Action, Controller, Update};
pub use state::{ApplicationState, Locale};
