//! rbxsync - Content-addressed asset sync for Roblox
//!
//! Uploads local asset files to the content store exactly once per distinct
//! content, keeps a durable fingerprint cache and a generated asset map
//! module, and optionally exchanges state with other machines through a
//! shared map in a GitHub repository.

pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod library;
pub mod reconcile;
pub mod remote;
pub mod store;
pub mod sync;
pub mod transform;
pub mod watch;

pub use error::{SyncError, SyncResult};
