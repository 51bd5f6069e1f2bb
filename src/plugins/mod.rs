//! # Plugin contract.
//!
//! A [`LogPlugin`] is a consumer of the host's line stream. Plugins opt in
//! during [`LogPlugin::initialize`], receive every line in order through
//! [`LogPlugin::process_line`], and get one [`LogPlugin::finalize`] call
//! after the stream ends.
//!
//! ## Rules
//! - A plugin that declines or fails initialization is excluded; the host
//!   keeps running with the rest.
//! - Line-processing errors are traced (first occurrence per plugin) and the
//!   stream keeps flowing.
//! - A plugin that stalls long enough is short-circuited by the host and
//!   never sees `finalize`.

mod plugin;

pub use plugin::LogPlugin;
