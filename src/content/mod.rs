//! Social post formatting: platform metadata, tag derivation and text fitting.

mod formatter;
pub mod platforms;
mod tags;

pub use formatter::{PlatformContent, compose, format_content, format_message};
pub use platforms::{ContentType, MediaType, PLATFORMS, PlatformSpec, platform, require_platform};
pub use tags::{MAX_TAGS, derive_tags, format_hashtags};
