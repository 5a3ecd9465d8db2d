//! Chat plugins shipped with shortvid
//!
//! Each plugin implements [`crate::host::Star`] and is constructed with its
//! own resources, which it releases in `terminate()`.
//!
//! - **video**: the `video` command group backed by the fallback fetcher

pub mod video;

pub use video::{parse_video_command, VideoCommand, VideoPlugin};
