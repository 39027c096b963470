//! Lapse Render Engine
//!
//! Turns a concat manifest of still frames plus render options into a
//! single ffmpeg invocation. All pixel work happens inside ffmpeg; this
//! crate only decides what to ask for.
//!
//! # Pipeline
//!
//! ```text
//! file_list.txt ──┬── (boomerang) ──► temp manifest
//!                 │                        │
//! RenderOptions ──┴── resolve ──► ResolvedRender
//!                                     │
//!                                     ├── fit ─► eq ─► unsharp ─► setpts ─► drawtext ─► fps
//!                                     ├── watermark overlay (optional)
//!                                     ▼
//!                              ffmpeg (libx264)
//!                                     │
//!                                     ▼
//!                  Timelapses/<date>_<name>_<tags>.mp4
//! ```

pub mod encoder;
pub mod filters;
pub mod look;
pub mod options;
pub mod output;
pub mod probe;
pub mod render;
pub mod watermark;

pub use encoder::*;
pub use look::*;
pub use options::*;
pub use render::*;
pub use watermark::*;
