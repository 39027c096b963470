//! Lapse Frame Model
//!
//! Defines the data contracts shared by both Lapse tools:
//! - **Naming:** The camera filename conventions a frame directory may use
//! - **Scan:** Directory listing, frame-number extraction, range/skip filtering
//! - **Manifest:** The concat manifest text format, plus the boomerang rewrite
//!
//! Frame paths written to a manifest are absolute so the manifest can be
//! consumed from any working directory.

pub mod manifest;
pub mod naming;
pub mod scan;

pub use manifest::*;
pub use naming::*;
pub use scan::*;
