//! Format implementations
//!
//! This module contains all format implementations that convert between
//! the CGML document model and text representations.

pub mod cgml;
pub mod json;
pub mod treeviz;

pub use cgml::CgmlFormat;
pub use json::JsonFormat;
pub use treeviz::TreevizFormat;
