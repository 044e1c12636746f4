//! Core HTML name handling
//!
//! - Tags: standard tag table and SVG case adjustment
//! - Names: XML-name sanitization and prefix splitting

pub mod names;
pub mod tags;
