//! hl-demo-export library
//!
//! Turns the camera track of a GoldSrc demo into BVH motion for 3D
//! packages, and summarizes demo contents.

pub mod bvh;
pub mod export;
pub mod info;
pub mod resample;

pub use export::{ExportOptions, ExportReport, export_bvh, open_demo};
pub use info::DemoSummary;
pub use resample::{CameraSample, resample};
