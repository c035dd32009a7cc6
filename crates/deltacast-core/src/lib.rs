//! Core library for recording screen deltas into a sprite atlas plus a frame log.
//!
//! - Detection: per-pixel RGBA distance, flood-filled into padded change regions
//! - Packing: Skyline, MaxRects and Guillotine strategies behind one `pack_layout` call
//! - Pipeline: `DeltaEncoder` pushes frames in order and `finish` returns the atlas,
//!   sprite table and frame log
//!
//! Quick example:
//! ```ignore
//! use deltacast_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let mut enc = DeltaEncoder::new(DeltaConfig::default())?;
//! enc.push_file("frames/1000.png", 1000)?;
//! enc.push_file("frames/1250.png", 1250)?;
//! let out = enc.finish()?;
//! out.atlas.save("spritesheet.png")?;
//! std::fs::write("data.json", out.log.to_json_string()?)?;
//! # Ok(()) }
//! ```

pub mod collapse;
pub mod compositing;
pub mod config;
pub mod detect;
pub mod encode;
pub mod error;
pub mod extract;
pub mod layout;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod raster;

pub use collapse::collapse_regions;
pub use config::*;
pub use detect::{ChangeDetector, diff_mask};
pub use encode::{ChangeTuple, FrameEntry, FrameLog, to_json_compact, to_json_manifest};
pub use error::*;
pub use extract::SpriteSources;
pub use layout::{Layout, PackItems, Placement, pack_layout};
pub use model::*;
pub use pipeline::*;
pub use raster::{Pixel, RasterFrame};

/// Convenience prelude for common types and functions.
/// Importing `deltacast_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        AlgorithmFamily, AutoMode, Connectivity, DeltaConfig, DeltaConfigBuilder, DiffConfig,
        GuillotineChoice, GuillotineSplit, MaxRectsHeuristic, PackerConfig, SkylineHeuristic,
        SortOrder,
    };
    pub use crate::encode::FrameLog;
    pub use crate::model::{EncodeStats, Meta, Rect, Region, Sprite};
    pub use crate::raster::{Pixel, RasterFrame};
    pub use crate::{DeltaEncoder, DeltaOutput, FrameFile, encode_files, encode_frames};
}
