//! Change detection between two successive frames.
//!
//! A pixel differs when the summed absolute RGBA difference exceeds the tolerance.
//! Differing pixels are grouped by a flood fill over a configurable neighbourhood;
//! each group is reported as its bounding box, padded by the region margin and
//! clipped to the frame.

use crate::config::{Connectivity, DiffConfig, MAX_NEIGHBORHOOD_RADIUS};
use crate::error::{DeltaError, Result};
use crate::model::Region;
use crate::raster::RasterFrame;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct ChangeDetector {
    tolerance: u32,
    margin: u32,
    offsets: Vec<(i32, i32)>,
}

impl ChangeDetector {
    pub fn new(cfg: &DiffConfig) -> Self {
        Self {
            tolerance: cfg.tolerance,
            margin: cfg.region_margin,
            offsets: neighbour_offsets(cfg.connectivity, cfg.neighborhood_radius),
        }
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Regions for a frame with no predecessor: the whole frame, no diffing.
    pub fn first_frame(&self, frame: &RasterFrame) -> Vec<Region> {
        vec![Region::full(frame.width(), frame.height())]
    }

    /// Padded, clipped bounding boxes of every changed component between `prev` and `cur`.
    pub fn detect(&self, prev: &RasterFrame, cur: &RasterFrame) -> Result<Vec<Region>> {
        let (w, h) = cur.dimensions();
        Ok(self
            .components(prev, cur)?
            .into_iter()
            .map(|r| r.padded(self.margin, w, h))
            .collect())
    }

    /// Tight bounding boxes of the connected groups of differing pixels, in
    /// row-major order of their first pixel.
    pub fn components(&self, prev: &RasterFrame, cur: &RasterFrame) -> Result<Vec<Region>> {
        if prev.dimensions() != cur.dimensions() {
            return Err(DeltaError::DimensionMismatch {
                expected: prev.dimensions(),
                found: cur.dimensions(),
            });
        }
        let (w, h) = cur.dimensions();
        let mask = diff_mask(prev, cur, self.tolerance);
        let mut seen = vec![false; mask.len()];
        let mut stack: Vec<(u32, u32)> = Vec::new();
        let mut regions = Vec::new();

        for y in 0..h {
            for x in 0..w {
                let idx = y as usize * w as usize + x as usize;
                if !mask[idx] || seen[idx] {
                    continue;
                }
                seen[idx] = true;
                stack.push((x, y));
                let mut region = Region::point(x, y);
                while let Some((cx, cy)) = stack.pop() {
                    region.include(cx, cy);
                    for &(dx, dy) in &self.offsets {
                        let nx = cx as i64 + dx as i64;
                        let ny = cy as i64 + dy as i64;
                        if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                            continue;
                        }
                        let n = ny as usize * w as usize + nx as usize;
                        if mask[n] && !seen[n] {
                            seen[n] = true;
                            stack.push((nx as u32, ny as u32));
                        }
                    }
                }
                trace!(?region, "component");
                regions.push(region);
            }
        }
        Ok(regions)
    }
}

/// Per-pixel "differs" flags in row-major order. Frames must have equal dimensions.
pub fn diff_mask(prev: &RasterFrame, cur: &RasterFrame, tolerance: u32) -> Vec<bool> {
    debug_assert_eq!(prev.dimensions(), cur.dimensions());
    prev.pixels()
        .iter()
        .zip(cur.pixels())
        .map(|(a, b)| a.distance(b) > tolerance)
        .collect()
}

fn neighbour_offsets(connectivity: Connectivity, radius: u32) -> Vec<(i32, i32)> {
    match connectivity {
        Connectivity::Cross => vec![(0, 1), (0, -1), (1, 0), (-1, 0)],
        Connectivity::Window => {
            let r = radius.min(MAX_NEIGHBORHOOD_RADIUS) as i32;
            let side = (2 * r + 1) as usize;
            let mut out = Vec::with_capacity(side * side - 1);
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx != 0 || dy != 0 {
                        out.push((dx, dy));
                    }
                }
            }
            out
        }
    }
}
