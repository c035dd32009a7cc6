use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in atlas space (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// True when the two rectangles share at least one pixel.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x >= other.x + other.w
            || other.x >= self.x + self.w
            || self.y >= other.y + other.h
            || other.y >= self.y + self.h)
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// Bounding box of a changed area inside a source frame. All bounds are inclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Region {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl Region {
    pub fn new(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        debug_assert!(top <= bottom && left <= right);
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Single-pixel region at `(x, y)`.
    pub fn point(x: u32, y: u32) -> Self {
        Self::new(y, x, y, x)
    }

    /// Region covering a whole `width x height` frame.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, height.saturating_sub(1), width.saturating_sub(1))
    }

    pub fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }

    /// Grow the box so it also covers `(x, y)`.
    pub fn include(&mut self, x: u32, y: u32) {
        self.top = self.top.min(y);
        self.left = self.left.min(x);
        self.bottom = self.bottom.max(y);
        self.right = self.right.max(x);
    }

    /// Component-wise min/max of both boxes.
    pub fn union(&self, other: &Region) -> Region {
        Region::new(
            self.top.min(other.top),
            self.left.min(other.left),
            self.bottom.max(other.bottom),
            self.right.max(other.right),
        )
    }

    /// Expand symmetrically by `margin` and clip to `[0,width) x [0,height)`.
    pub fn padded(&self, margin: u32, width: u32, height: u32) -> Region {
        Region::new(
            self.top.saturating_sub(margin),
            self.left.saturating_sub(margin),
            self.bottom.saturating_add(margin).min(height.saturating_sub(1)),
            self.right.saturating_add(margin).min(width.saturating_sub(1)),
        )
    }

    pub fn contains_point(&self, x: u32, y: u32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}

/// A sprite placed inside the atlas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sprite {
    /// Index of the extracted region in run order (frame, then region).
    pub id: usize,
    /// Absolute placement inside the atlas.
    pub frame: Rect,
}

/// One changed region of one frame, before atlas coordinates are known.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Change {
    /// Left edge of the region in the source frame.
    pub x: u32,
    /// Top edge of the region in the source frame.
    pub y: u32,
    pub sprite_id: usize,
}

/// Changes recorded for a single input frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameRecord {
    /// Capture time in milliseconds.
    pub timestamp: u64,
    pub changes: Vec<Change>,
}

/// Atlas-level metadata carried by the manifest export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Schema version of the manifest; current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub format: String,
    /// Atlas image size.
    pub size: (u32, u32),
    /// Working size of the recorded frames.
    pub frame_size: (u32, u32),
    pub tolerance: u32,
    pub connectivity: String,
    pub neighborhood_radius: u32,
    pub region_margin: u32,
    pub collapse_threshold: usize,
}

/// Statistics about one encoding run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EncodeStats {
    /// Frames fed into the run.
    pub num_frames: usize,
    /// Frames that produced a record (non-empty change list).
    pub num_records: usize,
    /// Total extracted sprites.
    pub num_sprites: usize,
    /// Frames whose regions were collapsed into one.
    pub num_collapsed: usize,
    pub atlas_width: u32,
    pub atlas_height: u32,
    /// Atlas width * height.
    pub atlas_area: u64,
    /// Sum of sprite areas.
    pub used_area: u64,
    /// used_area / atlas_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl EncodeStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Frames: {} ({} recorded, {} collapsed), Sprites: {}, Atlas: {}x{}, Occupancy: {:.2}%",
            self.num_frames,
            self.num_records,
            self.num_collapsed,
            self.num_sprites,
            self.atlas_width,
            self.atlas_height,
            self.occupancy * 100.0,
        )
    }

    /// Returns wasted atlas space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.atlas_area.saturating_sub(self.used_area)
    }
}
