//! Frame log: the per-frame list of atlas blits consumed by a renderer.
//!
//! Compact shape (default): `[[timestamp, [[x, y, x1, y1, x2, y2], ...]], ...]`,
//! where `(x, y)` is the destination origin on the canvas and `(x1, y1)-(x2, y2)`
//! the atlas box with exclusive `x2`/`y2`, so `x2 - x1` is the sprite width.

use crate::error::{DeltaError, Result};
use crate::model::{FrameRecord, Meta, Rect, Sprite};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// `(x, y, x1, y1, x2, y2)`: source origin, then atlas box (x2/y2 exclusive).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeTuple(pub u32, pub u32, pub u32, pub u32, pub u32, pub u32);

impl ChangeTuple {
    pub fn new(x: u32, y: u32, atlas: &Rect) -> Self {
        Self(x, y, atlas.x, atlas.y, atlas.x + atlas.w, atlas.y + atlas.h)
    }

    /// Destination origin on the reconstructed canvas.
    pub fn origin(&self) -> (u32, u32) {
        (self.0, self.1)
    }

    /// Atlas area as a rectangle.
    pub fn atlas_rect(&self) -> Rect {
        Rect::new(self.2, self.3, self.4 - self.2, self.5 - self.3)
    }
}

/// `[timestamp, changes]` for one recorded frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameEntry(pub u64, pub Vec<ChangeTuple>);

impl FrameEntry {
    pub fn timestamp(&self) -> u64 {
        self.0
    }

    pub fn changes(&self) -> &[ChangeTuple] {
        &self.1
    }
}

/// Ordered frame entries; frames without changes are absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FrameLog {
    pub frames: Vec<FrameEntry>,
}

impl FrameLog {
    /// Resolve every change against the placed sprites.
    pub fn resolve(records: &[FrameRecord], sprites: &[Sprite]) -> Result<Self> {
        let mut frames = Vec::with_capacity(records.len());
        for record in records {
            if record.changes.is_empty() {
                continue;
            }
            let mut changes = Vec::with_capacity(record.changes.len());
            for change in &record.changes {
                let sprite = sprites
                    .get(change.sprite_id)
                    .filter(|s| s.id == change.sprite_id)
                    .ok_or_else(|| {
                        DeltaError::Encode(format!(
                            "frame {} refers to unknown sprite {}",
                            record.timestamp, change.sprite_id
                        ))
                    })?;
                changes.push(ChangeTuple::new(change.x, change.y, &sprite.frame));
            }
            frames.push(FrameEntry(record.timestamp, changes));
        }
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total number of change tuples over all frames.
    pub fn num_changes(&self) -> usize {
        self.frames.iter().map(|f| f.1.len()).sum()
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| DeltaError::Encode(e.to_string()))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| DeltaError::Encode(e.to_string()))
    }
}

/// Compact log as a JSON value (top-level array).
pub fn to_json_compact(log: &FrameLog) -> Value {
    json!(log)
}

/// Log plus sprite table and atlas meta: `{ frames, sprites, meta }`.
pub fn to_json_manifest(log: &FrameLog, sprites: &[Sprite], meta: &Meta) -> Value {
    let sprites_val: Vec<Value> = sprites
        .iter()
        .map(|s| json!({"id": s.id, "x": s.frame.x, "y": s.frame.y, "w": s.frame.w, "h": s.frame.h}))
        .collect();
    json!({
        "frames": log,
        "sprites": sprites_val,
        "meta": meta,
    })
}
