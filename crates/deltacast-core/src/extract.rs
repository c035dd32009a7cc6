use crate::layout::PackItems;
use crate::model::{Change, Region};
use crate::raster::RasterFrame;

/// Sprite sources gathered over a whole run, in frame-then-region order.
///
/// The index of a source is its sprite id.
#[derive(Debug, Default, Clone)]
pub struct SpriteSources {
    sources: Vec<RasterFrame>,
}

impl SpriteSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crop every region out of `frame`, append the crops and return one `Change` per region.
    pub fn extract(&mut self, frame: &RasterFrame, regions: &[Region]) -> Vec<Change> {
        regions
            .iter()
            .map(|region| {
                let sprite_id = self.sources.len();
                self.sources.push(frame.crop(region));
                Change {
                    x: region.left,
                    y: region.top,
                    sprite_id,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&RasterFrame> {
        self.sources.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RasterFrame> {
        self.sources.iter()
    }

    /// Sum of sprite areas in pixels.
    pub fn total_area(&self) -> u64 {
        self.sources
            .iter()
            .map(|s| s.width() as u64 * s.height() as u64)
            .sum()
    }
}

impl PackItems for SpriteSources {
    fn count(&self) -> usize {
        self.sources.len()
    }

    fn size(&self, index: usize) -> (u32, u32) {
        self.sources[index].dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Pixel;

    #[test]
    fn ids_follow_accumulation_order() {
        let frame = RasterFrame::filled(10, 10, Pixel::new(1, 2, 3, 4));
        let mut acc = SpriteSources::new();
        let a = acc.extract(&frame, &[Region::full(10, 10)]);
        let b = acc.extract(&frame, &[Region::new(1, 2, 3, 4), Region::new(5, 5, 9, 9)]);
        assert_eq!(a[0].sprite_id, 0);
        assert_eq!(b.iter().map(|c| c.sprite_id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!((b[0].x, b[0].y), (2, 1));
        assert_eq!(acc.size(1), (3, 3));
        assert_eq!(acc.total_area(), 100 + 9 + 25);
    }
}
