use super::Packer;
use crate::config::SkylineHeuristic;
use crate::model::Rect;

#[derive(Clone, Copy, Debug)]
struct SkylineNode {
    x: u32,
    y: u32,
    w: u32,
}

impl SkylineNode {
    #[inline]
    fn right_ex(&self) -> u32 {
        self.x + self.w
    }
}

pub struct SkylinePacker {
    bin: Rect,
    skylines: Vec<SkylineNode>,
    heuristic: SkylineHeuristic,
}

impl SkylinePacker {
    pub fn new(bin: Rect, heuristic: SkylineHeuristic) -> Self {
        Self {
            bin,
            skylines: vec![SkylineNode {
                x: bin.x,
                y: bin.y,
                w: bin.w,
            }],
            heuristic,
        }
    }

    /// Lowest position for a `w x h` slot whose left edge sits on segment `i`.
    fn fit_at(&self, mut i: usize, w: u32, h: u32) -> Option<Rect> {
        let mut rect = Rect::new(self.skylines[i].x, self.bin.y, w, h);
        let mut width_left = w;
        loop {
            rect.y = rect.y.max(self.skylines[i].y);
            if !self.bin.contains(&rect) {
                return None;
            }
            if self.skylines[i].w >= width_left {
                return Some(rect);
            }
            width_left -= self.skylines[i].w;
            i += 1;
            if i >= self.skylines.len() {
                return None;
            }
        }
    }

    /// Area trapped below a slot placed from segment `start`.
    fn wasted_area(&self, start: usize, r: &Rect) -> u64 {
        let mut area = 0u64;
        let mut width_left = r.w;
        for seg in &self.skylines[start..] {
            if width_left == 0 {
                break;
            }
            let used = width_left.min(seg.w);
            area += (r.y - seg.y.min(r.y)) as u64 * used as u64;
            width_left -= used;
        }
        area
    }

    fn find(&self, w: u32, h: u32) -> Option<(usize, Rect)> {
        let mut best: Option<(u64, u32, u32, usize, Rect)> = None;
        for i in 0..self.skylines.len() {
            let Some(r) = self.fit_at(i, w, h) else {
                continue;
            };
            let key = match self.heuristic {
                SkylineHeuristic::BottomLeft => (r.bottom() as u64, self.skylines[i].w, r.x),
                SkylineHeuristic::MinWaste => (self.wasted_area(i, &r), r.bottom(), r.x),
            };
            let better = match &best {
                None => true,
                Some((a, b, c, _, _)) => key < (*a, *b, *c),
            };
            if better {
                best = Some((key.0, key.1, key.2, i, r));
            }
        }
        best.map(|(_, _, _, i, r)| (i, r))
    }

    fn add_level(&mut self, index: usize, rect: &Rect) {
        self.skylines.insert(
            index,
            SkylineNode {
                x: rect.x,
                y: rect.y + rect.h,
                w: rect.w,
            },
        );
        let covered_to = rect.x + rect.w;
        let i = index + 1;
        while i < self.skylines.len() {
            let seg = self.skylines[i];
            if seg.x >= covered_to {
                break;
            }
            if seg.right_ex() <= covered_to {
                self.skylines.remove(i);
            } else {
                let shrink = covered_to - seg.x;
                self.skylines[i].x += shrink;
                self.skylines[i].w -= shrink;
                break;
            }
        }
        self.merge_levels();
    }

    fn merge_levels(&mut self) {
        let mut i = 1;
        while i < self.skylines.len() {
            if self.skylines[i - 1].y == self.skylines[i].y {
                self.skylines[i - 1].w += self.skylines[i].w;
                self.skylines.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

impl Packer for SkylinePacker {
    fn insert(&mut self, w: u32, h: u32) -> Option<Rect> {
        if w == 0 || h == 0 {
            return None;
        }
        let (i, place) = self.find(w, h)?;
        self.add_level(i, &place);
        Some(place)
    }
}
