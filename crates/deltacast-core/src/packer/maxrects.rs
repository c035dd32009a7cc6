use super::{Packer, intersects, leftovers, overlap_1d, prune_contained};
use crate::config::MaxRectsHeuristic;
use crate::model::Rect;

pub struct MaxRectsPacker {
    bin: Rect,
    free: Vec<Rect>,
    used: Vec<Rect>,
    heuristic: MaxRectsHeuristic,
}

impl MaxRectsPacker {
    pub fn new(bin: Rect, heuristic: MaxRectsHeuristic) -> Self {
        Self {
            bin,
            free: vec![bin],
            used: Vec::new(),
            heuristic,
        }
    }

    fn place_rect(&mut self, node: &Rect) {
        let mut next: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in &self.free {
            if !intersects(fr, node) {
                next.push(*fr);
                continue;
            }
            let fr_x2 = fr.x + fr.w;
            let fr_y2 = fr.y + fr.h;
            let n_x2 = node.x + node.w;
            let n_y2 = node.y + node.h;

            // maximal leftovers on each side of the node
            if node.x > fr.x {
                next.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
            }
            if n_x2 < fr_x2 {
                next.push(Rect::new(n_x2, fr.y, fr_x2 - n_x2, fr.h));
            }
            if node.y > fr.y {
                next.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
            }
            if n_y2 < fr_y2 {
                next.push(Rect::new(fr.x, n_y2, fr.w, fr_y2 - n_y2));
            }
        }
        self.free = next;
        prune_contained(&mut self.free);
        self.used.push(*node);
    }

    fn score(&self, fr: &Rect, w: u32, h: u32) -> (i64, i64) {
        let (area_fit, short_fit, long_fit) = leftovers(fr, w, h);
        match self.heuristic {
            MaxRectsHeuristic::BestAreaFit => (area_fit, short_fit),
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BestLongSideFit => (long_fit, short_fit),
            MaxRectsHeuristic::BottomLeft => ((fr.y + h) as i64, fr.x as i64),
            MaxRectsHeuristic::ContactPoint => {
                // more contact is better; negate to keep minimising
                let contact = self.contact_score(&Rect::new(fr.x, fr.y, w, h));
                (-(contact as i64), area_fit)
            }
        }
    }

    fn find_position(&self, w: u32, h: u32) -> Option<Rect> {
        let mut best: Option<((i64, i64, u32, u32), Rect)> = None;
        for fr in &self.free {
            if fr.w < w || fr.h < h {
                continue;
            }
            if fr.w == w && fr.h == h {
                return Some(Rect::new(fr.x, fr.y, w, h));
            }
            let (s1, s2) = self.score(fr, w, h);
            // ties: lower top edge, then leftmost
            let key = (s1, s2, fr.y + h, fr.x);
            if best.as_ref().is_none_or(|(k, _)| key < *k) {
                best = Some((key, Rect::new(fr.x, fr.y, w, h)));
            }
        }
        best.map(|(_, r)| r)
    }

    fn contact_score(&self, node: &Rect) -> u32 {
        let mut score = 0u32;
        let bin_right = self.bin.x + self.bin.w;
        let bin_bottom = self.bin.y + self.bin.h;
        if node.x == self.bin.x || node.x + node.w == bin_right {
            score += node.h;
        }
        if node.y == self.bin.y || node.y + node.h == bin_bottom {
            score += node.w;
        }
        for u in &self.used {
            if node.x == u.x + u.w || u.x == node.x + node.w {
                score += overlap_1d(node.y, node.y + node.h, u.y, u.y + u.h);
            }
            if node.y == u.y + u.h || u.y == node.y + node.h {
                score += overlap_1d(node.x, node.x + node.w, u.x, u.x + u.w);
            }
        }
        score
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }
}

impl Packer for MaxRectsPacker {
    fn insert(&mut self, w: u32, h: u32) -> Option<Rect> {
        if w == 0 || h == 0 {
            return None;
        }
        let place = self.find_position(w, h)?;
        self.place_rect(&place);
        Some(place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_fit_fills_bin() {
        let mut p = MaxRectsPacker::new(Rect::new(0, 0, 8, 8), MaxRectsHeuristic::BestAreaFit);
        let mut placed = Vec::new();
        for _ in 0..4 {
            placed.push(p.insert(4, 4).expect("fits"));
        }
        assert!(p.insert(1, 1).is_none());
        assert_eq!(p.free_list_len(), 0);
        for i in 0..placed.len() {
            for j in i + 1..placed.len() {
                assert!(!placed[i].overlaps(&placed[j]));
            }
        }
    }
}
