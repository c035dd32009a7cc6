use super::{Packer, leftovers, merge_adjacent, prune_contained};
use crate::config::{GuillotineChoice, GuillotineSplit};
use crate::model::Rect;

pub struct GuillotinePacker {
    free: Vec<Rect>,
    choice: GuillotineChoice,
    split: GuillotineSplit,
}

impl GuillotinePacker {
    pub fn new(bin: Rect, choice: GuillotineChoice, split: GuillotineSplit) -> Self {
        Self {
            free: vec![bin],
            choice,
            split,
        }
    }

    fn score(&self, fr: &Rect, w: u32, h: u32) -> i64 {
        let (area_fit, short_fit, long_fit) = leftovers(fr, w, h);
        match self.choice {
            GuillotineChoice::BestAreaFit => area_fit,
            GuillotineChoice::BestShortSideFit => short_fit,
            GuillotineChoice::BestLongSideFit => long_fit,
            GuillotineChoice::WorstAreaFit => -area_fit,
            GuillotineChoice::WorstShortSideFit => -short_fit,
            GuillotineChoice::WorstLongSideFit => -long_fit,
        }
    }

    fn choose(&self, w: u32, h: u32) -> Option<usize> {
        let mut best: Option<(i64, usize)> = None;
        for (i, fr) in self.free.iter().enumerate() {
            if fr.w < w || fr.h < h {
                continue;
            }
            let s = self.score(fr, w, h);
            if best.is_none_or(|(b, _)| s < b) {
                best = Some((s, i));
            }
        }
        best.map(|(_, i)| i)
    }

    /// Split what is left of `fr` after `placed` into a bottom and a right part.
    fn split_free(&self, fr: &Rect, placed: &Rect) -> [Rect; 2] {
        let w_right = fr.w - placed.w;
        let h_bottom = fr.h - placed.h;

        let horizontal = match self.split {
            GuillotineSplit::SplitShorterLeftoverAxis => h_bottom < w_right,
            GuillotineSplit::SplitLongerLeftoverAxis => h_bottom > w_right,
            GuillotineSplit::SplitMinimizeArea => {
                (w_right as u64 * fr.h as u64) <= (fr.w as u64 * h_bottom as u64)
            }
            GuillotineSplit::SplitMaximizeArea => {
                (w_right as u64 * fr.h as u64) >= (fr.w as u64 * h_bottom as u64)
            }
            GuillotineSplit::SplitShorterAxis => fr.h < fr.w,
            GuillotineSplit::SplitLongerAxis => fr.h > fr.w,
        };

        let bottom_w = if horizontal { fr.w } else { placed.w };
        let right_h = if horizontal { placed.h } else { fr.h };
        [
            Rect::new(fr.x, placed.y + placed.h, bottom_w, h_bottom),
            Rect::new(placed.x + placed.w, fr.y, w_right, right_h),
        ]
    }
}

impl Packer for GuillotinePacker {
    fn insert(&mut self, w: u32, h: u32) -> Option<Rect> {
        if w == 0 || h == 0 {
            return None;
        }
        let idx = self.choose(w, h)?;
        let fr = self.free.swap_remove(idx);
        let placed = Rect::new(fr.x, fr.y, w, h);
        for part in self.split_free(&fr, &placed) {
            if part.w > 0 && part.h > 0 {
                self.free.push(part);
            }
        }
        prune_contained(&mut self.free);
        merge_adjacent(&mut self.free);
        Some(placed)
    }
}
