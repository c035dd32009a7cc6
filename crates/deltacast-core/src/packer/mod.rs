use crate::config::{AlgorithmFamily, PackerConfig};
use crate::model::Rect;

pub mod guillotine;
pub mod maxrects;
pub mod skyline;

/// A packer reserves slots inside a fixed bin.
///
/// Implementations must never hand out overlapping slots or slots outside the bin.
/// `insert` returns `None` when the slot does not fit anywhere.
pub trait Packer {
    fn insert(&mut self, w: u32, h: u32) -> Option<Rect>;
}

/// Build the packer selected by `cfg.family` over `bin`.
///
/// `Auto` is resolved by the layout portfolio before a packer is built.
pub fn build_packer(cfg: &PackerConfig, bin: Rect) -> Box<dyn Packer + Send> {
    match cfg.family {
        AlgorithmFamily::Skyline => {
            Box::new(skyline::SkylinePacker::new(bin, cfg.skyline_heuristic.clone()))
        }
        AlgorithmFamily::MaxRects | AlgorithmFamily::Auto => {
            Box::new(maxrects::MaxRectsPacker::new(bin, cfg.mr_heuristic.clone()))
        }
        AlgorithmFamily::Guillotine => Box::new(guillotine::GuillotinePacker::new(
            bin,
            cfg.g_choice.clone(),
            cfg.g_split.clone(),
        )),
    }
}

#[inline]
pub(crate) fn intersects(a: &Rect, b: &Rect) -> bool {
    a.overlaps(b)
}

/// Drop every rectangle fully contained in another one.
pub(crate) fn prune_contained(free: &mut Vec<Rect>) {
    let mut i = 0;
    while i < free.len() {
        let a = free[i];
        let mut remove_i = false;
        let mut j = i + 1;
        while j < free.len() {
            let b = free[j];
            if b.contains(&a) {
                remove_i = true;
                break;
            }
            if a.contains(&b) {
                free.remove(j);
                continue;
            }
            j += 1;
        }
        if remove_i {
            free.remove(i);
        } else {
            i += 1;
        }
    }
}

/// Merge pairs that share a full edge, until no pair does.
pub(crate) fn merge_adjacent(free: &mut Vec<Rect>) {
    let mut merged = true;
    while merged {
        merged = false;
        'outer: for i in 0..free.len() {
            for j in i + 1..free.len() {
                if let Some(m) = join(&free[i], &free[j]) {
                    free[i] = m;
                    free.remove(j);
                    merged = true;
                    break 'outer;
                }
            }
        }
    }
}

fn join(a: &Rect, b: &Rect) -> Option<Rect> {
    if a.y == b.y && a.h == b.h {
        if a.x + a.w == b.x {
            return Some(Rect::new(a.x, a.y, a.w + b.w, a.h));
        }
        if b.x + b.w == a.x {
            return Some(Rect::new(b.x, a.y, a.w + b.w, a.h));
        }
    }
    if a.x == b.x && a.w == b.w {
        if a.y + a.h == b.y {
            return Some(Rect::new(a.x, a.y, a.w, a.h + b.h));
        }
        if b.y + b.h == a.y {
            return Some(Rect::new(a.x, b.y, a.w, a.h + b.h));
        }
    }
    None
}

pub(crate) fn overlap_1d(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    a2.min(b2).saturating_sub(a1.max(b1))
}

/// Fit scores shared by the free-list packers: (area, short side, long side) leftovers.
pub(crate) fn leftovers(fr: &Rect, w: u32, h: u32) -> (i64, i64, i64) {
    let leftover_h = (fr.w as i64 - w as i64).abs();
    let leftover_v = (fr.h as i64 - h as i64).abs();
    let area_fit = fr.area() as i64 - (w as i64 * h as i64);
    (
        area_fit,
        leftover_h.min(leftover_v),
        leftover_h.max(leftover_v),
    )
}
