//! Single-atlas layout: place every sprite into one rectangle of small area.
//!
//! The packing strategy only sees item sizes (`PackItems`) and returns a
//! `Layout` value; pixel data is composed afterwards.

use crate::config::{
    AlgorithmFamily, AutoMode, GuillotineChoice, GuillotineSplit, MaxRectsHeuristic,
    PackerConfig, SkylineHeuristic, SortOrder,
};
use crate::error::{DeltaError, Result};
use crate::model::Rect;
use crate::packer::build_packer;
use std::time::Instant;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Items the layout can place: a count and an index-stable size per item.
pub trait PackItems {
    fn count(&self) -> usize;
    fn size(&self, index: usize) -> (u32, u32);
}

impl PackItems for [(u32, u32)] {
    fn count(&self) -> usize {
        self.len()
    }
    fn size(&self, index: usize) -> (u32, u32) {
        self[index]
    }
}

impl PackItems for Vec<(u32, u32)> {
    fn count(&self) -> usize {
        self.len()
    }
    fn size(&self, index: usize) -> (u32, u32) {
        self[index]
    }
}

/// Top-left origin chosen for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub index: usize,
    pub x: u32,
    pub y: u32,
}

/// Result of a layout run. `placements[i]` belongs to item `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement>,
}

impl Layout {
    /// Absolute atlas rectangle of item `index`.
    pub fn rect<P: PackItems + ?Sized>(&self, items: &P, index: usize) -> Rect {
        let p = self.placements[index];
        let (w, h) = items.size(index);
        Rect::new(p.x, p.y, w, h)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

struct Candidate {
    cfg: PackerConfig,
    bin_w: u32,
}

#[instrument(skip_all, fields(items = items.count()))]
/// Place all `items` inside one atlas.
///
/// Several bin widths (and, for `Auto`, several algorithms) are tried; the
/// candidate with the smallest atlas area wins, ties going to the squarer one.
pub fn pack_layout<P: PackItems + ?Sized>(items: &P, cfg: &PackerConfig) -> Result<Layout> {
    cfg.validate()?;
    let n = items.count();
    if n == 0 {
        return Err(DeltaError::Empty);
    }

    let pad = cfg.texture_padding;
    let mut slots: Vec<(u32, u32)> = Vec::with_capacity(n);
    for i in 0..n {
        let (w, h) = items.size(i);
        if w == 0 || h == 0 {
            return Err(DeltaError::InvalidInput(format!("item {i} has zero size")));
        }
        match (w.checked_add(pad), h.checked_add(pad)) {
            (Some(sw), Some(sh)) => slots.push((sw, sh)),
            _ => {
                return Err(DeltaError::OutOfSpace {
                    placed: 0,
                    total: n,
                    max_width: cfg.max_width,
                    max_height: cfg.max_height,
                });
            }
        }
    }
    let order = sorted_order(&slots, &cfg.sort_order);

    let border = cfg.border_padding;
    let cap_w = cfg.max_width - border * 2;
    let cap_h = cfg.max_height - border * 2;
    let widest = slots.iter().map(|s| s.0).max().unwrap_or(0);
    let tallest = slots.iter().map(|s| s.1).max().unwrap_or(0);
    if widest > cap_w || tallest > cap_h {
        return Err(DeltaError::OutOfSpace {
            placed: 0,
            total: n,
            max_width: cfg.max_width,
            max_height: cfg.max_height,
        });
    }

    let candidates = build_candidates(cfg, &slots, widest, cap_w);
    let bin_h = slots
        .iter()
        .map(|s| s.1 as u64)
        .sum::<u64>()
        .min(cap_h as u64) as u32;
    debug!(candidates = candidates.len(), bin_h, "evaluating layouts");

    let run = |c: &Candidate| -> std::result::Result<Layout, usize> {
        run_candidate(&c.cfg, &slots, &order, c.bin_w, bin_h, border, pad)
    };
    let out_of_space = |placed: usize| DeltaError::OutOfSpace {
        placed,
        total: n,
        max_width: cfg.max_width,
        max_height: cfg.max_height,
    };

    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            let results: Vec<(usize, std::result::Result<Layout, usize>)> = candidates
                .par_iter()
                .enumerate()
                .map(|(i, c)| (i, run(c)))
                .collect();
            let mut most_placed = 0;
            let mut best: Option<(usize, Layout)> = None;
            for (i, r) in results {
                match r {
                    Ok(layout) => {
                        if best.as_ref().is_none_or(|(bi, b)| {
                            better(&layout, b) || (!better(b, &layout) && i < *bi)
                        }) {
                            best = Some((i, layout));
                        }
                    }
                    Err(placed) => most_placed = most_placed.max(placed),
                }
            }
            return best.map(|b| b.1).ok_or_else(|| out_of_space(most_placed));
        }
    }

    let budget_ms = cfg.time_budget_ms.unwrap_or(0);
    let start = Instant::now();
    let mut most_placed = 0;
    let mut best: Option<Layout> = None;
    for c in &candidates {
        if best.is_some() && budget_ms > 0 && start.elapsed().as_millis() as u64 > budget_ms {
            break;
        }
        match run(c) {
            Ok(layout) => {
                if best.as_ref().is_none_or(|b| better(&layout, b)) {
                    best = Some(layout);
                }
            }
            Err(placed) => most_placed = most_placed.max(placed),
        }
    }
    best.ok_or_else(|| out_of_space(most_placed))
}

fn better(a: &Layout, b: &Layout) -> bool {
    let key = |l: &Layout| (l.area(), l.width.max(l.height));
    key(a) < key(b)
}

fn sorted_order(slots: &[(u32, u32)], order: &SortOrder) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..slots.len()).collect();
    let area = |i: usize| slots[i].0 as u64 * slots[i].1 as u64;
    match order {
        SortOrder::None => {}
        SortOrder::AreaDesc => idx.sort_by(|&a, &b| area(b).cmp(&area(a))),
        SortOrder::MaxSideDesc => idx.sort_by(|&a, &b| {
            let (aw, ah) = slots[a];
            let (bw, bh) = slots[b];
            bw.max(bh).cmp(&aw.max(ah))
        }),
        SortOrder::HeightDesc => idx.sort_by(|&a, &b| slots[b].1.cmp(&slots[a].1)),
        SortOrder::WidthDesc => idx.sort_by(|&a, &b| slots[b].0.cmp(&slots[a].0)),
    }
    idx
}

/// Algorithm configs (one for a fixed family, a portfolio for `Auto`) crossed with bin widths.
fn build_candidates(
    base: &PackerConfig,
    slots: &[(u32, u32)],
    widest: u32,
    cap_w: u32,
) -> Vec<Candidate> {
    let mut algos: Vec<PackerConfig> = Vec::new();
    if matches!(base.family, AlgorithmFamily::Auto) {
        match base.auto_mode {
            AutoMode::Fast => {
                algos.push(variant(base, AlgorithmFamily::Skyline, |c| {
                    c.skyline_heuristic = SkylineHeuristic::BottomLeft
                }));
                algos.push(variant(base, AlgorithmFamily::MaxRects, |c| {
                    c.mr_heuristic = MaxRectsHeuristic::BestAreaFit
                }));
            }
            AutoMode::Quality => {
                algos.push(variant(base, AlgorithmFamily::Skyline, |c| {
                    c.skyline_heuristic = SkylineHeuristic::MinWaste
                }));
                for h in [
                    MaxRectsHeuristic::BestAreaFit,
                    MaxRectsHeuristic::BottomLeft,
                    MaxRectsHeuristic::ContactPoint,
                ] {
                    algos.push(variant(base, AlgorithmFamily::MaxRects, |c| {
                        c.mr_heuristic = h
                    }));
                }
                algos.push(variant(base, AlgorithmFamily::Guillotine, |c| {
                    c.g_choice = GuillotineChoice::BestAreaFit;
                    c.g_split = GuillotineSplit::SplitShorterLeftoverAxis;
                }));
            }
        }
    } else {
        algos.push(base.clone());
    }

    let total_area: u64 = slots.iter().map(|s| s.0 as u64 * s.1 as u64).sum();
    let side = (total_area as f64).sqrt().ceil() as u64;
    let mut widths: Vec<u32> = [
        widest as u64,
        side,
        side * 5 / 4,
        side * 3 / 2,
        side * 2,
    ]
    .into_iter()
    .map(|w| w.clamp(widest as u64, cap_w as u64) as u32)
    .collect();
    widths.sort_unstable();
    widths.dedup();

    let mut out = Vec::with_capacity(algos.len() * widths.len());
    for a in &algos {
        for &w in &widths {
            out.push(Candidate {
                cfg: a.clone(),
                bin_w: w,
            });
        }
    }
    out
}

fn variant(
    base: &PackerConfig,
    family: AlgorithmFamily,
    tweak: impl FnOnce(&mut PackerConfig),
) -> PackerConfig {
    let mut c = base.clone();
    c.family = family;
    tweak(&mut c);
    c
}

/// Pack every slot in `order`; on failure returns how many were placed.
fn run_candidate(
    cfg: &PackerConfig,
    slots: &[(u32, u32)],
    order: &[usize],
    bin_w: u32,
    bin_h: u32,
    border: u32,
    pad: u32,
) -> std::result::Result<Layout, usize> {
    let mut packer = build_packer(cfg, Rect::new(border, border, bin_w, bin_h));
    let pad_half = pad / 2;
    let mut placements = vec![Placement { index: 0, x: 0, y: 0 }; slots.len()];
    let (mut page_w, mut page_h) = (0u32, 0u32);
    for (placed, &i) in order.iter().enumerate() {
        let (w, h) = slots[i];
        let slot = packer.insert(w, h).ok_or(placed)?;
        placements[i] = Placement {
            index: i,
            x: slot.x + pad_half,
            y: slot.y + pad_half,
        };
        page_w = page_w.max(slot.x + slot.w + border);
        page_h = page_h.max(slot.y + slot.h + border);
    }
    if cfg.power_of_two {
        page_w = page_w.max(1).next_power_of_two();
        page_h = page_h.max(1).next_power_of_two();
    }
    if cfg.square {
        let m = page_w.max(page_h);
        page_w = m;
        page_h = m;
    }
    Ok(Layout {
        width: page_w,
        height: page_h,
        placements,
    })
}
