use deltacast_core::prelude::*;
use deltacast_core::{ChangeDetector, collapse_regions, diff_mask};
use rand::{Rng, SeedableRng};

const BG: Pixel = Pixel::new(20, 40, 60, 255);
const FG: Pixel = Pixel::new(220, 10, 10, 255);

fn random_pair(rng: &mut rand::rngs::StdRng, w: u32, h: u32, changes: usize) -> (RasterFrame, RasterFrame) {
    let prev = RasterFrame::filled(w, h, BG);
    let mut cur = prev.clone();
    for _ in 0..changes {
        let x = rng.gen_range(0..w);
        let y = rng.gen_range(0..h);
        cur.set(x, y, FG);
    }
    (prev, cur)
}

#[test]
fn every_differing_pixel_is_covered() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
    let cfg = DiffConfig::default();
    let detector = ChangeDetector::new(&cfg);
    for _ in 0..20 {
        let w = rng.gen_range(8..64);
        let h = rng.gen_range(8..64);
        let n = rng.gen_range(1..40);
        let (prev, cur) = random_pair(&mut rng, w, h, n);
        let regions = detector.detect(&prev, &cur).unwrap();
        let mask = diff_mask(&prev, &cur, cfg.tolerance);
        for (i, &d) in mask.iter().enumerate() {
            if !d {
                continue;
            }
            let (x, y) = ((i as u32) % w, (i as u32) / w);
            assert!(
                regions.iter().any(|r| r.contains_point(x, y)),
                "pixel ({x},{y}) not covered"
            );
        }
        for r in &regions {
            assert!(r.left <= r.right && r.top <= r.bottom);
            assert!(r.right < w && r.bottom < h, "{r:?} escapes {w}x{h}");
        }
    }
}

#[test]
fn padding_is_clipped_to_frame() {
    let prev = RasterFrame::filled(4, 4, BG);
    let mut cur = prev.clone();
    cur.set(1, 2, FG);
    let regions = ChangeDetector::new(&DiffConfig::default())
        .detect(&prev, &cur)
        .unwrap();
    assert_eq!(regions, vec![Region::new(0, 0, 3, 3)]);
}

#[test]
fn padding_surrounds_tight_box_inside_large_frame() {
    let prev = RasterFrame::filled(40, 40, BG);
    let mut cur = prev.clone();
    cur.set(20, 10, FG);
    cur.set(21, 11, FG);
    let detector = ChangeDetector::new(&DiffConfig::default());
    assert_eq!(
        detector.components(&prev, &cur).unwrap(),
        vec![Region::new(10, 20, 11, 21)]
    );
    assert_eq!(
        detector.detect(&prev, &cur).unwrap(),
        vec![Region::new(6, 16, 15, 25)]
    );
}

#[test]
fn first_frame_is_whole_frame() {
    let frame = RasterFrame::filled(7, 3, BG);
    let detector = ChangeDetector::new(&DiffConfig::default());
    assert_eq!(detector.first_frame(&frame), vec![Region::new(0, 0, 2, 6)]);
}

#[test]
fn identical_frames_have_no_regions() {
    let frame = RasterFrame::filled(16, 16, BG);
    let detector = ChangeDetector::new(&DiffConfig::default());
    assert!(detector.detect(&frame, &frame.clone()).unwrap().is_empty());
}

#[test]
fn sixty_scattered_pixels_collapse_to_one() {
    let prev = RasterFrame::filled(100, 100, BG);
    let mut cur = prev.clone();
    for i in 0..10 {
        for j in 0..6 {
            cur.set(5 + 9 * i, 5 + 15 * j, FG);
        }
    }
    let cfg = DiffConfig::default();
    let regions = ChangeDetector::new(&cfg).detect(&prev, &cur).unwrap();
    assert_eq!(regions.len(), 60);
    let (out, collapsed) = collapse_regions(regions, cfg.collapse_threshold);
    assert!(collapsed);
    // tight union (5,5)-(86,80) padded by 4
    assert_eq!(out, vec![Region::new(1, 1, 84, 90)]);
}

#[test]
fn detection_is_deterministic() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let (prev, cur) = random_pair(&mut rng, 50, 30, 25);
    let detector = ChangeDetector::new(&DiffConfig::default());
    let a = detector.detect(&prev, &cur).unwrap();
    let b = detector.detect(&prev, &cur).unwrap();
    assert_eq!(a, b);
}

#[test]
fn cross_connectivity_splits_diagonals() {
    let prev = RasterFrame::filled(10, 10, BG);
    let mut cur = prev.clone();
    cur.set(3, 3, FG);
    cur.set(4, 4, FG);
    let window = ChangeDetector::new(&DiffConfig::default());
    let cross = ChangeDetector::new(&DiffConfig {
        connectivity: Connectivity::Cross,
        ..Default::default()
    });
    assert_eq!(window.components(&prev, &cur).unwrap().len(), 1);
    assert_eq!(cross.components(&prev, &cur).unwrap().len(), 2);
}

fn offsets_for(cfg: &DiffConfig) -> Vec<(i32, i32)> {
    match cfg.connectivity {
        Connectivity::Cross => vec![(0, 1), (0, -1), (1, 0), (-1, 0)],
        Connectivity::Window => {
            let r = cfg.neighborhood_radius as i32;
            (-r..=r)
                .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
                .filter(|&o| o != (0, 0))
                .collect()
        }
    }
}

// Grow the group holding (x, y) over the mask and return its bounding box.
fn grow(mask: &[bool], w: u32, h: u32, x: u32, y: u32, offsets: &[(i32, i32)]) -> Region {
    let mut seen = vec![false; mask.len()];
    let mut stack = vec![(x, y)];
    seen[(y * w + x) as usize] = true;
    let mut bounds = Region::point(x, y);
    while let Some((cx, cy)) = stack.pop() {
        bounds.include(cx, cy);
        for &(dx, dy) in offsets {
            let (nx, ny) = (cx as i32 + dx, cy as i32 + dy);
            if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                continue;
            }
            let i = (ny as u32 * w + nx as u32) as usize;
            if mask[i] && !seen[i] {
                seen[i] = true;
                stack.push((nx as u32, ny as u32));
            }
        }
    }
    bounds
}

#[test]
fn tight_boxes_are_single_reachable_groups() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xb0c5);
    let configs = [
        DiffConfig::default(),
        DiffConfig {
            connectivity: Connectivity::Cross,
            ..Default::default()
        },
        DiffConfig {
            neighborhood_radius: 1,
            ..Default::default()
        },
    ];
    for cfg in &configs {
        let detector = ChangeDetector::new(cfg);
        let offsets = offsets_for(cfg);
        for _ in 0..25 {
            let w = rng.gen_range(6..48);
            let h = rng.gen_range(6..48);
            let n = rng.gen_range(1..60);
            let (prev, cur) = random_pair(&mut rng, w, h, n);
            let mask = diff_mask(&prev, &cur, cfg.tolerance);
            let at = |x: u32, y: u32| mask[(y * w + x) as usize];
            let boxes = detector.components(&prev, &cur).unwrap();
            for b in &boxes {
                // every edge of a tight box touches a differing pixel
                assert!((b.left..=b.right).any(|x| at(x, b.top)), "{b:?} top");
                assert!((b.left..=b.right).any(|x| at(x, b.bottom)), "{b:?} bottom");
                assert!((b.top..=b.bottom).any(|y| at(b.left, y)), "{b:?} left");
                assert!((b.top..=b.bottom).any(|y| at(b.right, y)), "{b:?} right");

                // the group reached from a differing pixel on its top edge spans exactly the box
                let x = (b.left..=b.right).find(|&x| at(x, b.top)).unwrap();
                assert_eq!(grow(&mask, w, h, x, b.top, &offsets), *b);
            }
            // every differing pixel's group is one of the reported boxes
            let key = |r: &Region| (r.top, r.left, r.bottom, r.right);
            let mut reported: Vec<_> = boxes.iter().map(key).collect();
            reported.sort_unstable();
            let mut grown: Vec<_> = (0..mask.len() as u32)
                .filter(|&i| mask[i as usize])
                .map(|i| key(&grow(&mask, w, h, i % w, i / w, &offsets)))
                .collect();
            grown.sort_unstable();
            grown.dedup();
            reported.dedup();
            assert_eq!(reported, grown);
        }
    }
}
