use deltacast_core::compositing::{blit_frame, crop_rgba};
use deltacast_core::prelude::*;
use deltacast_core::{DeltaError, to_json_compact};
use image::RgbaImage;
use rand::{Rng, SeedableRng};

const BG: Pixel = Pixel::new(0, 0, 0, 255);

/// Frames of a few solid squares jumping around a dark background.
fn moving_squares(seed: u64, w: u32, h: u32, frames: usize) -> Vec<(u64, RasterFrame)> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(frames);
    for i in 0..frames {
        let mut f = RasterFrame::filled(w, h, BG);
        for _ in 0..3 {
            let size = rng.gen_range(2..8);
            let x0 = rng.gen_range(0..w - size);
            let y0 = rng.gen_range(0..h - size);
            let c = Pixel::new(rng.gen_range(64..=255), rng.gen_range(64..=255), 200, 255);
            for y in y0..y0 + size {
                for x in x0..x0 + size {
                    f.set(x, y, c);
                }
            }
        }
        out.push((i as u64 * 250, f));
    }
    out
}

/// Replay the log onto a canvas and check it against every source frame.
fn replay(out: &DeltaOutput, frames: &[(u64, RasterFrame)]) {
    let (w, h) = frames[0].1.dimensions();
    let mut canvas = RgbaImage::new(w, h);
    let mut entries = out.log.frames.iter().peekable();
    for (ts, frame) in frames {
        if let Some(entry) = entries.next_if(|e| e.timestamp() == *ts) {
            for change in entry.changes() {
                let sprite = crop_rgba(&out.atlas, &change.atlas_rect());
                let (x, y) = change.origin();
                blit_frame(&sprite, &mut canvas, x, y);
            }
        }
        assert_eq!(&RasterFrame::from(&canvas), frame, "frame {ts} differs after replay");
    }
    assert!(entries.next().is_none());
}

#[test]
fn replaying_the_log_rebuilds_every_frame() {
    let frames = moving_squares(42, 48, 32, 12);
    // zero tolerance: every changed pixel is carried, so the replay is exact
    let cfg = DeltaConfig::builder().tolerance(0).build();
    let out = encode_frames(frames.clone(), cfg).unwrap();
    replay(&out, &frames);
}

#[test]
fn sprites_match_their_source_regions() {
    let frames = moving_squares(3, 40, 40, 6);
    let mut enc = DeltaEncoder::new(DeltaConfig::default()).unwrap();
    for (ts, f) in frames.iter().cloned() {
        enc.push_frame(ts, f).unwrap();
    }
    let sources: Vec<RasterFrame> = enc.sources().iter().cloned().collect();
    let out = enc.finish().unwrap();
    assert_eq!(out.sprites.len(), sources.len());
    for (sprite, src) in out.sprites.iter().zip(&sources) {
        assert_eq!(&crop_rgba(&out.atlas, &sprite.frame), src);
    }
}

#[test]
fn sprite_ids_follow_frame_then_region_order() {
    let frames = moving_squares(8, 32, 32, 8);
    let out = encode_frames(frames, DeltaConfig::default()).unwrap();
    let ids: Vec<usize> = out
        .records
        .iter()
        .flat_map(|r| r.changes.iter().map(|c| c.sprite_id))
        .collect();
    assert_eq!(ids, (0..out.sprites.len()).collect::<Vec<_>>());
}

#[test]
fn identical_frames_add_no_entries() {
    let f = RasterFrame::filled(16, 16, Pixel::new(10, 20, 30, 255));
    let frames: Vec<(u64, RasterFrame)> = (0..5).map(|i| (i * 100, f.clone())).collect();
    let out = encode_frames(frames, DeltaConfig::default()).unwrap();
    assert_eq!(out.log.len(), 1);
    assert_eq!(out.stats.num_frames, 5);
    assert_eq!(out.stats.num_records, 1);
    assert_eq!(out.sprites.len(), 1);
}

#[test]
fn single_pixel_change_in_4x4() {
    let a = RasterFrame::filled(4, 4, BG);
    let mut b = a.clone();
    b.set(2, 1, Pixel::new(255, 255, 255, 255));
    let out = encode_frames([(0, a), (250, b)], DeltaConfig::default()).unwrap();
    assert_eq!(out.log.len(), 2);
    let second = &out.log.frames[1];
    assert_eq!(second.timestamp(), 250);
    assert_eq!(second.changes().len(), 1);
    let c = second.changes()[0];
    assert_eq!(c.origin(), (0, 0));
    assert_eq!((c.atlas_rect().w, c.atlas_rect().h), (4, 4));
}

#[test]
fn compact_log_shape() {
    let a = RasterFrame::filled(6, 5, BG);
    let out = encode_frames([(1000, a)], DeltaConfig::default()).unwrap();
    assert_eq!(
        to_json_compact(&out.log),
        serde_json::json!([[1000, [[0, 0, 0, 0, 6, 5]]]])
    );
}

#[test]
fn mismatched_sizes_abort_the_run() {
    let frames = vec![
        (0, RasterFrame::filled(8, 8, BG)),
        (1, RasterFrame::filled(8, 9, BG)),
    ];
    let err = encode_frames(frames, DeltaConfig::default()).err().unwrap();
    assert!(matches!(
        err,
        DeltaError::DimensionMismatch {
            expected: (8, 8),
            found: (8, 9)
        }
    ));
}

#[test]
fn busy_frame_collapses_to_one_sprite() {
    let a = RasterFrame::filled(100, 100, BG);
    let mut b = a.clone();
    for i in 0..10 {
        for j in 0..6 {
            b.set(5 + 9 * i, 5 + 15 * j, Pixel::new(255, 0, 0, 255));
        }
    }
    let out = encode_frames([(0, a), (1, b)], DeltaConfig::default()).unwrap();
    assert_eq!(out.stats.num_collapsed, 1);
    assert_eq!(out.log.frames[1].changes().len(), 1);
    let c = out.log.frames[1].changes()[0];
    assert_eq!(c.origin(), (1, 1));
    assert_eq!((c.atlas_rect().w, c.atlas_rect().h), (90, 84));
}

#[test]
fn occupancy_is_consistent() {
    let frames = moving_squares(17, 64, 48, 10);
    let out = encode_frames(frames, DeltaConfig::default()).unwrap();
    let s = out.stats;
    assert_eq!(s.atlas_area, s.atlas_width as u64 * s.atlas_height as u64);
    assert_eq!(out.atlas.dimensions(), (s.atlas_width, s.atlas_height));
    assert!(s.occupancy > 0.0 && s.occupancy <= 1.0);
    assert_eq!(s.wasted_area(), s.atlas_area - s.used_area);
}
