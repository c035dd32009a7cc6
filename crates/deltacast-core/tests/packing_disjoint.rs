use deltacast_core::config::{
    AlgorithmFamily, GuillotineChoice, GuillotineSplit, MaxRectsHeuristic, PackerConfig,
    SkylineHeuristic,
};
use deltacast_core::layout::{Layout, pack_layout};
use deltacast_core::model::Rect;
use rand::{Rng, SeedableRng};

fn random_sizes(seed: u64, n: usize) -> Vec<(u32, u32)> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (rng.gen_range(1..80), rng.gen_range(1..80)))
        .collect()
}

fn assert_valid(layout: &Layout, items: &Vec<(u32, u32)>) {
    let rects: Vec<Rect> = (0..items.len()).map(|i| layout.rect(items, i)).collect();
    for (i, r) in rects.iter().enumerate() {
        assert_eq!(layout.placements[i].index, i);
        assert!(
            r.x + r.w <= layout.width && r.y + r.h <= layout.height,
            "{r:?} outside {}x{}",
            layout.width,
            layout.height
        );
    }
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            assert!(!rects[i].overlaps(&rects[j]), "{:?} vs {:?}", rects[i], rects[j]);
        }
    }
    let used: u64 = items.iter().map(|&(w, h)| w as u64 * h as u64).sum();
    assert!(layout.area() >= used);
}

fn configs() -> Vec<PackerConfig> {
    let mut out = Vec::new();
    for h in [SkylineHeuristic::BottomLeft, SkylineHeuristic::MinWaste] {
        out.push(PackerConfig {
            family: AlgorithmFamily::Skyline,
            skyline_heuristic: h,
            ..Default::default()
        });
    }
    for h in [
        MaxRectsHeuristic::BestAreaFit,
        MaxRectsHeuristic::BestShortSideFit,
        MaxRectsHeuristic::BestLongSideFit,
        MaxRectsHeuristic::BottomLeft,
        MaxRectsHeuristic::ContactPoint,
    ] {
        out.push(PackerConfig {
            family: AlgorithmFamily::MaxRects,
            mr_heuristic: h,
            ..Default::default()
        });
    }
    for (c, s) in [
        (GuillotineChoice::BestAreaFit, GuillotineSplit::SplitShorterLeftoverAxis),
        (GuillotineChoice::BestShortSideFit, GuillotineSplit::SplitMinimizeArea),
        (GuillotineChoice::WorstAreaFit, GuillotineSplit::SplitLongerAxis),
    ] {
        out.push(PackerConfig {
            family: AlgorithmFamily::Guillotine,
            g_choice: c,
            g_split: s,
            ..Default::default()
        });
    }
    out.push(PackerConfig::default());
    out
}

#[test]
fn every_family_places_disjoint_rects() {
    for (seed, n) in [(1u64, 5usize), (2, 40), (3, 120)] {
        let items = random_sizes(seed, n);
        for cfg in configs() {
            let layout = pack_layout(&items, &cfg)
                .unwrap_or_else(|e| panic!("{:?} failed: {e}", cfg.family));
            assert_valid(&layout, &items);
        }
    }
}

#[test]
fn padding_keeps_gaps_between_sprites() {
    let items = random_sizes(11, 30);
    let cfg = PackerConfig {
        texture_padding: 2,
        border_padding: 3,
        ..Default::default()
    };
    let layout = pack_layout(&items, &cfg).unwrap();
    assert_valid(&layout, &items);
    // padding is split around the sprite: one pixel before, one after
    let slots: Vec<Rect> = (0..items.len())
        .map(|i| {
            let r = layout.rect(&items, i);
            Rect::new(r.x - 1, r.y - 1, r.w + 2, r.h + 2)
        })
        .collect();
    for (i, s) in slots.iter().enumerate() {
        assert!(s.x >= 3 && s.y >= 3);
        assert!(s.x + s.w + 3 <= layout.width && s.y + s.h + 3 <= layout.height);
        for o in &slots[i + 1..] {
            assert!(!s.overlaps(o));
        }
    }
}

#[test]
fn pow2_and_square_round_dimensions() {
    let items = random_sizes(5, 12);
    let cfg = PackerConfig {
        power_of_two: true,
        square: true,
        ..Default::default()
    };
    let layout = pack_layout(&items, &cfg).unwrap();
    assert!(layout.width.is_power_of_two());
    assert_eq!(layout.width, layout.height);
    assert_valid(&layout, &items);
}

#[test]
fn same_input_same_layout() {
    let items = random_sizes(99, 60);
    let cfg = PackerConfig::default();
    assert_eq!(pack_layout(&items, &cfg).unwrap(), pack_layout(&items, &cfg).unwrap());
}

#[test]
fn atlas_cap_is_respected() {
    let items = vec![(60, 60); 4];
    let cfg = PackerConfig {
        max_width: 128,
        max_height: 128,
        ..Default::default()
    };
    let layout = pack_layout(&items, &cfg).unwrap();
    assert!(layout.width <= 128 && layout.height <= 128);
    assert_valid(&layout, &items);

    let too_many = vec![(60, 60); 5];
    assert!(pack_layout(&too_many, &cfg).is_err());
}
