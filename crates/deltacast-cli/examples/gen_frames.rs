use image::{Rgba, RgbaImage};
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::PathBuf;

const FONT_3X5: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 4]) {
    let (iw, ih) = img.dimensions();
    for py in y..(y + h).min(ih) {
        for px in x..(x + w).min(iw) {
            img.put_pixel(px, py, Rgba(color));
        }
    }
}

fn draw_number(img: &mut RgbaImage, x: u32, y: u32, n: usize, scale: u32) {
    let mut cx = x;
    for ch in n.to_string().chars() {
        if let Some(d) = ch.to_digit(10) {
            for (row_i, row) in FONT_3X5[d as usize].iter().enumerate() {
                for col in 0..3 {
                    if (row >> (2 - col)) & 1 == 1 {
                        let px = cx + col * scale;
                        let py = y + row_i as u32 * scale;
                        fill_rect(img, px, py, scale, scale, [240, 240, 240, 255]);
                    }
                }
            }
        }
        cx += 4 * scale;
    }
}

fn fill_disc(img: &mut RgbaImage, cx: i32, cy: i32, r: i32, color: [u8; 4]) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    for y in (cy - r).max(0)..(cy + r + 1).min(h) {
        for x in (cx - r).max(0)..(cx + r + 1).min(w) {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= r * r {
                img.put_pixel(x as u32, y as u32, Rgba(color));
            }
        }
    }
}

// Generate a synthetic screen recording: a bouncing ball, a frame counter,
// some still frames and an occasional burst of scattered sparks.
// Usage: cargo run --example gen_frames -p deltacast-cli -- <out_dir> [count]
fn main() -> anyhow::Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        anyhow::bail!("usage: gen_frames <out_dir> [count]");
    }
    let out = PathBuf::from(&args[0]);
    let count: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(60);
    fs::create_dir_all(&out)?;

    let (w, h) = (320u32, 200u32);
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xC0FFEE);
    let (mut bx, mut by, mut vx, mut vy) = (40i32, 50i32, 7i32, 5i32);
    let radius = 12;
    let mut timestamp: u64 = 1_700_000_000_000;
    let mut img = RgbaImage::from_pixel(w, h, Rgba([24, 28, 36, 255]));
    for i in 0..count {
        // every fifth frame is identical to the previous one
        if i % 5 != 4 {
            img = RgbaImage::from_pixel(w, h, Rgba([24, 28, 36, 255]));
            fill_rect(&mut img, 0, 0, w, 18, [48, 56, 72, 255]);
            draw_number(&mut img, 4, 4, i, 2);
            fill_disc(&mut img, bx, by, radius, [250, 180, 40, 255]);
            if i % 17 == 9 {
                for _ in 0..80 {
                    let x = rng.gen_range(0..w);
                    let y = rng.gen_range(20..h);
                    img.put_pixel(x, y, Rgba([rng.r#gen(), rng.r#gen(), 255, 255]));
                }
            }
            bx += vx;
            by += vy;
            if bx - radius < 0 || bx + radius >= w as i32 {
                vx = -vx;
            }
            if by - radius < 18 || by + radius >= h as i32 {
                vy = -vy;
            }
        }
        let path = out.join(format!("{timestamp}.png"));
        img.save(&path)?;
        timestamp += rng.gen_range(240..=260);
    }
    println!("Done. Wrote {} frames to {}", count, out.display());
    Ok(())
}
