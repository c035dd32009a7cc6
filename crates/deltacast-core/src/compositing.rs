use crate::extract::SpriteSources;
use crate::layout::Layout;
use crate::model::{Rect, Sprite};
use crate::raster::RasterFrame;
use image::RgbaImage;

/// Copy all of `src` into `canvas` with its top-left at (dx, dy).
///
/// Pixels falling outside the canvas are dropped.
pub fn blit_frame(src: &RasterFrame, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    for yy in 0..src.height() {
        let ty = dy + yy;
        if ty >= ch {
            break;
        }
        for (xx, px) in src.row(yy).iter().enumerate() {
            let tx = dx + xx as u32;
            if tx >= cw {
                break;
            }
            canvas.put_pixel(tx, ty, px.to_rgba());
        }
    }
}

/// Copy the `rect` area of `canvas` into a standalone frame.
pub fn crop_rgba(canvas: &RgbaImage, rect: &Rect) -> RasterFrame {
    let sub = image::imageops::crop_imm(canvas, rect.x, rect.y, rect.w, rect.h).to_image();
    RasterFrame::from(&sub)
}

/// Draw every sprite source at its layout position and return the atlas with its sprite table.
pub fn compose_atlas(sources: &SpriteSources, layout: &Layout) -> (RgbaImage, Vec<Sprite>) {
    let mut canvas = RgbaImage::new(layout.width, layout.height);
    let mut sprites = Vec::with_capacity(sources.len());
    for (id, src) in sources.iter().enumerate() {
        let frame = layout.rect(sources, id);
        blit_frame(src, &mut canvas, frame.x, frame.y);
        sprites.push(Sprite { id, frame });
    }
    (canvas, sprites)
}
