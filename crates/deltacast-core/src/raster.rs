//! Decoded RGBA frames.

use crate::error::{DeltaError, Result};
use crate::model::Region;
use image::{DynamicImage, ImageReader, Rgba, RgbaImage};
use std::path::Path;

/// One RGBA sample with 8-bit channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Downscale a 16-bit-per-channel sample (`v / 257`).
    pub fn from_rgba16(c: [u16; 4]) -> Self {
        Self {
            r: (c[0] / 257) as u8,
            g: (c[1] / 257) as u8,
            b: (c[2] / 257) as u8,
            a: (c[3] / 257) as u8,
        }
    }

    /// Sum of absolute per-channel differences, in `0..=1020`.
    #[inline]
    pub fn distance(&self, other: &Pixel) -> u32 {
        self.r.abs_diff(other.r) as u32
            + self.g.abs_diff(other.g) as u32
            + self.b.abs_diff(other.b) as u32
            + self.a.abs_diff(other.a) as u32
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

/// Row-major grid of pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl RasterFrame {
    /// Frame of `width x height` filled with `fill`.
    pub fn filled(width: u32, height: u32, fill: Pixel) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        }
    }

    /// Build a frame from row-major pixels. Fails if the length does not match.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Pixel>) -> Result<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(DeltaError::InvalidInput(format!(
                "expected {} pixels for {}x{}, got {}",
                width as usize * height as usize,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a frame from rows. All rows must have equal length.
    pub fn from_rows(rows: Vec<Vec<Pixel>>) -> Result<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.len()).unwrap_or(0) as u32;
        if rows.iter().any(|r| r.len() as u32 != width) {
            return Err(DeltaError::InvalidInput("ragged rows".into()));
        }
        Self::from_pixels(width, height, rows.into_iter().flatten().collect())
    }

    pub fn from_image(img: &DynamicImage) -> Self {
        let rgba16 = img.to_rgba16();
        let (width, height) = rgba16.dimensions();
        let pixels = rgba16.pixels().map(|p| Pixel::from_rgba16(p.0)).collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Decode an image file into a frame.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = ImageReader::open(path.as_ref())?
            .with_guessed_format()?
            .decode()?;
        Ok(Self::from_image(&img))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Pixel {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, p: Pixel) {
        let w = self.width as usize;
        self.pixels[y as usize * w + x as usize] = p;
    }

    /// One row of pixels.
    pub fn row(&self, y: u32) -> &[Pixel] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }

    /// Copy the pixels of `region` into a new frame. The region must lie inside the frame.
    pub fn crop(&self, region: &Region) -> RasterFrame {
        debug_assert!(region.right < self.width && region.bottom < self.height);
        let (l, r) = (region.left as usize, region.right as usize + 1);
        let mut pixels = Vec::with_capacity(region.width() as usize * region.height() as usize);
        for y in region.top..=region.bottom {
            pixels.extend_from_slice(&self.row(y)[l..r]);
        }
        RasterFrame {
            width: region.width(),
            height: region.height(),
            pixels,
        }
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| self.get(x, y).to_rgba())
    }
}

impl From<&RgbaImage> for RasterFrame {
    fn from(img: &RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| Pixel::new(p[0], p[1], p[2], p[3]))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }
}
