use crate::collapse::collapse_regions;
use crate::compositing::compose_atlas;
use crate::config::DeltaConfig;
use crate::detect::ChangeDetector;
use crate::encode::FrameLog;
use crate::error::{DeltaError, Result};
use crate::extract::SpriteSources;
use crate::layout::pack_layout;
use crate::model::{EncodeStats, FrameRecord, Meta, Sprite};
use crate::raster::RasterFrame;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, trace};

/// Regions logged individually per frame at trace level.
const TRACE_REGIONS: usize = 20;

/// One input file and its capture time in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFile {
    pub path: PathBuf,
    pub timestamp: u64,
}

impl FrameFile {
    pub fn new(path: impl Into<PathBuf>, timestamp: u64) -> Self {
        Self {
            path: path.into(),
            timestamp,
        }
    }
}

/// Output of an encoding run: atlas pixels, sprite table, frame log and stats.
pub struct DeltaOutput {
    pub atlas: RgbaImage,
    pub sprites: Vec<Sprite>,
    pub records: Vec<FrameRecord>,
    pub log: FrameLog,
    pub meta: Meta,
    pub stats: EncodeStats,
}

/// Incremental encoder: push frames in timestamp order, then `finish`.
///
/// Only the previous frame is retained between pushes; sprite sources and
/// frame records accumulate until `finish` packs them into one atlas.
pub struct DeltaEncoder {
    cfg: DeltaConfig,
    detector: ChangeDetector,
    prev: Option<RasterFrame>,
    sources: SpriteSources,
    records: Vec<FrameRecord>,
    last_timestamp: Option<u64>,
    num_frames: usize,
    num_collapsed: usize,
}

impl DeltaEncoder {
    pub fn new(cfg: DeltaConfig) -> Result<Self> {
        cfg.validate()?;
        let detector = ChangeDetector::new(&cfg.diff);
        Ok(Self {
            cfg,
            detector,
            prev: None,
            sources: SpriteSources::new(),
            records: Vec::new(),
            last_timestamp: None,
            num_frames: 0,
            num_collapsed: 0,
        })
    }

    pub fn config(&self) -> &DeltaConfig {
        &self.cfg
    }

    /// Working size of the run, set by the first frame.
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.prev.as_ref().map(|f| f.dimensions())
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn sources(&self) -> &SpriteSources {
        &self.sources
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    /// Diff `frame` against the previous one and record its changes.
    ///
    /// Returns the number of changes recorded for this frame (zero means the
    /// frame is absent from the log).
    pub fn push_frame(&mut self, timestamp: u64, frame: RasterFrame) -> Result<usize> {
        if let Some(last) = self.last_timestamp.filter(|&last| timestamp < last) {
            return Err(DeltaError::InvalidInput(format!(
                "timestamp {timestamp} is earlier than previous frame {last}"
            )));
        }
        if frame.width() == 0 || frame.height() == 0 {
            return Err(DeltaError::InvalidDimensions {
                width: frame.width(),
                height: frame.height(),
            });
        }

        let regions = match &self.prev {
            None => self.detector.first_frame(&frame),
            Some(prev) => {
                let regions = self.detector.detect(prev, &frame)?;
                let found = regions.len();
                let (regions, collapsed) =
                    collapse_regions(regions, self.cfg.diff.collapse_threshold);
                if collapsed {
                    self.num_collapsed += 1;
                    info!(timestamp, regions = found, "collapsed regions into one");
                }
                regions
            }
        };
        debug!(timestamp, regions = regions.len(), "frame diffed");
        for r in regions.iter().take(TRACE_REGIONS) {
            trace!(
                top = r.top,
                left = r.left,
                bottom = r.bottom,
                right = r.right,
                "region"
            );
        }

        let changes = self.sources.extract(&frame, &regions);
        let n = changes.len();
        if n > 0 {
            self.records.push(FrameRecord { timestamp, changes });
        }
        self.prev = Some(frame);
        self.last_timestamp = Some(timestamp);
        self.num_frames += 1;
        Ok(n)
    }

    /// Decode `path` and push it.
    pub fn push_file(&mut self, path: impl AsRef<Path>, timestamp: u64) -> Result<usize> {
        let frame = RasterFrame::open(path)?;
        self.push_frame(timestamp, frame)
    }

    /// Pack every sprite source into one atlas and resolve the frame log.
    #[instrument(skip_all, fields(frames = self.num_frames, sprites = self.sources.len()))]
    pub fn finish(self) -> Result<DeltaOutput> {
        let frame_size = match &self.prev {
            Some(f) => f.dimensions(),
            None => return Err(DeltaError::Empty),
        };
        let layout = pack_layout(&self.sources, &self.cfg.packer)?;
        let (atlas, sprites) = compose_atlas(&self.sources, &layout);
        let log = FrameLog::resolve(&self.records, &sprites)?;

        let atlas_area = layout.area();
        let used_area = self.sources.total_area();
        let stats = EncodeStats {
            num_frames: self.num_frames,
            num_records: self.records.len(),
            num_sprites: sprites.len(),
            num_collapsed: self.num_collapsed,
            atlas_width: layout.width,
            atlas_height: layout.height,
            atlas_area,
            used_area,
            occupancy: if atlas_area == 0 {
                0.0
            } else {
                used_area as f64 / atlas_area as f64
            },
        };
        let diff = &self.cfg.diff;
        let meta = Meta {
            schema_version: "1".into(),
            app: "deltacast".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            format: "RGBA8888".into(),
            size: (layout.width, layout.height),
            frame_size,
            tolerance: diff.tolerance,
            connectivity: diff.connectivity.as_str().into(),
            neighborhood_radius: diff.neighborhood_radius,
            region_margin: diff.region_margin,
            collapse_threshold: diff.collapse_threshold,
        };
        info!(
            atlas_w = layout.width,
            atlas_h = layout.height,
            records = stats.num_records,
            "encoding finished"
        );
        Ok(DeltaOutput {
            atlas,
            sprites,
            records: self.records,
            log,
            meta,
            stats,
        })
    }
}

/// Encode in-memory frames given as `(timestamp, frame)` pairs in order.
#[instrument(skip_all)]
pub fn encode_frames<I>(frames: I, cfg: DeltaConfig) -> Result<DeltaOutput>
where
    I: IntoIterator<Item = (u64, RasterFrame)>,
{
    let mut enc = DeltaEncoder::new(cfg)?;
    for (timestamp, frame) in frames {
        enc.push_frame(timestamp, frame)?;
    }
    enc.finish()
}

/// Decode and encode `files`, which must already be sorted by timestamp.
#[instrument(skip_all, fields(files = files.len()))]
pub fn encode_files(files: &[FrameFile], cfg: DeltaConfig) -> Result<DeltaOutput> {
    let mut enc = DeltaEncoder::new(cfg)?;
    for f in files {
        enc.push_file(&f.path, f.timestamp)?;
    }
    enc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Pixel;

    const BLACK: Pixel = Pixel::new(0, 0, 0, 255);

    #[test]
    fn first_frame_is_one_full_sprite() {
        let out = encode_frames([(10, RasterFrame::filled(8, 6, BLACK))], DeltaConfig::default())
            .unwrap();
        assert_eq!(out.sprites.len(), 1);
        assert_eq!(out.sprites[0].frame.w, 8);
        assert_eq!(out.sprites[0].frame.h, 6);
        assert_eq!(out.log.len(), 1);
        assert_eq!(out.stats.num_records, 1);
        assert_eq!(out.meta.frame_size, (8, 6));
    }

    #[test]
    fn unchanged_frame_is_skipped() {
        let mut enc = DeltaEncoder::new(DeltaConfig::default()).unwrap();
        assert_eq!(enc.push_frame(0, RasterFrame::filled(4, 4, BLACK)).unwrap(), 1);
        assert_eq!(enc.push_frame(250, RasterFrame::filled(4, 4, BLACK)).unwrap(), 0);
        let out = enc.finish().unwrap();
        assert_eq!(out.stats.num_frames, 2);
        assert_eq!(out.log.len(), 1);
    }

    #[test]
    fn size_change_aborts() {
        let mut enc = DeltaEncoder::new(DeltaConfig::default()).unwrap();
        enc.push_frame(0, RasterFrame::filled(4, 4, BLACK)).unwrap();
        let err = enc.push_frame(1, RasterFrame::filled(5, 4, BLACK)).unwrap_err();
        assert!(matches!(err, DeltaError::DimensionMismatch { .. }));
    }

    #[test]
    fn out_of_order_timestamp_is_rejected() {
        let mut enc = DeltaEncoder::new(DeltaConfig::default()).unwrap();
        enc.push_frame(100, RasterFrame::filled(2, 2, BLACK)).unwrap();
        assert!(matches!(
            enc.push_frame(50, RasterFrame::filled(2, 2, BLACK)),
            Err(DeltaError::InvalidInput(_))
        ));
    }

    #[test]
    fn no_frames_is_empty() {
        let enc = DeltaEncoder::new(DeltaConfig::default()).unwrap();
        assert!(matches!(enc.finish(), Err(DeltaError::Empty)));
    }
}
