use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Declares a config enum whose variants parse from a list of lowercase names.
/// The first name of each variant is the one `as_str` reports.
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $first:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
        $(#[$meta])*
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl FromStr for $name {
            type Err = ();
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.to_ascii_lowercase();
                $(
                    if s == $first $(|| s == $alias)* {
                        return Ok(Self::$variant);
                    }
                )+
                Err(())
            }
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $first),+
                }
            }
        }
    };
}

named_enum! {
    /// Neighbourhood used to group differing pixels into one region.
    #[serde(rename_all = "lowercase")]
    Connectivity {
        /// Every cell within Chebyshev distance `neighborhood_radius` (radius 2 is a 5x5 window).
        Window => "window",
        /// Up/down/left/right only. The radius is ignored.
        Cross => "cross",
    }
}

named_enum! {
    /// How the sprite atlas is laid out.
    #[serde(rename_all = "lowercase")]
    AlgorithmFamily {
        Skyline => "skyline",
        MaxRects => "maxrects",
        Guillotine => "guillotine",
        /// Run a portfolio of layouts and keep the smallest atlas.
        Auto => "auto",
    }
}

named_enum! {
    /// Where MaxRects puts the next sprite among its free rectangles.
    #[serde(rename_all = "lowercase")]
    MaxRectsHeuristic {
        BestAreaFit => "baf" | "bestareafit",
        BestShortSideFit => "bssf" | "bestshortsidefit",
        BestLongSideFit => "blsf" | "bestlongsidefit",
        BottomLeft => "bl" | "bottomleft",
        /// Favour spots touching placed sprites or the atlas edge.
        ContactPoint => "cp" | "contactpoint",
    }
}

named_enum! {
    #[serde(rename_all = "lowercase")]
    SkylineHeuristic {
        BottomLeft => "bl" | "bottomleft",
        /// Lowest area trapped under the sprite.
        MinWaste => "minwaste",
    }
}

named_enum! {
    /// Which free rectangle a guillotine packer cuts the next sprite from.
    #[serde(rename_all = "lowercase")]
    GuillotineChoice {
        BestAreaFit => "baf" | "bestareafit",
        BestShortSideFit => "bssf" | "bestshortsidefit",
        BestLongSideFit => "blsf" | "bestlongsidefit",
        WorstAreaFit => "waf" | "worstareafit",
        WorstShortSideFit => "wssf" | "worstshortsidefit",
        WorstLongSideFit => "wlsf" | "worstlongsidefit",
    }
}

named_enum! {
    /// Axis of the cut that splits the leftover of a guillotine free rectangle.
    #[serde(rename_all = "lowercase")]
    GuillotineSplit {
        SplitShorterLeftoverAxis => "slas" | "splitshorterleftoveraxis",
        SplitLongerLeftoverAxis => "llas" | "splitlongerleftoveraxis",
        SplitMinimizeArea => "minas" | "splitminimizearea",
        SplitMaximizeArea => "maxas" | "splitmaximizearea",
        SplitShorterAxis => "sas" | "splitshorteraxis",
        SplitLongerAxis => "las" | "splitlongeraxis",
    }
}

named_enum! {
    /// Size of the `Auto` portfolio.
    #[serde(rename_all = "lowercase")]
    AutoMode {
        /// Skyline and one MaxRects heuristic.
        Fast => "fast",
        /// Every family with its stronger heuristics.
        Quality => "quality",
    }
}

named_enum! {
    /// Order in which sprites are fed to the packer. Ties keep extraction order.
    #[serde(rename_all = "snake_case")]
    SortOrder {
        AreaDesc => "area_desc",
        MaxSideDesc => "max_side_desc",
        HeightDesc => "height_desc",
        WidthDesc => "width_desc",
        None => "none",
    }
}

/// Largest accepted `neighborhood_radius` (a 129x129 window).
pub const MAX_NEIGHBORHOOD_RADIUS: u32 = 64;

/// Change detection and region collapsing parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiffConfig {
    /// A pixel differs when the summed absolute RGBA channel difference exceeds this.
    #[serde(default = "default_tolerance")]
    pub tolerance: u32,
    #[serde(default = "default_connectivity")]
    pub connectivity: Connectivity,
    /// Chebyshev radius for `Connectivity::Window`.
    #[serde(default = "default_radius")]
    pub neighborhood_radius: u32,
    /// Pixels added around every region before clipping to the frame.
    #[serde(default = "default_margin")]
    pub region_margin: u32,
    /// More regions than this in one frame collapse into their union.
    #[serde(default = "default_collapse_threshold")]
    pub collapse_threshold: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            connectivity: default_connectivity(),
            neighborhood_radius: default_radius(),
            region_margin: default_margin(),
            collapse_threshold: default_collapse_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackerConfig {
    /// Largest atlas width the packer may produce.
    pub max_width: u32,
    /// Largest atlas height the packer may produce.
    pub max_height: u32,

    /// Pixels around the entire atlas border.
    pub border_padding: u32,
    /// Pixels between sprites.
    pub texture_padding: u32,

    /// Round atlas dimensions up to powers of two.
    pub power_of_two: bool,
    /// Force a square atlas (max(width, height)).
    pub square: bool,

    #[serde(default = "default_family")]
    pub family: AlgorithmFamily,
    #[serde(default = "default_mr_heuristic")]
    pub mr_heuristic: MaxRectsHeuristic,
    #[serde(default = "default_skyline_heuristic")]
    pub skyline_heuristic: SkylineHeuristic,
    #[serde(default = "default_g_choice")]
    pub g_choice: GuillotineChoice,
    #[serde(default = "default_g_split")]
    pub g_split: GuillotineSplit,
    #[serde(default = "default_auto_mode")]
    pub auto_mode: AutoMode,
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,

    /// Optional time budget for candidate evaluation (milliseconds). None or 0 disables.
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
    /// Evaluate candidates in parallel when the `parallel` feature is on.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            max_width: 16384,
            max_height: 16384,
            border_padding: 0,
            texture_padding: 0,
            power_of_two: false,
            square: false,
            family: default_family(),
            mr_heuristic: default_mr_heuristic(),
            skyline_heuristic: default_skyline_heuristic(),
            g_choice: default_g_choice(),
            g_split: default_g_split(),
            auto_mode: default_auto_mode(),
            sort_order: default_sort_order(),
            time_budget_ms: None,
            parallel: default_parallel(),
        }
    }
}

/// Full configuration of one encoding run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeltaConfig {
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub packer: PackerConfig,
}

impl DiffConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::DeltaError;

        if self.connectivity == Connectivity::Window && self.neighborhood_radius == 0 {
            return Err(DeltaError::InvalidConfig(
                "neighborhood_radius must be at least 1 for window connectivity".into(),
            ));
        }
        if self.neighborhood_radius > MAX_NEIGHBORHOOD_RADIUS {
            return Err(DeltaError::InvalidConfig(format!(
                "neighborhood_radius ({}) exceeds {MAX_NEIGHBORHOOD_RADIUS}",
                self.neighborhood_radius
            )));
        }
        if self.collapse_threshold == 0 {
            return Err(DeltaError::InvalidConfig(
                "collapse_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl PackerConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if the atlas cap is zero or either padding leaves no usable space.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::DeltaError;

        if self.max_width == 0 || self.max_height == 0 {
            return Err(DeltaError::InvalidDimensions {
                width: self.max_width,
                height: self.max_height,
            });
        }

        let total_border = self.border_padding.saturating_mul(2);
        if total_border >= self.max_width || total_border >= self.max_height {
            return Err(DeltaError::InvalidConfig(format!(
                "border_padding ({}) * 2 exceeds atlas dimensions ({}x{})",
                self.border_padding, self.max_width, self.max_height
            )));
        }

        if self.texture_padding >= self.max_width.min(self.max_height) {
            return Err(DeltaError::InvalidConfig(format!(
                "texture_padding ({}) leaves no room in a {}x{} atlas",
                self.texture_padding, self.max_width, self.max_height
            )));
        }

        if matches!(self.family, AlgorithmFamily::Auto) && self.time_budget_ms == Some(0) {
            return Err(DeltaError::InvalidConfig(
                "time_budget_ms of 0 would skip every candidate; leave it unset instead".into(),
            ));
        }

        Ok(())
    }
}

impl DeltaConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        self.diff.validate()?;
        self.packer.validate()
    }

    /// Create a fluent builder for `DeltaConfig`.
    pub fn builder() -> DeltaConfigBuilder {
        DeltaConfigBuilder::new()
    }
}

fn default_tolerance() -> u32 {
    6
}
fn default_connectivity() -> Connectivity {
    Connectivity::Window
}
fn default_radius() -> u32 {
    2
}
fn default_margin() -> u32 {
    4
}
fn default_collapse_threshold() -> usize {
    50
}
fn default_family() -> AlgorithmFamily {
    AlgorithmFamily::Auto
}
fn default_mr_heuristic() -> MaxRectsHeuristic {
    MaxRectsHeuristic::BestAreaFit
}
fn default_skyline_heuristic() -> SkylineHeuristic {
    SkylineHeuristic::BottomLeft
}
fn default_g_choice() -> GuillotineChoice {
    GuillotineChoice::BestAreaFit
}
fn default_g_split() -> GuillotineSplit {
    GuillotineSplit::SplitShorterLeftoverAxis
}
fn default_auto_mode() -> AutoMode {
    AutoMode::Quality
}
fn default_sort_order() -> SortOrder {
    SortOrder::AreaDesc
}
fn default_parallel() -> bool {
    false
}

/// Builder for `DeltaConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct DeltaConfigBuilder {
    cfg: DeltaConfig,
}

impl DeltaConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: DeltaConfig::default(),
        }
    }
    pub fn tolerance(mut self, v: u32) -> Self {
        self.cfg.diff.tolerance = v;
        self
    }
    pub fn connectivity(mut self, v: Connectivity) -> Self {
        self.cfg.diff.connectivity = v;
        self
    }
    pub fn neighborhood_radius(mut self, v: u32) -> Self {
        self.cfg.diff.neighborhood_radius = v;
        self
    }
    pub fn region_margin(mut self, v: u32) -> Self {
        self.cfg.diff.region_margin = v;
        self
    }
    pub fn collapse_threshold(mut self, v: usize) -> Self {
        self.cfg.diff.collapse_threshold = v;
        self
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.packer.max_width = w;
        self.cfg.packer.max_height = h;
        self
    }
    pub fn border_padding(mut self, v: u32) -> Self {
        self.cfg.packer.border_padding = v;
        self
    }
    pub fn texture_padding(mut self, v: u32) -> Self {
        self.cfg.packer.texture_padding = v;
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.cfg.packer.power_of_two = v;
        self
    }
    pub fn square(mut self, v: bool) -> Self {
        self.cfg.packer.square = v;
        self
    }
    pub fn family(mut self, v: AlgorithmFamily) -> Self {
        self.cfg.packer.family = v;
        self
    }
    pub fn skyline_heuristic(mut self, v: SkylineHeuristic) -> Self {
        self.cfg.packer.skyline_heuristic = v;
        self
    }
    pub fn mr_heuristic(mut self, v: MaxRectsHeuristic) -> Self {
        self.cfg.packer.mr_heuristic = v;
        self
    }
    pub fn g_choice(mut self, v: GuillotineChoice) -> Self {
        self.cfg.packer.g_choice = v;
        self
    }
    pub fn g_split(mut self, v: GuillotineSplit) -> Self {
        self.cfg.packer.g_split = v;
        self
    }
    pub fn auto_mode(mut self, v: AutoMode) -> Self {
        self.cfg.packer.auto_mode = v;
        self
    }
    pub fn sort_order(mut self, v: SortOrder) -> Self {
        self.cfg.packer.sort_order = v;
        self
    }
    pub fn time_budget_ms(mut self, v: Option<u64>) -> Self {
        self.cfg.packer.time_budget_ms = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.packer.parallel = v;
        self
    }
    pub fn build(self) -> DeltaConfig {
        self.cfg
    }
}
