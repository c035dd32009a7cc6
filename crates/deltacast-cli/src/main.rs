use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use deltacast_core::config::{
    AlgorithmFamily, AutoMode, Connectivity, GuillotineChoice, GuillotineSplit, MaxRectsHeuristic,
    SkylineHeuristic, SortOrder,
};
use deltacast_core::{
    DeltaConfig, DeltaEncoder, DeltaOutput, DiffConfig, FrameFile, PackerConfig, to_json_compact,
    to_json_manifest,
};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod capture;
mod discover;

use capture::{CaptureOpts, capture_interactive, unix_millis};
use discover::gather_frames;

#[derive(Parser, Debug)]
#[command(
    name = "deltacast",
    about = "Record a window as a sprite atlas plus a frame log of changed regions",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a directory of <unix_millis>.png screenshots
    Encode(EncodeArgs),
    /// Take screenshots of a window until Enter is pressed
    Capture(CaptureArgs),
    /// Capture into a temporary directory, then encode it
    Record(RecordArgs),
    /// Simple timing bench (encodes once, prints time + occupancy)
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct EncodeArgs {
    /// Frames directory (or a single frame file)
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    #[command(flatten)]
    opts: EncodeOpts,
}

#[derive(Parser, Debug, Clone)]
struct CaptureArgs {
    /// Directory receiving the screenshots
    #[arg(long, default_value = "frames")]
    frames_dir: PathBuf,
    #[command(flatten)]
    capture: CaptureOpts,
}

#[derive(Parser, Debug, Clone)]
struct RecordArgs {
    #[command(flatten)]
    capture: CaptureOpts,
    #[command(flatten)]
    opts: EncodeOpts,
    /// Capture into this directory instead of a temporary one (always kept)
    #[arg(long, help_heading = "Capture")]
    frames_dir: Option<PathBuf>,
    /// Keep the temporary frames directory after encoding
    #[arg(long, default_value_t = false, help_heading = "Capture")]
    keep_frames: bool,
}

#[derive(Parser, Debug, Clone)]
struct EncodeOpts {
    // Input/Output
    /// Output directory
    #[arg(short, long, default_value = "output", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (written as name.png)
    #[arg(short, long, default_value = "spritesheet", help_heading = "Input/Output")]
    name: String,
    /// Frame log base name (written as name.json, or the template extension)
    #[arg(long, default_value = "data", help_heading = "Input/Output")]
    log_name: String,
    /// YAML config file path (overrides detection and layout options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Detection
    /// A pixel changed when its summed RGBA difference exceeds this
    #[arg(long, default_value_t = 6, help_heading = "Detection")]
    tolerance: u32,
    /// Pixel grouping: window | cross
    #[arg(long, default_value = "window", help_heading = "Detection")]
    connectivity: String,
    /// Window radius for window connectivity (2 = 5x5)
    #[arg(long, default_value_t = 2, help_heading = "Detection")]
    radius: u32,
    /// Pixels added around every changed region
    #[arg(long, default_value_t = 4, help_heading = "Detection")]
    margin: u32,
    /// More regions than this in one frame are merged into one
    #[arg(long, default_value_t = 50, help_heading = "Detection")]
    collapse_threshold: usize,

    // Layout
    /// Max atlas width
    #[arg(long, default_value_t = 16384, help_heading = "Layout")]
    max_width: u32,
    /// Max atlas height
    #[arg(long, default_value_t = 16384, help_heading = "Layout")]
    max_height: u32,
    /// Resize atlas dims to power of two
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    pow2: bool,
    /// Force square atlas
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    square: bool,
    /// Sort order: area_desc|max_side_desc|height_desc|width_desc|none
    #[arg(long, default_value = "area_desc", help_heading = "Layout")]
    sort_order: String,
    /// Border padding (around the entire atlas)
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    border_padding: u32,
    /// Padding between sprites
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    texture_padding: u32,

    // Algorithms/Heuristics/Auto
    /// Algorithm: skyline | maxrects | guillotine | auto
    #[arg(long, value_parser = ["skyline", "maxrects", "guillotine", "auto"], default_value = "auto", help_heading = "Algorithms")]
    algorithm: String,
    /// MaxRects heuristic: baf|bssf|blsf|bl|cp
    #[arg(long, default_value = "baf", help_heading = "Heuristics")]
    heuristic: String,
    /// Skyline heuristic: bl|minwaste
    #[arg(long, default_value = "bl", help_heading = "Heuristics")]
    skyline: String,
    /// Guillotine choice: baf|bssf|blsf|waf|wssf|wlsf
    #[arg(long, default_value = "baf", help_heading = "Heuristics")]
    g_choice: String,
    /// Guillotine split: slas|llas|minas|maxas|sas|las
    #[arg(long, default_value = "slas", help_heading = "Heuristics")]
    g_split: String,
    /// Auto mode: fast | quality
    #[arg(long, default_value = "quality", help_heading = "Auto/Portfolio")]
    auto_mode: String,
    /// Time budget for layout candidates (ms)
    #[arg(long, help_heading = "Auto/Portfolio")]
    time_budget: Option<u64>,
    /// Evaluate layout candidates in parallel (requires feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Auto/Portfolio")]
    parallel: bool,

    // Export
    /// Frame log format: compact | manifest | template
    #[arg(long, value_parser = ["compact", "manifest", "template"], default_value = "compact", help_heading = "Export")]
    log_format: String,
    /// Built-in template for --log-format template: js
    #[arg(long, help_heading = "Export")]
    engine: Option<String>,
    /// External template file (handlebars), used when --log-format template
    #[arg(long, help_heading = "Export")]
    template: Option<PathBuf>,
    /// Pretty-print JSON output
    #[arg(long, default_value_t = false, help_heading = "Export")]
    pretty: bool,
    /// Export encoding stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: encode and report but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Frames directory
    input: PathBuf,
    /// Algorithm: skyline | maxrects | guillotine | auto
    #[arg(long, value_parser = ["skyline", "maxrects", "guillotine", "auto"], default_value = "auto")]
    algorithm: String,
    /// Auto mode: fast | quality
    #[arg(long, default_value = "quality")]
    auto_mode: String,
    /// Time budget for layout candidates (ms)
    #[arg(long)]
    time_budget: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Encode(args) => run_encode(&args.input, &args.opts, progress),
        Commands::Capture(args) => {
            let summary = capture_interactive(&args.capture, &args.frames_dir)?;
            println!(
                "captured={} failed={} dir={}",
                summary.spawned,
                summary.failed,
                args.frames_dir.display()
            );
            Ok(())
        }
        Commands::Record(args) => run_record(args, progress),
        Commands::Bench(b) => run_bench(b),
    }
}

fn run_record(args: &RecordArgs, progress: bool) -> anyhow::Result<()> {
    let (frames_dir, temporary) = match &args.frames_dir {
        Some(dir) => (dir.clone(), false),
        None => (
            std::env::temp_dir().join(format!("deltacast-{}", unix_millis())),
            true,
        ),
    };
    capture_interactive(&args.capture, &frames_dir)?;
    let result = run_encode(&frames_dir, &args.opts, progress);
    if result.is_err() {
        warn!(dir = %frames_dir.display(), "encoding failed; frames kept");
        return result;
    }
    if temporary && !args.keep_frames {
        fs::remove_dir_all(&frames_dir)
            .with_context(|| format!("remove frames dir {}", frames_dir.display()))?;
    } else {
        info!(dir = %frames_dir.display(), "frames kept");
    }
    result
}

fn run_encode(input: &Path, opts: &EncodeOpts, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(opts)?;

    if opts.print_config {
        match opts.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let files = gather_frames(input, &opts.include, &opts.exclude)?;
    if files.is_empty() {
        anyhow::bail!("no <timestamp>.png frames found in {}", input.display());
    }
    info!(count = files.len(), "found frames");
    let out = encode_with_progress(&files, cfg, show_progress)?;
    info!("{}", out.stats.summary());

    // render everything before writing so a failure leaves no partial output
    let (log_text, log_ext) = render_log(&out, opts)?;
    let stats_text = serde_json::to_string_pretty(&out.stats)?;

    if opts.dry_run {
        println!("{}", out.stats.summary());
        return Ok(());
    }
    let mut png_bytes = Vec::new();
    out.atlas
        .write_to(&mut std::io::Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .context("encode atlas png")?;

    fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("create out_dir {}", opts.out_dir.display()))?;
    let png_path = opts.out_dir.join(format!("{}.png", opts.name));
    let log_path = opts.out_dir.join(format!("{}.{}", opts.log_name, log_ext));
    let mut artifacts = vec![(png_path, png_bytes), (log_path, log_text.into_bytes())];
    if let Some(stats_path) = &opts.export_stats {
        artifacts.push((stats_path.clone(), stats_text.into_bytes()));
    }
    write_outputs(&artifacts)?;
    info!(
        atlas = ?artifacts[0].0,
        log = ?artifacts[1].0,
        frames = out.log.len(),
        "outputs written"
    );
    Ok(())
}

fn part_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.part"))
}

/// Write every artifact to a `.part` sibling first, then rename them into place.
/// On any failure the parts and already renamed files are removed.
fn write_outputs(artifacts: &[(PathBuf, Vec<u8>)]) -> anyhow::Result<()> {
    let parts: Vec<PathBuf> = artifacts.iter().map(|(p, _)| part_path(p)).collect();
    let discard = |parts: &[PathBuf], done: &[(PathBuf, Vec<u8>)]| {
        for p in parts {
            let _ = fs::remove_file(p);
        }
        for (p, _) in done {
            let _ = fs::remove_file(p);
        }
    };
    for ((path, bytes), part) in artifacts.iter().zip(&parts) {
        if let Err(e) = fs::write(part, bytes) {
            discard(&parts, &[]);
            return Err(e).with_context(|| format!("write {}", path.display()));
        }
    }
    for (i, ((path, _), part)) in artifacts.iter().zip(&parts).enumerate() {
        if let Err(e) = fs::rename(part, path) {
            discard(&parts[i..], &artifacts[..i]);
            return Err(e).with_context(|| format!("write {}", path.display()));
        }
    }
    Ok(())
}

fn encode_with_progress(
    files: &[FrameFile],
    cfg: DeltaConfig,
    progress: bool,
) -> anyhow::Result<DeltaOutput> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(files.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} encoding {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut enc = DeltaEncoder::new(cfg)?;
    for f in files {
        if let Some(b) = &bar {
            let msg = f.path.file_name().and_then(|s| s.to_str()).unwrap_or("");
            b.set_message(msg.to_string());
        }
        enc.push_file(&f.path, f.timestamp)
            .with_context(|| format!("encode frame {}", f.path.display()))?;
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(enc.finish()?)
}

/// Serialized frame log and the file extension it should be written with.
fn render_log(out: &DeltaOutput, opts: &EncodeOpts) -> anyhow::Result<(String, String)> {
    let to_string = |v: &serde_json::Value| {
        if opts.pretty {
            serde_json::to_string_pretty(v)
        } else {
            serde_json::to_string(v)
        }
    };
    match opts.log_format.as_str() {
        "compact" => Ok((to_string(&to_json_compact(&out.log))?, "json".into())),
        "manifest" => {
            let value = to_json_manifest(&out.log, &out.sprites, &out.meta);
            Ok((to_string(&value)?, "json".into()))
        }
        "template" => {
            let ctx = build_template_context(out, &format!("{}.png", opts.name))?;
            let tpl_owned_from_file: Option<String> = match &opts.template {
                Some(path) => Some(
                    fs::read_to_string(path)
                        .with_context(|| format!("read template {}", path.display()))?,
                ),
                None => None,
            };
            let (tpl_ref, ext): (&str, String) = if let Some(engine) = &opts.engine {
                match engine.to_ascii_lowercase().as_str() {
                    "js" => (include_str!("templates/js.hbs"), "js".into()),
                    other => anyhow::bail!("unknown engine template: {}", other),
                }
            } else if let (Some(s), Some(path)) = (&tpl_owned_from_file, &opts.template) {
                (s.as_str(), template_extension(path))
            } else {
                (include_str!("templates/js.hbs"), "js".into())
            };
            let mut reg = Handlebars::new();
            reg.set_strict_mode(true);
            reg.register_template_string("tpl", tpl_ref)?;
            Ok((reg.render("tpl", &ctx)?, ext))
        }
        other => anyhow::bail!("unknown log format: {}", other),
    }
}

/// `player.js.hbs` renders to `.js`; templates without an inner extension to `.txt`.
fn template_extension(path: &Path) -> String {
    Path::new(path.file_stem().unwrap_or_default())
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("txt")
        .to_string()
}

#[derive(Serialize)]
struct TemplateChange {
    x: u32,
    y: u32,
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    w: u32,
    h: u32,
}

#[derive(Serialize)]
struct TemplateFrame {
    timestamp: u64,
    changes: Vec<TemplateChange>,
}

#[derive(Serialize)]
struct TemplateContext {
    atlas: String,
    atlas_width: u32,
    atlas_height: u32,
    frame_width: u32,
    frame_height: u32,
    frames: Vec<TemplateFrame>,
    frames_json: String,
    sprites: Vec<serde_json::Value>,
    meta: serde_json::Value,
}

fn build_template_context(out: &DeltaOutput, atlas_name: &str) -> anyhow::Result<TemplateContext> {
    let frames = out
        .log
        .frames
        .iter()
        .map(|entry| TemplateFrame {
            timestamp: entry.timestamp(),
            changes: entry
                .changes()
                .iter()
                .map(|c| TemplateChange {
                    x: c.0,
                    y: c.1,
                    x1: c.2,
                    y1: c.3,
                    x2: c.4,
                    y2: c.5,
                    w: c.4 - c.2,
                    h: c.5 - c.3,
                })
                .collect(),
        })
        .collect();
    let sprites = out
        .sprites
        .iter()
        .map(|s| serde_json::json!({"id": s.id, "x": s.frame.x, "y": s.frame.y, "w": s.frame.w, "h": s.frame.h}))
        .collect();
    Ok(TemplateContext {
        atlas: atlas_name.to_string(),
        atlas_width: out.meta.size.0,
        atlas_height: out.meta.size.1,
        frame_width: out.meta.frame_size.0,
        frame_height: out.meta.frame_size.1,
        frames,
        frames_json: out.log.to_json_string()?,
        sprites,
        meta: serde_json::to_value(&out.meta)?,
    })
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    let files = gather_frames(&b.input, &[], &[])?;
    if files.is_empty() {
        anyhow::bail!("no <timestamp>.png frames found in {}", b.input.display());
    }
    let cfg = DeltaConfig {
        diff: DiffConfig::default(),
        packer: PackerConfig {
            family: parse_enum(&b.algorithm, "algorithm")?,
            auto_mode: parse_enum(&b.auto_mode, "auto mode")?,
            time_budget_ms: b.time_budget,
            ..Default::default()
        },
    };
    let start = Instant::now();
    let out = deltacast_core::encode_files(&files, cfg)?;
    let dur = start.elapsed();
    println!(
        "frames={} records={} sprites={} atlas={}x{} occupancy={:.2}% time={}",
        out.stats.num_frames,
        out.stats.num_records,
        out.stats.num_sprites,
        out.stats.atlas_width,
        out.stats.atlas_height,
        out.stats.occupancy * 100.0,
        bench_fmt_dur(dur)
    );
    Ok(())
}

fn bench_fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn parse_enum<T: std::str::FromStr>(s: &str, what: &str) -> anyhow::Result<T> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown {}: {}", what, s))
}

/// CLI flags, then the YAML file on top, then validation.
fn build_config(opts: &EncodeOpts) -> anyhow::Result<DeltaConfig> {
    let mut cfg = DeltaConfig {
        diff: DiffConfig {
            tolerance: opts.tolerance,
            connectivity: parse_enum::<Connectivity>(&opts.connectivity, "connectivity")?,
            neighborhood_radius: opts.radius,
            region_margin: opts.margin,
            collapse_threshold: opts.collapse_threshold,
        },
        packer: PackerConfig {
            max_width: opts.max_width,
            max_height: opts.max_height,
            border_padding: opts.border_padding,
            texture_padding: opts.texture_padding,
            power_of_two: opts.pow2,
            square: opts.square,
            family: parse_enum::<AlgorithmFamily>(&opts.algorithm, "algorithm")?,
            mr_heuristic: parse_enum::<MaxRectsHeuristic>(&opts.heuristic, "heuristic")?,
            skyline_heuristic: parse_enum::<SkylineHeuristic>(&opts.skyline, "skyline heuristic")?,
            g_choice: parse_enum::<GuillotineChoice>(&opts.g_choice, "guillotine choice")?,
            g_split: parse_enum::<GuillotineSplit>(&opts.g_split, "guillotine split")?,
            auto_mode: parse_enum::<AutoMode>(&opts.auto_mode, "auto mode")?,
            sort_order: parse_enum::<SortOrder>(&opts.sort_order, "sort order")?,
            time_budget_ms: opts.time_budget,
            parallel: opts.parallel,
        },
    };
    if let Some(path) = &opts.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg = y.apply(cfg)?;
    }
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    tolerance: Option<u32>,
    connectivity: Option<String>,
    neighborhood_radius: Option<u32>,
    region_margin: Option<u32>,
    collapse_threshold: Option<usize>,
    family: Option<String>,
    skyline: Option<String>,
    heuristic: Option<String>,
    g_choice: Option<String>,
    g_split: Option<String>,
    auto_mode: Option<String>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    border_padding: Option<u32>,
    texture_padding: Option<u32>,
    power_of_two: Option<bool>,
    square: Option<bool>,
    sort_order: Option<String>,
    time_budget_ms: Option<u64>,
    parallel: Option<bool>,
}

impl YamlConfig {
    fn apply(self, mut cfg: DeltaConfig) -> anyhow::Result<DeltaConfig> {
        let d = &mut cfg.diff;
        if let Some(v) = self.tolerance {
            d.tolerance = v;
        }
        if let Some(v) = self.connectivity {
            d.connectivity = parse_enum(&v, "connectivity")?;
        }
        if let Some(v) = self.neighborhood_radius {
            d.neighborhood_radius = v;
        }
        if let Some(v) = self.region_margin {
            d.region_margin = v;
        }
        if let Some(v) = self.collapse_threshold {
            d.collapse_threshold = v;
        }

        let p = &mut cfg.packer;
        if let Some(v) = self.max_width {
            p.max_width = v;
        }
        if let Some(v) = self.max_height {
            p.max_height = v;
        }
        if let Some(v) = self.border_padding {
            p.border_padding = v;
        }
        if let Some(v) = self.texture_padding {
            p.texture_padding = v;
        }
        if let Some(v) = self.power_of_two {
            p.power_of_two = v;
        }
        if let Some(v) = self.square {
            p.square = v;
        }
        if let Some(v) = self.sort_order {
            p.sort_order = parse_enum(&v, "sort order")?;
        }
        if let Some(v) = self.time_budget_ms {
            p.time_budget_ms = Some(v);
        }
        if let Some(v) = self.parallel {
            p.parallel = v;
        }
        if let Some(v) = self.family {
            p.family = parse_enum(&v, "algorithm")?;
        }
        if let Some(v) = self.skyline {
            p.skyline_heuristic = parse_enum(&v, "skyline heuristic")?;
        }
        if let Some(v) = self.heuristic {
            p.mr_heuristic = parse_enum(&v, "heuristic")?;
        }
        if let Some(v) = self.g_choice {
            p.g_choice = parse_enum(&v, "guillotine choice")?;
        }
        if let Some(v) = self.g_split {
            p.g_split = parse_enum(&v, "guillotine split")?;
        }
        if let Some(v) = self.auto_mode {
            p.auto_mode = parse_enum(&v, "auto mode")?;
        }
        Ok(cfg)
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    // RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_opts() -> EncodeOpts {
        let args = EncodeArgs::try_parse_from(["encode", "frames"]).unwrap();
        args.opts
    }

    #[test]
    fn cli_defaults_match_core_defaults() {
        let cfg = build_config(&default_opts()).unwrap();
        assert_eq!(cfg.diff, DiffConfig::default());
        assert_eq!(cfg.packer.max_width, PackerConfig::default().max_width);
        assert_eq!(cfg.packer.family, AlgorithmFamily::Auto);
    }

    #[test]
    fn yaml_overrides_flags() {
        let y: YamlConfig = serde_yaml::from_str(
            "tolerance: 20\nconnectivity: cross\nfamily: skyline\nskyline: minwaste\n",
        )
        .unwrap();
        let cfg = y.apply(build_config(&default_opts()).unwrap()).unwrap();
        assert_eq!(cfg.diff.tolerance, 20);
        assert_eq!(cfg.diff.connectivity, Connectivity::Cross);
        assert_eq!(cfg.packer.family, AlgorithmFamily::Skyline);
        assert_eq!(cfg.packer.skyline_heuristic, SkylineHeuristic::MinWaste);
        assert_eq!(cfg.diff.region_margin, 4);
    }

    #[test]
    fn bad_enum_in_yaml_is_an_error() {
        let y: YamlConfig = serde_yaml::from_str("connectivity: hexagonal\n").unwrap();
        assert!(y.apply(DeltaConfig::default()).is_err());
    }

    #[test]
    fn template_extension_from_inner_suffix() {
        assert_eq!(template_extension(Path::new("t/player.html.hbs")), "html");
        assert_eq!(template_extension(Path::new("t/player.hbs")), "txt");
    }

    fn scratch_frames(tag: &str) -> (PathBuf, PathBuf) {
        use image::{Rgba, RgbaImage};
        let root = std::env::temp_dir().join(format!("deltacast-cli-{tag}-{}", unix_millis()));
        let input = root.join("frames");
        fs::create_dir_all(&input).unwrap();
        let mut img = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
        img.save(input.join("1000.png")).unwrap();
        img.put_pixel(3, 3, Rgba([250, 20, 30, 255]));
        img.save(input.join("1250.png")).unwrap();
        (root, input)
    }

    #[test]
    fn encode_writes_atlas_and_log() {
        let (root, input) = scratch_frames("ok");
        let mut opts = default_opts();
        opts.out_dir = root.join("out");
        run_encode(&input, &opts, false).unwrap();
        assert!(opts.out_dir.join("spritesheet.png").is_file());
        let log = fs::read_to_string(opts.out_dir.join("data.json")).unwrap();
        assert!(log.starts_with("[[1000,[[0,0,"));
        assert!(!opts.out_dir.join(".data.json.part").exists());
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn failed_log_write_leaves_no_atlas() {
        let (root, input) = scratch_frames("fail");
        let mut opts = default_opts();
        opts.out_dir = root.join("out");
        // a directory where the log file should go
        fs::create_dir_all(opts.out_dir.join("data.json")).unwrap();
        assert!(run_encode(&input, &opts, false).is_err());
        assert!(!opts.out_dir.join("spritesheet.png").exists());
        assert!(!opts.out_dir.join(".spritesheet.png.part").exists());
        assert!(!opts.out_dir.join(".data.json.part").exists());
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn js_template_renders() {
        use deltacast_core::{Pixel, RasterFrame, encode_frames};
        let f = RasterFrame::filled(3, 2, Pixel::new(1, 2, 3, 255));
        let out = encode_frames([(500, f)], DeltaConfig::default()).unwrap();
        let mut opts = default_opts();
        opts.log_format = "template".into();
        opts.engine = Some("js".into());
        let (text, ext) = render_log(&out, &opts).unwrap();
        assert_eq!(ext, "js");
        assert!(text.contains("export const spritesheet = \"spritesheet.png\";"));
        assert!(text.contains("export const frames = [[500,[[0,0,0,0,3,2]]]];"));
    }
}
