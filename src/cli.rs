// ============================================================================
// dotboard CLI — headless import / generate / refine / export
// ============================================================================
//
// Usage examples:
//   dotboard -i photo.png -o board.dbp
//   dotboard -i photo.jpg --size 64x32 --levels 6 -o board.png
//   dotboard -i shots/*.jpg --output-dir boards/ --format svg --refine 2
//   dotboard -i masked.json --generate --seed 7 -o filled.json
//
// Every input is processed synchronously: load or import, optional
// background generation, optional refinement, then save.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::app::Editor;
use crate::io;
use crate::ops::quantize::{ImportOptions, MAX_COLOR_LEVELS, MIN_COLOR_LEVELS};
use crate::settings::{EditorSettings, parse_grid_size};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// dotboard headless converter.
///
/// Turn images into dot-grid boards and convert boards between formats.
#[derive(Parser, Debug)]
#[command(
    name = "dotboard",
    about = "dotboard headless pixel-board converter",
    long_about = "Quantize raster images onto the dotboard palette, fill masked areas\n\
                  with generated backgrounds, clean boards up, and save them as\n\
                  DBP/JSON projects or PNG/SVG dot renders.\n\n\
                  Example:\n  \
                  dotboard --input photo.png --output board.png\n  \
                  dotboard -i *.jpg --output-dir out/ --format dbp --refine 2"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "boards/*.json").
    /// .dbp and .json files are loaded as projects; everything else is imported.
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: dbp, json, png, svg.
    /// When omitted, the format is inferred from --output's extension, defaulting to dbp.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Grid size for imported images, e.g. 51x26. Defaults to the saved setting.
    #[arg(long, value_name = "WxH", value_parser = parse_grid_size)]
    pub size: Option<(u32, u32)>,

    /// Posterization levels per channel for imported images (2–32).
    #[arg(long, value_name = "N")]
    pub levels: Option<u32>,

    /// Zoom applied to imported images after fitting (1.0 = fit).
    #[arg(long, default_value_t = 1.0, value_name = "S")]
    pub scale: f32,

    /// Fill the board (or its masked cells) with a random background.
    #[arg(long)]
    pub generate: bool,

    /// Seed for --generate. Random when omitted.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Refinement strength 1–4 applied before saving.
    #[arg(long, value_name = "1-4", value_parser = clap::value_parser!(u8).range(1..=4))]
    pub refine: Option<u8>,

    /// Pixel size of one cell in PNG/SVG output.
    #[arg(long, value_name = "PX", value_parser = clap::value_parser!(u32).range(1..=200))]
    pub cell_size: Option<u32>,

    /// Store the effective size, levels, refine strength and cell size as
    /// the new defaults in the settings file.
    #[arg(long)]
    pub save_defaults: bool,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Dbp,
    Json,
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Dbp => "dbp",
            OutputFormat::Json => "json",
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "dbp" => Some(OutputFormat::Dbp),
            "json" => Some(OutputFormat::Json),
            "png" => Some(OutputFormat::Png),
            "svg" => Some(OutputFormat::Svg),
            _ => None,
        }
    }
}

/// Resolved per-file settings.
#[derive(Clone, Debug)]
struct RunOptions {
    grid: (u32, u32),
    import: ImportOptions,
    generate: bool,
    seed: Option<u64>,
    refine: Option<u8>,
    cell_size: u32,
    format: OutputFormat,
}

impl RunOptions {
    /// `base` with this run's defaults written over it.
    fn to_settings(&self, base: &EditorSettings) -> EditorSettings {
        let mut merged = base.clone();
        (merged.grid_width, merged.grid_height) = self.grid;
        merged.color_levels = self.import.color_levels.clamp(MIN_COLOR_LEVELS, MAX_COLOR_LEVELS);
        merged.refine_strength = self.refine.unwrap_or(0);
        merged.export_cell_size = self.cell_size;
        merged
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let format = match parse_format(args.format.as_deref(), args.output.as_deref()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let settings = EditorSettings::load();
    let options = RunOptions {
        grid: args.size.unwrap_or((settings.grid_width, settings.grid_height)),
        import: ImportOptions {
            scale: args.scale,
            pan: (0.0, 0.0),
            color_levels: args.levels.unwrap_or(settings.color_levels),
        },
        generate: args.generate,
        seed: args.seed,
        refine: args
            .refine
            .or((settings.refine_strength > 0).then_some(settings.refine_strength)),
        cell_size: args.cell_size.unwrap_or(settings.export_cell_size),
        format,
    };

    if args.save_defaults {
        options.to_settings(&settings).save();
        log_info!("Saved CLI defaults to settings");
    }

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let Some(output_path) = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            format,
        ) else {
            eprintln!(
                "  error: cannot determine output path for '{}'.",
                input_path.display()
            );
            any_failure = true;
            continue;
        };

        match run_one(input_path, &output_path, &options) {
            Ok(cells) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({} cells, {:.0}ms)",
                        output_path.display(),
                        cells,
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                log_err!("{}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

/// Returns the number of non-default cells in the saved board.
fn run_one(input: &Path, output: &Path, options: &RunOptions) -> Result<usize, String> {
    // -- Step 1: Load or import ------------------------------------------
    let mut editor = if io::is_project_path(input) {
        io::load_project(input).map_err(|e| format!("load failed: {}", e))?
    } else {
        let (w, h) = options.grid;
        let mut editor = Editor::new(w, h).map_err(|e| e.to_string())?;
        io::import_image_file(&mut editor, input, &options.import)
            .map_err(|e| format!("import failed: {}", e))?;
        editor
    };

    // -- Step 2: Background (optional) -----------------------------------
    if options.generate {
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        editor.generate(&mut rng);
        editor.commit_overlay();
    }

    // -- Step 3: Refine (optional) ---------------------------------------
    if let Some(strength) = options.refine {
        editor.refine(strength).map_err(|e| e.to_string())?;
    }

    // -- Step 4: Save ----------------------------------------------------
    match options.format {
        OutputFormat::Dbp => io::save_dbp(&editor, output),
        OutputFormat::Json => io::save_json(&editor, output),
        OutputFormat::Png => io::export_png(&mut editor, output, options.cell_size),
        OutputFormat::Svg => io::export_svg(&mut editor, output, options.cell_size),
    }
    .map_err(|e| format!("save failed: {}", e))?;

    Ok(editor.artboard().len())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`OutputFormat`] from `--format` or infer it from the output
/// file extension. Defaults to DBP when neither is given.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> Result<OutputFormat, String> {
    if let Some(f) = format_arg {
        return OutputFormat::from_name(f).ok_or_else(|| format!("unknown format '{}'", f));
    }

    if let Some(ext) = output.and_then(|o| o.extension()).and_then(|e| e.to_str()) {
        return OutputFormat::from_name(ext)
            .ok_or_else(|| format!("cannot infer format from extension '.{}'", ext));
    }

    Ok(OutputFormat::Dbp)
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: OutputFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}
