//! PDF text replacement CLI.
//!
//! Thin command-line front end over [`retext::ReplacementService`]: list
//! text runs, search, replace matches or an overlay selection, insert
//! free text, and dump plain text for verification.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use retext::geometry::{OverlayFrame, RenderTransform};
use retext::{
    EditableDocument, InsertSpec, MatchSelection, PdfDocument, Point, Rect, ReplaceConfig,
    ReplacementEngine, ReplacementService, Searcher, StandardFont,
};

/// PDF Text Replacement Tool
///
/// Finds text in PDF documents and replaces it by covering the original
/// with an opaque rectangle and drawing new text on top.
#[derive(Parser)]
#[command(name = "retext")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    tuning: Tuning,

    #[command(subcommand)]
    command: Commands,
}

/// Cover geometry and projection settings shared by every subcommand.
#[derive(Args, Debug)]
struct Tuning {
    /// Horizontal padding of the cover rectangle, in points
    #[arg(long, global = true, default_value_t = 2.0)]
    pad: f32,

    /// How far below the text the cover starts, as a fraction of its height
    #[arg(long = "v-offset", global = true, default_value_t = 0.5)]
    v_offset: f32,

    /// Cover height as a multiple of the text height
    #[arg(long, global = true, default_value_t = 2.0)]
    height_multiplier: f32,

    /// Standard font used for the substitute text
    #[arg(long, global = true, default_value = "Helvetica")]
    font: StandardFont,

    /// Width in pixels pages are rendered at
    #[arg(long, global = true, default_value_t = retext::search::DEFAULT_RENDER_WIDTH)]
    render_width: f32,
}

impl Tuning {
    fn config(&self) -> ReplaceConfig {
        ReplaceConfig::new()
            .with_pad(self.pad)
            .with_v_offset_factor(self.v_offset)
            .with_height_multiplier(self.height_multiplier)
            .with_font(self.font)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the text runs of a PDF with their bounding boxes
    Runs {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Only list runs of this page (0-based)
        #[arg(long)]
        page: Option<usize>,

        /// Print boxes in render space instead of document space
        #[arg(long)]
        render: bool,
    },

    /// Find every occurrence of a query (case-insensitive)
    Search {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Text to look for
        #[arg(short, long)]
        query: String,
    },

    /// Replace matches of a query with new text
    Replace {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Text to look for
        #[arg(short, long)]
        query: String,

        /// Replacement text
        #[arg(short = 'w', long = "with", value_name = "TEXT")]
        with: String,

        /// Replace only the match with this id (as printed by `search`)
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        id: Option<usize>,

        /// Replace every match
        #[arg(long)]
        all: bool,
    },

    /// Replace whatever lies under a rectangle drawn over the rendered page
    Select {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Page index (0-based)
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Selection in client pixels as `x,y,width,height`
        #[arg(long, value_parser = parse_rect)]
        rect: [f32; 4],

        /// Top-left corner of the page container in client pixels as `left,top`
        #[arg(long, value_parser = parse_point, default_value = "0,0")]
        frame: [f32; 2],

        /// Width the page is displayed at, when zoomed away from the render width
        #[arg(long)]
        displayed_width: Option<f32>,

        /// Replacement text
        #[arg(short = 'w', long = "with", value_name = "TEXT")]
        with: String,
    },

    /// Draw free text at a position, without covering anything
    Insert {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Page index (0-based)
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Baseline start in document units as `x,y`
        #[arg(long, value_parser = parse_point)]
        at: [f32; 2],

        /// Font size in points
        #[arg(long, default_value_t = retext::replace::DEFAULT_INSERT_FONT_SIZE)]
        size: f32,

        /// Text to draw
        #[arg(short, long)]
        text: String,
    },

    /// Extract plain text from a PDF (for debugging and verification)
    Extract {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Command handler owning the configured service.
struct ReplaceHandler {
    service: ReplacementService,
    render_width: f32,
}

impl ReplaceHandler {
    fn new(tuning: &Tuning) -> Self {
        let searcher = Searcher::new().with_render_width(tuning.render_width);
        Self {
            service: ReplacementService::new(ReplacementEngine::new(tuning.config()), searcher),
            render_width: tuning.render_width,
        }
    }

    fn runs(&self, input: &Path, page: Option<usize>, render: bool) -> Result<()> {
        ensure_exists(input)?;
        let bytes = read(input)?;
        let doc = PdfDocument::from_bytes(&bytes)
            .with_context(|| format!("Failed to open {}", input.display()))?;
        let runs = retext::extract_all_runs(&doc).with_context(|| "Text extraction failed")?;

        let mut shown = 0;
        for run in runs.iter().filter(|r| page.map_or(true, |p| r.page_index == p)) {
            let transform = doc
                .page_size(run.page_index)
                .and_then(|size| RenderTransform::new(size, self.render_width));
            let bbox = match (render, transform) {
                (true, Some(transform)) => run.to_render(&transform).bbox.to_string(),
                _ => run.bbox.to_string(),
            };
            println!("p{:<3} {:<40} {:?}", run.page_index, bbox, run.content);
            shown += 1;
        }
        log::info!("{} run(s) listed", shown);
        Ok(())
    }

    fn search(&self, input: &Path, query: &str) -> Result<()> {
        ensure_exists(input)?;
        let matches = self
            .service
            .search_file(input, query)
            .with_context(|| "Search failed")?;

        if matches.is_empty() {
            println!("⚠ No matches for '{}'", query);
            return Ok(());
        }
        for hit in &matches {
            println!(
                "#{:<3} p{:<3} {:<40} {:?}",
                hit.id,
                hit.page_index(),
                hit.run.bbox.to_string(),
                hit.run.content
            );
        }
        println!("✓ {} match(es)", matches.len());
        Ok(())
    }

    fn replace(
        &self,
        input: &Path,
        output: &Path,
        query: &str,
        selection: MatchSelection,
        with: &str,
    ) -> Result<()> {
        ensure_exists(input)?;
        let outcome = self
            .service
            .replace_file(input, output, query, selection, with)
            .with_context(|| "Replacement failed")?;

        if outcome.has_replacements() {
            println!(
                "✓ Replaced {} match(es) in {} run(s) on {} page(s) → {}",
                outcome.matched,
                outcome.replaced,
                outcome.pages_modified,
                output.display()
            );
        } else {
            println!("⚠ No matches for '{}', copied input unchanged", query);
        }
        Ok(())
    }

    fn select(
        &self,
        input: &Path,
        output: &Path,
        page: usize,
        rect: [f32; 4],
        frame: OverlayFrame,
        with: &str,
    ) -> Result<()> {
        ensure_exists(input)?;
        let [x, y, width, height] = rect;
        self.service
            .replace_selection_file(input, output, page, Rect::new(x, y, width, height), frame, with)
            .with_context(|| "Replacement failed")?;
        println!("✓ Replaced selection on page {} → {}", page, output.display());
        Ok(())
    }

    fn insert(&self, input: &Path, output: &Path, spec: InsertSpec) -> Result<()> {
        ensure_exists(input)?;
        let page = spec.page;
        self.service
            .insert_file(input, output, spec)
            .with_context(|| "Insert failed")?;
        println!("✓ Inserted text on page {} → {}", page, output.display());
        Ok(())
    }

    fn extract(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        ensure_exists(input)?;
        let text = self
            .service
            .plain_text_file(input)
            .with_context(|| "Text extraction failed")?;

        if let Some(output_path) = output {
            std::fs::write(output_path, &text)
                .with_context(|| format!("Failed to write to {}", output_path.display()))?;
            println!(
                "✓ Extracted {} characters → {}",
                text.len(),
                output_path.display()
            );
        } else {
            println!("{}", text);
        }
        Ok(())
    }
}

fn ensure_exists(input: &Path) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }
    Ok(())
}

fn read(input: &Path) -> Result<Vec<u8>> {
    std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn parse_numbers<const N: usize>(value: &str) -> Result<[f32; N], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {} comma-separated numbers, got '{}'", N, value));
    }
    let mut numbers = [0.0; N];
    for (slot, part) in numbers.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{}' is not a number", part))?;
    }
    Ok(numbers)
}

fn parse_rect(value: &str) -> Result<[f32; 4], String> {
    parse_numbers::<4>(value)
}

fn parse_point(value: &str) -> Result<[f32; 2], String> {
    parse_numbers::<2>(value)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let handler = ReplaceHandler::new(&cli.tuning);

    match cli.command {
        Commands::Runs {
            input,
            page,
            render,
        } => handler.runs(&input, page, render)?,
        Commands::Search { input, query } => handler.search(&input, &query)?,
        Commands::Replace {
            input,
            output,
            query,
            with,
            id,
            all,
        } => {
            let selection = match (id, all) {
                (Some(id), false) => MatchSelection::Id(id),
                _ => MatchSelection::All,
            };
            handler.replace(&input, &output, &query, selection, &with)?;
        }
        Commands::Select {
            input,
            output,
            page,
            rect,
            frame,
            displayed_width,
            with,
        } => {
            let mut overlay = OverlayFrame::new(frame[0], frame[1]);
            if let Some(width) = displayed_width {
                overlay = overlay.displayed_at(width);
            }
            handler.select(&input, &output, page, rect, overlay, &with)?;
        }
        Commands::Insert {
            input,
            output,
            page,
            at,
            size,
            text,
        } => {
            let spec = InsertSpec::new(page, Point::new(at[0], at[1]), text).with_font_size(size);
            handler.insert(&input, &output, spec)?;
        }
        Commands::Extract { input, output } => handler.extract(&input, output.as_deref())?,
    }

    Ok(())
}
