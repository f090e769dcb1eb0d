use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use meal_lens::analysis::{self, AnalysisSession, Outcome};
use meal_lens::config;
use meal_lens::nutrition::NutritionData;
use meal_lens::report::{self, Macro};

#[derive(Parser, Debug)]
#[command(
    name = "meal-lens",
    version,
    about = "Meal photo nutrition viewer: send a meal photo to your analysis webhook and see calories, macros, and itemized foods"
)]
struct Cli {
    /// Meal photos or directories of photos
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Webhook URL (overrides config.json and MEAL_LENS_WEBHOOK_URL)
    #[arg(long, value_name = "URL")]
    webhook_url: Option<String>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if let Ok(path) = dotenv::dotenv() {
        log::debug!("Loaded environment from {}", path.display());
    }

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let config = config::Config::load(cli.config.as_deref())?
        .with_env_overrides()
        .with_url_override(cli.webhook_url.clone());

    let analyzer = match analysis::build_analyzer(&config) {
        Ok(a) => a,
        Err(e) => anyhow::bail!(
            "{e}\nPass --webhook-url, or run `meal-lens-cli --init` and fill in webhook.url."
        ),
    };

    if cli.paths.is_empty() {
        anyhow::bail!("No meal photos specified. Use --help for usage.");
    }

    let images = analysis::collect_images(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    log::info!("Found {} meal photo(s) to analyze", images.len());

    let mut session = AnalysisSession::new();
    let mut results: Vec<NutritionData> = Vec::new();
    let mut failed = 0usize;
    let total = images.len();

    for (i, image_path) in images.iter().enumerate() {
        log::info!("[{}/{}] Analyzing: {}", i + 1, total, image_path.display());

        session.begin();
        let outcome = session.finish(analysis::analyze_path(image_path, &analyzer).await);

        match (outcome, session.result()) {
            (Outcome::Ready, Some(data)) => {
                if !cli.json {
                    print_report(data);
                }
                results.push(data.clone());
            }
            _ => {
                eprintln!("  {RED}{}{RESET}", Outcome::Failed.message());
                failed += 1;
            }
        }
        session.reset();
    }

    // JSON output
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    log::info!(
        "Done: {} analyzed, {failed} failed out of {total} photo(s)",
        results.len()
    );

    if failed > 0 {
        anyhow::bail!("{failed} of {total} photo(s) could not be analyzed");
    }
    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const ORANGE: &str = "\x1b[38;2;249;115;22m";

const RULE_WIDTH: usize = 74;
const CHART_WIDTH: usize = 48;

/// Print the full nutrition breakdown for one meal.
fn print_report(data: &NutritionData) {
    let rule = "─".repeat(RULE_WIDTH);

    println!();
    println!("  {BOLD}{}{RESET}", data.meal_name);
    println!(
        "  {ORANGE}{BOLD}{}{RESET} calories",
        report::format_number(data.calories)
    );
    println!();

    // --- Macro chart ---
    let shares = report::macro_shares(data);
    println!("  {BOLD}Macros{RESET}");
    println!("  {DIM}{rule}{RESET}");
    println!("  {}", macro_bar(&shares));
    println!(
        "  {DIM}Total Macros:{RESET} {}",
        report::format_grams(report::total_macros(data))
    );
    println!();

    // --- Macro cards ---
    for share in &shares {
        println!(
            "  {}■{RESET} {:<8} {:>9}   {DIM}{:>4} of macros{RESET}",
            color(share.kind),
            share.kind.label(),
            report::format_grams(share.grams),
            share.percent_label()
        );
    }
    println!();

    if data.items.is_empty() {
        println!("  {DIM}(no individual food items returned){RESET}");
        println!();
        return;
    }

    // --- Itemized breakdown ---
    println!("  {BOLD}Itemized Breakdown{RESET}");
    println!("  {DIM}{rule}{RESET}");
    println!(
        "  {DIM}{:<26} {:>12} {:>8} {:>8} {:>8} {:>8}{RESET}",
        "Item", "Qty", "Cal", "Protein", "Carbs", "Fat"
    );
    for item in &data.items {
        println!(
            "  {:<26} {:>12} {:>8} {:>8} {:>8} {:>8}",
            truncate(report::item_label(item), 26),
            truncate(report::quantity_label(item), 12),
            report::format_number(item.calories),
            report::format_grams(item.protein),
            report::format_grams(item.carbs),
            report::format_grams(item.fat),
        );
    }

    let totals = report::item_totals(&data.items);
    println!("  {DIM}{rule}{RESET}");
    println!(
        "  {BOLD}{:<26} {:>12} {:>8} {:>8} {:>8} {:>8}{RESET}",
        "Total",
        "—",
        report::format_number(totals.calories),
        report::format_grams(totals.protein),
        report::format_grams(totals.carbs),
        report::format_grams(totals.fat),
    );
    println!();
}

/// 24-bit ANSI foreground for a macro.
fn color(kind: Macro) -> String {
    let (r, g, b) = kind.rgb();
    format!("\x1b[38;2;{r};{g};{b}m")
}

/// Stacked horizontal bar, one segment per macro proportional to its share.
fn macro_bar(shares: &[report::MacroShare; 3]) -> String {
    let widths = segment_widths((*shares).map(|s| s.percent), CHART_WIDTH);
    if widths.iter().all(|&w| w == 0) {
        return format!("{DIM}{}{RESET}", "░".repeat(CHART_WIDTH));
    }

    let mut bar = String::new();
    for (share, width) in shares.iter().zip(widths) {
        bar.push_str(&color(share.kind));
        bar.push_str(&"█".repeat(width));
    }
    bar.push_str(RESET);
    bar
}

/// Split `width` cells by percentage, handing leftover cells to the largest
/// remainders so the segments always fill the bar exactly.
fn segment_widths(percents: [f64; 3], width: usize) -> [usize; 3] {
    let sum: f64 = percents.iter().sum();
    if sum <= 0.0 {
        return [0; 3];
    }

    let exact = percents.map(|p| p / sum * width as f64);
    let mut widths = exact.map(|e| e.floor() as usize);
    let mut leftover = width - widths.iter().sum::<usize>();

    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra)
    });
    for idx in order {
        if leftover == 0 {
            break;
        }
        widths[idx] += 1;
        leftover -= 1;
    }
    widths
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_fill_the_bar() {
        let widths = segment_widths([33.3, 33.3, 33.3], 48);
        assert_eq!(widths.iter().sum::<usize>(), 48);

        let widths = segment_widths([10.0, 20.0, 70.0], 10);
        assert_eq!(widths, [1, 2, 7]);
    }

    #[test]
    fn segments_empty_without_macros() {
        assert_eq!(segment_widths([0.0, 0.0, 0.0], 48), [0, 0, 0]);
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("Salad", 10), "Salad");
        assert_eq!(truncate("Grilled chicken breast", 8), "Grilled…");
    }
}
