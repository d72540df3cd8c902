//! Plain text output formatting.
//!
//! Produces human-readable output styled with the active [`RenderContext`].
//! Every writer takes an explicit `Write` so the interactive menu and tests
//! can direct output wherever they like.

use crate::output::RenderContext;
use crate::probe::{ProbeOutcome, ProbeStatistics};
use crate::storage::ProbeRecord;
use console::{measure_text_width, style};
use std::io::{self, Write};

/// Cells in the success ratio bar.
pub const RATIO_BAR_WIDTH: usize = 40;

/// Print a run in human-readable form: ratio bar, attempts, statistics.
pub fn write_plain<W: Write>(
    out: &mut W,
    ctx: &RenderContext,
    record: &ProbeRecord,
) -> io::Result<()> {
    let stats = record.statistics();
    write_ratio_bar(out, ctx, &stats)?;
    write_outcomes(out, ctx, &record.outcomes)?;
    write_statistics(out, ctx, &stats)
}

/// Title framed by full-width rules.
pub fn write_header<W: Write>(out: &mut W, ctx: &RenderContext, title: &str) -> io::Result<()> {
    let palette = ctx.palette();
    let line = "=".repeat(ctx.width() - 1);

    writeln!(out)?;
    writeln!(out, "{}", palette.highlight.apply_to(&line))?;
    writeln!(out, "{}", palette.highlight.apply_to(center(title, ctx.width() - 1)))?;
    writeln!(out, "{}", palette.highlight.apply_to(&line))?;
    writeln!(out)
}

/// Text inside a double-lined box.
pub fn write_banner<W: Write>(out: &mut W, ctx: &RenderContext, text: &str) -> io::Result<()> {
    let highlight = &ctx.palette().highlight;

    writeln!(out)?;
    for line in banner_lines(text, ctx.width()) {
        writeln!(out, "{}", highlight.apply_to(line))?;
    }
    writeln!(out)
}

/// Numbered menu options.
pub fn write_menu<W: Write>(out: &mut W, ctx: &RenderContext, options: &[&str]) -> io::Result<()> {
    for (i, option) in options.iter().enumerate() {
        writeln!(
            out,
            "  {} {}",
            ctx.palette().highlight.apply_to(format!("[{}]", i + 1)),
            ctx.palette().text.apply_to(option)
        )?;
    }
    writeln!(out)
}

pub fn write_message<W: Write>(out: &mut W, ctx: &RenderContext, msg: &str) -> io::Result<()> {
    writeln!(out, "{}", ctx.palette().text.apply_to(msg))
}

pub fn write_success<W: Write>(out: &mut W, ctx: &RenderContext, msg: &str) -> io::Result<()> {
    writeln!(out, "{}", ctx.palette().success.apply_to(format!("✓ {}", msg)))
}

pub fn write_failure<W: Write>(out: &mut W, ctx: &RenderContext, msg: &str) -> io::Result<()> {
    writeln!(out, "{}", ctx.palette().error.apply_to(format!("✗ {}", msg)))
}

/// One line per attempt, styled by outcome.
pub fn write_outcomes<W: Write>(
    out: &mut W,
    ctx: &RenderContext,
    outcomes: &[ProbeOutcome],
) -> io::Result<()> {
    for outcome in outcomes {
        if outcome.succeeded {
            write_success(out, ctx, &outcome.detail)?;
        } else {
            write_failure(out, ctx, &outcome.detail)?;
        }
    }
    Ok(())
}

/// `[████░░░░] 3/4 (75.0%)`, filled cells proportional to successes.
pub fn write_ratio_bar<W: Write>(
    out: &mut W,
    ctx: &RenderContext,
    stats: &ProbeStatistics,
) -> io::Result<()> {
    let filled = ratio_cells(stats.succeeded, stats.total, RATIO_BAR_WIDTH);
    let palette = ctx.palette();

    write!(out, "[")?;
    write!(out, "{}", palette.success.apply_to("█".repeat(filled)))?;
    write!(out, "{}", palette.error.apply_to("█".repeat(RATIO_BAR_WIDTH - filled)))?;
    write!(out, "] {}/{}", stats.succeeded, stats.total)?;
    match stats.success_percent() {
        Some(pct) => writeln!(out, " ({:.1}%)", pct),
        None => writeln!(out),
    }
}

/// Sent/received/lost counts and latency when any attempt succeeded.
pub fn write_statistics<W: Write>(
    out: &mut W,
    ctx: &RenderContext,
    stats: &ProbeStatistics,
) -> io::Result<()> {
    let palette = ctx.palette();

    writeln!(out)?;
    writeln!(out, "{}", palette.highlight.apply_to("=== Statistics ==="))?;
    writeln!(out, "Packets sent:     {}", stats.total)?;
    writeln!(out, "Packets received: {}", stats.succeeded)?;
    match stats.loss_percent {
        Some(pct) => writeln!(out, "Packets lost:     {} ({:.1}%)", stats.lost, pct)?,
        None => writeln!(out, "Packets lost:     {}", stats.lost)?,
    }

    if let Some(latency) = stats.latency {
        writeln!(out, "Minimum round-trip: {}ms", latency.min_ms)?;
        writeln!(out, "Maximum round-trip: {}ms", latency.max_ms)?;
        writeln!(out, "Average round-trip: {:.2}ms", latency.mean_ms)?;
    }

    Ok(())
}

/// Number of filled cells for a success ratio, rounded to nearest.
pub fn ratio_cells(succeeded: usize, total: usize, width: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let cells = (succeeded as f64 / total as f64 * width as f64).round() as usize;
    cells.min(width)
}

/// Left-pad text so it sits in the middle of `width` columns.
pub fn center(text: &str, width: usize) -> String {
    let len = measure_text_width(text);
    let pad = width.saturating_sub(len) / 2;
    format!("{}{}", " ".repeat(pad), text)
}

/// The three lines of a boxed banner spanning `width - 1` columns.
///
/// Grows past the width rather than truncating long text.
pub fn banner_lines(text: &str, width: usize) -> [String; 3] {
    let inner = width.saturating_sub(3).max(measure_text_width(text));
    let centered = center(text, inner);
    let fill = inner - measure_text_width(&centered);

    [
        format!("╔{}╗", "═".repeat(inner)),
        format!("║{}{}║", centered, " ".repeat(fill)),
        format!("╚{}╝", "═".repeat(inner)),
    ]
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}
