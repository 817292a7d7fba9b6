//! Text rendering for the square grid, error reports, and the debug block.

use grid::GridPlan;
use shared::{domain::Square, error::ErrorReport};

/// Color used when a square's color string cannot be parsed.
pub const FALLBACK_COLOR: (u8, u8, u8) = (255, 0, 0);

pub struct RenderOptions {
    pub color: bool,
    pub by_position: bool,
}

fn plan_for(squares: &[Square], by_position: bool) -> GridPlan {
    if by_position {
        GridPlan::by_position(squares.iter().map(|square| square.position))
    } else {
        GridPlan::by_insertion(squares.len())
    }
}

/// Render the collection as a square character grid, one two-column cell
/// per coordinate. Colored output paints each occupied cell with a
/// truecolor block; symbolic output uses `#` marks instead.
pub fn render_grid(squares: &[Square], options: &RenderOptions) -> String {
    if squares.is_empty() {
        return "(no squares)\n".to_string();
    }

    let plan = plan_for(squares, options.by_position);
    let dimension = plan.dimension();
    let mut occupied: Vec<Option<&Square>> = vec![None; dimension * dimension];
    for (square, cell) in squares.iter().zip(plan.cells()) {
        occupied[cell.row * dimension + cell.col] = Some(square);
    }

    let mut out = String::new();
    for row in 0..dimension {
        for col in 0..dimension {
            match occupied[row * dimension + col] {
                Some(square) => out.push_str(&paint_cell(&square.color, options.color)),
                None if options.color => out.push_str("\u{1b}[2m\u{b7} \u{1b}[0m"),
                None => out.push_str("\u{b7} "),
            }
        }
        out.push('\n');
    }
    out
}

fn paint_cell(color: &str, use_color: bool) -> String {
    if !use_color {
        return "# ".to_string();
    }
    let (r, g, b) = parse_color(color).unwrap_or(FALLBACK_COLOR);
    format!("\u{1b}[38;2;{r};{g};{b}m\u{2588}\u{2588}\u{1b}[0m")
}

/// Parse `#rgb` / `#rrggbb` hex notation or one of the common CSS color
/// names. Anything else is `None` and renders as [`FALLBACK_COLOR`].
pub fn parse_color(color: &str) -> Option<(u8, u8, u8)> {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        return parse_hex(hex);
    }
    named_color(color)
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
            Some((r * 17, g * 17, b * 17))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

fn named_color(name: &str) -> Option<(u8, u8, u8)> {
    let rgb = match name.to_ascii_lowercase().as_str() {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "lime" => (0, 255, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "cyan" | "aqua" => (0, 255, 255),
        "magenta" | "fuchsia" => (255, 0, 255),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "pink" => (255, 192, 203),
        "gray" | "grey" => (128, 128, 128),
        "silver" => (192, 192, 192),
        "maroon" => (128, 0, 0),
        "navy" => (0, 0, 128),
        "teal" => (0, 128, 128),
        "olive" => (128, 128, 0),
        _ => return None,
    };
    Some(rgb)
}

/// Render an error report: title with status, detail, then any per-field
/// validation messages.
pub fn render_report(report: &ErrorReport) -> String {
    let mut out = format!("{} ({})\n{}\n", report.title, report.status, report.detail);
    if let Some(errors) = &report.validation_errors {
        out.push_str("Validation Errors:\n");
        for (field, messages) in errors {
            out.push_str(&format!("  {}: {}\n", field, messages.join(", ")));
        }
    }
    out
}

/// The debug block: square count, grid dimension, and the first square
/// as JSON.
pub fn render_debug(squares: &[Square], by_position: bool) -> String {
    let plan = plan_for(squares, by_position);
    let mut out = format!("Squares count: {}\n", squares.len());
    out.push_str(&format!("Grid size: {0}x{0}\n", plan.dimension()));
    if let Some(first) = squares.first() {
        let json =
            serde_json::to_string(first).unwrap_or_else(|_| "<unserializable>".to_string());
        out.push_str(&format!("First square: {json}\n"));
    }
    out
}
