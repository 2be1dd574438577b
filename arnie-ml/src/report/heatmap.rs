//! Confusion-matrix heatmap rendered to SVG through a handlebars template.

use crate::error::MlError;
use crate::training::metrics::ConfusionMatrix;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;

const CELL: u32 = 140;
const ORIGIN_X: u32 = 150;
const ORIGIN_Y: u32 = 60;

// Sequential blue ramp, lightest for zero counts.
const LOW: (f64, f64, f64) = (247.0, 251.0, 255.0);
const HIGH: (f64, f64, f64) = (8.0, 48.0, 107.0);

const TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="{{width}}" height="{{height}}" viewBox="0 0 {{width}} {{height}}" font-family="sans-serif">
  <rect width="100%" height="100%" fill="#ffffff"/>
  <text x="{{center_x}}" y="34" font-size="18" text-anchor="middle">{{title}}</text>
{{#each cells}}
  <rect x="{{x}}" y="{{y}}" width="{{size}}" height="{{size}}" fill="{{fill}}" stroke="#ffffff" stroke-width="2"/>
  <text x="{{text_x}}" y="{{text_y}}" font-size="22" text-anchor="middle" dominant-baseline="middle" fill="{{text_color}}">{{count}}</text>
{{/each}}
{{#each x_ticks}}
  <text x="{{pos}}" y="{{../x_tick_y}}" font-size="14" text-anchor="middle">{{label}}</text>
{{/each}}
{{#each y_ticks}}
  <text x="{{../y_tick_x}}" y="{{pos}}" font-size="14" text-anchor="end" dominant-baseline="middle">{{label}}</text>
{{/each}}
  <text x="{{center_x}}" y="{{x_title_y}}" font-size="15" text-anchor="middle">Predicted Label</text>
  <text x="28" y="{{center_y}}" font-size="15" text-anchor="middle" transform="rotate(-90 28 {{center_y}})">True Label</text>
</svg>
"##;

#[derive(Serialize)]
struct Cell {
    x: u32,
    y: u32,
    size: u32,
    text_x: u32,
    text_y: u32,
    fill: String,
    text_color: &'static str,
    count: usize,
}

#[derive(Serialize)]
struct Tick<'a> {
    pos: u32,
    label: &'a str,
}

#[derive(Serialize)]
struct HeatmapView<'a> {
    title: &'a str,
    width: u32,
    height: u32,
    center_x: u32,
    center_y: u32,
    x_title_y: u32,
    x_tick_y: u32,
    y_tick_x: u32,
    cells: Vec<Cell>,
    x_ticks: Vec<Tick<'a>>,
    y_ticks: Vec<Tick<'a>>,
}

/// Linear interpolation along the blue ramp for `t` in `[0, 1]`.
fn shade(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let mix = |lo: f64, hi: f64| (lo + (hi - lo) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(LOW.0, HIGH.0),
        mix(LOW.1, HIGH.1),
        mix(LOW.2, HIGH.2)
    )
}

/// Tick positions at cell centers along one axis.
fn ticks(origin: u32, class_names: &[String; 2]) -> Vec<Tick<'_>> {
    class_names
        .iter()
        .enumerate()
        .map(|(i, name)| Tick {
            pos: origin + CELL * i as u32 + CELL / 2,
            label: name,
        })
        .collect()
}

/// SVG document for `matrix`: rows are true labels, columns predicted labels.
pub fn render_heatmap(
    matrix: &ConfusionMatrix,
    class_names: &[String; 2],
    title: &str,
) -> Result<String, MlError> {
    let max = matrix.max_count().max(1) as f64;
    let mut cells = Vec::with_capacity(4);
    for (truth, row) in matrix.counts.iter().enumerate() {
        for (pred, &count) in row.iter().enumerate() {
            let t = count as f64 / max;
            let x = ORIGIN_X + CELL * pred as u32;
            let y = ORIGIN_Y + CELL * truth as u32;
            cells.push(Cell {
                x,
                y,
                size: CELL,
                text_x: x + CELL / 2,
                text_y: y + CELL / 2,
                fill: shade(t),
                text_color: if t > 0.5 { "#ffffff" } else { "#000000" },
                count,
            });
        }
    }

    let view = HeatmapView {
        title,
        width: ORIGIN_X + 2 * CELL + 30,
        height: ORIGIN_Y + 2 * CELL + 70,
        center_x: ORIGIN_X + CELL,
        center_y: ORIGIN_Y + CELL,
        x_title_y: ORIGIN_Y + 2 * CELL + 55,
        x_tick_y: ORIGIN_Y + 2 * CELL + 24,
        y_tick_x: ORIGIN_X - 10,
        cells,
        x_ticks: ticks(ORIGIN_X, class_names),
        y_ticks: ticks(ORIGIN_Y, class_names),
    };

    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    Ok(handlebars.render_template(TEMPLATE, &view)?)
}

/// Render and write the heatmap, creating parent directories as needed.
pub fn write_heatmap(
    path: &Path,
    matrix: &ConfusionMatrix,
    class_names: &[String; 2],
    title: &str,
) -> Result<(), MlError> {
    let svg = render_heatmap(matrix, class_names, title)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, svg)
        .map_err(|e| MlError::report(format!("cannot write {}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), "Wrote confusion matrix heatmap");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> [String; 2] {
        ["Non-Arnie".to_string(), "Arnie".to_string()]
    }

    fn matrix() -> ConfusionMatrix {
        ConfusionMatrix {
            counts: [[27, 3], [5, 3]],
        }
    }

    #[test]
    fn test_svg_carries_labels_and_counts() {
        let svg = render_heatmap(&matrix(), &names(), "Confusion Matrix").unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">Predicted Label<"));
        assert!(svg.contains(">True Label<"));
        assert!(svg.contains(">Non-Arnie<"));
        assert!(svg.contains(">Arnie<"));
        for count in ["27", "3", "5"] {
            assert!(svg.contains(&format!(">{count}</text>")));
        }
        assert_eq!(svg.matches("<rect").count(), 5);
    }

    #[test]
    fn test_largest_count_is_darkest() {
        let svg = render_heatmap(&matrix(), &names(), "t").unwrap();
        assert!(svg.contains(&shade(1.0)));
        assert_eq!(shade(1.0), "#08306b");
        assert_eq!(shade(0.0), "#f7fbff");
    }

    #[test]
    fn test_all_zero_matrix_renders() {
        let svg = render_heatmap(&ConfusionMatrix::default(), &names(), "empty").unwrap();
        assert_eq!(svg.matches(">0</text>").count(), 4);
    }

    #[test]
    fn test_class_names_are_escaped() {
        let odd = ["<neg>".to_string(), "pos".to_string()];
        let svg = render_heatmap(&matrix(), &odd, "t").unwrap();
        assert!(!svg.contains("<neg>"));
        assert!(svg.contains("&lt;neg&gt;"));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots").join("cm.svg");
        write_heatmap(&path, &matrix(), &names(), "Confusion Matrix").unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Predicted Label"));
    }
}
