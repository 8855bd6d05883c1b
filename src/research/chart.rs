//! Weakness distribution charts.

use crate::analysis::aggregation::WeaknessShare;
use crate::types::Result;
use std::path::{Path, PathBuf};

/// Renders a category's weakness distribution and returns where it went.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, category: &str, percentages: &[WeaknessShare]) -> Result<PathBuf>;
}

/// Plain-text horizontal bar chart written to `{dir}/{category}_weakness_distribution.txt`.
#[derive(Debug, Clone)]
pub struct TextChartRenderer {
    output_dir: PathBuf,
    width: usize,
}

impl TextChartRenderer {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            width: 40,
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    /// Chart text. Bars are sorted by percentage and scaled to the largest.
    pub fn draw(&self, category: &str, percentages: &[WeaknessShare]) -> String {
        let title = format!("{}-type Pokémon Weakness Distribution", title_case(category));
        let mut out = format!("{}\n{}\n", title, "=".repeat(title.chars().count()));

        if percentages.is_empty() {
            out.push_str("(no data)\n");
            return out;
        }

        let mut sorted = percentages.to_vec();
        sorted.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

        let max = sorted[0].percentage.max(f64::EPSILON);
        let label_width = sorted
            .iter()
            .map(|s| s.category.title().len())
            .max()
            .unwrap_or(0);

        for share in &sorted {
            let len = ((share.percentage / max) * self.width as f64).round() as usize;
            out.push_str(&format!(
                "{:<label_width$} | {:<width$} {:>5.1}%\n",
                share.category.title(),
                "#".repeat(len),
                share.percentage,
                label_width = label_width,
                width = self.width,
            ));
        }
        out
    }
}

impl ChartRenderer for TextChartRenderer {
    fn render(&self, category: &str, percentages: &[WeaknessShare]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("{}_weakness_distribution.txt", category.to_lowercase()));
        std::fs::write(&path, self.draw(category, percentages))?;
        tracing::info!(path = %path.display(), "Wrote weakness chart");
        Ok(path)
    }
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
