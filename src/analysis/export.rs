//! CSV export of sampled entity records.

use crate::analysis::category::Category;
use crate::types::{AppError, EntityRecord, Result};
use std::collections::BTreeSet;
use std::path::Path;

const HEADER: [&str; 10] = [
    "name",
    "types",
    "hp",
    "attack",
    "defense",
    "special_attack",
    "special_defense",
    "speed",
    "weaknesses",
    "resistances",
];

fn join_categories(set: &BTreeSet<Category>) -> String {
    set.iter().map(Category::as_str).collect::<Vec<_>>().join("|")
}

fn csv_error(e: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("CSV export failed: {}", e))
}

/// Render records as CSV, one row per entity. Multi-valued columns are `|`-joined.
pub fn stats_to_csv(records: &[EntityRecord]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());

    writer.write_record(HEADER).map_err(csv_error)?;

    for record in records {
        let mut row = vec![record.name.clone(), record.types.join("|")];
        row.extend(record.stats.values().iter().map(u32::to_string));
        row.push(join_categories(&record.weaknesses));
        row.push(join_categories(&record.resistances));
        writer.write_record(&row).map_err(csv_error)?;
    }

    writer.flush()?;
    let data = writer.into_inner().map_err(csv_error)?;
    String::from_utf8(data).map_err(csv_error)
}

/// Write [`stats_to_csv`] output to `path`, creating parent directories.
pub fn export_stats_csv(records: &[EntityRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, stats_to_csv(records)?)?;
    tracing::info!(path = %path.display(), rows = records.len(), "Exported entity stats");
    Ok(())
}
