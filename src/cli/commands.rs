use crate::config::{AgeingConfig, DEFAULT_OUTPUT_FILE};
use crate::core::dates::parse_reference_date;
use crate::core::{AgeingTransformer, Slab, SLAB_RULES};
use crate::error::AgeingResult;
use crate::excel::{WorkbookExporter, WorkbookImporter};
use crate::types::Table;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Rows shown when printing a table to the terminal.
const MAX_PRINTED_ROWS: usize = 20;
/// Rows shown in the verbose post-backfill preview.
const PREVIEW_ROWS: usize = 5;
const MAX_CELL_WIDTH: usize = 24;

/// Output path used when none is given: next to the input file.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_file_name(DEFAULT_OUTPUT_FILE)
}

/// Execute the process command
///
/// The output workbook is written even when the date column is missing (it
/// then holds the flattened sheets); the schema error is returned afterwards.
pub fn process(
    input: PathBuf,
    date: Option<String>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    verbose: bool,
) -> AgeingResult<()> {
    let reference_date = parse_reference_date(date.as_deref())?;
    let config = AgeingConfig::load_or_default(config.as_deref())?;
    let output = output.unwrap_or_else(|| default_output_path(&input));

    println!("{}", "📅 Ageing - Processing workbook".bold().green());
    println!("   Input:          {}", input.display());
    println!("   Reference date: {}", reference_date.to_string().bright_yellow());
    println!();

    if verbose {
        println!("{}", "📖 Reading Excel file...".cyan());
    }
    let sheets = WorkbookImporter::new(&input).import()?;
    if verbose {
        for sheet in &sheets.sheets {
            let marker = if sheet.has_column(&config.date_column) {
                "✓".green()
            } else {
                "–".dimmed()
            };
            println!(
                "   {} {} ({} rows, {} columns)",
                marker,
                sheet.name.bright_blue(),
                sheet.row_count(),
                sheet.column_count()
            );
        }
        println!();
    }

    let transformer = AgeingTransformer::with_config(config.clone(), reference_date);
    let outcome = transformer.run(sheets);

    for warning in &outcome.warnings {
        println!("{}", format!("⚠️  {}", warning).yellow());
        print_table(&warning.rows, "   ");
        println!();
    }

    if outcome.is_annotated() {
        if verbose {
            println!("{}", "Columns after updating Ageing and Slab:".cyan());
            let preview = outcome.table.preview(
                &[
                    config.legacy_ageing_column.as_str(),
                    config.legacy_slab_column.as_str(),
                    config.ageing_column.as_str(),
                    config.slab_column.as_str(),
                ],
                PREVIEW_ROWS,
            );
            print_table(&preview, "   ");
            println!();
        }

        println!("{}", "📊 Slab summary:".bold().cyan());
        let counts = transformer.slab_counts(&outcome.table);
        for slab in Slab::ALL {
            println!(
                "   {:<8} {}",
                slab.label().bright_blue(),
                counts.get(&slab).copied().unwrap_or(0)
            );
        }
        println!();
    }

    WorkbookExporter::new(&outcome.table, &config.output_sheet).export(&output)?;

    if let Some(err) = outcome.schema_error {
        println!(
            "{}",
            "⚠️  Ageing not computed; sheets written unprocessed".yellow()
        );
        println!("   Output: {}", output.display());
        return Err(err);
    }

    println!(
        "{}",
        "✅ The Excel file has been successfully processed!".bold().green()
    );
    println!("   Rows:   {}", outcome.table.row_count());
    println!("   Output: {}", output.display().to_string().bright_white());

    Ok(())
}

/// Execute the inspect command - list sheets and whether they can be aged
pub fn inspect(input: PathBuf, config: Option<PathBuf>) -> AgeingResult<()> {
    let config = AgeingConfig::load_or_default(config.as_deref())?;
    let sheets = WorkbookImporter::new(&input).import()?;

    println!("{}", "🔍 Ageing - Workbook contents".bold().green());
    println!("   File: {}\n", input.display());

    for sheet in &sheets.sheets {
        println!(
            "   📄 {} ({} rows, {} columns)",
            sheet.name.bright_blue().bold(),
            sheet.row_count(),
            sheet.column_count()
        );
        if sheet.has_column(&config.date_column) {
            println!("      {} '{}'", "✓".green(), config.date_column);
        } else {
            println!("      {} no '{}' column", "✗".red(), config.date_column);
        }
        for legacy in [&config.legacy_ageing_column, &config.legacy_slab_column] {
            if sheet.has_column(legacy) {
                println!("      ↻ '{}' will be refreshed", legacy);
            }
        }
    }

    println!();
    println!(
        "   Total: {} sheets, {} rows",
        sheets.sheets.len(),
        sheets.total_rows()
    );

    if !sheets
        .sheets
        .iter()
        .any(|s| s.has_column(&config.date_column))
    {
        println!(
            "{}",
            format!("⚠️  No sheet has a '{}' column", config.date_column).yellow()
        );
    }

    Ok(())
}

/// Execute the slabs command - print the slab rule table
pub fn slabs() -> AgeingResult<()> {
    println!("{}", "📐 Ageing slabs (first match wins)".bold().green());
    for rule in SLAB_RULES.iter() {
        println!(
            "   {:<16} → {}",
            rule.condition(),
            rule.slab.label().bright_blue()
        );
    }
    println!(
        "   {:<16} → {}",
        "undefined",
        Slab::NoSlab.label().bright_blue()
    );
    Ok(())
}

/// Print a table as aligned text, truncated to [`MAX_PRINTED_ROWS`]
fn print_table(table: &Table, indent: &str) {
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            table
                .rows
                .iter()
                .take(MAX_PRINTED_ROWS)
                .map(|r| r[i].to_string().chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH)
        })
        .collect();

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(name, w)| pad(name, *w))
        .collect();
    println!("{}{}", indent, header.join("  ").bold());

    for row in table.rows.iter().take(MAX_PRINTED_ROWS) {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(value, w)| pad(&value.to_string(), *w))
            .collect();
        println!("{}{}", indent, cells.join("  "));
    }

    if table.row_count() > MAX_PRINTED_ROWS {
        println!(
            "{}… {} more rows",
            indent,
            table.row_count() - MAX_PRINTED_ROWS
        );
    }
}

/// Left-align `text` in `width` characters, truncating with an ellipsis
fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len > width {
        let truncated: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", truncated)
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
