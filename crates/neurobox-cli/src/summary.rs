use std::path::Path;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use neurobox_core::Pipeline;

use crate::commands::RunSummary;

pub fn print_run_summary(summary: &RunSummary) {
    println!(
        "Wrote {} rows x {} columns to {}",
        summary.rows,
        summary.columns,
        summary.output.display()
    );
}

pub fn print_steps(path: &Path, pipeline: &Pipeline) {
    println!("Pipeline: {}", path.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Step"),
        header_cell("Parameters"),
        header_cell("Events"),
    ]);
    apply_table_style(&mut table);
    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    for (index, step) in pipeline.steps().iter().enumerate() {
        let params = match step.param_pairs() {
            Ok(pairs) => pairs
                .into_iter()
                .map(|(name, value)| format!("{name} = {value}"))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(error) => format!("<{error}>"),
        };
        let events = match step.events() {
            Some(events) => Cell::new(format!("{} rows", events.height())),
            None => Cell::new("-").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(index),
            Cell::new(step.name()).add_attribute(Attribute::Bold),
            Cell::new(params),
            events,
        ]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
