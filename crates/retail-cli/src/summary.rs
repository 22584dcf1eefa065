use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use retail_cli::types::{RunOutcome, RunReport};
use retail_validate::GateReport;

pub fn print_summary(report: &RunReport) {
    println!("Environment: {}", report.environment);
    println!("Output: {}", report.output_path.display());
    println!("Outcome: {}", report.outcome.label());

    print_stage_table(report);
    print_gate_table(&report.gates);
}

fn print_stage_table(report: &RunReport) {
    let counts = &report.counts;
    let mut table = Table::new();
    table.set_header(vec![header_cell("Stage"), header_cell("Rows")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);

    let mut rows: Vec<(&str, usize)> = vec![
        ("Ingested", counts.ingested),
        ("After dedup", counts.deduplicated),
    ];
    if !matches!(report.outcome, RunOutcome::InputGateFailed) {
        rows.push(("After date filter", counts.date_filtered));
        rows.push(("After category filter", counts.category_filtered));
        rows.push(("After condition union", counts.unioned));
    }
    if matches!(report.outcome, RunOutcome::Written | RunOutcome::DryRun) {
        rows.push(("Written", counts.written));
    }
    for (stage, count) in rows {
        table.add_row(vec![Cell::new(stage), Cell::new(count)]);
    }
    println!("{table}");
}

fn print_gate_table(gates: &[GateReport]) {
    if gates.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Checkpoint"),
        header_cell("Check"),
        header_cell("Status"),
        header_cell("Detail"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    for gate in gates {
        for check in &gate.checks {
            table.add_row(vec![
                Cell::new(gate.checkpoint.label()),
                Cell::new(&check.name),
                status_cell(check.passed),
                Cell::new(&check.detail),
            ]);
        }
    }
    println!();
    println!("Quality gates:");
    println!("{table}");
}

fn status_cell(passed: bool) -> Cell {
    if passed {
        Cell::new("PASS")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        Cell::new("FAIL")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
