//! Text renderings of an estimate in the two industry layouts
//!
//! Both layouts group line items into the same four sections (PARTS, LABOR,
//! PAINT & REFINISH, SUPPLIES) and end with a totals block. Column widths are
//! fixed so output can be compared verbatim.

use std::fmt;

use crate::estimate::{Estimate, EstimateFormat, LineItem, LineItemType};
use crate::vehicle::Vehicle;

const CCC_WIDTH: usize = 80;
const MITCHELL_INNER_WIDTH: usize = 76;

const DESCRIPTION_WIDTH: usize = 38;
const QTY_WIDTH: usize = 8;
const AMOUNT_WIDTH: usize = 14;

const SECTIONS: [(LineItemType, &str); 4] = [
    (LineItemType::Part, "PARTS"),
    (LineItemType::Labor, "LABOR"),
    (LineItemType::Paint, "PAINT & REFINISH"),
    (LineItemType::Supplies, "SUPPLIES"),
];

const DATE_FORMAT: &str = "%m/%d/%Y";

/// Renders with the layout recorded on the estimate
pub fn format_estimate(estimate: &Estimate, vehicle: &Vehicle) -> String {
    match estimate.format {
        EstimateFormat::CccOne => format_ccc_one(estimate, vehicle),
        EstimateFormat::Mitchell => format_mitchell(estimate, vehicle),
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn item_row(item: &LineItem) -> String {
    format!(
        "{:<dw$}{:>qw$}{:>aw$}{:>aw$}",
        truncate(&item.description, DESCRIPTION_WIDTH - 2),
        item.quantity.normalize().to_string(),
        item.unit_price.to_string(),
        item.total.to_string(),
        dw = DESCRIPTION_WIDTH,
        qw = QTY_WIDTH,
        aw = AMOUNT_WIDTH,
    )
}

fn column_header() -> String {
    format!(
        "{:<dw$}{:>qw$}{:>aw$}{:>aw$}",
        "DESCRIPTION",
        "QTY",
        "UNIT PRICE",
        "TOTAL",
        dw = DESCRIPTION_WIDTH,
        qw = QTY_WIDTH,
        aw = AMOUNT_WIDTH,
    )
}

fn totals(estimate: &Estimate) -> [(&'static str, String); 3] {
    [
        ("SUBTOTAL:", estimate.subtotal.to_string()),
        ("TAX:", estimate.tax.to_string()),
        ("TOTAL:", estimate.total.to_string()),
    ]
}

/// Section title and rows for every non-empty section
fn sections(estimate: &Estimate) -> Vec<(&'static str, Vec<String>)> {
    SECTIONS
        .iter()
        .filter_map(|(item_type, title)| {
            let rows: Vec<String> = estimate.items_of(*item_type).map(item_row).collect();
            (!rows.is_empty()).then_some((*title, rows))
        })
        .collect()
}

/// CCC ONE layout: plain ASCII, 80 columns
pub fn format_ccc_one(estimate: &Estimate, vehicle: &Vehicle) -> String {
    CccOne { estimate, vehicle }.to_string()
}

/// Mitchell layout: box-drawn, 78 columns including borders
pub fn format_mitchell(estimate: &Estimate, vehicle: &Vehicle) -> String {
    Mitchell { estimate, vehicle }.to_string()
}

struct CccOne<'a> {
    estimate: &'a Estimate,
    vehicle: &'a Vehicle,
}

impl fmt::Display for CccOne<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let CccOne { estimate, vehicle } = self;
        let heavy = "=".repeat(CCC_WIDTH);
        let light = "-".repeat(CCC_WIDTH);

        writeln!(f, "{}", heavy)?;
        writeln!(f, "{:^w$}", "CCC ONE ESTIMATING SYSTEM", w = CCC_WIDTH)?;
        writeln!(f, "{}", heavy)?;
        writeln!(f, "Estimate ID: {}", estimate.id)?;
        writeln!(
            f,
            "Date: {:<28}Valid Until: {}",
            estimate.generated_at.format(DATE_FORMAT).to_string(),
            estimate.expires_at.format(DATE_FORMAT)
        )?;
        writeln!(f, "Vehicle: {}", vehicle.display_name())?;
        writeln!(f, "VIN: {}", vehicle.vin.as_deref().unwrap_or("N/A"))?;
        writeln!(f, "Labor Rate: {}/hr", estimate.labor_rate)?;
        writeln!(f, "{}", light)?;
        writeln!(f, "{}", column_header())?;
        writeln!(f, "{}", light)?;

        for (title, rows) in sections(estimate) {
            writeln!(f, "{}", title)?;
            for row in rows {
                writeln!(f, "{}", row)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{}", light)?;
        let label_width = DESCRIPTION_WIDTH + QTY_WIDTH + AMOUNT_WIDTH;
        for (label, amount) in totals(estimate) {
            writeln!(f, "{:>lw$}{:>aw$}", label, amount, lw = label_width, aw = AMOUNT_WIDTH)?;
        }
        writeln!(f, "{}", heavy)
    }
}

struct Mitchell<'a> {
    estimate: &'a Estimate,
    vehicle: &'a Vehicle,
}

fn boxed(f: &mut fmt::Formatter<'_>, content: &str) -> fmt::Result {
    writeln!(f, "║{:<w$}║", truncate(content, MITCHELL_INNER_WIDTH), w = MITCHELL_INNER_WIDTH)
}

fn box_rule(f: &mut fmt::Formatter<'_>, left: char, fill: char, right: char) -> fmt::Result {
    writeln!(f, "{}{}{}", left, fill.to_string().repeat(MITCHELL_INNER_WIDTH), right)
}

impl fmt::Display for Mitchell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Mitchell { estimate, vehicle } = self;

        box_rule(f, '╔', '═', '╗')?;
        boxed(f, &format!("{:^w$}", "MITCHELL ESTIMATE", w = MITCHELL_INNER_WIDTH))?;
        box_rule(f, '╠', '═', '╣')?;
        boxed(f, &format!(" Estimate: {}", estimate.id))?;
        boxed(
            f,
            &format!(
                " Written: {}    Expires: {}",
                estimate.generated_at.format(DATE_FORMAT),
                estimate.expires_at.format(DATE_FORMAT)
            ),
        )?;
        boxed(f, &format!(" Vehicle: {}", vehicle.display_name()))?;
        boxed(f, &format!(" VIN: {}", vehicle.vin.as_deref().unwrap_or("N/A")))?;
        box_rule(f, '╟', '─', '╢')?;
        boxed(f, &format!("  {}", column_header()))?;

        for (title, rows) in sections(estimate) {
            box_rule(f, '╟', '─', '╢')?;
            boxed(f, &format!(" {}", title))?;
            for row in rows {
                boxed(f, &format!("  {}", row))?;
            }
        }

        box_rule(f, '╠', '═', '╣')?;
        let label_width = 2 + DESCRIPTION_WIDTH + QTY_WIDTH + AMOUNT_WIDTH;
        for (label, amount) in totals(estimate) {
            boxed(f, &format!("{:>lw$}{:>aw$}", label, amount, lw = label_width, aw = AMOUNT_WIDTH))?;
        }
        box_rule(f, '╚', '═', '╝')
    }
}
