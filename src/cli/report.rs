use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::DataArgs;
use crate::error::Result;
use crate::fmt::{money, number};
use crate::models::YearFilter;
use crate::reports::{build_dashboard, DashboardReport, LabelCount, MonthCount};
use crate::rfm::{MetricDistribution, RfmSummary};

pub const TITLE: &str = "E-commerce Public Dataset Dashboard";

pub fn run(data: &DataArgs, year: YearFilter) -> Result<()> {
    let (settings, table) = data.load()?;
    let report = build_dashboard(&table.orders, year, settings.histogram_bins);
    println!("{}", format_report(&report));
    Ok(())
}

// ---------------------------------------------------------------------------
// Pure formatting functions (report data → String)
// ---------------------------------------------------------------------------

pub fn format_report(report: &DashboardReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", TITLE.bold()));
    out.push_str(&format!("Year: {}\n\n", report.filter));
    out.push_str(&format_headline(report));
    out.push_str(&format!("\n{}\n", "Order Trend".yellow().bold()));
    out.push_str(&format_trend(&report.order_trend));
    out.push_str(&format!("\n{}\n", "Top Product Categories".yellow().bold()));
    out.push_str(&format_counts(&report.top_categories, "Category", "Orders"));
    out.push_str(&format!("\n{}\n", "Payment Methods".yellow().bold()));
    out.push_str(&format_counts(&report.payment_methods, "Method", "Uses"));
    out.push_str(&format!("\n{}\n", "RFM Analysis (all years)".yellow().bold()));
    out.push_str(&format_rfm_summary(&report.rfm));
    out
}

fn format_headline(report: &DashboardReport) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Total Orders", "Total Customers"]);
    table.add_row(vec![
        Cell::new(number(report.headline.total_orders)).set_alignment(CellAlignment::Right),
        Cell::new(number(report.headline.total_customers)).set_alignment(CellAlignment::Right),
    ]);
    format!("{table}\n")
}

pub fn format_trend(trend: &[MonthCount]) -> String {
    if trend.is_empty() {
        return "  No orders.\n".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Month", "Orders"]);
    for m in trend {
        table.add_row(vec![
            Cell::new(m.month.to_string()),
            Cell::new(number(m.orders as usize)).set_alignment(CellAlignment::Right),
        ]);
    }
    format!("{table}\n")
}

pub fn format_counts(counts: &[LabelCount], label_header: &str, count_header: &str) -> String {
    if counts.is_empty() {
        return "  No orders.\n".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec![label_header, count_header]);
    for c in counts {
        table.add_row(vec![
            Cell::new(&c.label),
            Cell::new(number(c.count as usize)).set_alignment(CellAlignment::Right),
        ]);
    }
    format!("{table}\n")
}

fn metric_row(metric: &MetricDistribution) -> Vec<Cell> {
    match &metric.histogram {
        None => vec![
            Cell::new(metric.name),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
        ],
        Some(h) => {
            let mode_bin = h
                .counts
                .iter()
                .enumerate()
                .max_by_key(|(i, c)| (**c, std::cmp::Reverse(*i)))
                .map(|(i, _)| i)
                .unwrap_or(0);
            let lo = h.min + h.bin_width * mode_bin as f64;
            vec![
                Cell::new(metric.name),
                Cell::new(money(h.min)).set_alignment(CellAlignment::Right),
                Cell::new(money(h.max)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{} to {}", money(lo), money(lo + h.bin_width))),
            ]
        }
    }
}

pub fn format_rfm_summary(rfm: &RfmSummary) -> String {
    if rfm.customers == 0 {
        return "  No customers.\n".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Min", "Max", "Most common range"]);
    for metric in rfm.metrics() {
        table.add_row(metric_row(metric));
    }
    format!("Customers: {}\n{table}\n", number(rfm.customers))
}
