use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{DataArgs, RfmSort};
use crate::error::Result;
use crate::fmt::{money, number};
use crate::models::RfmRecord;
use crate::rfm::rfm_analysis;

pub fn run(data: &DataArgs, sort: Option<RfmSort>, limit: Option<usize>) -> Result<()> {
    let (_settings, table) = data.load()?;
    let mut records = rfm_analysis(&table.orders);
    sort_records(&mut records, sort);
    println!("{}", format_rfm(&records, limit));
    Ok(())
}

/// Descending by the chosen column; customer id breaks ties.
pub fn sort_records(records: &mut [RfmRecord], sort: Option<RfmSort>) {
    match sort {
        None => {}
        Some(RfmSort::Recency) => records.sort_by(|a, b| {
            b.recency.cmp(&a.recency).then_with(|| a.customer_id.cmp(&b.customer_id))
        }),
        Some(RfmSort::Frequency) => records.sort_by(|a, b| {
            b.frequency.cmp(&a.frequency).then_with(|| a.customer_id.cmp(&b.customer_id))
        }),
        Some(RfmSort::Monetary) => records.sort_by(|a, b| {
            b.monetary
                .total_cmp(&a.monetary)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        }),
    }
}

pub fn format_rfm(records: &[RfmRecord], limit: Option<usize>) -> String {
    if records.is_empty() {
        return "No customers.".to_string();
    }
    let shown = limit.unwrap_or(records.len()).min(records.len());
    let mut table = Table::new();
    table.set_header(vec!["Customer", "Recency (days)", "Frequency", "Monetary"]);
    for r in &records[..shown] {
        table.add_row(vec![
            Cell::new(&r.customer_id),
            Cell::new(number(r.recency.max(0) as usize)).set_alignment(CellAlignment::Right),
            Cell::new(number(r.frequency)).set_alignment(CellAlignment::Right),
            Cell::new(money(r.monetary)).set_alignment(CellAlignment::Right),
        ]);
    }
    let mut out = table.to_string();
    if shown < records.len() {
        out.push_str(&format!(
            "\n{} of {} customers",
            number(shown),
            number(records.len())
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, recency: i64, frequency: usize, monetary: f64) -> RfmRecord {
        RfmRecord {
            customer_id: id.to_string(),
            recency,
            frequency,
            monetary,
        }
    }

    #[test]
    fn test_sort_by_monetary() {
        let mut records = vec![rec("a", 5, 1, 10.0), rec("b", 1, 3, 99.5), rec("c", 9, 2, 10.0)];
        sort_records(&mut records, Some(RfmSort::Monetary));
        let ids: Vec<&str> = records.iter().map(|r| r.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_sort_by_recency_and_frequency() {
        let mut records = vec![rec("a", 5, 1, 0.0), rec("b", 1, 3, 0.0), rec("c", 9, 2, 0.0)];
        sort_records(&mut records, Some(RfmSort::Recency));
        assert_eq!(records[0].customer_id, "c");
        sort_records(&mut records, Some(RfmSort::Frequency));
        assert_eq!(records[0].customer_id, "b");
    }

    #[test]
    fn test_format_rfm_limit() {
        let records = vec![rec("a", 5, 1, 10.0), rec("b", 1, 3, 1234.5)];
        let s = format_rfm(&records, Some(1));
        assert!(s.contains("a"));
        assert!(!s.contains("1,234.50"));
        assert!(s.contains("1 of 2 customers"));
        let all = format_rfm(&records, None);
        assert!(all.contains("1,234.50"));
        assert!(!all.contains("customers"));
    }

    #[test]
    fn test_format_rfm_empty() {
        assert_eq!(format_rfm(&[], None), "No customers.");
    }
}
