use std::path::PathBuf;

use tracing::info;

use crate::cli::DataArgs;
use crate::error::Result;
use crate::models::YearFilter;
use crate::reports::{build_dashboard, DashboardReport};
use crate::settings::shellexpand_path;

pub fn run(data: &DataArgs, year: YearFilter, output: Option<String>) -> Result<()> {
    let (settings, table) = data.load()?;
    let report = build_dashboard(&table.orders, year, settings.histogram_bins);
    let json = to_json(&report)?;

    match output {
        None => println!("{json}"),
        Some(path) => {
            let p = PathBuf::from(shellexpand_path(&path));
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&p, format!("{json}\n"))?;
            info!(path = %p.display(), "wrote JSON export");
            println!("Wrote {}", p.display());
        }
    }
    Ok(())
}

pub fn to_json(report: &DashboardReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_timestamp;
    use crate::models::OrderRecord;

    #[test]
    fn test_json_shape() {
        let orders = vec![
            OrderRecord::new("1", "A", parse_timestamp("2021-01-05").unwrap(), Some("X".into()), Some("card".into()), 10.0),
            OrderRecord::new("2", "B", parse_timestamp("2021-03-10").unwrap(), None, Some("cash".into()), 20.0),
        ];
        let report = build_dashboard(&orders, YearFilter::Year(2021), 5);
        let value: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();

        assert_eq!(value["filter"], 2021);
        assert_eq!(value["headline"]["total_orders"], 2);
        assert_eq!(value["headline"]["total_customers"], 2);
        assert_eq!(value["order_trend"].as_array().unwrap().len(), 3);
        assert_eq!(value["order_trend"][1]["month"], "2021-02");
        assert_eq!(value["order_trend"][1]["orders"], 0);
        assert_eq!(value["top_categories"][0]["label"], "X");
        assert_eq!(value["payment_methods"].as_array().unwrap().len(), 2);
        assert_eq!(value["rfm"]["customers"], 2);
        assert_eq!(
            value["rfm"]["recency"]["histogram"]["counts"].as_array().unwrap().len(),
            5
        );
        assert!(value.get("rfm_records").is_none());
    }

    #[test]
    fn test_all_years_serializes_as_string() {
        let report = build_dashboard(&[], YearFilter::All, 20);
        let value: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
        assert_eq!(value["filter"], "all");
        assert_eq!(value["headline"]["total_orders"], 0);
    }
}
