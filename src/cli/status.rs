use crate::cli::DataArgs;
use crate::error::Result;
use crate::fmt::number;
use crate::loader::load_orders;
use crate::reports::{available_years, headline};
use crate::settings::{load_settings, settings_path};

pub fn run(data: &DataArgs) -> Result<()> {
    let settings = load_settings();
    let path = data.resolve(&settings);

    println!("Settings:   {}", settings_path().display());
    println!("Dataset:    {}", path.display());
    println!(
        "Banner:     {}",
        match settings.banner_path() {
            Some(p) if p.exists() => p.display().to_string(),
            Some(p) => format!("{} (missing)", p.display()),
            None => "(none)".to_string(),
        }
    );

    if !path.exists() {
        println!();
        println!("Dataset not found. Set one with `ecomdash config --data-path <csv>`.");
        return Ok(());
    }

    let table = load_orders(&path)?;
    let h = headline(&table.orders);
    let years = available_years(&table.orders);

    println!();
    println!("Rows:       {}", number(h.total_orders));
    println!("Customers:  {}", number(h.total_customers));
    match (years.first(), years.last()) {
        (Some(first), Some(last)) => println!("Years:      {first}-{last}"),
        _ => println!("Years:      (none)"),
    }
    Ok(())
}
