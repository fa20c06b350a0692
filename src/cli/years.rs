use crate::cli::DataArgs;
use crate::error::Result;
use crate::reports::year_options;

pub fn run(data: &DataArgs) -> Result<()> {
    let (_settings, table) = data.load()?;
    for option in year_options(&table.orders) {
        println!("{option}");
    }
    Ok(())
}
