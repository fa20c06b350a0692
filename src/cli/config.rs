use crate::error::{DashError, Result};
use crate::settings::{load_settings, save_settings, settings_path, Settings};

pub fn run(
    data_path: Option<String>,
    banner_path: Option<String>,
    bins: Option<usize>,
) -> Result<()> {
    let mut settings = load_settings();
    let changed = apply(&mut settings, data_path, banner_path, bins)?;
    if changed {
        save_settings(&settings)?;
        println!("Saved {}", settings_path().display());
    }
    print_settings(&settings);
    Ok(())
}

/// Apply the given overrides. Returns whether anything changed.
pub fn apply(
    settings: &mut Settings,
    data_path: Option<String>,
    banner_path: Option<String>,
    bins: Option<usize>,
) -> Result<bool> {
    let mut changed = false;
    if let Some(p) = data_path {
        settings.data_path = p;
        changed = true;
    }
    if let Some(p) = banner_path {
        settings.banner_path = if p.trim().is_empty() { None } else { Some(p) };
        changed = true;
    }
    if let Some(n) = bins {
        if n == 0 {
            return Err(DashError::Settings("--bins must be at least 1".into()));
        }
        settings.histogram_bins = n;
        changed = true;
    }
    Ok(changed)
}

fn print_settings(settings: &Settings) {
    println!("Data path:   {}", settings.data_path);
    println!(
        "Banner:      {}",
        settings.banner_path.as_deref().unwrap_or("(none)")
    );
    println!("Bins:        {}", settings.histogram_bins);
}
