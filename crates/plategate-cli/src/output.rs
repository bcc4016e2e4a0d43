//! Output formatting module

use std::path::Path;

use plategate_app::config::Config;
use plategate_domain::model::{VisitRecord, TIMESTAMP_FORMAT};
use plategate_types::{OutputFormat, Result};

pub fn output_visits(output_format: OutputFormat, visits: &[VisitRecord]) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(visits)?);
        return Ok(());
    }

    if visits.is_empty() {
        println!("No visits recorded");
        return Ok(());
    }

    println!(
        "{:<10} {:<19}  {:<19}  {:>7}  {:<6}  {:<19}  {:>10}",
        "Plate", "Entry", "Exit", "Stay", "Paid", "Paid at", "Amount"
    );
    println!("{}", "-".repeat(99));
    for visit in visits {
        println!(
            "{:<10} {:<19}  {:<19}  {:>7}  {:<6}  {:<19}  {:>10}",
            visit.plate,
            visit.entry_time.format(TIMESTAMP_FORMAT).to_string(),
            time_or_dash(visit.exit_time),
            stay_or_dash(visit),
            if visit.is_paid() { "yes" } else { "no" },
            time_or_dash(visit.payment_time),
            visit
                .amount_paid
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }

    let inside = visits.iter().filter(|v| v.is_open()).count();
    println!("\n{} visits, {} vehicles inside", visits.len(), inside);
    Ok(())
}

pub fn output_payment(output_format: OutputFormat, visit: &VisitRecord) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(visit)?);
        return Ok(());
    }

    println!("\nPayment Recorded");
    println!("================");
    println!("Plate:    {}", visit.plate);
    println!("Entered:  {}", visit.entry_time.format(TIMESTAMP_FORMAT));
    println!("Paid at:  {}", time_or_dash(visit.payment_time));
    if let Some(amount) = visit.amount_paid {
        println!("Amount:   {}", amount);
    }
    Ok(())
}

/// `source` is the file the config was read from, or would be
pub fn output_config(output_format: OutputFormat, config: &Config, source: &Path) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("{}", config);
        println!("Config file:       {}", source.display());
    }
    Ok(())
}

/// Hours and minutes between entry and exit; dash while still inside
fn stay_or_dash(visit: &VisitRecord) -> String {
    match visit.stay_duration() {
        Some(stay) => format!("{}h{:02}m", stay.num_hours(), stay.num_minutes() % 60),
        None => "-".to_string(),
    }
}

fn time_or_dash(time: Option<chrono::NaiveDateTime>) -> String {
    time.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}
