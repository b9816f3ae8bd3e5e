//! Optimization CLI commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, OptimizationResponse, ProfileResponse};
use crate::output::{format_currency, format_percent, print_heading, print_json, OutputFormat};

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "VMs")]
    count: usize,
    #[tabled(rename = "IDs")]
    ids: String,
}

fn bucket(category: &str, ids: &[String]) -> BucketRow {
    BucketRow {
        category: category.to_string(),
        count: ids.len(),
        ids: if ids.is_empty() {
            "-".to_string()
        } else {
            ids.join(", ")
        },
    }
}

/// Show optimization buckets and the estimated savings
pub async fn show_optimizations(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: OptimizationResponse = client.get("api/v1/optimizations").await?;

    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Table => {
            let currency = client.get::<ProfileResponse>("api/v1/profile").await?.currency;
            let summary = &result.summary;

            print_heading("Optimization Opportunities", 60);
            let rows = vec![
                bucket("Oversized", &summary.oversized),
                bucket("Zombie", &summary.zombies),
                bucket("Powered off", &summary.powered_off),
                bucket("Missing tags", &summary.missing_tags),
            ];
            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!();

            println!(
                "Current Monthly:        {}",
                format_currency(result.total_monthly, &currency)
            );
            println!(
                "{} {} ({} of monthly)",
                "Potential Savings:".bold(),
                format_currency(summary.total_savings_opportunity, &currency)
                    .green()
                    .bold(),
                format_percent(result.savings_percent)
            );
            println!(
                "Missing tags:           {} of VMs",
                format_percent(result.missing_tag_percent)
            );
        }
    }

    Ok(())
}
