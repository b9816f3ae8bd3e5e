//! Cost-related CLI commands

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;
use vmcost_lib::cost::GroupBy;
use vmcost_lib::{AdvancedCostProfile, CostSummary, VmCost};

use crate::client::{AdvancedCostResponse, ApiClient, ProfileResponse};
use crate::output::{
    color_status, format_currency, print_heading, print_json, print_table, tag_or_dash,
    OutputFormat,
};

/// Row for the grouped breakdown table
#[derive(Tabled)]
struct BreakdownRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "Share")]
    share: String,
}

#[derive(Tabled, Serialize)]
struct VmCostRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Environment")]
    environment: String,
    #[tabled(rename = "Department")]
    department: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "Daily")]
    daily: String,
}

fn group_label(group_by: GroupBy) -> &'static str {
    match group_by {
        GroupBy::Department => "Department",
        GroupBy::Environment => "Environment",
        GroupBy::Application => "Application",
    }
}

/// Show fleet totals and a breakdown under the active profile
pub async fn show_costs(client: &ApiClient, group_by: GroupBy, format: OutputFormat) -> Result<()> {
    let summary: CostSummary = client.get("api/v1/costs").await?;

    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Table => {
            let profile: ProfileResponse = client.get("api/v1/profile").await?;
            let currency = &profile.currency;

            print_heading("Cost Summary", 50);
            match profile.completed_path {
                Some(path) => println!("Profile:                {}", path.to_string().cyan()),
                None => println!("Profile:                {}", "default benchmark".cyan()),
            }
            println!(
                "{}       {}",
                "Total Monthly:".bold(),
                format_currency(summary.total_monthly, currency).green().bold()
            );
            println!(
                "Total Daily:            {}",
                format_currency(summary.total_daily, currency)
            );
            println!();

            println!("{}", format!("By {}", group_label(group_by)).bold());
            println!("{}", "-".repeat(50));

            let rows: Vec<BreakdownRow> = summary
                .breakdown(group_by)
                .iter()
                .map(|(group, monthly)| BreakdownRow {
                    group: group.clone(),
                    monthly: format_currency(*monthly, currency),
                    share: if summary.total_monthly > 0.0 {
                        format!("{:.1}%", monthly / summary.total_monthly * 100.0)
                    } else {
                        "n/a".to_string()
                    },
                })
                .collect();

            if rows.is_empty() {
                println!("{}", "No VMs in inventory".yellow());
            } else {
                let table = tabled::Table::new(rows)
                    .with(tabled::settings::Style::rounded())
                    .to_string();
                println!("{}", table);
            }
        }
    }

    Ok(())
}

/// Show per-VM costs under the active profile
pub async fn show_vm_costs(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let lines: Vec<VmCost> = client.get("api/v1/costs/vms").await?;

    match format {
        OutputFormat::Json => print_json(&lines),
        OutputFormat::Table => {
            let profile: ProfileResponse = client.get("api/v1/profile").await?;
            let currency = &profile.currency;

            let rows: Vec<VmCostRow> = lines
                .iter()
                .map(|line| VmCostRow {
                    id: line.id.clone(),
                    name: line.name.clone(),
                    state: color_status(line.power_state.as_str()),
                    environment: tag_or_dash(line.environment.as_deref()),
                    department: tag_or_dash(line.department.as_deref()),
                    monthly: format_currency(line.monthly_cost, currency),
                    daily: format_currency(line.daily_cost, currency),
                })
                .collect();
            print_table(&rows, format);

            let total: f64 = lines.iter().map(|line| line.monthly_cost).sum();
            println!();
            println!(
                "{} {}",
                "Total Monthly:".bold(),
                format_currency(total, currency).green().bold()
            );
        }
    }

    Ok(())
}

/// Show costs under an advanced profile read from a JSON file
pub async fn show_advanced_costs(
    client: &ApiClient,
    profile_path: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let profile = match &profile_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read profile file {}", path))?;
            serde_json::from_str::<AdvancedCostProfile>(&content)
                .with_context(|| format!("Failed to parse profile file {}", path))?
        }
        None => AdvancedCostProfile::default(),
    };

    let result: AdvancedCostResponse = client.post("api/v1/costs/advanced", &profile).await?;

    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Table => {
            let currency = client
                .get::<ProfileResponse>("api/v1/profile")
                .await
                .map(|p| p.currency)
                .unwrap_or_else(|_| "USD".to_string());

            print_heading("Advanced Cost Model", 50);
            let multipliers: Vec<String> = result
                .profile
                .environment_multipliers
                .iter()
                .map(|(env, factor)| format!("{}={}", env, factor))
                .collect();
            println!("Environment multipliers: {}", multipliers.join(", "));
            if !result.profile.department_overrides.is_empty() {
                let departments: Vec<&str> = result
                    .profile
                    .department_overrides
                    .keys()
                    .map(String::as_str)
                    .collect();
                println!("Department overrides:    {}", departments.join(", "));
            }
            println!();

            let rows: Vec<VmCostRow> = result
                .vms
                .iter()
                .map(|vm| VmCostRow {
                    id: vm.id.clone(),
                    name: vm.name.clone(),
                    state: "-".dimmed().to_string(),
                    environment: tag_or_dash(vm.environment.as_deref()),
                    department: tag_or_dash(vm.department.as_deref()),
                    monthly: format_currency(vm.monthly_cost, &currency),
                    daily: "-".dimmed().to_string(),
                })
                .collect();
            print_table(&rows, format);

            println!();
            println!(
                "{} {}",
                "Total Monthly:".bold(),
                format_currency(result.total_monthly, &currency).green().bold()
            );
        }
    }

    Ok(())
}
