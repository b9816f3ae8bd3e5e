//! Setup workflow CLI commands
//!
//! Each command drives the server-side session from a fresh start through
//! the chosen path and prints the resulting profile.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use vmcost_lib::workflow::{DemoFlow, DemoStep, GuidedInputsUpdate, GuidedStep};
use vmcost_lib::{CostProfile, Session, SessionState, SetupPath};

use crate::client::{ApiClient, FormulaRequest, QuickRequest, SelectPathRequest};
use crate::output::{
    color_status, format_currency, print_heading, print_info, print_json, print_success,
    OutputFormat,
};

/// Guided setup inputs; omitted values keep the inventory-based defaults
#[derive(Args, Debug, Clone, Default)]
pub struct GuidedArgs {
    /// Total hardware investment
    #[arg(long)]
    pub investment: Option<f64>,

    /// Depreciation period in years
    #[arg(long)]
    pub depreciation_years: Option<u32>,

    /// Residual value as a fraction of the investment, e.g. 0.1
    #[arg(long)]
    pub residual: Option<f64>,

    /// Monthly power and cooling cost
    #[arg(long)]
    pub power_cooling: Option<f64>,

    /// Monthly facilities cost
    #[arg(long)]
    pub facilities: Option<f64>,

    /// Monthly network and bandwidth cost
    #[arg(long)]
    pub network: Option<f64>,

    /// Monthly staff allocation
    #[arg(long)]
    pub staff: Option<f64>,

    /// Annual VMware license cost
    #[arg(long)]
    pub vmware_annual: Option<f64>,

    /// Monthly Windows license cost
    #[arg(long)]
    pub windows: Option<f64>,

    /// Monthly SQL Server license cost
    #[arg(long)]
    pub sql: Option<f64>,
}

impl From<GuidedArgs> for GuidedInputsUpdate {
    fn from(args: GuidedArgs) -> Self {
        Self {
            total_hardware_investment: args.investment,
            depreciation_years: args.depreciation_years,
            residual_value_pct: args.residual,
            power_cooling_monthly: args.power_cooling,
            facilities_monthly: args.facilities,
            network_bandwidth_monthly: args.network,
            staff_allocation_monthly: args.staff,
            vmware_license_annual: args.vmware_annual,
            windows_license_monthly: args.windows,
            sql_license_monthly: args.sql,
        }
    }
}

/// Reset the session and enter the given path
async fn start(client: &ApiClient, path: SetupPath) -> Result<Session> {
    let _: Session = client.post_empty("api/v1/session/reset").await?;
    client
        .post(
            "api/v1/session/path",
            &SelectPathRequest {
                path: path.to_string(),
            },
        )
        .await
}

/// Apply the quick path with a regional adjustment
pub async fn quick(client: &ApiClient, adjustment: i32, format: OutputFormat) -> Result<()> {
    start(client, SetupPath::Quick).await?;
    let _: Session = client
        .post(
            "api/v1/session/quick",
            &QuickRequest {
                adjustment_pct: adjustment,
            },
        )
        .await?;
    let session: Session = client.post_empty("api/v1/session/quick/apply").await?;

    print_applied(&session, format);
    Ok(())
}

/// Walk the guided path with the given inputs
pub async fn guided(client: &ApiClient, args: GuidedArgs, format: OutputFormat) -> Result<()> {
    start(client, SetupPath::Guided).await?;

    let update = GuidedInputsUpdate::from(args);
    let mut session: Session = client.post("api/v1/session/guided", &update).await?;

    while let SessionState::Guided { setup } = &session.state {
        if format == OutputFormat::Table {
            print_info(&format!(
                "Step {}: {}",
                setup.step.number(),
                setup.step.title()
            ));
        }
        if setup.step == GuidedStep::Review {
            break;
        }
        session = client.post_empty("api/v1/session/guided/next").await?;
    }

    let session: Session = client
        .post_empty("api/v1/session/guided/complete")
        .await
        .context("Guided setup did not complete")?;

    print_applied(&session, format);
    Ok(())
}

/// Apply the advanced-tier profile, optionally storing a formula
pub async fn advanced(
    client: &ApiClient,
    formula_file: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    start(client, SetupPath::Advanced).await?;

    if let Some(path) = formula_file {
        let formula = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read formula file {}", path))?;
        let _: Session = client
            .post("api/v1/session/advanced", &FormulaRequest { formula })
            .await?;
    }

    let session: Session = client.post_empty("api/v1/session/advanced/apply").await?;

    print_applied(&session, format);
    Ok(())
}

/// Run all demo steps in order and apply the demo profile
pub async fn demo(client: &ApiClient, format: OutputFormat) -> Result<()> {
    start(client, SetupPath::Demo).await?;

    for (i, step) in DemoStep::ALL.iter().enumerate() {
        let session: Session = client.post_empty("api/v1/session/demo/complete-step").await?;
        if format == OutputFormat::Table {
            print_success(&format!("Step {}: {}", i + 1, step.title()));
            if let SessionState::Demo { flow } = &session.state {
                print_demo_step(*step, flow, &session.currency);
            }
        }
        if i + 1 < DemoStep::ALL.len() {
            let _: Session = client.post_empty("api/v1/session/demo/next").await?;
        }
    }

    let session: Session = client.post_empty("api/v1/session/demo/finish").await?;

    print_applied(&session, format);
    Ok(())
}

fn print_demo_step(step: DemoStep, flow: &DemoFlow, currency: &str) {
    let results = &flow.results;
    match step {
        DemoStep::Connect => {
            if let Some(summary) = &results.connected {
                println!(
                    "  {} VMs, {} hosts, {} datastores",
                    summary.vm_count, summary.host_count, summary.datastore_count
                );
            }
        }
        DemoStep::BuildProfile => {
            if let Some(profile) = &results.profile {
                println!(
                    "  CPU {} per core, memory {} per GB",
                    format_currency(profile.cpu_cost_per_core_month, currency),
                    format_currency(profile.memory_cost_per_gb_month, currency)
                );
            }
        }
        DemoStep::Enrich => {
            if let (Some(records), Some(total)) = (&results.records, results.monthly_total) {
                println!(
                    "  {} FOCUS records, {} per month",
                    records.len(),
                    format_currency(total, currency)
                );
            }
        }
        DemoStep::Analyze => {
            if let Some(optimizations) = &results.optimizations {
                println!(
                    "  {} potential monthly savings",
                    format_currency(optimizations.total_savings_opportunity, currency)
                );
            }
        }
    }
}

/// Restore the default profile
pub async fn reset(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let session: Session = client.post_empty("api/v1/session/reset").await?;

    match format {
        OutputFormat::Json => print_json(&session),
        OutputFormat::Table => {
            print_success("Session reset; default benchmark rates are active");
            print_profile(&session.profile, &session.currency);
        }
    }
    Ok(())
}

/// Show the current session state and profile
pub async fn show_session(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let session: Session = client.get("api/v1/session").await?;

    match format {
        OutputFormat::Json => print_json(&session),
        OutputFormat::Table => {
            print_heading("Setup Session", 50);
            println!("State:                  {}", color_status(session.state.name()));
            match &session.state {
                SessionState::Quick { setup } => {
                    println!("Adjustment:             {}%", setup.adjustment_pct);
                }
                SessionState::Guided { setup } => {
                    println!(
                        "Step:                   {} of 4 ({})",
                        setup.step.number(),
                        setup.step.title()
                    );
                }
                SessionState::Demo { flow } => {
                    let done = flow.completed.iter().filter(|c| **c).count();
                    println!(
                        "Step:                   {} ({} of 4 complete)",
                        flow.current.title(),
                        done
                    );
                }
                SessionState::Complete { path } => {
                    println!("Completed path:         {}", path.to_string().cyan());
                }
                SessionState::PathSelection | SessionState::Advanced { .. } => {}
            }
            println!();
            print_profile(&session.profile, &session.currency);
        }
    }
    Ok(())
}

fn print_applied(session: &Session, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(session),
        OutputFormat::Table => {
            let path = session
                .completed_path()
                .map(|p| p.to_string())
                .unwrap_or_else(|| session.state.name().to_string());
            print_success(&format!("Applied {} profile", path.green()));
            print_profile(&session.profile, &session.currency);
        }
    }
}

fn print_profile(profile: &CostProfile, currency: &str) {
    println!("{}", "Cost Profile".bold());
    println!("{}", "-".repeat(50));
    println!(
        "CPU per core/month:     {}",
        format_currency(profile.cpu_cost_per_core_month, currency)
    );
    println!(
        "Memory per GB/month:    {}",
        format_currency(profile.memory_cost_per_gb_month, currency)
    );
    println!(
        "Storage per GB/month:   {}",
        format_currency(profile.storage_cost_per_gb_month, currency)
    );
    println!(
        "Power/cooling per VM:   {}",
        format_currency(profile.power_cooling_per_vm_month, currency)
    );
    println!(
        "License per VM:         {}",
        format_currency(profile.software_license_per_vm_month, currency)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guided_args_map_to_update() {
        let args = GuidedArgs {
            investment: Some(125000.0),
            depreciation_years: Some(4),
            sql: Some(50.0),
            ..Default::default()
        };
        let update = GuidedInputsUpdate::from(args);

        assert_eq!(update.total_hardware_investment, Some(125000.0));
        assert_eq!(update.depreciation_years, Some(4));
        assert_eq!(update.sql_license_monthly, Some(50.0));
        assert!(update.power_cooling_monthly.is_none());
        assert!(update.residual_value_pct.is_none());
    }

    #[test]
    fn test_empty_args_leave_defaults() {
        assert_eq!(
            GuidedInputsUpdate::from(GuidedArgs::default()),
            GuidedInputsUpdate::default()
        );
    }
}
