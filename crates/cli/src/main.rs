//! VM cost CLI
//!
//! A command-line tool for browsing the inventory, viewing costs and
//! optimization opportunities, building a cost profile and exporting
//! FOCUS billing data from a running vmcost-server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{costs, export, inventory, optimize, setup};
use vmcost_lib::cost::GroupBy;

/// VM cost CLI
#[derive(Parser)]
#[command(name = "vmcost")]
#[command(author, version, about = "CLI for the on-premises VM cost service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via VMCOST_API_URL env var)
    #[arg(long, env = "VMCOST_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, value_enum)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the connected inventory
    Inventory {
        #[command(subcommand)]
        view: Option<InventoryView>,
    },

    /// View fleet costs under the active profile
    #[command(subcommand)]
    Costs(CostsCommands),

    /// Show optimization opportunities and estimated savings
    Optimize,

    /// Build a cost profile
    #[command(subcommand)]
    Setup(SetupCommands),

    /// Show the setup session state
    Session,

    /// Export billing data
    #[command(subcommand)]
    Export(ExportCommands),
}

#[derive(Subcommand)]
pub enum InventoryView {
    /// List virtual machines
    Vms,
    /// List ESXi hosts
    Hosts,
    /// List datastores
    Datastores,
}

#[derive(Subcommand)]
pub enum CostsCommands {
    /// Show total costs and a breakdown
    Show {
        /// Breakdown dimension (department, environment, application)
        #[arg(long, short, default_value = "department")]
        group_by: GroupBy,
    },

    /// Show per-VM costs
    Vms,

    /// Show costs under an advanced profile
    Advanced {
        /// JSON file with an advanced cost profile (defaults when omitted)
        #[arg(long, short)]
        profile: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SetupCommands {
    /// Benchmark rates with a regional adjustment
    Quick {
        /// Regional adjustment in percent, from -30 to 50
        #[arg(long, short, default_value_t = 0, allow_hyphen_values = true)]
        adjustment: i32,
    },

    /// Derive rates from hardware, operating and licensing costs
    Guided(setup::GuidedArgs),

    /// Apply the advanced-tier profile
    Advanced {
        /// File with formula text to store with the session
        #[arg(long)]
        formula_file: Option<String>,
    },

    /// Run the end-to-end demo flow and apply its profile
    Demo,

    /// Restore the default profile
    Reset,
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Export FOCUS records for the active profile
    Focus {
        /// Output file path (prints to stdout when omitted)
        #[arg(long, short)]
        output: Option<String>,

        /// Export lookup-table line items instead of FOCUS records
        #[arg(long)]
        line_items: bool,

        /// Billing year (requires --month)
        #[arg(long, requires = "month")]
        year: Option<i32>,

        /// Billing month, 1-12 (requires --year)
        #[arg(long, requires = "year")]
        month: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = match config::Config::load() {
        Ok(config) => config,
        Err(err) => {
            output::print_warning(&format!("Ignoring config file: {:#}", err));
            config::Config::default()
        }
    };
    let api_url = file_config.resolve_api_url(cli.api_url);
    let format = file_config.resolve_format(cli.format);
    if cli.verbose {
        output::print_info(&format!("Using API at {}", api_url));
    }

    let client = client::ApiClient::new(&api_url)?;

    let result = match cli.command {
        Commands::Inventory { view } => inventory::show_inventory(&client, view, format).await,
        Commands::Costs(costs_cmd) => match costs_cmd {
            CostsCommands::Show { group_by } => costs::show_costs(&client, group_by, format).await,
            CostsCommands::Vms => costs::show_vm_costs(&client, format).await,
            CostsCommands::Advanced { profile } => {
                costs::show_advanced_costs(&client, profile, format).await
            }
        },
        Commands::Optimize => optimize::show_optimizations(&client, format).await,
        Commands::Setup(setup_cmd) => match setup_cmd {
            SetupCommands::Quick { adjustment } => {
                setup::quick(&client, adjustment, format).await
            }
            SetupCommands::Guided(args) => setup::guided(&client, args, format).await,
            SetupCommands::Advanced { formula_file } => {
                setup::advanced(&client, formula_file, format).await
            }
            SetupCommands::Demo => setup::demo(&client, format).await,
            SetupCommands::Reset => setup::reset(&client, format).await,
        },
        Commands::Session => setup::show_session(&client, format).await,
        Commands::Export(export_cmd) => match export_cmd {
            ExportCommands::Focus {
                output,
                line_items,
                year,
                month,
            } => export::export_focus(&client, output, line_items, year.zip(month), format).await,
        },
    };

    if let Err(err) = result {
        output::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }

    Ok(())
}
