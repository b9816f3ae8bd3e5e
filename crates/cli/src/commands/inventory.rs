//! Inventory CLI commands

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;
use vmcost_lib::{Datastore, Host, VirtualMachine};

use crate::client::{ApiClient, InventoryOverview};
use crate::output::{color_status, print_heading, print_json, print_table, tag_or_dash, OutputFormat};
use crate::InventoryView;

#[derive(Tabled, Serialize)]
struct VmRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "vCPU")]
    vcpu: u32,
    #[tabled(rename = "Memory GB")]
    memory_gb: f64,
    #[tabled(rename = "Storage GB")]
    storage_gb: f64,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "CPU %")]
    cpu_usage: String,
    #[tabled(rename = "Mem %")]
    memory_usage: String,
    #[tabled(rename = "Environment")]
    environment: String,
    #[tabled(rename = "Department")]
    department: String,
}

impl From<&VirtualMachine> for VmRow {
    fn from(vm: &VirtualMachine) -> Self {
        Self {
            id: vm.id.clone(),
            name: vm.name.clone(),
            vcpu: vm.vcpu,
            memory_gb: vm.memory_gb,
            storage_gb: vm.storage_gb,
            state: color_status(vm.power_state.as_str()),
            cpu_usage: format!("{:.0}", vm.cpu_usage_avg),
            memory_usage: format!("{:.0}", vm.memory_usage_avg),
            environment: tag_or_dash(vm.tags.environment.as_deref()),
            department: tag_or_dash(vm.tags.department.as_deref()),
        }
    }
}

#[derive(Tabled, Serialize)]
struct HostRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Cores")]
    cpu_cores: u32,
    #[tabled(rename = "Memory GB")]
    memory_gb: f64,
    #[tabled(rename = "Purchased")]
    purchase_date: String,
    #[tabled(rename = "Price")]
    purchase_price: String,
}

#[derive(Tabled, Serialize)]
struct DatastoreRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Capacity GB")]
    capacity_gb: f64,
    #[tabled(rename = "Cost/GB/Month")]
    cost_per_gb_month: f64,
}

/// Show the inventory overview or one of its lists
pub async fn show_inventory(
    client: &ApiClient,
    view: Option<InventoryView>,
    format: OutputFormat,
) -> Result<()> {
    match view {
        None => show_overview(client, format).await,
        Some(InventoryView::Vms) => {
            let vms: Vec<VirtualMachine> = client.get("api/v1/inventory/vms").await?;
            match format {
                OutputFormat::Json => print_json(&vms),
                OutputFormat::Table => {
                    let rows: Vec<VmRow> = vms.iter().map(VmRow::from).collect();
                    print_table(&rows, format);
                }
            }
            Ok(())
        }
        Some(InventoryView::Hosts) => {
            let hosts: Vec<Host> = client.get("api/v1/inventory/hosts").await?;
            match format {
                OutputFormat::Json => print_json(&hosts),
                OutputFormat::Table => {
                    let rows: Vec<HostRow> = hosts
                        .iter()
                        .map(|h| HostRow {
                            id: h.id.clone(),
                            name: h.name.clone(),
                            cpu_cores: h.cpu_cores,
                            memory_gb: h.memory_gb,
                            purchase_date: h.purchase_date.to_string(),
                            purchase_price: format!("{:.0}", h.purchase_price),
                        })
                        .collect();
                    print_table(&rows, format);
                }
            }
            Ok(())
        }
        Some(InventoryView::Datastores) => {
            let datastores: Vec<Datastore> = client.get("api/v1/inventory/datastores").await?;
            match format {
                OutputFormat::Json => print_json(&datastores),
                OutputFormat::Table => {
                    let rows: Vec<DatastoreRow> = datastores
                        .iter()
                        .map(|d| DatastoreRow {
                            id: d.id.clone(),
                            name: d.name.clone(),
                            kind: d.kind.to_string(),
                            capacity_gb: d.capacity_gb,
                            cost_per_gb_month: d.cost_per_gb_month,
                        })
                        .collect();
                    print_table(&rows, format);
                }
            }
            Ok(())
        }
    }
}

async fn show_overview(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let overview: InventoryOverview = client.get("api/v1/inventory").await?;

    match format {
        OutputFormat::Json => print_json(&overview),
        OutputFormat::Table => {
            let s = &overview.summary;
            print_heading("Inventory", 50);
            println!("Virtual Machines:       {}", s.vm_count.to_string().cyan());
            println!(
                "  Powered on / off:     {} / {}",
                s.powered_on_count.to_string().green(),
                s.powered_off_count.to_string().red()
            );
            println!("Hosts:                  {}", s.host_count);
            println!("Datastores:             {}", s.datastore_count);
            println!();

            println!("{}", "Allocated Resources".bold());
            println!("{}", "-".repeat(50));
            println!("Total vCPU:             {}", s.total_vcpu);
            println!("Total Memory:           {:.0} GB", s.total_memory_gb);
            println!("Total Storage:          {:.1} TB", s.total_storage_tb);
            println!();

            println!("{}", "Host Capacity".bold());
            println!("{}", "-".repeat(50));
            println!("Physical Cores:         {}", overview.total_host_cores);
            println!("Physical Memory:        {:.0} GB", overview.total_host_memory_gb);
            println!(
                "Hardware Investment:    {:.0}",
                overview.total_hardware_investment
            );
        }
    }

    Ok(())
}
