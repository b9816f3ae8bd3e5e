//! Resource inventory
//!
//! Holds the VMs, hosts and datastores the cost model runs against. The
//! built-in sample fleet stands in for a vCenter connection; an inventory can
//! also be loaded from a JSON file using the same field names.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;
use crate::models::{Datastore, DatastoreType, Host, PowerState, VirtualMachine, VmTags};

/// Immutable inventory snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub vms: Vec<VirtualMachine>,
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub datastores: Vec<Datastore>,
}

/// Aggregate figures shown when an inventory is connected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub vm_count: usize,
    pub powered_on_count: usize,
    pub powered_off_count: usize,
    pub host_count: usize,
    pub datastore_count: usize,
    #[serde(rename = "totalVCPU")]
    pub total_vcpu: u64,
    #[serde(rename = "totalMemoryGB")]
    pub total_memory_gb: f64,
    #[serde(rename = "totalStorageTB")]
    pub total_storage_tb: f64,
}

impl Inventory {
    pub fn new(vms: Vec<VirtualMachine>, hosts: Vec<Host>, datastores: Vec<Datastore>) -> Self {
        Self {
            vms,
            hosts,
            datastores,
        }
    }

    /// Parse an inventory from JSON text
    pub fn from_json_str(path: &str, content: &str) -> Result<Self, InventoryError> {
        serde_json::from_str(content).map_err(|source| InventoryError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Load an inventory from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, InventoryError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_json_str(&display, &content)
    }

    pub fn total_vcpu(&self) -> u64 {
        self.vms.iter().map(|vm| vm.vcpu as u64).sum()
    }

    pub fn total_memory_gb(&self) -> f64 {
        self.vms.iter().map(|vm| vm.memory_gb).sum()
    }

    pub fn total_storage_gb(&self) -> f64 {
        self.vms.iter().map(|vm| vm.storage_gb).sum()
    }

    pub fn powered_on_count(&self) -> usize {
        self.vms.iter().filter(|vm| vm.is_powered_on()).count()
    }

    pub fn powered_off_count(&self) -> usize {
        self.vms.iter().filter(|vm| vm.is_powered_off()).count()
    }

    /// Combined purchase price of all hosts
    pub fn total_hardware_investment(&self) -> f64 {
        self.hosts.iter().map(|h| h.purchase_price).sum()
    }

    pub fn total_host_cores(&self) -> u64 {
        self.hosts.iter().map(|h| h.cpu_cores as u64).sum()
    }

    pub fn total_host_memory_gb(&self) -> f64 {
        self.hosts.iter().map(|h| h.memory_gb).sum()
    }

    pub fn vm(&self, id: &str) -> Option<&VirtualMachine> {
        self.vms.iter().find(|vm| vm.id == id)
    }

    pub fn summary(&self) -> InventorySummary {
        InventorySummary {
            vm_count: self.vms.len(),
            powered_on_count: self.powered_on_count(),
            powered_off_count: self.powered_off_count(),
            host_count: self.hosts.len(),
            datastore_count: self.datastores.len(),
            total_vcpu: self.total_vcpu(),
            total_memory_gb: self.total_memory_gb(),
            total_storage_tb: self.total_storage_gb() / 1000.0,
        }
    }

    /// Built-in demonstration fleet: 20 VMs on 5 ESXi hosts and 3 datastores
    pub fn sample() -> Self {
        Self::new(sample_vms(), sample_hosts(), sample_datastores())
    }
}

fn date(s: &str) -> NaiveDate {
    // sample literals only
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap_or_default()
}

fn tags(
    environment: Option<&str>,
    department: Option<&str>,
    application: Option<&str>,
    owner: Option<&str>,
) -> VmTags {
    VmTags {
        environment: environment.map(str::to_string),
        department: department.map(str::to_string),
        application: application.map(str::to_string),
        owner: owner.map(str::to_string),
    }
}

fn full_tags(environment: &str, department: &str, application: &str, owner: &str) -> VmTags {
    tags(Some(environment), Some(department), Some(application), Some(owner))
}

struct VmSpec {
    id: &'static str,
    name: &'static str,
    vcpu: u32,
    memory_gb: f64,
    storage_gb: f64,
    power_state: PowerState,
    host: &'static str,
    datastore: &'static str,
    cpu: f64,
    mem: f64,
    created: &'static str,
    last_on: &'static str,
}

impl VmSpec {
    fn build(self, tags: VmTags) -> VirtualMachine {
        VirtualMachine {
            id: self.id.to_string(),
            name: self.name.to_string(),
            vcpu: self.vcpu,
            memory_gb: self.memory_gb,
            storage_gb: self.storage_gb,
            power_state: self.power_state,
            esxi_host: self.host.to_string(),
            datastore: self.datastore.to_string(),
            tags,
            cpu_usage_avg: self.cpu,
            memory_usage_avg: self.mem,
            created_date: date(self.created),
            last_powered_on: Some(date(self.last_on)),
        }
    }
}

const SSD: &str = "SSD-Datastore-01";
const HDD: &str = "HDD-Datastore-01";
const ARCHIVE: &str = "Archive-Datastore-01";

fn sample_vms() -> Vec<VirtualMachine> {
    use PowerState::{PoweredOff as Off, PoweredOn as On};

    #[rustfmt::skip]
    let specs = vec![
        (VmSpec { id: "vm-001", name: "PROD-WEB-001", vcpu: 4, memory_gb: 16.0, storage_gb: 100.0, power_state: On, host: "esxi-prod-01", datastore: SSD, cpu: 45.0, mem: 78.0, created: "2023-01-15", last_on: "2024-08-01" },
            full_tags("Production", "Marketing", "Corporate Website", "TeamAlpha")),
        (VmSpec { id: "vm-002", name: "PROD-API-001", vcpu: 8, memory_gb: 32.0, storage_gb: 200.0, power_state: On, host: "esxi-prod-01", datastore: SSD, cpu: 67.0, mem: 72.0, created: "2022-11-20", last_on: "2024-08-01" },
            full_tags("Production", "Engineering", "Customer API", "TeamBeta")),
        (VmSpec { id: "vm-003", name: "PROD-DB-001", vcpu: 32, memory_gb: 128.0, storage_gb: 2000.0, power_state: On, host: "esxi-prod-01", datastore: SSD, cpu: 12.0, mem: 35.0, created: "2021-06-15", last_on: "2024-08-01" },
            full_tags("Production", "IT", "Oracle Database", "DBATeam")),
        (VmSpec { id: "vm-004", name: "DEV-APP-001", vcpu: 2, memory_gb: 8.0, storage_gb: 100.0, power_state: On, host: "esxi-dev-01", datastore: HDD, cpu: 35.0, mem: 62.0, created: "2023-08-15", last_on: "2024-08-05" },
            full_tags("Development", "Engineering", "Dev Environment", "TeamGamma")),
        (VmSpec { id: "vm-005", name: "DEV-APP-002", vcpu: 2, memory_gb: 8.0, storage_gb: 100.0, power_state: Off, host: "esxi-dev-01", datastore: HDD, cpu: 0.0, mem: 0.0, created: "2023-07-20", last_on: "2024-06-15" },
            full_tags("Development", "Engineering", "Dev Environment", "TeamGamma")),
        (VmSpec { id: "vm-006", name: "TEST-AUTOMATION-001", vcpu: 4, memory_gb: 16.0, storage_gb: 200.0, power_state: On, host: "esxi-dev-02", datastore: HDD, cpu: 62.0, mem: 55.0, created: "2023-09-01", last_on: "2024-08-04" },
            full_tags("Test", "QA", "Selenium Grid", "QATeam")),
        (VmSpec { id: "vm-007", name: "OLD-APP-BACKUP", vcpu: 4, memory_gb: 16.0, storage_gb: 500.0, power_state: On, host: "esxi-dev-01", datastore: ARCHIVE, cpu: 1.0, mem: 8.0, created: "2021-12-01", last_on: "2023-01-15" },
            tags(None, Some("IT"), None, None)),
        (VmSpec { id: "vm-008", name: "TEMP-MIGRATION-03", vcpu: 2, memory_gb: 8.0, storage_gb: 200.0, power_state: On, host: "esxi-dev-02", datastore: ARCHIVE, cpu: 2.0, mem: 12.0, created: "2022-10-15", last_on: "2023-03-01" },
            VmTags::default()),
        (VmSpec { id: "vm-009", name: "ML-TRAINING-GPU-01", vcpu: 16, memory_gb: 128.0, storage_gb: 1000.0, power_state: On, host: "esxi-gpu-01", datastore: SSD, cpu: 82.0, mem: 91.0, created: "2024-01-15", last_on: "2024-08-05" },
            full_tags("Production", "DataScience", "ML Training", "AITeam")),
        (VmSpec { id: "vm-010", name: "PROD-WORKER-001", vcpu: 4, memory_gb: 16.0, storage_gb: 100.0, power_state: On, host: "esxi-prod-02", datastore: HDD, cpu: 58.0, mem: 67.0, created: "2023-06-01", last_on: "2024-08-05" },
            full_tags("Production", "Operations", "Background Jobs", "TeamDelta")),
        (VmSpec { id: "vm-011", name: "DEV-DB-001", vcpu: 8, memory_gb: 32.0, storage_gb: 500.0, power_state: On, host: "esxi-dev-01", datastore: HDD, cpu: 42.0, mem: 58.0, created: "2023-10-01", last_on: "2024-08-04" },
            full_tags("Development", "Engineering", "Dev Database", "TeamEpsilon")),
        (VmSpec { id: "vm-012", name: "MONITORING-001", vcpu: 4, memory_gb: 16.0, storage_gb: 200.0, power_state: On, host: "esxi-prod-01", datastore: SSD, cpu: 38.0, mem: 76.0, created: "2022-08-01", last_on: "2024-08-01" },
            full_tags("Production", "IT", "Prometheus", "OpsTeam")),
        (VmSpec { id: "vm-013", name: "STAGING-WEB-001", vcpu: 4, memory_gb: 16.0, storage_gb: 100.0, power_state: Off, host: "esxi-dev-02", datastore: HDD, cpu: 0.0, mem: 0.0, created: "2023-12-15", last_on: "2024-05-01" },
            full_tags("Test", "Engineering", "Staging Environment", "TeamZeta")),
        (VmSpec { id: "vm-014", name: "PROD-CACHE-001", vcpu: 4, memory_gb: 64.0, storage_gb: 50.0, power_state: On, host: "esxi-prod-01", datastore: SSD, cpu: 25.0, mem: 89.0, created: "2023-03-10", last_on: "2024-08-01" },
            full_tags("Production", "Engineering", "Redis Cache", "TeamBeta")),
        (VmSpec { id: "vm-015", name: "ANALYTICS-DB-001", vcpu: 16, memory_gb: 64.0, storage_gb: 3000.0, power_state: On, host: "esxi-prod-01", datastore: HDD, cpu: 55.0, mem: 71.0, created: "2023-05-01", last_on: "2024-08-01" },
            full_tags("Production", "Analytics", "Clickhouse", "DataTeam")),
        (VmSpec { id: "vm-016", name: "TEST-LOAD-001", vcpu: 8, memory_gb: 32.0, storage_gb: 150.0, power_state: Off, host: "esxi-dev-02", datastore: HDD, cpu: 0.0, mem: 0.0, created: "2023-04-15", last_on: "2024-07-01" },
            full_tags("Test", "QA", "Load Testing", "QATeam")),
        (VmSpec { id: "vm-017", name: "LOGGING-001", vcpu: 8, memory_gb: 32.0, storage_gb: 1000.0, power_state: On, host: "esxi-prod-02", datastore: HDD, cpu: 45.0, mem: 82.0, created: "2022-09-15", last_on: "2024-08-01" },
            full_tags("Production", "IT", "ELK Stack", "OpsTeam")),
        (VmSpec { id: "vm-018", name: "BACKUP-SERVER-001", vcpu: 4, memory_gb: 16.0, storage_gb: 100.0, power_state: On, host: "esxi-prod-01", datastore: ARCHIVE, cpu: 28.0, mem: 45.0, created: "2021-03-01", last_on: "2024-08-01" },
            full_tags("Production", "IT", "Veeam Backup", "InfraTeam")),
        (VmSpec { id: "vm-019", name: "AD-CONTROLLER-002", vcpu: 2, memory_gb: 8.0, storage_gb: 100.0, power_state: On, host: "esxi-prod-02", datastore: SSD, cpu: 15.0, mem: 38.0, created: "2020-01-15", last_on: "2024-08-01" },
            full_tags("Production", "IT", "Active Directory", "InfraTeam")),
        (VmSpec { id: "vm-020", name: "PROD-DB-002", vcpu: 24, memory_gb: 96.0, storage_gb: 1500.0, power_state: On, host: "esxi-prod-02", datastore: SSD, cpu: 18.0, mem: 42.0, created: "2022-01-20", last_on: "2024-08-01" },
            full_tags("Production", "IT", "SQL Server", "DBATeam")),
    ];

    specs
        .into_iter()
        .map(|(spec, tags)| spec.build(tags))
        .collect()
}

fn sample_hosts() -> Vec<Host> {
    [
        ("esxi-prod-01", 64, 512.0, "2020-01-15", 25000.0),
        ("esxi-prod-02", 64, 512.0, "2020-01-15", 25000.0),
        ("esxi-dev-01", 32, 256.0, "2022-06-01", 15000.0),
        ("esxi-dev-02", 32, 256.0, "2022-06-01", 15000.0),
        ("esxi-gpu-01", 48, 384.0, "2024-01-01", 45000.0),
    ]
    .into_iter()
    .map(|(id, cpu_cores, memory_gb, purchased, purchase_price)| Host {
        id: id.to_string(),
        name: format!("{}.datacenter.local", id),
        cpu_cores,
        memory_gb,
        purchase_date: date(purchased),
        purchase_price,
    })
    .collect()
}

fn sample_datastores() -> Vec<Datastore> {
    [
        ("ds-001", SSD, 10000.0, DatastoreType::Ssd, 0.15),
        ("ds-002", HDD, 50000.0, DatastoreType::Hdd, 0.05),
        ("ds-003", ARCHIVE, 100000.0, DatastoreType::Archive, 0.02),
    ]
    .into_iter()
    .map(|(id, name, capacity_gb, kind, cost_per_gb_month)| Datastore {
        id: id.to_string(),
        name: name.to_string(),
        capacity_gb,
        kind,
        cost_per_gb_month,
    })
    .collect()
}
