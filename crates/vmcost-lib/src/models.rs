//! Core data models for the cost library

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Power state reported by the hypervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
}

impl PowerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::PoweredOn => "poweredOn",
            PowerState::PoweredOff => "poweredOff",
            PowerState::Suspended => "suspended",
        }
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form VM tags. An absent tag means "untagged", which is not the same
/// thing as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmTags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Virtual machine record from the inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    pub id: String,
    pub name: String,
    #[serde(rename = "vCPU")]
    pub vcpu: u32,
    #[serde(rename = "memoryGB")]
    pub memory_gb: f64,
    #[serde(rename = "storageGB")]
    pub storage_gb: f64,
    pub power_state: PowerState,
    pub esxi_host: String,
    pub datastore: String,
    #[serde(default)]
    pub tags: VmTags,
    /// Average CPU utilization in percent, meaningful only when powered on
    pub cpu_usage_avg: f64,
    /// Average memory utilization in percent, meaningful only when powered on
    pub memory_usage_avg: f64,
    pub created_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_powered_on: Option<NaiveDate>,
}

impl VirtualMachine {
    pub fn is_powered_on(&self) -> bool {
        self.power_state == PowerState::PoweredOn
    }

    pub fn is_powered_off(&self) -> bool {
        self.power_state == PowerState::PoweredOff
    }
}

/// Hypervisor host, used only for hardware depreciation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub id: String,
    pub name: String,
    pub cpu_cores: u32,
    #[serde(rename = "memoryGB")]
    pub memory_gb: f64,
    pub purchase_date: NaiveDate,
    pub purchase_price: f64,
}

/// Storage tier of a datastore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatastoreType {
    #[serde(rename = "SSD")]
    Ssd,
    #[serde(rename = "HDD")]
    Hdd,
    Archive,
}

impl std::fmt::Display for DatastoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DatastoreType::Ssd => "SSD",
            DatastoreType::Hdd => "HDD",
            DatastoreType::Archive => "Archive",
        };
        f.write_str(s)
    }
}

/// Datastore record. Listed with the inventory; the cost model does not use it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datastore {
    pub id: String,
    pub name: String,
    #[serde(rename = "capacityGB")]
    pub capacity_gb: f64,
    #[serde(rename = "type")]
    pub kind: DatastoreType,
    #[serde(rename = "costPerGBMonth")]
    pub cost_per_gb_month: f64,
}

/// Per-unit monthly rates applied to the inventory
///
/// Rates are not validated; negative values are taken as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostProfile {
    pub cpu_cost_per_core_month: f64,
    #[serde(rename = "memoryCostPerGBMonth")]
    pub memory_cost_per_gb_month: f64,
    #[serde(rename = "storageCostPerGBMonth")]
    pub storage_cost_per_gb_month: f64,
    #[serde(rename = "powerCoolingPerVMMonth")]
    pub power_cooling_per_vm_month: f64,
    #[serde(rename = "softwareLicensePerVMMonth")]
    pub software_license_per_vm_month: f64,
}

impl CostProfile {
    /// Profile with every rate at zero, the starting point of guided setup
    pub const fn zero() -> Self {
        Self {
            cpu_cost_per_core_month: 0.0,
            memory_cost_per_gb_month: 0.0,
            storage_cost_per_gb_month: 0.0,
            power_cooling_per_vm_month: 0.0,
            software_license_per_vm_month: 0.0,
        }
    }

    /// Multiply every rate by the same factor
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            cpu_cost_per_core_month: self.cpu_cost_per_core_month * factor,
            memory_cost_per_gb_month: self.memory_cost_per_gb_month * factor,
            storage_cost_per_gb_month: self.storage_cost_per_gb_month * factor,
            power_cooling_per_vm_month: self.power_cooling_per_vm_month * factor,
            software_license_per_vm_month: self.software_license_per_vm_month * factor,
        }
    }

    /// Shallow-merge a partial override: fields set on the override win
    pub fn merged_with(&self, over: &CostProfileOverride) -> Self {
        Self {
            cpu_cost_per_core_month: over
                .cpu_cost_per_core_month
                .unwrap_or(self.cpu_cost_per_core_month),
            memory_cost_per_gb_month: over
                .memory_cost_per_gb_month
                .unwrap_or(self.memory_cost_per_gb_month),
            storage_cost_per_gb_month: over
                .storage_cost_per_gb_month
                .unwrap_or(self.storage_cost_per_gb_month),
            power_cooling_per_vm_month: over
                .power_cooling_per_vm_month
                .unwrap_or(self.power_cooling_per_vm_month),
            software_license_per_vm_month: over
                .software_license_per_vm_month
                .unwrap_or(self.software_license_per_vm_month),
        }
    }
}

impl Default for CostProfile {
    /// Industry-benchmark rates used until a setup path completes
    fn default() -> Self {
        Self {
            cpu_cost_per_core_month: 50.0,
            memory_cost_per_gb_month: 10.0,
            storage_cost_per_gb_month: 0.10,
            power_cooling_per_vm_month: 25.0,
            software_license_per_vm_month: 30.0,
        }
    }
}

/// Partial rate override, e.g. for a single department
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostProfileOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_cost_per_core_month: Option<f64>,
    #[serde(
        default,
        rename = "memoryCostPerGBMonth",
        skip_serializing_if = "Option::is_none"
    )]
    pub memory_cost_per_gb_month: Option<f64>,
    #[serde(
        default,
        rename = "storageCostPerGBMonth",
        skip_serializing_if = "Option::is_none"
    )]
    pub storage_cost_per_gb_month: Option<f64>,
    #[serde(
        default,
        rename = "powerCoolingPerVMMonth",
        skip_serializing_if = "Option::is_none"
    )]
    pub power_cooling_per_vm_month: Option<f64>,
    #[serde(
        default,
        rename = "softwareLicensePerVMMonth",
        skip_serializing_if = "Option::is_none"
    )]
    pub software_license_per_vm_month: Option<f64>,
}

/// Cost profile with environment multipliers, department overrides and
/// shared facilities/staff costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvancedCostProfile {
    pub base_profile: CostProfile,
    pub environment_multipliers: IndexMap<String, f64>,
    pub department_overrides: IndexMap<String, CostProfileOverride>,
    pub depreciation_years: u32,
    pub facilities_cost_per_month: f64,
    pub staff_cost_per_month: f64,
}

impl Default for AdvancedCostProfile {
    fn default() -> Self {
        let environment_multipliers = [("Production", 1.5), ("Development", 0.7), ("Test", 0.5)]
            .into_iter()
            .map(|(env, factor)| (env.to_string(), factor))
            .collect();

        Self {
            base_profile: CostProfile::default(),
            environment_multipliers,
            department_overrides: IndexMap::new(),
            depreciation_years: 5,
            facilities_cost_per_month: 5000.0,
            staff_cost_per_month: 25000.0,
        }
    }
}
