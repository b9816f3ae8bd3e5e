//! Billing export CLI commands

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;
use vmcost_lib::LineItem;

use crate::client::{ApiClient, FocusResponse};
use crate::output::{format_currency, print_heading, print_success, print_table, OutputFormat};

#[derive(Tabled, Serialize)]
struct FocusRow {
    #[tabled(rename = "Resource")]
    resource_id: String,
    #[tabled(rename = "Name")]
    resource_name: String,
    #[tabled(rename = "Environment")]
    environment: String,
    #[tabled(rename = "Department")]
    department: String,
    #[tabled(rename = "Billed Cost")]
    billed_cost: String,
}

#[derive(Tabled, Serialize)]
struct LineItemRow {
    #[tabled(rename = "Resource")]
    resource_id: String,
    #[tabled(rename = "Type")]
    resource_type: String,
    #[tabled(rename = "Quantity")]
    quantity: f64,
    #[tabled(rename = "Unit Cost")]
    unit_cost: f64,
    #[tabled(rename = "Total")]
    total_cost: f64,
}

fn focus_path(period: Option<(i32, u32)>) -> String {
    match period {
        Some((year, month)) => format!("api/v1/focus?year={}&month={}", year, month),
        None => "api/v1/focus".to_string(),
    }
}

/// Write JSON to a file, or to stdout when no file is given
fn write_json<T: Serialize + ?Sized>(value: &T, output: Option<&str>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write export file {}", path)),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

/// Export FOCUS records, or lookup-table line items, for the active profile
///
/// With a file target the export is always JSON; without one the table
/// format prints a preview instead.
pub async fn export_focus(
    client: &ApiClient,
    output: Option<String>,
    line_items: bool,
    period: Option<(i32, u32)>,
    format: OutputFormat,
) -> Result<()> {
    if line_items {
        let items: Vec<LineItem> = client.get("api/v1/focus/line-items").await?;
        match (&output, format) {
            (None, OutputFormat::Table) => {
                let rows: Vec<LineItemRow> = items
                    .iter()
                    .map(|item| LineItemRow {
                        resource_id: item.resource_id.clone(),
                        resource_type: item.resource_type.to_string(),
                        quantity: item.quantity,
                        unit_cost: item.unit_cost,
                        total_cost: item.total_cost,
                    })
                    .collect();
                print_table(&rows, format);
            }
            _ => {
                write_json(&items, output.as_deref())?;
                if let Some(path) = &output {
                    print_success(&format!("Wrote {} line items to {}", items.len(), path));
                }
            }
        }
        return Ok(());
    }

    let response: FocusResponse = client.get(&focus_path(period)).await?;
    match (&output, format) {
        (None, OutputFormat::Table) => {
            print_heading("FOCUS Billing Records", 60);
            println!(
                "Billing period:         {} to {}",
                response.billing_period.start.format("%Y-%m-%d"),
                response.billing_period.end.format("%Y-%m-%d")
            );
            println!();

            let rows: Vec<FocusRow> = response
                .records
                .iter()
                .map(|record| FocusRow {
                    resource_id: record.resource_id.clone(),
                    resource_name: record.resource_name.clone(),
                    environment: record.x_environment.clone(),
                    department: record.x_department.clone(),
                    billed_cost: format_currency(record.billed_cost, &response.currency),
                })
                .collect();
            print_table(&rows, format);

            let total: f64 = response.records.iter().map(|r| r.billed_cost).sum();
            println!();
            println!(
                "{} {}",
                "Total Billed:".bold(),
                format_currency(total, &response.currency).green().bold()
            );
        }
        _ => {
            write_json(&response.records, output.as_deref())?;
            if let Some(path) = &output {
                print_success(&format!(
                    "Wrote {} FOCUS records to {}",
                    response.records.len(),
                    path
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_path() {
        assert_eq!(focus_path(None), "api/v1/focus");
        assert_eq!(
            focus_path(Some((2024, 3))),
            "api/v1/focus?year=2024&month=3"
        );
    }

    #[test]
    fn test_write_json_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let path_str = path.to_str().unwrap();

        write_json(&vec![1, 2, 3], Some(path_str)).unwrap();

        let written: Vec<i32> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_export_line_items_to_file() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/focus/line-items")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"ResourceId":"vm-001-cpu","ResourceType":"vCPU","Quantity":4.0,
                     "UnitCost":50.0,"TotalCost":200.0}]"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        let client = ApiClient::new(&server.url()).unwrap();

        export_focus(
            &client,
            Some(path.to_str().unwrap().to_string()),
            true,
            None,
            OutputFormat::Json,
        )
        .await
        .unwrap();

        let items: Vec<LineItem> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].total_cost, 200.0);
    }
}
