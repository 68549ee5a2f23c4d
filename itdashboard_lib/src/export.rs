//! Aggregation of the fetched dataset into a multi-sheet xlsx workbook.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cache::DiskCache;
use crate::client::SnapshotClient;
use crate::error::SnapshotError;
use crate::pdf;

/// Workbook sheet names cap out at 31 chars; the original exporter kept 30.
const MAX_SHEET_NAME: usize = 30;

/// Everything the exporter can be configured with.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Workbook base name, without extension.
    pub output_file: String,
    /// Folder holding the workbook and the `json/` and `pdf/` cache dirs.
    pub output_folder: PathBuf,
    /// Fixed pause before every network request.
    pub delay: Duration,
    /// Ignore cache hits and refetch everything.
    pub reload_files: bool,
    /// Agency codes to export. Empty exports all agencies. The summary
    /// sheet is never filtered by this list.
    pub agency_codes: Vec<String>,
    /// PDF label -> output field name. Empty disables PDF enrichment.
    pub pdf_fields: BTreeMap<String, String>,
    /// Zero-based page of the business-case PDF to scan.
    pub pdf_page: usize,
    /// Emit a 0-based row-index column on every sheet.
    pub index_rows: bool,
    /// Ordered column subset for the summary sheet; `None` keeps all fields.
    pub agency_columns: Option<Vec<String>>,
    /// Ordered column subset for investment sheets; `None` keeps all fields.
    pub investment_columns: Option<Vec<String>>,
    /// Name of the summary sheet.
    pub summary_sheet: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_file: "itdashboard_gov".to_string(),
            output_folder: PathBuf::from("output"),
            delay: Duration::from_millis(700),
            reload_files: false,
            agency_codes: Vec::new(),
            pdf_fields: BTreeMap::new(),
            pdf_page: 0,
            index_rows: false,
            agency_columns: None,
            investment_columns: None,
            summary_sheet: "agencies".to_string(),
        }
    }
}

/// Orchestrates the fetch-cache-extract-aggregate pipeline and writes the
/// workbook.
pub struct Exporter {
    client: SnapshotClient,
    config: ExportConfig,
}

impl Exporter {
    /// Creates an exporter against the production dashboard.
    pub fn new(config: ExportConfig) -> Self {
        let cache = DiskCache::new(&config.output_folder, config.reload_files);
        let client = SnapshotClient::new(cache, config.delay);
        Self { client, config }
    }

    /// Creates an exporter with custom base/home URLs. Used for testing.
    pub fn with_base_urls(base_api_url: &str, home_url: &str, config: ExportConfig) -> Self {
        let cache = DiskCache::new(&config.output_folder, config.reload_files);
        let client = SnapshotClient::with_base_urls(base_api_url, home_url, cache, config.delay);
        Self { client, config }
    }

    /// Runs the whole export and returns the path of the written workbook.
    ///
    /// Strictly sequential: summary sheet first, then one sheet per included
    /// agency in fetch order. The workbook is buffered in memory and only
    /// saved at the end, so an aborted run leaves no partial workbook.
    pub async fn run(&self) -> Result<PathBuf, SnapshotError> {
        fs::create_dir_all(&self.config.output_folder)?;
        self.client.bootstrap().await?;

        let mut workbook = Workbook::new();

        let agencies = self.client.agencies().await?;
        let rows = to_rows(&agencies)?;
        write_sheet(
            workbook.add_worksheet(),
            &self.config.summary_sheet,
            &rows,
            self.config.agency_columns.as_deref(),
            self.config.index_rows,
        )?;
        tracing::info!("summary sheet: {} agencies", rows.len());

        // Second fetch of the same resource; a cache hit when reload is off.
        for agency in self.client.agencies().await? {
            if !self.config.agency_codes.is_empty()
                && !self.config.agency_codes.contains(&agency.agency_code)
            {
                continue;
            }

            let mut investments = self.client.investments(&agency.agency_code).await?;
            for investment in &mut investments {
                if investment.has_business_case() {
                    let fields = self.pdf_fields_for(investment).await?;
                    investment.merge_fields(fields);
                }
            }

            let rows = to_rows(&investments)?;
            let name = sheet_name(&agency.agency_code, &agency.agency_name);
            tracing::info!("sheet {}: {} investments", name, rows.len());
            write_sheet(
                workbook.add_worksheet(),
                &name,
                &rows,
                self.config.investment_columns.as_deref(),
                self.config.index_rows,
            )?;
        }

        let path = self
            .config
            .output_folder
            .join(format!("{}.xlsx", self.config.output_file));
        workbook.save(&path)?;
        tracing::info!("workbook written: {}", path.display());
        Ok(path)
    }

    /// Fetches (and caches) one investment's business-case PDF and extracts
    /// the configured fields. An empty field map skips the fetch entirely.
    async fn pdf_fields_for(
        &self,
        investment: &itdashboard_api::types::Investment,
    ) -> Result<BTreeMap<String, String>, SnapshotError> {
        if self.config.pdf_fields.is_empty() {
            return Ok(BTreeMap::new());
        }
        let path = self
            .client
            .business_case_pdf(&investment.agency_code, &investment.uii)
            .await?;
        pdf::extract_fields(
            &path,
            self.config.pdf_page,
            &self.config.pdf_fields,
            pdf::FIELD_SEPARATOR,
        )
    }
}

/// Serializes records to flat JSON objects, one per sheet row.
fn to_rows<T: Serialize>(records: &[T]) -> Result<Vec<Map<String, Value>>, SnapshotError> {
    records
        .iter()
        .map(|record| match serde_json::to_value(record)? {
            Value::Object(map) => Ok(map),
            other => Err(SnapshotError::Export(format!(
                "record is not an object: {}",
                other
            ))),
        })
        .collect()
}

/// Sheet name for one agency: `{code}_{name}`, spaces to underscores,
/// truncated to the workbook limit.
fn sheet_name(code: &str, name: &str) -> String {
    format!("{}_{}", code, name)
        .replace(' ', "_")
        .chars()
        .take(MAX_SHEET_NAME)
        .collect()
}

/// Columns for a sheet: the caller's explicit ordering, or the first-seen
/// union of fields across all rows.
fn columns_for(rows: &[Map<String, Value>], explicit: Option<&[String]>) -> Vec<String> {
    if let Some(columns) = explicit {
        return columns.to_vec();
    }
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Writes one tabular sheet: header row, then one row per record. Missing
/// fields stay blank; the optional index column gets a blank header cell.
fn write_sheet(
    sheet: &mut Worksheet,
    name: &str,
    rows: &[Map<String, Value>],
    explicit_columns: Option<&[String]>,
    index_rows: bool,
) -> Result<(), SnapshotError> {
    sheet.set_name(name)?;
    let columns = columns_for(rows, explicit_columns);
    let offset: u16 = if index_rows { 1 } else { 0 };

    for (col, column) in columns.iter().enumerate() {
        sheet.write_string(0, col as u16 + offset, column.as_str())?;
    }
    for (row, record) in rows.iter().enumerate() {
        let row_num = row as u32 + 1;
        if index_rows {
            sheet.write_number(row_num, 0, row as f64)?;
        }
        for (col, column) in columns.iter().enumerate() {
            if let Some(value) = record.get(column) {
                write_cell(sheet, row_num, col as u16 + offset, value)?;
            }
        }
    }
    Ok(())
}

/// Types a JSON scalar into its natural cell type; nulls stay blank and
/// structured values are stringified.
fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
) -> Result<(), SnapshotError> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                sheet.write_number(row, col, f)?;
            }
            None => {
                sheet.write_string(row, col, n.to_string())?;
            }
        },
        Value::String(s) => {
            sheet.write_string(row, col, s.as_str())?;
        }
        other => {
            sheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}
