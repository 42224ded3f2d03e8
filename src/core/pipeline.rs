use crate::adapters::{export, reader};
use crate::analysis::analyze;
use crate::core::{ConfigProvider, Pipeline, Storage, Table, TransformResult};
use crate::utils::error::Result;
use crate::utils::validation::validate_input_size;

pub const REPORT_ZIP: &str = "shipment_report.zip";
pub const REPORT_XLSX: &str = "shipment_report.xlsx";
pub const SUMMARY_JSON: &str = "summary.json";

pub struct ShipmentPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> ShipmentPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn output_file(&self, name: &str) -> String {
        format!("{}/{}", self.config.output_path().trim_end_matches('/'), name)
    }

    fn wants(&self, format: &str) -> bool {
        self.config.output_formats().iter().any(|f| f == format)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ShipmentPipeline<S, C> {
    async fn extract(&self) -> Result<Table> {
        let input = self.config.input_file();
        tracing::debug!("Reading input file: {}", input);

        let bytes = self.storage.read_file(input).await?;
        validate_input_size(input, bytes.len() as u64)?;

        reader::read_table(input, bytes, self.config.sheet_name())
    }

    async fn transform(&self, table: Table) -> Result<TransformResult> {
        let options = self.config.analysis_options();
        let report = analyze(&table, &options);

        for (role, column) in report.columns.iter() {
            tracing::debug!("Mapped {} -> {}", role, column);
        }

        let tables = report.to_tables();
        Ok(TransformResult { report, tables })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let mut entries: Vec<(String, Vec<u8>)> = Vec::new();

        if self.wants("csv") {
            for table in &result.tables {
                entries.push((format!("{}.csv", table.name), export::to_csv_bytes(table)?));
            }
        }

        if self.wants("xlsx") {
            let workbook = export::to_xlsx_bytes(&result.tables)?;
            self.storage
                .write_file(&self.output_file(REPORT_XLSX), &workbook)
                .await?;
            entries.push((REPORT_XLSX.to_string(), workbook));
        }

        if self.wants("json") {
            let json = serde_json::to_string_pretty(&result.report)?;
            entries.push((SUMMARY_JSON.to_string(), json.into_bytes()));
        }

        tracing::debug!("Creating ZIP file with {} files", entries.len());
        let zip_data = export::to_zip_bytes(&entries)?;

        let output_path = self.output_file(REPORT_ZIP);
        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(&output_path, &zip_data).await?;

        Ok(output_path)
    }
}
