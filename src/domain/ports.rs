use crate::analysis::AnalysisOptions;
use crate::domain::model::{Table, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_file(&self) -> &str;
    fn sheet_name(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn analysis_options(&self) -> AnalysisOptions;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Table>;
    async fn transform(&self, table: Table) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
