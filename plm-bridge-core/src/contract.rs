//! # contract: the resource operations of a PLM server
//!
//! [`PlmApi`] lists every protected operation the REST client offers. The
//! assembly automation is written against this trait rather than against
//! [`crate::client::TeamcenterClient`], so it can run against `mockall`
//! mocks in tests.
//!
//! Session handling (`authenticate`, `logout`) is not part of the trait: it
//! mutates the client and belongs to whoever owns it.
//!
//! Each method maps to exactly one HTTP request in the real client. Failures
//! come back as [`PlmError`]; nothing is retried.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde_json::{Map, Value};

use crate::error::PlmError;
use crate::model::{
    BomLine, BomQuery, BomStructure, Dataset, Item, NewBomLine, NewItem, NewWorkflow, Properties,
    Task, UploadRequest, Workflow,
};

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PlmApi: Send + Sync {
    async fn create_item(&self, item: NewItem) -> Result<Item, PlmError>;

    async fn get_item(&self, item_id: &str) -> Result<Item, PlmError>;

    async fn update_item(&self, item_id: &str, updates: Properties) -> Result<Item, PlmError>;

    async fn delete_item(&self, item_id: &str) -> Result<(), PlmError>;

    /// Results come back in server order; an absent result list is empty.
    async fn search_items(&self, query: Map<String, Value>) -> Result<Vec<Item>, PlmError>;

    async fn get_bom_structure(
        &self,
        item_id: &str,
        query: BomQuery,
    ) -> Result<BomStructure, PlmError>;

    async fn add_bom_line(&self, parent_id: &str, line: NewBomLine) -> Result<BomLine, PlmError>;

    async fn update_bom_line(
        &self,
        parent_id: &str,
        line_id: &str,
        updates: Properties,
    ) -> Result<BomLine, PlmError>;

    async fn remove_bom_line(&self, parent_id: &str, line_id: &str) -> Result<(), PlmError>;

    /// Parent items that use `item_id`.
    async fn get_where_used(&self, item_id: &str) -> Result<Vec<Item>, PlmError>;

    async fn start_workflow(&self, workflow: NewWorkflow) -> Result<Workflow, PlmError>;

    async fn get_my_tasks(&self) -> Result<Vec<Task>, PlmError>;

    async fn complete_task(
        &self,
        task_id: &str,
        decision: &str,
        comments: &str,
    ) -> Result<Value, PlmError>;

    async fn upload_file(&self, request: UploadRequest) -> Result<Dataset, PlmError>;

    /// Streams the dataset to `output_path`, replacing any existing file.
    async fn download_file(&self, dataset_id: &str, output_path: &Path)
        -> Result<PathBuf, PlmError>;

    async fn execute_saved_query(
        &self,
        query_name: &str,
        parameters: Map<String, Value>,
    ) -> Result<Vec<Value>, PlmError>;

    async fn get_server_info(&self) -> Result<Value, PlmError>;
}
