//! # client: REST client for a Teamcenter-style PLM server
//!
//! [`TeamcenterClient`] owns one `reqwest::Client` and at most one
//! [`Session`]. Every resource method is a single HTTP request against a fixed
//! path under the configured base URL:
//!
//! - the session is checked locally first; a missing or expired token fails
//!   with the "unauthenticated" tier of [`PlmError`] and sends nothing,
//! - any transport error or non-2xx status comes back as [`PlmError::Http`]
//!   with the `reqwest::Error` attached,
//! - there is no retry, backoff or token refresh.
//!
//! `authenticate` and `logout` take `&mut self`; share a client across tasks
//! only behind your own synchronisation, or build one client per task.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use percent_encoding::{utf8_percent_encode, AsciiSet, PercentEncode, CONTROLS};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{multipart, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tracing::{error, info, warn};

use crate::config::ConnectionConfig;
use crate::contract::PlmApi;
use crate::error::{BestEffort, PlmError};
use crate::model::{
    AuthResponse, BomLine, BomQuery, BomStructure, Credentials, Dataset, Item, NewBomLine,
    NewItem, NewWorkflow, ParentsEnvelope, Properties, ResultsEnvelope, SavedQuery, Task,
    TaskCompletion, TasksEnvelope, UploadRequest, Workflow, SAVED_QUERY_MAX_RESULTS,
};
use crate::session::{Clock, Session, SystemClock};

/// Only the login call has its own timeout; everything else uses the transport default.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(30);

/// Chunk size for streamed uploads and buffered downloads.
pub const TRANSFER_CHUNK_SIZE: usize = 8192;

pub struct TeamcenterClient {
    base_url: String,
    http: reqwest::Client,
    session: Option<Session>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TeamcenterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamcenterClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}

impl TeamcenterClient {
    pub fn new(base_url: &str) -> Result<Self, PlmError> {
        Self::with_clock(base_url, Arc::new(SystemClock))
    }

    /// Client whose expiry checks read time from `clock`.
    pub fn with_clock(base_url: &str, clock: Arc<dyn Clock>) -> Result<Self, PlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(format!("plm-bridge/{}", env!("CARGO_PKG_VERSION")))
            .use_rustls_tls()
            .build()
            .map_err(PlmError::http("build_http_client"))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            session: None,
            clock,
        })
    }

    /// Builds a client for `config.base_url` and logs in with its credentials.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, PlmError> {
        let mut client = Self::new(&config.base_url)?;
        client
            .authenticate(&config.username, &config.password)
            .await?;
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        Session::validate(self.session.as_ref(), self.clock.now()).is_ok()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request builder with the bearer token attached, or the local
    /// "unauthenticated" failure when there is no usable session.
    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, PlmError> {
        let session = Session::validate(self.session.as_ref(), self.clock.now())?;
        Ok(self
            .http
            .request(method, self.url(path))
            .bearer_auth(session.token()))
    }

    async fn send(operation: &'static str, request: RequestBuilder) -> Result<Response, PlmError> {
        request
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(PlmError::http(operation))
    }

    async fn send_json<T: DeserializeOwned>(
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, PlmError> {
        Self::send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(PlmError::http(operation))
    }

    /// Logs in and stores the token with a fixed one-hour expiry estimate.
    pub async fn authenticate(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<AuthResponse, PlmError> {
        let request = self
            .http
            .post(self.url("/restful/auth/login"))
            .json(&Credentials { username, password })
            .timeout(AUTH_TIMEOUT);

        let auth: AuthResponse = match Self::send_json("authenticate", request).await {
            Ok(auth) => auth,
            Err(e) => {
                error!(error = %e, username, "Authentication failed");
                return Err(e);
            }
        };

        let Some(token) = auth.token.clone() else {
            error!(username, "Authentication response carried no token");
            return Err(PlmError::MissingField {
                operation: "authenticate",
                field: "token",
            });
        };

        let session = Session::issue(token, self.clock.now());
        info!(
            username,
            expires_at = %session.expires_at(),
            "Successfully authenticated"
        );
        self.session = Some(session);
        Ok(auth)
    }

    /// Clears the local session and tells the server, best-effort.
    ///
    /// The session is gone afterwards whatever the server says; a failed
    /// notification is reported as [`BestEffort::Ignored`].
    pub async fn logout(&mut self) -> BestEffort {
        let Some(session) = self.session.take() else {
            return BestEffort::Skipped;
        };

        let request = self
            .http
            .post(self.url("/restful/auth/logout"))
            .bearer_auth(session.token());

        match Self::send("logout", request).await {
            Ok(_) => {
                info!("Successfully logged out");
                BestEffort::Completed
            }
            Err(e) => {
                warn!(error = %e, "Logout notification failed; local session cleared anyway");
                BestEffort::Ignored(e)
            }
        }
    }
}

/// Characters escaped in identifiers placed into a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn segment(id: &str) -> PercentEncode<'_> {
    utf8_percent_encode(id, PATH_SEGMENT)
}

async fn open_for_upload(path: &Path) -> Result<(tokio::fs::File, u64), PlmError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(PlmError::io("upload_file", path))?;
    let length = file
        .metadata()
        .await
        .map_err(PlmError::io("upload_file", path))?
        .len();
    Ok((file, length))
}

/// Streams `response` into `output_path`, creating or truncating it.
async fn write_body(response: Response, output_path: &Path) -> Result<u64, PlmError> {
    let file = tokio::fs::File::create(output_path)
        .await
        .map_err(PlmError::io("download_file", output_path))?;
    let mut writer = BufWriter::with_capacity(TRANSFER_CHUNK_SIZE, file);
    let mut body = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(PlmError::http("download_file"))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(PlmError::io("download_file", output_path))?;
        written += chunk.len() as u64;
    }
    writer
        .flush()
        .await
        .map_err(PlmError::io("download_file", output_path))?;
    Ok(written)
}

async fn read_chunk(
    mut file: tokio::fs::File,
) -> std::io::Result<Option<(Vec<u8>, tokio::fs::File)>> {
    let mut buf = vec![0u8; TRANSFER_CHUNK_SIZE];
    let read = file.read(&mut buf).await?;
    if read == 0 {
        return Ok(None);
    }
    buf.truncate(read);
    Ok(Some((buf, file)))
}

#[async_trait]
impl PlmApi for TeamcenterClient {
    async fn create_item(&self, item: NewItem) -> Result<Item, PlmError> {
        let request = self.authorized(Method::POST, "/restful/items")?.json(&item);
        match Self::send_json::<Item>("create_item", request).await {
            Ok(created) => {
                info!(item_id = %created.item_id, "Created item");
                Ok(created)
            }
            Err(e) => {
                error!(error = %e, item_id = %item.item_id, "Failed to create item");
                Err(e)
            }
        }
    }

    async fn get_item(&self, item_id: &str) -> Result<Item, PlmError> {
        let request = self.authorized(Method::GET, &format!("/restful/items/{}", segment(item_id)))?;
        Self::send_json("get_item", request).await.map_err(|e| {
            error!(error = %e, item_id, "Failed to get item");
            e
        })
    }

    async fn update_item(&self, item_id: &str, updates: Properties) -> Result<Item, PlmError> {
        let request = self
            .authorized(Method::PUT, &format!("/restful/items/{}", segment(item_id)))?
            .json(&updates);
        match Self::send_json::<Item>("update_item", request).await {
            Ok(updated) => {
                info!(item_id, "Updated item");
                Ok(updated)
            }
            Err(e) => {
                error!(error = %e, item_id, "Failed to update item");
                Err(e)
            }
        }
    }

    async fn delete_item(&self, item_id: &str) -> Result<(), PlmError> {
        let request = self.authorized(Method::DELETE, &format!("/restful/items/{}", segment(item_id)))?;
        match Self::send("delete_item", request).await {
            Ok(_) => {
                info!(item_id, "Deleted item");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, item_id, "Failed to delete item");
                Err(e)
            }
        }
    }

    async fn search_items(&self, query: Map<String, Value>) -> Result<Vec<Item>, PlmError> {
        let request = self
            .authorized(Method::POST, "/restful/items/search")?
            .json(&query);
        match Self::send_json::<ResultsEnvelope<Item>>("search_items", request).await {
            Ok(envelope) => {
                info!(count = envelope.results.len(), "Search returned items");
                Ok(envelope.results)
            }
            Err(e) => {
                error!(error = %e, "Search failed");
                Err(e)
            }
        }
    }

    async fn get_bom_structure(
        &self,
        item_id: &str,
        query: BomQuery,
    ) -> Result<BomStructure, PlmError> {
        let request = self
            .authorized(Method::GET, &format!("/restful/bom/{}/structure", segment(item_id)))?
            .query(&query.to_query_pairs());
        match Self::send_json::<BomStructure>("get_bom_structure", request).await {
            Ok(bom) => {
                info!(item_id, lines = bom.lines.len(), "Retrieved BOM structure");
                Ok(bom)
            }
            Err(e) => {
                error!(error = %e, item_id, "Failed to get BOM structure");
                Err(e)
            }
        }
    }

    async fn add_bom_line(&self, parent_id: &str, line: NewBomLine) -> Result<BomLine, PlmError> {
        let request = self
            .authorized(Method::POST, &format!("/restful/bom/{}/lines", segment(parent_id)))?
            .json(&line);
        match Self::send_json::<BomLine>("add_bom_line", request).await {
            Ok(created) => {
                info!(parent_id, child_id = %line.child_id, "Added BOM line");
                Ok(created)
            }
            Err(e) => {
                error!(error = %e, parent_id, child_id = %line.child_id, "Failed to add BOM line");
                Err(e)
            }
        }
    }

    async fn update_bom_line(
        &self,
        parent_id: &str,
        line_id: &str,
        updates: Properties,
    ) -> Result<BomLine, PlmError> {
        let request = self
            .authorized(
                Method::PUT,
                &format!("/restful/bom/{}/lines/{}", segment(parent_id), segment(line_id)),
            )?
            .json(&updates);
        match Self::send_json::<BomLine>("update_bom_line", request).await {
            Ok(updated) => {
                info!(parent_id, line_id, "Updated BOM line");
                Ok(updated)
            }
            Err(e) => {
                error!(error = %e, parent_id, line_id, "Failed to update BOM line");
                Err(e)
            }
        }
    }

    async fn remove_bom_line(&self, parent_id: &str, line_id: &str) -> Result<(), PlmError> {
        let request = self.authorized(
            Method::DELETE,
            &format!("/restful/bom/{}/lines/{}", segment(parent_id), segment(line_id)),
        )?;
        match Self::send("remove_bom_line", request).await {
            Ok(_) => {
                info!(parent_id, line_id, "Removed BOM line");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, parent_id, line_id, "Failed to remove BOM line");
                Err(e)
            }
        }
    }

    async fn get_where_used(&self, item_id: &str) -> Result<Vec<Item>, PlmError> {
        let request = self.authorized(Method::GET, &format!("/restful/bom/{}/where-used", segment(item_id)))?;
        match Self::send_json::<ParentsEnvelope>("get_where_used", request).await {
            Ok(envelope) => {
                info!(item_id, parents = envelope.parents.len(), "Found where-used parents");
                Ok(envelope.parents)
            }
            Err(e) => {
                error!(error = %e, item_id, "Failed to get where-used");
                Err(e)
            }
        }
    }

    async fn start_workflow(&self, workflow: NewWorkflow) -> Result<Workflow, PlmError> {
        let request = self
            .authorized(Method::POST, "/restful/workflows/start")?
            .json(&workflow);
        match Self::send_json::<Workflow>("start_workflow", request).await {
            Ok(started) => {
                info!(
                    workflow_id = started.workflow_id.as_deref().unwrap_or("<none>"),
                    process_name = %workflow.process_name,
                    "Started workflow"
                );
                Ok(started)
            }
            Err(e) => {
                error!(error = %e, process_name = %workflow.process_name, "Failed to start workflow");
                Err(e)
            }
        }
    }

    async fn get_my_tasks(&self) -> Result<Vec<Task>, PlmError> {
        let request = self.authorized(Method::GET, "/restful/workflows/my-tasks")?;
        match Self::send_json::<TasksEnvelope>("get_my_tasks", request).await {
            Ok(envelope) => {
                info!(count = envelope.tasks.len(), "Found pending tasks");
                Ok(envelope.tasks)
            }
            Err(e) => {
                error!(error = %e, "Failed to get tasks");
                Err(e)
            }
        }
    }

    async fn complete_task(
        &self,
        task_id: &str,
        decision: &str,
        comments: &str,
    ) -> Result<Value, PlmError> {
        let request = self
            .authorized(
                Method::POST,
                &format!("/restful/workflows/tasks/{}/complete", segment(task_id)),
            )?
            .json(&TaskCompletion { decision, comments });
        match Self::send_json::<Value>("complete_task", request).await {
            Ok(result) => {
                info!(task_id, decision, "Completed task");
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, task_id, "Failed to complete task");
                Err(e)
            }
        }
    }

    async fn upload_file(&self, request: UploadRequest) -> Result<Dataset, PlmError> {
        let builder = self.authorized(Method::POST, "/restful/documents/upload")?;
        let path = request.file_path.clone();

        let (file, length) = match open_for_upload(&path).await {
            Ok(opened) => opened,
            Err(e) => {
                error!(error = %e, item_id = %request.item_id, file = %path.display(), "Failed to read upload source");
                return Err(e);
            }
        };

        let chunks = futures::stream::try_unfold(file, read_chunk);

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let part = multipart::Part::stream_with_length(reqwest::Body::wrap_stream(chunks), length)
            .file_name(file_name);
        let form = multipart::Form::new()
            .part("file", part)
            .text("itemId", request.item_id.clone())
            .text("datasetType", request.dataset_type.clone())
            .text("relationType", request.relation_type.clone());

        match Self::send_json::<Dataset>("upload_file", builder.multipart(form)).await {
            Ok(dataset) => {
                info!(
                    dataset_id = dataset.dataset_id.as_deref().unwrap_or("<none>"),
                    item_id = %request.item_id,
                    file = %path.display(),
                    "Uploaded file to dataset"
                );
                Ok(dataset)
            }
            Err(e) => {
                error!(error = %e, item_id = %request.item_id, file = %path.display(), "Failed to upload file");
                Err(e)
            }
        }
    }

    async fn download_file(
        &self,
        dataset_id: &str,
        output_path: &Path,
    ) -> Result<PathBuf, PlmError> {
        let request = self.authorized(
            Method::GET,
            &format!("/restful/documents/{}/download", segment(dataset_id)),
        )?;
        let response = Self::send("download_file", request).await.map_err(|e| {
            error!(error = %e, dataset_id, "Failed to download file");
            e
        })?;

        let written = match write_body(response, output_path).await {
            Ok(written) => written,
            Err(e) => {
                error!(error = %e, dataset_id, path = %output_path.display(), "Failed to save downloaded file");
                return Err(e);
            }
        };

        info!(dataset_id, bytes = written, path = %output_path.display(), "Downloaded file");
        Ok(output_path.to_path_buf())
    }

    async fn execute_saved_query(
        &self,
        query_name: &str,
        parameters: Map<String, Value>,
    ) -> Result<Vec<Value>, PlmError> {
        let body = SavedQuery {
            query_name,
            parameters: &parameters,
            max_results: SAVED_QUERY_MAX_RESULTS,
        };
        let request = self
            .authorized(Method::POST, "/restful/query/execute")?
            .json(&body);
        match Self::send_json::<ResultsEnvelope<Value>>("execute_saved_query", request).await {
            Ok(envelope) => {
                info!(query_name, count = envelope.results.len(), "Saved query returned results");
                Ok(envelope.results)
            }
            Err(e) => {
                error!(error = %e, query_name, "Query execution failed");
                Err(e)
            }
        }
    }

    async fn get_server_info(&self) -> Result<Value, PlmError> {
        let request = self.authorized(Method::GET, "/restful/info")?;
        Self::send_json("get_server_info", request).await.map_err(|e| {
            error!(error = %e, "Failed to get server info");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = TeamcenterClient::new("http://plm.local/tc/").unwrap();
        assert_eq!(client.base_url(), "http://plm.local/tc");
        assert_eq!(client.url("/restful/info"), "http://plm.local/tc/restful/info");
    }

    #[test]
    fn identifiers_are_escaped_as_single_path_segments() {
        assert_eq!(segment("PUMP-100_A").to_string(), "PUMP-100_A");
        assert_eq!(segment("A/B?rev#1").to_string(), "A%2FB%3Frev%231");
        assert_eq!(segment("50% off").to_string(), "50%25%20off");
    }

    #[tokio::test]
    async fn protected_calls_fail_locally_without_session() {
        // Port 9 (discard) is never contacted: the session check fails first.
        let client = TeamcenterClient::new("http://127.0.0.1:9").unwrap();
        let err = client.get_item("ANY").await.unwrap_err();
        assert!(matches!(err, PlmError::NotAuthenticated));
        assert!(!client.is_authenticated());
    }

    #[tokio::test]
    async fn logout_without_session_is_skipped() {
        let mut client = TeamcenterClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(client.logout().await, BestEffort::Skipped));
    }
}
