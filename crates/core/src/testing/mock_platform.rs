//! Mock platform client and connector for testing.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use crate::account::Account;
use crate::error::UploadStage;
use crate::platform::{
    AccessToken, ApiError, CreateGroupParams, CreatedGroupPayload, PlatformApi,
    PlatformConnector, PlatformError, UploadedPhoto,
};

/// Mock implementation of the PlatformApi trait.
///
/// Create-group responses are scripted in order with
/// [`push_create_response`](Self::push_create_response). Once the script
/// runs dry every call succeeds with a fresh id.
#[derive(Debug)]
pub struct MockPlatform {
    /// Token handed out by `fetch_access_token`; `None` fails the fetch.
    token: Arc<RwLock<Option<String>>>,
    token_fetches: Arc<RwLock<usize>>,
    /// Scripted create-group results.
    create_responses: Arc<RwLock<VecDeque<Result<CreatedGroupPayload, PlatformError>>>>,
    /// Parameters of every create-group call, in order.
    create_calls: Arc<RwLock<Vec<CreateGroupParams>>>,
    next_group_id: Arc<RwLock<u64>>,
    /// Panic inside the next create-group call.
    panic_on_create: Arc<RwLock<bool>>,
    failing_stage: Arc<RwLock<Option<UploadStage>>>,
    upload_server_owners: Arc<RwLock<Vec<i64>>>,
    uploads: Arc<RwLock<usize>>,
    saved_owners: Arc<RwLock<Vec<i64>>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// Create a new mock platform handing out the token `mock-token`.
    pub fn new() -> Self {
        Self {
            token: Arc::new(RwLock::new(Some("mock-token".to_string()))),
            token_fetches: Arc::new(RwLock::new(0)),
            create_responses: Arc::new(RwLock::new(VecDeque::new())),
            create_calls: Arc::new(RwLock::new(Vec::new())),
            next_group_id: Arc::new(RwLock::new(1000)),
            panic_on_create: Arc::new(RwLock::new(false)),
            failing_stage: Arc::new(RwLock::new(None)),
            upload_server_owners: Arc::new(RwLock::new(Vec::new())),
            uploads: Arc::new(RwLock::new(0)),
            saved_owners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Start unscripted group ids at `id` instead of 1000.
    pub fn with_first_group_id(self, id: u64) -> Self {
        Self {
            next_group_id: Arc::new(RwLock::new(id)),
            ..self
        }
    }

    pub async fn set_token(&self, token: &str) {
        *self.token.write().await = Some(token.to_string());
    }

    /// Make every token fetch fail.
    pub async fn fail_token_fetch(&self) {
        *self.token.write().await = None;
    }

    pub async fn token_fetches(&self) -> usize {
        *self.token_fetches.read().await
    }

    /// Queue the result of the next unscripted create-group call.
    pub async fn push_create_response(
        &self,
        response: Result<CreatedGroupPayload, PlatformError>,
    ) {
        self.create_responses.write().await.push_back(response);
    }

    /// Get the parameters of every create-group call made so far.
    pub async fn create_calls(&self) -> Vec<CreateGroupParams> {
        self.create_calls.read().await.clone()
    }

    pub async fn panic_on_next_create(&self) {
        *self.panic_on_create.write().await = true;
    }

    /// Make one stage of the photo sub-pipeline fail.
    pub async fn fail_upload_stage(&self, stage: UploadStage) {
        *self.failing_stage.write().await = Some(stage);
    }

    pub async fn upload_server_owners(&self) -> Vec<i64> {
        self.upload_server_owners.read().await.clone()
    }

    pub async fn uploads(&self) -> usize {
        *self.uploads.read().await
    }

    pub async fn saved_owners(&self) -> Vec<i64> {
        self.saved_owners.read().await.clone()
    }

    async fn stage_fails(&self, stage: UploadStage) -> bool {
        *self.failing_stage.read().await == Some(stage)
    }
}

fn stage_error(stage: UploadStage) -> PlatformError {
    PlatformError::Api(ApiError::from_payload(json!({
        "error_code": 100,
        "error_msg": format!("mock {} failure", stage),
    })))
}

#[async_trait]
impl PlatformApi for MockPlatform {
    async fn fetch_access_token(&self) -> Result<AccessToken, PlatformError> {
        *self.token_fetches.write().await += 1;
        match self.token.read().await.clone() {
            Some(token) => Ok(AccessToken::new(token)),
            None => Err(PlatformError::MissingToken("mock token fetch failure".to_string())),
        }
    }

    async fn create_group(
        &self,
        _token: &AccessToken,
        params: &CreateGroupParams,
    ) -> Result<CreatedGroupPayload, PlatformError> {
        self.create_calls.write().await.push(params.clone());

        let should_panic = std::mem::take(&mut *self.panic_on_create.write().await);
        if should_panic {
            panic!("mock create_group panic");
        }

        if let Some(response) = self.create_responses.write().await.pop_front() {
            return response;
        }

        let mut next_id = self.next_group_id.write().await;
        let id = *next_id;
        *next_id += 1;
        Ok(CreatedGroupPayload {
            id: Some(id),
            screen_name: Some(format!("club{}", id)),
        })
    }

    async fn owner_photo_upload_server(
        &self,
        _token: &AccessToken,
        owner_id: i64,
    ) -> Result<String, PlatformError> {
        if self.stage_fails(UploadStage::RequestServer).await {
            return Err(stage_error(UploadStage::RequestServer));
        }
        self.upload_server_owners.write().await.push(owner_id);
        Ok(format!("https://pu.mock/upload?owner={}", owner_id))
    }

    async fn upload_photo(
        &self,
        _upload_url: &str,
        _photo: &Path,
    ) -> Result<UploadedPhoto, PlatformError> {
        if self.stage_fails(UploadStage::Upload).await {
            return Err(PlatformError::UploadRejected("mock upload failure".to_string()));
        }
        *self.uploads.write().await += 1;
        Ok(UploadedPhoto {
            server: "1".to_string(),
            photo: "mock-photo".to_string(),
            hash: "mock-hash".to_string(),
        })
    }

    async fn save_owner_photo(
        &self,
        _token: &AccessToken,
        owner_id: i64,
        _photo: &UploadedPhoto,
    ) -> Result<(), PlatformError> {
        if self.stage_fails(UploadStage::Save).await {
            return Err(stage_error(UploadStage::Save));
        }
        self.saved_owners.write().await.push(owner_id);
        Ok(())
    }
}

/// Mock connector handing out one [`MockPlatform`] per account name.
///
/// `connect` is synchronous, so state sits behind std mutexes here.
#[derive(Debug, Default)]
pub struct MockConnector {
    platforms: Mutex<HashMap<String, Arc<MockPlatform>>>,
    failing: Mutex<HashSet<String>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The platform used for `account_name`, created on first use.
    ///
    /// Each platform hands out ids from its own range so groups of
    /// different accounts never collide.
    pub fn platform_for(&self, account_name: &str) -> Arc<MockPlatform> {
        let mut platforms = self.platforms.lock().unwrap_or_else(|e| e.into_inner());
        let first_id = 1000 * (platforms.len() as u64 + 1);
        platforms
            .entry(account_name.to_string())
            .or_insert_with(|| Arc::new(MockPlatform::new().with_first_group_id(first_id)))
            .clone()
    }

    /// Make `connect` fail for `account_name`.
    pub fn fail_for(&self, account_name: &str) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(account_name.to_string());
    }
}

impl PlatformConnector for MockConnector {
    fn connect(&self, account: &Account) -> Result<Arc<dyn PlatformApi>, PlatformError> {
        let fails = self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&account.name);
        if fails {
            return Err(PlatformError::InvalidProxy {
                proxy: account.proxy.clone().unwrap_or_default(),
                reason: "mock connect failure".to_string(),
            });
        }
        Ok(self.platform_for(&account.name))
    }
}
