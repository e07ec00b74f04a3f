pub mod dto;
pub mod link;

use std::collections::HashMap;
use std::env;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AppError;
use dto::{CategoryFields, CourseFields, FieldsEnvelope, RawRecord, RecordMap, SingleRecord};

pub const DEFAULT_BASE_URL: &str = "https://my.living-apps.de/rest";

#[derive(Clone, Debug)]
pub struct LivingAppsConfig {
    pub base_url: String,
    pub categories_app_id: String,
    pub courses_app_id: String,
    /// Session cookie for the ambient credentials the remote relies on.
    pub session_cookie: Option<String>,
}

impl LivingAppsConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("LIVING_APPS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let categories_app_id = env::var("CATEGORIES_APP_ID")
            .map_err(|_| AppError::Config("CATEGORIES_APP_ID is not set".to_string()))?;
        let courses_app_id = env::var("COURSES_APP_ID")
            .map_err(|_| AppError::Config("COURSES_APP_ID is not set".to_string()))?;
        let session_cookie = env::var("LIVING_APPS_SESSION").ok();

        Ok(Self {
            base_url,
            categories_app_id,
            courses_app_id,
            session_cookie,
        })
    }
}

/// CRUD seam over the remote hosted-record store, one set of operations
/// per collection. Services depend on this trait so tests can
/// substitute an in-memory store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<RawRecord<CategoryFields>>, AppError>;
    async fn get_category(&self, id: &str) -> Result<Option<RawRecord<CategoryFields>>, AppError>;
    async fn create_category(&self, fields: &CategoryFields) -> Result<RawRecord<CategoryFields>, AppError>;
    async fn update_category(&self, id: &str, fields: &CategoryFields) -> Result<RawRecord<CategoryFields>, AppError>;
    async fn delete_category(&self, id: &str) -> Result<bool, AppError>;

    async fn list_courses(&self) -> Result<Vec<RawRecord<CourseFields>>, AppError>;
    async fn get_course(&self, id: &str) -> Result<Option<RawRecord<CourseFields>>, AppError>;
    async fn create_course(&self, fields: &CourseFields) -> Result<RawRecord<CourseFields>, AppError>;
    async fn update_course(&self, id: &str, fields: &CourseFields) -> Result<RawRecord<CourseFields>, AppError>;
    async fn delete_course(&self, id: &str) -> Result<bool, AppError>;
}

pub struct LivingAppsHttpClient {
    client: Client,
    config: LivingAppsConfig,
}

impl LivingAppsHttpClient {
    pub fn new(config: LivingAppsConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn records_url(&self, app_id: &str) -> String {
        format!("{}/apps/{}/records", self.config.base_url, app_id)
    }

    fn record_url(&self, app_id: &str, id: &str) -> String {
        format!("{}/apps/{}/records/{}", self.config.base_url, app_id, id)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<reqwest::Response, AppError> {
        let mut request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(cookie) = &self.config.session_cookie {
            request = request.header(COOKIE, cookie.clone());
        }
        if let Some(body) = body {
            request = request.body(body);
        }
        request
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))
    }

    /// Reads the body of a response that is expected to succeed. A
    /// non-success status becomes a transport error carrying the raw
    /// response text.
    async fn success_text(response: reqwest::Response) -> Result<String, AppError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AppError::Transport(format!(
                "Living Apps API error {}: {}",
                status, body
            )));
        }
        Ok(body)
    }

    async fn list_records<F: DeserializeOwned>(
        &self,
        app_id: &str,
    ) -> Result<Vec<RawRecord<F>>, AppError> {
        let response = self
            .send(Method::GET, &self.records_url(app_id), None)
            .await?;
        let body = Self::success_text(response).await?;
        let map: RecordMap<F> = serde_json::from_str(&body)
            .map_err(|e| AppError::Decode(format!("Failed to parse record map: {}", e)))?;
        Ok(map
            .into_iter()
            .map(|(id, rec)| RawRecord::from_map_entry(id, rec))
            .collect())
    }

    async fn get_record<F: DeserializeOwned>(
        &self,
        app_id: &str,
        id: &str,
    ) -> Result<Option<RawRecord<F>>, AppError> {
        let response = self
            .send(Method::GET, &self.record_url(app_id, id), None)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = Self::success_text(response).await?;
        let record: SingleRecord<F> = serde_json::from_str(&body)
            .map_err(|e| AppError::Decode(format!("Failed to parse record: {}", e)))?;
        Ok(Some(RawRecord::from_single(record)))
    }

    async fn write_record<F: Serialize + DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        fields: &F,
    ) -> Result<RawRecord<F>, AppError> {
        let payload = serde_json::to_string(&FieldsEnvelope { fields })
            .map_err(|e| AppError::Decode(format!("Failed to encode fields payload: {}", e)))?;
        let response = self.send(method, url, Some(payload)).await?;
        let body = Self::success_text(response).await?;
        let record: SingleRecord<F> = serde_json::from_str(&body)
            .map_err(|e| AppError::Decode(format!("Failed to parse record: {}", e)))?;
        Ok(RawRecord::from_single(record))
    }

    async fn delete_record(&self, app_id: &str, id: &str) -> Result<bool, AppError> {
        let response = self
            .send(Method::DELETE, &self.record_url(app_id, id), None)
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "Living Apps API error {}: {}",
                status, body
            )));
        }
        // The remote answers deletions with an empty or minimal body;
        // it is never JSON-decoded.
        Ok(true)
    }
}

#[async_trait]
impl RecordStore for LivingAppsHttpClient {
    async fn list_categories(&self) -> Result<Vec<RawRecord<CategoryFields>>, AppError> {
        self.list_records(&self.config.categories_app_id).await
    }

    async fn get_category(&self, id: &str) -> Result<Option<RawRecord<CategoryFields>>, AppError> {
        self.get_record(&self.config.categories_app_id, id).await
    }

    async fn create_category(&self, fields: &CategoryFields) -> Result<RawRecord<CategoryFields>, AppError> {
        let url = self.records_url(&self.config.categories_app_id);
        self.write_record(Method::POST, &url, fields).await
    }

    async fn update_category(&self, id: &str, fields: &CategoryFields) -> Result<RawRecord<CategoryFields>, AppError> {
        let url = self.record_url(&self.config.categories_app_id, id);
        self.write_record(Method::PATCH, &url, fields).await
    }

    async fn delete_category(&self, id: &str) -> Result<bool, AppError> {
        self.delete_record(&self.config.categories_app_id, id).await
    }

    async fn list_courses(&self) -> Result<Vec<RawRecord<CourseFields>>, AppError> {
        self.list_records(&self.config.courses_app_id).await
    }

    async fn get_course(&self, id: &str) -> Result<Option<RawRecord<CourseFields>>, AppError> {
        self.get_record(&self.config.courses_app_id, id).await
    }

    async fn create_course(&self, fields: &CourseFields) -> Result<RawRecord<CourseFields>, AppError> {
        let url = self.records_url(&self.config.courses_app_id);
        self.write_record(Method::POST, &url, fields).await
    }

    async fn update_course(&self, id: &str, fields: &CourseFields) -> Result<RawRecord<CourseFields>, AppError> {
        let url = self.record_url(&self.config.courses_app_id, id);
        self.write_record(Method::PATCH, &url, fields).await
    }

    async fn delete_course(&self, id: &str) -> Result<bool, AppError> {
        self.delete_record(&self.config.courses_app_id, id).await
    }
}

/// In-memory stand-in for the remote store. Plays the remote side:
/// issues record ids, applies partial updates, and keeps the
/// mapping-of-records shape internally.
#[derive(Default)]
pub struct InMemoryRecordStore {
    categories: RwLock<HashMap<String, RawRecord<CategoryFields>>>,
    courses: RwLock<HashMap<String, RawRecord<CourseFields>>>,
    next_id: AtomicU64,
    fail_course_list: RwLock<bool>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_id(&self) -> String {
        format!("{:024x}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Makes the next `list_courses` calls fail, for exercising the
    /// fan-out failure path.
    pub fn set_fail_course_list(&self, fail: bool) {
        *self.fail_course_list.write().unwrap() = fail;
    }

    pub fn insert_category(&self, id: &str, fields: CategoryFields) {
        self.categories.write().unwrap().insert(
            id.to_string(),
            RawRecord {
                record_id: id.to_string(),
                fields,
                createdat: Utc::now().to_rfc3339(),
                updatedat: None,
            },
        );
    }

    pub fn insert_course(&self, id: &str, fields: CourseFields) {
        self.courses.write().unwrap().insert(
            id.to_string(),
            RawRecord {
                record_id: id.to_string(),
                fields,
                createdat: Utc::now().to_rfc3339(),
                updatedat: None,
            },
        );
    }

    pub fn course_fields(&self, id: &str) -> Option<CourseFields> {
        self.courses.read().unwrap().get(id).map(|r| r.fields.clone())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list_categories(&self) -> Result<Vec<RawRecord<CategoryFields>>, AppError> {
        Ok(self.categories.read().unwrap().values().cloned().collect())
    }

    async fn get_category(&self, id: &str) -> Result<Option<RawRecord<CategoryFields>>, AppError> {
        Ok(self.categories.read().unwrap().get(id).cloned())
    }

    async fn create_category(&self, fields: &CategoryFields) -> Result<RawRecord<CategoryFields>, AppError> {
        let record = RawRecord {
            record_id: self.issue_id(),
            fields: fields.clone(),
            createdat: Utc::now().to_rfc3339(),
            updatedat: None,
        };
        self.categories
            .write()
            .unwrap()
            .insert(record.record_id.clone(), record.clone());
        Ok(record)
    }

    async fn update_category(&self, id: &str, fields: &CategoryFields) -> Result<RawRecord<CategoryFields>, AppError> {
        let mut categories = self.categories.write().unwrap();
        let record = categories
            .get_mut(id)
            .ok_or_else(|| AppError::Transport(format!("Living Apps API error 404: no record {}", id)))?;
        record.fields.apply_patch(fields);
        record.updatedat = Some(Utc::now().to_rfc3339());
        Ok(record.clone())
    }

    async fn delete_category(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.categories.write().unwrap().remove(id).is_some())
    }

    async fn list_courses(&self) -> Result<Vec<RawRecord<CourseFields>>, AppError> {
        if *self.fail_course_list.read().unwrap() {
            return Err(AppError::Transport(
                "Living Apps API error 500: record store unavailable".to_string(),
            ));
        }
        Ok(self.courses.read().unwrap().values().cloned().collect())
    }

    async fn get_course(&self, id: &str) -> Result<Option<RawRecord<CourseFields>>, AppError> {
        Ok(self.courses.read().unwrap().get(id).cloned())
    }

    async fn create_course(&self, fields: &CourseFields) -> Result<RawRecord<CourseFields>, AppError> {
        let record = RawRecord {
            record_id: self.issue_id(),
            fields: fields.clone(),
            createdat: Utc::now().to_rfc3339(),
            updatedat: None,
        };
        self.courses
            .write()
            .unwrap()
            .insert(record.record_id.clone(), record.clone());
        Ok(record)
    }

    async fn update_course(&self, id: &str, fields: &CourseFields) -> Result<RawRecord<CourseFields>, AppError> {
        let mut courses = self.courses.write().unwrap();
        let record = courses
            .get_mut(id)
            .ok_or_else(|| AppError::Transport(format!("Living Apps API error 404: no record {}", id)))?;
        record.fields.apply_patch(fields);
        record.updatedat = Some(Utc::now().to_rfc3339());
        Ok(record.clone())
    }

    async fn delete_course(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.courses.write().unwrap().remove(id).is_some())
    }
}
