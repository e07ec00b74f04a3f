use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::AppError;
use crate::living_apps::{LivingAppsConfig, RecordStore};
use crate::models::{Category, CategoryDraft, Course, CourseDraft, CourseStatus};

/// Sentinel label for a course whose category id matches no loaded
/// category (or is empty).
pub const UNKNOWN_CATEGORY: &str = "Unbekannt";

/// Snapshot of everything the dashboard shows. Replaced wholesale
/// after each load or mutation, never patched in place.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    pub categories: Vec<Category>,
    pub courses: Vec<Course>,
}

impl DashboardState {
    pub fn category_name(&self, category_id: &str) -> &str {
        self.categories
            .iter()
            .find(|c| c.record_id == category_id)
            .map(|c| c.name.as_str())
            .unwrap_or(UNKNOWN_CATEGORY)
    }

    pub fn filtered_courses(&self, filter: &CourseFilter) -> Vec<&Course> {
        self.courses.iter().filter(|c| filter.matches(c)).collect()
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats {
            total_courses: self.courses.len(),
            active_courses: self
                .courses
                .iter()
                .filter(|c| c.status == CourseStatus::Active)
                .count(),
            total_participants: self
                .courses
                .iter()
                .map(|c| u64::from(c.current_participants))
                .sum(),
            categories: self.categories.len(),
        }
    }
}

/// Query-side course filter. `all`, empty, or an absent value means no
/// filtering on that axis.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl CourseFilter {
    fn matches(&self, course: &Course) -> bool {
        if let Some(category) = self.category.as_deref() {
            if !category.is_empty() && category != "all" && course.category_id != category {
                return false;
            }
        }
        if let Some(status) = self.status.as_deref() {
            if !status.is_empty() && status != "all" && course.status.as_str() != status {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_courses: usize,
    pub active_courses: usize,
    pub total_participants: u64,
    pub categories: usize,
}

/// Owns the application state and drives every flow against the remote
/// store: concurrent fan-out load, validate-then-mutate-then-reload.
pub struct DashboardService {
    store: Arc<dyn RecordStore>,
    config: LivingAppsConfig,
    state: RwLock<DashboardState>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn RecordStore>, config: LivingAppsConfig) -> Self {
        Self {
            store,
            config,
            state: RwLock::new(DashboardState::default()),
        }
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    /// Fetches both collections concurrently. The previous snapshot
    /// stays in place unless both reads succeed.
    pub async fn reload(&self) -> Result<DashboardState, AppError> {
        let (categories, courses) =
            tokio::try_join!(self.store.list_categories(), self.store.list_courses())?;

        let state = DashboardState {
            categories: categories.iter().map(Category::from_record).collect(),
            courses: courses.iter().map(Course::from_record).collect(),
        };
        info!(
            "loaded {} categories, {} courses",
            state.categories.len(),
            state.courses.len()
        );

        *self.state.write().await = state.clone();
        Ok(state)
    }

    pub async fn create_course(&self, draft: &CourseDraft) -> Result<DashboardState, AppError> {
        draft.validate()?;
        let fields = draft.to_fields(None, &self.config.base_url, &self.config.categories_app_id);
        let record = self.store.create_course(&fields).await?;
        info!("created course {}", record.record_id);
        self.reload().await
    }

    pub async fn update_course(
        &self,
        id: &str,
        draft: &CourseDraft,
    ) -> Result<DashboardState, AppError> {
        draft.validate()?;
        let existing_enrollment = self.current_enrollment(id).await?;
        let fields = draft.to_fields(
            Some(existing_enrollment),
            &self.config.base_url,
            &self.config.categories_app_id,
        );
        self.store.update_course(id, &fields).await?;
        info!("updated course {}", id);
        self.reload().await
    }

    pub async fn delete_course(&self, id: &str) -> Result<DashboardState, AppError> {
        self.store.delete_course(id).await?;
        info!("deleted course {}", id);
        self.reload().await
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<DashboardState, AppError> {
        draft.validate()?;
        let record = self.store.create_category(&draft.to_fields()).await?;
        info!("created category {}", record.record_id);
        self.reload().await
    }

    pub async fn update_category(
        &self,
        id: &str,
        draft: &CategoryDraft,
    ) -> Result<DashboardState, AppError> {
        draft.validate()?;
        self.store.update_category(id, &draft.to_fields()).await?;
        info!("updated category {}", id);
        self.reload().await
    }

    pub async fn delete_category(&self, id: &str) -> Result<DashboardState, AppError> {
        self.store.delete_category(id).await?;
        info!("deleted category {}", id);
        self.reload().await
    }

    /// Enrollment is never operator-edited: it is carried forward from
    /// the loaded course, or fetched when the snapshot is stale.
    async fn current_enrollment(&self, id: &str) -> Result<u32, AppError> {
        let loaded = self
            .state
            .read()
            .await
            .courses
            .iter()
            .find(|c| c.record_id == id)
            .map(|c| c.current_participants);
        if let Some(enrollment) = loaded {
            return Ok(enrollment);
        }
        match self.store.get_course(id).await? {
            Some(record) => Ok(Course::from_record(&record).current_participants),
            None => Err(AppError::NotFound),
        }
    }
}
