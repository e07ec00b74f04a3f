use axum::extract::{Path, Query};
use axum::routing::patch;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get, routing::post};
use serde::Serialize;

use crate::error::AppError;
use crate::models::{Category, CategoryDraft, Course, CourseDraft, format_date};
use crate::services::{CourseFilter, DashboardState, DashboardStats};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/dashboard", get(dashboard))
        .route("/reload", post(reload))
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/{id}", patch(update_course).delete(delete_course))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/{id}", patch(update_category).delete(delete_category))
        .with_state(state)
}

#[derive(Serialize)]
struct DashboardResponse {
    stats: DashboardStats,
    categories: Vec<Category>,
    courses: Vec<CourseView>,
}

/// Course plus the derived display values the dashboard shows on each
/// card: resolved category name, status label, clamped fill ratio and
/// formatted dates.
#[derive(Serialize)]
struct CourseView {
    #[serde(flatten)]
    course: Course,
    category_name: String,
    status_label: &'static str,
    fill_percent: u32,
    is_full: bool,
    start_date_display: String,
    end_date_display: String,
}

fn course_views(snapshot: &DashboardState) -> Vec<CourseView> {
    snapshot
        .courses
        .iter()
        .map(|course| CourseView {
            category_name: snapshot.category_name(&course.category_id).to_string(),
            status_label: course.status.label(),
            fill_percent: course.fill_percent(),
            is_full: course.is_full(),
            start_date_display: format_date(&course.start_date),
            end_date_display: format_date(&course.end_date),
            course: course.clone(),
        })
        .collect()
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let snapshot = state.dashboard.snapshot().await;
    Json(DashboardResponse {
        stats: snapshot.stats(),
        courses: course_views(&snapshot),
        categories: snapshot.categories,
    })
}

async fn reload(State(state): State<AppState>) -> Result<Json<DashboardState>, AppError> {
    let snapshot = state.dashboard.reload().await?;
    Ok(Json(snapshot))
}

async fn list_courses(
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
) -> Json<Vec<Course>> {
    let snapshot = state.dashboard.snapshot().await;
    Json(snapshot.filtered_courses(&filter).into_iter().cloned().collect())
}

async fn create_course(
    State(state): State<AppState>,
    Json(draft): Json<CourseDraft>,
) -> Result<Json<DashboardState>, AppError> {
    let snapshot = state.dashboard.create_course(&draft).await?;
    Ok(Json(snapshot))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<CourseDraft>,
) -> Result<Json<DashboardState>, AppError> {
    let snapshot = state.dashboard.update_course(&id, &draft).await?;
    Ok(Json(snapshot))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DashboardState>, AppError> {
    let snapshot = state.dashboard.delete_course(&id).await?;
    Ok(Json(snapshot))
}

async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.dashboard.snapshot().await.categories)
}

async fn create_category(
    State(state): State<AppState>,
    Json(draft): Json<CategoryDraft>,
) -> Result<Json<DashboardState>, AppError> {
    let snapshot = state.dashboard.create_category(&draft).await?;
    Ok(Json(snapshot))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<CategoryDraft>,
) -> Result<Json<DashboardState>, AppError> {
    let snapshot = state.dashboard.update_category(&id, &draft).await?;
    Ok(Json(snapshot))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DashboardState>, AppError> {
    let snapshot = state.dashboard.delete_category(&id).await?;
    Ok(Json(snapshot))
}
