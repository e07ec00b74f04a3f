pub mod dashboard;

pub use dashboard::{CourseFilter, DashboardService, DashboardState, DashboardStats, UNKNOWN_CATEGORY};
