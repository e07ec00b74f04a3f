pub mod category;
pub mod course;

pub use category::{Category, CategoryDraft};
pub use course::{Course, CourseDraft, CourseStatus, format_date};
