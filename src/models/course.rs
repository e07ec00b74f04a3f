use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;
use crate::living_apps::dto::{CourseFields, RawRecord};
use crate::living_apps::link::{extract_record_id, record_url};

pub const DEFAULT_MAX_PARTICIPANTS: u32 = 20;

/// Course status is only ever set by explicit operator choice; it is
/// never inferred from dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Active,
    #[default]
    Upcoming,
    Completed,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Active => "active",
            CourseStatus::Upcoming => "upcoming",
            CourseStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(CourseStatus::Active),
            "upcoming" => Some(CourseStatus::Upcoming),
            "completed" => Some(CourseStatus::Completed),
            _ => None,
        }
    }

    /// German label shown by the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            CourseStatus::Active => "Aktiv",
            CourseStatus::Upcoming => "Geplant",
            CourseStatus::Completed => "Abgeschlossen",
        }
    }
}

/// Fully-defaulted local shape of a course, ready for display and
/// editing. The category relationship is a bare 24-hex id; empty means
/// uncategorized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub record_id: String,
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub instructor: String,
    pub max_participants: u32,
    pub current_participants: u32,
    pub start_date: String,
    pub end_date: String,
    pub status: CourseStatus,
}

impl Course {
    /// Applies the per-field default table once, at the trust boundary.
    /// A malformed or absent category URL yields an empty id.
    pub fn from_record(record: &RawRecord<CourseFields>) -> Self {
        let fields = &record.fields;
        Self {
            record_id: record.record_id.clone(),
            title: fields.title.clone().unwrap_or_default(),
            description: fields.description.clone().unwrap_or_default(),
            category_id: extract_record_id(fields.category.as_deref()).unwrap_or_default(),
            instructor: fields.instructor.clone().unwrap_or_default(),
            max_participants: fields.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS),
            current_participants: fields.current_participants.unwrap_or(0),
            start_date: fields.start_date.clone().unwrap_or_default(),
            end_date: fields.end_date.clone().unwrap_or_default(),
            status: fields
                .status
                .as_deref()
                .and_then(CourseStatus::parse)
                .unwrap_or_default(),
        }
    }

    /// Fill ratio as a display percentage, clamped to 100. Overbooking
    /// is permitted; the clamp is display-only.
    pub fn fill_percent(&self) -> u32 {
        if self.max_participants == 0 {
            return if self.current_participants == 0 { 0 } else { 100 };
        }
        (u64::from(self.current_participants) * 100 / u64::from(self.max_participants)).min(100)
            as u32
    }

    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }
}

/// Editable form shape. Enrollment is deliberately absent: it is
/// carried forward from the loaded course on update and initialized to
/// zero on create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: String,
    pub instructor: String,
    #[serde(default = "default_max_participants", deserialize_with = "coerce_capacity")]
    pub max_participants: u32,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub status: CourseStatus,
}

fn default_max_participants() -> u32 {
    DEFAULT_MAX_PARTICIPANTS
}

/// Form-layer coercion policy: a capacity that arrives as a string is
/// parsed, and invalid numeric input becomes 0 rather than an error.
fn coerce_capacity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Capacity {
        Number(u32),
        Text(String),
    }

    Ok(match Capacity::deserialize(deserializer)? {
        Capacity::Number(n) => n,
        Capacity::Text(s) => s.trim().parse().unwrap_or(0),
    })
}

impl CourseDraft {
    /// Required-field check, applied before any network call.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        if self.instructor.is_empty() {
            return Err(AppError::Validation("instructor is required".to_string()));
        }
        if self.category_id.is_empty() {
            return Err(AppError::Validation("category is required".to_string()));
        }
        Ok(())
    }

    /// Builds the outgoing fields payload. Empty or zero optional
    /// fields are omitted, preserving the remote's distinction between
    /// "not supplied" and "explicitly cleared"; the category id is
    /// rebuilt into a full applookup URL.
    pub fn to_fields(
        &self,
        existing_enrollment: Option<u32>,
        base_url: &str,
        categories_app_id: &str,
    ) -> CourseFields {
        CourseFields {
            title: Some(self.title.clone()),
            description: none_if_empty(&self.description),
            category: Some(record_url(base_url, categories_app_id, &self.category_id)),
            instructor: Some(self.instructor.clone()),
            max_participants: if self.max_participants == 0 {
                None
            } else {
                Some(self.max_participants)
            },
            current_participants: Some(existing_enrollment.unwrap_or(0)),
            start_date: none_if_empty(&self.start_date),
            end_date: none_if_empty(&self.end_date),
            status: Some(self.status.as_str().to_string()),
        }
    }
}

fn none_if_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Renders a `YYYY-MM-DD` or ISO date string as `dd.mm.yyyy`; empty
/// input renders as a dash.
pub fn format_date(value: &str) -> String {
    if value.is_empty() {
        return "-".to_string();
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.format("%d.%m.%Y").to_string();
    }
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(value) {
        return datetime.format("%d.%m.%Y").to_string();
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: CourseFields) -> RawRecord<CourseFields> {
        RawRecord {
            record_id: "698dcc627dbdb3ef3a55e3b6".to_string(),
            fields,
            createdat: "2026-01-01T00:00:00Z".to_string(),
            updatedat: None,
        }
    }

    fn draft() -> CourseDraft {
        CourseDraft {
            title: "Intro".to_string(),
            description: String::new(),
            category_id: "698dcc61d32d3b471f096328".to_string(),
            instructor: "A".to_string(),
            max_participants: 0,
            start_date: String::new(),
            end_date: String::new(),
            status: CourseStatus::Upcoming,
        }
    }

    #[test]
    fn from_record_applies_default_table() {
        let course = Course::from_record(&record(CourseFields::default()));

        assert_eq!(course.title, "");
        assert_eq!(course.description, "");
        assert_eq!(course.category_id, "");
        assert_eq!(course.max_participants, 20);
        assert_eq!(course.current_participants, 0);
        assert_eq!(course.start_date, "");
        assert_eq!(course.status, CourseStatus::Upcoming);
    }

    #[test]
    fn defaults_apply_only_when_absent_not_when_zero() {
        let course = Course::from_record(&record(CourseFields {
            max_participants: Some(0),
            current_participants: Some(0),
            ..Default::default()
        }));

        assert_eq!(course.max_participants, 0);
        assert_eq!(course.current_participants, 0);
    }

    #[test]
    fn from_record_extracts_category_id_from_url() {
        let course = Course::from_record(&record(CourseFields {
            category: Some(
                "https://my.living-apps.de/rest/apps/698dcc61d32d3b471f096328/records/a1b2c3d4e5f6a1b2c3d4e5f6"
                    .to_string(),
            ),
            ..Default::default()
        }));
        assert_eq!(course.category_id, "a1b2c3d4e5f6a1b2c3d4e5f6");
    }

    #[test]
    fn malformed_category_url_yields_empty_id() {
        let course = Course::from_record(&record(CourseFields {
            category: Some("not-a-record-url".to_string()),
            ..Default::default()
        }));
        assert_eq!(course.category_id, "");
    }

    #[test]
    fn unknown_status_string_falls_back_to_upcoming() {
        let course = Course::from_record(&record(CourseFields {
            status: Some("cancelled".to_string()),
            ..Default::default()
        }));
        assert_eq!(course.status, CourseStatus::Upcoming);
    }

    #[test]
    fn round_trip_preserves_title_instructor_and_status() {
        let mut d = draft();
        d.description = "Basics".to_string();
        d.status = CourseStatus::Active;
        d.max_participants = 12;

        let fields = d.to_fields(Some(3), "https://my.living-apps.de/rest", "698dcc61d32d3b471f096328");
        let course = Course::from_record(&record(fields));

        assert_eq!(course.title, "Intro");
        assert_eq!(course.instructor, "A");
        assert_eq!(course.status, CourseStatus::Active);
        assert_eq!(course.category_id, "698dcc61d32d3b471f096328");
        assert_eq!(course.current_participants, 3);
        assert_eq!(course.max_participants, 12);
    }

    #[test]
    fn to_fields_omits_empty_optionals_and_zeroes_enrollment_on_create() {
        let fields = draft().to_fields(None, "https://my.living-apps.de/rest", "c1c1c1c1c1c1c1c1c1c1c1c1");

        assert_eq!(fields.description, None);
        assert_eq!(fields.max_participants, None);
        assert_eq!(fields.start_date, None);
        assert_eq!(fields.end_date, None);
        assert_eq!(fields.current_participants, Some(0));
        assert!(fields.category.as_deref().unwrap().ends_with("c1c1c1c1c1c1c1c1c1c1c1c1"));
    }

    #[test]
    fn to_fields_carries_enrollment_forward_on_update() {
        let fields = draft().to_fields(Some(17), "https://my.living-apps.de/rest", "c1c1c1c1c1c1c1c1c1c1c1c1");
        assert_eq!(fields.current_participants, Some(17));
    }

    #[test]
    fn validate_rejects_missing_required_fields() {
        let mut d = draft();
        d.title = String::new();
        assert!(matches!(d.validate(), Err(AppError::Validation(_))));

        let mut d = draft();
        d.instructor = String::new();
        assert!(matches!(d.validate(), Err(AppError::Validation(_))));

        let mut d = draft();
        d.category_id = String::new();
        assert!(matches!(d.validate(), Err(AppError::Validation(_))));

        assert!(draft().validate().is_ok());
    }

    #[test]
    fn capacity_coercion_handles_strings() {
        let d: CourseDraft = serde_json::from_str(
            r#"{"title":"T","category_id":"c","instructor":"I","max_participants":"15"}"#,
        )
        .unwrap();
        assert_eq!(d.max_participants, 15);

        let d: CourseDraft = serde_json::from_str(
            r#"{"title":"T","category_id":"c","instructor":"I","max_participants":"lots"}"#,
        )
        .unwrap();
        assert_eq!(d.max_participants, 0);

        let d: CourseDraft =
            serde_json::from_str(r#"{"title":"T","category_id":"c","instructor":"I"}"#).unwrap();
        assert_eq!(d.max_participants, 20);
    }

    #[test]
    fn fill_percent_clamps_at_100() {
        let mut course = Course::from_record(&record(CourseFields::default()));
        course.max_participants = 10;
        course.current_participants = 25;
        assert_eq!(course.fill_percent(), 100);
        assert!(course.is_full());

        course.current_participants = 5;
        assert_eq!(course.fill_percent(), 50);
        assert!(!course.is_full());
    }

    #[test]
    fn format_date_renders_german_style() {
        assert_eq!(format_date(""), "-");
        assert_eq!(format_date("2026-03-01"), "01.03.2026");
        assert_eq!(format_date("2026-03-01T10:30:00+01:00"), "01.03.2026");
    }
}
