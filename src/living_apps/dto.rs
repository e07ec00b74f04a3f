use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Collection reads return a mapping from record id to body; the body
/// does not repeat its own id.
pub type RecordMap<F> = HashMap<String, RecordBody<F>>;

#[derive(Debug, Clone, Deserialize)]
pub struct RecordBody<F> {
    pub fields: F,
    pub createdat: String,
    #[serde(default)]
    pub updatedat: Option<String>,
}

/// Single-record responses (get/create/update) carry their own id.
#[derive(Debug, Clone, Deserialize)]
pub struct SingleRecord<F> {
    pub id: String,
    pub fields: F,
    pub createdat: String,
    #[serde(default)]
    pub updatedat: Option<String>,
}

/// Normalized record shape with the id injected, regardless of whether
/// it came from a mapping key or a single-record body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord<F> {
    pub record_id: String,
    pub fields: F,
    pub createdat: String,
    pub updatedat: Option<String>,
}

impl<F> RawRecord<F> {
    pub fn from_map_entry(record_id: String, body: RecordBody<F>) -> Self {
        Self {
            record_id,
            fields: body.fields,
            createdat: body.createdat,
            updatedat: body.updatedat,
        }
    }

    pub fn from_single(record: SingleRecord<F>) -> Self {
        Self {
            record_id: record.id,
            fields: record.fields,
            createdat: record.createdat,
            updatedat: record.updatedat,
        }
    }
}

/// Request body for create/update: the sole top-level key is `fields`.
#[derive(Debug, Serialize)]
pub struct FieldsEnvelope<'a, F> {
    pub fields: &'a F,
}

/// Field bag for a category record. Every attribute is optional on the
/// remote side; absent attributes must be omitted from outgoing
/// payloads, never serialized as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Field bag for a course record. `category` is an applookup URL, not a
/// bare id; `status` stays a loose string here and is coerced into the
/// strict enum at the model boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_participants: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl CategoryFields {
    /// Partial-update semantics of the remote store: attributes absent
    /// from the patch are left untouched.
    pub fn apply_patch(&mut self, patch: &CategoryFields) {
        if patch.name.is_some() {
            self.name = patch.name.clone();
        }
    }
}

impl CourseFields {
    pub fn apply_patch(&mut self, patch: &CourseFields) {
        if patch.title.is_some() {
            self.title = patch.title.clone();
        }
        if patch.description.is_some() {
            self.description = patch.description.clone();
        }
        if patch.category.is_some() {
            self.category = patch.category.clone();
        }
        if patch.instructor.is_some() {
            self.instructor = patch.instructor.clone();
        }
        if patch.max_participants.is_some() {
            self.max_participants = patch.max_participants;
        }
        if patch.current_participants.is_some() {
            self.current_participants = patch.current_participants;
        }
        if patch.start_date.is_some() {
            self.start_date = patch.start_date.clone();
        }
        if patch.end_date.is_some() {
            self.end_date = patch.end_date.clone();
        }
        if patch.status.is_some() {
            self.status = patch.status.clone();
        }
    }
}
