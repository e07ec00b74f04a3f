use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::living_apps::dto::{CategoryFields, RawRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub record_id: String,
    pub name: String,
}

impl Category {
    pub fn from_record(record: &RawRecord<CategoryFields>) -> Self {
        Self {
            record_id: record.record_id.clone(),
            name: record.fields.name.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
}

impl CategoryDraft {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }
        Ok(())
    }

    pub fn to_fields(&self) -> CategoryFields {
        CategoryFields {
            name: Some(self.name.clone()),
        }
    }
}
