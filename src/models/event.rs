use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    /// Display string, shown as entered by the organizer.
    pub date: String,
    pub location: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub date: String,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Event name is required".to_string());
        }
        if self.date.trim().is_empty() {
            return Err("Event date is required".to_string());
        }
        if self.location.trim().is_empty() {
            return Err("Event location is required".to_string());
        }
        Ok(())
    }
}
