use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Accepts an identifier sent either as a JSON string or a JSON number.
///
/// Identifiers are opaque to the client, so both are kept as strings.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}

fn optional_opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(id)),
        Some(Value::Number(id)) => Ok(Some(id.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}

/// One attendance entry for a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub attendance_date: NaiveDate,
    pub present: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Announcement priority shown on the teacher pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Importance::Low => "low",
            Importance::Normal => "normal",
            Importance::High => "high",
            Importance::Urgent => "urgent",
        };
        f.write_str(name)
    }
}

impl FromStr for Importance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Importance::Low),
            "normal" => Ok(Importance::Normal),
            "high" => Ok(Importance::High),
            "urgent" => Ok(Importance::Urgent),
            other => Err(format!("unknown importance: {}", other)),
        }
    }
}

/// Announcement as returned by the back-end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_opaque_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub class_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Announcement {
    /// Case-insensitive search over title and content. An empty term matches everything.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.title.to_lowercase().contains(&term)
            || self.content.to_lowercase().contains(&term)
    }
}

/// Body of a create-announcement call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub section_name: String,
    pub course_id: i64,
}

impl NewAnnouncement {
    /// Names of required fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.content.trim().is_empty() {
            missing.push("content");
        }
        if self.section_name.trim().is_empty() {
            missing.push("sectionName");
        }
        missing
    }
}

/// Body of an update-announcement call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementUpdate {
    pub title: String,
    pub content: String,
    pub class_id: String,
    pub importance: Importance,
}

impl AnnouncementUpdate {
    /// Pre-fills an update from the announcement being edited
    pub fn from_announcement(announcement: &Announcement) -> Self {
        Self {
            title: announcement.title.clone(),
            content: announcement.content.clone(),
            class_id: announcement.class_id.clone().unwrap_or_default(),
            importance: announcement.importance.unwrap_or_default(),
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.content.trim().is_empty() {
            missing.push("content");
        }
        if self.class_id.trim().is_empty() {
            missing.push("classId");
        }
        missing
    }
}

/// A class taught by the logged-in teacher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherClass {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub name: String,
}

/// Which announcements to list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnnouncementFilter {
    #[default]
    All,
    Class(String),
}

impl FromStr for AnnouncementFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(AnnouncementFilter::All)
        } else {
            Ok(AnnouncementFilter::Class(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn announcement(title: &str, content: &str) -> Announcement {
        Announcement {
            id: 1,
            title: title.to_string(),
            content: content.to_string(),
            course_id: None,
            section_name: None,
            class_id: None,
            importance: None,
            created_at: None,
        }
    }

    #[test]
    fn test_attendance_record_from_backend_json() {
        let record: AttendanceRecord = serde_json::from_value(json!({
            "attendanceDate": "2024-01-01",
            "present": true,
            "courseName": "Mathematics",
            "sectionName": "10-A",
            "username": "nimal",
            "unrelated": "ignored"
        }))
        .unwrap();

        assert_eq!(
            record.attendance_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert!(record.present);
        assert_eq!(record.course_name.as_deref(), Some("Mathematics"));
        assert_eq!(record.section_name.as_deref(), Some("10-A"));
        assert_eq!(record.username.as_deref(), Some("nimal"));
    }

    #[test]
    fn test_attendance_record_rejects_bad_date() {
        let result = serde_json::from_value::<AttendanceRecord>(json!({
            "attendanceDate": "01/01/2024",
            "present": true
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_announcement_class_id_accepts_number_or_string() {
        let numeric: Announcement = serde_json::from_value(json!({
            "id": 4, "title": "t", "content": "c", "classId": 10, "importance": "high"
        }))
        .unwrap();
        assert_eq!(numeric.class_id.as_deref(), Some("10"));
        assert_eq!(numeric.importance, Some(Importance::High));

        let text: Announcement = serde_json::from_value(json!({
            "id": 5, "title": "t", "content": "c", "classId": "10-A"
        }))
        .unwrap();
        assert_eq!(text.class_id.as_deref(), Some("10-A"));

        let null: Announcement = serde_json::from_value(json!({
            "id": 6, "title": "t", "content": "c", "classId": null
        }))
        .unwrap();
        assert_eq!(null.class_id, None);
    }

    #[test]
    fn test_announcement_search() {
        let a = announcement("Sports Day", "Bring your water bottle");
        assert!(a.matches("sports"));
        assert!(a.matches("WATER"));
        assert!(a.matches(""));
        assert!(!a.matches("exam"));
    }

    #[test]
    fn test_new_announcement_body_shape() {
        let body = NewAnnouncement {
            title: "Exam".to_string(),
            content: "Room 4".to_string(),
            section_name: "A".to_string(),
            course_id: 9,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"title": "Exam", "content": "Room 4", "sectionName": "A", "courseId": 9})
        );
        assert!(body.missing_fields().is_empty());
    }

    #[test]
    fn test_missing_fields() {
        let body = NewAnnouncement {
            title: " ".to_string(),
            content: "x".to_string(),
            section_name: String::new(),
            course_id: 1,
        };
        assert_eq!(body.missing_fields(), vec!["title", "sectionName"]);

        let update = AnnouncementUpdate::from_announcement(&announcement("t", "c"));
        assert_eq!(update.importance, Importance::Normal);
        assert_eq!(update.missing_fields(), vec!["classId"]);
    }

    #[test]
    fn test_teacher_class_numeric_id() {
        let classes: Vec<TeacherClass> =
            serde_json::from_value(json!([{"id": 3, "name": "Grade 10"}, {"id": "B7", "name": "Grade 11"}]))
                .unwrap();
        assert_eq!(classes[0].id, "3");
        assert_eq!(classes[1].id, "B7");
    }

    #[test]
    fn test_filter_from_str() {
        assert_eq!("all".parse::<AnnouncementFilter>().unwrap(), AnnouncementFilter::All);
        assert_eq!("ALL".parse::<AnnouncementFilter>().unwrap(), AnnouncementFilter::All);
        assert_eq!(
            "10-A".parse::<AnnouncementFilter>().unwrap(),
            AnnouncementFilter::Class("10-A".to_string())
        );
    }

    #[test]
    fn test_importance_from_str() {
        assert_eq!("Urgent".parse::<Importance>().unwrap(), Importance::Urgent);
        assert!("meh".parse::<Importance>().is_err());
    }
}
