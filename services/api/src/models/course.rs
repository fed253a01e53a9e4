//! Course model and normalization

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use common::error::{ClientError, ClientResult};

use super::payload::{NumberOrString, decode, first_present, lenient_i64};
use super::user::ImageRef;

/// Summary of the user owning a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOwner {
    pub id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub image: Option<ImageRef>,
}

/// Course entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub type_id: Option<i64>,
    pub phone_numbers: Vec<String>,
    /// Phone numbers joined for display
    pub phone_display: String,
    pub address: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub date: Option<String>,
    pub owner: Option<CourseOwner>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCourse {
    id: Option<NumberOrString>,
    type_course_id: Option<NumberOrString>,
    course_type_id: Option<NumberOrString>,
    type_id: Option<NumberOrString>,
    /// JSON-encoded string, native array or bare number
    phone_num: Option<Value>,
    address: Option<String>,
    name: Option<String>,
    title: Option<String>,
    description: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOwner {
    id: Option<NumberOrString>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    image: Option<NumberOrString>,
}

impl Course {
    /// Normalize a backend course object; fields may sit under `attribute`
    pub fn from_value(raw: &Value) -> ClientResult<Self> {
        if !raw.is_object() {
            return Err(ClientError::MalformedResponse(
                "Expected a course object".to_string(),
            ));
        }
        let fields = raw.get("attribute").filter(|attr| attr.is_object()).unwrap_or(raw);

        let course: RawCourse = decode(fields, "course")?;
        let id = course
            .id
            .as_ref()
            .and_then(NumberOrString::as_i64)
            .or_else(|| raw.get("id").and_then(lenient_i64))
            .ok_or_else(|| {
                ClientError::MalformedResponse("Course payload has no id".to_string())
            })?;

        let (phone_numbers, phone_display) = match course.phone_num {
            Some(Value::Array(items)) => {
                let numbers: Vec<String> = items.iter().map(phone_element).collect();
                let display = numbers.join(", ");
                (numbers, display)
            }
            Some(other) => {
                let raw = phone_element(&other);
                (parse_phone_numbers(&raw), format_phone_numbers(&raw))
            }
            None => (Vec::new(), String::new()),
        };

        let owner = match first_present(fields, &["user", "owner"]) {
            Some(value) => Some(CourseOwner::from_value(value)?),
            None => None,
        };

        Ok(Course {
            id,
            type_id: [course.type_course_id, course.course_type_id, course.type_id]
                .iter()
                .flatten()
                .find_map(NumberOrString::as_i64),
            phone_numbers,
            phone_display,
            address: course.address,
            name: course.name.or(course.title).unwrap_or_default(),
            description: course.description,
            date: course.date,
            owner,
        })
    }
}

impl CourseOwner {
    fn from_value(raw: &Value) -> ClientResult<Self> {
        // Some endpoints only send the owner's id
        if !raw.is_object() {
            return Ok(CourseOwner {
                id: lenient_i64(raw),
                first_name: None,
                last_name: None,
                email: None,
                image: None,
            });
        }
        let fields = raw.get("attribute").filter(|attr| attr.is_object()).unwrap_or(raw);
        let owner: RawOwner = decode(fields, "course owner")?;
        let outer_id = raw.get("id").and_then(lenient_i64);
        Ok(CourseOwner {
            id: outer_id.or_else(|| owner.id.as_ref().and_then(NumberOrString::as_i64)),
            first_name: owner.first_name,
            last_name: owner.last_name,
            email: owner.email,
            image: owner.image.map(ImageRef::from),
        })
    }
}

/// Decode a JSON-encoded phone list into its elements
///
/// Anything that is not a JSON array comes back as a single entry holding
/// the raw string; an empty string yields no entries.
pub fn parse_phone_numbers(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    match decode_phone_array(raw) {
        Some(items) => items,
        None => vec![raw.to_string()],
    }
}

/// Display form of a phone field: JSON arrays are joined with `", "`,
/// anything else passes through unchanged
pub fn format_phone_numbers(raw: &str) -> String {
    match decode_phone_array(raw) {
        Some(items) => items.join(", "),
        None => raw.to_string(),
    }
}

fn decode_phone_array(raw: &str) -> Option<Vec<String>> {
    if raw.is_empty() || !raw.starts_with('[') {
        return None;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Some(items.iter().map(phone_element).collect()),
        Ok(_) => None,
        Err(e) => {
            debug!("Phone field is not a JSON array, keeping raw value: {}", e);
            None
        }
    }
}

fn phone_element(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn encode_phone_numbers<S: Serializer>(numbers: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    let encoded = serde_json::to_string(numbers).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&encoded)
}

/// New course creation payload
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewCourse {
    pub name: String,
    #[serde(rename = "type_course_id", skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,
    /// Sent the way the backend stores it: a JSON-encoded array
    #[serde(rename = "phone_num", serialize_with = "encode_phone_numbers")]
    pub phone_numbers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Course update payload
#[derive(Debug, Clone, Default, Serialize)]
pub struct CourseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type_course_id", skip_serializing_if = "Option::is_none")]
    pub type_id: Option<i64>,
    #[serde(
        rename = "phone_num",
        skip_serializing_if = "Option::is_none",
        serialize_with = "encode_optional_phone_numbers"
    )]
    pub phone_numbers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

fn encode_optional_phone_numbers<S: Serializer>(
    numbers: &Option<Vec<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match numbers {
        Some(numbers) => encode_phone_numbers(numbers, serializer),
        None => serializer.serialize_none(),
    }
}

/// Query parameters for course listing
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub search: Option<String>,
    pub course_type_id: Option<i64>,
}

impl CourseQuery {
    /// Query string pairs for the set fields
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            query.push(("per_page", per_page.to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        if let Some(course_type_id) = self.course_type_id {
            query.push(("course_type_id", course_type_id.to_string()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_phone_array_is_joined() {
        assert_eq!(
            format_phone_numbers(r#"["555-1111","555-2222"]"#),
            "555-1111, 555-2222"
        );
        assert_eq!(
            parse_phone_numbers(r#"["555-1111","555-2222"]"#),
            vec!["555-1111".to_string(), "555-2222".to_string()]
        );
    }

    #[test]
    fn test_non_array_phone_passes_through() {
        for raw in [
            "",
            "555-1111",
            "[not json",
            "[\"unterminated",
            " [\"leading space\"]",
            "{\"a\":1}",
        ] {
            assert_eq!(format_phone_numbers(raw), raw, "input: {:?}", raw);
        }
        assert_eq!(parse_phone_numbers(""), Vec::<String>::new());
        assert_eq!(parse_phone_numbers("555-1111"), vec!["555-1111".to_string()]);
    }

    #[test]
    fn test_phone_array_with_non_string_elements() {
        assert_eq!(format_phone_numbers("[5551111, null, \"x\"]"), "5551111, , x");
        assert_eq!(format_phone_numbers("[]"), "");
    }

    #[test]
    fn test_normalize_course() {
        let raw = json!({
            "id": 9,
            "type_course_id": "2",
            "phone_num": "[\"555-1111\",\"555-2222\"]",
            "address": "12 Main St",
            "title": "Guitar basics",
            "user": {
                "id": 4,
                "attribute": {"first_name": "Kofi", "email": "kofi@example.com", "image": "k.png"}
            }
        });

        let course = Course::from_value(&raw).unwrap();
        assert_eq!(course.id, 9);
        assert_eq!(course.type_id, Some(2));
        assert_eq!(course.name, "Guitar basics");
        assert_eq!(course.phone_display, "555-1111, 555-2222");
        assert_eq!(course.phone_numbers.len(), 2);
        assert_eq!(course.description, None);

        let owner = course.owner.unwrap();
        assert_eq!(owner.id, Some(4));
        assert_eq!(owner.first_name.as_deref(), Some("Kofi"));
        assert_eq!(owner.image, Some(ImageRef::Path("k.png".to_string())));
    }

    #[test]
    fn test_course_with_malformed_phone_still_normalizes() {
        let raw = json!({"id": 1, "name": "Piano", "phone_num": "[555"});
        let course = Course::from_value(&raw).unwrap();
        assert_eq!(course.phone_display, "[555");
        assert!(course.owner.is_none());
    }

    #[test]
    fn test_course_with_native_phone_array() {
        let raw = json!({"id": 1, "name": "Piano", "phone_num": ["555-1111", 5552222]});
        let course = Course::from_value(&raw).unwrap();
        assert_eq!(
            course.phone_numbers,
            vec!["555-1111".to_string(), "5552222".to_string()]
        );
        assert_eq!(course.phone_display, "555-1111, 5552222");

        let numeric = Course::from_value(&json!({"id": 2, "phone_num": 5551111})).unwrap();
        assert_eq!(numeric.phone_display, "5551111");
        let empty = Course::from_value(&json!({"id": 3, "phone_num": null})).unwrap();
        assert!(empty.phone_numbers.is_empty());
    }

    #[test]
    fn test_course_without_id_is_malformed() {
        let raw = json!({"name": "Piano"});
        assert!(matches!(
            Course::from_value(&raw),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_new_course_encodes_phone_list() {
        let course = NewCourse {
            name: "Drums".to_string(),
            type_id: Some(3),
            phone_numbers: vec!["555-1".to_string(), "555-2".to_string()],
            ..NewCourse::default()
        };
        assert_eq!(
            serde_json::to_value(&course).unwrap(),
            json!({"name": "Drums", "type_course_id": 3, "phone_num": "[\"555-1\",\"555-2\"]"})
        );
    }
}
