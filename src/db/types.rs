use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum UserRole {
    Student,
    Teacher,
    Admin,
}

impl UserRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Teacher => "TEACHER",
            Self::Admin => "ADMIN",
        }
    }

    /// Case-insensitive parse of a spreadsheet or form value.
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Some(Self::Student),
            "TEACHER" => Some(Self::Teacher),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "semester_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum SemesterType {
    Odd,
    Even,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "submission_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum SubmissionStatus {
    Pending,
    AiGraded,
    TeacherVerified,
    Flagged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!(UserRole::parse(" teacher "), Some(UserRole::Teacher));
        assert_eq!(UserRole::parse("STUDENT"), Some(UserRole::Student));
        assert_eq!(UserRole::parse("dean"), None);
    }

    #[test]
    fn enums_serialize_in_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(SubmissionStatus::TeacherVerified).unwrap(),
            serde_json::json!("TEACHER_VERIFIED")
        );
        assert_eq!(serde_json::to_value(SemesterType::Odd).unwrap(), serde_json::json!("ODD"));
        assert_eq!(
            serde_json::from_value::<UserRole>(serde_json::json!("ADMIN")).unwrap(),
            UserRole::Admin
        );
    }
}
