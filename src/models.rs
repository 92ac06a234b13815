use chrono::{NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::routes::AdminRoutes;

/// Wire date-times; offsets and fractional seconds are accepted on input
mod wire_date_time {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::form::value::parse_wire_date_time;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_wire_date_time(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid date-time '{}'", raw)))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse_wire_date_time(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid date-time '{}'", raw))),
                None => Ok(None),
            }
        }
    }
}

/// Backend resources administered by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    User,
    Teacher,
    Student,
    Course,
    Class,
    Attendance,
    Presence,
    EnrollmentPayment,
    StudentLearningToken,
    Grade,
    Instrument,
    TeacherSpecialFee,
}

impl Resource {
    pub const ALL: [Resource; 12] = [
        Resource::User,
        Resource::Teacher,
        Resource::Student,
        Resource::Course,
        Resource::Class,
        Resource::Attendance,
        Resource::Presence,
        Resource::EnrollmentPayment,
        Resource::StudentLearningToken,
        Resource::Grade,
        Resource::Instrument,
        Resource::TeacherSpecialFee,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Resource::User => "Users",
            Resource::Teacher => "Teachers",
            Resource::Student => "Students",
            Resource::Course => "Courses",
            Resource::Class => "Classes",
            Resource::Attendance => "Attendances",
            Resource::Presence => "Presences",
            Resource::EnrollmentPayment => "Enrollment Payments",
            Resource::StudentLearningToken => "Student Learning Tokens",
            Resource::Grade => "Grades",
            Resource::Instrument => "Instruments",
            Resource::TeacherSpecialFee => "Teacher Special Fees",
        }
    }

    /// Identifier used on the command line
    pub fn slug(&self) -> &'static str {
        match self {
            Resource::User => "users",
            Resource::Teacher => "teachers",
            Resource::Student => "students",
            Resource::Course => "courses",
            Resource::Class => "classes",
            Resource::Attendance => "attendances",
            Resource::Presence => "presences",
            Resource::EnrollmentPayment => "enrollment-payments",
            Resource::StudentLearningToken => "student-learning-tokens",
            Resource::Grade => "grades",
            Resource::Instrument => "instruments",
            Resource::TeacherSpecialFee => "teacher-special-fees",
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            Resource::User => AdminRoutes::USER,
            Resource::Teacher => AdminRoutes::TEACHER,
            Resource::Student => AdminRoutes::STUDENT,
            Resource::Course => AdminRoutes::COURSE,
            Resource::Class => AdminRoutes::CLASS,
            Resource::Attendance => AdminRoutes::ATTENDANCE,
            Resource::Presence => AdminRoutes::PRESENCE,
            Resource::EnrollmentPayment => AdminRoutes::ENROLLMENT_PAYMENT,
            Resource::StudentLearningToken => AdminRoutes::STUDENT_LEARNING_TOKEN,
            Resource::Grade => AdminRoutes::GRADE,
            Resource::Instrument => AdminRoutes::INSTRUMENT,
            Resource::TeacherSpecialFee => AdminRoutes::TEACHER_SPECIAL_FEE,
        }
    }

    pub fn from_slug(slug: &str) -> Option<Resource> {
        let normalized = slug.to_lowercase().replace('_', "-");
        Resource::ALL
            .into_iter()
            .find(|r| {
                r.slug() == normalized
                    || r.slug().trim_end_matches('s') == normalized
                    || r.slug().strip_suffix("es") == Some(normalized.as_str())
            })
    }
}

/// A row of a backend resource collection
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const RESOURCE: Resource;

    fn id(&self) -> i64;
}

macro_rules! impl_record {
    ($($ty:ty => $resource:expr),* $(,)?) => {
        $(
            impl Record for $ty {
                const RESOURCE: Resource = $resource;

                fn id(&self) -> i64 {
                    self.id
                }
            }
        )*
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Teacher,
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Teacher => "TEACHER",
            UserRole::Student => "STUDENT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub user_type: UserRole,
    #[serde(default)]
    pub user_detail: UserDetail,
    #[serde(default)]
    pub is_deactivated: bool,
    #[serde(default, with = "wire_date_time::option")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        match &self.user_detail.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.user_detail.first_name, last),
            _ => self.user_detail.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: i64,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub instrument: Instrument,
    pub grade: Grade,
    #[serde(default)]
    pub default_fee: i64,
    #[serde(default)]
    pub default_duration_minute: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: i64,
    pub course: Course,
    pub teacher: Option<Teacher>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub transport_fee: i64,
    #[serde(default)]
    pub is_deactivated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentLearningToken {
    pub id: i64,
    pub student: Student,
    pub course: Course,
    #[serde(default)]
    pub quota: f64,
    #[serde(default)]
    pub course_fee_value: i64,
    #[serde(default)]
    pub transport_fee_value: i64,
    #[serde(default, with = "wire_date_time::option")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "wire_date_time::option")]
    pub last_updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: i64,
    #[serde(with = "wire_date_time")]
    pub date: NaiveDateTime,
    pub class: Class,
    pub teacher: Teacher,
    pub student: Student,
    pub token: Option<StudentLearningToken>,
    #[serde(default)]
    pub used_student_token_quota: f64,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub is_paid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presence {
    pub id: i64,
    #[serde(with = "wire_date_time")]
    pub date: NaiveDateTime,
    pub class: Class,
    pub teacher: Teacher,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentPayment {
    pub id: i64,
    #[serde(with = "wire_date_time")]
    pub payment_date: NaiveDateTime,
    pub student: Student,
    pub class: Class,
    #[serde(default)]
    pub balance_top_up: f64,
    #[serde(default)]
    pub course_fee_value: i64,
    #[serde(default)]
    pub transport_fee_value: i64,
    #[serde(default)]
    pub penalty_fee_value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSpecialFee {
    pub id: i64,
    pub teacher: Teacher,
    pub course: Course,
    pub fee: i64,
}

impl_record! {
    User => Resource::User,
    Teacher => Resource::Teacher,
    Student => Resource::Student,
    Course => Resource::Course,
    Class => Resource::Class,
    Attendance => Resource::Attendance,
    Presence => Resource::Presence,
    EnrollmentPayment => Resource::EnrollmentPayment,
    StudentLearningToken => Resource::StudentLearningToken,
    Grade => Resource::Grade,
    Instrument => Resource::Instrument,
    TeacherSpecialFee => Resource::TeacherSpecialFee,
}

/// Result of a successful `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: Option<User>,
}

/// Query parameters of a paginated list request
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub results_per_page: u32,
}

impl ListQuery {
    pub fn new(page: u32, results_per_page: u32) -> Self {
        Self {
            page: page.max(1),
            results_per_page: results_per_page.max(1),
        }
    }

    pub fn as_params(&self) -> [(&'static str, String); 2] {
        [
            ("page", self.page.to_string()),
            ("resultsPerPage", self.results_per_page.to_string()),
        ]
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(1, 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_slug_lookup() {
        assert_eq!(Resource::from_slug("students"), Some(Resource::Student));
        assert_eq!(Resource::from_slug("student"), Some(Resource::Student));
        assert_eq!(Resource::from_slug("Enrollment_Payments"), Some(Resource::EnrollmentPayment));
        assert_eq!(Resource::from_slug("classes"), Some(Resource::Class));
        assert_eq!(Resource::from_slug("class"), Some(Resource::Class));
        assert_eq!(Resource::from_slug("nope"), None);
    }

    #[test]
    fn test_class_deserializes_nested_references() {
        let raw = r#"{
            "id": 7,
            "course": {
                "id": 3,
                "instrument": { "id": 1, "name": "Piano" },
                "grade": { "id": 2, "name": "Grade 2" },
                "defaultFee": 250000,
                "defaultDurationMinute": 30
            },
            "teacher": null,
            "students": [
                { "id": 11, "user": { "id": 21, "email": "ana@example.com", "userType": "STUDENT",
                  "userDetail": { "firstName": "Ana" } } }
            ],
            "transportFee": 0
        }"#;

        let class: Class = serde_json::from_str(raw).unwrap();
        assert_eq!(class.id(), 7);
        assert_eq!(class.course.instrument.name, "Piano");
        assert!(class.teacher.is_none());
        assert_eq!(class.students[0].user.full_name(), "Ana");
        assert!(!class.is_deactivated);
    }

    #[test]
    fn test_payment_date_accepts_offset() {
        let raw = r#"{
            "id": 5,
            "paymentDate": "2024-02-01T10:00:00.000+07:00",
            "student": { "id": 1, "user": { "id": 2, "email": "s@x.io", "userType": "STUDENT" } },
            "class": { "id": 3, "course": { "id": 4, "instrument": { "id": 1, "name": "Piano" },
                       "grade": { "id": 1, "name": "1" } } },
            "balanceTopUp": 4
        }"#;

        let payment: EnrollmentPayment = serde_json::from_str(raw).unwrap();
        assert_eq!(payment.payment_date.to_string(), "2024-02-01 10:00:00");
        assert!(payment.student.user.created_at.is_none());

        let back = serde_json::to_value(&payment).unwrap();
        assert_eq!(back["paymentDate"], "2024-02-01T10:00:00");
    }

    #[test]
    fn test_list_query_clamps_to_first_page() {
        let query = ListQuery::new(0, 0);
        assert_eq!(query.page, 1);
        assert_eq!(query.results_per_page, 1);
        assert_eq!(query.as_params()[1], ("resultsPerPage", "1".to_string()));
    }
}
