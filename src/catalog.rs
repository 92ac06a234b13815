//! Per-resource declarations: table columns, filters, form fields and the
//! mapping of backend validation errors onto form fields

use serde_json::Value;

use crate::form::{ErrorMap, FieldDescriptor, Form, Rule, SelectOption};
use crate::models::Resource;
use crate::table::{cell::lookup, Cell, Column, FilterDescriptor};

/// Everything a screen needs to administer one resource
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    pub resource: Resource,
    pub columns: Vec<Column>,
    pub filters: Vec<FilterDescriptor>,
    pub fields: Vec<FieldDescriptor>,
    pub error_map: ErrorMap,
}

impl ResourceSpec {
    /// Empty form for this resource
    pub fn form(&self) -> Form {
        Form::new(self.fields.clone()).with_error_map(self.error_map.clone())
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }
}

fn role_options() -> Vec<SelectOption> {
    vec![
        SelectOption::new("ADMIN", "Admin"),
        SelectOption::new("TEACHER", "Teacher"),
        SelectOption::new("STUDENT", "Student"),
    ]
}

/// Fields of a user account; `prefix` is where the account sits in both the
/// record and the request payload, e.g. `user.` for teachers and students
fn user_fields(prefix: &str) -> Vec<FieldDescriptor> {
    let path = |p: &str| format!("{}{}", prefix, p);
    let at = |field: FieldDescriptor, p: &str| field.with_source(&path(p)).with_payload_path(&path(p));
    vec![
        at(FieldDescriptor::email("email", "Email").required(), "email"),
        at(
            FieldDescriptor::text("firstName", "First Name").required(),
            "userDetail.firstName",
        ),
        at(FieldDescriptor::text("lastName", "Last Name"), "userDetail.lastName"),
        at(
            FieldDescriptor::text("phoneNumber", "Phone Number"),
            "userDetail.phoneNumber",
        ),
        at(FieldDescriptor::date("birthDate", "Birth Date"), "userDetail.birthDate"),
        at(FieldDescriptor::multiline("address", "Address"), "userDetail.address"),
        FieldDescriptor::password("password", "Password").with_payload_path(&path("password")),
        FieldDescriptor::password("confirmPassword", "Confirm Password")
            .with_rule(Rule::matching("password", "Password"))
            .client_only(),
    ]
}

fn person_columns(prefix: &str) -> Vec<Column> {
    let path = |p: &str| format!("{}{}", prefix, p);
    vec![
        Column::new("id", "ID", 6),
        Column::new(&path("userDetail.firstName"), "First Name", 16),
        Column::new(&path("userDetail.lastName"), "Last Name", 16),
        Column::new(&path("email"), "Email", 28),
        Column::new(&path("userDetail.phoneNumber"), "Phone", 14),
        Column::new(&path("isDeactivated"), "Deactivated", 11),
    ]
}

fn person_filters(prefix: &str) -> Vec<FilterDescriptor> {
    let path = |p: &str| format!("{}{}", prefix, p);
    vec![
        FilterDescriptor::text(&path("userDetail.firstName"), "First Name"),
        FilterDescriptor::text(&path("email"), "Email"),
        FilterDescriptor::select(&path("isDeactivated"), "Deactivated"),
    ]
}

/// Declarations of `resource`
pub fn spec(resource: Resource) -> ResourceSpec {
    let (columns, filters, fields, error_map) = match resource {
        Resource::User => {
            let mut columns = person_columns("");
            columns.insert(4, Column::new("userType", "Role", 8));
            let mut filters = person_filters("");
            filters.push(FilterDescriptor::select_from("userType", "Role", role_options()));
            let mut fields = user_fields("");
            fields.insert(1, FieldDescriptor::select("userType", "Role", role_options()).required());
            fields.push(FieldDescriptor::switch("isDeactivated", "Deactivated"));
            let error_map = ErrorMap::from_payload_paths(&fields);
            (columns, filters, fields, error_map)
        }
        Resource::Teacher | Resource::Student => {
            let fields = user_fields("user.");
            let error_map = ErrorMap::from_payload_paths(&fields);
            (person_columns("user."), person_filters("user."), fields, error_map)
        }
        Resource::Instrument | Resource::Grade => (
            vec![Column::new("id", "ID", 6), Column::new("name", "Name", 30)],
            vec![FilterDescriptor::text("name", "Name")],
            vec![FieldDescriptor::text("name", "Name").required()],
            ErrorMap::new(),
        ),
        Resource::Course => (
            vec![
                Column::new("id", "ID", 6),
                Column::new("instrument.name", "Instrument", 16),
                Column::new("grade.name", "Grade", 12),
                Column::new("defaultFee", "Default Fee", 12),
                Column::new("defaultDurationMinute", "Duration (min)", 14),
            ],
            vec![
                FilterDescriptor::select("instrument.name", "Instrument"),
                FilterDescriptor::select("grade.name", "Grade"),
                FilterDescriptor::arithmetic("defaultFee", "Default Fee"),
            ],
            vec![
                FieldDescriptor::lookup("instrumentId", "Instrument", Resource::Instrument)
                    .required()
                    .with_source("instrument"),
                FieldDescriptor::lookup("gradeId", "Grade", Resource::Grade)
                    .required()
                    .with_source("grade"),
                FieldDescriptor::number("defaultFee", "Default Fee")
                    .required()
                    .with_rule(Rule::NoBelowZero),
                FieldDescriptor::number("defaultDurationMinute", "Duration (minutes)")
                    .required()
                    .with_rule(Rule::PositiveNumber),
            ],
            ErrorMap::new()
                .map("instrumentId", "instrument")
                .map("gradeId", "grade"),
        ),
        Resource::Class => (
            vec![
                Column::new("id", "ID", 6),
                Column::new("course.instrument.name", "Instrument", 14),
                Column::new("course.grade.name", "Grade", 10),
                Column::new("teacher.user.userDetail.firstName", "Teacher", 16),
                Column::new("students.user.userDetail.firstName", "Students", 28),
                Column::new("transportFee", "Transport Fee", 13),
                Column::new("isDeactivated", "Deactivated", 11),
            ],
            vec![
                FilterDescriptor::select("course.instrument.name", "Instrument"),
                FilterDescriptor::select("teacher.user.userDetail.firstName", "Teacher"),
                FilterDescriptor::text("students.user.userDetail.firstName", "Student"),
                FilterDescriptor::arithmetic("transportFee", "Transport Fee"),
                FilterDescriptor::select("isDeactivated", "Deactivated"),
            ],
            vec![
                FieldDescriptor::lookup("courseId", "Course", Resource::Course)
                    .required()
                    .with_source("course"),
                FieldDescriptor::lookup("teacherId", "Teacher", Resource::Teacher)
                    .with_source("teacher"),
                FieldDescriptor::multi_lookup("studentIds", "Students", Resource::Student)
                    .with_rule(Rule::NotEmptyArray)
                    .with_source("students"),
                FieldDescriptor::number("transportFee", "Transport Fee")
                    .with_rule(Rule::NoBelowZero),
                FieldDescriptor::switch("isDeactivated", "Deactivated"),
            ],
            ErrorMap::new()
                .map("courseId", "course")
                .map("teacherId", "teacher")
                .map("studentIds", "students"),
        ),
        Resource::StudentLearningToken => (
            vec![
                Column::new("id", "ID", 6),
                Column::new("student.user.userDetail.firstName", "Student", 16),
                Column::new("course.instrument.name", "Instrument", 14),
                Column::new("course.grade.name", "Grade", 10),
                Column::new("quota", "Quota", 8),
                Column::new("courseFeeValue", "Course Fee", 12),
                Column::new("transportFeeValue", "Transport Fee", 13),
            ],
            vec![
                FilterDescriptor::text("student.user.userDetail.firstName", "Student"),
                FilterDescriptor::select("course.instrument.name", "Instrument"),
                FilterDescriptor::arithmetic("quota", "Quota"),
            ],
            vec![
                FieldDescriptor::lookup("studentId", "Student", Resource::Student)
                    .required()
                    .with_source("student"),
                FieldDescriptor::lookup("courseId", "Course", Resource::Course)
                    .required()
                    .with_source("course"),
                FieldDescriptor::decimal("quota", "Quota").required(),
                FieldDescriptor::number("courseFeeValue", "Course Fee")
                    .required()
                    .with_rule(Rule::NoBelowZero),
                FieldDescriptor::number("transportFeeValue", "Transport Fee")
                    .required()
                    .with_rule(Rule::NoBelowZero),
            ],
            ErrorMap::new()
                .map("studentId", "student")
                .map("courseId", "course"),
        ),
        Resource::Attendance => (
            vec![
                Column::new("id", "ID", 6),
                Column::new("date", "Date", 19),
                Column::new("student.user.userDetail.firstName", "Student", 14),
                Column::new("teacher.user.userDetail.firstName", "Teacher", 14),
                Column::new("class.course.instrument.name", "Instrument", 12),
                Column::new("duration", "Duration", 8),
                Column::new("usedStudentTokenQuota", "Quota Used", 10),
                Column::new("isPaid", "Paid", 5),
            ],
            vec![
                FilterDescriptor::text("student.user.userDetail.firstName", "Student"),
                FilterDescriptor::select("teacher.user.userDetail.firstName", "Teacher"),
                FilterDescriptor::text("date", "Date"),
                FilterDescriptor::arithmetic("duration", "Duration"),
                FilterDescriptor::select("isPaid", "Paid"),
            ],
            vec![
                FieldDescriptor::lookup("classId", "Class", Resource::Class)
                    .required()
                    .with_source("class"),
                FieldDescriptor::lookup("teacherId", "Teacher", Resource::Teacher)
                    .required()
                    .with_source("teacher"),
                FieldDescriptor::lookup("studentId", "Student", Resource::Student)
                    .required()
                    .with_source("student"),
                FieldDescriptor::date_time("date", "Date").required(),
                FieldDescriptor::decimal("usedStudentTokenQuota", "Quota Used")
                    .required()
                    .with_rule(Rule::PositiveNumber),
                FieldDescriptor::number("duration", "Duration (minutes)")
                    .required()
                    .with_rule(Rule::PositiveNumber),
                FieldDescriptor::multiline("note", "Note"),
                FieldDescriptor::switch("isPaid", "Paid"),
            ],
            ErrorMap::new()
                .map("classId", "class")
                .map("teacherId", "teacher")
                .map("studentId", "student"),
        ),
        Resource::Presence => (
            vec![
                Column::new("id", "ID", 6),
                Column::new("date", "Date", 19),
                Column::new("teacher.user.userDetail.firstName", "Teacher", 16),
                Column::new("class.course.instrument.name", "Instrument", 14),
                Column::new("note", "Note", 30),
            ],
            vec![
                FilterDescriptor::select("teacher.user.userDetail.firstName", "Teacher"),
                FilterDescriptor::text("date", "Date"),
            ],
            vec![
                FieldDescriptor::lookup("classId", "Class", Resource::Class)
                    .required()
                    .with_source("class"),
                FieldDescriptor::lookup("teacherId", "Teacher", Resource::Teacher)
                    .required()
                    .with_source("teacher"),
                FieldDescriptor::date_time("date", "Date").required(),
                FieldDescriptor::multiline("note", "Note"),
            ],
            ErrorMap::new()
                .map("classId", "class")
                .map("teacherId", "teacher"),
        ),
        Resource::EnrollmentPayment => (
            vec![
                Column::new("id", "ID", 6),
                Column::new("paymentDate", "Payment Date", 19),
                Column::new("student.user.userDetail.firstName", "Student", 16),
                Column::new("class.course.instrument.name", "Instrument", 12),
                Column::new("balanceTopUp", "Top Up", 8),
                Column::new("courseFeeValue", "Course Fee", 11),
                Column::new("transportFeeValue", "Transport", 10),
                Column::new("penaltyFeeValue", "Penalty", 9),
            ],
            vec![
                FilterDescriptor::text("student.user.userDetail.firstName", "Student"),
                FilterDescriptor::text("paymentDate", "Payment Date"),
                FilterDescriptor::arithmetic("courseFeeValue", "Course Fee"),
                FilterDescriptor::arithmetic("penaltyFeeValue", "Penalty"),
            ],
            vec![
                FieldDescriptor::lookup("studentId", "Student", Resource::Student)
                    .required()
                    .with_source("student"),
                FieldDescriptor::lookup("classId", "Class", Resource::Class)
                    .required()
                    .with_source("class"),
                FieldDescriptor::date_time("paymentDate", "Payment Date").required(),
                FieldDescriptor::decimal("balanceTopUp", "Top Up (quota)")
                    .required()
                    .with_rule(Rule::PositiveNumber),
                FieldDescriptor::number("courseFeeValue", "Course Fee")
                    .required()
                    .with_rule(Rule::NoBelowZero),
                FieldDescriptor::number("transportFeeValue", "Transport Fee")
                    .required()
                    .with_rule(Rule::NoBelowZero),
                FieldDescriptor::number("penaltyFeeValue", "Penalty Fee")
                    .with_rule(Rule::NoBelowZero),
            ],
            ErrorMap::new()
                .map("studentId", "student")
                .map("classId", "class"),
        ),
        Resource::TeacherSpecialFee => (
            vec![
                Column::new("id", "ID", 6),
                Column::new("teacher.user.userDetail.firstName", "Teacher", 16),
                Column::new("course.instrument.name", "Instrument", 14),
                Column::new("course.grade.name", "Grade", 10),
                Column::new("fee", "Fee", 12),
            ],
            vec![
                FilterDescriptor::select("teacher.user.userDetail.firstName", "Teacher"),
                FilterDescriptor::select("course.instrument.name", "Instrument"),
                FilterDescriptor::arithmetic("fee", "Fee"),
            ],
            vec![
                FieldDescriptor::lookup("teacherId", "Teacher", Resource::Teacher)
                    .required()
                    .with_source("teacher"),
                FieldDescriptor::lookup("courseId", "Course", Resource::Course)
                    .required()
                    .with_source("course"),
                FieldDescriptor::number("fee", "Fee")
                    .required()
                    .with_rule(Rule::NoBelowZero),
            ],
            ErrorMap::new()
                .map("teacherId", "teacher")
                .map("courseId", "course"),
        ),
    };

    ResourceSpec {
        resource,
        columns,
        filters,
        fields,
        error_map,
    }
}

fn text_at(row: &Value, path: &str) -> String {
    Cell::List(lookup(row, path).into_iter().map(Cell::from_value).collect()).display()
}

fn person_label(row: &Value, prefix: &str) -> String {
    let first = text_at(row, &format!("{}userDetail.firstName", prefix));
    let last = text_at(row, &format!("{}userDetail.lastName", prefix));
    let name = format!("{} {}", first, last).trim().to_string();
    if name.is_empty() {
        text_at(row, &format!("{}email", prefix))
    } else {
        name
    }
}

fn course_label(row: &Value, prefix: &str) -> String {
    let instrument = text_at(row, &format!("{}instrument.name", prefix));
    let grade = text_at(row, &format!("{}grade.name", prefix));
    format!("{} - {}", instrument, grade)
}

/// Human readable label of a row, used for lookup options
pub fn lookup_label(resource: Resource, row: &Value) -> String {
    let id = text_at(row, "id");
    match resource {
        Resource::User => person_label(row, ""),
        Resource::Teacher | Resource::Student => person_label(row, "user."),
        Resource::Instrument | Resource::Grade => text_at(row, "name"),
        Resource::Course => course_label(row, ""),
        Resource::Class => {
            let teacher = person_label(row, "teacher.user.");
            if teacher.is_empty() {
                format!("#{} {}", id, course_label(row, "course."))
            } else {
                format!("#{} {} ({})", id, course_label(row, "course."), teacher)
            }
        }
        Resource::StudentLearningToken => format!(
            "#{} {} / {}",
            id,
            person_label(row, "student.user."),
            course_label(row, "course.")
        ),
        _ => format!("{} #{}", resource.as_str(), id),
    }
}

/// Select options built from the rows of `resource`, keyed by id
pub fn lookup_options(resource: Resource, rows: &[Value]) -> Vec<SelectOption> {
    rows.iter()
        .filter_map(|row| {
            let id = row.get("id")?.clone();
            Some(SelectOption::new(id, lookup_label(resource, row)))
        })
        .collect()
}
