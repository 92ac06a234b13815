//! REST route constants

/// Admin CRUD collections; every route accepts GET (list), POST (bulk insert),
/// PUT (bulk update) and DELETE (bulk delete)
pub struct AdminRoutes;

impl AdminRoutes {
    pub const USER: &'static str = "/admin/users";
    pub const TEACHER: &'static str = "/admin/teachers";
    pub const STUDENT: &'static str = "/admin/students";
    pub const COURSE: &'static str = "/admin/courses";
    pub const CLASS: &'static str = "/admin/classes";
    pub const ATTENDANCE: &'static str = "/admin/attendances";
    pub const PRESENCE: &'static str = "/admin/presences";
    pub const ENROLLMENT_PAYMENT: &'static str = "/admin/enrollment-payments";
    pub const STUDENT_LEARNING_TOKEN: &'static str = "/admin/student-learning-tokens";
    pub const GRADE: &'static str = "/admin/grades";
    pub const INSTRUMENT: &'static str = "/admin/instruments";
    pub const TEACHER_SPECIAL_FEE: &'static str = "/admin/teacher-special-fees";
}

/// Session routes
pub struct Routes;

impl Routes {
    pub const LOGIN: &'static str = "/login";
    pub const USER: &'static str = "/user";
}
