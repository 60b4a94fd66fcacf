use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers::{
    assignments, attendance, auth, classes, dashboard, faculty, marks, me, reconciliation,
    students, subjects, users,
};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(faculty_routes())
        .merge(class_routes())
        .merge(subject_routes())
        .merge(student_routes())
        .merge(assignment_routes())
        .merge(record_routes())
        .merge(self_service_routes())
        .merge(admin_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::login))
        .routes(routes!(auth::logout))
        .routes(routes!(auth::me))
        .routes(routes!(auth::change_password))
        .routes(routes!(auth::check_access))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(users::list_users))
        .routes(routes!(users::update_user_role))
        .routes(routes!(users::delete_user))
}

fn faculty_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(faculty::list_faculty, faculty::add_faculty))
        .routes(routes!(
            faculty::get_faculty,
            faculty::update_faculty,
            faculty::delete_faculty
        ))
        .routes(routes!(faculty::set_faculty_status))
}

fn class_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(classes::list_classes, classes::create_class))
        .routes(routes!(
            classes::get_class,
            classes::update_class,
            classes::delete_class
        ))
        .routes(routes!(classes::class_performance_report))
}

fn subject_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(subjects::list_subjects, subjects::create_subject))
        .routes(routes!(subjects::update_subject, subjects::delete_subject))
}

fn student_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(students::list_students, students::add_student))
        .routes(routes!(
            students::get_student,
            students::update_student,
            students::delete_student
        ))
}

fn assignment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            assignments::list_assignments,
            assignments::create_assignment
        ))
        .routes(routes!(
            assignments::get_assignment,
            assignments::update_assignment,
            assignments::delete_assignment
        ))
        .routes(routes!(assignments::list_submissions))
        .routes(routes!(assignments::grade_submission))
        .routes(routes!(assignments::set_submission_status))
}

fn record_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            attendance::list_attendance,
            attendance::save_attendance
        ))
        .routes(routes!(marks::list_marks, marks::save_marks))
}

fn self_service_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(me::dashboard))
        .routes(routes!(me::update_profile))
        .routes(routes!(me::submit))
        .routes(routes!(me::subjects))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(dashboard::summary))
        .routes(routes!(reconciliation::list_failures))
        .routes(routes!(reconciliation::resolve_failure))
}
