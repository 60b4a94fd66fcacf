use std::collections::HashMap;

use sea_orm::ConnectionTrait;
use serde::Serialize;

use super::performance::{SubjectPerformance, student_subjects};
use crate::entity::{class, faculty, student};
use crate::error::AppError;
use crate::identity::Role;
use crate::models::assignment::{AssignmentResponse, SubmissionResponse};
use crate::models::class::ClassResponse;
use crate::models::student::StudentResponse;
use crate::models::subject::SubjectResponse;
use crate::repository::assignments::{self, AssignmentFilter};
use crate::repository::reconciliation::ReconciliationService;
use crate::repository::{classes, faculty as faculty_repo, students, subjects, users};

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentAssignment {
    pub assignment: AssignmentResponse,
    pub subject_name: String,
    /// `null` when the student joined after the assignment was published.
    pub submission: Option<SubmissionResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentDashboard {
    pub profile: StudentResponse,
    pub class: ClassResponse,
    pub subjects: Vec<SubjectPerformance>,
    pub assignments: Vec<StudentAssignment>,
}

pub async fn student_dashboard<C: ConnectionTrait>(
    conn: &C,
    student: student::Model,
) -> Result<StudentDashboard, AppError> {
    let class = classes::find(conn, student.class_id).await?;
    let class_subjects = subjects::list(conn, Some(class.id), None).await?;
    let performance = student_subjects(conn, student.id, &class_subjects).await?;

    let names: HashMap<i32, &str> = class_subjects
        .iter()
        .map(|s| (s.id, s.name.as_str()))
        .collect();
    let mut own: HashMap<i32, SubmissionResponse> =
        assignments::submissions_of_student(conn, student.id)
            .await?
            .into_iter()
            .map(|s| (s.assignment_id, s.into()))
            .collect();
    let assignments = assignments::list(
        conn,
        AssignmentFilter {
            class_id: Some(class.id),
            ..Default::default()
        },
    )
    .await?
    .into_iter()
    .map(|a| StudentAssignment {
        subject_name: names.get(&a.subject_id).copied().unwrap_or_default().to_string(),
        submission: own.remove(&a.id),
        assignment: a.into(),
    })
    .collect();

    Ok(StudentDashboard {
        profile: student.into(),
        class: class.into(),
        subjects: performance,
        assignments,
    })
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FacultySubject {
    pub subject: SubjectResponse,
    pub class: ClassResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FacultySubjects {
    pub subjects: Vec<FacultySubject>,
    /// Set for batch coordinators.
    pub coordinated_class: Option<ClassResponse>,
}

pub async fn faculty_subjects<C: ConnectionTrait>(
    conn: &C,
    faculty: &faculty::Model,
) -> Result<FacultySubjects, AppError> {
    let assigned = subjects::list(conn, None, Some(faculty.id)).await?;
    let mut class_cache: HashMap<i32, class::Model> = HashMap::new();
    let mut rows = Vec::with_capacity(assigned.len());
    for subject in assigned {
        let class = match class_cache.get(&subject.class_id) {
            Some(c) => c.clone(),
            None => {
                let c = classes::find(conn, subject.class_id).await?;
                class_cache.insert(subject.class_id, c.clone());
                c
            }
        };
        rows.push(FacultySubject {
            subject: subject.into(),
            class: class.into(),
        });
    }

    Ok(FacultySubjects {
        subjects: rows,
        coordinated_class: classes::coordinated_by(conn, faculty.id)
            .await?
            .map(Into::into),
    })
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RoleCounts {
    pub hod: u64,
    pub faculty: u64,
    pub batch_coordinator: u64,
    pub student: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HodSummary {
    pub users_by_role: RoleCounts,
    pub classes: u64,
    pub subjects: u64,
    pub faculty_active: u64,
    pub faculty_inactive: u64,
    pub students: u64,
    pub unresolved_provisioning_failures: u64,
}

pub async fn hod_summary<C: ConnectionTrait>(conn: &C) -> Result<HodSummary, AppError> {
    Ok(HodSummary {
        users_by_role: RoleCounts {
            hod: users::count_by_role(conn, Role::Hod).await?,
            faculty: users::count_by_role(conn, Role::Faculty).await?,
            batch_coordinator: users::count_by_role(conn, Role::BatchCoordinator).await?,
            student: users::count_by_role(conn, Role::Student).await?,
        },
        classes: classes::count(conn).await?,
        subjects: subjects::count(conn).await?,
        faculty_active: faculty_repo::count_by_status(conn, true).await?,
        faculty_inactive: faculty_repo::count_by_status(conn, false).await?,
        students: students::count(conn).await?,
        unresolved_provisioning_failures: ReconciliationService::new(conn)
            .count_unresolved()
            .await?,
    })
}
