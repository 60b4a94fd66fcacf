//! AddFaculty and AddStudent.
//!
//! Both create the auth identity first. Nothing after that step is compensated
//! automatically: a later failure is logged, written to the reconciliation log and
//! surfaced as `PartialProvisioning`.
//!
//! The request deadline covers the checks before the identity is created and the row
//! writes after it. Identity creation itself always runs to completion so its id is
//! never lost, and running out of time afterwards is reported like any other
//! post-identity failure.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait};
use serde_json::json;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::InstitutionConfig;
use crate::entity::{faculty, student};
use crate::error::AppError;
use crate::identity::{IdentityProvider, Role};
use crate::models::faculty::NewFaculty;
use crate::models::student::NewStudent;
use crate::repository::reconciliation::{FailureReport, ReconciliationService};
use crate::repository::{classes, faculty as faculty_repo, students, users};
use crate::state::AppState;
use crate::utils::credentials::{compute_initial_password, compute_student_email};
use crate::utils::deadline;

pub const ADD_FACULTY: &str = "add_faculty";
pub const ADD_STUDENT: &str = "add_student";

/// Failed step recorded when the row writes run past the request deadline.
pub const TIMEOUT_STEP: &str = "timeout";

/// Everything a provisioning workflow touches, passed explicitly.
pub struct ProvisioningContext<'a> {
    pub db: &'a DatabaseConnection,
    pub identities: &'a dyn IdentityProvider,
    pub institution: &'a InstitutionConfig,
    pub limit: Duration,
}

impl<'a> ProvisioningContext<'a> {
    pub fn from_state(state: &'a AppState) -> Self {
        Self {
            db: &state.db,
            identities: state.identities.as_ref(),
            institution: &state.config.institution,
            limit: state.request_timeout(),
        }
    }

    /// Log and record a failure that happened after `identity_id` was created.
    async fn partial_failure(
        &self,
        workflow: &'static str,
        identity_id: Uuid,
        email: &str,
        step: &'static str,
        detail: String,
    ) -> AppError {
        tracing::error!(
            target: "reconciliation",
            workflow,
            %identity_id,
            email,
            step,
            error = %detail,
            "Provisioning failed after the identity was created"
        );

        let report = FailureReport {
            workflow,
            identity_id,
            email,
            failed_step: step,
            error_message: detail.clone(),
        };
        if let Err(e) = ReconciliationService::new(self.db).record(report).await {
            tracing::error!(
                target: "reconciliation",
                %identity_id,
                error = %e,
                "Could not write the reconciliation record"
            );
        }

        AppError::PartialProvisioning {
            identity_id,
            step,
            detail,
        }
    }
}

pub struct ProvisionedFaculty {
    pub faculty: faculty::Model,
    pub initial_password: String,
}

pub struct ProvisionedStudent {
    pub student: student::Model,
    pub email: String,
    pub initial_password: String,
}

type StepResult<T> = Result<T, (&'static str, DbErr)>;

fn at(step: &'static str) -> impl FnOnce(DbErr) -> (&'static str, DbErr) {
    move |e| (step, e)
}

/// Run the post-identity row writes within what is left of `deadline`.
async fn before_deadline<T>(
    deadline: Instant,
    rows: impl Future<Output = StepResult<T>>,
) -> Result<T, (&'static str, String)> {
    let expired = || {
        (
            TIMEOUT_STEP,
            "Request deadline passed before the rows were written".to_string(),
        )
    };
    if Instant::now() >= deadline {
        return Err(expired());
    }
    match tokio::time::timeout_at(deadline, rows).await {
        Ok(written) => written.map_err(|(step, e)| (step, e.to_string())),
        Err(_) => Err(expired()),
    }
}

/// Create the login, `users` row (role faculty) and `faculty` row of a new member.
pub async fn add_faculty(
    ctx: &ProvisioningContext<'_>,
    input: NewFaculty,
) -> Result<ProvisionedFaculty, AppError> {
    let cutoff = Instant::now() + ctx.limit;
    deadline::until(cutoff, async {
        if users::email_exists(ctx.db, &input.email).await?
            || faculty_repo::email_exists(ctx.db, &input.email).await?
        {
            return Err(AppError::Duplicate(format!(
                "An account with email {} already exists",
                input.email
            )));
        }
        Ok::<_, AppError>(())
    })
    .await?;

    let initial_password = ctx.institution.faculty_initial_password.clone();
    let identity_id = ctx
        .identities
        .create_identity(
            &input.email,
            &initial_password,
            json!({ "full_name": input.name, "role": Role::Faculty }),
        )
        .await?;

    match before_deadline(cutoff, insert_faculty_rows(ctx.db, identity_id, &input)).await {
        Ok(faculty) => {
            tracing::info!(faculty_id = %faculty.id, "Provisioned faculty");
            Ok(ProvisionedFaculty {
                faculty,
                initial_password,
            })
        }
        Err((step, e)) => Err(ctx
            .partial_failure(ADD_FACULTY, identity_id, &input.email, step, e)
            .await),
    }
}

async fn insert_faculty_rows(
    db: &DatabaseConnection,
    id: Uuid,
    input: &NewFaculty,
) -> StepResult<faculty::Model> {
    let txn = db.begin().await.map_err(at("begin"))?;
    users::insert(
        &txn,
        id,
        &input.email,
        &input.name,
        Role::Faculty,
        Some(input.department.clone()),
        None,
    )
    .await
    .map_err(at("insert_user"))?;

    let faculty = faculty::ActiveModel {
        id: Set(id),
        name: Set(input.name.clone()),
        email: Set(input.email.clone()),
        phone: Set(input.phone.clone()),
        department: Set(input.department.clone()),
        active_status: Set(true),
        created_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await
    .map_err(at("insert_faculty"))?;

    txn.commit().await.map_err(at("commit"))?;
    Ok(faculty)
}

/// Enrol a student in the class coordinated by `coordinator_id`.
///
/// The login email and initial password are derived from the registration number and
/// date of birth. A duplicate is detected before anything is written.
pub async fn add_student(
    ctx: &ProvisioningContext<'_>,
    coordinator_id: Uuid,
    input: NewStudent,
) -> Result<ProvisionedStudent, AppError> {
    let cutoff = Instant::now() + ctx.limit;
    let email = compute_student_email(&input.reg_no, &ctx.institution.email_domain);
    let initial_password = compute_initial_password(input.date_of_birth);

    let (coordinator, class) = deadline::until(cutoff, async {
        let coordinator = faculty::Entity::find_by_id(coordinator_id)
            .one(ctx.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Batch coordinator not found".into()))?;
        let class = classes::coordinated_by(ctx.db, coordinator_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("No class is assigned to this coordinator".into())
            })?;

        if users::email_exists(ctx.db, &email).await? {
            return Err(AppError::Duplicate(format!(
                "A student with login {email} already exists"
            )));
        }
        if students::reg_no_exists(ctx.db, &input.reg_no).await? {
            return Err(AppError::Duplicate(format!(
                "Registration number {} already exists",
                input.reg_no
            )));
        }
        Ok::<_, AppError>((coordinator, class))
    })
    .await?;

    let identity_id = ctx
        .identities
        .create_identity(
            &email,
            &initial_password,
            json!({
                "full_name": input.name_of_student,
                "role": Role::Student,
                "reg_no": input.reg_no,
            }),
        )
        .await?;

    let row = student::Model {
        id: identity_id,
        reg_no: input.reg_no,
        name_of_student: input.name_of_student,
        email: email.clone(),
        class_id: class.id,
        department: coordinator.department,
        date_of_birth: input.date_of_birth,
        phone: input.phone,
        address: input.address,
        batch_coordinator_id: coordinator_id,
        created_at: Utc::now(),
    };

    match before_deadline(cutoff, insert_student_rows(ctx.db, row)).await {
        Ok(student) => {
            tracing::info!(student_id = %student.id, class_id = class.id, "Provisioned student");
            Ok(ProvisionedStudent {
                student,
                email,
                initial_password,
            })
        }
        Err((step, e)) => Err(ctx
            .partial_failure(ADD_STUDENT, identity_id, &email, step, e)
            .await),
    }
}

async fn insert_student_rows(
    db: &DatabaseConnection,
    row: student::Model,
) -> StepResult<student::Model> {
    let txn = db.begin().await.map_err(at("begin"))?;
    users::insert(
        &txn,
        row.id,
        &row.email,
        &row.name_of_student,
        Role::Student,
        Some(row.department.clone()),
        Some(row.class_id),
    )
    .await
    .map_err(at("insert_user"))?;

    let student = student::ActiveModel::from(row)
        .insert(&txn)
        .await
        .map_err(at("insert_student"))?;

    txn.commit().await.map_err(at("commit"))?;
    Ok(student)
}
