use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
    sea_query::Index,
};
use tracing::info;

use crate::entity::{
    assignment, assignment_submission, attendance, auth_identity, auth_session, class, faculty,
    internal_marks, provisioning_failure, student, subject, user,
};

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // An in-memory SQLite database lives and dies with its single connection.
    let in_memory = db_url.contains(":memory:");
    opt.max_connections(if in_memory { 1 } else { 20 })
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(false);
    if !in_memory {
        opt.idle_timeout(Duration::from_secs(300));
    }

    let db = Database::connect(opt).await?;
    ensure_schema(&db).await?;

    Ok(db)
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Create every table (parents before children) and the extra unique indexes.
pub async fn ensure_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, user::Entity).await?;
    create_table(db, &schema, faculty::Entity).await?;
    create_table(db, &schema, class::Entity).await?;
    create_table(db, &schema, subject::Entity).await?;
    create_table(db, &schema, student::Entity).await?;
    create_table(db, &schema, assignment::Entity).await?;
    create_table(db, &schema, assignment_submission::Entity).await?;
    create_table(db, &schema, attendance::Entity).await?;
    create_table(db, &schema, internal_marks::Entity).await?;
    create_table(db, &schema, auth_identity::Entity).await?;
    create_table(db, &schema, auth_session::Entity).await?;
    create_table(db, &schema, provisioning_failure::Entity).await?;

    let idx = Index::create()
        .if_not_exists()
        .name("idx_assignment_submissions_assignment_student")
        .table(assignment_submission::Entity)
        .col(assignment_submission::Column::AssignmentId)
        .col(assignment_submission::Column::StudentId)
        .unique()
        .to_owned();
    db.execute(db.get_database_backend().build(&idx)).await?;

    let idx = Index::create()
        .if_not_exists()
        .name("idx_auth_session_identity")
        .table(auth_session::Entity)
        .col(auth_session::Column::IdentityId)
        .to_owned();
    db.execute(db.get_database_backend().build(&idx)).await?;

    info!("Database schema ready");
    Ok(())
}
