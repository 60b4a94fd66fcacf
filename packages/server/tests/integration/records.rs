use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{Value, json};
use uuid::Uuid;

use records_server::entity::{attendance, internal_marks};

use crate::common::{FACULTY_PASSWORD, Student, TestApp, routes};

/// A class coordinated by Anita, a subject taught by Ravi, and two students.
struct Fixture {
    hod: String,
    coordinator: String,
    instructor: String,
    class_id: i32,
    subject_id: i32,
    students: [Student; 2],
}

async fn fixture(app: &TestApp) -> Fixture {
    let hod = app.hod_token().await;
    let anita = app.add_faculty(&hod, "Anita Raj", "anita@sngist.org").await;
    let ravi = app.add_faculty(&hod, "Ravi Kumar", "ravi@sngist.org").await;
    let class_id = app.create_class(&hod, "CS-2022", Some(anita.id)).await;
    let subject_id = app
        .create_subject(&hod, class_id, "Data Structures", Some(ravi.id))
        .await;
    let coordinator = app.login(&anita.email, FACULTY_PASSWORD).await;
    let instructor = app.login(&ravi.email, FACULTY_PASSWORD).await;
    let students = [
        app.add_student(&coordinator, "SGI22CS001", "2005-04-12", None)
            .await,
        app.add_student(&coordinator, "SGI22CS002", "2005-06-30", None)
            .await,
    ];
    Fixture {
        hod,
        coordinator,
        instructor,
        class_id,
        subject_id,
        students,
    }
}

fn sheet(f: &Fixture, month: &str, entries: Value) -> Value {
    json!({
        "class_id": f.class_id,
        "subject_id": f.subject_id,
        "month": month,
        "entries": entries,
    })
}

fn marks_sheet(f: &Fixture, assessment: &str, entries: Value) -> Value {
    json!({
        "subject_id": f.subject_id,
        "assessment_type": assessment,
        "max_marks": 50,
        "entries": entries,
    })
}

async fn stored_percentage(app: &TestApp, student_id: Uuid, subject_id: i32, month: &str) -> f64 {
    attendance::Entity::find_by_id((student_id, subject_id, month.to_string()))
        .one(&app.db)
        .await
        .unwrap()
        .expect("attendance row should exist")
        .attendance_percentage
}

mod attendance_sheet {
    use super::*;

    #[tokio::test]
    async fn subject_instructor_saves_a_month() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let [a, b] = &f.students;

        let res = app
            .put_with_token(
                routes::ATTENDANCE,
                &sheet(
                    &f,
                    "  august ",
                    json!([
                        {"student_id": a.id, "percentage": 120},
                        {"student_id": b.id, "percentage": ""},
                    ]),
                ),
                &f.instructor,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["saved"], 1);
        assert_eq!(res.body["skipped"], 1);
        assert_eq!(stored_percentage(&app, a.id, f.subject_id, "August").await, 100.0);
        // Blank cells are never written as zero.
        assert_eq!(attendance::Entity::find().count(&app.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn saving_the_same_month_again_overwrites() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let [a, _] = &f.students;

        for pct in [70.0, 85.5] {
            let res = app
                .put_with_token(
                    routes::ATTENDANCE,
                    &sheet(&f, "August", json!([{"student_id": a.id, "percentage": pct}])),
                    &f.instructor,
                )
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
        }
        let september = app
            .put_with_token(
                routes::ATTENDANCE,
                &sheet(&f, "September", json!([{"student_id": a.id, "percentage": 60}])),
                &f.coordinator,
            )
            .await;
        assert_eq!(september.status, 200, "{}", september.text);

        assert_eq!(stored_percentage(&app, a.id, f.subject_id, "August").await, 85.5);
        assert_eq!(stored_percentage(&app, a.id, f.subject_id, "September").await, 60.0);

        let listed = app
            .get_with_token(
                &format!("{}?subject_id={}&month=AUGUST", routes::ATTENDANCE, f.subject_id),
                &f.hod,
            )
            .await;
        assert_eq!(listed.status, 200, "{}", listed.text);
        let rows = listed.body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["attendance_percentage"], 85.5);
    }

    #[tokio::test]
    async fn an_all_blank_sheet_is_rejected() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let [a, b] = &f.students;

        let res = app
            .put_with_token(
                routes::ATTENDANCE,
                &sheet(
                    &f,
                    "August",
                    json!([
                        {"student_id": a.id, "percentage": null},
                        {"student_id": b.id},
                    ]),
                ),
                &f.instructor,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "No attendance data to save");
    }

    #[tokio::test]
    async fn unknown_month_is_rejected() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let [a, _] = &f.students;

        let res = app
            .put_with_token(
                routes::ATTENDANCE,
                &sheet(&f, "Smarch", json!([{"student_id": a.id, "percentage": 50}])),
                &f.instructor,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn faculty_not_assigned_to_the_subject_is_denied() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let [a, _] = &f.students;
        let outsider = app.add_faculty(&f.hod, "Suma P", "suma@sngist.org").await;
        let token = app.login(&outsider.email, FACULTY_PASSWORD).await;

        let res = app
            .put_with_token(
                routes::ATTENDANCE,
                &sheet(&f, "August", json!([{"student_id": a.id, "percentage": 50}])),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
        assert_eq!(attendance::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn students_cannot_write_attendance() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let [a, _] = &f.students;
        let token = app.login(&a.email, &a.password).await;

        let res = app
            .put_with_token(
                routes::ATTENDANCE,
                &sheet(&f, "August", json!([{"student_id": a.id, "percentage": 100}])),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "UNAUTHORIZED");
        assert_eq!(res.body["redirect"], "/unauthorized");
    }

    #[tokio::test]
    async fn students_of_another_class_are_rejected() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let other = app.add_faculty(&f.hod, "Suma P", "suma@sngist.org").await;
        app.create_class(&f.hod, "CS-2023", Some(other.id)).await;
        let other_bc = app.login(&other.email, FACULTY_PASSWORD).await;
        let foreign = app
            .add_student(&other_bc, "SGI23CS001", "2006-02-02", None)
            .await;

        let res = app
            .put_with_token(
                routes::ATTENDANCE,
                &sheet(&f, "August", json!([{"student_id": foreign.id, "percentage": 90}])),
                &f.instructor,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(attendance::Entity::find().count(&app.db).await.unwrap(), 0);
    }
}

mod internal_marks_sheet {
    use super::*;

    async fn stored(app: &TestApp, student_id: Uuid, subject_id: i32) -> internal_marks::Model {
        internal_marks::Entity::find_by_id((student_id, subject_id))
            .one(&app.db)
            .await
            .unwrap()
            .expect("marks row should exist")
    }

    #[tokio::test]
    async fn second_internal_keeps_the_first() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let [a, _] = &f.students;

        let first = app
            .put_with_token(
                routes::INTERNAL_MARKS,
                &marks_sheet(&f, "internal1", json!([{"student_id": a.id, "marks": 42}])),
                &f.instructor,
            )
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert!(stored(&app, a.id, f.subject_id).await.internal2_marks.is_none());

        let second = app
            .put_with_token(
                routes::INTERNAL_MARKS,
                &marks_sheet(&f, "internal2", json!([{"student_id": a.id, "marks": 38.5}])),
                &f.instructor,
            )
            .await;
        assert_eq!(second.status, 200, "{}", second.text);
        assert_eq!(second.body["saved"], 1);

        let row = stored(&app, a.id, f.subject_id).await;
        assert_eq!(row.internal1_marks, Some(42.0));
        assert_eq!(row.internal2_marks, Some(38.5));

        let listed = app
            .get_with_token(
                &format!("{}?subject_id={}", routes::INTERNAL_MARKS, f.subject_id),
                &f.coordinator,
            )
            .await;
        assert_eq!(listed.status, 200, "{}", listed.text);
        assert_eq!(listed.body[0]["internal1_marks"], 42.0);
        assert_eq!(listed.body[0]["internal2_marks"], 38.5);
    }

    #[tokio::test]
    async fn lower_max_below_the_kept_internal_is_rejected() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let [a, _] = &f.students;
        app.put_with_token(
            routes::INTERNAL_MARKS,
            &marks_sheet(&f, "internal1", json!([{"student_id": a.id, "marks": 45}])),
            &f.instructor,
        )
        .await;

        let res = app
            .put_with_token(
                routes::INTERNAL_MARKS,
                &json!({
                    "subject_id": f.subject_id,
                    "assessment_type": "internal2",
                    "max_marks": 20,
                    "entries": [{"student_id": a.id, "marks": 10}],
                }),
                &f.instructor,
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let row = stored(&app, a.id, f.subject_id).await;
        assert_eq!(row.internal1_marks, Some(45.0));
        assert!(row.internal2_marks.is_none());
        assert_eq!(row.max_marks, 50.0);
    }

    #[tokio::test]
    async fn blank_marks_are_stored_as_ungraded() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let [a, b] = &f.students;

        let res = app
            .put_with_token(
                routes::INTERNAL_MARKS,
                &marks_sheet(
                    &f,
                    "internal1",
                    json!([
                        {"student_id": a.id, "marks": ""},
                        {"student_id": b.id, "marks": 30},
                    ]),
                ),
                &f.instructor,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(stored(&app, a.id, f.subject_id).await.internal1_marks.is_none());
        assert_eq!(
            stored(&app, b.id, f.subject_id).await.internal1_marks,
            Some(30.0)
        );
    }

    #[tokio::test]
    async fn marks_above_the_maximum_write_nothing() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let [a, b] = &f.students;

        let res = app
            .put_with_token(
                routes::INTERNAL_MARKS,
                &marks_sheet(
                    &f,
                    "internal1",
                    json!([
                        {"student_id": a.id, "marks": 40},
                        {"student_id": b.id, "marks": 51},
                    ]),
                ),
                &f.instructor,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(internal_marks::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_assessment_type_is_rejected() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let [a, _] = &f.students;

        let res = app
            .put_with_token(
                routes::INTERNAL_MARKS,
                &marks_sheet(&f, "final", json!([{"student_id": a.id, "marks": 40}])),
                &f.instructor,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}
