use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use records_server::entity::{auth_identity, student, subject, user};

use crate::common::{FACULTY_PASSWORD, TestApp, routes};

async fn stored_role(app: &TestApp, id: uuid::Uuid) -> String {
    user::Entity::find_by_id(id)
        .one(&app.db)
        .await
        .unwrap()
        .expect("user row should exist")
        .role
}

mod coordinators {
    use super::*;

    #[tokio::test]
    async fn designating_a_coordinator_promotes_them() {
        let app = TestApp::spawn().await;
        let hod = app.hod_token().await;
        let anita = app.add_faculty(&hod, "Anita Raj", "anita@sngist.org").await;

        app.create_class(&hod, "CS-2022", Some(anita.id)).await;

        assert_eq!(stored_role(&app, anita.id).await, "batch_coordinator");
        let login = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": anita.email, "password": FACULTY_PASSWORD}),
            )
            .await;
        assert_eq!(login.body["role"], "batch_coordinator");
        assert_eq!(login.body["redirect"], "/batch-coordinator/dashboard");
    }

    #[tokio::test]
    async fn a_faculty_member_coordinates_at_most_one_class() {
        let app = TestApp::spawn().await;
        let hod = app.hod_token().await;
        let anita = app.add_faculty(&hod, "Anita Raj", "anita@sngist.org").await;
        app.create_class(&hod, "CS-2022", Some(anita.id)).await;

        let res = app
            .post_with_token(
                routes::CLASSES,
                &json!({
                    "name": "CS-2023",
                    "department": "CS",
                    "batch_year_start": 2023,
                    "batch_year_end": 2027,
                    "batch_coordinator_id": anita.id,
                }),
                &hod,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn clearing_the_coordinator_demotes_them() {
        let app = TestApp::spawn().await;
        let hod = app.hod_token().await;
        let anita = app.add_faculty(&hod, "Anita Raj", "anita@sngist.org").await;
        let class_id = app.create_class(&hod, "CS-2022", Some(anita.id)).await;

        let res = app
            .patch_with_token(
                &routes::class(class_id),
                &json!({"batch_coordinator_id": null}),
                &hod,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["batch_coordinator_id"].is_null());
        assert_eq!(stored_role(&app, anita.id).await, "faculty");
    }

    #[tokio::test]
    async fn swapping_coordinators_moves_the_role() {
        let app = TestApp::spawn().await;
        let hod = app.hod_token().await;
        let anita = app.add_faculty(&hod, "Anita Raj", "anita@sngist.org").await;
        let ravi = app.add_faculty(&hod, "Ravi Kumar", "ravi@sngist.org").await;
        let class_id = app.create_class(&hod, "CS-2022", Some(anita.id)).await;

        let res = app
            .patch_with_token(
                &routes::class(class_id),
                &json!({"batch_coordinator_id": ravi.id}),
                &hod,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(stored_role(&app, anita.id).await, "faculty");
        assert_eq!(stored_role(&app, ravi.id).await, "batch_coordinator");
    }

    #[tokio::test]
    async fn deactivated_faculty_cannot_coordinate() {
        let app = TestApp::spawn().await;
        let hod = app.hod_token().await;
        let anita = app.add_faculty(&hod, "Anita Raj", "anita@sngist.org").await;
        app.put_with_token(
            &routes::faculty_status(anita.id),
            &json!({"active_status": false}),
            &hod,
        )
        .await;

        let res = app
            .post_with_token(
                routes::CLASSES,
                &json!({
                    "name": "CS-2022",
                    "department": "CS",
                    "batch_year_start": 2022,
                    "batch_year_end": 2026,
                    "batch_coordinator_id": anita.id,
                }),
                &hod,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn batch_end_must_follow_start() {
        let app = TestApp::spawn().await;
        let hod = app.hod_token().await;

        let res = app
            .post_with_token(
                routes::CLASSES,
                &json!({
                    "name": "CS-2022",
                    "department": "CS",
                    "batch_year_start": 2026,
                    "batch_year_end": 2022,
                }),
                &hod,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn only_the_hod_creates_classes() {
        let app = TestApp::spawn().await;
        let hod = app.hod_token().await;
        let anita = app.add_faculty(&hod, "Anita Raj", "anita@sngist.org").await;
        let token = app.login(&anita.email, FACULTY_PASSWORD).await;

        let res = app
            .post_with_token(
                routes::CLASSES,
                &json!({
                    "name": "CS-2022",
                    "department": "CS",
                    "batch_year_start": 2022,
                    "batch_year_end": 2026,
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "UNAUTHORIZED");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn deleting_a_class_removes_everything_in_it() {
        let app = TestApp::spawn().await;
        let hod = app.hod_token().await;
        let anita = app.add_faculty(&hod, "Anita Raj", "anita@sngist.org").await;
        let class_id = app.create_class(&hod, "CS-2022", Some(anita.id)).await;
        let subject_id = app
            .create_subject(&hod, class_id, "Data Structures", Some(anita.id))
            .await;
        let bc = app.login(&anita.email, FACULTY_PASSWORD).await;
        let first = app.add_student(&bc, "SGI22CS001", "2005-04-12", None).await;
        app.add_student(&bc, "SGI22CS002", "2005-06-30", None).await;

        let saved = app
            .put_with_token(
                routes::ATTENDANCE,
                &json!({
                    "class_id": class_id,
                    "subject_id": subject_id,
                    "month": "August",
                    "entries": [{"student_id": first.id, "percentage": 90}],
                }),
                &bc,
            )
            .await;
        assert_eq!(saved.status, 200, "{}", saved.text);
        let assignment = app
            .post_with_token(
                routes::ASSIGNMENTS,
                &json!({
                    "subject_id": subject_id,
                    "title": "Linked lists",
                    "description": "Implement a doubly linked list",
                    "due_date": "2026-09-01",
                    "max_score": 10,
                }),
                &bc,
            )
            .await;
        assert_eq!(assignment.status, 201, "{}", assignment.text);

        let res = app.delete_with_token(&routes::class(class_id), &hod).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["students"], 2);
        assert_eq!(res.body["subjects"], 1);
        assert_eq!(res.body["assignments"], 1);
        assert_eq!(student::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(subject::Entity::find().count(&app.db).await.unwrap(), 0);
        // HOD and the former coordinator keep their logins.
        assert_eq!(auth_identity::Entity::find().count(&app.db).await.unwrap(), 2);
        assert_eq!(stored_role(&app, anita.id).await, "faculty");

        let gone = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": first.email, "password": first.password}),
            )
            .await;
        assert_eq!(gone.status, 401);
    }

    #[tokio::test]
    async fn deleting_a_missing_class_is_not_found() {
        let app = TestApp::spawn().await;
        let hod = app.hod_token().await;

        let res = app.delete_with_token(&routes::class(404), &hod).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod performance {
    use super::*;

    #[tokio::test]
    async fn report_shows_marks_attendance_and_placeholders() {
        let app = TestApp::spawn().await;
        let hod = app.hod_token().await;
        let anita = app.add_faculty(&hod, "Anita Raj", "anita@sngist.org").await;
        let class_id = app.create_class(&hod, "CS-2022", Some(anita.id)).await;
        let subject_id = app
            .create_subject(&hod, class_id, "Data Structures", Some(anita.id))
            .await;
        let bc = app.login(&anita.email, FACULTY_PASSWORD).await;
        let student = app.add_student(&bc, "SGI22CS001", "2005-04-12", None).await;

        for (month, pct) in [("September", 80.0), ("August", 90.0)] {
            let res = app
                .put_with_token(
                    routes::ATTENDANCE,
                    &json!({
                        "class_id": class_id,
                        "subject_id": subject_id,
                        "month": month,
                        "entries": [{"student_id": student.id, "percentage": pct}],
                    }),
                    &bc,
                )
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
        }
        let marks = app
            .put_with_token(
                routes::INTERNAL_MARKS,
                &json!({
                    "subject_id": subject_id,
                    "assessment_type": "internal1",
                    "max_marks": 50,
                    "entries": [{"student_id": student.id, "marks": 42}],
                }),
                &bc,
            )
            .await;
        assert_eq!(marks.status, 200, "{}", marks.text);

        let res = app
            .get_with_token(&routes::class_performance(class_id), &hod)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let row = &res.body["students"][0]["subjects"][0];
        assert_eq!(row["internal1_display"], "42/50");
        assert_eq!(row["internal2_display"], "N/A");
        assert_eq!(row["average"], 42.0);
        assert_eq!(row["attendance"][0]["month"], "August");
        assert_eq!(row["attendance"][1]["month"], "September");
        assert_eq!(row["attendance_average"], 85.0);
    }

    #[tokio::test]
    async fn other_coordinators_cannot_read_the_report() {
        let app = TestApp::spawn().await;
        let hod = app.hod_token().await;
        let anita = app.add_faculty(&hod, "Anita Raj", "anita@sngist.org").await;
        let ravi = app.add_faculty(&hod, "Ravi Kumar", "ravi@sngist.org").await;
        let class_id = app.create_class(&hod, "CS-2022", Some(anita.id)).await;
        app.create_class(&hod, "CS-2023", Some(ravi.id)).await;
        let token = app.login(&ravi.email, FACULTY_PASSWORD).await;

        let res = app
            .get_with_token(&routes::class_performance(class_id), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}
