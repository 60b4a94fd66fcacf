use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{Value, json};

use records_server::entity::assignment_submission;

use crate::common::{FACULTY_PASSWORD, Student, TestApp, routes};

struct Fixture {
    hod: String,
    instructor: String,
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
        instructor,
        subject_id,
        students,
    }
}

fn new_assignment(subject_id: i32) -> Value {
    json!({
        "subject_id": subject_id,
        "title": "Linked lists",
        "description": "Implement a doubly linked list",
        "due_date": "2026-09-01",
        "max_score": 10,
    })
}

/// Create an assignment as the subject instructor and return its id.
async fn create(app: &TestApp, f: &Fixture) -> i32 {
    let res = app
        .post_with_token(routes::ASSIGNMENTS, &new_assignment(f.subject_id), &f.instructor)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    res.body["assignment"]["id"].as_i64().unwrap() as i32
}

/// Submission ids of an assignment, in roster order of `f.students`.
async fn submission_ids(app: &TestApp, f: &Fixture, assignment_id: i32) -> Vec<i32> {
    let res = app
        .get_with_token(&routes::assignment_submissions(assignment_id), &f.instructor)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let rows = res.body.as_array().unwrap();
    f.students
        .iter()
        .map(|s| {
            rows.iter()
                .find(|r| r["student_id"] == s.id.to_string())
                .and_then(|r| r["id"].as_i64())
                .expect("every student gets a submission") as i32
        })
        .collect()
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn every_student_in_the_class_gets_a_submission() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;

        let res = app
            .post_with_token(routes::ASSIGNMENTS, &new_assignment(f.subject_id), &f.instructor)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["submissions_created"], 2);
        let id = res.body["assignment"]["id"].as_i64().unwrap() as i32;

        let listed = app
            .get_with_token(&routes::assignment_submissions(id), &f.hod)
            .await;
        let rows = listed.body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["status"] == false && r["score"].is_null()));
        assert!(rows.iter().any(|r| r["reg_no"] == "SGI22CS001"));
    }

    #[tokio::test]
    async fn students_enrolled_later_get_no_submission() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let id = create(&app, &f).await;
        let coordinator = app.login("anita@sngist.org", FACULTY_PASSWORD).await;

        let late = app
            .add_student(&coordinator, "SGI22CS003", "2005-01-15", None)
            .await;

        let listed = app
            .get_with_token(&routes::assignment_submissions(id), &f.instructor)
            .await;
        let rows = listed.body.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["student_id"] != late.id.to_string()));

        let token = app.login(&late.email, &late.password).await;
        let dashboard = app.get_with_token(routes::MY_DASHBOARD, &token).await;
        assert_eq!(dashboard.status, 200, "{}", dashboard.text);
        let entry = &dashboard.body["assignments"][0];
        assert_eq!(entry["assignment"]["id"], id);
        assert!(entry["submission"].is_null());
    }

    #[tokio::test]
    async fn faculty_outside_the_subject_cannot_create() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let outsider = app.add_faculty(&f.hod, "Suma P", "suma@sngist.org").await;
        let token = app.login(&outsider.email, FACULTY_PASSWORD).await;

        let res = app
            .post_with_token(routes::ASSIGNMENTS, &new_assignment(f.subject_id), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn deleting_an_assignment_removes_its_submissions() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let id = create(&app, &f).await;

        let res = app.delete_with_token(&routes::assignment(id), &f.instructor).await;

        assert_eq!(res.status, 204, "{}", res.text);
        assert_eq!(
            assignment_submission::Entity::find()
                .count(&app.db)
                .await
                .unwrap(),
            0
        );
        let gone = app.get_with_token(&routes::assignment(id), &f.instructor).await;
        assert_eq!(gone.status, 404);
    }
}

mod submissions {
    use super::*;

    #[tokio::test]
    async fn student_hands_in_their_own_work() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let id = create(&app, &f).await;
        let ids = submission_ids(&app, &f, id).await;
        let [a, _] = &f.students;
        let token = app.login(&a.email, &a.password).await;

        let res = app
            .post_with_token(
                &routes::my_submission(ids[0]),
                &json!({"file_url": " https://files.sngist.org/a.pdf "}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], true);
        assert_eq!(res.body["file_url"], "https://files.sngist.org/a.pdf");
        assert!(!res.body["submitted_at"].is_null());
    }

    #[tokio::test]
    async fn students_cannot_submit_for_someone_else() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let id = create(&app, &f).await;
        let ids = submission_ids(&app, &f, id).await;
        let [a, _] = &f.students;
        let token = app.login(&a.email, &a.password).await;

        let res = app
            .post_with_token(&routes::my_submission(ids[1]), &json!({}), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn score_must_fit_the_assignment() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let id = create(&app, &f).await;
        let ids = submission_ids(&app, &f, id).await;

        let over = app
            .patch_with_token(&routes::submission(ids[0]), &json!({"score": 11}), &f.instructor)
            .await;
        assert_eq!(over.status, 400);
        assert_eq!(over.body["code"], "VALIDATION_ERROR");

        let graded = app
            .patch_with_token(
                &routes::submission(ids[0]),
                &json!({"score": 9, "status": true}),
                &f.instructor,
            )
            .await;
        assert_eq!(graded.status, 200, "{}", graded.text);
        assert_eq!(graded.body["score"], 9);
        assert_eq!(graded.body["status"], true);

        let cleared = app
            .patch_with_token(&routes::submission(ids[0]), &json!({"score": null}), &f.instructor)
            .await;
        assert_eq!(cleared.status, 200, "{}", cleared.text);
        assert!(cleared.body["score"].is_null());
        assert_eq!(cleared.body["status"], true);
    }

    #[tokio::test]
    async fn bulk_status_update_marks_every_listed_submission() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let id = create(&app, &f).await;
        let ids = submission_ids(&app, &f, id).await;

        let res = app
            .put_with_token(
                routes::SUBMISSION_STATUS,
                &json!({"submission_ids": [ids[0], ids[1]], "status": true}),
                &f.instructor,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["updated"], 2);
        let listed = app
            .get_with_token(&routes::assignment_submissions(id), &f.instructor)
            .await;
        assert!(listed.body.as_array().unwrap().iter().all(|r| r["status"] == true));
    }

    #[tokio::test]
    async fn bulk_status_update_with_unknown_ids_changes_nothing() {
        let app = TestApp::spawn().await;
        let f = fixture(&app).await;
        let id = create(&app, &f).await;
        let ids = submission_ids(&app, &f, id).await;

        let res = app
            .put_with_token(
                routes::SUBMISSION_STATUS,
                &json!({"submission_ids": [ids[0], 99_999], "status": true}),
                &f.instructor,
            )
            .await;

        assert_eq!(res.status, 404);
        let listed = app
            .get_with_token(&routes::assignment_submissions(id), &f.instructor)
            .await;
        assert!(listed.body.as_array().unwrap().iter().all(|r| r["status"] == false));
    }
}
