use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use records_server::entity::{auth_identity, student, user};

use crate::common::{EMAIL_DOMAIN, FACULTY_PASSWORD, TestApp, routes};

/// HOD token plus a coordinator (with class) and their token.
async fn coordinator_setup(app: &TestApp) -> (String, uuid::Uuid, i32, String) {
    let hod = app.hod_token().await;
    let anita = app.add_faculty(&hod, "Anita Raj", "anita@sngist.org").await;
    let class_id = app.create_class(&hod, "CS-2022", Some(anita.id)).await;
    let bc = app.login(&anita.email, FACULTY_PASSWORD).await;
    (hod, anita.id, class_id, bc)
}

mod add_student {
    use super::*;

    #[tokio::test]
    async fn coordinator_adds_a_student_who_can_sign_in() {
        let app = TestApp::spawn().await;
        let (_, anita_id, class_id, bc) = coordinator_setup(&app).await;

        let res = app
            .post_with_token(
                routes::STUDENTS,
                &json!({
                    "reg_no": "sgi22cs001",
                    "name_of_student": "Rahul K",
                    "date_of_birth": "2005-04-12",
                    "phone": "9876543210",
                }),
                &bc,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], format!("sgi22cs001@{EMAIL_DOMAIN}"));
        assert_eq!(res.body["initial_password"], "12042005");
        assert_eq!(res.body["student"]["reg_no"], "SGI22CS001");
        assert_eq!(res.body["student"]["class_id"], class_id);
        assert_eq!(res.body["student"]["batch_coordinator_id"], anita_id.to_string());
        assert_eq!(res.body["student"]["department"], "CS");

        let login = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "sgi22cs001@sngist.org", "password": "12042005"}),
            )
            .await;
        assert_eq!(login.status, 200, "{}", login.text);
        assert_eq!(login.body["role"], "student");
        assert_eq!(login.body["redirect"], "/student/dashboard");
    }

    #[tokio::test]
    async fn duplicate_registration_number_writes_nothing() {
        let app = TestApp::spawn().await;
        let (_, _, _, bc) = coordinator_setup(&app).await;
        app.add_student(&bc, "SGI22CS001", "2005-04-12", None).await;

        let identities_before = auth_identity::Entity::find().count(&app.db).await.unwrap();
        let res = app
            .post_with_token(
                routes::STUDENTS,
                &json!({
                    "reg_no": "SGI22CS001",
                    "name_of_student": "Someone Else",
                    "date_of_birth": "2004-01-01",
                }),
                &bc,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "DUPLICATE");
        assert_eq!(
            auth_identity::Entity::find().count(&app.db).await.unwrap(),
            identities_before
        );
        assert_eq!(student::Entity::find().count(&app.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn hod_must_name_the_coordinator() {
        let app = TestApp::spawn().await;
        let (hod, anita_id, class_id, _) = coordinator_setup(&app).await;

        let missing = app
            .post_with_token(
                routes::STUDENTS,
                &json!({
                    "reg_no": "SGI22CS001",
                    "name_of_student": "Rahul K",
                    "date_of_birth": "2005-04-12",
                }),
                &hod,
            )
            .await;
        assert_eq!(missing.status, 400);
        assert_eq!(missing.body["code"], "VALIDATION_ERROR");

        let student = app
            .add_student(&hod, "SGI22CS001", "2005-04-12", Some(anita_id))
            .await;
        let row = student::Entity::find_by_id(student.id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.class_id, class_id);
    }

    #[tokio::test]
    async fn malformed_date_of_birth_is_rejected() {
        let app = TestApp::spawn().await;
        let (_, _, _, bc) = coordinator_setup(&app).await;

        let res = app
            .post_with_token(
                routes::STUDENTS,
                &json!({
                    "reg_no": "SGI22CS001",
                    "name_of_student": "Rahul K",
                    "date_of_birth": "12/04/2005",
                }),
                &bc,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(student::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn plain_faculty_cannot_add_students() {
        let app = TestApp::spawn().await;
        let hod = app.hod_token().await;
        let ravi = app.add_faculty(&hod, "Ravi Kumar", "ravi@sngist.org").await;
        let token = app.login(&ravi.email, FACULTY_PASSWORD).await;

        let res = app
            .post_with_token(
                routes::STUDENTS,
                &json!({
                    "reg_no": "SGI22CS001",
                    "name_of_student": "Rahul K",
                    "date_of_birth": "2005-04-12",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "UNAUTHORIZED");
    }
}

mod roster {
    use super::*;

    #[tokio::test]
    async fn coordinators_only_see_their_own_class() {
        let app = TestApp::spawn().await;
        let (hod, anita_id, _, bc) = coordinator_setup(&app).await;
        let ravi = app.add_faculty(&hod, "Ravi Kumar", "ravi@sngist.org").await;
        app.create_class(&hod, "CS-2023", Some(ravi.id)).await;
        let other_bc = app.login(&ravi.email, FACULTY_PASSWORD).await;
        app.add_student(&bc, "SGI22CS001", "2005-04-12", None).await;
        app.add_student(&other_bc, "SGI23CS001", "2006-02-02", None).await;

        let mine = app
            .get_with_token(
                &format!("{}?coordinator_id={}", routes::STUDENTS, ravi.id),
                &bc,
            )
            .await;
        assert_eq!(mine.status, 200, "{}", mine.text);
        let rows = mine.body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["reg_no"], "SGI22CS001");
        assert_eq!(rows[0]["batch_coordinator_id"], anita_id.to_string());

        let all = app.get_with_token(routes::STUDENTS, &hod).await;
        assert_eq!(all.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn another_coordinator_cannot_touch_the_student() {
        let app = TestApp::spawn().await;
        let (hod, _, _, bc) = coordinator_setup(&app).await;
        let ravi = app.add_faculty(&hod, "Ravi Kumar", "ravi@sngist.org").await;
        app.create_class(&hod, "CS-2023", Some(ravi.id)).await;
        let other_bc = app.login(&ravi.email, FACULTY_PASSWORD).await;
        let student = app.add_student(&bc, "SGI22CS001", "2005-04-12", None).await;

        let read = app
            .get_with_token(&routes::student(student.id), &other_bc)
            .await;
        assert_eq!(read.status, 403);
        assert_eq!(read.body["code"], "PERMISSION_DENIED");

        let edit = app
            .patch_with_token(
                &routes::student(student.id),
                &json!({"name_of_student": "Hijacked"}),
                &other_bc,
            )
            .await;
        assert_eq!(edit.status, 403);
        assert_eq!(edit.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn coordinator_edits_contact_details() {
        let app = TestApp::spawn().await;
        let (_, _, _, bc) = coordinator_setup(&app).await;
        let student = app.add_student(&bc, "SGI22CS001", "2005-04-12", None).await;

        let res = app
            .patch_with_token(
                &routes::student(student.id),
                &json!({"name_of_student": "Rahul Krishnan", "address": "Kochi"}),
                &bc,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name_of_student"], "Rahul Krishnan");
        assert_eq!(res.body["address"], "Kochi");
        let mirrored = user::Entity::find_by_id(student.id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mirrored.full_name, "Rahul Krishnan");
    }
}

mod removal {
    use super::*;

    #[tokio::test]
    async fn deleting_a_student_removes_their_login() {
        let app = TestApp::spawn().await;
        let (_, _, _, bc) = coordinator_setup(&app).await;
        let student = app.add_student(&bc, "SGI22CS001", "2005-04-12", None).await;
        let session = app.login(&student.email, &student.password).await;

        let res = app.delete_with_token(&routes::student(student.id), &bc).await;

        assert_eq!(res.status, 204, "{}", res.text);
        assert_eq!(student::Entity::find().count(&app.db).await.unwrap(), 0);
        assert!(app.user_id_of(&student.email).await.is_none());
        let login = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": student.email, "password": student.password}),
            )
            .await;
        assert_eq!(login.status, 401);
        let me = app.get_with_token(routes::ME, &session).await;
        assert_eq!(me.status, 401);
    }
}
