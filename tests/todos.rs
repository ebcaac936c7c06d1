mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;

use common::{bearer, context, init_app, register_and_login_user, PASSWORD};
use todoforge::models::{Task, TaskState};

#[test_log::test(actix_rt::test)]
async fn test_end_to_end_scenario() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;

    let req = test::TestRequest::post()
        .uri("/users")
        .set_json(json!({ "email": "a@test.com", "name": "A", "password": "abc123!" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": "a@test.com", "password": "abc123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header(bearer(&token))
        .set_json(json!({ "description": "Buy milk" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["description"], "Buy milk");
    assert_eq!(created["state"], "INCOMPLETE");
    assert!(created["completedAt"].is_null());
    assert_eq!(created["creatorId"], body["user"]["id"]);
    let id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/todos?filter=INCOMPLETE")
        .insert_header(bearer(&token))
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, vec![created.clone()]);

    let req = test::TestRequest::patch()
        .uri(&format!("/todo/{}", id))
        .insert_header(bearer(&token))
        .set_json(json!({ "state": "COMPLETE" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let patched: Value = test::read_body_json(resp).await;
    assert_eq!(patched["state"], "COMPLETE");
    assert!(patched["completedAt"].is_string());

    let req = test::TestRequest::delete()
        .uri(&format!("/todo/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(test::read_body(resp).await.is_empty());

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header(bearer(&token))
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.is_empty());
}

#[actix_rt::test]
async fn test_other_owners_tasks_are_not_found() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let alice = register_and_login_user(&app, "a@test.com", "Alice", PASSWORD)
        .await
        .unwrap();
    let bob = register_and_login_user(&app, "b@test.com", "Bob", PASSWORD)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header(bearer(&alice.token))
        .set_json(json!({ "description": "Alice's task" }))
        .to_request();
    let task: Task = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/todo/{}", task.id);

    let requests = [
        test::TestRequest::get().uri(&uri),
        test::TestRequest::patch()
            .uri(&uri)
            .set_json(json!({ "state": "COMPLETE" })),
        test::TestRequest::delete().uri(&uri),
    ];
    for req in requests {
        let req = req.insert_header(bearer(&bob.token)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Not Found");
    }

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header(bearer(&bob.token))
        .to_request();
    let listed: Vec<Task> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.is_empty());

    // Untouched for its owner.
    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&alice.token))
        .to_request();
    let fetched: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, task);
}

#[actix_rt::test]
async fn test_completed_task_description_is_locked() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(&app, "a@test.com", "Alice", PASSWORD)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header(bearer(&user.token))
        .set_json(json!({ "description": "Buy milk" }))
        .to_request();
    let task: Task = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/todo/{}", task.id);

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&user.token))
        .set_json(json!({ "state": "COMPLETE" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);

    for body in [
        json!({ "description": "Buy oat milk" }),
        json!({ "description": "Buy oat milk", "state": "INCOMPLETE" }),
    ] {
        let req = test::TestRequest::patch()
            .uri(&uri)
            .insert_header(bearer(&user.token))
            .set_json(body)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&user.token))
        .to_request();
    let stored: Task = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stored.description, "Buy milk");
    assert_eq!(stored.state, TaskState::Complete);
}

#[actix_rt::test]
async fn test_complete_and_reopen_round_trip() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(&app, "a@test.com", "Alice", PASSWORD)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header(bearer(&user.token))
        .set_json(json!({ "description": "Buy milk" }))
        .to_request();
    let task: Task = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/todo/{}", task.id);

    let patch = |state: &str| {
        test::TestRequest::patch()
            .uri(&uri)
            .insert_header(bearer(&user.token))
            .set_json(json!({ "state": state }))
            .to_request()
    };

    let completed: Task = test::call_and_read_body_json(&app, patch("COMPLETE")).await;
    let completed_again: Task = test::call_and_read_body_json(&app, patch("COMPLETE")).await;
    assert!(completed.completed_at.is_some());
    assert_eq!(completed_again, completed);

    let reopened: Task = test::call_and_read_body_json(&app, patch("INCOMPLETE")).await;
    let reopened_again: Task = test::call_and_read_body_json(&app, patch("INCOMPLETE")).await;
    assert_eq!(reopened.state, TaskState::Incomplete);
    assert_eq!(reopened.completed_at, None);
    assert_eq!(reopened_again, reopened);
    assert_eq!(reopened.description, task.description);
    assert_eq!(reopened.created_at, task.created_at);
}

#[actix_rt::test]
async fn test_list_filter_and_order() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(&app, "a@test.com", "Alice", PASSWORD)
        .await
        .unwrap();

    let mut ids = std::collections::HashMap::new();
    for description in ["b", "a", "c"] {
        let req = test::TestRequest::post()
            .uri("/todos")
            .insert_header(bearer(&user.token))
            .set_json(json!({ "description": description }))
            .to_request();
        let task: Task = test::call_and_read_body_json(&app, req).await;
        ids.insert(description, task.id);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    for description in ["c", "a"] {
        let req = test::TestRequest::patch()
            .uri(&format!("/todo/{}", ids[description]))
            .insert_header(bearer(&user.token))
            .set_json(json!({ "state": "COMPLETE" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let list = |query: &str| {
        test::TestRequest::get()
            .uri(&format!("/todos{}", query))
            .insert_header(bearer(&user.token))
            .to_request()
    };
    let descriptions = |tasks: Vec<Task>| -> Vec<String> {
        tasks.into_iter().map(|task| task.description).collect()
    };

    let all: Vec<Task> = test::call_and_read_body_json(&app, list("")).await;
    assert_eq!(descriptions(all), vec!["b", "a", "c"]);

    let complete: Vec<Task> =
        test::call_and_read_body_json(&app, list("?filter=COMPLETE&orderBy=DESCRIPTION")).await;
    assert_eq!(descriptions(complete), vec!["a", "c"]);

    let incomplete: Vec<Task> =
        test::call_and_read_body_json(&app, list("?filter=INCOMPLETE")).await;
    assert_eq!(descriptions(incomplete), vec!["b"]);

    let by_completion: Vec<Task> =
        test::call_and_read_body_json(&app, list("?orderBy=COMPLETED_AT")).await;
    assert_eq!(descriptions(by_completion), vec!["c", "a", "b"]);

    let resp = test::call_service(&app, list("?filter=SOMETIMES")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_invalid_task_inputs() {
    let ctx = context();
    let app = init_app(ctx.state.clone()).await;
    let user = register_and_login_user(&app, "a@test.com", "Alice", PASSWORD)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header(bearer(&user.token))
        .set_json(json!({ "description": "" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header(bearer(&user.token))
        .set_json(json!({}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header(bearer(&user.token))
        .set_json(json!({ "description": "Buy milk" }))
        .to_request();
    let task: Task = test::call_and_read_body_json(&app, req).await;

    for body in [json!({}), json!({ "state": "DONE" }), json!({ "description": "" })] {
        let req = test::TestRequest::patch()
            .uri(&format!("/todo/{}", task.id))
            .insert_header(bearer(&user.token))
            .set_json(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    let req = test::TestRequest::get()
        .uri("/todo/not-a-uuid")
        .insert_header(bearer(&user.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::delete()
        .uri(&format!("/todo/{}", uuid::Uuid::new_v4()))
        .insert_header(bearer(&user.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}
