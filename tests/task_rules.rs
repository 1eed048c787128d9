mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{register, send, set_manager, spawn_app};

#[tokio::test]
async fn assignee_updates_status_and_nothing_else() -> Result<()> {
    let test = spawn_app().await?;
    let (admin, _) = register(&test.app, "Admin", "admin@example.com", "admin").await?;
    let (meera, meera_id) = register(&test.app, "Meera", "meera@example.com", "manager").await?;
    let (arjun, arjun_id) = register(&test.app, "Arjun", "arjun@example.com", "user").await?;
    set_manager(&test.app, &admin, arjun_id, meera_id).await?;

    let (status, body) = send(
        &test.app,
        "POST",
        "/tasks",
        Some(&meera),
        Some(json!({ "title": "Ship the report", "assigned_to": arjun_id, "due_date": "2026-09-01" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = body["id"].as_str().unwrap().to_string();

    // The assignee sees it.
    let (status, body) = send(&test.app, "GET", &format!("/tasks/{task_id}"), Some(&arjun), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Ship the report");

    // A body touching only status succeeds and changes only status.
    let (status, body) = send(
        &test.app,
        "PUT",
        &format!("/tasks/{task_id}"),
        Some(&arjun),
        Some(json!({ "status": "inprogress" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "inprogress");
    assert_eq!(body["title"], "Ship the report");

    // Any extra key makes it a full update, denied on the field gate.
    let (status, body) = send(
        &test.app,
        "PUT",
        &format!("/tasks/{task_id}"),
        Some(&arjun),
        Some(json!({ "status": "completed", "title": "Renamed" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().contains("status"));

    // The denied request changed nothing.
    let (_, body) = send(&test.app, "GET", &format!("/tasks/{task_id}"), Some(&arjun), None).await?;
    assert_eq!(body["status"], "inprogress");
    assert_eq!(body["title"], "Ship the report");

    // An empty body carries no status key, so it is a full update and the
    // field gate rejects it rather than succeeding as a no-op.
    let (status, body) = send(
        &test.app,
        "PUT",
        &format!("/tasks/{task_id}"),
        Some(&arjun),
        Some(json!({})),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().contains("status"));

    // The field-set gate runs before value validation.
    let (status, _) = send(
        &test.app,
        "PUT",
        &format!("/tasks/{task_id}"),
        Some(&arjun),
        Some(json!({ "status": "not-a-status" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Plain users neither create nor delete.
    let (status, _) = send(
        &test.app,
        "POST",
        "/tasks",
        Some(&arjun),
        Some(json!({ "title": "Rogue task" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&test.app, "DELETE", &format!("/tasks/{task_id}"), Some(&arjun), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn unassigned_tasks_are_invisible_to_plain_users() -> Result<()> {
    let test = spawn_app().await?;
    let (admin, _) = register(&test.app, "Admin", "admin@example.com", "admin").await?;
    let (meera, meera_id) = register(&test.app, "Meera", "meera@example.com", "manager").await?;
    let (arjun, arjun_id) = register(&test.app, "Arjun", "arjun@example.com", "user").await?;
    set_manager(&test.app, &admin, arjun_id, meera_id).await?;

    let (_, body) = send(
        &test.app,
        "POST",
        "/tasks",
        Some(&meera),
        Some(json!({ "title": "Backlog item" })),
    )
    .await?;
    let task_id = body["id"].as_str().unwrap().to_string();
    assert!(body["assigned_at"].is_null());

    let (_, body) = send(&test.app, "GET", "/tasks", Some(&arjun), None).await?;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send(&test.app, "GET", &format!("/tasks/{task_id}"), Some(&arjun), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The creator still sees it through the creator clause.
    let (status, _) = send(&test.app, "GET", &format!("/tasks/{task_id}"), Some(&meera), None).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn task_assigned_outside_the_team_follows_creator_and_assignee() -> Result<()> {
    let test = spawn_app().await?;
    let (admin, _) = register(&test.app, "Admin", "admin@example.com", "admin").await?;
    let (meera, _) = register(&test.app, "Meera", "meera@example.com", "manager").await?;
    let (_, rohit_id) = register(&test.app, "Rohit", "rohit@example.com", "manager").await?;
    let (kiran, _) = register(&test.app, "Kiran", "kiran@example.com", "manager").await?;
    let (sana, sana_id) = register(&test.app, "Sana", "sana@example.com", "user").await?;
    set_manager(&test.app, &admin, sana_id, rohit_id).await?;

    let (_, body) = send(
        &test.app,
        "POST",
        "/tasks",
        Some(&meera),
        Some(json!({ "title": "Cross-team favor", "assigned_to": sana_id })),
    )
    .await?;
    let task_id = body["id"].as_str().unwrap().to_string();

    // Creator keeps full control even though the assignee is not her report.
    let (status, _) = send(
        &test.app,
        "PUT",
        &format!("/tasks/{task_id}"),
        Some(&meera),
        Some(json!({ "title": "Cross-team favor (urgent)" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    // The assignee reads it; full updates are still gated.
    let (status, _) = send(&test.app, "GET", &format!("/tasks/{task_id}"), Some(&sana), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &test.app,
        "PUT",
        &format!("/tasks/{task_id}"),
        Some(&sana),
        Some(json!({ "title": "Mine now" })),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An unrelated manager cannot even learn the task exists.
    let (status, _) = send(&test.app, "GET", &format!("/tasks/{task_id}"), Some(&kiran), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&test.app, "DELETE", &format!("/tasks/{task_id}"), Some(&kiran), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn assignment_timestamps_stamp_keep_and_clear() -> Result<()> {
    let test = spawn_app().await?;
    let (admin, _) = register(&test.app, "Admin", "admin@example.com", "admin").await?;
    let (_, arjun_id) = register(&test.app, "Arjun", "arjun@example.com", "user").await?;

    let (_, body) = send(
        &test.app,
        "POST",
        "/tasks",
        Some(&admin),
        Some(json!({ "title": "Timestamp check" })),
    )
    .await?;
    let task_id = body["id"].as_str().unwrap().to_string();
    assert!(body["assigned_at"].is_null());

    // Assigning stamps.
    let (_, body) = send(
        &test.app,
        "PUT",
        &format!("/tasks/{task_id}"),
        Some(&admin),
        Some(json!({ "assigned_to": arjun_id })),
    )
    .await?;
    let stamped = body["assigned_at"].as_str().unwrap().to_string();

    // Re-saving the same assignee keeps the original stamp.
    let (_, body) = send(
        &test.app,
        "PUT",
        &format!("/tasks/{task_id}"),
        Some(&admin),
        Some(json!({ "assigned_to": arjun_id, "title": "Timestamp check 2" })),
    )
    .await?;
    assert_eq!(body["assigned_at"].as_str().unwrap(), stamped);

    // Unassigning clears assignee and stamp together.
    let (_, body) = send(
        &test.app,
        "PUT",
        &format!("/tasks/{task_id}"),
        Some(&admin),
        Some(json!({ "assigned_to": null })),
    )
    .await?;
    assert!(body["assigned_to"].is_null());
    assert!(body["assigned_at"].is_null());

    Ok(())
}

#[tokio::test]
async fn list_filters_and_calendar() -> Result<()> {
    let test = spawn_app().await?;
    let (admin, _) = register(&test.app, "Admin", "admin@example.com", "admin").await?;
    let (_, arjun_id) = register(&test.app, "Arjun", "arjun@example.com", "user").await?;

    for (title, due, assignee) in [
        ("Quarterly review", Some("2026-09-10"), Some(arjun_id)),
        ("Update handbook", Some("2026-10-02"), Some(arjun_id)),
        ("Desk move", None, None),
    ] {
        let mut payload = json!({ "title": title });
        if let Some(due) = due {
            payload["due_date"] = json!(due);
        }
        if let Some(assignee) = assignee {
            payload["assigned_to"] = json!(assignee);
        }
        let (status, _) = send(&test.app, "POST", "/tasks", Some(&admin), Some(payload)).await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = send(&test.app, "GET", "/tasks?search=handbook", Some(&admin), None).await?;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(
        &test.app,
        "GET",
        &format!("/tasks?assigned_to={arjun_id}"),
        Some(&admin),
        None,
    )
    .await?;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Unassigned and dateless, "Desk move" never reaches the calendar; the
    // window then narrows the remaining two down to one.
    let (_, body) = send(
        &test.app,
        "GET",
        "/tasks/calendar?start_date=2026-09-01&end_date=2026-09-30",
        Some(&admin),
        None,
    )
    .await?;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["title"], "Quarterly review");

    Ok(())
}
