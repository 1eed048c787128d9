mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{create_profile, register, send, set_manager, spawn_app};

#[tokio::test]
async fn final_pay_is_computed_when_omitted() -> Result<()> {
    let test = spawn_app().await?;
    let (admin, _) = register(&test.app, "Admin", "admin@example.com", "admin").await?;
    let (_, arjun_id) = register(&test.app, "Arjun", "arjun@example.com", "user").await?;
    // create_profile seeds base_salary = 6_000_000 minor units.
    let profile = create_profile(&test.app, &admin, arjun_id, "EMP-0001").await?;

    let (status, body) = send(
        &test.app,
        "POST",
        "/payroll",
        Some(&admin),
        Some(json!({
            "employee_id": profile,
            "month": 8,
            "year": 2026,
            "days_worked": 22,
            "deductions": 50_000,
            "bonuses": 100_000,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    // 6_000_000 / 30 * 22 - 50_000 + 100_000
    assert_eq!(body["final_pay"], 4_450_000);
    assert_eq!(body["base_salary"], 6_000_000);
    assert_eq!(body["status"], "draft");

    // An explicit non-zero final_pay wins over the formula.
    let id = body["id"].as_str().unwrap().to_string();
    let (status, body) = send(
        &test.app,
        "PUT",
        &format!("/payroll/{id}"),
        Some(&admin),
        Some(json!({ "final_pay": 4_000_000, "status": "processed" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["final_pay"], 4_000_000);
    assert_eq!(body["status"], "processed");

    Ok(())
}

#[tokio::test]
async fn one_payroll_per_employee_month() -> Result<()> {
    let test = spawn_app().await?;
    let (admin, _) = register(&test.app, "Admin", "admin@example.com", "admin").await?;
    let (_, arjun_id) = register(&test.app, "Arjun", "arjun@example.com", "user").await?;
    let profile = create_profile(&test.app, &admin, arjun_id, "EMP-0001").await?;

    let payload = json!({ "employee_id": profile, "month": 8, "year": 2026, "days_worked": 20 });
    let (status, _) = send(&test.app, "POST", "/payroll", Some(&admin), Some(payload.clone())).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&test.app, "POST", "/payroll", Some(&admin), Some(payload)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &test.app,
        "POST",
        "/payroll",
        Some(&admin),
        Some(json!({ "employee_id": profile, "month": 13, "year": 2026 })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn payroll_scope_mirrors_attendance() -> Result<()> {
    let test = spawn_app().await?;
    let (admin, _) = register(&test.app, "Admin", "admin@example.com", "admin").await?;
    let (meera, meera_id) = register(&test.app, "Meera", "meera@example.com", "manager").await?;
    let (_, rohit_id) = register(&test.app, "Rohit", "rohit@example.com", "manager").await?;
    let (arjun, arjun_id) = register(&test.app, "Arjun", "arjun@example.com", "user").await?;
    let (_, sana_id) = register(&test.app, "Sana", "sana@example.com", "user").await?;
    set_manager(&test.app, &admin, arjun_id, meera_id).await?;
    set_manager(&test.app, &admin, sana_id, rohit_id).await?;
    let arjun_profile = create_profile(&test.app, &admin, arjun_id, "EMP-0001").await?;
    let sana_profile = create_profile(&test.app, &admin, sana_id, "EMP-0002").await?;

    // Plain users are locked out of payroll entirely, their own included.
    let (status, _) = send(&test.app, "GET", "/payroll", Some(&arjun), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Manager creation is unscoped, like attendance.
    let (status, body) = send(
        &test.app,
        "POST",
        "/payroll",
        Some(&meera),
        Some(json!({ "employee_id": sana_profile, "month": 8, "year": 2026, "days_worked": 20 })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let foreign_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = send(&test.app, "GET", &format!("/payroll/{foreign_id}"), Some(&meera), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(
        &test.app,
        "POST",
        "/payroll",
        Some(&meera),
        Some(json!({ "employee_id": arjun_profile, "month": 8, "year": 2026, "days_worked": 21 })),
    )
    .await?;
    let team_id = body["id"].as_str().unwrap().to_string();

    let (_, body) = send(&test.app, "GET", "/payroll?month=8&year=2026", Some(&meera), None).await?;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"].as_str().unwrap(), team_id);

    let (status, _) = send(&test.app, "DELETE", &format!("/payroll/{team_id}"), Some(&meera), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    Ok(())
}
