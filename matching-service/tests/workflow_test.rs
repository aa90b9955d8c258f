mod common;

use axum::http::StatusCode;
use common::{message_of, test_config, TestApp};
use matching_service::services::MockSmsProvider;
use serde_json::json;

fn ids(list: &serde_json::Value, field: &str) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|entry| entry[field].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_apply_approve_terminate_round_trip() {
    let app = TestApp::spawn();
    let jane_token = app.signup_volunteer("Jane", "jdoe", "555-1234").await;
    let acme_token = app.signup_company("Acme").await;
    let jane = app.volunteer_for(&jane_token).await;
    let acme = app.company_for(&acme_token).await;

    let (status, body) = app
        .put("/volunteer/apply", &jane_token, json!({ "companyId": acme.id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["pendingCompanies"], "companyId"), vec![acme.id.clone()]);
    assert_eq!(body["activeCompanies"], json!([]));

    let (_, body) = app.get("/company/pending", &acme_token).await;
    assert_eq!(ids(&body["pendingVolunteers"], "volunteerId"), vec![jane.id.clone()]);

    let (status, body) = app
        .put("/company/approve", &acme_token, json!({ "volunteerId": jane.id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["sid"].is_string());
    assert_eq!(body["pendingVolunteers"], json!([]));
    assert_eq!(ids(&body["activeVolunteers"], "volunteerId"), vec![jane.id.clone()]);

    let sent = app.sms.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "555-1234");
    assert!(sent[0].body.contains("Jane"));
    assert!(sent[0].body.contains("Acme"));

    let (_, body) = app.get("/volunteer/active", &jane_token).await;
    assert_eq!(ids(&body["activeCompanies"], "companyId"), vec![acme.id.clone()]);
    let (_, body) = app.get("/volunteer/pending", &jane_token).await;
    assert_eq!(body["pendingCompanies"], json!([]));

    let (status, body) = app
        .put("/company/terminate", &acme_token, json!({ "volunteerId": jane.id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pendingVolunteers"], json!([]));
    assert_eq!(body["activeVolunteers"], json!([]));

    let (_, body) = app.get("/volunteer/active", &jane_token).await;
    assert_eq!(body["activeCompanies"], json!([]));
}

#[tokio::test]
async fn test_duplicate_application_conflicts() {
    let app = TestApp::spawn();
    let jane_token = app.signup_volunteer("Jane", "jdoe", "555-1234").await;
    let acme_token = app.signup_company("Acme").await;
    let jane = app.volunteer_for(&jane_token).await;
    let acme = app.company_for(&acme_token).await;

    let (status, _) = app
        .put("/volunteer/apply", &jane_token, json!({ "companyId": acme.id }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .put("/volunteer/apply", &jane_token, json!({ "companyId": acme.id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(message_of(&body).contains("duplicate volunteer."));

    app.put("/company/approve", &acme_token, json!({ "volunteerId": jane.id }))
        .await;
    let (status, _) = app
        .put("/volunteer/apply", &jane_token, json!({ "companyId": acme.id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.get("/company/pending", &acme_token).await;
    assert_eq!(body["pendingVolunteers"], json!([]));
}

#[tokio::test]
async fn test_approving_active_volunteer_is_not_found() {
    let app = TestApp::spawn();
    let jane_token = app.signup_volunteer("Jane", "jdoe", "555-1234").await;
    let acme_token = app.signup_company("Acme").await;
    let jane = app.volunteer_for(&jane_token).await;
    let acme = app.company_for(&acme_token).await;

    app.put("/volunteer/apply", &jane_token, json!({ "companyId": acme.id }))
        .await;
    let (status, _) = app
        .put("/company/approve", &acme_token, json!({ "volunteerId": jane.id }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .put("/company/approve", &acme_token, json!({ "volunteerId": jane.id }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.sms.sent().len(), 1);
}

#[tokio::test]
async fn test_terminate_and_leave_are_idempotent() {
    let app = TestApp::spawn();
    let jane_token = app.signup_volunteer("Jane", "jdoe", "555-1234").await;
    let acme_token = app.signup_company("Acme").await;
    let jane = app.volunteer_for(&jane_token).await;
    let acme = app.company_for(&acme_token).await;

    for _ in 0..2 {
        let (status, body) = app
            .put("/company/terminate", &acme_token, json!({ "volunteerId": jane.id }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["activeVolunteers"], json!([]));
    }

    app.put("/volunteer/apply", &jane_token, json!({ "companyId": acme.id }))
        .await;
    for _ in 0..2 {
        let (status, body) = app
            .put("/volunteer/leave", &jane_token, json!({ "companyId": acme.id }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pendingCompanies"], json!([]));
        assert_eq!(body["activeCompanies"], json!([]));
    }

    let (_, body) = app.get("/company/pending", &acme_token).await;
    assert_eq!(body["pendingVolunteers"], json!([]));
}

#[tokio::test]
async fn test_leave_withdraws_active_engagement() {
    let app = TestApp::spawn();
    let jane_token = app.signup_volunteer("Jane", "jdoe", "555-1234").await;
    let acme_token = app.signup_company("Acme").await;
    let jane = app.volunteer_for(&jane_token).await;
    let acme = app.company_for(&acme_token).await;

    app.put("/volunteer/apply", &jane_token, json!({ "companyId": acme.id }))
        .await;
    app.put("/company/approve", &acme_token, json!({ "volunteerId": jane.id }))
        .await;

    let (status, body) = app
        .put("/volunteer/leave", &jane_token, json!({ "companyId": acme.id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activeCompanies"], json!([]));

    let (_, body) = app.get("/company/active", &acme_token).await;
    assert_eq!(body["activeVolunteers"], json!([]));
}

#[tokio::test]
async fn test_deleting_company_cascades_to_volunteers() {
    let app = TestApp::spawn();
    let jane_token = app.signup_volunteer("Jane", "jdoe", "555-1234").await;
    let john_token = app.signup_volunteer("John", "jsmith", "555-5678").await;
    let acme_token = app.signup_company("Acme").await;
    let globex_token = app.signup_company("Globex").await;
    let jane = app.volunteer_for(&jane_token).await;
    let acme = app.company_for(&acme_token).await;
    let globex = app.company_for(&globex_token).await;

    app.put("/volunteer/apply", &jane_token, json!({ "companyId": acme.id }))
        .await;
    app.put("/volunteer/apply", &jane_token, json!({ "companyId": globex.id }))
        .await;
    app.put("/volunteer/apply", &john_token, json!({ "companyId": acme.id }))
        .await;
    app.put("/company/approve", &acme_token, json!({ "volunteerId": jane.id }))
        .await;

    let (status, _) = app.delete("/company/delete", &acme_token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get("/volunteer/active", &jane_token).await;
    assert_eq!(body["activeCompanies"], json!([]));
    let (_, body) = app.get("/volunteer/pending", &jane_token).await;
    assert_eq!(ids(&body["pendingCompanies"], "companyId"), vec![globex.id.clone()]);
    let (_, body) = app.get("/volunteer/pending", &john_token).await;
    assert_eq!(body["pendingCompanies"], json!([]));

    let (_, body) = app.get("/volunteer/opportunities", &jane_token).await;
    assert_eq!(ids(&body["companies"], "companyId"), vec![globex.id.clone()]);

    let (status, _) = app.get("/company/pending", &acme_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleting_volunteer_cascades_to_companies() {
    let app = TestApp::spawn();
    let jane_token = app.signup_volunteer("Jane", "jdoe", "555-1234").await;
    let acme_token = app.signup_company("Acme").await;
    let jane = app.volunteer_for(&jane_token).await;
    let acme = app.company_for(&acme_token).await;

    app.put("/volunteer/apply", &jane_token, json!({ "companyId": acme.id }))
        .await;
    app.put("/company/approve", &acme_token, json!({ "volunteerId": jane.id }))
        .await;

    let (status, _) = app.delete("/volunteer/delete", &jane_token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get("/company/active", &acme_token).await;
    assert_eq!(body["activeVolunteers"], json!([]));
}

#[tokio::test]
async fn test_failed_sms_still_approves() {
    let app = TestApp::build(test_config(), MockSmsProvider::failing());
    let jane_token = app.signup_volunteer("Jane", "jdoe", "555-1234").await;
    let acme_token = app.signup_company("Acme").await;
    let jane = app.volunteer_for(&jane_token).await;
    let acme = app.company_for(&acme_token).await;

    app.put("/volunteer/apply", &jane_token, json!({ "companyId": acme.id }))
        .await;
    let (status, body) = app
        .put("/company/approve", &acme_token, json!({ "volunteerId": jane.id }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["sid"].is_null());
    assert_eq!(ids(&body["activeVolunteers"], "volunteerId"), vec![jane.id.clone()]);

    let (_, body) = app.get("/volunteer/active", &jane_token).await;
    assert_eq!(ids(&body["activeCompanies"], "companyId"), vec![acme.id]);
}
