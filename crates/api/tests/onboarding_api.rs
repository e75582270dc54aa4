//! HTTP-level integration tests for payment-gated onboarding, scoped reads,
//! the onboarding lifecycle, clinical assessments and simulated payments.

mod common;

use axum::http::StatusCode;
use axum::response::Response;
use common::{
    body_json, build_test_app, delete_auth, get_auth, post_auth, post_json_auth, put_json_auth,
    seed_payer, seed_user, seed_user_with_payer, token_for,
};
use careflow_db::models::payment::{CreateInsurance, CreateMpesaPayment};
use careflow_db::models::user::User;
use careflow_db::repositories::{InsuranceRepo, MpesaPaymentRepo};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Record an M-Pesa payment for `user`, optionally completing it.
async fn mpesa_payment(pool: &PgPool, user: &User, completed: bool) -> i64 {
    let payment = MpesaPaymentRepo::create(
        pool,
        &CreateMpesaPayment {
            user_id: user.id,
            phone_number: "0712345678".to_string(),
            amount: 1500,
            transaction_reference: format!("TEST{}-{}", user.id, uuid_suffix()),
        },
    )
    .await
    .unwrap();
    if completed {
        MpesaPaymentRepo::mark_completed(pool, payment.id).await.unwrap();
    }
    payment.id
}

fn uuid_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn onboarding_body(payment_id: i64) -> serde_json::Value {
    json!({
        "full_name": "Achieng Otieno",
        "date_of_birth": "1980-04-12",
        "gender": "female",
        "diagnoses": ["diabetes"],
        "payment_method": "mpesa",
        "payment_id": payment_id
    })
}

async fn create(pool: &PgPool, token: &str, body: serde_json::Value) -> Response {
    post_json_auth(build_test_app(pool.clone()), "/api/v1/onboardings", token, body).await
}

/// Self-onboard `user` with a fresh completed payment, returning the id.
async fn self_onboard(pool: &PgPool, user: &User) -> i64 {
    let payment_id = mpesa_payment(pool, user, true).await;
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/onboardings",
        &token_for(user),
        onboarding_body(payment_id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn onboarding_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM onboardings")
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn mpesa_back_reference(pool: &PgPool, payment_id: i64) -> Option<i64> {
    sqlx::query_scalar("SELECT onboarding_id FROM mpesa_payments WHERE id = $1")
        .bind(payment_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Creation and payment verification
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn self_onboarding_with_completed_mpesa_succeeds(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    let payment_id = mpesa_payment(&pool, &user, true).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/onboardings",
        &token_for(&user),
        onboarding_body(payment_id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let data = body_json(response).await["data"].clone();
    assert_eq!(data["user_id"], user.id);
    assert_eq!(data["payment_status"], "pending");
    assert_eq!(data["is_active"], false);
    assert_eq!(data["diagnoses"], json!(["diabetes"]));

    let onboarding_id = data["id"].as_i64().unwrap();
    assert_eq!(mpesa_back_reference(&pool, payment_id).await, Some(onboarding_id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pending_mpesa_payment_is_rejected_without_side_effects(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    let payment_id = mpesa_payment(&pool, &user, false).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/onboardings",
        &token_for(&user),
        onboarding_body(payment_id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BUSINESS_RULE_VIOLATION");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("payment_verification_failed"));

    assert_eq!(onboarding_count(&pool).await, 0);
    assert_eq!(mpesa_back_reference(&pool, payment_id).await, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn insurance_is_verified_by_existence(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    let token = token_for(&user);

    let mut body = onboarding_body(424_242);
    body["payment_method"] = json!("insurance");
    let response = create(&pool, &token, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(onboarding_count(&pool).await, 0);

    let insurance = InsuranceRepo::create(
        &pool,
        &CreateInsurance {
            user_id: user.id,
            provider: "NHIF".to_string(),
            policy_number: "POL-1".to_string(),
            member_number: None,
        },
    )
    .await
    .unwrap();

    let mut body = onboarding_body(insurance.id);
    body["payment_method"] = json!("insurance");
    let response = create(&pool, &token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["insurance_id"], insurance.id);

    let linked = InsuranceRepo::find_by_id(&pool, insurance.id).await.unwrap().unwrap();
    assert_eq!(linked.onboarding_id, data["id"].as_i64());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unsupported_payment_method_is_rejected(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    let mut body = onboarding_body(1);
    body["payment_method"] = json!("cash");

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/onboardings",
        &token_for(&user),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(onboarding_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_onboarding_for_same_user_is_400(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    self_onboard(&pool, &user).await;
    let payment_id = mpesa_payment(&pool, &user, true).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/onboardings",
        &token_for(&user),
        onboarding_body(payment_id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "User already has an onboarding");
    assert_eq!(onboarding_count(&pool).await, 1);
    assert_eq!(mpesa_back_reference(&pool, payment_id).await, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payment_backing_a_live_onboarding_cannot_be_reused(pool: PgPool) {
    let alice = seed_user(&pool, "alice", "user").await;
    let bob = seed_user(&pool, "bob", "user").await;
    let payment_id = mpesa_payment(&pool, &alice, true).await;

    let response = create(&pool, &token_for(&alice), onboarding_body(payment_id)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let alice_onboarding = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = create(&pool, &token_for(&bob), onboarding_body(payment_id)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["message"]
        .as_str()
        .unwrap()
        .starts_with("payment_verification_failed"));

    assert_eq!(onboarding_count(&pool).await, 1);
    assert_eq!(
        mpesa_back_reference(&pool, payment_id).await,
        Some(alice_onboarding)
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn restore_is_refused_once_payment_backs_another_onboarding(pool: PgPool) {
    let alice = seed_user(&pool, "alice", "user").await;
    let bob = seed_user(&pool, "bob", "user").await;
    let admin = seed_user(&pool, "admin", "admin").await;
    let payment_id = mpesa_payment(&pool, &alice, true).await;

    let response = create(&pool, &token_for(&alice), onboarding_body(payment_id)).await;
    let alice_onboarding = body_json(response).await["data"]["id"].as_i64().unwrap();
    delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/onboardings/{alice_onboarding}"),
        &token_for(&alice),
    )
    .await;

    let response = create(&pool, &token_for(&bob), onboarding_body(payment_id)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let bob_onboarding = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/onboardings/{alice_onboarding}/restore"),
        &token_for(&admin),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        mpesa_back_reference(&pool, payment_id).await,
        Some(bob_onboarding)
    );

    let deleted: Option<chrono::DateTime<chrono::Utc>> =
        sqlx::query_scalar("SELECT deleted_at FROM onboardings WHERE id = $1")
            .bind(alice_onboarding)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(deleted.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn navigator_onboards_on_behalf_of_patient(pool: PgPool) {
    let patient = seed_user(&pool, "patient", "user").await;
    let navigator = seed_user(&pool, "navigator", "navigator").await;
    let payment_id = mpesa_payment(&pool, &patient, true).await;
    let token = token_for(&navigator);

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/onboardings",
        &token,
        onboarding_body(payment_id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = onboarding_body(payment_id);
    body["user_id"] = json!(patient.id);
    let response = create(&pool, &token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["user_id"], patient.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inactive_or_approver_creators_are_403(pool: PgPool) {
    let inactive = seed_user(&pool, "inactive", "user").await;
    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(inactive.id)
        .execute(&pool)
        .await
        .unwrap();
    let chair = seed_user(&pool, "chair", "chair").await;
    let payment_id = mpesa_payment(&pool, &inactive, true).await;

    for user in [&inactive, &chair] {
        let response = post_json_auth(
            build_test_app(pool.clone()),
            "/api/v1/onboardings",
            &token_for(user),
            onboarding_body(payment_id),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    assert_eq!(onboarding_count(&pool).await, 0);
}

// ---------------------------------------------------------------------------
// Scoped reads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn payer_without_affiliation_is_403_everywhere(pool: PgPool) {
    let payer = seed_user(&pool, "payer", "payer").await;
    let patient = seed_user(&pool, "patient", "user").await;
    let onboarding_id = self_onboard(&pool, &patient).await;
    let token = token_for(&payer);

    for uri in [
        "/api/v1/onboardings".to_string(),
        format!("/api/v1/onboardings/{onboarding_id}"),
        format!("/api/v1/users/{}/onboarding", patient.id),
    ] {
        let response = get_auth(build_test_app(pool.clone()), &uri, &token).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body_json(response).await["message"], "payer_id not set");
    }

    let payment_id = mpesa_payment(&pool, &patient, true).await;
    let mut body = onboarding_body(payment_id);
    body["user_id"] = json!(patient.id);
    let response = create(&pool, &token, body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/onboardings/{onboarding_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payer_sees_only_own_payers_onboardings(pool: PgPool) {
    let payer_a = seed_payer(&pool, "Payer A").await;
    let payer_b = seed_payer(&pool, "Payer B").await;
    let payer_user = seed_user_with_payer(&pool, "payer-a", "payer", Some(payer_a)).await;
    let navigator = seed_user(&pool, "navigator", "navigator").await;

    let mut ids = Vec::new();
    for (name, payer) in [("p1", payer_a), ("p2", payer_b)] {
        let patient = seed_user(&pool, name, "user").await;
        let payment_id = mpesa_payment(&pool, &patient, true).await;
        let mut body = onboarding_body(payment_id);
        body["user_id"] = json!(patient.id);
        body["payer_id"] = json!(payer);
        let response = post_json_auth(
            build_test_app(pool.clone()),
            "/api/v1/onboardings",
            &token_for(&navigator),
            body,
        )
        .await;
        ids.push(body_json(response).await["data"]["id"].as_i64().unwrap());
    }

    let token = token_for(&payer_user);
    let response = get_auth(build_test_app(pool.clone()), "/api/v1/onboardings", &token).await;
    let listed: Vec<i64> = body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert_eq!(listed, vec![ids[0]]);

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/onboardings/{}", ids[1]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/v1/onboardings",
        &token_for(&navigator),
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payer_creation_is_pinned_to_own_affiliation(pool: PgPool) {
    let payer_a = seed_payer(&pool, "Payer A").await;
    let payer_b = seed_payer(&pool, "Payer B").await;
    let payer_user = seed_user_with_payer(&pool, "payer-a", "payer", Some(payer_a)).await;
    let patient = seed_user(&pool, "patient", "user").await;
    let payment_id = mpesa_payment(&pool, &patient, true).await;
    let token = token_for(&payer_user);

    let mut body = onboarding_body(payment_id);
    body["user_id"] = json!(patient.id);
    body["payer_id"] = json!(payer_b);
    let response = create(&pool, &token, body.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    body["payer_id"] = serde_json::Value::Null;
    let response = create(&pool, &token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["payer_id"], payer_a);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn users_see_only_their_own(pool: PgPool) {
    let alice = seed_user(&pool, "alice", "user").await;
    let bob = seed_user(&pool, "bob", "user").await;
    let alice_onboarding = self_onboard(&pool, &alice).await;

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/onboardings/{alice_onboarding}"),
        &token_for(&bob),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/users/{}/onboarding", alice.id),
        &token_for(&alice),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], alice_onboarding);

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/v1/onboardings",
        &token_for(&bob),
    )
    .await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn approver_roles_have_no_onboarding_access(pool: PgPool) {
    let treasurer = seed_user(&pool, "treasurer", "treasurer").await;
    let response = get_auth(
        build_test_app(pool),
        "/api/v1/onboardings",
        &token_for(&treasurer),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn complete_activates_once(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    let id = self_onboard(&pool, &user).await;
    let uri = format!("/api/v1/onboardings/{id}/complete");

    let response = post_auth(build_test_app(pool.clone()), &uri, &token_for(&user)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["payment_status"], "completed");
    assert_eq!(data["is_active"], true);

    let response = post_auth(build_test_app(pool.clone()), &uri, &token_for(&user)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payment_status_changes_are_staff_only(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    let navigator = seed_user(&pool, "navigator", "navigator").await;
    let id = self_onboard(&pool, &user).await;
    let uri = format!("/api/v1/onboardings/{id}");

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &token_for(&user),
        json!({ "payment_status": "approved" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &token_for(&user),
        json!({ "full_name": "Achieng O.", "diagnoses": ["obesity"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["full_name"], "Achieng O.");
    assert_eq!(data["is_active"], false);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &token_for(&navigator),
        json!({ "payment_status": "approved" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["payment_status"], "approved");
    assert_eq!(data["is_active"], true);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &token_for(&navigator),
        json!({ "payment_status": "pending" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_diagnosis_is_422(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    let payment_id = mpesa_payment(&pool, &user, true).await;
    let mut body = onboarding_body(payment_id);
    body["diagnoses"] = json!(["asthma"]);

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/onboardings",
        &token_for(&user),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(onboarding_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_releases_payment_and_restore_relinks(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    let admin = seed_user(&pool, "admin", "admin").await;
    let payment_id = mpesa_payment(&pool, &user, true).await;
    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/onboardings",
        &token_for(&user),
        onboarding_body(payment_id),
    )
    .await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/onboardings/{id}"),
        &token_for(&user),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mpesa_back_reference(&pool, payment_id).await, None);

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/onboardings/{id}"),
        &token_for(&admin),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let restore = format!("/api/v1/onboardings/{id}/restore");
    let response = post_auth(build_test_app(pool.clone()), &restore, &token_for(&user)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_auth(build_test_app(pool.clone()), &restore, &token_for(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"]["deleted_at"].is_null());
    assert_eq!(mpesa_back_reference(&pool, payment_id).await, Some(id));

    let response = post_auth(build_test_app(pool.clone()), &restore, &token_for(&admin)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn restore_after_reonboarding_is_400(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    let admin = seed_user(&pool, "admin", "admin").await;
    let first = self_onboard(&pool, &user).await;
    delete_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/onboardings/{first}"),
        &token_for(&user),
    )
    .await;
    self_onboard(&pool, &user).await;

    let response = post_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/onboardings/{first}/restore"),
        &token_for(&admin),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "User already has an onboarding");
}

// ---------------------------------------------------------------------------
// Assessments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn assessments_require_approval_and_diagnosis_fields(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    let navigator = seed_user(&pool, "navigator", "navigator").await;
    let id = self_onboard(&pool, &user).await;
    let uri = format!("/api/v1/onboardings/{id}/assessments");
    let token = token_for(&navigator);

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &token,
        json!({ "kind": "weekly", "blood_glucose": 6.1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    put_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/onboardings/{id}"),
        &token,
        json!({ "payment_status": "approved", "diagnoses": ["diabetes", "obesity"] }),
    )
    .await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &token,
        json!({ "kind": "weekly", "weight_kg": 90.0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert!(json["errors"]["blood_glucose"].is_array());
    assert!(json["errors"]["height_cm"].is_array());
    assert!(json["errors"]["weight_kg"].is_null());

    let response = post_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &token,
        json!({
            "kind": "three_monthly",
            "blood_glucose": 6.1,
            "weight_kg": 90.0,
            "height_cm": 180.0
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["bmi"], 27.8);
    assert_eq!(data["kind"], "three_monthly");

    let response = get_auth(build_test_app(pool.clone()), &uri, &token_for(&user)).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Simulated payments
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn mpesa_payment_is_recorded_then_confirmed(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    let stranger = seed_user(&pool, "stranger", "user").await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/payments/mpesa",
        &token_for(&user),
        json!({ "phone_number": "0712345678", "amount": 2500 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["status"], "pending");
    assert!(data["transaction_reference"].as_str().unwrap().starts_with("SIM"));
    let id = data["id"].as_i64().unwrap();
    let confirm = format!("/api/v1/payments/mpesa/{id}/confirm");

    let response = post_auth(build_test_app(pool.clone()), &confirm, &token_for(&stranger)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_auth(build_test_app(pool.clone()), &confirm, &token_for(&user)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "completed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_positive_amount_is_422(pool: PgPool) {
    let user = seed_user(&pool, "patient", "user").await;
    let response = post_json_auth(
        build_test_app(pool),
        "/api/v1/payments/mpesa",
        &token_for(&user),
        json!({ "phone_number": "0712345678", "amount": 0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["errors"]["amount"].is_array());
}
