mod common;

use axum::http::{Method, StatusCode};
use common::{test_config, TestApp, FIXED_OTP, PASSWORD};
use rstest::rstest;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;
use storefront_api::auth::user;

async fn signup(app: &TestApp, phone: &str, email: Option<&str>) -> serde_json::Value {
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup/otp",
            Some(json!({"phone": phone, "full_name": "Asha Rao"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup/verify",
            Some(json!({"phone": phone, "otp": FIXED_OTP})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup/complete",
            Some(json!({"phone": phone, "password": PASSWORD, "email": email})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body
}

#[tokio::test]
async fn signup_issues_tokens_and_creates_a_customer() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup/otp",
            Some(json!({"phone": "9123456780", "full_name": "Asha Rao"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "OTP generated successfully");
    assert!(body["expires_in"].as_u64().unwrap() > 0);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup/verify",
            Some(json!({"phone": "9123456780", "otp": FIXED_OTP})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], true);
    assert_eq!(body["full_name"], "Asha Rao");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup/complete",
            Some(json!({"phone": "9123456780", "password": PASSWORD, "email": "asha@example.com"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Account created successfully");
    let token = body["access_token"].as_str().unwrap().to_string();
    assert!(body["refresh_token"].as_str().is_some());
    assert_eq!(body["user"]["email"], "asha@example.com");

    let (status, body) = app
        .json(Method::GET, "/api/v1/me/companies", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    let companies = body["companies"].as_array().unwrap();
    assert_eq!(companies.len(), 1);
    assert_eq!(companies[0]["role"], "Admin");
    assert_eq!(companies[0]["type"], "Customer");

    // Welcome mail goes to real addresses only.
    assert!(app
        .mailer
        .sent()
        .iter()
        .any(|mail| mail.to == "asha@example.com"));
}

#[tokio::test]
async fn signup_without_email_can_log_in_by_phone() {
    let app = TestApp::new().await;
    signup(&app, "9123456781", None).await;

    let token = app.login("9123456781", PASSWORD).await;
    let (status, body) = app.json(Method::GET, "/api/v1/auth/me", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["phone"], "9123456781");
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn registered_phone_cannot_sign_up_again() {
    let app = TestApp::new().await;
    app.create_user("taken@example.com", "9000000001").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup/otp",
            Some(json!({"phone": "9000000001", "full_name": "Someone Else"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Phone number already registered");
}

#[tokio::test]
async fn completing_signup_requires_a_verified_phone() {
    let app = TestApp::new().await;
    app.json(
        Method::POST,
        "/api/v1/auth/signup/otp",
        Some(json!({"phone": "9123456782", "full_name": "Asha Rao"})),
        None,
    )
    .await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup/complete",
            Some(json!({"phone": "9123456782", "password": PASSWORD})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Phone verification required");
}

#[tokio::test]
async fn otp_locks_after_too_many_wrong_guesses() {
    let mut cfg = test_config();
    cfg.otp_max_attempts = 3;
    let app = TestApp::with_config(cfg).await;

    app.json(
        Method::POST,
        "/api/v1/auth/signup/otp",
        Some(json!({"phone": "9123456783", "full_name": "Asha Rao"})),
        None,
    )
    .await;

    for _ in 0..3 {
        let (status, body) = app
            .json(
                Method::POST,
                "/api/v1/auth/signup/verify",
                Some(json!({"phone": "9123456783", "otp": "000000"})),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid OTP");
    }

    // Even the right code is refused once locked.
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup/verify",
            Some(json!({"phone": "9123456783", "otp": FIXED_OTP})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Too many attempts. Request a new OTP");
}

#[tokio::test]
async fn verifying_without_an_otp_reports_expiry() {
    let app = TestApp::new().await;
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/signup/verify",
            Some(json!({"phone": "9123456784", "otp": FIXED_OTP})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "OTP expired or invalid");
}

#[tokio::test]
async fn resends_are_limited() {
    let mut cfg = test_config();
    cfg.otp_resend_limit_per_hour = 2;
    let app = TestApp::with_config(cfg).await;

    let send = json!({"phone": "9123456785", "full_name": "Asha Rao"});
    let (status, _) = app
        .json(Method::POST, "/api/v1/auth/signup/otp", Some(send), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let resend = json!({"phone": "9123456785"});
    for _ in 0..2 {
        let (status, _) = app
            .json(Method::POST, "/api/v1/auth/signup/resend", Some(resend.clone()), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app
        .json(Method::POST, "/api/v1/auth/signup/resend", Some(resend), None)
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body["message"],
        "OTP resend limit exceeded. Please try again after some time."
    );
}

#[rstest]
#[case(json!({"phone": "98765", "full_name": "Asha Rao"}), "phone")]
#[case(json!({"phone": "98765abcde", "full_name": "Asha Rao"}), "phone")]
#[case(json!({"phone": "9876543210", "full_name": "A"}), "full_name")]
#[tokio::test]
async fn malformed_signup_requests_are_rejected(#[case] body: serde_json::Value, #[case] field: &str) {
    let app = TestApp::new().await;
    let (status, body) = app
        .json(Method::POST, "/api/v1/auth/signup/otp", Some(body), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    let errors = body["validation_errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["field"] == field), "{}", body);
}

#[tokio::test]
async fn login_accepts_email_or_phone() {
    let app = TestApp::new().await;
    app.create_user("buyer@example.com", "9000000002").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"username": "buyer@example.com", "password": PASSWORD})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["token_type"], "Bearer");

    app.login("9000000002", PASSWORD).await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"username": "9000000002", "password": "Wrong!Pass1"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials, incorrect password");
}

#[tokio::test]
async fn disabled_users_cannot_log_in() {
    let app = TestApp::new().await;
    let (user_id, _) = app.create_user("gone@example.com", "9000000003").await;

    let existing = user::Entity::find_by_id(user_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    let mut model: user::ActiveModel = existing.into();
    model.enabled = Set(false);
    model.update(&*app.state.db).await.unwrap();

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"username": "gone@example.com", "password": PASSWORD})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "User account is disabled");
}

#[tokio::test]
async fn logout_revokes_the_refresh_token() {
    let app = TestApp::new().await;
    app.create_user("leaver@example.com", "9000000004").await;

    let (_, session) = app
        .json(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"username": "leaver@example.com", "password": PASSWORD})),
            None,
        )
        .await;
    let access = session["access_token"].as_str().unwrap();
    let refresh = session["refresh_token"].as_str().unwrap();

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/refresh",
            Some(json!({"refresh_token": refresh})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].as_str().is_some());

    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/auth/logout",
            Some(json!({"refresh_token": refresh})),
            Some(access),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/refresh",
            Some(json!({"refresh_token": refresh})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token");
}

#[tokio::test]
async fn access_tokens_are_not_refresh_tokens() {
    let app = TestApp::new().await;
    let account = app.account("mixup@example.com", "9000000005").await;

    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/auth/refresh",
            Some(json!({"refresh_token": account.token})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = TestApp::new().await;
    let (status, _) = app.json(Method::GET, "/api/v1/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .json(Method::GET, "/api/v1/auth/me", None, Some("not-a-token"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_validation_reports_both_outcomes() {
    let app = TestApp::new().await;
    let account = app.account("check@example.com", "9000000006").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/validate",
            Some(json!({"token": account.token})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["email"], "check@example.com");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/validate",
            Some(json!({"token": "definitely-not-a-jwt"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn password_reset_by_phone() {
    let app = TestApp::new().await;
    app.create_user("forgetful@example.com", "9000000007").await;

    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/auth/password/forgot",
            Some(json!({"phone": "9000000007"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let reset_mail = app
        .mailer
        .sent()
        .into_iter()
        .find(|mail| mail.to == "forgetful@example.com")
        .expect("reset OTP mail");
    assert!(reset_mail.text_body.contains(FIXED_OTP));

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/password/verify-otp",
            Some(json!({"identifier": "9000000007", "otp": FIXED_OTP})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let reset_token = body["reset_token"].as_str().unwrap().to_string();

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/password/reset",
            Some(json!({
                "reset_token": reset_token,
                "new_password": "N3w!Password",
                "confirm_password": "N3w!Password",
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Password reset successfully");

    app.login("forgetful@example.com", "N3w!Password").await;

    // The token is single use.
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/password/reset",
            Some(json!({
                "reset_token": reset_token,
                "new_password": "An0ther!Pass",
                "confirm_password": "An0ther!Pass",
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired reset token");
}

#[tokio::test]
async fn forgot_password_for_unknown_phone_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/password/forgot",
            Some(json!({"phone": "9999999999"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No account found with this phone number");
}

async fn verify_reset(app: &TestApp, identifier: &str) -> String {
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/password/verify-otp",
            Some(json!({"identifier": identifier, "otp": FIXED_OTP})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["reset_token"].as_str().unwrap().to_string()
}

async fn reset_with(app: &TestApp, token: &str, password: &str) -> (StatusCode, serde_json::Value) {
    app.json(
        Method::POST,
        "/api/v1/auth/password/reset",
        Some(json!({
            "reset_token": token,
            "new_password": password,
            "confirm_password": password,
        })),
        None,
    )
    .await
}

#[tokio::test]
async fn password_reset_by_email() {
    let app = TestApp::new().await;
    app.create_user("mailer@example.com", "9000000017").await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/password/forgot",
            Some(json!({"email": "mailer@example.com"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "OTP generated successfully");

    let token = verify_reset(&app, "mailer@example.com").await;
    let (status, body) = reset_with(&app, &token, "N3w!Password").await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["user_email"], "mailer@example.com");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"username": "mailer@example.com", "password": PASSWORD})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials, incorrect password");
    app.login("mailer@example.com", "N3w!Password").await;
}

#[tokio::test]
async fn forgot_password_for_unknown_email_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/password/forgot",
            Some(json!({"email": "nobody@example.com"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No account found with this email address");
}

#[tokio::test]
async fn only_the_latest_reset_token_is_redeemable() {
    let app = TestApp::new().await;
    app.create_user("twice@example.com", "9000000018").await;
    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/auth/password/forgot",
            Some(json!({"phone": "9000000018"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let first = verify_reset(&app, "9000000018").await;
    let second = verify_reset(&app, "9000000018").await;
    assert_ne!(first, second);

    // Verifying again retired the first token.
    let (status, body) = reset_with(&app, &first, "F1rst!Pass").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired reset token");

    let (status, body) = reset_with(&app, &second, "Sec0nd!Pass").await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    // Nothing issued for this request survives the reset.
    for token in [&first, &second] {
        let (status, _) = reset_with(&app, token, "Th1rd!Pass").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    app.login("twice@example.com", "Sec0nd!Pass").await;
}

#[tokio::test]
async fn login_with_otp() {
    let app = TestApp::new().await;
    app.create_user("otp@example.com", "9000000008").await;

    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/auth/login-otp/send",
            Some(json!({"phone": "9000000008"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/login-otp/verify",
            Some(json!({"phone": "9000000008", "otp": FIXED_OTP})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    let token = body["access_token"].as_str().unwrap();

    let (status, body) = app.json(Method::GET, "/api/v1/auth/me", None, Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "otp@example.com");

    // The code is consumed by a successful login.
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/auth/login-otp/verify",
            Some(json!({"phone": "9000000008", "otp": FIXED_OTP})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "OTP expired");
}
