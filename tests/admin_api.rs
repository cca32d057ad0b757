mod support;

use std::num::NonZeroUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode, header::RETRY_AFTER};
use namngam::application::api_keys::ApiKeyService;
use namngam::config::RateLimitSettings;
use namngam::domain::api_keys::ApiScope;
use namngam::rate_limit::RateLimitBudget;
use serde_json::json;

use support::{TestApp, authed_get, contact_settings, faq, json_request, product};

const ALL_SCOPES: &[ApiScope] = &[
    ApiScope::ContentWrite,
    ApiScope::SettingsWrite,
    ApiScope::DashboardRead,
];

fn article_body(title_en: &str) -> serde_json::Value {
    json!({
        "title": { "lo": "ພະລັງຫີນ", "en": title_en },
        "content": { "lo": "<p>ເນື້ອຫາ</p><script>alert(1)</script>" },
        "excerpt": { "lo": "ສະຫຼຸບ" },
        "is_published": true
    })
}

#[tokio::test]
async fn admin_routes_require_a_key() {
    let app = TestApp::new();

    let response = app
        .send(
            Request::get("/api/admin/dashboard")
                .body(Body::empty())
                .expect("request"),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.error_code(), "unauthorized");

    let garbage = app.send(authed_get("/api/admin/dashboard", "nk_nope")).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_scope_is_forbidden() {
    let app = TestApp::new();
    let token = app.issue_token(&[ApiScope::ContentWrite]).await;

    let response = app.send(authed_get("/api/admin/dashboard", &token)).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "forbidden");
    assert_eq!(response.body["error"]["hint"], "dashboard_read");
}

#[tokio::test]
async fn revoked_keys_are_rejected() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;
    let key_id = app.store.keys.lock().await[0].id;
    ApiKeyService::new(app.store.clone())
        .revoke(key_id)
        .await
        .expect("revoke");

    let response = app.send(authed_get("/api/admin/dashboard", &token)).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "revoked");
}

#[tokio::test]
async fn login_verifies_the_key() {
    let app = TestApp::new();
    let token = app.issue_token(&[ApiScope::DashboardRead]).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/admin/login",
            None,
            json!({ "api_key": token }),
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["name"], "editor");
    assert_eq!(response.data()["scopes"][0], "dashboard_read");
}

#[tokio::test]
async fn sixth_login_attempt_is_rate_limited() {
    let app = TestApp::new();
    let token = app.issue_token(&[ApiScope::DashboardRead]).await;

    for _ in 0..5 {
        let response = app
            .send(json_request(
                "POST",
                "/api/admin/login",
                None,
                json!({ "api_key": "nk_wrong_guess" }),
            ))
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let response = app
        .send(json_request(
            "POST",
            "/api/admin/login",
            None,
            json!({ "api_key": token }),
        ))
        .await;

    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.error_code(), "rate_limited");
    assert_eq!(
        response
            .headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok()),
        Some("900")
    );
}

fn login_from(forwarded_for: &'static str) -> Request<Body> {
    let mut request = json_request(
        "POST",
        "/api/admin/login",
        None,
        json!({ "api_key": "nk_wrong_guess" }),
    );
    request
        .headers_mut()
        .insert("x-forwarded-for", HeaderValue::from_static(forwarded_for));
    request
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_login_budget() {
    let app = TestApp::new();
    let spoofed = [
        "198.51.100.1",
        "198.51.100.2",
        "198.51.100.3",
        "198.51.100.4",
        "198.51.100.5",
        "198.51.100.6",
    ];

    let mut statuses = Vec::new();
    for address in spoofed {
        statuses.push(app.send(login_from(address)).await.status);
    }

    assert_eq!(statuses[4], StatusCode::UNAUTHORIZED);
    assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn trusted_forwarded_for_keys_login_per_client() {
    let app = TestApp::trusting_forwarded_headers();

    for _ in 0..5 {
        let response = app.send(login_from("198.51.100.1")).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
    let limited = app.send(login_from("198.51.100.1")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);

    let other = app.send(login_from("198.51.100.2")).await;
    assert_eq!(other.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn creating_an_article_invalidates_the_listing() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;

    let before = app.get("/api/public/articles").await;
    assert_eq!(before.data().as_array().map(Vec::len), Some(0));
    let cached = app.get("/api/public/articles").await;
    assert_eq!(cached.data().as_array().map(Vec::len), Some(0));
    assert_eq!(app.store.article_list_calls.load(Ordering::SeqCst), 1);

    let created = app
        .send(json_request(
            "POST",
            "/api/admin/articles",
            Some(&token),
            article_body("Crystal Energy"),
        ))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.data()["slug"], "crystal-energy");
    assert_eq!(created.data()["created_by"], "api-key:editor");
    assert_eq!(created.data()["content"]["lo"], "<p>ເນື້ອຫາ</p>");
    assert!(created.data()["published_at"].is_string());

    let after = app.get("/api/public/articles?locale=en").await;
    let items = after.data().as_array().expect("array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Crystal Energy");
    assert_eq!(app.store.article_list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn sixth_article_creation_is_rate_limited() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;

    let mut slugs = Vec::new();
    for _ in 0..5 {
        let response = app
            .send(json_request(
                "POST",
                "/api/admin/articles",
                Some(&token),
                article_body("Crystal Energy"),
            ))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        slugs.push(response.data()["slug"].as_str().map(str::to_string));
    }
    assert_eq!(slugs[0].as_deref(), Some("crystal-energy"));
    assert_eq!(slugs[4].as_deref(), Some("crystal-energy-5"));

    let response = app
        .send(json_request(
            "POST",
            "/api/admin/articles",
            Some(&token),
            article_body("Crystal Energy"),
        ))
        .await;

    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers.contains_key(RETRY_AFTER));
    assert_eq!(app.store.articles.lock().await.len(), 5);
}

#[tokio::test]
async fn article_without_english_title_is_rejected() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/admin/articles",
            Some(&token),
            json!({ "title": { "lo": "ພະລັງຫີນ" } }),
        ))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "validation_error");
}

#[tokio::test]
async fn article_with_english_only_excerpt_is_accepted() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/admin/articles",
            Some(&token),
            json!({
                "title": { "lo": "ຫົວຂໍ້", "en": "Title" },
                "excerpt": { "en": "English only" }
            }),
        ))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["excerpt"]["en"], "English only");
    assert_eq!(response.data()["excerpt"]["lo"], "");
}

#[tokio::test]
async fn article_title_without_lao_is_a_validation_error() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/admin/articles",
            Some(&token),
            json!({ "title": { "en": "Title" } }),
        ))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "validation_error");
    assert_eq!(
        response.body["error"]["message"],
        "`title` requires a Lao value"
    );
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;
    let request = Request::post("/api/admin/quick-links")
        .header("content-type", "application/json")
        .header("x-api-key", &token)
        .body(Body::from("{not json"))
        .expect("request");

    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "bad_request");
}

#[tokio::test]
async fn unpublishing_a_product_drops_its_cached_detail() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;
    let amethyst = product("amethyst", "ອາເມທິສ", "Amethyst", 0);
    let id = amethyst.id;
    app.store.products.lock().await.push(amethyst);

    assert_eq!(
        app.get("/api/public/products/amethyst").await.status,
        StatusCode::OK
    );

    let updated = app
        .send(json_request(
            "PATCH",
            &format!("/api/admin/products/{id}/publication"),
            Some(&token),
            json!({ "is_published": false }),
        ))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.data()["is_published"], false);

    assert_eq!(
        app.get("/api/public/products/amethyst").await.status,
        StatusCode::NOT_FOUND
    );

    let empty = app
        .send(json_request(
            "PATCH",
            &format!("/api/admin/products/{id}/publication"),
            Some(&token),
            json!({}),
        ))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn settings_update_refreshes_virtual_quick_links() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;
    *app.store.settings.lock().await = Some(contact_settings());

    let before = app.get("/api/public/quick-links").await;
    assert_eq!(before.data().as_array().map(Vec::len), Some(4));

    let updated = app
        .send(json_request(
            "PUT",
            "/api/admin/settings",
            Some(&token),
            json!({
                "site_name": { "lo": "ນ້ຳງາມ", "en": "NAMNGAM" },
                "whatsapp": "020 9999 0000"
            }),
        ))
        .await;
    assert_eq!(updated.status, StatusCode::OK);

    let after = app.get("/api/public/quick-links").await;
    let links = after.data().as_array().expect("array");
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["url"], "https://wa.me/02099990000");

    let settings = app.get("/api/public/settings").await;
    assert_eq!(settings.data()["whatsapp"], "020 9999 0000");
}

#[tokio::test]
async fn settings_require_lao_site_name() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;

    let response = app
        .send(json_request(
            "PUT",
            "/api/admin/settings",
            Some(&token),
            json!({ "site_name": { "lo": "  ", "en": "NAMNGAM" } }),
        ))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quick_link_crud_round() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;

    let created = app
        .send(json_request(
            "POST",
            "/api/admin/quick-links",
            Some(&token),
            json!({
                "link_type": "EMAIL",
                "label": { "lo": "ອີເມວ", "en": "Email" },
                "url": "mailto:hello@namngam.la",
                "order": 1
            }),
        ))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.data()["id"].as_str().expect("id").to_string();

    let public = app.get("/api/public/quick-links?locale=en").await;
    assert_eq!(public.data()[0]["label"], "Email");

    let rejected = app
        .send(json_request(
            "PUT",
            &format!("/api/admin/quick-links/{id}"),
            Some(&token),
            json!({
                "link_type": "CUSTOM",
                "label": { "lo": "ລິ້ງ" },
                "url": "javascript:alert(1)"
            }),
        ))
        .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);

    let deleted = app
        .send(json_request(
            "DELETE",
            &format!("/api/admin/quick-links/{id}"),
            Some(&token),
            json!({}),
        ))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let again = app
        .send(json_request(
            "DELETE",
            &format!("/api/admin/quick-links/{id}"),
            Some(&token),
            json!({}),
        ))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let public = app.get("/api/public/quick-links").await;
    assert_eq!(public.data().as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn faq_update_and_delete_invalidate_public_list() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;
    let entry = faq("ສົ່ງບໍ?", "จัดส่งไหม?", 0);
    let id = entry.id;
    app.store.faqs.lock().await.push(entry);

    let before = app.get("/api/public/faqs").await;
    assert_eq!(before.data()[0]["question"], "ສົ່ງບໍ?");

    let updated = app
        .send(json_request(
            "PUT",
            &format!("/api/admin/faqs/{id}"),
            Some(&token),
            json!({
                "question": { "lo": "ສົ່ງທົ່ວປະເທດບໍ?" },
                "answer": { "lo": "<b>ແມ່ນ</b><img src=x onerror=alert(1)>" }
            }),
        ))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.data()["answer"]["lo"], "<b>ແມ່ນ</b><img src=\"x\">");

    let after = app.get("/api/public/faqs").await;
    assert_eq!(after.data()[0]["question"], "ສົ່ງທົ່ວປະເທດບໍ?");

    let deleted = app
        .send(json_request(
            "DELETE",
            &format!("/api/admin/faqs/{id}"),
            Some(&token),
            json!({}),
        ))
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let gone = app.get("/api/public/faqs").await;
    assert_eq!(gone.data().as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn dashboard_reports_counts_and_activity() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;
    let mut draft = product("draft-stone", "ຫີນຮ່າງ", "Draft Stone", 1);
    draft.is_published = false;
    app.store.products.lock().await.extend([
        product("amethyst", "ອາເມທິສ", "Amethyst", 0),
        draft,
    ]);
    app.store.faqs.lock().await.push(faq("ລາຄາ?", "", 0));

    let response = app.send(authed_get("/api/admin/dashboard", &token)).await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["total_products"], 2);
    assert_eq!(data["published_products"], 1);
    assert_eq!(data["total_faqs"], 1);
    let activity = data["recent_activity"].as_array().expect("array");
    assert_eq!(activity.len(), 2);
    assert!(
        activity
            .iter()
            .all(|item| item["id"].as_str().is_some_and(|id| id.starts_with("prod-")))
    );
    assert!(
        activity
            .iter()
            .any(|item| item["description"] == "Product \"Amethyst\" was updated")
    );
}

#[tokio::test]
async fn admin_budget_is_per_key() {
    let budgets = RateLimitSettings {
        admin_api: RateLimitBudget::new(2, Duration::from_secs(60)),
        max_tracked_keys: NonZeroUsize::new(100).expect("non-zero"),
        ..RateLimitSettings::default()
    };
    let app = TestApp::with_budgets(budgets);
    let first = app.issue_token(ALL_SCOPES).await;
    let second = app.issue_token(ALL_SCOPES).await;

    for _ in 0..2 {
        let response = app.send(authed_get("/api/admin/dashboard", &first)).await;
        assert_eq!(response.status, StatusCode::OK);
    }
    let limited = app.send(authed_get("/api/admin/dashboard", &first)).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        limited
            .headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok()),
        Some("60")
    );

    let other = app.send(authed_get("/api/admin/dashboard", &second)).await;
    assert_eq!(other.status, StatusCode::OK);
}

#[tokio::test]
async fn about_update_reconciles_values_and_refreshes_public_page() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;

    let seeded = app.get("/api/public/about?locale=en").await;
    let values = seeded.data()["values"].as_array().expect("values").clone();
    let quality = values[0]["id"].clone();
    let service = values[2]["id"].clone();

    let response = app
        .send(json_request(
            "PUT",
            "/api/admin/about",
            Some(&token),
            json!({
                "title": { "lo": "ກ່ຽວກັບພວກເຮົາ", "en": "About us" },
                "founder_name": { "lo": "ນ້ຳງາມ" },
                "values": [
                    { "id": service, "icon": "🤝", "title": { "lo": "ບໍລິການ", "en": "Care" } },
                    { "icon": "🌿", "title": { "lo": "ທຳມະຊາດ", "en": "Nature" } },
                    { "id": quality, "icon": "💎", "title": { "lo": "ຄຸນນະພາບ", "en": "Quality" } }
                ]
            }),
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let stored = response.data()["values"].as_array().expect("values");
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0]["id"], service);
    assert_eq!(stored[0]["order"], 0);
    assert_eq!(stored[2]["id"], quality);
    assert_eq!(stored[2]["order"], 2);
    assert!(stored[1]["id"].is_string());

    let page = app.get("/api/public/about?locale=en").await;
    assert_eq!(page.data()["title"], "About us");
    let titles: Vec<_> = page.data()["values"]
        .as_array()
        .expect("values")
        .iter()
        .map(|value| value["title"].clone())
        .collect();
    assert_eq!(titles, vec!["Care", "Nature", "Quality"]);
}

#[tokio::test]
async fn about_update_without_values_keeps_cards() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;
    app.get("/api/public/about").await;

    let response = app
        .send(json_request(
            "PUT",
            "/api/admin/about",
            Some(&token),
            json!({ "founder_quote": { "lo": "ຄວາມງາມແທ້" } }),
        ))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["values"].as_array().map(Vec::len), Some(3));
    assert_eq!(response.data()["founder_quote"]["lo"], "ຄວາມງາມແທ້");
}

#[tokio::test]
async fn about_update_needs_content_scope() {
    let app = TestApp::new();
    let token = app.issue_token(&[ApiScope::SettingsWrite]).await;

    let response = app
        .send(json_request(
            "PUT",
            "/api/admin/about",
            Some(&token),
            json!({ "title": { "lo": "ກ່ຽວກັບ" } }),
        ))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"]["hint"], "content_write");
    assert!(app.store.about.lock().await.is_none());
}

#[tokio::test]
async fn about_value_without_lao_title_is_rejected() {
    let app = TestApp::new();
    let token = app.issue_token(ALL_SCOPES).await;

    let response = app
        .send(json_request(
            "PUT",
            "/api/admin/about",
            Some(&token),
            json!({ "values": [{ "title": { "en": "Quality" } }] }),
        ))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "validation_error");
    assert_eq!(
        response.body["error"]["message"],
        "`values.title` requires a Lao value"
    );
}
