mod support;

use std::sync::atomic::Ordering;

use axum::http::StatusCode;
use namngam::domain::locale::{Locale, LocalizedText};
use namngam::domain::types::QuickLinkType;

use support::{TestApp, article, contact_settings, faq, product, quick_link};

#[tokio::test]
async fn settings_default_to_empty_shape() {
    let app = TestApp::new();

    let response = app.get("/api/public/settings").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.data()["site_name"]["lo"], "");
    assert_eq!(response.data()["is_under_maintenance"], false);
}

#[tokio::test]
async fn settings_keep_every_locale() {
    let app = TestApp::new();
    *app.store.settings.lock().await = Some(contact_settings());

    let response = app.get("/api/public/settings").await;

    assert_eq!(response.data()["site_name"]["lo"], "ນ້ຳງາມ");
    assert_eq!(response.data()["site_name"]["en"], "NAMNGAM");
}

#[tokio::test]
async fn virtual_quick_links_follow_contact_settings() {
    let app = TestApp::new();
    *app.store.settings.lock().await = Some(contact_settings());

    let response = app.get("/api/public/quick-links?locale=en").await;

    assert_eq!(response.status, StatusCode::OK);
    let links = response.data().as_array().expect("array");
    let types: Vec<_> = links.iter().map(|link| link["type"].as_str()).collect();
    assert_eq!(
        types,
        [Some("WHATSAPP"), Some("FACEBOOK"), Some("LINE"), Some("PHONE")]
    );
    assert_eq!(links[0]["url"], "https://wa.me/8562055551234");
    assert_eq!(links[0]["id"], "virtual-whatsapp");
    assert_eq!(links[2]["url"], "https://line.me/ti/p/~namngam");
    assert_eq!(links[3]["label"], "Call Us");
    assert_eq!(links[3]["url"], "tel:+856 21 123 456");
    let orders: Vec<_> = links.iter().map(|link| link["order"].as_i64()).collect();
    assert_eq!(orders, [Some(0), Some(1), Some(2), Some(3)]);

    let lao = app.get("/api/public/quick-links").await;
    assert_eq!(lao.data()[3]["label"], "ໂທຫາພວກເຮົາ");
}

#[tokio::test]
async fn stored_quick_links_win_and_labels_fall_back() {
    let app = TestApp::new();
    *app.store.settings.lock().await = Some(contact_settings());
    app.store.links.lock().await.extend([
        quick_link(
            QuickLinkType::Email,
            LocalizedText::new("ອີເມວ").with(Locale::En, "Email"),
            "mailto:hello@namngam.la",
            2,
        ),
        quick_link(
            QuickLinkType::Custom,
            LocalizedText::new("ຮ້ານ").with(Locale::Zh, "商店"),
            "/shop",
            1,
        ),
    ]);

    let response = app.get("/api/public/quick-links?locale=zh").await;

    let links = response.data().as_array().expect("array");
    assert_eq!(links.len(), 2);
    assert_eq!(links[0]["label"], "商店");
    assert_eq!(links[1]["label"], "ອີເມວ");
    assert_eq!(links[1]["type"], "EMAIL");
}

#[tokio::test]
async fn product_listing_is_localized_paginated_and_cached() {
    let app = TestApp::new();
    let mut hidden = product("draft-stone", "ຫີນຮ່າງ", "Draft Stone", 0);
    hidden.is_published = false;
    app.store.products.lock().await.extend([
        product("amethyst", "ອາເມທິສ", "Amethyst", 2),
        product("rose-quartz", "ໂຣສຄວອດ", "Rose Quartz", 1),
        hidden,
    ]);

    let response = app.get("/api/public/products?locale=en&limit=1").await;

    assert_eq!(response.status, StatusCode::OK);
    let items = response.data().as_array().expect("array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Rose Quartz");
    assert_eq!(items[0]["description"], "ລາຍລະອຽດ");
    assert_eq!(response.body["pagination"]["total"], 2);
    assert_eq!(response.body["pagination"]["total_pages"], 2);
    assert_eq!(response.body["pagination"]["has_next"], true);

    // Another locale is served from the same cached page.
    let lao = app.get("/api/public/products?locale=lo&limit=1").await;
    assert_eq!(lao.data()[0]["name"], "ໂຣສຄວອດ");
    assert_eq!(app.store.product_list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unpublished_product_detail_is_not_found() {
    let app = TestApp::new();
    let mut draft = product("draft-stone", "ຫີນຮ່າງ", "Draft Stone", 0);
    draft.is_published = false;
    app.store.products.lock().await.push(draft);

    let response = app.get("/api/public/products/draft-stone").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.error_code(), "not_found");
    assert_eq!(response.body["error"]["message"], "Product not found");

    let missing = app.get("/api/public/products/nothing-here").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_detail_resolves_lists_with_fallback() {
    let app = TestApp::new();
    app.store
        .products
        .lock()
        .await
        .push(product("amethyst", "ອາເມທິສ", "Amethyst", 0));

    let english = app.get("/api/public/products/amethyst?locale=en").await;
    assert_eq!(english.data()["benefits"][0], "Calm");

    let thai = app.get("/api/public/products/amethyst?locale=th").await;
    assert_eq!(thai.data()["name"], "ອາເມທິສ");
    assert_eq!(thai.data()["benefits"][0], "ຄວາມສະຫງົບ");
    assert!(thai.data()["how_to_use"].as_array().expect("array").is_empty());
}

#[tokio::test]
async fn article_listing_hides_drafts() {
    let app = TestApp::new();
    app.store.articles.lock().await.extend([
        article("crystal-care", "ການດູແລຫີນ", "Crystal Care", true),
        article("draft-notes", "ບັນທຶກ", "Draft Notes", false),
    ]);

    let response = app.get("/api/public/articles?locale=en&page=junk").await;

    let items = response.data().as_array().expect("array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Crystal Care");
    assert_eq!(response.body["pagination"]["page"], 1);

    let draft = app.get("/api/public/articles/draft-notes").await;
    assert_eq!(draft.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn article_detail_falls_back_to_lao() {
    let app = TestApp::new();
    app.store
        .articles
        .lock()
        .await
        .push(article("crystal-care", "ການດູແລຫີນ", "Crystal Care", true));

    let response = app.get("/api/public/articles/crystal-care?locale=th").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["title"], "ການດູແລຫີນ");
    assert_eq!(response.data()["content"], "<p>ເນື້ອຫາ</p>");
    assert!(response.data()["meta_title"].is_null());
}

#[tokio::test]
async fn faqs_are_ordered_and_localized() {
    let app = TestApp::new();
    let mut inactive = faq("ບໍ່ສະແດງ", "ไม่แสดง", 0);
    inactive.is_active = false;
    app.store.faqs.lock().await.extend([
        faq("ສົ່ງບໍ?", "จัดส่งไหม?", 2),
        faq("ລາຄາ?", "", 1),
        inactive,
    ]);

    let response = app.get("/api/public/faqs?locale=th").await;

    let items = response.data().as_array().expect("array");
    let questions: Vec<_> = items.iter().map(|f| f["question"].as_str()).collect();
    assert_eq!(questions, [Some("ລາຄາ?"), Some("จัดส่งไหม?")]);
}

#[tokio::test]
async fn unsupported_locale_uses_lao() {
    let app = TestApp::new();
    app.store
        .articles
        .lock()
        .await
        .push(article("crystal-care", "ການດູແລຫີນ", "Crystal Care", true));

    let response = app.get("/api/public/articles/crystal-care?locale=fr").await;

    assert_eq!(response.data()["title"], "ການດູແລຫີນ");
}

#[tokio::test]
async fn health_reports_database_state() {
    let app = TestApp::new();
    assert_eq!(app.get("/health").await.status, StatusCode::NO_CONTENT);

    app.store.unhealthy.store(true, Ordering::SeqCst);
    assert_eq!(
        app.get("/health").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn about_page_is_seeded_with_three_ordered_values() {
    let app = TestApp::new();

    let response = app.get("/api/public/about?locale=en").await;

    assert_eq!(response.status, StatusCode::OK);
    let values = response.data()["values"].as_array().expect("values");
    let titles: Vec<_> = values.iter().map(|value| value["title"].clone()).collect();
    assert_eq!(titles, vec!["Quality", "Beauty", "Service"]);
    let orders: Vec<_> = values.iter().map(|value| value["order"].clone()).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert!(
        response.data()["story_paragraph1"]
            .as_str()
            .is_some_and(|text| text.starts_with("NAMNGAM ORIGINAL is"))
    );
    assert!(app.store.about.lock().await.is_some());

    let lao = app.get("/api/public/about?locale=lo").await;
    assert_eq!(lao.data()["values"][0]["title"], "ຄຸນນະພາບ");
    assert_eq!(app.store.about_load_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn about_page_falls_back_to_lao_per_field() {
    let app = TestApp::new();
    app.get("/api/public/about").await;

    let response = app.get("/api/public/about?locale=zh").await;

    assert_eq!(response.data()["values"][1]["title"], "ຄວາມງາມ");
    assert_eq!(response.data()["background_image"], serde_json::Value::Null);
}
