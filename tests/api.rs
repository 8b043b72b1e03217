use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use maison_storefront::{api::router, AppState};

const ADMIN_TOKEN: &str = "0123456789abcdef";

fn app() -> Router { router(AppState::in_memory(Some(ADMIN_TOKEN))) }

async fn send(app: &Router, method: Method, uri: &str, headers: &[(&str, String)], body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        req = req.header(*name, value);
    }
    let req = match body {
        Some(body) => req.header("content-type", "application/json").body(Body::from(body.to_string())).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

fn admin() -> Vec<(&'static str, String)> { vec![("x-admin-token", ADMIN_TOKEN.to_string())] }
fn guest(id: Uuid) -> Vec<(&'static str, String)> { vec![("x-guest-id", id.to_string())] }
fn user(id: &str) -> Vec<(&'static str, String)> { vec![("x-user-id", id.to_string())] }

async fn create_product(app: &Router, name: &str, price: &str, stock: u32) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/admin/products",
        &admin(),
        Some(json!({ "name": name, "price": price, "stock": stock, "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

fn address() -> Value {
    json!({ "full_name": "Ada Lovelace", "line1": "1 Rue de la Paix", "city": "Paris", "postal_code": "75002", "country": "FR" })
}

#[tokio::test]
async fn health_reports_healthy() {
    let (status, body) = send(&app(), Method::GET, "/health", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn admin_routes_require_token() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/admin/products", &[], None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let wrong = vec![("x-admin-token", "fedcba9876543210".to_string())];
    let (status, _) = send(&app, Method::GET, "/api/admin/products", &wrong, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/api/admin/products", &admin(), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_routes_closed_without_configured_token() {
    let app = router(AppState::in_memory(None));
    let (status, _) = send(&app, Method::GET, "/api/admin/orders", &admin(), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn public_catalog_lists_only_active_products() {
    let app = app();
    let silk = create_product(&app, "Silk Scarf", "120.00", 3).await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/products",
        &admin(),
        Some(json!({ "name": "Unreleased Bag", "price": "900.00", "status": "draft" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::GET, "/api/products?page=1&per_page=10", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Silk Scarf");

    let (status, body) = send(&app, Method::GET, "/api/products/silk-scarf", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], silk["id"]);
    assert_eq!(body["data"]["view_count"], 1);

    let (status, _) = send(&app, Method::GET, "/api/products/unreleased-bag", &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_bodies_are_unprocessable() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/contact",
        &[],
        Some(json!({ "name": "Ada", "email": "not-an-email", "message": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("email"));

    // Missing fields fail deserialization, still inside the envelope.
    let (status, body) = send(&app, Method::POST, "/api/contact", &[], Some(json!({ "name": "Ada" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn extractor_rejections_use_the_envelope() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/admin/orders/not-a-uuid", &admin(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(!body["message"].as_str().unwrap().is_empty());

    let (status, body) = send(&app, Method::POST, "/api/wishlist/toggle", &guest(Uuid::new_v4()), Some(json!({ "product_id": 5 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, Method::GET, "/api/products?page=abc", &[], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, Method::GET, "/api/no-such-route", &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "route not found");
}

#[tokio::test]
async fn cart_requires_identity() {
    let (status, _) = send(&app(), Method::GET, "/api/cart", &[], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn guest_cart_merge_then_claim() {
    let app = app();
    let scarf = create_product(&app, "Silk Scarf", "120.00", 10).await;
    let gloves = create_product(&app, "Leather Gloves", "80.00", 2).await;
    let guest_id = Uuid::new_v4();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/cart/items",
        &guest(guest_id),
        Some(json!({ "product_id": scarf["id"], "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["subtotal"], "240.00");

    // The scarf is already on the server: larger quantity wins, not the sum.
    // Gloves are clamped to stock.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/cart/merge",
        &guest(guest_id),
        Some(json!({ "items": [
            { "product_id": scarf["id"], "quantity": 1 },
            { "product_id": gloves["id"], "quantity": 5 }
        ] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[1]["quantity"], 2);
    assert_eq!(body["data"]["adjustments"][0]["kind"], "reduced");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/wishlist/toggle",
        &guest(guest_id),
        Some(json!({ "product_id": scarf["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::POST, "/api/cart/claim", &user("user-1"), Some(json!({ "guest_id": guest_id }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["item_count"], 4);

    let (_, body) = send(&app, Method::GET, "/api/cart", &guest(guest_id), None).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);

    let (_, body) = send(&app, Method::GET, "/api/wishlist", &user("user-1"), None).await;
    assert_eq!(body["data"]["product_ids"][0], scarf["id"]);
}

#[tokio::test]
async fn guests_cannot_claim() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/cart/claim",
        &guest(Uuid::new_v4()),
        Some(json!({ "guest_id": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn checkout_applies_coupon_and_books_stock() {
    let app = app();
    let coat = create_product(&app, "Cashmere Coat", "200.00", 5).await;
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/coupons",
        &admin(),
        Some(json!({ "code": "save10", "discount_type": "percentage", "discount_value": "10", "usage_limit": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let buyer = user("user-7");
    send(&app, Method::POST, "/api/cart/items", &buyer, Some(json!({ "product_id": coat["id"], "quantity": 2 }))).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/coupons/validate",
        &[],
        Some(json!({ "code": "SAVE10", "subtotal": "400.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["discount"], "40.00");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        &buyer,
        Some(json!({
            "email": "Ada@Example.com",
            "customer_name": "Ada Lovelace",
            "shipping_address": address(),
            "coupon_code": "save10"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order = body["data"].clone();
    assert_eq!(order["subtotal"], "400.00");
    assert_eq!(order["discount"], "40.00");
    // 360.00 is under the 500.00 free-shipping threshold.
    assert_eq!(order["shipping"], "15.00");
    assert_eq!(order["total"], "375.00");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["email"], "ada@example.com");
    assert!(order["order_number"].as_str().unwrap().starts_with("MS-"));

    let (_, body) = send(&app, Method::GET, &format!("/api/admin/products/{}", coat["id"].as_str().unwrap()), &admin(), None).await;
    assert_eq!(body["data"]["stock"], 3);

    let (_, body) = send(&app, Method::GET, "/api/cart", &buyer, None).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());

    // The single use has been spent.
    let (status, _) = send(&app, Method::POST, "/api/coupons/validate", &[], Some(json!({ "code": "SAVE10", "subtotal": "400.00" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let uri = format!("/api/orders/track?order_number={}&email=ada@example.com", order["order_number"].as_str().unwrap());
    let (status, body) = send(&app, Method::GET, &uri, &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], order["id"]);

    let (_, body) = send(&app, Method::GET, "/api/orders", &buyer, None).await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn checkout_rejects_empty_cart_and_short_stock() {
    let app = app();
    let buyer = guest(Uuid::new_v4());
    let checkout = json!({ "email": "a@b.co", "customer_name": "A", "shipping_address": address() });

    let (status, _) = send(&app, Method::POST, "/api/orders", &buyer, Some(checkout.clone())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let ring = create_product(&app, "Gold Ring", "950.00", 1).await;
    let mut explicit = checkout;
    explicit["items"] = json!([{ "product_id": ring["id"], "quantity": 2 }]);
    let (status, body) = send(&app, Method::POST, "/api/orders", &buyer, Some(explicit)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn order_status_workflow_and_cancel_restock() {
    let app = app();
    let bag = create_product(&app, "Tote Bag", "600.00", 4).await;
    let buyer = guest(Uuid::new_v4());
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        &buyer,
        Some(json!({
            "email": "a@b.co",
            "customer_name": "A",
            "shipping_address": address(),
            "items": [{ "product_id": bag["id"], "quantity": 3 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["shipping"], "0.00");
    let status_uri = format!("/api/admin/orders/{}/status", body["data"]["id"].as_str().unwrap());
    let product_uri = format!("/api/admin/products/{}", bag["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::PUT, &status_uri, &admin(), Some(json!({ "status": "confirmed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "confirmed");

    let (status, _) = send(&app, Method::PUT, &status_uri, &admin(), Some(json!({ "status": "delivered" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(&app, Method::GET, &product_uri, &admin(), None).await;
    assert_eq!(body["data"]["stock"], 1);

    let (status, _) = send(&app, Method::PUT, &status_uri, &admin(), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, Method::GET, &product_uri, &admin(), None).await;
    assert_eq!(body["data"]["stock"], 4);
}

#[tokio::test]
async fn reviews_are_moderated() {
    let app = app();
    create_product(&app, "Silk Scarf", "120.00", 3).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products/silk-scarf/reviews",
        &[],
        Some(json!({ "author_name": "Ada", "email": "ada@example.com", "rating": 5, "body": "Beautiful." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let review_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["approved"], false);

    let (_, body) = send(&app, Method::GET, "/api/products/silk-scarf/reviews", &[], None).await;
    assert_eq!(body["data"]["summary"]["count"], 0);

    let (status, _) = send(&app, Method::PUT, &format!("/api/admin/reviews/{review_id}/approve"), &admin(), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/products/silk-scarf/reviews", &[], None).await;
    assert_eq!(body["data"]["summary"]["count"], 1);
    assert_eq!(body["data"]["reviews"]["items"][0]["id"], review_id.as_str());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/products/silk-scarf/reviews",
        &[],
        Some(json!({ "author_name": "Bob", "email": "bob@example.com", "rating": 6, "body": "?" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn settings_drive_checkout_totals() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/admin/settings",
        &admin(),
        Some(json!({
            "store_name": "Maison Paris",
            "currency": "eur",
            "tax_rate": "20",
            "shipping_fee": "25.00",
            "free_shipping_threshold": null
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["currency"], "EUR");

    let (_, body) = send(&app, Method::GET, "/api/settings", &[], None).await;
    assert_eq!(body["data"]["store_name"], "Maison Paris");

    let belt = create_product(&app, "Belt", "100.00", 10).await;
    let buyer = guest(Uuid::new_v4());
    send(&app, Method::POST, "/api/cart/items", &buyer, Some(json!({ "product_id": belt["id"], "quantity": 1 }))).await;
    let (_, body) = send(&app, Method::GET, "/api/cart", &buyer, None).await;
    assert_eq!(body["data"]["shipping"], "25.00");
    assert_eq!(body["data"]["tax"], "20.00");
    assert_eq!(body["data"]["total"], "145.00");
}

#[tokio::test]
async fn checkout_reports_nested_address_errors() {
    let app = app();
    let ring = create_product(&app, "Gold Ring", "950.00", 1).await;
    let mut shipping = address();
    shipping["city"] = json!("");
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        &guest(Uuid::new_v4()),
        Some(json!({
            "email": "a@b.co",
            "customer_name": "A",
            "shipping_address": shipping,
            "items": [{ "product_id": ring["id"], "quantity": 1 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("shipping_address.city"), "{body}");
}

#[tokio::test]
async fn checkout_refuses_oversized_lines() {
    let app = app();
    let socks = create_product(&app, "Silk Socks", "20.00", 500).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        &guest(Uuid::new_v4()),
        Some(json!({
            "email": "a@b.co",
            "customer_name": "A",
            "shipping_address": address(),
            "items": [{ "product_id": socks["id"], "quantity": 100 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("items"), "{body}");

    let (_, body) = send(&app, Method::GET, &format!("/api/admin/products/{}", socks["id"].as_str().unwrap()), &admin(), None).await;
    assert_eq!(body["data"]["stock"], 500);
}

#[tokio::test]
async fn cart_read_prices_coupon_preview() {
    let app = app();
    for (code, minimum) in [("SAVE10", "0"), ("BIGSPEND", "500.00")] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/admin/coupons",
            &admin(),
            Some(json!({ "code": code, "discount_type": "percentage", "discount_value": "10", "min_order_amount": minimum })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let belt = create_product(&app, "Belt", "100.00", 10).await;
    let buyer = guest(Uuid::new_v4());
    send(&app, Method::POST, "/api/cart/items", &buyer, Some(json!({ "product_id": belt["id"], "quantity": 1 }))).await;

    let (status, body) = send(&app, Method::GET, "/api/cart?coupon=save10", &buyer, None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["coupon_code"], "SAVE10");
    assert_eq!(body["data"]["discount"], "10.00");
    assert_eq!(body["data"]["total"], "105.00");

    // A coupon that does not apply leaves the cart readable and priced without it.
    let (status, body) = send(&app, Method::GET, "/api/cart?coupon=BIGSPEND", &buyer, None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["coupon_code"], Value::Null);
    assert_eq!(body["data"]["discount"], "0.00");
    assert_eq!(body["data"]["total"], "115.00");
    assert!(body["data"]["coupon_error"].as_str().unwrap().contains("at least"));

    let (status, body) = send(&app, Method::GET, "/api/cart?coupon=NOPE", &buyer, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["coupon_error"].as_str().unwrap().contains("does not exist"));
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/api/admin/categories", &admin(), Some(json!({ "name": "Scarves" }))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let category_uri = format!("/api/admin/categories/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/products",
        &admin(),
        Some(json!({ "name": "Silk Scarf", "price": "120.00", "status": "active", "category_id": body["data"]["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let product_uri = format!("/api/admin/products/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::DELETE, &category_uri, &admin(), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, Method::DELETE, &product_uri, &admin(), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &category_uri, &admin(), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/api/categories/scarves", &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn answering_a_question_publishes_it() {
    let app = app();
    create_product(&app, "Silk Scarf", "120.00", 3).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products/silk-scarf/questions",
        &[],
        Some(json!({ "author_name": "Ada", "question": "Is it hand-rolled?" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["published"], false);
    let question_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, Method::GET, "/api/products/silk-scarf/questions", &[], None).await;
    assert_eq!(body["data"]["total"], 0);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/admin/questions/{question_id}/answer"),
        &admin(),
        Some(json!({ "answer": "Yes, by hand in Como." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["published"], true);

    let (_, body) = send(&app, Method::GET, "/api/products/silk-scarf/questions", &[], None).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["answer"], "Yes, by hand in Como.");
}

#[tokio::test]
async fn blog_shows_published_posts_and_moderated_comments() {
    let app = app();
    for (title, status) in [("Autumn Edit", "published"), ("Winter Preview", "draft")] {
        let (code, body) = send(
            &app,
            Method::POST,
            "/api/admin/blogs",
            &admin(),
            Some(json!({ "title": title, "content": "Layers of cashmere.", "author": "Maison", "status": status })),
        )
        .await;
        assert_eq!(code, StatusCode::CREATED, "{body}");
    }

    let (_, body) = send(&app, Method::GET, "/api/blogs", &[], None).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["slug"], "autumn-edit");

    let (status, _) = send(&app, Method::GET, "/api/blogs/winter-preview", &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/api/blogs/autumn-edit", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["view_count"], 1);
    send(&app, Method::GET, "/api/blogs/autumn-edit", &[], None).await;

    let (_, body) = send(&app, Method::POST, "/api/blogs/autumn-edit/like", &[], None).await;
    assert_eq!(body["data"]["like_count"], 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/blogs/autumn-edit/comments",
        &[],
        Some(json!({ "author_name": "Ada", "email": "ada@example.com", "body": "Lovely." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["approved"], false);
    let comment_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = send(&app, Method::GET, "/api/blogs/autumn-edit/comments", &[], None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, Method::PUT, &format!("/api/admin/comments/{comment_id}/approve"), &admin(), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/blogs/autumn-edit/comments", &[], None).await;
    assert_eq!(body["data"][0]["body"], "Lovely.");
    let (_, body) = send(&app, Method::GET, "/api/blogs/autumn-edit", &[], None).await;
    assert_eq!(body["data"]["view_count"], 3);
    assert_eq!(body["data"]["comment_count"], 1);
}

#[tokio::test]
async fn wishlist_merge_skips_unknown_products() {
    let app = app();
    let scarf = create_product(&app, "Silk Scarf", "120.00", 3).await;
    let gloves = create_product(&app, "Leather Gloves", "80.00", 2).await;
    let shopper = user("user-9");

    let (status, _) = send(&app, Method::POST, "/api/wishlist/items", &shopper, Some(json!({ "product_id": scarf["id"] }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/wishlist/merge",
        &shopper,
        Some(json!({ "product_ids": [gloves["id"], scarf["id"], Uuid::new_v4()] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["product_ids"], json!([scarf["id"], gloves["id"]]));
    assert_eq!(body["data"]["products"].as_array().unwrap().len(), 2);
}
