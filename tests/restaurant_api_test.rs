//! Catalog surface: accounts, restaurant management, menus, reviews, and
//! favorites.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use quickbite_api::entities::user::UserRole;
use rust_decimal_macros::dec;
use serde_json::json;

fn new_restaurant_body(name: &str, cuisine: &str) -> serde_json::Value {
    json!({
        "name": name,
        "description": "Family recipes, wood-fired oven",
        "cuisine": cuisine,
        "address": "12 Via Roma",
        "delivery_fee": "20.00",
        "minimum_order": "15.00",
        "delivery_time_minutes": 30
    })
}

#[tokio::test]
async fn registration_issues_a_working_token() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Nadia",
                "email": "nadia@example.com",
                "password": "hunter2hunter2"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let token = body["data"]["token"].as_str().expect("token").to_string();
    assert_eq!(body["data"]["user"]["email"], "nadia@example.com");
    assert_eq!(body["data"]["user"]["role"], "customer");
    assert!(body["data"]["user"].get("password_hash").is_none());

    // The issued token must be accepted straight away.
    let me = app
        .request(Method::GET, "/api/v1/auth/me", None, Some(&token))
        .await;
    assert_eq!(me.status(), StatusCode::OK);
    let me_body = response_json(me).await;
    assert_eq!(me_body["data"]["email"], "nadia@example.com");

    // Same email again is a conflict, not a second account.
    let duplicate = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Nadia Again",
                "email": "nadia@example.com",
                "password": "hunter2hunter2"
            })),
            None,
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    assert_eq!(response_json(duplicate).await["error"], "CONFLICT");

    let login = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "nadia@example.com", "password": "hunter2hunter2"})),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    assert!(response_json(login).await["data"]["token"].is_string());

    let bad_login = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "nadia@example.com", "password": "wrong-password"})),
            None,
        )
        .await;
    assert_eq!(bad_login.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn opening_a_restaurant_promotes_the_owner() {
    let app = TestApp::new().await;
    let (user, token) = app
        .seed_user("Marco", "marco@example.com", UserRole::Customer)
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/restaurants",
            Some(new_restaurant_body("Trattoria Marco", "Italian")),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["owner_id"], user.id.to_string());
    assert_eq!(body["data"]["rating"], "0");
    assert_eq!(body["data"]["review_count"], 0);
    assert_eq!(body["data"]["is_open"], true);

    // The role upgrade is visible on the account.
    let me = app
        .request(Method::GET, "/api/v1/auth/me", None, Some(&token))
        .await;
    assert_eq!(response_json(me).await["data"]["role"], "restaurant_owner");

    // Anonymous callers cannot open restaurants at all.
    let anonymous = app
        .request(
            Method::POST,
            "/api/v1/restaurants",
            Some(new_restaurant_body("No Auth Diner", "Fusion")),
            None,
        )
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn restaurant_editing_is_owner_only() {
    let app = TestApp::new().await;
    let (owner, owner_token) = app
        .seed_user("Owner", "owner@example.com", UserRole::RestaurantOwner)
        .await;
    let (_stranger, stranger_token) = app
        .seed_user("Stranger", "stranger@example.com", UserRole::Customer)
        .await;
    let restaurant = app
        .seed_restaurant(owner.id, "Pasta Place", dec!(20.00))
        .await;
    let uri = format!("/api/v1/restaurants/{}", restaurant.id);

    let forbidden = app
        .request(
            Method::PUT,
            &uri,
            Some(json!({"name": "Hijacked"})),
            Some(&stranger_token),
        )
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let updated = app
        .request(
            Method::PUT,
            &uri,
            Some(json!({"name": "Pasta Palace", "is_open": false})),
            Some(&owner_token),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let body = response_json(updated).await;
    assert_eq!(body["data"]["name"], "Pasta Palace");
    assert_eq!(body["data"]["is_open"], false);

    // Negative money never sticks.
    let negative = app
        .request(
            Method::PUT,
            &uri,
            Some(json!({"delivery_fee": "-5.00"})),
            Some(&owner_token),
        )
        .await;
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn menu_management_follows_ownership() {
    let app = TestApp::new().await;
    let (owner, owner_token) = app
        .seed_user("Chef", "chef@example.com", UserRole::RestaurantOwner)
        .await;
    let (_stranger, stranger_token) = app
        .seed_user("Diner", "diner@example.com", UserRole::Customer)
        .await;
    let restaurant = app
        .seed_restaurant(owner.id, "Sushi Spot", dec!(25.00))
        .await;
    let menu_uri = format!("/api/v1/restaurants/{}/menu", restaurant.id);

    let rejected = app
        .request(
            Method::POST,
            &menu_uri,
            Some(json!({"name": "Forged Roll", "price": "9.00"})),
            Some(&stranger_token),
        )
        .await;
    assert_eq!(rejected.status(), StatusCode::FORBIDDEN);

    let created = app
        .request(
            Method::POST,
            &menu_uri,
            Some(json!({"name": "Dragon Roll", "price": "18.50", "category": "Rolls"})),
            Some(&owner_token),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created_body = response_json(created).await;
    let item_id = created_body["data"]["id"].as_str().expect("item id").to_string();
    assert_eq!(created_body["data"]["is_available"], true);

    let item_uri = format!("{menu_uri}/{item_id}");
    let repriced = app
        .request(
            Method::PUT,
            &item_uri,
            Some(json!({"price": "19.75", "is_available": false})),
            Some(&owner_token),
        )
        .await;
    assert_eq!(repriced.status(), StatusCode::OK);
    let repriced_body = response_json(repriced).await;
    assert_eq!(repriced_body["data"]["price"], "19.75");
    assert_eq!(repriced_body["data"]["is_available"], false);

    // The detail view carries the dish until it is removed.
    let detail_uri = format!("/api/v1/restaurants/{}", restaurant.id);
    let detail = app.request(Method::GET, &detail_uri, None, None).await;
    let detail_body = response_json(detail).await;
    assert_eq!(detail_body["data"]["menu"].as_array().map(Vec::len), Some(1));
    assert_eq!(detail_body["data"]["name"], "Sushi Spot");

    let removed = app
        .request(Method::DELETE, &item_uri, None, Some(&owner_token))
        .await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let after = app.request(Method::GET, &detail_uri, None, None).await;
    let after_body = response_json(after).await;
    assert_eq!(after_body["data"]["menu"].as_array().map(Vec::len), Some(0));

    let gone = app
        .request(Method::DELETE, &item_uri, None, Some(&owner_token))
        .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_filters_combine_and_sort() {
    let app = TestApp::new().await;
    let (owner, owner_token) = app
        .seed_user("Owner", "owner@example.com", UserRole::RestaurantOwner)
        .await;
    let (_, reviewer_token) = app
        .seed_user("Reviewer", "reviewer@example.com", UserRole::Customer)
        .await;

    app.seed_restaurant(owner.id, "Pasta Place", dec!(20.00)).await;
    let sushi = app
        .seed_restaurant(owner.id, "Sushi Spot", dec!(25.00))
        .await;
    app.seed_restaurant(owner.id, "Trattoria Nonna", dec!(15.00))
        .await;

    // Seeded restaurants all carry cuisine "Italian"; re-tag the sushi place
    // so the filter has something to split on.
    let retagged = app
        .request(
            Method::PUT,
            &format!("/api/v1/restaurants/{}", sushi.id),
            Some(json!({"cuisine": "Japanese"})),
            Some(&owner_token),
        )
        .await;
    assert_eq!(retagged.status(), StatusCode::OK);

    // A five-star review lifts Sushi Spot above the zero-rated rest.
    let review = app
        .request(
            Method::POST,
            &format!("/api/v1/restaurants/{}/reviews", sushi.id),
            Some(json!({"rating": 5, "comment": "flawless"})),
            Some(&reviewer_token),
        )
        .await;
    assert_eq!(review.status(), StatusCode::CREATED);

    let italian = app
        .request(Method::GET, "/api/v1/restaurants?cuisine=Italian", None, None)
        .await;
    assert_eq!(response_json(italian).await["data"]["total"], 2);

    let both = app
        .request(
            Method::GET,
            "/api/v1/restaurants?cuisine=Italian,Japanese",
            None,
            None,
        )
        .await;
    assert_eq!(response_json(both).await["data"]["total"], 3);

    let searched = app
        .request(Method::GET, "/api/v1/restaurants?search=Sushi", None, None)
        .await;
    let searched_body = response_json(searched).await;
    assert_eq!(searched_body["data"]["total"], 1);
    assert_eq!(searched_body["data"]["items"][0]["name"], "Sushi Spot");

    let rated = app
        .request(Method::GET, "/api/v1/restaurants?min_rating=4", None, None)
        .await;
    assert_eq!(response_json(rated).await["data"]["total"], 1);

    // Default order is best-rated first; sort=name flips to alphabetical.
    let default_sort = app
        .request(Method::GET, "/api/v1/restaurants", None, None)
        .await;
    assert_eq!(
        response_json(default_sort).await["data"]["items"][0]["name"],
        "Sushi Spot"
    );
    let by_name = app
        .request(Method::GET, "/api/v1/restaurants?sort=name", None, None)
        .await;
    assert_eq!(
        response_json(by_name).await["data"]["items"][0]["name"],
        "Pasta Place"
    );
}

#[tokio::test]
async fn reviews_fold_into_the_rating() {
    let app = TestApp::new().await;
    let (owner, _) = app
        .seed_user("Owner", "owner@example.com", UserRole::RestaurantOwner)
        .await;
    let (_, first_token) = app
        .seed_user("First", "first@example.com", UserRole::Customer)
        .await;
    let (_, second_token) = app
        .seed_user("Second", "second@example.com", UserRole::Customer)
        .await;
    let restaurant = app
        .seed_restaurant(owner.id, "Burger Barn", dec!(10.00))
        .await;
    let reviews_uri = format!("/api/v1/restaurants/{}/reviews", restaurant.id);

    let first = app
        .request(
            Method::POST,
            &reviews_uri,
            Some(json!({"rating": 4, "comment": "solid"})),
            Some(&first_token),
        )
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let second = app
        .request(
            Method::POST,
            &reviews_uri,
            Some(json!({"rating": 5})),
            Some(&second_token),
        )
        .await;
    assert_eq!(second.status(), StatusCode::CREATED);

    let detail = app
        .request(
            Method::GET,
            &format!("/api/v1/restaurants/{}", restaurant.id),
            None,
            None,
        )
        .await;
    let detail_body = response_json(detail).await;
    assert_eq!(detail_body["data"]["rating"], "4.50");
    assert_eq!(detail_body["data"]["review_count"], 2);

    // Newest first, and the list is public.
    let listed = app.request(Method::GET, &reviews_uri, None, None).await;
    assert_eq!(listed.status(), StatusCode::OK);
    let listed_body = response_json(listed).await;
    assert_eq!(listed_body["data"]["total"], 2);
    assert_eq!(listed_body["data"]["items"][0]["rating"], 5);
    assert_eq!(listed_body["data"]["items"][1]["comment"], "solid");

    let out_of_range = app
        .request(
            Method::POST,
            &reviews_uri,
            Some(json!({"rating": 6})),
            Some(&first_token),
        )
        .await;
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);

    let missing = app
        .request(
            Method::POST,
            &format!("/api/v1/restaurants/{}/reviews", uuid::Uuid::new_v4()),
            Some(json!({"rating": 3})),
            Some(&first_token),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn favorites_round_trip() {
    let app = TestApp::new().await;
    let (owner, _) = app
        .seed_user("Owner", "owner@example.com", UserRole::RestaurantOwner)
        .await;
    let (_, token) = app
        .seed_user("Fan", "fan@example.com", UserRole::Customer)
        .await;
    let restaurant = app
        .seed_restaurant(owner.id, "Pasta Place", dec!(20.00))
        .await;
    let fav_uri = format!("/api/v1/users/favorites/{}", restaurant.id);

    let added = app
        .request(Method::POST, &fav_uri, None, Some(&token))
        .await;
    assert_eq!(added.status(), StatusCode::CREATED);
    assert_eq!(
        response_json(added).await["data"]["restaurant_id"],
        restaurant.id.to_string()
    );

    let duplicate = app
        .request(Method::POST, &fav_uri, None, Some(&token))
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    assert_eq!(response_json(duplicate).await["error"], "CONFLICT");

    let listed = app
        .request(Method::GET, "/api/v1/users/favorites", None, Some(&token))
        .await;
    let listed_body = response_json(listed).await;
    assert_eq!(listed_body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(listed_body["data"][0]["id"], restaurant.id.to_string());

    let removed = app
        .request(Method::DELETE, &fav_uri, None, Some(&token))
        .await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let emptied = app
        .request(Method::GET, "/api/v1/users/favorites", None, Some(&token))
        .await;
    assert_eq!(
        response_json(emptied).await["data"].as_array().map(Vec::len),
        Some(0)
    );

    let gone = app
        .request(Method::DELETE, &fav_uri, None, Some(&token))
        .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let favoriting_nothing = app
        .request(
            Method::POST,
            &format!("/api/v1/users/favorites/{}", uuid::Uuid::new_v4()),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(favoriting_nothing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_updates_cannot_touch_email_or_role() {
    let app = TestApp::new().await;
    let (_, token) = app
        .seed_user("Priya", "priya@example.com", UserRole::Customer)
        .await;

    let fetched = app
        .request(Method::GET, "/api/v1/users/profile", None, Some(&token))
        .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(response_json(fetched).await["data"]["email"], "priya@example.com");

    let updated = app
        .request(
            Method::PUT,
            "/api/v1/users/profile",
            Some(json!({
                "name": "Priya K",
                "phone": "+15551234567",
                "address": "7 Harbor Lane"
            })),
            Some(&token),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let body = response_json(updated).await;
    assert_eq!(body["data"]["name"], "Priya K");
    assert_eq!(body["data"]["address"], "7 Harbor Lane");
    assert_eq!(body["data"]["email"], "priya@example.com");

    // Unknown keys are rejected wholesale rather than silently dropped.
    let smuggled = app
        .request(
            Method::PUT,
            "/api/v1/users/profile",
            Some(json!({"name": "Evil", "email": "evil@example.com"})),
            Some(&token),
        )
        .await;
    assert_eq!(smuggled.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let after = app
        .request(Method::GET, "/api/v1/users/profile", None, Some(&token))
        .await;
    let after_body = response_json(after).await;
    assert_eq!(after_body["data"]["email"], "priya@example.com");
    assert_eq!(after_body["data"]["name"], "Priya K");

    let anonymous = app
        .request(Method::GET, "/api/v1/users/profile", None, None)
        .await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}
