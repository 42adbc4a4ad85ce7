use axum::http::StatusCode;
use serde_json::json;

mod common;

#[tokio::test]
async fn test_create_recipe_requires_auth() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (status, body) = common::send_json(
        &app,
        "POST",
        "/recipes",
        None,
        Some(json!({ "title": "Soup", "ingredients": ["water"] })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_create_recipe_sets_owner_and_preserves_order() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (token, user_id) = common::register_user(&app, "ann@example.com", "Ann").await;

    let (status, body) = common::send_json(
        &app,
        "POST",
        "/recipes",
        Some(&token),
        Some(json!({
            "title": "Soup",
            "description": "A simple soup",
            "ingredients": ["water", "salt", "pepper"],
            "steps": ["boil water", "add salt", "add pepper"],
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["owner_id"], user_id.as_str());
    assert_eq!(body["owner_name"], "Ann");
    assert_eq!(body["ingredients"], json!(["water", "salt", "pepper"]));
    assert_eq!(body["steps"], json!(["boil water", "add salt", "add pepper"]));
    assert!(body["avg_rating"].is_null());
    assert_eq!(body["rating_count"], 0);
}

#[tokio::test]
async fn test_create_recipe_without_ingredients_returns_validation_error() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (token, _) = common::register_user(&app, "ann@example.com", "Ann").await;

    let (status, body) = common::send_json(
        &app,
        "POST",
        "/recipes",
        Some(&token),
        Some(json!({ "title": "Air", "ingredients": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn test_get_nonexistent_recipe_returns_not_found() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (status, body) =
        common::send_json(&app, "GET", "/recipes/no-such-id", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_update_by_non_owner_returns_forbidden() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (ann_token, _) = common::register_user(&app, "ann@example.com", "Ann").await;
    let (bob_token, _) = common::register_user(&app, "bob@example.com", "Bob").await;

    let recipe_id = common::create_recipe(&app, &ann_token, "Soup").await;

    let (status, body) = common::send_json(
        &app,
        "PUT",
        &format!("/recipes/{recipe_id}"),
        Some(&bob_token),
        Some(json!({ "title": "Stolen Soup", "ingredients": ["water"] })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    // Owner can update
    let (status, body) = common::send_json(
        &app,
        "PUT",
        &format!("/recipes/{recipe_id}"),
        Some(&ann_token),
        Some(json!({ "title": "Better Soup", "ingredients": ["water", "salt"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Better Soup");
}

#[tokio::test]
async fn test_delete_by_non_owner_returns_forbidden() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (ann_token, _) = common::register_user(&app, "ann@example.com", "Ann").await;
    let (bob_token, _) = common::register_user(&app, "bob@example.com", "Bob").await;

    let recipe_id = common::create_recipe(&app, &ann_token, "Soup").await;

    let (status, _) = common::send_json(
        &app,
        "DELETE",
        &format!("/recipes/{recipe_id}"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::send_json(
        &app,
        "DELETE",
        &format!("/recipes/{recipe_id}"),
        Some(&ann_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        common::send_json(&app, "GET", &format!("/recipes/{recipe_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_cascades_ratings_and_favorites() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool.clone()).await;

    let (ann_token, _) = common::register_user(&app, "ann@example.com", "Ann").await;
    let (bob_token, _) = common::register_user(&app, "bob@example.com", "Bob").await;

    let recipe_id = common::create_recipe(&app, &ann_token, "Soup").await;

    common::send_json(
        &app,
        "POST",
        &format!("/recipes/{recipe_id}/rate"),
        Some(&bob_token),
        Some(json!({ "score": 4 })),
    )
    .await;
    common::send_json(
        &app,
        "POST",
        &format!("/recipes/{recipe_id}/favorite"),
        Some(&bob_token),
        None,
    )
    .await;

    common::send_json(
        &app,
        "DELETE",
        &format!("/recipes/{recipe_id}"),
        Some(&ann_token),
        None,
    )
    .await;

    let ratings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings")
        .fetch_one(&pool)
        .await
        .unwrap();
    let favorites: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(ratings, 0);
    assert_eq!(favorites, 0);
}

#[tokio::test]
async fn test_rating_twice_updates_not_duplicates() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (ann_token, _) = common::register_user(&app, "ann@example.com", "Ann").await;
    let (bob_token, _) = common::register_user(&app, "bob@example.com", "Bob").await;

    let recipe_id = common::create_recipe(&app, &ann_token, "Soup").await;

    let (status, body) = common::send_json(
        &app,
        "POST",
        &format!("/recipes/{recipe_id}/rate"),
        Some(&bob_token),
        Some(json!({ "score": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating_count"], 1);
    assert_eq!(body["avg_rating"], 2.0);

    // Same user rates again: the rating is replaced, not duplicated
    let (status, body) = common::send_json(
        &app,
        "POST",
        &format!("/recipes/{recipe_id}/rate"),
        Some(&bob_token),
        Some(json!({ "score": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating_count"], 1);
    assert_eq!(body["avg_rating"], 5.0);
}

#[tokio::test]
async fn test_aggregate_rating_is_mean_of_distinct_users() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (ann_token, _) = common::register_user(&app, "ann@example.com", "Ann").await;
    let (bob_token, _) = common::register_user(&app, "bob@example.com", "Bob").await;
    let (cat_token, _) = common::register_user(&app, "cat@example.com", "Cat").await;

    let recipe_id = common::create_recipe(&app, &ann_token, "Soup").await;

    for (token, score) in [(&bob_token, 2), (&cat_token, 5)] {
        let (status, _) = common::send_json(
            &app,
            "POST",
            &format!("/recipes/{recipe_id}/rate"),
            Some(token),
            Some(json!({ "score": score })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) =
        common::send_json(&app, "GET", &format!("/recipes/{recipe_id}"), None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating_count"], 2);
    assert_eq!(body["avg_rating"], 3.5);
}

#[tokio::test]
async fn test_rating_out_of_range_returns_validation_error() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (token, _) = common::register_user(&app, "ann@example.com", "Ann").await;
    let recipe_id = common::create_recipe(&app, &token, "Soup").await;

    for score in [0, 6] {
        let (status, body) = common::send_json(
            &app,
            "POST",
            &format!("/recipes/{recipe_id}/rate"),
            Some(&token),
            Some(json!({ "score": score })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "score {score}: {body}");
        assert_eq!(body["error"], "ValidationError");
    }
}

#[tokio::test]
async fn test_rating_nonexistent_recipe_returns_not_found() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (token, _) = common::register_user(&app, "ann@example.com", "Ann").await;

    let (status, _) = common::send_json(
        &app,
        "POST",
        "/recipes/no-such-id/rate",
        Some(&token),
        Some(json!({ "score": 3 })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favorite_toggle_is_an_involution() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (ann_token, _) = common::register_user(&app, "ann@example.com", "Ann").await;
    let (bob_token, bob_id) = common::register_user(&app, "bob@example.com", "Bob").await;

    let recipe_id = common::create_recipe(&app, &ann_token, "Soup").await;

    let (status, body) = common::send_json(
        &app,
        "POST",
        &format!("/recipes/{recipe_id}/favorite"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favorited"], true);
    assert_eq!(body["favorite_count"], 1);

    // The recipe now lists Bob in its favorite set
    let (_, body) =
        common::send_json(&app, "GET", &format!("/recipes/{recipe_id}"), None, None).await;
    assert_eq!(body["favorites"], json!([bob_id]));

    // Toggling again removes the favorite
    let (status, body) = common::send_json(
        &app,
        "POST",
        &format!("/recipes/{recipe_id}/favorite"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favorited"], false);
    assert_eq!(body["favorite_count"], 0);
}

#[tokio::test]
async fn test_favorites_listing_returns_only_callers_favorites() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (ann_token, _) = common::register_user(&app, "ann@example.com", "Ann").await;
    let (bob_token, _) = common::register_user(&app, "bob@example.com", "Bob").await;

    let soup_id = common::create_recipe(&app, &ann_token, "Soup").await;
    let _bread_id = common::create_recipe(&app, &ann_token, "Bread").await;

    common::send_json(
        &app,
        "POST",
        &format!("/recipes/{soup_id}/favorite"),
        Some(&bob_token),
        None,
    )
    .await;

    let (status, body) =
        common::send_json(&app, "GET", "/recipes/favorites", Some(&bob_token), None).await;

    assert_eq!(status, StatusCode::OK);
    let favorites = body.as_array().unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0]["id"], soup_id.as_str());

    // Ann favorited nothing
    let (_, body) =
        common::send_json(&app, "GET", "/recipes/favorites", Some(&ann_token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_by_user_returns_owned_recipes() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (ann_token, ann_id) = common::register_user(&app, "ann@example.com", "Ann").await;
    let (bob_token, _) = common::register_user(&app, "bob@example.com", "Bob").await;

    common::create_recipe(&app, &ann_token, "Soup").await;
    common::create_recipe(&app, &ann_token, "Bread").await;
    common::create_recipe(&app, &bob_token, "Cake").await;

    let (status, body) =
        common::send_json(&app, "GET", &format!("/recipes/user/{ann_id}"), None, None).await;

    assert_eq!(status, StatusCode::OK);
    let recipes = body.as_array().unwrap();
    assert_eq!(recipes.len(), 2);
    assert!(recipes.iter().all(|r| r["owner_id"] == ann_id.as_str()));
}

#[tokio::test]
async fn test_list_supports_search_and_pagination() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (token, _) = common::register_user(&app, "ann@example.com", "Ann").await;

    for title in ["Tomato Soup", "Onion Soup", "Carrot Cake"] {
        common::create_recipe(&app, &token, title).await;
    }

    let (status, body) = common::send_json(&app, "GET", "/recipes?search=Soup", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = common::send_json(&app, "GET", "/recipes?limit=2&page=1", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = common::send_json(&app, "GET", "/recipes?limit=2&page=2", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_profile_update_changes_name_and_rejects_taken_email() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (ann_token, _) = common::register_user(&app, "ann@example.com", "Ann").await;
    common::register_user(&app, "bob@example.com", "Bob").await;

    let (status, body) = common::send_json(
        &app,
        "PUT",
        "/users/profile",
        Some(&ann_token),
        Some(json!({ "name": "Ann Smith" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ann Smith");
    assert_eq!(body["email"], "ann@example.com");

    let (status, body) = common::send_json(
        &app,
        "PUT",
        "/users/profile",
        Some(&ann_token),
        Some(json!({ "email": "bob@example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DuplicateEmail");
}

/// End-to-end scenario: register -> login -> create -> rate by second user
/// -> fetch shows aggregate rating 5
#[tokio::test]
async fn test_end_to_end_recipe_flow() {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool).await;

    let (_, _ann_id) = common::register_user(&app, "a@x.com", "Ann").await;

    let (status, body) = common::send_json(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "a@x.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ann_token = body["token"].as_str().unwrap().to_string();

    let (status, body) = common::send_json(
        &app,
        "POST",
        "/recipes",
        Some(&ann_token),
        Some(json!({ "title": "Soup", "ingredients": ["water", "salt"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let recipe_id = body["id"].as_str().unwrap().to_string();

    let (rater_token, _) = common::register_user(&app, "b@x.com", "Bea").await;

    let (status, _) = common::send_json(
        &app,
        "POST",
        &format!("/recipes/{recipe_id}/rate"),
        Some(&rater_token),
        Some(json!({ "score": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        common::send_json(&app, "GET", &format!("/recipes/{recipe_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["avg_rating"], 5.0);
    assert_eq!(body["rating_count"], 1);
}
