mod common;

use axum::http::{Method, StatusCode};
use common::{car_body, spawn_app, MultipartBody};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn create_and_fetch_car() {
    let app = spawn_app();
    let (token, owner_id) = app.register("Owner", "owner@example.com", "renter").await;

    let car = app.create_car(&token, car_body("Toyota RAV4", 80.0)).await;
    assert_eq!(car["name"], "Toyota RAV4");
    assert_eq!(car["type"], "SUV");
    assert_eq!(car["isAvailable"], true);
    assert_eq!(car["rating"], 0.0);
    assert_eq!(car["specs"]["luggage"], 3);
    assert_eq!(car["owner"]["id"], owner_id);
    assert_eq!(car["owner"]["email"], "owner@example.com");

    let id = car["id"].as_str().unwrap();
    let fetched = app.get(&format!("/api/cars/{}", id), None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["success"], true);
    assert_eq!(fetched.body["data"]["id"], id);
}

#[tokio::test]
async fn create_requires_authentication() {
    let app = spawn_app();
    let resp = app
        .json(Method::POST, "/api/cars", None, car_body("Ghost", 10.0))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn owner_in_body_is_ignored() {
    let app = spawn_app();
    let (token, owner_id) = app.register("Owner", "owner@example.com", "renter").await;

    let mut body = car_body("Mine", 10.0);
    body["owner"] = json!(Uuid::new_v4().to_string());
    let car = app.create_car(&token, body).await;
    assert_eq!(car["owner"]["id"], owner_id);
}

#[tokio::test]
async fn create_rejects_incomplete_listing() {
    let app = spawn_app();
    let (token, _) = app.register("Owner", "owner@example.com", "renter").await;

    let mut no_images = car_body("No pictures", 10.0);
    no_images["images"] = json!([]);
    let resp = app.json(Method::POST, "/api/cars", Some(&token), no_images).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["message"], "Please provide at least one image");

    let mut negative = car_body("Free money", 10.0);
    negative["price"] = json!(-5);
    let resp = app.json(Method::POST, "/api/cars", Some(&token), negative).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["message"], "Price per day cannot be negative");
}

#[tokio::test]
async fn missing_car_is_not_found() {
    let app = spawn_app();
    let resp = app
        .get(&format!("/api/cars/{}", Uuid::new_v4()), None)
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["success"], false);
    assert_eq!(resp.body["message"], "Car not found");
}

#[tokio::test]
async fn list_supports_filters() {
    let app = spawn_app();
    let (token, _) = app.register("Owner", "owner@example.com", "renter").await;

    app.create_car(&token, car_body("Budget Hatch", 25.0)).await;
    app.create_car(&token, car_body("Luxury Cruiser", 250.0)).await;

    let all = app.get("/api/cars", None).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["count"], 2);

    let cheap = app.get("/api/cars?maxPrice=100", None).await;
    assert_eq!(cheap.body["count"], 1);
    assert_eq!(cheap.body["data"][0]["name"], "Budget Hatch");

    let search = app.get("/api/cars?search=luxury", None).await;
    assert_eq!(search.body["count"], 1);
    assert_eq!(search.body["data"][0]["name"], "Luxury Cruiser");

    let elsewhere = app.get("/api/cars?location=porto", None).await;
    assert_eq!(elsewhere.body["count"], 0);
}

#[tokio::test]
async fn only_owner_or_admin_can_update() {
    let app = spawn_app();
    let (owner, _) = app.register("Owner", "owner@example.com", "renter").await;
    let (stranger, _) = app.register("Stranger", "stranger@example.com", "renter").await;
    let admin = app.admin_token().await;

    let car = app.create_car(&owner, car_body("Golf", 40.0)).await;
    let uri = format!("/api/cars/{}", car["id"].as_str().unwrap());

    let denied = app
        .json(Method::PUT, &uri, Some(&stranger), json!({ "price": 1.0 }))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.body["message"], "Not authorized to update this car");

    let by_owner = app
        .json(Method::PUT, &uri, Some(&owner), json!({ "price": 45.0 }))
        .await;
    assert_eq!(by_owner.status, StatusCode::OK);
    assert_eq!(by_owner.body["data"]["price"], 45.0);
    assert_eq!(by_owner.body["data"]["name"], "Golf");

    let by_admin = app
        .json(Method::PUT, &uri, Some(&admin), json!({ "name": "Golf GTI" }))
        .await;
    assert_eq!(by_admin.status, StatusCode::OK);
    assert_eq!(by_admin.body["data"]["name"], "Golf GTI");
    assert_eq!(by_admin.body["data"]["price"], 45.0);

    let missing = app
        .json(
            Method::PUT,
            &format!("/api/cars/{}", Uuid::new_v4()),
            Some(&owner),
            json!({ "price": 1.0 }),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_owner_or_admin_can_delete() {
    let app = spawn_app();
    let (owner, _) = app.register("Owner", "owner@example.com", "renter").await;
    let (stranger, _) = app.register("Stranger", "stranger@example.com", "renter").await;
    let admin = app.admin_token().await;

    let first = app.create_car(&owner, car_body("First", 40.0)).await;
    let second = app.create_car(&owner, car_body("Second", 40.0)).await;
    let first_uri = format!("/api/cars/{}", first["id"].as_str().unwrap());
    let second_uri = format!("/api/cars/{}", second["id"].as_str().unwrap());

    let denied = app.bare(Method::DELETE, &first_uri, Some(&stranger)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.body["message"], "Not authorized to delete this car");

    let deleted = app.bare(Method::DELETE, &first_uri, Some(&owner)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, json!({ "success": true, "data": {} }));
    assert_eq!(app.get(&first_uri, None).await.status, StatusCode::NOT_FOUND);

    let by_admin = app.bare(Method::DELETE, &second_uri, Some(&admin)).await;
    assert_eq!(by_admin.status, StatusCode::OK);

    let again = app.bare(Method::DELETE, &second_uri, Some(&owner)).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn my_cars_lists_only_callers_listings() {
    let app = spawn_app();
    let (owner, _) = app.register("Owner", "owner@example.com", "renter").await;
    let (other, _) = app.register("Other", "other@example.com", "renter").await;

    app.create_car(&owner, car_body("Mine", 40.0)).await;
    app.create_car(&other, car_body("Theirs", 40.0)).await;

    let resp = app.get("/api/cars/user/mycars", Some(&owner)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["count"], 1);
    assert_eq!(resp.body["data"][0]["name"], "Mine");

    let anonymous = app.get("/api/cars/user/mycars", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn availability_toggle() {
    let app = spawn_app();
    let (owner, _) = app.register("Owner", "owner@example.com", "renter").await;
    let (stranger, _) = app.register("Stranger", "stranger@example.com", "renter").await;

    let car = app.create_car(&owner, car_body("Polo", 30.0)).await;
    let uri = format!("/api/cars/{}/availability", car["id"].as_str().unwrap());

    let invalid = app
        .json(Method::PATCH, &uri, Some(&owner), json!({ "isAvailable": "no" }))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["message"], "Invalid availability status");

    let not_owner = app
        .json(Method::PATCH, &uri, Some(&stranger), json!({ "isAvailable": false }))
        .await;
    assert_eq!(not_owner.status, StatusCode::NOT_FOUND);
    assert_eq!(not_owner.body["message"], "Car not found or not owned by user");

    let off = app
        .json(Method::PATCH, &uri, Some(&owner), json!({ "isAvailable": false }))
        .await;
    assert_eq!(off.status, StatusCode::OK);
    assert_eq!(off.body["data"]["isAvailable"], false);
    assert_eq!(off.body["message"], "Car is now unavailable for rent");

    let on = app
        .json(Method::PATCH, &uri, Some(&owner), json!({ "isAvailable": true }))
        .await;
    assert_eq!(on.body["message"], "Car is now available for rent");

    let available = app.get("/api/cars?available=true", None).await;
    assert_eq!(available.body["count"], 1);
}

#[tokio::test]
async fn multipart_listing_is_normalized() {
    let app = spawn_app();
    let (token, _) = app.register("Owner", "owner@example.com", "renter").await;

    let form = MultipartBody::new()
        .text("name", "Jeep Wrangler")
        .text("type", "SUV")
        .text("location", "Faro")
        .text("passengers", "4")
        .text("transmission", "Manual")
        .text("airConditioning", "true")
        .text("doors", "2")
        .text("price", "95.5")
        .text("category", "Adventure")
        .text("description", "Top down, all terrain")
        .text("features[]", "4x4")
        .text("features[]", "Removable roof")
        .text("specs[luggage]", "2")
        .text("specs[fuelType]", "Petrol")
        .text("isAvailable", "false")
        .file("images", "front.jpg", "image/jpeg", b"front-bytes")
        .file("images", "side.png", "image/png", b"side-bytes");

    let resp = app
        .multipart(Method::POST, "/api/cars", Some(&token), form)
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.text);

    let car = &resp.body["data"];
    assert_eq!(car["passengers"], 4);
    assert_eq!(car["doors"], 2);
    assert_eq!(car["price"], 95.5);
    assert_eq!(car["airConditioning"], true);
    assert_eq!(car["isAvailable"], false);
    assert_eq!(car["features"], json!(["4x4", "Removable roof"]));
    assert_eq!(car["specs"]["luggage"], 2);
    assert_eq!(car["specs"]["passengers"], 4);
    assert_eq!(car["specs"]["fuelType"], "Petrol");

    let images = car["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    for url in images {
        assert!(url.as_str().unwrap().starts_with("/uploads/car-rental/"));
    }
    let first = app.get(images[0].as_str().unwrap(), None).await;
    assert_eq!(first.text, "front-bytes");
}

#[tokio::test]
async fn multipart_update_replaces_images() {
    let app = spawn_app();
    let (token, _) = app.register("Owner", "owner@example.com", "renter").await;
    let car = app.create_car(&token, car_body("Clio", 35.0)).await;
    let uri = format!("/api/cars/{}", car["id"].as_str().unwrap());

    let resp = app
        .multipart(
            Method::PUT,
            &uri,
            Some(&token),
            MultipartBody::new()
                .text("price", "39")
                .file("images", "new.jpg", "image/jpeg", b"new-bytes"),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{}", resp.text);

    let images = resp.body["data"]["images"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert!(images[0].as_str().unwrap().ends_with("new.jpg"));
    assert_eq!(resp.body["data"]["price"], 39.0);
    assert_eq!(resp.body["data"]["name"], "Clio");
}

#[tokio::test]
async fn image_upload_endpoint() {
    let app = spawn_app();
    let (token, _) = app.register("Owner", "owner@example.com", "renter").await;

    let ok = app
        .multipart(
            Method::POST,
            "/api/images/upload",
            Some(&token),
            MultipartBody::new()
                .file("images", "a.jpg", "image/jpeg", b"a")
                .file("images", "b.gif", "image/gif", b"b"),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK, "{}", ok.text);
    assert_eq!(ok.body["success"], true);
    assert_eq!(ok.body["imageUrls"].as_array().unwrap().len(), 2);

    let empty = app
        .multipart(
            Method::POST,
            "/api/images/upload",
            Some(&token),
            MultipartBody::new().text("caption", "nothing attached"),
        )
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.body["message"], "Please upload at least one image");

    let not_image = app
        .multipart(
            Method::POST,
            "/api/images/upload",
            Some(&token),
            MultipartBody::new().file("images", "notes.txt", "text/plain", b"hello"),
        )
        .await;
    assert_eq!(not_image.status, StatusCode::BAD_REQUEST);
    assert_eq!(not_image.body["message"], "Only image files are allowed!");

    let mut too_many = MultipartBody::new();
    for i in 0..6 {
        too_many = too_many.file("images", &format!("{}.jpg", i), "image/jpeg", b"x");
    }
    let resp = app
        .multipart(Method::POST, "/api/images/upload", Some(&token), too_many)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let anonymous = app
        .multipart(
            Method::POST,
            "/api/images/upload",
            None,
            MultipartBody::new().file("images", "a.jpg", "image/jpeg", b"a"),
        )
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleted_account_cannot_create_a_car() {
    let app = spawn_app();
    let (token, _) = app.register("Owner", "owner@example.com", "renter").await;

    let deleted = app.bare(Method::DELETE, "/api/auth/delete", Some(&token)).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let resp = app
        .json(Method::POST, "/api/cars", Some(&token), car_body("Ghost", 10.0))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["success"], false);
    assert_eq!(resp.body["message"], "User not found");

    let cars = app.get("/api/cars", None).await;
    assert_eq!(cars.body["count"], 0);
}

#[tokio::test]
async fn multipart_price_must_be_a_finite_number() {
    let app = spawn_app();
    let (token, _) = app.register("Owner", "owner@example.com", "renter").await;

    for raw in ["NaN", "inf"] {
        let form = MultipartBody::new()
            .text("name", "Broken")
            .text("type", "SUV")
            .text("location", "Faro")
            .text("passengers", "4")
            .text("transmission", "Manual")
            .text("doors", "4")
            .text("price", raw)
            .text("category", "Economy")
            .text("description", "Priced wrong")
            .file("images", "front.jpg", "image/jpeg", b"front-bytes");
        let resp = app
            .multipart(Method::POST, "/api/cars", Some(&token), form)
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{}", resp.text);
        assert!(resp.body["message"]
            .as_str()
            .is_some_and(|m| m.starts_with("Invalid value for price")));
    }

    let cars = app.get("/api/cars", None).await;
    assert_eq!(cars.body["count"], 0);
}

#[tokio::test]
async fn malformed_requests_get_json_error_bodies() {
    let app = spawn_app();
    let (token, _) = app.register("Owner", "owner@example.com", "renter").await;
    let car = app.create_car(&token, car_body("Polo", 30.0)).await;

    let bad_id = app.get("/api/cars/not-a-uuid", None).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["success"], false);
    assert!(bad_id.body["message"].is_string());

    let bad_query = app.get("/api/cars?minPrice=abc", None).await;
    assert_eq!(bad_query.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_query.body["success"], false);
    assert!(bad_query.body["message"].is_string());

    let no_body = app.bare(Method::POST, "/api/auth/register", None).await;
    assert_eq!(no_body.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_body.body["success"], false);
    assert!(no_body.body["message"].is_string());

    let uri = format!("/api/cars/{}/availability", car["id"].as_str().unwrap());
    let no_flag = app.bare(Method::PATCH, &uri, Some(&token)).await;
    assert_eq!(no_flag.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_flag.body["message"], "Invalid availability status");
}
