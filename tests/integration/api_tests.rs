//! API integration tests
//!
//! These drive a running server (with PostgreSQL, Redis and outbound access
//! to the catalog and geocoder) on localhost:8080.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Client that keeps the session cookie between requests
fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

fn unique_name(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &suffix[..12])
}

/// Register a fresh user and log in; returns the client and the user body
async fn logged_in_user(prefix: &str) -> (Client, Value) {
    let client = session_client();
    let username = unique_name(prefix);

    let response = client
        .post(format!("{}/accounts", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.org", username),
            "password": "correct-horse-battery"
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(format!("{}/accounts/session", BASE_URL))
        .json(&json!({ "username": username, "password": "correct-horse-battery" }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);

    let user: Value = response.json().await.expect("Failed to parse login response");
    (client, user)
}

async fn create_library(client: &Client) -> Value {
    let response = client
        .post(format!("{}/libraries", BASE_URL))
        .json(&json!({ "name": unique_name("Shelf"), "location": "Berlin" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn add_copy(client: &Client, library_id: &str, open_library_id: &str) -> Value {
    let response = client
        .post(format!("{}/libraries/{}/copies", BASE_URL, library_id))
        .json(&json!({ "openLibraryId": open_library_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn copy_action(client: &Client, copy_id: &str, action: &str) -> reqwest::Response {
    client
        .patch(format!("{}/copies/{}", BASE_URL, copy_id))
        .json(&json!({ "action": action }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let response = Client::new()
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_username_is_conflict() {
    let client = Client::new();
    let username = unique_name("dup");

    for (email, expected) in [
        ("first@example.org", StatusCode::OK),
        ("second@example.org", StatusCode::CONFLICT),
    ] {
        let response = client
            .post(format!("{}/accounts", BASE_URL))
            .json(&json!({ "username": username, "email": email, "password": "long-enough-pw" }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), expected);
    }
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let response = Client::new()
        .post(format!("{}/accounts/session", BASE_URL))
        .json(&json!({ "username": "nobody_here", "password": "wrong-password" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_session_lifecycle() {
    let (client, user) = logged_in_user("sess").await;

    let response = client
        .get(format!("{}/accounts", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let me: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(me["id"], user["id"]);
    assert!(me.get("passwordHash").is_none());

    let response = client
        .delete(format!("{}/accounts/session", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/accounts", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_create_library_requires_session() {
    let response = Client::new()
        .post(format!("{}/libraries", BASE_URL))
        .json(&json!({ "name": "Corner Shelf", "location": "Berlin" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_flow() {
    let (owner, owner_user) = logged_in_user("owner").await;
    let library = create_library(&owner).await;
    let library_id = library["id"].as_str().expect("library id");
    assert_eq!(library["owner"]["id"], owner_user["id"]);
    assert_eq!(library["members"].as_array().map(Vec::len), Some(1));

    let (reader, reader_user) = logged_in_user("reader").await;
    let response = reader
        .post(format!("{}/libraries/{}/members", BASE_URL, library_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let members: Value = reader
        .get(format!("{}/libraries/{}/members", BASE_URL, library_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let member_ids: Vec<&Value> = members
        .as_array()
        .expect("members array")
        .iter()
        .map(|m| &m["id"])
        .collect();
    assert_eq!(member_ids.len(), 2);
    assert!(member_ids.contains(&&owner_user["id"]));
    assert!(member_ids.contains(&&reader_user["id"]));

    let library = add_copy(&owner, library_id, "OL1M").await;
    let copy = &library["copies"][0];
    assert_eq!(copy["status"], "available");
    let copy_id = copy["id"].as_str().expect("copy id").to_string();

    let response = copy_action(&reader, &copy_id, "borrow").await;
    assert_eq!(response.status(), StatusCode::OK);
    let borrowed: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(borrowed["status"], "borrowed");
    assert_eq!(borrowed["borrower"]["id"], reader_user["id"]);
    assert!(borrowed["dueDate"].is_string());

    // the owner is a member too, but the copy is taken
    let response = copy_action(&owner, &copy_id, "borrow").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // only the borrower may return it
    let response = copy_action(&owner, &copy_id, "return").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = copy_action(&reader, &copy_id, "return").await;
    assert_eq!(response.status(), StatusCode::OK);
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "available");
    assert!(returned["borrower"].is_null());
    assert!(returned["dueDate"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_invalid_copy_action_is_bad_request() {
    let (owner, _) = logged_in_user("act").await;
    let library = create_library(&owner).await;
    let library_id = library["id"].as_str().expect("library id");
    let library = add_copy(&owner, library_id, "OL1M").await;
    let copy_id = library["copies"][0]["id"].as_str().expect("copy id");

    let response = copy_action(&owner, copy_id, "steal").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_join_twice_is_conflict() {
    let (owner, _) = logged_in_user("host").await;
    let library = create_library(&owner).await;
    let library_id = library["id"].as_str().expect("library id");

    let (guest, _) = logged_in_user("guest").await;
    let url = format!("{}/libraries/{}/members", BASE_URL, library_id);

    let first = guest.post(&url).send().await.expect("Failed to send request");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = guest.post(&url).send().await.expect("Failed to send request");
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let summary: Value = guest
        .get(format!("{}/libraries/{}", BASE_URL, library_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(summary["members"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
#[ignore]
async fn test_leave_without_joining_is_forbidden() {
    let (owner, _) = logged_in_user("keeper").await;
    let library = create_library(&owner).await;
    let library_id = library["id"].as_str().expect("library id");

    let (stranger, _) = logged_in_user("stranger").await;
    let response = stranger
        .delete(format!("{}/libraries/{}/members", BASE_URL, library_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "not_a_member");
}

#[tokio::test]
#[ignore]
async fn test_same_catalog_book_shares_book_info() {
    let (owner, _) = logged_in_user("multi").await;
    let first = create_library(&owner).await;
    let second = create_library(&owner).await;

    let first = add_copy(&owner, first["id"].as_str().expect("id"), "OL1M").await;
    let second = add_copy(&owner, second["id"].as_str().expect("id"), "OL1M").await;

    let first_copy = &first["copies"][0];
    let second_copy = &second["copies"][0];
    assert_ne!(first_copy["id"], second_copy["id"]);
    assert_eq!(first_copy["bookInfo"]["id"], second_copy["bookInfo"]["id"]);
}

#[tokio::test]
#[ignore]
async fn test_user_details_list_owned_libraries() {
    let (owner, user) = logged_in_user("profile").await;
    let library = create_library(&owner).await;

    let username = user["username"].as_str().expect("username");
    let details: Value = owner
        .get(format!("{}/users/{}", BASE_URL, username))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(details["ownedLibraries"][0]["id"], library["id"]);
    assert_eq!(details["memberships"][0]["id"], library["id"]);
    assert_eq!(details["loans"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
#[ignore]
async fn test_search_without_query_is_bad_request() {
    let response = Client::new()
        .get(format!("{}/books/search", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

async fn join(client: &Client, library_id: &str) {
    let response = client
        .post(format!("{}/libraries/{}/members", BASE_URL, library_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
#[ignore]
async fn test_library_name_is_checked_after_trimming() {
    let (owner, _) = logged_in_user("trim").await;

    for name in ["     ", "  abc  "] {
        let response = owner
            .post(format!("{}/libraries", BASE_URL))
            .json(&json!({ "name": name, "location": "Berlin" }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "name {:?}", name);
    }

    let response = owner
        .post(format!("{}/libraries", BASE_URL))
        .json(&json!({ "name": "Corner Shelf", "location": "   " }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let library = create_library(&owner).await;
    let response = owner
        .patch(format!("{}/libraries/{}", BASE_URL, library["id"].as_str().expect("library id")))
        .json(&json!({ "name": "  abc  " }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrow_has_one_winner() {
    let (owner, _) = logged_in_user("race").await;
    let library = create_library(&owner).await;
    let library_id = library["id"].as_str().expect("library id");
    let library = add_copy(&owner, library_id, "OL1M").await;
    let copy_id = library["copies"][0]["id"].as_str().expect("copy id").to_string();

    let (first, first_user) = logged_in_user("racer").await;
    let (second, second_user) = logged_in_user("racer").await;
    join(&first, library_id).await;
    join(&second, library_id).await;

    let (a, b) = tokio::join!(
        copy_action(&first, &copy_id, "borrow"),
        copy_action(&second, &copy_id, "borrow")
    );

    let (winner, loser) = match (a.status(), b.status()) {
        (StatusCode::OK, _) => (&first_user, b.status()),
        (_, StatusCode::OK) => (&second_user, a.status()),
        other => panic!("expected one successful borrow, got {:?}", other),
    };
    assert!(
        loser == StatusCode::FORBIDDEN || loser == StatusCode::CONFLICT,
        "losing borrow returned {}",
        loser
    );

    let copy: Value = Client::new()
        .get(format!("{}/copies/{}", BASE_URL, copy_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(copy["status"], "borrowed");
    assert_eq!(copy["borrower"]["id"], winner["id"]);
}

#[tokio::test]
#[ignore]
async fn test_remove_copy_through_other_library_is_not_found() {
    let (owner, _) = logged_in_user("twin").await;
    let first = create_library(&owner).await;
    let second = create_library(&owner).await;
    let first_id = first["id"].as_str().expect("library id");
    let second_id = second["id"].as_str().expect("library id");

    let first = add_copy(&owner, first_id, "OL1M").await;
    let copy_id = first["copies"][0]["id"].as_str().expect("copy id");

    let response = owner
        .delete(format!("{}/libraries/{}/copies/{}", BASE_URL, second_id, copy_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // still in its own library
    let response = Client::new()
        .get(format!("{}/copies/{}", BASE_URL, copy_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = owner
        .delete(format!("{}/libraries/{}/copies/{}", BASE_URL, first_id, copy_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_owner_cannot_leave() {
    let (owner, owner_user) = logged_in_user("captain").await;
    let library = create_library(&owner).await;
    let library_id = library["id"].as_str().expect("library id");

    let response = owner
        .delete(format!("{}/libraries/{}/members", BASE_URL, library_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "forbidden");

    let library: Value = owner
        .get(format!("{}/libraries/{}", BASE_URL, library_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(library["members"][0]["id"], owner_user["id"]);
}

#[tokio::test]
#[ignore]
async fn test_non_owner_cannot_manage_library() {
    let (owner, _) = logged_in_user("boss").await;
    let library = create_library(&owner).await;
    let library_id = library["id"].as_str().expect("library id");

    let (member, _) = logged_in_user("helper").await;
    join(&member, library_id).await;

    let response = member
        .post(format!("{}/libraries/{}/copies", BASE_URL, library_id))
        .json(&json!({ "openLibraryId": "OL1M" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = member
        .patch(format!("{}/libraries/{}", BASE_URL, library_id))
        .json(&json!({ "name": "Taken Over" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = member
        .delete(format!("{}/libraries/{}", BASE_URL, library_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_non_member_cannot_borrow() {
    let (owner, _) = logged_in_user("lender").await;
    let library = create_library(&owner).await;
    let library_id = library["id"].as_str().expect("library id");
    let library = add_copy(&owner, library_id, "OL1M").await;
    let copy_id = library["copies"][0]["id"].as_str().expect("copy id");

    let (outsider, _) = logged_in_user("outsider").await;
    let response = copy_action(&outsider, copy_id, "borrow").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "not_a_member");
}

#[tokio::test]
#[ignore]
async fn test_extend_then_lose() {
    let (owner, _) = logged_in_user("extend").await;
    let library = create_library(&owner).await;
    let library_id = library["id"].as_str().expect("library id");
    let library = add_copy(&owner, library_id, "OL1M").await;
    let copy_id = library["copies"][0]["id"].as_str().expect("copy id").to_string();

    let (reader, _) = logged_in_user("keeper").await;
    join(&reader, library_id).await;

    let borrowed: Value = copy_action(&reader, &copy_id, "borrow")
        .await
        .json()
        .await
        .expect("Failed to parse response");
    let due: chrono::DateTime<chrono::Utc> = borrowed["dueDate"]
        .as_str()
        .expect("due date")
        .parse()
        .expect("Failed to parse due date");

    // only the borrower may extend
    let response = copy_action(&owner, &copy_id, "extend").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = copy_action(&reader, &copy_id, "extend").await;
    assert_eq!(response.status(), StatusCode::OK);
    let extended: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(extended["status"], "borrowed");
    let extended_due: chrono::DateTime<chrono::Utc> = extended["dueDate"]
        .as_str()
        .expect("due date")
        .parse()
        .expect("Failed to parse due date");
    assert!(extended_due > due);

    let response = copy_action(&reader, &copy_id, "lose").await;
    assert_eq!(response.status(), StatusCode::OK);
    let lost: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(lost["status"], "lost");

    let response = copy_action(&reader, &copy_id, "borrow").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "not_available");

    let response = copy_action(&owner, &copy_id, "lose").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
