//! API integration tests
//!
//! These run against a live server with a clean database:
//! cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

/// Unique suffix so repeated runs do not collide on unique columns
fn unique_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

/// Register a user with the given role and return (token, user id)
async fn register_user(client: &Client, role: &str) -> (String, i64) {
    let suffix = unique_suffix();
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": format!("Test {}", role),
            "email": format!("{}-{}@labdesk.test", role, suffix),
            "password": "secret123",
            "department": "Mechanical",
            "roll_number": format!("R{}", suffix),
            "phone": "5550100",
            "role": role
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse register response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    let user_id = body["user"]["id"].as_i64().expect("No user id");
    (token, user_id)
}

/// Create a piece of equipment and return its id
async fn create_equipment(client: &Client, token: &str, total_quantity: i64, requires_training: bool) -> i64 {
    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "name": format!("Oscilloscope {}", unique_suffix()),
            "description": "4-channel 200 MHz oscilloscope",
            "category": "Electronics",
            "location": "Lab 101",
            "total_quantity": total_quantity,
            "requires_training": requires_training
        }))
        .send()
        .await
        .expect("Failed to send create equipment request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse equipment response");
    body["id"].as_i64().expect("No equipment id")
}

/// Fetch the current available quantity for a piece of equipment
async fn available_quantity(client: &Client, equipment_id: i64) -> i64 {
    let response = client
        .get(format!("{}/equipment/{}", BASE_URL, equipment_id))
        .send()
        .await
        .expect("Failed to fetch equipment");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse equipment");
    body["available_quantity"].as_i64().expect("No available_quantity")
}

/// Create a reservation for the given equipment and return its id
async fn create_reservation(client: &Client, token: &str, equipment_id: i64, quantity: i64) -> i64 {
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "equipment_id": equipment_id,
            "project": {
                "title": "Signal integrity study",
                "description": "Probing switching regulator ripple"
            },
            "requested_start_time": "2030-01-01T09:00:00Z",
            "requested_end_time": "2030-01-01T17:00:00Z",
            "quantity": quantity
        }))
        .send()
        .await
        .expect("Failed to send create reservation request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse reservation");
    body["id"].as_i64().expect("No reservation id")
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
async fn test_register_and_login() {
    let client = Client::new();
    let suffix = unique_suffix();
    let email = format!("student-{}@labdesk.test", suffix);

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "name": "Test Student",
            "email": email,
            "password": "secret123",
            "department": "Electronics",
            "roll_number": format!("R{}", suffix),
            "phone": "5550100"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["role"], "student");

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "secret123" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (_, _) = register_user(&client, "student").await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": "nobody@labdesk.test", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/reservations", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_student_cannot_create_equipment() {
    let client = Client::new();
    let (student_token, _) = register_user(&client, "student").await;

    let response = client
        .post(format!("{}/equipment", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token))
        .json(&json!({
            "name": "Unauthorized Lathe",
            "description": "Should not be created",
            "category": "Mechanical",
            "location": "Lab 1",
            "total_quantity": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

/// The full workflow walkthrough: quantity 3 against capacity 5.
/// Pending leaves the counter untouched; approve takes it to 2; checkout
/// flips to in_use; checkin completes and restores the counter to 5.
#[tokio::test]
#[ignore]
async fn test_reservation_workflow_walkthrough() {
    let client = Client::new();
    let (faculty_token, _) = register_user(&client, "faculty").await;
    let (student_token, _) = register_user(&client, "student").await;

    let equipment_id = create_equipment(&client, &faculty_token, 5, false).await;
    assert_eq!(available_quantity(&client, equipment_id).await, 5);

    let reservation_id = create_reservation(&client, &student_token, equipment_id, 3).await;
    assert_eq!(available_quantity(&client, equipment_id).await, 5);

    // Approve
    let response = client
        .put(format!("{}/reservations/{}/approve", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&json!({ "approval_comments": "Collect from the front desk" }))
        .send()
        .await
        .expect("Failed to send approve request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse approve response");
    assert_eq!(body["status"], "approved");
    assert_eq!(available_quantity(&client, equipment_id).await, 2);

    // Checkout
    let response = client
        .put(format!("{}/reservations/{}/checkout", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .send()
        .await
        .expect("Failed to send checkout request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse checkout response");
    assert_eq!(body["status"], "in_use");
    assert!(body["actual_start_time"].is_string());

    // Checkin
    let response = client
        .put(format!("{}/reservations/{}/checkin", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&json!({ "condition_after_use": "good", "usage_notes": "No issues" }))
        .send()
        .await
        .expect("Failed to send checkin request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse checkin response");
    assert_eq!(body["status"], "completed");
    assert_eq!(available_quantity(&client, equipment_id).await, 5);
}

#[tokio::test]
#[ignore]
async fn test_create_reservation_insufficient_quantity() {
    let client = Client::new();
    let (faculty_token, _) = register_user(&client, "faculty").await;
    let (student_token, _) = register_user(&client, "student").await;

    let equipment_id = create_equipment(&client, &faculty_token, 2, false).await;

    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token))
        .json(&json!({
            "equipment_id": equipment_id,
            "project": { "title": "Overask", "description": "Requests more than exists" },
            "requested_start_time": "2030-01-01T09:00:00Z",
            "requested_end_time": "2030-01-01T17:00:00Z",
            "quantity": 3
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    assert_eq!(available_quantity(&client, equipment_id).await, 2);
}

#[tokio::test]
#[ignore]
async fn test_training_gate() {
    let client = Client::new();
    let (faculty_token, _) = register_user(&client, "faculty").await;
    let (student_token, student_id) = register_user(&client, "student").await;

    let equipment_id = create_equipment(&client, &faculty_token, 2, true).await;

    // Without training the request is rejected
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token))
        .json(&json!({
            "equipment_id": equipment_id,
            "project": { "title": "Laser cutting", "description": "Enclosure panels" },
            "requested_start_time": "2030-01-01T09:00:00Z",
            "requested_end_time": "2030-01-01T12:00:00Z",
            "quantity": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    // Record training
    let response = client
        .post(format!("{}/users/{}/training", BASE_URL, student_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&json!({ "equipment_id": equipment_id }))
        .send()
        .await
        .expect("Failed to send training request");
    assert_eq!(response.status(), 204);

    // The same request now succeeds
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token))
        .json(&json!({
            "equipment_id": equipment_id,
            "project": { "title": "Laser cutting", "description": "Enclosure panels" },
            "requested_start_time": "2030-01-01T09:00:00Z",
            "requested_end_time": "2030-01-01T12:00:00Z",
            "quantity": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    // The profile lists the completed training
    let response = client
        .get(format!("{}/auth/profile", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("Failed to send profile request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse profile");
    let trained: Vec<i64> = body["completed_training"]
        .as_array()
        .expect("No completed_training")
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    assert!(trained.contains(&equipment_id));
}

#[tokio::test]
#[ignore]
async fn test_reject_requires_reason() {
    let client = Client::new();
    let (faculty_token, _) = register_user(&client, "faculty").await;
    let (student_token, _) = register_user(&client, "student").await;

    let equipment_id = create_equipment(&client, &faculty_token, 1, false).await;
    let reservation_id = create_reservation(&client, &student_token, equipment_id, 1).await;

    let response = client
        .put(format!("{}/reservations/{}/reject", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);

    let response = client
        .put(format!("{}/reservations/{}/reject", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&json!({ "rejection_reason": "Equipment reserved for coursework" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "rejected");

    // Rejection never touches the counter
    assert_eq!(available_quantity(&client, equipment_id).await, 1);
}

#[tokio::test]
#[ignore]
async fn test_illegal_transition_is_rejected() {
    let client = Client::new();
    let (faculty_token, _) = register_user(&client, "faculty").await;
    let (student_token, _) = register_user(&client, "student").await;

    let equipment_id = create_equipment(&client, &faculty_token, 2, false).await;
    let reservation_id = create_reservation(&client, &student_token, equipment_id, 1).await;

    let response = client
        .put(format!("{}/reservations/{}/approve", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Approving an already-approved reservation must not double-decrement
    let response = client
        .put(format!("{}/reservations/{}/approve", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
    assert_eq!(available_quantity(&client, equipment_id).await, 1);

    // Checkin before checkout is illegal too
    let response = client
        .put(format!("{}/reservations/{}/checkin", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

/// Two approvals racing for the last units: the conditional decrement lets
/// exactly one commit, the other fails without touching any state.
#[tokio::test]
#[ignore]
async fn test_concurrent_approvals_cannot_oversell() {
    let client = Client::new();
    let (faculty_token, _) = register_user(&client, "faculty").await;
    let (student_token, _) = register_user(&client, "student").await;

    let equipment_id = create_equipment(&client, &faculty_token, 2, false).await;
    let first = create_reservation(&client, &student_token, equipment_id, 2).await;
    let second = create_reservation(&client, &student_token, equipment_id, 2).await;

    let approve = |id: i64| {
        client
            .put(format!("{}/reservations/{}/approve", BASE_URL, id))
            .header("Authorization", format!("Bearer {}", faculty_token))
            .json(&json!({}))
            .send()
    };

    let (first_response, second_response) = tokio::join!(approve(first), approve(second));
    let first_ok = first_response.expect("First approve failed to send").status().is_success();
    let second_ok = second_response.expect("Second approve failed to send").status().is_success();

    assert!(
        first_ok != second_ok,
        "Exactly one of two competing approvals must succeed (got {} and {})",
        first_ok,
        second_ok
    );
    assert_eq!(available_quantity(&client, equipment_id).await, 0);
}

#[tokio::test]
#[ignore]
async fn test_student_sees_only_own_reservations() {
    let client = Client::new();
    let (faculty_token, _) = register_user(&client, "faculty").await;
    let (student_a_token, student_a_id) = register_user(&client, "student").await;
    let (student_b_token, _) = register_user(&client, "student").await;

    let equipment_id = create_equipment(&client, &faculty_token, 4, false).await;
    create_reservation(&client, &student_a_token, equipment_id, 1).await;
    create_reservation(&client, &student_b_token, equipment_id, 1).await;

    let response = client
        .get(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_a_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    for reservation in body.as_array().expect("Expected an array") {
        assert_eq!(reservation["user"]["id"].as_i64().unwrap(), student_a_id);
    }
}

#[tokio::test]
#[ignore]
async fn test_equipment_status_utilization() {
    let client = Client::new();
    let (faculty_token, _) = register_user(&client, "faculty").await;
    let (student_token, _) = register_user(&client, "student").await;

    let equipment_id = create_equipment(&client, &faculty_token, 10, false).await;
    let reservation_id = create_reservation(&client, &student_token, equipment_id, 6).await;

    let response = client
        .put(format!("{}/reservations/{}/approve", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    assert_eq!(available_quantity(&client, equipment_id).await, 4);

    let response = client
        .get(format!("{}/reports/equipment-status", BASE_URL))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");

    let entry = body
        .as_array()
        .expect("Expected an array")
        .iter()
        .find(|e| e["id"].as_i64() == Some(equipment_id))
        .expect("Equipment missing from status report");
    assert_eq!(entry["utilization_rate"].as_f64().unwrap(), 60.0);
}

#[tokio::test]
#[ignore]
async fn test_usage_report_totals() {
    let client = Client::new();
    let (faculty_token, _) = register_user(&client, "faculty").await;
    let (student_token, _) = register_user(&client, "student").await;

    let equipment_id = create_equipment(&client, &faculty_token, 3, false).await;
    let reservation_id = create_reservation(&client, &student_token, equipment_id, 1).await;

    for step in ["approve", "checkout"] {
        let response = client
            .put(format!("{}/reservations/{}/{}", BASE_URL, reservation_id, step))
            .header("Authorization", format!("Bearer {}", faculty_token))
            .json(&json!({}))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
    }
    let response = client
        .put(format!("{}/reservations/{}/checkin", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .json(&json!({ "condition_after_use": "excellent" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/reports/usage?equipment_id={}", BASE_URL, equipment_id))
        .header("Authorization", format!("Bearer {}", faculty_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");

    let summary = body["summary"].as_array().expect("No summary");
    let entry = summary
        .iter()
        .find(|e| e["equipment_id"].as_i64() == Some(equipment_id))
        .expect("Equipment missing from summary");
    assert_eq!(entry["total_bookings"].as_i64().unwrap(), 1);
    assert!(entry["total_hours"].as_f64().unwrap() >= 0.0);
}
