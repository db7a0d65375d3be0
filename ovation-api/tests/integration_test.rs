use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use ovation_api::{app, AppState};
use ovation_booking::{BookingEngine, EngineLimits, MemoryStore};
use ovation_catalog::{build_zone_seats, StaticCatalog};
use ovation_core::repository::ReservationStore;
use ovation_core::StaticIdentity;
use ovation_shared::ZoneInfo;

struct TestStage {
    app: Router,
    concert_id: Uuid,
    zone_id: Uuid,
    seat_ids: Vec<Uuid>,
    user_id: Uuid,
}

async fn stage() -> TestStage {
    let concert_id = Uuid::new_v4();
    let zone = ZoneInfo::new(concert_id, "Arena", 150_00, 6);
    let zone_id = zone.zone_id;
    let seats = build_zone_seats(&zone, 3);
    let seat_ids: Vec<Uuid> = seats.iter().map(|s| s.seat_id).collect();

    let mut catalog = StaticCatalog::new();
    catalog.add_zone_with_seats(zone, &seats);
    let catalog = Arc::new(catalog);

    let store = Arc::new(MemoryStore::new());
    store.insert_seats(&seats).await.unwrap();

    let engine = Arc::new(BookingEngine::new(
        store,
        catalog.clone(),
        Arc::new(StaticIdentity::allow_all()),
        EngineLimits::default(),
    ));

    let (events_tx, _) = tokio::sync::broadcast::channel(16);

    let state = AppState {
        engine,
        catalog,
        events_tx,
    };

    TestStage {
        app: app(state),
        concert_id,
        zone_id,
        seat_ids,
        user_id: Uuid::new_v4(),
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn create_body(stage: &TestStage, seats: &[Uuid]) -> Value {
    json!({
        "user_id": stage.user_id,
        "concert_id": stage.concert_id,
        "zone_id": stage.zone_id,
        "seat_ids": seats,
    })
}

#[tokio::test]
async fn test_booking_lifecycle_over_http() {
    let st = stage().await;

    // Create
    let (status, body) = send(
        &st.app,
        Method::POST,
        "/v1/bookings",
        Some(create_body(&st, &st.seat_ids[..2])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["total_cents"], 300_00);
    let booking_id = body["booking_id"].as_str().unwrap().to_string();

    // Confirm issues one ticket per seat
    let (status, body) = send(
        &st.app,
        Method::POST,
        &format!("/v1/bookings/{}/confirm", booking_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["status"], "CONFIRMED");
    let tickets = body["tickets"].as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    assert!(tickets.iter().all(|t| t["code"].as_str().unwrap().starts_with("OVN-")));

    // Tickets are retrievable afterwards
    let (status, body) = send(
        &st.app,
        Method::GET,
        &format!("/v1/bookings/{}/tickets", booking_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Confirmed is terminal: cancel is rejected
    let (status, _) = send(
        &st.app,
        Method::POST,
        &format!("/v1/bookings/{}/cancel", booking_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_seat_conflict_maps_to_409_with_ids() {
    let st = stage().await;

    let (status, _) = send(
        &st.app,
        Method::POST,
        "/v1/bookings",
        Some(create_body(&st, &st.seat_ids[..2])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &st.app,
        Method::POST,
        "/v1/bookings",
        Some(create_body(&st, &st.seat_ids[1..3])),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let conflicting = body["conflicting_seats"].as_array().unwrap();
    assert_eq!(conflicting.len(), 1);
    assert_eq!(conflicting[0], st.seat_ids[1].to_string());
}

#[tokio::test]
async fn test_validation_and_not_found_mappings() {
    let st = stage().await;

    // Empty seat set
    let (status, body) = send(
        &st.app,
        Method::POST,
        "/v1/bookings",
        Some(create_body(&st, &[])),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("at least one seat"));

    // Unknown booking
    let (status, _) = send(
        &st.app,
        Method::GET,
        &format!("/v1/bookings/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_frees_seats_in_seat_map() {
    let st = stage().await;

    let (_, body) = send(
        &st.app,
        Method::POST,
        "/v1/bookings",
        Some(create_body(&st, &st.seat_ids[..3])),
    )
    .await;
    let booking_id = body["booking_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &st.app,
        Method::POST,
        &format!("/v1/bookings/{}/cancel", booking_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["released_seats"].as_array().unwrap().len(), 3);
    assert_eq!(body["already_cancelled"], false);

    let (status, body) = send(
        &st.app,
        Method::GET,
        &format!(
            "/v1/concerts/{}/zones/{}/seats",
            st.concert_id, st.zone_id
        ),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let seats = body["seats"].as_array().unwrap();
    assert_eq!(seats.len(), 6);
    assert!(seats.iter().all(|s| s["state"] == "AVAILABLE"));
}

#[tokio::test]
async fn test_user_ticket_listing() {
    let st = stage().await;

    let (_, body) = send(
        &st.app,
        Method::POST,
        "/v1/bookings",
        Some(create_body(&st, &st.seat_ids[..2])),
    )
    .await;
    let booking_id = body["booking_id"].as_str().unwrap().to_string();
    send(
        &st.app,
        Method::POST,
        &format!("/v1/bookings/{}/confirm", booking_id),
        None,
    )
    .await;

    // A second, never-confirmed booking contributes no tickets
    send(
        &st.app,
        Method::POST,
        "/v1/bookings",
        Some(create_body(&st, &st.seat_ids[2..4])),
    )
    .await;

    let (status, body) = send(
        &st.app,
        Method::GET,
        &format!("/v1/users/{}/tickets", st.user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}
