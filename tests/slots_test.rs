mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::TestApp;
use serde_json::{json, Value};
use serial_test::serial;

fn ids(slots: &[Value]) -> Vec<String> {
    slots
        .iter()
        .map(|s| s["id"].as_str().unwrap().to_string())
        .collect()
}

// ─── Availability ────────────────────────────────────────────────────────────

#[serial]
#[tokio::test]
async fn nothing_is_available_without_an_open_window() {
    let app = TestApp::new().await;
    let date = app.today() + Duration::days(1);
    app.create_slot(date, "08:00", "09:00", "NEW_ID", 5).await;

    let slots: Vec<Value> = app.get("/api/slots/available", None).await.json();
    assert!(slots.is_empty());

    app.open_window(7).await;
    let slots: Vec<Value> = app.get("/api/slots/available", None).await.json();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["booked_count"], 0);
}

#[serial]
#[tokio::test]
async fn slots_outside_the_window_are_hidden() {
    let app = TestApp::new().await;
    app.open_window(3).await;
    let inside = app
        .create_slot(app.today() + Duration::days(2), "08:00", "09:00", "NEW_ID", 5)
        .await;
    app.create_slot(app.today() + Duration::days(10), "08:00", "09:00", "NEW_ID", 5)
        .await;

    let slots: Vec<Value> = app.get("/api/slots/available", None).await.json();
    assert_eq!(ids(&slots), vec![inside["id"].as_str().unwrap().to_string()]);
}

#[serial]
#[tokio::test]
async fn window_purpose_limits_what_is_offered() {
    let app = TestApp::new().await;
    let today = app.today();
    app.post(
        "/api/scheduling-windows",
        app.admin(),
        json!({
            "start_date": today,
            "end_date": today + Duration::days(7),
            "purpose": "RENEWAL",
        }),
    )
    .await
    .assert_status(StatusCode::CREATED);

    let date = today + Duration::days(1);
    app.create_slot(date, "08:00", "09:00", "NEW_ID", 5).await;
    let renewal = app.create_slot(date, "09:00", "10:00", "RENEWAL", 5).await;

    let slots: Vec<Value> = app.get("/api/slots/available", None).await.json();
    assert_eq!(ids(&slots), vec![renewal["id"].as_str().unwrap().to_string()]);
}

#[serial]
#[tokio::test]
async fn available_filters_by_date_and_purpose() {
    let app = TestApp::new().await;
    app.open_window(7).await;
    let day1 = app.today() + Duration::days(1);
    let day2 = app.today() + Duration::days(2);
    app.create_slot(day1, "08:00", "09:00", "NEW_ID", 5).await;
    app.create_slot(day1, "08:00", "09:00", "RENEWAL", 5).await;
    app.create_slot(day2, "08:00", "09:00", "NEW_ID", 5).await;

    let on_day1: Vec<Value> = app
        .get(&format!("/api/slots/available?date={day1}"), None)
        .await
        .json();
    assert_eq!(on_day1.len(), 2);

    let renewals: Vec<Value> = app
        .get("/api/slots/available?purpose=RENEWAL", None)
        .await
        .json();
    assert_eq!(renewals.len(), 1);
    assert_eq!(renewals[0]["purpose"], "RENEWAL");
}

#[serial]
#[tokio::test]
async fn full_and_closed_slots_are_not_offered() {
    let app = TestApp::new().await;
    app.open_window(7).await;
    let day1 = app.today() + Duration::days(1);
    let day2 = app.today() + Duration::days(2);

    let tiny = app.create_slot(day1, "08:00", "09:00", "NEW_ID", 1).await;
    let open = app.create_slot(day1, "09:00", "10:00", "NEW_ID", 5).await;
    app.create_slot(day2, "08:00", "09:00", "NEW_ID", 5).await;

    let student = app.student().await;
    app.book(&student, tiny["id"].as_str().unwrap())
        .await
        .assert_status(StatusCode::CREATED);

    app.post(
        "/api/calendar-closures",
        app.admin(),
        json!({ "date": day2 }),
    )
    .await
    .assert_status(StatusCode::CREATED);

    let slots: Vec<Value> = app.get("/api/slots/available", None).await.json();
    assert_eq!(ids(&slots), vec![open["id"].as_str().unwrap().to_string()]);
}

// ─── Admin management ────────────────────────────────────────────────────────

#[serial]
#[tokio::test]
async fn slot_management_is_admin_only() {
    let app = TestApp::new().await;
    let student = app.student().await;
    let date = app.today() + Duration::days(1);
    let body = json!({
        "date": date,
        "start_time": "08:00",
        "end_time": "09:00",
        "purpose": "NEW_ID",
        "capacity": 5,
    });

    app.post("/api/slots", Some(&student.token), body.clone())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.post("/api/slots", None, body)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.get("/api/slots", Some(&student.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[serial]
#[tokio::test]
async fn create_rejects_duplicates_and_bad_times() {
    let app = TestApp::new().await;
    let date = app.today() + Duration::days(1);
    app.create_slot(date, "08:00", "09:00", "NEW_ID", 5).await;

    let create = |start: &str, end: &str, capacity: i32| {
        json!({
            "date": date,
            "start_time": start,
            "end_time": end,
            "purpose": "NEW_ID",
            "capacity": capacity,
        })
    };

    app.post("/api/slots", app.admin(), create("08:00", "09:00", 5))
        .await
        .assert_status(StatusCode::CONFLICT);
    app.post("/api/slots", app.admin(), create("10:00", "09:00", 5))
        .await
        .assert_error(StatusCode::BAD_REQUEST, "start_time must be before end_time");
    app.post("/api/slots", app.admin(), create("noon", "13:00", 5))
        .await
        .assert_error(StatusCode::BAD_REQUEST, "Times must be HH:MM");
    app.post("/api/slots", app.admin(), create("10:00", "11:00", -1))
        .await
        .assert_error(StatusCode::BAD_REQUEST, "Capacity cannot be negative");

    // Same time for another purpose is a different slot
    app.create_slot(date, "08:00", "09:00", "RENEWAL", 5).await;
}

#[serial]
#[tokio::test]
async fn default_buckets_are_created_once() {
    let app = TestApp::new().await;
    let date = app.today() + Duration::days(4);
    app.create_slot(date, "08:00", "09:00", "NEW_ID", 3).await;

    let resp = app
        .post("/api/slots/defaults", app.admin(), json!({ "date": date }))
        .await;
    resp.assert_status(StatusCode::CREATED);
    let body = resp.value();
    // 8 buckets for each of the 3 purposes, minus the one that already existed
    assert_eq!(body["created"].as_array().unwrap().len(), 23);
    assert_eq!(body["skipped"], 1);
    assert!(body["created"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["capacity"] == 20 && s["start_time"] != "12:00"));

    let again = app
        .post("/api/slots/defaults", app.admin(), json!({ "date": date }))
        .await
        .value();
    assert_eq!(again["created"].as_array().unwrap().len(), 0);
    assert_eq!(again["skipped"], 24);

    let listed: Vec<Value> = app
        .get(&format!("/api/slots?date={date}"), app.admin())
        .await
        .json();
    assert_eq!(listed.len(), 24);
}

#[serial]
#[tokio::test]
async fn default_buckets_for_selected_purposes() {
    let app = TestApp::new().await;
    let date = app.today() + Duration::days(5);

    let body = app
        .post(
            "/api/slots/defaults",
            app.admin(),
            json!({ "date": date, "capacity": 8, "purposes": ["LOST_REPLACEMENT"] }),
        )
        .await
        .value();
    let created = body["created"].as_array().unwrap();
    assert_eq!(created.len(), 8);
    assert!(created
        .iter()
        .all(|s| s["purpose"] == "LOST_REPLACEMENT" && s["capacity"] == 8));
}

#[serial]
#[tokio::test]
async fn capacity_cannot_drop_below_bookings() {
    let app = TestApp::new().await;
    app.open_window(7).await;
    let slot = app
        .create_slot(app.today() + Duration::days(1), "08:00", "09:00", "NEW_ID", 3)
        .await;
    let slot_id = slot["id"].as_str().unwrap();

    let alice = app.student().await;
    let bob = app.student().await;
    app.book(&alice, slot_id).await.assert_status(StatusCode::CREATED);
    app.book(&bob, slot_id).await.assert_status(StatusCode::CREATED);

    app.put(
        &format!("/api/slots/{slot_id}"),
        app.admin(),
        json!({ "capacity": 1 }),
    )
    .await
    .assert_error(
        StatusCode::BAD_REQUEST,
        "Capacity cannot be lower than the number of booked seats",
    );
    assert_eq!(app.slot(slot_id).await.capacity, 3);

    let resp = app
        .put(
            &format!("/api/slots/{slot_id}"),
            app.admin(),
            json!({ "capacity": 2, "end_time": "09:30" }),
        )
        .await;
    resp.assert_status(StatusCode::OK);
    let body = resp.value();
    assert_eq!(body["capacity"], 2);
    assert_eq!(body["end_time"], "09:30");
    assert_eq!(body["booked_count"], 2);

    app.put(
        "/api/slots/does-not-exist",
        app.admin(),
        json!({ "capacity": 2 }),
    )
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[serial]
#[tokio::test]
async fn rejected_update_leaves_the_slot_untouched() {
    let app = TestApp::new().await;
    app.open_window(7).await;
    let slot = app
        .create_slot(app.today() + Duration::days(1), "10:00", "10:30", "NEW_ID", 3)
        .await;
    let slot_id = slot["id"].as_str().unwrap();
    let alice = app.student().await;
    let bob = app.student().await;
    app.book(&alice, slot_id).await.assert_status(StatusCode::CREATED);
    app.book(&bob, slot_id).await.assert_status(StatusCode::CREATED);

    app.put(
        &format!("/api/slots/{slot_id}"),
        app.admin(),
        json!({ "capacity": 1, "end_time": "11:00" }),
    )
    .await
    .assert_error(
        StatusCode::BAD_REQUEST,
        "Capacity cannot be lower than the number of booked seats",
    );

    let after = app.slot(slot_id).await;
    assert_eq!(after.end_time, "10:30");
    assert_eq!(after.capacity, 3);
    assert_eq!(after.booked_count, 2);

    let mine: Vec<Value> = app
        .get("/api/appointments/mine", Some(&alice.token))
        .await
        .json();
    assert_eq!(mine[0]["end_time"], "10:30");
}

#[serial]
#[tokio::test]
async fn booked_appointments_follow_new_slot_times() {
    let app = TestApp::new().await;
    app.open_window(7).await;
    let slot = app
        .create_slot(app.today() + Duration::days(1), "13:00", "14:00", "RENEWAL", 5)
        .await;
    let slot_id = slot["id"].as_str().unwrap();
    let student = app.student().await;
    let appt = app.book(&student, slot_id).await.value();

    app.put(
        &format!("/api/slots/{slot_id}"),
        app.admin(),
        json!({ "start_time": "13:30", "end_time": "14:30" }),
    )
    .await
    .assert_status(StatusCode::OK);

    let moved = app
        .get(
            &format!("/api/appointments/{}", appt["id"].as_str().unwrap()),
            Some(&student.token),
        )
        .await
        .value();
    assert_eq!(moved["start_time"], "13:30");
    assert_eq!(moved["end_time"], "14:30");
}

#[serial]
#[tokio::test]
async fn only_empty_slots_can_be_deleted() {
    let app = TestApp::new().await;
    app.open_window(7).await;
    let date = app.today() + Duration::days(1);
    let booked = app.create_slot(date, "08:00", "09:00", "NEW_ID", 3).await;
    let empty = app.create_slot(date, "09:00", "10:00", "NEW_ID", 3).await;
    let booked_id = booked["id"].as_str().unwrap();
    let empty_id = empty["id"].as_str().unwrap();

    let student = app.student().await;
    app.book(&student, booked_id)
        .await
        .assert_status(StatusCode::CREATED);

    app.delete(&format!("/api/slots/{booked_id}"), app.admin())
        .await
        .assert_error(
            StatusCode::BAD_REQUEST,
            "Slot has bookings and cannot be deleted",
        );

    app.delete(&format!("/api/slots/{empty_id}"), app.admin())
        .await
        .assert_status(StatusCode::OK);
    app.delete(&format!("/api/slots/{empty_id}"), app.admin())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
