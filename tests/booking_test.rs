mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{build_request, send_request, test_config, TestApp};
use serde_json::{json, Value};
use serial_test::serial;
use tokio::task::JoinSet;

async fn booked_slot(app: &TestApp, capacity: i32) -> String {
    app.open_window(14).await;
    let date = app.today() + Duration::days(1);
    let slot = app
        .create_slot(date, "08:00", "09:00", "NEW_ID", capacity)
        .await;
    slot["id"].as_str().unwrap().to_string()
}

fn id_of(body: &Value) -> String {
    body["id"].as_str().unwrap().to_string()
}

// ─── Capacity ────────────────────────────────────────────────────────────────

#[serial]
#[tokio::test]
async fn booking_takes_a_seat_until_full() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 2).await;

    let first = app.student().await;
    let resp = app.book(&first, &slot_id).await;
    resp.assert_status(StatusCode::CREATED);
    let body = resp.value();
    assert_eq!(body["status"], "pending-approval");
    assert_eq!(body["slot_id"], slot_id.as_str());
    assert_eq!(body["start_time"], "08:00");
    assert_eq!(body["purpose"], "NEW_ID");
    assert!(body.get("checkin_token_hash").is_none());
    assert!(!body["checkin_expires_at"].is_null());

    let second = app.student().await;
    app.book(&second, &slot_id)
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(app.slot(&slot_id).await.booked_count, 2);

    let third = app.student().await;
    app.book(&third, &slot_id)
        .await
        .assert_error(StatusCode::BAD_REQUEST, "Slot is full");
    assert_eq!(app.slot(&slot_id).await.booked_count, 2);
}

#[serial]
#[tokio::test]
async fn same_student_cannot_book_a_slot_twice() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 5).await;
    let student = app.student().await;

    app.book(&student, &slot_id)
        .await
        .assert_status(StatusCode::CREATED);
    app.book(&student, &slot_id).await.assert_error(
        StatusCode::BAD_REQUEST,
        "Duplicate booking: you already have an appointment for this slot",
    );
    assert_eq!(app.slot(&slot_id).await.booked_count, 1);
}

#[serial]
#[tokio::test]
async fn contact_email_must_be_gmail() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 5).await;
    let student = app.student().await;

    app.post(
        "/api/appointments",
        Some(&student.token),
        json!({
            "slot_id": slot_id,
            "purpose": "NEW_ID",
            "contact_email": "someone@yahoo.com",
        }),
    )
    .await
    .assert_error(
        StatusCode::BAD_REQUEST,
        "Contact email must be a valid Gmail address",
    );
    assert_eq!(app.slot(&slot_id).await.booked_count, 0);
}

#[serial]
#[tokio::test]
async fn booking_requires_authentication() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 5).await;

    app.post(
        "/api/appointments",
        None,
        json!({ "slot_id": slot_id, "contact_email": "a@gmail.com" }),
    )
    .await
    .assert_status(StatusCode::UNAUTHORIZED);
}

#[serial]
#[tokio::test]
async fn unknown_slot_is_not_found() {
    let app = TestApp::new().await;
    let student = app.student().await;
    app.book(&student, "2b7f1c4e-0000-0000-0000-000000000000")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[serial]
#[tokio::test]
async fn new_appointments_must_start_pending() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 5).await;
    let student = app.student().await;

    app.post(
        "/api/appointments",
        Some(&student.token),
        json!({
            "slot_id": slot_id,
            "contact_email": student.gmail(),
            "status": "confirmed",
        }),
    )
    .await
    .assert_error(
        StatusCode::BAD_REQUEST,
        "New appointments start as pending-approval",
    );

    // The legacy upper-case spelling of pending is accepted
    app.post(
        "/api/appointments",
        Some(&student.token),
        json!({
            "slot_id": slot_id,
            "contact_email": student.gmail(),
            "status": "PENDING",
        }),
    )
    .await
    .assert_status(StatusCode::CREATED);
}

// ─── Date rules ──────────────────────────────────────────────────────────────

#[serial]
#[tokio::test]
async fn closed_dates_reject_bookings() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 5).await;
    let date = app.slot(&slot_id).await.date;

    app.post(
        "/api/calendar-closures",
        app.admin(),
        json!({ "date": date, "remarks": "Foundation day" }),
    )
    .await
    .assert_status(StatusCode::CREATED);

    let student = app.student().await;
    app.book(&student, &slot_id)
        .await
        .assert_error(StatusCode::BAD_REQUEST, &format!("Date is closed: {date}"));
    assert_eq!(app.slot(&slot_id).await.booked_count, 0);
}

#[serial]
#[tokio::test]
async fn daily_cap_counts_every_slot_on_the_date() {
    let mut config = test_config();
    config.daily_appointment_cap = 1;
    let app = TestApp::with_config(config).await;
    app.open_window(14).await;
    let date = app.today() + Duration::days(2);

    let morning = app.create_slot(date, "08:00", "09:00", "NEW_ID", 10).await;
    let afternoon = app.create_slot(date, "13:00", "14:00", "NEW_ID", 10).await;

    let first = app.student().await;
    app.book(&first, &id_of(&morning))
        .await
        .assert_status(StatusCode::CREATED);

    let second = app.student().await;
    app.book(&second, &id_of(&afternoon))
        .await
        .assert_error(StatusCode::BAD_REQUEST, "Fully booked for this date");
    assert_eq!(app.slot(&id_of(&afternoon)).await.booked_count, 0);
}

// ─── Slotless bookings ───────────────────────────────────────────────────────

#[serial]
#[tokio::test]
async fn placeholder_slot_books_a_raw_schedule() {
    let app = TestApp::new().await;
    let student = app.student().await;
    let date = app.today() + Duration::days(3);

    let resp = app
        .post(
            "/api/appointments",
            Some(&student.token),
            json!({
                "slot_id": "placeholder-0900",
                "purpose": "RENEWAL",
                "appointment_date": date.to_string(),
                "start_time": "9:00",
                "end_time": "10:00",
                "picture_option": "retake",
                "contact_email": student.gmail(),
            }),
        )
        .await;
    resp.assert_status(StatusCode::CREATED);
    let body = resp.value();
    assert!(body["slot_id"].is_null());
    assert_eq!(body["appointment_date"], date.to_string());
    assert_eq!(body["start_time"], "09:00");
    assert_eq!(body["purpose"], "RENEWAL");
    assert_eq!(body["picture_option"], "retake");
}

#[serial]
#[tokio::test]
async fn raw_schedule_needs_date_and_times() {
    let app = TestApp::new().await;
    let student = app.student().await;

    app.post(
        "/api/appointments",
        Some(&student.token),
        json!({
            "purpose": "NEW_ID",
            "appointment_date": "2030-01-10",
            "contact_email": student.gmail(),
        }),
    )
    .await
    .assert_status(StatusCode::BAD_REQUEST);

    app.post(
        "/api/appointments",
        Some(&student.token),
        json!({
            "appointment_date": "2030-01-10",
            "start_time": "09:00",
            "end_time": "10:00",
            "contact_email": student.gmail(),
        }),
    )
    .await
    .assert_error(StatusCode::BAD_REQUEST, "purpose is required");
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_never_oversell() {
    let app = TestApp::new().await;
    let capacity = 3;
    let slot_id = booked_slot(&app, capacity).await;

    let mut students = Vec::new();
    for _ in 0..10 {
        students.push(app.student().await);
    }

    let mut tasks = JoinSet::new();
    for student in students {
        let router = app.router();
        let body = json!({
            "slot_id": slot_id,
            "purpose": "NEW_ID",
            "contact_email": student.gmail(),
        });
        tasks.spawn(async move {
            let req = build_request("POST", "/api/appointments", Some(&student.token), Some(body));
            send_request(router, req).await.status
        });
    }

    let mut created = 0;
    let mut full = 0;
    while let Some(status) = tasks.join_next().await {
        match status.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::BAD_REQUEST => full += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(created, capacity);
    assert_eq!(full, 10 - capacity);
    assert_eq!(app.slot(&slot_id).await.booked_count, capacity);
}

// ─── Cancellation ────────────────────────────────────────────────────────────

#[serial]
#[tokio::test]
async fn cancelling_releases_the_seat() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 2).await;
    let student = app.student().await;

    let appt = app.book(&student, &slot_id).await.value();
    assert_eq!(app.slot(&slot_id).await.booked_count, 1);

    let resp = app
        .delete(&format!("/api/appointments/{}", id_of(&appt)), Some(&student.token))
        .await;
    resp.assert_status(StatusCode::OK);
    assert_eq!(resp.value()["message"], "Appointment cancelled");
    assert_eq!(app.slot(&slot_id).await.booked_count, 0);

    app.get(&format!("/api/appointments/{}", id_of(&appt)), Some(&student.token))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // The freed seat can be booked again
    app.book(&student, &slot_id)
        .await
        .assert_status(StatusCode::CREATED);
}

#[serial]
#[tokio::test]
async fn deleting_a_declined_appointment_does_not_release_twice() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 2).await;
    let alice = app.student().await;
    let bob = app.student().await;

    let declined = app.book(&alice, &slot_id).await.value();
    app.book(&bob, &slot_id)
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(app.slot(&slot_id).await.booked_count, 2);

    app.set_status(&id_of(&declined), "declined")
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(app.slot(&slot_id).await.booked_count, 1);

    app.delete(
        &format!("/api/appointments/{}", id_of(&declined)),
        Some(&alice.token),
    )
    .await
    .assert_status(StatusCode::OK);
    assert_eq!(app.slot(&slot_id).await.booked_count, 1);
}

#[serial]
#[tokio::test]
async fn owner_cannot_delete_an_id_in_progress() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 2).await;
    let student = app.student().await;
    let appt = id_of(&app.book(&student, &slot_id).await.value());

    app.set_status(&appt, "confirmed")
        .await
        .assert_status(StatusCode::OK);
    app.set_status(&appt, "for-printing")
        .await
        .assert_status(StatusCode::OK);

    app.delete(&format!("/api/appointments/{appt}"), Some(&student.token))
        .await
        .assert_error(
            StatusCode::BAD_REQUEST,
            "Cannot change status from for-printing to cancelled",
        );
    assert_eq!(app.slot(&slot_id).await.booked_count, 1);

    // Admins can still remove it
    app.delete(&format!("/api/appointments/{appt}"), app.admin())
        .await
        .assert_status(StatusCode::OK);
    assert_eq!(app.slot(&slot_id).await.booked_count, 0);
}

#[serial]
#[tokio::test]
async fn other_students_cannot_touch_an_appointment() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 2).await;
    let owner = app.student().await;
    let other = app.student().await;
    let appt = id_of(&app.book(&owner, &slot_id).await.value());
    let uri = format!("/api/appointments/{appt}");

    app.get(&uri, Some(&other.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.delete(&uri, Some(&other.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    app.patch(
        &format!("{uri}/status"),
        Some(&other.token),
        json!({ "status": "cancelled" }),
    )
    .await
    .assert_status(StatusCode::FORBIDDEN);

    assert_eq!(app.slot(&slot_id).await.booked_count, 1);
}

// ─── Status changes ──────────────────────────────────────────────────────────

#[serial]
#[tokio::test]
async fn owner_may_only_cancel_through_status() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 2).await;
    let student = app.student().await;
    let appt = id_of(&app.book(&student, &slot_id).await.value());
    let uri = format!("/api/appointments/{appt}/status");

    app.patch(&uri, Some(&student.token), json!({ "status": "confirmed" }))
        .await
        .assert_error(
            StatusCode::BAD_REQUEST,
            "Cannot change status from pending-approval to confirmed",
        );
    app.patch(
        &uri,
        Some(&student.token),
        json!({ "admin_remarks": "approve me" }),
    )
    .await
    .assert_status(StatusCode::FORBIDDEN);

    let resp = app
        .patch(&uri, Some(&student.token), json!({ "status": "cancelled" }))
        .await;
    resp.assert_status(StatusCode::OK);
    assert_eq!(resp.value()["status"], "cancelled");
    assert_eq!(app.slot(&slot_id).await.booked_count, 0);

    // A cancelled appointment is final
    app.patch(&uri, Some(&student.token), json!({ "status": "cancelled" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.slot(&slot_id).await.booked_count, 0);
}

#[serial]
#[tokio::test]
async fn admin_walks_the_printing_pipeline() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 2).await;
    let student = app.student().await;
    let appt = id_of(&app.book(&student, &slot_id).await.value());

    app.set_status(&appt, "claimed").await.assert_error(
        StatusCode::BAD_REQUEST,
        "Cannot change status from pending-approval to claimed",
    );

    for status in ["confirmed", "for-printing", "to-claim", "claimed"] {
        let resp = app.set_status(&appt, status).await;
        resp.assert_status(StatusCode::OK);
        let body = resp.value();
        assert_eq!(body["status"], status);
        assert_eq!(body["status_updated_by"], app.admin_id.as_str());
    }
    // Claimed still holds its seat
    assert_eq!(app.slot(&slot_id).await.booked_count, 1);

    app.set_status(&appt, "bogus")
        .await
        .assert_error(StatusCode::BAD_REQUEST, "Unknown status: bogus");
}

#[serial]
#[tokio::test]
async fn admin_remarks_alone_keep_the_status() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 2).await;
    let student = app.student().await;
    let appt = id_of(&app.book(&student, &slot_id).await.value());

    let resp = app
        .patch(
            &format!("/api/appointments/{appt}"),
            app.admin(),
            json!({ "admin_remarks": "Bring your old ID" }),
        )
        .await;
    resp.assert_status(StatusCode::OK);
    let body = resp.value();
    assert_eq!(body["status"], "pending-approval");
    assert_eq!(body["admin_remarks"], "Bring your old ID");

    app.patch(&format!("/api/appointments/{appt}"), app.admin(), json!({}))
        .await
        .assert_error(StatusCode::BAD_REQUEST, "Nothing to update");

    // The admin edit route is admin-only
    app.patch(
        &format!("/api/appointments/{appt}"),
        Some(&student.token),
        json!({ "status": "cancelled" }),
    )
    .await
    .assert_status(StatusCode::FORBIDDEN);
}

// ─── Listings ────────────────────────────────────────────────────────────────

#[serial]
#[tokio::test]
async fn mine_and_admin_listing() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 5).await;
    let alice = app.student().await;
    let bob = app.student().await;

    let alice_appt = id_of(&app.book(&alice, &slot_id).await.value());
    app.book(&bob, &slot_id)
        .await
        .assert_status(StatusCode::CREATED);
    app.set_status(&alice_appt, "confirmed")
        .await
        .assert_status(StatusCode::OK);

    let mine: Vec<Value> = app
        .get("/api/appointments/mine", Some(&alice.token))
        .await
        .json();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], alice_appt.as_str());

    app.get("/api/appointments", Some(&alice.token))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let all: Vec<Value> = app.get("/api/appointments", app.admin()).await.json();
    assert_eq!(all.len(), 2);

    let confirmed: Vec<Value> = app
        .get("/api/appointments?status=confirmed", app.admin())
        .await
        .json();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0]["id"], alice_appt.as_str());

    let date = app.slot(&slot_id).await.date;
    let on_date: Vec<Value> = app
        .get(&format!("/api/appointments?date={date}"), app.admin())
        .await
        .json();
    assert_eq!(on_date.len(), 2);
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[serial]
#[tokio::test]
async fn booking_and_approval_send_emails() {
    let app = TestApp::new().await;
    let slot_id = booked_slot(&app, 2).await;
    let student = app.student().await;
    let appt = id_of(&app.book(&student, &slot_id).await.value());

    let emails = app.wait_for_emails(1).await;
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, student.gmail());
    assert!(emails[0].inline_image.is_some());

    app.set_status(&appt, "confirmed")
        .await
        .assert_status(StatusCode::OK);
    let emails = app.wait_for_emails(2).await;
    assert_eq!(emails.len(), 2);
    assert_eq!(emails[1].to, student.gmail());
    assert!(emails[1].html_body.contains("confirmed"));
}
