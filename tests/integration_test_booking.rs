mod common;

use appointment_backend::domain::models::appointment::{AppointmentStatus, PaymentStatus};
use appointment_backend::domain::services::appointment_service::CreateAppointmentParams;
use appointment_backend::error::AppError;
use common::{at, next_monday, setup_fixtures, Fixtures, TestApp};

fn booking_params(fx: &Fixtures, start: chrono::NaiveDateTime, notes: Option<&str>) -> CreateAppointmentParams {
    CreateAppointmentParams {
        customer_id: fx.customer.id.clone(),
        business_id: fx.business.id.clone(),
        service_id: fx.service.id.clone(),
        employee_id: fx.employee.id.clone(),
        start_time: start,
        notes: notes.map(|n| n.to_string()),
    }
}

#[tokio::test]
async fn test_successful_booking_starts_pending() {
    let app = TestApp::new().await;
    let fx = setup_fixtures(&app).await;
    let start = at(next_monday(), "10:00");

    let appointment = app.engine
        .create_appointment(booking_params(&fx, start, Some("first visit")))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert!(!appointment.owner_approved);
    assert!(!appointment.employee_approved);
    assert_eq!(appointment.payment_status, PaymentStatus::Pending);
    assert_eq!(appointment.start_time, start);
    assert_eq!(appointment.end_time, at(next_monday(), "10:30"));
    assert_eq!(appointment.price_cents, 4500);
    assert_eq!(appointment.notes.as_deref(), Some("first visit"));
    assert!(!appointment.reminder_sent);

    // the customer got a "booking received" mail
    let confirmations = app.email.sent_of_kind("confirmation");
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0].recipient, "customer@example.com");
    assert!(confirmations[0].details.contains("Haircut"));
}

#[tokio::test]
async fn test_missing_references_are_named() {
    let app = TestApp::new().await;
    let fx = setup_fixtures(&app).await;
    let start = at(next_monday(), "10:00");

    let mut params = booking_params(&fx, start, None);
    params.customer_id = "ghost".to_string();
    match app.engine.create_appointment(params).await {
        Err(AppError::NotFound(msg)) => assert!(msg.contains("User")),
        other => panic!("expected NotFound, got {:?}", other.map(|a| a.id)),
    }

    let mut params = booking_params(&fx, start, None);
    params.service_id = "ghost".to_string();
    match app.engine.create_appointment(params).await {
        Err(AppError::NotFound(msg)) => assert!(msg.contains("Service")),
        other => panic!("expected NotFound, got {:?}", other.map(|a| a.id)),
    }

    let mut params = booking_params(&fx, start, None);
    params.employee_id = "ghost".to_string();
    match app.engine.create_appointment(params).await {
        Err(AppError::NotFound(msg)) => assert!(msg.contains("Employee")),
        other => panic!("expected NotFound, got {:?}", other.map(|a| a.id)),
    }
}

#[tokio::test]
async fn test_overlapping_booking_is_rejected() {
    let app = TestApp::new().await;
    let fx = setup_fixtures(&app).await;
    let monday = next_monday();

    app.engine.create_appointment(booking_params(&fx, at(monday, "10:00"), None)).await.unwrap();

    // exact duplicate
    match app.engine.create_appointment(booking_params(&fx, at(monday, "10:00"), None)).await {
        Err(AppError::Conflict(msg)) => assert!(msg.contains("conflicting appointment")),
        other => panic!("expected Conflict, got {:?}", other.map(|a| a.id)),
    }

    // partial overlap (10:15 against 10:00-10:30)
    let result = app.engine.create_appointment(booking_params(&fx, at(monday, "10:15"), None)).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_touching_intervals_do_not_conflict() {
    let app = TestApp::new().await;
    let fx = setup_fixtures(&app).await;
    let monday = next_monday();

    app.engine.create_appointment(booking_params(&fx, at(monday, "10:00"), None)).await.unwrap();

    let after = app.engine.create_appointment(booking_params(&fx, at(monday, "10:30"), None)).await;
    assert!(after.is_ok());

    let before = app.engine.create_appointment(booking_params(&fx, at(monday, "09:30"), None)).await;
    assert!(before.is_ok());
}

#[tokio::test]
async fn test_cancelled_appointment_does_not_block_rebooking() {
    let app = TestApp::new().await;
    let fx = setup_fixtures(&app).await;
    let monday = next_monday();

    app.insert_appointment(&fx, at(monday, "10:00"), 30, AppointmentStatus::Cancelled).await;

    let result = app.engine.create_appointment(booking_params(&fx, at(monday, "10:00"), None)).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_booking_on_day_off_is_rejected() {
    let app = TestApp::new().await;
    let fx = setup_fixtures(&app).await;
    let tuesday = next_monday() + chrono::Duration::days(1);

    match app.engine.create_appointment(booking_params(&fx, at(tuesday, "10:00"), None)).await {
        Err(AppError::Conflict(msg)) => assert!(msg.contains("does not work")),
        other => panic!("expected Conflict, got {:?}", other.map(|a| a.id)),
    }
}

#[tokio::test]
async fn test_booking_outside_work_hours_is_rejected() {
    let app = TestApp::new().await;
    let fx = setup_fixtures(&app).await;
    let monday = next_monday();

    // before opening
    match app.engine.create_appointment(booking_params(&fx, at(monday, "08:30"), None)).await {
        Err(AppError::Conflict(msg)) => assert!(msg.contains("work hours")),
        other => panic!("expected Conflict, got {:?}", other.map(|a| a.id)),
    }

    // would run past closing (16:45 + 30min > 17:00)
    let result = app.engine.create_appointment(booking_params(&fx, at(monday, "16:45"), None)).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    // ending exactly at closing is allowed
    let boundary = app.engine.create_appointment(booking_params(&fx, at(monday, "16:30"), None)).await;
    assert!(boundary.is_ok());
}

#[tokio::test]
async fn test_price_is_snapshotted_at_booking_time() {
    let app = TestApp::new().await;
    let fx = setup_fixtures(&app).await;

    let appointment = app.engine
        .create_appointment(booking_params(&fx, at(next_monday(), "10:00"), None))
        .await
        .unwrap();
    assert_eq!(appointment.price_cents, 4500);

    // raise the service price afterwards
    let mut service = fx.service.clone();
    service.price_cents = 9900;
    app.state.service_repo.update(&service).await.unwrap();

    let stored = app.state.appointment_repo.find_by_id(&appointment.id).await.unwrap().unwrap();
    assert_eq!(stored.price_cents, 4500);
}

#[tokio::test]
async fn test_notification_outage_does_not_fail_booking() {
    let app = TestApp::new().await;
    let fx = setup_fixtures(&app).await;

    app.email.fail_for("customer@example.com");

    let result = app.engine
        .create_appointment(booking_params(&fx, at(next_monday(), "10:00"), None))
        .await;
    assert!(result.is_ok());
    assert!(app.email.sent_emails().is_empty());
}
