use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};

use crate::domain::models::appointment::{Appointment, AppointmentStatus};
use crate::domain::services::appointment_service::appointment_email_context;
use crate::error::AppError;
use crate::state::AppState;

/// Periodic reminder loop. Runs one sweep, sleeps for the configured
/// interval, repeats. A failed sweep is logged and retried on the next tick.
pub async fn start_reminder_worker(state: Arc<AppState>) {
    info!("Starting appointment reminder worker...");

    let interval = Duration::from_secs(state.config.reminder_interval_secs);

    loop {
        let span = info_span!("reminder_sweep");
        async {
            match run_reminder_sweep(&state).await {
                Ok(sent) => info!("Reminder sweep completed. Sent {} reminders", sent),
                Err(e) => error!("Reminder sweep failed: {:?}", e),
            }
        }
        .instrument(span)
        .await;

        sleep(interval).await;
    }
}

/// One sweep: find appointments starting inside the lookahead window that
/// have not been reminded yet, and dispatch a reminder for each CONFIRMED
/// one. The sent flag is persisted per appointment, immediately after its
/// dispatch succeeds; a failed dispatch leaves the flag unset so the next
/// sweep retries it.
pub async fn run_reminder_sweep(state: &Arc<AppState>) -> Result<u32, AppError> {
    let now = Utc::now().naive_utc();
    let until = now + chrono::Duration::hours(state.config.reminder_lookahead_hours);

    let upcoming = state.appointment_repo.find_due_for_reminder(now, until).await?;

    let mut sent_count = 0;
    for appointment in upcoming {
        // Never mark a non-confirmed appointment as reminded: if it somehow
        // became CONFIRMED later, the reminder would have been absorbed.
        if appointment.status != AppointmentStatus::Confirmed {
            continue;
        }

        match send_reminder(state, &appointment).await {
            Ok(_) => {
                sent_count += 1;
                info!("Reminder sent for appointment {}", appointment.id);
            }
            Err(e) => {
                error!("Failed to send reminder for appointment {}: {:?}", appointment.id, e);
            }
        }
    }

    Ok(sent_count)
}

async fn send_reminder(state: &Arc<AppState>, appointment: &Appointment) -> Result<(), AppError> {
    let (customer, details) = appointment_email_context(state, appointment).await?;

    state.email_service
        .send_appointment_reminder(&customer.email, &customer.full_name, &details)
        .await?;

    state.appointment_repo.mark_reminder_sent(&appointment.id).await?;
    Ok(())
}
