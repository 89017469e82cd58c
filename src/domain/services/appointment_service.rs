use std::sync::Arc;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use tracing::{error, info};

use crate::domain::models::appointment::{Appointment, AppointmentStatus, NewAppointmentParams};
use crate::domain::models::user::User;
use crate::domain::models::work_schedule::DayOfWeek;
use crate::domain::ports::ApprovalRole;
use crate::domain::services::availability::{compute_slots, Slot};
use crate::error::AppError;
use crate::state::AppState;

pub struct CreateAppointmentParams {
    pub customer_id: String,
    pub business_id: String,
    pub service_id: String,
    pub employee_id: String,
    pub start_time: NaiveDateTime,
    pub notes: Option<String>,
}

/// Scheduling engine facade: availability, booking, the dual-approval state
/// machine and appointment queries. One instance per process; all shared
/// state lives behind the repository ports.
pub struct AppointmentService {
    state: Arc<AppState>,
}

impl AppointmentService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub async fn available_slots(
        &self,
        employee_id: &str,
        date: NaiveDate,
        duration_minutes: i32,
    ) -> Result<Vec<Slot>, AppError> {
        if duration_minutes <= 0 || duration_minutes > 24 * 60 {
            return Err(AppError::Validation("duration must be between 1 and 1440 minutes".into()));
        }

        self.state.employee_repo.find_by_id(employee_id).await?
            .ok_or(AppError::NotFound("Employee not found".into()))?;

        let day = DayOfWeek::from(date.weekday());
        let Some(schedule) = self.state.schedule_repo.find_active_schedule(employee_id, day).await? else {
            // the employee simply doesn't work that day
            return Ok(Vec::new());
        };

        let window_start = date.and_time(schedule.start_time);
        let window_end = date.and_time(schedule.end_time);
        let existing = self.state.appointment_repo
            .list_overlapping(employee_id, window_start, window_end)
            .await?;

        let now = Utc::now().naive_utc();
        Ok(compute_slots(&schedule, date, duration_minutes as i64, &existing, now))
    }

    pub async fn create_appointment(&self, params: CreateAppointmentParams) -> Result<Appointment, AppError> {
        let customer = self.state.user_repo.find_by_id(&params.customer_id).await?
            .ok_or(AppError::NotFound("User not found".into()))?;
        let business = self.state.business_repo.find_by_id(&params.business_id).await?
            .ok_or(AppError::NotFound("Business not found".into()))?;
        let service = self.state.service_repo.find_by_id(&params.service_id).await?
            .ok_or(AppError::NotFound("Service not found".into()))?;
        let employee = self.state.employee_repo.find_by_id(&params.employee_id).await?
            .ok_or(AppError::NotFound("Employee not found".into()))?;

        let start_time = params.start_time;
        let end_time = start_time + chrono::Duration::minutes(service.duration_min as i64);

        let conflicts = self.state.appointment_repo
            .count_overlapping(&params.employee_id, start_time, end_time)
            .await?;
        if conflicts > 0 {
            return Err(AppError::Conflict("employee has a conflicting appointment at this time".into()));
        }

        let day = DayOfWeek::from(start_time.weekday());
        let schedule = self.state.schedule_repo.find_active_schedule(&params.employee_id, day).await?
            .ok_or(AppError::Conflict("employee does not work on this day".into()))?;

        let crosses_midnight = end_time.date() != start_time.date();
        if crosses_midnight
            || start_time.time() < schedule.start_time
            || end_time.time() > schedule.end_time
        {
            return Err(AppError::Conflict("appointment time is outside employee's work hours".into()));
        }

        let appointment = Appointment::new(NewAppointmentParams {
            customer_id: params.customer_id,
            business_id: params.business_id,
            service_id: params.service_id,
            employee_id: params.employee_id,
            start: start_time,
            duration_min: service.duration_min,
            price_cents: service.price_cents,
            notes: params.notes,
        });

        let created = self.state.appointment_repo.create(&appointment).await?;
        info!("Appointment created: {} for customer {}", created.id, created.customer_id);

        let details = format_appointment_details(&created, &service.name, &business.name, &employee.name);
        if let Err(e) = self.state.email_service
            .send_appointment_confirmation(&customer.email, &customer.full_name, &details)
            .await
        {
            error!("Failed to send confirmation email for appointment {}: {:?}", created.id, e);
        }

        Ok(created)
    }

    pub async fn update_status(
        &self,
        appointment_id: &str,
        new_status: AppointmentStatus,
        actor_id: &str,
        cancellation_reason: Option<String>,
    ) -> Result<Appointment, AppError> {
        let appointment = self.state.appointment_repo.find_by_id(appointment_id).await?
            .ok_or(AppError::NotFound("Appointment not found".into()))?;
        let business = self.state.business_repo.find_by_id(&appointment.business_id).await?
            .ok_or(AppError::NotFound("Business not found".into()))?;

        if appointment.customer_id != actor_id && business.owner_id != actor_id {
            return Err(AppError::Forbidden("You don't have permission to update this appointment".into()));
        }

        let old_status = appointment.status;
        let updated = self.state.appointment_repo
            .update_status(appointment_id, new_status, cancellation_reason)
            .await?;
        info!("Appointment {} status changed from {} to {}", appointment_id, old_status, new_status);

        if new_status == AppointmentStatus::Cancelled {
            match appointment_email_context(&self.state, &updated).await {
                Ok((customer, details)) => {
                    if let Err(e) = self.state.email_service
                        .send_appointment_cancellation(
                            &customer.email,
                            &customer.full_name,
                            &details,
                            updated.cancellation_reason.as_deref(),
                        )
                        .await
                    {
                        error!("Failed to send cancellation email for appointment {}: {:?}", appointment_id, e);
                    }
                }
                Err(e) => error!("Failed to resolve cancellation email context for appointment {}: {:?}", appointment_id, e),
            }
        }

        Ok(updated)
    }

    pub async fn approve_by_owner(&self, appointment_id: &str, actor_id: &str) -> Result<Appointment, AppError> {
        let appointment = self.state.appointment_repo.find_by_id(appointment_id).await?
            .ok_or(AppError::NotFound("Appointment not found".into()))?;
        let business = self.state.business_repo.find_by_id(&appointment.business_id).await?
            .ok_or(AppError::NotFound("Business not found".into()))?;

        if business.owner_id != actor_id {
            return Err(AppError::Forbidden("You don't have permission to approve this appointment".into()));
        }

        let update = self.state.appointment_repo.approve(appointment_id, ApprovalRole::Owner).await?;
        info!("Appointment {} approved by owner {}", appointment_id, actor_id);

        self.notify_if_confirmed(&update.appointment, update.newly_confirmed).await;
        Ok(update.appointment)
    }

    pub async fn approve_by_employee(&self, appointment_id: &str, actor_id: &str) -> Result<Appointment, AppError> {
        let appointment = self.state.appointment_repo.find_by_id(appointment_id).await?
            .ok_or(AppError::NotFound("Appointment not found".into()))?;
        let employee = self.state.employee_repo.find_by_id(&appointment.employee_id).await?
            .ok_or(AppError::NotFound("Employee not found".into()))?;

        let Some(employee_user_id) = employee.user_id.as_deref() else {
            return Err(AppError::Conflict("appointment does not have an assigned employee account".into()));
        };
        if employee_user_id != actor_id {
            return Err(AppError::Forbidden("You don't have permission to approve this appointment".into()));
        }

        let update = self.state.appointment_repo.approve(appointment_id, ApprovalRole::Employee).await?;
        info!("Appointment {} approved by employee {}", appointment_id, actor_id);

        self.notify_if_confirmed(&update.appointment, update.newly_confirmed).await;
        Ok(update.appointment)
    }

    pub async fn get_appointment_by_id(&self, appointment_id: &str, actor_id: &str) -> Result<Appointment, AppError> {
        let appointment = self.state.appointment_repo.find_by_id(appointment_id).await?
            .ok_or(AppError::NotFound("Appointment not found".into()))?;
        let business = self.state.business_repo.find_by_id(&appointment.business_id).await?
            .ok_or(AppError::NotFound("Business not found".into()))?;
        let employee = self.state.employee_repo.find_by_id(&appointment.employee_id).await?
            .ok_or(AppError::NotFound("Employee not found".into()))?;

        let is_customer = appointment.customer_id == actor_id;
        let is_owner = business.owner_id == actor_id;
        let is_employee = employee.user_id.as_deref() == Some(actor_id);

        if !is_customer && !is_owner && !is_employee {
            return Err(AppError::Forbidden("You don't have permission to view this appointment".into()));
        }

        Ok(appointment)
    }

    pub async fn get_user_appointments(&self, user_id: &str) -> Result<Vec<Appointment>, AppError> {
        self.state.appointment_repo.list_by_customer(user_id).await
    }

    pub async fn get_business_appointments(&self, business_id: &str, actor_id: &str) -> Result<Vec<Appointment>, AppError> {
        let business = self.state.business_repo.find_by_id(business_id).await?
            .ok_or(AppError::NotFound("Business not found".into()))?;

        if business.owner_id != actor_id {
            return Err(AppError::Forbidden("You don't have permission to view these appointments".into()));
        }

        self.state.appointment_repo.list_by_business(business_id).await
    }

    /// Confirmation mail goes out exactly once: only the approval call that
    /// actually flipped the status to CONFIRMED reports `newly_confirmed`.
    async fn notify_if_confirmed(&self, appointment: &Appointment, newly_confirmed: bool) {
        if !newly_confirmed {
            return;
        }
        match appointment_email_context(&self.state, appointment).await {
            Ok((customer, details)) => {
                if let Err(e) = self.state.email_service
                    .send_appointment_confirmation(&customer.email, &customer.full_name, &details)
                    .await
                {
                    error!("Failed to send confirmation email for appointment {}: {:?}", appointment.id, e);
                }
            }
            Err(e) => error!("Failed to resolve confirmation email context for appointment {}: {:?}", appointment.id, e),
        }
    }
}

/// Resolves the customer plus a human-readable details block for notification
/// bodies. A dangling reference here is a data-integrity error, not a normal
/// outcome.
pub async fn appointment_email_context(state: &AppState, appointment: &Appointment) -> Result<(User, String), AppError> {
    let customer = state.user_repo.find_by_id(&appointment.customer_id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;
    let business = state.business_repo.find_by_id(&appointment.business_id).await?
        .ok_or(AppError::NotFound("Business not found".into()))?;
    let service = state.service_repo.find_by_id(&appointment.service_id).await?
        .ok_or(AppError::NotFound("Service not found".into()))?;
    let employee = state.employee_repo.find_by_id(&appointment.employee_id).await?
        .ok_or(AppError::NotFound("Employee not found".into()))?;

    let details = format_appointment_details(appointment, &service.name, &business.name, &employee.name);
    Ok((customer, details))
}

pub fn format_appointment_details(
    appointment: &Appointment,
    service_name: &str,
    business_name: &str,
    employee_name: &str,
) -> String {
    let when = appointment.start_time.format("%A, %B %d, %Y at %I:%M %p");
    let notes = appointment.notes.as_deref()
        .map(|n| format!("\nNotes: {}", n))
        .unwrap_or_default();
    format!(
        "Service: {}\nDate & Time: {}\nBusiness: {}\nEmployee: {}\nStatus: {}{}",
        service_name, when, business_name, employee_name, appointment.status, notes
    )
}
