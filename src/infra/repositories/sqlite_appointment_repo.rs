use crate::domain::models::appointment::{Appointment, AppointmentStatus};
use crate::domain::ports::{AppointmentRepository, ApprovalRole, ApprovalUpdate};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{Row, SqlitePool};

pub struct SqliteAppointmentRepo {
    pool: SqlitePool,
}

impl SqliteAppointmentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentRepository for SqliteAppointmentRepo {
    async fn create(&self, appointment: &Appointment) -> Result<Appointment, AppError> {
        // Conditional insert: the overlap re-check and the insert are one
        // statement, so two racing bookings for the same employee serialize
        // at the database and the loser inserts nothing.
        let created = sqlx::query_as::<_, Appointment>(
            "INSERT INTO appointments (id, customer_id, business_id, service_id, employee_id, start_time, end_time, price_cents, status, owner_approved, employee_approved, payment_status, notes, cancellation_reason, reminder_sent, created_at, updated_at)
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
             WHERE NOT EXISTS (
                 SELECT 1 FROM appointments
                 WHERE employee_id = ? AND start_time < ? AND end_time > ? AND status != 'CANCELLED'
             )
             RETURNING *"
        )
            .bind(&appointment.id).bind(&appointment.customer_id).bind(&appointment.business_id)
            .bind(&appointment.service_id).bind(&appointment.employee_id)
            .bind(appointment.start_time).bind(appointment.end_time).bind(appointment.price_cents)
            .bind(appointment.status).bind(appointment.owner_approved).bind(appointment.employee_approved)
            .bind(appointment.payment_status).bind(&appointment.notes).bind(&appointment.cancellation_reason)
            .bind(appointment.reminder_sent).bind(appointment.created_at).bind(appointment.updated_at)
            .bind(&appointment.employee_id).bind(appointment.end_time).bind(appointment.start_time)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;

        created.ok_or(AppError::Conflict("employee has a conflicting appointment at this time".to_string()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>, AppError> {
        sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = ?")
            .bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn count_overlapping(&self, employee_id: &str, start: NaiveDateTime, end: NaiveDateTime) -> Result<i64, AppError> {
        let result = sqlx::query(
            "SELECT COUNT(*) as count FROM appointments WHERE employee_id = ? AND start_time < ? AND end_time > ? AND status != 'CANCELLED'"
        )
            .bind(employee_id).bind(end).bind(start)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.get::<i64, _>("count"))
    }

    async fn list_overlapping(&self, employee_id: &str, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Appointment>, AppError> {
        sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE employee_id = ? AND start_time < ? AND end_time > ? AND status != 'CANCELLED' ORDER BY start_time ASC"
        )
            .bind(employee_id).bind(end).bind(start)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn approve(&self, id: &str, role: ApprovalRole) -> Result<ApprovalUpdate, AppError> {
        // One statement sets the flag and, when the other side already
        // approved, flips PENDING to CONFIRMED in the same write. Whoever's
        // update performs that flip sees CONFIRMED in its RETURNING row.
        let sql = match role {
            ApprovalRole::Owner =>
                "UPDATE appointments
                 SET owner_approved = 1,
                     status = CASE WHEN employee_approved = 1 AND status = 'PENDING' THEN 'CONFIRMED' ELSE status END,
                     updated_at = ?
                 WHERE id = ? AND owner_approved = 0 AND status NOT IN ('CANCELLED', 'COMPLETED')
                 RETURNING *",
            ApprovalRole::Employee =>
                "UPDATE appointments
                 SET employee_approved = 1,
                     status = CASE WHEN owner_approved = 1 AND status = 'PENDING' THEN 'CONFIRMED' ELSE status END,
                     updated_at = ?
                 WHERE id = ? AND employee_approved = 0 AND status NOT IN ('CANCELLED', 'COMPLETED')
                 RETURNING *",
        };

        let updated = sqlx::query_as::<_, Appointment>(sql)
            .bind(Utc::now()).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;

        if let Some(appointment) = updated {
            let newly_confirmed = appointment.status == AppointmentStatus::Confirmed;
            return Ok(ApprovalUpdate { appointment, newly_confirmed });
        }

        // Nothing matched: missing row, terminal status, or an approval that
        // was already recorded (idempotent no-op).
        let current = self.find_by_id(id).await?
            .ok_or(AppError::NotFound("Appointment not found".to_string()))?;
        if current.status.is_terminal() {
            return Err(AppError::Conflict(format!("cannot approve an appointment with status {}", current.status)));
        }
        Ok(ApprovalUpdate { appointment: current, newly_confirmed: false })
    }

    async fn update_status(&self, id: &str, new_status: AppointmentStatus, cancellation_reason: Option<String>) -> Result<Appointment, AppError> {
        let sources: Vec<String> = AppointmentStatus::ALL.iter()
            .filter(|s| s.can_transition_to(new_status))
            .map(|s| format!("'{}'", s))
            .collect();
        if sources.is_empty() {
            return Err(AppError::Conflict(format!("no transition into {} is allowed", new_status)));
        }

        let sql = format!(
            "UPDATE appointments
             SET status = ?, cancellation_reason = COALESCE(?, cancellation_reason), updated_at = ?
             WHERE id = ? AND status IN ({})
             RETURNING *",
            sources.join(", ")
        );

        let updated = sqlx::query_as::<_, Appointment>(&sql)
            .bind(new_status).bind(cancellation_reason).bind(Utc::now()).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;

        match updated {
            Some(appointment) => Ok(appointment),
            None => {
                let current = self.find_by_id(id).await?
                    .ok_or(AppError::NotFound("Appointment not found".to_string()))?;
                Err(AppError::Conflict(format!("cannot change status from {} to {}", current.status, new_status)))
            }
        }
    }

    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Appointment>, AppError> {
        sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE customer_id = ? ORDER BY start_time ASC")
            .bind(customer_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_business(&self, business_id: &str) -> Result<Vec<Appointment>, AppError> {
        sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE business_id = ? ORDER BY start_time ASC")
            .bind(business_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_due_for_reminder(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Appointment>, AppError> {
        sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE reminder_sent = 0 AND start_time >= ? AND start_time <= ? ORDER BY start_time ASC"
        )
            .bind(start).bind(end)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_reminder_sent(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE appointments SET reminder_sent = 1, updated_at = ? WHERE id = ? AND reminder_sent = 0")
            .bind(Utc::now()).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
}
