use crate::domain::models::{
    appointment::{Appointment, AppointmentStatus},
    business::Business,
    employee::Employee,
    service::Service,
    user::User,
    work_schedule::{DayOfWeek, WorkSchedule},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDateTime;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait BusinessRepository: Send + Sync {
    async fn create(&self, business: &Business) -> Result<Business, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Business>, AppError>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn create(&self, service: &Service) -> Result<Service, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Service>, AppError>;
    async fn update(&self, service: &Service) -> Result<Service, AppError>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn create(&self, employee: &Employee) -> Result<Employee, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Employee>, AppError>;
}

#[async_trait]
pub trait WorkScheduleRepository: Send + Sync {
    /// Replaces an employee's whole weekly schedule in one transaction.
    /// Owned by staff management; the engine itself never writes schedules.
    async fn replace_for_employee(&self, employee_id: &str, schedules: &[WorkSchedule]) -> Result<Vec<WorkSchedule>, AppError>;
    async fn list_by_employee(&self, employee_id: &str) -> Result<Vec<WorkSchedule>, AppError>;
    async fn find_active_schedule(&self, employee_id: &str, day_of_week: DayOfWeek) -> Result<Option<WorkSchedule>, AppError>;
}

/// Which side of the dual approval is being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalRole {
    Owner,
    Employee,
}

/// Result of a transactional approval write. `newly_confirmed` is true only
/// for the one call that moved the appointment from PENDING to CONFIRMED, so
/// exactly one caller dispatches the confirmation notification.
#[derive(Debug, Clone)]
pub struct ApprovalUpdate {
    pub appointment: Appointment,
    pub newly_confirmed: bool,
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Atomically re-checks the employee's calendar for overlap and inserts.
    /// Two concurrent calls on intersecting intervals cannot both succeed;
    /// the loser gets `Conflict`.
    async fn create(&self, appointment: &Appointment) -> Result<Appointment, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>, AppError>;
    async fn count_overlapping(&self, employee_id: &str, start: NaiveDateTime, end: NaiveDateTime) -> Result<i64, AppError>;
    async fn list_overlapping(&self, employee_id: &str, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Appointment>, AppError>;
    /// Records one side of the dual approval as a single atomic write.
    /// Approving an already-approved side is a no-op, not an error.
    async fn approve(&self, id: &str, role: ApprovalRole) -> Result<ApprovalUpdate, AppError>;
    /// Applies a status transition, guarded by the state machine's allowed
    /// sources for `new_status`. A concurrent conflicting transition
    /// surfaces as `Conflict`, never as a lost update.
    async fn update_status(&self, id: &str, new_status: AppointmentStatus, cancellation_reason: Option<String>) -> Result<Appointment, AppError>;
    async fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Appointment>, AppError>;
    async fn list_by_business(&self, business_id: &str) -> Result<Vec<Appointment>, AppError>;
    async fn find_due_for_reminder(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<Appointment>, AppError>;
    async fn mark_reminder_sent(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_appointment_confirmation(&self, recipient: &str, full_name: &str, details: &str) -> Result<(), AppError>;
    async fn send_appointment_cancellation(&self, recipient: &str, full_name: &str, details: &str, reason: Option<&str>) -> Result<(), AppError>;
    async fn send_appointment_reminder(&self, recipient: &str, full_name: &str, details: &str) -> Result<(), AppError>;
}
