use std::sync::Arc;
use crate::domain::ports::{
    AppointmentRepository, BusinessRepository, EmailService, EmployeeRepository,
    ServiceRepository, UserRepository, WorkScheduleRepository,
};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub business_repo: Arc<dyn BusinessRepository>,
    pub service_repo: Arc<dyn ServiceRepository>,
    pub employee_repo: Arc<dyn EmployeeRepository>,
    pub schedule_repo: Arc<dyn WorkScheduleRepository>,
    pub appointment_repo: Arc<dyn AppointmentRepository>,
    pub email_service: Arc<dyn EmailService>,
}
