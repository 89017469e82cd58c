pub mod sqlite_appointment_repo;
pub mod sqlite_business_repo;
pub mod sqlite_employee_repo;
pub mod sqlite_schedule_repo;
pub mod sqlite_service_repo;
pub mod sqlite_user_repo;

pub mod postgres_appointment_repo;
pub mod postgres_business_repo;
pub mod postgres_employee_repo;
pub mod postgres_schedule_repo;
pub mod postgres_service_repo;
pub mod postgres_user_repo;
