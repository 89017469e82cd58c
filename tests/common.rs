use appointment_backend::{
    config::Config,
    domain::models::{
        appointment::{Appointment, AppointmentStatus, NewAppointmentParams},
        business::Business,
        employee::Employee,
        service::Service,
        user::User,
        work_schedule::{DayOfWeek, WorkSchedule},
    },
    domain::ports::EmailService,
    domain::services::appointment_service::AppointmentService,
    error::AppError,
    infra::repositories::{
        sqlite_appointment_repo::SqliteAppointmentRepo,
        sqlite_business_repo::SqliteBusinessRepo,
        sqlite_employee_repo::SqliteEmployeeRepo,
        sqlite_schedule_repo::SqliteScheduleRepo,
        sqlite_service_repo::SqliteServiceRepo,
        sqlite_user_repo::SqliteUserRepo,
    },
    state::AppState,
};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Clone, Debug)]
#[allow(dead_code)]
pub struct SentEmail {
    pub kind: &'static str,
    pub recipient: String,
    pub details: String,
    pub reason: Option<String>,
}

/// Records every dispatch instead of talking to a mail relay. Recipients in
/// `failing` get a simulated outage, which the engine must treat as
/// non-fatal.
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
    failing: Mutex<HashSet<String>>,
}

#[allow(dead_code)]
impl MockEmailService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        })
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing.lock().unwrap().insert(recipient.to_string());
    }

    pub fn recover(&self, recipient: &str) {
        self.failing.lock().unwrap().remove(recipient);
    }

    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_of_kind(&self, kind: &str) -> Vec<SentEmail> {
        self.sent_emails().into_iter().filter(|e| e.kind == kind).collect()
    }

    fn record(&self, kind: &'static str, recipient: &str, details: &str, reason: Option<&str>) -> Result<(), AppError> {
        if self.failing.lock().unwrap().contains(recipient) {
            return Err(AppError::InternalWithMsg(format!("simulated email outage for {}", recipient)));
        }
        self.sent.lock().unwrap().push(SentEmail {
            kind,
            recipient: recipient.to_string(),
            details: details.to_string(),
            reason: reason.map(|r| r.to_string()),
        });
        Ok(())
    }
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send_appointment_confirmation(&self, recipient: &str, _full_name: &str, details: &str) -> Result<(), AppError> {
        self.record("confirmation", recipient, details, None)
    }

    async fn send_appointment_cancellation(&self, recipient: &str, _full_name: &str, details: &str, reason: Option<&str>) -> Result<(), AppError> {
        self.record("cancellation", recipient, details, reason)
    }

    async fn send_appointment_reminder(&self, recipient: &str, _full_name: &str, details: &str) -> Result<(), AppError> {
        self.record("reminder", recipient, details, None)
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub engine: AppointmentService,
    pub email: Arc<MockEmailService>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            app_name: "Test Appointments".to_string(),
            reminder_interval_secs: 3600,
            reminder_lookahead_hours: 24,
        };

        let email = MockEmailService::new();

        let state = Arc::new(AppState {
            config,
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            business_repo: Arc::new(SqliteBusinessRepo::new(pool.clone())),
            service_repo: Arc::new(SqliteServiceRepo::new(pool.clone())),
            employee_repo: Arc::new(SqliteEmployeeRepo::new(pool.clone())),
            schedule_repo: Arc::new(SqliteScheduleRepo::new(pool.clone())),
            appointment_repo: Arc::new(SqliteAppointmentRepo::new(pool.clone())),
            email_service: email.clone(),
        });

        let engine = AppointmentService::new(state.clone());

        Self { pool, db_filename, state, engine, email }
    }

    pub async fn seed_user(&self, full_name: &str, email: &str) -> User {
        let user = User {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        self.state.user_repo.create(&user).await.unwrap()
    }

    pub async fn seed_business(&self, owner_id: &str, name: &str) -> Business {
        let now = Utc::now();
        let business = Business {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            phone: None,
            address: None,
            created_at: now,
            updated_at: now,
        };
        self.state.business_repo.create(&business).await.unwrap()
    }

    pub async fn seed_service(&self, business_id: &str, name: &str, duration_min: i32, price_cents: i64) -> Service {
        let now = Utc::now();
        let service = Service {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            name: name.to_string(),
            duration_min,
            price_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state.service_repo.create(&service).await.unwrap()
    }

    pub async fn seed_employee(&self, business_id: &str, user_id: Option<&str>, name: &str) -> Employee {
        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.to_string(),
            user_id: user_id.map(|u| u.to_string()),
            name: name.to_string(),
            email: None,
            title: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state.employee_repo.create(&employee).await.unwrap()
    }

    pub async fn set_schedule(&self, employee_id: &str, days: &[DayOfWeek], start: &str, end: &str) -> Vec<WorkSchedule> {
        let schedules: Vec<WorkSchedule> = days.iter().map(|day| WorkSchedule {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.to_string(),
            day_of_week: *day,
            start_time: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end_time: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
            is_active: true,
        }).collect();
        self.state.schedule_repo.replace_for_employee(employee_id, &schedules).await.unwrap()
    }

    /// Inserts an appointment straight into the ledger, bypassing the
    /// booking checks. Handy for reminder and state-machine tests.
    pub async fn insert_appointment(
        &self,
        fixtures: &Fixtures,
        start: NaiveDateTime,
        duration_min: i32,
        status: AppointmentStatus,
    ) -> Appointment {
        let mut appointment = Appointment::new(NewAppointmentParams {
            customer_id: fixtures.customer.id.clone(),
            business_id: fixtures.business.id.clone(),
            service_id: fixtures.service.id.clone(),
            employee_id: fixtures.employee.id.clone(),
            start,
            duration_min,
            price_cents: fixtures.service.price_cents,
            notes: None,
        });
        appointment.status = status;
        if status == AppointmentStatus::Confirmed {
            appointment.owner_approved = true;
            appointment.employee_approved = true;
        }
        self.state.appointment_repo.create(&appointment).await.unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

#[allow(dead_code)]
pub struct Fixtures {
    pub owner: User,
    pub customer: User,
    pub employee_user: User,
    pub business: Business,
    pub service: Service,
    pub employee: Employee,
}

/// One business with a 30-minute service and one employee linked to a user
/// account, working Monday 09:00-17:00.
#[allow(dead_code)]
pub async fn setup_fixtures(app: &TestApp) -> Fixtures {
    let owner = app.seed_user("Olivia Owner", "owner@example.com").await;
    let customer = app.seed_user("Casey Customer", "customer@example.com").await;
    let employee_user = app.seed_user("Eli Employee", "employee@example.com").await;
    let business = app.seed_business(&owner.id, "Fresh Cuts").await;
    let service = app.seed_service(&business.id, "Haircut", 30, 4500).await;
    let employee = app.seed_employee(&business.id, Some(&employee_user.id), "Eli").await;
    app.set_schedule(&employee.id, &[DayOfWeek::Monday], "09:00", "17:00").await;

    Fixtures { owner, customer, employee_user, business, service, employee }
}

/// First Monday strictly in the future, so booked slots never trip the
/// past-slot filter.
#[allow(dead_code)]
pub fn next_monday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(1);
    while date.weekday() != Weekday::Mon {
        date += Duration::days(1);
    }
    date
}

#[allow(dead_code)]
pub fn at(date: NaiveDate, time: &str) -> NaiveDateTime {
    date.and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
}
