use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub app_name: String,
    pub reminder_interval_secs: u64,
    pub reminder_lookahead_hours: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "Appointment System".to_string()),
            reminder_interval_secs: env::var("REMINDER_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .expect("REMINDER_INTERVAL_SECS must be a number"),
            reminder_lookahead_hours: env::var("REMINDER_LOOKAHEAD_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("REMINDER_LOOKAHEAD_HOURS must be a number"),
        }
    }
}
