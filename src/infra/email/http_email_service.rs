use crate::domain::ports::EmailService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::error;

/// Delivers appointment mail through the company mail relay. Bodies are
/// rendered from the embedded templates; the relay handles the rest.
pub struct HttpEmailService {
    client: Client,
    api_url: String,
    api_key: String,
    app_name: String,
    templates: Tera,
}

impl HttpEmailService {
    pub fn new(api_url: String, api_key: String, app_name: String) -> Self {
        let mut templates = Tera::default();
        templates
            .add_raw_template("confirmation.html", include_str!("../../templates/confirmation.html"))
            .expect("Failed to load confirmation template");
        templates
            .add_raw_template("cancellation.html", include_str!("../../templates/cancellation.html"))
            .expect("Failed to load cancellation template");
        templates
            .add_raw_template("reminder.html", include_str!("../../templates/reminder.html"))
            .expect("Failed to load reminder template");

        Self {
            client: Client::new(),
            api_url,
            api_key,
            app_name,
            templates,
        }
    }

    fn render(&self, template: &str, full_name: &str, details: &str, reason: Option<&str>) -> Result<String, AppError> {
        let mut context = Context::new();
        context.insert("app_name", &self.app_name);
        context.insert("full_name", full_name);
        context.insert("details_html", &details.replace('\n', "<br>"));
        if let Some(reason) = reason {
            context.insert("reason", reason);
        }

        self.templates.render(template, &context).map_err(|e| {
            error!("Template render error for {}: {:?}", template, e);
            AppError::InternalWithMsg(format!("Template render error: {:?}", e))
        })
    }

    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        let payload = EmailPayload {
            from_alias: "default".to_string(),
            to_addr: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Email service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Email service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct EmailPayload {
    from_alias: String,
    to_addr: String,
    subject: String,
    html_body: String,
}

#[async_trait]
impl EmailService for HttpEmailService {
    async fn send_appointment_confirmation(&self, recipient: &str, full_name: &str, details: &str) -> Result<(), AppError> {
        let body = self.render("confirmation.html", full_name, details, None)?;
        self.send(recipient, "Appointment Confirmation", &body).await
    }

    async fn send_appointment_cancellation(&self, recipient: &str, full_name: &str, details: &str, reason: Option<&str>) -> Result<(), AppError> {
        let body = self.render("cancellation.html", full_name, details, reason)?;
        self.send(recipient, "Appointment Cancellation", &body).await
    }

    async fn send_appointment_reminder(&self, recipient: &str, full_name: &str, details: &str) -> Result<(), AppError> {
        let body = self.render("reminder.html", full_name, details, None)?;
        self.send(recipient, "Appointment Reminder", &body).await
    }
}
