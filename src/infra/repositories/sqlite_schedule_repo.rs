use crate::domain::models::work_schedule::{DayOfWeek, WorkSchedule};
use crate::domain::ports::WorkScheduleRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteScheduleRepo {
    pool: SqlitePool,
}

impl SqliteScheduleRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkScheduleRepository for SqliteScheduleRepo {
    async fn replace_for_employee(&self, employee_id: &str, schedules: &[WorkSchedule]) -> Result<Vec<WorkSchedule>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        sqlx::query("DELETE FROM work_schedules WHERE employee_id = ?")
            .bind(employee_id).execute(&mut *tx).await.map_err(AppError::Database)?;

        let mut saved = Vec::with_capacity(schedules.len());
        for schedule in schedules {
            let row = sqlx::query_as::<_, WorkSchedule>(
                "INSERT INTO work_schedules (id, employee_id, day_of_week, start_time, end_time, is_active) VALUES (?, ?, ?, ?, ?, ?) RETURNING *"
            )
                .bind(&schedule.id).bind(&schedule.employee_id).bind(schedule.day_of_week)
                .bind(schedule.start_time).bind(schedule.end_time).bind(schedule.is_active)
                .fetch_one(&mut *tx).await.map_err(AppError::Database)?;
            saved.push(row);
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(saved)
    }

    async fn list_by_employee(&self, employee_id: &str) -> Result<Vec<WorkSchedule>, AppError> {
        sqlx::query_as::<_, WorkSchedule>("SELECT * FROM work_schedules WHERE employee_id = ?")
            .bind(employee_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_active_schedule(&self, employee_id: &str, day_of_week: DayOfWeek) -> Result<Option<WorkSchedule>, AppError> {
        sqlx::query_as::<_, WorkSchedule>(
            "SELECT * FROM work_schedules WHERE employee_id = ? AND day_of_week = ? AND is_active = 1"
        )
            .bind(employee_id).bind(day_of_week)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
}
