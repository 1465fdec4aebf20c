use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::application::{
    Application, ApplicationRow, ApplicationStatus, AssessmentUpdate, NewApplication,
};

/// Candidate applications. Created once, then mutated in place by the
/// status and assessment flows; never deleted.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn create(&self, application: NewApplication) -> Result<Uuid, sqlx::Error>;

    /// Newest first.
    async fn list_by_job(&self, job_id: &str) -> Result<Vec<Application>, sqlx::Error>;

    async fn get(&self, id: Uuid) -> Result<Option<Application>, sqlx::Error>;

    /// `false` when no application has this id.
    async fn save_assessment(&self, id: Uuid, update: AssessmentUpdate) -> Result<bool, sqlx::Error>;

    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Option<Application>, sqlx::Error>;
}

pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_application(row: ApplicationRow) -> Result<Application, sqlx::Error> {
    Application::try_from(row).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn create(&self, application: NewApplication) -> Result<Uuid, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO applications
                (id, job_id, job_title, full_name, phone, years_exp,
                 resume_filename, resume_content_type, resume_text, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(id)
        .bind(&application.job_id)
        .bind(&application.job_title)
        .bind(&application.full_name)
        .bind(&application.phone)
        .bind(application.years_exp)
        .bind(&application.resume.filename)
        .bind(&application.resume.content_type)
        .bind(&application.resume_text)
        .bind(ApplicationStatus::Pending.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!("Stored application {id} for job {}", application.job_id);
        Ok(id)
    }

    async fn list_by_job(&self, job_id: &str) -> Result<Vec<Application>, sqlx::Error> {
        let rows: Vec<ApplicationRow> = sqlx::query_as(
            "SELECT * FROM applications WHERE job_id = $1 ORDER BY created_at DESC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(into_application).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Application>, sqlx::Error> {
        let row: Option<ApplicationRow> = sqlx::query_as("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(into_application).transpose()
    }

    async fn save_assessment(&self, id: Uuid, update: AssessmentUpdate) -> Result<bool, sqlx::Error> {
        // Answers and result are only overwritten when supplied.
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET assessment_questions = $2,
                assessment_answers = COALESCE($3, assessment_answers),
                assessment_result = COALESCE($4, assessment_result)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.questions)
        .bind(&update.answers)
        .bind(&update.result)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Option<Application>, sqlx::Error> {
        let row: Option<ApplicationRow> =
            sqlx::query_as("UPDATE applications SET status = $2 WHERE id = $1 RETURNING *")
                .bind(id)
                .bind(status.as_str())
                .fetch_optional(&self.pool)
                .await?;

        row.map(into_application).transpose()
    }
}
