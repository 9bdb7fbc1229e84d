//! PostgreSQL job store.
//!
//! Schema lives in `migrations/`. A unique index on (url, source) backs the
//! application-level dedup; unique violations surface as
//! `StoreError::DuplicateKey`. Per-source scrape locks are transaction-scoped
//! advisory locks held for the life of the returned guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ParseError, StoreError, StoreResult};
use crate::traits::store::{JobReader, JobWriter, SourceLock, SourceLocker};
use crate::types::{
    Certification, ExistingJob, JobFilter, JobId, JobPosting, JobSource, NewJob, Page,
    ScraperStats, SourceCount,
};

use super::memory::RECENT_JOBS;

const MAX_CONNECTIONS: u32 = 5;

/// Job store backed by PostgreSQL.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending migrations.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    title: String,
    company: String,
    location: String,
    salary: Option<String>,
    description: String,
    url: String,
    source: String,
    job_type: Option<String>,
    certifications_req: Vec<String>,
    specialty: Option<String>,
    posted_date: Option<DateTime<Utc>>,
    scraped_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_active: bool,
}

impl TryFrom<JobRow> for JobPosting {
    type Error = ParseError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(JobPosting {
            id: row.id,
            title: row.title,
            company: row.company,
            location: row.location,
            salary: row.salary,
            description: row.description,
            url: row.url,
            source: row.source.parse()?,
            job_type: row.job_type.as_deref().map(str::parse).transpose()?,
            certifications_req: row
                .certifications_req
                .iter()
                .map(|code| code.parse::<Certification>())
                .collect::<Result<_, _>>()?,
            specialty: row.specialty.as_deref().map(str::parse).transpose()?,
            posted_date: row.posted_date,
            scraped_at: row.scraped_at,
            updated_at: row.updated_at,
            is_active: row.is_active,
        })
    }
}

fn into_postings(rows: Vec<JobRow>) -> StoreResult<Vec<JobPosting>> {
    rows.into_iter()
        .map(|row| JobPosting::try_from(row).map_err(StoreError::from))
        .collect()
}

fn insert_error(e: sqlx::Error, url: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::DuplicateKey {
                url: url.to_string(),
            };
        }
    }
    StoreError::Database(e)
}

/// `%needle%` with LIKE metacharacters escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &JobFilter) {
    qb.push(" WHERE is_active");

    if let Some(location) = &filter.location {
        qb.push(" AND location ILIKE ").push_bind(like_pattern(location));
    }
    if let Some(job_type) = filter.job_type {
        qb.push(" AND job_type = ").push_bind(job_type.as_str());
    }
    if let Some(specialty) = filter.specialty {
        qb.push(" AND specialty = ").push_bind(specialty.as_str());
    }
    if let Some(certification) = filter.certification {
        qb.push(" AND ")
            .push_bind(certification.as_str())
            .push(" = ANY(certifications_req)");
    }
    if let Some(source) = filter.source {
        qb.push(" AND source = ").push_bind(source.as_str());
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR company ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl JobWriter for PostgresStore {
    async fn find_active_by_source(&self, source: JobSource) -> StoreResult<Vec<ExistingJob>> {
        let jobs = sqlx::query_as::<_, ExistingJob>(
            "SELECT title, company, url FROM jobs WHERE source = $1 AND is_active",
        )
        .bind(source.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn create(&self, job: &NewJob) -> StoreResult<JobPosting> {
        let now = Utc::now();
        let certifications: Vec<String> = job
            .certifications_req
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();

        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (
                id, title, company, location, salary, description, url, source,
                job_type, certifications_req, specialty, posted_date,
                scraped_at, updated_at, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13, TRUE)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(job.salary.as_deref())
        .bind(&job.description)
        .bind(&job.url)
        .bind(job.source.as_str())
        .bind(job.job_type.map(|t| t.as_str()))
        .bind(certifications)
        .bind(job.specialty.map(|s| s.as_str()))
        .bind(job.posted_date)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, &job.url))?;

        debug!(id = %row.id, url = %row.url, "Inserted job");
        Ok(JobPosting::try_from(row)?)
    }

    async fn archive_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE jobs SET is_active = FALSE, updated_at = NOW() WHERE is_active AND scraped_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl JobReader for PostgresStore {
    async fn find_by_id(&self, id: JobId) -> StoreResult<Option<JobPosting>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(JobPosting::try_from).transpose()?)
    }

    async fn list_active(&self, filter: &JobFilter) -> StoreResult<Page<JobPosting>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM jobs");
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY scraped_at DESC LIMIT ")
            .push_bind(filter.limit() as i64)
            .push(" OFFSET ")
            .push_bind(filter.offset() as i64);
        let rows: Vec<JobRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page {
            items: into_postings(rows)?,
            total: total as u64,
            page: filter.page(),
            limit: filter.limit(),
        })
    }

    async fn stats(&self) -> StoreResult<ScraperStats> {
        let (total_jobs, active_jobs): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM jobs",
        )
        .fetch_one(&self.pool)
        .await?;

        let by_source: Vec<(String, i64)> = sqlx::query_as(
            "SELECT source, COUNT(*) FROM jobs WHERE is_active GROUP BY source",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut jobs_by_source = by_source
            .into_iter()
            .map(|(source, count)| -> Result<SourceCount, ParseError> {
                Ok(SourceCount {
                    source: source.parse()?,
                    count: count as u64,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        jobs_by_source.sort_by_key(|entry| entry.source);

        let recent = sqlx::query_as::<_, JobRow>(
            "SELECT * FROM jobs WHERE is_active ORDER BY scraped_at DESC LIMIT $1",
        )
        .bind(RECENT_JOBS as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(ScraperStats {
            total_jobs: total_jobs as u64,
            active_jobs: active_jobs as u64,
            jobs_by_source,
            recent_jobs: into_postings(recent)?,
        })
    }
}

#[async_trait]
impl SourceLocker for PostgresStore {
    async fn lock_source(&self, source: JobSource) -> StoreResult<Option<SourceLock>> {
        let mut tx = self.pool.begin().await?;
        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
            .bind(source.lock_key())
            .fetch_one(&mut *tx)
            .await?;

        if !acquired {
            tx.rollback().await?;
            return Ok(None);
        }

        // Rolled back on drop, which releases the lock.
        Ok(Some(SourceLock::new(source, tx)))
    }
}
