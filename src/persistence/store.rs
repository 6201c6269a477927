//! SQLite-based result store

use crate::core::{DomainType, ExecutionStatus, KeywordCategory, PipelineResult, PipelineStep, RunSummary};
use crate::persistence::ResultStore;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS pipelines (
        id TEXT PRIMARY KEY,
        query TEXT NOT NULL,
        status TEXT NOT NULL,
        config TEXT NOT NULL,
        total_steps INTEGER NOT NULL DEFAULT 0,
        successful_steps INTEGER NOT NULL DEFAULT 0,
        failed_steps INTEGER NOT NULL DEFAULT 0,
        max_depth_reached INTEGER NOT NULL DEFAULT 0,
        started_at TEXT NOT NULL,
        completed_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pipeline_steps (
        id TEXT PRIMARY KEY,
        pipeline_id TEXT NOT NULL REFERENCES pipelines(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        parent_step_id TEXT,
        domain_type TEXT NOT NULL,
        search_parameter TEXT NOT NULL,
        category TEXT NOT NULL,
        depth INTEGER NOT NULL,
        success INTEGER NOT NULL,
        error TEXT,
        output TEXT NOT NULL,
        keywords TEXT NOT NULL,
        started_at TEXT,
        completed_at TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_steps_pipeline ON pipeline_steps(pipeline_id, position)",
    "CREATE INDEX IF NOT EXISTS idx_pipelines_started_at ON pipelines(started_at)",
];

/// SQLite result store
pub struct SqliteResultStore {
    pool: SqlitePool,
}

impl SqliteResultStore {
    /// Open (creating if needed) a database file, or `:memory:`
    pub async fn new(db_path: &str) -> Result<Self> {
        let in_memory = db_path == ":memory:";
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))
            .context("Invalid database path")?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every pooled connection to :memory: would see its own empty database
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Open the database at a filesystem path, creating parent directories
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let path = path
            .to_str()
            .ok_or_else(|| anyhow!("Database path is not valid UTF-8: {}", path.display()))?;
        Self::new(path).await
    }

    /// `<data dir>/dragnet/pipelines.db`
    pub fn default_path() -> std::path::PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("dragnet")
            .join("pipelines.db")
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to initialize schema")?;
        }
        Ok(())
    }

    fn summary_from_row(row: &SqliteRow) -> Result<RunSummary> {
        Ok(RunSummary {
            id: parse_uuid(row.get("id"))?,
            query: row.get("query"),
            status: ExecutionStatus::from_str(row.get("status")).map_err(|e| anyhow!(e))?,
            total_steps: row.get::<i64, _>("total_steps") as usize,
            successful_steps: row.get::<i64, _>("successful_steps") as usize,
            failed_steps: row.get::<i64, _>("failed_steps") as usize,
            max_depth_reached: row.get::<i64, _>("max_depth_reached") as u32,
            started_at: parse_time(row.get("started_at"))?,
            completed_at: row
                .get::<Option<String>, _>("completed_at")
                .as_deref()
                .map(parse_time)
                .transpose()?,
        })
    }

    fn step_from_row(row: &SqliteRow) -> Result<PipelineStep> {
        Ok(PipelineStep {
            id: parse_uuid(row.get("id"))?,
            pipeline_id: parse_uuid(row.get("pipeline_id"))?,
            parent_step_id: row
                .get::<Option<String>, _>("parent_step_id")
                .as_deref()
                .map(parse_uuid)
                .transpose()?,
            domain_type: DomainType::from_str(row.get("domain_type")).map_err(|e| anyhow!(e))?,
            search_parameter: row.get("search_parameter"),
            category: KeywordCategory::from_str(row.get("category")).map_err(|e| anyhow!(e))?,
            depth: row.get::<i64, _>("depth") as u32,
            success: row.get("success"),
            error: row.get("error"),
            output: serde_json::from_str(row.get("output")).context("Corrupt step output")?,
            keywords_per_category: serde_json::from_str(row.get("keywords")).context("Corrupt step keywords")?,
            started_at: row
                .get::<Option<String>, _>("started_at")
                .as_deref()
                .map(parse_time)
                .transpose()?,
            completed_at: row
                .get::<Option<String>, _>("completed_at")
                .as_deref()
                .map(parse_time)
                .transpose()?,
        })
    }
}

fn format_time(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid timestamp {:?}", raw))?
        .with_timezone(&Utc))
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("Invalid id {:?}", raw))
}

#[async_trait::async_trait]
impl ResultStore for SqliteResultStore {
    async fn save_result(&self, result: &PipelineResult) -> Result<Uuid> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO pipelines
            (id, query, status, config, total_steps, successful_steps, failed_steps, max_depth_reached, started_at, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(result.id.to_string())
        .bind(&result.config.query)
        .bind(result.status.as_str())
        .bind(serde_json::to_string(&result.config)?)
        .bind(result.total_steps as i64)
        .bind(result.successful_steps as i64)
        .bind(result.failed_steps as i64)
        .bind(result.max_depth_reached as i64)
        .bind(format_time(result.started_at))
        .bind(result.completed_at.map(format_time))
        .execute(&mut *tx)
        .await
        .context("Failed to save pipeline")?;

        sqlx::query("DELETE FROM pipeline_steps WHERE pipeline_id = ?1")
            .bind(result.id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to clear previous steps")?;

        for (position, step) in result.steps.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO pipeline_steps
                (id, pipeline_id, position, parent_step_id, domain_type, search_parameter, category,
                 depth, success, error, output, keywords, started_at, completed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
            )
            .bind(step.id.to_string())
            .bind(result.id.to_string())
            .bind(position as i64)
            .bind(step.parent_step_id.map(|id| id.to_string()))
            .bind(step.domain_type.as_str())
            .bind(&step.search_parameter)
            .bind(step.category.as_str())
            .bind(step.depth as i64)
            .bind(step.success)
            .bind(step.error.as_deref())
            .bind(serde_json::to_string(&step.output)?)
            .bind(serde_json::to_string(&step.keywords_per_category)?)
            .bind(step.started_at.map(format_time))
            .bind(step.completed_at.map(format_time))
            .execute(&mut *tx)
            .await
            .context("Failed to save step")?;
        }

        tx.commit().await.context("Failed to commit pipeline")?;
        debug!("Saved pipeline {} with {} steps", result.id, result.steps.len());

        Ok(result.id)
    }

    async fn load_result(&self, pipeline_id: Uuid) -> Result<Option<PipelineResult>> {
        let row = sqlx::query(
            r#"
            SELECT id, query, status, config, total_steps, successful_steps, failed_steps,
                   max_depth_reached, started_at, completed_at
            FROM pipelines
            WHERE id = ?1
            "#,
        )
        .bind(pipeline_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load pipeline")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let summary = Self::summary_from_row(&row)?;
        let config = serde_json::from_str(row.get("config")).context("Corrupt pipeline config")?;
        let steps = self.list_steps(pipeline_id).await?;

        Ok(Some(PipelineResult {
            id: summary.id,
            status: summary.status,
            steps,
            total_steps: summary.total_steps,
            successful_steps: summary.successful_steps,
            failed_steps: summary.failed_steps,
            max_depth_reached: summary.max_depth_reached,
            config,
            started_at: summary.started_at,
            completed_at: summary.completed_at,
        }))
    }

    async fn list_steps(&self, pipeline_id: Uuid) -> Result<Vec<PipelineStep>> {
        let rows = sqlx::query(
            r#"
            SELECT id, pipeline_id, parent_step_id, domain_type, search_parameter, category, depth,
                   success, error, output, keywords, started_at, completed_at
            FROM pipeline_steps
            WHERE pipeline_id = ?1
            ORDER BY position ASC
            "#,
        )
        .bind(pipeline_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list steps")?;

        rows.iter().map(Self::step_from_row).collect()
    }

    async fn list_results(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, query, status, total_steps, successful_steps, failed_steps,
                   max_depth_reached, started_at, completed_at
            FROM pipelines
            ORDER BY started_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list pipelines")?;

        rows.iter().map(Self::summary_from_row).collect()
    }
}
