//! Tasks, jobs and job logs
//!
//! Running an action creates a task; the task owns an ordered sequence
//! of jobs, each with its own status and log files. Waiting re-fetches
//! the status until it goes terminal; on failure the jobs' logs are
//! pulled and emitted for diagnosis.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::objects::action::Action;
use crate::resource::collection::{Collection, Filter, Paging};
use crate::resource::object::{Entity, HasStatus, Obj};
use crate::resource::route::Seg;
use crate::version::TASK_ACTION_SINCE;

/// Statuses from which a task or job never transitions again.
pub const END_STATUSES: &[&str] = &["failed", "success"];

/// The failure terminal status.
pub const STATUS_FAILED: &str = "failed";

// =========================================================================
// Task
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    pub id: Option<u64>,
    pub action_id: Option<u64>,
    pub status: Option<String>,
    pub object_id: Option<u64>,
    pub object_type: Option<String>,
    pub pid: Option<u64>,
    pub jobs: Option<Value>,
    pub config: Option<Value>,
    pub hostcomponentmap: Option<Value>,
    pub start_date: Option<DateTime<Utc>>,
    pub finish_date: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

impl Entity for TaskRecord {
    const KIND: &'static str = "task";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("task")]);
    const SUB: Option<&'static [&'static str]> = None;
    const ID_PARAM: &'static str = "task_id";
    const FILTERS: &'static [&'static str] =
        &["action_id", "pid", "status", "start_date", "finish_date"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

impl HasStatus for TaskRecord {
    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

pub type Task = Obj<TaskRecord>;

impl Obj<TaskRecord> {
    /// A handle to one job of this task.
    pub fn job(&self, id: u64) -> Result<Job> {
        self.client().job(id)
    }

    /// This task's jobs, in execution order.
    pub fn job_list(
        &self,
        filter: Filter,
        paging: Option<Paging>,
    ) -> Result<Collection<JobRecord>> {
        self.child_collection(filter, paging)
    }

    /// The action this task was created from, recovered from the
    /// record's owning object type and id.
    ///
    /// The version guard runs before any request is made.
    pub async fn action(&mut self) -> Result<Action> {
        self.client().require_version(TASK_ACTION_SINCE)?;
        let record = self.record().await?;
        let action_id = record.action_id.ok_or(Error::NotFound("action"))?;
        let object_id = record.object_id.ok_or(Error::NotFound("task owner"))?;
        let object_type = record
            .object_type
            .clone()
            .ok_or(Error::NotFound("task owner"))?;
        // The owning object type is only known by name at runtime.
        match object_type.as_str() {
            "cluster" => self.client().cluster(object_id)?.action(action_id),
            "service" => self.client().service(object_id)?.action(action_id),
            "component" => self.client().component(object_id)?.action(action_id),
            "host" => self.client().host(object_id)?.action(action_id),
            "provider" => self.client().provider(object_id)?.action(action_id),
            other => Err(Error::Protocol(format!(
                "task owned by unknown object type '{other}'"
            ))),
        }
    }

    /// Wait until the task reaches a terminal status and return it.
    ///
    /// A `"failed"` outcome triggers best-effort collection of the
    /// failed jobs' logs before returning; the status itself is
    /// returned, not raised. On [`Error::WaitTimeout`] the logs of all
    /// jobs are collected before the error propagates.
    pub async fn wait(&mut self, timeout: Option<Duration>) -> Result<String> {
        match self.wait_for_status(END_STATUSES, timeout).await {
            Ok(status) => {
                if status == STATUS_FAILED {
                    self.log_jobs(Some(STATUS_FAILED)).await?;
                }
                Ok(status)
            }
            Err(err @ Error::WaitTimeout { .. }) => {
                self.log_jobs(None).await?;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Like [`Task::wait`], but a `"failed"` terminal status becomes
    /// [`Error::TaskFailed`] for callers that treat it as fatal.
    pub async fn try_wait(&mut self, timeout: Option<Duration>) -> Result<String> {
        let status = self.wait(timeout).await?;
        if status == STATUS_FAILED {
            return Err(Error::TaskFailed(status));
        }
        Ok(status)
    }

    /// Emit the logs of this task's jobs through `tracing`.
    ///
    /// An individual log reported as `LOG_NOT_FOUND` is skipped (a job
    /// may simply not have produced that log kind); any other transport
    /// error aborts the collection.
    async fn log_jobs(&mut self, status: Option<&str>) -> Result<()> {
        let action_name = self.action_name().await?;
        let mut filter = Filter::new();
        if let Some(status) = status {
            filter = filter.field("status", status);
        }
        let jobs = self.job_list(filter, None)?.all().await?;
        for mut job in jobs {
            let record = job.record().await?.clone();
            let failed = record.status.as_deref() == Some(STATUS_FAILED);
            if failed {
                tracing::error!("Action: {}", action_name);
            } else {
                tracing::info!("Action: {}", action_name);
            }
            for file in record.log_files.unwrap_or_default() {
                let url = match &file.url {
                    Some(url) => url.clone(),
                    None => continue,
                };
                let log = match self.client().get_url(&url).await {
                    Ok(log) => log,
                    Err(err) if err.api_code() == Some("LOG_NOT_FOUND") => continue,
                    Err(err) => return Err(err),
                };
                emit_log(&log, failed);
            }
        }
        Ok(())
    }

    /// The name of the triggering action, falling back to the stack's
    /// action registry when the owner can no longer be resolved.
    async fn action_name(&mut self) -> Result<String> {
        let named = match self.action().await {
            Ok(mut action) => action.record().await?.name.clone(),
            Err(_) => None,
        };
        if let Some(name) = named {
            return Ok(name);
        }
        let action_id = self.record().await?.action_id.ok_or(Error::NotFound("action"))?;
        let raw = self
            .client()
            .request(Method::GET, &format!("stack/action/{action_id}/"), &[], None)
            .await?;
        Ok(raw
            .get("name")
            .and_then(|n| n.as_str())
            .unwrap_or("<unnamed>")
            .to_string())
    }
}

/// Emit one fetched log document, pretty-printing structured content.
fn emit_log(log: &Value, failed: bool) {
    let format = log.get("format").and_then(|f| f.as_str()).unwrap_or("txt");
    if let Some(kind) = log.get("type").and_then(|t| t.as_str()) {
        if failed {
            tracing::error!("Type: {}", kind);
        } else {
            tracing::info!("Type: {}", kind);
        }
    }
    let Some(content) = log.get("content") else {
        return;
    };
    let rendered = if format == "json" {
        serde_json::to_string_pretty(content).unwrap_or_else(|_| content.to_string())
    } else {
        content.as_str().map(str::to_string).unwrap_or_else(|| content.to_string())
    };
    if failed {
        tracing::error!("{}", rendered);
    } else {
        tracing::info!("{}", rendered);
    }
}

// =========================================================================
// Job
// =========================================================================

/// Reference to one log file of a job, as listed on the job record.
#[derive(Debug, Clone, Deserialize)]
pub struct LogFileRef {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub format: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobRecord {
    pub id: Option<u64>,
    pub task_id: Option<u64>,
    pub pid: Option<u64>,
    pub status: Option<String>,
    pub display_name: Option<String>,
    pub log_files: Option<Vec<LogFileRef>>,
    pub start_date: Option<DateTime<Utc>>,
    pub finish_date: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

impl Entity for JobRecord {
    const KIND: &'static str = "job";
    const ROOT: Option<&'static [Seg]> = Some(&[Seg::Lit("job")]);
    const SUB: Option<&'static [&'static str]> = None;
    const ID_PARAM: &'static str = "job_id";
    const FILTERS: &'static [&'static str] =
        &["action_id", "task_id", "pid", "status", "start_date", "finish_date"];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

impl HasStatus for JobRecord {
    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

pub type Job = Obj<JobRecord>;

impl Obj<JobRecord> {
    /// The task this job belongs to.
    pub async fn task(&mut self) -> Result<Task> {
        let task_id = self
            .record()
            .await?
            .task_id
            .ok_or(Error::NotFound(TaskRecord::KIND))?;
        self.client().task(task_id)
    }

    /// Wait until this job reaches a terminal status and return it.
    pub async fn wait(&mut self, timeout: Option<Duration>) -> Result<String> {
        self.wait_for_status(END_STATUSES, timeout).await
    }

    /// A handle to one of this job's logs.
    pub fn log(&self, id: u64) -> Result<Log> {
        self.subobject(id)
    }

    /// This job's logs.
    pub fn log_list(&self, paging: Option<Paging>) -> Result<Collection<LogRecord>> {
        self.sub_collection(Filter::new(), paging)
    }
}

// =========================================================================
// Log
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LogRecord {
    pub id: Option<u64>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub format: Option<String>,
    pub content: Option<Value>,
}

impl Entity for LogRecord {
    const KIND: &'static str = "log";
    const ROOT: Option<&'static [Seg]> =
        Some(&[Seg::Lit("job"), Seg::Param("job_id"), Seg::Lit("log")]);
    const SUB: Option<&'static [&'static str]> = Some(&["log"]);
    const ID_PARAM: &'static str = "log_id";
    const FILTERS: &'static [&'static str] = &[];

    fn id(&self) -> Option<u64> {
        self.id
    }
}

pub type Log = Obj<LogRecord>;
