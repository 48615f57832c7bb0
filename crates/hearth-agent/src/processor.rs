// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Proactive job processor: claim, decide, record, deliver.
//!
//! Job state machine: `queued -> running -> done | failed | skipped`.
//! Every claimed job reaches a terminal status and owns one outbox row by
//! the end of the pass that claimed it. Nothing is retried in-process.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hearth_config::model::ProactiveConfig;
use hearth_context::{build_context_pack_for_roles, render_decision_context};
use hearth_core::time::{format_timestamp, now_timestamp};
use hearth_core::{
    ChannelAdapter, Decider, Decision, DecisionOutput, HearthError, JobStatus, OutboxMessage,
    OutboxStatus, PluginAdapter, Role, TriggerJob,
};
use hearth_storage::Database;
use hearth_storage::queries::{jobs, outbox, sessions};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

const TRUNCATION_MARKER: char = '…';
const MISSING_TARGET: &str = "missing chat_id or text";

/// Terminal result of one processed job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub job_id: String,
    pub status: JobStatus,
    pub decision: Decision,
}

/// Coerce a raw decision into something safe to record.
///
/// A send with blank text becomes a skip. Text longer than `max_chars`
/// characters is cut and marked.
pub fn validate_decision(mut output: DecisionOutput, max_chars: usize) -> DecisionOutput {
    output.text = output.text.trim().to_string();
    if output.decision != Decision::Send {
        return output;
    }
    if output.text.is_empty() {
        output.decision = Decision::Skip;
        if output.reason.trim().is_empty() {
            output.reason = "empty text".to_string();
        }
    } else if let Some((idx, _)) = output.text.char_indices().nth(max_chars) {
        output.text.truncate(idx);
        output.text.push(TRUNCATION_MARKER);
    }
    output
}

fn trace_of(output: &DecisionOutput) -> Value {
    json!({
        "model": output.model,
        "reason": output.reason,
        "decision": output.decision,
    })
}

/// Drains the trigger job queue.
pub struct JobProcessor {
    db: Database,
    decider: Arc<dyn Decider>,
    channel: Arc<dyn ChannelAdapter>,
    config: ProactiveConfig,
}

impl JobProcessor {
    pub fn new(
        db: Database,
        decider: Arc<dyn Decider>,
        channel: Arc<dyn ChannelAdapter>,
        config: ProactiveConfig,
    ) -> Self {
        Self {
            db,
            decider,
            channel,
            config,
        }
    }

    /// Process up to `limit` due jobs. Returns how many were claimed.
    pub async fn process(&self, limit: usize) -> Result<usize, HearthError> {
        self.process_at(limit, Utc::now()).await
    }

    /// Same as [`process`](Self::process), with `now` used for reaping,
    /// claim eligibility and the lease.
    pub async fn process_at(&self, limit: usize, now: DateTime<Utc>) -> Result<usize, HearthError> {
        let now_str = format_timestamp(now);
        let reaped = jobs::reap_expired(&self.db, &now_str).await?;
        if reaped > 0 {
            warn!(reaped, "failed running jobs whose lease expired");
        }

        let lease_until =
            format_timestamp(now + chrono::Duration::seconds(self.config.lease_secs));
        let mut processed = 0;
        while processed < limit {
            let Some(job) = jobs::claim_next(&self.db, &now_str, &lease_until).await? else {
                break;
            };
            processed += 1;
            match self.run_job(&job).await {
                Ok(outcome) => {
                    info!(
                        job_id = %outcome.job_id,
                        session_id = %job.session_id,
                        status = %outcome.status,
                        decision = %outcome.decision,
                        "trigger job finished"
                    );
                }
                Err(e) => {
                    warn!(job_id = %job.id, error = %e, "trigger job errored");
                    if let Err(e) = self.fail_job(&job, &e.to_string()).await {
                        warn!(job_id = %job.id, error = %e, "could not mark job failed");
                    }
                }
            }
        }
        debug!(processed, limit, "job processing pass complete");
        Ok(processed)
    }

    /// Drive one claimed job to a terminal state.
    async fn run_job(&self, job: &TriggerJob) -> Result<JobOutcome, HearthError> {
        let session = sessions::get_session(&self.db, &job.session_id)
            .await
            .unwrap_or_else(|e| {
                warn!(job_id = %job.id, error = %e, "session lookup failed");
                None
            });
        let output = match self.decision_context(job).await {
            Ok(context) => self.decide(job, &context).await,
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "context build failed, skipping");
                DecisionOutput::skip(format!("context_error: {e}"))
            }
        };
        let output = validate_decision(output, self.config.max_text_chars);
        let recipient = session
            .and_then(|s| s.external_id)
            .or_else(|| self.config.default_recipient.clone());

        let now = now_timestamp();
        let mut row = OutboxMessage {
            id: uuid::Uuid::new_v4().to_string(),
            job_id: job.id.clone(),
            channel: self.config.channel.clone(),
            recipient: recipient.clone(),
            decision: output.decision,
            message_text: (output.decision == Decision::Send).then(|| output.text.clone()),
            status: OutboxStatus::Pending,
            sent_at: None,
            model_trace: trace_of(&output),
            created_at: now.clone(),
            updated_at: now,
        };
        outbox::insert_outbox(&self.db, &row).await?;

        let (outbox_status, job_status, last_error) = match output.decision {
            Decision::Skip => (OutboxStatus::Sent, JobStatus::Done, None),
            Decision::Send => match recipient.as_deref() {
                Some(to) if !to.is_empty() && !output.text.is_empty() => {
                    match self.deliver(to, &output.text).await {
                        Ok(()) => (OutboxStatus::Sent, JobStatus::Done, None),
                        Err(e) => {
                            let error = e.to_string();
                            row.model_trace = json!({
                                "error": error,
                                "decision": output.decision,
                                "model": output.model,
                            });
                            (OutboxStatus::Failed, JobStatus::Failed, Some(error))
                        }
                    }
                }
                _ => {
                    if let Some(trace) = row.model_trace.as_object_mut() {
                        trace.insert("warn".to_string(), json!(MISSING_TARGET));
                    }
                    let error = row.model_trace.to_string();
                    (OutboxStatus::Failed, JobStatus::Failed, Some(error))
                }
            },
        };

        let now = now_timestamp();
        let sent_at = (outbox_status == OutboxStatus::Sent).then_some(now.as_str());
        outbox::resolve_outbox(&self.db, &row.id, outbox_status, sent_at, &row.model_trace, &now)
            .await?;
        let finished =
            jobs::finish_job(&self.db, &job.id, job_status, last_error.as_deref(), &now).await?;
        if !finished {
            warn!(job_id = %job.id, "job was no longer running when finished");
        }

        Ok(JobOutcome {
            job_id: job.id.clone(),
            status: job_status,
            decision: output.decision,
        })
    }

    async fn decision_context(&self, job: &TriggerJob) -> Result<String, HearthError> {
        let pack = build_context_pack_for_roles(
            &self.db,
            &job.session_id,
            self.config.recent_messages,
            Some(&[Role::User, Role::Assistant][..]),
        )
        .await?;
        Ok(render_decision_context(
            &pack,
            job.trigger_type,
            self.config.max_context_chars,
        ))
    }

    /// Settle a job whose normal path errored.
    ///
    /// Pending outbox rows for the job are failed with `error` added to
    /// their trace. A job with no row yet gets a failed skip row.
    async fn fail_job(&self, job: &TriggerJob, error: &str) -> Result<(), HearthError> {
        let now = now_timestamp();
        let rows = outbox::outbox_for_job(&self.db, &job.id).await?;
        if rows.is_empty() {
            let row = OutboxMessage {
                id: uuid::Uuid::new_v4().to_string(),
                job_id: job.id.clone(),
                channel: self.config.channel.clone(),
                recipient: None,
                decision: Decision::Skip,
                message_text: None,
                status: OutboxStatus::Failed,
                sent_at: None,
                model_trace: json!({ "error": error }),
                created_at: now.clone(),
                updated_at: now.clone(),
            };
            outbox::insert_outbox(&self.db, &row).await?;
        }
        for mut row in rows.into_iter().filter(|r| r.status == OutboxStatus::Pending) {
            match row.model_trace.as_object_mut() {
                Some(trace) => {
                    trace.insert("error".to_string(), json!(error));
                }
                None => row.model_trace = json!({ "error": error }),
            }
            outbox::resolve_outbox(
                &self.db,
                &row.id,
                OutboxStatus::Failed,
                None,
                &row.model_trace,
                &now,
            )
            .await?;
        }
        jobs::finish_job(&self.db, &job.id, JobStatus::Failed, Some(error), &now).await?;
        Ok(())
    }

    /// Call the decider with a timeout; any failure becomes a skip.
    async fn decide(&self, job: &TriggerJob, context: &str) -> DecisionOutput {
        let timeout = Duration::from_secs(self.config.decide_timeout_secs);
        let result = tokio::time::timeout(
            timeout,
            self.decider.decide(job.trigger_type, &job.session_id, context),
        )
        .await
        .unwrap_or(Err(HearthError::Timeout { duration: timeout }));

        result.unwrap_or_else(|e| {
            warn!(
                job_id = %job.id,
                decider = self.decider.name(),
                error = %e,
                "decider failed, skipping"
            );
            DecisionOutput::skip(format!("decider_error: {e}"))
        })
    }

    async fn deliver(&self, recipient: &str, text: &str) -> Result<(), HearthError> {
        let timeout = Duration::from_secs(self.config.deliver_timeout_secs);
        tokio::time::timeout(
            timeout,
            self.channel.deliver(&self.config.channel, recipient, text),
        )
        .await
        .unwrap_or(Err(HearthError::Timeout { duration: timeout }))
    }
}
