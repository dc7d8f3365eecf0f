use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};
use validator::Validate;

use crate::db::{job_repo, submission_repo, user_repo};
use crate::error::WorkflowError;
use crate::model::{
    Assignment, CompletionDetails, FileRef, FinalUpload, Job, JobStatus, NewJob, Role, UserId,
    WriterSubmission,
};

use super::allocation::{validate_assignee, AllocationTarget};
use super::lifecycle::{next_status, JobAction};
use super::{load_job, reload_job, require_role, tracker, unauthorized, Workflow};

/// Changes to a job's content. Fields left `None` keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEdit {
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub attachment: Option<FileRef>,
}

/// A job and its submission record after a writer action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterProgress {
    pub job: Job,
    pub submission: WriterSubmission,
}

/// Maps a zero-row conditional update to the race loser's error.
fn ensure_changed(changed: usize, job: &Job, action: JobAction) -> Result<(), WorkflowError> {
    if changed == 0 {
        return Err(WorkflowError::illegal_job_transition(
            &job.job_id,
            job.status,
            action.as_str(),
        ));
    }
    Ok(())
}

impl Workflow {
    /// Drops a new job. The `job_id` is claimed atomically by the store.
    pub fn create_job(&self, actor: &UserId, new_job: NewJob) -> Result<Job, WorkflowError> {
        let _span = info_span!("create_job", job_id = %new_job.job_id, actor = %actor).entered();
        new_job.validate()?;
        let now = self.now();

        self.db.with_tx(|tx| {
            let user = require_role(tx, actor, "create jobs", |r| r == Role::Marketing)?;

            let job_id = new_job.job_id.trim().to_string();
            let job = Job {
                row_id: 0,
                job_id: job_id.clone(),
                instructions: new_job.instructions,
                attachment: new_job.attachment,
                created_by: user.id,
                topic: None,
                word_count: None,
                referencing_style: None,
                writing_style: None,
                completion_instructions: None,
                expected_deadline: None,
                strict_deadline: None,
                amount: None,
                status: if new_job.draft {
                    JobStatus::Draft
                } else {
                    JobStatus::PendingCompletion
                },
                assignment: Assignment::Unallocated,
                completed_form_at: None,
                created_at: now,
                updated_at: now,
            };

            let row_id = job_repo::insert(tx, &job).map_err(|e| {
                if e.is_constraint_violation() {
                    WorkflowError::DuplicateIdentifier {
                        kind: "Job",
                        value: job_id.clone(),
                    }
                } else {
                    e.into()
                }
            })?;

            info!(status = %job.status, "job created");
            Ok(Job { row_id, ..job })
        })
    }

    /// Fills in the completion form and releases the job for allocation.
    pub fn complete_job(
        &self,
        actor: &UserId,
        job_id: &str,
        details: CompletionDetails,
    ) -> Result<Job, WorkflowError> {
        let _span = info_span!("complete_job", job_id = %job_id, actor = %actor).entered();
        details.validate()?;
        let now = self.now();
        self.deadlines
            .validate_expected_deadline(details.expected_deadline, now)?;

        self.db.with_tx(|tx| {
            let user = require_role(tx, actor, "complete jobs", |r| r == Role::Marketing)?;
            let job = load_job(tx, job_id)?;
            if job.created_by != user.id {
                return Err(unauthorized(&user, "complete another user's job"));
            }
            next_status(&job, JobAction::Complete)?;

            let strict = self.deadlines.strict_deadline_for(details.expected_deadline)?;
            let changed = job_repo::complete(tx, job.row_id, job.status, &details, strict, now)?;
            ensure_changed(changed, &job, JobAction::Complete)?;

            let job = reload_job(tx, &job)?;
            info!(strict_deadline = ?job.strict_deadline, "job completed");
            Ok(job)
        })
    }

    /// Updates instructions or attachment while the job is still editable.
    pub fn edit_job(
        &self,
        actor: &UserId,
        job_id: &str,
        edit: JobEdit,
    ) -> Result<Job, WorkflowError> {
        let _span = info_span!("edit_job", job_id = %job_id, actor = %actor).entered();
        if let Some(ref instructions) = edit.instructions {
            if instructions.trim().is_empty() {
                return Err(WorkflowError::validation("instructions", "must not be empty"));
            }
        }
        let now = self.now();

        self.db.with_tx(|tx| {
            let user = super::load_actor(tx, actor, "edit jobs")?;
            let job = load_job(tx, job_id)?;
            if job.created_by != user.id {
                return Err(unauthorized(&user, "edit another user's job"));
            }
            if !job.status.is_editable() {
                return Err(WorkflowError::ImmutableState {
                    job_id: job.job_id.clone(),
                    status: job.status,
                });
            }

            let instructions = edit.instructions.as_deref().unwrap_or(&job.instructions);
            let attachment = edit.attachment.as_ref().or(job.attachment.as_ref());
            let changed =
                job_repo::update_content(tx, job.row_id, job.status, instructions, attachment, now)?;
            if changed == 0 {
                return Err(WorkflowError::ImmutableState {
                    job_id: job.job_id.clone(),
                    status: job.status,
                });
            }

            debug!("job content updated");
            reload_job(tx, &job)
        })
    }

    /// Routes a `pending_allocation` job to a writer or the process queue.
    pub fn allocate_job(
        &self,
        actor: &UserId,
        job_id: &str,
        target: AllocationTarget,
    ) -> Result<Job, WorkflowError> {
        let _span = info_span!(
            "allocate_job",
            job_id = %job_id,
            actor = %actor,
            kind = %target.kind(),
            assignee = %target.assignee(),
        )
        .entered();
        let now = self.now();

        let result = self.db.with_tx(|tx| {
            let user = require_role(tx, actor, "allocate jobs", |r| r.can_allocate())?;
            let job = load_job(tx, job_id)?;
            let action = target.action();
            next_status(&job, action)?;

            let assignee = user_repo::find_by_id(tx, target.assignee())?;
            validate_assignee(&target, assignee.as_ref())?;

            let changed = match &target {
                AllocationTarget::Writer(writer) => {
                    job_repo::assign_writer(tx, job.row_id, writer, &user.id, now)?
                }
                AllocationTarget::Process(process_user) => {
                    job_repo::assign_process(tx, job.row_id, process_user, &user.id, now)?
                }
            };
            ensure_changed(changed, &job, action)?;

            reload_job(tx, &job)
        });

        match &result {
            Ok(job) => info!(status = %job.status, "job allocated"),
            Err(e) => warn!(error = %e, "allocation refused"),
        }
        result
    }

    /// The assigned writer starts work on an allocated job.
    pub fn start_job(&self, actor: &UserId, job_id: &str) -> Result<WriterProgress, WorkflowError> {
        let _span = info_span!("start_job", job_id = %job_id, actor = %actor).entered();
        let now = self.now();

        self.db.with_tx(|tx| {
            let (job, submission) = self.writer_context(tx, actor, job_id, "start jobs", now)?;
            let to = next_status(&job, JobAction::Start)?;

            let changed = job_repo::transition(tx, job.row_id, job.status, to, now)?;
            ensure_changed(changed, &job, JobAction::Start)?;
            let submission = tracker::mark_started(tx, &submission, now)?;

            info!("job started");
            Ok(WriterProgress {
                job: reload_job(tx, &job)?,
                submission,
            })
        })
    }

    /// Stores the structure outline. An allocated job is started as a side effect.
    pub fn upload_structure(
        &self,
        actor: &UserId,
        job_id: &str,
        file: FileRef,
    ) -> Result<WriterProgress, WorkflowError> {
        let _span = info_span!("upload_structure", job_id = %job_id, actor = %actor).entered();
        let now = self.now();

        self.db.with_tx(|tx| {
            let (job, submission) =
                self.writer_context(tx, actor, job_id, "upload structures", now)?;

            match job.status {
                JobStatus::Allocated => {
                    let changed = job_repo::transition(
                        tx,
                        job.row_id,
                        JobStatus::Allocated,
                        JobStatus::InProgress,
                        now,
                    )?;
                    ensure_changed(changed, &job, JobAction::Start)?;
                }
                JobStatus::InProgress => {}
                from => {
                    return Err(WorkflowError::illegal_job_transition(
                        &job.job_id,
                        from,
                        "upload a structure",
                    ))
                }
            }

            submission_repo::set_structure(tx, submission.id, &file, now)?;
            let submission = tracker::mark_started(tx, &submission, now)?;

            info!(file = %file, "structure uploaded");
            Ok(WriterProgress {
                job: reload_job(tx, &job)?,
                submission,
            })
        })
    }

    /// Stores the final deliverables and submits the job for review.
    pub fn upload_final(
        &self,
        actor: &UserId,
        job_id: &str,
        upload: FinalUpload,
    ) -> Result<WriterProgress, WorkflowError> {
        let _span = info_span!("upload_final", job_id = %job_id, actor = %actor).entered();
        let now = self.now();

        self.db.with_tx(|tx| {
            let (job, submission) = self.writer_context(tx, actor, job_id, "upload finals", now)?;
            let to = next_status(&job, JobAction::Submit)?;

            if upload.final_copy.is_none() && submission.final_copy.is_none() {
                return Err(WorkflowError::validation("final_copy", "is required"));
            }

            submission_repo::set_final(tx, submission.id, &upload, now)?;
            let changed = job_repo::transition(tx, job.row_id, job.status, to, now)?;
            ensure_changed(changed, &job, JobAction::Submit)?;
            let submission = tracker::mark_submitted(tx, &submission, now)?;

            info!("final copy submitted");
            Ok(WriterProgress {
                job: reload_job(tx, &job)?,
                submission,
            })
        })
    }

    /// The assigned process user picks a queued job up.
    pub fn start_processing(&self, actor: &UserId, job_id: &str) -> Result<Job, WorkflowError> {
        let _span = info_span!("start_processing", job_id = %job_id, actor = %actor).entered();
        self.process_step(actor, job_id, JobAction::StartProcessing)
    }

    /// The assigned process user marks the job done.
    pub fn finish_processing(&self, actor: &UserId, job_id: &str) -> Result<Job, WorkflowError> {
        let _span = info_span!("finish_processing", job_id = %job_id, actor = %actor).entered();
        self.process_step(actor, job_id, JobAction::FinishProcessing)
    }

    /// Accepts a writer's submission, completing the job.
    pub fn accept_submission(&self, actor: &UserId, job_id: &str) -> Result<Job, WorkflowError> {
        let _span = info_span!("accept_submission", job_id = %job_id, actor = %actor).entered();
        let now = self.now();

        self.db.with_tx(|tx| {
            require_role(tx, actor, "accept submissions", |r| r.can_allocate())?;
            let job = load_job(tx, job_id)?;
            let to = next_status(&job, JobAction::Accept)?;

            let changed = job_repo::transition(tx, job.row_id, job.status, to, now)?;
            ensure_changed(changed, &job, JobAction::Accept)?;

            info!("submission accepted");
            reload_job(tx, &job)
        })
    }

    /// Cancels a job that has not reached a terminal status.
    pub fn cancel_job(&self, actor: &UserId, job_id: &str) -> Result<Job, WorkflowError> {
        let _span = info_span!("cancel_job", job_id = %job_id, actor = %actor).entered();
        let now = self.now();

        self.db.with_tx(|tx| {
            require_role(tx, actor, "cancel jobs", |r| r.can_cancel_jobs())?;
            let job = load_job(tx, job_id)?;
            let to = next_status(&job, JobAction::Cancel)?;

            let changed = job_repo::transition(tx, job.row_id, job.status, to, now)?;
            ensure_changed(changed, &job, JobAction::Cancel)?;

            info!(from = %job.status, "job cancelled");
            reload_job(tx, &job)
        })
    }

    /// Loads a job for its assigned writer and the submission record, creating it if needed.
    fn writer_context(
        &self,
        tx: &rusqlite::Connection,
        actor: &UserId,
        job_id: &str,
        action: &'static str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(Job, WriterSubmission), WorkflowError> {
        let user = require_role(tx, actor, action, |r| r == Role::Writer)?;
        let job = load_job(tx, job_id)?;
        if job.writer() != Some(&user.id) {
            return Err(unauthorized(&user, "work on a job assigned to someone else"));
        }
        let submission = tracker::touch(tx, &job, &user.id, now)?;
        Ok((job, submission))
    }

    fn process_step(
        &self,
        actor: &UserId,
        job_id: &str,
        action: JobAction,
    ) -> Result<Job, WorkflowError> {
        let now = self.now();

        self.db.with_tx(|tx| {
            let user = require_role(tx, actor, action.as_str(), |r| r == Role::Process)?;
            let job = load_job(tx, job_id)?;
            if job.process_user() != Some(&user.id) {
                return Err(unauthorized(&user, "process a job assigned to someone else"));
            }
            let to = next_status(&job, action)?;

            let changed = job_repo::transition(tx, job.row_id, job.status, to, now)?;
            ensure_changed(changed, &job, action)?;

            info!(status = %to, "process step recorded");
            reload_job(tx, &job)
        })
    }
}
