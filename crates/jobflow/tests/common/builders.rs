//! Builders for workflow inputs.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};

use jobflow::{Amount, CompletionDetails, FileRef, NewJob, NewUser, Role};

/// Builder for `NewUser` registrations.
pub struct NewUserBuilder {
    email: String,
    first_name: String,
    last_name: String,
    whatsapp_no: String,
    role: Role,
}

impl NewUserBuilder {
    pub fn new(first_name: &str) -> Self {
        Self {
            email: format!("{}@example.com", first_name.to_lowercase()),
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            whatsapp_no: "+10000000000".to_string(),
            role: Role::User,
        }
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    pub fn last_name(mut self, last_name: &str) -> Self {
        self.last_name = last_name.to_string();
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn build(self) -> NewUser {
        NewUser {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            whatsapp_no: self.whatsapp_no,
            role: self.role,
        }
    }
}

/// Builder for `NewJob` drops.
pub struct NewJobBuilder {
    job_id: String,
    instructions: String,
    attachment: Option<FileRef>,
    draft: bool,
}

impl NewJobBuilder {
    pub fn new(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            instructions: format!("Write the essay for {}", job_id),
            attachment: None,
            draft: false,
        }
    }

    pub fn instructions(mut self, instructions: &str) -> Self {
        self.instructions = instructions.to_string();
        self
    }

    pub fn attachment(mut self, filename: &str) -> Self {
        self.attachment = Some(FileRef::job_attachment(&self.job_id, filename));
        self
    }

    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }

    pub fn build(self) -> NewJob {
        NewJob {
            job_id: self.job_id,
            instructions: self.instructions,
            attachment: self.attachment,
            draft: self.draft,
        }
    }
}

/// Builder for completion forms. Defaults to a deadline two days after `now`.
pub struct CompletionBuilder {
    details: CompletionDetails,
}

impl CompletionBuilder {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            details: CompletionDetails {
                topic: Some("Renewable energy policy".to_string()),
                word_count: 1500,
                referencing_style: Some("apa".to_string()),
                writing_style: Some("essay".to_string()),
                completion_instructions: Some("Use at least five sources".to_string()),
                expected_deadline: now + Duration::days(2),
                amount: Amount::from_cents(120_00),
            },
        }
    }

    pub fn expected_deadline(mut self, at: DateTime<Utc>) -> Self {
        self.details.expected_deadline = at;
        self
    }

    pub fn word_count(mut self, word_count: i64) -> Self {
        self.details.word_count = word_count;
        self
    }

    pub fn amount(mut self, amount: &str) -> Self {
        self.details.amount = amount.parse().expect("valid amount");
        self
    }

    pub fn build(self) -> CompletionDetails {
        self.details
    }
}
