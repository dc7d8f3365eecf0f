//! References to blobs held by the external file store.
//!
//! The core never reads file content; it only records where the file
//! store put it. Keys are grouped by the job's stable identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sanitize::file_name_only;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(String);

impl FileRef {
    /// Wraps a key already issued by the file store.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// `job_attachments/<job_id>/<file>` for the marketing attachment.
    pub fn job_attachment(job_id: &str, filename: &str) -> Self {
        Self(format!(
            "job_attachments/{}/{}",
            file_name_only(job_id),
            file_name_only(filename)
        ))
    }

    /// `writer_submissions/job_<job_id>/<file>` for writer deliverables.
    pub fn writer_upload(job_id: &str, filename: &str) -> Self {
        Self(format!(
            "writer_submissions/job_{}/{}",
            file_name_only(job_id),
            file_name_only(filename)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
