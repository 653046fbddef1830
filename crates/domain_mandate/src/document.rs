//! The signed mandate document

use serde::{Deserialize, Serialize};

use core_kernel::{DocumentId, RemoteId};

/// A PDF document attached to a mandate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MandateDocument {
    pub id: DocumentId,
    pub filename: String,
    pub content: Vec<u8>,
    /// Remote document id
    pub remote_id: Option<RemoteId>,
}

impl MandateDocument {
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: DocumentId::new_v7(),
            filename: filename.into(),
            content,
            remote_id: None,
        }
    }

    pub fn is_synced(&self) -> bool {
        self.remote_id.is_some()
    }
}
