//! Upload validation against the host-configured policy
//!
//! This subsystem never touches file contents; it validates the transient
//! descriptor (filename and byte size) the host hands it before the host
//! persists anything.

use std::collections::HashSet;

use crate::error::{SecurityError, SecurityResult};

/// Extensions never accepted, regardless of configuration.
const BLOCKED_EXTENSIONS: [&str; 5] = ["exe", "bat", "cmd", "scr", "pif"];

/// Transient description of an upload awaiting validation.
#[derive(Debug, Clone)]
pub struct UploadDescriptor {
    /// Client-declared file name.
    pub filename: String,
    /// Size of the upload in bytes.
    pub size_bytes: u64,
}

impl UploadDescriptor {
    pub fn new(filename: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            filename: filename.into(),
            size_bytes,
        }
    }

    /// Declared extension: the segment after the final `.`, lowercased.
    /// A name without a `.` has no extension.
    fn extension(&self) -> Option<String> {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

/// Host-supplied upload constraints.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Accepted extensions, lowercase, without the leading dot.
    pub allowed_extensions: HashSet<String>,
    /// Size ceiling in megabytes.
    pub max_upload_mb: u64,
}

impl UploadPolicy {
    pub fn new(allowed_extensions: impl IntoIterator<Item = String>, max_upload_mb: u64) -> Self {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.to_ascii_lowercase())
                .collect(),
            max_upload_mb,
        }
    }

    /// Size ceiling in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }

    /// Validate an upload descriptor.
    ///
    /// The extension is checked before the size, so a disallowed type is
    /// rejected regardless of how small the file is; an allowed type over
    /// the ceiling gets a size-specific message.
    pub fn validate(&self, upload: &UploadDescriptor) -> SecurityResult<()> {
        if upload.filename.is_empty() {
            return Err(SecurityError::InvalidUpload(
                "no file selected".to_string(),
            ));
        }

        let extension = upload.extension().unwrap_or_default();

        if BLOCKED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(SecurityError::InvalidUpload(
                "file type not allowed".to_string(),
            ));
        }

        if !self.allowed_extensions.contains(&extension) {
            let mut allowed: Vec<&str> = self
                .allowed_extensions
                .iter()
                .map(String::as_str)
                .collect();
            allowed.sort_unstable();
            return Err(SecurityError::InvalidUpload(format!(
                "file type not allowed. Allowed types: {}",
                allowed.join(", ")
            )));
        }

        if upload.size_bytes > self.max_size_bytes() {
            return Err(SecurityError::InvalidUpload(format!(
                "file too large. Maximum size: {} MB",
                self.max_upload_mb
            )));
        }

        Ok(())
    }
}
