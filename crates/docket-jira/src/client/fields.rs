//! Field listing and display-name resolution.

use docket_http::Method;
use tracing::{debug, info};

use super::JiraClient;
use crate::error::JiraError;
use crate::types::{FieldDef, FieldResolver};

/// System fields addressed by id without a lookup.
const PASSTHROUGH_FIELDS: &[&str] = &["summary", "status"];

impl JiraClient {
    /// List every field defined on the server.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::Request`] on failure.
    pub fn list_fields(&self) -> Result<Vec<FieldDef>, JiraError> {
        info!("Listing Jira fields");
        let request = self.api.request(Method::Get, "/rest/api/2/field");
        self.get_json(&request)
    }

    /// Field id for a display name.
    ///
    /// Ids (`customfield_*`) pass through unchanged and the system fields
    /// `summary` and `status` map to their lower-case ids. Other names are
    /// looked up case-insensitively in a cache filled from
    /// [`list_fields`](Self::list_fields) on the first miss; the field list
    /// is fetched at most once per client.
    ///
    /// # Errors
    ///
    /// Returns [`JiraError::Request`] if the field list cannot be fetched.
    pub fn field_id(&self, name: &str) -> Result<Option<String>, JiraError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let lowered = name.to_lowercase();
        if lowered.starts_with("customfield_") {
            return Ok(Some(name.to_owned()));
        }
        if PASSTHROUGH_FIELDS.contains(&lowered.as_str()) {
            return Ok(Some(lowered));
        }

        if let Some(id) = self.field_cache.borrow().ids.get(&lowered) {
            return Ok(Some(id.clone()));
        }
        if self.field_cache.borrow().loaded {
            return Ok(None);
        }

        let fields = self.list_fields()?;
        let mut cache = self.field_cache.borrow_mut();
        for field in fields {
            if !field.name.is_empty() && !field.id.is_empty() {
                cache.ids.entry(field.name.to_lowercase()).or_insert(field.id);
            }
        }
        cache.loaded = true;
        debug!(count = cache.ids.len(), "Cached Jira field ids");
        Ok(cache.ids.get(&lowered).cloned())
    }
}

impl FieldResolver for JiraClient {
    fn resolve_field_id(&self, name: &str) -> Result<Option<String>, JiraError> {
        self.field_id(name)
    }
}
