pub mod category_service;
pub mod post_service;

use std::sync::Arc;

use crate::domain::error::DomainError;
use crate::infrastructure::clock::{Clock, SystemClock};
use crate::infrastructure::ids::{IdGenerator, UuidV7Generator};
use crate::infrastructure::sanitize::{HtmlSanitizer, Sanitizer};

/// Non-storage collaborators shared by the services.
#[derive(Clone)]
pub struct Collaborators {
    pub ids: Arc<dyn IdGenerator>,
    pub clock: Arc<dyn Clock>,
    pub sanitizer: Arc<dyn Sanitizer>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            ids: Arc::new(UuidV7Generator),
            clock: Arc::new(SystemClock),
            sanitizer: Arc::new(HtmlSanitizer),
        }
    }
}

impl Collaborators {
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }
}

/// Sanitizes `raw` and lists `field` in `missing` when nothing is left.
fn require_text(
    sanitizer: &dyn Sanitizer,
    raw: &str,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> String {
    let clean = sanitizer.sanitize(raw);
    if clean.is_empty() {
        missing.push(field);
    }
    clean
}

fn missing_fields(missing: Vec<&'static str>) -> Result<(), DomainError> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DomainError::InvalidInput(format!(
            "{} required",
            missing.join(" and ")
        )))
    }
}
