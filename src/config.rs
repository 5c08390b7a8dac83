use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::tick::DEFAULT_LIFETIME;

/// Engine settings. Every field has a default, so partial JSON works.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonceConfig {
    /// Full nonce lifetime in seconds; a tick is half of it.
    pub lifetime_secs: u64,
    /// Base URL of the admin area, matched against the `Referer`.
    pub admin_url: String,
    /// Field carrying the nonce in forms and links.
    pub field_name: String,
    /// Field ajax requests use for the nonce.
    pub ajax_field_name: String,
    /// Hidden field holding the originating request URI.
    pub referer_field_name: String,
    /// Admit sentinel-action admin checks that carry no nonce but come from
    /// an admin page. Weak: kept for compatibility.
    pub legacy_referer_bypass: bool,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: DEFAULT_LIFETIME.as_secs(),
            admin_url: String::new(),
            field_name: "_wpnonce".into(),
            ajax_field_name: "_ajax_nonce".into(),
            referer_field_name: "_wp_http_referer".into(),
            legacy_referer_bypass: true,
        }
    }
}

impl NonceConfig {
    pub fn from_json(raw: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.lifetime_secs == 0 {
            return Err(Error::InvalidConfig(
                "lifetime_secs must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("field_name", &self.field_name),
            ("ajax_field_name", &self.ajax_field_name),
            ("referer_field_name", &self.referer_field_name),
        ] {
            if value.is_empty() {
                return Err(Error::InvalidConfig(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime_secs = lifetime.as_secs();
        self
    }

    pub fn with_admin_url(mut self, url: impl Into<String>) -> Self {
        self.admin_url = url.into();
        self
    }

    pub fn with_legacy_referer_bypass(mut self, enabled: bool) -> Self {
        self.legacy_referer_bypass = enabled;
        self
    }
}
