//! Request-level checks layered on [`NonceEngine::verify_nonce`].
//!
//! Both adapters always return a [`RefererCheck`]. A missing action is
//! reported as a [`CallerError`] diagnostic instead of an error, and only a
//! genuine verification failure asks the request to terminate.

use crate::action::Action;
use crate::engine::NonceEngine;
use crate::error::{CallerError, Error};
use crate::hooks::CheckKind;
use crate::request::RequestContext;
use crate::verify::Verification;

/// Status used when an adapter stops the request.
pub const FORBIDDEN: u16 = 403;

/// What an adapter decided about the request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct RefererCheck {
    pub kind: CheckKind,
    pub verification: Verification,
    /// Set when the adapter was called without a specific action.
    pub diagnostic: Option<CallerError>,
    /// The legacy admin-referer allowance admitted the request.
    pub referer_bypass: bool,
    /// Status handed to [`RequestContext::terminate`], if it was called.
    pub terminated: Option<u16>,
}

impl RefererCheck {
    pub fn accepted(&self) -> bool {
        self.verification.is_valid() || self.referer_bypass
    }

    pub fn code(&self) -> Option<u8> {
        self.verification.code()
    }
}

impl NonceEngine {
    /// Verify that the request came from an admin page with a valid nonce.
    ///
    /// `field` defaults to the configured nonce field. An invalid nonce
    /// terminates the request with 403. Called with the sentinel action, the
    /// check cannot verify anything: it reports a diagnostic, never
    /// terminates, and only the legacy referer allowance can accept it.
    pub fn check_admin_referer(
        &self,
        ctx: &dyn RequestContext,
        action: impl Into<Action>,
        field: Option<&str>,
    ) -> Result<RefererCheck, Error> {
        let kind = CheckKind::AdminReferer;
        let action = action.into();
        let field = field.unwrap_or(self.config().field_name.as_str());
        let presented = ctx.field(field);

        if action.is_unspecified() {
            let referer_bypass = presented.is_none() && self.referer_is_admin(ctx);
            if referer_bypass {
                tracing::info!(%kind, "sentinel action admitted by admin referer");
            }
            return Ok(self.caller_error(kind, action, referer_bypass));
        }

        let verification = match presented {
            Some(nonce) => self.verify_nonce(ctx, &nonce, action.clone())?,
            None => Verification::Invalid,
        };
        self.observer.checked(kind, &action, verification);

        Ok(RefererCheck {
            kind,
            verification,
            diagnostic: None,
            referer_bypass: false,
            terminated: self.terminate_if_invalid(ctx, kind, &action, verification, true),
        })
    }

    /// Verify the nonce of an ajax request.
    ///
    /// The nonce is read from `field` when given, then the configured ajax
    /// field, then the regular nonce field. With `die` an invalid nonce
    /// terminates the request with 403; without it the caller decides.
    pub fn check_ajax_referer(
        &self,
        ctx: &dyn RequestContext,
        action: impl Into<Action>,
        field: Option<&str>,
        die: bool,
    ) -> Result<RefererCheck, Error> {
        let kind = CheckKind::AjaxReferer;
        let action = action.into();
        if action.is_unspecified() {
            return Ok(self.caller_error(kind, action, false));
        }

        let config = self.config();
        let nonce = field
            .and_then(|name| ctx.field(name))
            .or_else(|| ctx.field(&config.ajax_field_name))
            .or_else(|| ctx.field(&config.field_name))
            .unwrap_or_default();

        let verification = self.verify_nonce(ctx, &nonce, action.clone())?;
        self.observer.checked(kind, &action, verification);

        Ok(RefererCheck {
            kind,
            verification,
            diagnostic: None,
            referer_bypass: false,
            terminated: self.terminate_if_invalid(ctx, kind, &action, verification, die),
        })
    }

    fn caller_error(&self, kind: CheckKind, action: Action, referer_bypass: bool) -> RefererCheck {
        let diagnostic = CallerError::MissingAction { check: kind };
        tracing::warn!(%diagnostic, "nonce check without an action");
        self.observer.checked(kind, &action, Verification::Invalid);
        RefererCheck {
            kind,
            verification: Verification::Invalid,
            diagnostic: Some(diagnostic),
            referer_bypass,
            terminated: None,
        }
    }

    fn terminate_if_invalid(
        &self,
        ctx: &dyn RequestContext,
        kind: CheckKind,
        action: &Action,
        verification: Verification,
        die: bool,
    ) -> Option<u16> {
        if !die || verification.is_valid() {
            return None;
        }
        tracing::warn!(%kind, action = %action, status = FORBIDDEN, "terminating request");
        ctx.terminate(FORBIDDEN);
        Some(FORBIDDEN)
    }

    /// Case-insensitive prefix match of the `Referer` against `admin_url`.
    fn referer_is_admin(&self, ctx: &dyn RequestContext) -> bool {
        let config = self.config();
        if !config.legacy_referer_bypass || config.admin_url.is_empty() {
            return false;
        }
        let admin = config.admin_url.to_lowercase();
        ctx.referer()
            .map(|referer| referer.to_lowercase().starts_with(&admin))
            .unwrap_or(false)
    }
}
