//! Embedding nonces in links and forms.

use url::form_urlencoded::byte_serialize;

use crate::action::Action;
use crate::engine::NonceEngine;
use crate::error::Error;
use crate::request::RequestContext;

impl NonceEngine {
    /// `url` with a fresh nonce in the `name` query parameter (default: the
    /// configured nonce field), escaped for HTML.
    ///
    /// Works on the raw string: relative URLs are fine, the other query
    /// pairs are kept byte for byte, and an existing parameter of that name
    /// is replaced where it stands.
    pub fn nonce_url(
        &self,
        ctx: &dyn RequestContext,
        url: &str,
        action: impl Into<Action>,
        name: Option<&str>,
    ) -> Result<String, Error> {
        let name = name.unwrap_or(self.config().field_name.as_str());
        let nonce = self.create_nonce(ctx, action)?;
        let url = url.replace("&amp;", "&");
        Ok(escape_html(&with_query_arg(&url, name, nonce.as_str())))
    }

    /// Hidden input carrying a fresh nonce, optionally followed by
    /// [`referer_field`](Self::referer_field).
    pub fn nonce_field(
        &self,
        ctx: &dyn RequestContext,
        action: impl Into<Action>,
        name: Option<&str>,
        with_referer: bool,
    ) -> Result<String, Error> {
        let name = escape_html(name.unwrap_or(self.config().field_name.as_str()));
        let nonce = self.create_nonce(ctx, action)?;
        let mut field = format!(
            r#"<input type="hidden" id="{name}" name="{name}" value="{nonce}" />"#
        );
        if with_referer {
            field.push_str(&self.referer_field(ctx));
        }
        Ok(field)
    }

    /// Hidden input recording the URI of the current request.
    pub fn referer_field(&self, ctx: &dyn RequestContext) -> String {
        format!(
            r#"<input type="hidden" name="{}" value="{}" />"#,
            escape_html(&self.config().referer_field_name),
            escape_html(&ctx.request_uri().unwrap_or_default()),
        )
    }
}

/// Set `key=value` in the query of `url`, leaving everything else as given.
fn with_query_arg(url: &str, key: &str, value: &str) -> String {
    let (url, fragment) = match url.find('#') {
        Some(at) => url.split_at(at),
        None => (url, ""),
    };
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (Some(base), query),
        // a bare `a=b&c=d` is a query on its own
        None if !url.contains("://") && url.contains('=') => (None, url),
        None => (Some(url), ""),
    };

    let key: String = byte_serialize(key.as_bytes()).collect();
    let pair = format!("{key}={}", byte_serialize(value.as_bytes()).collect::<String>());
    let mut pairs: Vec<&str> = Vec::new();
    let mut replaced = false;
    for part in query.split('&').filter(|part| !part.is_empty()) {
        let part_key = part.split_once('=').map_or(part, |(k, _)| k);
        if part_key != key {
            pairs.push(part);
        } else if !replaced {
            pairs.push(pair.as_str());
            replaced = true;
        }
    }
    if !replaced {
        pairs.push(pair.as_str());
    }

    let query = pairs.join("&");
    match base {
        Some(base) => format!("{base}?{query}{fragment}"),
        None => format!("{query}{fragment}"),
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
