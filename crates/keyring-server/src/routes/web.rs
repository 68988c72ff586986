//! Admin page and form routes.
//!
//! `GET /` renders every key with toggle/delete buttons and a create form.
//! The form endpoints redirect back to `/` and, unlike the JSON API, quietly
//! drop a submission with no identifier.

use std::fmt::Write as _;
use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tracing::warn;

use keyring_core::error::KeyError;
use keyring_core::key::{Key, KeyStatus};

use crate::error::PageError;
use crate::routes::{found, PageForm, PagePath};
use crate::session::Session;
use crate::state::AppState;

/// Build the page router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/create", post(create))
        .route("/key/{id}/toggle-status", post(toggle_status))
        .route("/key/{id}/delete", post(delete))
}

#[derive(Debug, Deserialize)]
pub struct CreateForm {
    #[serde(default, rename = "keyIdentifier")]
    pub key_identifier: Option<String>,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn index(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, PageError> {
    let keys = state.keys.list().await?;
    Ok(Html(render_index(&keys, session.email())))
}

async fn create(
    State(state): State<Arc<AppState>>,
    PageForm(form): PageForm<CreateForm>,
) -> Result<Response, PageError> {
    let identifier = form.key_identifier.unwrap_or_default();
    match state.keys.create(&identifier).await {
        Ok(_) => {}
        Err(KeyError::Validation { reason }) => {
            warn!(reason = %reason, "ignored key form submission");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(found("/"))
}

async fn toggle_status(
    State(state): State<Arc<AppState>>,
    PagePath(id): PagePath<i64>,
) -> Result<Response, PageError> {
    state.keys.toggle_status(id).await?;
    Ok(found("/"))
}

async fn delete(
    State(state): State<Arc<AppState>>,
    PagePath(id): PagePath<i64>,
) -> Result<Response, PageError> {
    state.keys.delete(id).await?;
    Ok(found("/"))
}

// ── Rendering ────────────────────────────────────────────────────────

fn render_index(keys: &[Key], email: Option<&str>) -> String {
    let mut rows = String::new();
    for key in keys {
        let (badge, action) = match key.status {
            KeyStatus::Active => ("badge-active", "Deactivate"),
            KeyStatus::Inactive => ("badge-inactive", "Activate"),
        };
        let _ = write!(
            rows,
            r#"<tr>
  <td>{id}</td>
  <td><code>{identifier}</code></td>
  <td><span class="badge {badge}">{status}</span></td>
  <td>{created}</td>
  <td>{updated}</td>
  <td class="actions">
    <form method="post" action="/key/{id}/toggle-status"><button type="submit">{action}</button></form>
    <form method="post" action="/key/{id}/delete" onsubmit="return confirm('Delete this key?');"><button type="submit" class="danger">Delete</button></form>
  </td>
</tr>
"#,
            id = key.id,
            identifier = escape_html(&key.identifier),
            status = key.status,
            created = key.created_at.format("%Y-%m-%d %H:%M:%S"),
            updated = key
                .updated_at
                .map_or_else(|| "—".to_owned(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        );
    }
    if keys.is_empty() {
        rows.push_str(r#"<tr><td colspan="6" class="empty">No keys yet.</td></tr>"#);
    }

    let account = email.map_or_else(String::new, |email| {
        format!(
            r#"<div class="account">Signed in as <strong>{}</strong>
  <form method="post" action="/logout"><button type="submit">Sign out</button></form>
</div>"#,
            escape_html(email)
        )
    });

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Keyring</title>
<style>{PAGE_CSS}</style>
</head>
<body>
<header><h1>Keyring</h1>{account}</header>
<main>
<form class="create" method="post" action="/create">
  <input type="text" name="keyIdentifier" placeholder="Key identifier, e.g. A1-B2-C3-D4" maxlength="255" required>
  <button type="submit">Add key</button>
</form>
<table>
<thead><tr><th>ID</th><th>Identifier</th><th>Status</th><th>Created</th><th>Updated</th><th></th></tr></thead>
<tbody>
{rows}</tbody>
</table>
</main>
</body>
</html>"#
    )
}

const PAGE_CSS: &str = "\
body{font-family:system-ui,sans-serif;margin:0;background:#f7f7f8;color:#1d1d1f}\
header{display:flex;justify-content:space-between;align-items:center;padding:1rem 2rem;background:#fff;border-bottom:1px solid #e5e5e7}\
header h1{font-size:1.25rem;margin:0}\
.account form{display:inline;margin-left:.75rem}\
main{max-width:960px;margin:2rem auto;padding:0 1rem}\
.create{display:flex;gap:.5rem;margin-bottom:1.5rem}\
.create input{flex:1;padding:.5rem;border:1px solid #ccc;border-radius:6px}\
table{width:100%;border-collapse:collapse;background:#fff;border-radius:8px;overflow:hidden}\
th,td{padding:.6rem .8rem;text-align:left;border-bottom:1px solid #eee}\
.actions form{display:inline}\
.badge{padding:.15rem .5rem;border-radius:999px;font-size:.8rem}\
.badge-active{background:#d1fae5;color:#065f46}\
.badge-inactive{background:#e5e7eb;color:#374151}\
button{padding:.35rem .8rem;border:1px solid #ccc;border-radius:6px;background:#fff;cursor:pointer}\
button.danger{color:#b91c1c;border-color:#fca5a5}\
.empty{text-align:center;color:#888}";

/// Escape text for an HTML body or quoted attribute.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
