//! Bare HTML for the console pages (Pico CSS, no client framework)

use serde_json::Value;

use crate::envelope::Page;
use crate::notifications::Notification;
use crate::services::blacklist::BlacklistEntry;
use crate::services::listings::Tab;
use crate::services::users::User;
use crate::session::SessionUser;

pub fn escape(raw: &str) -> String {
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

/// Page chrome shared by every console view
pub struct Layout<'a> {
    pub title: &'a str,
    pub user: Option<&'a SessionUser>,
    pub notifications: &'a [Notification],
    /// Client-side display time for the notification stack
    pub display_ms: u64,
}

impl Layout<'_> {
    pub fn render(&self, content: &str) -> String {
        let version = env!("LPR_VERSION");
        let title = escape(self.title);
        let nav = self.nav();
        let stack = self.notification_stack();
        let display_ms = self.display_ms;
        format!(
            r#"<!DOCTYPE html>
<html lang="en" data-theme="dark">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - LPR Console</title>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css">
    <style>
        :root {{ --pico-font-size: 15px; }}
        .status-err {{ color: var(--pico-del-color); }}
        .notifications {{ position: fixed; top: 1rem; right: 1rem; z-index: 10; }}
        .notification {{ padding: 0.5rem 1rem; margin-bottom: 0.5rem; border-radius: 4px; }}
        .notification.error {{ background: var(--pico-del-color); }}
        .notification.success {{ background: var(--pico-ins-color); }}
        .notification.warning {{ background: #b58105; }}
        .notification.info {{ background: var(--pico-primary-background); }}
    </style>
</head>
<body>
    <header class="container">
        {nav}
    </header>
    {stack}
    <main class="container">
        {content}
    </main>
    <footer class="container"><small>LPR Console v{version}</small></footer>
    <script>
        document.querySelectorAll('.notification').forEach(function (el) {{
            setTimeout(function () {{ el.remove(); }}, {display_ms});
        }});
    </script>
</body>
</html>"#
        )
    }

    fn nav(&self) -> String {
        let Some(user) = self.user else {
            return r#"<nav><ul><li><strong>LPR Console</strong></li></ul>
        <ul><li><a href="/signin">Sign in</a></li></ul></nav>"#
                .to_string();
        };
        let blacklist = if user.role.is_admin() {
            r#"<li><a href="/black-lists">Blacklist</a></li>"#
        } else {
            ""
        };
        format!(
            r#"<nav><ul><li><strong>LPR Console</strong></li></ul>
        <ul>
            <li><a href="/dashboard">Dashboard</a></li>
            <li><a href="/users">Users</a></li>
            {blacklist}
            <li><form method="post" action="/logout" style="margin:0"><button type="submit" class="secondary">Sign out {name}</button></form></li>
        </ul></nav>"#,
            name = escape(&user.name),
        )
    }

    fn notification_stack(&self) -> String {
        if self.notifications.is_empty() {
            return String::new();
        }
        let items: String = self
            .notifications
            .iter()
            .map(|n| {
                format!(
                    r#"<div class="notification {}" id="n-{}">{}</div>"#,
                    n.kind.as_str(),
                    n.id,
                    escape(&n.message)
                )
            })
            .collect();
        format!(r#"<div class="notifications">{}</div>"#, items)
    }
}

pub fn landing() -> String {
    r#"<hgroup>
        <h1>License plate recognition</h1>
        <p>Events, vehicles, drivers and cameras in one place.</p>
    </hgroup>
    <a href="/signin" role="button">Sign in</a>"#
        .to_string()
}

pub fn sign_in_form(email: &str, error: Option<&str>) -> String {
    format!(
        r#"<article>
        <h2>Sign in</h2>
        {error}
        <form method="post" action="/signin">
            <input type="email" name="email" placeholder="Email" value="{email}" required>
            <input type="password" name="password" placeholder="Password" required>
            <button type="submit">Sign in</button>
        </form>
        <small><a href="/reset-password">Forgot your password?</a></small>
    </article>"#,
        error = error_line(error),
        email = escape(email),
    )
}

pub fn forgot_password_form(message: Option<&str>, error: Option<&str>) -> String {
    let message = message
        .map(|m| format!("<p>{}</p>", escape(m)))
        .unwrap_or_default();
    format!(
        r#"<article>
        <h2>Reset password</h2>
        {message}
        {error}
        <form method="post" action="/reset-password">
            <input type="email" name="email" placeholder="Email" required>
            <button type="submit">Send reset instructions</button>
        </form>
    </article>"#,
        error = error_line(error),
    )
}

pub fn new_password_form(token: &str, error: Option<&str>) -> String {
    format!(
        r#"<article>
        <h2>Choose a new password</h2>
        {error}
        <form method="post" action="/reset-password">
            <input type="hidden" name="token" value="{token}">
            <input type="password" name="password" placeholder="New password" required>
            <input type="password" name="confirm" placeholder="Confirm password" required>
            <button type="submit">Reset password</button>
        </form>
    </article>"#,
        error = error_line(error),
        token = escape(token),
    )
}

pub fn reset_done() -> String {
    r#"<article>
        <h2>Password updated</h2>
        <p>You can now <a href="/signin">sign in</a> with your new password.</p>
    </article>"#
        .to_string()
}

fn error_line(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<p class="status-err"><strong>{}</strong></p>"#, escape(e)))
        .unwrap_or_default()
}

pub fn dashboard(active: Tab, rows: &Page<Value>) -> String {
    let tabs: String = Tab::ALL
        .iter()
        .map(|tab| {
            let current = if *tab == active { r#" aria-current="page""# } else { "" };
            format!(
                r#"<li><a href="/dashboard?tab={}"{}>{}</a></li>"#,
                tab.slug(),
                current,
                tab.label()
            )
        })
        .collect();
    format!(
        r#"<nav><ul>{tabs}</ul></nav>
    <h2>{label}</h2>
    {table}
    {pager}"#,
        label = active.label(),
        table = json_table(&rows.items),
        pager = pager("/dashboard", &[("tab", active.slug())], rows),
    )
}

/// Columns are the union of keys across rows, in first-seen order
fn json_table(rows: &[Value]) -> String {
    if rows.is_empty() {
        return "<p><small>No records.</small></p>".to_string();
    }
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        if let Value::Object(object) = row {
            for key in object.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }
    let head: String = columns
        .iter()
        .map(|c| format!("<th>{}</th>", escape(c)))
        .collect();
    let body: String = rows
        .iter()
        .map(|row| {
            let cells: String = columns
                .iter()
                .map(|c| format!("<td>{}</td>", escape(&cell(row.get(*c)))))
                .collect();
            format!("<tr>{}</tr>", cells)
        })
        .collect();
    format!(
        "<table><thead><tr>{}</tr></thead><tbody>{}</tbody></table>",
        head, body
    )
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Previous/next links over `path`, keeping `params` in the query
fn pager<T>(path: &str, params: &[(&str, &str)], page: &Page<T>) -> String {
    let Some(pagination) = &page.pagination else {
        return String::new();
    };
    let link = |target: u32, label: &str| {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .append_pair("page", &target.to_string())
            .append_pair("limit", &pagination.limit.to_string())
            .finish();
        format!(r#"<a href="{}?{}">{}</a>"#, path, query, label)
    };
    let prev = if pagination.page > 1 {
        link(pagination.page - 1, "Previous")
    } else {
        String::new()
    };
    let next = if pagination.page < pagination.pages {
        link(pagination.page + 1, "Next")
    } else {
        String::new()
    };
    format!(
        "<p>{} <small>Page {} of {} ({} total)</small> {}</p>",
        prev, pagination.page, pagination.pages, pagination.total, next
    )
}

pub fn users(page: &Page<User>) -> String {
    let rows: String = page
        .items
        .iter()
        .map(|u| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&u.name),
                escape(&u.email),
                escape(&u.role),
                escape(&u.status)
            )
        })
        .collect();
    format!(
        r#"<h2>Users</h2>
    <table><thead><tr><th>Name</th><th>Email</th><th>Role</th><th>Status</th></tr></thead>
    <tbody>{rows}</tbody></table>
    {pager}"#,
        pager = pager("/users", &[], page),
    )
}

pub fn blacklist(page: &Page<BlacklistEntry>) -> String {
    let rows: String = page
        .items
        .iter()
        .map(|entry| {
            format!(
                r#"<tr>
            <td>
                <form method="post" action="/black-lists/{id}" style="display:flex;gap:0.5rem;margin:0">
                    <input name="plateNumber" value="{plate}" required>
                    <input name="reason" value="{reason}">
                    <select name="status">{statuses}</select>
                    <button type="submit">Save</button>
                </form>
            </td>
            <td>{added_by}</td>
            <td>{created}</td>
            <td><form method="post" action="/black-lists/{id}/delete" style="margin:0"><button type="submit" class="secondary">Delete</button></form></td>
        </tr>"#,
                id = entry.id,
                plate = escape(&entry.plate_number),
                reason = escape(entry.reason.as_deref().unwrap_or("")),
                statuses = status_options(&entry.status),
                added_by = escape(entry.added_by.as_ref().map(|u| u.username.as_str()).unwrap_or("")),
                created = escape(entry.create_at.as_deref().unwrap_or("")),
            )
        })
        .collect();
    format!(
        r#"<h2>Blacklist</h2>
    <form method="post" action="/black-lists" style="display:flex;gap:0.5rem">
        <input name="plateNumber" placeholder="Plate number" required>
        <input name="reason" placeholder="Reason">
        <select name="status">{statuses}</select>
        <button type="submit">Add</button>
    </form>
    <table><thead><tr><th>Plate / reason / status</th><th>Added by</th><th>Created</th><th></th></tr></thead>
    <tbody>{rows}</tbody></table>
    {pager}"#,
        statuses = status_options("Active"),
        pager = pager("/black-lists", &[], page),
    )
}

fn status_options(selected: &str) -> String {
    let mut options: Vec<&str> = vec!["Active", "Inactive"];
    if !options.contains(&selected) {
        options.push(selected);
    }
    options
        .into_iter()
        .map(|status| {
            let flag = if status == selected { " selected" } else { "" };
            format!(
                r#"<option value="{0}"{1}>{0}</option>"#,
                escape(status),
                flag
            )
        })
        .collect()
}
