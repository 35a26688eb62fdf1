//! Server-rendered HTML. Every piece of user-supplied text goes through
//! [`escape`]; only highlighter output is embedded verbatim.

use std::fmt::Write as _;

use axum::http::StatusCode;

use super::flash::Flash;
use super::validation::{LoginForm, RegistrationForm, SnippetForm, ValidationResult};
use crate::highlight::{LANGUAGES, language_label};
use crate::types::{Snippet, SnippetSummary, User};

const SITE_NAME: &str = "Pastebin";

#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

#[must_use]
pub fn layout(title: &str, user: Option<&User>, flash: Option<&Flash>, body: &str) -> String {
    let nav = match user {
        Some(user) => format!(
            "<span class=\"whoami\">Logged in as {}</span> \
             <a href=\"/dashboard\">Dashboard</a> \
             <a href=\"/snippet/new\">New Snippet</a> \
             <a href=\"/logout\">Logout</a>",
            escape(&user.username)
        ),
        None => "<a href=\"/login\">Login</a> <a href=\"/register\">Register</a>".to_string(),
    };

    let flash = flash
        .map(|f| {
            format!(
                "<div class=\"flash flash-{}\">{}</div>",
                f.kind.as_str(),
                escape(&f.message)
            )
        })
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title} - {SITE_NAME}</title>\n\
         <link rel=\"stylesheet\" href=\"/static/highlight.css\">\n\
         </head>\n\
         <body>\n\
         <header><a class=\"brand\" href=\"/\">{SITE_NAME}</a>\n\
         <nav><a href=\"/about\">About</a> {nav}</nav></header>\n\
         {flash}\n\
         <main>\n{body}\n</main>\n\
         </body>\n\
         </html>\n",
        title = escape(title),
    )
}

fn field_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"errors\">");
    for error in errors {
        let _ = write!(out, "<li>{}</li>", escape(error));
    }
    out.push_str("</ul>");
    out
}

fn input(name: &str, label: &str, kind: &str, value: &str, errors: &[String]) -> String {
    format!(
        "<p><label for=\"{name}\">{label}</label>\n\
         <input id=\"{name}\" name=\"{name}\" type=\"{kind}\" value=\"{}\">{}</p>\n",
        escape(value),
        field_errors(errors)
    )
}

#[must_use]
pub fn register_page(form: &RegistrationForm, result: &ValidationResult) -> String {
    format!(
        "<h1>Register Now</h1>\n\
         <form method=\"post\" action=\"/register\">\n\
         {}{}{}{}\
         <p><button type=\"submit\">Register</button></p>\n\
         </form>\n\
         <p><a href=\"/login\">Already have an account? Log in now.</a></p>",
        input("username", "Username", "text", &form.username, result.field("username")),
        input("email", "Email Address", "text", &form.email, result.field("email")),
        input("password", "Password", "password", "", result.field("password")),
        input(
            "confirm_password",
            "Confirm Password",
            "password",
            "",
            result.field("confirm_password")
        ),
    )
}

#[must_use]
pub fn login_page(form: &LoginForm, result: &ValidationResult, error: Option<&str>) -> String {
    let error = error
        .map(|e| format!("<div class=\"form-error\">{}</div>\n", escape(e)))
        .unwrap_or_default();
    format!(
        "<h1>Log In</h1>\n\
         {error}\
         <form method=\"post\" action=\"/login\">\n\
         {}{}\
         <p><button type=\"submit\">Login</button></p>\n\
         </form>\n\
         <p><a href=\"/register\">No account yet? Register now.</a></p>",
        input("username", "Username", "text", &form.username, result.field("username")),
        input("password", "Password", "password", "", result.field("password")),
    )
}

#[must_use]
pub fn snippet_form_page(form: &SnippetForm, result: &ValidationResult) -> String {
    let selected = form.language_tag();
    let mut options = String::new();
    for (tag, label) in LANGUAGES {
        let attr = if *tag == selected { " selected" } else { "" };
        let _ = write!(options, "<option value=\"{tag}\"{attr}>{label}</option>");
    }
    if language_label(&selected).is_none() {
        let _ = write!(
            options,
            "<option value=\"{0}\" selected>{0}</option>",
            escape(&selected)
        );
    }

    format!(
        "<h1>New Snippet</h1>\n\
         <form method=\"post\" action=\"/snippet/new\">\n\
         {}\
         <p><label for=\"language\">Programming Language</label>\n\
         <select id=\"language\" name=\"language\">{options}</select>{}</p>\n\
         <p><label for=\"raw_content\">Source Code</label>\n\
         <textarea id=\"raw_content\" name=\"raw_content\" rows=\"20\" cols=\"80\">{}</textarea>{}</p>\n\
         <p><button type=\"submit\">Submit Snippet</button></p>\n\
         </form>",
        input("title", "Title", "text", &form.title, result.field("title")),
        field_errors(result.field("language")),
        escape(&form.raw_content),
        field_errors(result.field("raw_content")),
    )
}

fn display_language(tag: &str) -> String {
    language_label(tag).map_or_else(|| escape(tag), str::to_string)
}

fn snippet_list(snippets: &[SnippetSummary], empty: &str) -> String {
    if snippets.is_empty() {
        return format!("<p class=\"empty\">{}</p>", escape(empty));
    }
    let mut out = String::from("<ul class=\"snippets\">\n");
    for snippet in snippets {
        let _ = writeln!(
            out,
            "<li><a href=\"/snippet/view/{}\">{}</a> <span class=\"lang\">{}</span> by <span class=\"author\">{}</span></li>",
            snippet.id,
            escape(&snippet.title),
            display_language(&snippet.language_tag),
            escape(&snippet.author_username),
        );
    }
    out.push_str("</ul>");
    out
}

#[must_use]
pub fn index_page(recent: &[SnippetSummary], logged_in: bool) -> String {
    let call_to_action = if logged_in {
        "<p><a href=\"/snippet/new\">Share a new snippet</a></p>"
    } else {
        "<p><a href=\"/register\">Register</a> or <a href=\"/login\">log in</a> to share your own code.</p>"
    };
    format!(
        "<h1>Simple Code Sharing</h1>\n\
         {call_to_action}\n\
         <h2>Recent Snippets</h2>\n\
         {}",
        snippet_list(recent, "No snippets have been shared yet.")
    )
}

#[must_use]
pub fn dashboard_page(
    user: &User,
    snippets: &[SnippetSummary],
    page: i64,
    pages: i64,
    total: i64,
) -> String {
    let mut pager = String::new();
    if page > 1 {
        let _ = write!(pager, "<a href=\"/dashboard/{}\">Newer</a> ", page - 1);
    }
    let _ = write!(pager, "<span>Page {page} of {pages}</span>");
    if page < pages {
        let _ = write!(pager, " <a href=\"/dashboard/{}\">Older</a>", page + 1);
    }

    format!(
        "<h1>Your Overview</h1>\n\
         <p>Signed in as <strong>{}</strong> ({}). You have shared {total} snippet{}.</p>\n\
         {}\n\
         <div class=\"pager\">{pager}</div>",
        escape(&user.username),
        escape(&user.email),
        if total == 1 { "" } else { "s" },
        snippet_list(snippets, "You have not shared any snippets yet."),
    )
}

#[must_use]
pub fn snippet_page(snippet: &Snippet, author: Option<&User>) -> String {
    let author = author.map_or_else(|| "unknown".to_string(), |a| escape(&a.username));
    format!(
        "<article class=\"snippet\">\n\
         <h1>{}</h1>\n\
         <p class=\"meta\">{} snippet by <span class=\"author\">{author}</span></p>\n\
         {}\n\
         </article>",
        escape(&snippet.title),
        display_language(&snippet.language_tag),
        snippet.formatted_content,
    )
}

#[must_use]
pub fn about_page() -> String {
    "<h1>About</h1>\n\
     <p>A small place to share code. Register an account, paste a snippet, \
     pick its language and get a highlighted, line-numbered page to link to.</p>"
        .to_string()
}

#[must_use]
pub fn error_page(status: StatusCode, message: &str) -> String {
    format!(
        "<h1>{}</h1>\n<p>{}</p>",
        status.as_u16(),
        escape(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 1,
            username: "<b>eve</b>".to_string(),
            email: "eve@example.com".to_string(),
            password_hash: String::new(),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_layout_escapes_username_and_flash() {
        let html = layout(
            "Home",
            Some(&user()),
            Some(&Flash::info("<i>hi</i>")),
            "<p>body</p>",
        );
        assert!(html.contains("&lt;b&gt;eve&lt;/b&gt;"));
        assert!(html.contains("&lt;i&gt;hi&lt;/i&gt;"));
        assert!(html.contains("<p>body</p>"));
        assert!(html.contains("Logout"));
    }

    #[test]
    fn test_register_page_shows_errors_and_keeps_values() {
        let form = RegistrationForm {
            username: "bb".into(),
            email: "bb@example.com".into(),
            password: "secret".into(),
            confirm_password: "secret".into(),
        };
        let html = register_page(&form, &form.validate());

        assert!(html.contains("The username must be between 3 and 100 chars long."));
        assert!(html.contains("value=\"bb@example.com\""));
        assert!(!html.contains("value=\"secret\""));
    }

    #[test]
    fn test_snippet_form_selects_current_language() {
        let form = SnippetForm {
            title: String::new(),
            language: "ruby".into(),
            raw_content: String::new(),
        };
        let html = snippet_form_page(&form, &ValidationResult::default());
        assert!(html.contains("<option value=\"ruby\" selected>Ruby</option>"));
    }

    #[test]
    fn test_dashboard_pager_links() {
        let html = dashboard_page(&user(), &[], 2, 3, 25);
        assert!(html.contains("href=\"/dashboard/1\""));
        assert!(html.contains("href=\"/dashboard/3\""));
        assert!(html.contains("Page 2 of 3"));
    }
}
