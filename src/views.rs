//! HTML page rendering
//!
//! Pages are assembled from string fragments. Every piece of user-supplied
//! text goes through [`escape`] (or [`encode_path_segment`] inside URLs).

use std::fmt::Write;

use axum::response::Html;

use crate::{
    api::session::{Flash, SessionUser},
    models::Book,
};

/// Escape text for use in HTML element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Percent-encode a value for a single URL path segment (RFC 3986 unreserved
/// characters pass through)
pub fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(byte as char),
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

fn layout(title: &str, signed_in: bool, flashes: &[Flash], body: &str) -> Html<String> {
    let nav = if signed_in {
        r#"<a href="/">Catalog</a> <a href="/logout">Log out</a>"#
    } else {
        r#"<a href="/login">Log in</a> <a href="/register">Register</a>"#
    };

    let mut notices = String::new();
    for flash in flashes {
        let _ = write!(
            notices,
            r#"<li class="flash flash-{}">{}</li>"#,
            flash.category.as_str(),
            escape(&flash.message)
        );
    }
    if !notices.is_empty() {
        notices = format!(r#"<ul class="flashes">{}</ul>"#, notices);
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Bookshelf</title>
</head>
<body>
<nav>{nav}</nav>
{notices}
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
        nav = nav,
        notices = notices,
        body = body,
    ))
}

pub fn register_page(flashes: &[Flash]) -> Html<String> {
    let body = r#"<h1>Register</h1>
<form method="post" action="/register">
<label>Username <input type="text" name="username" maxlength="50" required></label>
<label>Email <input type="email" name="email" maxlength="100" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Register</button>
</form>
<p>Already registered? <a href="/login">Log in</a></p>"#;

    layout("Register", false, flashes, body)
}

pub fn login_page(flashes: &[Flash]) -> Html<String> {
    let body = r#"<h1>Log in</h1>
<form method="post" action="/login">
<label>Username <input type="text" name="username" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>
<p>No account yet? <a href="/register">Register</a></p>"#;

    layout("Log in", false, flashes, body)
}

/// Catalog page: add form plus one entry per book with rename/delete forms
pub fn index_page(username: &str, books: &[Book], flashes: &[Flash]) -> Html<String> {
    let mut body = format!(
        r#"<h1>Books</h1>
<p>Signed in as {}</p>
<form method="post" action="/">
<input type="text" name="title" maxlength="80" required>
<button type="submit">Add</button>
</form>
"#,
        escape(username)
    );

    if books.is_empty() {
        body.push_str(r#"<p class="empty">No books yet.</p>"#);
    } else {
        body.push_str("<ul class=\"books\">\n");
        for book in books {
            let title = escape(&book.title);
            let _ = write!(
                body,
                r#"<li class="book">
<a href="/jogo/{href}">{title}</a>
<form method="post" action="/update">
<input type="hidden" name="oldtitle" value="{title}">
<input type="text" name="newtitle" value="{title}" maxlength="80" required>
<button type="submit">Rename</button>
</form>
<form method="post" action="/delete">
<input type="hidden" name="title" value="{title}">
<button type="submit">Delete</button>
</form>
</li>
"#,
                href = encode_path_segment(&book.title),
                title = title,
            );
        }
        body.push_str("</ul>");
    }

    layout("Books", true, flashes, &body)
}

pub fn book_page(book: &Book, user: Option<&SessionUser>) -> Html<String> {
    let body = format!(
        r#"<h1 class="book-title">{}</h1>
<p>Added on {}</p>
<p><a href="/">Back to catalog</a></p>"#,
        escape(&book.title),
        book.created_at.format("%Y-%m-%d %H:%M UTC"),
    );

    layout(&book.title, user.is_some(), &[], &body)
}
