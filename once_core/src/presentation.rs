//! Info page and share URL rendering

use crate::session::ServingSession;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::fmt::Write;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Fully qualified share URL, e.g. `http://192.168.1.7:41234/<token>`
pub fn entry_url(ip: IpAddr, port: u16, info_path: &str) -> String {
    format!("http://{}{}", SocketAddr::new(ip, port), info_path)
}

/// Render the info page shown at `/{token}`
pub fn render_info_page(session: &ServingSession, expires_after: Duration) -> String {
    let file = session.file();
    let href = format!(
        "{}/{}",
        session.info_path(),
        utf8_percent_encode(&file.basename, SEGMENT)
    );

    let mut page = String::new();
    let _ = write!(
        page,
        "<!DOCTYPE html>\n\
         <meta charset=\"utf-8\">\n\
         <title>Link expires after {expires} or downloading</title>\n\
         <h3>{name}</h3>\n\
         <p><a href=\"{href}\">Download</a></p>\n\
         <dl>\n\
         <dt>size</dt><dd>{size} bytes ({human})</dd>\n\
         <dt>sha1</dt><dd>{sha1}</dd>\n\
         <dt>sha256</dt><dd>{sha256}</dd>\n\
         </dl>\n",
        expires = format_duration(expires_after),
        name = escape_html(&file.basename),
        href = escape_html(&href),
        size = file.size,
        human = format_size(file.size),
        sha1 = file.sha1,
        sha256 = file.sha256,
    );
    page
}

fn escape_html(text: &str) -> String {
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

/// Format a byte count for humans
pub fn format_size(bytes: u64) -> String {
    let bytes_f = bytes as f64;
    if bytes_f >= 1_000_000_000.0 {
        format!("{:.2} GB", bytes_f / 1_000_000_000.0)
    } else if bytes_f >= 1_000_000.0 {
        format!("{:.2} MB", bytes_f / 1_000_000.0)
    } else if bytes_f >= 1_000.0 {
        format!("{:.1} KB", bytes_f / 1_000.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Coarse, largest-unit duration: "1 day", "2 hours", "90 seconds"
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (value, unit) = if secs >= 86_400 && secs % 86_400 == 0 {
        (secs / 86_400, "day")
    } else if secs >= 3_600 && secs % 3_600 == 0 {
        (secs / 3_600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if value == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", value, unit)
    }
}
