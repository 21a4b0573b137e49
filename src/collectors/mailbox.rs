use anyhow::{Context, Result};
use chrono::DateTime;
use imap_proto::types::Address;
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

use crate::core::config::MailboxConfig;

/// Subject keywords that mark a shipping notification.
const SEARCH_TERMS: &[&str] = &[
    "Shipped",
    "Out for Delivery",
    "Delivered",
    "on its way",
    "shipped",
    "on the way",
];

/// One SUBJECT query per term, plus its lowercase variant when different.
/// The server does not reliably support case-insensitive or compound boolean
/// search, so every term is submitted as its own query.
fn subject_queries() -> Vec<String> {
    let mut queries = Vec::new();
    for term in SEARCH_TERMS {
        queries.push(format!("SUBJECT \"{}\"", term));
        let lower = term.to_lowercase();
        if lower != *term {
            queries.push(format!("SUBJECT \"{}\"", lower));
        }
    }
    queries
}

/// Union of per-query matches. Multiple queries may match the same message,
/// so ids are deduplicated before fetching.
fn dedup_ids(results: Vec<HashSet<u32>>) -> Vec<u32> {
    let merged: BTreeSet<u32> = results.into_iter().flatten().collect();
    merged.into_iter().collect()
}

fn format_date(raw: &str) -> String {
    match DateTime::parse_from_rfc2822(raw) {
        Ok(dt) => dt.format("%m/%d/%y %I:%M:%S %p").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn format_mail_event(sender: &str, subject: &str, date_header: &str) -> String {
    format!(
        "An email from {} with a subject of '{}' was received at {}",
        sender,
        subject,
        format_date(date_header)
    )
}

fn ascii_clean(raw: &[u8]) -> String {
    raw.iter()
        .filter(|b| b.is_ascii() && !b.is_ascii_control())
        .map(|&b| b as char)
        .collect::<String>()
        .trim()
        .to_string()
}

fn sender_display(address: Option<&Address>) -> String {
    let Some(address) = address else {
        return String::new();
    };
    if let Some(name) = &address.name {
        let name = ascii_clean(name);
        if !name.is_empty() {
            return name;
        }
    }
    let mailbox = address.mailbox.as_deref().map(ascii_clean).unwrap_or_default();
    let host = address.host.as_deref().map(ascii_clean).unwrap_or_default();
    format!("{}@{}", mailbox, host)
}

fn try_collect(config: &MailboxConfig) -> Result<Vec<String>> {
    let tls = native_tls::TlsConnector::builder().build()?;
    let client = imap::connect((config.host.as_str(), config.port), &config.host, &tls)
        .context("IMAP connect failed")?;
    let mut session = client
        .login(&config.username, &config.password)
        .map_err(|(e, _)| e)
        .context("IMAP login failed")?;
    session.select("INBOX")?;

    let mut results = Vec::new();
    for query in subject_queries() {
        match session.search(&query) {
            Ok(ids) => results.push(ids),
            Err(e) => warn!("IMAP search '{}' failed: {}", query, e),
        }
    }
    let ids = dedup_ids(results);
    if ids.is_empty() {
        session.logout().ok();
        return Ok(Vec::new());
    }

    let sequence = ids
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let fetches = session.fetch(&sequence, "ENVELOPE")?;

    let mut events = Vec::new();
    for fetch in fetches.iter() {
        let Some(envelope) = fetch.envelope() else {
            continue;
        };
        let sender = sender_display(envelope.from.as_ref().and_then(|f| f.first()));
        let subject = envelope.subject.as_deref().map(ascii_clean).unwrap_or_default();
        let date = envelope.date.as_deref().map(ascii_clean).unwrap_or_default();
        events.push(format_mail_event(&sender, &subject, &date));
    }

    session.logout().ok();
    Ok(events)
}

/// Shipping-email sentences, or an empty list on any failure. The IMAP
/// client is blocking, so the whole exchange runs off the async runtime.
pub async fn collect(config: Result<MailboxConfig>) -> Vec<String> {
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            warn!("Mailbox collector not configured: {}", e);
            return Vec::new();
        }
    };
    let result = tokio::task::spawn_blocking(move || try_collect(&config)).await;
    match result {
        Ok(Ok(events)) => events,
        Ok(Err(e)) => {
            warn!("Error getting email events: {}", e);
            Vec::new()
        }
        Err(e) => {
            warn!("Mailbox collector task failed: {}", e);
            Vec::new()
        }
    }
}
