use std::fmt::Display;
use std::io::{self, Write};

use rstake::events::NotificationLevel;
use rstake::{ClientEvent, EventSubscription, Notification};
use serde::Serialize;

use crate::error::CliError;

/// Writes command results to stdout, either as TSV or as one JSON document
/// per line.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), CliError> {
        let line = serde_json::to_string(value)?;
        self.write(&line)
    }

    /// Header row followed by one tab-separated line per row.
    pub fn table(&self, header: &[&str], rows: &[Vec<String>]) -> Result<(), CliError> {
        let mut buf = header.join("\t");
        buf.push('\n');
        for row in rows {
            buf.push_str(&row.join("\t"));
            buf.push('\n');
        }
        self.write(buf.trim_end())
    }

    /// `key<TAB>value` lines.
    pub fn fields(&self, fields: &[(&str, String)]) -> Result<(), CliError> {
        let buf = fields
            .iter()
            .map(|(k, v)| format!("{k}\t{v}"))
            .collect::<Vec<_>>()
            .join("\n");
        self.write(&buf)
    }

    pub fn line(&self, msg: impl Display) -> Result<(), CliError> {
        self.write(&msg.to_string())
    }

    /// Print a notification. Errors are left to the command's exit status.
    pub fn notification(&self, n: &Notification) -> Result<(), CliError> {
        match n.level {
            NotificationLevel::Error => Ok(()),
            _ if self.json => self.json(&serde_json::json!({ "notification": n.message })),
            _ => self.line(&n.message),
        }
    }

    /// Print every notification queued on `sub`.
    pub fn drain(&self, sub: &mut EventSubscription) -> Result<(), CliError> {
        while let Some(event) = sub.try_next() {
            if let ClientEvent::Notification(n) = event {
                self.notification(&n)?;
            }
        }
        Ok(())
    }

    fn write(&self, text: &str) -> Result<(), CliError> {
        let mut out = io::stdout().lock();
        writeln!(out, "{text}")?;
        out.flush()?;
        Ok(())
    }
}

/// `12.5` → `"12.50"`.
pub fn amount(value: f64) -> String {
    format!("{value:.2}")
}

pub fn or_dash(value: Option<impl Display>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}
