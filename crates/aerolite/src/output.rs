//! Rendering for `--output`.
//!
//! Each variant of [`OutputFormat`] knows how to render itself: tables
//! through `tabled`, JSON through serde, and a line-per-item plain mode
//! for scripting. Handlers pass closures for the views that cannot be
//! derived (table rows, plain-mode identifiers, detail text).

use std::io::{self, IsTerminal, Write};

use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

impl OutputFormat {
    /// Render a collection. `row` builds the table view, `id` the
    /// plain one-per-line view; JSON serializes the items themselves.
    pub fn list<T, R>(
        &self,
        items: &[T],
        row: impl Fn(&T) -> R,
        id: impl Fn(&T) -> String,
    ) -> String
    where
        T: Serialize,
        R: Tabled,
    {
        match self {
            Self::Table => table(items.iter().map(row).collect()),
            Self::Json => json(items, true),
            Self::JsonCompact => json(items, false),
            Self::Plain => items.iter().map(id).collect::<Vec<_>>().join("\n"),
        }
    }

    /// Render one item. Detail views are pre-formatted text rather than
    /// `Tabled` rows, so the table arm takes a `detail` closure.
    pub fn single<T: Serialize>(
        &self,
        item: &T,
        detail: impl Fn(&T) -> String,
        id: impl Fn(&T) -> String,
    ) -> String {
        match self {
            Self::Table => detail(item),
            Self::Json => json(item, true),
            Self::JsonCompact => json(item, false),
            Self::Plain => id(item),
        }
    }
}

fn table<R: Tabled>(rows: Vec<R>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Serialize to JSON. A value that fails to serialize still produces a
/// JSON document, so scripted consumers never see half-rendered output.
pub fn json<T: Serialize + ?Sized>(data: &T, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(data)
    } else {
        serde_json::to_string(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

/// Write rendered text to stdout unless `--quiet` suppressed it.
pub fn emit(text: &str, quiet: bool) {
    if quiet || text.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{text}");
}

/// Whether to colorize, honoring `--color` and the `NO_COLOR` convention.
pub fn use_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}
