//! Output formatting for records, listings and samples.

use std::path::PathBuf;

use edge_collections_core::{Collection, Item, ItemSummary, Linked, Record, RowMap};
use serde::Serialize;
use serde_json::Value;

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    #[default]
    Table,
}

/// Plain-text rendering used by [`OutputFormat::Table`].
pub trait TableView {
    fn to_table(&self) -> String;
}

/// Formats a value in the requested output format.
pub fn render<T>(value: &T, format: OutputFormat) -> Result<String, String>
where
    T: Serialize + TableView + ?Sized,
{
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(value.to_table()),
    }
}

/// A collection together with the items it holds, in position order.
#[derive(Debug, Serialize)]
pub struct CollectionDetail {
    #[serde(flatten)]
    pub collection: Collection,
    pub items: Vec<ItemSummary>,
}

/// Row count and leading rows of one table.
#[derive(Debug, Serialize)]
pub struct SampleReport {
    pub table: String,
    pub total: u64,
    pub rows: Vec<RowMap>,
}

/// Where the database is expected to live.
#[derive(Debug, Serialize)]
pub struct LocateReport {
    pub profile: String,
    pub path: PathBuf,
    pub exists: bool,
}

impl<T: Record> TableView for [T] {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "(none)\n".to_string();
        }
        let width = self
            .iter()
            .map(|r| r.record_id().unwrap_or_default().chars().count())
            .max()
            .unwrap_or(0)
            .max(2);

        let mut out = format!("{:<width$}  TITLE\n", "ID");
        for record in self {
            out.push_str(&format!(
                "{:<width$}  {}\n",
                record.record_id().unwrap_or_default(),
                record.record_title().unwrap_or_default()
            ));
        }
        out
    }
}

impl TableView for CollectionDetail {
    fn to_table(&self) -> String {
        let mut out = fields_table(&self.collection);
        out.push_str(&format!("\nItems ({}):\n", self.items.len()));
        for item in &self.items {
            out.push_str(&format!("  {}  {}\n", item.id, item.title));
        }
        out
    }
}

impl TableView for Linked<Item> {
    fn to_table(&self) -> String {
        let mut out = fields_table(&self.record);
        out.push_str(&format!("\nCollections ({}):\n", self.memberships.len()));
        for membership in &self.memberships {
            let title = membership
                .parent
                .as_ref()
                .map_or("(missing collection)", |c| c.title.as_str());
            let position = membership
                .position
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            out.push_str(&format!("  [{position}] {}  {title}\n", membership.parent_id));
        }
        out
    }
}

impl TableView for [SampleReport] {
    fn to_table(&self) -> String {
        let mut out = String::new();
        for report in self {
            out.push_str(&format!("{} {}\n", report.table, report.total));
            for row in &report.rows {
                out.push_str(&indent(&fields_table(row)));
                out.push('\n');
            }
            out.push_str("-----\n");
        }
        out
    }
}

impl TableView for LocateReport {
    fn to_table(&self) -> String {
        let state = if self.exists { "found" } else { "missing" };
        format!("{} ({state}, profile '{}')\n", self.path.display(), self.profile)
    }
}

/// Renders the top-level fields of a serializable record as `key: value`
/// lines.
fn fields_table<T: Serialize + ?Sized>(value: &T) -> String {
    let Ok(Value::Object(fields)) = serde_json::to_value(value) else {
        return String::new();
    };
    let width = fields.keys().map(|k| k.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (key, value) in &fields {
        out.push_str(&format!("{key:<width$}  {}\n", scalar_text(value)));
    }
    out
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.replace('\n', "\\n"),
        other => other.to_string(),
    }
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("  {line}\n")).collect()
}
