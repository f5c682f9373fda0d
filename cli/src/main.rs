mod config;
mod output;
mod prompt;

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use edge_collections_core::{Collection, Record, Table, truncate_blobs};
use edge_collections_sqlite::{
    CollectionsQuery, Database, SqliteError, TitleMatch, default_database_path, reveal,
    snapshot_database,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::EditorConfig;
use crate::output::{CollectionDetail, LocateReport, OutputFormat, SampleReport, TableView, render};

#[derive(Debug, Parser)]
#[command(name = "edge-collections", version)]
#[command(about = "Inspect and edit the Microsoft Edge Collections database")]
struct Cli {
    /// Path to the collectionsSQLite file (default: the profile's location).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Edge profile used to find the default database.
    #[arg(long, global = true)]
    profile: Option<String>,
    /// Path to a YAML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Output format.
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print row counts and sample rows, or filter one table.
    Sample(SampleArgs),
    /// List, show, find, rename or delete collections.
    Collections(CollectionsArgs),
    /// List, show or find items.
    Items(ItemsArgs),
    /// List collections (or items) that are marked syncable.
    Syncable(SyncableArgs),
    /// Print where the database is expected to be.
    Locate(LocateArgs),
    /// Write a numbered backup of the database file.
    Backup,
}

#[derive(Debug, Args)]
struct SampleArgs {
    /// Table to sample (default: every table).
    #[arg(short, long, value_parser = parse_table)]
    table: Option<Table>,
    /// Number of rows printed per table.
    #[arg(short, long)]
    limit: Option<usize>,
    /// Column to filter on; requires --table and --value.
    #[arg(short, long)]
    column: Option<String>,
    /// Value the column must equal (or contain, with --like).
    #[arg(short = 'V', long)]
    value: Option<String>,
    /// Match the value as a substring.
    #[arg(long)]
    like: bool,
}

#[derive(Debug, Args)]
struct CollectionsArgs {
    #[command(subcommand)]
    operation: CollectionsOperation,
}

#[derive(Debug, Subcommand)]
enum CollectionsOperation {
    /// List collection ids and titles.
    List(ListArgs),
    /// Show one collection and its items.
    Show(IdArgs),
    /// Find collections by title.
    Find(FindArgs),
    /// Change a collection's title.
    Rename(RenameArgs),
    /// Delete a collection.
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
struct ItemsArgs {
    #[command(subcommand)]
    operation: ItemsOperation,
}

#[derive(Debug, Subcommand)]
enum ItemsOperation {
    /// List item ids and titles.
    List(ItemListArgs),
    /// Show one item and the collections it belongs to.
    Show(IdArgs),
    /// Find items by title.
    Find(FindArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Keep entries whose title or id contains this text (case-sensitive).
    #[arg(long)]
    filter: Option<String>,
}

#[derive(Debug, Args)]
struct ItemListArgs {
    /// Keep entries whose title or id contains this text (case-sensitive).
    #[arg(long)]
    filter: Option<String>,
    /// Only items in this collection, in collection order.
    #[arg(long)]
    collection: Option<String>,
}

#[derive(Debug, Args)]
struct IdArgs {
    id: String,
}

#[derive(Debug, Args)]
struct FindArgs {
    title: String,
    /// Match titles containing the text instead of equal to it.
    #[arg(long)]
    like: bool,
}

#[derive(Debug, Args)]
struct RenameArgs {
    id: String,
    title: String,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    id: String,
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

#[derive(Debug, Args)]
struct SyncableArgs {
    /// Report items instead of collections.
    #[arg(long)]
    items: bool,
}

#[derive(Debug, Args)]
struct LocateArgs {
    /// Also show the file in the system file manager.
    #[arg(long)]
    reveal: bool,
}

/// Settings shared by every command after flags and config are merged.
struct Session {
    db: Option<PathBuf>,
    profile: String,
    format: OutputFormat,
    config: EditorConfig,
}

impl Session {
    fn from_cli(cli: &Cli) -> Result<Self, String> {
        let config = EditorConfig::resolve(cli.config.as_deref())?;
        Ok(Self {
            db: cli.db.clone().or_else(|| config.database.clone()),
            profile: cli.profile.clone().unwrap_or_else(|| config.profile.clone()),
            format: cli.format,
            config,
        })
    }

    /// Opens the database, asking once for a path on a terminal when the
    /// file cannot be found.
    fn open(&self) -> Result<(Database, PathBuf), String> {
        match Database::open_with_profile(self.db.as_deref(), &self.profile) {
            Ok(opened) => Ok(opened),
            Err(err @ SqliteError::NotFound(_)) if io::stdin().is_terminal() => {
                eprintln!("{err}");
                let entered = prompt::ask_path(
                    "Path to collectionsSQLite (empty to quit): ",
                    &mut io::stdin().lock(),
                )?;
                let Some(path) = entered else {
                    return Err(err.to_string());
                };
                Database::open_with_profile(Some(&path), &self.profile)
                    .map_err(|err| err.to_string())
            }
            Err(err) => Err(err.to_string()),
        }
    }

    fn print<T>(&self, value: &T) -> Result<(), String>
    where
        T: serde::Serialize + TableView + ?Sized,
    {
        let rendered = render(value, self.format)?;
        print!("{rendered}");
        if !rendered.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = Session::from_cli(&cli).and_then(|session| match cli.command {
        Command::Sample(args) => run_sample(&session, args),
        Command::Collections(args) => run_collections(&session, args),
        Command::Items(args) => run_items(&session, args),
        Command::Syncable(args) => run_syncable(&session, args),
        Command::Locate(args) => run_locate(&session, args),
        Command::Backup => run_backup(&session),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_sample(session: &Session, args: SampleArgs) -> Result<(), String> {
    let has_value = args.value.as_deref().is_some_and(|v| !v.is_empty());
    if args.column.is_some() && (!has_value || args.table.is_none()) {
        return Err(
            "Both --value and --table must be specified to filter the sample data.".to_string(),
        );
    }

    let (db, _) = session.open()?;
    let query = CollectionsQuery::new(&db);
    let sample = &session.config.sample;
    let limit = args.limit.unwrap_or(sample.limit);

    let mut reports = match (args.table, args.column, args.value) {
        (Some(table), Some(column), Some(value)) => {
            let mut rows = query
                .filter_table(table, &column, value.as_str(), args.like)
                .map_err(|err| format!("Failed to filter {table}: {err}"))?;
            let total = rows.len() as u64;
            rows.truncate(limit);
            vec![SampleReport {
                table: table.to_string(),
                total,
                rows,
            }]
        }
        (Some(table), _, _) => vec![sample_report(&query, table, limit)?],
        (None, _, _) => Table::ALL
            .iter()
            .map(|&table| sample_report(&query, table, limit))
            .collect::<Result<Vec<_>, _>>()?,
    };

    for report in &mut reports {
        truncate_blobs(&mut report.rows, &sample.blob_fields, sample.truncate);
    }
    session.print(&reports[..])
}

fn sample_report(query: &CollectionsQuery<'_>, table: Table, limit: usize) -> Result<SampleReport, String> {
    let total = query
        .count_rows(table)
        .map_err(|err| format!("Failed to count {table}: {err}"))?;
    let rows = query
        .sample_table(table, limit)
        .map_err(|err| format!("Failed to read {table}: {err}"))?;
    Ok(SampleReport {
        table: table.to_string(),
        total,
        rows,
    })
}

fn run_collections(session: &Session, args: CollectionsArgs) -> Result<(), String> {
    let (db, path) = session.open()?;
    let query = CollectionsQuery::new(&db);

    match args.operation {
        CollectionsOperation::List(list) => {
            let collections = query.list_collections().map_err(|err| err.to_string())?;
            let collections = prompt::filter_records(collections, list.filter.as_deref());
            session.print(&collections[..])
        }
        CollectionsOperation::Show(show) => {
            let collection = require_collection(&query, &show.id)?;
            let items = query
                .get_items_in_collection(&collection)
                .map_err(|err| err.to_string())?;
            let detail = CollectionDetail {
                items: items.iter().map(|item| item.summary()).collect(),
                collection,
            };
            session.print(&detail)
        }
        CollectionsOperation::Find(find) => {
            let found = query
                .find_collections_by_title(&find.title, TitleMatch::from_like(find.like))
                .map_err(|err| err.to_string())?;
            session.print(&found[..])
        }
        CollectionsOperation::Rename(rename) => {
            let title = rename.title.trim();
            if title.is_empty() {
                return Err("Collection title must not be empty".to_string());
            }
            let collection = require_collection(&query, &rename.id)?;
            let backup = backup_before_edit(&db, &path)?;

            let tx = db.transaction().map_err(|err| err.to_string())?;
            query
                .rename_collection(&collection.id, title)
                .map_err(|err| format!("Failed to rename collection: {err}"))?;
            tx.commit().map_err(|err| format!("Failed to commit rename: {err}"))?;

            println!(
                "Renamed collection '{}' from '{}' to '{title}' (backup: {}).",
                collection.id,
                collection.title,
                backup.display()
            );
            Ok(())
        }
        CollectionsOperation::Delete(delete) => {
            let collection = require_collection(&query, &delete.id)?;
            if !delete.yes {
                let question = format!(
                    "Delete collection '{}' ({})?",
                    collection.title, collection.id
                );
                if !prompt::confirm(&question, &mut io::stdin().lock())? {
                    println!("Aborted; nothing was deleted.");
                    return Ok(());
                }
            }
            let backup = backup_before_edit(&db, &path)?;

            let tx = db.transaction().map_err(|err| err.to_string())?;
            query
                .delete_collection(&collection.id)
                .map_err(|err| format!("Failed to delete collection: {err}"))?;
            tx.commit().map_err(|err| format!("Failed to commit delete: {err}"))?;

            println!(
                "Deleted collection '{}' ({}) (backup: {}).",
                collection.title,
                collection.id,
                backup.display()
            );
            Ok(())
        }
    }
}

fn run_items(session: &Session, args: ItemsArgs) -> Result<(), String> {
    let (db, _) = session.open()?;
    let query = CollectionsQuery::new(&db);

    match args.operation {
        ItemsOperation::List(list) => {
            let items = match list.collection.as_deref() {
                Some(collection) => {
                    require_collection(&query, collection)?;
                    query
                        .get_items_in_collection(collection)
                        .map_err(|err| err.to_string())?
                        .iter()
                        .map(|item| item.summary())
                        .collect()
                }
                None => query.list_items().map_err(|err| err.to_string())?,
            };
            let items = prompt::filter_records(items, list.filter.as_deref());
            session.print(&items[..])
        }
        ItemsOperation::Show(show) => {
            let item = query
                .get_item(&show.id)
                .map_err(|err| err.to_string())?
                .ok_or_else(|| format!("No item with id '{}'", show.id))?;
            let mut linked = query
                .link_items_to_collections(&[item])
                .map_err(|err| format!("Failed to load memberships: {err}"))?;
            let linked = linked
                .pop()
                .ok_or_else(|| format!("No item with id '{}'", show.id))?;
            debug!(item = %linked.display_name(), memberships = linked.memberships.len(), "linked item");
            session.print(&linked)
        }
        ItemsOperation::Find(find) => {
            let found = query
                .find_items_by_title(&find.title, TitleMatch::from_like(find.like))
                .map_err(|err| err.to_string())?;
            session.print(&found[..])
        }
    }
}

fn run_syncable(session: &Session, args: SyncableArgs) -> Result<(), String> {
    let (db, _) = session.open()?;
    let query = CollectionsQuery::new(&db);

    if args.items {
        let items = query.check_syncable_items().map_err(|err| err.to_string())?;
        session.print(&items[..])
    } else {
        let collections = query
            .check_syncable_collections()
            .map_err(|err| err.to_string())?;
        session.print(&collections[..])
    }
}

fn run_locate(session: &Session, args: LocateArgs) -> Result<(), String> {
    let path = session
        .db
        .clone()
        .or_else(|| default_database_path(&session.profile))
        .ok_or("Could not determine the default database location")?;
    let report = LocateReport {
        profile: session.profile.clone(),
        exists: path.is_file(),
        path,
    };
    session.print(&report)?;

    if args.reveal {
        if !report.exists {
            return Err(format!("Nothing to reveal: {} does not exist", report.path.display()));
        }
        reveal(&report.path).map_err(|err| format!("Failed to open file manager: {err}"))?;
    }
    Ok(())
}

fn run_backup(session: &Session) -> Result<(), String> {
    let (db, path) = session.open()?;
    let backup = backup_before_edit(&db, &path)?;
    println!("Backed up '{}' to '{}'.", path.display(), backup.display());
    Ok(())
}

fn require_collection(
    query: &CollectionsQuery<'_>,
    id: &str,
) -> Result<Collection, String> {
    query
        .get_collection(id)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| format!("No collection with id '{id}'"))
}

fn backup_before_edit(db: &Database, path: &Path) -> Result<PathBuf, String> {
    snapshot_database(db, path).map_err(|err| {
        warn!(path = %path.display(), %err, "backup failed");
        format!("Failed to back up '{}': {err}", path.display())
    })
}

fn parse_table(raw: &str) -> Result<Table, String> {
    raw.parse::<Table>().map_err(|err| {
        let known: Vec<&str> = Table::ALL.iter().map(|t| t.name()).collect();
        format!("{err} (expected one of: {})", known.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_table_is_case_insensitive() {
        assert_eq!(parse_table("Collections").unwrap(), Table::Collections);
        assert_eq!(parse_table("items_sync").unwrap(), Table::ItemsSync);
    }

    #[test]
    fn test_parse_table_lists_known_tables() {
        let err = parse_table("bogus").unwrap_err();
        assert!(err.contains("collections_items_relationship"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "edge-collections",
            "collections",
            "list",
            "--db",
            "/tmp/x",
            "-vv",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_sample_short_flags() {
        let cli = Cli::try_parse_from([
            "edge-collections", "sample", "-t", "items", "-c", "title", "-V", "Waffles", "--like",
            "-l", "3",
        ])
        .unwrap();
        let Command::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        assert_eq!(args.table, Some(Table::Items));
        assert_eq!(args.column.as_deref(), Some("title"));
        assert_eq!(args.value.as_deref(), Some("Waffles"));
        assert_eq!(args.limit, Some(3));
        assert!(args.like);
    }
}
