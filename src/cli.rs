//! Command line front end.
//!
//! Every grid command drives a [`Dashboard`] the same way an interactive
//! front end would: events in, settle, then render the view model.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use crate::app::modes::NotificationKind;
use crate::auth::{AdminGate, AuthClient, RestAuth, Session};
use crate::client::{self, ResourceClient, RestBackend};
use crate::domain::{AdminError, Fields, Resource, Result};
use crate::listing::{self, Mutation};
use crate::ui::table;
use crate::{observability, Config, Dashboard, Event};

#[derive(Debug, Parser)]
#[command(
    name = "equilink-admin",
    version,
    about = "Equilink admin dashboard from the command line",
    long_about = "List, search and edit the Equilink marketplace collections.\n\n\
                  Remote access signs in with the admin account; --fixture runs\n\
                  against a local JSON snapshot instead."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: ~/.config/equilink-admin/config.toml).
    #[arg(long, value_name = "PATH", global = true, env = "EQUILINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Serve requests from a JSON fixture instead of the backend.
    #[arg(long, value_name = "PATH", global = true)]
    pub fixture: Option<PathBuf>,

    /// Admin account email for remote sign-in.
    #[arg(long, global = true, env = "EQUILINK_EMAIL")]
    pub email: Option<String>,

    /// Admin account password for remote sign-in.
    #[arg(long, global = true, env = "EQUILINK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Disable ANSI highlighting of search matches.
    #[arg(long, global = true)]
    pub plain: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show one page of a resource.
    List(ListArgs),

    /// Show business categories with their subcategories.
    Categories(CategoriesArgs),

    /// Insert a record.
    Add(AddArgs),

    /// Update fields of a record.
    Update(UpdateArgs),

    /// Delete one or more records.
    Delete(DeleteArgs),

    /// Overview counters.
    Stats,

    /// Newest posts or businesses.
    Recent {
        #[arg(value_enum)]
        kind: RecentKind,

        #[arg(long, default_value_t = 5)]
        limit: u64,
    },

    /// Print one record as JSON.
    Get { resource: Resource, id: String },

    /// Show a customer profile.
    Profile { id: String },

    /// Print the name of a business category.
    CategoryName { id: String },
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Resource name, e.g. `posts`, `business_categories`, `customers`.
    pub resource: Resource,

    #[command(flatten)]
    pub view: ViewArgs,
}

#[derive(Debug, Parser)]
pub struct CategoriesArgs {
    /// Hide subcategories.
    #[arg(long)]
    pub collapsed: bool,

    #[command(flatten)]
    pub view: ViewArgs,
}

#[derive(Debug, Parser)]
pub struct ViewArgs {
    /// Case-insensitive substring search.
    #[arg(long, short)]
    pub search: Option<String>,

    /// One-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: u64,

    #[arg(long, value_name = "N")]
    pub page_size: Option<u64>,

    /// Sort the page by a column; `column:desc` for descending. Repeat for
    /// secondary keys, highest priority first.
    #[arg(long, value_name = "COLUMN[:desc]")]
    pub sort: Vec<String>,

    /// Keep rows whose column shows one of the values. Repeatable.
    #[arg(long, value_name = "COLUMN=V1,V2")]
    pub filter: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct AddArgs {
    pub resource: Resource,

    /// `name=value`; values that parse as JSON are sent typed. Repeatable.
    #[arg(long = "field", short = 'f', value_name = "NAME=VALUE", required = true)]
    pub fields: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct UpdateArgs {
    pub resource: Resource,
    pub id: String,

    #[arg(long = "field", short = 'f', value_name = "NAME=VALUE", required = true)]
    pub fields: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct DeleteArgs {
    pub resource: Resource,

    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RecentKind {
    Posts,
    Businesses,
}

/// Parses `name=value`. The value is JSON when it parses as such, else a string.
///
/// # Errors
///
/// Returns [`AdminError::Config`] when `=` is missing or the name is empty.
pub fn parse_fields(pairs: &[String]) -> Result<Fields> {
    let mut fields = Fields::new();
    for pair in pairs {
        let (name, raw) = pair
            .split_once('=')
            .filter(|(name, _)| !name.trim().is_empty())
            .ok_or_else(|| AdminError::Config(format!("expected NAME=VALUE, got {pair:?}")))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        fields.insert(name.trim().to_string(), value);
    }
    Ok(fields)
}

/// Parses `column=v1,v2` into a facet filter.
fn parse_filter(arg: &str) -> Result<(String, BTreeSet<String>)> {
    let (column, values) = arg
        .split_once('=')
        .ok_or_else(|| AdminError::Config(format!("expected COLUMN=V1,V2, got {arg:?}")))?;
    let values = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    Ok((column.trim().to_string(), values))
}

/// Session opened for a remote run; closed when the command finishes.
struct SignedIn {
    auth: RestAuth,
    session: Session,
}

fn open_client(cli: &Cli, config: &Config) -> Result<(Arc<dyn ResourceClient>, Option<SignedIn>)> {
    if let Some(path) = cli.fixture.as_deref() {
        return Ok((client::connect(config, Some(path))?, None));
    }

    let (Some(email), Some(password)) = (cli.email.as_deref(), cli.password.as_deref()) else {
        return Err(AdminError::Config(
            "--email and --password are required for remote access".to_string(),
        ));
    };

    let backend = RestBackend::from_config(config)?;
    let auth = RestAuth::from_config(config)?;
    let session = auth.sign_in(email, password)?;
    backend.set_access_token(Some(session.access_token.clone()));

    if let Err(err) = AdminGate::new(config.admin_email.as_str()).authorize(&backend, &session) {
        if let Err(sign_out) = auth.sign_out(&session) {
            tracing::warn!(error = %sign_out, "sign-out after rejected login failed");
        }
        return Err(err);
    }

    Ok((Arc::new(backend), Some(SignedIn { auth, session })))
}

fn settle_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.request_timeout_secs.max(1) * 2) + Duration::from_millis(config.search_debounce_ms)
}

/// Settles and prints notifications. Returns `false` if any was an error.
fn finish(dashboard: &mut Dashboard, config: &Config) -> Result<bool> {
    if !dashboard.settle(settle_timeout(config))? {
        eprintln!("error: timed out waiting for the backend");
        return Ok(false);
    }
    let vm = dashboard.viewmodel();
    for line in table::notification_lines(&vm) {
        eprintln!("{line}");
    }
    Ok(!vm
        .notifications
        .iter()
        .any(|n| n.kind == NotificationKind::Error))
}

fn show_grid(
    client: Arc<dyn ResourceClient>,
    config: &Config,
    resource: Resource,
    view: &ViewArgs,
    expand_all: bool,
    styled: bool,
) -> Result<bool> {
    let mut config = config.clone();
    if let Some(size) = view.page_size {
        config.page_size = size;
    }
    let mut dashboard = Dashboard::new(client, &config, resource)?;

    match view.search.as_deref() {
        Some(term) if !term.trim().is_empty() && !listing::ListPlan::for_resource(resource).is_searchable() => {
            return Err(AdminError::Config(format!("{resource} cannot be searched")));
        }
        Some(term) if !term.trim().is_empty() => {
            dashboard.dispatch(Event::SearchInput(term.to_string()))?;
        }
        _ => {
            dashboard.dispatch(Event::Load)?;
        }
    }
    if !finish(&mut dashboard, &config)? {
        return Ok(false);
    }

    if view.page > 1 {
        dashboard.dispatch(Event::SetPage(view.page - 1))?;
        if !finish(&mut dashboard, &config)? {
            return Ok(false);
        }
    }

    for arg in &view.filter {
        let (column, values) = parse_filter(arg)?;
        dashboard.dispatch(Event::SetFilter { column, values })?;
    }
    for arg in &view.sort {
        let (column, descending) = match arg.rsplit_once(':') {
            Some((column, "desc")) => (column, true),
            Some((column, "asc")) => (column, false),
            _ => (arg.as_str(), false),
        };
        dashboard.dispatch(Event::ToggleSortKey(column.to_string()))?;
        if descending {
            dashboard.dispatch(Event::ToggleSortKey(column.to_string()))?;
        }
    }
    if expand_all {
        let parents: Vec<String> = dashboard
            .state()
            .result
            .iter()
            .flat_map(|r| r.data.iter())
            .filter(|r| !r.children().is_empty())
            .map(|r| r.id.clone())
            .collect();
        for id in parents {
            dashboard.dispatch(Event::ToggleExpand(id))?;
        }
    }

    let vm = dashboard.viewmodel();
    println!("{}", vm.title);
    println!("{}", table::grid_table(&vm, styled));
    println!("{}", table::footer(&vm));
    Ok(true)
}

fn submit(client: Arc<dyn ResourceClient>, config: &Config, resource: Resource, mutation: Mutation) -> Result<bool> {
    let mut dashboard = Dashboard::new(client, config, resource)?;
    dashboard.dispatch(Event::Submit { resource, mutation })?;
    finish(&mut dashboard, config)
}

fn execute(cli: &Cli, config: &Config, client: Arc<dyn ResourceClient>) -> Result<bool> {
    let styled = !cli.plain;
    match &cli.command {
        Command::List(args) => show_grid(client, config, args.resource, &args.view, false, styled),

        Command::Categories(args) => show_grid(
            client,
            config,
            Resource::BusinessCategories,
            &args.view,
            !args.collapsed,
            styled,
        ),

        Command::Add(args) => {
            let fields = parse_fields(&args.fields)?;
            submit(client, config, args.resource, Mutation::Insert { fields })
        }

        Command::Update(args) => {
            let fields = parse_fields(&args.fields)?;
            let mutation = Mutation::Update {
                id: args.id.clone(),
                fields,
            };
            submit(client, config, args.resource, mutation)
        }

        Command::Delete(args) => {
            let mut dashboard = Dashboard::new(client, config, args.resource)?;
            for id in &args.ids {
                dashboard.dispatch(Event::ToggleRowSelected(id.clone()))?;
            }
            dashboard.dispatch(Event::DeleteSelected)?;
            finish(&mut dashboard, config)
        }

        Command::Stats => {
            let mut dashboard = Dashboard::new(client, config, Resource::Businesses)?;
            dashboard.dispatch(Event::LoadStats)?;
            let ok = finish(&mut dashboard, config)?;
            if let Some(stats) = dashboard.state().stats {
                println!("{}", table::stats_table(&stats));
            }
            Ok(ok)
        }

        Command::Recent { kind, limit } => {
            let items = match kind {
                RecentKind::Posts => listing::recent_posts(client.as_ref(), *limit)?,
                RecentKind::Businesses => listing::recent_businesses(client.as_ref(), *limit)?,
            };
            println!("{}", table::recent_table(&items));
            Ok(true)
        }

        Command::Get { resource, id } => {
            let record = client.get(*resource, id.trim())?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(true)
        }

        Command::Profile { id } => {
            let profile = listing::get_profile(client.as_ref(), id)?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(true)
        }

        Command::CategoryName { id } => {
            match listing::category_name(client.as_ref(), id)? {
                Some(name) => println!("{name}"),
                None => println!("Unknown"),
            }
            Ok(true)
        }
    }
}

/// Runs one command. Returns `false` when the command reported a failure
/// notification.
///
/// # Errors
///
/// Returns configuration, sign-in and backend errors.
pub fn run(cli: &Cli) -> Result<bool> {
    let config = Config::discover(cli.config.as_deref())?;
    observability::init_tracing(&config);
    let _span = tracing::info_span!("cli", command = ?cli.command).entered();

    let (client, signed_in) = open_client(cli, &config)?;
    let outcome = execute(cli, &config, client);

    if let Some(SignedIn { auth, session }) = signed_in {
        if let Err(err) = auth.sign_out(&session) {
            tracing::warn!(error = %err, "sign-out failed");
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fields_parse_json_values() {
        let fields = parse_fields(&[
            "name=Farriers".to_string(),
            "is_featured=true".to_string(),
            "price=12.5".to_string(),
        ])
        .unwrap();
        assert_eq!(fields["name"], json!("Farriers"));
        assert_eq!(fields["is_featured"], json!(true));
        assert_eq!(fields["price"], json!(12.5));
    }

    #[test]
    fn fields_require_a_name() {
        assert!(parse_fields(&["=x".to_string()]).is_err());
        assert!(parse_fields(&["novalue".to_string()]).is_err());
    }

    #[test]
    fn filter_splits_values() {
        let (column, values) = parse_filter("status=Approved, Pending").unwrap();
        assert_eq!(column, "status");
        assert_eq!(values.len(), 2);
        assert!(values.contains("Pending"));
    }

    #[test]
    fn parses_list_command() {
        let cli = Cli::try_parse_from([
            "equilink-admin",
            "--fixture",
            "data.json",
            "list",
            "posts",
            "--search",
            "show",
            "--sort",
            "title:desc",
        ])
        .unwrap();
        match cli.command {
            Command::List(args) => {
                assert_eq!(args.resource, Resource::Posts);
                assert_eq!(args.view.search.as_deref(), Some("show"));
                assert_eq!(args.view.page, 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn remote_access_needs_credentials() {
        let cli = Cli::try_parse_from(["equilink-admin", "stats"]).unwrap();
        let config = Config {
            backend_url: Some("https://example.supabase.co".into()),
            anon_key: Some("anon".into()),
            ..Config::default()
        };
        let err = open_client(&Cli { email: None, password: None, ..cli }, &config).err().unwrap();
        assert!(matches!(err, AdminError::Config(_)));
    }
}
