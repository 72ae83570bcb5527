//! staffdesk command-line shell
//!
//! Drives the association editor against a live server. Every command opens
//! its own session: configuration is resolved, the logger installed, and the
//! lists it needs are read fresh.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::Value;

use staffdesk::api::HttpBackend;
use staffdesk::dashboard::Dashboard;
use staffdesk::domain::{EntityKind, IdKind, RecordId};
use staffdesk::editor::SubmitOutcome;
use staffdesk::views::TaskBoard;
use staffdesk::{ClientConfig, Editor, FetchError, RefreshReport};

#[derive(Parser)]
#[command(name = "staffdesk")]
#[command(about = "Manage employees, departments, projects and tasks")]
struct Cli {
    /// Configuration file
    #[arg(long, value_name = "FILE", default_value = "staffdesk.json")]
    config: PathBuf,

    /// Server address (overrides config and environment)
    #[arg(long)]
    base_url: Option<String>,

    /// Bearer token (overrides config and environment)
    #[arg(long)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a collection
    List {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
    },
    /// Print one record
    Show {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        id: String,
    },
    /// Create a record
    Create {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        /// Field value, as `field=value`
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        sets: Vec<String>,
        /// Flip one ID in an association field, as `field=id`
        #[arg(long = "toggle", value_name = "FIELD=ID")]
        toggles: Vec<String>,
    },
    /// Update a record; only changed fields are sent
    Update {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        id: String,
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        sets: Vec<String>,
        #[arg(long = "toggle", value_name = "FIELD=ID")]
        toggles: Vec<String>,
    },
    /// Delete a record
    Delete {
        #[arg(value_parser = parse_kind)]
        kind: EntityKind,
        id: String,
    },
    /// Download the files submitted for a task
    Download {
        /// Task unique identifier
        task: String,
        #[arg(long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
    },
    /// Hand in work for a task
    SubmitWork {
        /// Task unique identifier
        task: String,
        #[arg(long, default_value = "")]
        description: String,
        files: Vec<PathBuf>,
    },
    /// Tasks assigned to the signed-in employee
    MyTasks,
    /// Projects the signed-in employee works on
    MyProjects,
    /// Details of one project with its tasks
    Project { id: String },
    /// The signed-in employee
    Profile,
    /// Write the effective configuration back to the config file
    SaveConfig,
}

fn parse_kind(s: &str) -> Result<EntityKind, String> {
    s.parse::<EntityKind>()
        .map_err(|_| format!("unknown collection: {} (employees, departments, projects, tasks)", s))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let log_dir = config.log_dir.clone().unwrap_or_else(|| PathBuf::from("logs"));
    if let Err(e) = rolling_logger::init_logger(log_dir, "staffdesk") {
        eprintln!("Logging disabled: {}", e);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    let result = runtime.block_on(run(&cli, &config));
    if let Err(e) = &result {
        let _ = rolling_logger::error(&format!("{:#}", e));
    }
    result
}

fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::load(&cli.config)
        .map_err(|e| anyhow!(e))?
        .with_env()
        .map_err(|e| anyhow!(e))?;
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.token = token.clone();
    }
    if let Some(secs) = cli.timeout {
        config.request_timeout_secs = secs;
    }
    Ok(config)
}

async fn run(cli: &Cli, config: &ClientConfig) -> anyhow::Result<()> {
    if let Command::SaveConfig = cli.command {
        config.save(&cli.config).map_err(|e| anyhow!(e))?;
        println!("Saved {}", cli.config.display());
        return Ok(());
    }

    let credential = config.credential();
    if credential.is_empty() {
        bail!("No token configured; pass --token or set STAFFDESK_TOKEN");
    }
    let backend = HttpBackend::new(&config.base_url, credential.clone(), config.timeout())?;
    let dashboard = Dashboard::new(Arc::new(backend), &credential).with_timeout(config.timeout());
    info!("Session against {} ({})", config.base_url, cli.command_name());

    match &cli.command {
        Command::List { kind } => list(&dashboard, *kind).await,
        Command::Show { kind, id } => show(&dashboard, *kind, &parse_id(IdKind::Numeric, id)?).await,
        Command::Create { kind, sets, toggles } => {
            let editor = dashboard.editor(*kind);
            report_warnings(&editor.open_new().await?);
            apply_edits(&editor, sets, toggles).await?;
            submit(&editor).await
        }
        Command::Update { kind, id, sets, toggles } => {
            let id = parse_id(IdKind::Numeric, id)?;
            dashboard.refresh(&[*kind]).await;
            let editor = dashboard.editor(*kind);
            report_warnings(&editor.open_edit_by_id(&id).await?);
            apply_edits(&editor, sets, toggles).await?;
            submit(&editor).await
        }
        Command::Delete { kind, id } => {
            let report = dashboard.delete(*kind, &parse_id(IdKind::Numeric, id)?).await?;
            println!("Deleted");
            report_refresh(&report);
            Ok(())
        }
        Command::Download { task, out } => {
            let artifact = dashboard.download_task_files(&parse_id(IdKind::Token, task)?).await?;
            let path = artifact.save_into(out).await?;
            println!("Saved {} ({} bytes)", path.display(), artifact.bytes.len());
            Ok(())
        }
        Command::SubmitWork { task, description, files } => {
            let report = dashboard
                .submit_task_work(&parse_id(IdKind::Token, task)?, description, files)
                .await?;
            println!("Submitted {} file(s)", files.len());
            report_refresh(&report);
            Ok(())
        }
        Command::MyTasks => my_tasks(&dashboard).await,
        Command::MyProjects => my_projects(&dashboard).await,
        Command::Project { id } => project(&dashboard, &parse_id(IdKind::Numeric, id)?).await,
        Command::Profile => profile(&dashboard).await,
        Command::SaveConfig => Ok(()),
    }
}

impl Cli {
    fn command_name(&self) -> &'static str {
        match self.command {
            Command::List { .. } => "list",
            Command::Show { .. } => "show",
            Command::Create { .. } => "create",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
            Command::Download { .. } => "download",
            Command::SubmitWork { .. } => "submit-work",
            Command::MyTasks => "my-tasks",
            Command::MyProjects => "my-projects",
            Command::Project { .. } => "project",
            Command::Profile => "profile",
            Command::SaveConfig => "save-config",
        }
    }
}

fn parse_id(kind: IdKind, raw: &str) -> anyhow::Result<RecordId> {
    Ok(kind.parse(raw)?)
}

fn split_pair(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once('=')
        .map(|(field, value)| (field.trim(), value))
        .ok_or_else(|| anyhow!("expected FIELD=VALUE, got {}", raw))
}

// ========================
// Output
// ========================

fn report_warnings(warnings: &[FetchError]) {
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
}

fn report_refresh(report: &RefreshReport) {
    report_warnings(&report.failures);
}

fn label(record: &Value, kind: EntityKind) -> String {
    match record.get(kind.label_key()) {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

async fn refreshed(dashboard: &Dashboard, kinds: &[EntityKind]) -> anyhow::Result<()> {
    let report = dashboard.refresh(kinds).await;
    match report.failures.first() {
        Some(failure) => Err(anyhow!("{}", failure)),
        None => Ok(()),
    }
}

async fn list(dashboard: &Dashboard, kind: EntityKind) -> anyhow::Result<()> {
    refreshed(dashboard, &[kind]).await?;
    let store = dashboard.store().read().await;
    for record in store.records(kind) {
        let id = record.get("id").cloned().unwrap_or(Value::Null);
        println!("{}\t{}", id, label(record, kind));
    }
    Ok(())
}

async fn show(dashboard: &Dashboard, kind: EntityKind, id: &RecordId) -> anyhow::Result<()> {
    refreshed(dashboard, &[kind]).await?;
    let store = dashboard.store().read().await;
    let record = store
        .find_record(kind, id)
        .ok_or_else(|| anyhow!("{} {} not found", kind, id))?;
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

async fn apply_edits(editor: &Editor, sets: &[String], toggles: &[String]) -> anyhow::Result<()> {
    for raw in sets {
        let (field, value) = split_pair(raw)?;
        editor.set_text(field, value).await?;
    }
    for raw in toggles {
        let (field, id) = split_pair(raw)?;
        let checked = editor.toggle(field, id).await?;
        println!("{} {} {}", if checked { "+" } else { "-" }, field, id.trim());
    }
    Ok(())
}

async fn submit(editor: &Editor) -> anyhow::Result<()> {
    let report = editor.submit().await?;
    match &report.outcome {
        SubmitOutcome::Created(Some(data)) => println!("Created: {}", data),
        SubmitOutcome::Created(None) => println!("Created"),
        SubmitOutcome::Updated => println!("Updated"),
        SubmitOutcome::NothingToUpdate => println!("Nothing to update"),
    }
    if let Some(refresh) = &report.refresh {
        report_refresh(refresh);
    }
    Ok(())
}

async fn my_tasks(dashboard: &Dashboard) -> anyhow::Result<()> {
    let me = dashboard
        .acting_employee()
        .cloned()
        .ok_or_else(|| anyhow!("The token carries no Employee_Id claim"))?;
    refreshed(dashboard, &[EntityKind::Task]).await?;

    let store = dashboard.store().read().await;
    let board = TaskBoard::for_employee(&store.tasks, &me);
    println!("Pending ({})", board.pending.len());
    for task in &board.pending {
        println!("  {}\t{}\t{}", task.task_unique_identifier, task.title, task.dead_line.as_deref().unwrap_or("-"));
    }
    println!("Submitted ({})", board.submitted.len());
    for task in &board.submitted {
        println!("  {}\t{}", task.task_unique_identifier, task.title);
    }
    Ok(())
}

async fn my_projects(dashboard: &Dashboard) -> anyhow::Result<()> {
    let projects = dashboard.my_projects().await?;
    if projects.is_empty() {
        println!("No projects");
    }
    for (project, progress) in &projects {
        println!("{}\t{}\t{:.0}%", project.id, project.name, progress.percent());
    }
    Ok(())
}

async fn project(dashboard: &Dashboard, id: &RecordId) -> anyhow::Result<()> {
    let details = dashboard.project_details(id).await?;
    let project = &details.project;

    println!("{}", project.name);
    if !project.description.is_empty() {
        println!("{}", project.description);
    }
    println!("Department: {}", details.department_name.as_deref().unwrap_or("-"));
    println!("Team: {}", project.team_members.join(", "));
    if details.tasks.is_empty() {
        println!("No tasks available");
    }
    for line in &details.tasks {
        let mark = if line.has_files() { "x" } else { " " };
        println!("  [{}] {}\t{}", mark, line.task_uid, line.title.as_deref().unwrap_or("(unknown task)"));
    }
    Ok(())
}

async fn profile(dashboard: &Dashboard) -> anyhow::Result<()> {
    let me = dashboard.profile().await?;
    let day = |date: &Option<String>| date.as_deref().map(|d| d.chars().take(10).collect::<String>());

    println!("{}", me.display_name());
    println!("Email: {}", me.email);
    println!("Phone: {}", me.phone);
    println!("Address: {}", me.address);
    println!("Birth date: {}", day(&me.birth_date).unwrap_or_else(|| "-".to_string()));
    println!("Hire date: {}", day(&me.hire_date).unwrap_or_else(|| "-".to_string()));
    println!("Roles: {}", me.roles.join(", "));
    Ok(())
}
