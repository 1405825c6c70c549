use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use farm_records::{
    config::{self, AppConfig},
    db::{self, DbPool},
    prelude::*,
    seed::{self, SeedReport},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize(&cli.command).await?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&context.db)
                .await
                .context("failed to apply migrations")?;
            if !cli.json {
                println!("Schema is up to date");
            }
        }
        Commands::Seed => {
            let report = seed::load_fixtures(context.db.as_ref())
                .await
                .context("failed to load seed fixtures")?;
            render_seed(&report, cli.json)?;
        }
        Commands::Summary => {
            let summary = context.records.summary().await?;
            if cli.json {
                print_json(&summary)?;
            } else {
                for table in &summary.tables {
                    println!("{:<18} {:>6}", table.kind.table_name(), table.rows);
                }
                println!("{:<18} {:>6}", "total", summary.total);
            }
        }
        Commands::List(args) => {
            let page = list_records(&context.records, &args).await?;
            if cli.json {
                print_json(&page)?;
            } else {
                println!(
                    "{} page {}/{} ({} total)",
                    args.kind.table_name(),
                    page.page,
                    page.total_pages.max(1),
                    page.total
                );
                for item in &page.items {
                    println!("- {}", serde_json::to_string(item)?);
                }
            }
        }
        Commands::Show(args) => {
            let record = show_record(&context.records, args.kind, args.id).await?;
            if cli.json {
                print_json(&record)?;
            } else {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }
        Commands::Dependents(args) => {
            let report = context.records.dependents(args.kind, args.id).await?;
            if cli.json {
                print_json(&report)?;
            } else {
                println!("{} {} owns {} rows", args.kind, args.id, report.total());
                render_counts(&report);
            }
        }
        Commands::Delete(args) => {
            let report = if args.restrict {
                context.records.delete_restricted(args.kind, args.id).await?
            } else {
                context.records.delete(args.kind, args.id).await?
            };
            if cli.json {
                print_json(&report)?;
            } else {
                println!("Deleted {} {} ({} rows removed)", args.kind, args.id, report.total());
                render_counts(&report);
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "farm-records", about = "Farm records store maintenance and inspection", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Load the reference fixture set (safe to repeat)
    Seed,
    /// Row counts per table
    Summary,
    /// List records of one kind
    List(ListArgs),
    /// Show a single record
    Show(RecordArgs),
    /// Count the rows a delete would cascade to
    Dependents(RecordArgs),
    /// Delete a record and everything it owns
    Delete(DeleteArgs),
}

#[derive(Args)]
struct ListArgs {
    #[arg(help = "Record kind, e.g. field or field_operation")]
    kind: RecordKind,
    #[arg(long, help = "Only records owned by this parent id")]
    parent: Option<i32>,
    #[arg(long, default_value_t = 1)]
    page: u64,
    #[arg(long, default_value_t = 20)]
    limit: u64,
    #[arg(long, action = ArgAction::SetTrue, help = "Newest first")]
    desc: bool,
}

#[derive(Args)]
struct RecordArgs {
    kind: RecordKind,
    id: i32,
}

#[derive(Args)]
struct DeleteArgs {
    kind: RecordKind,
    id: i32,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Refuse the delete while other records depend on it"
    )]
    restrict: bool,
}

struct CliContext {
    db: Arc<DbPool>,
    records: FarmRecords,
}

impl CliContext {
    async fn initialize(command: &Commands) -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        db::check_connection(&db_pool)
            .await
            .context("database did not answer")?;
        let db = Arc::new(db_pool);

        Self::prepare(&config, &db, command).await?;

        let records = FarmRecords::new(db.clone());
        Ok(Self { db, records })
    }

    /// Startup migrations and seeding as configured.
    async fn prepare(config: &AppConfig, db: &DbPool, command: &Commands) -> Result<()> {
        if config.auto_migrate && !matches!(command, Commands::Migrate) {
            db::run_migrations(db)
                .await
                .context("failed running startup migrations")?;
        }
        if config.seed_on_startup && config.is_production() {
            warn!("seed_on_startup is ignored in production; run `farm-records seed` explicitly");
        }
        if config.seeds_on_startup() && !matches!(command, Commands::Seed) {
            let report = seed::load_fixtures(db).await?;
            if !report.is_clean() {
                warn!(failed = report.failed.len(), "Startup seed rejected some rows");
            }
            info!(inserted = report.inserted, "Startup seed complete");
        }
        Ok(())
    }
}

async fn list_records(records: &FarmRecords, args: &ListArgs) -> Result<Paginated<Value>> {
    let mut query = ListQuery::new(args.page, args.limit);
    if args.desc {
        query = query.descending();
    }
    let parent = args.parent;
    if parent.is_some() && args.kind.owners().is_empty() {
        warn!(kind = %args.kind, "--parent ignored: this record kind has no owner");
    }

    match args.kind {
        RecordKind::Enterprise => to_values(
            records
                .enterprises
                .list(EnterpriseFilter::default(), &query)
                .await?,
        ),
        RecordKind::Crop => to_values(records.crops.list(CropFilter::default(), &query).await?),
        RecordKind::Field => {
            let filter = FieldFilter {
                enterprise_id: parent,
                ..Default::default()
            };
            to_values(records.fields.list(filter, &query).await?)
        }
        RecordKind::Employee => {
            let filter = EmployeeFilter {
                enterprise_id: parent,
                ..Default::default()
            };
            to_values(records.employees.list(filter, &query).await?)
        }
        RecordKind::Planting => {
            let filter = PlantingFilter {
                field_id: parent,
                ..Default::default()
            };
            to_values(records.plantings.list(filter, &query).await?)
        }
        RecordKind::Harvest => {
            let filter = HarvestFilter {
                planting_id: parent,
                ..Default::default()
            };
            to_values(records.harvests.list(filter, &query).await?)
        }
        RecordKind::FieldOperation => {
            let filter = FieldOperationFilter {
                field_id: parent,
                ..Default::default()
            };
            to_values(records.field_operations.list(filter, &query).await?)
        }
    }
}

async fn show_record(records: &FarmRecords, kind: RecordKind, id: i32) -> Result<Value> {
    let value = match kind {
        RecordKind::Enterprise => serde_json::to_value(records.enterprises.get(id).await?)?,
        RecordKind::Field => serde_json::to_value(records.fields.get(id).await?)?,
        RecordKind::Crop => serde_json::to_value(records.crops.get(id).await?)?,
        RecordKind::Planting => serde_json::to_value(records.plantings.get(id).await?)?,
        RecordKind::Harvest => serde_json::to_value(records.harvests.get(id).await?)?,
        RecordKind::FieldOperation => {
            serde_json::to_value(records.field_operations.get(id).await?)?
        }
        RecordKind::Employee => serde_json::to_value(records.employees.get(id).await?)?,
    };
    Ok(value)
}

fn to_values<T: Serialize>(page: Paginated<T>) -> Result<Paginated<Value>> {
    let items = page
        .items
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Paginated {
        items,
        total: page.total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages,
    })
}

fn render_seed(report: &SeedReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }
    println!(
        "Seed: {} inserted, {} already present, {} failed",
        report.inserted,
        report.skipped,
        report.failed.len()
    );
    for failure in &report.failed {
        println!("  {} {}: {}", failure.kind, failure.id, failure.reason);
    }
    Ok(())
}

fn render_counts(report: &CascadeReport) {
    for (kind, rows) in report.tables() {
        println!("  {:<18} {:>6}", kind.table_name(), rows);
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
