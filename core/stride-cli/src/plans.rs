//! `stride plans ...`: edits `plans.json` through the core plan store, so
//! validation and id assignment match what the app does.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use clap::{ArgGroup, Args, Subcommand};
use fs_err as fs;
use stride_core::plans::plan_applies_now;
use stride_core::{
    BlockingPlan, Criterion, DistanceUnit, PlanDraft, PlanDuration, PlanStore, StorageConfig,
    Weekday,
};

use crate::CliError;

#[derive(Subcommand)]
pub enum PlanCommand {
    /// List every stored plan (`*` marks plans blocking right now)
    List,

    /// Print one plan as JSON
    Show { id: String },

    /// Create a plan
    Add(AddArgs),

    /// Copy a plan; the copy starts paused
    Duplicate { id: String },

    /// Pause a plan
    Pause { id: String },

    /// Resume a paused plan
    Resume { id: String },

    /// Delete a plan
    Delete { id: String },

    /// Write every plan to a JSON file
    Export {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Create plans from a file written by `export` (ids are reassigned)
    Import {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("goal")
        .required(true)
        .args(["km", "miles", "minutes", "permanent"])
))]
pub struct AddArgs {
    #[arg(long)]
    name: String,

    /// Comma-separated weekdays (mon,tue,...); every day when omitted
    #[arg(long, value_delimiter = ',', value_parser = parse_weekday)]
    days: Vec<Weekday>,

    /// Distance goal in kilometers
    #[arg(long)]
    km: Option<f64>,

    /// Distance goal in miles
    #[arg(long)]
    miles: Option<f64>,

    /// Time goal in minutes
    #[arg(long)]
    minutes: Option<f64>,

    /// Block until the end of the day regardless of activity
    #[arg(long)]
    permanent: bool,

    /// Blocking window; all day when omitted
    #[arg(long, value_name = "HH:MM-HH:MM")]
    window: Option<String>,

    /// App package id to block (repeatable)
    #[arg(long = "block", value_name = "APP_ID")]
    blocked_apps: Vec<String>,

    /// Create the plan paused
    #[arg(long)]
    paused: bool,
}

impl AddArgs {
    fn into_draft(self) -> Result<PlanDraft, CliError> {
        let criterion = match (self.km, self.miles, self.minutes) {
            (Some(value), _, _) => Criterion::Distance {
                value,
                unit: DistanceUnit::Kilometers,
            },
            (_, Some(value), _) => Criterion::Distance {
                value,
                unit: DistanceUnit::Miles,
            },
            (_, _, Some(minutes)) => Criterion::Time { minutes },
            _ => Criterion::Permanent,
        };

        let duration = match self.window.as_deref() {
            None => PlanDuration::AllDay,
            Some(window) => {
                let (from, to) = window.split_once('-').ok_or_else(|| {
                    CliError::InvalidArgument(format!("window must be HH:MM-HH:MM, got {window}"))
                })?;
                PlanDuration::SpecificHours {
                    from: from.trim().to_string(),
                    to: to.trim().to_string(),
                }
            }
        };

        let days = if self.days.is_empty() {
            Weekday::ALL.to_vec()
        } else {
            self.days
        };

        Ok(PlanDraft {
            name: self.name,
            days,
            duration,
            criterion,
            blocked_apps: self.blocked_apps,
            active: !self.paused,
        })
    }
}

fn parse_weekday(value: &str) -> Result<Weekday, String> {
    Weekday::parse(value).ok_or_else(|| format!("unknown weekday: {value}"))
}

pub fn run(
    storage: &StorageConfig,
    command: PlanCommand,
    now: NaiveDateTime,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut store = PlanStore::load(&storage.plans_file());

    match command {
        PlanCommand::List => {
            if store.plans().is_empty() {
                writeln!(out, "No plans.")?;
            }
            for plan in store.plans() {
                writeln!(out, "{}", describe(plan, now))?;
            }
        }
        PlanCommand::Show { id } => {
            let plan = store
                .get(&id)
                .ok_or_else(|| CliError::InvalidArgument(format!("no plan with id {id}")))?;
            serde_json::to_writer_pretty(&mut *out, plan)?;
            writeln!(out)?;
        }
        PlanCommand::Add(args) => {
            let plan = store.create(args.into_draft()?)?;
            tracing::info!(id = %plan.id, name = %plan.name, "Plan created from CLI");
            writeln!(out, "Created {}", plan.id)?;
        }
        PlanCommand::Duplicate { id } => {
            let plan = store.duplicate(&id)?;
            writeln!(out, "Created {} (paused)", plan.id)?;
        }
        PlanCommand::Pause { id } => {
            let plan = store.set_active(&id, false)?;
            writeln!(out, "Paused {}", plan.name)?;
        }
        PlanCommand::Resume { id } => {
            let plan = store.set_active(&id, true)?;
            writeln!(out, "Resumed {}", plan.name)?;
        }
        PlanCommand::Delete { id } => {
            store.delete(&id)?;
            writeln!(out, "Deleted {id}")?;
        }
        PlanCommand::Export { path } => {
            export(store.plans(), &path)?;
            writeln!(out, "Exported {} plan(s)", store.plans().len())?;
        }
        PlanCommand::Import { path } => {
            let count = import(&mut store, &path)?;
            writeln!(out, "Imported {count} plan(s)")?;
        }
    }
    Ok(())
}

fn export(plans: &[BlockingPlan], path: &Path) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(plans)?;
    fs::write(path, json)?;
    Ok(())
}

/// Every plan is validated before anything is written, so a bad file leaves
/// the store untouched.
fn import(store: &mut PlanStore, path: &Path) -> Result<usize, CliError> {
    let content = fs::read_to_string(path)?;
    let plans: Vec<BlockingPlan> = serde_json::from_str(&content)?;
    let drafts: Vec<PlanDraft> = plans.iter().map(PlanDraft::from).collect();
    for draft in &drafts {
        stride_core::plans::validate_plan(draft)?;
    }

    for draft in drafts {
        store.create(draft)?;
    }
    tracing::info!(count = plans.len(), path = %path.display(), "Plans imported");
    Ok(plans.len())
}

fn describe(plan: &BlockingPlan, now: NaiveDateTime) -> String {
    let marker = if plan_applies_now(plan, now) && !plan.blocked_apps.is_empty() {
        '*'
    } else {
        ' '
    };
    let status = if plan.active { "active" } else { "paused" };
    let days = if plan.days.len() == Weekday::ALL.len() {
        "every day".to_string()
    } else {
        plan.days
            .iter()
            .map(|day| &day.name()[..3])
            .collect::<Vec<_>>()
            .join(",")
    };
    let window = match &plan.duration {
        PlanDuration::AllDay => "all day".to_string(),
        PlanDuration::SpecificHours { from, to } => format!("{from}-{to}"),
    };
    format!(
        "{marker} {}  {status:<6}  {}  [{}]  {days}, {window}  blocks {} app(s)",
        plan.id,
        plan.name,
        describe_criterion(&plan.criterion),
        plan.blocked_apps.len()
    )
}

fn describe_criterion(criterion: &Criterion) -> String {
    match criterion {
        Criterion::Distance {
            value,
            unit: DistanceUnit::Kilometers,
        } => format!("{value} km"),
        Criterion::Distance {
            value,
            unit: DistanceUnit::Miles,
        } => format!("{value} mi"),
        Criterion::Time { minutes } => format!("{minutes} min"),
        Criterion::Permanent => "permanent".to_string(),
    }
}
