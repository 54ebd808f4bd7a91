//! CLI commands for equity administration.
//!
//! Each invocation runs exactly one command against the loaded state and
//! reports whether the state changed so the caller knows to save.

use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use std::fmt::Write as _;
use std::path::PathBuf;

use equity_ledger::{
    Advisory, EmployeeId, EmployeeStatus, EquityAdmin, GrantIssued, PlanUpsertKind,
};

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// (Re)initialize the stock pool with a total capacity
    Init {
        /// Total shares in the pool
        #[arg(short, long)]
        total: u64,
    },

    /// Manage level standards
    #[command(subcommand)]
    Level(LevelCommands),

    /// Manage the headcount plan
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Manage employees
    #[command(subcommand)]
    Employee(EmployeeCommands),

    /// Move a pending hire to active and issue the standard grant
    Hire {
        /// Employee id (E001 or 1)
        id: EmployeeId,
    },

    /// Record a departure and reclaim unvested shares
    Depart(DepartArgs),

    /// Move an active employee to a new level
    Promote {
        /// Employee id (E001 or 1)
        id: EmployeeId,
        /// New level code
        level: String,
    },

    /// Show pool usage, projections and advisories
    Report {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent pool transactions
    Ledger {
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// Write a snapshot of the whole state to a JSON file
    Export {
        /// Output file
        file: PathBuf,
    },

    /// Replace the whole state from a JSON snapshot file
    Import {
        /// Input file
        file: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum LevelCommands {
    /// Insert or overwrite a level standard
    Set {
        level: String,
        shares: u64,
    },
    /// Delete a level standard
    Delete { level: String },
    /// List level standards
    List,
}

#[derive(Debug, Subcommand)]
pub enum PlanCommands {
    /// Insert or replace a (department, level, year) entry
    Upsert {
        #[arg(short, long)]
        department: String,
        #[arg(short, long)]
        level: String,
        /// Planned hires (at least 1)
        #[arg(short, long)]
        count: u32,
        #[arg(short, long)]
        year: i32,
    },
    /// List plan entries
    List,
}

#[derive(Debug, Subcommand)]
pub enum EmployeeCommands {
    /// Register an employee
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        department: String,
        #[arg(short, long)]
        level: String,
        /// Register directly as active (issues the standard grant)
        #[arg(long)]
        active: bool,
    },
    /// List employees
    List {
        /// Only show employees with this status (pending_hire, active, departed)
        #[arg(short, long)]
        status: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct DepartArgs {
    /// Employee id (E001 or 1)
    pub id: EmployeeId,
    /// Reason for leaving
    #[arg(short, long)]
    pub reason: String,
    /// Leave date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    pub date: Option<NaiveDate>,
}

/// Text to print plus whether the state needs saving.
#[derive(Debug)]
pub struct CommandOutput {
    pub text: String,
    pub mutated: bool,
}

impl CommandOutput {
    fn changed(text: String) -> Self {
        Self { text, mutated: true }
    }

    fn read_only(text: String) -> Self {
        Self {
            text,
            mutated: false,
        }
    }
}

/// Execute a command against the state.
pub async fn execute_command(
    admin: &mut EquityAdmin,
    command: Commands,
) -> anyhow::Result<CommandOutput> {
    let output = match command {
        Commands::Init { total } => {
            let init = admin.initialize_pool(total)?;
            let mut text = format!("Pool initialized with {} shares", init.total_capacity);
            if init.carried_over > 0 {
                let _ = write!(
                    text,
                    "\n{} shares carried over from active grants",
                    init.carried_over
                );
            }
            let _ = write!(text, "\nBalance: {}", init.balance);
            CommandOutput::changed(text)
        }

        Commands::Level(cmd) => execute_level(admin, cmd)?,
        Commands::Plan(cmd) => execute_plan(admin, cmd)?,
        Commands::Employee(cmd) => execute_employee(admin, cmd)?,

        Commands::Hire { id } => {
            let outcome = admin.process_hire(id)?;
            let mut text = format!("Hired {}", outcome.employee_id);
            push_grant(&mut text, outcome.grant.as_ref());
            push_advisories(&mut text, &outcome.advisories);
            let _ = write!(text, "\nBalance: {}", outcome.balance);
            CommandOutput::changed(text)
        }

        Commands::Depart(args) => {
            let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
            let outcome = admin.process_departure(args.id, date, &args.reason)?;
            let text = format!(
                "{} departed on {date}\nTerminated {} grant(s), reclaimed {} shares\nBalance: {}",
                outcome.employee_id,
                outcome.terminated.len(),
                outcome.reclaimed,
                outcome.balance
            );
            CommandOutput::changed(text)
        }

        Commands::Promote { id, level } => {
            let outcome = admin.process_promotion(id, &level)?;
            let mut text = format!(
                "Promoted {} from {} to {}",
                outcome.employee_id, outcome.from_level, outcome.to_level
            );
            push_grant(&mut text, outcome.grant.as_ref());
            push_advisories(&mut text, &outcome.advisories);
            let _ = write!(text, "\nBalance: {}", outcome.balance);
            CommandOutput::changed(text)
        }

        Commands::Report { json } => {
            let report = admin.report();
            if json {
                CommandOutput::read_only(serde_json::to_string_pretty(&report)?)
            } else {
                CommandOutput::read_only(render_report(&report))
            }
        }

        Commands::Ledger { count } => {
            let mut text = format!(
                "{:>5}  {:<20}  {:<10}  {:>10}  {:>12}  DESCRIPTION",
                "SEQ", "TIMESTAMP", "KIND", "DELTA", "BALANCE"
            );
            for tx in admin.pool().recent(count) {
                let _ = write!(
                    text,
                    "\n{:>5}  {:<20}  {:<10}  {:>+10}  {:>12}  {}",
                    tx.seq,
                    tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    tx.kind.as_str(),
                    tx.delta,
                    tx.balance_after,
                    tx.description
                );
            }
            CommandOutput::read_only(text)
        }

        Commands::Export { file } => {
            let snapshot = admin.export_snapshot();
            tokio::fs::write(&file, snapshot.to_json_pretty()?).await?;
            CommandOutput::read_only(format!(
                "Exported {} employees and {} grants to {}",
                snapshot.employees.len(),
                snapshot.grants.len(),
                file.display()
            ))
        }

        Commands::Import { file } => {
            let json = tokio::fs::read_to_string(&file).await?;
            admin.import_json(&json)?;
            CommandOutput::changed(format!(
                "Imported {} employees and {} grants from {}\nBalance: {}",
                admin.employees().len(),
                admin.grants().len(),
                file.display(),
                admin.pool().balance()
            ))
        }
    };

    Ok(output)
}

fn execute_level(admin: &mut EquityAdmin, cmd: LevelCommands) -> anyhow::Result<CommandOutput> {
    Ok(match cmd {
        LevelCommands::Set { level, shares } => {
            let previous = admin.set_level_standard(&level, shares)?;
            let text = match previous {
                Some(old) => format!("Level {level}: {old} -> {shares} shares"),
                None => format!("Level {level}: {shares} shares"),
            };
            CommandOutput::changed(text)
        }
        LevelCommands::Delete { level } => {
            let removed = admin.delete_level_standard(&level)?;
            CommandOutput::changed(format!("Deleted level {level} ({removed} shares)"))
        }
        LevelCommands::List => {
            let mut text = format!("{:<8}  {:>12}", "LEVEL", "SHARES");
            for standard in admin.level_standards() {
                let _ = write!(text, "\n{:<8}  {:>12}", standard.level, standard.shares);
            }
            CommandOutput::read_only(text)
        }
    })
}

fn execute_plan(admin: &mut EquityAdmin, cmd: PlanCommands) -> anyhow::Result<CommandOutput> {
    Ok(match cmd {
        PlanCommands::Upsert {
            department,
            level,
            count,
            year,
        } => {
            let outcome = admin.upsert_headcount_plan(&department, &level, count, year)?;
            let verb = match outcome.upsert {
                PlanUpsertKind::Inserted => "Added",
                PlanUpsertKind::Replaced => "Updated",
            };
            CommandOutput::changed(format!(
                "{verb} plan {department}/{level}/{year}: {count} hires\nPlan requires {} shares",
                outcome.required_shares
            ))
        }
        PlanCommands::List => {
            let mut text = format!(
                "{:<16}  {:<8}  {:>6}  {:>5}  {:>12}",
                "DEPARTMENT", "LEVEL", "YEAR", "COUNT", "SHARES"
            );
            for entry in admin.headcount_plan() {
                let shares = admin.entry_required_shares(entry);
                let _ = write!(
                    text,
                    "\n{:<16}  {:<8}  {:>6}  {:>5}  {:>12}",
                    entry.department, entry.level, entry.year, entry.planned_count, shares
                );
            }
            let _ = write!(text, "\nTotal required: {}", admin.required_shares());
            CommandOutput::read_only(text)
        }
    })
}

fn execute_employee(
    admin: &mut EquityAdmin,
    cmd: EmployeeCommands,
) -> anyhow::Result<CommandOutput> {
    Ok(match cmd {
        EmployeeCommands::Add {
            name,
            department,
            level,
            active,
        } => {
            let status = if active {
                EmployeeStatus::Active
            } else {
                EmployeeStatus::PendingHire
            };
            let outcome = admin.add_employee(&name, &department, &level, status)?;
            let mut text = format!("Added {} ({name}) as {}", outcome.employee_id, outcome.status);
            push_grant(&mut text, outcome.grant.as_ref());
            push_advisories(&mut text, &outcome.advisories);
            let _ = write!(text, "\nBalance: {}", outcome.balance);
            CommandOutput::changed(text)
        }
        EmployeeCommands::List { status } => {
            let filter = status.as_deref().map(parse_status).transpose()?;
            let mut text = format!(
                "{:<6}  {:<20}  {:<16}  {:<6}  {:<12}  {:>10}",
                "ID", "NAME", "DEPARTMENT", "LEVEL", "STATUS", "GRANTED"
            );
            for employee in admin
                .employees()
                .into_iter()
                .filter(|e| filter.map_or(true, |s| e.status == s))
            {
                let granted: u64 = admin
                    .grants_for(employee.id)
                    .iter()
                    .map(|g| g.granted_shares)
                    .sum();
                let _ = write!(
                    text,
                    "\n{:<6}  {:<20}  {:<16}  {:<6}  {:<12}  {:>10}",
                    employee.id.to_string(),
                    employee.name,
                    employee.department,
                    employee.level,
                    employee.status.as_str(),
                    granted
                );
            }
            CommandOutput::read_only(text)
        }
    })
}

fn parse_status(s: &str) -> anyhow::Result<EmployeeStatus> {
    match s.to_ascii_lowercase().as_str() {
        "pending_hire" | "pending" => Ok(EmployeeStatus::PendingHire),
        "active" => Ok(EmployeeStatus::Active),
        "departed" => Ok(EmployeeStatus::Departed),
        other => anyhow::bail!("unknown status: {other}"),
    }
}

fn push_grant(text: &mut String, grant: Option<&GrantIssued>) {
    if let Some(grant) = grant {
        let _ = write!(text, "\nGrant {}: {} shares", grant.grant_id, grant.shares);
    }
}

fn push_advisories(text: &mut String, advisories: &[Advisory]) {
    for advisory in advisories {
        let _ = write!(text, "\nWarning: {advisory}");
    }
}

fn render_report(report: &equity_ledger::Report) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Pool total:      {:>12}", report.total_capacity);
    let _ = writeln!(text, "Used:            {:>12}", report.current_usage);
    let _ = writeln!(text, "Balance:         {:>12}", report.balance);
    let _ = writeln!(text, "Usage rate:      {:>11.1}%", report.usage_rate * 100.0);
    let _ = writeln!(text, "Plan requires:   {:>12}", report.required_shares);
    match report.sustainable_months {
        Some(months) => {
            let _ = writeln!(text, "Sustainable for: {:>9.1} months", months);
        }
        None => {
            let _ = writeln!(text, "Sustainable for:          n/a");
        }
    }
    let _ = writeln!(
        text,
        "Headcount:       {} active, {} pending, {} departed",
        report.headcount.active, report.headcount.pending_hire, report.headcount.departed
    );

    if !report.departments.is_empty() {
        let _ = writeln!(text, "\n{:<16}  {:>9}  {:>12}", "DEPARTMENT", "HEADCOUNT", "GRANTED");
        for dept in &report.departments {
            let _ = writeln!(
                text,
                "{:<16}  {:>9}  {:>12}",
                dept.department, dept.active_headcount, dept.active_granted
            );
        }
    }

    for advisory in report.advisories() {
        let _ = writeln!(text, "\nWarning: {advisory}");
    }
    text.trim_end().to_string()
}
