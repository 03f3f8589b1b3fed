use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod attendance;
mod colors;
mod config;
mod conflicts;
mod error;
mod mailer;
mod models;
mod months;
mod report;
mod session;
mod sheets;
mod smtp;

use config::Settings;
use error::DashboardError;
use mailer::{Attachment, Dispatch, DispatchFailure, RecipientDirectory};
use models::ScheduleTable;
use session::Session;

#[derive(Parser)]
#[command(name = "calendario")]
#[command(about = "Smart-working calendar: schedule view, attendance and email delivery", long_about = None)]
struct Cli {
    /// JSON secrets file
    #[arg(long, env = "CALENDARIO_CONFIG", default_value = "secrets.json")]
    config: PathBuf,
    /// Overrides the sheet URL from the secrets file
    #[arg(long, env = "SHEET_URL")]
    sheet_url: Option<String>,
    /// Shared access phrase
    #[arg(long, env = "CALENDARIO_PASSPHRASE", hide_env_values = true)]
    passphrase: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the months that can be selected
    Months,
    /// Render the schedule of one month as an HTML page
    Show {
        #[arg(long)]
        month: Option<String>,
        /// Extra conflict days, comma-separated
        #[arg(long, default_value = "")]
        manual_days: String,
        #[arg(long, default_value = "calendario.html")]
        out: PathBuf,
    },
    /// Home/office attendance per person
    Stats {
        #[arg(long)]
        month: Option<String>,
        /// First month of the range (inclusive)
        #[arg(long, requires = "to", conflicts_with = "month")]
        from: Option<String>,
        /// Last month of the range (inclusive)
        #[arg(long, requires = "from", conflicts_with = "month")]
        to: Option<String>,
    },
    /// Email the schedule of one month
    Send(SendArgs),
}

#[derive(Args)]
struct SendArgs {
    #[arg(long)]
    month: Option<String>,
    /// Recipient name from the directory; repeatable
    #[arg(long = "to")]
    names: Vec<String>,
    /// Additional addresses, comma-separated
    #[arg(long, default_value = "")]
    extra: String,
    /// Extra conflict days, comma-separated
    #[arg(long, default_value = "")]
    manual_days: String,
}

/// The loaded sheet and the month column found in it, if any.
struct Schedule {
    table: ScheduleTable,
    month_column: Option<String>,
}

impl Schedule {
    /// Fetches the sheet; refused unless the session has been unlocked.
    async fn load(
        session: &Session,
        settings: &Settings,
        sheet_url: &str,
    ) -> anyhow::Result<Self> {
        session.ensure_unlocked()?;
        let table = sheets::load_schedule(&settings.gcp_service_account, sheet_url).await?;
        Ok(Self::new(table))
    }

    fn new(table: ScheduleTable) -> Self {
        let month_column = match months::resolve_month_column(&table) {
            Ok(column) => Some(column),
            Err(err) => {
                warn!(error = %err, "showing the whole sheet without month filtering");
                None
            }
        };
        Self {
            table,
            month_column,
        }
    }

    /// Rows of the requested month, or of the default one; the whole sheet without a month column.
    fn month_view(
        &self,
        requested: Option<&str>,
        today: NaiveDate,
    ) -> anyhow::Result<(ScheduleTable, Option<String>)> {
        let Some(column) = self.month_column.as_deref() else {
            return Ok((self.table.clone(), None));
        };

        let choices = months::selectable_months(&self.table, column, today);
        if choices.fell_back {
            eprintln!("No month from the current one onwards; offering every month.");
        }

        let month = match requested {
            Some(month) => {
                if !choices.months.iter().any(|m| m == month) {
                    return Err(DashboardError::Validation(format!(
                        "month {month} is not selectable; choose one of: {}",
                        choices.months.join(", ")
                    ))
                    .into());
                }
                month.to_string()
            }
            None => match choices.default_month() {
                Some(month) => month.to_string(),
                None => return Ok((self.table.clone(), None)),
            },
        };

        Ok((months::filter_month(&self.table, column, &month), Some(month)))
    }

    fn day_columns(&self, view: &ScheduleTable) -> Vec<usize> {
        view.day_columns(self.month_column.as_deref())
    }
}

fn month_label(month: Option<&str>) -> String {
    month
        .map(months::italian_label)
        .unwrap_or_else(|| "questo mese".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)?;

    let mut session = Session::default();
    session.unlock(&settings.magic_word, &cli.passphrase)?;

    let sheet_url = cli
        .sheet_url
        .clone()
        .or_else(|| settings.sheet_url.clone())
        .context("no sheet URL: set sheet_url in the secrets file or pass --sheet-url")?;

    let schedule = Schedule::load(&session, &settings, &sheet_url).await?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Months => {
            let Some(column) = schedule.month_column.as_deref() else {
                println!("The sheet has no month column.");
                return Ok(());
            };
            let choices = months::selectable_months(&schedule.table, column, today);
            if choices.fell_back {
                println!("No month from the current one onwards; showing every month.");
            }
            for month in &choices.months {
                println!("{month} ({})", months::italian_label(month));
            }
        }
        Commands::Show {
            month,
            manual_days,
            out,
        } => {
            let (view, month) = schedule.month_view(month.as_deref(), today)?;
            let days = schedule.day_columns(&view);
            let conflict_days = conflicts::merge_conflicts(
                &conflicts::detect_conflicts(&view, &days),
                &manual_days,
            );
            let stats = attendance::aggregate_attendance(&view, &days);

            let page = report::build_page(
                &view,
                schedule.month_column.as_deref(),
                &month_label(month.as_deref()),
                &conflict_days,
                &stats,
            );
            std::fs::write(&out, page)
                .with_context(|| format!("failed to write {}", out.display()))?;

            if !conflict_days.is_empty() {
                println!(
                    "Warning: nobody is home on days {}.",
                    conflicts::format_days(&conflict_days)
                );
            }
            println!("Schedule written to {}.", out.display());
        }
        Commands::Stats { month, from, to } => {
            let view = match (from, to, schedule.month_column.as_deref()) {
                (Some(from), Some(to), Some(column)) => {
                    months::select_range(&schedule.table, column, &from, &to)?
                }
                (Some(_), Some(_), None) => {
                    eprintln!("No month column; statistics cover the whole sheet.");
                    schedule.table.clone()
                }
                _ => schedule.month_view(month.as_deref(), today)?.0,
            };
            let stats = attendance::aggregate_attendance(&view, &schedule.day_columns(&view));

            if stats.is_empty() {
                println!("No rows in this range.");
                return Ok(());
            }

            println!("Attendance (home / office):");
            for stat in &stats {
                println!(
                    "- {}: {} home, {} office, {:.1}% home",
                    stat.person, stat.home_days, stat.office_days, stat.home_percentage
                );
            }
        }
        Commands::Send(args) => {
            let (view, month) = schedule.month_view(args.month.as_deref(), today)?;
            let month_column = schedule.month_column.as_deref();
            let days = schedule.day_columns(&view);
            let conflict_days = conflicts::merge_conflicts(
                &conflicts::detect_conflicts(&view, &days),
                &args.manual_days,
            );

            let directory = RecipientDirectory::new(settings.recipient_emails.clone());
            let recipients = directory.select(&args.names, &args.extra)?;
            if recipients.is_empty() {
                let names: Vec<&str> = directory.names().collect();
                println!("Select or enter at least one email address.");
                if !names.is_empty() {
                    println!("Directory: {}", names.join(", "));
                }
                return Ok(());
            }
            println!("Sending to: {}", recipients.join(", "));

            let label = month_label(month.as_deref());
            let body = report::build_email_body(
                &label,
                &conflict_days,
                &report::build_email_table(&view, month_column),
            );
            let attachment = Attachment {
                filename: report::ATTACHMENT_NAME.to_string(),
                content: report::build_csv(&view, month_column)?,
            };

            let mut transport = smtp::SmtpMailer::new(settings.email.clone());
            let outcome = mailer::dispatch(
                &mut transport,
                Dispatch {
                    recipients: &recipients,
                    subject: &report::email_subject(&label),
                    html_template: &body,
                    attachment: Some(attachment),
                    directory: &directory,
                },
            )
            .await;

            match &outcome.failure {
                None => println!("{}", outcome.summary),
                Some(DispatchFailure::Connection(cause)) => {
                    println!("Could not open the mail session: {cause}")
                }
                Some(_) => println!("Sending failed: {}", outcome.summary),
            }

            if outcome.has_details() || !outcome.is_success() {
                if !outcome.successful.is_empty() {
                    println!("Delivered:");
                    for address in &outcome.successful {
                        println!("  - {address}");
                    }
                }
                if !outcome.failed.is_empty() {
                    println!("Failed:");
                    for failure in &outcome.failed {
                        println!("  - {failure}");
                    }
                }
                if !outcome.invalid.is_empty() {
                    println!("Invalid addresses:");
                    for address in &outcome.invalid {
                        println!("  - {address}");
                    }
                }
            }
        }
    }

    Ok(())
}
