use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod config;
mod db;
mod error;
mod import;
mod logging;
mod models;
mod normalize;
mod report;
mod workbook;

use crate::models::{NewScholarship, RenewalStatus, SCHOLARSHIP_TYPES};

#[derive(Parser)]
#[command(name = "scholarship-ledger")]
#[command(about = "Scholarship award ledger: spreadsheet import, search and export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drop and recreate the scholarship table
    InitDb,
    /// Import every award sheet of a workbook
    Import {
        /// Workbook path (defaults to SCHOLARSHIP_WORKBOOK or scholarship.xlsx)
        #[arg(long)]
        xlsx: Option<PathBuf>,
        /// Append to the existing table instead of resetting it first
        #[arg(long)]
        append: bool,
    },
    /// Add a single award record by hand
    Add {
        #[arg(long)]
        student_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        grade: Option<String>,
        #[arg(long, default_value = "其他僑生獎學金", value_parser = SCHOLARSHIP_TYPES)]
        scholarship_type: String,
        #[arg(long, value_enum, default_value_t = RenewalStatus::Yes)]
        can_renew: RenewalStatus,
        /// Amount for the current award; stored as month 1 and as the total
        #[arg(long, default_value_t = 0.0)]
        amount: f64,
    },
    /// Find records by exact student id or partial name/email
    Search {
        term: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete every record for a student id
    Delete { student_id: String },
    /// Export the whole table (.csv or .xlsx)
    Export {
        #[arg(long, default_value = "獎學金資料.xlsx")]
        out: PathBuf,
    },
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();
    let settings = config::Settings::from_env();

    if let Commands::Import { xlsx, .. } = &cli.command {
        let path = xlsx.as_ref().unwrap_or(&settings.workbook);
        if !path.exists() {
            return Err(error::LedgerError::MissingSourceFile(path.clone()).into());
        }
    }

    let pool = db::connect(&settings.database_url).await?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready at {}.", settings.database_url);
        }
        Commands::Import { xlsx, append } => {
            let path = xlsx.unwrap_or(settings.workbook);
            let summary = if append {
                import::import_workbook(&pool, &path).await?
            } else {
                import::reset_and_import(&pool, &path).await?
            };
            print!("{}", report::build_import_report(&summary));
            println!("Table now holds {} records.", db::count(&pool).await?);
        }
        Commands::Add {
            student_id,
            name,
            email,
            country,
            department,
            grade,
            scholarship_type,
            can_renew,
            amount,
        } => {
            let mut months = [0.0; 12];
            months[0] = amount;
            let record = NewScholarship {
                student_id: student_id.trim().to_string(),
                name: blank_to_none(Some(name)),
                country: blank_to_none(country),
                department: blank_to_none(department),
                grade: blank_to_none(grade),
                scholarship_type,
                can_renew,
                months,
                total_amount: Some(amount),
                email: blank_to_none(email),
            };
            let id = db::append_record(&pool, &record).await?;
            println!("Added record {id} for {}.", record.student_id);
        }
        Commands::Search { term, json } => {
            let records = db::search(&pool, &term).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print!("{}", report::build_search_listing(&records));
            }
        }
        Commands::Delete { student_id } => {
            let removed = db::delete_by_student_id(&pool, student_id.trim()).await?;
            if removed == 0 {
                println!("No records found for {student_id}.");
            } else {
                println!("Deleted {removed} records for {student_id}.");
            }
        }
        Commands::Export { out } => {
            let records = db::fetch_all(&pool).await?;
            workbook::export(&out, &records)?;
            println!("Exported {} records to {}.", records.len(), out.display());
        }
    }

    Ok(())
}
