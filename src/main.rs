use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod analytics;
mod app;
mod client;
mod config;
mod error;
mod export;
mod forms;
mod models;
mod notice;
mod router;
mod scope;
mod session;
mod shell;
mod views;

use app::App;
use client::ApiClient;
use config::Config;
use forms::{parse_ratings, FeedbackForm};
use views::MountOptions;

#[derive(Parser)]
#[command(name = "feedback-portal")]
#[command(about = "Terminal client for the student feedback platform", long_about = None)]
struct Cli {
    #[command(flatten)]
    auth: Auth,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Auth {
    /// Enrollment number to sign in with before running the command
    #[arg(long, global = true, requires = "password")]
    login: Option<String>,
    #[arg(long, global = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Navigate to a path and print the view it mounts
    Open {
        #[arg(default_value = "/")]
        path: String,
        /// Filter the student dashboard's teacher list
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Interactive session
    Shell,
    /// Register a new user (admin only)
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        id: String,
        #[arg(long = "new-password")]
        new_password: String,
        #[arg(long)]
        role: String,
        #[arg(long)]
        subject_name: Option<String>,
        #[arg(long)]
        subject_code: Option<String>,
    },
    /// Rate a teacher (students only)
    Rate {
        #[arg(long)]
        teacher: String,
        /// Five comma-separated ratings from 1 to 5
        #[arg(long)]
        ratings: String,
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Write every feedback record to a CSV file (admin only)
    Export {
        #[arg(long, default_value = "feedback.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let client = ApiClient::new(&config).context("failed to build HTTP client")?;

    let mut app = App::new(client, config.request_timeout);
    app.bootstrap().await;

    if let (Some(login), Some(password)) = (cli.auth.login.as_deref(), cli.auth.password.as_deref()) {
        if let Err(notice) = app.login(login, password).await {
            bail!("{notice}");
        }
    }

    match cli.command {
        Commands::Open { path, search, out } => {
            let rendered = app.open(&path, &MountOptions { search }).await;
            shell::print_notices(&rendered.notices);
            match out {
                Some(out) => {
                    std::fs::write(&out, &rendered.body)?;
                    println!("View {} written to {}.", rendered.route, out.display());
                }
                None => println!("{}", rendered.body),
            }
        }
        Commands::Shell => shell::run(&mut app).await?,
        Commands::Register {
            name,
            id,
            new_password,
            role,
            subject_name,
            subject_code,
        } => {
            let form = forms::RegisterForm {
                full_name: name,
                enrollment_number: id,
                password: new_password,
                role,
                subject_name,
                subject_code,
            };
            match app.register(&form).await {
                Ok(outcome) => shell::print_register_outcome(outcome),
                Err(notice) => bail!("{notice}"),
            }
        }
        Commands::Rate {
            teacher,
            ratings,
            comment,
        } => {
            let values = parse_ratings(&ratings).map_err(anyhow::Error::msg)?;
            let mut form = FeedbackForm::new(teacher).with_ratings(&values);
            form.comment = comment;
            match app.rate(&form).await {
                Ok(notice) => shell::print_notices(&[notice]),
                Err(notice) => bail!("{notice}"),
            }
        }
        Commands::Export { out } => {
            let written = app.export(&out).await?;
            println!("Exported {written} feedback records to {}.", out.display());
        }
    }

    Ok(())
}
