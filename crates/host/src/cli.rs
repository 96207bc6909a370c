// crates/host/src/cli.rs

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use perf_insights_core::{Role, Viewer};

#[derive(Debug, Parser)]
#[command(
    name = "perf-insights",
    version,
    about = "Performance evaluation insights from the portal API"
)]
pub struct Cli {
    /// Portal API base URL (overrides PORTAL_API_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Read evaluations from an exported JSON snapshot instead of the API
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Email of the signed-in user
    #[arg(long, env = "PORTAL_USER_EMAIL")]
    pub email: String,

    /// Comma-separated roles of the signed-in user
    #[arg(
        long,
        env = "PORTAL_USER_ROLES",
        value_delimiter = ',',
        default_value = "EMPLOYEE"
    )]
    pub roles: Vec<Role>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn viewer(&self) -> Viewer {
        Viewer::new(self.email.clone(), self.roles.clone())
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate insights for the signed-in user
    Insights {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show evaluation history grouped by quarter
    History {
        /// Only show this year
        #[arg(long)]
        year: Option<i32>,
    },
    /// Submit a self-evaluation
    Submit(SubmitArgs),
    /// Interactive session: refresh insights on demand
    Interactive,
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Competency that must be rated (repeatable)
    #[arg(long = "competency", required = true)]
    pub competencies: Vec<String>,

    /// Rating as NAME=1..5 (repeatable)
    #[arg(long = "rate", value_parser = parse_rating)]
    pub ratings: Vec<(String, i64)>,

    #[arg(long, default_value = "")]
    pub feedback: String,

    #[arg(long)]
    pub project: Option<i64>,

    #[arg(long, requires = "quarter")]
    pub year: Option<i32>,

    #[arg(long, requires = "year")]
    pub quarter: Option<u8>,
}

fn parse_rating(s: &str) -> Result<(String, i64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=RATING, got {:?}", s))?;
    let rating = value
        .trim()
        .parse()
        .map_err(|_| format!("rating for {:?} is not a number: {:?}", name, value))?;
    Ok((name.trim().to_string(), rating))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rating() {
        assert_eq!(
            parse_rating("Problem Solving=4").unwrap(),
            ("Problem Solving".to_string(), 4)
        );
        assert!(parse_rating("teamwork").is_err());
        assert!(parse_rating("teamwork=high").is_err());
    }

    #[test]
    fn test_roles_from_args() {
        let cli = Cli::try_parse_from([
            "perf-insights",
            "--email",
            "jane.doe@company.com",
            "--roles",
            "employee,manager",
            "insights",
        ])
        .unwrap();
        let viewer = cli.viewer();
        assert!(viewer.is_manager());
        assert_eq!(viewer.email, "jane.doe@company.com");
    }

    #[test]
    fn test_submit_args() {
        let cli = Cli::try_parse_from([
            "perf-insights",
            "--email",
            "a@company.com",
            "submit",
            "--competency",
            "Teamwork",
            "--rate",
            "Teamwork=5",
            "--year",
            "2025",
            "--quarter",
            "2",
        ])
        .unwrap();
        match cli.command {
            Command::Submit(args) => {
                assert_eq!(args.ratings, vec![("Teamwork".to_string(), 5)]);
                assert_eq!(args.quarter, Some(2));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_year_requires_quarter() {
        let result = Cli::try_parse_from([
            "perf-insights",
            "--email",
            "a@company.com",
            "submit",
            "--competency",
            "Teamwork",
            "--year",
            "2025",
        ]);
        assert!(result.is_err());
    }
}
