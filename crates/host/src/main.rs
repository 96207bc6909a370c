mod cli;
mod render;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use perf_insights_core::history::PerformanceHistory;
use perf_insights_core::submission::EvaluationDraft;
use perf_insights_core::{
    ApiConfig, EvaluationSource, HttpEvaluationClient, InsightBoard, InsightPipeline,
    PortalError, StaticSource, Viewer,
};

use cli::{Cli, Command, SubmitArgs};

type Source = dyn EvaluationSource + Sync;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let viewer = cli.viewer();
    let source = build_source(&cli)?;
    let pipeline = InsightPipeline::new();

    match cli.command {
        Command::Insights { json } => {
            let report = pipeline.run(source.as_ref(), &viewer)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                render::report(&report);
            }
        }
        Command::History { year } => {
            let records = pipeline.load_records(source.as_ref(), &viewer)?;
            render::history(&PerformanceHistory::from_records(&records), year);
        }
        Command::Submit(args) => submit(source.as_ref(), args)?,
        Command::Interactive => interactive(source.as_ref(), &pipeline, &viewer)?,
    }

    Ok(())
}

fn build_source(cli: &Cli) -> Result<Box<Source>> {
    if let Some(path) = &cli.snapshot {
        let source = StaticSource::from_file(path)
            .with_context(|| format!("failed to load snapshot {}", path.display()))?;
        info!(path = %path.display(), "using snapshot source");
        return Ok(Box::new(source));
    }

    let mut config = ApiConfig::from_env();
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    info!(base_url = %config.base_url, "using portal API");
    Ok(Box::new(HttpEvaluationClient::new(config)?))
}

fn submit(source: &Source, args: SubmitArgs) -> Result<()> {
    let mut draft = EvaluationDraft::new(&args.competencies).with_feedback(args.feedback);
    if let Some(project) = args.project {
        draft = draft.for_project(project);
    }
    if let (Some(year), Some(quarter)) = (args.year, args.quarter) {
        draft = draft.for_period(year, quarter);
    }
    for (competency, rating) in &args.ratings {
        draft.rate(competency, *rating);
    }

    let progress = draft.progress();
    let submission = draft
        .into_submission(Utc::now())
        .map_err(PortalError::from)
        .with_context(|| format!("evaluation not submitted ({}% complete)", progress))?;

    match source.submit_evaluation(&submission) {
        Ok(()) => {
            render::success("Evaluation submitted.");
            Ok(())
        }
        Err(e) if e.is_conflict() => {
            render::warn("Self-evaluation already submitted for this project and quarter.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn interactive(source: &Source, pipeline: &InsightPipeline, viewer: &Viewer) -> Result<()> {
    let board = InsightBoard::new();
    println!("\nPerformance Insights");
    println!("Commands: refresh, history, quit\n");

    refresh(&board, source, pipeline, viewer);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let command = input.trim();

        if command.is_empty() {
            continue;
        }
        if command.eq_ignore_ascii_case("quit") || command.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }

        match command.to_ascii_lowercase().as_str() {
            "refresh" | "r" => refresh(&board, source, pipeline, viewer),
            "history" | "h" => match board.snapshot().report {
                Some(report) => {
                    render::history(&PerformanceHistory::from_records(&report.evaluations), None)
                }
                None => render::warn("Nothing loaded yet; run refresh."),
            },
            other => render::warn(format!("Unknown command: {}", other)),
        }
    }

    Ok(())
}

fn refresh(board: &InsightBoard, source: &Source, pipeline: &InsightPipeline, viewer: &Viewer) {
    // Refreshes run one at a time here, so every result is applied.
    board.refresh(|| pipeline.run(source, viewer));

    let state = board.snapshot();
    if let Some(message) = &state.error {
        render::error(message);
    } else if let Some(report) = &state.report {
        render::report(report);
    }
}
