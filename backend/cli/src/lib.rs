//! # Feedback Admin
//!
//! Terminal access to a running feedback server.
//!
//! ## Commands
//! - `list`, `add`, `resolve`, `delete`: one request each against `/api/feedback`
//! - `archive`: snapshots the live points into a round file for the file backend
//!
//! ## Archiving
//! 1. Fetch the live points, optionally for one page.
//!
//! 2. Wrap them in a round with a generated `round_` id, today's date and the given status.
//!
//! 3. Write the round to `<rounds-dir>/<slug>.json`. An existing file is never overwritten.
//!
//! 4. With `--clear`, delete every archived point from the server. Failures are logged and
//!    counted, the round file stays as written.
//!
//! ### Notes
//! - The server picks up new round files on the next `GET /api/feedback/rounds`, no restart needed.
//! - Only the file backend reads the rounds directory. For blob storage, upload the written file
//!   under the rounds prefix.
use std::path::PathBuf;

use anyhow::{Context, bail};
use feedback::{
    FeedbackClient, FeedbackPatch, FeedbackPoint, POINT_ID_PREFIX, RoundStatus,
    utils::{generate_id, timestamp_now},
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tracing::warn;

pub mod utils;

use utils::{build_round, round_path, today};

pub struct ArchiveOptions {
    pub name: String,
    pub rounds_dir: PathBuf,
    pub page: Option<String>,
    pub status: RoundStatus,
    pub clear: bool,
}

pub async fn list(client: &FeedbackClient, page: Option<&str>) -> anyhow::Result<()> {
    let points = client.list_points(page).await?;

    if points.is_empty() {
        println!("No feedback found.");
        return Ok(());
    }

    for point in &points {
        println!("{}", describe(point));
    }
    println!("\nTotal: {}", points.len());

    Ok(())
}

pub async fn add(
    client: &FeedbackClient,
    page: String,
    comment: String,
    x: f64,
    y: f64,
) -> anyhow::Result<()> {
    let comment = comment.trim().to_string();
    if page.is_empty() || comment.is_empty() {
        bail!("Page and comment must not be empty");
    }

    let point = FeedbackPoint {
        id: generate_id(POINT_ID_PREFIX),
        x,
        y,
        comment,
        page,
        timestamp: timestamp_now(),
        resolved: Some(false),
        resolution: None,
    };

    let saved = client.create_point(&point).await?.unwrap_or(point);
    println!("Saved {}", saved.id);

    Ok(())
}

pub async fn resolve(
    client: &FeedbackClient,
    id: &str,
    resolution: Option<String>,
) -> anyhow::Result<()> {
    let patch = FeedbackPatch::resolve(resolution);

    match client.update_point(id, &patch).await? {
        Some(point) => println!("Resolved {}", point.id),
        None => println!("Resolved {id}"),
    }

    Ok(())
}

pub async fn delete(client: &FeedbackClient, id: &str) -> anyhow::Result<()> {
    client.delete_point(id).await?;
    println!("Deleted {id}");

    Ok(())
}

pub async fn archive(client: &FeedbackClient, options: ArchiveOptions) -> anyhow::Result<()> {
    let points = client.list_points(options.page.as_deref()).await?;
    if points.is_empty() {
        bail!("No feedback to archive");
    }

    let ids: Vec<String> = points.iter().map(|p| p.id.clone()).collect();
    let round = build_round(&options.name, today(), options.status, points);
    let path = round_path(&options.rounds_dir, &round)?;

    if fs::try_exists(&path).await? {
        bail!("{} already exists", path.display());
    }

    fs::create_dir_all(&options.rounds_dir)
        .await
        .with_context(|| format!("Failed to create {}", options.rounds_dir.display()))?;
    fs::write(&path, serde_json::to_string_pretty(&round)?)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Archived {} points as {} ({})", ids.len(), round.name, round.id);
    println!("Round file: {}\n", path.display());

    if options.clear {
        let failed = clear(client, &ids).await?;
        if failed > 0 {
            println!("{failed} points could not be deleted");
        }
    }

    Ok(())
}

async fn clear(client: &FeedbackClient, ids: &[String]) -> anyhow::Result<usize> {
    let pb = ProgressBar::new(ids.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut failed = 0;

    for id in ids {
        pb.set_message(format!("Deleting {id}"));

        if let Err(e) = client.delete_point(id).await {
            warn!("Failed to delete {id}: {e}");
            failed += 1;
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    Ok(failed)
}

fn describe(point: &FeedbackPoint) -> String {
    let status = if point.is_resolved() { "resolved" } else { "open" };

    format!(
        "{}  {}  ({:.1}%, {:.0}px)  [{status}]  {}",
        point.id, point.page, point.x, point.y, point.comment
    )
}
