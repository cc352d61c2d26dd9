//! Story-graph QA for Harrowlight content.
//!
//! Loads the chapter JSON the engine serves and walks the story graph
//! with the engine's own adjacency rules, reporting dead links, missing
//! chapters, and unreachable endings.
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use harrowlight_game::store::DEFAULT_FIRST_CHAPTER;
use harrowlight_game::validate::{GraphReport, check_reachability};
use harrowlight_game::StoryStore;

#[derive(Debug, Parser)]
#[command(name = "harrowlight-checker", version)]
#[command(about = "Reachability and dead-link checks for Harrowlight story content")]
struct Args {
    /// Data directory holding chapters/ and random_events.json
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Chapter every session starts in
    #[arg(long, default_value = DEFAULT_FIRST_CHAPTER)]
    start_chapter: String,

    /// Ending nodes that must stay reachable, as comma-separated
    /// chapter:node pairs
    #[arg(long, default_value = "")]
    endings: String,

    /// Emit the raw report as JSON instead of console lines
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<bool> {
    let store = StoryStore::load_dir(&args.data_dir)
        .with_context(|| format!("loading content from {}", args.data_dir.display()))?;
    let endings = split_endings(&args.endings);
    let report = check_reachability(&store, &args.start_chapter);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report.is_clean() && endings_ok(&report, &endings));
    }

    println!(
        "Walked {} nodes from '{}' across {} chapters",
        report.visited.len(),
        args.start_chapter,
        store.chapter_ids().len()
    );

    for missing in &report.missing_chapters {
        println!(
            "{} link to missing chapter '{}' from {}:{}",
            "[WARN]".yellow(),
            missing.chapter,
            missing.from_chapter,
            missing.from_node
        );
    }
    for link in &report.dead_links {
        println!(
            "{} {}:{} -> {}:{}",
            "[DEAD LINK]".red(),
            link.from_chapter,
            link.from_node,
            link.to_chapter,
            link.to_node
        );
    }

    let mut all_ok = report.is_clean();
    if !endings.is_empty() {
        println!("\n--- Reachability Report ---");
        for (chapter, node) in &endings {
            if report.reaches(chapter, node) {
                println!("{} {chapter}:{node}", "[OK]".green());
            } else {
                println!("{} {chapter}:{node}", "[FAIL]".red());
                all_ok = false;
            }
        }
    }

    if all_ok {
        println!("\n{}", "ALL REACHABLE.".green().bold());
    } else {
        println!("\n{}", "GRAPH BROKEN.".red().bold());
    }
    Ok(all_ok)
}

fn endings_ok(report: &GraphReport, endings: &[(String, String)]) -> bool {
    endings
        .iter()
        .all(|(chapter, node)| report.reaches(chapter, node))
}

/// Parse `chapter:node` pairs from a comma-separated flag value.
fn split_endings(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            let (chapter, node) = entry.split_once(':')?;
            if chapter.is_empty() || node.is_empty() {
                return None;
            }
            Some((chapter.to_string(), node.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_endings_parses_pairs_and_skips_garbage() {
        let endings = split_endings(
            "chapter20_lighthouse_top:end_scholar, chapter20_lighthouse_top:end_hero,, bare,:x,y:",
        );
        assert_eq!(
            endings,
            vec![
                (
                    "chapter20_lighthouse_top".to_string(),
                    "end_scholar".to_string()
                ),
                (
                    "chapter20_lighthouse_top".to_string(),
                    "end_hero".to_string()
                ),
            ]
        );
        assert!(split_endings("").is_empty());
    }
}
