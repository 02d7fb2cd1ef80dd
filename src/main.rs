//! Interactive console recommender.
//!
//! Usage: `songspace [DATASET.csv]`; settings come from `SONGSPACE_*` variables,
//! logging from `RUST_LOG`.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use log::{info, warn};

use songspace::config::AppConfig;
use songspace::{RecommendError, Recommendation, RecommendedSong, SongSpaceBuilder};

const EXIT_WORD: &str = "salir";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config from environment: {e}, using defaults");
        AppConfig::default()
    });
    if let Some(path) = std::env::args_os().nth(1) {
        config.dataset = path.into();
    }
    info!("Dataset: {}", config.dataset.display());

    let space = SongSpaceBuilder::new()
        .with_components(config.components)
        .build_from_path(&config.dataset)
        .with_context(|| {
            format!(
                "failed to build recommender from {}",
                config.dataset.display()
            )
        })?;
    let params = config.query.params();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        writeln!(stdout, "\nSong recommender")?;
        writeln!(stdout, "Type a song name, or 'salir' to quit.")?;
        write!(stdout, "Song name: ")?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let song_name = line.trim();
        if is_exit_command(song_name) {
            break;
        }

        match space.recommend(song_name, &params) {
            Ok(Recommendation::Songs(songs)) => {
                writeln!(stdout, "\nRecommendations for '{}':", song_name)?;
                write_table(&mut stdout, &songs)?;
            }
            Ok(Recommendation::NoSimilarSongs) => writeln!(
                stdout,
                "No similar songs found for '{}' with the current filters.",
                song_name
            )?,
            Err(e @ RecommendError::NotFound(_)) => {
                writeln!(stdout, "{}", capitalise(&e.to_string()))?
            }
            Err(e) => warn!("{}", e),
        }
    }

    writeln!(stdout, "Thanks for using the song recommender!")?;
    Ok(())
}

/// Only the exact exit word ends the session; any other input is a song name.
fn is_exit_command(input: &str) -> bool {
    input.eq_ignore_ascii_case(EXIT_WORD)
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Right-aligned text table: name, artists, year, energy, valence.
fn write_table<W: Write>(out: &mut W, songs: &[RecommendedSong]) -> io::Result<()> {
    let header = ["name", "artists", "year", "energy", "valence"];
    let rows: Vec<[String; 5]> = songs
        .iter()
        .map(|s| {
            [
                s.name.clone(),
                format!("[{}]", s.artists.join(", ")),
                s.year.to_string(),
                format!("{:.3}", s.energy),
                format!("{:.3}", s.valence),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    writeln!(out, "{}", format_line(&header, &widths))?;
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        writeln!(out, "{}", format_line(&cells, &widths))?;
    }
    Ok(())
}

fn format_line(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths.iter())
        .map(|(c, &w)| format!("{:>w$}", c, w = w))
        .collect::<Vec<_>>()
        .join(" ")
}
