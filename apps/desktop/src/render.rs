use std::fmt::Write as _;

use shared::{domain::ResultOrigin, protocol::Movie};

pub const GRID_COLUMNS: usize = 3;
const CELL_WIDTH: usize = 30;

pub fn heading(origin: &ResultOrigin) -> String {
    match origin {
        ResultOrigin::Trending(window) => format!("Trending this {window}"),
        ResultOrigin::Search(query) => format!("Results for \"{query}\""),
    }
}

/// Lays movies out `columns` wide, numbered so `:open N` can select one.
pub fn render_grid(movies: &[Movie], image_base: &str, columns: usize) -> String {
    let columns = columns.max(1);
    let mut out = String::new();

    for (row_index, row) in movies.chunks(columns).enumerate() {
        let first = row_index * columns;

        let titles: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(offset, movie)| {
                let label = match movie.release() {
                    Some(date) => format!("{} ({})", movie.title, date.format("%Y")),
                    None => movie.title.clone(),
                };
                pad(&truncate(&format!("[{}] {label}", first + offset), CELL_WIDTH), CELL_WIDTH)
            })
            .collect();
        let _ = writeln!(out, "{}", titles.join("  ").trim_end());

        for (offset, movie) in row.iter().enumerate() {
            let poster = movie
                .poster_url(image_base)
                .unwrap_or_else(|| "(no poster)".to_string());
            let _ = writeln!(out, "    {:>3}: {poster}", first + offset);
        }
    }

    out
}

pub fn render_detail(movie: &Movie, image_base: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", movie.title);
    let _ = writeln!(out, "{}", "=".repeat(movie.title.chars().count().max(1)));

    if let Some(date) = movie.release() {
        let _ = writeln!(out, "Released: {}", date.format("%B %-d, %Y"));
    }
    if movie.vote_average > 0.0 {
        let _ = writeln!(out, "Rating:   {:.1}/10", movie.vote_average);
    }
    if let Some(original) = movie
        .original_title
        .as_deref()
        .filter(|original| *original != movie.title)
    {
        let _ = writeln!(out, "Original: {original}");
    }
    match movie.backdrop_url(image_base) {
        Some(url) => {
            let _ = writeln!(out, "Backdrop: {url}");
        }
        None => {
            let _ = writeln!(out, "Backdrop: (none)");
        }
    }

    let _ = writeln!(out);
    if movie.overview.trim().is_empty() {
        let _ = writeln!(out, "No overview available.");
    } else {
        let _ = writeln!(out, "{}", movie.overview.trim());
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{text}{}", " ".repeat(width - len))
    }
}
