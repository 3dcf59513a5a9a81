use std::io::{self, Write};

use crate::article::{Article, Source};

const BODY_PREVIEW_CHARS: usize = 80;

/// Write the ordered list as numbered lines with a short body preview.
pub fn render_articles<W: Write>(out: &mut W, articles: &[Article]) -> io::Result<()> {
    if articles.is_empty() {
        writeln!(out, "(no articles)")?;
        return Ok(());
    }

    for (i, article) in articles.iter().enumerate() {
        writeln!(
            out,
            "{:>3}. {} [{} votes, {}]",
            i + 1,
            article.title,
            article.votes,
            article.published_at.format("%Y-%m-%d %H:%M")
        )?;
        let preview = preview(&article.body);
        if !preview.is_empty() {
            writeln!(out, "     {}", preview)?;
        }
        if let Some(url) = &article.url {
            writeln!(out, "     {}", url)?;
        }
    }
    Ok(())
}

/// Render and flush, for streaming output where partial writes must surface.
pub fn write_articles<W: Write>(out: &mut W, articles: &[Article]) -> io::Result<()> {
    render_articles(out, articles)?;
    out.flush()
}

pub fn render_sources<W: Write>(out: &mut W, sources: &[Source]) -> io::Result<()> {
    for source in sources {
        if source.name.is_empty() {
            writeln!(out, "  {}", source.id)?;
        } else {
            writeln!(out, "  {} - {}", source.id, source.name)?;
        }
    }
    Ok(())
}

fn preview(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= BODY_PREVIEW_CHARS {
        return body.to_string();
    }
    let cut: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}
