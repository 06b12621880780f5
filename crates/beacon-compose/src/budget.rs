//! Fits generated text plus an optional trailing block under a hard
//! character ceiling.
//!
//! Strategy chain: pass through untouched when everything fits, ask the
//! generation provider to compress the primary text into the remaining
//! budget, and finally truncate structurally, cutting at sentence or word
//! boundaries and keeping a trailing citation block when space allows.
//! Space for the secondary block is reserved up front, so a discussion
//! prompt appended after truncation can never push the result past the
//! ceiling.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use beacon_llm::GenerationProvider;

/// Blank-line separator between the primary text and the secondary block.
const SEPARATOR: &str = "\n\n";
/// Headroom kept between a truncated body and its reattached citations.
const SOURCES_BUFFER: usize = 10;
/// How far back from the cutoff the whitespace fallback starts looking.
const WORD_CUT_BACKOFF: usize = 20;

/// Start of a trailing citation section: a "Sources" heading (bolded or
/// bare) or a first `[1]`-style citation marker at the beginning of a line.
static SOURCES_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?:\*\*Sources|Sources:|\[1\] )").expect("valid sources pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetResult {
    pub text: String,
    pub truncated: bool,
}

pub struct ContentBudgeter {
    provider: Arc<dyn GenerationProvider>,
}

impl ContentBudgeter {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider }
    }

    /// Produce a single string of at most `max_chars` characters from
    /// `primary` plus an optional `secondary` block.
    ///
    /// The secondary block is carried verbatim; only the primary text is
    /// ever shortened or truncated.
    pub async fn fit(
        &self,
        primary: &str,
        secondary: Option<&str>,
        max_chars: usize,
    ) -> BudgetResult {
        let reserved = secondary
            .map(|s| char_len(s) + char_len(SEPARATOR))
            .unwrap_or(0);

        if char_len(primary) + reserved <= max_chars {
            return BudgetResult {
                text: join(primary, secondary),
                truncated: false,
            };
        }

        let primary_budget = max_chars.saturating_sub(reserved);
        warn!(
            chars = char_len(primary),
            budget = primary_budget,
            "generated text over budget, shortening"
        );

        if primary_budget > 0 {
            match self.provider.shorten(primary, primary_budget).await {
                Ok(short) => {
                    let short = short.trim();
                    if !short.is_empty() && char_len(short) <= primary_budget {
                        return BudgetResult {
                            text: join(short, secondary),
                            truncated: true,
                        };
                    }
                    debug!("shortened text still over budget, truncating structurally");
                }
                Err(err) => {
                    debug!(error = %err, "shorten call failed, truncating structurally");
                }
            }
        }

        let body = structural_truncate(primary, primary_budget);
        let mut text = join(&body, secondary);
        if char_len(&text) > max_chars {
            // Last resort, hard cut. Only reachable when the budget is too
            // small to hold the secondary block at all.
            text = char_prefix(&text, max_chars).trim_end().to_string();
        }
        BudgetResult {
            text,
            truncated: true,
        }
    }
}

fn join(primary: &str, secondary: Option<&str>) -> String {
    match secondary {
        Some(s) if !s.is_empty() => format!("{primary}{SEPARATOR}{s}"),
        _ => primary.to_string(),
    }
}

/// Cut `text` down to at most `budget` characters, preserving sentence
/// boundaries and a trailing citation section when possible.
fn structural_truncate(text: &str, budget: usize) -> String {
    let (main, sources) = split_sources(text);

    let sources_len = sources.map(char_len).unwrap_or(0);
    let available = budget.saturating_sub(sources_len + SOURCES_BUFFER);
    let main = if char_len(main) > available {
        cut_at_boundary(main, available)
    } else {
        main.to_string()
    };

    // Reattach citations whole, then just the first entry, then not at all.
    if let Some(sources) = sources {
        let with_sources = format!("{main}{SEPARATOR}{sources}");
        if char_len(&with_sources) <= budget {
            return with_sources;
        }
        if let Some(first) = sources.lines().find(|l| !l.trim().is_empty()) {
            let with_first = format!("{main}{SEPARATOR}{first}");
            if char_len(&with_first) <= budget {
                return with_first;
            }
        }
    }

    if char_len(&main) > budget {
        return ellipsize(char_prefix(&main, budget.saturating_sub(3)));
    }
    main
}

/// Split a trailing citation section off the main body.
fn split_sources(text: &str) -> (&str, Option<&str>) {
    match SOURCES_START.find(text) {
        Some(m) => (
            text[..m.start()].trim_end(),
            Some(text[m.start()..].trim_end()),
        ),
        None => (text.trim_end(), None),
    }
}

/// Cut at the last sentence end at or before `available` characters,
/// falling back to the last word boundary, then to a hard cut.
fn cut_at_boundary(text: &str, available: usize) -> String {
    let window = char_prefix(text, available);

    let sentence_end = [". ", "! ", "? "]
        .iter()
        .filter_map(|p| window.rfind(p))
        .max();
    let cut = match sentence_end {
        Some(at) => &text[..at],
        None => {
            let word_window = char_prefix(text, available.saturating_sub(WORD_CUT_BACKOFF));
            match word_window.rfind(' ') {
                Some(at) => &text[..at],
                None => word_window,
            }
        }
    };

    ellipsize(cut)
}

fn ellipsize(cut: &str) -> String {
    let cut = cut.trim_end();
    if cut.ends_with(['.', '!', '?']) {
        cut.to_string()
    } else {
        format!("{cut}...")
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte-safe prefix of at most `max_chars` characters.
fn char_prefix(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
