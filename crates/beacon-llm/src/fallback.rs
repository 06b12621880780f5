//! Static fallback content used when generation fails.
//!
//! A failed post generation falls back to one of these analyst-style posts;
//! a failed discussion-prompt generation falls back to one of the canned
//! questions. Both picks are uniform.

use rand::seq::SliceRandom;

const FALLBACK_POSTS: &[&str] = &[
    "**The Productivity Paradox**\n\nRemote workers log 51 additional productive \
minutes daily compared to their office counterparts, yet 42% report collaboration \
as their primary challenge. We've solved individual productivity but struggle \
with collective output.\n\nThe pattern suggests we're optimizing for the wrong \
metrics: individual efficiency gains may be masking systemic collaboration \
inefficiencies that compound over time.",
    "**The Mental Health Divide in Remote Work**\n\n67% of remote workers report \
improved work-life balance, but 34% struggle with isolation. The psychological \
infrastructure of distributed teams remains underdeveloped compared to our \
technological capabilities.\n\nWe've solved the \"where\" of work but not the \
\"how\" of human connection in digital spaces.",
    "**The Ergonomics Crisis Hidden in Plain Sight**\n\n78% of remote workers \
experience physical discomfort, yet only 23% have proper ergonomic setups. The \
long-term health implications of improvised home offices represent a massive \
shift in occupational health responsibility from employers to individuals.",
    "**Virtual Team Dynamics: The New Social Physics**\n\nRemote teams with \
structured daily check-ins outperform traditional teams by 19% in project \
completion rates. The absence of physical cues requires more intentional \
communication frameworks.\n\nHuman collaboration operates differently in \
digital spaces. Not worse, just fundamentally different.",
];

const FALLBACK_DISCUSSION_PROMPTS: &[&str] = &[
    "What's one change that made the biggest difference to your remote work setup?",
    "How does your team keep collaboration alive across time zones?",
    "What's your best trick for ending the workday when the office is your home?",
    "Has remote work helped or hurt your career growth so far?",
    "What tool could you not do your remote job without?",
];

/// A random fallback post.
pub fn random_post() -> String {
    pick(FALLBACK_POSTS)
}

/// A random fallback discussion question.
pub fn random_discussion_prompt() -> String {
    pick(FALLBACK_DISCUSSION_PROMPTS)
}

fn pick(pool: &[&str]) -> String {
    pool.choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
        .to_string()
}
