//! Prompt templates shared by all providers.

/// System prompt for community post generation.
pub const POST_SYSTEM: &str = "You are a workplace analyst who writes insightful, \
thought-provoking content about remote work. Your writing style is analytical, \
professional, and engaging. Use minimal emojis (1-2 max), blend data with \
practical insights, and avoid promotional language.";

/// System prompt for the discussion-question follow-up.
pub const DISCUSSION_SYSTEM: &str = "You are a friendly community manager who \
writes one short, open-ended discussion question that gets people talking.";

/// User prompt asking for a researched post about `topic`, targeting
/// `target_chars` characters so room is left for source URLs.
pub fn research_post(topic: &str, target_chars: usize) -> String {
    format!(
        "Search for the latest information about: {topic}\n\n\
Find compelling and recent insights, research, or trends from this week. \
Create a community post that:\n\n\
1. Leads with a compelling bolded headline or insight\n\
2. Combines data/statistics with practical observations\n\
3. Analyzes what this reveals about remote work evolution\n\
4. Includes actionable insights or thought-provoking questions\n\
5. Ends with a meaningful conclusion\n\
6. Keep it under {target_chars} characters (save space for source URLs)\n\
7. Include numbered source citations [1], [2], etc.\n\
8. Use analytical but accessible tone\n\
9. Minimal emojis (1-2 maximum)"
    )
}

/// User prompt asking for a short discussion question about `source_text`.
pub fn discussion_question(source_text: &str) -> String {
    format!(
        "Based on the following post, write exactly one short, open-ended \
discussion question (under 200 characters) that invites readers to share \
their own experience. Return only the question.\n\n{source_text}"
    )
}

/// User prompt asking the model to compress `text` under `max_chars`
/// characters without losing its structure.
pub fn shorten(text: &str, max_chars: usize) -> String {
    format!(
        "Shorten the following post to at most {max_chars} characters. \
Preserve the bolded headline, the key statistics, and any citation markers \
like [1]. Do not add commentary. Return only the shortened post.\n\n{text}"
    )
}
