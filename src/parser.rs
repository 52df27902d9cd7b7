//! Free-text task capture.
//!
//! Turns a line like `"Gym for 1h then study HCI asap"` into one `TaskDraft`
//! per segment, inferring estimate, category and priority from keywords.
//! The rules are plain pattern matching and will misread some inputs; callers
//! can pin the category with `ParseOptions::category_override`.

use std::sync::LazyLock;

use regex::Regex;

use crate::fields::{Category, Priority};
use crate::task::TaskDraft;

pub const DEFAULT_ESTIMATE_MINUTES: u32 = 30;
pub const SHORT_TASK_MINUTES: u32 = 15;

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:and|then)\s+|,\s*|\s*;\s*").unwrap());

// Matches the whole word around the keyword, so "Quickly" goes as one piece.
static SHORT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\w*(?:quick|short)\w*\b").unwrap());

// Longer unit spellings come first so "mins" is not cut down to "m".
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bfor\s+)?\b(\d+)\s*(minutes|minute|mins|min|m|hours|hour|hrs|hr|h)\b").unwrap()
});

static HIGH_PRIORITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:urgent|asap|deadline|important|critical)\b").unwrap());

static LOW_PRIORITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:later|whenever|low|someday)\b").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static DANGLING_FOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(?:^|\s)for$").unwrap());

/// Keyword groups in evaluation order. Every rule is tested and the last hit wins.
const CATEGORY_KEYWORDS: [(Category, &str); 5] = [
    (
        Category::Study,
        "study|studying|read|reading|homework|exam|exams|lecture|course|revise|learn|learning|class",
    ),
    (
        Category::Health,
        "gym|walk|run|running|workout|yoga|exercise|doctor|meditate|swim",
    ),
    (
        Category::Personal,
        "mom|dad|call|groceries|shopping|laundry|clean|cook|errand|errands|family",
    ),
    (
        Category::Work,
        "work|project|meeting|email|emails|report|client|presentation",
    ),
    (
        Category::Career,
        "resume|cv|interview|job|apply|linkedin|portfolio|networking",
    ),
];

static CATEGORY_RULES: LazyLock<Vec<(Category, Regex)>> = LazyLock::new(|| {
    CATEGORY_KEYWORDS
        .iter()
        .map(|(category, words)| (*category, Regex::new(&format!(r"(?i)\b(?:{words})\b")).unwrap()))
        .collect()
});

/// Knobs that apply to a whole batch of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Category used when no keyword group matches.
    pub default_category: Category,
    /// When set, keyword inference is skipped and every draft gets this category.
    pub category_override: Option<Category>,
}

/// Parse free text with the default options.
pub fn parse(input: &str) -> Vec<TaskDraft> {
    parse_with(input, &ParseOptions::default())
}

/// Split `input` into segments and turn each into a draft, in input order.
/// Segments that clean up to an empty title are dropped.
pub fn parse_with(input: &str, options: &ParseOptions) -> Vec<TaskDraft> {
    split_segments(input)
        .into_iter()
        .filter_map(|segment| parse_segment(segment, options))
        .collect()
}

/// Split on `and`/`then` between words, commas and semicolons.
pub fn split_segments(input: &str) -> Vec<&str> {
    SEPARATOR
        .split(input)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_segment(segment: &str, options: &ParseOptions) -> Option<TaskDraft> {
    let mut title = segment.to_string();
    let mut estimated_time = DEFAULT_ESTIMATE_MINUTES;

    if SHORT_KEYWORD.is_match(&title) {
        estimated_time = SHORT_TASK_MINUTES;
        title = SHORT_KEYWORD.replace_all(&title, " ").into_owned();
    }

    if let Some((minutes, range)) = find_duration(&title) {
        if let Some(minutes) = minutes {
            estimated_time = minutes;
        }
        title.replace_range(range, " ");
    }

    let category = options
        .category_override
        .or_else(|| infer_category(segment))
        .unwrap_or(options.default_category);

    let priority = infer_priority(segment);
    title = HIGH_PRIORITY.replace_all(&title, " ").into_owned();
    title = LOW_PRIORITY.replace_all(&title, " ").into_owned();

    let title = clean_title(&title);
    if title.is_empty() {
        return None;
    }

    Some(TaskDraft {
        title,
        priority,
        estimated_time,
        category: Some(category),
    })
}

/// First duration mention in `text`: its value in minutes (if usable) and byte range.
fn find_duration(text: &str) -> Option<(Option<u32>, std::ops::Range<usize>)> {
    let caps = DURATION.captures(text)?;
    let whole = caps.get(0)?;
    let amount: Option<u32> = caps[1].parse().ok();
    let is_hours = caps[2].to_ascii_lowercase().starts_with('h');
    let minutes = amount
        .and_then(|n| if is_hours { n.checked_mul(60) } else { Some(n) })
        .filter(|&m| m > 0);
    Some((minutes, whole.range()))
}

/// Run every keyword group in order; a later match overwrites an earlier one.
pub fn infer_category(text: &str) -> Option<Category> {
    let mut found = None;
    for (category, rule) in CATEGORY_RULES.iter() {
        if rule.is_match(text) {
            found = Some(*category);
        }
    }
    found
}

/// Urgency words raise the priority; low-urgency words are checked second and win.
pub fn infer_priority(text: &str) -> Priority {
    let mut priority = Priority::Medium;
    if HIGH_PRIORITY.is_match(text) {
        priority = Priority::High;
    }
    if LOW_PRIORITY.is_match(text) {
        priority = Priority::Low;
    }
    priority
}

fn clean_title(raw: &str) -> String {
    let mut title = WHITESPACE.replace_all(raw, " ").trim().to_string();
    loop {
        let before = title.len();
        title = title
            .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';'))
            .trim_end()
            .to_string();
        if let Some(m) = DANGLING_FOR.find(&title) {
            title.truncate(m.start());
            title = title.trim_end().to_string();
        }
        if title.len() == before {
            break;
        }
    }
    title.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_segments_with_duration_and_categories() {
        let drafts = parse("Gym for 1h then Study");
        assert_eq!(drafts.len(), 2);

        assert_eq!(drafts[0].title, "Gym");
        assert_eq!(drafts[0].estimated_time, 60);
        assert_eq!(drafts[0].category, Some(Category::Health));

        assert_eq!(drafts[1].title, "Study");
        assert_eq!(drafts[1].estimated_time, 30);
        assert_eq!(drafts[1].category, Some(Category::Study));
    }

    #[test]
    fn test_asap_is_high_priority_and_removed() {
        let drafts = parse("Apply to job asap");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Apply to job");
        assert_eq!(drafts[0].priority, Priority::High);
        assert_eq!(drafts[0].category, Some(Category::Career));
    }

    #[test]
    fn test_whitespace_only_yields_nothing() {
        assert!(parse("   ").is_empty());
        assert!(parse("").is_empty());
        assert!(parse(" , ;  ; ").is_empty());
    }

    #[test]
    fn test_separators() {
        assert_eq!(
            split_segments("email boss, call mom;walk dog AND read THEN sleep"),
            vec!["email boss", "call mom", "walk dog", "read", "sleep"]
        );
        // "and" inside a word is not a separator
        assert_eq!(split_segments("Sandwich handout"), vec!["Sandwich handout"]);
    }

    #[test]
    fn test_quick_keyword() {
        let drafts = parse("quick email to client");
        assert_eq!(drafts[0].estimated_time, SHORT_TASK_MINUTES);
        assert_eq!(drafts[0].title, "email to client");
    }

    #[test]
    fn test_quick_inside_longer_word() {
        let drafts = parse("Quickly reply to email");
        assert_eq!(drafts[0].estimated_time, SHORT_TASK_MINUTES);
        assert_eq!(drafts[0].title, "reply to email");

        assert_eq!(parse("Shortlist candidates")[0].estimated_time, SHORT_TASK_MINUTES);
    }

    #[test]
    fn test_explicit_duration_beats_quick() {
        let drafts = parse("quick review for 45 mins");
        assert_eq!(drafts[0].estimated_time, 45);
        assert_eq!(drafts[0].title, "review");
    }

    #[test]
    fn test_duration_units() {
        assert_eq!(parse("Read 20m")[0].estimated_time, 20);
        assert_eq!(parse("Read 20 min")[0].estimated_time, 20);
        assert_eq!(parse("Read for 2 hours")[0].estimated_time, 120);
        assert_eq!(parse("Read 3H")[0].estimated_time, 180);
        assert_eq!(parse("Read 10 minutes")[0].estimated_time, 10);
    }

    #[test]
    fn test_only_first_duration_counts() {
        let drafts = parse("Study HCI 45 min 2h");
        assert_eq!(drafts[0].estimated_time, 45);
        assert_eq!(drafts[0].title, "Study HCI 2h");
    }

    #[test]
    fn test_zero_duration_keeps_default() {
        let drafts = parse("Stretch 0 min");
        assert_eq!(drafts[0].estimated_time, DEFAULT_ESTIMATE_MINUTES);
        assert_eq!(drafts[0].title, "Stretch");
    }

    #[test]
    fn test_last_matching_category_wins() {
        // study matches first, work later overwrites it
        assert_eq!(infer_category("read the project brief"), Some(Category::Work));
        // health then career
        assert_eq!(infer_category("walk to the interview"), Some(Category::Career));
        assert_eq!(infer_category("water the plants"), None);
    }

    #[test]
    fn test_category_needs_whole_word() {
        assert_eq!(infer_category("homework"), Some(Category::Study));
        assert_eq!(infer_category("workout"), Some(Category::Health));
    }

    #[test]
    fn test_default_category() {
        assert_eq!(parse("water the plants")[0].category, Some(Category::Work));

        let options = ParseOptions {
            default_category: Category::Personal,
            category_override: None,
        };
        assert_eq!(parse_with("water the plants", &options)[0].category, Some(Category::Personal));
    }

    #[test]
    fn test_override_applies_to_every_segment() {
        let options = ParseOptions {
            default_category: Category::Work,
            category_override: Some(Category::Study),
        };
        let drafts = parse_with("gym, call mom, apply to job", &options);
        assert_eq!(drafts.len(), 3);
        assert!(drafts.iter().all(|d| d.category == Some(Category::Study)));
    }

    #[test]
    fn test_low_priority_overwrites_high() {
        assert_eq!(infer_priority("urgent but whenever"), Priority::Low);
        assert_eq!(infer_priority("deadline friday"), Priority::High);
        assert_eq!(infer_priority("tidy desk"), Priority::Medium);

        let drafts = parse("Do laundry later");
        assert_eq!(drafts[0].title, "Do laundry");
        assert_eq!(drafts[0].priority, Priority::Low);
    }

    #[test]
    fn test_title_cleanup() {
        assert_eq!(clean_title("  Buy   milk.  "), "Buy milk");
        assert_eq!(clean_title("Shop for"), "Shop");
        assert_eq!(clean_title("Shop for ;"), "Shop");
        assert_eq!(clean_title("for"), "");
        assert_eq!(clean_title("Comfort"), "Comfort");
    }

    #[test]
    fn test_segment_empty_after_cleanup_is_dropped() {
        let drafts = parse("asap, Gym");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Gym");

        assert!(parse("for 1h").is_empty());
    }

    #[test]
    fn test_order_is_preserved() {
        let titles: Vec<String> = parse("c; b; a").into_iter().map(|d| d.title).collect();
        assert_eq!(titles, vec!["c", "b", "a"]);
    }
}
