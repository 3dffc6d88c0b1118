//! Log group listing and fuzzy selection.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::app::data_plane::cloudwatch_logs::LogGroupSummary;

/// Log groups whose name fuzzy-matches `pattern`, best match first.
///
/// Equal scores fall back to the shorter, then alphabetically smaller name so
/// the ranking is stable across runs.
pub fn rank_log_groups<'a>(groups: &'a [LogGroupSummary], pattern: &str) -> Vec<&'a LogGroupSummary> {
    let matcher = SkimMatcherV2::default();

    let mut scored: Vec<(i64, &LogGroupSummary)> = groups
        .iter()
        .filter_map(|group| {
            matcher
                .fuzzy_match(&group.log_group_name, pattern)
                .map(|score| (score, group))
        })
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .cmp(score_a)
            .then_with(|| a.log_group_name.len().cmp(&b.log_group_name.len()))
            .then_with(|| a.log_group_name.cmp(&b.log_group_name))
    });

    scored.into_iter().map(|(_, group)| group).collect()
}

/// The single best fuzzy match for `pattern`
pub fn pick_log_group<'a>(groups: &'a [LogGroupSummary], pattern: &str) -> Option<&'a LogGroupSummary> {
    rank_log_groups(groups, pattern).into_iter().next()
}

/// One line per log group name
pub fn format_names(groups: &[LogGroupSummary]) -> String {
    groups
        .iter()
        .map(|group| format!("{}\n", group.log_group_name))
        .collect()
}
