//! Confidence scoring and tag derivation
//!
//! Each category starts from a base confidence and collects additive
//! bonuses from contextual cues, each at most once, clamped to a
//! category ceiling. Organizations use a flat score.

use lorewiki_core::EntryCategory;

use crate::patterns::{
    has_weapon_suffix, HONORIFICS, LOCATION_SUFFIXES, MAGICAL_ADJECTIVES, MOTION_VERBS,
    SPEECH_ACTION_VERBS,
};
use crate::span;

pub const CHARACTER_BASE: f32 = 0.6;
pub const CHARACTER_CEILING: f32 = 0.95;
pub const HONORIFIC_BONUS: f32 = 0.2;
pub const SPEECH_VERB_BONUS: f32 = 0.15;

pub const LOCATION_BASE: f32 = 0.5;
pub const LOCATION_CEILING: f32 = 0.90;
pub const PLACE_SUFFIX_BONUS: f32 = 0.3;
pub const MOTION_VERB_BONUS: f32 = 0.2;

pub const ITEM_BASE: f32 = 0.4;
pub const ITEM_CEILING: f32 = 0.85;
pub const WEAPON_SUFFIX_BONUS: f32 = 0.3;
pub const ADJECTIVE_BONUS: f32 = 0.25;

pub const ORGANIZATION_CONFIDENCE: f32 = 0.75;

/// Characters after a character name searched for a verb
const VERB_LOOKAHEAD: usize = 12;
/// Characters after a location searched for a motion verb
const MOTION_LOOKAHEAD: usize = 10;
/// Characters before an item searched for an adjective
const ADJECTIVE_LOOKBACK: usize = 8;
/// Characters after a character name included in tag cues
const TITLE_LOOKAHEAD: usize = 4;

/// Position of a candidate inside its source text (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Highest confidence a candidate of `category` can reach
pub fn ceiling(category: EntryCategory) -> f32 {
    match category {
        EntryCategory::Character => CHARACTER_CEILING,
        EntryCategory::Location => LOCATION_CEILING,
        EntryCategory::Item => ITEM_CEILING,
        EntryCategory::Organization => ORGANIZATION_CONFIDENCE,
        EntryCategory::Event | EntryCategory::Concept => 0.0,
    }
}

/// Score a match of `category` found at `at` in `source`
pub fn confidence(category: EntryCategory, matched: &str, source: &str, at: MatchSpan) -> f32 {
    let score = match category {
        EntryCategory::Character => {
            let mut score = CHARACTER_BASE;
            if has_adjacent_honorific(source, at) {
                score += HONORIFIC_BONUS;
            }
            if contains_any(span::after(source, at.end, VERB_LOOKAHEAD), SPEECH_ACTION_VERBS) {
                score += SPEECH_VERB_BONUS;
            }
            score
        }
        EntryCategory::Location => {
            let mut score = LOCATION_BASE;
            if LOCATION_SUFFIXES.iter().any(|s| matched.ends_with(s)) {
                score += PLACE_SUFFIX_BONUS;
            }
            if contains_any(span::after(source, at.end, MOTION_LOOKAHEAD), MOTION_VERBS) {
                score += MOTION_VERB_BONUS;
            }
            score
        }
        EntryCategory::Item => {
            let mut score = ITEM_BASE;
            if has_weapon_suffix(matched) {
                score += WEAPON_SUFFIX_BONUS;
            }
            if has_preceding_adjective(source, at) {
                score += ADJECTIVE_BONUS;
            }
            score
        }
        EntryCategory::Organization => ORGANIZATION_CONFIDENCE,
        EntryCategory::Event | EntryCategory::Concept => 0.0,
    };

    score.clamp(0.0, ceiling(category))
}

/// Derive tags for a match: two base tags, then specialized ones
pub fn suggested_tags(
    category: EntryCategory,
    matched: &str,
    source: &str,
    at: MatchSpan,
) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    match category {
        EntryCategory::Character => {
            push_tags(&mut tags, &["character", "person"]);
            let cue = format!("{matched}{}", span::after(source, at.end, TITLE_LOOKAHEAD));
            if contains_any(&cue, &["王", "姫", "皇", "殿下", "陛下", "公爵"]) {
                push_tags(&mut tags, &["royalty"]);
            }
            if contains_any(&cue, &["騎士", "卿", "剣士"]) {
                push_tags(&mut tags, &["knight"]);
            }
            if contains_any(&cue, &["魔法", "魔術", "魔女", "魔導", "賢者"]) {
                push_tags(&mut tags, &["magic-user"]);
            }
        }
        EntryCategory::Location => {
            push_tags(&mut tags, &["location", "place"]);
            if ends_with_any(matched, &["城", "宮殿"]) {
                push_tags(&mut tags, &["castle"]);
            }
            if ends_with_any(matched, &["王国", "帝国"]) {
                push_tags(&mut tags, &["realm"]);
            }
            if ends_with_any(matched, &["街", "町", "村", "都", "港"]) {
                push_tags(&mut tags, &["settlement"]);
            }
            if ends_with_any(matched, &["森", "山", "川", "湖", "島", "谷", "丘"]) {
                push_tags(&mut tags, &["nature"]);
            }
            if ends_with_any(matched, &["神殿", "教会"]) {
                push_tags(&mut tags, &["religious"]);
            }
            if ends_with_any(matched, &["遺跡", "洞窟"]) {
                push_tags(&mut tags, &["ruins"]);
            }
        }
        EntryCategory::Item => {
            push_tags(&mut tags, &["item", "object"]);
            if ends_with_any(
                matched,
                &["剣", "刀", "槍", "弓", "斧", "杖", "銃", "矢", "鎌", "槌"],
            ) {
                push_tags(&mut tags, &["weapon"]);
            }
            if ends_with_any(matched, &["盾", "鎧", "兜"]) {
                push_tags(&mut tags, &["armor"]);
            }
            if contains_any(matched, &["薬", "ポーション", "酒", "食", "水"]) {
                push_tags(&mut tags, &["consumable"]);
            }
            let sacred = contains_any(matched, &["魔", "聖", "呪", "神"]);
            if sacred || has_preceding_adjective(source, at) {
                push_tags(&mut tags, &["magical"]);
            }
        }
        EntryCategory::Organization => {
            push_tags(&mut tags, &["organization", "institution"]);
            if ends_with_any(matched, &["学院", "学園", "学校"]) {
                push_tags(&mut tags, &["education"]);
            }
            if ends_with_any(matched, &["軍", "騎士団", "兵団"]) {
                push_tags(&mut tags, &["military"]);
            }
            if ends_with_any(matched, &["教団"]) {
                push_tags(&mut tags, &["religious"]);
            }
            if ends_with_any(matched, &["省", "庁", "議会"]) {
                push_tags(&mut tags, &["political"]);
            }
            if ends_with_any(matched, &["会社", "商会", "ギルド"]) {
                push_tags(&mut tags, &["commerce"]);
            }
        }
        EntryCategory::Event | EntryCategory::Concept => {}
    }

    tags
}

fn has_adjacent_honorific(source: &str, at: MatchSpan) -> bool {
    let rest = &source[at.end..];
    HONORIFICS.iter().any(|h| rest.starts_with(h))
}

fn has_preceding_adjective(source: &str, at: MatchSpan) -> bool {
    contains_any(
        span::before(source, at.start, ADJECTIVE_LOOKBACK),
        MAGICAL_ADJECTIVES,
    )
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn ends_with_any(haystack: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|s| haystack.ends_with(s))
}

fn push_tags(tags: &mut Vec<String>, new_tags: &[&str]) {
    for tag in new_tags {
        if !tags.iter().any(|t| t == tag) {
            tags.push((*tag).to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_of(source: &str, needle: &str) -> MatchSpan {
        let start = source.find(needle).unwrap();
        MatchSpan::new(start, start + needle.len())
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_character_base_only() {
        let source = "昨日アリスと出会った。";
        let score = confidence(
            EntryCategory::Character,
            "アリス",
            source,
            span_of(source, "アリス"),
        );
        assert!(approx(score, CHARACTER_BASE));
    }

    #[test]
    fn test_character_honorific_and_verb_hit_ceiling() {
        let source = "桜子さんは静かに笑った。";
        let score = confidence(
            EntryCategory::Character,
            "桜子",
            source,
            span_of(source, "桜子"),
        );
        // 0.6 + 0.2 + 0.15 = 0.95
        assert!(approx(score, CHARACTER_CEILING));
    }

    #[test]
    fn test_location_clamped_to_ceiling() {
        let source = "一行は白銀城へ向かった。";
        let score = confidence(
            EntryCategory::Location,
            "白銀城",
            source,
            span_of(source, "白銀城"),
        );
        // 0.5 + 0.3 + 0.2 = 1.0, clamped
        assert!(approx(score, LOCATION_CEILING));
    }

    #[test]
    fn test_item_bonuses() {
        let source = "彼は剣を取った。";
        let score = confidence(EntryCategory::Item, "剣", source, span_of(source, "剣"));
        assert!(approx(score, ITEM_BASE + WEAPON_SUFFIX_BONUS));

        let source = "伝説の聖剣を抜いた。";
        let score = confidence(EntryCategory::Item, "聖剣", source, span_of(source, "聖剣"));
        // 0.4 + 0.3 + 0.25 = 0.95, clamped
        assert!(approx(score, ITEM_CEILING));

        let source = "古い宝玉を拾った。";
        let score = confidence(EntryCategory::Item, "宝玉", source, span_of(source, "宝玉"));
        assert!(approx(score, ITEM_BASE));
    }

    #[test]
    fn test_organization_is_flat() {
        let source = "王立学院の学生たちが笑った。";
        let score = confidence(
            EntryCategory::Organization,
            "王立学院",
            source,
            span_of(source, "王立学院"),
        );
        assert!(approx(score, ORGANIZATION_CONFIDENCE));
    }

    #[test]
    fn test_character_tags() {
        let source = "エレナ姫は魔法を使った。";
        let tags = suggested_tags(
            EntryCategory::Character,
            "エレナ",
            source,
            span_of(source, "エレナ"),
        );
        assert_eq!(tags[..2], ["character", "person"]);
        assert!(tags.contains(&"royalty".to_string()));
        assert!(!tags.contains(&"knight".to_string()));
    }

    #[test]
    fn test_item_and_organization_tags() {
        let source = "呪われた鎧を着た。";
        let tags = suggested_tags(EntryCategory::Item, "鎧", source, span_of(source, "鎧"));
        assert_eq!(tags, vec!["item", "object", "armor", "magical"]);

        let source = "帝国騎士団が来た。";
        let tags = suggested_tags(
            EntryCategory::Organization,
            "帝国騎士団",
            source,
            span_of(source, "帝国騎士団"),
        );
        assert_eq!(tags, vec!["organization", "institution", "military"]);
    }

    #[test]
    fn test_location_tags() {
        let source = "白銀城に着いた。";
        let tags = suggested_tags(
            EntryCategory::Location,
            "白銀城",
            source,
            span_of(source, "白銀城"),
        );
        assert_eq!(tags, vec!["location", "place", "castle"]);
    }
}
