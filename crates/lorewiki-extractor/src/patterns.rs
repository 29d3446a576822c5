//! Pattern library
//!
//! Fixed lexical tables for Japanese narrative prose: one ordered group of
//! regex patterns per extractable category, plus the word lists used by the
//! confidence scorer and the validity filters. Built once on first use and
//! never mutated.

use lorewiki_core::EntryCategory;
use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// Lexicons
// ============================================================================

/// Honorific suffixes that follow a character name
pub const HONORIFICS: &[&str] = &[
    "さん", "さま", "様", "くん", "君", "ちゃん", "殿", "先生", "先輩", "姫", "王子", "卿",
];

/// Speech and action verb stems that tend to follow a character name
pub const SPEECH_ACTION_VERBS: &[&str] = &[
    "言っ", "言う", "話し", "話す", "叫", "笑", "答え", "尋ね", "呟", "囁", "頷", "微笑", "泣",
    "見つめ", "振り返", "取っ", "走っ", "立ち上が",
];

/// Place and facility suffixes
pub const LOCATION_SUFFIXES: &[&str] = &[
    "王国", "帝国", "神殿", "宮殿", "遺跡", "洞窟", "広場", "教会", "城", "街", "町", "村", "国",
    "森", "山", "川", "湖", "島", "塔", "港", "都", "館", "砦", "谷", "丘",
];

/// Motion verb stems that tend to follow a location
pub const MOTION_VERBS: &[&str] = &[
    "行っ", "行く", "向か", "着い", "着く", "戻っ", "戻る", "訪れ", "入っ", "入る", "出た", "出る",
    "到着", "帰っ", "帰る", "逃げ", "旅立",
];

/// Weapon and tool suffix characters
pub const WEAPON_SUFFIXES: &[char] = &[
    '剣', '刀', '槍', '弓', '斧', '杖', '盾', '鎧', '銃', '矢', '鎌', '槌',
];

/// Adjectives marking an item as special when they precede it
pub const MAGICAL_ADJECTIVES: &[&str] = &[
    "魔法の", "伝説の", "聖なる", "呪われた", "古代の", "神秘の", "禁断の", "黄金の", "光る",
    "輝く",
];

/// Organization suffixes
pub const ORGANIZATION_SUFFIXES: &[&str] = &[
    "学院", "学園", "学校", "騎士団", "兵団", "会社", "組織", "団体", "ギルド", "教団", "商会",
    "議会", "軍", "部", "課", "省", "庁",
];

/// Separators stripped from kanji names
pub const NAME_SEPARATORS: &[char] = &['・', '　', ' '];

// ============================================================================
// Patterns
// ============================================================================

/// One extraction pattern
#[derive(Debug)]
pub struct EntityPattern {
    /// Compiled regex
    pub regex: Regex,
    /// Category assigned to matches
    pub category: EntryCategory,
    /// Capture group holding the candidate text (0 = whole match)
    pub group: usize,
    /// Remove [`NAME_SEPARATORS`] from the candidate text
    pub strip_separators: bool,
}

/// Validity bounds for one category
#[derive(Debug, Clone, Copy)]
pub struct CategoryRules {
    /// Minimum candidate length in characters
    pub min_chars: usize,
    /// Maximum candidate length in characters
    pub max_chars: usize,
    /// Common words that are never proposed
    pub stop_words: &'static [&'static str],
}

/// Ordered pattern groups plus per-category validity rules
#[derive(Debug)]
pub struct PatternLibrary {
    patterns: Vec<EntityPattern>,
}

/// Extraction order; also the order candidates are produced in
pub const CATEGORY_ORDER: [EntryCategory; 4] = [
    EntryCategory::Character,
    EntryCategory::Location,
    EntryCategory::Item,
    EntryCategory::Organization,
];

/// Built-in pattern library
pub static PATTERNS: Lazy<PatternLibrary> = Lazy::new(PatternLibrary::builtin);

impl PatternLibrary {
    /// Build the built-in Japanese pattern set
    pub fn builtin() -> Self {
        let mut library = Self {
            patterns: Vec::new(),
        };
        library.init_character_patterns();
        library.init_location_patterns();
        library.init_item_patterns();
        library.init_organization_patterns();
        library
    }

    fn init_character_patterns(&mut self) {
        // Katakana full name: アリス・スミス
        self.add_pattern(
            r"[ァ-ヶー]{2,}(?:[・＝][ァ-ヶー]{2,})+",
            EntryCategory::Character,
            0,
            false,
        );
        // Kanji name followed by an honorific: 桜子さん
        self.add_pattern(
            &format!(r"([一-龯]{{1,4}})(?:{})", HONORIFICS.join("|")),
            EntryCategory::Character,
            1,
            false,
        );
        // Katakana name followed by an honorific: リリィ様
        self.add_pattern(
            &format!(r"([ァ-ヶー]{{2,8}})(?:{})", HONORIFICS.join("|")),
            EntryCategory::Character,
            1,
            false,
        );
        // Kanji surname and given name with a separator: 山田・太郎
        self.add_pattern(
            r"[一-龯]{1,4}[・　 ][一-龯]{1,4}",
            EntryCategory::Character,
            0,
            true,
        );
        // Lone katakana name before a particle, not part of a full name
        self.add_pattern(
            r"(?:^|[^ァ-ヶー・＝])([ァ-ヶー]{2,8})(?:は|が|を|に|と|も)",
            EntryCategory::Character,
            1,
            false,
        );
    }

    fn init_location_patterns(&mut self) {
        // Name ending in a place suffix: 白銀城
        self.add_pattern(
            &format!(r"[一-龯ァ-ヶー]{{1,8}}(?:{})", LOCATION_SUFFIXES.join("|")),
            EntryCategory::Location,
            0,
            false,
        );
        // Kanji compound followed by a locative particle
        self.add_pattern(
            r"([一-龯]{2,8})(?:で|に|から|へ|まで)",
            EntryCategory::Location,
            1,
            false,
        );
    }

    fn init_item_patterns(&mut self) {
        // Kanji compound marked as object or subject
        self.add_pattern(r"([一-龯]{2,6})(?:を|が|は)", EntryCategory::Item, 1, false);
        // Word ending in a weapon or tool character: 聖剣, 剣
        let weapons: String = WEAPON_SUFFIXES.iter().collect();
        self.add_pattern(
            &format!(r"[一-龯ァ-ヶー]{{0,4}}[{weapons}]"),
            EntryCategory::Item,
            0,
            false,
        );
        // Noun after a magical adjective: 伝説の宝玉
        self.add_pattern(
            &format!(
                r"(?:{})([一-龯ァ-ヶー]{{1,6}})",
                MAGICAL_ADJECTIVES.join("|")
            ),
            EntryCategory::Item,
            1,
            false,
        );
    }

    fn init_organization_patterns(&mut self) {
        self.add_pattern(
            &format!(
                r"[一-龯ァ-ヶー]{{1,8}}(?:{})",
                ORGANIZATION_SUFFIXES.join("|")
            ),
            EntryCategory::Organization,
            0,
            false,
        );
    }

    /// Add a regex pattern; invalid patterns are skipped
    fn add_pattern(
        &mut self,
        pattern: &str,
        category: EntryCategory,
        group: usize,
        strip_separators: bool,
    ) {
        match Regex::new(pattern) {
            Ok(regex) => self.patterns.push(EntityPattern {
                regex,
                category,
                group,
                strip_separators,
            }),
            Err(e) => tracing::warn!(pattern, error = %e, "skipping invalid pattern"),
        }
    }

    /// Patterns for one category, in order
    pub fn patterns_for(&self, category: EntryCategory) -> impl Iterator<Item = &EntityPattern> {
        self.patterns.iter().filter(move |p| p.category == category)
    }

    /// Total number of compiled patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Validity rules for an extractable category
pub fn rules_for(category: EntryCategory) -> CategoryRules {
    match category {
        EntryCategory::Character => CategoryRules {
            min_chars: 2,
            max_chars: 16,
            stop_words: &[
                "自分", "相手", "人間", "彼女", "彼ら", "私達", "僕達", "皆さん", "誰か", "何か",
                "今日", "明日", "昨日", "時間", "場所",
            ],
        },
        EntryCategory::Location => CategoryRules {
            min_chars: 2,
            max_chars: 12,
            stop_words: &[
                "ここ", "そこ", "あそこ", "場所", "時間", "自分", "相手", "今日", "明日", "昨日",
                "世界", "一緒", "最後", "最初",
            ],
        },
        EntryCategory::Item => CategoryRules {
            min_chars: 1,
            max_chars: 10,
            stop_words: &[
                "こと", "もの", "時間", "場所", "人間", "自分", "相手", "彼女", "今日", "明日",
                "昨日", "何か",
            ],
        },
        EntryCategory::Organization => CategoryRules {
            min_chars: 3,
            max_chars: 16,
            stop_words: &["全部", "一部", "内部", "外部", "細部", "部分", "幹部"],
        },
        EntryCategory::Event | EntryCategory::Concept => CategoryRules {
            min_chars: usize::MAX,
            max_chars: 0,
            stop_words: &[],
        },
    }
}

/// Whether `text` ends in one of the organization suffixes
pub fn has_organization_suffix(text: &str) -> bool {
    ORGANIZATION_SUFFIXES.iter().any(|s| text.ends_with(s))
}

/// Whether `text` ends in a weapon or tool character
pub fn has_weapon_suffix(text: &str) -> bool {
    text.chars()
        .last()
        .is_some_and(|c| WEAPON_SUFFIXES.contains(&c))
}
