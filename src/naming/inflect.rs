//! English inflection for entity and collection names
//!
//! Rules are tried in order and the first matching one wins. Irregular words
//! and uncountables are matched against the last camel-case hump so that
//! `SalesPerson` pluralizes like `person`.

use std::sync::OnceLock;

use regex::Regex;

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("zombie", "zombies"),
];

const PLURAL_RULES: &[(&str, &str)] = &[
    ("(quiz)$", "${1}zes"),
    ("^(oxen)$", "${1}"),
    ("^(ox)$", "${1}en"),
    ("([m|l])ice$", "${1}ice"),
    ("([m|l])ouse$", "${1}ice"),
    ("(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
    ("(x|ch|ss|sh)$", "${1}es"),
    ("([^aeiouy]|qu)y$", "${1}ies"),
    ("(hive)$", "${1}s"),
    ("(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
    ("sis$", "ses"),
    ("([ti])a$", "${1}a"),
    ("([ti])um$", "${1}a"),
    ("(buffal|tomat)o$", "${1}oes"),
    ("(bu)s$", "${1}ses"),
    ("(alias|status)$", "${1}es"),
    ("(octop|vir)i$", "${1}i"),
    ("(octop|vir)us$", "${1}i"),
    ("^(ax|test)is$", "${1}es"),
    ("s$", "s"),
    ("$", "s"),
];

const SINGULAR_RULES: &[(&str, &str)] = &[
    ("(database)s$", "${1}"),
    ("(quiz)zes$", "${1}"),
    ("(matr)ices$", "${1}ix"),
    ("(vert|ind)ices$", "${1}ex"),
    ("^(ox)en", "${1}"),
    ("(alias|status)(es)?$", "${1}"),
    ("(octop|vir)(us|i)$", "${1}us"),
    ("^(a)x[ie]s$", "${1}xis"),
    ("(cris|test)(is|es)$", "${1}is"),
    ("(shoe)s$", "${1}"),
    ("(o)es$", "${1}"),
    ("(bus)(es)?$", "${1}"),
    ("([m|l])ice$", "${1}ouse"),
    ("(x|ch|ss|sh)es$", "${1}"),
    ("(m)ovies$", "${1}ovie"),
    ("(s)eries$", "${1}eries"),
    ("([^aeiouy]|qu)ies$", "${1}y"),
    ("([lr])ves$", "${1}f"),
    ("(tive)s$", "${1}"),
    ("(hive)s$", "${1}"),
    ("([^f])ves$", "${1}fe"),
    ("(^analy)(sis|ses)$", "${1}sis"),
    ("((a)naly|(b)a|(d)iagno|(p)arenthe|(p)rogno|(s)ynop|(t)he)(sis|ses)$", "${1}sis"),
    ("([ti])a$", "${1}um"),
    ("(n)ews$", "${1}ews"),
    ("(ss)$", "${1}"),
    ("s$", ""),
];

struct RuleSet {
    plural: Vec<(Regex, &'static str)>,
    singular: Vec<(Regex, &'static str)>,
}

fn compile(rules: &'static [(&'static str, &'static str)]) -> Vec<(Regex, &'static str)> {
    rules
        .iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(&format!("(?i){pattern}"))
                .ok()
                .map(|re| (re, *replacement))
        })
        .collect()
}

fn rules() -> &'static RuleSet {
    static RULES: OnceLock<RuleSet> = OnceLock::new();
    RULES.get_or_init(|| RuleSet {
        plural: compile(PLURAL_RULES),
        singular: compile(SINGULAR_RULES),
    })
}

/// Byte offset of the last camel-case hump (0 for single-word names)
fn last_hump(word: &str) -> usize {
    word.char_indices()
        .skip(1)
        .filter(|(_, c)| c.is_uppercase())
        .map(|(i, _)| i)
        .last()
        .unwrap_or(0)
}

/// Replace the word ending at byte offset `at`, keeping the case of its first letter
fn swap_tail(word: &str, at: usize, replacement: &str) -> String {
    let head = &word[..at];
    let upper = word[at..].chars().next().is_some_and(char::is_uppercase);
    let mut chars = replacement.chars();
    let first = match chars.next() {
        Some(c) if upper => c.to_uppercase().collect::<String>(),
        Some(c) => c.to_string(),
        None => String::new(),
    };
    format!("{head}{first}{}", chars.as_str())
}

fn inflect(word: &str, to_plural: bool) -> String {
    if word.is_empty() {
        return String::new();
    }

    let hump = last_hump(word);
    let tail = word[hump..].to_lowercase();
    if UNCOUNTABLE.contains(&tail.as_str()) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        let (from, to) = if to_plural {
            (singular, plural)
        } else {
            (plural, singular)
        };
        if tail == *from {
            return swap_tail(word, hump, to);
        }
    }

    let set = rules();
    let table = if to_plural { &set.plural } else { &set.singular };
    for (re, replacement) in table {
        if re.is_match(word) {
            return re.replace(word, *replacement).into_owned();
        }
    }
    word.to_string()
}

/// Plural form of a word (`Category` → `Categories`)
pub fn pluralize(word: &str) -> String {
    inflect(word, true)
}

/// Singular form of a word (`categories` → `category`)
pub fn singularize(word: &str) -> String {
    inflect(word, false)
}
