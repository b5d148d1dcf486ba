//! Naming utilities
//!
//! Pure string functions that derive the names renderers and the linker
//! agree on: relation names from foreign-key columns, plural forms, short
//! receiver names, URL slugs and the conventional search names.
//!
//! Casing conventions:
//! - storage names are snake case (`category_id`)
//! - column names are camel case with an upper-case identifier suffix (`CategoryID`)
//! - variable names are lower camel case with a softened suffix (`categoryId`)

pub mod inflect;
mod set;

use std::sync::OnceLock;

use regex::Regex;

pub use set::OrderedSet;

/// Identifier suffix of foreign-key columns
pub const ID: &str = "ID";
/// Identifier suffix of array foreign-key columns
pub const IDS: &str = "IDs";

const ID_SOFT: &str = "Id";
const IDS_SOFT: &str = "Ids";

/// Identifiers the generated code declares for itself
const GENERATOR_RESERVED: &[&str] = &[
    "Columns",
    "Tables",
    "Searcher",
    "ErrEmptyValue",
    "ErrMaxLength",
    "ErrWrongValue",
    "Status",
    "OpFunc",
];

// =============================================================================
// Casing
// =============================================================================

/// Upper camel case: split on `_`, `-`, `.` and spaces, capitalize each part
pub fn camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;

    for c in s.chars() {
        if c == '_' || c == '-' || c == '.' || c == ' ' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Lower-case the first character
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Upper-case the first character
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replace `suffix` with `with` when `s` ends with it
pub fn replace_suffix(s: &str, suffix: &str, with: &str) -> String {
    match s.strip_suffix(suffix) {
        Some(stem) => format!("{stem}{with}"),
        None => s.to_string(),
    }
}

/// Snake case (`NewsCategory` → `news_category`, `CategoryID` → `category_id`)
pub fn underscore(s: &str) -> String {
    let s = replace_suffix(s, IDS, IDS_SOFT);
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                    result.push('_');
                }
            }
            result.extend(c.to_lowercase());
        } else if c == '-' || c == ' ' {
            result.push('_');
        } else {
            result.push(c);
        }
    }

    result
}

/// Attribute display name for a storage column (`category_id` → `CategoryID`)
pub fn column_name(s: &str) -> String {
    let camel = camel_case(s);
    if camel.ends_with(IDS_SOFT) {
        replace_suffix(&camel, IDS_SOFT, IDS)
    } else {
        replace_suffix(&camel, ID_SOFT, ID)
    }
}

/// Entity name for a storage table (`categories` → `Category`)
pub fn entity_name(s: &str) -> String {
    camel_case(&inflect::singularize(s))
}

/// Lower camel variable name (`CategoryID` → `categoryId`, `TagIDs` → `tagIds`)
pub fn var_name(s: &str) -> String {
    let softened = if s.ends_with(ID) {
        replace_suffix(s, ID, ID_SOFT)
    } else {
        replace_suffix(s, IDS, IDS_SOFT)
    };
    lower_first(&softened)
}

/// JSON field name, same convention as [`var_name`]
pub fn json_name(s: &str) -> String {
    var_name(s)
}

/// Hyphenated lower-case name for URLs (`NewsCategory` → `news-category`)
pub fn url_name(s: &str) -> String {
    underscore(s).replace('_', "-")
}

/// Relation name of a foreign-key column (`CategoryID` → `Category`)
pub fn fk_name(s: &str) -> String {
    replace_suffix(&column_name(s), ID, "")
}

/// Entity name encoded in an array foreign-key name (`TagIDs` → `Tag`)
pub fn strip_ids_suffix(s: &str) -> Option<&str> {
    s.strip_suffix(IDS)
        .or_else(|| s.strip_suffix(IDS_SOFT))
        .filter(|stem| !stem.is_empty())
}

/// Plural form used for collections
///
/// Names ending in the identifier suffix only get a trailing `s`; words the
/// inflection tables leave unchanged get one too unless they already end in `s`.
pub fn make_plural(name: &str) -> String {
    if name.ends_with(ID) || name.ends_with(ID_SOFT) {
        return format!("{name}s");
    }

    let plural = inflect::pluralize(name);
    if plural != name {
        plural
    } else if !name.ends_with('s') {
        format!("{name}s")
    } else {
        name.to_string()
    }
}

/// Short receiver name built from the first letters of each camel hump
///
/// Leading letters are dropped until the result is neither a keyword nor a
/// generator-reserved identifier; falls back to [`var_name`].
pub fn short_var_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut letters = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if i == 0 {
            letters.extend(c.to_lowercase());
        } else if c.is_uppercase() && chars[i - 1].is_lowercase() {
            letters.extend(c.to_lowercase());
        }
    }

    for (at, _) in letters.char_indices() {
        let candidate = &letters[at..];
        if !is_reserved(candidate) && !is_reserved_by_generator(candidate) {
            return candidate.to_string();
        }
    }

    var_name(name)
}

// =============================================================================
// Reserved Words
// =============================================================================

/// Keyword of the languages generated code is emitted in, ignoring case
pub fn is_reserved(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        // data-access layer
        "break" | "case" | "chan" | "const" | "continue" | "default" | "defer" |
        "else" | "fallthrough" | "for" | "func" | "go" | "goto" | "if" |
        "import" | "interface" | "map" | "package" | "range" | "return" |
        "select" | "struct" | "switch" | "type" | "var" |
        // typed clients
        "as" | "async" | "await" | "crate" | "dyn" | "enum" | "extern" |
        "false" | "fn" | "impl" | "in" | "let" | "loop" | "match" | "mod" |
        "move" | "mut" | "pub" | "ref" | "self" | "static" | "super" |
        "trait" | "true" | "unsafe" | "use" | "where" | "while"
    )
}

/// Identifier the generated code declares itself (exact match)
pub fn is_reserved_by_generator(s: &str) -> bool {
    GENERATOR_RESERVED.contains(&s)
}

/// Plain identifier: a letter or `_` followed by letters, digits and `_`
pub fn is_identifier(s: &str) -> bool {
    static IDENT: OnceLock<Option<Regex>> = OnceLock::new();
    IDENT
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(s))
}

/// Conventional status column
pub fn is_status(s: &str) -> bool {
    s.eq_ignore_ascii_case("statusid") || s.eq_ignore_ascii_case("status_id")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_and_column_names() {
        assert_eq!(camel_case("news_category"), "NewsCategory");
        assert_eq!(camel_case("newsCategory"), "NewsCategory");
        assert_eq!(column_name("category_id"), "CategoryID");
        assert_eq!(column_name("tag_ids"), "TagIDs");
        assert_eq!(column_name("title"), "Title");
        assert_eq!(entity_name("categories"), "Category");
        assert_eq!(entity_name("news"), "News");
    }

    #[test]
    fn test_underscore() {
        assert_eq!(underscore("NewsCategory"), "news_category");
        assert_eq!(underscore("CategoryID"), "category_id");
        assert_eq!(underscore("TagIDs"), "tag_ids");
        assert_eq!(underscore("HTTPServer"), "http_server");
    }

    #[test]
    fn test_var_and_url_names() {
        assert_eq!(var_name("CategoryID"), "categoryId");
        assert_eq!(var_name("TagIDs"), "tagIds");
        assert_eq!(var_name("ID"), "id");
        assert_eq!(var_name("Title"), "title");
        assert_eq!(url_name("NewsCategory"), "news-category");
        assert_eq!(url_name("News"), "news");
    }

    #[test]
    fn test_fk_name() {
        assert_eq!(fk_name("CategoryID"), "Category");
        assert_eq!(fk_name("category_id"), "Category");
        assert_eq!(fk_name("Title"), "Title");
    }

    #[test]
    fn test_make_plural() {
        assert_eq!(make_plural("TagID"), "TagIDs");
        assert_eq!(make_plural("Category"), "Categories");
        assert_eq!(make_plural("News"), "News");
        assert_eq!(make_plural("Equipment"), "Equipments");
        assert_eq!(make_plural("User"), "Users");
    }

    #[test]
    fn test_short_var_name() {
        assert_eq!(short_var_name("News"), "n");
        assert_eq!(short_var_name("NewsCategory"), "nc");
        assert_eq!(short_var_name("IfFalse"), "f");
        assert_eq!(short_var_name("UserHTTPRequest"), "uh");
        assert_eq!(short_var_name(""), "");
    }

    #[test]
    fn test_strip_ids_suffix() {
        assert_eq!(strip_ids_suffix("TagIDs"), Some("Tag"));
        assert_eq!(strip_ids_suffix("TagIds"), Some("Tag"));
        assert_eq!(strip_ids_suffix("IDs"), None);
        assert_eq!(strip_ids_suffix("Tags"), None);
    }

    #[test]
    fn test_reserved() {
        assert!(is_reserved("func"));
        assert!(is_reserved("type"));
        assert!(is_reserved("Map"));
        assert!(is_reserved("FUNC"));
        assert!(!is_reserved("news"));
        assert!(is_reserved_by_generator("Columns"));
        assert!(is_reserved_by_generator("Status"));
        assert!(!is_reserved_by_generator("status"));
        assert!(!is_reserved_by_generator("columns"));
        assert!(!is_reserved_by_generator("Category"));
        assert!(is_identifier("News_2"));
        assert!(!is_identifier("2News"));
        assert!(is_status("StatusID"));
    }
}
