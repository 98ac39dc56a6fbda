//! # Case Conventions
//!
//! Classifies object keys as camelCase, snake_case, kebab-case or PascalCase.
//!
//! A key passes a convention when rewriting it into that convention leaves it
//! unchanged. Rewriting keeps leading and trailing runs of `_` and `-`, so
//! HAL-style keys such as `_links` pass, and it is idempotent: a rewritten
//! key always passes. Two inputs are defined specially:
//!
//! - the empty string always passes;
//! - a single character passes when it already carries the trivial casing of
//!   the convention (lowercase for camel/snake/kebab, uppercase for Pascal),
//!   or when rewriting leaves it unchanged. Characters without case, such as
//!   digits, pass every convention.
//!
//! The schema tester never inspects casing itself. It receives a
//! [`CaseCheck`] function pointer, selected from configuration via
//! [`checker_for`], and calls it for every key it visits.

use std::fmt;
use std::str::FromStr;

use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToSnakeCase};
use serde::{Deserialize, Serialize};

use crate::error::{CaseError, ConfigError};

/// Upper bound on rewrite passes over a key's core. Real keys settle after
/// one or two.
const MAX_REWRITES: usize = 8;

/// Signature shared by every case check, including [`skip`].
pub type CaseCheck = fn(&str) -> Result<(), CaseError>;

/// A supported key naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseConvention {
    /// `userName`
    #[serde(rename = "camelCase")]
    Camel,
    /// `user_name`
    #[serde(rename = "snake_case")]
    Snake,
    /// `user-name`
    #[serde(rename = "kebab-case")]
    Kebab,
    /// `UserName`
    #[serde(rename = "PascalCase")]
    Pascal,
}

impl CaseConvention {
    /// All conventions, in declaration order.
    pub const ALL: [CaseConvention; 4] = [
        CaseConvention::Camel,
        CaseConvention::Snake,
        CaseConvention::Kebab,
        CaseConvention::Pascal,
    ];

    /// The conventional name of this case style, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseConvention::Camel => "camelCase",
            CaseConvention::Snake => "snake_case",
            CaseConvention::Kebab => "kebab-case",
            CaseConvention::Pascal => "PascalCase",
        }
    }

    /// Rewrite `key` into this convention.
    pub fn convert(&self, key: &str) -> String {
        match self {
            CaseConvention::Camel => to_camel_case(key),
            CaseConvention::Snake => to_snake_case(key),
            CaseConvention::Kebab => to_kebab_case(key),
            CaseConvention::Pascal => to_pascal_case(key),
        }
    }

    /// The check function for this convention.
    pub fn checker(&self) -> CaseCheck {
        match self {
            CaseConvention::Camel => is_camel_case,
            CaseConvention::Snake => is_snake_case,
            CaseConvention::Kebab => is_kebab_case,
            CaseConvention::Pascal => is_pascal_case,
        }
    }

    /// Check `key` against this convention.
    pub fn check(&self, key: &str) -> Result<(), CaseError> {
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(()),
            (Some(c), None) => {
                let expected = self.convert(key);
                if self.has_trivial_casing(c) || expected == key {
                    Ok(())
                } else {
                    Err(CaseError::new(key, *self, expected))
                }
            }
            _ => {
                let expected = self.convert(key);
                if expected == key {
                    Ok(())
                } else {
                    Err(CaseError::new(key, *self, expected))
                }
            }
        }
    }

    fn has_trivial_casing(&self, c: char) -> bool {
        match self {
            CaseConvention::Pascal => !c.is_lowercase(),
            _ => !c.is_uppercase(),
        }
    }
}

impl fmt::Display for CaseConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseConvention {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseConvention::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownCase(s.to_string()))
    }
}

/// Select the check to inject into the tester. `None` disables case checking.
pub fn checker_for(convention: Option<CaseConvention>) -> CaseCheck {
    convention.map_or(skip as CaseCheck, |c| c.checker())
}

/// Raise unless `key` is camelCase.
pub fn is_camel_case(key: &str) -> Result<(), CaseError> {
    CaseConvention::Camel.check(key)
}

/// Raise unless `key` is snake_case.
pub fn is_snake_case(key: &str) -> Result<(), CaseError> {
    CaseConvention::Snake.check(key)
}

/// Raise unless `key` is kebab-case.
pub fn is_kebab_case(key: &str) -> Result<(), CaseError> {
    CaseConvention::Kebab.check(key)
}

/// Raise unless `key` is PascalCase.
pub fn is_pascal_case(key: &str) -> Result<(), CaseError> {
    CaseConvention::Pascal.check(key)
}

/// Accept every key.
pub fn skip(_key: &str) -> Result<(), CaseError> {
    Ok(())
}

pub fn to_camel_case(key: &str) -> String {
    rewrite(key, |core| core.to_lower_camel_case())
}

pub fn to_snake_case(key: &str) -> String {
    rewrite(key, |core| core.to_snake_case())
}

pub fn to_kebab_case(key: &str) -> String {
    rewrite(key, |core| core.to_kebab_case())
}

pub fn to_pascal_case(key: &str) -> String {
    rewrite(key, |core| core.to_pascal_case())
}

fn is_separator(c: char) -> bool {
    c == '_' || c == '-'
}

/// Apply `convert` to the part of `key` between its leading and trailing
/// separator runs, repeating until the result is stable. Case mappings such
/// as `İ` to `i̇` can change a key's word boundaries, so one pass may not be.
fn rewrite(key: &str, convert: fn(&str) -> String) -> String {
    let rest = key.trim_start_matches(is_separator);
    let prefix = &key[..key.len() - rest.len()];
    let core = rest.trim_end_matches(is_separator);
    let suffix = &rest[core.len()..];

    let mut core = convert(core);
    for _ in 0..MAX_REWRITES {
        let next = convert(&core);
        if next == core {
            break;
        }
        core = next;
    }
    format!("{prefix}{core}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_accepts_camel_keys() {
        assert!(is_camel_case("userName").is_ok());
        assert!(is_camel_case("id").is_ok());
        assert!(is_camel_case("createdAt2").is_ok());
    }

    #[test]
    fn camel_case_rejects_other_styles() {
        for key in ["user_name", "user-name", "UserName"] {
            let err = is_camel_case(key).unwrap_err();
            assert_eq!(err.expected, "userName");
            assert_eq!(err.convention, CaseConvention::Camel);
        }
    }

    #[test]
    fn snake_case_names_expected_form() {
        let err = is_snake_case("userName").unwrap_err();
        assert_eq!(err.key, "userName");
        assert_eq!(err.expected, "user_name");
        assert!(is_snake_case("user_name").is_ok());
    }

    #[test]
    fn kebab_case_checks() {
        assert!(is_kebab_case("user-name").is_ok());
        assert_eq!(is_kebab_case("user_name").unwrap_err().expected, "user-name");
    }

    #[test]
    fn pascal_case_checks() {
        assert!(is_pascal_case("UserName").is_ok());
        assert_eq!(is_pascal_case("userName").unwrap_err().expected, "UserName");
    }

    #[test]
    fn empty_key_passes_every_convention() {
        for convention in CaseConvention::ALL {
            assert!(convention.check("").is_ok(), "{convention}");
        }
    }

    #[test]
    fn single_character_uses_trivial_casing() {
        assert!(is_camel_case("a").is_ok());
        assert!(is_camel_case("A").is_err());
        assert!(is_snake_case("a").is_ok());
        assert!(is_kebab_case("B").is_err());
        assert!(is_pascal_case("A").is_ok());
        assert!(is_pascal_case("a").is_err());
    }

    #[test]
    fn single_digit_passes_every_convention() {
        for convention in CaseConvention::ALL {
            assert!(convention.check("7").is_ok(), "{convention}");
        }
    }

    #[test]
    fn leading_and_trailing_separators_are_kept() {
        for key in ["_links", "_embedded", "id_", "__meta__"] {
            assert!(is_snake_case(key).is_ok(), "{key}");
            assert!(is_camel_case(key).is_ok(), "{key}");
        }
        assert!(is_kebab_case("-x-trace").is_ok());
        assert_eq!(to_snake_case("_userName"), "_user_name");
        assert_eq!(to_camel_case("_user_name_"), "_userName_");
        assert_eq!(to_pascal_case("--self"), "--Self");
        assert_eq!(is_snake_case("_userName").unwrap_err().expected, "_user_name");
    }

    #[test]
    fn separator_only_keys_are_stable() {
        for convention in CaseConvention::ALL {
            assert_eq!(convention.convert("__"), "__");
            assert!(convention.check("_").is_ok(), "{convention}");
        }
    }

    #[test]
    fn conversion_of_non_ascii_keys_is_stable() {
        for convention in CaseConvention::ALL {
            let converted = convention.convert("İstanbul");
            assert!(convention.check(&converted).is_ok(), "{convention}: {converted:?}");
        }
    }

    #[test]
    fn uncased_letters_pass_alone() {
        // U+1D400 is uppercase but has no lowercase mapping.
        for convention in CaseConvention::ALL {
            assert!(convention.check("\u{1D400}").is_ok(), "{convention}");
        }
    }

    #[test]
    fn skip_accepts_anything() {
        assert!(skip("Not_A-validKey").is_ok());
        assert!(checker_for(None)("Not_A-validKey").is_ok());
    }

    #[test]
    fn checker_for_selects_convention() {
        let check = checker_for(Some(CaseConvention::Snake));
        assert!(check("user_name").is_ok());
        assert!(check("userName").is_err());
    }

    #[test]
    fn convention_round_trips_through_name() {
        for convention in CaseConvention::ALL {
            let parsed: CaseConvention = convention.as_str().parse().unwrap();
            assert_eq!(parsed, convention);
        }
        assert!("Title Case".parse::<CaseConvention>().is_err());
    }

    #[test]
    fn convention_deserializes_from_option_name() {
        let parsed: CaseConvention = serde_json::from_str("\"kebab-case\"").unwrap();
        assert_eq!(parsed, CaseConvention::Kebab);
    }
}
