//! Individual resolution rules.
//!
//! Each rule is a pure function of the reference tables, the raw location
//! string and the report date. A rule returns `None` when it does not apply,
//! letting the next rule in the list try.

use chrono::NaiveDate;

use crate::data::tables::{DIAMOND_PRINCESS, GRAND_PRINCESS, ReferenceTables};
use crate::domain::LocationKey;

/// Outcome of resolving a raw location string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Key(LocationKey),
    Unresolved,
}

pub type RuleFn = fn(&ReferenceTables, &str, NaiveDate) -> Option<Resolution>;

/// A named rule; the name shows up in debug logs.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub apply: RuleFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// On 2020-02-21 three evacuee sites were reported as if they were local
/// county cases; they are Diamond Princess passengers.
const EVACUEE_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2020, 2, 21) {
    Some(d) => d,
    None => panic!("invalid evacuee date"),
};
const EVACUEE_SITES: [&str; 3] = ["Lackland, TX", "Travis, CA", "Ashland, NE"];

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn misattributed_evacuees(_: &ReferenceTables, raw: &str, date: NaiveDate) -> Option<Resolution> {
    if date != EVACUEE_DATE {
        return None;
    }
    EVACUEE_SITES
        .iter()
        .any(|site| raw.contains(site))
        .then(|| Resolution::Key(LocationKey::new(DIAMOND_PRINCESS)))
}

pub fn diamond_princess(_: &ReferenceTables, raw: &str, _: NaiveDate) -> Option<Resolution> {
    contains_ignore_case(raw, DIAMOND_PRINCESS).then(|| Resolution::Key(LocationKey::new(DIAMOND_PRINCESS)))
}

pub fn grand_princess(_: &ReferenceTables, raw: &str, _: NaiveDate) -> Option<Resolution> {
    contains_ignore_case(raw, GRAND_PRINCESS).then(|| Resolution::Key(LocationKey::new(GRAND_PRINCESS)))
}

pub fn us_virgin_islands(_: &ReferenceTables, raw: &str, _: NaiveDate) -> Option<Resolution> {
    (raw.trim() == "Virgin Islands, U.S.").then(|| Resolution::Key(LocationKey::new("virgin islands")))
}

/// `"Snohomish, WA"` → `washington`: the text after the comma is a postal code.
pub fn state_abbreviation(tables: &ReferenceTables, raw: &str, _: NaiveDate) -> Option<Resolution> {
    let (_, abbr) = raw.split_once(',')?;
    let abbr: String = abbr.split(',').next().unwrap_or("").chars().filter(|c| !c.is_whitespace()).collect();
    Some(match tables.state_for_abbr(&abbr) {
        Some(key) => Resolution::Key(key.clone()),
        None => Resolution::Unresolved,
    })
}

/// Full state or territory name (`"Washington"`).
pub fn state_name(tables: &ReferenceTables, raw: &str, _: NaiveDate) -> Option<Resolution> {
    Some(match tables.state_for_name(raw) {
        Some(key) => Resolution::Key(key.clone()),
        None => Resolution::Unresolved,
    })
}

/// Known country-name variants (`"Korea, South"` → `south korea`).
pub fn country_alias(tables: &ReferenceTables, raw: &str, _: NaiveDate) -> Option<Resolution> {
    tables.country_alias(raw).map(|key| Resolution::Key(key.clone()))
}

/// Any other country name is its own key.
pub fn country_name(_: &ReferenceTables, raw: &str, _: NaiveDate) -> Option<Resolution> {
    let key = LocationKey::new(raw);
    Some(if key.as_str().is_empty() {
        Resolution::Unresolved
    } else {
        Resolution::Key(key)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> ReferenceTables {
        ReferenceTables::builtin()
    }

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, d).unwrap()
    }

    fn key(s: &str) -> Option<Resolution> {
        Some(Resolution::Key(LocationKey::new(s)))
    }

    #[test]
    fn evacuee_rule_only_fires_on_its_date() {
        let t = tables();
        assert_eq!(misattributed_evacuees(&t, "Travis, CA", day(2, 21)), key("diamond princess"));
        assert_eq!(misattributed_evacuees(&t, "Travis, CA", day(2, 22)), None);
        assert_eq!(misattributed_evacuees(&t, "Sacramento County, CA", day(2, 21)), None);
    }

    #[test]
    fn ship_rules_match_anywhere_in_the_string() {
        let t = tables();
        assert_eq!(
            diamond_princess(&t, "Unassigned Location (From Diamond Princess)", day(3, 1)),
            key("diamond princess")
        );
        assert_eq!(grand_princess(&t, "Grand Princess Cruise Ship", day(3, 1)), key("grand princess"));
        assert_eq!(grand_princess(&t, "California", day(3, 1)), None);
    }

    #[test]
    fn abbreviation_rule() {
        let t = tables();
        assert_eq!(state_abbreviation(&t, "Snohomish, WA", day(3, 1)), key("washington"));
        assert_eq!(state_abbreviation(&t, "Washington, D.C.", day(3, 1)), key("district of columbia"));
        assert_eq!(state_abbreviation(&t, "Somewhere, XX", day(3, 1)), Some(Resolution::Unresolved));
        assert_eq!(state_abbreviation(&t, "Washington", day(3, 1)), None);
    }

    #[test]
    fn country_rules() {
        let t = tables();
        assert_eq!(country_alias(&t, "Iran (Islamic Republic of)", day(3, 1)), key("iran"));
        assert_eq!(country_alias(&t, "Italy", day(3, 1)), None);
        assert_eq!(country_name(&t, " Azerbaijan", day(3, 1)), key("azerbaijan"));
        assert_eq!(country_name(&t, "  ", day(3, 1)), Some(Resolution::Unresolved));
    }
}
