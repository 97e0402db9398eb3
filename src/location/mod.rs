//! Location normalization: raw free-text location strings → canonical keys.
//!
//! Resolution is an ordered list of rules. Special cases (cruise ships,
//! misattributed evacuees) sit in front of the general abbreviation/name rules,
//! and the first rule that applies wins.

use chrono::NaiveDate;
use tracing::debug;

use crate::data::ReferenceTables;
use crate::domain::Scope;

pub mod rules;

pub use rules::{Resolution, Rule};

static US_RULES: [Rule; 6] = [
    Rule { name: "misattributed-evacuees", apply: rules::misattributed_evacuees },
    Rule { name: "diamond-princess", apply: rules::diamond_princess },
    Rule { name: "grand-princess", apply: rules::grand_princess },
    Rule { name: "us-virgin-islands", apply: rules::us_virgin_islands },
    Rule { name: "state-abbreviation", apply: rules::state_abbreviation },
    Rule { name: "state-name", apply: rules::state_name },
];

static WORLD_RULES: [Rule; 2] = [
    Rule { name: "country-alias", apply: rules::country_alias },
    Rule { name: "country-name", apply: rules::country_name },
];

#[derive(Debug, Clone)]
pub struct LocationNormalizer<'a> {
    tables: &'a ReferenceTables,
    rules: &'static [Rule],
}

impl<'a> LocationNormalizer<'a> {
    pub fn new(scope: Scope, tables: &'a ReferenceTables) -> Self {
        let rules: &'static [Rule] = match scope {
            Scope::Us => &US_RULES,
            Scope::World => &WORLD_RULES,
        };
        Self { tables, rules }
    }

    pub fn normalize(&self, raw: &str, date: NaiveDate) -> Resolution {
        for rule in self.rules {
            let Some(resolution) = (rule.apply)(self.tables, raw, date) else {
                continue;
            };
            if let Resolution::Key(key) = &resolution {
                if key.as_str() != raw.trim().to_lowercase() {
                    debug!(raw, %key, rule = rule.name, "location aliased");
                }
            }
            return resolution;
        }
        Resolution::Unresolved
    }
}
