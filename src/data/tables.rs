//! Static reference tables: state abbreviations, populations, country aliases.
//!
//! Population figures are point-in-time estimates (2019/2020) and do not vary
//! across the report range.

use std::collections::HashMap;

use crate::domain::{LocationKey, Scope};

pub const DIAMOND_PRINCESS: &str = "diamond princess";
pub const GRAND_PRINCESS: &str = "grand princess";

/// Population assumed for each cruise ship.
const SHIP_POPULATION: u64 = 3000;

const STATE_ABBREVIATIONS: [(&str, &str); 53] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("D.C.", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
    ("VI", "Virgin Islands"),
    ("PR", "Puerto Rico"),
];

const STATE_POPULATIONS: [(&str, u64); 53] = [
    ("alabama", 4_903_185),
    ("alaska", 731_545),
    ("arizona", 7_278_717),
    ("arkansas", 3_017_825),
    ("california", 39_512_223),
    ("colorado", 5_758_736),
    ("connecticut", 3_565_287),
    ("delaware", 973_764),
    ("district of columbia", 705_749),
    ("florida", 21_477_737),
    ("georgia", 10_617_423),
    ("hawaii", 1_415_872),
    ("idaho", 1_787_147),
    ("illinois", 12_671_821),
    ("indiana", 6_732_219),
    ("iowa", 3_155_070),
    ("kansas", 2_913_314),
    ("kentucky", 4_467_673),
    ("louisiana", 4_648_794),
    ("maine", 1_344_212),
    ("maryland", 6_045_680),
    ("massachusetts", 6_949_503),
    ("michigan", 9_986_857),
    ("minnesota", 5_639_632),
    ("mississippi", 2_976_149),
    ("missouri", 6_137_428),
    ("montana", 1_068_778),
    ("nebraska", 1_934_408),
    ("nevada", 3_080_156),
    ("new hampshire", 1_359_711),
    ("new jersey", 8_882_190),
    ("new mexico", 2_096_829),
    ("new york", 19_453_561),
    ("north carolina", 10_488_084),
    ("north dakota", 762_062),
    ("ohio", 11_689_100),
    ("oklahoma", 3_956_971),
    ("oregon", 4_217_737),
    ("pennsylvania", 12_801_989),
    ("rhode island", 1_059_361),
    ("south carolina", 5_148_714),
    ("south dakota", 884_659),
    ("tennessee", 6_833_174),
    ("texas", 28_995_881),
    ("utah", 3_205_958),
    ("vermont", 623_989),
    ("virginia", 8_535_519),
    ("washington", 7_614_893),
    ("west virginia", 1_792_065),
    ("wisconsin", 5_822_434),
    ("wyoming", 578_759),
    ("virgin islands", 104_914),
    ("puerto rico", 3_193_694),
];

// Keys are the canonical names produced by the country alias table.
const COUNTRY_POPULATIONS: [(&str, u64); 60] = [
    ("mainland china", 1_439_323_776),
    ("india", 1_380_004_385),
    ("us", 331_002_651),
    ("indonesia", 273_523_615),
    ("pakistan", 220_892_340),
    ("brazil", 212_559_417),
    ("nigeria", 206_139_589),
    ("bangladesh", 164_689_383),
    ("russia", 145_934_462),
    ("mexico", 128_932_753),
    ("japan", 126_476_461),
    ("ethiopia", 114_963_588),
    ("philippines", 109_581_078),
    ("egypt", 102_334_404),
    ("vietnam", 97_338_579),
    ("turkey", 84_339_067),
    ("iran", 83_992_949),
    ("germany", 83_783_942),
    ("thailand", 69_799_978),
    ("uk", 67_886_011),
    ("france", 65_273_511),
    ("italy", 60_461_826),
    ("south africa", 59_308_690),
    ("south korea", 51_269_185),
    ("colombia", 50_882_891),
    ("spain", 46_754_778),
    ("argentina", 45_195_774),
    ("algeria", 43_851_044),
    ("ukraine", 43_733_762),
    ("iraq", 40_222_493),
    ("canada", 37_742_154),
    ("poland", 37_846_611),
    ("morocco", 36_910_560),
    ("saudi arabia", 34_813_871),
    ("malaysia", 32_365_999),
    ("peru", 32_971_854),
    ("australia", 25_499_884),
    ("taiwan", 23_816_775),
    ("chile", 19_116_201),
    ("romania", 19_237_691),
    ("netherlands", 17_134_872),
    ("ecuador", 17_643_054),
    ("belgium", 11_589_623),
    ("greece", 10_423_054),
    ("czech republic", 10_708_981),
    ("portugal", 10_196_709),
    ("sweden", 10_099_265),
    ("united arab emirates", 9_890_402),
    ("israel", 8_655_535),
    ("austria", 9_006_398),
    ("switzerland", 8_654_622),
    ("hong kong", 7_496_981),
    ("denmark", 5_792_202),
    ("finland", 5_540_720),
    ("norway", 5_421_241),
    ("singapore", 5_850_342),
    ("ireland", 4_937_786),
    ("new zealand", 4_822_233),
    ("qatar", 2_881_053),
    ("iceland", 341_243),
];

/// Raw country-name variants and the canonical name they resolve to.
const COUNTRY_ALIASES: [(&str, &str); 14] = [
    ("Iran (Islamic Republic of)", "Iran"),
    ("Republic of Korea", "South Korea"),
    ("Korea, South", "South Korea"),
    ("China", "Mainland China"),
    ("United Kingdom", "UK"),
    ("Taiwan*", "Taiwan"),
    ("Taipei and environs", "Taiwan"),
    ("Czechia", "Czech Republic"),
    ("Hong Kong SAR", "Hong Kong"),
    ("Viet Nam", "Vietnam"),
    ("Republic of Ireland", "Ireland"),
    ("Russian Federation", "Russia"),
    ("Cruise Ship", "Others"),
    ("occupied Palestinian territory", "Palestine"),
];

/// Lookup tables built once per process and shared by the normalizer and the
/// derived-metric calculator.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    state_by_abbr: HashMap<String, LocationKey>,
    state_names: HashMap<String, LocationKey>,
    country_aliases: HashMap<String, LocationKey>,
    us_population: HashMap<LocationKey, u64>,
    world_population: HashMap<LocationKey, u64>,
}

impl ReferenceTables {
    pub fn builtin() -> Self {
        let state_by_abbr = STATE_ABBREVIATIONS
            .iter()
            .map(|(abbr, name)| (abbr.to_string(), LocationKey::new(name)))
            .collect();
        let state_names = STATE_ABBREVIATIONS
            .iter()
            .map(|(_, name)| (name.to_lowercase(), LocationKey::new(name)))
            .collect();
        let country_aliases = COUNTRY_ALIASES
            .iter()
            .map(|(raw, canonical)| (raw.to_lowercase(), LocationKey::new(canonical)))
            .collect();

        let mut us_population: HashMap<LocationKey, u64> = STATE_POPULATIONS
            .iter()
            .map(|(name, pop)| (LocationKey::new(name), *pop))
            .collect();
        us_population.insert(LocationKey::new(DIAMOND_PRINCESS), SHIP_POPULATION);
        us_population.insert(LocationKey::new(GRAND_PRINCESS), SHIP_POPULATION);

        let world_population = COUNTRY_POPULATIONS
            .iter()
            .map(|(name, pop)| (LocationKey::new(name), *pop))
            .collect();

        Self {
            state_by_abbr,
            state_names,
            country_aliases,
            us_population,
            world_population,
        }
    }

    /// Add or replace a population entry.
    pub fn with_population(mut self, scope: Scope, name: &str, population: u64) -> Self {
        let table = match scope {
            Scope::Us => &mut self.us_population,
            Scope::World => &mut self.world_population,
        };
        table.insert(LocationKey::new(name), population);
        self
    }

    /// Full state key for a postal abbreviation (`"WA"`, `"D.C."`).
    pub fn state_for_abbr(&self, abbr: &str) -> Option<&LocationKey> {
        self.state_by_abbr.get(abbr)
    }

    /// State key for a full state/territory name, matched case-insensitively.
    pub fn state_for_name(&self, name: &str) -> Option<&LocationKey> {
        self.state_names.get(&name.trim().to_lowercase())
    }

    /// Canonical country for a raw variant, if it is a known alias.
    pub fn country_alias(&self, raw: &str) -> Option<&LocationKey> {
        self.country_aliases.get(&raw.trim().to_lowercase())
    }

    pub fn population(&self, scope: Scope, key: &LocationKey) -> Option<u64> {
        match scope {
            Scope::Us => self.us_population.get(key).copied(),
            Scope::World => self.world_population.get(key).copied(),
        }
    }

    /// Keys that exist in the US store even when no row ever mentions them.
    pub fn us_keys(&self) -> Vec<LocationKey> {
        let mut keys = vec![
            LocationKey::new(DIAMOND_PRINCESS),
            LocationKey::new(GRAND_PRINCESS),
        ];
        keys.extend(STATE_ABBREVIATIONS.iter().map(|(_, name)| LocationKey::new(name)));
        keys
    }
}
