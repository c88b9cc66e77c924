use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub code: String,
    pub display_name: String,
    pub flag_glyph: String,
}

// (ISO-3 code, ISO-2 code, display name)
const COUNTRY_TABLE: &[(&str, &str, &str)] = &[
    ("USA", "US", "United States"),
    ("CHN", "CN", "China"),
    ("JPN", "JP", "Japan"),
    ("DEU", "DE", "Germany"),
    ("RUS", "RU", "Russia"),
    ("IND", "IN", "India"),
    ("CAN", "CA", "Canada"),
    ("FRA", "FR", "France"),
    ("ITA", "IT", "Italy"),
    ("GBR", "GB", "United Kingdom"),
    ("SAU", "SA", "Saudi Arabia"),
    ("BRA", "BR", "Brazil"),
    ("MEX", "MX", "Mexico"),
    ("KOR", "KR", "South Korea"),
    ("ESP", "ES", "Spain"),
    ("IRN", "IR", "Iran"),
    ("IDN", "ID", "Indonesia"),
    ("NLD", "NL", "Netherlands"),
    ("AUS", "AU", "Australia"),
    ("SGP", "SG", "Singapore"),
    ("TWN", "TW", "Taiwan"),
    ("THA", "TH", "Thailand"),
    ("BEL", "BE", "Belgium"),
    ("TUR", "TR", "Turkey"),
    ("ARG", "AR", "Argentina"),
    ("EGY", "EG", "Egypt"),
    ("VEN", "VE", "Venezuela"),
    ("SWE", "SE", "Sweden"),
    ("POL", "PL", "Poland"),
    ("ARE", "AE", "United Arab Emirates"),
    ("MYS", "MY", "Malaysia"),
    ("ZAF", "ZA", "South Africa"),
    ("IRQ", "IQ", "Iraq"),
    ("UKR", "UA", "Ukraine"),
    ("GRC", "GR", "Greece"),
    ("PHL", "PH", "Philippines"),
    ("PAK", "PK", "Pakistan"),
    ("ROU", "RO", "Romania"),
    ("CHE", "CH", "Switzerland"),
    ("AUT", "AT", "Austria"),
    ("COL", "CO", "Colombia"),
    ("DNK", "DK", "Denmark"),
    ("PRT", "PT", "Portugal"),
    ("KWT", "KW", "Kuwait"),
    ("FIN", "FI", "Finland"),
    ("CHL", "CL", "Chile"),
    ("HKG", "HK", "Hong Kong"),
    ("DZA", "DZ", "Algeria"),
    ("VNM", "VN", "Vietnam"),
    ("ISR", "IL", "Israel"),
    ("CZE", "CZ", "Czech Republic"),
    ("NOR", "NO", "Norway"),
    ("KAZ", "KZ", "Kazakhstan"),
    ("BLR", "BY", "Belarus"),
    ("HUN", "HU", "Hungary"),
    ("BGR", "BG", "Bulgaria"),
    ("PER", "PE", "Peru"),
    ("MAR", "MA", "Morocco"),
    ("ECU", "EC", "Ecuador"),
    ("IRL", "IE", "Ireland"),
    ("NZL", "NZ", "New Zealand"),
    ("SVK", "SK", "Slovakia"),
    ("UZB", "UZ", "Uzbekistan"),
    ("QAT", "QA", "Qatar"),
    ("AZE", "AZ", "Azerbaijan"),
    ("OMN", "OM", "Oman"),
    ("BGD", "BD", "Bangladesh"),
    ("TKM", "TM", "Turkmenistan"),
    ("LKA", "LK", "Sri Lanka"),
    ("LTU", "LT", "Lithuania"),
    ("HRV", "HR", "Croatia"),
    ("LUX", "LU", "Luxembourg"),
    ("TTO", "TT", "Trinidad and Tobago"),
    ("CYP", "CY", "Cyprus"),
    ("LVA", "LV", "Latvia"),
    ("SVN", "SI", "Slovenia"),
    ("EST", "EE", "Estonia"),
    ("ISL", "IS", "Iceland"),
    ("MKD", "MK", "North Macedonia"),
];

const COUNTRY_FACTS: &[(&str, &str)] = &[
    ("FRA", "Roughly two thirds of French electricity comes from nuclear reactors."),
    ("NOR", "Hydropower supplies close to 90% of Norway's electricity."),
    ("ISL", "Iceland heats most homes with geothermal water."),
    ("DEU", "Germany shut down its last nuclear reactors in April 2023."),
    ("CHN", "China consumes more coal than the rest of the world combined."),
    ("SAU", "Saudi Arabia still burns crude oil to generate summer peak power."),
    ("BRA", "Brazil runs much of its car fleet on sugarcane ethanol."),
    ("DNK", "Wind turbines produce over half of Denmark's electricity."),
    ("GBR", "Britain ran its last coal power station until September 2024."),
    ("SWE", "Sweden's grid is almost fossil-free, split between hydro and nuclear."),
    ("QAT", "Qatar is one of the world's largest exporters of liquefied natural gas."),
    ("PRT", "Portugal once ran on renewables alone for six straight days."),
];

static COUNTRIES: Lazy<Vec<CountryRecord>> = Lazy::new(|| {
    COUNTRY_TABLE
        .iter()
        .map(|(code, alpha2, name)| CountryRecord {
            code: (*code).to_string(),
            display_name: (*name).to_string(),
            flag_glyph: flag_from_alpha2(alpha2),
        })
        .collect()
});

static BY_CODE: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    COUNTRIES
        .iter()
        .enumerate()
        .map(|(i, c)| (c.code.as_str(), i))
        .collect()
});

pub fn all() -> &'static [CountryRecord] {
    &COUNTRIES
}

pub fn lookup(code: &str) -> Option<&'static CountryRecord> {
    BY_CODE.get(code).map(|&i| &COUNTRIES[i])
}

pub fn is_supported(code: &str) -> bool {
    BY_CODE.contains_key(code)
}

/// Allow-list of codes the dataset tables are filtered against.
pub fn supported_codes() -> impl Iterator<Item = &'static str> {
    COUNTRY_TABLE.iter().map(|(code, _, _)| *code)
}

pub fn fact_for(code: &str) -> Option<&'static str> {
    COUNTRY_FACTS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, fact)| *fact)
}

/// Records whose code has a profile in `available`. Order follows the static
/// table; callers shuffle.
pub fn list_eligible(available: &HashSet<String>) -> Vec<CountryRecord> {
    COUNTRIES
        .iter()
        .filter(|c| available.contains(&c.code))
        .cloned()
        .collect()
}

fn flag_from_alpha2(alpha2: &str) -> String {
    alpha2
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .filter_map(|c| {
            let offset = c.to_ascii_uppercase() as u32 - 'A' as u32;
            char::from_u32(0x1F1E6 + offset)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let codes: HashSet<_> = all().iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes.len(), all().len());
        assert!(supported_codes().all(is_supported));
        assert_eq!(supported_codes().count(), all().len());
    }

    #[test]
    fn flag_glyph_uses_regional_indicators() {
        assert_eq!(flag_from_alpha2("FR"), "\u{1F1EB}\u{1F1F7}");
        assert_eq!(lookup("GBR").map(|c| c.flag_glyph.as_str()), Some("🇬🇧"));
    }

    #[test]
    fn facts_are_keyed_by_supported_codes() {
        for (code, _) in COUNTRY_FACTS {
            assert!(is_supported(code), "fact for unknown code {code}");
        }
        assert!(fact_for("NOR").is_some());
        assert!(fact_for("Norway").is_none());
    }

    #[test]
    fn list_eligible_intersects_with_available() {
        let available: HashSet<String> = ["FRA", "NOR", "XXX"].iter().map(|s| s.to_string()).collect();
        let eligible = list_eligible(&available);
        let codes: HashSet<_> = eligible.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, HashSet::from(["FRA", "NOR"]));
    }
}
