use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, TimeZone, Utc};

use energy_guessr::config::DatasetConfig;
use energy_guessr::dataset::{
    ElectricitySource, EnergyDataCache, EnergyDataMap, EnergySource, TableSource,
    load_energy_data, merge_profiles, parse_consumption, parse_production, parse_time_series,
    parse_trade,
};
use energy_guessr::error::DatasetError;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_config() -> DatasetConfig {
    DatasetConfig {
        consumption_url: "fixture://consumption.csv".to_string(),
        production_url: "fixture://production.csv".to_string(),
        trade_url: "fixture://trade.csv".to_string(),
        timeseries_url: "fixture://timeseries.csv".to_string(),
        consumption_year: 2023,
        production_year: 2023,
        delimiter: ',',
    }
}

struct FixtureSource {
    fetches: AtomicUsize,
    urls: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
}

impl FixtureSource {
    fn new() -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }
}

impl TableSource for FixtureSource {
    fn fetch_table(&self, url: &str) -> Result<String, DatasetError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().expect("url log").push(url.to_string());
        if self.fail_on.is_some_and(|name| url.ends_with(name)) {
            return Err(DatasetError::Network {
                url: url.to_string(),
                status: 503,
            });
        }
        match url.strip_prefix("fixture://") {
            Some(name) => Ok(read_fixture(name)),
            None => Err(DatasetError::Network {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[test]
fn consumption_fixture_skips_bad_rows() {
    let raw = read_fixture("consumption.csv");
    let (rows, report) = parse_consumption(&raw, 2023, ',').expect("fixture should parse");

    assert_eq!(report.kept, 7);
    assert_eq!(report.short_rows, 1);
    assert_eq!(report.unsupported_code, 2);
    assert_eq!(report.wrong_year, 1);
    assert!(!rows.contains_key("OWID_WRL"));
    assert!(!rows.contains_key("ITA"));

    let france = &rows["FRA"];
    assert_eq!(france.entity, "France");
    assert_eq!(france.mix.get(EnergySource::Coal), 60.0);
    assert_eq!(france.mix.get(EnergySource::Nuclear), 1000.0);
    assert_eq!(france.mix.dominant(), Some(EnergySource::Nuclear));
}

#[test]
fn unparsable_cells_read_as_zero() {
    let raw = read_fixture("consumption.csv");
    let (rows, _) = parse_consumption(&raw, 2023, ',').expect("fixture should parse");
    let spain = &rows["ESP"];
    assert_eq!(spain.mix.get(EnergySource::Coal), 0.0);
    assert_eq!(spain.mix.get(EnergySource::OtherRenewables), 0.0);
    assert_eq!(spain.mix.get(EnergySource::Oil), 650.0);
}

#[test]
fn quoted_entity_containing_the_delimiter_is_kept() {
    let fixture = read_fixture("consumption.csv");
    let header = fixture.lines().next().expect("fixture has a header");
    let raw = format!("{header}\n2023,KOR,\"Korea, Republic of\",300,1100,700,460,10,10,40,5,30\n");

    let (rows, report) = parse_consumption(&raw, 2023, ',').expect("table should parse");
    assert_eq!(report.kept, 1);
    assert_eq!(report.unsupported_code, 0);
    let korea = &rows["KOR"];
    assert_eq!(korea.entity, "Korea, Republic of");
    assert_eq!(korea.mix.get(EnergySource::Coal), 300.0);
    assert_eq!(korea.mix.get(EnergySource::Nuclear), 460.0);
}

#[test]
fn consumption_year_selects_rows() {
    let raw = read_fixture("consumption.csv");
    let (rows, report) = parse_consumption(&raw, 2022, ',').expect("fixture should parse");
    assert_eq!(rows.len(), 1);
    assert_eq!(report.wrong_year, 7);
    assert_eq!(rows["FRA"].mix.get(EnergySource::Coal), 70.0);
}

#[test]
fn production_fixture_parses() {
    let raw = read_fixture("production.csv");
    let (rows, report) = parse_production(&raw, 2023, ',').expect("fixture should parse");
    assert_eq!(report.kept, 5);
    assert_eq!(report.wrong_year, 1);
    assert_eq!(report.unsupported_code, 1);
    assert_eq!(rows["NOR"].mix.get(ElectricitySource::Hydro), 136.0);
    assert_eq!(rows["NOR"].mix.dominant(), Some(ElectricitySource::Hydro));
}

#[test]
fn trade_points_are_sorted_and_deduplicated() {
    let raw = read_fixture("trade.csv");
    let (trade, report) = parse_trade(&raw, ',').expect("fixture should parse");

    assert_eq!(report.wrong_year, 1);
    assert!(!trade.contains_key("CHN"));

    let france = &trade["FRA"];
    assert_eq!(france.len(), 2);
    assert_eq!(france[0].year, 2020);
    assert_eq!(france[1].year, 2021);
    assert_eq!(france[1].import_percentage, 46.0);

    let norway = &trade["NOR"];
    assert!(norway.iter().all(|p| p.import_percentage < 0.0));
    assert!(norway.windows(2).all(|w| w[0].year < w[1].year));
}

#[test]
fn time_series_is_ascending() {
    let raw = read_fixture("timeseries.csv");
    let (series, _) = parse_time_series(&raw, ',').expect("fixture should parse");
    let years: Vec<i32> = series["FRA"].iter().map(|s| s.year).collect();
    assert_eq!(years, vec![2021, 2022, 2023]);
    assert_eq!(series["FRA"][0].consumption.get(EnergySource::Oil), 830.0);
    assert_eq!(series["NOR"].len(), 1);
}

#[test]
fn missing_column_fails_the_table() {
    let raw = "Entity,Code,Year,oil_consumption_twh\nFrance,FRA,2023,800\n";
    let err = parse_consumption(raw, 2023, ',').expect_err("column is missing");
    match err {
        DatasetError::MissingColumn { table, column } => {
            assert_eq!(table, "consumption");
            assert_eq!(column, "coal_consumption_twh");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(parse_trade("Entity,Code,Year\n", ',').is_err());
}

#[test]
fn empty_body_is_an_empty_table() {
    let err = parse_production("", 2023, ',').expect_err("no header");
    assert!(matches!(err, DatasetError::EmptyTable { table: "production" }));
}

#[test]
fn semicolon_delimiter_is_honoured() {
    let raw = read_fixture("trade.csv").replace(',', ";");
    let (trade, _) = parse_trade(&raw, ';').expect("fixture should parse");
    assert_eq!(trade["DEU"][0].import_percentage, 65.0);
}

#[test]
fn merge_keeps_codes_present_in_both_snapshots() {
    let (consumption, _) =
        parse_consumption(&read_fixture("consumption.csv"), 2023, ',').expect("parse");
    let (production, _) =
        parse_production(&read_fixture("production.csv"), 2023, ',').expect("parse");
    let (trade, _) = parse_trade(&read_fixture("trade.csv"), ',').expect("parse");
    let (series, _) = parse_time_series(&read_fixture("timeseries.csv"), ',').expect("parse");

    let merged = merge_profiles(consumption, production, trade, series);
    let mut codes: Vec<&str> = merged.keys().map(String::as_str).collect();
    codes.sort_unstable();
    assert_eq!(codes, vec!["BRA", "CHN", "DEU", "FRA", "NOR"]);

    let brazil = &merged["BRA"];
    assert!(brazil.trade.is_empty());
    assert!(brazil.time_series.is_empty());
    assert_eq!(merged["NOR"].trade.len(), 2);
    assert_eq!(merged["FRA"].time_series.len(), 3);
    assert_eq!(merged["DEU"].entity, "Germany");
}

#[test]
fn load_fetches_all_four_tables() {
    let source = FixtureSource::new();
    let data = load_energy_data(&source, &fixture_config()).expect("load should succeed");
    assert_eq!(source.fetches.load(Ordering::SeqCst), 4);
    assert_eq!(data.len(), 5);
    assert_eq!(
        data["CHN"].production.get(ElectricitySource::Coal),
        5700.0
    );
}

#[test]
fn shared_consumption_url_is_fetched_once() {
    let source = FixtureSource::new();
    let cfg = DatasetConfig {
        timeseries_url: "fixture://consumption.csv".to_string(),
        ..fixture_config()
    };
    let data = load_energy_data(&source, &cfg).expect("load should succeed");

    assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
    let urls = source.urls.lock().expect("url log");
    let consumption_fetches = urls
        .iter()
        .filter(|u| u.as_str() == cfg.consumption_url)
        .count();
    assert_eq!(consumption_fetches, 1);

    let years: Vec<i32> = data["FRA"].time_series.iter().map(|s| s.year).collect();
    assert_eq!(years, vec![2022, 2023]);
}

#[test]
fn default_urls_fetch_three_tables() {
    let source = FixtureSource::new();
    let cfg = DatasetConfig::default();
    let err = load_energy_data(&source, &cfg).expect_err("default urls are not fixtures");
    assert!(matches!(err, DatasetError::Network { status: 404, .. }));

    let urls = source.urls.lock().expect("url log");
    assert_eq!(urls.len(), 3);
    assert_eq!(
        urls.iter().filter(|u| u.as_str() == cfg.consumption_url).count(),
        1
    );
}

#[test]
fn one_failed_fetch_fails_the_load() {
    let source = FixtureSource {
        fail_on: Some("trade.csv"),
        ..FixtureSource::new()
    };
    let err = load_energy_data(&source, &fixture_config()).expect_err("trade fetch fails");
    assert!(matches!(err, DatasetError::Network { status: 503, .. }));
    assert!(err.is_retryable());
}

fn counted_load(calls: &mut usize) -> Result<EnergyDataMap, DatasetError> {
    *calls += 1;
    Ok(HashMap::new())
}

#[test]
fn cache_serves_within_ttl_and_refreshes_after() {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let mut cache = EnergyDataCache::new(Duration::hours(24));
    let mut calls = 0;

    assert!(!cache.is_fresh(start));
    cache
        .get_or_refresh(start, || counted_load(&mut calls))
        .expect("first load");
    cache
        .get_or_refresh(start + Duration::hours(23), || counted_load(&mut calls))
        .expect("cached");
    assert_eq!(calls, 1);
    assert_eq!(cache.fetched_at(), Some(start));

    let later = start + Duration::hours(24);
    assert!(!cache.is_fresh(later));
    cache
        .get_or_refresh(later, || counted_load(&mut calls))
        .expect("refresh");
    assert_eq!(calls, 2);
    assert_eq!(cache.fetched_at(), Some(later));
}

#[test]
fn cache_does_not_store_failures() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let mut cache = EnergyDataCache::new(Duration::hours(1));

    let err = cache.get_or_refresh(now, || {
        Err(DatasetError::Other("offline".to_string()))
    });
    assert!(err.is_err());
    assert!(cache.fetched_at().is_none());

    let mut calls = 0;
    cache
        .get_or_refresh(now, || counted_load(&mut calls))
        .expect("second attempt loads");
    assert_eq!(calls, 1);

    cache.invalidate();
    assert!(!cache.is_fresh(now));
    cache
        .get_or_refresh(now, || counted_load(&mut calls))
        .expect("reload after invalidate");
    assert_eq!(calls, 2);
}
