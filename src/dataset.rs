use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::config::DatasetConfig;
use crate::countries;
use crate::error::DatasetError;
use crate::http_cache::{BodyCache, fetch_text_cached};
use crate::http_client::http_client_with_timeout;
use crate::table::{Table, parse_number, parse_table, parse_year};

pub const COL_ENTITY: &str = "Entity";
pub const COL_CODE: &str = "Code";
pub const COL_YEAR: &str = "Year";
pub const COL_NET_IMPORTS: &str = "net_energy_imports_pct";

pub type EnergyDataMap = HashMap<String, EnergyProfile>;

/// A category of energy with a fixed column in its source table.
pub trait Source: Copy + Ord + std::fmt::Debug + 'static {
    const ALL: &'static [Self];

    fn column(self) -> &'static str;
    fn label(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnergySource {
    Oil,
    Coal,
    Gas,
    Nuclear,
    Hydro,
    Wind,
    Solar,
    Biofuels,
    OtherRenewables,
}

impl Source for EnergySource {
    const ALL: &'static [Self] = &[
        EnergySource::Oil,
        EnergySource::Coal,
        EnergySource::Gas,
        EnergySource::Nuclear,
        EnergySource::Hydro,
        EnergySource::Wind,
        EnergySource::Solar,
        EnergySource::Biofuels,
        EnergySource::OtherRenewables,
    ];

    fn column(self) -> &'static str {
        match self {
            EnergySource::Oil => "oil_consumption_twh",
            EnergySource::Coal => "coal_consumption_twh",
            EnergySource::Gas => "gas_consumption_twh",
            EnergySource::Nuclear => "nuclear_consumption_equivalent_twh",
            EnergySource::Hydro => "hydro_consumption_equivalent_twh",
            EnergySource::Wind => "wind_consumption_equivalent_twh",
            EnergySource::Solar => "solar_consumption_equivalent_twh",
            EnergySource::Biofuels => "biofuels_consumption_twh",
            EnergySource::OtherRenewables => "other_renewables_consumption_equivalent_twh",
        }
    }

    fn label(self) -> &'static str {
        match self {
            EnergySource::Oil => "oil",
            EnergySource::Coal => "coal",
            EnergySource::Gas => "gas",
            EnergySource::Nuclear => "nuclear",
            EnergySource::Hydro => "hydro",
            EnergySource::Wind => "wind",
            EnergySource::Solar => "solar",
            EnergySource::Biofuels => "biofuels",
            EnergySource::OtherRenewables => "other renewables",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElectricitySource {
    Coal,
    Gas,
    Oil,
    Nuclear,
    Hydro,
    Wind,
    Solar,
    Bioenergy,
    Other,
}

impl Source for ElectricitySource {
    const ALL: &'static [Self] = &[
        ElectricitySource::Coal,
        ElectricitySource::Gas,
        ElectricitySource::Oil,
        ElectricitySource::Nuclear,
        ElectricitySource::Hydro,
        ElectricitySource::Wind,
        ElectricitySource::Solar,
        ElectricitySource::Bioenergy,
        ElectricitySource::Other,
    ];

    fn column(self) -> &'static str {
        match self {
            ElectricitySource::Coal => "coal_generation__twh",
            ElectricitySource::Gas => "gas_generation__twh",
            ElectricitySource::Oil => "oil_generation__twh",
            ElectricitySource::Nuclear => "nuclear_generation__twh",
            ElectricitySource::Hydro => "hydro_generation__twh",
            ElectricitySource::Wind => "wind_generation__twh",
            ElectricitySource::Solar => "solar_generation__twh",
            ElectricitySource::Bioenergy => "bioenergy_generation__twh",
            ElectricitySource::Other => "other_renewables_excluding_bioenergy_generation__twh",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ElectricitySource::Coal => "coal",
            ElectricitySource::Gas => "natural gas",
            ElectricitySource::Oil => "oil",
            ElectricitySource::Nuclear => "nuclear power",
            ElectricitySource::Hydro => "hydropower",
            ElectricitySource::Wind => "wind power",
            ElectricitySource::Solar => "solar power",
            ElectricitySource::Bioenergy => "bioenergy",
            ElectricitySource::Other => "other sources",
        }
    }
}

/// TWh per source. Every source of `S` always has an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMix<S: Source> {
    values: BTreeMap<S, f64>,
}

impl<S: Source> Default for SourceMix<S> {
    fn default() -> Self {
        Self {
            values: S::ALL.iter().map(|s| (*s, 0.0)).collect(),
        }
    }
}

impl<S: Source> SourceMix<S> {
    pub fn get(&self, source: S) -> f64 {
        self.values.get(&source).copied().unwrap_or(0.0)
    }

    /// Negative and non-finite magnitudes are stored as zero.
    pub fn set(&mut self, source: S, twh: f64) {
        let v = if twh.is_finite() { twh.max(0.0) } else { 0.0 };
        self.values.insert(source, v);
    }

    pub fn iter(&self) -> impl Iterator<Item = (S, f64)> + '_ {
        self.values.iter().map(|(s, v)| (*s, *v))
    }

    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }

    pub fn dominant(&self) -> Option<S> {
        self.values
            .iter()
            .filter(|(_, v)| **v > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(s, _)| *s)
    }
}

pub type ConsumptionMix = SourceMix<EnergySource>;
pub type ProductionMix = SourceMix<ElectricitySource>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradePoint {
    pub year: i32,
    pub import_percentage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MixSnapshot {
    pub year: i32,
    pub consumption: ConsumptionMix,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyProfile {
    pub code: String,
    pub entity: String,
    pub consumption: ConsumptionMix,
    pub production: ProductionMix,
    pub trade: Vec<TradePoint>,
    pub time_series: Vec<MixSnapshot>,
}

/// Row counts for one parsed table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub kept: usize,
    pub short_rows: usize,
    pub unsupported_code: usize,
    pub wrong_year: usize,
}

#[derive(Debug, Clone)]
pub struct SnapshotRow<S: Source> {
    pub entity: String,
    pub mix: SourceMix<S>,
}

pub type ConsumptionRows = HashMap<String, SnapshotRow<EnergySource>>;
pub type ProductionRows = HashMap<String, SnapshotRow<ElectricitySource>>;

pub trait TableSource: Sync {
    fn fetch_table(&self, url: &str) -> Result<String, DatasetError>;
}

/// Fetches tables over HTTP through the on-disk body cache.
pub struct HttpTableSource {
    client: &'static Client,
    cache: Option<BodyCache>,
}

impl HttpTableSource {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Self::with_cache(timeout, BodyCache::default_location())
    }

    pub fn with_cache(timeout: Duration, cache: Option<BodyCache>) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client_with_timeout(timeout)?,
            cache,
        })
    }
}

impl TableSource for HttpTableSource {
    fn fetch_table(&self, url: &str) -> Result<String, DatasetError> {
        fetch_text_cached(self.client, url, self.cache.as_ref())
    }
}

struct KeyColumns {
    entity: Option<usize>,
    code: usize,
    year: usize,
}

fn key_columns(table: &Table, name: &'static str) -> Result<KeyColumns, DatasetError> {
    if table.header().iter().all(|h| h.is_empty()) {
        return Err(DatasetError::EmptyTable { table: name });
    }
    Ok(KeyColumns {
        entity: table.column(COL_ENTITY),
        code: table.require(name, COL_CODE)?,
        year: table.require(name, COL_YEAR)?,
    })
}

fn source_columns<S: Source>(table: &Table, name: &'static str) -> Result<Vec<(S, usize)>, DatasetError> {
    S::ALL
        .iter()
        .map(|s| table.require(name, s.column()).map(|idx| (*s, idx)))
        .collect()
}

fn read_mix<S: Source>(row: &[String], columns: &[(S, usize)]) -> SourceMix<S> {
    let mut mix = SourceMix::default();
    for (source, idx) in columns {
        mix.set(*source, parse_number(&row[*idx]));
    }
    mix
}

/// Rows for `year` keyed by country code. A later row for the same code
/// replaces an earlier one.
pub fn parse_snapshot<S: Source>(
    text: &str,
    name: &'static str,
    year: i32,
    delimiter: char,
) -> Result<(HashMap<String, SnapshotRow<S>>, ParseReport), DatasetError> {
    let table = parse_table(text, delimiter);
    let keys = key_columns(&table, name)?;
    let columns = source_columns::<S>(&table, name)?;

    let mut report = ParseReport {
        short_rows: table.short_rows(),
        ..ParseReport::default()
    };
    let mut out = HashMap::new();
    for row in table.rows() {
        let code = row[keys.code].trim();
        if !countries::is_supported(code) {
            report.unsupported_code += 1;
            continue;
        }
        if parse_year(&row[keys.year]) != Some(year) {
            report.wrong_year += 1;
            continue;
        }
        let entity = keys
            .entity
            .map(|idx| row[idx].trim().to_string())
            .unwrap_or_default();
        out.insert(
            code.to_string(),
            SnapshotRow {
                entity,
                mix: read_mix(row, &columns),
            },
        );
        report.kept += 1;
    }
    debug!(table = name, ?report, "parsed snapshot table");
    Ok((out, report))
}

pub fn parse_consumption(
    text: &str,
    year: i32,
    delimiter: char,
) -> Result<(ConsumptionRows, ParseReport), DatasetError> {
    parse_snapshot::<EnergySource>(text, "consumption", year, delimiter)
}

pub fn parse_production(
    text: &str,
    year: i32,
    delimiter: char,
) -> Result<(ProductionRows, ParseReport), DatasetError> {
    parse_snapshot::<ElectricitySource>(text, "production", year, delimiter)
}

/// Net import share per year. Rows with an unreadable year are skipped.
pub fn parse_trade(
    text: &str,
    delimiter: char,
) -> Result<(HashMap<String, Vec<TradePoint>>, ParseReport), DatasetError> {
    let table = parse_table(text, delimiter);
    let keys = key_columns(&table, "trade")?;
    let value = table.require("trade", COL_NET_IMPORTS)?;

    let mut report = ParseReport {
        short_rows: table.short_rows(),
        ..ParseReport::default()
    };
    let mut by_code: HashMap<String, BTreeMap<i32, TradePoint>> = HashMap::new();
    for row in table.rows() {
        let code = row[keys.code].trim();
        if !countries::is_supported(code) {
            report.unsupported_code += 1;
            continue;
        }
        let Some(year) = parse_year(&row[keys.year]) else {
            report.wrong_year += 1;
            continue;
        };
        by_code.entry(code.to_string()).or_default().insert(
            year,
            TradePoint {
                year,
                import_percentage: parse_number(&row[value]),
            },
        );
        report.kept += 1;
    }
    debug!(table = "trade", ?report, "parsed trade table");
    let out = by_code
        .into_iter()
        .map(|(code, points)| (code, points.into_values().collect()))
        .collect();
    Ok((out, report))
}

/// Full consumption snapshots for every year, ascending.
pub fn parse_time_series(
    text: &str,
    delimiter: char,
) -> Result<(HashMap<String, Vec<MixSnapshot>>, ParseReport), DatasetError> {
    let table = parse_table(text, delimiter);
    let keys = key_columns(&table, "timeseries")?;
    let columns = source_columns::<EnergySource>(&table, "timeseries")?;

    let mut report = ParseReport {
        short_rows: table.short_rows(),
        ..ParseReport::default()
    };
    let mut by_code: HashMap<String, BTreeMap<i32, MixSnapshot>> = HashMap::new();
    for row in table.rows() {
        let code = row[keys.code].trim();
        if !countries::is_supported(code) {
            report.unsupported_code += 1;
            continue;
        }
        let Some(year) = parse_year(&row[keys.year]) else {
            report.wrong_year += 1;
            continue;
        };
        by_code.entry(code.to_string()).or_default().insert(
            year,
            MixSnapshot {
                year,
                consumption: read_mix(row, &columns),
            },
        );
        report.kept += 1;
    }
    debug!(table = "timeseries", ?report, "parsed time series table");
    let out = by_code
        .into_iter()
        .map(|(code, points)| (code, points.into_values().collect()))
        .collect();
    Ok((out, report))
}

/// Join the four tables on country code. Only codes with both a consumption
/// and a production row survive.
pub fn merge_profiles(
    consumption: ConsumptionRows,
    mut production: ProductionRows,
    mut trade: HashMap<String, Vec<TradePoint>>,
    mut time_series: HashMap<String, Vec<MixSnapshot>>,
) -> EnergyDataMap {
    let mut out = HashMap::new();
    for (code, cons) in consumption {
        let Some(prod) = production.remove(&code) else {
            continue;
        };
        let entity = if cons.entity.is_empty() {
            prod.entity
        } else {
            cons.entity
        };
        let profile = EnergyProfile {
            code: code.clone(),
            entity,
            consumption: cons.mix,
            production: prod.mix,
            trade: trade.remove(&code).unwrap_or_default(),
            time_series: time_series.remove(&code).unwrap_or_default(),
        };
        out.insert(code, profile);
    }
    out
}

/// Fetch all four tables concurrently and merge them. When the time series
/// shares the consumption URL the body is fetched once and parsed twice. Any
/// fetch or table-level failure fails the whole load.
pub fn load_energy_data<T: TableSource + ?Sized>(
    source: &T,
    cfg: &DatasetConfig,
) -> Result<EnergyDataMap, DatasetError> {
    let shared_series = cfg.timeseries_url == cfg.consumption_url;
    let ((consumption, production), (trade, series)) = rayon::join(
        || {
            rayon::join(
                || source.fetch_table(&cfg.consumption_url),
                || source.fetch_table(&cfg.production_url),
            )
        },
        || {
            rayon::join(
                || source.fetch_table(&cfg.trade_url),
                || {
                    if shared_series {
                        Ok(None)
                    } else {
                        source.fetch_table(&cfg.timeseries_url).map(Some)
                    }
                },
            )
        },
    );
    let (consumption, production, trade, series) = (consumption?, production?, trade?, series?);
    let series = series.as_deref().unwrap_or(&consumption);

    let (consumption, c_report) =
        parse_consumption(&consumption, cfg.consumption_year, cfg.delimiter)?;
    let (production, p_report) = parse_production(&production, cfg.production_year, cfg.delimiter)?;
    let (trade, _) = parse_trade(&trade, cfg.delimiter)?;
    let (series, _) = parse_time_series(series, cfg.delimiter)?;

    let merged = merge_profiles(consumption, production, trade, series);
    info!(
        countries = merged.len(),
        consumption_rows = c_report.kept,
        production_rows = p_report.kept,
        "energy dataset loaded"
    );
    Ok(merged)
}

struct CachedData {
    fetched_at: DateTime<Utc>,
    data: Arc<EnergyDataMap>,
}

/// Memoizes the merged dataset for a freshness window. Owned by whoever
/// bootstraps the session; failures are never cached.
pub struct EnergyDataCache {
    ttl: ChronoDuration,
    entry: Option<CachedData>,
}

impl EnergyDataCache {
    pub fn new(ttl: ChronoDuration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> ChronoDuration {
        self.ttl
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| now.signed_duration_since(e.fetched_at) < self.ttl)
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.entry.as_ref().map(|e| e.fetched_at)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn get_or_refresh<F>(
        &mut self,
        now: DateTime<Utc>,
        load: F,
    ) -> Result<Arc<EnergyDataMap>, DatasetError>
    where
        F: FnOnce() -> Result<EnergyDataMap, DatasetError>,
    {
        if self.is_fresh(now) {
            if let Some(entry) = self.entry.as_ref() {
                debug!("energy dataset cache hit");
                return Ok(Arc::clone(&entry.data));
            }
        }
        let data = Arc::new(load()?);
        self.entry = Some(CachedData {
            fetched_at: now,
            data: Arc::clone(&data),
        });
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_defaults_every_source_to_zero() {
        let mix = ConsumptionMix::default();
        assert_eq!(mix.iter().count(), EnergySource::ALL.len());
        assert_eq!(mix.total(), 0.0);
        assert_eq!(mix.dominant(), None);
    }

    #[test]
    fn mix_clamps_negative_values() {
        let mut mix = ProductionMix::default();
        mix.set(ElectricitySource::Hydro, -4.0);
        mix.set(ElectricitySource::Wind, f64::NAN);
        mix.set(ElectricitySource::Nuclear, 12.0);
        assert_eq!(mix.get(ElectricitySource::Hydro), 0.0);
        assert_eq!(mix.get(ElectricitySource::Wind), 0.0);
        assert_eq!(mix.dominant(), Some(ElectricitySource::Nuclear));
    }
}
