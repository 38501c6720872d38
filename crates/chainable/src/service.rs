//! Chain service: the public entry points.
//!
//! `Chainable` ties a date source to the chain engine. Owners do not need to
//! know about it; any entity that a source can resolve by key has chains.
//!
//! Every `*_for` method reads "today" from the configured reference zone at
//! call time. The `*_on` variants take it explicitly.

use chrono::NaiveDate;

use crate::chain::{self, ChainStats, DateSet};
use crate::config::{ChainOptions, ChainableConfig, DEFAULT_COLUMN};
use crate::error::Result;
use crate::source::DateSource;
use crate::zone::ReferenceZone;

/// Computes chains for owners whose records live in `S`
#[derive(Debug, Clone)]
pub struct Chainable<S> {
    source: S,
    zone: ReferenceZone,
}

impl<S: DateSource> Chainable<S> {
    /// Service with default config (UTC)
    pub fn new(source: S) -> Self {
        Self {
            source,
            zone: ReferenceZone::default(),
        }
    }

    /// Service using `config`; fails if its time zone is invalid
    pub fn with_config(source: S, config: &ChainableConfig) -> Result<Self> {
        Ok(Self {
            source,
            zone: config.zone()?,
        })
    }

    pub fn zone(&self) -> ReferenceZone {
        self.zone
    }

    /// Today in the reference zone
    pub fn today(&self) -> NaiveDate {
        self.zone.today()
    }

    /// Deduplicated days for `owner`'s `association` records.
    ///
    /// `None` reads `DEFAULT_COLUMN`.
    pub fn date_set_for(
        &self,
        owner: &str,
        association: &str,
        column: Option<&str>,
    ) -> Result<DateSet> {
        let column = column.unwrap_or(DEFAULT_COLUMN);
        let raw = self.source.fetch(owner, association, column)?;
        let days = DateSet::from_timestamps(&raw, column, &self.zone)?;

        tracing::debug!(
            owner,
            association,
            column,
            records = raw.len(),
            days = days.len(),
            "resolved date set"
        );
        Ok(days)
    }

    /// Chain length for `owner` as of today
    pub fn chain_length_for(
        &self,
        owner: &str,
        association: &str,
        column: Option<&str>,
        options: ChainOptions,
    ) -> Result<usize> {
        self.chain_length_on(owner, association, column, options, self.today())
    }

    /// Chain length for `owner` as of `today`
    pub fn chain_length_on(
        &self,
        owner: &str,
        association: &str,
        column: Option<&str>,
        options: ChainOptions,
        today: NaiveDate,
    ) -> Result<usize> {
        let runs = self.date_set_for(owner, association, column)?.runs();
        Ok(chain::chain_length(
            &runs,
            today,
            options.mode(),
            options.except_today,
        ))
    }

    /// Every chain for `owner`, most recent first, each newest day first
    pub fn all_chains_for(
        &self,
        owner: &str,
        association: &str,
        column: Option<&str>,
    ) -> Result<Vec<Vec<NaiveDate>>> {
        let runs = self.date_set_for(owner, association, column)?.runs();
        tracing::debug!(owner, association, chains = runs.len(), "resolved chains");
        Ok(runs)
    }

    /// Current, longest and active-day counts as of today
    pub fn stats_for(
        &self,
        owner: &str,
        association: &str,
        column: Option<&str>,
        except_today: bool,
    ) -> Result<ChainStats> {
        self.stats_on(owner, association, column, except_today, self.today())
    }

    /// Current, longest and active-day counts as of `today`
    pub fn stats_on(
        &self,
        owner: &str,
        association: &str,
        column: Option<&str>,
        except_today: bool,
        today: NaiveDate,
    ) -> Result<ChainStats> {
        let runs = self.date_set_for(owner, association, column)?.runs();
        Ok(chain::summarize(&runs, today, except_today))
    }
}
