//! Read-side transfer queries
//!
//! Every query is scoped to one account and checks the caller first.
//! Administrators may read any account. Other callers must own it; an unknown
//! account is reported as `Forbidden` to them so existence is not leaked.

use std::sync::Arc;

use chrono::Days;
use mockable::Clock;

use super::analysis::{self, CategoryShare};
use super::error::TransferError;
use super::store::LedgerStore;
use super::types::{DailySpend, Page, PageRequest, TransferFilter, TransferSummary, TransferView};
use crate::account::{Account, normalize_iban};
use crate::identity::CallerIdentity;

/// Days covered by the weekly trend, today included
pub const TREND_DAYS: u64 = 7;

pub struct TransferQueries {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl TransferQueries {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Resolve the account and check the caller may read it
    async fn authorize(&self, iban: &str, caller: &CallerIdentity) -> Result<Account, TransferError> {
        let iban = normalize_iban(iban);
        match self.store.find_account(&iban).await? {
            Some(account) if caller.is_owner(&account) => Ok(account),
            None if caller.is_admin() => Err(TransferError::NotFound(format!(
                "Account not found: {}",
                iban
            ))),
            _ => Err(TransferError::Forbidden(
                "You are not authorized to view this account".into(),
            )),
        }
    }

    /// Transfers in or out of the account, newest first
    pub async fn history(
        &self,
        iban: &str,
        page: PageRequest,
        caller: &CallerIdentity,
    ) -> Result<Page<TransferView>, TransferError> {
        self.filter_history(iban, &TransferFilter::default(), page, caller)
            .await
    }

    /// History restricted by amount and time bounds
    pub async fn filter_history(
        &self,
        iban: &str,
        filter: &TransferFilter,
        page: PageRequest,
        caller: &CallerIdentity,
    ) -> Result<Page<TransferView>, TransferError> {
        if let (Some(min), Some(max)) = (filter.min_amount, filter.max_amount)
            && min > max
        {
            return Err(TransferError::InvalidArgument(
                "min_amount must not exceed max_amount".into(),
            ));
        }
        if let (Some(start), Some(end)) = (filter.start, filter.end)
            && start > end
        {
            return Err(TransferError::InvalidArgument(
                "start must not be after end".into(),
            ));
        }

        let account = self.authorize(iban, caller).await?;
        let page = self
            .store
            .list_transfers(&account.iban, filter, page)
            .await?;
        Ok(page.map(TransferView::from))
    }

    pub async fn summary(
        &self,
        iban: &str,
        caller: &CallerIdentity,
    ) -> Result<TransferSummary, TransferError> {
        let account = self.authorize(iban, caller).await?;
        self.store.summarize(&account.iban).await
    }

    /// Outgoing volume per spending category
    pub async fn category_breakdown(
        &self,
        iban: &str,
        caller: &CallerIdentity,
    ) -> Result<Vec<CategoryShare>, TransferError> {
        let account = self.authorize(iban, caller).await?;
        let outgoing = self.store.outgoing_transfers(&account.iban).await?;
        Ok(analysis::breakdown(&outgoing))
    }

    /// Outgoing totals per UTC day over the last [`TREND_DAYS`] days
    pub async fn weekly_trend(
        &self,
        iban: &str,
        caller: &CallerIdentity,
    ) -> Result<Vec<DailySpend>, TransferError> {
        let account = self.authorize(iban, caller).await?;
        let today = self.clock.utc().date_naive();
        let first_day = today
            .checked_sub_days(Days::new(TREND_DAYS - 1))
            .unwrap_or(today);
        let since = first_day.and_time(chrono::NaiveTime::MIN).and_utc();
        self.store.daily_outgoing_since(&account.iban, since).await
    }
}
