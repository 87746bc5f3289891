//! Single owner of every funding source's remaining budget.

use crate::eligibility::sort_warnings;
use crate::error::InvariantViolation;
use crate::registry::{CatalogRegistry, duplicate_ids};
use decarb_types::catalog::FundingCatalog;
use decarb_types::eligibility::CatalogWarning;
use decarb_types::funding::FundingSource;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct Account {
    source: FundingSource,
    initial: Decimal,
    remaining: Decimal,
    granted: Decimal,
}

/// Remaining budgets of the usable funding sources of one catalog.
///
/// Sources that are internally inconsistent or share an id are not tracked at all; they are listed
/// in [`BudgetLedger::warnings`] instead. Budgets only change through a committed
/// [`BudgetTransaction`].
#[derive(Debug, Clone, Default)]
pub struct BudgetLedger {
    accounts: BTreeMap<String, Account>,
    warnings: Vec<CatalogWarning>,
}

impl BudgetLedger {
    pub fn from_catalog(catalog: &FundingCatalog, registry: &CatalogRegistry) -> Self {
        let (dups, mut warnings) = duplicate_ids(catalog.sources.iter().map(|s| s.id.as_str()));

        let mut accounts = BTreeMap::new();
        for source in &catalog.sources {
            if dups.contains(&source.id) {
                continue;
            }
            let issues = registry.check_source(source);
            if !issues.is_empty() {
                warnings.extend(issues);
                continue;
            }
            let initial = source.initial_remaining_budget();
            accounts.insert(
                source.id.clone(),
                Account {
                    source: source.clone(),
                    initial,
                    remaining: initial,
                    granted: Decimal::ZERO,
                },
            );
        }

        for w in &warnings {
            warn!(subject = %w.subject_id, token = %w.token, "{}", w.message);
        }
        sort_warnings(&mut warnings);

        debug!(
            tracked = accounts.len(),
            excluded = warnings.len(),
            "budget ledger opened"
        );

        Self { accounts, warnings }
    }

    pub fn source(&self, funding_id: &str) -> Option<&FundingSource> {
        self.accounts.get(funding_id).map(|a| &a.source)
    }

    /// Tracked sources, ascending by id.
    pub fn sources(&self) -> impl Iterator<Item = &FundingSource> {
        self.accounts.values().map(|a| &a.source)
    }

    pub fn remaining(&self, funding_id: &str) -> Option<Decimal> {
        self.accounts.get(funding_id).map(|a| a.remaining)
    }

    /// Total committed grants of a source since the ledger was opened.
    pub fn allocated(&self, funding_id: &str) -> Option<Decimal> {
        self.accounts.get(funding_id).map(|a| a.granted)
    }

    pub fn remaining_budgets(&self) -> BTreeMap<String, Decimal> {
        self.accounts
            .iter()
            .map(|(id, a)| (id.clone(), a.remaining))
            .collect()
    }

    /// Sources excluded when the ledger was opened.
    pub fn warnings(&self) -> &[CatalogWarning] {
        &self.warnings
    }

    pub fn begin(&mut self) -> BudgetTransaction<'_> {
        BudgetTransaction {
            ledger: self,
            staged: BTreeMap::new(),
        }
    }

    /// Check that no source ever granted more than it had or more than its max amount.
    pub fn verify_conservation(&self) -> Result<(), InvariantViolation> {
        for (id, a) in &self.accounts {
            if a.granted > a.source.max_amount {
                return Err(InvariantViolation::ExceedsMaxAmount {
                    funding_id: id.clone(),
                    allocated: a.granted,
                    max_amount: a.source.max_amount,
                });
            }
            if a.remaining < Decimal::ZERO || a.granted + a.remaining != a.initial {
                return Err(InvariantViolation::ExceedsRemainingBudget {
                    funding_id: id.clone(),
                    amount: a.granted,
                    remaining: a.initial,
                });
            }
        }
        Ok(())
    }
}

/// Staged debits against a [`BudgetLedger`].
///
/// Nothing reaches the ledger until [`BudgetTransaction::commit`]; dropping the transaction
/// discards every staged debit.
#[derive(Debug)]
pub struct BudgetTransaction<'a> {
    ledger: &'a mut BudgetLedger,
    staged: BTreeMap<String, Decimal>,
}

impl BudgetTransaction<'_> {
    /// Remaining budget of a source as seen inside this transaction.
    pub fn available(&self, funding_id: &str) -> Result<Decimal, InvariantViolation> {
        let remaining =
            self.ledger
                .remaining(funding_id)
                .ok_or_else(|| InvariantViolation::UnknownSource {
                    funding_id: funding_id.to_string(),
                })?;
        let staged = self.staged.get(funding_id).copied().unwrap_or_default();
        Ok(remaining - staged)
    }

    pub fn debit(&mut self, funding_id: &str, amount: Decimal) -> Result<(), InvariantViolation> {
        let available = self.available(funding_id)?;
        if amount > available {
            return Err(InvariantViolation::ExceedsRemainingBudget {
                funding_id: funding_id.to_string(),
                amount,
                remaining: available,
            });
        }
        *self.staged.entry(funding_id.to_string()).or_default() += amount;
        Ok(())
    }

    pub fn staged(&self) -> &BTreeMap<String, Decimal> {
        &self.staged
    }

    /// Apply every staged debit. Returns the new remaining budget of each touched source.
    pub fn commit(self) -> BTreeMap<String, Decimal> {
        let mut touched = BTreeMap::new();
        for (id, amount) in self.staged {
            if let Some(account) = self.ledger.accounts.get_mut(&id) {
                account.remaining -= amount;
                account.granted += amount;
                touched.insert(id, account.remaining);
            }
        }
        debug!(sources = touched.len(), "budget transaction committed");
        touched
    }

    pub fn rollback(self) {
        debug!(sources = self.staged.len(), "budget transaction discarded");
    }
}
