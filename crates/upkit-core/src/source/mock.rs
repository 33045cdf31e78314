//! In-memory transaction source for testing

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Account;

use super::types::{SourceTransaction, TransactionQuery};
use super::TransactionSource;

/// Serves fixed accounts and transactions without touching the network
#[derive(Debug, Clone, Default)]
pub struct MockSource {
    accounts: Vec<(Account, Vec<SourceTransaction>)>,
    unauthorized: bool,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that rejects every call as unauthenticated
    pub fn unauthorized() -> Self {
        Self {
            accounts: Vec::new(),
            unauthorized: true,
        }
    }

    /// Add an account with its transactions, newest first as the bank returns them
    pub fn with_account(mut self, account: Account, transactions: Vec<SourceTransaction>) -> Self {
        self.accounts.push((account, transactions));
        self
    }

    fn check_auth(&self) -> Result<()> {
        if self.unauthorized {
            return Err(Error::Authentication(
                "The token is invalid. Please check your token and try again".to_string(),
            ));
        }
        Ok(())
    }

    fn find(&self, account_id: &str) -> Result<&(Account, Vec<SourceTransaction>)> {
        self.accounts
            .iter()
            .find(|(account, _)| account.id == account_id)
            .ok_or_else(|| Error::NotFound(format!("account {}", account_id)))
    }
}

#[async_trait]
impl TransactionSource for MockSource {
    async fn ping(&self) -> Result<String> {
        self.check_auth()?;
        Ok("mock-user".to_string())
    }

    async fn accounts(&self) -> Result<Vec<Account>> {
        self.check_auth()?;
        Ok(self.accounts.iter().map(|(a, _)| a.clone()).collect())
    }

    async fn account(&self, account_id: &str) -> Result<Account> {
        self.check_auth()?;
        Ok(self.find(account_id)?.0.clone())
    }

    async fn transactions(
        &self,
        account_id: &str,
        query: &TransactionQuery,
    ) -> Result<Vec<SourceTransaction>> {
        self.check_auth()?;
        let (_, transactions) = self.find(account_id)?;

        let matching = transactions
            .iter()
            .filter(|tx| query.since.map_or(true, |since| tx.created_at >= since))
            .filter(|tx| query.until.map_or(true, |until| tx.created_at <= until))
            .cloned();

        Ok(if query.limit > 0 {
            matching.take(query.limit).collect()
        } else {
            matching.collect()
        })
    }
}
