//! Transaction source abstraction
//!
//! The banking API is an external collaborator. This module defines what the
//! pipeline needs from it and provides two implementations:
//!
//! - `UpClient`: HTTP client for the Up Bank API
//! - `MockSource`: in-memory accounts and transactions for tests
//!
//! # Usage
//!
//! ```rust,ignore
//! let source = UpClient::from_config(&settings.api, None)?;
//! let user_id = source.ping().await?;
//! let accounts = source.accounts().await?;
//! ```

mod mock;
pub mod types;
mod up;

pub use mock::MockSource;
pub use types::*;
pub use up::UpClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Account;

/// What the report pipeline needs from a banking API
///
/// Calls are awaited one at a time; implementations drain pagination before
/// returning so callers always see the full result set.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Validate credentials, returning the authenticated user id.
    ///
    /// Invalid credentials are reported as `Error::Authentication`.
    async fn ping(&self) -> Result<String>;

    /// List every account visible to the credentials
    async fn accounts(&self) -> Result<Vec<Account>>;

    /// Fetch a single account by id
    async fn account(&self, account_id: &str) -> Result<Account>;

    /// Fetch the transactions of an account matching `query`
    async fn transactions(
        &self,
        account_id: &str,
        query: &TransactionQuery,
    ) -> Result<Vec<SourceTransaction>>;
}
