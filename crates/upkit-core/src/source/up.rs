//! Up Bank API client
//!
//! Thin async client over the JSON:API endpoints the reports need. Requests
//! are sent one at a time and paginated collections are followed through
//! `links.next` until exhausted (or until the caller's limit is reached).

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::ApiSettings;
use crate::error::{Error, Result};
use crate::models::Account;

use super::types::{
    CardPurchaseMethod, Cashback, CategoryRef, Money, RoundUp, SourceTransaction,
    TransactionQuery,
};
use super::TransactionSource;

/// Environment variable holding the personal access token
pub const TOKEN_ENV_VAR: &str = "UP_TOKEN";

const MAX_PAGE_SIZE: usize = 100;

/// HTTP client for the Up Bank API
#[derive(Clone)]
pub struct UpClient {
    http_client: Client,
    base_url: String,
    token: String,
    page_size: usize,
}

impl UpClient {
    /// Create a client with default HTTP settings
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Create from API settings. Without an explicit token, `UP_TOKEN` is read.
    pub fn from_config(api: &ApiSettings, token: Option<&str>) -> Result<Self> {
        let token = match token {
            Some(token) => token.to_string(),
            None => std::env::var(TOKEN_ENV_VAR).map_err(|_| {
                Error::Authentication(format!(
                    "No API token supplied. Set {} or pass --token",
                    TOKEN_ENV_VAR
                ))
            })?,
        };

        let http_client = Client::builder().timeout(api.timeout).build()?;

        Ok(Self {
            http_client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            token,
            page_size: api.page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }

    async fn get<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Authentication(format!(
                "The token is invalid ({}). Please check your token and try again",
                body.trim()
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }

    /// Drain a paginated collection starting at `request`
    async fn get_all<T: DeserializeOwned>(
        &self,
        mut request: RequestBuilder,
        limit: usize,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        loop {
            let page: Page<T> = self.get(request).await?;
            debug!(count = page.data.len(), "Fetched page");
            items.extend(page.data);

            if limit > 0 && items.len() >= limit {
                items.truncate(limit);
                break;
            }
            match page.links.and_then(|links| links.next) {
                Some(next) => request = self.http_client.get(next),
                None => break,
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl TransactionSource for UpClient {
    async fn ping(&self) -> Result<String> {
        let request = self.http_client.get(format!("{}/util/ping", self.base_url));
        let response: PingResponse = self.get(request).await?;
        info!(user_id = %response.meta.id, "Authorized");
        Ok(response.meta.id)
    }

    async fn accounts(&self) -> Result<Vec<Account>> {
        let request = self
            .http_client
            .get(format!("{}/accounts", self.base_url))
            .query(&[("page[size]", self.page_size.to_string())]);
        let resources: Vec<AccountResource> = self.get_all(request, 0).await?;
        Ok(resources.into_iter().map(Account::from).collect())
    }

    async fn account(&self, account_id: &str) -> Result<Account> {
        info!(account_id, "Retrieving account");
        let request = self
            .http_client
            .get(format!("{}/accounts/{}", self.base_url, account_id));
        let response: Single<AccountResource> = self.get(request).await?;
        let account = Account::from(response.data);
        info!(
            account_id,
            name = %account.display_name,
            ownership = %account.ownership_type,
            "Account retrieved"
        );
        Ok(account)
    }

    async fn transactions(
        &self,
        account_id: &str,
        query: &TransactionQuery,
    ) -> Result<Vec<SourceTransaction>> {
        let page_size = if query.limit > 0 {
            query.limit.min(self.page_size)
        } else {
            self.page_size
        };

        let mut params = vec![("page[size]", page_size.to_string())];
        if let Some(since) = query.since {
            params.push(("filter[since]", since.to_rfc3339()));
        }
        if let Some(until) = query.until {
            params.push(("filter[until]", until.to_rfc3339()));
        }

        let request = self
            .http_client
            .get(format!("{}/accounts/{}/transactions", self.base_url, account_id))
            .query(&params);
        let resources: Vec<TransactionResource> = self.get_all(request, query.limit).await?;
        Ok(resources.into_iter().map(SourceTransaction::from).collect())
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct Page<T> {
    data: Vec<T>,
    links: Option<Links>,
}

#[derive(Debug, Deserialize)]
struct Links {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Single<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct PingResponse {
    meta: PingMeta,
}

#[derive(Debug, Deserialize)]
struct PingMeta {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AccountResource {
    id: String,
    attributes: AccountAttributes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountAttributes {
    display_name: String,
    account_type: String,
    ownership_type: String,
}

impl From<AccountResource> for Account {
    fn from(resource: AccountResource) -> Self {
        Self {
            id: resource.id,
            display_name: resource.attributes.display_name,
            account_type: resource.attributes.account_type,
            ownership_type: resource.attributes.ownership_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TransactionResource {
    id: String,
    attributes: TransactionAttributes,
    #[serde(default)]
    relationships: TransactionRelationships,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionAttributes {
    status: String,
    raw_text: Option<String>,
    description: String,
    message: Option<String>,
    round_up: Option<RoundUp>,
    cashback: Option<Cashback>,
    amount: Money,
    foreign_amount: Option<Money>,
    card_purchase_method: Option<CardPurchaseMethod>,
    settled_at: Option<DateTime<FixedOffset>>,
    created_at: DateTime<FixedOffset>,
    #[serde(default)]
    long_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRelationships {
    category: Option<Relationship<Option<ResourceId>>>,
    parent_category: Option<Relationship<Option<ResourceId>>>,
    tags: Option<Relationship<Vec<ResourceId>>>,
}

#[derive(Debug, Deserialize)]
struct Relationship<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    id: String,
}

impl From<TransactionResource> for SourceTransaction {
    fn from(resource: TransactionResource) -> Self {
        let TransactionRelationships {
            category,
            parent_category,
            tags,
        } = resource.relationships;
        let parent_id = parent_category.and_then(|r| r.data).map(|p| p.id);
        let category = category.and_then(|r| r.data).map(|c| CategoryRef {
            id: c.id,
            parent_id,
        });
        let attributes = resource.attributes;

        Self {
            id: resource.id,
            status: attributes.status,
            raw_text: attributes.raw_text,
            description: attributes.description,
            message: attributes.message,
            amount: attributes.amount,
            foreign_amount: attributes.foreign_amount,
            round_up: attributes.round_up,
            cashback: attributes.cashback,
            card_purchase_method: attributes.card_purchase_method,
            created_at: attributes.created_at,
            settled_at: attributes.settled_at,
            category,
            tags: tags.map(|r| r.data.into_iter().map(|t| t.id).collect()),
            long_description: attributes.long_description,
        }
    }
}
