use super::{Account, AttributeKind, AttributeRecord, EconomyApi, InventoryItem, NewItem};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

/// Client for the economy service's REST endpoints.
///
/// Every request carries the shared access key as a `passKey` query parameter.
pub struct HttpEconomyClient {
    http: reqwest::Client,
    base_url: String,
    pass_key: String,
}

impl HttpEconomyClient {
    /// Creates a client for the service rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, pass_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            pass_key: pass_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}/", self.base_url)
    }

    async fn get(&self, path: &str) -> Result<Response> {
        self.http
            .get(self.url(path))
            .query(&[("passKey", self.pass_key.as_str())])
            .send()
            .await
            .map_err(Into::into)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(self.url(path))
            .query(&[("passKey", self.pass_key.as_str())])
    }
}

/// Maps a response status onto the success / not-found / other taxonomy.
fn check_status(status: StatusCode, not_found: impl FnOnce() -> Error) -> Result<()> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::NOT_FOUND => Err(not_found()),
        other => {
            warn!(status = other.as_u16(), "economy service call failed");
            Err(Error::Remote {
                status: other.as_u16(),
            })
        }
    }
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    not_found: impl FnOnce() -> Error,
) -> Result<T> {
    check_status(response.status(), not_found)?;
    Ok(response.json().await?)
}

#[async_trait]
impl EconomyApi for HttpEconomyClient {
    #[instrument(skip(self))]
    async fn get_account(&self, user_id: u64) -> Result<Account> {
        let response = self.get(&format!("accounts/{user_id}")).await?;
        // The service answers 400 rather than 404 for users without an account.
        if response.status() == StatusCode::BAD_REQUEST {
            return Err(Error::AccountNotFound { user_id });
        }
        read_json(response, || Error::AccountNotFound { user_id }).await
    }

    #[instrument(skip(self))]
    async fn adjust_balance(&self, user_id: u64, delta: i64) -> Result<Account> {
        let response = self
            .post(&format!("accounts/{user_id}/add-dollars/{delta}"))
            .send()
            .await?;
        read_json(response, || Error::AccountNotFound { user_id }).await
    }

    #[instrument(skip(self, item), fields(name = %item.name, owner = %item.owner_id))]
    async fn create_item(&self, item: &NewItem) -> Result<()> {
        let response = self.post("items/create").json(item).send().await?;
        check_status(response.status(), || Error::Remote {
            status: StatusCode::NOT_FOUND.as_u16(),
        })?;
        debug!("Item created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_item(&self, item_id: &str) -> Result<InventoryItem> {
        let not_found = || Error::ItemNotFound {
            item_id: item_id.to_string(),
        };
        let response = self.get(&format!("items/{item_id}/true")).await?;
        let stacks: Vec<InventoryItem> = read_json(response, not_found).await?;
        stacks.into_iter().next().ok_or_else(not_found)
    }

    #[instrument(skip(self))]
    async fn transfer_item(&self, item_id: &str, new_owner: u64) -> Result<()> {
        let response = self
            .post(&format!("items/{item_id}/transfer/{new_owner}/true"))
            .send()
            .await?;
        check_status(response.status(), || Error::ItemNotFound {
            item_id: item_id.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn get_attribute(&self, kind: AttributeKind, id: i64) -> Result<AttributeRecord> {
        let response = self
            .get(&format!("attributes/{}/id/{id}", kind.as_path()))
            .await?;
        read_json(response, || Error::Remote {
            status: StatusCode::NOT_FOUND.as_u16(),
        })
        .await
    }
}
