//! Hosted backend speaking the Supabase REST (`PostgREST`) dialect.
//!
//! Tables are addressed as `{url}/rest/v1/<table>` and the stats
//! aggregation runs server-side through the `update_user_stats_after_quiz`
//! RPC.

use std::env;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::repository::{Storage, StorageError};

mod repos;
mod rows;

#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    /// Signed-in user's JWT. Requests fall back to the anon key without it.
    pub access_token: Option<String>,
}

impl SupabaseConfig {
    #[must_use]
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            access_token: None,
        }
    }

    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Reads `SUPABASE_URL`, `SUPABASE_ANON_KEY` and the optional
    /// `SUPABASE_ACCESS_TOKEN`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let url = env::var("SUPABASE_URL").ok()?;
        let anon_key = env::var("SUPABASE_ANON_KEY").ok()?;
        if url.trim().is_empty() || anon_key.trim().is_empty() {
            return None;
        }
        let access_token = env::var("SUPABASE_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        Some(Self {
            url,
            anon_key,
            access_token,
        })
    }

    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.anon_key)
    }

    pub(crate) fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.url.trim_end_matches('/'))
    }

    pub(crate) fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{function}", self.url.trim_end_matches('/'))
    }
}

#[derive(Clone)]
pub struct SupabaseRepository {
    client: Client,
    config: SupabaseConfig,
}

impl SupabaseRepository {
    #[must_use]
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(self.config.bearer())
    }

    /// `GET` rows from a table with `PostgREST` filter pairs.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StorageError> {
        let request = self
            .client
            .get(self.config.table_url(table))
            .query(&[("select", "*")])
            .query(query);
        let response = check(self.authorized(request).send().await.map_err(http)?).await?;
        response
            .json()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<T, StorageError> {
        self.select(table, query)
            .await?
            .into_iter()
            .next()
            .ok_or(StorageError::NotFound)
    }

    /// `POST` rows without asking for a representation back.
    async fn insert<T: Serialize + ?Sized>(&self, table: &str, rows: &T) -> Result<(), StorageError> {
        let request = self
            .client
            .post(self.config.table_url(table))
            .header("Prefer", "return=minimal")
            .json(rows);
        check(self.authorized(request).send().await.map_err(http)?).await?;
        Ok(())
    }

    /// `DELETE` the rows matching the filter pairs.
    async fn delete(&self, table: &str, query: &[(&str, String)]) -> Result<(), StorageError> {
        let request = self.client.delete(self.config.table_url(table)).query(query);
        check(self.authorized(request).send().await.map_err(http)?).await?;
        Ok(())
    }

    async fn rpc<T: Serialize + ?Sized>(&self, function: &str, args: &T) -> Result<(), StorageError> {
        let request = self.client.post(self.config.rpc_url(function)).json(args);
        check(self.authorized(request).send().await.map_err(http)?).await?;
        Ok(())
    }
}

fn http(e: reqwest::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

pub(crate) fn status_error(status: StatusCode, body: &str) -> StorageError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::NOT_ACCEPTABLE => StorageError::NotFound,
        StatusCode::CONFLICT => StorageError::Conflict,
        _ => StorageError::Connection(format!("supabase returned {status}: {body}")),
    }
}

async fn check(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    log::warn!("supabase request failed with {status}");
    Err(status_error(status, &body))
}

impl Storage {
    /// Build a `Storage` backed by a Supabase project.
    #[must_use]
    pub fn supabase(config: SupabaseConfig) -> Self {
        Self::from_repository(SupabaseRepository::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_double_slash() {
        let config = SupabaseConfig::new("https://demo.supabase.co/", "anon");
        assert_eq!(
            config.table_url("quizzes"),
            "https://demo.supabase.co/rest/v1/quizzes"
        );
        assert_eq!(
            config.rpc_url("update_user_stats_after_quiz"),
            "https://demo.supabase.co/rest/v1/rpc/update_user_stats_after_quiz"
        );
    }

    #[test]
    fn bearer_prefers_access_token() {
        let config = SupabaseConfig::new("https://demo.supabase.co", "anon");
        assert_eq!(config.bearer(), "anon");
        let config = config.with_access_token("jwt");
        assert_eq!(config.bearer(), "jwt");
    }

    #[test]
    fn status_codes_map_to_storage_errors() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, ""),
            StorageError::NotFound
        ));
        assert!(matches!(
            status_error(StatusCode::CONFLICT, "duplicate key"),
            StorageError::Conflict
        ));
        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(
            err.to_string(),
            "connection error: supabase returned 500 Internal Server Error: boom"
        );
    }
}
