// SPDX-License-Identifier: AGPL-3.0
// Roster Core - REST client
//
// Read-only client for the users/posts/todos service. Collections are paged
// with `_page` and `_limit`; an empty array means there is nothing left.

use crate::list::PageSource;
use crate::models::{Comment, Post, PostDetail, Task, User};
use crate::types::{AppError, AppSettings};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Client for the remote REST service
#[derive(Clone, Debug)]
pub struct ApiClient {
    http_client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &AppSettings) -> Result<Self, AppError> {
        settings.validate()?;
        Self::new(&settings.api_base_url, settings.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {} {:?}", url, query);

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Network(format!("Request to {} timed out", url))
                } else {
                    AppError::Network(format!("Request to {} failed: {}", url, e))
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(url));
        }
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Serialization(format!("Failed to parse {}: {}", url, e)))
    }

    fn page_query(page: u32, limit: u32) -> [(&'static str, String); 2] {
        [("_page", page.to_string()), ("_limit", limit.to_string())]
    }

    /// One page of users, with portrait URLs filled in
    pub async fn fetch_users(&self, page: u32, limit: u32) -> Result<Vec<User>, AppError> {
        let users: Vec<User> = self
            .get_json("/users", &Self::page_query(page, limit))
            .await?;
        Ok(users.into_iter().map(User::with_avatar).collect())
    }

    pub async fn fetch_user(&self, id: u64) -> Result<User, AppError> {
        let user: User = self.get_json(&format!("/users/{}", id), &[]).await?;
        Ok(user.with_avatar())
    }

    pub async fn fetch_posts(&self, page: u32, limit: u32) -> Result<Vec<Post>, AppError> {
        self.get_json("/posts", &Self::page_query(page, limit))
            .await
    }

    pub async fn fetch_tasks(&self, page: u32, limit: u32) -> Result<Vec<Task>, AppError> {
        self.get_json("/todos", &Self::page_query(page, limit))
            .await
    }

    pub async fn fetch_post(&self, id: u64) -> Result<Post, AppError> {
        self.get_json(&format!("/posts/{}", id), &[]).await
    }

    pub async fn fetch_comments(&self, post_id: u64) -> Result<Vec<Comment>, AppError> {
        let comments: Vec<Comment> = self
            .get_json(&format!("/posts/{}/comments", post_id), &[])
            .await?;
        Ok(comments.into_iter().map(Comment::with_avatar).collect())
    }

    /// Post and its comments, requested concurrently
    pub async fn fetch_post_detail(&self, id: u64) -> Result<PostDetail, AppError> {
        let (post, comments) = tokio::try_join!(self.fetch_post(id), self.fetch_comments(id))?;
        Ok(PostDetail { post, comments })
    }
}

#[async_trait]
impl PageSource<User> for ApiClient {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Vec<User>, AppError> {
        self.fetch_users(page, limit).await
    }
}

#[async_trait]
impl PageSource<Post> for ApiClient {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Vec<Post>, AppError> {
        self.fetch_posts(page, limit).await
    }
}

#[async_trait]
impl PageSource<Task> for ApiClient {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Vec<Task>, AppError> {
        self.fetch_tasks(page, limit).await
    }
}
