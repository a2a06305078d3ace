//! Remote store client for the repository files API.
//!
//! Documents live at a path derived from the post id only, so the post id is
//! the sole key into the store. Every operation is a single HTTP call; a
//! duplicate create is rejected remotely and that rejection is surfaced.

use crate::config::StoreConfig;
use crate::document::{delete_commit_message, PostDocument, StoreAction};
use crate::error::{Result, StoreError};
use reqwest::Method;
use serde::Serialize;
use tgmirror_types::{ExtractedPost, PostId};
use tracing::{debug, info, warn};

/// Body of a create or update call
#[derive(Debug, Serialize)]
struct WritePayload<'a> {
    branch: &'a str,
    content: &'a str,
    commit_message: String,
}

/// Body of a delete call
#[derive(Debug, Serialize)]
struct DeletePayload<'a> {
    branch: &'a str,
    commit_message: String,
}

/// Authenticated client for the file-hosting API
#[derive(Debug, Clone)]
pub struct StoreClient {
    client: reqwest::Client,
    config: StoreConfig,
}

impl StoreClient {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(StoreError::Client)?;
        Ok(Self { client, config })
    }

    /// Endpoint of the document for `post_id`; the file path is a single
    /// percent-encoded segment
    pub fn file_url(&self, post_id: PostId) -> String {
        let path = self.config.document_path(post_id);
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&path)
        )
    }

    /// Create (insert-only) or overwrite the document of `post_id`
    pub async fn create_or_update(
        &self,
        post_id: PostId,
        document: &PostDocument,
        is_update: bool,
    ) -> Result<()> {
        let action = StoreAction::for_write(is_update);
        let payload = WritePayload {
            branch: &self.config.branch,
            content: &document.content,
            commit_message: document.commit_message(action),
        };
        let method = if is_update { Method::PUT } else { Method::POST };

        self.send(post_id, method, &payload).await?;
        info!(post_id, ?action, "Post document written");
        Ok(())
    }

    /// Assemble the document of `post` and write it
    pub async fn write_post(&self, post: &ExtractedPost, is_update: bool) -> Result<PostDocument> {
        let document = PostDocument::assemble(post).map_err(|source| StoreError::Document {
            post_id: post.post_id,
            source,
        })?;
        self.create_or_update(post.post_id, &document, is_update)
            .await?;
        Ok(document)
    }

    /// Remove the document of `post_id`
    pub async fn delete(&self, post_id: PostId) -> Result<()> {
        let payload = DeletePayload {
            branch: &self.config.branch,
            commit_message: delete_commit_message(post_id),
        };

        self.send(post_id, Method::DELETE, &payload).await?;
        info!(post_id, "Post document deleted");
        Ok(())
    }

    async fn send<T: Serialize>(&self, post_id: PostId, method: Method, payload: &T) -> Result<()> {
        let url = self.file_url(post_id);
        debug!(post_id, %method, url = %url, "Store request");

        let response = self
            .client
            .request(method, &url)
            .bearer_auth(&self.config.api_token)
            .json(payload)
            .send()
            .await
            .map_err(|source| StoreError::Transport { post_id, source })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(post_id, %status, body = %body, "Store rejected request");
        Err(StoreError::Rejected {
            post_id,
            status,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url_encodes_path_as_one_segment() {
        let client = StoreClient::new(StoreConfig::new(
            "https://gitlab.example.com/api/v4/projects/1/repository/files/",
            "token",
        ))
        .unwrap();

        assert_eq!(
            client.file_url(42),
            "https://gitlab.example.com/api/v4/projects/1/repository/files/content%2Ftgposts%2F42%2Findex.md"
        );
    }
}
