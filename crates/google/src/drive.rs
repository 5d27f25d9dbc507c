//! Drive API v3: copying the template and sharing the copy.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use notebridge_core::error::RemoteError;
use notebridge_core::remote::{FileStore, Permission};

use crate::auth::ServiceAccountAuth;
use crate::error::GoogleApiError;
use crate::sheets::parse_response;

const SERVICE: &str = "Google Drive";
const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/drive/v3/files";

#[derive(Debug, Deserialize)]
struct FileResource {
    id: String,
}

/// Body of `POST /files/{id}/permissions`.
pub fn permission_body(permission: &Permission) -> Value {
    match permission {
        Permission::Domain { domain, role } => json!({
            "type": "domain",
            "role": role.as_str(),
            "domain": domain,
        }),
        Permission::AnyoneWithLink { role } => json!({
            "type": "anyone",
            "role": role.as_str(),
            "allowFileDiscovery": false,
        }),
    }
}

/// Drive client sharing the service-account token.
pub struct DriveClient {
    client: reqwest::Client,
    auth: Arc<ServiceAccountAuth>,
    base_url: String,
}

impl DriveClient {
    pub fn new(client: reqwest::Client, auth: Arc<ServiceAccountAuth>) -> Self {
        Self {
            client,
            auth,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, GoogleApiError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| GoogleApiError::Payload(format!("{} cannot be a base", self.base_url)))?
            .extend(segments);
        url.query_pairs_mut().append_pair("supportsAllDrives", "true");
        Ok(url)
    }

    async fn copy(&self, file_id: &str, name: &str) -> Result<String, GoogleApiError> {
        let response = self
            .client
            .post(self.url(&[file_id, "copy"])?)
            .bearer_auth(self.auth.bearer().await?)
            .json(&json!({ "name": name }))
            .send()
            .await?;
        let file: FileResource = parse_response(response).await?;
        Ok(file.id)
    }

    async fn share(&self, file_id: &str, permission: &Permission) -> Result<(), GoogleApiError> {
        let mut url = self.url(&[file_id, "permissions"])?;
        url.query_pairs_mut().append_pair("fields", "id");

        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth.bearer().await?)
            .json(&permission_body(permission))
            .send()
            .await?;
        let _: Value = parse_response(response).await?;
        Ok(())
    }
}

#[async_trait]
impl FileStore for DriveClient {
    async fn copy_file(&self, file_id: &str, name: &str) -> Result<String, RemoteError> {
        let id = self
            .copy(file_id, name)
            .await
            .map_err(|e| e.into_remote(SERVICE))?;
        tracing::info!(template = file_id, copy = %id, name, "File copied");
        Ok(id)
    }

    async fn grant_permission(
        &self,
        file_id: &str,
        permission: &Permission,
    ) -> Result<(), RemoteError> {
        self.share(file_id, permission)
            .await
            .map_err(|e| e.into_remote(SERVICE))
    }
}

#[cfg(test)]
mod tests {
    use notebridge_core::remote::Role;

    use super::*;

    #[test]
    fn domain_permission_body() {
        let body = permission_body(&Permission::Domain {
            domain: "willow.example".into(),
            role: Role::Writer,
        });
        assert_eq!(
            body,
            json!({"type": "domain", "role": "writer", "domain": "willow.example"})
        );
    }

    #[test]
    fn link_permission_is_not_discoverable() {
        let body = permission_body(&Permission::AnyoneWithLink { role: Role::Writer });
        assert_eq!(
            body,
            json!({"type": "anyone", "role": "writer", "allowFileDiscovery": false})
        );
    }

    #[test]
    fn copy_response_yields_the_new_id() {
        let file: FileResource =
            serde_json::from_value(json!({"kind": "drive#file", "id": "1AbC", "name": "REV_010"}))
                .unwrap();
        assert_eq!(file.id, "1AbC");
    }
}
