//! Back-office content management. Every call is authenticated with the
//! stored session token and restricted to staff roles.

use crate::carelink::{
    api::{ApiClient, ApiError, Envelope, RequestOptions},
    auth::{Route, SessionContext},
};
use reqwest::Method;
use serde_json::{json, Value};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Ambulances,
    Pharmacies,
    Banners,
    Blogs,
    Users,
    AccessRequests,
}

impl Resource {
    pub const ALL: [Self; 6] = [
        Self::Ambulances,
        Self::Pharmacies,
        Self::Banners,
        Self::Blogs,
        Self::Users,
        Self::AccessRequests,
    ];

    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Ambulances => "ambulances",
            Self::Pharmacies => "pharmacies",
            Self::Banners => "banners",
            Self::Blogs => "blogs",
            Self::Users => "users",
            Self::AccessRequests => "access-requests",
        }
    }

    /// Key the backend uses for the list in responses.
    #[must_use]
    pub const fn collection_key(self) -> &'static str {
        match self {
            Self::AccessRequests => "accessRequests",
            other => other.segment(),
        }
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "ambulances" | "ambulance" => Ok(Self::Ambulances),
            "pharmacies" | "pharmacy" => Ok(Self::Pharmacies),
            "banners" | "banner" => Ok(Self::Banners),
            "blogs" | "blog" | "posts" => Ok(Self::Blogs),
            "users" | "user" => Ok(Self::Users),
            "access-requests" | "access-request" | "requests" => Ok(Self::AccessRequests),
            other => Err(format!("unknown resource: {other}")),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Decision on a pending access request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error("Please sign in first")]
    NotSignedIn,
    #[error("Your account does not have access to the admin console")]
    Forbidden,
    #[error("Record id must not be empty")]
    MissingId,
    #[error("Invalid record id: {0}")]
    InvalidId(String),
    #[error("Record data must be a JSON object")]
    InvalidData,
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Clone, Debug)]
pub struct AdminClient {
    api: ApiClient,
}

impl AdminClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Lists records of a resource.
    ///
    /// # Errors
    /// `AdminError::NotSignedIn`/`Forbidden` without a staff session (no request
    /// is sent), otherwise the API failure.
    #[instrument(skip(self, context))]
    pub async fn list(
        &self,
        context: &SessionContext,
        resource: Resource,
    ) -> Result<Vec<Value>, AdminError> {
        let token = staff_token(context)?;
        let envelope = self
            .api
            .get(&path(resource, None), &[], RequestOptions::authenticated(token))
            .await?
            .into_result()?;
        Ok(envelope.collection(resource.collection_key()))
    }

    /// Fetches one record.
    ///
    /// # Errors
    /// See [`AdminClient::list`]; also `AdminError::MissingId` or
    /// `AdminError::InvalidId` (no request is sent).
    #[instrument(skip(self, context))]
    pub async fn get(
        &self,
        context: &SessionContext,
        resource: Resource,
        id: &str,
    ) -> Result<Value, AdminError> {
        let token = staff_token(context)?;
        let id = record_id(id)?;
        let envelope = self
            .api
            .get(&path(resource, Some(id)), &[], RequestOptions::authenticated(token))
            .await?
            .into_result()?;
        Ok(envelope.data().clone())
    }

    /// Creates a record from a JSON object.
    ///
    /// # Errors
    /// See [`AdminClient::list`]; also `AdminError::InvalidData`.
    #[instrument(skip(self, context, data))]
    pub async fn create(
        &self,
        context: &SessionContext,
        resource: Resource,
        data: &Value,
    ) -> Result<Envelope, AdminError> {
        let token = staff_token(context)?;
        if !data.is_object() {
            return Err(AdminError::InvalidData);
        }
        let envelope = self
            .api
            .request(
                Method::POST,
                &path(resource, None),
                Some(data),
                RequestOptions::authenticated(token),
            )
            .await?
            .into_result()?;
        info!(%resource, "record created");
        Ok(envelope)
    }

    /// Replaces a record.
    ///
    /// # Errors
    /// See [`AdminClient::create`]; also `AdminError::MissingId` or
    /// `AdminError::InvalidId` (no request is sent).
    #[instrument(skip(self, context, data))]
    pub async fn update(
        &self,
        context: &SessionContext,
        resource: Resource,
        id: &str,
        data: &Value,
    ) -> Result<Envelope, AdminError> {
        let token = staff_token(context)?;
        let id = record_id(id)?;
        if !data.is_object() {
            return Err(AdminError::InvalidData);
        }
        let envelope = self
            .api
            .request(
                Method::PUT,
                &path(resource, Some(id)),
                Some(data),
                RequestOptions::authenticated(token),
            )
            .await?
            .into_result()?;
        info!(%resource, "record updated");
        Ok(envelope)
    }

    /// Deletes a record.
    ///
    /// # Errors
    /// See [`AdminClient::get`].
    #[instrument(skip(self, context))]
    pub async fn delete(
        &self,
        context: &SessionContext,
        resource: Resource,
        id: &str,
    ) -> Result<Envelope, AdminError> {
        let token = staff_token(context)?;
        let id = record_id(id)?;
        let envelope = self
            .api
            .request(
                Method::DELETE,
                &path(resource, Some(id)),
                None,
                RequestOptions::authenticated(token),
            )
            .await?
            .into_result()?;
        info!(%resource, "record deleted");
        Ok(envelope)
    }

    /// Approves or rejects an access request.
    ///
    /// # Errors
    /// See [`AdminClient::get`].
    #[instrument(skip(self, context))]
    pub async fn decide_access_request(
        &self,
        context: &SessionContext,
        id: &str,
        decision: Decision,
    ) -> Result<Envelope, AdminError> {
        let token = staff_token(context)?;
        let id = record_id(id)?;
        let body = json!({ "status": decision.as_str() });
        let envelope = self
            .api
            .request(
                Method::PATCH,
                &path(Resource::AccessRequests, Some(id)),
                Some(&body),
                RequestOptions::authenticated(token),
            )
            .await?
            .into_result()?;
        info!(decision = decision.as_str(), "access request decided");
        Ok(envelope)
    }
}

fn staff_token(context: &SessionContext) -> Result<&str, AdminError> {
    let token = context.token().ok_or(AdminError::NotSignedIn)?;
    match context.route() {
        Some(Route::Admin) => Ok(token),
        _ => Err(AdminError::Forbidden),
    }
}

/// Ids become one path segment; anything that could change the request path,
/// query or fragment is refused.
fn record_id(id: &str) -> Result<&str, AdminError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AdminError::MissingId);
    }
    let unsafe_char = |c: char| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace();
    if id == "." || id == ".." || id.contains(unsafe_char) {
        return Err(AdminError::InvalidId(id.to_string()));
    }
    Ok(id)
}

fn path(resource: Resource, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("/admin/{}/{id}", resource.segment()),
        None => format!("/admin/{}", resource.segment()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::carelink::{
        api::DEFAULT_TIMEOUT,
        auth::session::{MemorySessionStore, Session},
    };
    use secrecy::SecretString;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn context(role: &str) -> SessionContext {
        let store = MemorySessionStore::default();
        let user = serde_json::from_value(json!({ "role": role })).unwrap();
        SessionContext::anonymous()
            .login(&store, Session::new(SecretString::from("tok".to_string()), user))
            .unwrap()
    }

    fn client(uri: &str) -> AdminClient {
        AdminClient::new(ApiClient::new(uri, DEFAULT_TIMEOUT).unwrap())
    }

    #[test]
    fn resource_names() {
        for resource in Resource::ALL {
            assert_eq!(resource.segment().parse::<Resource>(), Ok(resource));
        }
        assert_eq!(Resource::AccessRequests.collection_key(), "accessRequests");
        assert_eq!(path(Resource::Blogs, Some("b1")), "/admin/blogs/b1");
    }

    #[tokio::test]
    async fn anonymous_and_regular_users_are_refused_locally() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let admin = client(&server.uri());
        assert_eq!(
            admin
                .list(&SessionContext::anonymous(), Resource::Banners)
                .await,
            Err(AdminError::NotSignedIn)
        );
        assert_eq!(
            admin.list(&context("user"), Resource::Banners).await,
            Err(AdminError::Forbidden)
        );
    }

    #[tokio::test]
    async fn list_uses_bearer_and_collection_key() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/admin/access-requests"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "accessRequests": [{ "_id": "r1", "status": "pending" }] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = client(&server.uri())
            .list(&context("clinic"), Resource::AccessRequests)
            .await
            .unwrap();
        assert_eq!(records, vec![json!({ "_id": "r1", "status": "pending" })]);
    }

    #[tokio::test]
    async fn expired_session_is_reported() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(url_path("/admin/ambulances/a1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = client(&server.uri())
            .delete(&context("admin"), Resource::Ambulances, "a1")
            .await;
        assert_eq!(result, Err(AdminError::Api(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn create_requires_object() {
        let result = client("http://127.0.0.1:9")
            .create(&context("admin"), Resource::Banners, &json!(["x"]))
            .await;
        assert_eq!(result, Err(AdminError::InvalidData));
    }

    #[tokio::test]
    async fn update_sends_put() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(url_path("/admin/pharmacies/p1"))
            .and(body_json(json!({ "name": "Apollo" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server.uri())
            .update(
                &context("masteruser"),
                Resource::Pharmacies,
                "p1",
                &json!({ "name": "Apollo" }),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn access_request_decision_patches_status() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(url_path("/admin/access-requests/r1"))
            .and(body_json(json!({ "status": "approved" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server.uri())
            .decide_access_request(&context("superuser"), "r1", Decision::Approved)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn ids_cannot_escape_the_resource_path() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(0)
            .mount(&server)
            .await;

        let admin = client(&server.uri());
        for id in ["../users/u1", "..", ".", "b1?force=true", "b1#x", "b1%2F..", "a b"] {
            assert_eq!(
                admin
                    .delete(&context("admin"), Resource::Banners, id)
                    .await,
                Err(AdminError::InvalidId(id.to_string())),
                "{id}"
            );
        }
        assert!(matches!(
            admin
                .decide_access_request(&context("admin"), "../users/u1", Decision::Approved)
                .await,
            Err(AdminError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn blank_id_refused() {
        let result = client("http://127.0.0.1:9")
            .get(&context("admin"), Resource::Users, "  ")
            .await;
        assert_eq!(result, Err(AdminError::MissingId));
    }
}
