use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::client::TaskApi;
use crate::error::{AppError, ErrorResponse};
use crate::models::{
    AuthResponse, DeleteResponse, LoginRequest, NewTaskRequest, PublicUser, RegisterRequest,
    Task, UpdateTaskRequest, format_day,
};

/// `TaskApi` over the JSON HTTP API, authenticated with a bearer token.
#[derive(Clone, Debug)]
pub struct HttpTaskApi {
    client: Client,
    base_url: Url,
    token: String,
}

impl HttpTaskApi {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, AppError> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: parse_base(base_url)?,
            token: token.into(),
        })
    }

    /// Registers an account and returns a client authenticated as it.
    pub async fn register(
        base_url: &str,
        req: &RegisterRequest,
    ) -> Result<(Self, PublicUser), AppError> {
        Self::authenticate(base_url, &["api", "auth", "register"], req).await
    }

    /// Logs in and returns a client authenticated as that user.
    pub async fn login(base_url: &str, req: &LoginRequest) -> Result<(Self, PublicUser), AppError> {
        Self::authenticate(base_url, &["api", "auth", "login"], req).await
    }

    async fn authenticate<B: serde::Serialize>(
        base_url: &str,
        path: &[&str],
        req: &B,
    ) -> Result<(Self, PublicUser), AppError> {
        let base_url = parse_base(base_url)?;
        let client = Client::builder().build()?;
        let response = client
            .post(endpoint(&base_url, path)?)
            .json(req)
            .send()
            .await?;
        let auth: AuthResponse = decode(response).await?;
        Ok((
            Self {
                client,
                base_url,
                token: auth.token,
            },
            auth.user,
        ))
    }

    pub async fn me(&self) -> Result<PublicUser, AppError> {
        let url = self.url(&["api", "auth", "me"])?;
        let response = self.authed(self.client.get(url)).send().await?;
        decode(response).await
    }

    /// Revokes this client's token on the server.
    pub async fn logout(&self) -> Result<(), AppError> {
        let url = self.url(&["api", "auth", "logout"])?;
        let response = self.authed(self.client.post(url)).send().await?;
        expect_success(response).await
    }

    fn url(&self, path: &[&str]) -> Result<Url, AppError> {
        endpoint(&self.base_url, path)
    }

    fn task_url(&self, id: &str) -> Result<Url, AppError> {
        self.url(&["api", "tasks", id])
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_all(&self) -> Result<Vec<Task>, AppError> {
        let url = self.url(&["api", "tasks"])?;
        let response = self.authed(self.client.get(url)).send().await?;
        decode(response).await
    }

    async fn list_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Task>, AppError> {
        let mut url = self.url(&["api", "tasks", "range"])?;
        url.query_pairs_mut()
            .append_pair("start", &format_day(start))
            .append_pair("end", &format_day(end));
        let response = self.authed(self.client.get(url)).send().await?;
        decode(response).await
    }

    async fn get(&self, id: &str) -> Result<Task, AppError> {
        let response = self.authed(self.client.get(self.task_url(id)?)).send().await?;
        decode(response).await
    }

    async fn create(&self, req: NewTaskRequest) -> Result<Task, AppError> {
        let url = self.url(&["api", "tasks"])?;
        let response = self.authed(self.client.post(url)).json(&req).send().await?;
        decode(response).await
    }

    async fn update(&self, id: &str, req: UpdateTaskRequest) -> Result<Task, AppError> {
        let response = self
            .authed(self.client.put(self.task_url(id)?))
            .json(&req)
            .send()
            .await?;
        decode(response).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let response = self.authed(self.client.delete(self.task_url(id)?)).send().await?;
        let _: DeleteResponse = decode(response).await?;
        Ok(())
    }

    async fn toggle(&self, id: &str) -> Result<Task, AppError> {
        let url = self.url(&["api", "tasks", id, "toggle"])?;
        let response = self.authed(self.client.patch(url)).send().await?;
        decode(response).await
    }
}

fn parse_base(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw)
        .map_err(|e| AppError::Config(format!("invalid base url `{}`: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(AppError::Config(format!("base url `{}` cannot carry a path", raw)));
    }
    Ok(url)
}

/// Appends percent-encoded path segments to the base url.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, AppError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| AppError::Config(format!("base url `{}` cannot carry a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    if response.status().is_success() {
        return Ok(response.json::<T>().await?);
    }
    Err(error_from_response(response).await)
}

async fn expect_success(response: Response) -> Result<(), AppError> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(error_from_response(response).await)
}

async fn error_from_response(response: Response) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ErrorResponse>(&body).ok();
    status_error(status, parsed, body)
}

/// Maps a non-success API response back onto the error taxonomy.
pub(crate) fn status_error(status: u16, parsed: Option<ErrorResponse>, raw: String) -> AppError {
    let message = parsed
        .as_ref()
        .map(|b| b.message.clone())
        .unwrap_or(raw);

    match status {
        400 => AppError::Validation {
            field: parsed.and_then(|b| b.field).unwrap_or_default(),
            message,
        },
        401 => AppError::Unauthorized,
        404 => AppError::NotFound,
        409 => AppError::Conflict(message),
        _ => AppError::Upstream { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(message: &str, field: Option<&str>) -> Option<ErrorResponse> {
        Some(ErrorResponse {
            error: "x".to_string(),
            message: message.to_string(),
            field: field.map(str::to_string),
        })
    }

    #[test]
    fn status_codes_map_onto_error_kinds() {
        let err = status_error(
            400,
            body("title must not be empty", Some("title")),
            String::new(),
        );
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "title"));

        assert!(matches!(status_error(401, None, String::new()), AppError::Unauthorized));
        assert!(matches!(status_error(404, None, String::new()), AppError::NotFound));
        assert!(matches!(
            status_error(409, body("dup", None), String::new()),
            AppError::Conflict(_)
        ));

        let err = status_error(503, None, "unavailable".to_string());
        assert!(matches!(
            err,
            AppError::Upstream { status: 503, ref message } if message == "unavailable"
        ));
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let api = HttpTaskApi::new("http://localhost:5000/", "t").unwrap();
        assert_eq!(
            api.task_url("abc").unwrap().as_str(),
            "http://localhost:5000/api/tasks/abc"
        );

        let api = HttpTaskApi::new("http://localhost:5000/prefix/", "t").unwrap();
        assert_eq!(
            api.url(&["api", "tasks"]).unwrap().as_str(),
            "http://localhost:5000/prefix/api/tasks"
        );
    }

    #[test]
    fn task_ids_are_percent_encoded() {
        let api = HttpTaskApi::new("http://localhost:5000", "t").unwrap();
        assert_eq!(
            api.task_url("a/b c?d").unwrap().as_str(),
            "http://localhost:5000/api/tasks/a%2Fb%20c%3Fd"
        );
    }

    #[test]
    fn unusable_base_urls_are_config_errors() {
        assert!(matches!(HttpTaskApi::new("not a url", "t"), Err(AppError::Config(_))));
        assert!(matches!(
            HttpTaskApi::new("mailto:someone@example.com", "t"),
            Err(AppError::Config(_))
        ));
    }
}
