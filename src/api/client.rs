use std::io;

use async_trait::async_trait;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use bytes::Bytes;
use futures::stream;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::mailbox::View;

use super::gateway::{MailboxGateway, ProgressFn, percent};
use super::messages;
use super::models::{
    LocalFile, Message, MessagePage, Mutation, OutgoingAttachment, OutgoingMessage, PageRequest,
    Tone, UploadedAttachment,
};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            access_token,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&[(String, String)]>,
    ) -> AppResult<T> {
        let mut request = self.request(Method::GET, endpoint)?;
        if let Some(query) = query {
            request = request.query(query);
        }

        self.execute(request).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> AppResult<T> {
        let request = self.request(Method::POST, endpoint)?.json(body);
        self.execute(request).await
    }

    async fn post_form<T: DeserializeOwned>(&self, endpoint: &str, form: Form) -> AppResult<T> {
        let request = self.request(Method::POST, endpoint)?.multipart(form);
        self.execute(request).await
    }

    async fn post_outgoing(&self, endpoint: &str, message: &OutgoingMessage) -> AppResult<()> {
        let request = self.request(Method::POST, endpoint)?;
        let request = if message.attachments.is_empty() {
            request.json(&OutgoingJson::from(message))
        } else {
            request.multipart(outgoing_form(message)?)
        };

        self.execute_ack(request).await
    }

    fn request(&self, method: Method, endpoint: &str) -> AppResult<RequestBuilder> {
        let url = self.endpoint_url(endpoint)?;
        let request = self.http.request(method, url);
        Ok(match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.set_path(endpoint.trim_start_matches('/'));
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_api_error(status, &body))
    }

    /// Like `execute`, for endpoints whose success body carries nothing we use.
    async fn execute_ack(&self, request: RequestBuilder) -> AppResult<()> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_api_error(status, &body))
    }
}

impl Default for HttpGateway {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL, None)
    }
}

#[async_trait]
impl MailboxGateway for HttpGateway {
    async fn fetch_view(&self, view: &View, page: &PageRequest) -> AppResult<MessagePage> {
        let endpoint = messages::view_endpoint(view);
        let query = messages::view_query(view, page);
        tracing::debug!(view = %view, max_results = page.max_results, "fetching view");

        let response: ViewResponse = self.get_json(endpoint, Some(&query)).await?;
        Ok(response.into_page())
    }

    async fn fetch_message(&self, id: &str) -> AppResult<Message> {
        let endpoint = messages::message_endpoint(id);
        let response: MessageResponse = self.get_json(&endpoint, None).await?;
        Ok(response.message)
    }

    async fn mutate(&self, id: &str, mutation: Mutation) -> AppResult<()> {
        let (method, endpoint) = messages::mutation_endpoint(id, mutation);
        tracing::debug!(id, %mutation, "dispatching mutation");

        let request = self.request(method, &endpoint)?;
        self.execute_ack(request).await
    }

    async fn send(&self, message: &OutgoingMessage) -> AppResult<()> {
        self.post_outgoing(messages::send_endpoint(), message).await
    }

    async fn save_draft(&self, message: &OutgoingMessage) -> AppResult<()> {
        self.post_outgoing(messages::draft_endpoint(), message).await
    }

    async fn upload_attachment(
        &self,
        file: &LocalFile,
        progress: ProgressFn,
    ) -> AppResult<UploadedAttachment> {
        let total = file.size();
        let chunks = split_chunks(&file.data, UPLOAD_CHUNK_SIZE);
        let mut loaded = 0_u64;
        let body = reqwest::Body::wrap_stream(stream::iter(chunks.into_iter().map(
            move |chunk| {
                loaded += chunk.len() as u64;
                progress(percent(loaded, total));
                Ok::<Bytes, io::Error>(chunk)
            },
        )));

        let part = Part::stream_with_length(body, total)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new().part("file", part);

        tracing::debug!(file = %file.name, size = total, "uploading attachment");
        let response: UploadResponse = self.post_form(messages::upload_endpoint(), form).await?;
        match response {
            UploadResponse {
                success: true,
                file: Some(meta),
                ..
            } => Ok(meta),
            UploadResponse { message, .. } => Err(AppError::Api(format!(
                "upload of {} was not accepted: {}",
                file.name,
                message.unwrap_or_else(|| "no details".to_string())
            ))),
        }
    }

    async fn reply(&self, id: &str, body: &str) -> AppResult<()> {
        let endpoint = messages::reply_endpoint(id);
        let request = self
            .request(Method::POST, &endpoint)?
            .json(&ReplyRequest { body });
        self.execute_ack(request).await
    }

    async fn forward(&self, id: &str, to: &str, body: &str) -> AppResult<()> {
        let endpoint = messages::forward_endpoint(id);
        let request = self
            .request(Method::POST, &endpoint)?
            .json(&ForwardRequest { to, body });
        self.execute_ack(request).await
    }

    async fn summarize(&self, id: &str) -> AppResult<String> {
        let endpoint = messages::summarize_endpoint(id);
        let response: SummaryResponse = self.post_json(&endpoint, &serde_json::json!({})).await?;
        Ok(response.summary)
    }

    async fn download_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> AppResult<Vec<u8>> {
        let endpoint = messages::attachment_endpoint(message_id, attachment_id);
        let response: AttachmentDataResponse = self.get_json(&endpoint, None).await?;
        URL_SAFE_LENIENT
            .decode(response.data.trim())
            .map_err(|err| AppError::Api(format!("attachment payload is not base64url: {err}")))
    }

    async fn generate(&self, instruction: &str, tone: Tone) -> AppResult<String> {
        let response: GenerateResponse = self
            .post_json(
                messages::generate_endpoint(),
                &GenerateRequest { instruction, tone },
            )
            .await?;

        match response {
            GenerateResponse {
                success: true,
                email: Some(email),
                ..
            } => Ok(email),
            GenerateResponse { message, .. } => Err(AppError::Api(format!(
                "generation failed: {}",
                message.unwrap_or_else(|| "no content returned".to_string())
            ))),
        }
    }
}

fn split_chunks(data: &Bytes, size: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(data.len() / size + 1);
    let mut start = 0;
    while start < data.len() {
        let end = (start + size).min(data.len());
        chunks.push(data.slice(start..end));
        start = end;
    }
    chunks
}

fn outgoing_form(message: &OutgoingMessage) -> AppResult<Form> {
    let mut form = Form::new()
        .text("to", message.to.clone())
        .text("subject", message.subject.clone())
        .text("body", message.body.clone());

    if let Some(cc) = non_blank(message.cc.as_deref()) {
        form = form.text("cc", cc.to_string());
    }
    if let Some(bcc) = non_blank(message.bcc.as_deref()) {
        form = form.text("bcc", bcc.to_string());
    }

    for attachment in &message.attachments {
        if let OutgoingAttachment::PendingBinary {
            data,
            filename,
            mime_type,
        } = attachment
        {
            let part = Part::bytes(data.to_vec())
                .file_name(filename.clone())
                .mime_str(mime_type)?;
            form = form.part("attachments", part);
        }
    }

    let uploaded = message.uploaded_attachments();
    if !uploaded.is_empty() {
        form = form.text("attachments", serde_json::to_string(&uploaded)?);
    }

    Ok(form)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Debug, Serialize)]
struct OutgoingJson<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    to: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    subject: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cc: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bcc: Option<&'a str>,
}

impl<'a> From<&'a OutgoingMessage> for OutgoingJson<'a> {
    fn from(message: &'a OutgoingMessage) -> Self {
        Self {
            to: &message.to,
            subject: &message.subject,
            body: &message.body,
            cc: non_blank(message.cc.as_deref()),
            bcc: non_blank(message.bcc.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewResponse {
    #[serde(default)]
    messages: Option<Vec<Message>>,
    #[serde(default)]
    drafts: Option<Vec<Message>>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl ViewResponse {
    fn into_page(self) -> MessagePage {
        MessagePage {
            messages: self.messages.or(self.drafts).unwrap_or_default(),
            next_page_token: self.next_page_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    file: Option<UploadedAttachment>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReplyRequest<'a> {
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct ForwardRequest<'a> {
    to: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Debug, Deserialize)]
struct AttachmentDataResponse {
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    instruction: &'a str,
    tone: Tone,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

fn map_api_error(status: StatusCode, body: &str) -> AppError {
    let message = parse_api_error_message(body).unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            "no error details in response body".to_string()
        } else {
            body.to_string()
        }
    });

    if status == StatusCode::UNAUTHORIZED {
        return AppError::Auth(format!("session expired ({status}): {message}"));
    }

    AppError::Api(format!("request failed ({status}): {message}"))
}

fn parse_api_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok()?;
    let mut parts = Vec::new();

    if let Some(message) = parsed.message {
        parts.push(message);
    }

    match parsed.error {
        Some(serde_json::Value::String(error)) => parts.push(error),
        Some(serde_json::Value::Object(object)) => {
            if let Some(message) = object.get("message").and_then(|value| value.as_str()) {
                parts.push(message.to_string());
            }
        }
        _ => {}
    }

    if parts.is_empty() {
        return None;
    }

    Some(parts.join(": "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_unauthorized_as_auth_error() {
        let error = map_api_error(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"Invalid token"}"#,
        );

        match error {
            AppError::Auth(message) => assert!(message.contains("Invalid token")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn maps_not_found_as_api_error() {
        let error = map_api_error(
            StatusCode::NOT_FOUND,
            r#"{"error":{"message":"Requested entity was not found."}}"#,
        );

        match error {
            AppError::Api(message) => assert!(message.contains("Requested entity was not found")),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_raw_body() {
        let error = map_api_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(error.to_string().contains("upstream down"));
    }

    #[test]
    fn drafts_response_maps_to_page() {
        let response: ViewResponse =
            serde_json::from_str(r#"{"drafts":[{"id":"d1"},{"id":"d2"}]}"#).expect("json");
        let page = response.into_page();
        assert_eq!(page.messages.len(), 2);
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn splits_data_into_bounded_chunks() {
        let data = Bytes::from(vec![0_u8; 10]);
        let chunks = split_chunks(&data, 4);
        let sizes = chunks.iter().map(Bytes::len).collect::<Vec<_>>();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn json_body_omits_blank_copies() {
        let message = OutgoingMessage {
            to: "a@example.com".to_string(),
            cc: Some("  ".to_string()),
            bcc: None,
            subject: "hi".to_string(),
            body: "<p>hello</p>".to_string(),
            attachments: Vec::new(),
        };
        let json = serde_json::to_value(OutgoingJson::from(&message)).expect("json");
        assert_eq!(json["to"], "a@example.com");
        assert!(json.get("cc").is_none());
        assert!(json.get("bcc").is_none());
    }
}
