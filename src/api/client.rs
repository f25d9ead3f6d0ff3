//! Devin REST 客户端
//!
//! 负责鉴权头、URL 拼接、JSON / multipart 请求体以及响应解码；状态码分类见 ApiError::from_status。
//! 不做任何重试：一次失败即返回给调用方。

use std::time::Duration;

use reqwest::{multipart, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::api::ApiError;
use crate::config::Settings;

/// 默认 API 地址
pub const DEFAULT_BASE_URL: &str = "https://api.devin.ai/v1";

/// Devin API 客户端：持有 HTTP Client、base_url 与 Token
#[derive(Debug, Clone)]
pub struct DevinClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl DevinClient {
    /// timeout 为 None 时沿用传输层默认（无整体超时）
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(concat!("devin-cli/", env!("CARGO_PKG_VERSION")));
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// 从已加载的运行时配置创建
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        Self::new(
            &settings.base_url,
            settings.api_token.clone(),
            settings.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 拼接完整 URL：去掉 endpoint 开头的 '/'
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// 构造带鉴权的请求；没有 Token 时直接失败，不发出请求
    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::MissingToken)?;
        Ok(self
            .http
            .request(method, self.url(endpoint))
            .bearer_auth(token))
    }

    pub async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let req = self.request(Method::GET, endpoint)?.query(query);
        self.execute(req, "GET", endpoint).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let req = self.request(Method::POST, endpoint)?.json(body);
        self.execute(req, "POST", endpoint).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let req = self.request(Method::PUT, endpoint)?.json(body);
        self.execute(req, "PUT", endpoint).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Value, ApiError> {
        let req = self.request(Method::DELETE, endpoint)?;
        self.execute(req, "DELETE", endpoint).await
    }

    /// multipart 上传：Content-Type（含 boundary）交给 reqwest 设置
    pub async fn post_multipart(
        &self,
        endpoint: &str,
        form: multipart::Form,
    ) -> Result<Value, ApiError> {
        let req = self.request(Method::POST, endpoint)?.multipart(form);
        self.execute(req, "POST", endpoint).await
    }

    /// 发送并解码：非 2xx 映射为 ApiError；204 返回 null；非 JSON 响应体作为字符串返回
    async fn execute(
        &self,
        req: RequestBuilder,
        method: &str,
        endpoint: &str,
    ) -> Result<Value, ApiError> {
        tracing::debug!(method, endpoint, "api request");
        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        tracing::debug!(method, endpoint, status = status.as_u16(), "api response");

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), text));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        match serde_json::from_str(&text) {
            Ok(v) => Ok(v),
            Err(_) => Ok(Value::String(text)),
        }
    }
}

/// 将已解码的 JSON 转为具体类型
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}
