//! 附件上传
//!
//! POST attachments（multipart，字段名 file）；服务端返回附件 URL，可能是 JSON 字符串也可能带引号的纯文本。

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::api::{ApiError, DevinClient};

impl DevinClient {
    /// 上传本地文件，返回附件 URL；文件不存在时在发请求前报错
    pub async fn upload_file(&self, path: &Path) -> Result<String, ApiError> {
        if !path.exists() {
            return Err(ApiError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )));
        }
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let form = Form::new().part("file", Part::bytes(data).file_name(file_name));

        let resp = self.post_multipart("attachments", form).await?;
        Ok(attachment_url(&resp))
    }
}

/// 从上传响应中取出 URL，去掉首尾引号
pub fn attachment_url(resp: &Value) -> String {
    match resp {
        Value::String(s) => s.trim().trim_matches('"').to_string(),
        other => other.to_string().trim_matches('"').to_string(),
    }
}
