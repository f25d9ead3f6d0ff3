//! API 数据类型
//!
//! 会话、知识、Playbook、密钥的请求/响应结构。服务端字段较多且会演进，这里只建模客户端实际读写的字段，
//! 未知字段一律忽略；不透明内容（structured_output、messages）保留为 serde_json::Value。
//! 仅用于展示的字段宽松解码，类型不符不会让整个响应解码失败。

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 会话状态（对应服务端 status_enum）
///
/// 只有 blocked / finished 是终止状态，其余（working 以及未来新增的值）都意味着继续轮询。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionStatus {
    Working,
    Blocked,
    Finished,
    Other(String),
}

impl SessionStatus {
    /// 是否为终止状态（轮询到此即停止）
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Blocked | SessionStatus::Finished)
    }

    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::Working => "working",
            SessionStatus::Blocked => "blocked",
            SessionStatus::Finished => "finished",
            SessionStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for SessionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "working" => SessionStatus::Working,
            "blocked" => SessionStatus::Blocked,
            "finished" => SessionStatus::Finished,
            _ => SessionStatus::Other(s),
        }
    }
}

impl From<&str> for SessionStatus {
    fn from(s: &str) -> Self {
        SessionStatus::from(s.to_string())
    }
}

impl From<SessionStatus> for String {
    fn from(s: SessionStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 远程会话快照（GET sessions/{id} 与列表项共用）
///
/// 轮询只依赖 status_enum，其余字段都按宽松规则解码。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, deserialize_with = "lenient_id")]
    pub session_id: String,
    #[serde(rename = "status_enum", default)]
    pub status: Option<SessionStatus>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub structured_output: Option<Value>,
    #[serde(default, deserialize_with = "lenient_values")]
    pub messages: Option<Vec<Value>>,
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// 字符串原样保留；数字等其他标量转成文本；null 为 None
fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(value_text(Value::deserialize(d)?))
}

fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_text(Value::deserialize(d)?).unwrap_or_default())
}

/// 标签：数组内元素逐个转文本，单个字符串视为一个标签，其余形状忽略
fn lenient_tags<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => Some(items.into_iter().filter_map(value_text).collect()),
        Value::String(s) => Some(vec![s]),
        _ => None,
    })
}

/// 不是数组时忽略
fn lenient_values<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<Value>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => Some(items),
        _ => None,
    })
}

impl Session {
    pub fn is_terminal(&self) -> bool {
        self.status.as_ref().is_some_and(SessionStatus::is_terminal)
    }

    /// 状态文本；服务端未返回时为 "unknown"
    pub fn status_label(&self) -> &str {
        self.status.as_ref().map_or("unknown", SessionStatus::as_str)
    }
}

/// 以对象某个键包裹数组的列表响应，例如 `{"sessions": [...]}`
///
/// 同时保留原始 JSON：`--json` 输出与结构不符时的回退都直接使用它。
#[derive(Debug, Clone)]
pub struct KeyedList<T> {
    pub raw: Value,
    key: &'static str,
    items: Option<Vec<T>>,
}

impl<T: DeserializeOwned> KeyedList<T> {
    pub fn from_value(raw: Value, key: &'static str) -> Self {
        let items = raw
            .get(key)
            .filter(|v| v.is_array())
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        Self { raw, key, items }
    }
}

impl<T> KeyedList<T> {
    /// 解码后的条目；响应不是预期结构时为 None
    pub fn items(&self) -> Option<&[T]> {
        self.items.as_deref()
    }

    /// 服务端返回的条目数组原文；结构不符时为整个响应
    pub fn raw_items(&self) -> &Value {
        self.raw
            .get(self.key)
            .filter(|v| v.is_array())
            .unwrap_or(&self.raw)
    }
}

/// GET sessions 的响应
pub type SessionList = KeyedList<Session>;

/// 创建会话时附带的一次性密钥
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSecret {
    pub key: String,
    pub value: String,
}

/// POST sessions 的请求体；可选字段为空时不发送
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateSessionRequest {
    pub prompt: String,
    pub idempotent: bool,
    pub unlisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playbook_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub session_secrets: Vec<SessionSecret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub knowledge_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secret_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_acu_limit: Option<u32>,
}

impl CreateSessionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn playbook(mut self, playbook_id: Option<String>) -> Self {
        self.playbook_id = playbook_id;
        self
    }
}

/// POST sessions 的响应
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_new_session: Option<bool>,
}

/// 知识条目
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KnowledgeEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub trigger_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
}

/// GET knowledge 的响应
pub type KnowledgeList = KeyedList<KnowledgeEntry>;

/// POST knowledge 的请求体
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateKnowledgeRequest {
    pub name: String,
    pub body: String,
    pub trigger_description: String,
    #[serde(rename = "macro", skip_serializing_if = "Option::is_none")]
    pub macro_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_repo: Option<String>,
}

/// PUT knowledge/{id} 的请求体：只发送给出的字段
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateKnowledgeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_description: Option<String>,
}

/// 团队 Playbook
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Playbook {
    #[serde(default)]
    pub playbook_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(rename = "macro", default)]
    pub macro_name: Option<String>,
}

/// Playbook 创建/更新请求体
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlaybookRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(rename = "macro", skip_serializing_if = "Option::is_none")]
    pub macro_name: Option<String>,
}

/// 组织密钥（列表只返回元数据）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// 列表响应：期望是数组，否则保留原始 JSON 由调用方原样展示
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Items(Vec<T>),
    Raw(Value),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_status_terminal_set() {
        assert!(SessionStatus::Blocked.is_terminal());
        assert!(SessionStatus::Finished.is_terminal());
        assert!(!SessionStatus::Working.is_terminal());
        assert!(!SessionStatus::from("expired").is_terminal());
    }

    #[test]
    fn test_session_deserialize_status_enum() {
        let s: Session = serde_json::from_value(json!({
            "session_id": "devin-1",
            "status_enum": "blocked",
            "url": "https://app.devin.ai/sessions/1",
            "structured_output": {"progress": 50},
            "unknown_field": true
        }))
        .unwrap();
        assert_eq!(s.status, Some(SessionStatus::Blocked));
        assert!(s.is_terminal());
        assert_eq!(s.structured_output, Some(json!({"progress": 50})));
    }

    #[test]
    fn test_session_missing_status_is_not_terminal() {
        let s: Session = serde_json::from_value(json!({"session_id": "x", "status_enum": null})).unwrap();
        assert!(!s.is_terminal());
        assert_eq!(s.status_label(), "unknown");
    }

    #[test]
    fn test_unknown_status_round_trips_text() {
        let s: Session = serde_json::from_value(json!({"status_enum": "suspend_requested"})).unwrap();
        assert_eq!(s.status_label(), "suspend_requested");
    }

    #[test]
    fn test_create_request_omits_empty_optionals() {
        let req = CreateSessionRequest::new("fix the bug");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"prompt": "fix the bug", "idempotent": false, "unlisted": false})
        );
    }

    #[test]
    fn test_create_request_with_playbook_and_secrets() {
        let mut req = CreateSessionRequest::new("p").playbook(Some("pb-1".into()));
        req.session_secrets.push(SessionSecret {
            key: "K".into(),
            value: "V".into(),
        });
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["playbook_id"], json!("pb-1"));
        assert_eq!(v["session_secrets"], json!([{"key": "K", "value": "V"}]));
    }

    #[test]
    fn test_playbook_macro_rename() {
        let req = PlaybookRequest {
            macro_name: Some("!deploy".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"macro": "!deploy"}));
    }

    #[test]
    fn test_display_fields_decode_leniently() {
        let s: Session = serde_json::from_value(json!({
            "session_id": "d1",
            "status_enum": "working",
            "title": 7,
            "prompt": {"text": "nested"},
            "tags": ["ci", 3, null],
            "messages": "not a list",
            "created_at": null
        }))
        .unwrap();
        assert_eq!(s.title.as_deref(), Some("7"));
        assert_eq!(s.prompt.as_deref(), Some(r#"{"text":"nested"}"#));
        assert_eq!(s.tags, Some(vec!["ci".to_string(), "3".to_string()]));
        assert_eq!(s.messages, None);
        assert_eq!(s.created_at, None);
        assert_eq!(s.status, Some(SessionStatus::Working));
    }

    #[test]
    fn test_keyed_list_keeps_unmodelled_fields() {
        let list = SessionList::from_value(
            json!({"sessions": [{"session_id": "d1", "title": 7, "snapshot_id": "snap-9"}]}),
            "sessions",
        );
        let items = list.items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title.as_deref(), Some("7"));
        assert_eq!(list.raw_items()[0]["snapshot_id"], json!("snap-9"));
    }

    #[test]
    fn test_keyed_list_unexpected_shape_keeps_raw() {
        let array = SessionList::from_value(json!([{"session_id": "d1"}]), "sessions");
        assert!(array.items().is_none());
        assert_eq!(array.raw_items(), &json!([{"session_id": "d1"}]));

        let knowledge = KnowledgeList::from_value(json!({"detail": "paged"}), "knowledge");
        assert!(knowledge.items().is_none());
        assert_eq!(knowledge.raw_items(), &json!({"detail": "paged"}));

        let not_objects = KnowledgeList::from_value(json!({"knowledge": [1, 2]}), "knowledge");
        assert!(not_objects.items().is_none());
        assert_eq!(not_objects.raw_items(), &json!([1, 2]));
    }

    #[test]
    fn test_listing_falls_back_to_raw() {
        let items: Listing<Secret> = serde_json::from_value(json!([{"id": "s1", "name": "GH"}])).unwrap();
        assert!(matches!(items, Listing::Items(ref v) if v.len() == 1));
        let raw: Listing<Secret> = serde_json::from_value(json!({"detail": "odd"})).unwrap();
        assert!(matches!(raw, Listing::Raw(_)));
    }
}
