//! 远程 API 层：HTTP 客户端、错误分类、数据类型与各资源接口（会话 / 知识 / Playbook / 密钥 / 附件）

pub mod attachments;
pub mod client;
pub mod error;
pub mod knowledge;
pub mod mock;
pub mod playbooks;
pub mod secrets;
pub mod sessions;
pub mod traits;
pub mod types;

pub use attachments::attachment_url;
pub use client::{DevinClient, DEFAULT_BASE_URL};
pub use error::ApiError;
pub use traits::SessionApi;
pub use types::{
    CreateKnowledgeRequest, CreateSessionRequest, CreateSessionResponse, KeyedList,
    KnowledgeEntry, KnowledgeList, Listing, Playbook, PlaybookRequest, Secret, Session, SessionList,
    SessionSecret, SessionStatus, UpdateKnowledgeRequest,
};
