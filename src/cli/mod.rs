//! 命令层：clap 定义与分发
//!
//! 每个子命令对应一个处理函数：
//! - **sessions**: 会话创建、查询、消息、监视、标签、终止、附件
//! - **local**: 只读写本地配置的命令（configure / use-session / history）
//! - **resources**: 知识库、Playbook、组织密钥
//! - **chain**: Playbook 链式执行

pub mod chain;
pub mod input;
pub mod local;
pub mod resources;
pub mod sessions;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::api::DevinClient;
use crate::config::{default_config_dir, ConfigStore, FileConfigStore, Settings};
use crate::core::CliError;

#[derive(Debug, Parser)]
#[command(name = "devin", version)]
#[command(about = "Unofficial CLI for Devin AI", long_about = None)]
pub struct Cli {
    /// 输出调试日志（等价于 RUST_LOG=debug）
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Configure the CLI with your Devin API token
    Configure {
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Create a new Devin session
    CreateSession {
        prompt: Option<String>,
        /// Read prompt from file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Custom session title
        #[arg(short, long)]
        title: Option<String>,
        /// Idempotent creation
        #[arg(short, long)]
        idempotent: bool,
        /// Session secrets in KEY=VALUE format
        #[arg(short = 's', long = "secret")]
        secrets: Vec<String>,
        /// Knowledge IDs to include
        #[arg(short = 'k', long = "knowledge-id")]
        knowledge_ids: Vec<String>,
        /// Stored secret IDs to include
        #[arg(long = "secret-id")]
        secret_ids: Vec<String>,
        /// Maximum ACU limit
        #[arg(long = "max-acu")]
        max_acu_limit: Option<u32>,
        /// Create unlisted session
        #[arg(long)]
        unlisted: bool,
        /// Playbook to start the session with
        #[arg(long)]
        playbook: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List your Devin sessions
    ListSessions {
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get details for a session
    GetSession { session_id: Option<String> },
    /// Send a message to a session
    Message {
        text: Option<String>,
        /// Read message from file
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(long)]
        session_id: Option<String>,
    },
    /// Watch a session's progress live
    Watch {
        session_id: Option<String>,
        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Update tags for a session (overwrites existing)
    UpdateTags {
        session_id: Option<String>,
        #[arg(short = 't', long = "tag", required = true)]
        tags: Vec<String>,
    },
    /// Terminate a session
    Terminate {
        session_id: Option<String>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Upload a file to Devin (prints the attachment URL)
    Upload { file: PathBuf },
    /// Upload a file and create a session with it attached
    Attach { file: PathBuf, prompt: String },
    /// Switch the current active session
    UseSession { session_id: String },
    /// Open the current session in your browser
    Open,
    /// Get the status of the current session
    Status,
    /// Show the locally recorded session
    History,
    /// Show conversation history for a session
    Messages { session_id: Option<String> },
    /// List all knowledge entries
    ListKnowledge,
    /// Create a new knowledge entry
    CreateKnowledge {
        name: String,
        body: String,
        trigger_description: String,
        #[arg(long = "macro")]
        macro_name: Option<String>,
        #[arg(long)]
        parent_folder_id: Option<String>,
        #[arg(long)]
        pinned_repo: Option<String>,
    },
    /// Update an existing knowledge entry
    UpdateKnowledge {
        knowledge_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        trigger: Option<String>,
    },
    /// Delete a knowledge entry
    DeleteKnowledge {
        knowledge_id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// List all playbooks
    ListPlaybooks,
    /// Show a single playbook
    GetPlaybook { playbook_id: String },
    /// Create a new team playbook
    CreatePlaybook {
        title: String,
        body: String,
        #[arg(long = "macro")]
        macro_name: Option<String>,
    },
    /// Update an existing team playbook
    UpdatePlaybook {
        playbook_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long = "macro")]
        macro_name: Option<String>,
    },
    /// Delete a team playbook
    DeletePlaybook {
        playbook_id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// List all organization secrets
    ListSecrets,
    /// Delete an organization secret
    DeleteSecret {
        secret_id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// (Beta) Run a chain of playbooks on one session
    Chain {
        /// Initial prompt
        prompt: Option<String>,
        /// Comma-separated playbook IDs
        #[arg(long)]
        playbooks: Option<String>,
        /// Workflow YAML file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Per-step wait limit in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

/// 命令执行上下文：本地存储；生效配置按需加载
///
/// configure / use-session / history 只读写存储，配置层出错时它们仍然可用。
pub struct Context {
    pub store: FileConfigStore,
}

impl Context {
    pub fn load() -> Result<Self, CliError> {
        let store = FileConfigStore::open(default_config_dir())?;
        Ok(Self { store })
    }

    /// 文件 + 环境变量合成的生效配置
    pub fn settings(&self) -> Result<Settings, CliError> {
        Ok(Settings::load(&self.store)?)
    }

    pub fn client(&self) -> Result<DevinClient, CliError> {
        Ok(DevinClient::from_settings(&self.settings()?)?)
    }

    /// 显式给出的会话 ID，否则取本地当前会话
    pub fn session_id(&self, explicit: Option<String>) -> Result<String, CliError> {
        explicit
            .filter(|s| !s.is_empty())
            .or_else(|| self.store.current_session_id())
            .ok_or(CliError::NoActiveSession)
    }
}

/// 执行一条命令
pub async fn run(command: Commands) -> anyhow::Result<()> {
    let mut ctx = Context::load()?;
    match command {
        Commands::Configure { token, base_url } => local::configure(&mut ctx, token, base_url),
        Commands::UseSession { session_id } => local::use_session(&mut ctx, &session_id),
        Commands::History => local::history(&ctx),

        Commands::CreateSession {
            prompt,
            file,
            title,
            idempotent,
            secrets,
            knowledge_ids,
            secret_ids,
            max_acu_limit,
            unlisted,
            playbook,
            tags,
        } => {
            let prompt =
                input::text_from_file_or_arg(file.as_deref(), prompt, "Must provide prompt argument or --file option")?;
            let request = crate::api::CreateSessionRequest {
                prompt,
                idempotent,
                unlisted,
                playbook_id: playbook,
                tags,
                session_secrets: input::parse_session_secrets(&secrets),
                title,
                knowledge_ids,
                secret_ids,
                max_acu_limit,
                ..Default::default()
            };
            sessions::create_session(&mut ctx, &request).await
        }
        Commands::ListSessions { limit, json } => sessions::list_sessions(&ctx, limit, json).await,
        Commands::GetSession { session_id } => sessions::get_session(&ctx, session_id).await,
        Commands::Message {
            text,
            file,
            session_id,
        } => sessions::message(&ctx, text, file, session_id).await,
        Commands::Watch {
            session_id,
            timeout,
        } => sessions::watch(&ctx, session_id, timeout).await,
        Commands::UpdateTags { session_id, tags } => sessions::update_tags(&ctx, session_id, &tags).await,
        Commands::Terminate { session_id, yes } => sessions::terminate(&ctx, session_id, yes).await,
        Commands::Upload { file } => sessions::upload(&ctx, &file).await,
        Commands::Attach { file, prompt } => sessions::attach(&mut ctx, &file, &prompt).await,
        Commands::Open => sessions::open_in_browser(&ctx).await,
        Commands::Status => sessions::status(&ctx).await,
        Commands::Messages { session_id } => sessions::messages(&ctx, session_id).await,

        Commands::ListKnowledge => resources::list_knowledge(&ctx).await,
        Commands::CreateKnowledge {
            name,
            body,
            trigger_description,
            macro_name,
            parent_folder_id,
            pinned_repo,
        } => {
            let request = crate::api::CreateKnowledgeRequest {
                name,
                body,
                trigger_description,
                macro_name,
                parent_folder_id,
                pinned_repo,
            };
            resources::create_knowledge(&ctx, &request).await
        }
        Commands::UpdateKnowledge {
            knowledge_id,
            name,
            body,
            trigger,
        } => {
            let request = crate::api::UpdateKnowledgeRequest {
                name,
                body,
                trigger_description: trigger,
            };
            resources::update_knowledge(&ctx, &knowledge_id, &request).await
        }
        Commands::DeleteKnowledge { knowledge_id, yes } => {
            resources::delete_knowledge(&ctx, &knowledge_id, yes).await
        }
        Commands::ListPlaybooks => resources::list_playbooks(&ctx).await,
        Commands::GetPlaybook { playbook_id } => resources::get_playbook(&ctx, &playbook_id).await,
        Commands::CreatePlaybook {
            title,
            body,
            macro_name,
        } => resources::create_playbook(&ctx, &title, &body, macro_name).await,
        Commands::UpdatePlaybook {
            playbook_id,
            title,
            body,
            macro_name,
        } => {
            let request = crate::api::PlaybookRequest {
                title,
                body,
                macro_name,
            };
            resources::update_playbook(&ctx, &playbook_id, &request).await
        }
        Commands::DeletePlaybook { playbook_id, yes } => {
            resources::delete_playbook(&ctx, &playbook_id, yes).await
        }
        Commands::ListSecrets => resources::list_secrets(&ctx).await,
        Commands::DeleteSecret { secret_id, yes } => resources::delete_secret(&ctx, &secret_id, yes).await,

        Commands::Chain {
            prompt,
            playbooks,
            file,
            timeout,
        } => chain::run(&mut ctx, prompt, playbooks, file, timeout).await,
    }
}
