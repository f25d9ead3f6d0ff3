//! 本地配置
//!
//! 两层：
//! - **ConfigStore**：唯一的持久化状态，`<config_dir>/config.json` 中的扁平 JSON 对象（api_token / base_url / current_session_id）。
//!   每次写入整文件重写，后写者胜，不加锁。以 trait 注入，测试和嵌入方可用 MemoryConfigStore 隔离。
//! - **Settings**：运行时有效配置。加载顺序：内置默认值 → config.json 内容 → 环境变量 `DEVIN_*`
//!   （`DEVIN_API_TOKEN`、`DEVIN_BASE_URL`；双下划线表示嵌套，如 `DEVIN_POLL__CHAIN_CEILING_SECS=5`）。

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::DEFAULT_BASE_URL;

/// 覆盖配置目录的环境变量
pub const ENV_CONFIG_DIR: &str = "DEVIN_CONFIG_DIR";
pub const CONFIG_FILE_NAME: &str = "config.json";

const KEY_API_TOKEN: &str = "api_token";
const KEY_BASE_URL: &str = "base_url";
const KEY_CURRENT_SESSION: &str = "current_session_id";

/// 默认配置目录：`$DEVIN_CONFIG_DIR`，否则 `~/.config/devin`
pub fn default_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("devin")
}

/// 本地键值存储能力
pub trait ConfigStore: Send {
    /// 读取字符串值；不存在或不是字符串时返回 None
    fn get(&self, key: &str) -> Option<String>;

    /// 写入并立即持久化
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;

    /// 当前全部已存储内容（供 Settings 分层加载）
    fn snapshot(&self) -> Value;

    /// 存储位置描述（文件路径或 "memory"）
    fn location(&self) -> String;

    fn current_session_id(&self) -> Option<String> {
        self.get(KEY_CURRENT_SESSION)
    }

    fn set_current_session_id(&mut self, session_id: &str) -> io::Result<()> {
        self.set(KEY_CURRENT_SESSION, session_id)
    }

    /// 已存储的 base_url（不含环境变量覆盖）
    fn base_url(&self) -> Option<String> {
        self.get(KEY_BASE_URL)
    }

    fn set_base_url(&mut self, base_url: &str) -> io::Result<()> {
        self.set(KEY_BASE_URL, base_url)
    }

    fn set_api_token(&mut self, token: &str) -> io::Result<()> {
        self.set(KEY_API_TOKEN, token)
    }
}

/// 基于 JSON 文件的存储
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    data: Map<String, Value>,
}

impl FileConfigStore {
    /// 打开（必要时创建）配置目录与文件；损坏或无法解析的文件按空对象处理
    pub fn open(config_dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = config_dir.as_ref();
        let path = dir.join(CONFIG_FILE_NAME);
        ensure_exists(dir, &path)?;

        let data = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                _ => {
                    tracing::warn!(path = %path.display(), "config file is not a JSON object, starting empty");
                    Map::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e),
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> io::Result<()> {
        let text = serde_json::to_string_pretty(&self.data).map_err(io::Error::other)?;
        std::fs::write(&self.path, text)
    }
}

/// 目录 0700、文件 0600（仅 Unix）
fn ensure_exists(dir: &Path, path: &Path) -> io::Result<()> {
    if !dir.exists() {
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(dir)?;
    }
    if !path.exists() {
        std::fs::write(path, "{}")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
    }
    Ok(())
}

impl ConfigStore for FileConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).and_then(Value::as_str).map(String::from)
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.data.insert(key.to_string(), Value::String(value.to_string()));
        self.save()
    }

    fn snapshot(&self) -> Value {
        Value::Object(self.data.clone())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// 纯内存存储：不落盘，用于测试或需要隔离的调用方
#[derive(Debug, Default, Clone)]
pub struct MemoryConfigStore {
    data: Map<String, Value>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).and_then(Value::as_str).map(String::from)
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.data.insert(key.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    fn snapshot(&self) -> Value {
        Value::Object(self.data.clone())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// 运行时有效配置
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub poll: PollSettings,
    /// 单次 HTTP 请求超时（秒）；未设置时不限制
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// [poll] 段：两种轮询场景各自的退避上限，互不影响
#[derive(Debug, Clone, Deserialize)]
pub struct PollSettings {
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: f64,
    #[serde(default = "default_factor")]
    pub factor: f64,
    /// watch 命令（交互式）的退避上限
    #[serde(default = "default_watch_ceiling_secs")]
    pub watch_ceiling_secs: f64,
    /// chain 每一步等待时的退避上限
    #[serde(default = "default_chain_ceiling_secs")]
    pub chain_ceiling_secs: f64,
}

fn default_initial_delay_secs() -> f64 {
    1.0
}

fn default_factor() -> f64 {
    1.5
}

fn default_watch_ceiling_secs() -> f64 {
    30.0
}

fn default_chain_ceiling_secs() -> f64 {
    10.0
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay_secs(),
            factor: default_factor(),
            watch_ceiling_secs: default_watch_ceiling_secs(),
            chain_ceiling_secs: default_chain_ceiling_secs(),
        }
    }
}

impl Settings {
    /// 从已存储内容 + 进程环境变量加载
    pub fn load(store: &dyn ConfigStore) -> Result<Self, config::ConfigError> {
        Self::from_sources(&store.snapshot(), None)
    }

    /// env 为 None 时读取进程环境变量；测试可传入固定的变量表
    pub fn from_sources(
        stored: &Value,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let stored_json = stored.to_string();
        let c = config::Config::builder()
            .add_source(config::File::from_str(&stored_json, config::FileFormat::Json))
            .add_source(
                config::Environment::with_prefix("DEVIN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;
        c.try_deserialize()
    }
}
