//! 终端输出层：crossterm 着色与原地重绘（sink）、表格与面板渲染（render）

pub mod render;
pub mod sink;

pub use render::{colored_status, pretty_json, sessions_table, status_color};
pub use sink::{SinkMode, TerminalSink};
