//! 命令定义和实现

pub mod fly;
pub mod monitor;
pub mod sim;

pub use fly::FlyCommand;
pub use monitor::MonitorCommand;
pub use sim::SimCommand;
