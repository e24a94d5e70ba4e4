//! 事件 trait
//!
//! 定义仿真事件接口。

use super::simulator::Simulator;
use crate::env::Environment;
use crate::error::SimError;

/// 事件：可被调度执行。使用 `self: Box<Self>` 以支持 move/所有权转移。
/// 返回 `Err` 表示触发了内部不变量违例，调度器会停止推进仿真并向上传播。
pub trait Event: 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, env: &mut Environment) -> Result<(), SimError>;
}
