//! 仿真时间类型
//!
//! 定义仿真时间及其单位转换。内部以纳秒存储，保证在 `BinaryHeap` 中
//! 有严格全序；对外暴露浮点毫秒接口，配合链路/流模型里大量的分数
//! 毫秒运算（例如 `DATA_PCK_SIZE / rate`）。

/// 仿真时间（纳秒）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub fn from_millis_f64(ms: f64) -> SimTime {
        let ms = ms.max(0.0);
        SimTime((ms * 1_000_000.0).round() as u64)
    }

    pub fn from_secs_f64(s: f64) -> SimTime {
        Self::from_millis_f64(s * 1_000.0)
    }

    pub fn as_millis_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }
}

impl std::ops::Add for SimTime {
    type Output = SimTime;
    fn add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for SimTime {
    type Output = SimTime;
    fn sub(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(rhs.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_roundtrip() {
        let t = SimTime::from_millis_f64(12.5);
        assert!((t.as_millis_f64() - 12.5).abs() < 1e-6);
    }

    #[test]
    fn ordering_matches_value() {
        let a = SimTime::from_millis_f64(1.0);
        let b = SimTime::from_millis_f64(2.0);
        assert!(a < b);
    }
}
