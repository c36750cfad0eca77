//! 算法运行统计.

use std::time::{Duration, Instant};

/// 可暂停的累计计时器.
///
/// 每次 `start` 与 `elapsed` 之间的时长都会累加进总耗时,
/// 区间之外的时间 (例如另一种实现在运行时) 不计入.
#[derive(Clone, Debug)]
pub struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 创建计时器, 总耗时为 0, 并立即开始一个区间.
    #[inline]
    pub fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始一个新区间.
    #[inline]
    pub fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束当前区间并累加, 返回该区间的时长.
    ///
    /// 应与 `start` 成对调用.
    #[inline]
    pub fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 累计总耗时, 单位为微秒.
    #[inline]
    pub fn get_total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

impl Default for AccTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// 单个填充任务的对比统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 重复轮数.
    pub rounds: u32,

    /// 顺序版本累计耗时 (微秒).
    pub sequential_us: u64,

    /// 并行版本累计耗时 (微秒).
    pub parallel_us: u64,

    /// 单轮被置位的体素个数.
    pub voxels: usize,

    /// 两种版本的输出是否逐体素一致.
    pub identical: bool,
}

impl Profile {
    /// 加速比. 并行耗时为 0 时返回 `None`.
    pub fn speedup(&self) -> Option<f64> {
        (self.parallel_us != 0).then(|| self.sequential_us as f64 / self.parallel_us as f64)
    }
}
