//! 合成的 "摩天楼" batch 与结节, 用于在没有真实数据集的情况下比较填充策略.
//!
//! 所有数据由固定种子的 [`StdRng`] 产生, 因此每次运行结果一致.

use mask_berry::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 以 `seed` 初始化可复现的随机数生成器.
#[inline]
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// 沿 z 轴堆叠 `patients` 个形状为 `patient` 的病人.
pub struct Skyscraper {
    /// 整个 batch 的形状.
    pub shape: Idx3d,

    /// 每个病人的窗口.
    pub windows: Vec<Window>,
}

impl Skyscraper {
    /// 构建摩天楼.
    pub fn new(patients: usize, patient: Idx3d) -> Self {
        let (z, y, x) = patient;
        let windows = (0..patients)
            .filter_map(|i| Window::new((i * z, 0, 0), ((i + 1) * z, y, x)))
            .collect();
        Self {
            shape: (patients * z, y, x),
            windows,
        }
    }

    /// 为每个病人生成 `per_patient` 个长方体结节. 部分结节会越出窗口.
    pub fn box_nodules(&self, per_patient: usize, rng: &mut StdRng) -> Vec<BoxNodule> {
        self.nodules(per_patient, rng, |w, c, r| {
            BoxNodule::from_center_size(w, c, (2 * r.0, 2 * r.1, 2 * r.2))
        })
    }

    /// 为每个病人生成 `per_patient` 个椭球结节. 部分结节会越出窗口.
    pub fn ellipsoid_nodules(
        &self,
        per_patient: usize,
        rng: &mut StdRng,
    ) -> Vec<EllipsoidNodule> {
        self.nodules(per_patient, rng, EllipsoidNodule::new)
    }

    fn nodules<N, F>(&self, per_patient: usize, rng: &mut StdRng, make: F) -> Vec<N>
    where
        F: Fn(Window, Idx3dI64, Idx3d) -> Option<N>,
    {
        let mut ans = Vec::with_capacity(self.windows.len() * per_patient);
        for &w in self.windows.iter() {
            let (z, y, x) = w.size();
            for _ in 0..per_patient {
                // 中心允许略微越出窗口, 以覆盖裁剪路径.
                let mut coord = |len: usize| rng.gen_range(-4..len as i64 + 4);
                let center = (coord(z), coord(y), coord(x));
                let mut radius = |len: usize| rng.gen_range(1..=(len / 6).max(1));
                let r = (radius(z), radius(y), radius(x));
                ans.extend(make(w, center, r));
            }
        }
        ans
    }
}

/// 生成 `n` 个回归预测, 置信度均匀分布在 `[0, 1)`.
pub fn predictions(n: usize, rng: &mut StdRng) -> Vec<Prediction> {
    (0..n)
        .filter_map(|_| {
            let center = (rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>());
            let size = (
                rng.gen_range(0.0..0.5),
                rng.gen_range(0.0..0.5),
                rng.gen_range(0.0..0.5),
            );
            Prediction::new(center, size, rng.gen::<f64>())
        })
        .collect()
}
