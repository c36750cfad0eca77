//! 程序运行函数.

use crate::profile::{AccTimer, Profile};
use crate::result::AblationResult;
use log::info;
use mask_berry::prelude::*;
use ndarray::{Array3, Array4};
use utils::synthetic::{self, Skyscraper};

const ROUNDS: u32 = 8;
const PATIENTS: usize = 16;
const PATIENT_SHAPE: Idx3d = (64, 96, 96);
const NODULES_PER_PATIENT: usize = 6;
const BATCH: usize = 256;
const CROP_SHAPE: Idx3d = (32, 64, 64);

/// 统计 `ROUNDS` 轮中 `seq` 与 `par` 的累计耗时, 并比较最后一轮的输出.
fn compare<V, F, G>(seq: F, par: G, count: fn(&V) -> usize) -> Profile
where
    V: PartialEq,
    F: Fn() -> V,
    G: Fn() -> V,
{
    let (mut t_seq, mut t_par) = (AccTimer::new(), AccTimer::new());
    let (mut a, mut b) = (None, None);
    for _ in 0..ROUNDS {
        t_seq.start();
        a = Some(seq());
        t_seq.elapsed();

        t_par.start();
        b = Some(par());
        t_par.elapsed();
    }
    Profile {
        rounds: ROUNDS,
        sequential_us: t_seq.get_total_us(),
        parallel_us: t_par.get_total_us(),
        voxels: a.as_ref().map_or(0, count),
        identical: a == b,
    }
}

fn count3(v: &Array3<u8>) -> usize {
    v.iter().filter(|p| is_marked(*p)).count()
}

fn count4(v: &Array4<f32>) -> usize {
    v.iter().filter(|p| is_marked(*p)).count()
}

/// 实际运行.
pub fn run() -> AblationResult {
    info!("Running on {} cpus...", utils::cpus());

    let mut rng = synthetic::seeded(0x6d61_736b);
    let sky = Skyscraper::new(PATIENTS, PATIENT_SHAPE);
    let boxes = sky.box_nodules(NODULES_PER_PATIENT, &mut rng);
    let ellipsoids = sky.ellipsoid_nodules(NODULES_PER_PATIENT, &mut rng);
    let preds = synthetic::predictions(BATCH, &mut rng);
    let config = RegressionConfig::new(CROP_SHAPE, 0.5).expect("Invalid regression config");

    let fill_with = |f: &dyn Fn(&mut Array3<u8>) -> MaskResult<()>| {
        let mut v = Array3::<u8>::zeros(sky.shape);
        f(&mut v).expect("Window out of bounds");
        v
    };

    let box_profile = compare(
        || fill_with(&|v| fill_boxes(v, &boxes)),
        || fill_with(&|v| par_fill_boxes(v.view_mut(), &boxes)),
        count3,
    );
    info!("Box nodules done");

    let ellipse_profile = compare(
        || fill_with(&|v| fill_ellipsoids(v, &ellipsoids)),
        || fill_with(&|v| par_fill_ellipsoids(v.view_mut(), &ellipsoids)),
        count3,
    );
    info!("Ellipsoid nodules done");

    let batch_profile = compare(
        || build_batch_masks::<f32>(&preds, &config),
        || par_build_batch_masks::<f32>(&preds, &config),
        count4,
    );
    info!("Regression batch done");

    AblationResult::from_iter([
        ("box", box_profile),
        ("ellipsoid", ellipse_profile),
        ("regression", batch_profile),
    ])
}
