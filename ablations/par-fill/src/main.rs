//! 顺序填充与 `rayon` 并行填充的对比实验.

mod profile;
mod result;
mod runner;

fn main() {
    simple_logger::init_with_level(log::Level::Info).expect("Logger init error");
    runner::run().analyze();
}
