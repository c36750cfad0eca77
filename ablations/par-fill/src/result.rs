//! 实验结果.

use crate::profile::Profile;
use std::io::{self, Write};

/// 将 `profile` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Profile `{name}`:")?;
    writeln!(w, "{S4}Rounds: {}", p.rounds)?;
    writeln!(w, "{S4}Voxels set per round: {}", p.voxels)?;
    writeln!(w, "{S4}Sequential total time: {} us", p.sequential_us)?;
    writeln!(w, "{S4}Parallel total time: {} us", p.parallel_us)?;
    match p.speedup() {
        Some(s) => writeln!(w, "{S4}Speedup: {s:.3}x")?,
        None => writeln!(w, "{S4}Speedup: /")?,
    }
    write!(w, "{S4}Identical output: {}", p.identical)?;
    Ok(())
}

/// 对比实验最终结果.
pub struct AblationResult {
    data: Vec<(&'static str, Profile)>,
}

impl AblationResult {
    pub fn from_iter<I: IntoIterator<Item = (&'static str, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        let mut out = io::stdout().lock();
        for (name, p) in self.data.iter() {
            utils::sep_to(&mut out).expect("Writing error");
            describe_into(name, p, &mut out).expect("Writing error");
            writeln!(out).expect("Writing error");
        }
        utils::sep_to(&mut out).expect("Writing error");

        let broken: Vec<_> = self
            .data
            .iter()
            .filter(|(_, p)| !p.identical)
            .map(|(n, _)| *n)
            .collect();
        assert!(broken.is_empty(), "Parallel output differs: {broken:?}");
    }
}
