// crates/mf_io/src/snapshot.rs

//! 快照输出
//!
//! 每个快照两个文件：
//!
//! ```text
//! snapshot_{step:04}.json   元数据（步数、时间、网格、场布局、诊断）
//! snapshot_{step:04}.bin    [魔数 "MFSNAP01"] [P][U][V][W]，小端 f64
//! ```
//!
//! 各场按元数据记录的展平顺序存放；元数据中的 offset/len 以元素计，
//! 从魔数之后开始。终态写为 `final_state_snapshot.{json,bin}`。

use std::fs;
use std::path::{Path, PathBuf};

use mf_foundation::{FlatteningOrder, MfResult};
use mf_physics::{Component, Grid, Snapshot, SnapshotSink};
use serde::{Deserialize, Serialize};

use crate::error::{IoError, IoResult};

/// 数据文件魔数
pub const SNAPSHOT_MAGIC: &[u8; 8] = b"MFSNAP01";

/// 元数据格式版本
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// 终态快照的文件名主干
pub const FINAL_STEM: &str = "final_state_snapshot";

/// 第 `step` 步快照的文件名主干
pub fn snapshot_stem(step: usize) -> String {
    format!("snapshot_{step:04}")
}

/// 网格摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSummary {
    /// (x_min, x_max, y_min, y_max, z_min, z_max)
    pub extents: [f64; 6],
    /// (nx, ny, nz)
    pub counts: [usize; 3],
    /// (dx, dy, dz)
    pub spacings: [f64; 3],
}

impl GridSummary {
    /// 由网格构造
    pub fn of(grid: &Grid) -> Self {
        Self {
            extents: grid.extents(),
            counts: [grid.nx(), grid.ny(), grid.nz()],
            spacings: grid.spacings(),
        }
    }
}

/// 单个场在数据文件中的位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    /// 场名（P、U、V、W）
    pub name: String,
    /// 形状
    pub shape: [usize; 3],
    /// 起始元素偏移
    pub offset: usize,
    /// 元素个数
    pub len: usize,
}

/// 快照元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// 格式版本
    pub format_version: u32,
    /// 步数
    pub step: usize,
    /// 时间
    pub time: f64,
    /// 模拟阶段
    pub phase: String,
    /// 网格摘要
    pub grid: GridSummary,
    /// 展平顺序
    pub flattening_order: FlatteningOrder,
    /// 场布局
    pub fields: Vec<FieldEntry>,
    /// 诊断记录
    pub diagnostics: serde_json::Value,
}

impl SnapshotMetadata {
    /// 按名称查找场
    pub fn field(&self, name: &str) -> Option<&FieldEntry> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 数据文件中的元素总数
    pub fn total_len(&self) -> usize {
        self.fields.iter().map(|f| f.len).sum()
    }
}

/// 构造元数据与数据文件内容
pub fn encode_snapshot(snapshot: &Snapshot<'_>) -> IoResult<(SnapshotMetadata, Vec<u8>)> {
    let fields = snapshot.fields;
    let shapes = fields.shapes();
    let parts: [(&str, &[f64]); 4] = [
        ("P", fields.pressure()),
        (Component::U.name(), fields.component(Component::U)),
        (Component::V.name(), fields.component(Component::V)),
        (Component::W.name(), fields.component(Component::W)),
    ];

    let mut entries = Vec::with_capacity(4);
    let total: usize = parts.iter().map(|(_, v)| v.len()).sum();
    let mut bytes = Vec::with_capacity(SNAPSHOT_MAGIC.len() + 8 * total);
    bytes.extend_from_slice(SNAPSHOT_MAGIC);

    let mut offset = 0;
    for ((name, values), shape) in parts.into_iter().zip(shapes) {
        entries.push(FieldEntry {
            name: name.to_string(),
            shape,
            offset,
            len: values.len(),
        });
        for v in values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        offset += values.len();
    }

    let diagnostics = serde_json::to_value(snapshot.diagnostics).map_err(|source| IoError::Json {
        path: PathBuf::from("<diagnostics>"),
        source,
    })?;

    let metadata = SnapshotMetadata {
        format_version: SNAPSHOT_FORMAT_VERSION,
        step: snapshot.step,
        time: snapshot.time,
        phase: snapshot.phase.to_string(),
        grid: GridSummary::of(snapshot.grid),
        flattening_order: snapshot.order,
        fields: entries,
        diagnostics,
    };
    Ok((metadata, bytes))
}

/// 解码数据文件，校验魔数与长度
pub fn decode_snapshot_data(path: &Path, bytes: &[u8]) -> IoResult<Vec<f64>> {
    let Some(payload) = bytes.strip_prefix(SNAPSHOT_MAGIC.as_slice()) else {
        return Err(IoError::format(path, "缺少快照魔数 MFSNAP01"));
    };
    if payload.len() % 8 != 0 {
        return Err(IoError::format(
            path,
            format!("数据长度 {} 不是 8 的整数倍", payload.len()),
        ));
    }
    Ok(payload
        .chunks_exact(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            f64::from_le_bytes(buf)
        })
        .collect())
}

/// 从磁盘读取一对快照文件
pub fn read_snapshot(dir: &Path, stem: &str) -> IoResult<(SnapshotMetadata, Vec<f64>)> {
    let json_path = dir.join(format!("{stem}.json"));
    let bin_path = dir.join(format!("{stem}.bin"));

    let text = fs::read_to_string(&json_path).map_err(|e| IoError::file(&json_path, e))?;
    let metadata: SnapshotMetadata =
        serde_json::from_str(&text).map_err(|source| IoError::Json {
            path: json_path.clone(),
            source,
        })?;

    let bytes = fs::read(&bin_path).map_err(|e| IoError::file(&bin_path, e))?;
    let data = decode_snapshot_data(&bin_path, &bytes)?;
    if data.len() != metadata.total_len() {
        return Err(IoError::format(
            &bin_path,
            format!("元素个数 {} 与元数据 {} 不符", data.len(), metadata.total_len()),
        ));
    }
    Ok((metadata, data))
}

/// 写入目录的快照输出
#[derive(Debug)]
pub struct SnapshotWriter {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl SnapshotWriter {
    /// 创建（目录不存在时创建）
    pub fn new(dir: impl Into<PathBuf>) -> IoResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| IoError::file(&dir, e))?;
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    /// 输出目录
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 已写出的文件（按写出顺序）
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// 写出一对快照文件
    pub fn write(&mut self, stem: &str, snapshot: &Snapshot<'_>) -> IoResult<()> {
        let (metadata, bytes) = encode_snapshot(snapshot)?;

        let json_path = self.dir.join(format!("{stem}.json"));
        let text = serde_json::to_string_pretty(&metadata).map_err(|source| IoError::Json {
            path: json_path.clone(),
            source,
        })?;
        fs::write(&json_path, text).map_err(|e| IoError::file(&json_path, e))?;

        let bin_path = self.dir.join(format!("{stem}.bin"));
        fs::write(&bin_path, &bytes).map_err(|e| IoError::file(&bin_path, e))?;

        log::debug!("快照已写出: {} (step {}, t = {})", stem, snapshot.step, snapshot.time);
        self.written.push(json_path);
        self.written.push(bin_path);
        Ok(())
    }
}

impl SnapshotSink for SnapshotWriter {
    fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> MfResult<()> {
        let stem = snapshot_stem(snapshot.step);
        Ok(self.write(&stem, snapshot)?)
    }

    fn write_final(&mut self, snapshot: &Snapshot<'_>) -> MfResult<()> {
        Ok(self.write(FINAL_STEM, snapshot)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_config::CaseConfig;
    use mf_physics::SolverState;

    fn state() -> SolverState {
        let mut config = CaseConfig::template(3, 2, 2);
        config.initial_conditions.initial_velocity = [0.5, 0.0, 0.0];
        config.initial_conditions.initial_pressure = 2.0;
        SolverState::new(&config).unwrap()
    }

    #[test]
    fn test_stem_format() {
        assert_eq!(snapshot_stem(0), "snapshot_0000");
        assert_eq!(snapshot_stem(42), "snapshot_0042");
        assert_eq!(snapshot_stem(12345), "snapshot_12345");
    }

    #[test]
    fn test_encode_layout() {
        let state = state();
        let (meta, bytes) = encode_snapshot(&Snapshot::of(&state)).unwrap();
        assert_eq!(&bytes[..8], SNAPSHOT_MAGIC);
        assert_eq!(meta.fields.len(), 4);
        let u = meta.field("U").unwrap();
        assert_eq!(u.shape, [4, 2, 2]);
        assert_eq!(u.offset, 12);
        assert_eq!(meta.total_len(), 12 + 16 + 18 + 18);
        assert_eq!(meta.phase, "INIT");

        let data = decode_snapshot_data(Path::new("mem"), &bytes).unwrap();
        assert_eq!(data[0], 2.0);
        assert_eq!(data[u.offset], 0.5);
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let err = decode_snapshot_data(Path::new("x.bin"), b"NOTASNAP").unwrap_err();
        assert!(matches!(err, IoError::Format { .. }));
    }
}
