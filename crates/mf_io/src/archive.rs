// crates/mf_io/src/archive.rs

//! 归档容器
//!
//! 运行结束时把全部快照、终态、清单与失败记录打包成一个文件。
//!
//! # 文件格式
//!
//! ```text
//! [魔数: 4 bytes] "MFAR"
//! [版本: u32]
//! [条目数: u32]
//! 每个条目:
//!   [名称长度: u32] [名称: UTF-8]
//!   [数据长度: u64] [CRC32: u32] [数据]
//! ```
//!
//! 所有整数为小端。读取时逐条校验 CRC。

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{IoError, IoResult};

/// 归档魔数
pub const ARCHIVE_MAGIC: &[u8; 4] = b"MFAR";

/// 归档格式版本
pub const ARCHIVE_VERSION: u32 = 1;

/// 归档文件扩展名
pub const ARCHIVE_EXTENSION: &str = "mfar";

// ============================================================
// CRC32
// ============================================================

/// 生成 CRC32 查找表（编译期计算）
const fn generate_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = 0xEDB8_8320 ^ (crc >> 1);
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC32 查找表（IEEE 多项式）
const CRC32_TABLE: [u32; 256] = generate_crc32_table();

/// CRC32 校验和（IEEE）
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = CRC32_TABLE[index] ^ (crc >> 8);
    }
    !crc
}

// ============================================================
// 写入
// ============================================================

/// 归档条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// 条目名
    pub name: String,
    /// 内容
    pub data: Vec<u8>,
}

/// 归档构建器
#[derive(Debug, Default)]
pub struct ArchiveWriter {
    entries: Vec<ArchiveEntry>,
}

impl ArchiveWriter {
    /// 创建空归档
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加内存中的内容；同名条目被替换
    pub fn add_bytes(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(ArchiveEntry { name, data }),
        }
    }

    /// 添加磁盘上的文件，条目名取文件名
    pub fn add_file(&mut self, path: &Path) -> IoResult<()> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| IoError::format(path, "无法取得文件名"))?
            .to_string();
        let data = fs::read(path).map_err(|e| IoError::file(path, e))?;
        self.add_bytes(name, data);
        Ok(())
    }

    /// 条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 写出归档
    pub fn write(&self, path: &Path) -> IoResult<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| IoError::file(parent, e))?;
        }
        let file = File::create(path).map_err(|e| IoError::file(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| IoError::file(path, e))?;

        log::debug!("归档已写出: {} ({} 个条目)", path.display(), self.entries.len());
        Ok(path.to_path_buf())
    }

    fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(ARCHIVE_MAGIC)?;
        w.write_all(&ARCHIVE_VERSION.to_le_bytes())?;
        w.write_all(&(self.entries.len() as u32).to_le_bytes())?;
        for entry in &self.entries {
            let name = entry.name.as_bytes();
            w.write_all(&(name.len() as u32).to_le_bytes())?;
            w.write_all(name)?;
            w.write_all(&(entry.data.len() as u64).to_le_bytes())?;
            w.write_all(&crc32(&entry.data).to_le_bytes())?;
            w.write_all(&entry.data)?;
        }
        Ok(())
    }
}

// ============================================================
// 读取
// ============================================================

/// 已读取并校验的归档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    /// 读取并校验每个条目的 CRC
    pub fn read(path: &Path) -> IoResult<Self> {
        let bytes = fs::read(path).map_err(|e| IoError::file(path, e))?;
        Self::parse(path, &bytes)
    }

    /// 从内存解析
    pub fn parse(path: &Path, bytes: &[u8]) -> IoResult<Self> {
        let mut cursor = Cursor { bytes, pos: 0, path };

        if cursor.take(4)? != ARCHIVE_MAGIC.as_slice() {
            return Err(IoError::format(path, "缺少归档魔数 MFAR"));
        }
        let version = cursor.u32()?;
        if version != ARCHIVE_VERSION {
            return Err(IoError::format(
                path,
                format!("不支持的归档版本 {version}（当前 {ARCHIVE_VERSION}）"),
            ));
        }

        let count = cursor.u32()? as usize;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let name_len = cursor.u32()? as usize;
            let name = std::str::from_utf8(cursor.take(name_len)?)
                .map_err(|_| IoError::format(path, "条目名不是合法 UTF-8"))?
                .to_string();
            let data_len = usize::try_from(cursor.u64()?)
                .map_err(|_| IoError::format(path, "条目长度溢出"))?;
            let expected = cursor.u32()?;
            let data = cursor.take(data_len)?.to_vec();
            let found = crc32(&data);
            if found != expected {
                return Err(IoError::Checksum {
                    entry: name,
                    expected,
                    found,
                });
            }
            entries.push(ArchiveEntry { name, data });
        }
        if cursor.pos != bytes.len() {
            return Err(IoError::format(path, "归档末尾有多余数据"));
        }
        Ok(Self { entries })
    }

    /// 全部条目
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// 条目名
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// 按名称取内容
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    path: &'a Path,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> IoResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| IoError::format(self.path, "归档被截断"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> IoResult<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn u64(&mut self) -> IoResult<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_reference_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.mfar");
        let mut writer = ArchiveWriter::new();
        writer.add_bytes("manifest.json", b"{}".to_vec());
        writer.add_bytes("snapshot_0000.bin", vec![1, 2, 3]);
        writer.add_bytes("manifest.json", b"{\"steps\":1}".to_vec());
        assert_eq!(writer.len(), 2);
        writer.write(&path).unwrap();

        let archive = Archive::read(&path).unwrap();
        assert_eq!(
            archive.names().collect::<Vec<_>>(),
            vec!["manifest.json", "snapshot_0000.bin"]
        );
        assert_eq!(archive.get("manifest.json").unwrap(), b"{\"steps\":1}");
        assert!(archive.get("missing").is_none());
    }

    #[test]
    fn test_rejects_corruption() {
        let mut writer = ArchiveWriter::new();
        writer.add_bytes("a.bin", vec![7; 32]);
        let mut bytes = Vec::new();
        writer.write_to(&mut bytes).unwrap();

        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = Archive::parse(Path::new("mem"), &bytes).unwrap_err();
        assert!(matches!(err, IoError::Checksum { ref entry, .. } if entry == "a.bin"));

        let err = Archive::parse(Path::new("mem"), &bytes[..10]).unwrap_err();
        assert!(matches!(err, IoError::Format { .. }));
    }
}
