//! 持久化基础设施
//!
//! 键值存储抽象：每个键保存一段完整的 JSON 文本，写入总是整体替换。
//! 产品库只依赖 [`KeyValueStore`]，具体后端可以是文件目录或内存。

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 存储错误类型
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),
    #[error("无效的键: {0:?}")]
    InvalidKey(String),
    #[error("存储锁已损坏")]
    Poisoned,
}

/// 键值持久化接口
///
/// 所有方法都使用 `&self`，实现方通过内部可变性保证线程安全。
pub trait KeyValueStore: Send + Sync + Debug {
    /// 读取键对应的值，键不存在时返回 `Ok(None)`
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// 整体写入键对应的值
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

fn check_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\'])
        || key.contains('\0');
    if invalid {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// 基于目录的存储：每个键一个 `<key>.json` 文件
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// 创建文件存储，目录不存在时自动创建
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        check_key(key)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        check_key(key)?;
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));

        // 先写临时文件再重命名，避免留下半截快照
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

/// 内存存储，进程退出即丢失
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        check_key(key)?;
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        check_key(key)?;
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        assert!(store.load("ia_sistem_produtos").unwrap().is_none());
    }

    #[test]
    fn test_file_store_overwrites_whole_value() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested/data")).unwrap();

        store.save("produtos", "[1,2,3]").unwrap();
        store.save("produtos", "[]").unwrap();

        assert_eq!(store.load("produtos").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("nested/data/produtos.json").exists());
        assert!(!dir.path().join("nested/data/.produtos.json.tmp").exists());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.save("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.load(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.load("k").unwrap().is_none());
        store.save("k", "v").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("v"));
    }
}
