use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::PersistenceError;

/// キーごとに JSON を保存する場所
pub trait IStorage {
    /// 保存されていなければ None
    fn load(&self, key: &str) -> Result<Option<Value>, PersistenceError>;

    fn save(&mut self, key: &str, value: &Value) -> Result<(), PersistenceError>;
}

/// メモリー上に保存する。テストや一時的なセッション向け
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    table: HashMap<String, Value>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.table.keys()
    }
}

impl IStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.table.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<(), PersistenceError> {
        self.table.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// ディレクトリーに {key}.json として保存する
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    /// ディレクトリーがなければ作ります。
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self, PersistenceError> {
        fs::create_dir_all(directory.as_ref())?;
        Ok(Self {
            directory: directory.as_ref().to_path_buf(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_of(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }
}

impl IStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        let contents = match fs::read_to_string(self.path_of(key)) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<(), PersistenceError> {
        let contents = serde_json::to_string_pretty(value)?;

        // 書きかけのファイルを読まないように一度別名で書いてから置き換える
        let temporary = self.directory.join(format!("{key}.json.tmp"));
        fs::write(&temporary, contents)?;
        fs::rename(&temporary, self.path_of(key))?;
        Ok(())
    }
}
