use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::IStorage;
use crate::error::PersistenceError;
use crate::session::SessionStore;
use crate::{Band, User};

/// セッションの保存内容
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub musicians: Vec<User>,

    #[serde(default)]
    pub queue: Vec<Band>,

    #[serde(default)]
    pub history: Vec<Band>,

    // バックアップにだけ書き込む
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_seconds: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn capture(musicians: &[User], store: &SessionStore) -> Self {
        Self {
            musicians: musicians.to_vec(),
            queue: store.queue().as_slice().to_vec(),
            history: store.history().to_vec(),
            timer_seconds: None,
            exported_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.musicians.is_empty() && self.queue.is_empty() && self.history.is_empty()
    }

    /// 楽器の重複を除き、演奏できる楽器のないミュージシャンを名簿から外します。
    fn normalize(mut self) -> Self {
        self.musicians.retain_mut(|user| {
            let is_playable = user.normalize_instruments();
            if !is_playable {
                log::warn!("{}: no instrument, dropped from the roster", user.username);
            }
            is_playable
        });
        self
    }
}

/// ストレージへの読み書き
///
/// 読み書きの失敗はログに残すだけで呼び出し側には返しません。
/// 保存に失敗してもセッションは続けられるようにするためです。
pub struct SessionPersistence<S: IStorage> {
    storage: S,
    backup_limit: usize,
}

impl<S: IStorage> SessionPersistence<S> {
    pub const MUSICIANS_KEY: &'static str = "musicians";
    pub const QUEUE_KEY: &'static str = "queue";
    pub const HISTORY_KEY: &'static str = "history";
    pub const BACKUP_LAST_KEY: &'static str = "backup_last";
    pub const BACKUP_HISTORY_KEY: &'static str = "backup_history";

    pub const DEFAULT_BACKUP_LIMIT: usize = 12;

    pub fn new(storage: S) -> Self {
        Self {
            storage,
            backup_limit: Self::DEFAULT_BACKUP_LIMIT,
        }
    }

    pub fn with_backup_limit(mut self, backup_limit: usize) -> Self {
        self.backup_limit = backup_limit;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// 読めなかった項目は空として扱います。
    pub fn load_snapshot(&self) -> Snapshot {
        Snapshot {
            musicians: self.read_or_default(Self::MUSICIANS_KEY),
            queue: self.read_or_default(Self::QUEUE_KEY),
            history: self.read_or_default(Self::HISTORY_KEY),
            timer_seconds: None,
            exported_at: None,
        }
        .normalize()
    }

    /// すべて書き込めたら true
    pub fn save_snapshot(&mut self, snapshot: &Snapshot) -> bool {
        let musicians = self.write(Self::MUSICIANS_KEY, &snapshot.musicians);
        let queue = self.write(Self::QUEUE_KEY, &snapshot.queue);
        let history = self.write(Self::HISTORY_KEY, &snapshot.history);
        musicians && queue && history
    }

    /// 最新のバックアップと、新しい順に backup_limit 件までの世代を書き込みます。
    pub fn backup(&mut self, snapshot: &Snapshot, exported_at: DateTime<Utc>) -> bool {
        let mut snapshot = snapshot.clone();
        snapshot.exported_at = Some(exported_at);

        let mut generations = self.backups();
        generations.insert(0, snapshot.clone());
        generations.truncate(self.backup_limit);

        let last = self.write(Self::BACKUP_LAST_KEY, &snapshot);
        let history = self.write(Self::BACKUP_HISTORY_KEY, &generations);
        if last && history {
            log::info!("backup written ({} generations)", generations.len());
        }
        last && history
    }

    pub fn last_backup(&self) -> Option<Snapshot> {
        self.read(Self::BACKUP_LAST_KEY).map(Snapshot::normalize)
    }

    /// 新しい順
    pub fn backups(&self) -> Vec<Snapshot> {
        let backups: Vec<Snapshot> = self.read_or_default(Self::BACKUP_HISTORY_KEY);
        backups.into_iter().map(Snapshot::normalize).collect()
    }

    /// 起動時に復元を提案するバックアップ
    /// 今の名簿が空で、バックアップには名簿があるときだけ返す
    pub fn restorable_backup(&self, current: &Snapshot) -> Option<Snapshot> {
        if !current.musicians.is_empty() {
            return None;
        }

        self.last_backup()
            .filter(|backup| !backup.musicians.is_empty())
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let result = self.storage.load(key).and_then(|value| match value {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        });

        match result {
            Ok(value) => value,
            Err(error) => {
                log::warn!("failed to load {key}: {error}");
                None
            }
        }
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.read(key).unwrap_or_default()
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
        let result = serde_json::to_value(value)
            .map_err(PersistenceError::from)
            .and_then(|value| self.storage.save(key, &value));

        match result {
            Ok(()) => true,
            Err(error) => {
                log::error!("failed to save {key}: {error}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use super::{SessionPersistence, Snapshot};
    use crate::persistence::{FileStorage, IStorage, MemoryStorage};
    use crate::session::SessionStore;
    use crate::{Band, Instrument, Membership, User};

    fn snapshot() -> Snapshot {
        let alice = User::new("Alice", &[Instrument::Drums]);
        let band = Band::new(
            "I Riff",
            vec![Membership::new(&alice, Instrument::Drums)],
            6,
        );
        let store = SessionStore::new().restore(vec![band], Vec::default());
        Snapshot::capture(&[alice], &store)
    }

    #[test]
    fn empty_storage_loads_empty_snapshot() {
        let persistence = SessionPersistence::new(MemoryStorage::new());
        assert!(persistence.load_snapshot().is_empty());
        assert!(persistence.last_backup().is_none());
    }

    #[test]
    fn save_and_load() {
        let mut persistence = SessionPersistence::new(MemoryStorage::new());
        let snapshot = snapshot();
        assert!(persistence.save_snapshot(&snapshot));
        assert_eq!(persistence.load_snapshot(), snapshot);
    }

    #[test]
    fn stored_json_uses_camel_case() {
        let mut persistence = SessionPersistence::new(MemoryStorage::new());
        persistence.save_snapshot(&snapshot());

        let queue = persistence.storage().load("queue").unwrap().unwrap();
        let member = &queue[0]["members"][0];
        assert_eq!(member["assignedRole"], json!("DRUMS"));
        assert!(member.get("userId").is_some());
        assert_eq!(queue[0]["durationMinutes"], json!(6));
    }

    #[test]
    fn broken_entry_falls_back_to_default() {
        let mut storage = MemoryStorage::new();
        storage.save("queue", &json!({"unexpected": true})).unwrap();
        storage.save("musicians", &json!([])).unwrap();

        let persistence = SessionPersistence::new(storage);
        let loaded = persistence.load_snapshot();
        assert!(loaded.queue.is_empty());
    }

    #[test]
    fn loaded_musicians_are_normalized() {
        let mut storage = MemoryStorage::new();
        storage
            .save(
                "musicians",
                &json!([
                    {
                        "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                        "name": "Bowser",
                        "username": "bowser",
                        "instruments": ["BASS", "BASSO", "VOICE"]
                    },
                    {
                        "id": "0f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f9",
                        "name": "Boo",
                        "username": "boo",
                        "instruments": []
                    }
                ]),
            )
            .unwrap();

        let persistence = SessionPersistence::new(storage);
        let loaded = persistence.load_snapshot();
        assert_eq!(loaded.musicians.len(), 1);
        assert_eq!(loaded.musicians[0].username, "bowser");
        assert_eq!(
            loaded.musicians[0].instruments,
            vec![Instrument::Bass, Instrument::Voice]
        );
    }

    // 演奏できる人がいないバックアップは復元の対象にならない
    #[test]
    fn backup_with_unplayable_musicians_is_not_offered() {
        let mut storage = MemoryStorage::new();
        storage
            .save(
                "backup_last",
                &json!({
                    "musicians": [{
                        "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
                        "name": "Boo",
                        "username": "boo",
                        "instruments": []
                    }]
                }),
            )
            .unwrap();

        let persistence = SessionPersistence::new(storage);
        assert!(persistence.last_backup().unwrap().musicians.is_empty());
        assert!(persistence.restorable_backup(&Snapshot::default()).is_none());
    }

    #[test]
    fn backup_keeps_limited_generations() {
        let mut persistence = SessionPersistence::new(MemoryStorage::new()).with_backup_limit(3);
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 21, 0, 0).unwrap();
        for index in 0..5 {
            persistence.backup(&snapshot(), start + Duration::minutes(5 * index));
        }

        let backups = persistence.backups();
        assert_eq!(backups.len(), 3);
        // 新しい順
        assert_eq!(backups[0].exported_at, Some(start + Duration::minutes(20)));
        assert_eq!(
            persistence.last_backup().and_then(|x| x.exported_at),
            Some(start + Duration::minutes(20))
        );
    }

    #[test]
    fn restorable_backup_only_when_empty() {
        let mut persistence = SessionPersistence::new(MemoryStorage::new());
        assert!(persistence.restorable_backup(&Snapshot::default()).is_none());

        persistence.backup(&snapshot(), Utc::now());
        assert!(persistence.restorable_backup(&Snapshot::default()).is_some());
        assert!(persistence.restorable_backup(&snapshot()).is_none());
    }

    #[test]
    fn backup_without_musicians_is_not_offered() {
        let mut persistence = SessionPersistence::new(MemoryStorage::new());
        persistence.backup(&Snapshot::default(), Utc::now());
        assert!(persistence.restorable_backup(&Snapshot::default()).is_none());
    }

    #[test]
    fn file_round_trip() {
        let directory = tempfile::tempdir().unwrap();
        let snapshot = snapshot();
        {
            let storage = FileStorage::open(directory.path()).unwrap();
            let mut persistence = SessionPersistence::new(storage);
            persistence.save_snapshot(&snapshot);
        }

        let storage = FileStorage::open(directory.path()).unwrap();
        let persistence = SessionPersistence::new(storage);
        assert_eq!(persistence.load_snapshot(), snapshot);
    }
}
