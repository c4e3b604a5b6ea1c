use jam_rs::{User, UserId, UserStatus};
use serde::{Deserialize, Serialize};

use crate::RosterError;

/// 参加登録したミュージシャンの一覧
/// ハンドル名は大文字小文字を区別せずに重複を許さない
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    users: Vec<User>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存されていた名簿をそのまま使います。
    pub fn from_users(users: Vec<User>) -> Self {
        Self { users }
    }

    pub fn register(&mut self, user: User) -> Result<UserId, RosterError> {
        if self.find_by_username(&user.username).is_some() {
            return Err(RosterError::DuplicateUsername(user.username));
        }

        let id = user.id;
        log::info!("registered {} (@{})", user.name, user.username);
        self.users.push(user);
        Ok(id)
    }

    /// 重複したハンドル名は読み飛ばして、登録できた人数を返します。
    pub fn import<T>(&mut self, users: T) -> usize
    where
        T: IntoIterator<Item = User>,
    {
        users
            .into_iter()
            .filter(|user| match self.register(user.clone()) {
                Ok(_) => true,
                Err(error) => {
                    log::warn!("skipped {}: {}", user.name, error);
                    false
                }
            })
            .count()
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn find_by_username(&self, username: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|user| user.username.eq_ignore_ascii_case(username))
    }

    /// 参加中と休憩中を切り替えます。
    pub fn toggle_status(&mut self, id: UserId) -> Result<UserStatus, RosterError> {
        let user = self.get_mut(id)?;
        user.status = match user.status {
            UserStatus::Active => UserStatus::Paused,
            UserStatus::Paused => UserStatus::Active,
        };
        Ok(user.status)
    }

    pub fn remove(&mut self, id: UserId) -> Result<User, RosterError> {
        let Some(index) = self.users.iter().position(|user| user.id == id) else {
            return Err(RosterError::UnknownUser(id));
        };
        Ok(self.users.remove(index))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn active(&self) -> impl Iterator<Item = &User> {
        self.users.iter().filter(|user| user.is_active())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn get_mut(&mut self, id: UserId) -> Result<&mut User, RosterError> {
        self.users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(RosterError::UnknownUser(id))
    }
}
