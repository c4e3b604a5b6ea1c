use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod algorithm;
pub mod config;
pub mod error;
pub mod game;
pub mod persistence;
pub mod session;

bitflags::bitflags! {
    /// 楽器の集合
    /// 編成中のバンドで埋まっている担当や、名簿のフィルターに使います
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct InstrumentType: u32 {
        const VOICE  = 0b000001;
        const GUITAR = 0b000010;
        const BASS   = 0b000100;
        const DRUMS  = 0b001000;
        const KEYS   = 0b010000;
        const OTHER  = 0b100000;

        // ギターかキーボードのどちらかがいればコード楽器は成立する
        const HARMONIC = Self::GUITAR.bits() | Self::KEYS.bits();
    }
}

impl InstrumentType {
    pub fn from_instruments<'a, T>(instruments: T) -> Self
    where
        T: IntoIterator<Item = &'a Instrument>,
    {
        instruments
            .into_iter()
            .fold(Self::empty(), |flags, instrument| flags | instrument.flag())
    }
}

/// 担当楽器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instrument {
    // 古いスナップショットはイタリア語の値で保存されている
    #[serde(alias = "VOCE")]
    Voice,
    #[serde(alias = "CHITARRA")]
    Guitar,
    #[serde(alias = "BASSO")]
    Bass,
    #[serde(alias = "BATTERIA")]
    Drums,
    #[serde(alias = "TASTIERA")]
    Keys,
    #[serde(alias = "ALTRO")]
    Other,
}

impl Instrument {
    pub const ALL: [Instrument; 6] = [
        Instrument::Voice,
        Instrument::Guitar,
        Instrument::Bass,
        Instrument::Drums,
        Instrument::Keys,
        Instrument::Other,
    ];

    pub fn flag(self) -> InstrumentType {
        match self {
            Instrument::Voice => InstrumentType::VOICE,
            Instrument::Guitar => InstrumentType::GUITAR,
            Instrument::Bass => InstrumentType::BASS,
            Instrument::Drums => InstrumentType::DRUMS,
            Instrument::Keys => InstrumentType::KEYS,
            Instrument::Other => InstrumentType::OTHER,
        }
    }

    /// ひとつのバンドにひとりしか入れない担当か
    /// ボーカルとその他は何人いてもよい
    pub fn is_single_occupancy(self) -> bool {
        !matches!(self, Instrument::Voice | Instrument::Other)
    }

    /// 名簿や CLI の文字列から楽器を解釈します。
    /// 英語表記、イタリア語表記、名簿で使われる別名を受け付けます。
    pub fn from_label(label: &str) -> Option<Self> {
        let instrument = match label.trim().to_ascii_uppercase().as_str() {
            "VOICE" | "VOCAL" | "VOCE" => Instrument::Voice,
            "GUITAR" | "ELECTRICGUITAR" | "ACOUSTICGUITAR" | "CHITARRA" => Instrument::Guitar,
            "BASS" | "ELECTRICBASS" | "BASSO" => Instrument::Bass,
            "DRUMS" | "BATTERIA" => Instrument::Drums,
            "KEYS" | "KEYBOARD" | "PIANO" | "TASTIERA" => Instrument::Keys,
            "OTHER" | "ALTRO" => Instrument::Other,
            _ => return None,
        };
        Some(instrument)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Instrument::Voice => "VOICE",
            Instrument::Guitar => "GUITAR",
            Instrument::Bass => "BASS",
            Instrument::Drums => "DRUMS",
            Instrument::Keys => "KEYS",
            Instrument::Other => "OTHER",
        };
        f.write_str(label)
    }
}

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandId {
    uuid: Uuid,
}

impl BandId {
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
        }
    }
}

impl Default for BandId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.uuid.fmt(f)
    }
}

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId {
    uuid: Uuid,
}

impl UserId {
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
        }
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.uuid.fmt(f)
    }
}

/// 参加状態
/// 休憩中のユーザーはバンド生成の対象外
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Active,
    Paused,
}

/// 参加登録したミュージシャン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,

    // 表示名
    pub name: String,

    // ハンドル名
    pub username: String,

    // 演奏できる楽器。並び順がローテーションの順番になる
    pub instruments: Vec<Instrument>,

    // その他 (OTHER) の具体的な楽器名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instrument: Option<String>,

    #[serde(default)]
    pub status: UserStatus,
}

impl User {
    pub fn new(name: &str, instruments: &[Instrument]) -> Self {
        Self {
            id: UserId::new(),
            name: name.to_string(),
            username: name.to_lowercase().replace(' ', "_"),
            instruments: unique_instruments(instruments),
            custom_instrument: None,
            status: UserStatus::Active,
        }
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    pub fn with_custom_instrument(mut self, label: &str) -> Self {
        self.custom_instrument = Some(label.to_string());
        self
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn can_play(&self, instrument: Instrument) -> bool {
        self.instruments.contains(&instrument)
    }

    pub fn instrument_type(&self) -> InstrumentType {
        InstrumentType::from_instruments(&self.instruments)
    }

    /// 保存データなど外から読んだ楽器の重複を除きます。
    /// 演奏できる楽器が残らなければ false
    pub fn normalize_instruments(&mut self) -> bool {
        self.instruments = unique_instruments(&self.instruments);
        !self.instruments.is_empty()
    }
}

// 重複は先に出てきたほうを残す
fn unique_instruments(instruments: &[Instrument]) -> Vec<Instrument> {
    let mut unique = Vec::with_capacity(instruments.len());
    for instrument in instruments {
        if !unique.contains(instrument) {
            unique.push(*instrument);
        }
    }
    unique
}

/// バンドへの所属
/// 加入した時点のプロフィールを写し取るので、あとからプロフィールを編集しても過去のバンドは変わらない
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub user_id: UserId,
    pub name: String,
    pub username: String,
    pub instruments: Vec<Instrument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instrument: Option<String>,

    // このバンドでの担当
    #[serde(rename = "assignedRole")]
    pub role: Instrument,
}

impl Membership {
    pub fn new(user: &User, role: Instrument) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            instruments: user.instruments.clone(),
            custom_instrument: user.custom_instrument.clone(),
            role,
        }
    }

    /// 表示用の担当名。その他の場合は登録された楽器名を優先する
    pub fn role_label(&self) -> String {
        match (&self.role, &self.custom_instrument) {
            (Instrument::Other, Some(label)) => label.clone(),
            (role, _) => role.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub id: BandId,
    pub name: String,
    pub members: Vec<Membership>,

    // 手動で組んだバンドか。アルゴリズムには影響しない
    #[serde(default)]
    pub is_manual: bool,

    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,

    // 以下は履歴に移ったときに書き込まれる
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub played_games: Option<Vec<String>>,
}

fn default_duration_minutes() -> u32 {
    Band::DEFAULT_DURATION_MINUTES
}

impl Band {
    pub const DEFAULT_DURATION_MINUTES: u32 = 6;

    pub fn new(name: &str, members: Vec<Membership>, duration_minutes: u32) -> Self {
        Self {
            id: BandId::new(),
            name: name.to_string(),
            members,
            is_manual: false,
            duration_minutes,
            end_time: None,
            played_games: None,
        }
    }

    /// メンバーのいない手動編成用のバンド
    pub fn manual(name: &str, duration_minutes: u32) -> Self {
        Self {
            is_manual: true,
            ..Self::new(name, Vec::default(), duration_minutes)
        }
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.members.iter().any(|member| member.user_id == user_id)
    }

    pub fn member(&self, user_id: UserId) -> Option<&Membership> {
        self.members.iter().find(|member| member.user_id == user_id)
    }

    pub fn member_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.members.iter().map(|member| member.user_id)
    }

    /// 履歴に移すための印をつけます。
    pub fn archive(mut self, end_time: DateTime<Utc>, played_games: Vec<String>) -> Self {
        self.end_time = Some(end_time);
        self.played_games = Some(played_games);
        self
    }
}
