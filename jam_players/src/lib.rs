pub mod clients;
mod member_list;
mod roster;

use std::collections::HashMap;

use jam_rs::{Instrument, User, UserStatus};
pub use member_list::MemberList;
pub use roster::Roster;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("username \"{0}\" is already taken")]
    DuplicateUsername(String),

    #[error("no musician with id {0}")]
    UnknownUser(jam_rs::UserId),

    #[error("failed to read roster csv: {0}")]
    Csv(#[from] csv::Error),
}

/// 名簿 CSV の 1 行
/// 1 人分の情報が name ごとに複数行に分かれている
#[derive(Debug, serde::Deserialize)]
pub struct Record {
    name: String,
    property_name: String,
    value: String,
}

/// 名簿 CSV を読み込みます。並び順は CSV に最初に現れた順
///
/// 解釈できない値は読み飛ばし、楽器がひとつもない人は名簿に載せません。
pub fn deserialize(str: &str) -> Result<Vec<User>, RosterError> {
    let mut rdr = csv::Reader::from_reader(str.as_bytes());
    let mut order = Vec::<String>::new();
    let mut table = HashMap::<String, Draft>::default();
    for record in rdr.deserialize::<Record>() {
        let record = record?;
        let draft = table.entry(record.name.clone()).or_insert_with(|| {
            order.push(record.name.clone());
            Draft::default()
        });

        let value = record.value.trim();
        match &record.property_name as &str {
            "instrument" => match Instrument::from_label(value) {
                Some(instrument) => draft.instruments.push(instrument),
                None => log::warn!("{}: unknown instrument \"{}\"", record.name, value),
            },
            "username" => draft.username = Some(value.to_string()),
            "custom_instrument" => draft.custom_instrument = Some(value.to_string()),
            "status" => match value.to_ascii_uppercase().as_str() {
                "ACTIVE" => draft.status = UserStatus::Active,
                "PAUSED" => draft.status = UserStatus::Paused,
                _ => log::warn!("{}: unknown status \"{}\"", record.name, value),
            },
            property => log::warn!("{}: unknown property \"{}\"", record.name, property),
        }
    }

    let users = order
        .iter()
        .filter_map(|name| {
            let draft = table.remove(name)?;
            if draft.instruments.is_empty() {
                log::warn!("{name}: no instrument, skipped");
                return None;
            }
            Some(draft.build(name))
        })
        .collect();
    Ok(users)
}

// CSV を読んでいる途中の 1 人分
#[derive(Default)]
struct Draft {
    instruments: Vec<Instrument>,
    username: Option<String>,
    custom_instrument: Option<String>,
    status: UserStatus,
}

impl Draft {
    fn build(self, name: &str) -> User {
        let mut user = User::new(name, &self.instruments).with_status(self.status);
        if let Some(username) = &self.username {
            user = user.with_username(username);
        }
        if let Some(label) = &self.custom_instrument {
            user = user.with_custom_instrument(label);
        }
        user
    }
}
