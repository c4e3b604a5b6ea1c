use std::collections::HashMap;

use itertools::Itertools;

use crate::{Band, Instrument, InstrumentType, UserId};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserStats {
    // 出演回数
    pub appearances: usize,

    // 持ち時間の合計 (分)
    pub minutes_played: u32,

    // 担当したことのある楽器
    pub roles: InstrumentType,
}

/// セッションの集計
#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    users: HashMap<UserId, UserStats>,
    instrument_totals: HashMap<Instrument, usize>,
    band_count: usize,
}

impl SessionStats {
    pub fn from_bands<'a, T>(bands: T) -> Self
    where
        T: IntoIterator<Item = &'a Band>,
    {
        let mut stats = Self::default();
        for band in bands {
            stats.band_count += 1;
            for member in &band.members {
                let user = stats.users.entry(member.user_id).or_default();
                user.appearances += 1;
                user.minutes_played = user.minutes_played.saturating_add(band.duration_minutes);
                user.roles |= member.role.flag();

                *stats.instrument_totals.entry(member.role).or_insert(0) += 1;
            }
        }
        stats
    }

    pub fn user(&self, id: UserId) -> Option<&UserStats> {
        self.users.get(&id)
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }

    /// 出演回数が多い順。同数ならユーザー ID 順
    pub fn top_users(&self, count: usize) -> Vec<(UserId, &UserStats)> {
        self.users
            .iter()
            .map(|(id, stats)| (*id, stats))
            .sorted_by(|(a_id, a), (b_id, b)| {
                b.appearances.cmp(&a.appearances).then(a_id.cmp(b_id))
            })
            .take(count)
            .collect()
    }

    /// 一番長く演奏した人
    pub fn most_minutes(&self) -> Option<UserId> {
        self.users
            .iter()
            .max_by(|(a_id, a), (b_id, b)| {
                a.minutes_played
                    .cmp(&b.minutes_played)
                    .then(b_id.cmp(a_id))
            })
            .map(|(id, _)| *id)
    }

    /// よく演奏された楽器の順
    pub fn instrument_totals(&self) -> Vec<(Instrument, usize)> {
        self.instrument_totals
            .iter()
            .map(|(instrument, count)| (*instrument, *count))
            .sorted_by(|(a_instrument, a), (b_instrument, b)| {
                b.cmp(a).then(a_instrument.cmp(b_instrument))
            })
            .collect()
    }
}
