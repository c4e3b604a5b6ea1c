use std::collections::HashMap;

use itertools::Itertools;

use crate::{Band, Instrument, UserId};

/// ユーザーごとの出演回数
#[derive(Debug, Default, Clone)]
pub struct PlayCounts {
    table: HashMap<UserId, usize>,
}

impl PlayCounts {
    /// 一度も出演していなければ 0
    pub fn get(&self, id: UserId) -> usize {
        self.table.get(&id).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &usize)> {
        self.table.iter()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// 順序に依存しない 2 人組のキー
#[derive(Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
pub struct PairKey {
    low: UserId,
    high: UserId,
}

impl PairKey {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn ids(&self) -> (UserId, UserId) {
        (self.low, self.high)
    }
}

/// 同じバンドで共演した回数
#[derive(Debug, Default, Clone)]
pub struct PairHistory {
    table: HashMap<PairKey, usize>,
}

impl PairHistory {
    pub fn get(&self, a: UserId, b: UserId) -> usize {
        self.table.get(&PairKey::new(a, b)).copied().unwrap_or(0)
    }

    /// 候補者とメンバー全員との共演回数の合計
    /// 小さいほど今の編成とは組んだことがない
    pub fn score_against<T>(&self, candidate: UserId, members: T) -> usize
    where
        T: IntoIterator<Item = UserId>,
    {
        members
            .into_iter()
            .map(|member| self.get(candidate, member))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

pub fn compute_play_counts<'a, T>(bands: T) -> PlayCounts
where
    T: IntoIterator<Item = &'a Band>,
{
    let mut table: HashMap<UserId, usize> = HashMap::default();
    for band in bands {
        for member in &band.members {
            *table.entry(member.user_id).or_insert(0) += 1;
        }
    }

    PlayCounts { table }
}

pub fn compute_pair_history<'a, T>(bands: T) -> PairHistory
where
    T: IntoIterator<Item = &'a Band>,
{
    let mut table: HashMap<PairKey, usize> = HashMap::default();
    for band in bands {
        let member_ids = band.members.iter().map(|member| member.user_id);
        for (a, b) in member_ids.tuple_combinations() {
            *table.entry(PairKey::new(a, b)).or_insert(0) += 1;
        }
    }

    PairHistory { table }
}

/// 直近で担当した楽器
/// bands は古い順に並んでいる想定で、末尾から探す
pub fn last_played_role(user_id: UserId, bands: &[&Band]) -> Option<Instrument> {
    bands
        .iter()
        .rev()
        .find_map(|band| band.member(user_id).map(|member| member.role))
}
