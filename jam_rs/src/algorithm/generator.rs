use std::collections::HashSet;

use crate::config::JamConfig;
use crate::error::{CoreRole, GenerateError};
use crate::{Band, Instrument, InstrumentType, User, UserId};

use super::detail::{priority_shuffle, Lineup};
use super::{
    compute_pair_history, compute_play_counts, last_played_role, next_role, BandNamePool,
    IRandom, PairHistory, PlayCounts,
};

/// 出演候補
/// 直前のバンドにいなかった人を先に、直前のバンドにいた人 (クールダウン) を後に探す
struct Candidates<'a> {
    available: Vec<&'a User>,
    cooldown: Vec<&'a User>,
}

impl<'a> Candidates<'a> {
    fn find<F>(&self, predicate: F) -> Option<&'a User>
    where
        F: Fn(&User) -> bool,
    {
        self.available
            .iter()
            .chain(self.cooldown.iter())
            .find(|user| predicate(user))
            .copied()
    }
}

/// 次に演奏するバンドを自動で組みます。
#[derive(Debug, Clone)]
pub struct BandGenerator {
    min_band_size: usize,
    max_band_size: usize,
    default_duration_minutes: u32,
    name_pool: BandNamePool,
}

impl Default for BandGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl BandGenerator {
    /// バンドを組むのに必要な最低人数
    pub const MINIMUM_ACTIVE_USERS: usize = 3;

    pub fn new() -> Self {
        Self {
            min_band_size: 3,
            max_band_size: 6,
            default_duration_minutes: Band::DEFAULT_DURATION_MINUTES,
            name_pool: BandNamePool::default(),
        }
    }

    pub fn from_config(config: &JamConfig) -> Self {
        let name_pool = match &config.band_names {
            Some(names) => BandNamePool::new(names.clone()),
            None => BandNamePool::default(),
        };

        Self {
            min_band_size: config.min_band_size,
            max_band_size: config.max_band_size,
            default_duration_minutes: config.default_duration_minutes,
            name_pool: name_pool.with_retry_limit(config.name_retry_limit),
        }
    }

    pub fn name_pool(&self) -> &BandNamePool {
        &self.name_pool
    }

    pub fn default_duration_minutes(&self) -> u32 {
        self.default_duration_minutes
    }

    /// バンドを 1 つ生成します。
    ///
    /// queue は出演待ちのバンド、history は演奏済みのバンドで、どちらも古い順です。
    /// fixed_size が 0 なら人数はランダムに決めます。
    pub fn generate<R>(
        &self,
        users: &[User],
        queue: &[Band],
        history: &[Band],
        fixed_size: usize,
        random: &mut R,
    ) -> Result<Band, GenerateError>
    where
        R: IRandom + ?Sized,
    {
        // 休憩中の人は対象外
        let active_users: Vec<&User> = users.iter().filter(|user| user.is_active()).collect();
        if active_users.len() < Self::MINIMUM_ACTIVE_USERS {
            return Err(GenerateError::InsufficientRoster {
                active: active_users.len(),
            });
        }

        // 演奏済みと出演待ちを合わせて公平さの判定に使う
        let all_bands: Vec<&Band> = history.iter().chain(queue.iter()).collect();
        let play_counts = compute_play_counts(all_bands.iter().copied());
        let pair_history = compute_pair_history(all_bands.iter().copied());

        // 直前のバンドのメンバーは連続出演を避けるため後回し
        let cooldown_ids: HashSet<UserId> = all_bands
            .last()
            .map(|band| band.member_ids().collect())
            .unwrap_or_default();

        let (available, cooldown): (Vec<&User>, Vec<&User>) = active_users
            .into_iter()
            .partition(|user| !cooldown_ids.contains(&user.id));
        let candidates = Candidates {
            available: priority_shuffle(available, &play_counts, random),
            cooldown: priority_shuffle(cooldown, &play_counts, random),
        };
        log::debug!(
            "generating band: {} available, {} in cooldown",
            candidates.available.len(),
            candidates.cooldown.len()
        );

        // ドラム、ベース、コード楽器は必須
        let mut lineup = Lineup::default();
        if !Self::pick_member_for_role(&mut lineup, &candidates, Instrument::Drums) {
            return Err(GenerateError::CoreRoleUnfillable(CoreRole::Drums));
        }
        if !Self::pick_member_for_role(&mut lineup, &candidates, Instrument::Bass) {
            return Err(GenerateError::CoreRoleUnfillable(CoreRole::Bass));
        }
        if !Self::pick_harmonic(&mut lineup, &candidates, &all_bands, random) {
            return Err(GenerateError::CoreRoleUnfillable(CoreRole::Harmonic));
        }

        let target_size = if 0 < fixed_size {
            fixed_size
        } else {
            random.next_in_range(self.min_band_size, self.max_band_size)
        };
        log::debug!("target band size: {target_size}");

        Self::fill_remainder(
            &mut lineup,
            &candidates,
            &all_bands,
            &play_counts,
            &pair_history,
            &cooldown_ids,
            target_size,
            random,
        );

        let used_names: HashSet<String> = all_bands.iter().map(|band| band.name.clone()).collect();
        let name = self.name_pool.unique_name(&used_names, random);
        log::debug!("generated band \"{}\" with {} members", name, lineup.len());

        Ok(Band::new(
            &name,
            lineup.into_members(),
            self.default_duration_minutes,
        ))
    }

    fn pick_member_for_role(
        lineup: &mut Lineup,
        candidates: &Candidates<'_>,
        role: Instrument,
    ) -> bool {
        if !lineup.is_open(role) {
            return false;
        }

        let Some(candidate) =
            candidates.find(|user| !lineup.is_selected(user.id) && user.can_play(role))
        else {
            return false;
        };

        lineup.admit(candidate, role);
        true
    }

    // ギターかキーボードの担当を選ぶ
    fn pick_harmonic<R>(
        lineup: &mut Lineup,
        candidates: &Candidates<'_>,
        all_bands: &[&Band],
        random: &mut R,
    ) -> bool
    where
        R: IRandom + ?Sized,
    {
        let can_guitar = lineup.is_open(Instrument::Guitar);
        let can_keys = lineup.is_open(Instrument::Keys);
        if !can_guitar && !can_keys {
            return false;
        }

        let Some(candidate) = candidates.find(|user| {
            !lineup.is_selected(user.id)
                && ((can_guitar && user.can_play(Instrument::Guitar))
                    || (can_keys && user.can_play(Instrument::Keys)))
        }) else {
            return false;
        };

        let has_guitar = can_guitar && candidate.can_play(Instrument::Guitar);
        let has_keys = can_keys && candidate.can_play(Instrument::Keys);
        let role = if has_guitar && has_keys {
            // 両方できるならローテーションで決める
            // コード楽器以外は埋まっている扱いにして候補を絞る
            let occupied = lineup.occupied() | InstrumentType::all().difference(InstrumentType::HARMONIC);
            let last_role = last_played_role(candidate.id, all_bands);
            next_role(candidate, occupied, last_role, random).unwrap_or(Instrument::Guitar)
        } else if has_guitar {
            Instrument::Guitar
        } else {
            Instrument::Keys
        };

        lineup.admit(candidate, role);
        true
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_remainder<R>(
        lineup: &mut Lineup,
        candidates: &Candidates<'_>,
        all_bands: &[&Band],
        play_counts: &PlayCounts,
        pair_history: &PairHistory,
        cooldown_ids: &HashSet<UserId>,
        target_size: usize,
        random: &mut R,
    ) where
        R: IRandom + ?Sized,
    {
        let mut pool: Vec<&User> = candidates
            .available
            .iter()
            .chain(candidates.cooldown.iter())
            .filter(|user| !lineup.is_selected(user.id))
            .copied()
            .collect();

        // クールダウン中かどうか、出演回数、今の編成との共演回数の順に優先する
        // 安定ソートなので同点の間はシャッフルした順が残る
        let member_ids: Vec<UserId> = lineup.member_ids().collect();
        pool.sort_by_cached_key(|user| {
            (
                cooldown_ids.contains(&user.id),
                play_counts.get(user.id),
                pair_history.score_against(user.id, member_ids.iter().copied()),
            )
        });

        for candidate in pool {
            if target_size <= lineup.len() {
                break;
            }

            let last_role = last_played_role(candidate.id, all_bands);
            if let Some(role) = next_role(candidate, lineup.occupied(), last_role, random) {
                lineup.admit(candidate, role);
            }
        }
    }
}

/// 既定の設定でバンドを 1 つ生成します。
pub fn generate_next_band<R>(
    users: &[User],
    queue: &[Band],
    history: &[Band],
    fixed_size: usize,
    random: &mut R,
) -> Result<Band, GenerateError>
where
    R: IRandom + ?Sized,
{
    BandGenerator::new().generate(users, queue, history, fixed_size, random)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::{generate_next_band, BandGenerator};
    use crate::algorithm::random::testing::FixedRandom;
    use crate::config::JamConfig;
    use crate::error::{CoreRole, GenerateError};
    use crate::{Band, Instrument, Membership, User, UserStatus};

    #[test]
    fn insufficient_roster() {
        let users = vec![
            User::new("a", &[Instrument::Drums]),
            User::new("b", &[Instrument::Bass]),
        ];
        let result = generate_next_band(&users, &[], &[], 0, &mut FixedRandom(0.0));
        assert_eq!(result, Err(GenerateError::InsufficientRoster { active: 2 }));
    }

    // 休憩中の人は数に入らない
    #[test]
    fn paused_users_are_ignored() {
        let users = vec![
            User::new("a", &[Instrument::Drums]),
            User::new("b", &[Instrument::Bass]),
            User::new("c", &[Instrument::Guitar]).with_status(UserStatus::Paused),
            User::new("d", &[Instrument::Voice]),
        ];
        let result = generate_next_band(&users, &[], &[], 0, &mut FixedRandom(0.0));
        assert_eq!(result, Err(GenerateError::CoreRoleUnfillable(CoreRole::Harmonic)));
    }

    #[test]
    fn missing_bass() {
        let users = vec![
            User::new("a", &[Instrument::Drums]),
            User::new("b", &[Instrument::Guitar]),
            User::new("c", &[Instrument::Voice]),
        ];
        let result = generate_next_band(&users, &[], &[], 0, &mut FixedRandom(0.0));
        assert_eq!(result, Err(GenerateError::CoreRoleUnfillable(CoreRole::Bass)));
    }

    // ドラムとベースしかできない人はひとりで両方は担当できない
    #[test]
    fn one_person_cannot_fill_two_core_roles() {
        let users = vec![
            User::new("a", &[Instrument::Drums, Instrument::Bass]),
            User::new("b", &[Instrument::Guitar]),
            User::new("c", &[Instrument::Voice]),
        ];
        let result = generate_next_band(&users, &[], &[], 0, &mut FixedRandom(0.0));
        assert_eq!(result, Err(GenerateError::CoreRoleUnfillable(CoreRole::Bass)));
    }

    #[test]
    fn simple() {
        let drums = User::new("a", &[Instrument::Drums]);
        let bass = User::new("b", &[Instrument::Bass]);
        let guitar = User::new("c", &[Instrument::Guitar]);
        let voice = User::new("d", &[Instrument::Voice]);
        let users = vec![drums.clone(), bass.clone(), guitar.clone(), voice.clone()];

        // 0.99 なら目標人数は 6 人になる
        let band = generate_next_band(&users, &[], &[], 0, &mut FixedRandom(0.99)).unwrap();
        assert_eq!(band.members.len(), 4);
        assert_eq!(band.member(drums.id).map(|x| x.role), Some(Instrument::Drums));
        assert_eq!(band.member(bass.id).map(|x| x.role), Some(Instrument::Bass));
        assert_eq!(band.member(guitar.id).map(|x| x.role), Some(Instrument::Guitar));
        assert_eq!(band.member(voice.id).map(|x| x.role), Some(Instrument::Voice));
        assert_eq!(band.duration_minutes, 6);
        assert!(!band.is_manual);
    }

    // ギターもキーボードもできる人は前回と違うほうを担当する
    #[test]
    fn harmonic_rotation() {
        let drums = User::new("a", &[Instrument::Drums]);
        let bass = User::new("b", &[Instrument::Bass]);
        let multi = User::new("c", &[Instrument::Voice, Instrument::Guitar, Instrument::Keys]);
        let users = vec![drums.clone(), bass.clone(), multi.clone()];

        let history = vec![Band::new(
            "past",
            vec![Membership::new(&multi, Instrument::Guitar)],
            6,
        )];
        // 直前のバンドにいてもコード楽器が他にいなければ選ばれる
        let band = generate_next_band(&users, &[], &history, 3, &mut FixedRandom(0.0)).unwrap();
        assert_eq!(band.member(multi.id).map(|x| x.role), Some(Instrument::Keys));
    }

    // 出演回数が同じなら、いまの編成との共演が少ない人を選ぶ
    #[test]
    fn pair_history_breaks_ties() {
        let drums = User::new("drums", &[Instrument::Drums]);
        let bass = User::new("bass", &[Instrument::Bass]);
        let guitar = User::new("guitar", &[Instrument::Guitar]);
        let voice1 = User::new("voice1", &[Instrument::Voice]);
        let voice2 = User::new("voice2", &[Instrument::Voice]);
        let guest = User::new("guest", &[Instrument::Other]);
        let users = vec![
            drums.clone(),
            bass.clone(),
            guitar.clone(),
            voice1.clone(),
            voice2.clone(),
        ];

        // voice1 と voice2 はどちらも 1 回ずつ出演済み。voice1 だけ drums と共演している
        // 最後のバンドはゲストだけなので、誰もクールダウンに入らない
        let history = vec![
            Band::new(
                "first",
                vec![
                    Membership::new(&voice1, Instrument::Voice),
                    Membership::new(&drums, Instrument::Drums),
                ],
                6,
            ),
            Band::new(
                "second",
                vec![
                    Membership::new(&voice2, Instrument::Voice),
                    Membership::new(&guest, Instrument::Other),
                ],
                6,
            ),
            Band::new("third", vec![Membership::new(&guest, Instrument::Other)], 6),
        ];

        let band = generate_next_band(&users, &[], &history, 4, &mut FixedRandom(0.0)).unwrap();
        assert_eq!(band.members.len(), 4);
        assert!(band.contains(drums.id));
        assert_eq!(band.member(voice2.id).map(|x| x.role), Some(Instrument::Voice));
        assert!(!band.contains(voice1.id));
    }

    // コア以外の枠でも前回と違う楽器を担当する
    #[test]
    fn remainder_rotates_roles() {
        let drums = User::new("drums", &[Instrument::Drums]);
        let bass = User::new("bass", &[Instrument::Bass]);
        let guitar = User::new("guitar", &[Instrument::Guitar]);
        let singer = User::new("singer", &[Instrument::Voice, Instrument::Other]);
        let guest = User::new("guest", &[Instrument::Other]);
        let users = vec![drums.clone(), bass.clone(), guitar.clone(), singer.clone()];

        let history = vec![
            Band::new("first", vec![Membership::new(&singer, Instrument::Voice)], 6),
            Band::new("second", vec![Membership::new(&guest, Instrument::Other)], 6),
        ];

        let band = generate_next_band(&users, &[], &history, 4, &mut FixedRandom(0.0)).unwrap();
        assert_eq!(band.member(singer.id).map(|x| x.role), Some(Instrument::Other));

        // 前回がその他なら次はボーカル
        let history = vec![
            Band::new("first", vec![Membership::new(&singer, Instrument::Other)], 6),
            Band::new("second", vec![Membership::new(&guest, Instrument::Other)], 6),
        ];
        let band = generate_next_band(&users, &[], &history, 4, &mut FixedRandom(0.0)).unwrap();
        assert_eq!(band.member(singer.id).map(|x| x.role), Some(Instrument::Voice));
    }

    #[test]
    fn fixed_size() {
        let mut users = vec![
            User::new("drums", &[Instrument::Drums]),
            User::new("bass", &[Instrument::Bass]),
            User::new("guitar", &[Instrument::Guitar]),
        ];
        for index in 0..6 {
            users.push(User::new(&format!("voice{index}"), &[Instrument::Voice]));
        }

        let mut random = StdRng::seed_from_u64(5);
        let band = generate_next_band(&users, &[], &[], 5, &mut random).unwrap();
        assert_eq!(band.members.len(), 5);

        // 全員入れても 9 人
        let band = generate_next_band(&users, &[], &[], 20, &mut random).unwrap();
        assert_eq!(band.members.len(), 9);
    }

    #[test]
    fn config_overrides() {
        let users = vec![
            User::new("a", &[Instrument::Drums]),
            User::new("b", &[Instrument::Bass]),
            User::new("c", &[Instrument::Keys]),
        ];
        let config = JamConfig {
            default_duration_minutes: 9,
            band_names: Some(vec!["Only Name".to_string()]),
            ..JamConfig::default()
        };

        let generator = BandGenerator::from_config(&config);
        let band = generator
            .generate(&users, &[], &[], 0, &mut FixedRandom(0.0))
            .unwrap();
        assert_eq!(band.duration_minutes, 9);
        assert_eq!(band.name, "Only Name");
    }
}
