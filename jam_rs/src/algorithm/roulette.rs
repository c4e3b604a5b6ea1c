use crate::{Instrument, Membership};

use super::detail::shuffle;
use super::IRandom;

/// 楽器ルーレット
///
/// メンバーの担当を入れ替えた表示用の編成を返します。
/// ゲームなので演奏できない楽器が回ってくることもあり、元のバンドは変更しません。
pub fn shuffle_roles<R>(members: &[Membership], random: &mut R) -> Vec<Membership>
where
    R: IRandom + ?Sized,
{
    let mut roles: Vec<Instrument> = members.iter().map(|member| member.role).collect();
    shuffle(&mut roles, random);

    members
        .iter()
        .zip(roles)
        .map(|(member, role)| Membership {
            role,
            ..member.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::shuffle_roles;
    use crate::{Instrument, Membership, User};

    #[test]
    fn keeps_members_and_roles() {
        let members = vec![
            Membership::new(&User::new("a", &[Instrument::Drums]), Instrument::Drums),
            Membership::new(&User::new("b", &[Instrument::Bass]), Instrument::Bass),
            Membership::new(&User::new("c", &[Instrument::Keys]), Instrument::Keys),
            Membership::new(&User::new("d", &[Instrument::Voice]), Instrument::Voice),
        ];

        let mut random = StdRng::seed_from_u64(42);
        let shuffled = shuffle_roles(&members, &mut random);

        // 並びとメンバーはそのまま
        let ids: Vec<_> = shuffled.iter().map(|x| x.user_id).collect();
        let expected: Vec<_> = members.iter().map(|x| x.user_id).collect();
        assert_eq!(ids, expected);

        // 担当の集合は変わらない
        let mut roles: Vec<Instrument> = shuffled.iter().map(|x| x.role).collect();
        roles.sort();
        assert_eq!(
            roles,
            vec![
                Instrument::Voice,
                Instrument::Bass,
                Instrument::Drums,
                Instrument::Keys
            ]
        );
    }

    #[test]
    fn empty_band() {
        let mut random = StdRng::seed_from_u64(42);
        assert!(shuffle_roles(&[], &mut random).is_empty());
    }
}
