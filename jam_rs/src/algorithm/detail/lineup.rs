use std::collections::HashSet;

use crate::{Instrument, InstrumentType, Membership, User, UserId};

/// 編成中のバンド
#[derive(Debug, Default)]
pub struct Lineup {
    members: Vec<Membership>,

    // 選出済みのユーザー
    selected: HashSet<UserId>,

    // 埋まった担当。ボーカルとその他は何人でも入れるので記録しない
    occupied: InstrumentType,
}

impl Lineup {
    pub fn admit(&mut self, user: &User, role: Instrument) {
        self.members.push(Membership::new(user, role));
        self.selected.insert(user.id);
        if role.is_single_occupancy() {
            self.occupied |= role.flag();
        }
    }

    pub fn is_selected(&self, id: UserId) -> bool {
        self.selected.contains(&id)
    }

    pub fn is_open(&self, role: Instrument) -> bool {
        !self.occupied.contains(role.flag())
    }

    pub fn occupied(&self) -> InstrumentType {
        self.occupied
    }

    pub fn member_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.members.iter().map(|member| member.user_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn into_members(self) -> Vec<Membership> {
        self.members
    }
}

#[cfg(test)]
mod tests {
    use super::Lineup;
    use crate::{Instrument, InstrumentType, User};

    #[test]
    fn voice_never_blocks() {
        let a = User::new("a", &[Instrument::Voice]);
        let b = User::new("b", &[Instrument::Voice]);
        let c = User::new("c", &[Instrument::Drums]);

        let mut lineup = Lineup::default();
        lineup.admit(&a, Instrument::Voice);
        lineup.admit(&b, Instrument::Voice);
        lineup.admit(&c, Instrument::Drums);

        assert_eq!(lineup.len(), 3);
        assert!(lineup.is_open(Instrument::Voice));
        assert!(!lineup.is_open(Instrument::Drums));
        assert_eq!(lineup.occupied(), InstrumentType::DRUMS);
        assert!(lineup.is_selected(a.id));
    }
}
