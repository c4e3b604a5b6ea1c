use jam_rs::{InstrumentType, User};

/// 楽器で絞り込める名簿の表示用リスト
pub struct MemberList {
    members: Vec<User>,

    instrument_filter: InstrumentType,
}

impl MemberList {
    pub fn new(members: Vec<User>) -> Self {
        Self {
            members,
            instrument_filter: Default::default(),
        }
    }

    /// フィルターのどれかの楽器を演奏できる人。フィルターが空なら全員
    pub fn filtered(&self) -> impl Iterator<Item = &User> {
        let filter = self.instrument_filter;
        self.members
            .iter()
            .filter(move |user| filter.is_empty() || user.instrument_type().intersects(filter))
    }

    pub fn add_filter(&mut self, filter: InstrumentType) {
        self.instrument_filter = self.instrument_filter.union(filter);
    }
}

#[cfg(test)]
mod tests {
    use jam_rs::{Instrument, InstrumentType, User};

    use super::MemberList;

    fn list() -> MemberList {
        MemberList::new(vec![
            User::new("a", &[Instrument::Drums]),
            User::new("b", &[Instrument::Guitar, Instrument::Voice]),
            User::new("c", &[Instrument::Keys]),
        ])
    }

    #[test]
    fn no_filter() {
        assert_eq!(list().filtered().count(), 3);
    }

    #[test]
    fn harmonic_filter() {
        let mut list = list();
        list.add_filter(InstrumentType::HARMONIC);
        let names: Vec<&str> = list.filtered().map(|x| x.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    // フィルターは足し合わせる
    #[test]
    fn filters_accumulate() {
        let mut list = list();
        list.add_filter(InstrumentType::DRUMS);
        assert_eq!(list.filtered().count(), 1);

        list.add_filter(InstrumentType::VOICE);
        let names: Vec<&str> = list.filtered().map(|x| x.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
