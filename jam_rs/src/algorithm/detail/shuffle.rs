use std::collections::BTreeMap;

use crate::algorithm::{IRandom, PlayCounts};
use crate::User;

/// Fisher–Yates で並びをランダムにします。
pub fn shuffle<T, R>(items: &mut [T], random: &mut R)
where
    R: IRandom + ?Sized,
{
    // 末尾から順に、未確定の範囲の要素と入れ替えていく
    for current in (1..items.len()).rev() {
        let target = random.next_index(current + 1);
        items.swap(current, target);
    }
}

/// 出演回数が少ない人ほど前に来るように並べます。
/// 同じ出演回数の中ではランダムに並べます。
pub fn priority_shuffle<'a, R>(
    users: Vec<&'a User>,
    play_counts: &PlayCounts,
    random: &mut R,
) -> Vec<&'a User>
where
    R: IRandom + ?Sized,
{
    // BTreeMap なので出演回数の昇順に取り出せる
    let mut groups: BTreeMap<usize, Vec<&'a User>> = BTreeMap::default();
    for user in users {
        groups
            .entry(play_counts.get(user.id))
            .or_default()
            .push(user);
    }

    let mut result = Vec::default();
    for (_count, mut group) in groups {
        shuffle(&mut group, random);
        result.extend(group);
    }
    result
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::{priority_shuffle, shuffle};
    use crate::algorithm::compute_play_counts;
    use crate::{Band, Instrument, Membership, User};

    #[test]
    fn shuffle_keeps_elements() {
        let mut random = StdRng::seed_from_u64(1);
        let mut data: Vec<i32> = (0..10).collect();
        shuffle(&mut data, &mut random);

        let mut sorted = data.clone();
        sorted.sort();
        assert_eq!(sorted, (0..10).collect::<Vec<i32>>());
    }

    #[test]
    fn shuffle_empty() {
        let mut random = StdRng::seed_from_u64(1);
        let mut data: Vec<i32> = Vec::default();
        shuffle(&mut data, &mut random);
        assert!(data.is_empty());
    }

    // 出演回数が少ないグループが必ず先頭に来る
    #[test]
    fn lower_play_count_first() {
        let veteran = User::new("veteran", &[Instrument::Drums]);
        let regular = User::new("regular", &[Instrument::Drums]);
        let newcomers: Vec<User> = (0..5)
            .map(|index| User::new(&format!("new{index}"), &[Instrument::Voice]))
            .collect();

        let bands = vec![
            Band::new("x", vec![Membership::new(&veteran, Instrument::Drums)], 6),
            Band::new("y", vec![Membership::new(&veteran, Instrument::Drums)], 6),
            Band::new("z", vec![Membership::new(&regular, Instrument::Drums)], 6),
        ];
        let play_counts = compute_play_counts(&bands);

        for seed in 0..20 {
            let mut random = StdRng::seed_from_u64(seed);
            let mut users: Vec<&User> = vec![&veteran, &regular];
            users.extend(newcomers.iter());

            let result = priority_shuffle(users, &play_counts, &mut random);
            assert_eq!(result.len(), 7);
            assert!(result[..5].iter().all(|user| play_counts.get(user.id) == 0));
            assert_eq!(result[5].id, regular.id);
            assert_eq!(result[6].id, veteran.id);
        }
    }
}
