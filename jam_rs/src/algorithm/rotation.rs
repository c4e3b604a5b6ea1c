use crate::{Instrument, InstrumentType, User};

use super::IRandom;

/// 次に担当させる楽器を決めます。
///
/// 編成中のバンドで埋まっていない楽器のうち、前回担当した楽器の「次」の楽器を優先します。
/// 複数の楽器ができる人が毎回同じ楽器にならないようにするためのローテーションです。
/// 前回の担当がなければ空いている楽器からランダムに選びます。
pub fn next_role<R>(
    user: &User,
    occupied: InstrumentType,
    last_role: Option<Instrument>,
    random: &mut R,
) -> Option<Instrument>
where
    R: IRandom + ?Sized,
{
    let valid_roles: Vec<Instrument> = user
        .instruments
        .iter()
        .copied()
        .filter(|instrument| !occupied.contains(instrument.flag()))
        .collect();

    // どの枠にも入れない
    if valid_roles.is_empty() {
        return None;
    }

    if valid_roles.len() == 1 {
        return Some(valid_roles[0]);
    }

    let Some(last_role) = last_role else {
        let index = random.next_index(valid_roles.len());
        return Some(valid_roles[index]);
    };

    // 例: [A, B, C] で前回 A なら B, C, A の順に試す
    // 前回の楽器がもう登録されていなければ登録順のまま
    let instruments = &user.instruments;
    let start = instruments
        .iter()
        .position(|instrument| *instrument == last_role)
        .map(|index| index + 1)
        .unwrap_or(0);
    let best = instruments[start..]
        .iter()
        .chain(instruments[..start].iter())
        .find(|instrument| !occupied.contains(instrument.flag()));

    // valid_roles が空でない以上ここで見つからないことはない
    Some(best.copied().unwrap_or(valid_roles[0]))
}
