/// 演奏中に盛り上げるためのミニゲーム
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Game {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub const GAMES: [Game; 4] = [
    Game {
        id: "game-hand",
        title: "UNA MANO SOLA",
        description: "Everyone plays with one hand only (left or right, your choice).",
    },
    Game {
        id: "game-foot",
        title: "SU UN PIEDE SOLO",
        description: "Play while balancing on one leg. Touch the floor and you sit out for 5 seconds.",
    },
    Game {
        id: "game-swap",
        title: "ROULETTE STRUMENTI",
        description: "Instrument roulette: the musicians swap roles with each other.",
    },
    Game {
        id: "game-harmonic",
        title: "ROULETTE ARMONICA",
        description: "A live chord progression generator to test your ear and transposition.",
    },
];

pub fn find_game(id: &str) -> Option<&'static Game> {
    GAMES.iter().find(|game| game.id == id)
}

#[cfg(test)]
mod tests {
    use super::{find_game, GAMES};

    #[test]
    fn ids_are_unique() {
        for (index, game) in GAMES.iter().enumerate() {
            assert!(GAMES[index + 1..].iter().all(|other| other.id != game.id));
        }
    }

    #[test]
    fn find() {
        assert_eq!(find_game("game-swap").map(|x| x.title), Some("ROULETTE STRUMENTI"));
        assert!(find_game("game-unknown").is_none());
    }
}
