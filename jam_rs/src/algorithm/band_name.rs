use std::collections::HashSet;

use chrono::Utc;

use super::IRandom;

pub const BAND_NAMES: [&str; 30] = [
    "La Corazzata Pentatonica",
    "O Famo in Do?",
    "Supercazzola in Si Bemolle",
    "Ajeje Bandzorf",
    "Non ci resta che Plettrare",
    "Vieni avanti col Solo",
    "Febbre da Palco",
    "Attila Flagello del Jazz",
    "Totò, Peppino e la Melodia",
    "I Ragazzi della 3ª Corda",
    "A Qualcuno Piace Calante",
    "Frankensuon Junior",
    "The Blues Blathers",
    "Scemo & Più Stonato",
    "Monty Plettro",
    "Full Metal Jazz",
    "Ritorno al Ritornello",
    "Pulp Fiction & Tonic",
    "Forrest Funk",
    "Le Iene Ridens",
    "Aspettando il Bassista",
    "Molto Rumore per Nulla",
    "L'Importanza di essere Accordati",
    "Buona la Prima (Magari)",
    "I Soliti Accordi",
    "Accordi e Disaccordi",
    "Il Malato Immaginario del Rock",
    "Tutto quello che avreste voluto sapere sul Jazz",
    "Rumori Fuori Scena",
    "Birra Gratis",
];

/// バンド名の候補
#[derive(Debug, Clone)]
pub struct BandNamePool {
    names: Vec<String>,
    retry_limit: usize,
}

impl Default for BandNamePool {
    fn default() -> Self {
        Self::new(BAND_NAMES.iter().map(|name| name.to_string()).collect())
    }
}

impl BandNamePool {
    pub const DEFAULT_RETRY_LIMIT: usize = 20;

    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            retry_limit: Self::DEFAULT_RETRY_LIMIT,
        }
    }

    pub fn with_retry_limit(mut self, retry_limit: usize) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// forbidden に含まれない名前を返します。
    ///
    /// 候補が残っていればその中からランダムに選びます。
    /// 候補を使い切っていたら、候補に番号を付けた名前を何度か試し、
    /// それでも重複するなら時刻を付けた名前にします。
    pub fn unique_name<R>(&self, forbidden: &HashSet<String>, random: &mut R) -> String
    where
        R: IRandom + ?Sized,
    {
        let available: Vec<&String> = self
            .names
            .iter()
            .filter(|name| !forbidden.contains(*name))
            .collect();
        if !available.is_empty() {
            let index = random.next_index(available.len());
            return available[index].clone();
        }

        if !self.names.is_empty() {
            for _ in 0..self.retry_limit {
                let base = &self.names[random.next_index(self.names.len())];
                let candidate = format!("{} {}", base, random.next_in_range(2, 101));
                if !forbidden.contains(&candidate) {
                    return candidate;
                }
            }
        }

        log::warn!("band name pool exhausted, falling back to a timestamp name");
        let mut stamp = Utc::now().timestamp_millis();
        loop {
            let candidate = format!("Band {stamp}");
            if !forbidden.contains(&candidate) {
                return candidate;
            }
            stamp += 1;
        }
    }
}

/// 既定の候補から重複しないバンド名を選びます。
pub fn get_unique_band_name<R>(forbidden: &HashSet<String>, random: &mut R) -> String
where
    R: IRandom + ?Sized,
{
    BandNamePool::default().unique_name(forbidden, random)
}
