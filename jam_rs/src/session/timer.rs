use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    // 止まっている
    Idle,

    Running { remaining_seconds: u32 },

    // この tick で 0 になった
    Expired,
}

/// 1 秒単位のカウントダウン
/// 0 になっても止まるだけで、バンドの入れ替えは行わない
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    remaining_seconds: u32,
    is_running: bool,
}

impl Countdown {
    pub fn new(remaining_seconds: u32) -> Self {
        Self {
            remaining_seconds,
            is_running: false,
        }
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_seconds == 0
    }

    /// 残り時間がなければ動かない
    pub fn start(&mut self) -> bool {
        self.is_running = 0 < self.remaining_seconds;
        self.is_running
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    pub fn toggle(&mut self) -> bool {
        if self.is_running {
            self.pause();
            false
        } else {
            self.start()
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running {
            return TickOutcome::Idle;
        }

        if self.remaining_seconds <= 1 {
            self.remaining_seconds = 0;
            self.is_running = false;
            return TickOutcome::Expired;
        }

        self.remaining_seconds -= 1;
        TickOutcome::Running {
            remaining_seconds: self.remaining_seconds,
        }
    }

    /// 残り時間を増減します。0 未満にはならない
    pub fn adjust(&mut self, delta_seconds: i64) {
        let adjusted = (self.remaining_seconds as i64 + delta_seconds).clamp(0, u32::MAX as i64);
        self.remaining_seconds = adjusted as u32;
        if self.remaining_seconds == 0 {
            self.is_running = false;
        }
    }

    pub fn set_seconds(&mut self, seconds: u32) {
        self.remaining_seconds = seconds;
        if seconds == 0 {
            self.is_running = false;
        }
    }

    /// 止めてから分単位で設定し直します。
    /// 秒にして u32 に収まらない分数は上限で止める
    pub fn reset_minutes(&mut self, minutes: u32) {
        self.is_running = false;
        self.remaining_seconds = minutes.saturating_mul(60);
    }

    /// MM:SS 形式
    pub fn format(&self) -> String {
        let minutes = self.remaining_seconds / 60;
        let seconds = self.remaining_seconds % 60;
        format!("{minutes:02}:{seconds:02}")
    }

    /// 手入力された残り時間を解釈します。
    /// "m:ss" なら分と秒、それ以外は分として扱う
    pub fn parse_input(input: &str) -> Option<u32> {
        let input = input.trim();
        if let Some((minutes, seconds)) = input.split_once(':') {
            let minutes: u32 = minutes.trim().parse().ok()?;
            let seconds: u32 = seconds.trim().parse().ok()?;
            return minutes.checked_mul(60)?.checked_add(seconds);
        }

        let minutes: f64 = input.parse().ok()?;
        let seconds = (minutes * 60.0).round();
        if !seconds.is_finite() || seconds < 0.0 || f64::from(u32::MAX) < seconds {
            return None;
        }
        Some(seconds as u32)
    }
}
