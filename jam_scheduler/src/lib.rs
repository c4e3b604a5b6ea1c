use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use jam_players::{MemberList, Roster};
use jam_rs::config::JamConfig;
use jam_rs::persistence::{FileStorage, SessionPersistence, Snapshot};
use jam_rs::session::{Countdown, SessionStore, TickOutcome};
use jam_rs::{Band, Instrument, InstrumentType, User};

/// "name/DRUMS/VOICE" 形式の指定からミュージシャンを作ります。
/// 楽器がひとつも読めない指定は読み飛ばす
pub fn parse_members<T, U>(iterator: T) -> Vec<User>
where
    T: IntoIterator<Item = U>,
    U: AsRef<str>,
{
    iterator
        .into_iter()
        .filter_map(|x| {
            let str: &str = x.as_ref();
            let mut inputs = str.split('/');
            let name = inputs.next()?.trim();
            let instruments: Vec<Instrument> = inputs
                .filter_map(|label| {
                    let instrument = Instrument::from_label(label);
                    if instrument.is_none() {
                        log::warn!("{name}: unknown instrument \"{label}\"");
                    }
                    instrument
                })
                .collect();
            if name.is_empty() || instruments.is_empty() {
                log::warn!("skipped \"{str}\"");
                return None;
            }
            Some(User::new(name, &instruments))
        })
        .collect()
}

/// 表示用の 1 行
pub fn describe_band(band: &Band) -> String {
    let members: Vec<String> = band
        .members
        .iter()
        .map(|member| format!("{} ({})", member.name, member.role_label()))
        .collect();
    format!(
        "{} [{} min] {}",
        band.name,
        band.duration_minutes,
        members.join(", ")
    )
}

/// 名簿の表示用の行。instruments のどれかを演奏できる人だけ並べる
/// instruments が空なら全員
pub fn describe_roster(users: &[User], instruments: &[Instrument]) -> Vec<String> {
    let mut list = MemberList::new(users.to_vec());
    list.add_filter(InstrumentType::from_instruments(instruments));
    list.filtered()
        .map(|user| {
            let instruments: Vec<String> = user.instruments.iter().map(|x| x.to_string()).collect();
            format!(
                "@{} {} [{}] {:?}",
                user.username,
                user.name,
                instruments.join("/"),
                user.status
            )
        })
        .collect()
}

/// 状態ディレクトリーに保存された名簿とセッション
pub struct JamSession {
    config: JamConfig,
    pub roster: Roster,
    pub store: SessionStore,
    persistence: SessionPersistence<FileStorage>,
}

impl JamSession {
    pub fn open<P: AsRef<Path>>(directory: P, config: JamConfig) -> anyhow::Result<Self> {
        let storage = FileStorage::open(directory.as_ref()).with_context(|| {
            format!("failed to open state directory {}", directory.as_ref().display())
        })?;
        let persistence =
            SessionPersistence::new(storage).with_backup_limit(config.backup_history_limit);

        let snapshot = persistence.load_snapshot();
        if persistence.restorable_backup(&snapshot).is_some() {
            log::warn!("the roster is empty but a backup is available, run `restore` to use it");
        }

        Ok(Self::from_snapshot(config, persistence, snapshot))
    }

    fn from_snapshot(
        config: JamConfig,
        persistence: SessionPersistence<FileStorage>,
        snapshot: Snapshot,
    ) -> Self {
        let store = SessionStore::from_config(&config).restore(snapshot.queue, snapshot.history);
        Self {
            config,
            roster: Roster::from_users(snapshot.musicians),
            store,
            persistence,
        }
    }

    pub fn config(&self) -> &JamConfig {
        &self.config
    }

    /// 名簿が空のときだけ最新のバックアップに戻します。
    pub fn restore_backup(&mut self) -> bool {
        let Some(mut backup) = self.persistence.restorable_backup(&self.snapshot()) else {
            return false;
        };

        let timer_seconds = backup.timer_seconds.take();
        self.roster = Roster::from_users(std::mem::take(&mut backup.musicians));
        self.store = SessionStore::from_config(&self.config).restore(
            std::mem::take(&mut backup.queue),
            std::mem::take(&mut backup.history),
        );
        if let Some(seconds) = timer_seconds {
            self.store.set_timer_seconds(seconds);
        }
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.roster.users(), &self.store)
    }

    pub fn save(&mut self) -> bool {
        let snapshot = self.snapshot();
        self.persistence.save_snapshot(&snapshot)
    }

    /// 保存に加えてバックアップも書き込みます。
    pub fn backup(&mut self) -> bool {
        let mut snapshot = self.snapshot();
        let saved = self.persistence.save_snapshot(&snapshot);
        snapshot.timer_seconds = Some(self.store.timer().remaining_seconds());
        saved && self.persistence.backup(&snapshot, Utc::now())
    }

    /// ステージ上のバンドのタイマーを動かし、設定した間隔でバックアップします。
    pub async fn run_countdown(&mut self, period: Duration) -> TickOutcome {
        let snapshot_period = Duration::from_secs(self.config.snapshot_interval_seconds.max(1));
        let Self {
            roster,
            store,
            persistence,
            ..
        } = self;
        run_countdown(store, period, snapshot_period, |store| {
            let mut snapshot = Snapshot::capture(roster.users(), store);
            persistence.save_snapshot(&snapshot);
            snapshot.timer_seconds = Some(store.timer().remaining_seconds());
            persistence.backup(&snapshot, Utc::now());
        })
        .await
    }

    /// "m:ss" か分で書かれた残り時間をタイマーに設定します。
    pub fn set_timer_input(&mut self, input: &str) -> anyhow::Result<u32> {
        let Some(seconds) = Countdown::parse_input(input) else {
            bail!("invalid time \"{input}\", use m:ss or minutes");
        };
        self.store.set_timer_seconds(seconds);
        Ok(seconds)
    }

    /// 出演待ちが多すぎるか
    pub fn is_queue_large(&self) -> bool {
        self.config.large_queue_warning <= self.store.queue().len()
    }
}

/// ステージ上のバンドのタイマーを動かします。
/// 0 になるかタイマーが止まったら戻る。snapshot_period ごとに on_snapshot を呼ぶ
pub async fn run_countdown<F>(
    store: &mut SessionStore,
    period: Duration,
    snapshot_period: Duration,
    mut on_snapshot: F,
) -> TickOutcome
where
    F: FnMut(&SessionStore),
{
    let mut ticker = tokio::time::interval(period);
    let mut snapshot_ticker = tokio::time::interval(snapshot_period);

    // 最初の tick はすぐに完了するので読み捨てる
    ticker.tick().await;
    snapshot_ticker.tick().await;

    if !store.timer().is_running() && !store.start_timer() {
        return TickOutcome::Idle;
    }

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let outcome = store.tick();
                match outcome {
                    TickOutcome::Running { .. } => {}
                    TickOutcome::Idle | TickOutcome::Expired => return outcome,
                }
            }
            _ = snapshot_ticker.tick() => on_snapshot(store),
        }
    }
}
