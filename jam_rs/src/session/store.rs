use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::event::FnObserver;
use super::{BandQueue, Countdown, ISessionObserver, SessionEvent, TickOutcome};
use crate::algorithm::{shuffle_roles, BandGenerator, IRandom};
use crate::config::JamConfig;
use crate::error::{GenerateError, SessionError};
use crate::{Band, BandId, Instrument, Membership, User, UserId};

/// ステージの状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState<'a> {
    // 出演待ちがいない
    Idle,

    OnStage(&'a Band),
}

/// セッションの状態をまとめて持つ
/// 書き込みはこのオブジェクトからしか行わない
pub struct SessionStore {
    queue: BandQueue,
    history: Vec<Band>,
    timer: Countdown,

    // ステージ上のバンドが演奏中に遊んだゲーム
    current_games: Vec<String>,

    generator: BandGenerator,
    observers: Vec<Box<dyn ISessionObserver>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_generator(BandGenerator::new())
    }

    pub fn with_generator(generator: BandGenerator) -> Self {
        Self {
            queue: BandQueue::default(),
            history: Vec::default(),
            timer: Countdown::default(),
            current_games: Vec::default(),
            generator,
            observers: Vec::default(),
        }
    }

    pub fn from_config(config: &JamConfig) -> Self {
        Self::with_generator(BandGenerator::from_config(config))
    }

    /// 保存しておいた出演待ちと履歴から復元します。
    /// タイマーは先頭のバンドの持ち時間で止まった状態になる
    pub fn restore(mut self, queue: Vec<Band>, history: Vec<Band>) -> Self {
        self.queue = BandQueue::new(queue);
        self.history = history;
        self.current_games.clear();
        self.reset_timer();
        log::info!(
            "session restored: {} queued, {} played",
            self.queue.len(),
            self.history.len()
        );
        self
    }

    pub fn queue(&self) -> &BandQueue {
        &self.queue
    }

    pub fn history(&self) -> &[Band] {
        &self.history
    }

    pub fn timer(&self) -> &Countdown {
        &self.timer
    }

    pub fn current_games(&self) -> &[String] {
        &self.current_games
    }

    pub fn generator(&self) -> &BandGenerator {
        &self.generator
    }

    pub fn state(&self) -> SessionState<'_> {
        match self.queue.head() {
            Some(band) => SessionState::OnStage(band),
            None => SessionState::Idle,
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn ISessionObserver>) {
        self.observers.push(observer);
    }

    pub fn subscribe_fn<TFunc>(&mut self, func: TFunc)
    where
        TFunc: FnMut(&SessionEvent) + 'static,
    {
        self.subscribe(Box::new(FnObserver { func }));
    }

    /// 出演待ちと履歴で使われているバンド名
    pub fn band_names(&self) -> HashSet<String> {
        self.queue
            .iter()
            .chain(self.history.iter())
            .map(|band| band.name.clone())
            .collect()
    }

    pub fn push_band(&mut self, band: Band) -> BandId {
        let id = band.id;
        let was_empty = self.queue.is_empty();
        log::info!("band queued: {} ({} members)", band.name, band.members.len());
        self.queue.push(band);
        self.notify(SessionEvent::BandQueued(id));

        // 空のキューに最初のバンドが入ったらタイマーを用意する
        if was_empty && !self.timer.is_running() && self.timer.is_expired() {
            self.reset_timer();
        }
        id
    }

    pub fn generate_band<R>(
        &mut self,
        users: &[User],
        fixed_size: usize,
        random: &mut R,
    ) -> Result<BandId, GenerateError>
    where
        R: IRandom + ?Sized,
    {
        let band = self.generator.generate(
            users,
            self.queue.as_slice(),
            &self.history,
            fixed_size,
            random,
        )?;
        Ok(self.push_band(band))
    }

    /// メンバーのいない手動編成のバンドを追加します。
    pub fn add_manual_band<R>(&mut self, random: &mut R) -> BandId
    where
        R: IRandom + ?Sized,
    {
        let name = self
            .generator
            .name_pool()
            .unique_name(&self.band_names(), random);
        let band = Band::manual(&name, self.generator.default_duration_minutes());
        self.push_band(band)
    }

    /// ステージ上のバンドを履歴に移して次のバンドを上げます。
    pub fn advance(&mut self, played_games: Vec<String>) -> Option<BandId> {
        self.advance_at(Utc::now(), played_games)
    }

    pub fn advance_at(
        &mut self,
        end_time: DateTime<Utc>,
        played_games: Vec<String>,
    ) -> Option<BandId> {
        let finished = self.queue.advance()?;
        let archived = finished.id;
        log::info!("band finished: {}", finished.name);
        self.history.push(finished.archive(end_time, played_games));

        self.current_games.clear();
        self.reset_timer();

        let on_stage = self.queue.head_id();
        if let Some(band) = self.queue.head() {
            log::info!("band on stage: {}", band.name);
        }
        self.notify(SessionEvent::BandAdvanced { archived, on_stage });
        Some(archived)
    }

    /// ステージ上のバンドが遊んだゲームを記録します。同じゲームは 1 回だけ
    pub fn record_game(&mut self, title: &str) -> bool {
        if self.queue.is_empty() || self.current_games.iter().any(|x| x == title) {
            return false;
        }

        self.current_games.push(title.to_string());
        self.notify(SessionEvent::GameRecorded(title.to_string()));
        true
    }

    /// 記録したゲームを添えてステージ上のバンドを終えます。
    pub fn complete_current_band(&mut self) -> Option<BandId> {
        let games = std::mem::take(&mut self.current_games);
        self.advance(games)
    }

    /// メンバーを追加します。すでに所属していたら何もしない
    pub fn add_member(
        &mut self,
        band_id: BandId,
        user: &User,
        role: Instrument,
    ) -> Result<bool, SessionError> {
        if !user.can_play(role) {
            return Err(SessionError::RoleNotPlayable {
                user: user.id,
                role,
            });
        }

        let band = self.band_mut(band_id)?;
        if band.contains(user.id) {
            return Ok(false);
        }

        band.members.push(Membership::new(user, role));
        log::info!("{} joined {} as {}", user.name, band.name, role);
        self.notify(SessionEvent::MemberAdded {
            band: band_id,
            user: user.id,
        });
        Ok(true)
    }

    pub fn remove_member(&mut self, band_id: BandId, user_id: UserId) -> Result<bool, SessionError> {
        let band = self.band_mut(band_id)?;
        let Some(index) = band.members.iter().position(|x| x.user_id == user_id) else {
            return Ok(false);
        };

        band.members.remove(index);
        self.notify(SessionEvent::MemberRemoved {
            band: band_id,
            user: user_id,
        });
        Ok(true)
    }

    /// 空白だけの名前は無視します。
    pub fn rename(&mut self, band_id: BandId, name: &str) -> Result<bool, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }

        self.band_mut(band_id)?.name = name.to_string();
        self.notify(SessionEvent::BandRenamed {
            band: band_id,
            name: name.to_string(),
        });
        Ok(true)
    }

    pub fn shuffle_name<R>(&mut self, band_id: BandId, random: &mut R) -> Result<String, SessionError>
    where
        R: IRandom + ?Sized,
    {
        if self.queue.get(band_id).is_none() {
            return Err(SessionError::BandNotFound(band_id));
        }

        let name = self
            .generator
            .name_pool()
            .unique_name(&self.band_names(), random);
        self.rename(band_id, &name)?;
        Ok(name)
    }

    pub fn set_duration(&mut self, band_id: BandId, minutes: u32) -> Result<(), SessionError> {
        self.band_mut(band_id)?.duration_minutes = minutes;
        self.notify(SessionEvent::DurationChanged {
            band: band_id,
            minutes,
        });

        // 演奏前ならステージ上のタイマーにも反映する
        if self.queue.is_head(band_id) && !self.timer.is_running() {
            self.timer.reset_minutes(minutes);
            self.notify_timer();
        }
        Ok(())
    }

    /// 並び替えで先頭が変わり、タイマーが止まっていれば新しい先頭に合わせます。
    pub fn move_band(&mut self, from: usize, to: usize) -> Result<(), SessionError> {
        let head = self.queue.head_id();
        self.queue.move_band(from, to)?;
        self.notify(SessionEvent::QueueReordered);
        self.on_head_maybe_changed(head);
        Ok(())
    }

    pub fn remove_band(&mut self, index: usize) -> Result<Band, SessionError> {
        let head = self.queue.head_id();
        let band = self.queue.remove(index)?;
        log::info!("band removed: {}", band.name);
        self.notify(SessionEvent::BandRemoved(band.id));
        self.on_head_maybe_changed(head);
        Ok(band)
    }

    /// ステージ上のバンドの担当を入れ替えた表示用のメンバー
    /// 保存されているバンドは変わらない
    pub fn shuffle_current_roles<R>(&self, random: &mut R) -> Option<Vec<Membership>>
    where
        R: IRandom + ?Sized,
    {
        let band = self.queue.head()?;
        Some(shuffle_roles(&band.members, random))
    }

    pub fn start_timer(&mut self) -> bool {
        let is_running = self.timer.start();
        self.notify_timer();
        is_running
    }

    pub fn pause_timer(&mut self) {
        self.timer.pause();
        self.notify_timer();
    }

    pub fn toggle_timer(&mut self) -> bool {
        let is_running = self.timer.toggle();
        self.notify_timer();
        is_running
    }

    pub fn adjust_timer(&mut self, delta_seconds: i64) {
        self.timer.adjust(delta_seconds);
        self.notify_timer();
    }

    pub fn set_timer_seconds(&mut self, seconds: u32) {
        self.timer.set_seconds(seconds);
        self.notify_timer();
    }

    /// 先頭のバンドの持ち時間に戻して止めます。
    pub fn reset_timer(&mut self) {
        let minutes = self.queue.head().map_or(0, |band| band.duration_minutes);
        self.timer.reset_minutes(minutes);
        self.notify_timer();
    }

    /// 1 秒進めます。0 になってもバンドは入れ替えない
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.timer.tick();
        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Running { .. } => self.notify_timer(),
            TickOutcome::Expired => {
                log::info!("time is up");
                self.notify(SessionEvent::TimerExpired);
            }
        }
        outcome
    }

    fn band_mut(&mut self, band_id: BandId) -> Result<&mut Band, SessionError> {
        self.queue
            .get_mut(band_id)
            .ok_or(SessionError::BandNotFound(band_id))
    }

    fn on_head_maybe_changed(&mut self, previous_head: Option<BandId>) {
        if self.queue.head_id() == previous_head {
            return;
        }

        self.current_games.clear();
        if !self.timer.is_running() {
            self.reset_timer();
        }
    }

    fn notify_timer(&mut self) {
        self.notify(SessionEvent::TimerChanged {
            remaining_seconds: self.timer.remaining_seconds(),
            is_running: self.timer.is_running(),
        });
    }

    fn notify(&mut self, event: SessionEvent) {
        for observer in self.observers.iter_mut() {
            observer.notify(&event);
        }
    }
}
