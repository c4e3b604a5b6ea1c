use crate::{BandId, UserId};

/// セッションの状態変化
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    BandQueued(BandId),

    // 先頭のバンドが履歴に移った
    BandAdvanced {
        archived: BandId,
        on_stage: Option<BandId>,
    },

    BandRemoved(BandId),

    BandRenamed {
        band: BandId,
        name: String,
    },

    MemberAdded {
        band: BandId,
        user: UserId,
    },

    MemberRemoved {
        band: BandId,
        user: UserId,
    },

    DurationChanged {
        band: BandId,
        minutes: u32,
    },

    QueueReordered,

    GameRecorded(String),

    TimerChanged {
        remaining_seconds: u32,
        is_running: bool,
    },

    TimerExpired,
}

/// 状態変化の通知先
/// 画面側はこれを登録して変化を受け取る
pub trait ISessionObserver {
    fn notify(&mut self, event: &SessionEvent);
}

// 関数オブジェクトを利用するためのアダプター
pub(crate) struct FnObserver<TFunc: FnMut(&SessionEvent)> {
    pub(crate) func: TFunc,
}

impl<TFunc: FnMut(&SessionEvent)> ISessionObserver for FnObserver<TFunc> {
    fn notify(&mut self, event: &SessionEvent) {
        (self.func)(event);
    }
}
