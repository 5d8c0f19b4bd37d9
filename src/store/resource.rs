use chrono::{DateTime, Utc};

/// 单个资源在 store 中的状态
///
/// 并发请求没有序号，最后完成的请求决定最终状态（而不是最后发出的）。
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    /// 最近一次网络数据落地的时间
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            last_updated: None,
        }
    }
}

/// 对 ResourceState 的全部修改入口
#[derive(Debug, Clone, PartialEq)]
pub enum SliceAction<T> {
    /// 用缓存中的旧数据预填
    Seed(T),
    Pending,
    Fulfilled { data: T, at: DateTime<Utc> },
    Rejected(String),
    Reset,
}

impl<T> ResourceState<T> {
    pub fn reduce(&mut self, action: SliceAction<T>) {
        match action {
            SliceAction::Seed(data) => {
                self.data = Some(data);
                self.error = None;
            }
            SliceAction::Pending => {
                self.loading = true;
            }
            SliceAction::Fulfilled { data, at } => {
                self.data = Some(data);
                self.loading = false;
                self.error = None;
                self.last_updated = Some(at);
            }
            SliceAction::Rejected(message) => {
                self.loading = false;
                // 已经展示的旧数据保留，不显示错误
                if self.data.is_none() {
                    self.error = Some(message);
                }
            }
            SliceAction::Reset => *self = Self::default(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_then_fulfilled() {
        let mut state = ResourceState::<i32>::default();
        state.reduce(SliceAction::Pending);
        assert!(state.loading);
        let at = Utc::now();
        state.reduce(SliceAction::Fulfilled { data: 3, at });
        assert_eq!(state.data, Some(3));
        assert!(!state.loading);
        assert_eq!(state.last_updated, Some(at));
    }

    #[test]
    fn rejection_without_data_sets_error() {
        let mut state = ResourceState::<i32>::default();
        state.reduce(SliceAction::Pending);
        state.reduce(SliceAction::Rejected("网络错误".into()));
        assert_eq!(state.error.as_deref(), Some("网络错误"));
        assert!(!state.loading);
    }

    #[test]
    fn rejection_keeps_stale_data() {
        let mut state = ResourceState::<i32>::default();
        state.reduce(SliceAction::Seed(7));
        state.reduce(SliceAction::Pending);
        state.reduce(SliceAction::Rejected("网络错误".into()));
        assert_eq!(state.data, Some(7));
        assert_eq!(state.error, None);
        assert!(!state.loading);
    }

    #[test]
    fn seed_does_not_touch_loading_or_timestamp() {
        let mut state = ResourceState::<i32>::default();
        state.reduce(SliceAction::Pending);
        state.reduce(SliceAction::Seed(1));
        assert!(state.loading);
        assert_eq!(state.last_updated, None);
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = ResourceState::<i32>::default();
        state.reduce(SliceAction::Fulfilled { data: 1, at: Utc::now() });
        state.reduce(SliceAction::Reset);
        assert_eq!(state, ResourceState::default());
    }
}
