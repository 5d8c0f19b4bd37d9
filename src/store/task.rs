use std::future::Future;

use tokio::task::JoinHandle;

/// 后台任务句柄
///
/// 由启动它的一方持有，丢弃时任务被中止，避免视图销毁后继续更新状态。
#[derive(Debug)]
pub struct BackgroundTask {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundTask {
    pub fn spawn<F>(name: &'static str, future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::debug!("Spawning background task {}", name);
        Self {
            name,
            handle: Some(tokio::spawn(future)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::debug!("Cancelling background task {}", self.name);
            handle.abort();
        }
    }

    /// 等待任务结束
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!("Background task {} failed: {}", self.name, e);
                }
            }
        }
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
