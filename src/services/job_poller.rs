//! 任务轮询服务 - 业务能力层
//!
//! 每个任务独立轮询：
//!
//! ```text
//! PENDING → RUNNING ─┬→ COMPLETED
//!                    ├→ FAILED
//!                    ├→ UNKNOWN（无法识别的状态，立即停止）
//!                    └→ TIMEOUT（超过 max_attempts，返回 None）
//! ```
//!
//! 网络失败只结束当前任务的轮询，返回 None，不影响其他任务。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clients::GradingService;
use crate::error::PollError;
use crate::models::{Assessment, JobHandle, JobStatus};

/// 任务轮询服务
pub struct JobPoller {
    service: Arc<dyn GradingService>,
    interval: Duration,
    max_attempts: u32,
}

impl JobPoller {
    pub fn new(service: Arc<dyn GradingService>, interval: Duration, max_attempts: u32) -> Self {
        Self {
            service,
            interval,
            max_attempts,
        }
    }

    /// 轮询到终态；超时或网络失败返回 None
    pub async fn poll(&self, handle: &JobHandle) -> Option<Assessment> {
        match self.poll_to_terminal(handle).await {
            Ok(assessment) => Some(assessment),
            Err(e @ PollError::Timeout { .. }) => {
                warn!("⏱️ {}", e);
                None
            }
            Err(e) => {
                warn!("⚠️ 任务 {} 轮询中断: {}", handle, e);
                None
            }
        }
    }

    async fn poll_to_terminal(&self, handle: &JobHandle) -> Result<Assessment, PollError> {
        for attempt in 1..=self.max_attempts {
            let snapshot = self.service.get_job(handle).await?;
            let status = snapshot.status();

            if !status.is_terminal() {
                debug!(
                    "   [{}/{}] 任务 {} 状态: running",
                    attempt, self.max_attempts, handle
                );
                // 最后一次不再等待
                if attempt < self.max_attempts && !self.interval.is_zero() {
                    tokio::time::sleep(self.interval).await;
                }
                continue;
            }

            if status == JobStatus::Unknown {
                warn!(
                    "⚠️ 任务 {} 返回未知状态 {:?}，停止轮询",
                    handle, snapshot.status
                );
            }

            let (assessment, gap) = Assessment::from_snapshot(handle, snapshot);
            if let Some(gap) = gap {
                warn!("⚠️ {}", gap);
            }

            match assessment.status {
                JobStatus::Completed => info!("✓ 任务 {} 完成, 分数: {:?}", handle, assessment.score),
                JobStatus::Failed => warn!("❌ 任务 {} 在评分服务内部失败", handle),
                _ => {}
            }

            return Ok(assessment);
        }

        Err(PollError::Timeout {
            handle: handle.to_string(),
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubmissionError;
    use crate::models::JobSnapshot;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 按脚本依次返回响应，脚本用完后重复最后一个
    struct ScriptedService {
        script: Mutex<Vec<Result<Value, ()>>>,
        calls: AtomicUsize,
    }

    impl ScriptedService {
        fn new(script: Vec<Result<Value, ()>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GradingService for ScriptedService {
        async fn create_job(&self, _item_id: &str, _answer: &str) -> Result<JobHandle, SubmissionError> {
            unreachable!("poller never submits")
        }

        async fn get_job(&self, _handle: &JobHandle) -> Result<JobSnapshot, PollError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let script = self.script.lock().unwrap();
            let step = script.get(call).or_else(|| script.last()).cloned().unwrap();
            step.map(JobSnapshot::from_json).map_err(|_| PollError::Network {
                endpoint: "fake".to_string(),
                message: "connection reset".to_string(),
            })
        }
    }

    fn handle() -> JobHandle {
        JobHandle("job-1".to_string())
    }

    fn poller(service: Arc<ScriptedService>, max_attempts: u32) -> JobPoller {
        JobPoller::new(service, Duration::ZERO, max_attempts)
    }

    #[tokio::test]
    async fn test_running_then_completed() {
        let service = ScriptedService::new(vec![
            Ok(json!({ "status": "running" })),
            Ok(json!({ "status": "running" })),
            Ok(json!({ "status": "completed", "result": { "score": 8, "max_score": 10 } })),
        ]);
        let assessment = poller(service.clone(), 15).poll(&handle()).await.unwrap();
        assert_eq!(assessment.status, JobStatus::Completed);
        assert_eq!(assessment.score, Some(8.0));
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test]
    async fn test_timeout_after_exactly_max_attempts() {
        let service = ScriptedService::new(vec![Ok(json!({ "status": "running" }))]);
        let result = poller(service.clone(), 5).poll(&handle()).await;
        assert!(result.is_none());
        assert_eq!(service.calls(), 5);
    }

    #[tokio::test]
    async fn test_unknown_status_stops_immediately() {
        let service = ScriptedService::new(vec![
            Ok(json!({ "status": "archived" })),
            Ok(json!({ "status": "completed", "result": { "score": 8, "max_score": 10 } })),
        ]);
        let assessment = poller(service.clone(), 15).poll(&handle()).await.unwrap();
        assert_eq!(assessment.status, JobStatus::Unknown);
        assert_eq!(assessment.score, None);
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_is_terminal() {
        let service = ScriptedService::new(vec![Ok(json!({ "status": "error" }))]);
        let assessment = poller(service.clone(), 15).poll(&handle()).await.unwrap();
        assert_eq!(assessment.status, JobStatus::Failed);
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_network_failure_is_none() {
        let service = ScriptedService::new(vec![Ok(json!({ "status": "running" })), Err(())]);
        let result = poller(service.clone(), 15).poll(&handle()).await;
        assert!(result.is_none());
        assert_eq!(service.calls(), 2);
    }
}
