//! 任务提交服务 - 业务能力层
//!
//! 把答案提交给评分服务。提交失败直接向上传播：少了一个任务就永远拿不到那份数据。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::clients::GradingService;
use crate::error::SubmissionError;
use crate::models::{Job, JobHandle, Tier};

/// 任务提交服务
pub struct JobSubmitter {
    service: Arc<dyn GradingService>,
    interval: Duration,
}

impl JobSubmitter {
    /// `interval` 为同一答案重复提交之间的间隔，用来遵守评分服务的频率限制
    pub fn new(service: Arc<dyn GradingService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// 提交一次
    pub async fn create_job(&self, item_id: &str, answer: &str) -> Result<JobHandle, SubmissionError> {
        let handle = self.service.create_job(item_id, answer).await?;
        debug!("任务已创建: {}", handle);
        Ok(handle)
    }

    /// 同一答案提交 n 次，两次之间间隔 `interval`
    ///
    /// 全部成功时恰好返回 n 个句柄；第一次失败立即返回错误，不再尝试剩余的提交。
    pub async fn submit_n(
        &self,
        item_id: &str,
        answer: &str,
        n: usize,
        interval: Duration,
    ) -> Result<Vec<JobHandle>, SubmissionError> {
        let mut handles = Vec::with_capacity(n);
        for i in 0..n {
            if i > 0 && !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
            handles.push(self.create_job(item_id, answer).await?);
        }
        Ok(handles)
    }

    /// 提交某个档位的全部副本，返回带档位和序号的任务
    pub async fn submit_tier(
        &self,
        item_id: &str,
        tier: Tier,
        answer: &str,
        replication: usize,
    ) -> Result<Vec<Job>, SubmissionError> {
        let n = tier.replication(replication);
        let handles = self.submit_n(item_id, answer, n, self.interval).await?;

        info!("[{}] ✓ {} 档已提交 {} 个任务", item_id, tier, handles.len());

        Ok(handles
            .into_iter()
            .enumerate()
            .map(|(i, handle)| Job {
                handle,
                tier,
                replica: i + 1,
                submitted_at: Utc::now(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PollError;
    use crate::models::JobSnapshot;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 第 `fail_on` 次调用（从 1 开始）返回错误
    struct CountingService {
        calls: AtomicUsize,
        fail_on: Option<usize>,
    }

    impl CountingService {
        fn new(fail_on: Option<usize>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_on,
            })
        }
    }

    #[async_trait]
    impl GradingService for CountingService {
        async fn create_job(&self, _item_id: &str, _answer: &str) -> Result<JobHandle, SubmissionError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on == Some(call) {
                return Err(SubmissionError::BadResponse {
                    endpoint: "fake".to_string(),
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(JobHandle(format!("job-{}", call)))
        }

        async fn get_job(&self, _handle: &JobHandle) -> Result<JobSnapshot, PollError> {
            unreachable!("submitter never polls")
        }
    }

    #[tokio::test]
    async fn test_submit_n_returns_exactly_n() {
        let service = CountingService::new(None);
        let submitter = JobSubmitter::new(service.clone(), Duration::ZERO);

        let handles = submitter
            .submit_n("42", "answer", 3, Duration::from_millis(1))
            .await
            .unwrap();

        assert_eq!(
            handles,
            vec![
                JobHandle("job-1".to_string()),
                JobHandle("job-2".to_string()),
                JobHandle("job-3".to_string())
            ]
        );
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_submit_n_stops_on_first_failure() {
        let service = CountingService::new(Some(2));
        let submitter = JobSubmitter::new(service.clone(), Duration::ZERO);

        let result = submitter.submit_n("42", "answer", 3, Duration::ZERO).await;

        tokio_test::assert_err!(result);
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_submit_n_paces_between_calls() {
        let service = CountingService::new(None);
        let submitter = JobSubmitter::new(service, Duration::ZERO);

        let started = std::time::Instant::now();
        submitter
            .submit_n("42", "answer", 3, Duration::from_millis(30))
            .await
            .unwrap();
        // 3 次提交只有 2 个间隔
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_submit_tier_reference_is_single() {
        let service = CountingService::new(None);
        let submitter = JobSubmitter::new(service.clone(), Duration::ZERO);

        let jobs = submitter
            .submit_tier("42", Tier::Reference, "bolo", 3)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].tier, Tier::Reference);

        let jobs = submitter.submit_tier("42", Tier::High, "ótima", 3).await.unwrap();
        assert_eq!(jobs.iter().map(|j| j.replica).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(service.calls.load(Ordering::SeqCst), 4);
    }
}
