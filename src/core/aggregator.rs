use crate::domain::model::{FetchOutcome, Report, RequestDescriptor};
use crate::domain::ports::CountSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(8);

/// 並行查詢所有類別並彙整成 [`Report`]
///
/// 每個 descriptor 各自一個 task，全部完成後才回傳 (不回傳部分結果)。
/// 結果依 catalog 位置放回，和完成順序無關。
pub struct Aggregator {
    source: Arc<dyn CountSource>,
    call_timeout: Duration,
}

impl Aggregator {
    pub fn new(source: Arc<dyn CountSource>) -> Self {
        Self {
            source,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub async fn run(&self, catalog: &[RequestDescriptor]) -> Report {
        tracing::info!("🚀 Querying {} categories", catalog.len());

        let mut tasks = JoinSet::new();
        for (index, descriptor) in catalog.iter().cloned().enumerate() {
            let source = Arc::clone(&self.source);
            let call_timeout = self.call_timeout;
            tasks.spawn(async move {
                let outcome =
                    match tokio::time::timeout(call_timeout, source.fetch_count(&descriptor)).await
                    {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            tracing::warn!(
                                category = %descriptor.category,
                                "⏱️ Call timed out after {:?}",
                                call_timeout
                            );
                            FetchOutcome::failed(descriptor.category.clone())
                        }
                    };
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<FetchOutcome>> = vec![None; catalog.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => tracing::warn!("⚠️ Fetch task aborted: {}", e),
            }
        }

        // 中途 panic 的 task 沒有 outcome，補成 0 筆
        let outcomes: Vec<FetchOutcome> = slots
            .into_iter()
            .zip(catalog)
            .map(|(slot, descriptor)| {
                slot.unwrap_or_else(|| FetchOutcome::failed(descriptor.category.clone()))
            })
            .collect();

        let report = Report::from_outcomes(outcomes);
        tracing::info!(
            "📊 Report ready: {} categories, {} records, auth_failed={}",
            report.len(),
            report.total(),
            report.any_auth_failed()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Simulated {
        Total(u64, u64),
        Unauthorized(u64),
        Failure(u64),
        Hang,
        Panic,
    }

    /// 依類別名稱模擬延遲與結果，並記錄完成順序
    struct ScriptedSource {
        script: HashMap<String, Simulated>,
        completed: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new(script: &[(&str, Simulated)]) -> Self {
            Self {
                script: script
                    .iter()
                    .map(|(name, sim)| (name.to_string(), *sim))
                    .collect(),
                completed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CountSource for ScriptedSource {
        async fn fetch_count(&self, descriptor: &RequestDescriptor) -> FetchOutcome {
            let category = descriptor.category.clone();
            let outcome = match self.script.get(&category).copied() {
                Some(Simulated::Total(delay_ms, total)) => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    FetchOutcome::success(category.clone(), total)
                }
                Some(Simulated::Unauthorized(delay_ms)) => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    FetchOutcome::unauthorized(category.clone())
                }
                Some(Simulated::Failure(delay_ms)) => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    FetchOutcome::failed(category.clone())
                }
                Some(Simulated::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    FetchOutcome::success(category.clone(), 999)
                }
                Some(Simulated::Panic) => panic!("simulated task panic"),
                None => FetchOutcome::failed(category.clone()),
            };
            self.completed.lock().unwrap().push(category);
            outcome
        }
    }

    fn catalog(names: &[&str]) -> Vec<RequestDescriptor> {
        names
            .iter()
            .map(|name| {
                RequestDescriptor::new(
                    *name,
                    format!("http://registry.test/{}", name),
                    serde_json::json!({"isApprove": true}),
                )
            })
            .collect()
    }

    fn pairs(report: &Report) -> Vec<(String, u64)> {
        report
            .entries()
            .iter()
            .map(|e| (e.category.clone(), e.count))
            .collect()
    }

    #[tokio::test]
    async fn test_output_follows_catalog_order_not_completion_order() {
        let source = Arc::new(ScriptedSource::new(&[
            ("A", Simulated::Total(150, 1)),
            ("B", Simulated::Total(75, 2)),
            ("C", Simulated::Total(0, 3)),
        ]));
        let aggregator = Aggregator::new(source.clone());

        let report = aggregator.run(&catalog(&["A", "B", "C"])).await;

        assert_eq!(
            pairs(&report),
            vec![("A".into(), 1), ("B".into(), 2), ("C".into(), 3)]
        );
        assert!(!report.any_auth_failed());
        assert_eq!(*source.completed.lock().unwrap(), vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn test_calls_run_concurrently() {
        let names: Vec<String> = (0..8).map(|i| format!("cat-{}", i)).collect();
        let script: Vec<(&str, Simulated)> = names
            .iter()
            .map(|n| (n.as_str(), Simulated::Total(200, 1)))
            .collect();
        let aggregator = Aggregator::new(Arc::new(ScriptedSource::new(&script)));
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let started = std::time::Instant::now();
        let report = aggregator.run(&catalog(&name_refs)).await;

        assert_eq!(report.len(), 8);
        assert_eq!(report.total(), 8);
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_single_unauthorized_call_flags_report() {
        let aggregator = Aggregator::new(Arc::new(ScriptedSource::new(&[
            ("A", Simulated::Total(5, 5)),
            ("B", Simulated::Total(0, 0)),
            ("C", Simulated::Unauthorized(10)),
        ])));

        let report = aggregator.run(&catalog(&["A", "B", "C"])).await;

        assert_eq!(
            pairs(&report),
            vec![("A".into(), 5), ("B".into(), 0), ("C".into(), 0)]
        );
        assert!(report.any_auth_failed());
    }

    #[tokio::test]
    async fn test_transient_failure_does_not_flag_auth() {
        let aggregator = Aggregator::new(Arc::new(ScriptedSource::new(&[
            ("A", Simulated::Failure(10)),
            ("B", Simulated::Total(0, 4)),
        ])));

        let report = aggregator.run(&catalog(&["A", "B"])).await;

        assert_eq!(pairs(&report), vec![("A".into(), 0), ("B".into(), 4)]);
        assert!(!report.any_auth_failed());
    }

    #[tokio::test]
    async fn test_hanging_call_times_out_without_delaying_result() {
        let aggregator = Aggregator::new(Arc::new(ScriptedSource::new(&[
            ("A", Simulated::Hang),
            ("B", Simulated::Total(0, 2)),
        ])))
        .with_call_timeout(Duration::from_millis(100));

        let started = std::time::Instant::now();
        let report = aggregator.run(&catalog(&["A", "B"])).await;

        assert_eq!(pairs(&report), vec![("A".into(), 0), ("B".into(), 2)]);
        assert!(!report.any_auth_failed());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_panicking_call_still_yields_entry() {
        let aggregator = Aggregator::new(Arc::new(ScriptedSource::new(&[
            ("A", Simulated::Total(0, 1)),
            ("B", Simulated::Panic),
            ("C", Simulated::Unauthorized(0)),
        ])));

        let report = aggregator.run(&catalog(&["A", "B", "C"])).await;

        assert_eq!(
            pairs(&report),
            vec![("A".into(), 1), ("B".into(), 0), ("C".into(), 0)]
        );
        assert!(report.any_auth_failed());
    }

    #[tokio::test]
    async fn test_all_calls_failing_still_produces_full_report() {
        let aggregator = Aggregator::new(Arc::new(ScriptedSource::new(&[
            ("A", Simulated::Unauthorized(0)),
            ("B", Simulated::Unauthorized(5)),
        ])));

        let report = aggregator.run(&catalog(&["A", "B"])).await;

        assert_eq!(report.len(), 2);
        assert_eq!(report.total(), 0);
        assert!(report.any_auth_failed());
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let aggregator = Aggregator::new(Arc::new(ScriptedSource::new(&[])));
        let report = aggregator.run(&[]).await;
        assert!(report.is_empty());
        assert!(!report.any_auth_failed());
    }

    #[tokio::test]
    async fn test_huge_counts_do_not_overflow_summary_log() {
        // 有 subscriber 時 info! 的參數才會被求值
        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let aggregator = Aggregator::new(Arc::new(ScriptedSource::new(&[
            ("A", Simulated::Total(0, u64::MAX)),
            ("B", Simulated::Total(0, u64::MAX)),
        ])));

        let report = aggregator.run(&catalog(&["A", "B"])).await;

        assert_eq!(report.len(), 2);
        assert_eq!(report.total(), u64::MAX);
    }
}
