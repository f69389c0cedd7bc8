//! Tests for lazy model construction in [`ModelGateway`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use huginn::{
    ChatSession, ERROR_TEMPLATE, GatewayConfig, GenerateOptions, HuginnError, InferenceEngine,
    LanguageModel, ModelGateway, Result,
};

#[derive(Default)]
struct Record {
    loads: AtomicUsize,
    warmups: Mutex<Vec<(String, GenerateOptions)>>,
    sessions: AtomicUsize,
    session_calls: Mutex<Vec<(usize, String, GenerateOptions)>>,
}

/// Engine that counts everything and can fail its first `failing_loads` loads.
struct CountingEngine {
    record: Arc<Record>,
    load_delay: Duration,
    failing_loads: usize,
    fail_warmup: bool,
    fail_generation: bool,
}

impl CountingEngine {
    fn new() -> Self {
        Self {
            record: Arc::new(Record::default()),
            load_delay: Duration::ZERO,
            failing_loads: 0,
            fail_warmup: false,
            fail_generation: false,
        }
    }
}

#[async_trait]
impl InferenceEngine for CountingEngine {
    fn name(&self) -> &str {
        "counting"
    }

    async fn load(&self, model: &str) -> Result<Arc<dyn LanguageModel>> {
        let attempt = self.record.loads.fetch_add(1, Ordering::SeqCst);
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        if attempt < self.failing_loads {
            return Err(HuginnError::ModelNotFound(model.to_string()));
        }
        Ok(Arc::new(CountingModel {
            record: Arc::clone(&self.record),
            fail_warmup: self.fail_warmup,
            fail_generation: self.fail_generation,
        }))
    }
}

struct CountingModel {
    record: Arc<Record>,
    fail_warmup: bool,
    fail_generation: bool,
}

#[async_trait]
impl LanguageModel for CountingModel {
    fn id(&self) -> &str {
        "counting-model"
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        self.record
            .warmups
            .lock()
            .unwrap()
            .push((prompt.to_string(), options.clone()));
        if self.fail_warmup {
            return Err(HuginnError::Generation("warm-up failed".into()));
        }
        Ok("ok".to_string())
    }

    fn session(&self) -> Box<dyn ChatSession> {
        let id = self.record.sessions.fetch_add(1, Ordering::SeqCst);
        Box::new(CountingSession {
            id,
            record: Arc::clone(&self.record),
            fail: self.fail_generation,
        })
    }
}

struct CountingSession {
    id: usize,
    record: Arc<Record>,
    fail: bool,
}

#[async_trait]
impl ChatSession for CountingSession {
    async fn generate(&mut self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        self.record
            .session_calls
            .lock()
            .unwrap()
            .push((self.id, prompt.to_string(), options.clone()));
        if self.fail {
            return Err(HuginnError::Api {
                status: 500,
                message: "boom".into(),
            });
        }
        Ok(format!("echo: {prompt}"))
    }
}

fn gateway(engine: CountingEngine, config: GatewayConfig) -> (Arc<ModelGateway>, Arc<Record>) {
    let record = Arc::clone(&engine.record);
    (Arc::new(ModelGateway::new(Arc::new(engine), config)), record)
}

#[tokio::test]
async fn model_is_not_loaded_until_needed() {
    let (gateway, record) = gateway(CountingEngine::new(), GatewayConfig::default());

    assert!(!gateway.is_ready());
    assert_eq!(record.loads.load(Ordering::SeqCst), 0);

    assert!(gateway.ensure_ready().await);
    assert!(gateway.is_ready());
    assert_eq!(record.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn warm_up_runs_five_one_token_generations() {
    let (gateway, record) = gateway(CountingEngine::new(), GatewayConfig::default());

    assert!(gateway.ensure_ready().await);

    let warmups = record.warmups.lock().unwrap();
    assert_eq!(warmups.len(), 5);
    for (prompt, options) in warmups.iter() {
        assert_eq!(prompt, "test");
        assert_eq!(options.max_tokens, 1);
    }
}

#[tokio::test]
async fn warm_up_rounds_are_configurable() {
    let (gateway, record) = gateway(
        CountingEngine::new(),
        GatewayConfig::default().warmup_rounds(0),
    );

    assert!(gateway.ensure_ready().await);
    assert!(record.warmups.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_construct_exactly_once() {
    let mut engine = CountingEngine::new();
    engine.load_delay = Duration::from_millis(50);
    let (gateway, record) = gateway(engine, GatewayConfig::default());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { gateway.ensure_ready().await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    assert_eq!(record.loads.load(Ordering::SeqCst), 1);
    assert_eq!(record.warmups.lock().unwrap().len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_generations_share_one_model() {
    let mut engine = CountingEngine::new();
    engine.load_delay = Duration::from_millis(20);
    let (gateway, record) = gateway(engine, GatewayConfig::default());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { gateway.generate(&format!("q{i}"), 20).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().starts_with("echo: q"));
    }

    assert_eq!(record.loads.load(Ordering::SeqCst), 1);
    assert_eq!(record.sessions.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn failed_construction_reports_false_and_retries() {
    let mut engine = CountingEngine::new();
    engine.failing_loads = 1;
    let (gateway, record) = gateway(engine, GatewayConfig::default());

    assert!(!gateway.ensure_ready().await);
    assert!(!gateway.is_ready());

    assert!(gateway.ensure_ready().await);
    assert_eq!(record.loads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_warm_up_counts_as_failed_construction() {
    let mut engine = CountingEngine::new();
    engine.fail_warmup = true;
    let (gateway, record) = gateway(engine, GatewayConfig::default());

    assert!(!gateway.ensure_ready().await);
    assert!(!gateway.is_ready());
    // Warm-up stops at the first failure.
    assert_eq!(record.warmups.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn each_generation_uses_a_fresh_session() {
    let (gateway, record) = gateway(CountingEngine::new(), GatewayConfig::default());

    assert_eq!(gateway.generate("first", 20).await, "echo: first");
    assert_eq!(gateway.generate("second", 20).await, "echo: second");

    let calls = record.session_calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].0, calls[1].0);
}

#[tokio::test]
async fn generation_uses_greedy_leaning_options() {
    let (gateway, record) = gateway(CountingEngine::new(), GatewayConfig::default());

    gateway.generate("hello model", 20).await;

    let calls = record.session_calls.lock().unwrap();
    let (_, prompt, options) = &calls[0];
    assert_eq!(prompt, "hello model");
    assert_eq!(options.max_tokens, 20);
    assert_eq!(options.top_k, 1);
    assert_eq!(options.top_p, 0.1);
    assert_eq!(options.repeat_penalty, 1.0);
}

#[tokio::test]
async fn generation_failure_yields_error_template() {
    let mut engine = CountingEngine::new();
    engine.fail_generation = true;
    let (gateway, _record) = gateway(engine, GatewayConfig::default());

    assert_eq!(gateway.generate("anything", 20).await, ERROR_TEMPLATE);

    let err = gateway.try_generate("anything", 20).await.unwrap_err();
    assert!(matches!(err, HuginnError::Api { status: 500, .. }));
}

#[tokio::test]
async fn unavailable_model_yields_error_template() {
    let mut engine = CountingEngine::new();
    engine.failing_loads = usize::MAX;
    let (gateway, record) = gateway(engine, GatewayConfig::default());

    assert_eq!(gateway.generate("anything", 20).await, ERROR_TEMPLATE);

    let err = gateway.try_generate("anything", 20).await.unwrap_err();
    assert!(matches!(err, HuginnError::ModelNotReady(_)));
    assert_eq!(record.sessions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn configured_model_name_is_loaded() {
    struct NameCheck(Mutex<Option<String>>);

    #[async_trait]
    impl InferenceEngine for NameCheck {
        fn name(&self) -> &str {
            "name-check"
        }

        async fn load(&self, model: &str) -> Result<Arc<dyn LanguageModel>> {
            *self.0.lock().unwrap() = Some(model.to_string());
            Err(HuginnError::ModelNotFound(model.to_string()))
        }
    }

    let engine = Arc::new(NameCheck(Mutex::new(None)));
    let gateway = ModelGateway::new(engine.clone(), GatewayConfig::new("mistral"));
    assert!(!gateway.ensure_ready().await);
    assert_eq!(engine.0.lock().unwrap().as_deref(), Some("mistral"));
}
