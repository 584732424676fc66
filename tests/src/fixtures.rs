//! # Shared Test Fixtures
//!
//! Modules and contexts reused by every integration scenario.
//!
//! | Fixture | Capabilities | Resolves to |
//! |---------|--------------|-------------|
//! | [`FakeHydro`] | start + stop | `{"id": which}` after 10ms |
//! | [`FakeNoStart`] | none | the object itself |
//! | [`FakeNullStart`] | start | `null` |
//! | [`Closable`] | stop | the object itself |
//! | [`Delayed`] | start | `settings.value` after `settings.delay_ms` |
//! | [`regular_function`] | factory | its two arguments joined by `,` |

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hydrate_engine::{
    ContextLogger, ExternalContext, FactoryFn, Hydrated, Instance, Module, ModuleDescriptor,
    ModuleRegistry, ResultTree, Startable, Stoppable,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};

// =============================================================================
// CONTEXT
// =============================================================================

/// Logger that records every call.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(String, Value)>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<(String, Value)> {
        self.lines.lock().clone()
    }

    pub fn messages(&self, message: &str) -> Vec<Value> {
        self.lines
            .lock()
            .iter()
            .filter(|(m, _)| m == message)
            .map(|(_, metadata)| metadata.clone())
            .collect()
    }
}

impl ContextLogger for RecordingLogger {
    fn info(&self, message: &str, metadata: &Value) {
        self.lines.lock().push((message.to_string(), metadata.clone()));
    }
}

/// External context shared by the fixtures.
#[derive(Debug, Default)]
pub struct TestContext {
    pub foo: bool,
    pub logger: Option<RecordingLogger>,
    /// Set once any `FakeHydro` has finished starting.
    pub finished_one: AtomicBool,
    pub stop_count: AtomicUsize,
    /// Names in the order their `stop` completed.
    pub stopped: Mutex<Vec<String>>,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            foo: true,
            ..Self::default()
        }
    }

    pub fn with_logger() -> Self {
        Self {
            logger: Some(RecordingLogger::default()),
            ..Self::new()
        }
    }

    pub fn stop_count(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> Vec<String> {
        self.stopped.lock().clone()
    }
}

impl ExternalContext for TestContext {
    fn logger(&self) -> Option<&dyn ContextLogger> {
        self.logger.as_ref().map(|l| l as &dyn ContextLogger)
    }
}

// =============================================================================
// MODULES
// =============================================================================

/// Startable and stoppable module that checks it starts in parallel.
#[derive(Debug)]
pub struct FakeHydro {
    pub which: u64,
}

impl Module<TestContext> for FakeHydro {
    fn new(
        ctx: &Arc<TestContext>,
        descriptor: &ModuleDescriptor<TestContext>,
        _tree: &ResultTree,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(ctx.foo, "Should get context");
        let which = descriptor
            .get("which")
            .and_then(Value::as_u64)
            .ok_or_else(|| anyhow::anyhow!("Should have a \"which\" property"))?;
        Ok(Self { which })
    }

    fn into_instance(self) -> Instance<TestContext> {
        Instance::managed(self)
    }
}

#[async_trait]
impl Startable<TestContext> for FakeHydro {
    async fn start(&self, ctx: &TestContext, _tree: &ResultTree) -> anyhow::Result<Hydrated> {
        anyhow::ensure!(
            !ctx.finished_one.load(Ordering::SeqCst),
            "Should start in parallel"
        );
        anyhow::ensure!(ctx.foo, "Should get context");
        tokio::time::sleep(Duration::from_millis(10)).await;
        ctx.finished_one.store(true, Ordering::SeqCst);
        Ok(Hydrated::Json(json!({ "id": self.which })))
    }
}

#[async_trait]
impl Stoppable<TestContext> for FakeHydro {
    async fn stop(&self, ctx: &TestContext) -> anyhow::Result<()> {
        anyhow::ensure!(ctx.foo, "Should get context");
        tokio::time::sleep(Duration::from_millis(10)).await;
        ctx.stop_count.fetch_add(1, Ordering::SeqCst);
        ctx.stopped.lock().push(format!("hydro-{}", self.which));
        Ok(())
    }
}

/// Plain object with no lifecycle.
#[derive(Debug)]
pub struct FakeNoStart {
    pub foo: bool,
}

impl Module<TestContext> for FakeNoStart {
    fn new(
        _ctx: &Arc<TestContext>,
        _descriptor: &ModuleDescriptor<TestContext>,
        _tree: &ResultTree,
    ) -> anyhow::Result<Self> {
        Ok(Self { foo: true })
    }
}

/// Module whose `start` produces nothing.
#[derive(Debug)]
pub struct FakeNullStart;

impl Module<TestContext> for FakeNullStart {
    fn new(
        _ctx: &Arc<TestContext>,
        _descriptor: &ModuleDescriptor<TestContext>,
        _tree: &ResultTree,
    ) -> anyhow::Result<Self> {
        Ok(Self)
    }

    fn into_instance(self) -> Instance<TestContext> {
        Instance::startable(self)
    }
}

#[async_trait]
impl Startable<TestContext> for FakeNullStart {
    async fn start(&self, _ctx: &TestContext, _tree: &ResultTree) -> anyhow::Result<Hydrated> {
        Ok(Hydrated::null())
    }
}

/// Stoppable module with a configurable name and failure.
#[derive(Debug)]
pub struct Closable {
    pub name: String,
    pub fail: bool,
    pub delay: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ClosableSettings {
    name: String,
    fail: bool,
    delay_ms: u64,
}

impl Default for ClosableSettings {
    fn default() -> Self {
        Self {
            name: "closable".to_string(),
            fail: false,
            delay_ms: 0,
        }
    }
}

impl Module<TestContext> for Closable {
    fn new(
        _ctx: &Arc<TestContext>,
        descriptor: &ModuleDescriptor<TestContext>,
        _tree: &ResultTree,
    ) -> anyhow::Result<Self> {
        let settings: ClosableSettings = descriptor.settings_as()?;
        Ok(Self {
            name: settings.name,
            fail: settings.fail,
            delay: Duration::from_millis(settings.delay_ms),
        })
    }

    fn into_instance(self) -> Instance<TestContext> {
        Instance::stoppable(self)
    }
}

#[async_trait]
impl Stoppable<TestContext> for Closable {
    async fn stop(&self, ctx: &TestContext) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        ctx.stopped.lock().push(self.name.clone());
        anyhow::ensure!(!self.fail, "{} refused to stop", self.name);
        ctx.stop_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Module that resolves to `settings.value` after `settings.delay_ms`.
#[derive(Debug)]
pub struct Delayed {
    pub value: Value,
    pub delay: Duration,
}

impl Module<TestContext> for Delayed {
    fn new(
        _ctx: &Arc<TestContext>,
        descriptor: &ModuleDescriptor<TestContext>,
        _tree: &ResultTree,
    ) -> anyhow::Result<Self> {
        let delay = descriptor.get("delay_ms").and_then(Value::as_u64).unwrap_or(0);
        Ok(Self {
            value: descriptor.get("value").cloned().unwrap_or(Value::Null),
            delay: Duration::from_millis(delay),
        })
    }

    fn into_instance(self) -> Instance<TestContext> {
        Instance::startable(self)
    }
}

#[async_trait]
impl Startable<TestContext> for Delayed {
    async fn start(&self, _ctx: &TestContext, _tree: &ResultTree) -> anyhow::Result<Hydrated> {
        tokio::time::sleep(self.delay).await;
        Ok(Hydrated::Json(self.value.clone()))
    }
}

// =============================================================================
// FACTORIES
// =============================================================================

/// Joins its first two arguments with a comma, after a short delay.
pub fn regular_function() -> FactoryFn {
    FactoryFn::new(|args: Vec<Value>| async move {
        tokio::time::sleep(Duration::from_millis(1)).await;
        let joined = args
            .iter()
            .take(2)
            .map(|arg| match arg {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(",");
        anyhow::Ok(Hydrated::Json(Value::String(joined)))
    })
}

/// Registry with every fixture under a short name.
pub fn registry() -> anyhow::Result<ModuleRegistry<TestContext>> {
    let mut registry = ModuleRegistry::new();
    registry.register_module::<FakeHydro>("FakeHydro")?;
    registry.register_module::<FakeNoStart>("FakeNoStart")?;
    registry.register_module::<FakeNullStart>("FakeNullStart")?;
    registry.register_module::<Closable>("Closable")?;
    registry.register_module::<Delayed>("Delayed")?;
    registry.register_function("regularFunction", regular_function())?;
    Ok(registry)
}
