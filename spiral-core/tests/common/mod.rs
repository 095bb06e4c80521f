//! Shared fixtures for integration tests

#![allow(dead_code)]

use spiral_core::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .try_init();
    });
}

#[derive(Debug)]
pub struct EngineZIL130;

#[derive(Debug)]
pub struct EngineMarkTwo;

#[derive(Debug)]
pub struct SampleClass {
    pub id: usize,
}

#[derive(Debug, Default)]
pub struct FileLogger {
    pub lines: parking_lot::Mutex<Vec<String>>,
}

/// Scoped to `foo`
#[derive(Debug, Default)]
pub struct AttrScopeFoo;

/// Scoped to `foo`, one per scope
#[derive(Debug, Default)]
pub struct AttrScopeFooSingleton;

#[derive(Debug, Default)]
pub struct AttrFinalize {
    pub finalized: AtomicBool,
}

#[derive(Debug, Default)]
pub struct AttrScopeFooFinalize {
    pub finalized: AtomicBool,
    pub throw: AtomicBool,
}

pub fn engine_classes() -> Vec<ClassDefinition> {
    vec![
        ClassDefinition::builder::<EngineZIL130>("EngineZIL130")
            .implements("EngineInterface")
            .constructor("", |_| Ok(EngineZIL130))
            .build()
            .unwrap(),
        ClassDefinition::builder::<EngineMarkTwo>("EngineMarkTwo")
            .implements("EngineInterface")
            .constructor("", |_| Ok(EngineMarkTwo))
            .build()
            .unwrap(),
    ]
}

pub fn sample_class(counter: Arc<AtomicUsize>) -> ClassDefinition {
    ClassDefinition::builder::<SampleClass>("SampleClass")
        .constructor("", move |_| {
            Ok(SampleClass {
                id: counter.fetch_add(1, Ordering::SeqCst),
            })
        })
        .build()
        .unwrap()
}

pub fn logger_class() -> ClassDefinition {
    ClassDefinition::builder::<FileLogger>("FileLogger")
        .implements("LoggerInterface")
        .default_constructor()
        .method("log", "string $message", |logger, args| {
            let message = args.at(0).and_then(Value::as_str).unwrap_or_default();
            logger.lines.lock().push(message.to_string());
            Ok(Value::Null)
        })
        .build()
        .unwrap()
}

pub fn scoped_classes() -> Vec<ClassDefinition> {
    vec![
        ClassDefinition::builder::<AttrScopeFoo>("AttrScopeFoo")
            .scope("foo")
            .default_constructor()
            .build()
            .unwrap(),
        ClassDefinition::builder::<AttrScopeFooSingleton>("AttrScopeFooSingleton")
            .scope("foo")
            .singleton()
            .default_constructor()
            .build()
            .unwrap(),
    ]
}

pub fn finalize_classes() -> Vec<ClassDefinition> {
    vec![
        ClassDefinition::builder::<AttrFinalize>("AttrFinalize")
            .finalize("finalize")
            .default_constructor()
            .method("finalize", "?LoggerInterface $logger = null", |this, args| {
                this.finalized.store(true, Ordering::SeqCst);
                if let Some(logger) = args.at(0).and_then(|v| v.downcast_ref::<FileLogger>()) {
                    logger.lines.lock().push("finalized".to_string());
                }
                Ok(Value::Null)
            })
            .build()
            .unwrap(),
        ClassDefinition::builder::<AttrScopeFooFinalize>("AttrScopeFooFinalize")
            .scope("foo")
            .finalize("finalize")
            .default_constructor()
            .method("finalize", "", |this, _| {
                this.finalized.store(true, Ordering::SeqCst);
                if this.throw.load(Ordering::SeqCst) {
                    anyhow::bail!("Test exception from finalize method");
                }
                Ok(Value::Null)
            })
            .build()
            .unwrap(),
    ]
}

/// Root container with every fixture class registered
pub fn container() -> Container {
    init_tracing();
    let container = Container::new();
    for class in engine_classes()
        .into_iter()
        .chain(scoped_classes())
        .chain(finalize_classes())
        .chain(std::iter::once(logger_class()))
    {
        container.register_class(class);
    }
    container
}
