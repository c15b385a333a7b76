use crate::cache::ObjectCache;
use crate::errors::{PortalError, Result};
use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{Arc, RwLock},
};

pub type BoxedObjectCacheFuture =
    Pin<Box<dyn Future<Output = Result<Box<dyn ObjectCache>>> + Send>>;
pub type ObjectCacheConstructor = Arc<dyn Fn() -> BoxedObjectCacheFuture + Send + Sync>;

static OBJECT_CACHE_REGISTRY: Lazy<RwLock<HashMap<String, ObjectCacheConstructor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

pub fn register_object_cache_plugin<S: Into<String>>(name: S, constructor: ObjectCacheConstructor) {
    let name = name.into();
    match OBJECT_CACHE_REGISTRY.write() {
        Ok(mut registry) => {
            registry.insert(name, constructor);
        }
        Err(poisoned) => {
            poisoned.into_inner().insert(name, constructor);
        }
    }
}

pub fn get_object_cache_plugin(name: &str) -> Option<ObjectCacheConstructor> {
    let registry = match OBJECT_CACHE_REGISTRY.read() {
        Ok(r) => r,
        Err(poisoned) => poisoned.into_inner(),
    };
    registry.get(name).cloned()
}

/// 注册内置缓存后端（启动时调用一次）
pub fn register_builtin_plugins() {
    register_object_cache_plugin(
        "moka",
        Arc::new(|| {
            Box::pin(async {
                let cache = super::object_cache::moka::MokaCacheWrapper::new();
                Ok(Box::new(cache) as Box<dyn ObjectCache>)
            }) as BoxedObjectCacheFuture
        }),
    );
    register_object_cache_plugin(
        "redis",
        Arc::new(|| {
            Box::pin(async {
                let cache = super::object_cache::redis::RedisObjectCache::connect()
                    .await
                    .map_err(PortalError::cache_connection)?;
                Ok(Box::new(cache) as Box<dyn ObjectCache>)
            }) as BoxedObjectCacheFuture
        }),
    );
    debug_object_cache_registry();
}

pub fn debug_object_cache_registry() {
    let registry = match OBJECT_CACHE_REGISTRY.read() {
        Ok(r) => r,
        Err(poisoned) => poisoned.into_inner(),
    };
    if registry.is_empty() {
        tracing::debug!("No object cache plugins registered.");
    } else {
        tracing::debug!("Registered object cache plugins:");
        for key in registry.keys() {
            tracing::debug!(" - {}", key);
        }
    }
}
