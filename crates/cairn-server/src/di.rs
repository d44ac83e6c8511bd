//! Dependency injection module using Shaku.
//!
//! One Shaku module per cache backend:
//! - `RedisModule`: PostgreSQL backing store with the Redis cache store
//! - `MemoryModule`: PostgreSQL backing store with the process-local cache store
//!
//! Both hold the same user service component; only the `CacheInterface`
//! implementation differs.

use cairn_config::{AppConfig, CacheBackend, RedisConfig};
use cairn_core::{CairnError, CairnResult};
use cairn_repository::{
    DatabasePool, DatabasePoolInterface, DatabasePoolParameters, PgUserRepository, UserRepository,
};
use cairn_service::{
    CacheInterface, CacheSettings, InMemoryCacheService, RedisCacheService,
    RedisCacheServiceParameters, UserService, UserServiceComponent,
    UserServiceComponentParameters,
};
use shaku::{module, HasComponent};
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Shaku Module Definitions
// ============================================================================

module! {
    pub RedisModule {
        components = [
            DatabasePool,
            PgUserRepository,
            RedisCacheService,
            UserServiceComponent,
        ],
        providers = [],
    }
}

module! {
    pub MemoryModule {
        components = [
            DatabasePool,
            PgUserRepository,
            InMemoryCacheService,
            UserServiceComponent,
        ],
        providers = [],
    }
}

// ============================================================================
// Module Builders
// ============================================================================

/// The wired application, whichever cache backend was configured.
#[derive(Clone)]
pub enum AppModule {
    Redis(Arc<RedisModule>),
    Memory(Arc<MemoryModule>),
}

impl AppModule {
    /// Builds the module for `config.cache.backend` over an open pool.
    pub fn build(config: &AppConfig, db_pool: &DatabasePool) -> CairnResult<Self> {
        let settings = CacheSettings::from(&config.cache);
        info!(
            backend = %config.cache.backend,
            list_strategy = %settings.list_strategy,
            collection_ttl_secs = settings.collection_ttl.as_secs(),
            entity_ttl_secs = settings.entity_ttl.as_secs(),
            invalidate_on_write = settings.invalidate_on_write,
            "Wiring cache policies"
        );

        match config.cache.backend {
            CacheBackend::Redis => build_redis_module(db_pool, &config.redis, settings)
                .map(|module| Self::Redis(Arc::new(module))),
            CacheBackend::Memory => Ok(Self::Memory(Arc::new(build_memory_module(
                db_pool, settings,
            )))),
        }
    }
}

/// Builds the Redis-backed module.
pub fn build_redis_module(
    db_pool: &DatabasePool,
    redis_config: &RedisConfig,
    settings: CacheSettings,
) -> CairnResult<RedisModule> {
    let cache_pool = create_redis_pool(redis_config)?;

    Ok(RedisModule::builder()
        .with_component_parameters::<DatabasePool>(DatabasePoolParameters {
            pool: db_pool.inner().clone(),
        })
        .with_component_parameters::<RedisCacheService>(RedisCacheServiceParameters {
            pool: Arc::new(cache_pool),
        })
        .with_component_parameters::<UserServiceComponent>(UserServiceComponentParameters {
            settings,
        })
        .build())
}

/// Builds the in-memory cache module.
#[must_use]
pub fn build_memory_module(db_pool: &DatabasePool, settings: CacheSettings) -> MemoryModule {
    MemoryModule::builder()
        .with_component_parameters::<DatabasePool>(DatabasePoolParameters {
            pool: db_pool.inner().clone(),
        })
        .with_component_parameters::<UserServiceComponent>(UserServiceComponentParameters {
            settings,
        })
        .build()
}

fn create_redis_pool(redis_config: &RedisConfig) -> CairnResult<deadpool_redis::Pool> {
    let mut redis_cfg = deadpool_redis::Config::from_url(&redis_config.url);
    redis_cfg.pool = Some(deadpool_redis::PoolConfig::new(redis_config.pool_size as usize));

    redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .map_err(|e| CairnError::Cache(format!("Failed to create Redis pool: {}", e)))
}

// ============================================================================
// Resolvers
// ============================================================================

/// Resolves the services the HTTP layer needs.
pub trait ServiceResolver {
    fn user_service(&self) -> Arc<dyn UserService>;
}

/// Resolves the store handles used by readiness probes and shutdown.
pub trait StoreResolver {
    fn database_pool(&self) -> Arc<dyn DatabasePoolInterface>;

    fn user_repository(&self) -> Arc<dyn UserRepository>;

    fn cache(&self) -> Arc<dyn CacheInterface>;
}

macro_rules! impl_resolvers {
    ($module:ty) => {
        impl ServiceResolver for $module {
            fn user_service(&self) -> Arc<dyn UserService> {
                self.resolve()
            }
        }

        impl StoreResolver for $module {
            fn database_pool(&self) -> Arc<dyn DatabasePoolInterface> {
                self.resolve()
            }

            fn user_repository(&self) -> Arc<dyn UserRepository> {
                self.resolve()
            }

            fn cache(&self) -> Arc<dyn CacheInterface> {
                self.resolve()
            }
        }
    };
}

impl_resolvers!(RedisModule);
impl_resolvers!(MemoryModule);

impl ServiceResolver for AppModule {
    fn user_service(&self) -> Arc<dyn UserService> {
        match self {
            Self::Redis(module) => module.user_service(),
            Self::Memory(module) => module.user_service(),
        }
    }
}

impl StoreResolver for AppModule {
    fn database_pool(&self) -> Arc<dyn DatabasePoolInterface> {
        match self {
            Self::Redis(module) => module.database_pool(),
            Self::Memory(module) => module.database_pool(),
        }
    }

    fn user_repository(&self) -> Arc<dyn UserRepository> {
        match self {
            Self::Redis(module) => module.user_repository(),
            Self::Memory(module) => module.user_repository(),
        }
    }

    fn cache(&self) -> Arc<dyn CacheInterface> {
        match self {
            Self::Redis(module) => module.cache(),
            Self::Memory(module) => module.cache(),
        }
    }
}
