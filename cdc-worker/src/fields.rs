use std::sync::Arc;
use std::time;

use cdc_common::error::QueryError;
use cdc_common::salesforce::RecordSource;
use moka::future::Cache;
use tracing::debug;

const MAX_CACHED_ENTITIES: u64 = 1000;

/// Resolves the field list of an entity, optionally caching describe results for a while.
#[derive(Clone, Default)]
pub struct FieldResolver {
    cache: Option<Cache<String, Arc<Vec<String>>>>,
}

impl FieldResolver {
    /// Describe entities every time they are resolved.
    pub fn uncached() -> Self {
        Self { cache: None }
    }

    pub fn cached(ttl: time::Duration) -> Self {
        Self {
            cache: Some(
                Cache::builder()
                    .max_capacity(MAX_CACHED_ENTITIES)
                    .time_to_live(ttl)
                    .build(),
            ),
        }
    }

    pub fn from_ttl(ttl: Option<time::Duration>) -> Self {
        match ttl {
            Some(ttl) => Self::cached(ttl),
            None => Self::uncached(),
        }
    }

    pub async fn resolve(
        &self,
        source: &dyn RecordSource,
        entity_name: &str,
    ) -> Result<Arc<Vec<String>>, QueryError> {
        let Some(cache) = &self.cache else {
            return Ok(Arc::new(source.describe_fields(entity_name).await?));
        };

        if let Some(fields) = cache.get(entity_name).await {
            debug!("using cached field list for {}", entity_name);
            return Ok(fields);
        }

        let fields = Arc::new(source.describe_fields(entity_name).await?);
        cache.insert(entity_name.to_owned(), fields.clone()).await;

        Ok(fields)
    }
}
