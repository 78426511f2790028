//! Paging options
//!
//! Everything a [`super::PagingAdapter`] needs to run a session. Use
//! [`PagingOptions::builder`] to create one.

use crate::config::{DiffMode, PagingConfig, SessionConfig};
use crate::diff::{DiffPolicy, KeyDiffPolicy, ParsedDiffPolicy, ValueDiffPolicy};
use crate::error::{Error, Result};
use crate::pagination::{CategoryPagingSource, QueryDescriptor};
use crate::parser::{JsonParser, SnapshotParser};
use crate::store::Store;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

/// Options of one paging session
pub struct PagingOptions<T> {
    store: Arc<dyn Store>,
    descriptor: QueryDescriptor,
    config: PagingConfig,
    parser: Arc<dyn SnapshotParser<T>>,
    diff_policy: Arc<dyn DiffPolicy>,
}

impl<T> PagingOptions<T> {
    /// Start building options
    pub fn builder() -> PagingOptionsBuilder<T> {
        PagingOptionsBuilder::default()
    }

    /// Store the session reads from
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Query descriptor of the session
    pub fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    /// Page sizes
    pub fn config(&self) -> &PagingConfig {
        &self.config
    }

    /// Parser turning snapshots into models
    pub fn parser(&self) -> &Arc<dyn SnapshotParser<T>> {
        &self.parser
    }

    /// Diff policy used when merging pages
    pub fn diff_policy(&self) -> &Arc<dyn DiffPolicy> {
        &self.diff_policy
    }

    /// Create a fresh page loader for these options
    pub fn source(&self) -> Result<CategoryPagingSource> {
        CategoryPagingSource::new(Arc::clone(&self.store), self.descriptor.clone())
    }
}

impl<T: 'static> PagingOptions<T> {
    /// Build options from a session config file
    pub fn from_session(
        store: Arc<dyn Store>,
        session: &SessionConfig,
        parser: impl SnapshotParser<T> + 'static,
    ) -> Result<Self> {
        session.validate()?;
        let builder = Self::builder().set_query(
            store,
            session.descriptor(),
            session.paging.clone(),
            parser,
        );
        let builder = match session.diff {
            DiffMode::Key => builder.set_diff_policy(KeyDiffPolicy),
            DiffMode::Value => builder.set_diff_policy(ValueDiffPolicy),
        };
        builder.build()
    }
}

impl<T> Clone for PagingOptions<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            descriptor: self.descriptor.clone(),
            config: self.config.clone(),
            parser: Arc::clone(&self.parser),
            diff_policy: Arc::clone(&self.diff_policy),
        }
    }
}

impl<T> fmt::Debug for PagingOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagingOptions")
            .field("descriptor", &self.descriptor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PagingOptions`]
pub struct PagingOptionsBuilder<T> {
    query: Option<(Arc<dyn Store>, QueryDescriptor, PagingConfig)>,
    parser: Option<Arc<dyn SnapshotParser<T>>>,
    diff_policy: Option<Arc<dyn DiffPolicy>>,
}

impl<T> Default for PagingOptionsBuilder<T> {
    fn default() -> Self {
        Self {
            query: None,
            parser: None,
            diff_policy: None,
        }
    }
}

impl<T: 'static> PagingOptionsBuilder<T> {
    /// Set the query to paginate and the parser for its records
    #[must_use]
    pub fn set_query(
        mut self,
        store: Arc<dyn Store>,
        descriptor: QueryDescriptor,
        config: PagingConfig,
        parser: impl SnapshotParser<T> + 'static,
    ) -> Self {
        self.query = Some((store, descriptor, config));
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Set the query, deserializing records with serde
    #[must_use]
    pub fn set_query_json(
        self,
        store: Arc<dyn Store>,
        descriptor: QueryDescriptor,
        config: PagingConfig,
    ) -> Self
    where
        T: DeserializeOwned,
    {
        self.set_query(store, descriptor, config, JsonParser::<T>::new())
    }

    /// Set a custom diff policy
    #[must_use]
    pub fn set_diff_policy(mut self, policy: impl DiffPolicy + 'static) -> Self {
        self.diff_policy = Some(Arc::new(policy));
        self
    }

    /// Compare records by their parsed models
    ///
    /// Must be called after [`Self::set_query`].
    #[must_use]
    pub fn with_parsed_diff(mut self) -> Self
    where
        T: PartialEq,
    {
        if let Some(parser) = &self.parser {
            self.diff_policy = Some(Arc::new(ParsedDiffPolicy::new(Arc::clone(parser))));
        }
        self
    }

    /// Build the options
    ///
    /// Without a diff policy, records are compared by key only.
    pub fn build(self) -> Result<PagingOptions<T>> {
        let (Some((store, descriptor, config)), Some(parser)) = (self.query, self.parser) else {
            return Err(Error::config(
                "Must call set_query() before calling build()",
            ));
        };

        descriptor.validate()?;
        config.validate()?;

        Ok(PagingOptions {
            store,
            descriptor,
            config,
            parser,
            diff_policy: self
                .diff_policy
                .unwrap_or_else(|| Arc::new(KeyDiffPolicy) as Arc<dyn DiffPolicy>),
        })
    }
}
