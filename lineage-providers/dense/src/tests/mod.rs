pub(crate) use super::{EmbeddingColumns, EmbeddingProvider, EmbeddingProviderError};

mod support;
