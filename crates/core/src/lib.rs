pub mod client;
pub mod corpus;
pub mod datasets;
pub mod embedding;
pub mod error;
pub mod query;
pub mod ranking;
pub mod session;
pub mod soql;
pub mod text;

pub use client::{fetch_all, FetchReport, PageFetch, SocrataClient, SOCRATA_BASE_URL};
pub use corpus::Corpus;
pub use datasets::{Dataset, EntityRecord, PlanRecord, ProcessRecord, ProcessUrl, SupplierRecord};
pub use embedding::{
    Embedder, EmbeddingIndex, HashedNgramEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{QueryError, Result, SearchError};
pub use query::{
    DateWindow, EntityQuery, PlanQuery, ProcessQuery, SupplierQuery, DEFAULT_PAGE_SIZE,
};
pub use ranking::{cosine, rank, RankedMatch};
pub use session::{FetchCache, LoadOutcome, SearchSession};
pub use soql::{SoqlQuery, WhereClause};
pub use text::fold_ascii;
