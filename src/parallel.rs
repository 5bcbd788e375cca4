//! Parallel processing support for ferro-kb
//!
//! This module provides parallel variants of notation parsing and query
//! building using rayon. Enable with the `parallel` feature.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "parallel")]
//! # fn main() {
//! use ferro_kb::parallel::{build_queries_parallel, parse_variants_parallel_ok};
//! use ferro_kb::query::QueryOptions;
//! use ferro_kb::schema::Schema;
//! use serde_json::json;
//!
//! let variants = vec!["p.G12D", "c.3+1_5-2del", "y.p11.1_p13.3dup"];
//! let parsed = parse_variants_parallel_ok(&variants);
//! assert_eq!(parsed.len(), 3);
//!
//! let schema = Schema::with_test_data();
//! let inputs = vec![json!({"name": "kras"}), json!({"birthYear": 1990})];
//! let _statements = build_queries_parallel(&schema, "Person", &inputs, &QueryOptions::default());
//! # }
//! # #[cfg(not(feature = "parallel"))]
//! # fn main() {}
//! ```

use rayon::prelude::*;
use serde_json::Value;

use crate::error::FerroError;
use crate::notation::{parse, VariantDescription};
use crate::query::{QueryOptions, QueryStatement, SelectionQuery};
use crate::schema::SchemaProvider;

/// Parse multiple notation strings in parallel
///
/// Returns a vector of results, one for each input string.
/// Order is preserved.
pub fn parse_variants_parallel<S: AsRef<str> + Sync>(
    variants: &[S],
) -> Vec<Result<VariantDescription, FerroError>> {
    variants.par_iter().map(|s| parse(s.as_ref())).collect()
}

/// Parse multiple notation strings in parallel, filtering errors
///
/// Returns only successfully parsed variants.
pub fn parse_variants_parallel_ok<S: AsRef<str> + Sync>(variants: &[S]) -> Vec<VariantDescription> {
    variants
        .par_iter()
        .filter_map(|s| parse(s.as_ref()).ok())
        .collect()
}

/// Build one statement per JSON filter in parallel
///
/// Order is preserved. Each statement numbers its parameters from zero.
pub fn build_queries_parallel<P: SchemaProvider + Sync + ?Sized>(
    schema: &P,
    class: &str,
    inputs: &[Value],
    options: &QueryOptions,
) -> Vec<Result<QueryStatement, FerroError>> {
    inputs
        .par_iter()
        .map(|input| SelectionQuery::parse(schema, class, input, options).map(|q| q.to_statement()))
        .collect()
}

/// Configuration for parallel batch processing
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Chunk size for parallel processing
    pub chunk_size: usize,
    /// Number of threads (0 = use rayon default)
    pub num_threads: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            num_threads: 0,
        }
    }
}

impl ParallelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn with_num_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Parse in chunks on a dedicated pool, collecting statistics
    pub fn parse_variants<S: AsRef<str> + Sync>(
        &self,
        variants: &[S],
    ) -> Result<(Vec<Result<VariantDescription, FerroError>>, ParallelStats), FerroError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()
            .map_err(|e| FerroError::usage(format!("cannot start thread pool: {}", e)))?;
        let chunk_size = self.chunk_size.max(1);
        let results: Vec<_> = pool.install(|| {
            variants
                .par_chunks(chunk_size)
                .flat_map_iter(|chunk| chunk.iter().map(|s| parse(s.as_ref())))
                .collect()
        });
        let stats = ParallelStats::from_results(&results);
        log::debug!(
            "parsed {} variants ({} errors) in chunks of {}",
            stats.total,
            stats.errors,
            chunk_size
        );
        Ok((results, stats))
    }
}

/// Statistics from parallel processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelStats {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
}

impl ParallelStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_results<T>(results: &[Result<T, FerroError>]) -> Self {
        let success = results.iter().filter(|r| r.is_ok()).count();
        Self {
            total: results.len(),
            success,
            errors: results.len() - success,
        }
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::EventSubtype;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_parse_parallel() {
        let variants = vec!["p.G12D", "c.3+1_5-2del", "e.10_12dup"];
        let results = parse_variants_parallel(&variants);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(
            results[0].as_ref().unwrap().subtype,
            EventSubtype::Substitution
        );
    }

    #[test]
    fn test_parse_parallel_ok() {
        let variants = vec!["p.G12D", "invalid variant", "g.100del"];
        let results = parse_variants_parallel_ok(&variants);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_build_queries_parallel() {
        let schema = Schema::with_test_data();
        let inputs = vec![json!({"name": "Bob"}), json!({"shoeSize": 1}), json!({})];
        let options = QueryOptions::default().with_active_only(false);
        let results = build_queries_parallel(&schema, "Person", &inputs, &options);
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().unwrap().query,
            "SELECT * FROM Person WHERE name = :param0"
        );
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().query, "SELECT * FROM Person");
    }

    #[test]
    fn test_config_parse_variants() {
        let config = ParallelConfig::new().with_chunk_size(2).with_num_threads(2);
        let variants = vec!["p.G12D", "x", "g.100del", "p.R10Kfs*10", "??"];
        let (results, stats) = config.parse_variants(&variants).unwrap();
        assert_eq!(results.len(), 5);
        assert!(results[1].is_err());
        assert_eq!(
            stats,
            ParallelStats {
                total: 5,
                success: 3,
                errors: 2
            }
        );
        assert!((stats.success_rate() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(ParallelStats::new().success_rate(), 0.0);
    }
}
