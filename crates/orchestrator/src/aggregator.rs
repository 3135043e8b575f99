//! Report buckets filled by the single result consumer

use serde::Serialize;

use subsnipe_common::Bucket;

use crate::classifier::Classified;

/// The four ordered report buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Buckets {
    pub exploitable: Vec<String>,
    pub not_exploitable: Vec<String>,
    pub unknown: Vec<String>,
    pub no_record: Vec<String>,
}

impl Buckets {
    pub fn get(&self, bucket: Bucket) -> &[String] {
        match bucket {
            Bucket::Exploitable => &self.exploitable,
            Bucket::NotExploitable => &self.not_exploitable,
            Bucket::Unknown => &self.unknown,
            Bucket::NoRecord => &self.no_record,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut Vec<String> {
        match bucket {
            Bucket::Exploitable => &mut self.exploitable,
            Bucket::NotExploitable => &mut self.not_exploitable,
            Bucket::Unknown => &mut self.unknown,
            Bucket::NoRecord => &mut self.no_record,
        }
    }

    /// Number of lines across all buckets.
    pub fn total(&self) -> usize {
        Bucket::ALL.iter().map(|b| self.get(*b).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Non-empty buckets in report order. `NoRecord` is included only on request.
    pub fn sections(&self, include_no_record: bool) -> impl Iterator<Item = (Bucket, &[String])> + '_ {
        Bucket::ALL
            .into_iter()
            .filter(move |b| include_no_record || *b != Bucket::NoRecord)
            .map(move |b| (b, self.get(b)))
            .filter(|(_, lines)| !lines.is_empty())
    }
}

/// Owns the buckets while the pipeline runs. Only the consumer task holds it,
/// so recording needs no lock.
#[derive(Debug, Default)]
pub struct Aggregator {
    buckets: Buckets,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, classified: Classified) {
        let bucket = classified.bucket();
        self.buckets.get_mut(bucket).push(classified.line());
    }

    pub fn recorded(&self) -> usize {
        self.buckets.total()
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn into_buckets(self) -> Buckets {
        self.buckets
    }
}
