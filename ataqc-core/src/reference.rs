use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};

use crate::errors::AtaqcError;
use crate::utils::{get_dynamic_reader, natural_cmp};

pub const DEFAULT_MITOCHONDRIAL_REFERENCE: &str = "chrM";

/// Autosome counts of the organisms known without an autosomal reference file.
const DEFAULT_AUTOSOME_COUNTS: [(&str, u32); 3] = [("human", 22), ("mouse", 19), ("rat", 20)];

///
/// Which reference sequences of an organism's genome count as autosomal, and
/// which one is mitochondrial.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceGenome {
    pub organism: String,
    pub mitochondrial: String,
    autosomal: FxHashSet<String>,
}

impl ReferenceGenome {
    ///
    /// Create a reference genome configuration from the built-in defaults.
    /// Known organisms list each autosome both as `N` and `chrN`; any other
    /// organism starts without autosomes.
    ///
    pub fn new(organism: &str, mitochondrial: &str) -> Self {
        let mut autosomal = FxHashSet::default();

        if let Some((_, count)) = DEFAULT_AUTOSOME_COUNTS
            .iter()
            .find(|(name, _)| *name == organism)
        {
            for i in 1..=*count {
                autosomal.insert(i.to_string());
                autosomal.insert(format!("chr{}", i));
            }
        }

        ReferenceGenome {
            organism: organism.to_string(),
            mitochondrial: mitochondrial.to_string(),
            autosomal,
        }
    }

    ///
    /// Replace the autosomal references with the names read from a file,
    /// whitespace separated (usually one per line). The file may be gzip'd.
    ///
    pub fn with_autosomal_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, AtaqcError> {
        let path = path.as_ref();
        let reader = get_dynamic_reader(path).map_err(|err| AtaqcError::FileReadError {
            path: path.display().to_string(),
            reason: format!("{:#}", err),
        })?;

        self.autosomal.clear();
        for line in reader.lines() {
            let line = line?;
            self.autosomal
                .extend(line.split_whitespace().map(str::to_string));
        }

        log::info!(
            "Read {} autosomal references for {} from {}",
            self.autosomal.len(),
            self.organism,
            path.display()
        );
        log::debug!(
            "Autosomal references: {}",
            self.autosomal_references().join(", ")
        );

        Ok(self)
    }

    pub fn is_autosomal(&self, reference: &str) -> bool {
        self.autosomal.contains(reference)
    }

    pub fn is_mitochondrial(&self, reference: &str) -> bool {
        self.mitochondrial == reference
    }

    /// The autosomal reference names in natural order.
    pub fn autosomal_references(&self) -> Vec<&str> {
        let mut references: Vec<&str> = self.autosomal.iter().map(String::as_str).collect();
        references.sort_by(|a, b| natural_cmp(a, b));
        references
    }

    pub fn kind(&self, reference: &str) -> ReferenceKind {
        if self.is_autosomal(reference) {
            ReferenceKind::Autosomal
        } else if self.is_mitochondrial(reference) {
            ReferenceKind::Mitochondrial
        } else {
            ReferenceKind::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Autosomal,
    Mitochondrial,
    Other,
}

///
/// Memoized reference classification. Each read-group aggregator owns one, so
/// lookups on the hot path never touch shared state.
///
#[derive(Debug, Clone)]
pub struct ReferenceCache {
    genome: Arc<ReferenceGenome>,
    cache: FxHashMap<String, ReferenceKind>,
}

impl ReferenceCache {
    pub fn new(genome: Arc<ReferenceGenome>) -> Self {
        ReferenceCache {
            genome,
            cache: FxHashMap::default(),
        }
    }

    pub fn genome(&self) -> &ReferenceGenome {
        &self.genome
    }

    pub fn kind(&mut self, reference: &str) -> ReferenceKind {
        if let Some(kind) = self.cache.get(reference) {
            return *kind;
        }
        let kind = self.genome.kind(reference);
        self.cache.insert(reference.to_string(), kind);
        kind
    }

    pub fn is_autosomal(&mut self, reference: &str) -> bool {
        self.kind(reference) == ReferenceKind::Autosomal
    }

    pub fn is_mitochondrial(&mut self, reference: &str) -> bool {
        self.kind(reference) == ReferenceKind::Mitochondrial
    }

    /// Number of distinct reference names looked up so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
