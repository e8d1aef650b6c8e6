use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::path::{Path, PathBuf};

use tantivy::collector::{Count, TopDocs};
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, RangeQuery, RegexQuery, TermQuery};
use tantivy::schema::*;
use tantivy::tokenizer::{TextAnalyzer, WhitespaceTokenizer};
use tantivy::{
    DocAddress, DocId, Index, IndexWriter, ReloadPolicy, Score, Searcher, index::SegmentId,
    SegmentReader, TantivyDocument, doc,
};
use tracing::{info, warn};

use crate::model::types::{IndexResult, QueryKeyword};
use crate::search::engine::{IndexEngine, Match};
use crate::search::error::{Result, SearchError};
use crate::search::query::{QuerySpec, SortOrder};

pub const KEY_FIELD: &str = "id";
pub const SCORE_FIELD: &str = "s";
pub const KEYWORDS_FIELD: &str = "ks";

/// Keywords are split on whitespace only and kept verbatim.
const KEYWORD_TOKENIZER: &str = "keywords";

pub const DEFAULT_WRITER_MEMORY: usize = 50_000_000;

#[derive(Clone, Copy)]
pub struct Fields {
    pub key: Field,
    pub score: Field,
    pub keywords: Field,
}

/// Position of a match in a ranked result list.
///
/// Ordered so that a match that ranks earlier compares greater. Tokens from
/// different sort orders are incomparable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankCursor {
    rank: Rank,
    address: DocAddress,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Rank {
    Relevance(Score),
    Ascending(i64),
    Descending(i64),
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Rank::Relevance(a), Rank::Relevance(b)) => a.partial_cmp(b),
            (Rank::Descending(a), Rank::Descending(b)) => Some(a.cmp(b)),
            (Rank::Ascending(a), Rank::Ascending(b)) => Some(b.cmp(a)),
            _ => None,
        }
    }
}

impl PartialOrd for RankCursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.rank.partial_cmp(&other.rank)? {
            // Ties go to index order: lower address ranks first.
            Ordering::Equal => Some(other.address.cmp(&self.address)),
            ord => Some(ord),
        }
    }
}

impl RankCursor {
    fn ranks_after(&self, other: &RankCursor) -> bool {
        matches!(self.partial_cmp(other), Some(Ordering::Less))
    }
}

/// Tantivy-backed engine for one keyed, scored keyword index.
pub struct TantivyEngine {
    path: PathBuf,
    index: Index,
    fields: Fields,
    writer_memory: usize,
}

impl TantivyEngine {
    /// Open the index at `path`, creating and committing an empty one first
    /// if the directory holds none.
    pub fn open_or_create(path: &Path, writer_memory: usize) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let open_err = |source| SearchError::Open {
            path: path.to_path_buf(),
            source,
        };
        let existed = path.join("meta.json").exists();
        let index = if existed {
            Index::open_in_dir(path).map_err(open_err)?
        } else {
            Index::create_in_dir(path, build_schema()).map_err(open_err)?
        };
        register_tokenizer(&index);
        let fields = fields_from_schema(&index.schema())?;

        let engine = Self {
            path: path.to_path_buf(),
            index,
            fields,
            writer_memory,
        };
        if !existed {
            let mut writer = engine.writer()?;
            writer.commit().map_err(SearchError::Write)?;
            release_writer(writer);
            info!(path = %path.display(), "created empty index");
        }
        Ok(engine)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Translate a query description into a tantivy query.
    pub fn compile(&self, spec: &QuerySpec) -> Result<Box<dyn Query>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        if spec.has_range() {
            let lower = spec
                .begin
                .as_deref()
                .map(|b| Included(Term::from_field_text(self.fields.keywords, b)))
                .unwrap_or(Unbounded);
            let upper = spec
                .end
                .as_deref()
                .map(|e| Excluded(Term::from_field_text(self.fields.keywords, e)))
                .unwrap_or(Unbounded);
            clauses.push((Occur::Must, Box::new(RangeQuery::new(lower, upper))));
        }

        for keyword in &spec.keywords {
            let clause: Box<dyn Query> = match keyword {
                QueryKeyword::EntryPrefix(prefix) => {
                    let pattern = format!("{}.*", regex::escape(prefix));
                    let query = RegexQuery::from_pattern(&pattern, self.fields.key).map_err(|e| {
                        SearchError::InvalidArgument(format!("bad key prefix {prefix:?}: {e}"))
                    })?;
                    Box::new(query)
                }
                QueryKeyword::KeywordAll(value) => Box::new(TermQuery::new(
                    Term::from_field_text(self.fields.keywords, value),
                    IndexRecordOption::WithFreqs,
                )),
            };
            clauses.push((Occur::Must, clause));
        }

        Ok(match clauses.len() {
            0 => Box::new(AllQuery),
            1 => clauses.remove(0).1,
            _ => Box::new(BooleanQuery::new(clauses)),
        })
    }

    fn writer(&self) -> Result<IndexWriter> {
        self.index
            .writer(self.writer_memory)
            .map_err(SearchError::Write)
    }
}

impl IndexEngine for TantivyEngine {
    type Handle = Searcher;
    type Query = Box<dyn Query>;
    type DocRef = DocAddress;
    type Token = RankCursor;

    fn open(&self) -> Result<Searcher> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|source| SearchError::Open {
                path: self.path.clone(),
                source,
            })?;
        Ok(reader.searcher())
    }

    fn count(&self, handle: &Searcher, query: &Box<dyn Query>) -> Result<u64> {
        let count = handle.search(query, &Count).map_err(SearchError::Read)?;
        Ok(count as u64)
    }

    fn search_after(
        &self,
        handle: &Searcher,
        after: Option<&RankCursor>,
        query: &Box<dyn Query>,
        limit: usize,
        sort: Option<SortOrder>,
    ) -> Result<Vec<Match<DocAddress, RankCursor>>> {
        // TopDocs preallocates `limit` slots.
        let limit = usize::try_from(handle.num_docs()).map_or(limit, |docs| limit.min(docs));
        if limit == 0 {
            return Ok(Vec::new());
        }
        let segment_ords: HashMap<SegmentId, u32> = handle
            .segment_readers()
            .iter()
            .enumerate()
            .map(|(ord, reader)| (reader.segment_id(), ord as u32))
            .collect();
        let after = after.copied();

        // Matches at or before `after` get `None`, which ranks below every
        // `Some`, so the top `limit` are exactly the next `limit` matches.
        let collector = TopDocs::with_limit(limit).tweak_score(
            move |segment_reader: &SegmentReader| {
                let segment_ord = segment_ords
                    .get(&segment_reader.segment_id())
                    .copied()
                    .unwrap_or_default();
                // The schema declares the score field FAST, so this only
                // fails for an index written by something else.
                let scores = segment_reader.fast_fields().i64(SCORE_FIELD).ok();
                move |doc: DocId, relevance: Score| {
                    let stored = || {
                        scores
                            .as_ref()
                            .and_then(|column| column.first(doc))
                            .unwrap_or(0)
                    };
                    let rank = match sort {
                        None => Rank::Relevance(relevance),
                        Some(SortOrder::ScoreAscending) => Rank::Ascending(stored()),
                        Some(SortOrder::ScoreDescending) => Rank::Descending(stored()),
                    };
                    let cursor = RankCursor {
                        rank,
                        address: DocAddress::new(segment_ord, doc),
                    };
                    match after {
                        Some(after) if !cursor.ranks_after(&after) => None,
                        _ => Some(cursor),
                    }
                }
            },
        );

        let top = handle.search(query, &collector).map_err(SearchError::Read)?;
        Ok(top
            .into_iter()
            .filter_map(|(cursor, address)| {
                cursor.map(|token| Match {
                    doc: address,
                    token,
                })
            })
            .collect())
    }

    fn fetch_document(
        &self,
        handle: &Searcher,
        address: &DocAddress,
    ) -> Result<Option<IndexResult>> {
        let doc: TantivyDocument = handle.doc(*address).map_err(SearchError::Read)?;
        let Some(key) = doc.get_first(self.fields.key).and_then(|v| v.as_str()) else {
            return Ok(None);
        };
        let score = doc
            .get_first(self.fields.score)
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        Ok(Some(IndexResult::new(key, score)))
    }

    fn write_upsert(&self, key: &str, score: i64, keywords: &str) -> Result<()> {
        let mut writer = self.writer()?;
        writer.delete_term(Term::from_field_text(self.fields.key, key));
        writer
            .add_document(doc!(
                self.fields.key => key,
                self.fields.score => score,
                self.fields.keywords => keywords,
            ))
            .map_err(SearchError::Write)?;
        writer.commit().map_err(SearchError::Write)?;
        release_writer(writer);
        Ok(())
    }

    fn write_delete(&self, key: &str) -> Result<()> {
        let mut writer = self.writer()?;
        writer.delete_term(Term::from_field_text(self.fields.key, key));
        writer.commit().map_err(SearchError::Write)?;
        release_writer(writer);
        Ok(())
    }
}

/// Wait for merges and drop the writer, which frees the directory lock.
///
/// Early returns on a failed write drop the writer without waiting; its lock
/// is released all the same.
fn release_writer(writer: IndexWriter) {
    if let Err(err) = writer.wait_merging_threads() {
        warn!(error = %err, "index writer did not shut down cleanly; ignoring");
    }
}

pub fn build_schema() -> Schema {
    let mut schema_builder = Schema::builder();
    schema_builder.add_text_field(KEY_FIELD, STRING | STORED);
    schema_builder.add_i64_field(SCORE_FIELD, INDEXED | STORED | FAST);
    let keyword_indexing = TextFieldIndexing::default()
        .set_tokenizer(KEYWORD_TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqs);
    schema_builder.add_text_field(
        KEYWORDS_FIELD,
        TextOptions::default()
            .set_indexing_options(keyword_indexing)
            .set_stored(),
    );
    schema_builder.build()
}

fn register_tokenizer(index: &Index) {
    let analyzer = TextAnalyzer::builder(WhitespaceTokenizer::default()).build();
    index.tokenizers().register(KEYWORD_TOKENIZER, analyzer);
}

pub fn fields_from_schema(schema: &Schema) -> Result<Fields> {
    let field = |name: &str| {
        schema.get_field(name).map_err(|_| {
            SearchError::InvalidArgument(format!("index schema is missing field {name}"))
        })
    };
    Ok(Fields {
        key: field(KEY_FIELD)?,
        score: field(SCORE_FIELD)?,
        keywords: field(KEYWORDS_FIELD)?,
    })
}
