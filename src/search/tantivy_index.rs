use crate::entities::inventory::InventoryItem;
use crate::search::{require_id, SearchIndex};
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tantivy::directory::MmapDirectory;
use tantivy::schema::Value;
use tantivy::{
    collector::TopDocs,
    doc,
    query::QueryParser,
    schema::{Field, Schema, STORED, STRING, TEXT},
    Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term,
};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const WRITER_HEAP: usize = 50_000_000;
const RESULT_LIMIT: usize = 50;

#[derive(Clone, Copy)]
struct ItemFields {
    id: Field,
    code: Field,
    piece: Field,
    reference: Field,
    marque: Field,
    emplacement: Field,
}

impl ItemFields {
    fn schema() -> (Schema, Self) {
        let mut builder = Schema::builder();
        let fields = Self {
            id: builder.add_text_field("id", STRING | STORED),
            code: builder.add_text_field("code", TEXT),
            piece: builder.add_text_field("piece", TEXT),
            reference: builder.add_text_field("reference", TEXT),
            marque: builder.add_text_field("marque", TEXT),
            emplacement: builder.add_text_field("emplacement", TEXT),
        };
        (builder.build(), fields)
    }

    fn searchable(&self) -> Vec<Field> {
        vec![
            self.code,
            self.piece,
            self.reference,
            self.marque,
            self.emplacement,
        ]
    }
}

/// Full-text index over inventory items. Items are keyed by a raw `id` term so an
/// update or delete can drop the previous version.
#[derive(Clone)]
pub struct TantivyIndex {
    index: Index,
    reader: IndexReader,
    fields: ItemFields,
    writer: Arc<Mutex<IndexWriter>>,
    _temp_dir: Arc<Option<TempDir>>, // Keep TempDir alive while index is used
}

impl TantivyIndex {
    pub fn new() -> Result<Self> {
        Self::with_path(None)
    }

    /// Opens (or creates) the index under `path`, or in a throwaway directory.
    pub fn with_path(path: Option<PathBuf>) -> Result<Self> {
        let (schema, fields) = ItemFields::schema();

        let (index, temp_dir) = match path {
            Some(p) => {
                std::fs::create_dir_all(&p)?;
                let directory = MmapDirectory::open(&p)?;
                (Index::open_or_create(directory, schema)?, None)
            }
            None => {
                let dir = TempDir::new()?;
                (Index::create_in_dir(dir.path(), schema)?, Some(dir))
            }
        };

        let writer = index.writer(WRITER_HEAP)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            index,
            reader,
            fields,
            writer: Arc::new(Mutex::new(writer)),
            _temp_dir: Arc::new(temp_dir),
        })
    }

    fn to_document(&self, id: &str, item: &InventoryItem) -> TantivyDocument {
        let f = self.fields;
        doc!(
            f.id => id,
            f.code => item.code.as_str(),
            f.piece => item.piece.as_str(),
            f.reference => item.reference.as_str(),
            f.marque => item.marque.as_str(),
            f.emplacement => item.emplacement.as_str(),
        )
    }

    fn id_term(&self, id: &str) -> Term {
        Term::from_field_text(self.fields.id, id)
    }

    fn commit(&self, writer: &mut IndexWriter) -> Result<()> {
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for TantivyIndex {
    async fn index_item(&self, item: &InventoryItem) -> Result<()> {
        let id = require_id(item)?;
        let mut writer = self.writer.lock().await;
        writer.delete_term(self.id_term(id));
        writer.add_document(self.to_document(id, item))?;
        self.commit(&mut writer)
    }

    async fn remove_item(&self, id: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.delete_term(self.id_term(id));
        self.commit(&mut writer)
    }

    async fn search(&self, query: &str) -> Result<Vec<(String, f32)>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let searcher = self.reader.searcher();

        let mut query_parser = QueryParser::for_index(&self.index, self.fields.searchable());
        query_parser.set_conjunction_by_default();
        let (query, errors) = query_parser.parse_query_lenient(query);
        if !errors.is_empty() {
            debug!(?errors, "lenient query parse dropped some clauses");
        }

        let top_docs = searcher.search(query.as_ref(), &TopDocs::with_limit(RESULT_LIMIT))?;
        let mut results = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            match doc.get_first(self.fields.id).and_then(|v| v.as_str()) {
                Some(id) => results.push((id.to_string(), score)),
                None => warn!(?address, "indexed document without id"),
            }
        }
        Ok(results)
    }

    async fn rebuild(&self, items: &[InventoryItem]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.delete_all_documents()?;
        for item in items {
            let id = require_id(item)?;
            writer.add_document(self.to_document(id, item))?;
        }
        self.commit(&mut writer)
    }
}
