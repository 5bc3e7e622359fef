//! The PostgreSQL-backed [`NodeStore`] implementation. Every read goes
//! through the shared pool; every write to a composition happens inside
//! a single transaction covering the composition row and its relation
//! rows, so a reader never observes a composition with a partial child
//! list.

use std::collections::HashMap;

use postgres::Transaction;
use substrate_core::cache::DedupCache;
use substrate_core::hash::{hash_composition, hash_constant, ContentHash};
use substrate_core::node::{
    seed_type_from_row, CompositionGeometry, GeometryRule, NodeHandle, NodeId, NodeRef,
};
use substrate_core::projector::project_with_hilbert;
use substrate_core::seed::{Seed, SeedType};
use substrate_core::store::{ChildRun, NodeStore, ReconstructStep};
use substrate_core::{Result, SubstrateError};

use crate::ewkb::{encode_linestring_zm, encode_point_zm};
use crate::pool::Pool;

/// Number of entries each of the dedup cache's 32 shards can hold.
/// A cold cache simply costs one extra round trip per miss; this is a
/// performance tuning, not a correctness knob.
const DEFAULT_CACHE_CAPACITY_PER_SHARD: usize = 4096;

/// A [`NodeStore`] backed by a pooled `postgres::Client`.
pub struct PostgresStore {
    pool: Pool,
    cache: DedupCache,
}

impl PostgresStore {
    /// Builds a store over an already-constructed pool, with the default
    /// dedup cache sizing.
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            cache: DedupCache::with_capacity(DEFAULT_CACHE_CAPACITY_PER_SHARD),
        }
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<r2d2_postgres::PostgresConnectionManager<postgres::NoTls>>> {
        self.pool.get().map_err(crate::error::from_pool_error)
    }

    /// Streams a batch of constant rows through the binary `COPY`
    /// protocol (spec §4.7/§6). This is the bulk ingestor's primary
    /// write path — a single sequential stream per call, no per-row
    /// round trip. Returns the number of rows the server reports
    /// copied.
    pub fn copy_in_constants(&self, rows: &[crate::copy_writer::ConstantRow]) -> Result<u64> {
        let mut conn = self.conn()?;
        let mut writer = conn
            .copy_in(
                "COPY constant (seed_value, seed_type, content_hash, hilbert_high, hilbert_low, geom) FROM STDIN BINARY",
            )
            .map_err(crate::error::from_postgres_error)?;

        crate::copy_writer::write_header(&mut writer)
            .map_err(|e| SubstrateError::StoreIo(e.to_string()))?;
        for row in rows {
            crate::copy_writer::write_constant_row(&mut writer, row)
                .map_err(|e| SubstrateError::StoreIo(e.to_string()))?;
        }
        crate::copy_writer::write_trailer(&mut writer)
            .map_err(|e| SubstrateError::StoreIo(e.to_string()))?;

        writer.finish().map_err(crate::error::from_postgres_error)
    }
}

impl NodeStore for PostgresStore {
    fn get_or_insert_constant(&self, seed: Seed) -> Result<NodeHandle> {
        let content_hash = hash_constant(&seed);

        if let Some(node) = self.cache.get(&content_hash) {
            let (position, _) = project_with_hilbert(&seed);
            return Ok(NodeHandle {
                node,
                content_hash,
                position,
            });
        }

        let (position, (hilbert_high, hilbert_low)) = project_with_hilbert(&seed);
        let mut conn = self.conn()?;

        let geom = encode_point_zm(&position);
        let row = conn
            .query_opt(
                "INSERT INTO constant (seed_value, seed_type, content_hash, hilbert_high, hilbert_low, geom)
                 VALUES ($1, $2, $3, $4, $5, ST_GeomFromEWKB($6))
                 ON CONFLICT (content_hash) DO NOTHING
                 RETURNING id",
                &[
                    &(seed.seed_value() as i64),
                    &i32::from(seed.seed_type() as u8),
                    &content_hash.as_bytes().as_slice(),
                    &(hilbert_high as i64),
                    &(hilbert_low as i64),
                    &geom.as_slice(),
                ],
            )
            .map_err(crate::error::from_postgres_error)?;

        let id: i64 = match row {
            Some(row) => row.get(0),
            None => {
                tracing::debug!(hash = %content_hash, "constant insert lost race, reading back id");
                conn.query_one(
                    "SELECT id FROM constant WHERE content_hash = $1",
                    &[&content_hash.as_bytes().as_slice()],
                )
                .map_err(crate::error::from_postgres_error)?
                .get(0)
            }
        };

        let node = NodeRef::Constant(id);
        self.cache.insert(content_hash, node);
        Ok(NodeHandle {
            node,
            content_hash,
            position,
        })
    }

    fn get_or_insert_composition(
        &self,
        children: &[ChildRun],
        type_ref: Option<NodeId>,
        geometry: CompositionGeometry,
    ) -> Result<NodeHandle> {
        let hash_runs: Vec<_> = children.iter().map(ChildRun::as_hash_run).collect();
        let content_hash = hash_composition(&hash_runs);

        if let Some(node) = self.cache.get(&content_hash) {
            return Ok(NodeHandle {
                node,
                content_hash,
                position: geometry.indexing_point(),
            });
        }

        let position = geometry.indexing_point();
        let (hilbert_high, hilbert_low) =
            substrate_core::hilbert::hilbert_of_point([position.x, position.y, position.z, position.m]);

        let mut conn = self.conn()?;
        let mut tx = conn.transaction().map_err(crate::error::from_postgres_error)?;

        let id = insert_composition(
            &mut tx,
            &content_hash,
            hilbert_high,
            hilbert_low,
            &geometry,
            type_ref,
            children,
        )?;

        tx.commit().map_err(crate::error::from_postgres_error)?;

        let node = NodeRef::Composition(id);
        self.cache.insert(content_hash, node);
        Ok(NodeHandle {
            node,
            content_hash,
            position,
        })
    }

    fn lookup_by_hash_batch(&self, hashes: &[ContentHash]) -> Result<HashMap<ContentHash, NodeId>> {
        if hashes.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.conn()?;
        let hash_bytes: Vec<&[u8]> = hashes.iter().map(ContentHash::as_bytes).collect();
        let mut out = HashMap::with_capacity(hashes.len());

        for row in conn
            .query(
                "SELECT content_hash, id FROM constant WHERE content_hash = ANY($1)",
                &[&hash_bytes],
            )
            .map_err(crate::error::from_postgres_error)?
        {
            let hash: &[u8] = row.get(0);
            out.insert(ContentHash::from_bytes(hash.try_into().unwrap()), row.get(1));
        }
        for row in conn
            .query(
                "SELECT content_hash, id FROM composition WHERE content_hash = ANY($1)",
                &[&hash_bytes],
            )
            .map_err(crate::error::from_postgres_error)?
        {
            let hash: &[u8] = row.get(0);
            out.insert(ContentHash::from_bytes(hash.try_into().unwrap()), row.get(1));
        }
        Ok(out)
    }

    fn constant_seed(&self, id: NodeId) -> Result<Seed> {
        let mut conn = self.conn()?;
        let row = conn
            .query_opt(
                "SELECT seed_type, seed_value FROM constant WHERE id = $1",
                &[&id],
            )
            .map_err(crate::error::from_postgres_error)?
            .ok_or_else(|| SubstrateError::dangling(id))?;

        let tag: i32 = row.get(0);
        let value: i64 = row.get(1);
        let seed_type = seed_type_from_row(tag)
            .ok_or_else(|| SubstrateError::Invariant(format!("unknown seed_type tag {tag}")))?;
        Seed::from_parts(seed_type, value as u64)
    }

    fn composition_children(&self, id: NodeId) -> Result<Vec<ReconstructStep>> {
        let mut conn = self.conn()?;
        let rows = conn
            .query(
                "SELECT child_constant_id, child_composition_id, multiplicity
                 FROM relation WHERE composition_id = $1 ORDER BY position",
                &[&id],
            )
            .map_err(crate::error::from_postgres_error)?;

        if rows.is_empty() {
            let exists = conn
                .query_opt("SELECT 1 FROM composition WHERE id = $1", &[&id])
                .map_err(crate::error::from_postgres_error)?;
            if exists.is_none() {
                return Err(SubstrateError::dangling(id));
            }
        }

        rows.into_iter()
            .map(|row| {
                let constant_id: Option<i64> = row.get(0);
                let composition_id: Option<i64> = row.get(1);
                let multiplicity: i32 = row.get(2);
                let child = match (constant_id, composition_id) {
                    (Some(cid), None) => NodeRef::Constant(cid),
                    (None, Some(cid)) => NodeRef::Composition(cid),
                    _ => {
                        return Err(SubstrateError::Invariant(format!(
                            "relation row for composition {id} has ambiguous child"
                        )))
                    }
                };
                Ok(ReconstructStep {
                    child,
                    multiplicity: multiplicity as u32,
                })
            })
            .collect()
    }

    fn find_compositions_containing_pattern(&self, pattern: &str) -> Result<Vec<NodeId>> {
        let mut conn = self.conn()?;
        let like = format!("%{}%", pattern.replace('%', "\\%").replace('_', "\\_"));
        let rows = conn
            .query(
                "SELECT composition_id FROM composition_pattern WHERE snippet ILIKE $1 ESCAPE '\\'",
                &[&like],
            )
            .map_err(crate::error::from_postgres_error)?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    fn pattern_usage_stats(&self, top_n: usize) -> Result<Vec<(NodeId, u64)>> {
        let mut conn = self.conn()?;
        let rows = conn
            .query(
                "SELECT child_composition_id, COUNT(*) AS uses
                 FROM relation
                 WHERE child_composition_id IS NOT NULL
                 GROUP BY child_composition_id
                 ORDER BY uses DESC
                 LIMIT $1",
                &[&(top_n as i64)],
            )
            .map_err(crate::error::from_postgres_error)?;
        Ok(rows
            .iter()
            .map(|row| {
                let id: i64 = row.get(0);
                let count: i64 = row.get(1);
                (id, count as u64)
            })
            .collect())
    }
}

/// Cap on an indexed `composition_pattern` snippet. Longer spans aren't
/// worth indexing directly per the migration's comment — they're found
/// by walking up from a matching short pattern's referencing relations.
const MAX_PATTERN_SNIPPET_LEN: usize = 64;

fn insert_composition(
    tx: &mut Transaction<'_>,
    content_hash: &ContentHash,
    hilbert_high: u64,
    hilbert_low: u64,
    geometry: &CompositionGeometry,
    type_ref: Option<NodeId>,
    children: &[ChildRun],
) -> Result<NodeId> {
    let (geom_bytes, rule): (Vec<u8>, GeometryRule) = match geometry {
        CompositionGeometry::Point(p) => (encode_point_zm(p).to_vec(), GeometryRule::Centroid),
        CompositionGeometry::Trajectory(points) => {
            (encode_linestring_zm(points), GeometryRule::Trajectory)
        }
    };

    let row = tx
        .query_opt(
            "INSERT INTO composition (content_hash, hilbert_high, hilbert_low, geom, geometry_rule, type_id)
             VALUES ($1, $2, $3, ST_GeomFromEWKB($4), $5, $6)
             ON CONFLICT (content_hash) DO NOTHING
             RETURNING id",
            &[
                &content_hash.as_bytes().as_slice(),
                &(hilbert_high as i64),
                &(hilbert_low as i64),
                &geom_bytes.as_slice(),
                &(rule as i16),
                &type_ref,
            ],
        )
        .map_err(crate::error::from_postgres_error)?;

    let id: NodeId = match row {
        Some(row) => row.get(0),
        None => {
            // Lost the race: a concurrent transaction already committed
            // this content hash, along with its relation rows and
            // pattern snippet — nothing left for us to do but read the
            // id back.
            tracing::debug!(hash = %content_hash, "composition insert lost race, reading back id");
            return Ok(tx
                .query_one(
                    "SELECT id FROM composition WHERE content_hash = $1",
                    &[&content_hash.as_bytes().as_slice()],
                )
                .map_err(crate::error::from_postgres_error)?
                .get(0));
        }
    };

    for (position, run) in children.iter().enumerate() {
        let (constant_id, composition_id) = match run.child {
            NodeRef::Constant(cid) => (Some(cid), None),
            NodeRef::Composition(cid) => (None, Some(cid)),
        };
        tx.execute(
            "INSERT INTO relation (composition_id, position, child_constant_id, child_composition_id, multiplicity)
             VALUES ($1, $2, $3, $4, $5)",
            &[
                &id,
                &(position as i32),
                &constant_id,
                &composition_id,
                &(run.multiplicity as i32),
            ],
        )
        .map_err(crate::error::from_postgres_error)?;
    }

    if let Some(snippet) = build_pattern_snippet(tx, children)? {
        tx.execute(
            "INSERT INTO composition_pattern (composition_id, snippet) VALUES ($1, $2)",
            &[&id, &snippet],
        )
        .map_err(crate::error::from_postgres_error)?;
    }

    Ok(id)
}

/// Reconstructs a short text snippet for `children` for
/// `composition_pattern`, or `None` if any child isn't text (not a
/// `UnicodeCodepoint` constant and not itself a recorded pattern) or the
/// snippet would exceed [`MAX_PATTERN_SNIPPET_LEN`].
fn build_pattern_snippet(tx: &mut Transaction<'_>, children: &[ChildRun]) -> Result<Option<String>> {
    let mut snippet = String::new();
    for run in children {
        let Some(fragment) = resolve_snippet_fragment(tx, run.child)? else {
            return Ok(None);
        };
        for _ in 0..run.multiplicity {
            snippet.push_str(&fragment);
            if snippet.len() > MAX_PATTERN_SNIPPET_LEN {
                return Ok(None);
            }
        }
    }
    Ok(Some(snippet))
}

fn resolve_snippet_fragment(tx: &mut Transaction<'_>, child: NodeRef) -> Result<Option<String>> {
    match child {
        NodeRef::Constant(id) => {
            let row = tx
                .query_one("SELECT seed_type, seed_value FROM constant WHERE id = $1", &[&id])
                .map_err(crate::error::from_postgres_error)?;
            let tag: i32 = row.get(0);
            let value: i64 = row.get(1);
            if seed_type_from_row(tag) != Some(SeedType::UnicodeCodepoint) {
                return Ok(None);
            }
            Ok(char::from_u32(value as u32).map(String::from))
        }
        NodeRef::Composition(id) => {
            let row = tx
                .query_opt("SELECT snippet FROM composition_pattern WHERE composition_id = $1", &[&id])
                .map_err(crate::error::from_postgres_error)?;
            Ok(row.map(|r| r.get(0)))
        }
    }
}
