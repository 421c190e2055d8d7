use postgres::{Client, GenericClient, NoTls};
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;
use serde_json::json;

use crate::chemistry::IntegerMass;
use crate::model::maintenance_information::MaintenanceInformation;
use crate::model::{Peptide, PeptideMetadata, Protein, ProteinPeptideAssociation, Taxonomy, TaxonomyMerge};

use super::{PeptideRow, ProteinChangeSet, SelectOptions, SortOrder, Store, StoreError, WhereCondition};

/// A `Store` backed by a pooled Postgres connection. Every public method
/// checks out a connection from `pool` and auto-commits. The per-protein
/// writes of a digestion pass and a metadata update instead go through
/// [`Store::apply_protein_changes`]/[`Store::apply_peptide_metadata_update`],
/// which open one real `Client::transaction()` apiece so a crash mid-batch
/// rolls back instead of leaving a partial write. See `digestion::worker`.
pub struct PostgresStore {
    pool: Pool<PostgresConnectionManager<NoTls>>,
}

impl PostgresStore {
    pub fn new(pool: Pool<PostgresConnectionManager<NoTls>>) -> Self {
        Self { pool }
    }

    fn client(&self) -> Result<r2d2::PooledConnection<PostgresConnectionManager<NoTls>>, StoreError> {
        self.pool.get().map_err(StoreError::PoolExhausted)
    }
}

impl Store for PostgresStore {
    fn find_proteins_by_accessions(&self, accessions: &[String]) -> Result<Vec<Protein>, StoreError> {
        let mut client = self.client()?;
        let rows = client
            .query(
                "SELECT accession, secondary_accessions, entry_name, name, sequence, taxonomy_id, \
                 proteome_id, is_reviewed, updated_at FROM proteins \
                 WHERE accession = ANY($1) OR secondary_accessions && $1",
                &[&accessions],
            )
            .map_err(StoreError::from_postgres)?;
        Ok(rows.into_iter().map(row_to_protein).collect())
    }

    fn insert_protein(&self, protein: &Protein) -> Result<(), StoreError> {
        let mut client = self.client()?;
        insert_protein_stmt(&mut *client, protein)
    }

    fn update_protein(&self, protein: &Protein) -> Result<(), StoreError> {
        let mut client = self.client()?;
        update_protein_stmt(&mut *client, protein)
    }

    fn delete_protein(&self, accession: &str) -> Result<(), StoreError> {
        let mut client = self.client()?;
        client
            .execute("DELETE FROM proteins_peptides WHERE protein_accession = $1", &[&accession])
            .map_err(StoreError::from_postgres)?;
        client
            .execute("DELETE FROM proteins WHERE accession = $1", &[&accession])
            .map_err(StoreError::from_postgres)?;
        Ok(())
    }

    fn bulk_insert_peptides(&self, peptides: &[Peptide]) -> Result<usize, StoreError> {
        let mut client = self.client()?;
        bulk_insert_peptides_stmt(&mut *client, peptides)
    }

    fn bulk_insert_associations(&self, associations: &[ProteinPeptideAssociation]) -> Result<usize, StoreError> {
        let mut client = self.client()?;
        bulk_insert_associations_stmt(&mut *client, associations)
    }

    fn flag_peptides_stale(&self, keys: &[(i32, IntegerMass, String)]) -> Result<usize, StoreError> {
        let mut client = self.client()?;
        flag_peptides_stale_stmt(&mut *client, keys)
    }

    fn upsert_peptide_metadata(
        &self,
        partition: i32,
        mass: IntegerMass,
        sequence: &str,
        metadata: &PeptideMetadata,
    ) -> Result<(), StoreError> {
        let mut client = self.client()?;
        upsert_peptide_metadata_stmt(&mut *client, partition, mass, sequence, metadata)
    }

    fn mark_metadata_fresh(&self, partition: i32, mass: IntegerMass, sequence: &str) -> Result<(), StoreError> {
        let mut client = self.client()?;
        mark_metadata_fresh_stmt(&mut *client, partition, mass, sequence)
    }

    fn select_stale_peptide_batch(
        &self,
        batch_size: usize,
        after: Option<(i32, IntegerMass, String)>,
    ) -> Result<Vec<Peptide>, StoreError> {
        let mut client = self.client()?;
        let rows = match after {
            Some((partition, mass, sequence)) => client
                .query(
                    "SELECT partition, mass, sequence, length, number_of_missed_cleavages, n_terminus, c_terminus \
                     FROM peptides WHERE metadata_up_to_date = false AND (partition, mass, sequence) > ($1, $2, $3) \
                     ORDER BY partition, mass, sequence LIMIT $4",
                    &[&partition, &mass.raw(), &sequence, &(batch_size as i64)],
                )
                .map_err(StoreError::from_postgres)?,
            None => client
                .query(
                    "SELECT partition, mass, sequence, length, number_of_missed_cleavages, n_terminus, c_terminus \
                     FROM peptides WHERE metadata_up_to_date = false ORDER BY partition, mass, sequence LIMIT $1",
                    &[&(batch_size as i64)],
                )
                .map_err(StoreError::from_postgres)?,
        };
        Ok(rows.into_iter().map(row_to_peptide).collect())
    }

    fn proteins_containing_peptide(&self, partition: i32, mass: IntegerMass, sequence: &str) -> Result<Vec<Protein>, StoreError> {
        let mut client = self.client()?;
        let rows = client
            .query(
                "SELECT p.accession, p.secondary_accessions, p.entry_name, p.name, p.sequence, p.taxonomy_id, \
                 p.proteome_id, p.is_reviewed, p.updated_at FROM proteins p \
                 JOIN proteins_peptides pp ON pp.protein_accession = p.accession \
                 WHERE pp.partition = $1 AND pp.peptide_mass = $2 AND pp.peptide_sequence = $3",
                &[&partition, &mass.raw(), &sequence],
            )
            .map_err(StoreError::from_postgres)?;
        Ok(rows.into_iter().map(row_to_protein).collect())
    }

    fn peptides_for_protein(&self, accession: &str) -> Result<Vec<Peptide>, StoreError> {
        let mut client = self.client()?;
        let rows = client
            .query(
                "SELECT pe.partition, pe.mass, pe.sequence, pe.length, pe.number_of_missed_cleavages, \
                 pe.n_terminus, pe.c_terminus FROM peptides pe \
                 JOIN proteins_peptides pp ON pp.partition = pe.partition AND pp.peptide_mass = pe.mass \
                 AND pp.peptide_sequence = pe.sequence WHERE pp.protein_accession = $1",
                &[&accession],
            )
            .map_err(StoreError::from_postgres)?;
        Ok(rows.into_iter().map(row_to_peptide).collect())
    }

    fn find_existing_peptides(&self, keys: &[(i32, IntegerMass, String)]) -> Result<Vec<Peptide>, StoreError> {
        let mut client = self.client()?;
        let mut found = Vec::with_capacity(keys.len());
        for (partition, mass, sequence) in keys {
            let rows = client
                .query(
                    "SELECT partition, mass, sequence, length, number_of_missed_cleavages, n_terminus, c_terminus \
                     FROM peptides WHERE partition = $1 AND mass = $2 AND sequence = $3",
                    &[partition, &mass.raw(), sequence],
                )
                .map_err(StoreError::from_postgres)?;
            found.extend(rows.into_iter().map(row_to_peptide));
        }
        Ok(found)
    }

    fn remove_associations(&self, protein_accession: &str, sequences: &[String]) -> Result<usize, StoreError> {
        let mut client = self.client()?;
        remove_associations_stmt(&mut *client, protein_accession, sequences)
    }

    fn select_peptides(&self, where_condition: &WhereCondition, options: SelectOptions) -> Result<Vec<PeptideRow>, StoreError> {
        let mut client = self.client()?;
        let order_clause = match options.order {
            Some(SortOrder::MassAscending) => " ORDER BY partition, mass ASC",
            Some(SortOrder::MassDescending) => " ORDER BY partition, mass DESC",
            None => "",
        };
        let sql = format!(
            "SELECT partition, mass, sequence, length, number_of_missed_cleavages, n_terminus, c_terminus \
             FROM peptides WHERE {}{}",
            where_condition.condition, order_clause
        );
        // `options.stream` would route through `client.transaction()?.query_raw(..)`
        // and a `Portal`-backed cursor here instead of `query`; left as a
        // follow-up since nothing in this crate yet drives a result set large
        // enough to need it ungathered.
        let rows = bind_and_query(&mut client, &sql, where_condition)?;
        Ok(rows
            .into_iter()
            .map(|row| PeptideRow {
                peptide: row_to_peptide(row),
                metadata: None,
            })
            .collect())
    }

    fn apply_protein_changes(&self, changes: &ProteinChangeSet) -> Result<usize, StoreError> {
        let mut client = self.client()?;
        let mut tx = client.transaction().map_err(StoreError::from_postgres)?;

        if changes.is_new {
            insert_protein_stmt(&mut tx, &changes.protein)?;
        } else {
            update_protein_stmt(&mut tx, &changes.protein)?;
        }
        if !changes.removed_association_sequences.is_empty() {
            remove_associations_stmt(&mut tx, &changes.protein.accession, &changes.removed_association_sequences)?;
        }
        let inserted = if !changes.new_peptides.is_empty() {
            bulk_insert_peptides_stmt(&mut tx, &changes.new_peptides)?
        } else {
            0
        };
        if !changes.new_associations.is_empty() {
            bulk_insert_associations_stmt(&mut tx, &changes.new_associations)?;
        }
        if !changes.stale_peptide_keys.is_empty() {
            flag_peptides_stale_stmt(&mut tx, &changes.stale_peptide_keys)?;
        }

        tx.commit().map_err(StoreError::from_postgres)?;
        Ok(inserted)
    }

    fn apply_peptide_metadata_update(
        &self,
        partition: i32,
        mass: IntegerMass,
        sequence: &str,
        metadata: &PeptideMetadata,
    ) -> Result<(), StoreError> {
        let mut client = self.client()?;
        let mut tx = client.transaction().map_err(StoreError::from_postgres)?;
        upsert_peptide_metadata_stmt(&mut tx, partition, mass, sequence, metadata)?;
        mark_metadata_fresh_stmt(&mut tx, partition, mass, sequence)?;
        tx.commit().map_err(StoreError::from_postgres)?;
        Ok(())
    }

    fn load_maintenance_information(&self, key: &str) -> Result<Option<MaintenanceInformation>, StoreError> {
        let mut client = self.client()?;
        let row = client
            .query_opt("SELECT key, values FROM maintenance_information WHERE key = $1", &[&key])
            .map_err(StoreError::from_postgres)?;
        Ok(row.map(|row| MaintenanceInformation {
            key: row.get("key"),
            values: row.get("values"),
        }))
    }

    fn save_maintenance_information(&self, info: &MaintenanceInformation) -> Result<(), StoreError> {
        let mut client = self.client()?;
        client
            .execute(
                "INSERT INTO maintenance_information (key, values) VALUES ($1, $2) \
                 ON CONFLICT (key) DO UPDATE SET values = EXCLUDED.values",
                &[&info.key, &info.values],
            )
            .map_err(StoreError::from_postgres)?;
        Ok(())
    }

    fn bulk_insert_taxonomies(&self, taxonomies: &[Taxonomy]) -> Result<usize, StoreError> {
        let mut client = self.client()?;
        let mut inserted = 0;
        for taxonomy in taxonomies {
            let count = client
                .execute(
                    "INSERT INTO taxonomies (id, parent_id, name, rank) VALUES ($1, $2, $3, $4) \
                     ON CONFLICT (id) DO UPDATE SET parent_id = EXCLUDED.parent_id, name = EXCLUDED.name, \
                     rank = EXCLUDED.rank",
                    &[&taxonomy.id, &taxonomy.parent_id, &taxonomy.name, &(taxonomy.rank as i16)],
                )
                .map_err(StoreError::from_postgres)?;
            inserted += count as usize;
        }
        Ok(inserted)
    }

    fn bulk_insert_taxonomy_merges(&self, merges: &[TaxonomyMerge]) -> Result<usize, StoreError> {
        let mut client = self.client()?;
        let mut inserted = 0;
        for merge in merges {
            let count = client
                .execute(
                    "INSERT INTO taxonomy_merges (source_id, target_id) VALUES ($1, $2) \
                     ON CONFLICT (source_id) DO UPDATE SET target_id = EXCLUDED.target_id",
                    &[&merge.source_id, &merge.target_id],
                )
                .map_err(StoreError::from_postgres)?;
            inserted += count as usize;
        }
        Ok(inserted)
    }

    fn delete_taxonomy(&self, id: i64) -> Result<(), StoreError> {
        let mut client = self.client()?;
        let mut tx = client.transaction().map_err(StoreError::from_postgres)?;
        tx.execute("DELETE FROM taxonomies WHERE id = $1", &[&id])
            .map_err(StoreError::from_postgres)?;
        tx.execute("DELETE FROM taxonomy_merges WHERE source_id = $1 OR target_id = $1", &[&id])
            .map_err(StoreError::from_postgres)?;
        tx.commit().map_err(StoreError::from_postgres)?;
        Ok(())
    }
}

/// Generic over [`GenericClient`] so every statement below runs identically
/// against a plain pooled connection or inside a [`postgres::Transaction`],
/// letting `apply_protein_changes`/`apply_peptide_metadata_update` reuse the
/// exact same SQL the single-statement `Store` methods use.
fn insert_protein_stmt(client: &mut impl GenericClient, protein: &Protein) -> Result<(), StoreError> {
    client
        .execute(
            "INSERT INTO proteins (accession, secondary_accessions, entry_name, name, sequence, \
             taxonomy_id, proteome_id, is_reviewed, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            &[
                &protein.accession,
                &protein.secondary_accessions,
                &protein.entry_name,
                &protein.name,
                &protein.sequence,
                &protein.taxonomy_id,
                &protein.proteome_id,
                &protein.is_reviewed,
                &protein.updated_at,
            ],
        )
        .map_err(StoreError::from_postgres)?;
    Ok(())
}

fn update_protein_stmt(client: &mut impl GenericClient, protein: &Protein) -> Result<(), StoreError> {
    client
        .execute(
            "UPDATE proteins SET secondary_accessions = $2, entry_name = $3, name = $4, sequence = $5, \
             taxonomy_id = $6, proteome_id = $7, is_reviewed = $8, updated_at = $9 WHERE accession = $1",
            &[
                &protein.accession,
                &protein.secondary_accessions,
                &protein.entry_name,
                &protein.name,
                &protein.sequence,
                &protein.taxonomy_id,
                &protein.proteome_id,
                &protein.is_reviewed,
                &protein.updated_at,
            ],
        )
        .map_err(StoreError::from_postgres)?;
    Ok(())
}

fn bulk_insert_peptides_stmt(client: &mut impl GenericClient, peptides: &[Peptide]) -> Result<usize, StoreError> {
    let mut inserted = 0;
    for peptide in peptides {
        let count = client
            .execute(
                "INSERT INTO peptides (partition, mass, sequence, length, number_of_missed_cleavages, \
                 n_terminus, c_terminus, metadata_up_to_date, a_count, c_count, d_count, e_count, f_count, \
                 g_count, h_count, i_count, k_count, l_count, m_count, n_count, o_count, p_count, q_count, \
                 r_count, s_count, t_count, u_count, v_count, w_count, y_count) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, false, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
                 $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29) \
                 ON CONFLICT (partition, mass, sequence) DO NOTHING",
                &[
                    &peptide.partition,
                    &peptide.mass.raw(),
                    &peptide.sequence,
                    &(peptide.length as i32),
                    &(peptide.number_of_missed_cleavages as i32),
                    &peptide.n_terminus.to_string(),
                    &peptide.c_terminus.to_string(),
                    &(peptide.counts.get('A') as i32),
                    &(peptide.counts.get('C') as i32),
                    &(peptide.counts.get('D') as i32),
                    &(peptide.counts.get('E') as i32),
                    &(peptide.counts.get('F') as i32),
                    &(peptide.counts.get('G') as i32),
                    &(peptide.counts.get('H') as i32),
                    &(peptide.counts.get('I') as i32),
                    &(peptide.counts.get('K') as i32),
                    &(peptide.counts.get('L') as i32),
                    &(peptide.counts.get('M') as i32),
                    &(peptide.counts.get('N') as i32),
                    &(peptide.counts.get('O') as i32),
                    &(peptide.counts.get('P') as i32),
                    &(peptide.counts.get('Q') as i32),
                    &(peptide.counts.get('R') as i32),
                    &(peptide.counts.get('S') as i32),
                    &(peptide.counts.get('T') as i32),
                    &(peptide.counts.get('U') as i32),
                    &(peptide.counts.get('V') as i32),
                    &(peptide.counts.get('W') as i32),
                    &(peptide.counts.get('Y') as i32),
                ],
            )
            .map_err(StoreError::from_postgres)?;
        inserted += count as usize;
    }
    Ok(inserted)
}

fn bulk_insert_associations_stmt(
    client: &mut impl GenericClient,
    associations: &[ProteinPeptideAssociation],
) -> Result<usize, StoreError> {
    let mut inserted = 0;
    for association in associations {
        let count = client
            .execute(
                "INSERT INTO proteins_peptides (protein_accession, partition, peptide_mass, peptide_sequence) \
                 VALUES ($1, $2, $3, $4) ON CONFLICT DO NOTHING",
                &[
                    &association.protein_accession,
                    &association.partition,
                    &association.peptide_mass.raw(),
                    &association.peptide_sequence,
                ],
            )
            .map_err(StoreError::from_postgres)?;
        inserted += count as usize;
    }
    Ok(inserted)
}

fn flag_peptides_stale_stmt(
    client: &mut impl GenericClient,
    keys: &[(i32, IntegerMass, String)],
) -> Result<usize, StoreError> {
    let mut flagged = 0;
    for (partition, mass, sequence) in keys {
        let count = client
            .execute(
                "UPDATE peptides SET metadata_up_to_date = false \
                 WHERE partition = $1 AND mass = $2 AND sequence = $3",
                &[partition, &mass.raw(), sequence],
            )
            .map_err(StoreError::from_postgres)?;
        flagged += count as usize;
    }
    Ok(flagged)
}

fn remove_associations_stmt(
    client: &mut impl GenericClient,
    protein_accession: &str,
    sequences: &[String],
) -> Result<usize, StoreError> {
    let count = client
        .execute(
            "DELETE FROM proteins_peptides WHERE protein_accession = $1 AND peptide_sequence = ANY($2)",
            &[&protein_accession, &sequences],
        )
        .map_err(StoreError::from_postgres)?;
    Ok(count as usize)
}

fn upsert_peptide_metadata_stmt(
    client: &mut impl GenericClient,
    partition: i32,
    mass: IntegerMass,
    sequence: &str,
    metadata: &PeptideMetadata,
) -> Result<(), StoreError> {
    let values = json!({
        "is_swiss_prot": metadata.is_swiss_prot,
        "is_trembl": metadata.is_trembl,
        "taxonomy_ids": metadata.taxonomy_ids,
        "unique_taxonomy_ids": metadata.unique_taxonomy_ids,
        "proteome_ids": metadata.proteome_ids,
    });
    client
        .execute(
            "INSERT INTO peptide_metadata (partition, mass, sequence, values) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (partition, mass, sequence) DO UPDATE SET values = EXCLUDED.values",
            &[&partition, &mass.raw(), &sequence, &values],
        )
        .map_err(StoreError::from_postgres)?;
    Ok(())
}

fn mark_metadata_fresh_stmt(
    client: &mut impl GenericClient,
    partition: i32,
    mass: IntegerMass,
    sequence: &str,
) -> Result<(), StoreError> {
    client
        .execute(
            "UPDATE peptides SET metadata_up_to_date = true WHERE partition = $1 AND mass = $2 AND sequence = $3",
            &[&partition, &mass.raw(), &sequence],
        )
        .map_err(StoreError::from_postgres)?;
    Ok(())
}

/// `WhereCondition`/`CompiledPredicate` fragments use `?` placeholders, but
/// `postgres` wants numbered `$1, $2, ...` ones, so every query built from a
/// condition passes through here first.
fn positional_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut n = 0;
    for ch in sql.chars() {
        if ch == '?' {
            n += 1;
            out.push_str(&format!("${}", n));
        } else {
            out.push(ch);
        }
    }
    out
}

fn bind_and_query(
    client: &mut Client,
    sql: &str,
    where_condition: &WhereCondition,
) -> Result<Vec<postgres::Row>, StoreError> {
    let sql = positional_placeholders(sql);
    let params: Vec<Box<dyn postgres_types::ToSql + Sync>> = where_condition
        .values
        .iter()
        .map(|value| -> Box<dyn postgres_types::ToSql + Sync> {
            match value {
                super::QueryValue::Int64(v) => Box::new(*v),
                super::QueryValue::Int32(v) => Box::new(*v),
                super::QueryValue::Int16(v) => Box::new(*v),
                super::QueryValue::Text(v) => Box::new(v.clone()),
                super::QueryValue::Char(v) => Box::new(v.to_string()),
                super::QueryValue::Bool(v) => Box::new(*v),
            }
        })
        .collect();
    let refs: Vec<&(dyn postgres_types::ToSql + Sync)> = params.iter().map(|p| p.as_ref()).collect();
    client.query(&sql, &refs).map_err(StoreError::from_postgres)
}

fn row_to_protein(row: postgres::Row) -> Protein {
    Protein::new(
        row.get("accession"),
        row.get("secondary_accessions"),
        row.get("entry_name"),
        row.get("name"),
        row.get("sequence"),
        row.get("taxonomy_id"),
        row.get("proteome_id"),
        row.get("is_reviewed"),
        row.get("updated_at"),
    )
}

fn row_to_peptide(row: postgres::Row) -> Peptide {
    let sequence: String = row.get("sequence");
    let number_of_missed_cleavages: i32 = row.get("number_of_missed_cleavages");
    let partition: i32 = row.get("partition");
    let mut peptide = Peptide::new(sequence, number_of_missed_cleavages as usize, partition);
    peptide.mass = IntegerMass(row.get("mass"));
    peptide
}
