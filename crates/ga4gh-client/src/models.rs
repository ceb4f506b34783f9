//! GA4GH record models returned by the search endpoints.
//!
//! Only the fields needed to identify and describe a record are typed. Unknown
//! fields are ignored and every field tolerates being absent, since servers
//! differ in which optional fields they emit.

use std::collections::BTreeMap;
use std::fmt;

use paging_verify::ItemIdentity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Position on a reference sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Position {
    pub reference_name: String,
    pub position: i64,
    /// `POS_STRAND` or `NEG_STRAND`.
    pub strand: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CigarUnit {
    pub operation: String,
    pub operation_length: i64,
    pub reference_sequence: Option<String>,
}

/// Where a read aligns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinearAlignment {
    pub position: Position,
    pub mapping_quality: Option<i32>,
    pub cigar: Vec<CigarUnit>,
}

/// One read alignment from `reads/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadAlignment {
    pub id: Option<String>,
    pub read_group_id: String,
    pub fragment_id: Option<String>,
    pub fragment_name: String,
    pub proper_placement: Option<bool>,
    pub duplicate_fragment: Option<bool>,
    pub number_reads: Option<i32>,
    pub fragment_length: Option<i64>,
    pub read_number: Option<i32>,
    pub failed_vendor_quality_checks: Option<bool>,
    pub alignment: Option<LinearAlignment>,
    pub secondary_alignment: Option<bool>,
    pub supplementary_alignment: Option<bool>,
    pub aligned_sequence: Option<String>,
    pub aligned_quality: Vec<i32>,
    pub next_mate_position: Option<Position>,
    pub info: BTreeMap<String, Value>,
}

/// Identity of a read alignment.
///
/// `id` is optional in the read schema, so the structural fields that tell two
/// alignments of a read group apart are part of the key as well.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReadKey {
    pub id: Option<String>,
    pub read_group_id: String,
    pub fragment_name: String,
    pub read_number: Option<i32>,
    /// Reference name, position and strand of the alignment.
    pub alignment: Option<(String, i64, String)>,
    pub secondary_alignment: bool,
    pub supplementary_alignment: bool,
}

impl fmt::Display for ReadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = &self.id {
            write!(f, "{id} ")?;
        }
        write!(f, "[{}] {}", self.read_group_id, self.fragment_name)?;
        if let Some(number) = self.read_number {
            write!(f, "/{number}")?;
        }
        match &self.alignment {
            Some((reference, position, strand)) => {
                write!(f, " @ {reference}:{position}")?;
                match strand.as_str() {
                    "POS_STRAND" => write!(f, "+")?,
                    "NEG_STRAND" => write!(f, "-")?,
                    _ => {}
                }
            }
            None => write!(f, " unmapped")?,
        }
        if self.secondary_alignment {
            write!(f, " secondary")?;
        }
        if self.supplementary_alignment {
            write!(f, " supplementary")?;
        }
        Ok(())
    }
}

impl ItemIdentity for ReadAlignment {
    type Key = ReadKey;

    fn identity(&self) -> ReadKey {
        ReadKey {
            id: self.id.clone().filter(|id| !id.is_empty()),
            read_group_id: self.read_group_id.clone(),
            fragment_name: self.fragment_name.clone(),
            read_number: self.read_number,
            alignment: self.alignment.as_ref().map(|a| {
                (
                    a.position.reference_name.clone(),
                    a.position.position,
                    a.position.strand.clone(),
                )
            }),
            secondary_alignment: self.secondary_alignment.unwrap_or(false),
            supplementary_alignment: self.supplementary_alignment.unwrap_or(false),
        }
    }
}

/// A term from an ontology such as the Sequence Ontology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OntologyTerm {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_version: Option<String>,
}

impl OntologyTerm {
    /// A term referenced by id alone, as used in search filters.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Predicted effect of an allele on one transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscriptEffect {
    pub id: String,
    pub feature_id: String,
    pub alternate_bases: Option<String>,
    pub effects: Vec<OntologyTerm>,
    pub hgvs_annotation: Option<Value>,
    pub analysis_results: Vec<Value>,
}

/// One annotation from `variantannotations/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariantAnnotation {
    pub id: String,
    pub variant_id: String,
    pub variant_annotation_set_id: String,
    pub create_date_time: Option<String>,
    pub transcript_effects: Vec<TranscriptEffect>,
    pub info: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariantAnnotationKey {
    pub id: String,
    pub variant_id: String,
}

impl fmt::Display for VariantAnnotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (variant {})", self.id, self.variant_id)
    }
}

impl ItemIdentity for VariantAnnotation {
    type Key = VariantAnnotationKey;

    fn identity(&self) -> VariantAnnotationKey {
        VariantAnnotationKey {
            id: self.id.clone(),
            variant_id: self.variant_id.clone(),
        }
    }
}
