//! Index definition in the Azure AI Search REST shape.

use serde::Serialize;

pub const VECTOR_FIELD: &str = "content_vector";
pub const VECTOR_PROFILE: &str = "default-vector-profile";
pub const HNSW_CONFIG: &str = "hnsw-config";
pub const DEFAULT_DIMENSIONS: usize = 1536;

/// Fields projected by retrieval.
pub const SELECT_FIELDS: [&str; 4] = ["content", "sop_number", "title", "section_type"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSchema {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub vector_search: VectorSearch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub key: bool,
    pub searchable: bool,
    pub filterable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_search_profile: Option<String>,
}

impl FieldDef {
    fn string(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: "Edm.String".to_owned(),
            key: false,
            searchable: false,
            filterable: false,
            dimensions: None,
            vector_search_profile: None,
        }
    }

    fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    fn vector(name: &str, dimensions: usize) -> Self {
        Self {
            name: name.to_owned(),
            kind: "Collection(Edm.Single)".to_owned(),
            key: false,
            searchable: true,
            filterable: false,
            dimensions: Some(dimensions),
            vector_search_profile: Some(VECTOR_PROFILE.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorSearch {
    pub profiles: Vec<VectorProfile>,
    pub algorithms: Vec<VectorAlgorithm>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorProfile {
    pub name: String,
    pub algorithm: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorAlgorithm {
    pub name: String,
    pub kind: String,
}

impl IndexSchema {
    /// The SOP chunk index: key `id`, searchable text fields, filterable SOP
    /// number and section, and an HNSW vector field.
    #[must_use]
    pub fn sop_index(name: &str, dimensions: usize) -> Self {
        let mut id = FieldDef::string("id").filterable();
        id.key = true;

        Self {
            name: name.to_owned(),
            fields: vec![
                id,
                FieldDef::string("content").searchable(),
                FieldDef::string("sop_number").searchable().filterable(),
                FieldDef::string("title").searchable(),
                FieldDef::string("section_type").searchable().filterable(),
                FieldDef::string("version"),
                FieldDef::string("filename"),
                FieldDef::string("effective_date"),
                FieldDef::vector(VECTOR_FIELD, dimensions),
            ],
            vector_search: VectorSearch {
                profiles: vec![VectorProfile {
                    name: VECTOR_PROFILE.to_owned(),
                    algorithm: HNSW_CONFIG.to_owned(),
                }],
                algorithms: vec![VectorAlgorithm {
                    name: HNSW_CONFIG.to_owned(),
                    kind: "hnsw".to_owned(),
                }],
            },
        }
    }

    #[must_use]
    pub fn vector_dimensions(&self) -> Option<usize> {
        self.fields
            .iter()
            .find(|f| f.name == VECTOR_FIELD)
            .and_then(|f| f.dimensions)
    }
}
