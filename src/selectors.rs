use crate::types::RawProposal;
use serde_json::Value;

/// Render a JSON scalar as text. Identifiers, numbers and years are
/// published as numbers by some endpoints and as strings by others.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First of `keys` present in `map` as a scalar
fn field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(scalar_string))
}

/// Whether a record uses the Câmara dos Deputados open-data layout
pub fn is_camara_record(value: &Value) -> bool {
    value.get("statusProposicao").is_some() || value.get("ementa").is_some()
}

/// Default selector for Câmara dos Deputados `/proposicoes/{id}` records.
///
/// `ementa` becomes the title and `ementaDetalhada` the summary (empty when
/// absent). The source's own indexing keywords and the kind description are
/// kept as extra searchable text. Status, timestamp, holding body and regime
/// come from `statusProposicao`.
pub fn camara_select_default(value: &Value) -> RawProposal {
    let status = value.get("statusProposicao");
    let status_field = |key: &str| status.and_then(|s| s.get(key)).and_then(scalar_string);

    let keywords: Vec<String> = [field(value, &["keywords"]), field(value, &["descricaoTipo"])]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect();

    RawProposal {
        id: field(value, &["id"]),
        title: field(value, &["ementa"]),
        summary: Some(field(value, &["ementaDetalhada"]).unwrap_or_default()),
        status: status_field("descricaoSituacao"),
        authoring_body: status_field("siglaOrgao"),
        last_modified: status_field("dataHora"),
        kind: field(value, &["siglaTipo"]),
        number: field(value, &["numero"]),
        year: field(value, &["ano"]),
        regime: status_field("regime"),
        keywords: if keywords.is_empty() {
            None
        } else {
            Some(keywords.join(" "))
        },
    }
}

/// Selector for records already in the crate's own layout. Accepts both
/// snake_case and camelCase field names.
pub fn native_select_default(value: &Value) -> RawProposal {
    RawProposal {
        id: field(value, &["id"]),
        title: field(value, &["title"]),
        summary: field(value, &["summary", "body"]),
        status: field(value, &["status"]),
        authoring_body: field(value, &["authoring_body", "authoringBody"]),
        last_modified: field(value, &["last_modified", "lastModified"]),
        kind: field(value, &["kind"]),
        number: field(value, &["number"]),
        year: field(value, &["year"]),
        regime: field(value, &["regime"]),
        keywords: field(value, &["keywords"]),
    }
}

/// Extract every proposal record from a decoded JSON document.
///
/// Unwraps `{"dados": ...}` envelopes and arrays, and picks the Câmara or the
/// native selector per record. Non-object values are ignored.
pub fn select_records(value: &Value) -> Vec<RawProposal> {
    match value {
        Value::Array(items) => items.iter().flat_map(select_records).collect(),
        Value::Object(map) => {
            if let Some(inner) = map.get("dados") {
                return select_records(inner);
            }
            if is_camara_record(value) {
                vec![camara_select_default(value)]
            } else {
                vec![native_select_default(value)]
            }
        }
        _ => Vec::new(),
    }
}
