//! Rendering of `Query`-placed request fields into URLs.

use befall_types::{ApiRequest, Placement};
use serde_json::Value;
use url::Url;

use crate::error::ApiError;

/// Appends every query-placed field of `request` to `url`, keyed by the
/// field's source key. Null fields are skipped.
pub fn append_query<R: ApiRequest>(url: &mut Url, request: &R) -> Result<(), ApiError> {
    let encoded = serde_json::to_value(request).map_err(ApiError::Encode)?;
    let mut pairs: Vec<(&str, String)> = Vec::new();
    for field in R::SHAPE.fields_in(Placement::Query) {
        let key = field.source_key.unwrap_or(field.name);
        match encoded.get(field.name) {
            None | Some(Value::Null) => continue,
            Some(Value::String(value)) => pairs.push((key, value.clone())),
            Some(other) => pairs.push((key, other.to_string())),
        }
    }
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use befall_types::{FieldKind, FieldSpec, RequestShape};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Sample {
        id: String,
        refresh: bool,
        platform: Option<String>,
    }

    impl ApiRequest for Sample {
        const SHAPE: RequestShape = RequestShape::new(
            "Sample",
            &[
                FieldSpec::path("id", "id", FieldKind::String),
                FieldSpec::query("refresh", "refresh", FieldKind::Bool),
                FieldSpec::query("platform", "platform", FieldKind::String),
            ],
        );
    }

    #[test]
    fn query_fields_render_by_source_key() {
        let mut url = Url::parse("http://localhost/users/1").unwrap();
        let sample = Sample {
            id: "1".into(),
            refresh: true,
            platform: Some("discord bot".into()),
        };
        append_query(&mut url, &sample).unwrap();
        assert_eq!(url.as_str(), "http://localhost/users/1?refresh=true&platform=discord+bot");
    }

    #[test]
    fn null_fields_are_skipped() {
        let mut url = Url::parse("http://localhost/users/1").unwrap();
        append_query(&mut url, &Sample::default()).unwrap();
        assert_eq!(url.query(), Some("refresh=false"));
    }
}
