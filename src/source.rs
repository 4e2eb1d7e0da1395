//! Where the initial records come from. The shell only talks to the
//! `RecordSource` trait; `HttpSource` is the REST implementation that reads
//! `GET {base}/{resource}`.

use std::collections::HashSet;
use std::time::Duration;

use serde_json::Value;

use crate::error::AdminError;
use crate::models::{KindConfig, Record};

/// One-shot provider of the initial collection for a record kind.
pub trait RecordSource: Send + Sync {
    fn fetch(&self, config: &KindConfig) -> Result<Vec<Record>, AdminError>;
}

/// Blocking JSON-over-HTTP source.
pub struct HttpSource {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.into(),
            agent,
        }
    }

    /// Full URL for a resource path such as `students`.
    pub fn endpoint(&self, resource: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            resource.trim_start_matches('/')
        )
    }
}

impl RecordSource for HttpSource {
    fn fetch(&self, config: &KindConfig) -> Result<Vec<Record>, AdminError> {
        let resource = config.plural_noun();
        let url = self.endpoint(&config.resource);
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| AdminError::load_failure(&resource, err))?;
        let body: Value = response
            .into_json()
            .map_err(|err| AdminError::load_failure(&resource, err))?;
        parse_records(&body, config)
    }
}

/// Decode a JSON array of entities. Any malformed entry, duplicate id, or
/// unconfigured category rejects the whole payload.
pub fn parse_records(body: &Value, config: &KindConfig) -> Result<Vec<Record>, AdminError> {
    let resource = config.plural_noun();
    let items = body
        .as_array()
        .ok_or_else(|| AdminError::load_failure(&resource, "expected a JSON array"))?;

    let mut seen = HashSet::with_capacity(items.len());
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let record = Record::from_json(item, config)
            .map_err(|reason| AdminError::load_failure(&resource, format!("entry {index}: {reason}")))?;
        if !seen.insert(record.id.clone()) {
            return Err(AdminError::load_failure(
                &resource,
                format!("duplicate id {}", record.id),
            ));
        }
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{EntityKind, RecordId};

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let source = HttpSource::new("http://localhost:3000/", Duration::from_secs(1));
        assert_eq!(source.endpoint("students"), "http://localhost:3000/students");
        assert_eq!(source.endpoint("/teachers"), "http://localhost:3000/teachers");
    }

    #[test]
    fn parses_an_array_in_order() {
        let config = EntityKind::Student.default_config();
        let body = json!([
            {"id": 2, "firstName": "Bo", "lastName": "Ray", "group": "B"},
            {"id": "1", "firstName": "Ann", "lastName": "Lee", "group": "A"}
        ]);

        let records = parse_records(&body, &config).unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![RecordId::new(2), RecordId::text("1")]);
    }

    #[test]
    fn keeps_numeric_and_hex_string_ids_as_received() {
        let config = EntityKind::Student.default_config();
        let body = json!([
            {"id": 1, "firstName": "Ann", "lastName": "Lee", "group": "A"},
            {"id": "3f2a", "firstName": "Bo", "lastName": "Ray", "group": "B"},
            {"id": "1", "firstName": "Cy", "lastName": "Oh", "group": "C"}
        ]);

        let records = parse_records(&body, &config).unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(
            ids,
            vec![RecordId::new(1), RecordId::text("3f2a"), RecordId::text("1")]
        );
    }

    #[test]
    fn rejects_non_arrays_duplicates_and_bad_entries() {
        let config = EntityKind::Teacher.default_config();

        let not_array = json!({"teachers": []});
        assert!(matches!(
            parse_records(&not_array, &config),
            Err(AdminError::LoadFailure { ref resource, .. }) if resource == "teachers"
        ));

        let duplicate = json!([
            {"id": 1, "firstName": "Cy", "lastName": "Oh", "level": "Junior"},
            {"id": 1, "firstName": "Di", "lastName": "Ng", "level": "Senior"}
        ]);
        let err = parse_records(&duplicate, &config).unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch teachers: duplicate id 1");

        let missing = json!([{"id": 1, "firstName": "Cy", "level": "Junior"}]);
        let err = parse_records(&missing, &config).unwrap_err();
        assert!(err.to_string().contains("entry 0: missing field 'lastName'"));
    }

    #[test]
    fn unreachable_server_is_a_load_failure() {
        let config = EntityKind::Student.default_config();
        let source = HttpSource::new("http://127.0.0.1:9", Duration::from_millis(500));
        assert!(matches!(
            source.fetch(&config),
            Err(AdminError::LoadFailure { .. })
        ));
    }
}
