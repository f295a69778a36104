use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

const RIDB_BASE_URL: &str = "https://ridb.recreation.gov/api/v1";

/// Errors raised while talking to the RIDB API.
#[derive(Debug, thiserror::Error)]
pub enum RecGovError {
    /// Transport or decoding failure
    #[error("RIDB request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// RIDB answered with a non-success status
    #[error("RIDB returned HTTP {0}")]
    Status(u16),
}

/// A camping facility as listed by RIDB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Facility {
    /// RIDB facility id (the id used by the availability API)
    pub facility_id: String,
    /// Display name of the facility
    pub facility_name: String,
}

/// Thin client over the RIDB facility and recreation-area search endpoints.
pub struct FacilitySearch {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FacilitySearch {
    /// Create a new search client. RIDB rejects anonymous calls, so `api_key`
    /// is only optional to keep local setups working.
    pub fn new(api_key: Option<String>) -> Result<Self, RecGovError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: RIDB_BASE_URL.to_string(),
            api_key,
        })
    }

    /// Search camping facilities whose name matches `query`.
    pub async fn search_facilities(&self, query: &str) -> Result<Vec<Facility>, RecGovError> {
        let url = format!(
            "{}/facilities?query={}&activity=CAMPING&limit=50",
            self.base_url,
            urlencoding::encode(query)
        );
        let data = self.get_json(&url).await?;
        Ok(facilities_from_response(&data))
    }

    /// Search recreation areas matching `query` and collect their camping facilities.
    pub async fn search_recarea_facilities(
        &self,
        query: &str,
    ) -> Result<Vec<Facility>, RecGovError> {
        let url = format!(
            "{}/recareas?query={}&activity=CAMPING&limit=50",
            self.base_url,
            urlencoding::encode(query)
        );
        let recarea_data = self.get_json(&url).await?;

        let mut all_facilities = Vec::new();
        let query_lower = query.to_lowercase();

        if let Some(recareas) = recarea_data.get("RECDATA").and_then(|v| v.as_array()) {
            log::debug!("🏞️ Found {} recreation areas for '{}'", recareas.len(), query);

            for recarea in recareas {
                let (Some(recarea_id), Some(recarea_name)) = (
                    recarea.get("RecAreaID").and_then(id_as_string),
                    recarea.get("RecAreaName").and_then(|v| v.as_str()),
                ) else {
                    continue;
                };

                // RIDB's full-text search is loose; only keep areas whose name matches
                if !recarea_name.to_lowercase().contains(&query_lower) {
                    log::debug!("⏭️ Skipping: {} - doesn't match query '{}'", recarea_name, query);
                    continue;
                }

                let url = format!(
                    "{}/recareas/{}/facilities?activity=CAMPING&limit=50",
                    self.base_url, recarea_id
                );
                match self.get_json(&url).await {
                    Ok(facilities) => all_facilities.extend(facilities_from_response(&facilities)),
                    Err(e) => {
                        log::warn!("❌ Error getting facilities for {}: {}", recarea_name, e)
                    }
                }
            }
        }

        Ok(all_facilities)
    }

    /// Resolve a campground name to a facility id.
    ///
    /// Prefers a facility whose own name contains the query, then falls back to the
    /// campgrounds of a matching recreation area. Returns `None` when nothing matches.
    pub async fn find_campground_id(&self, name: &str) -> Result<Option<String>, RecGovError> {
        let direct = self.search_facilities(name).await?;
        if let Some(facility) = best_match(&direct, name) {
            return Ok(Some(facility.facility_id.clone()));
        }

        let by_area = self.search_recarea_facilities(name).await?;
        Ok(by_area.first().map(|f| f.facility_id.clone()))
    }

    async fn get_json(&self, url: &str) -> Result<Value, RecGovError> {
        let mut request = self.client.get(url);
        if let Some(ref api_key) = self.api_key {
            request = request.header("apikey", api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(RecGovError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}

/// Pick the first facility whose name contains `name`, case-insensitively.
pub fn best_match<'a>(facilities: &'a [Facility], name: &str) -> Option<&'a Facility> {
    let needle = name.to_lowercase();
    facilities
        .iter()
        .find(|f| f.facility_name.to_lowercase().contains(&needle))
}

/// Extract facilities from a RIDB `{"RECDATA": [...]}` payload.
pub fn facilities_from_response(data: &Value) -> Vec<Facility> {
    data.get("RECDATA")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(Facility {
                        facility_id: item.get("FacilityID").and_then(id_as_string)?,
                        facility_name: item.get("FacilityName")?.as_str()?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

// RIDB serves ids as strings on some endpoints and numbers on others
fn id_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_facilities_from_response() {
        let data = json!({
            "RECDATA": [
                {"FacilityID": "232447", "FacilityName": "UPPER PINES"},
                {"FacilityID": 232450, "FacilityName": "LOWER PINES"},
                {"FacilityName": "NO ID"}
            ]
        });

        let facilities = facilities_from_response(&data);
        assert_eq!(facilities.len(), 2);
        assert_eq!(facilities[0].facility_id, "232447");
        assert_eq!(facilities[1].facility_id, "232450");
    }

    #[test]
    fn test_facilities_from_empty_response() {
        assert!(facilities_from_response(&json!({})).is_empty());
    }

    #[test]
    fn test_best_match_is_case_insensitive() {
        let facilities = vec![
            Facility {
                facility_id: "1".to_string(),
                facility_name: "NORTH PINES".to_string(),
            },
            Facility {
                facility_id: "2".to_string(),
                facility_name: "UPPER PINES".to_string(),
            },
        ];

        assert_eq!(best_match(&facilities, "upper pines").unwrap().facility_id, "2");
        assert!(best_match(&facilities, "tuolumne").is_none());
    }
}
