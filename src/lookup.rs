//! Dispatch of the four lookup kinds against a record store.

use geo::Polygon;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{AddressQuery, Coordinate, PersonQuery, Record};
use crate::proximity::RadiusResolver;
use crate::store::RecordStore;

/// A submitted lookup, holding the raw form input
#[derive(Debug, Clone)]
pub enum Lookup {
    /// `None` when the form carried no id
    Id(Option<i64>),
    Person(PersonQuery),
    Address(AddressQuery),
    Radius { coordinates: String, radius_m: f64 },
}

impl Lookup {
    pub fn kind(&self) -> &'static str {
        match self {
            Lookup::Id(_) => "id",
            Lookup::Person(_) => "person",
            Lookup::Address(_) => "address",
            Lookup::Radius { .. } => "radius",
        }
    }
}

/// Records found by a lookup, plus the search geometry for radius lookups
#[derive(Debug, Clone, Default)]
pub struct LookupOutcome {
    pub records: Vec<Record>,
    /// Parsed input point of a radius lookup
    pub center: Option<Coordinate>,
    /// Search polygon of a radius lookup
    pub search_area: Option<Polygon<f64>>,
}

impl LookupOutcome {
    /// True for the "no results" state, which is not an error
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Validate and run a lookup.
pub async fn execute<S: RecordStore>(store: &S, lookup: Lookup) -> Result<LookupOutcome> {
    let kind = lookup.kind();

    let outcome = match lookup {
        Lookup::Id(id) => {
            let id = id.ok_or(Error::MissingInput("Please enter an ID before submitting!"))?;
            LookupOutcome {
                records: store.by_id(id).await?,
                ..Default::default()
            }
        }
        Lookup::Person(query) => {
            let query = query.normalized();
            if !query.has_name() {
                return Err(Error::MissingInput(
                    "Please provide at least a first or last name!",
                ));
            }
            LookupOutcome {
                records: store.by_person(&query).await?,
                ..Default::default()
            }
        }
        Lookup::Address(query) => {
            let query = query.normalized();
            if query.is_empty() {
                return Err(Error::MissingInput(
                    "Please provide at least a city or street name!",
                ));
            }
            LookupOutcome {
                records: store.by_address(&query).await?,
                ..Default::default()
            }
        }
        Lookup::Radius {
            coordinates,
            radius_m,
        } => {
            if coordinates.trim().is_empty() {
                return Err(Error::MissingInput("Please enter valid coordinates!"));
            }
            let query = RadiusResolver::new(store)
                .resolve_text(&coordinates, radius_m)
                .await?;
            LookupOutcome {
                records: query.results,
                center: Some(query.center),
                search_area: Some(query.polygon),
            }
        }
    };

    info!("{} lookup returned {} records", kind, outcome.records.len());
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::record;
    use crate::store::IndexedStore;

    fn store() -> IndexedStore {
        let mut far = record(3, 31.0, 35.0);
        far.street_name = Some("Herzl".to_string());
        IndexedStore::new(vec![
            record(1, 32.1602, 34.8097),
            record(2, 32.16021, 34.80971),
            far,
        ])
    }

    fn ids(outcome: &LookupOutcome) -> Vec<i64> {
        outcome.records.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_id_lookup() {
        let outcome = execute(&store(), Lookup::Id(Some(2))).await.unwrap();
        assert_eq!(ids(&outcome), vec![2]);
        assert!(outcome.search_area.is_none());

        let err = execute(&store(), Lookup::Id(None)).await.unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[tokio::test]
    async fn test_unknown_id_is_empty_not_error() {
        let outcome = execute(&store(), Lookup::Id(Some(42))).await.unwrap();
        assert!(outcome.is_empty());
    }

    #[tokio::test]
    async fn test_person_requires_name() {
        let query = PersonQuery {
            first_name: Some(String::new()),
            last_name: None,
            city: Some("Herzliya".to_string()),
        };
        let err = execute(&store(), Lookup::Person(query)).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please provide at least a first or last name!"
        );
        assert!(err.is_user_error());
    }

    #[tokio::test]
    async fn test_person_lookup() {
        let query = PersonQuery {
            first_name: None,
            last_name: Some("last1".to_string()),
            city: Some(" herzliya ".to_string()),
        };
        let outcome = execute(&store(), Lookup::Person(query)).await.unwrap();
        assert_eq!(ids(&outcome), vec![1]);
    }

    #[tokio::test]
    async fn test_address_lookup() {
        let query = AddressQuery {
            street_name: Some("herzl".to_string()),
            city: None,
        };
        let outcome = execute(&store(), Lookup::Address(query)).await.unwrap();
        assert_eq!(ids(&outcome), vec![3]);

        let err = execute(&store(), Lookup::Address(AddressQuery::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[tokio::test]
    async fn test_radius_lookup() {
        let lookup = Lookup::Radius {
            coordinates: "32.1602, 34.8097".to_string(),
            radius_m: 15.0,
        };
        let outcome = execute(&store(), lookup).await.unwrap();
        assert_eq!(ids(&outcome), vec![1, 2]);
        assert_eq!(outcome.center, Some(Coordinate::new(32.1602, 34.8097)));
        assert!(outcome.search_area.is_some());
    }

    #[tokio::test]
    async fn test_radius_lookup_errors() {
        let blank = Lookup::Radius {
            coordinates: "   ".to_string(),
            radius_m: 15.0,
        };
        assert!(matches!(
            execute(&store(), blank).await,
            Err(Error::MissingInput(_))
        ));

        let malformed = Lookup::Radius {
            coordinates: "32.1602".to_string(),
            radius_m: 15.0,
        };
        assert!(matches!(
            execute(&store(), malformed).await,
            Err(Error::Format(_))
        ));
    }
}
