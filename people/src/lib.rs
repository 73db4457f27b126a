//! Organization-scoped people, sightings, carts and orders.
//!
//! [`PeopleService`] is the entry point. It stores every record in a
//! [`footfall_kv::KVStore`] and deduplicates incoming sightings with
//! [`footfall_identity::Matcher`], using its own repository as the vector
//! store.
//!
//! ```
//! use footfall_kv::MemoryStore;
//! use footfall_people::{NewOrganization, PeopleService, ServiceConfig, SightingRequest};
//!
//! let svc = PeopleService::new(
//!     Box::new(MemoryStore::new()),
//!     ServiceConfig { dim: 2, ..Default::default() },
//! );
//! let org = svc.create_organization(NewOrganization { name: "Cafe".into() }).unwrap();
//!
//! let sighting = SightingRequest { vector: Some(vec![0.6, 0.8]), ..Default::default() };
//! let first = svc.record_sighting(&org.id, sighting.clone()).unwrap();
//! let again = svc.record_sighting(&org.id, sighting).unwrap();
//! assert!(first.created);
//! assert!(!again.created);
//! assert_eq!(first.person.id, again.person.id);
//! ```

mod error;
mod keys;
mod repo;
mod requests;
mod service;
mod types;


pub use error::PeopleError;
pub use repo::Repository;
pub use requests::{
    BulkCartProducts, MAX_BULK_ITEMS, NewCart, NewCartProduct, NewOrganization, NewProduct,
    PageQuery, PersonPatch, SightingRequest,
};
pub use service::{
    DEFAULT_DIM, FAVORITE_DISHES, PRIVATE_KEY_LEN, PeopleService, ServiceConfig, SightingOutcome,
};
pub use types::{
    Cart, CartProduct, DishCount, Order, OrderHistory, OrderLine, Organization, Person,
    PersonDetail, PersonPage, PersonSummary, Product, VisitSummary,
};
