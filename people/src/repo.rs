use footfall_kv::KVStore;
use footfall_vecstore::{Neighbor, VecError, VectorStore, closest};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::PeopleError;
use crate::keys::{
    cart_key, cart_prefix, cart_product_key, cart_product_prefix, organization_key,
    organization_name_key, person_key, person_prefix, product_key, product_name_key,
    product_prefix,
};
use crate::types::{Cart, CartProduct, Organization, Person, Product};

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, PeopleError> {
    rmp_serde::to_vec_named(value).map_err(|e| PeopleError::Serialization(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, PeopleError> {
    rmp_serde::from_slice(data).map_err(|e| PeopleError::Serialization(e.to_string()))
}

/// Typed access to the records of every organization in one KV store.
///
/// The repository doubles as the person [`VectorStore`]: a nearest query
/// scans the organization's people and compares their embeddings.
pub struct Repository {
    store: Box<dyn KVStore>,
    vector_search: bool,
}

impl Repository {
    /// `vector_search = false` reports the backend as lacking similarity
    /// support, which turns deduplication off.
    pub fn new(store: Box<dyn KVStore>, vector_search: bool) -> Self {
        Self {
            store,
            vector_search,
        }
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PeopleError> {
        self.store.get(key)?.map(|data| decode(&data)).transpose()
    }

    fn load_all<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, PeopleError> {
        self.store
            .scan(prefix)?
            .iter()
            .map(|(_, data)| decode(data))
            .collect()
    }

    /// Writes every `(key, value)` pair in one atomic batch.
    pub(crate) fn write(&self, entries: &[(String, Vec<u8>)]) -> Result<(), PeopleError> {
        let batch: Vec<(&str, &[u8])> = entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
            .collect();
        self.store.batch_set(&batch)?;
        Ok(())
    }

    // Organizations

    pub fn organization(&self, id: &str) -> Result<Organization, PeopleError> {
        self.load(&organization_key(id))?
            .ok_or_else(|| PeopleError::NotFound(format!("organization {id}")))
    }

    pub fn organization_name_taken(&self, name: &str) -> Result<bool, PeopleError> {
        Ok(self.store.get(&organization_name_key(name))?.is_some())
    }

    pub fn insert_organization(&self, org: &Organization) -> Result<(), PeopleError> {
        self.write(&[
            (organization_key(&org.id), encode(org)?),
            (organization_name_key(&org.name), org.id.clone().into_bytes()),
        ])
    }

    // People

    pub fn person(&self, org: &str, id: &str) -> Result<Person, PeopleError> {
        self.load(&person_key(org, id))?
            .ok_or_else(|| PeopleError::NotFound(format!("person {id}")))
    }

    /// All people of `org` in ascending id order.
    pub fn people(&self, org: &str) -> Result<Vec<Person>, PeopleError> {
        self.load_all(&person_prefix(org))
    }

    pub fn put_person(&self, person: &Person) -> Result<(), PeopleError> {
        self.store.set(
            &person_key(&person.organization_id, &person.id),
            &encode(person)?,
        )?;
        Ok(())
    }

    // Products

    pub fn product(&self, org: &str, id: &str) -> Result<Product, PeopleError> {
        self.load(&product_key(org, id))?
            .ok_or_else(|| PeopleError::NotFound(format!("product {id}")))
    }

    pub fn products(&self, org: &str) -> Result<Vec<Product>, PeopleError> {
        self.load_all(&product_prefix(org))
    }

    pub fn product_name_taken(&self, org: &str, name: &str) -> Result<bool, PeopleError> {
        Ok(self.store.get(&product_name_key(org, name))?.is_some())
    }

    pub fn insert_product(&self, product: &Product) -> Result<(), PeopleError> {
        let org = &product.organization_id;
        self.write(&[
            (product_key(org, &product.id), encode(product)?),
            (
                product_name_key(org, &product.name),
                product.id.clone().into_bytes(),
            ),
        ])
    }

    // Carts

    pub fn cart(&self, org: &str, id: &str) -> Result<Cart, PeopleError> {
        self.load(&cart_key(org, id))?
            .ok_or_else(|| PeopleError::NotFound(format!("cart {id}")))
    }

    pub fn carts(&self, org: &str) -> Result<Vec<Cart>, PeopleError> {
        self.load_all(&cart_prefix(org))
    }

    pub fn put_cart(&self, cart: &Cart) -> Result<(), PeopleError> {
        self.store
            .set(&cart_key(&cart.organization_id, &cart.id), &encode(cart)?)?;
        Ok(())
    }

    pub fn cart_products(&self, org: &str, cart: &str) -> Result<Vec<CartProduct>, PeopleError> {
        self.load_all(&cart_product_prefix(org, cart))
    }

    pub fn cart_product_exists(
        &self,
        org: &str,
        cart: &str,
        product: &str,
    ) -> Result<bool, PeopleError> {
        Ok(self
            .store
            .get(&cart_product_key(org, cart, product))?
            .is_some())
    }
}

impl VectorStore for Repository {
    fn supports_vectors(&self) -> bool {
        self.vector_search
    }

    fn nearest(
        &self,
        org: &str,
        query: &[f32],
        exclude: Option<&str>,
    ) -> Result<Option<Neighbor>, VecError> {
        let people = self
            .people(org)
            .map_err(|e| VecError::Storage(e.to_string()))?;
        let candidates = people
            .iter()
            .filter(|p| Some(p.id.as_str()) != exclude)
            .filter_map(|p| p.vector.as_deref().map(|v| (p.id.as_str(), v)));
        Ok(closest(query, candidates))
    }
}
