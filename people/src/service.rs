use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use footfall_identity::{Decision, MatchResult, Matcher, Thresholds};
use footfall_kv::KVStore;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::PeopleError;
use crate::keys::{cart_key, cart_product_key};
use crate::repo::{Repository, encode};
use crate::requests::{
    MAX_BULK_ITEMS, NewCart, NewCartProduct, NewOrganization, NewProduct, PageQuery, PersonPatch,
    SightingRequest, validate_text,
};
use crate::types::{
    Cart, CartProduct, DishCount, Order, OrderHistory, OrderLine, Organization, Person,
    PersonDetail, PersonPage, PersonSummary, Product, VisitSummary,
};

/// Length of an organization's generated private key.
pub const PRIVATE_KEY_LEN: usize = 25;

/// Number of dishes reported in a visit summary.
pub const FAVORITE_DISHES: usize = 5;

/// Default embedding dimension.
pub const DEFAULT_DIM: usize = 128;

/// Controls service behavior.
#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    /// Required length of every stored embedding.
    pub dim: usize,

    /// Bounds for accept / review / create.
    pub thresholds: Thresholds,

    /// Whether the backend may be used for similarity search. When false,
    /// every sighting creates a new person.
    pub vector_search: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            dim: DEFAULT_DIM,
            thresholds: Thresholds::default(),
            vector_search: true,
        }
    }
}

/// What a sighting did to the person store.
#[derive(Debug, Clone, Serialize)]
pub struct SightingOutcome {
    /// The person the sighting was recorded on.
    pub person: Person,

    /// True when a new person record was written.
    pub created: bool,

    /// Raw matcher output. For `review`, `person` here is the ambiguous
    /// candidate, not the new record.
    #[serde(rename = "match")]
    pub matched: MatchResult,
}

/// People, sightings, carts and orders for every organization.
///
/// Thread-safe. Sightings within one organization are serialized so that a
/// match and the write it leads to are never interleaved with another
/// sighting's; organizations proceed independently.
pub struct PeopleService {
    repo: Arc<Repository>,
    matcher: Matcher,
    dim: usize,
    org_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    registry_lock: Mutex<()>,
}

impl PeopleService {
    /// Creates a service over `store`. Panics if `cfg.dim` is 0.
    pub fn new(store: Box<dyn KVStore>, cfg: ServiceConfig) -> Self {
        assert!(cfg.dim > 0, "people: ServiceConfig.dim must be positive");
        let repo = Arc::new(Repository::new(store, cfg.vector_search));
        let matcher = Matcher::new(cfg.thresholds, repo.clone());
        Self {
            repo,
            matcher,
            dim: cfg.dim,
            org_locks: Mutex::new(HashMap::new()),
            registry_lock: Mutex::new(()),
        }
    }

    /// The lock serializing writes within `org`. Callers check that the
    /// organization exists first so unknown ids never get an entry.
    fn org_lock(&self, org: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .org_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(org.to_string()).or_default().clone()
    }

    // Organizations

    pub fn create_organization(&self, req: NewOrganization) -> Result<Organization, PeopleError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(PeopleError::Validation("name must not be empty".into()));
        }
        validate_text("name", Some(name))?;

        let _guard = self
            .registry_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.repo.organization_name_taken(name)? {
            return Err(PeopleError::Conflict(format!(
                "organization {name:?} already exists"
            )));
        }

        let now = Utc::now();
        let org = Organization {
            id: new_id(),
            name: name.to_string(),
            private_key: private_key(),
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_organization(&org)?;
        info!(org = %org.id, name = %org.name, "organization created");
        Ok(org)
    }

    pub fn organization(&self, id: &str) -> Result<Organization, PeopleError> {
        self.repo.organization(id)
    }

    // Sightings

    /// Records one observation: matches its vector against the
    /// organization's people and merges, flags or creates accordingly.
    ///
    /// - `accept`: the matched person takes the new vector and every
    ///   supplied metadata field.
    /// - `review`: a new person is created with `review_of` pointing at the
    ///   ambiguous candidate.
    /// - `create`, or no vector: a new person is created.
    pub fn record_sighting(
        &self,
        org: &str,
        mut req: SightingRequest,
    ) -> Result<SightingOutcome, PeopleError> {
        req.validate(self.dim)?;
        self.repo.organization(org)?;

        let lock = self.org_lock(org);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let matched = match &req.vector {
            Some(v) => self.matcher.find_best_match(org, v, None)?,
            None => MatchResult::unmatched(),
        };
        let now = Utc::now();

        let accepted = match matched.decision {
            Decision::Accept => matched.person.clone(),
            _ => None,
        };
        if let Some(id) = accepted {
            let mut person = self.repo.person(org, &id)?;
            observe(&mut person, req, now);
            self.repo.put_person(&person)?;
            info!(org, person = %person.id, cosine = ?matched.cosine_distance, "sighting merged");
            return Ok(SightingOutcome {
                person,
                created: false,
                matched,
            });
        }

        let review_of = match matched.decision {
            Decision::Review => matched.person.clone(),
            _ => None,
        };
        let mut person = Person {
            id: new_id(),
            organization_id: org.to_string(),
            full_name: None,
            phone_number: None,
            vector: None,
            age: None,
            gender: None,
            emotion: None,
            body_type: None,
            entry_time: None,
            exit_time: None,
            review_of,
            created_at: now,
            updated_at: now,
        };
        observe(&mut person, req, now);
        self.repo.put_person(&person)?;
        info!(
            org,
            person = %person.id,
            decision = %matched.decision,
            review_of = ?person.review_of,
            "person created"
        );
        Ok(SightingOutcome {
            person,
            created: true,
            matched,
        })
    }

    /// Re-runs matching for a stored person against everyone else in the
    /// organization.
    pub fn rematch_person(&self, org: &str, id: &str) -> Result<MatchResult, PeopleError> {
        let person = self.repo.person(org, id)?;
        let Some(vector) = person.vector.as_deref() else {
            return Err(PeopleError::Validation(format!("person {id} has no vector")));
        };
        Ok(self.matcher.find_best_match(org, vector, Some(id))?)
    }

    // People

    pub fn person(&self, org: &str, id: &str) -> Result<Person, PeopleError> {
        self.repo.person(org, id)
    }

    pub fn update_person(
        &self,
        org: &str,
        id: &str,
        patch: PersonPatch,
    ) -> Result<Person, PeopleError> {
        patch.validate()?;
        self.repo.organization(org)?;

        let lock = self.org_lock(org);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut person = self.repo.person(org, id)?;
        let PersonPatch {
            full_name,
            phone_number,
            age,
            gender,
            emotion,
            body_type,
            entry_time,
            exit_time,
        } = patch;
        overwrite(&mut person.full_name, full_name);
        overwrite(&mut person.phone_number, phone_number);
        overwrite(&mut person.age, age);
        overwrite(&mut person.gender, gender);
        overwrite(&mut person.emotion, emotion);
        overwrite(&mut person.body_type, body_type);
        overwrite(&mut person.entry_time, entry_time);
        overwrite(&mut person.exit_time, exit_time);
        person.updated_at = Utc::now();

        self.repo.put_person(&person)?;
        Ok(person)
    }

    /// Lists the organization's people, newest first.
    pub fn list_persons(&self, org: &str, query: PageQuery) -> Result<PersonPage, PeopleError> {
        let (page, page_size) = query.normalize();

        let mut people = self.repo.people(org)?;
        people.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let count = people.len();
        let total_pages = count.div_ceil(page_size).max(1);
        if page < 1 || page as usize > total_pages {
            return Err(PeopleError::NotFound(format!("page {page}")));
        }
        let current = page as usize;

        let results = people
            .iter()
            .skip((current - 1) * page_size)
            .take(page_size)
            .map(PersonSummary::from)
            .collect();

        Ok(PersonPage {
            count,
            total_pages,
            current_page: current,
            page_size,
            has_next: current < total_pages,
            has_previous: current > 1,
            next_page: (current < total_pages).then_some(current + 1),
            previous_page: (current > 1).then(|| current - 1),
            results,
        })
    }

    pub fn person_detail(&self, org: &str, id: &str) -> Result<PersonDetail, PeopleError> {
        let person = self.repo.person(org, id)?;
        let carts = self.orders_of(org, id)?;
        Ok(PersonDetail {
            person: PersonSummary::from(&person),
            carts,
        })
    }

    pub fn order_history(&self, org: &str, id: &str) -> Result<OrderHistory, PeopleError> {
        let person = self.repo.person(org, id)?;
        let orders = self.orders_of(org, id)?;
        Ok(OrderHistory {
            person_id: person.id,
            person_name: person.full_name,
            total_orders: orders.len(),
            orders,
        })
    }

    /// Visit statistics for one person, derived from their carts.
    pub fn person_summary(&self, org: &str, id: &str) -> Result<VisitSummary, PeopleError> {
        let person = self.repo.person(org, id)?;
        let orders = self.orders_of(org, id)?;

        let mut tables: Vec<(i32, usize)> = Vec::new();
        let mut dishes: Vec<DishCount> = Vec::new();
        let mut total_items = 0;
        for order in &orders {
            if let Some(table) = order.table_number {
                match tables.iter_mut().find(|(t, _)| *t == table) {
                    Some((_, n)) => *n += 1,
                    None => tables.push((table, 1)),
                }
            }
            for line in &order.products {
                total_items += 1;
                match dishes.iter_mut().find(|d| d.dish == line.product_name) {
                    Some(d) => d.count += 1,
                    None => dishes.push(DishCount {
                        dish: line.product_name.clone(),
                        count: 1,
                    }),
                }
            }
        }
        // Stable sorts: equal counts keep first-seen order, newest visit first.
        tables.sort_by(|a, b| b.1.cmp(&a.1));
        dishes.sort_by(|a, b| b.count.cmp(&a.count));
        dishes.truncate(FAVORITE_DISHES);

        Ok(VisitSummary {
            person_id: person.id,
            person_name: person.full_name,
            total_visits: orders.len(),
            last_visit: orders.first().map(|o| o.cart_created_at),
            favorite_table: tables.first().map(|(t, _)| *t),
            favorite_dishes: dishes,
            total_spent_items: total_items,
        })
    }

    /// Carts of one person, newest first. Products within a cart are ordered
    /// by when they were added, then by product id for lines added together.
    fn orders_of(&self, org: &str, person_id: &str) -> Result<Vec<Order>, PeopleError> {
        let mut carts: Vec<Cart> = self
            .repo
            .carts(org)?
            .into_iter()
            .filter(|c| c.person_id == person_id)
            .collect();
        carts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut names: HashMap<String, String> = HashMap::new();
        let mut orders = Vec::with_capacity(carts.len());
        for cart in carts {
            let mut items = self.repo.cart_products(org, &cart.id)?;
            items.sort_by_key(|cp| cp.created_at);

            let mut products = Vec::with_capacity(items.len());
            for item in items {
                let product_name = match names.get(&item.product_id) {
                    Some(n) => n.clone(),
                    None => {
                        let n = self.repo.product(org, &item.product_id)?.name;
                        names.insert(item.product_id.clone(), n.clone());
                        n
                    }
                };
                products.push(OrderLine {
                    product_id: item.product_id,
                    product_name,
                    added_at: item.created_at,
                });
            }

            orders.push(Order {
                cart_id: cart.id,
                cart_created_at: cart.created_at,
                cart_updated_at: cart.updated_at,
                table_number: cart.table_number,
                total_products: products.len(),
                products,
            });
        }
        Ok(orders)
    }

    // Products

    pub fn create_product(&self, org: &str, req: NewProduct) -> Result<Product, PeopleError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(PeopleError::Validation("name must not be empty".into()));
        }
        validate_text("name", Some(name))?;
        self.repo.organization(org)?;

        let lock = self.org_lock(org);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if self.repo.product_name_taken(org, name)? {
            return Err(PeopleError::Conflict(format!(
                "product {name:?} already exists"
            )));
        }
        let now = Utc::now();
        let product = Product {
            id: new_id(),
            organization_id: org.to_string(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_product(&product)?;
        Ok(product)
    }

    /// Products of the organization, sorted by name.
    pub fn list_products(&self, org: &str) -> Result<Vec<Product>, PeopleError> {
        let mut products = self.repo.products(org)?;
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    // Carts

    pub fn create_cart(&self, org: &str, req: NewCart) -> Result<Cart, PeopleError> {
        self.repo.person(org, &req.person_id)?;
        let now = Utc::now();
        let cart = Cart {
            id: new_id(),
            organization_id: org.to_string(),
            person_id: req.person_id,
            table_number: req.table_number,
            created_at: now,
            updated_at: now,
        };
        self.repo.put_cart(&cart)?;
        Ok(cart)
    }

    pub fn add_cart_product(
        &self,
        org: &str,
        req: NewCartProduct,
    ) -> Result<CartProduct, PeopleError> {
        let mut created = self.bulk_add_cart_products(org, vec![req])?;
        Ok(created.remove(0))
    }

    /// Adds up to [`MAX_BULK_ITEMS`] cart products in one atomic write.
    /// Nothing is written if any item is invalid, unknown or already present.
    pub fn bulk_add_cart_products(
        &self,
        org: &str,
        items: Vec<NewCartProduct>,
    ) -> Result<Vec<CartProduct>, PeopleError> {
        if items.is_empty() || items.len() > MAX_BULK_ITEMS {
            return Err(PeopleError::Validation(format!(
                "between 1 and {MAX_BULK_ITEMS} cart products required, got {}",
                items.len()
            )));
        }
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item) {
                return Err(PeopleError::Validation(format!(
                    "duplicate cart {} and product {}",
                    item.cart_id, item.product_id
                )));
            }
        }
        self.repo.organization(org)?;

        let lock = self.org_lock(org);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let now = Utc::now();
        let mut carts: HashMap<String, Cart> = HashMap::new();
        let mut created = Vec::with_capacity(items.len());
        for item in &items {
            if !carts.contains_key(&item.cart_id) {
                let cart = self.repo.cart(org, &item.cart_id)?;
                carts.insert(item.cart_id.clone(), cart);
            }
            self.repo.product(org, &item.product_id)?;
            if self
                .repo
                .cart_product_exists(org, &item.cart_id, &item.product_id)?
            {
                return Err(PeopleError::Conflict(format!(
                    "product {} is already in cart {}",
                    item.product_id, item.cart_id
                )));
            }
            created.push(CartProduct {
                id: new_id(),
                organization_id: org.to_string(),
                cart_id: item.cart_id.clone(),
                product_id: item.product_id.clone(),
                created_at: now,
                updated_at: now,
            });
        }

        let mut entries = Vec::with_capacity(created.len() + carts.len());
        for cp in &created {
            entries.push((
                cart_product_key(org, &cp.cart_id, &cp.product_id),
                encode(cp)?,
            ));
        }
        for cart in carts.values_mut() {
            cart.updated_at = now;
            entries.push((cart_key(org, &cart.id), encode(cart)?));
        }
        self.repo.write(&entries)?;
        Ok(created)
    }
}

/// Applies a sighting to a person: latest observation wins for every field
/// the sighting carries.
fn observe(person: &mut Person, req: SightingRequest, now: DateTime<Utc>) {
    let SightingRequest {
        vector,
        age,
        gender,
        emotion,
        body_type,
        entry_time,
        exit_time,
    } = req;
    overwrite(&mut person.vector, vector);
    overwrite(&mut person.age, age);
    overwrite(&mut person.gender, gender);
    overwrite(&mut person.emotion, emotion);
    overwrite(&mut person.body_type, body_type);
    overwrite(&mut person.entry_time, entry_time);
    overwrite(&mut person.exit_time, exit_time);
    person.updated_at = now;
}

fn overwrite<T>(field: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *field = value;
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn private_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PRIVATE_KEY_LEN)
        .map(char::from)
        .collect()
}
