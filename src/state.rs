use std::sync::Arc;

use crate::{
    config::AuthConfig,
    repository::{BarcodeSequence, ProductRepository, UserRepository},
    services::{AccountService, CatalogService},
};

#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub accounts: AccountService,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, auth: AuthConfig) -> Self
    where
        S: ProductRepository + BarcodeSequence + UserRepository + 'static,
    {
        Self {
            catalog: CatalogService::new(store.clone(), store.clone()),
            accounts: AccountService::new(store, auth),
        }
    }
}
