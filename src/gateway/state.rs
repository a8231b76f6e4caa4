use std::sync::Arc;

use crate::db::Database;
use crate::inventory::models::{Customer, Product, User, Warehouse};
use crate::inventory::StockService;
use crate::params::ParamClient;
use crate::store::LockingRepo;

/// Shared gateway state
pub struct AppState {
    pub db: Arc<Database>,
    pub customers: LockingRepo<Customer>,
    pub users: LockingRepo<User>,
    pub warehouses: LockingRepo<Warehouse>,
    pub products: LockingRepo<Product>,
    pub stock: StockService,
    pub params: Arc<ParamClient>,
}

impl AppState {
    pub fn new(db: Arc<Database>, params: Arc<ParamClient>) -> Self {
        Self {
            customers: LockingRepo::new(&db),
            users: LockingRepo::new(&db),
            warehouses: LockingRepo::new(&db),
            products: LockingRepo::new(&db),
            stock: StockService::new(db.clone()),
            db,
            params,
        }
    }
}
